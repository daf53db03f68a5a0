//! End-to-end match scenarios on a fixed 4x4 board.

use std::{
    fs,
    sync::Arc,
    time::{Duration, SystemTime},
};

use tempfile::TempDir;
use word_duel::models::{
    Board, Coordinate, DictionaryHandle, DictionaryIndex, GameError, ManualClock, MatchSession,
    Tile,
};

const WORDS: &str = "elm\nmal\nmap\nmash\nmat\nmate\nmeat\ntape\nteam\n";

//   0 1 2 3
// 0 o h e r
// 1 e l m o
// 2 r t a s
// 3 i e p d
//
// (2,1) doubles its letter, (3,1) doubles the word, (3,2) triples the word.
fn board() -> Arc<Board> {
    let mut rows: Vec<Vec<Tile>> = ["oher", "elmo", "rtas", "iepd"]
        .iter()
        .map(|row| row.chars().map(Tile::plain).collect())
        .collect();
    rows[2][1] = rows[2][1].with_letter_multiplier(2);
    rows[3][1] = rows[3][1].with_word_multiplier(2);
    rows[3][2] = rows[3][2].with_word_multiplier(3);
    Arc::new(Board::from_rows(rows).unwrap())
}

fn path(cells: &[(i32, i32)]) -> Vec<Coordinate> {
    cells.iter().copied().map(Coordinate::from).collect()
}

fn start() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

struct Fixture {
    clock: ManualClock,
    session: MatchSession<ManualClock>,
    dir: TempDir,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let words = dir.path().join("words.txt");
    fs::write(&words, WORDS).unwrap();
    let dictionary = DictionaryIndex::load(&words, dir.path().join("cache")).unwrap();

    let clock = ManualClock::new(start() + Duration::from_secs(30));
    let session = MatchSession::new(
        start(),
        start() + Duration::from_secs(120),
        board(),
        DictionaryHandle::from(dictionary),
        clock.clone(),
    )
    .unwrap();

    Fixture {
        clock,
        session,
        dir,
    }
}

#[test]
fn plain_word_scores_tile_sum() {
    let mut f = fixture();
    // m(3) + a(1) + l(1)
    assert_eq!(f.session.submit_word(&path(&[(1, 2), (2, 2), (1, 1)])), Ok(5));
    assert_eq!(f.session.local_score(), 5);
}

#[test]
fn same_path_twice_is_already_found() {
    let mut f = fixture();
    let mal = path(&[(1, 2), (2, 2), (1, 1)]);
    assert_eq!(f.session.submit_word(&mal), Ok(5));
    assert_eq!(f.session.submit_word(&mal), Err(GameError::WordAlreadyFound));
    assert_eq!(f.session.submit_word(&mal), Err(GameError::WordAlreadyFound));
    assert_eq!(f.session.local_score(), 5);
}

#[test]
fn jump_is_not_continuous() {
    let mut f = fixture();
    // Spells "mash", which is listed, but h is nowhere near s
    assert_eq!(
        f.session.submit_word(&path(&[(1, 2), (2, 2), (2, 3), (0, 1)])),
        Err(GameError::NotContinuousPath)
    );
}

#[test]
fn revisiting_a_cell_is_duplicate() {
    let mut f = fixture();
    assert_eq!(
        f.session.submit_word(&path(&[(1, 2), (0, 3), (1, 2)])),
        Err(GameError::DuplicateCoordinates)
    );
}

#[test]
fn unlisted_word_is_rejected() {
    let mut f = fixture();
    // "elmas"
    assert_eq!(
        f.session
            .submit_word(&path(&[(1, 0), (1, 1), (1, 2), (2, 2), (2, 3)])),
        Err(GameError::WordNotInList)
    );
    assert_eq!(f.session.local_score(), 0);
}

#[test]
fn before_start_is_not_active() {
    let mut f = fixture();
    f.clock.set(start() - Duration::from_secs(600));
    assert!(!f.session.is_game_active());
    assert_eq!(
        f.session.submit_word(&path(&[(1, 2), (2, 2), (1, 1)])),
        Err(GameError::GameIsNotActive)
    );
    // Even a broken path gets the same answer
    assert_eq!(f.session.submit_word(&[]), Err(GameError::GameIsNotActive));
}

#[test]
fn after_end_is_inert_but_readable() {
    let mut f = fixture();
    assert_eq!(f.session.submit_word(&path(&[(1, 2), (2, 2), (1, 1)])), Ok(5));

    f.clock.set(start() + Duration::from_secs(121));
    assert_eq!(
        f.session.submit_word(&path(&[(1, 2), (2, 2), (2, 1)])),
        Err(GameError::GameIsNotActive)
    );
    assert_eq!(f.session.local_score(), 5);
    assert_eq!(f.session.history().len(), 1);
}

#[test]
fn letter_multiplier_applies_to_its_tile() {
    let mut f = fixture();
    // m(3) + a(1) + t(1 x2)
    assert_eq!(f.session.submit_word(&path(&[(1, 2), (2, 2), (2, 1)])), Ok(6));
}

#[test]
fn single_word_multiplier() {
    let mut f = fixture();
    // (m(3) + a(1) + p(3)) x3
    assert_eq!(f.session.submit_word(&path(&[(1, 2), (2, 2), (3, 2)])), Ok(21));
}

#[test]
fn word_multipliers_compound() {
    let mut f = fixture();
    // (t(1 x2) + a(1) + p(3) + e(1)) x3 x2
    assert_eq!(
        f.session.submit_word(&path(&[(2, 1), (2, 2), (3, 2), (3, 1)])),
        Ok(42)
    );
}

#[test]
fn scores_accumulate_across_words() {
    let mut f = fixture();
    let submissions = [
        path(&[(1, 2), (2, 2), (1, 1)]),
        path(&[(1, 2), (2, 2), (2, 1)]),
        path(&[(1, 2), (2, 2), (3, 2)]),
    ];
    let total: u32 = submissions
        .iter()
        .map(|p| f.session.submit_word(p).unwrap())
        .sum();
    assert_eq!(total, 5 + 6 + 21);
    assert_eq!(f.session.local_score(), total);

    let found: Vec<&str> = f.session.history().iter().map(|e| e.word.as_str()).collect();
    assert_eq!(found, vec!["mal", "mat", "map"]);
}

#[test]
fn cached_dictionary_gives_same_answers() {
    let f = fixture();
    drop(f.session);

    // The fixture wrote the offset table; load again from it
    let dir = f.dir;
    let words = dir.path().join("words.txt");
    let cache_dir = dir.path().join("cache");
    assert!(DictionaryIndex::cache_path(&words, &cache_dir).unwrap().exists());

    let fresh = DictionaryIndex::from_bytes(WORDS.as_bytes().to_vec());
    let cached = DictionaryIndex::load(&words, &cache_dir).unwrap();
    for word in WORDS.lines().chain(["ma", "mas", "mashy", "teams", "a", "zzz"]) {
        assert_eq!(cached.contains(word), fresh.contains(word), "{word}");
    }
}
