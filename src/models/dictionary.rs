use memmap2::Mmap;
use std::{
    cmp::Ordering,
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
    time::Instant,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const OFFSET_WIDTH: usize = std::mem::size_of::<i64>();

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("word list {} not found", path.display())]
    ResourceNotFound { path: PathBuf },
    #[error("failed to read word list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
enum WordBuffer {
    Mapped(Mmap),
    Owned(Box<[u8]>),
}

impl WordBuffer {
    fn as_bytes(&self) -> &[u8] {
        match self {
            WordBuffer::Mapped(mmap) => &mmap[..],
            WordBuffer::Owned(bytes) => &bytes[..],
        }
    }
}

/// Sorted, newline separated word list with a table of line start offsets.
///
/// Lookups binary search the offset table, comparing the query against the
/// line at each probe. The list must already be lower-cased and sorted
/// bytewise; an unsorted list gives wrong answers rather than an error.
///
/// An index without a word buffer is unhealthy: it answers `false` to
/// everything, which is how a failed load degrades.
#[derive(Debug)]
pub struct DictionaryIndex {
    words: Option<WordBuffer>,
    offsets: Vec<i64>,
}

impl DictionaryIndex {
    /// Map `path` and index it, reusing `<file name>.offsets` in `cache_dir`
    /// when present and writing it when not.
    pub fn load(path: impl AsRef<Path>, cache_dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let start_time = Instant::now();

        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::ResourceNotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let io_error = |source: io::Error| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let len = file.metadata().map_err(io_error)?.len();
        let words = if len == 0 {
            WordBuffer::Owned(Box::default())
        } else {
            // SAFETY: the word list is opened read-only and treated as immutable
            // for the life of the process; nothing in this crate writes to it.
            WordBuffer::Mapped(unsafe { Mmap::map(&file) }.map_err(io_error)?)
        };
        let bytes = words.as_bytes();

        let cache_path = Self::cache_path(path, cache_dir.as_ref());
        let offsets = match cache_path.as_deref().and_then(|p| Self::read_cache(p, bytes)) {
            Some(offsets) => {
                debug!("Reusing offset cache for {}", path.display());
                offsets
            }
            None => {
                let offsets = scan_offsets(bytes);
                if let Some(cache_path) = &cache_path {
                    if let Err(e) = Self::write_cache(cache_path, &offsets) {
                        warn!("Failed to write offset cache {}: {}", cache_path.display(), e);
                    }
                }
                offsets
            }
        };

        info!(
            "Loaded {} words from {} in {:.2} ms",
            offsets.len(),
            path.display(),
            start_time.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Self {
            words: Some(words),
            offsets,
        })
    }

    /// Like [`DictionaryIndex::load`], but a failure yields an unhealthy index.
    pub fn load_or_degraded(path: impl AsRef<Path>, cache_dir: impl AsRef<Path>) -> Self {
        Self::load(path, cache_dir).unwrap_or_else(|e| {
            warn!("Dictionary unavailable, no word will be accepted: {}", e);
            Self::unavailable()
        })
    }

    /// Index an in-memory word list. No cache is involved.
    pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Self {
        let bytes = bytes.into();
        let offsets = scan_offsets(&bytes);
        Self {
            words: Some(WordBuffer::Owned(bytes)),
            offsets,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            words: None,
            offsets: Vec::new(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.words.is_some()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        let Some(words) = &self.words else {
            return false;
        };

        let query = word.to_lowercase();
        if query.is_empty() {
            return false;
        }
        let query = query.as_bytes();
        let bytes = words.as_bytes();

        let mut low = 0;
        let mut high = self.offsets.len();
        while low < high {
            let mid = low + (high - low) / 2;
            match self.line(bytes, mid).cmp(query) {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
                Ordering::Equal => return true,
            }
        }
        false
    }

    pub fn cache_path(path: &Path, cache_dir: &Path) -> Option<PathBuf> {
        let mut name = path.file_name()?.to_os_string();
        name.push(".offsets");
        Some(cache_dir.join(name))
    }

    fn line<'a>(&self, bytes: &'a [u8], index: usize) -> &'a [u8] {
        let start = self.offsets[index] as usize;
        let end = self
            .offsets
            .get(index + 1)
            .map(|&offset| offset as usize)
            .unwrap_or(bytes.len());
        trim_end(&bytes[start..end])
    }

    // A cache that does not describe the lines of `bytes` is stale.
    fn read_cache(cache_path: &Path, bytes: &[u8]) -> Option<Vec<i64>> {
        let raw = fs::read(cache_path).ok()?;
        if raw.len() % OFFSET_WIDTH != 0 {
            warn!("Ignoring truncated offset cache {}", cache_path.display());
            return None;
        }

        let mut offsets = Vec::with_capacity(raw.len() / OFFSET_WIDTH);
        for chunk in raw.chunks_exact(OFFSET_WIDTH) {
            offsets.push(i64::from_ne_bytes(chunk.try_into().ok()?));
        }

        let starts_at_zero = offsets
            .first()
            .map_or(bytes.is_empty(), |&first| first == 0);
        let ascending = offsets.windows(2).all(|pair| pair[0] < pair[1]);
        let in_bounds = offsets
            .last()
            .map_or(true, |&last| last >= 0 && (last as usize) < bytes.len());

        if starts_at_zero && ascending && in_bounds && Self::on_line_starts(&offsets, bytes) {
            Some(offsets)
        } else {
            warn!("Ignoring stale offset cache {}", cache_path.display());
            None
        }
    }

    // Every offset must follow a newline, and the last line must be the last
    // line of the buffer. A list that grew in place fails the second check.
    fn on_line_starts(offsets: &[i64], bytes: &[u8]) -> bool {
        let after_newline = offsets
            .iter()
            .filter(|&&offset| offset > 0)
            .all(|&offset| bytes[offset as usize - 1] == b'\n');
        let last_line_ends = offsets
            .last()
            .map_or(true, |&last| !trim_end(&bytes[last as usize..]).contains(&b'\n'));
        after_newline && last_line_ends
    }

    fn write_cache(cache_path: &Path, offsets: &[i64]) -> io::Result<()> {
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let raw: Vec<u8> = offsets
            .iter()
            .flat_map(|offset| offset.to_ne_bytes())
            .collect();

        // Written beside the target, then renamed into place
        let partial = cache_path.with_extension("offsets.partial");
        fs::write(&partial, raw)?;
        fs::rename(&partial, cache_path)
    }
}

/// Dictionary shared between sessions that may still be loading.
///
/// Until an index is installed every lookup answers `false`, so a session can
/// start accepting gestures before the word list is ready.
#[derive(Debug, Clone, Default)]
pub struct DictionaryHandle {
    inner: Arc<OnceLock<DictionaryIndex>>,
}

impl DictionaryHandle {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn ready(index: DictionaryIndex) -> Self {
        let handle = Self::pending();
        handle.install(index);
        handle
    }

    /// Load the word list on tokio's blocking pool and install the result,
    /// degraded or not, into the returned handle.
    pub fn spawn_load(path: PathBuf, cache_dir: PathBuf) -> (Self, JoinHandle<()>) {
        let handle = Self::pending();
        let loader = handle.clone();
        let task = tokio::task::spawn_blocking(move || {
            loader.install(DictionaryIndex::load_or_degraded(&path, &cache_dir));
        });
        (handle, task)
    }

    /// Returns false if an index was already installed; the first one wins.
    pub fn install(&self, index: DictionaryIndex) -> bool {
        self.inner.set(index).is_ok()
    }

    pub fn get(&self) -> Option<&DictionaryIndex> {
        self.inner.get()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.get().is_some()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.inner
            .get()
            .map_or(false, |index| index.contains(word))
    }
}

impl From<DictionaryIndex> for DictionaryHandle {
    fn from(index: DictionaryIndex) -> Self {
        Self::ready(index)
    }
}

fn scan_offsets(bytes: &[u8]) -> Vec<i64> {
    if bytes.is_empty() {
        return Vec::new();
    }

    let mut offsets = vec![0];
    offsets.extend(
        bytes
            .iter()
            .enumerate()
            .filter(|&(i, &byte)| byte == b'\n' && i + 1 < bytes.len())
            .map(|(i, _)| (i + 1) as i64),
    );
    offsets
}

fn trim_end(mut word: &[u8]) -> &[u8] {
    while let [rest @ .., last] = word {
        if !last.is_ascii_whitespace() {
            break;
        }
        word = rest;
    }
    word
}
