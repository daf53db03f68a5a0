use axum::{
    routing::{get, post},
    Router,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use word_duel::config::Config;
use word_duel::handlers::{AppState, Handle};
use word_duel::models::DictionaryHandle;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // Matches can open while this runs; until it finishes no word is valid
    let (dictionary, _loading) = DictionaryHandle::spawn_load(
        config.dictionary_path.clone(),
        config.dictionary_cache_dir.clone(),
    );

    let addr = config.bind_addr;
    let state = AppState::new(config, dictionary);

    let app = Router::new()
        .route("/new_match", post(Handle::new_match))
        .route("/ws", get(Handle::websocket))
        .with_state(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
