use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use emotion_posts::config::{AppState, Config};
use emotion_posts::server::{create_reusable_listener, start_server_loop, start_signal_handler};
use emotion_posts::{logger, store};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path without extension
    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    logger::init(&cfg.logging)?;

    // Requests are handled on a single thread, one event at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    // An unusable backing file is fatal at startup
    let store = store::open_store(&cfg.storage).await.map_err(|e| {
        logger::log_error(&format!("Failed to open post store: {e}"));
        e
    })?;

    let listener = create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(AppState::new(cfg, store));
    start_signal_handler(Arc::clone(&state.shutdown_signal))?;

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(start_server_loop(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
        ))
        .await?;

    Ok(())
}
