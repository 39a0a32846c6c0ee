use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use headerserve::config::{self, AppState, Config};
use headerserve::logger;
use headerserve::server::{self, SignalHandler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path without extension
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    // Header rules and the serve root are fixed from here on
    let state = Arc::new(AppState::new(cfg));
    logger::log_server_start(
        &addr,
        &state.config,
        state.resolver.root(),
        &state.rules,
    );

    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;

    server::run_server_loop(
        listener,
        state,
        Arc::new(AtomicUsize::new(0)),
        signals,
    )
    .await;

    Ok(())
}
