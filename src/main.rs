use clap::Parser;
use std::sync::Arc;

use lanshare::cli::Cli;
use lanshare::config::{AppState, Config};
use lanshare::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli)?;
    logger::init(&cfg)?;

    // Worker threads default to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = cfg.get_socket_addr()?;
    let state = Arc::new(AppState::new(cfg)?);

    if !state.root.is_dir() {
        logger::log_missing_root(state.root.path());
    }

    let listener = server::create_listener(bind_addr)?;
    logger::log_server_start(&bind_addr, state.root.path(), &state.addresses, &state.config);

    server::run(listener, state, server::shutdown_signal()).await?;
    Ok(())
}
