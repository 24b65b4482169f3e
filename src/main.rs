use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Notify;

mod cli;
mod config;
mod error;
mod handler;
mod http;
mod logger;
mod mount;
mod server;

use error::ConfigError;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let cfg = match config::Config::load(&cli) {
        Ok(cfg) => cfg,
        Err(e) => return startup_failure(&e),
    };

    // Mount and bundle are validated before anything is bound
    let state = match config::AppState::new(&cfg) {
        Ok(state) => Arc::new(state),
        Err(e) => return startup_failure(&e),
    };

    if let Err(e) = logger::init(&cfg) {
        eprintln!("error: failed to open log file: {e}");
        return ExitCode::FAILURE;
    }

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = match runtime_builder.build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main(&cfg, state)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => startup_failure(&e),
    }
}

async fn async_main(cfg: &config::Config, state: Arc<config::AppState>) -> Result<(), ConfigError> {
    let addr = cfg.get_socket_addr();
    let listener = server::create_reusable_listener(addr)
        .map_err(|source| ConfigError::Bind { addr, source })?;

    logger::log_server_start(&addr, &state, cfg.server.workers);

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));
    server::start_server_loop(listener, state, shutdown).await;

    logger::log_info("Server stopped");
    Ok(())
}

fn startup_failure(err: &ConfigError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::FAILURE
}
