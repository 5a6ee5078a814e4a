use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use registra::api::ApiClient;
use registra::cli::Console;
use registra::config::Config;
use registra::session::{FileSessionStore, SessionManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let cfg = Config::from_env();
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "registra",
        "registra starting: RUST_LOG='{}', api_url='{}', session_dir='{}', refresh_secs={}",
        rust_log,
        cfg.api_url,
        cfg.session_dir.display(),
        cfg.refresh_every.as_secs()
    );

    let api = ApiClient::new(&cfg.api_url)?;
    let store = FileSessionStore::new(&cfg.session_dir);
    let manager = SessionManager::new(api.clone(), Box::new(store));
    manager.initialize();

    Console::new(api, manager, cfg.refresh_every).run().await
}
