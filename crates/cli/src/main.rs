mod bootstrap;
mod di;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tlsprobe_api::{create_api_routes, AppState};
use tlsprobe_application::Registry;
use tlsprobe_domain::config::RootConfig;
use tlsprobe_infrastructure::config_watch::ConfigFileWatcher;
use tlsprobe_infrastructure::RustlsTlsHandshaker;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "tlsprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "TLS certificate observability: discovers TLS endpoints and scrapes certificate validity")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long = "config", default_value = "./config.toml")]
    config: String,

    /// Log level: trace, debug, info, warn
    #[arg(short = 'v', long = "level", default_value = "info")]
    level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = cli.level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_max_level(log_level)
        .init();

    info!("starting tlsprobe v{}", env!("CARGO_PKG_VERSION"));

    let config = RootConfig::from_file(&cli.config).map_err(|e| {
        error!(config = %cli.config, error = %e, "failed to load initial configuration");
        e
    })?;

    info!(
        config_file = %cli.config,
        listen_addr = %config.listen_addr,
        max_connections = config.max_connections,
        max_collect_connections = config.max_collect_connections,
        auto_discovers = config.auto_discovers.len(),
        host_scanners = config.host_scanners.len(),
        tls_checkers = config.tls_checkers.len(),
        "configuration loaded"
    );

    let creators = di::creators::build();
    let handshaker = Arc::new(RustlsTlsHandshaker::new());
    let registry = Arc::new(Registry::new(
        config.max_connections,
        config.max_collect_connections,
        handshaker,
        creators,
    ));

    let reloader_provenance = registry.mint_provenance();
    let self_registrar: Arc<dyn tlsprobe_application::ports::TlsCheckerRegistrar> = registry.clone();

    registry
        .reconcile_config(&config, reloader_provenance, self_registrar.clone())
        .await;

    let state = AppState::new(registry.clone());
    state.mark_ready();

    let _watcher = {
        let config_path = cli.config.clone();
        let registry = registry.clone();
        let self_registrar = self_registrar.clone();
        match ConfigFileWatcher::watch(&config_path, move || {
            let config_path = config_path.clone();
            let registry = registry.clone();
            let self_registrar = self_registrar.clone();
            tokio::spawn(async move {
                match RootConfig::from_file(&config_path) {
                    Ok(new_config) => {
                        registry
                            .reconcile_config(&new_config, reloader_provenance, self_registrar)
                            .await;
                    }
                    Err(err) => {
                        warn!(config = %config_path, error = %err, "config reload failed, keeping previous state in force");
                    }
                }
            });
        }) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                warn!(%err, "failed to start config file watcher, live reload disabled");
                None
            }
        }
    };

    let listen_addr: SocketAddr = config
        .listen_addr
        .parse()
        .expect("listen_addr was already validated by RootConfig::validate");

    let app = create_api_routes(state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(%listen_addr, "metrics server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            bootstrap::signals::shutdown_signal().await;
            registry.cancellation_token().cancel();
        })
        .await?;

    info!("tlsprobe shut down");
    Ok(())
}
