use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use driftforge_config::{load_from_path, EngineConfig, StoreBackend};
use driftforge_core::{DocumentStore, Ingestor, SchemaRegistry};
use driftforge_store::{MemoryStore, SqliteStore};
use rest_api::{router, DocumentState, SchemaState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::engine_api::EngineApi;

mod engine_api;
mod version;

#[derive(Parser, Debug)]
#[command(name = "driftforge", version = version::VERSION)]
struct Args {
    /// Engine config, YAML. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<String>,
    /// Overrides the configured API listen address.
    #[arg(long)]
    api_addr: Option<String>,
    #[arg(long, default_value = "0.0.0.0:9095")]
    metrics_addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = match args.config.as_deref() {
        Some(path) => load_from_path(path).context("load engine config")?,
        None => EngineConfig::default(),
    };

    println!("{}", version::startup_banner());

    let o11y_cfg = o11y::O11yConfig {
        logging: o11y::logging::Config {
            level: cfg.logging.level.clone(),
            json: cfg.logging.json,
            with_targets: cfg.logging.with_targets,
        },
        metrics: o11y::df_metrics::Config {
            enable: cfg.metrics.enable,
        },
        install_panic_hook: true,
    };
    o11y::init_all(&o11y_cfg);

    info!(
        version = version::GIT_VERSION,
        backend = ?cfg.store.backend,
        "driftforge starting"
    );

    let (registry, documents) =
        build_store(&cfg).context("build store backend")?;
    let ingestor = Arc::new(
        Ingestor::new(registry.clone(), documents.clone())
            .with_max_depth(cfg.inference.max_depth),
    );
    let engine = Arc::new(EngineApi::new(registry, documents, ingestor));

    let app: Router = router(
        SchemaState {
            queries: engine.clone(),
        },
        DocumentState { documents: engine },
    );
    // /metrics also rides on the api port; the dedicated listener below
    // is the one scrape configs should point at.
    let app = app.merge(o11y::df_metrics::router_with_metrics());

    if cfg.metrics.enable {
        let metrics_addr: SocketAddr = args
            .metrics_addr
            .parse()
            .context("metrics_addr must be host:port")?;
        let metrics_listener = TcpListener::bind(metrics_addr).await?;
        info!(%metrics_addr, "metrics listening");
        tokio::spawn(
            axum::serve(
                metrics_listener,
                o11y::df_metrics::router_with_metrics(),
            )
            .into_future(),
        );
    }

    let addr: SocketAddr = args
        .api_addr
        .unwrap_or(cfg.api.listen_addr)
        .parse()
        .context("api_addr must be host:port")?;
    info!(%addr, "api listening");

    let listener = TcpListener::bind(addr).await?;
    let api_task = tokio::spawn(axum::serve(listener, app).into_future());

    api_task.await??;

    Ok(())
}

fn build_store(
    cfg: &EngineConfig,
) -> Result<(Arc<dyn SchemaRegistry>, Arc<dyn DocumentStore>)> {
    Ok(match cfg.store.backend {
        StoreBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store)
        }
        StoreBackend::Sqlite => {
            let store = Arc::new(
                SqliteStore::new(&cfg.store.path)
                    .with_context(|| {
                        format!("open sqlite store at {}", cfg.store.path)
                    })?,
            );
            (store.clone(), store)
        }
    })
}
