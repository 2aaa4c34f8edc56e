//! Pattern-routed edge gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────┐
//!                     │                 EDGE GATEWAY                   │
//!                     │                                                │
//!   Client Request    │  ┌────────┐   ┌──────────┐   ┌─────────────┐  │
//!   ──────────────────┼─▶│  http  │──▶│ dispatch │──▶│  execution  │  │
//!                     │  │ server │   │ sequence │   │  pipeline   │  │
//!                     │  └────────┘   └──────────┘   └──────┬──────┘  │
//!                     │                                     │         │
//!                     │              route handlers ◀───────┤         │
//!                     │              static assets  ◀───────┤         │
//!   Client Response   │              upstream pass  ◀───────┘         │
//!   ◀─────────────────┼──────────────────────────────────────         │
//!                     │                                                │
//!                     │  cross-cutting: config · patterns · errors ·  │
//!                     │  observability (tracing, request IDs, metrics)│
//!                     └────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edge_gateway::config::{load_config, GatewayConfig};
use edge_gateway::fallback::{StaticAssets, UpstreamClient};
use edge_gateway::handler::HandlerRegistry;
use edge_gateway::http::GatewayServer;
use edge_gateway::observability::metrics;
use edge_gateway::pipeline::ExecutionPipeline;
use edge_gateway::routing::RouteTable;

#[derive(Parser)]
#[command(name = "edge-gateway", about = "Pattern-routed edge request gateway", version)]
struct Cli {
    /// Path to the TOML configuration file. Compiled-in defaults apply
    /// when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration before logging so the configured level can
    // serve as the filter fallback.
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    let default_filter = format!(
        "edge_gateway={},tower_http=info",
        config.observability.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        assets = config.assets.is_some(),
        upstream = config.upstream.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Assemble the dispatch machinery.
    let registry = HandlerRegistry::with_builtins();
    let table = RouteTable::from_config(&config.routes, &registry)?;

    let mut pipeline = ExecutionPipeline::new(Arc::new(table));
    if let Some(assets) = &config.assets {
        pipeline = pipeline
            .with_assets(StaticAssets::new(&assets.root).index_file(&assets.index_file));
    }
    if let Some(upstream) = &config.upstream {
        pipeline = pipeline.with_upstream(UpstreamClient::new(&upstream.address)?);
    }
    pipeline = pipeline.with_env(serde_json::to_value(&config.env)?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = GatewayServer::new(&config, pipeline);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
