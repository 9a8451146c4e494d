//! `hstpd` — the HSTP node daemon.

use anyhow::{Context, Result};
use clap::Parser;
use hstp_node::cli::Cli;
use hstp_node::config::NodeConfig;
use hstp_node::did::Did;
use hstp_node::node::NodeBuilder;
use hstp_node::{observability, rest_api};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        NodeConfig::load_from_file(&cli.config).context("loading node configuration")?
    } else {
        let node_id: Did = "did:example:dev-node".parse().expect("valid development DID");
        NodeConfig::development(node_id)
    };

    observability::init_tracing(&config.logging).context("initializing tracing")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.concurrency.worker_thread_count.as_usize())
        .enable_all()
        .build()
        .context("building the node's tokio runtime")?;

    runtime.block_on(run(config))
}

async fn run(config: NodeConfig) -> Result<()> {
    info!(name = %config.name, node_id = %config.node_id, "starting HSTP node");

    let management_port = config.management.port;
    let node = Arc::new(NodeBuilder::new(config).build());
    node.start().await.context("starting transport bindings")?;

    let management_addr = SocketAddr::from(([0, 0, 0, 0], management_port));
    let management_state = node.management_state();
    let serve_node = Arc::clone(&node);

    tokio::select! {
        result = rest_api::serve(management_addr, management_state) => {
            if let Err(e) = result {
                error!(error = %e, "management API server exited with an error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
    }

    serve_node.shutdown().await;
    info!("HSTP node shut down cleanly");
    Ok(())
}
