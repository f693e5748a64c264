//! rumor-node - broadcast node binary.
//!
//! Speaks newline-delimited JSON on stdin/stdout; logs go to stderr so the
//! wire stays clean.

use std::sync::Arc;

use rumor_node::{EngineConfig, Server, StdioTransport};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("rumor_node=info".parse()?))
        .init();

    let transport = Arc::new(StdioTransport::new());
    let (server, engine) = Server::new(transport, EngineConfig::default());
    let engine_task = tokio::spawn(engine.run());

    Arc::clone(&server)
        .serve(BufReader::new(tokio::io::stdin()))
        .await?;

    info!("stdin closed; draining gossip engine");
    drop(server);
    engine_task.await?;
    Ok(())
}
