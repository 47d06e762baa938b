mod api;
mod config;
mod context;
mod error;
mod family;
mod graph;
mod importer;
mod layout;
mod ledger;
mod output;
mod reconcile;
mod render;
mod traits;
mod writer;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use config::{Cli, ImportConfig};
use context::Context;
use traits::ReqwestTransport;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = ImportConfig::from_cli(cli)?;
    let transport = ReqwestTransport::new(&config.api_key, config.verify_tls)?;
    let ctx = Context::new(Arc::new(transport));

    importer::run(&ctx, &config)?;

    Ok(())
}
