// ABOUTME: Server binary for the SmartPlates recipe platform
// ABOUTME: Loads configuration, initializes logging and resources, then serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![recursion_limit = "256"]

//! # `SmartPlates` Server Binary
//!
//! Starts the REST API with configuration from the environment (and `.env`),
//! optionally overriding the port and database URL from the command line.

use anyhow::Result;
use clap::Parser;
use smartplates_server::{
    config::environment::ServerConfig, logging, resources::ServerResources,
    server::SmartPlatesServer,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "smartplates-server")]
#[command(about = "SmartPlates - recipes, meal plans and grocery lists over a cached Spoonacular layer")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }

    logging::init_from_env()?;
    info!("{}", config.summary());

    let port = config.http_port;
    let resources = Arc::new(ServerResources::from_config(config).await?);
    info!(
        recipe_api = resources.recipe_cache.is_enabled(),
        llm = resources.llm.is_some(),
        "Server resources initialized"
    );

    if let Err(e) = SmartPlatesServer::new(resources).run(port).await {
        error!("Server error: {e:#}");
        return Err(e);
    }
    Ok(())
}
