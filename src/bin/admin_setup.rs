// ABOUTME: Administrative setup utility for creating or promoting the admin account
// ABOUTME: Reads credentials from CLI args or ADMIN_EMAIL / ADMIN_PASSWORD
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Creates the first admin account, or promotes an existing user to admin.
//!
//! Usage:
//! ```bash
//! # Credentials from ADMIN_EMAIL / ADMIN_PASSWORD
//! cargo run --bin admin-setup
//!
//! # Explicit credentials, resetting the password of an existing account
//! cargo run --bin admin-setup -- --email admin@example.com --password s3cretpass --reset-password
//! ```

use anyhow::{anyhow, Result};
use clap::Parser;
use smartplates_server::{
    auth::AuthManager, config::environment::ServerConfig, database::Database, logging,
    services::AccountService,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "admin-setup",
    about = "SmartPlates admin account setup",
    long_about = "Create the SmartPlates admin account, or promote an existing user to admin."
)]
struct AdminSetupArgs {
    /// Admin email, defaults to ADMIN_EMAIL
    #[arg(long)]
    email: Option<String>,

    /// Admin password, defaults to ADMIN_PASSWORD
    #[arg(long)]
    password: Option<String>,

    /// Replace the password of an existing account
    #[arg(long)]
    reset_password: bool,

    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = AdminSetupArgs::parse();
    let mut config = ServerConfig::from_env()?;
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }
    logging::init_from_env()?;

    let email = args
        .email
        .or_else(|| config.admin.email.clone())
        .ok_or_else(|| anyhow!("Admin email missing: pass --email or set ADMIN_EMAIL"))?;
    let password = args
        .password
        .or_else(|| config.admin.password.clone())
        .ok_or_else(|| anyhow!("Admin password missing: pass --password or set ADMIN_PASSWORD"))?;

    let database = Database::new(&config.database.url).await?;
    // Token issuing is not used here; the secret only has to be non-empty
    let auth_manager = Arc::new(AuthManager::new(
        config.auth.jwt_secret.as_deref().unwrap_or("admin-setup").as_bytes(),
        config.auth.jwt_expiry_hours,
    ));
    let accounts = AccountService::new(database, auth_manager);

    let admin = accounts
        .ensure_admin(&email, &password, args.reset_password)
        .await?;
    info!(user_id = %admin.id, email = %admin.email, "Admin account ready");
    println!("Admin account ready: {} ({})", admin.email, admin.id);
    Ok(())
}
