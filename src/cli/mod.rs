pub mod commands;

use clap::{Parser, Subcommand};
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "techit")]
#[command(about = "TechIT CLI - database bootstrap and sample data for the helpdesk API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the schema, seed id sequences and the admin account")]
    Init {
        #[arg(long, help = "Username of the initial administrator", default_value = "techit")]
        admin_username: String,
        #[arg(long, help = "Password of the initial administrator", default_value = "abcd")]
        admin_password: String,
    },

    #[command(about = "Wipe the database and load the sample dataset")]
    Fixture,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let pool = connect(&config).await?;

    let result = match cli.command {
        Commands::Init {
            admin_username,
            admin_password,
        } => commands::init::handle(&pool, &admin_username, admin_password).await,
        Commands::Fixture => commands::fixture::handle(&pool).await,
    };

    DatabaseManager::close(pool).await;
    result
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::health_check(&pool).await?;
    Ok(pool)
}
