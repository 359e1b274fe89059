use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use techit_api::auth::directory::NoDirectory;
use techit_api::config::AppConfig;
use techit_api::database::{ensure_sequences, DatabaseManager, PgStore};
use techit_api::notify::{LogMailer, Mailer, Notifier, SmtpMailer};
use techit_api::shutdown::shutdown_signal;
use techit_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("techit_api={},tower_http=info", config.log_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting TechIT API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database).await?;
    let store = PgStore::new(pool.clone());
    ensure_sequences(&store)
        .await
        .context("id sequences missing; run `techit init` first")?;

    let mailer: Arc<dyn Mailer> = match &config.mail.smtp_host {
        Some(host) => {
            tracing::info!("Sending mail through {}:{}", host, config.mail.smtp_port);
            Arc::new(SmtpMailer::new(host, &config.mail)?)
        }
        None => {
            tracing::info!("SMTP_HOST not set; notifications are only logged");
            Arc::new(LogMailer)
        }
    };

    let store = Arc::new(store);
    let (notifier, notify_worker) =
        Notifier::spawn(store.clone(), mailer, config.mail.app_url.clone());

    let port = config.server.port;
    let state = AppState {
        config: Arc::new(config),
        users: store.clone(),
        tickets: store.clone(),
        sequences: store,
        directory: Arc::new(NoDirectory),
        notifier,
    };
    let app = techit_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("TechIT API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The router (and with it every notifier handle) is gone; let queued mail finish.
    if tokio::time::timeout(Duration::from_secs(10), notify_worker)
        .await
        .is_err()
    {
        tracing::warn!("Notification worker did not drain in time");
    }
    DatabaseManager::close(pool).await;
    Ok(())
}
