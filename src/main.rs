//! Storefront API server.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront::{
    api::{build_app, middleware::AuthState, AppState},
    config::{load_app_config, Environment},
    db,
    notify::{Mailer, Notifier},
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry().with(env_filter).with(tracing_subscriber::fmt::layer()).init();
    tracing::debug!(?config, "configuration loaded");

    let pool = db::connect_pool(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;

    let nats = match config.nats_url.as_deref() {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, domain events will not be published");
                None
            }
        },
        None => None,
    };

    let mailer = Mailer::from_config_or_mock(&config.mail);
    let notifier = Notifier::new(mailer, config.mail.clone(), nats);
    let auth = AuthState::new(&config.admin_api_keys, config.env == Environment::Development)?;
    let app = build_app(AppState::new(pool, notifier, auth));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "storefront listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
