use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use suitebook::config::AppConfig;
use suitebook::db::BookingStore;
use suitebook::handlers;
use suitebook::services::payment::paystack::PaystackGateway;
use suitebook::services::payment::PaymentGateway;
use suitebook::services::session::SessionSigner;
use suitebook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let sessions = SessionSigner::new(config.session_secret.as_deref())?;
    if config.admin_password.is_none() {
        tracing::warn!("ADMIN_PASSWORD not set, admin login is disabled");
    }

    let store = BookingStore::open(config.database_url.as_deref())?;

    let gateway: Option<Box<dyn PaymentGateway>> = match &config.paystack_secret_key {
        Some(key) => {
            tracing::info!("using Paystack gateway (url: {})", config.paystack_base_url);
            Some(Box::new(PaystackGateway::new(
                key.clone(),
                &config.paystack_base_url,
                Duration::from_secs(config.gateway_timeout_secs),
            )?))
        }
        None => {
            tracing::warn!("PAYSTACK_SECRET_KEY not set, online payment is disabled");
            None
        }
    };

    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        sessions,
        gateway,
    });

    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
