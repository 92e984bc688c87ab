use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::sync::mpsc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use storefront_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);
    api::handlers::health::init_start_time();

    // Init events
    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = Arc::new(api::events::EventSender::new(event_tx));
    tokio::spawn(api::events::process_events(event_rx));

    // Discovery backend and registration
    let discovery =
        api::discovery::from_config(&cfg.discovery).context("failed to build discovery backend")?;
    let registration = cfg.registration_for(&cfg.checkout_service_name, cfg.checkout_port);
    discovery
        .register(&registration)
        .await
        .context("failed to register checkout service")?;

    // Build the checkout service around the ledger
    let ledger = Arc::new(api::store::CheckoutLedger::new());
    let service = Arc::new(api::services::CheckoutService::new(ledger, event_sender));

    let mut app = api::handlers::checkout::checkout_routes()
        .merge(api::handlers::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(service);

    if cfg.is_development() {
        info!("Using permissive CORS (development environment)");
        app = app.layer(CorsLayer::permissive());
    }

    // Bind and serve
    let host = cfg.host.parse().context("invalid host address")?;
    let addr = SocketAddr::new(host, cfg.checkout_port);
    info!("Checkout service listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(api::shutdown_signal())
        .await?;

    Ok(())
}
