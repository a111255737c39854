use anyhow::{Context, Result};
use reqwest::Client;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::Mutex};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use standvirtual_advisor::{
    backend::{AdvertSource, HttpAdvertSource},
    config::Settings,
    controller::ViewerController,
    routes,
    session::FileCredentialSlot,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "standvirtual_advisor=info,tower_http=info".into()))
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing StandVirtual Advisor...");

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };
    let display_tz = settings.timezone()?;

    let http_client = Arc::new(
        Client::builder()
            .user_agent(concat!("standvirtual-advisor/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build shared reqwest client")?,
    );
    let source: Arc<dyn AdvertSource> = Arc::new(HttpAdvertSource::new(http_client, settings.backend_url.clone()));
    tracing::info!("Backend at {}{}", settings.backend_url, settings.records_path);

    let slot = Arc::new(FileCredentialSlot::new(&settings.credential_path));
    let mut viewer = ViewerController::new(slot, settings.records_path.clone());

    // A credential left from an earlier run counts as a fresh login
    if viewer.is_authenticated() {
        let outcome = viewer.load(source.as_ref(), true).await;
        tracing::info!(?outcome, "Initial load for restored session");
    }

    let app_state = AppState {
        source,
        viewer: Arc::new(Mutex::new(viewer)),
        display_tz,
    };

    let app = routes::create_router(app_state);

    let addr: SocketAddr = match settings.server_address.parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Invalid server address format in configuration ('{}'): {}", settings.server_address, e);
            return Err(anyhow::anyhow!("Invalid server address format: {}", settings.server_address));
        }
    };

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Viewer listening on http://{}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
