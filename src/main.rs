use std::path::Path;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use paperchat_backend::config::Settings;
use paperchat_backend::server::router::router;
use paperchat_backend::state::AppState;
use paperchat_backend::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    logging::init(Path::new(&settings.server.log_dir));
    tracing::info!("Starting with settings: {:?}", settings.redacted());

    let state = AppState::initialize(settings)?;

    let bind_addr = state.settings.server.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let app: Router = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
