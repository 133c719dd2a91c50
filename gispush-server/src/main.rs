use std::net::SocketAddr;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use gispush_config::AppConfig;
use gispush_server::{routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("GISPUSH_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = AppConfig::from_file(&config_path)?;

    // -------- log ----------
    let default_level = if config.debug_logging { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("gispush_server={default_level}").parse()?)
                .add_directive(format!("gispush_mapping={default_level}").parse()?)
                .add_directive(format!("gispush_gis={default_level}").parse()?),
        )
        .init();

    let state = AppState::new(config)?;

    // -------- router -------
    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("push-to-arcgis listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
