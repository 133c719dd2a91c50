use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Pub/Sub 信封解不开：按原行为回 503，让订阅重投
    #[error("extraction of subscription failed: {0}")]
    Envelope(String),

    #[error(transparent)]
    Config(#[from] gispush_config::ConfigError),

    #[error(transparent)]
    Gis(#[from] gispush_gis::GisError),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("{self}");
        let status = match self {
            AppError::Envelope(_) | AppError::Gis(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
