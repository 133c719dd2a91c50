use thiserror::Error;

#[derive(Debug, Error)]
pub enum GisError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// ArcGIS 正常应答里带的业务错误对象
    #[error("feature service error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("invalid token response format")]
    TokenParse,

    #[error("cannot serialize edits: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unexpected feature service response: {0}")]
    UnexpectedResponse(String),
}

pub type Result<T> = std::result::Result<T, GisError>;
