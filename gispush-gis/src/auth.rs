use reqwest::Client;
use serde_json::Value;

use gispush_config::ArcGisAuth;

use crate::error::{GisError, Result};

/// 向 ArcGIS portal 申请 feature service token
pub async fn request_token(client: &Client, auth: &ArcGisAuth, password: &str) -> Result<String> {
    let form = [
        ("f", "json"),
        ("username", auth.username.as_str()),
        ("password", password),
        ("request", auth.request.as_str()),
        ("referer", auth.referer.as_str()),
    ];

    let json: Value = client
        .post(&auth.url)
        .form(&form)
        .send()
        .await?
        .json()
        .await?;

    if let Some(error) = json.get("error") {
        return Err(api_error(error));
    }

    json.get("token")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(GisError::TokenParse)
}

/// ArcGIS 应答中 `error` 对象 → GisError::Api
pub(crate) fn api_error(error: &Value) -> GisError {
    GisError::Api {
        code: error.get("code").and_then(|v| v.as_i64()).unwrap_or(0),
        message: error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
            .to_string(),
    }
}
