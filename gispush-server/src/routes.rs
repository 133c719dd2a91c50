use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};

/// Pub/Sub push 信封
#[derive(Debug, Deserialize)]
pub struct PushEnvelope {
    pub message: PubSubMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PubSubMessage {
    /// base64 编码的消息载荷
    pub data: String,
    #[serde(rename = "messageId", default)]
    pub message_id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/", post(push)).with_state(state)
}

/// 入口：解开信封 → 处理消息 → 204
pub async fn push(State(state): State<AppState>, body: Bytes) -> AppResult<StatusCode> {
    let payload = decode_envelope(&body)?;
    debug!("received message: {payload}");

    state.message_service.process(&payload).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn decode_envelope(body: &[u8]) -> AppResult<Value> {
    let envelope: PushEnvelope =
        serde_json::from_slice(body).map_err(|e| AppError::Envelope(e.to_string()))?;
    let bytes = BASE64
        .decode(envelope.message.data.as_bytes())
        .map_err(|e| AppError::Envelope(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::Envelope(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_envelope() {
        let payload = json!({"properties": {"id": 1}});
        let body = json!({
            "message": {
                "data": BASE64.encode(payload.to_string()),
                "messageId": "12345",
            },
            "subscription": "projects/test/subscriptions/push",
        });

        let decoded = decode_envelope(body.to_string().as_bytes()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_invalid_envelope_fails() {
        assert!(decode_envelope(b"not json").is_err());
    }

    #[test]
    fn test_invalid_base64_fails() {
        let body = json!({"message": {"data": "@@not-base64@@"}});
        assert!(decode_envelope(body.to_string().as_bytes()).is_err());
    }
}
