use std::sync::Arc;

use gispush_config::AppConfig;

use crate::error::AppResult;
use crate::service::MessageService;

#[derive(Clone)]
pub struct AppState {
    pub message_service: Arc<MessageService>,
}

impl AppState {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let message_service = Arc::new(MessageService::new(config)?);
        Ok(Self { message_service })
    }
}
