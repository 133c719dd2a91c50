pub mod error;
pub mod app_state;
pub mod routes;
pub mod service;

pub use error::{AppError, AppResult};
pub use app_state::AppState;
