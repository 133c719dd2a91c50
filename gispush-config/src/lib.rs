pub mod error;
pub mod model;

pub use error::ConfigError;
pub use model::*;
