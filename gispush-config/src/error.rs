use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("function is missing required configuration: {0}")]
    Missing(&'static str),

    #[error("unsupported configuration value: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
