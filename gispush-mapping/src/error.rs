//! 全局统一错误类型

use thiserror::Error;

/// 每个 resolver / 引擎阶段都可直接返回 MappingError
#[derive(Debug, Error)]
pub enum MappingError {
    // ───────────────────── 基础序列化/反序列化 ─────────────────────
    #[error("serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("serde yaml error: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    // ───────────────────── 规则/配置层面 ─────────────────────────
    /// Rejection：required 字段解析为空，整条消息不会发布
    #[error("required field '{0}' resolved to an empty value")]
    RequiredFieldEmpty(String),

    #[error("invalid rule for field '{field}': {reason}")]
    InvalidRule { field: String, reason: String },
}

impl MappingError {
    /// Rejection 与配置错误区分开：调用方据此静默跳过发布
    pub fn is_rejection(&self) -> bool {
        matches!(self, MappingError::RequiredFieldEmpty(_))
    }
}

/// 项目统一 Result 别名
pub type Result<T> = std::result::Result<T, MappingError>;
