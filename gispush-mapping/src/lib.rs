//! crate 公共入口

// —— 先声明各模块 —— //
pub mod error;
pub mod utils;
pub mod model;
pub mod resolver;
pub mod engine;
pub mod mapper;

// —— 再做公开 re-export —— //
pub use crate::model::{CharacterSet, CoordinateConversion, CoordinateSpec, FieldRule, LeafRule, MappingSpec};
pub use crate::engine::MappingEngine;
pub use crate::mapper::{FieldMapper, MappedRecord};
pub use crate::error::{MappingError, Result};
