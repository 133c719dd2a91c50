//! 公共 re-export，外部只引入 `model::*` 即可

pub mod spec;
pub mod coords;

pub use spec::*;
pub use coords::*;
