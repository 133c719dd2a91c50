pub mod error;
pub mod auth;
pub mod client;
pub mod attachment;

pub use error::{GisError, Result};
pub use client::{EditResult, EditResults, GisService};
pub use attachment::{Attachment, AttachmentService};
