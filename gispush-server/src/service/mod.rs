pub mod plan;
pub mod message;

pub use message::{MessageService, ProcessSummary};
pub use plan::{plan_edits, Edit, FeatureRef, LayerEdits};
