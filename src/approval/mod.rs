pub mod store;
pub mod types;
pub mod workflow;

pub use store::{ApprovalStore, InMemoryApprovalStore, JsonFileApprovalStore};
pub use types::{ApprovalRequest, ApprovalStatus, Decision};
pub use workflow::ApprovalWorkflow;
