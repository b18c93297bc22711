pub mod queue;
pub mod types;

pub use queue::StagedQueue;
pub use types::StagedAction;
