pub mod apply;
pub mod types;

pub use apply::{check_reason, BatchPipeline};
pub use types::*;
