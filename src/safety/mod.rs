pub mod evaluator;
pub mod source;
pub mod types;

pub use evaluator::evaluate;
pub use source::{collect_inputs, SnapshotFileSource, StaticSource, StatusSource};
pub use types::*;
