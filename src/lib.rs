//! changegate — change control for high-risk production admin actions.
//!
//! Operators stage mutations, apply them as one batch behind a written
//! reason and a typed confirmation phrase, or route single actions through
//! two-person approval. The binary entrypoint is in `main.rs`; this library
//! exposes the engine for integration tests and programmatic use.

pub mod approval;
pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod registry;
pub mod safety;
pub mod staging;
pub mod utils;

pub use error::{ChangeError, Result};
