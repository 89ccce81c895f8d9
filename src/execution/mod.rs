//! Execution Module
//!
//! Provides the engine that runs a configuration's steps, including
//! concurrent group scheduling, captured output sharing, and
//! environment layering.
//!
//! # Architecture
//!
//! - [`engine`]: Step scheduler orchestrating a run
//! - [`group`]: Single group execution logic
//! - [`output`]: Captured output store and placeholder expansion
//! - [`registry`]: Group lookup by name
//! - [`env`]: Environment layer merging

pub mod engine;
pub mod env;
pub mod group;
pub mod output;
pub mod registry;

pub use engine::{Engine, EngineError};
pub use group::GroupError;
pub use output::OutputStore;
pub use registry::GroupRegistry;
