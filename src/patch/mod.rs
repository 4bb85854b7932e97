//! Configuration patch layer
//!
//! A declarative catalog of what must change in a dependency's configuration
//! block when moving between two versions (optionally to a new repository),
//! and the engine that applies it without ever overwriting or losing data.
//!
//! - [`types`]: Catalog entries (`PatchRule`, `VersionPatch`, `FieldPatch`) and results (`Patch`)
//! - [`block`]: `ConfigBlock` and conversions from external data
//! - [`catalog`]: Built-in transitions for common actions
//! - [`engine`]: `PatchEngine`

pub mod block;
pub mod catalog;
pub mod engine;
pub mod types;

pub use block::ConfigBlock;
pub use engine::PatchEngine;
pub use types::{FieldOp, FieldPatch, Patch, PatchRule, SchemaChanges, VersionPatch};
