//! Descriptor resolution: typed contexts over manifest-bearing directories.

pub mod kind;
pub mod manifest;
pub mod model;
pub mod paths;

pub use kind::{ContextKind, KindSpec};
pub use model::{Context, ContextId, Creator, ProjectModel};
