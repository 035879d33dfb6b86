pub mod catalog;
pub mod workspace_analyzer;

pub use catalog::{CatalogStats, ClassCatalog};
pub use workspace_analyzer::{WorkspaceAnalyzer, WorkspaceSnapshot};
