pub mod analyzer;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod incremental;
pub mod parser;
pub mod properties;
pub mod sources;
pub mod workspace;

pub use analyzer::{ClassCatalog, WorkspaceAnalyzer, WorkspaceSnapshot};
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use error::{ConfigError, ConfigResult};
pub use incremental::{SymbolIndex, SyncReport};
pub use parser::{ClassRecord, FileSymbols, JsParser, Location, Span};
pub use properties::PropertyStore;
pub use sources::{SourceCollection, SourceFile, SourceLoader};
pub use workspace::{Context, ContextId, ContextKind, Creator, ProjectModel};
