use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration failures. These indicate an inconsistent project tree
/// and abort the operation that triggered them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required property `{key}` for {}", dir.display())]
    MissingProperty { key: String, dir: PathBuf },

    #[error("property `{key}` for {} refers to itself", dir.display())]
    CyclicProperty { key: String, dir: PathBuf },

    #[error("referenced directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("malformed manifest {}: {reason}", path.display())]
    MalformedManifest { path: PathBuf, reason: String },

    #[error("framework `{name}` referenced from {} could not be resolved", from.display())]
    UnknownFramework { name: String, from: PathBuf },

    #[error("package `{name}` referenced from {} could not be resolved", from.display())]
    UnknownPackage { name: String, from: PathBuf },

    #[error("no workspace found above {}", .0.display())]
    MissingWorkspace(PathBuf),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
