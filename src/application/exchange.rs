// Export/import contracts for persisting a model and its groups

use crate::domain::{ModelError, SolverBackend};
use crate::group::{Group, GroupKind};
use crate::model::Model;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Invalid folder: {}", .0.display())]
    InvalidFolder(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot encode model data: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Writes a whole model: header plus every group
pub trait ModelExporter<B: SolverBackend> {
    fn export_model(&self, model: &Model<B>) -> Result<()>;
}

/// Restores a stored model into `model`, matched by identifier
pub trait ModelImporter<B: SolverBackend> {
    fn import_model(&self, model: &Model<B>) -> Result<()>;
}

pub trait GroupExporter<B: SolverBackend, K: GroupKind> {
    fn export_group(&self, model: &Model<B>, group: &Group<K>) -> Result<()>;
}

/// Restores one stored group; an existing group with the same identifier is
/// reused, its members are added to it.
pub trait GroupImporter<B: SolverBackend, K: GroupKind> {
    fn import_group(&self, model: &Model<B>, group_id: &str) -> Result<()>;
}
