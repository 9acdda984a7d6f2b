use std::{io, path::PathBuf};

use t8n_chaintsn::TsnError;
use t8n_primitives::errors::RevisionError;
use t8n_state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Revision(#[from] RevisionError),

    #[error("read {0:?}: {1}")]
    ReadFile(PathBuf, #[source] io::Error),

    #[error("parse {0:?}: {1}")]
    ParseFixture(PathBuf, #[source] serde_json::Error),

    #[error("invalid fixture: {0}")]
    InvalidFixture(String),

    #[error("invalid pre-state: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    Transition(#[from] TsnError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config override string is not of the form `key=value`.
    #[error("invalid override: '{0}'")]
    InvalidOverride(String),

    /// Tried to descend into a key that isn't a table.
    #[error("expected table at {0}")]
    TraverseNonTableAt(String),

    #[error("missing key: {0}")]
    MissingKey(String),

    #[error("{0}")]
    Toml(#[from] toml::de::Error),
}
