//! Per-transaction trace capture.

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use alloy_primitives::B256;
use tracing::{subscriber::DefaultGuard, Level};

use crate::errors::TsnError;

/// Name of the file a transaction's trace lands in.
pub fn trace_file_name(index: usize, hash: &B256) -> String {
    format!("trace-{index}-{hash}.jsonl")
}

/// Redirects this thread's diagnostics into a transaction's trace file until
/// dropped.
///
/// Dropping restores whatever dispatcher was current before, so the stream
/// never outlives the transaction even if applying it bails out early.
#[derive(Debug)]
pub struct TraceScope {
    path: PathBuf,
    _guard: DefaultGuard,
}

impl TraceScope {
    pub fn enter(dir: &Path, index: usize, hash: &B256) -> Result<Self, TsnError> {
        let path = dir.join(trace_file_name(index, hash));
        let file = File::create(&path).map_err(|e| TsnError::Trace(path.clone(), e))?;

        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(Level::TRACE)
            .with_writer(Mutex::new(file))
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);

        Ok(Self {
            path,
            _guard: guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
