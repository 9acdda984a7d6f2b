//! Writes the transition outputs.

use std::{fs, path::Path};

use serde::Serialize;
use t8n_chaintsn::TransitionOutput;
use t8n_config::OutputConfig;
use t8n_state::WorldState;
use tracing::*;

use crate::{errors::InitError, fixtures::state_to_alloc};

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), InitError> {
    let json = serde_json::to_string_pretty(value).map_err(anyhow::Error::from)?;
    fs::write(path, json)?;
    debug!(?path, "wrote output");
    Ok(())
}

/// Writes the result record, the post-state alloc and, if configured, the
/// block body.
pub fn write_outputs(
    config: &OutputConfig,
    out: &TransitionOutput,
    state: &WorldState,
) -> Result<(), InitError> {
    let dir = &config.basedir;

    write_json(&dir.join(&config.result), &out.result)?;
    write_json(&dir.join(&config.alloc), &state_to_alloc(state))?;

    if let Some(body) = &config.body {
        let path = dir.join(body);
        fs::write(&path, format!("0x{}", hex::encode(out.encoded_body())))?;
        debug!(?path, "wrote body");
    }

    Ok(())
}
