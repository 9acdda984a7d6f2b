use std::path::{Path, PathBuf};

use argh::FromArgs;
use toml::value::Table;

use crate::errors::{ConfigError, InitError};

/// Top-level sections every config table must have before overrides land.
const SECTIONS: [&str; 4] = ["state", "input", "output", "trace"];

#[derive(Debug, Clone, Default, FromArgs)]
#[argh(
    description = "Applies a block of transactions to a pre-state and reports the result. \
                   Flags use dashes where other t8n tools use dots, e.g. --state-fork for \
                   --state.fork"
)]
pub struct Args {
    // Config non-overriding args
    #[argh(option, description = "path to a base TOML configuration")]
    pub config: Option<PathBuf>,

    #[argh(switch, short = 'v', description = "print version and exit")]
    pub version: bool,

    // Config overriding args
    /// Revision the block is processed under.
    #[argh(option, description = "revision name, e.g. London or Cancun")]
    pub state_fork: Option<String>,

    /// Chain id stamped on every transaction.
    #[argh(option, description = "chain id")]
    pub state_chainid: Option<u64>,

    /// Block reward in wei, -1 for none.
    #[argh(option, description = "block reward in wei (-1 disables)")]
    pub state_reward: Option<i64>,

    #[argh(option, description = "pre-state alloc JSON")]
    pub input_alloc: Option<PathBuf>,

    #[argh(option, description = "block environment JSON")]
    pub input_env: Option<PathBuf>,

    #[argh(option, description = "transactions JSON")]
    pub input_txs: Option<PathBuf>,

    #[argh(option, description = "directory outputs are written to")]
    pub output_basedir: Option<PathBuf>,

    #[argh(option, description = "result file name")]
    pub output_result: Option<PathBuf>,

    #[argh(option, description = "post-state alloc file name")]
    pub output_alloc: Option<PathBuf>,

    #[argh(option, description = "file for the hex RLP of accepted transactions")]
    pub output_body: Option<PathBuf>,

    #[argh(switch, description = "write a trace file per transaction")]
    pub trace: bool,

    /// Other generic overrides to the config toml.
    /// Will be used, for example, as `-o state.chain_id=5 -o output.basedir=out`
    #[argh(option, short = 'o', description = "generic config overrides")]
    pub overrides: Vec<String>,
}

impl Args {
    /// Get strings of overrides gathered from args.
    pub fn get_overrides(&self) -> Result<Vec<String>, InitError> {
        let mut overrides = self.overrides.clone();
        overrides.extend_from_slice(&self.get_direct_overrides()?);
        Ok(overrides)
    }

    /// Overrides passed directly as args and not as overrides.
    fn get_direct_overrides(&self) -> Result<Vec<String>, InitError> {
        let mut overrides = Vec::new();
        if let Some(fork) = &self.state_fork {
            overrides.push(format!("state.fork={fork}"));
        }
        if let Some(chain_id) = self.state_chainid {
            overrides.push(format!("state.chain_id={chain_id}"));
        }
        if let Some(reward) = self.state_reward {
            overrides.push(format!("state.reward={reward}"));
        }

        let paths = [
            ("input.alloc", &self.input_alloc),
            ("input.env", &self.input_env),
            ("input.txs", &self.input_txs),
            ("output.basedir", &self.output_basedir),
            ("output.result", &self.output_result),
            ("output.alloc", &self.output_alloc),
            ("output.body", &self.output_body),
        ];
        for (key, path) in paths {
            if let Some(path) = path {
                overrides.push(format!("{key}={}", path_str(path)?));
            }
        }

        if self.trace {
            overrides.push("trace.enabled=true".to_string());
        }

        Ok(overrides)
    }
}

fn path_str(path: &Path) -> Result<&str, InitError> {
    path.to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid path override {:?}", path).into())
}

/// Makes sure each section exists so that overrides can descend into it.
pub fn ensure_sections(table: &mut Table) {
    for section in SECTIONS {
        table
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(Table::new()));
    }
}

type Override = (String, toml::Value);

/// Parses an override. This first splits the string by '=' to get key and value and then splits
/// the key by '.' which is the update path.
pub fn parse_override(override_str: &str) -> Result<Override, ConfigError> {
    let (key, value_str) = override_str
        .split_once('=')
        .ok_or(ConfigError::InvalidOverride(override_str.to_string()))?;
    Ok((key.to_string(), parse_value(key, value_str)))
}

/// Apply override to config.
pub fn apply_override(
    path: &str,
    value: toml::Value,
    table: &mut Table,
) -> Result<(), ConfigError> {
    match path.split_once('.') {
        None => {
            table.insert(path.to_string(), value);
            Ok(())
        }
        Some((key, rest)) => {
            if let Some(t) = table.get_mut(key).and_then(|v| v.as_table_mut()) {
                apply_override(rest, value, t)
            } else if table.contains_key(key) {
                Err(ConfigError::TraverseNonTableAt(key.to_string()))
            } else {
                Err(ConfigError::MissingKey(key.to_string()))
            }
        }
    }
}

/// Parses a string into a toml value. Paths always stay strings, anything else is first tried as
/// `i64`, then as `bool` and then defaults to `String`.
fn parse_value(key: &str, str_value: &str) -> toml::Value {
    if key.starts_with("input.") || key.starts_with("output.") {
        return toml::Value::String(str_value.to_string());
    }
    str_value
        .parse::<i64>()
        .map(toml::Value::Integer)
        .or_else(|_| str_value.parse::<bool>().map(toml::Value::Boolean))
        .unwrap_or_else(|_| toml::Value::String(str_value.to_string()))
}
