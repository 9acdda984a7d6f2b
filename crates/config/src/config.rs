use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default value for `chain_id` in [`StateConfig`].
const DEFAULT_CHAIN_ID: u64 = 0;

/// Default value for `result` in [`OutputConfig`].
const DEFAULT_RESULT_FILE: &str = "result.json";

/// Default value for `alloc` in [`OutputConfig`].
const DEFAULT_ALLOC_FILE: &str = "alloc.json";

/// Default value for `basedir` in [`OutputConfig`].
const DEFAULT_BASEDIR: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Revision name the block is processed under.
    pub fork: String,

    /// Chain id stamped on every transaction.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Block reward in wei.  Absent or negative means no reward is paid.
    #[serde(default)]
    pub reward: Option<i64>,
}

impl StateConfig {
    /// The reward to pay, if any.
    pub fn block_reward(&self) -> Option<u64> {
        self.reward.and_then(|r| u64::try_from(r).ok())
    }
}

/// Fixture files to read.  Paths are taken as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub alloc: Option<PathBuf>,

    #[serde(default)]
    pub env: Option<PathBuf>,

    /// Transaction list.  When absent no transactions are processed at all,
    /// which is different from an empty list.
    #[serde(default)]
    pub txs: Option<PathBuf>,
}

/// Output files, relative to `basedir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_basedir")]
    pub basedir: PathBuf,

    #[serde(default = "default_result_file")]
    pub result: PathBuf,

    #[serde(default = "default_alloc_file")]
    pub alloc: PathBuf,

    /// Hex-encoded RLP of the accepted transactions, only written if set.
    #[serde(default)]
    pub body: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            basedir: default_basedir(),
            result: default_result_file(),
            alloc: default_alloc_file(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Writes a trace file per transaction into the output directory.
    #[serde(default)]
    pub enabled: bool,
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_basedir() -> PathBuf {
    DEFAULT_BASEDIR.into()
}

fn default_result_file() -> PathBuf {
    DEFAULT_RESULT_FILE.into()
}

fn default_alloc_file() -> PathBuf {
    DEFAULT_ALLOC_FILE.into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub state: StateConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_config_load() {
        let config_string = r#"
            [state]
            fork = "Cancun"
            chain_id = 7
            reward = 2000000000000000000

            [input]
            alloc = "fixtures/alloc.json"
            env = "fixtures/env.json"
            txs = "fixtures/txs.json"

            [output]
            basedir = "/tmp/out"
            body = "body.rlp"

            [trace]
            enabled = true
        "#;

        let config = toml::from_str::<Config>(config_string);
        assert!(
            config.is_ok(),
            "should be able to load TOML config but got: {:?}",
            config.err()
        );
        let config = config.unwrap();
        assert_eq!(config.state.chain_id, 7);
        assert_eq!(config.state.block_reward(), Some(2_000_000_000_000_000_000));
        assert_eq!(config.output.result, PathBuf::from("result.json"));
        assert_eq!(config.output.body, Some(PathBuf::from("body.rlp")));
        assert!(config.trace.enabled);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = toml::from_str::<Config>("[state]\nfork = \"London\"\n").unwrap();
        assert_eq!(config.state.chain_id, 0);
        assert_eq!(config.state.block_reward(), None);
        assert_eq!(config.input, InputConfig::default());
        assert_eq!(config.output, OutputConfig::default());
        assert!(!config.trace.enabled);
    }

    #[test]
    fn test_negative_reward_means_none() {
        let config = toml::from_str::<Config>("[state]\nfork = \"Byzantium\"\nreward = -1\n")
            .unwrap();
        assert_eq!(config.state.reward, Some(-1));
        assert_eq!(config.state.block_reward(), None);
    }

    #[test]
    fn test_missing_fork_rejected() {
        assert!(toml::from_str::<Config>("[trace]\nenabled = true\n").is_err());
    }
}
