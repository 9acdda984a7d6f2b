use std::{fs, path::Path};

use t8n_config::Config;
use toml::value::Table;

use crate::{
    args::{apply_override, ensure_sections, parse_override, Args},
    errors::{ConfigError, InitError},
};

/// Builds the config from the optional base file with the args laid on top.
///
/// Values passed over arguments get the precedence over the configuration
/// file.
pub fn get_config(args: &Args) -> Result<Config, InitError> {
    let mut table = match args.config.as_deref() {
        Some(path) => load_configuration(path)?,
        None => Table::new(),
    };
    ensure_sections(&mut table);

    for override_str in args.get_overrides()? {
        let (path, value) = parse_override(&override_str)?;
        apply_override(&path, value, &mut table)?;
    }

    let config = toml::Value::Table(table)
        .try_into::<Config>()
        .map_err(ConfigError::from)?;
    Ok(config)
}

fn load_configuration(path: &Path) -> Result<Table, InitError> {
    let config_str = fs::read_to_string(path)?;
    let table = toml::from_str::<Table>(&config_str).map_err(ConfigError::from)?;
    Ok(table)
}
