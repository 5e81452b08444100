//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::PipcovConfig;
use std::path::Path;

/// File name looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "pipcov.toml";

/// Loads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<PipcovConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Resolves the configuration for a run.
///
/// An explicit path must exist. Without one, `<dir>/pipcov.toml` is used when
/// present and built-in defaults otherwise.
pub fn load_optional_config(explicit: Option<&Path>, dir: &Path) -> Result<PipcovConfig, ConfigError> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let implicit = dir.join(CONFIG_FILE_NAME);
            if implicit.is_file() {
                load_config(&implicit)
            } else {
                Ok(PipcovConfig::default())
            }
        }
    }
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<PipcovConfig, ConfigError> {
    let config: PipcovConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &PipcovConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));
    let search = &config.search;
    if search.max_capacity == 0 {
        return invalid("search.max_capacity must be at least 1");
    }
    if !(search.time_budget_secs > 0.0) {
        return invalid("search.time_budget_secs must be positive");
    }
    if search.max_attempts == 0 {
        return invalid("search.max_attempts must be at least 1");
    }
    if search.window_radius < 1 || search.local_radius < 1 {
        return invalid("search.window_radius and search.local_radius must be at least 1");
    }
    if search.stall_window == 0 {
        return invalid("search.stall_window must be at least 1");
    }
    if !(search.stall_ratio > 0.0 && search.stall_ratio <= 1.0) {
        return invalid("search.stall_ratio must be in (0, 1]");
    }
    let costs = &config.costs;
    if !(costs.base > 0.0) {
        return invalid("costs.base must be positive");
    }
    let penalties = [
        costs.route_through_penalty,
        costs.mux_penalty,
        costs.covered_pip_penalty,
        costs.over_length_penalty,
    ];
    if penalties.iter().any(|p| !(*p >= 0.0) || !p.is_finite()) {
        return invalid("cost penalties must be finite and non-negative");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, PipcovConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[device]
data_dir = "/opt/pipcov/devices"

[search]
max_capacity = 5
time_budget_secs = 2.5
length_slack = 3
max_attempts = 50
window_radius = 3
local_radius = 1
stall_window = 2
stall_ratio = 0.5
max_configs = 10

[costs]
base = 1.0
route_through_penalty = 10.0
mux_penalty = 1.0
covered_pip_penalty = 3.0
over_length_penalty = 7.0

[relocation]
workers = 4
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.device.data_dir.to_str(), Some("/opt/pipcov/devices"));
        assert_eq!(config.search.max_capacity, 5);
        assert_eq!(config.search.time_budget_secs, 2.5);
        assert_eq!(config.search.stall_ratio, 0.5);
        assert_eq!(config.costs.route_through_penalty, 10.0);
        assert_eq!(config.relocation.workers, 4);
    }

    #[test]
    fn zero_capacity_errors() {
        let err = load_config_from_str("[search]\nmax_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn bad_stall_ratio_errors() {
        let err = load_config_from_str("[search]\nstall_ratio = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn negative_penalty_errors() {
        let err = load_config_from_str("[costs]\nmux_penalty = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn malformed_toml_errors() {
        let err = load_config_from_str("[search\nmax_capacity = 1").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn optional_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_optional_config(None, dir.path()).unwrap();
        assert_eq!(config, PipcovConfig::default());
    }

    #[test]
    fn optional_config_reads_implicit_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[search]\nmax_capacity = 9\n").unwrap();
        let config = load_optional_config(None, dir.path()).unwrap();
        assert_eq!(config.search.max_capacity, 9);
    }

    #[test]
    fn explicit_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_optional_config(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
