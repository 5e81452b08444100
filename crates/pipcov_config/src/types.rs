//! Configuration types deserialized from `pipcov.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// The top-level run configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipcovConfig {
    /// Where device descriptions are found.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Coverage search limits.
    #[serde(default)]
    pub search: SearchConfig,
    /// Edge cost parameters.
    #[serde(default)]
    pub costs: CostConfig,
    /// Relocation settings.
    #[serde(default)]
    pub relocation: RelocationConfig,
}

/// `[device]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Directory holding `<device>.pcdev` blobs.
    pub data_dir: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("devices"),
        }
    }
}

/// `[search]` section: limits applied to every configuration of a run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Maximum number of Cuts in one configuration.
    pub max_capacity: usize,
    /// Base wall-clock budget per configuration, scaled up with coverage.
    pub time_budget_secs: f64,
    /// Extra edges allowed on top of a PIP's minimum path length.
    pub length_slack: u32,
    /// Cut attempts per configuration before giving up on it.
    pub max_attempts: usize,
    /// Chebyshev radius of the routing window around the origin.
    pub window_radius: i32,
    /// Window radius used with `--local`.
    pub local_radius: i32,
    /// Number of configurations between stall checks.
    pub stall_window: usize,
    /// Minimum relative queue reduction per stall window.
    pub stall_ratio: f64,
    /// Upper bound on configurations built in one run.
    pub max_configs: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_capacity: 64,
            time_budget_secs: 60.0,
            length_slack: 6,
            max_attempts: 400,
            window_radius: 4,
            local_radius: 1,
            stall_window: 4,
            stall_ratio: 0.3,
            max_configs: 256,
        }
    }
}

/// `[costs]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostConfig {
    /// Cost of every edge before penalties.
    pub base: f64,
    /// Added to LUT route-through edges.
    pub route_through_penalty: f64,
    /// Added to edges entering a muxed logic output.
    pub mux_penalty: f64,
    /// Added to a PIP once a Cut covers it.
    pub covered_pip_penalty: f64,
    /// Added to a PIP whose path came out too long.
    pub over_length_penalty: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            base: 1.0,
            route_through_penalty: 4.0,
            mux_penalty: 2.0,
            covered_pip_penalty: 8.0,
            over_length_penalty: 16.0,
        }
    }
}

/// `[relocation]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelocationConfig {
    /// Worker threads for region-sharded relocation; 0 uses rayon's default.
    pub workers: usize,
}
