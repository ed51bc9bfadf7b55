use serde::{Deserialize, Serialize};

/// Settings for validating and running a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Collect recoverable errors instead of stopping at the first one.
    pub continue_on_error: bool,
    /// The axis type given to a CoordinateSystem that has none.
    pub default_axis_type: String,
    /// How wrappers and auto-created Parameters are managed.
    pub manage: Manage,
    /// Log a warning when an unknown identifier is treated as a string.
    pub warn_on_default_string: bool,
    /// The number of iterations after which a While loop is stopped with an error.
    pub max_loop_iterations: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            default_axis_type: "MJ2000Eq".to_string(),
            manage: Manage::default(),
            warn_on_default_string: false,
            max_loop_iterations: 100_000,
        }
    }
}

impl ValidatorConfig {
    /// Parse a config from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the config as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Where the objects that commands refer to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Manage {
    /// Objects are not managed; commands are accepted without creating wrappers.
    None,
    /// Objects belong to the script configuration.
    Configuration,
    /// Objects belong to the local store of a function body.
    Function,
}

impl Default for Manage {
    fn default() -> Self {
        Self::Configuration
    }
}
