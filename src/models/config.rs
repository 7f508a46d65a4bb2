use serde::{Deserialize, Serialize};

/// Adapter configuration from `reactive-query.yaml`
///
/// Every field has a default, so a partial (or missing) file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Client key used when query options carry no `queryClientKey`
    pub default_client_key: Option<String>,

    /// Capacity of each state container's change-event channel
    pub change_buffer: usize,

    pub logging: LoggingSettings,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            default_client_key: None,
            change_buffer: default_change_buffer(),
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_dir: String,
    pub log_prefix: String,
    pub debug_mode: bool,
    pub console_output: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_prefix: "reactive-query".to_string(),
            debug_mode: false,
            console_output: false,
        }
    }
}

fn default_change_buffer() -> usize {
    100
}
