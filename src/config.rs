//! Runtime settings read from the environment (after `.env` is loaded).

use std::env;

pub const DEFAULT_DATA_SOURCE: &str = "vehicle_maintenance_data.csv";
pub const DEFAULT_LOG_FILE: &str = "logs/vehicle_dashboard.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Path or HTTP(S) URL of the dataset CSV (optionally gzip-compressed).
    pub data_source: String,
    /// Bearer token for remote data sources.
    pub data_token: Option<String>,
    /// JSON file replacing the built-in accounts.
    pub credentials_file: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub log_file: String,
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            data_source: get("DASHBOARD_DATA_SOURCE")
                .unwrap_or_else(|| DEFAULT_DATA_SOURCE.to_string()),
            data_token: get("DASHBOARD_DATA_TOKEN"),
            credentials_file: get("DASHBOARD_CREDENTIALS_FILE"),
            username: get("DASHBOARD_USERNAME"),
            password: get("DASHBOARD_PASSWORD"),
            log_file: get("LOG_FILE_PATH").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::from_lookup(|_| None);

        assert_eq!(config.data_source, DEFAULT_DATA_SOURCE);
        assert_eq!(config.log_file, DEFAULT_LOG_FILE);
        assert_eq!(config.data_token, None);
        assert_eq!(config.username, None);
    }

    #[test]
    fn test_values_and_blanks() {
        let vars: HashMap<&str, &str> = [
            ("DASHBOARD_DATA_SOURCE", "https://example.com/data.csv.gz"),
            ("DASHBOARD_DATA_TOKEN", "  "),
            ("DASHBOARD_USERNAME", "analyst"),
        ]
        .into_iter()
        .collect();
        let config = DashboardConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.data_source, "https://example.com/data.csv.gz");
        assert_eq!(config.data_token, None);
        assert_eq!(config.username.as_deref(), Some("analyst"));
    }
}
