use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

/// Controller settings as given by one source (config file or command line).
/// Every field is optional; sources are merged before validation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    /// Percent
    pub boost: Option<u32>,
    /// Percent
    pub low_power: Option<u32>,
    /// Milliseconds
    pub boost_time: Option<u64>,
    /// Milliseconds
    pub low_power_time: Option<u64>,
    pub coder: Option<bool>,
}

impl RawConfig {
    /// Fills unset fields of `self` from `fallback`.
    pub fn merge(self, fallback: RawConfig) -> RawConfig {
        RawConfig {
            boost: self.boost.or(fallback.boost),
            low_power: self.low_power.or(fallback.low_power),
            boost_time: self.boost_time.or(fallback.boost_time),
            low_power_time: self.low_power_time.or(fallback.low_power_time),
            coder: match (self.coder, fallback.coder) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (ours, theirs) => ours.or(theirs),
            },
        }
    }
}

pub fn parse_config(content: &str) -> Result<RawConfig> {
    toml::from_str(content).with_context(|| "Failed to parse config")
}

pub fn config_read(config_file: &Path) -> Result<RawConfig> {
    let content = std::fs::read_to_string(config_file)
        .with_context(|| format!("Failed to open config file: {}", config_file.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Invalid config file: {}", config_file.display()))?;

    info!("Loaded config file: {}", config_file.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kebab_case_keys() {
        let config = parse_config(
            r#"
            boost = 70
            low-power = 30
            boost-time = 1000
            low-power-time = 5000
            coder = true
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            RawConfig {
                boost: Some(70),
                low_power: Some(30),
                boost_time: Some(1000),
                low_power_time: Some(5000),
                coder: Some(true),
            }
        );
    }

    #[test]
    fn partial_file_leaves_rest_unset() {
        let config = parse_config("boost-time = 250").unwrap();
        assert_eq!(config.boost_time, Some(250));
        assert_eq!(config.boost, None);
        assert_eq!(config.coder, None);
    }

    #[test]
    fn rejects_unknown_and_negative_values() {
        assert!(parse_config("boost-threshold = 70").is_err());
        assert!(parse_config("boost = -1").is_err());
    }

    #[test]
    fn command_line_wins_over_file() {
        let cli = RawConfig {
            boost: Some(90),
            coder: None,
            ..Default::default()
        };
        let file = RawConfig {
            boost: Some(70),
            low_power: Some(20),
            coder: Some(true),
            ..Default::default()
        };

        let merged = cli.merge(file);
        assert_eq!(merged.boost, Some(90));
        assert_eq!(merged.low_power, Some(20));
        assert_eq!(merged.boost_time, None);
        assert_eq!(merged.coder, Some(true));
    }

    #[test]
    fn config_read_reports_missing_file() {
        let err = config_read(Path::new("/nonexistent/powermizer.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to open config file"));
    }
}
