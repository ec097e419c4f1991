//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::SimConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<SimConfig, ConfigError> {
    let config: SimConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("auv-config-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "[rate_limit]\nrequests_per_window = 10\nwindow_secs = 5\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.rate_limit.requests_per_window, 10);
        assert_eq!(config.rate_limit.window_secs, 5);
        assert_eq!(config.rate_limit.block_secs, 300);

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_config("[rate_limit\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_semantic_error_message_lists_fields() {
        let err = parse_config("[rate_limit]\nblock_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("rate_limit.block_secs"));
    }
}
