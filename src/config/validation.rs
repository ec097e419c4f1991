//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and that every
//! configured pattern and address actually parses. All problems are
//! reported together rather than stopping at the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::SimConfig;
use crate::security::validation::build_pattern;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &SimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            "must be a socket address",
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    let rate = &config.rate_limit;
    if rate.requests_per_window == 0 {
        errors.push(ValidationError::new("rate_limit.requests_per_window", "must be > 0"));
    }
    if rate.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be > 0"));
    }
    if rate.block_secs == 0 {
        errors.push(ValidationError::new("rate_limit.block_secs", "must be > 0"));
    }

    if config.validation.max_payload_bytes == 0 {
        errors.push(ValidationError::new("validation.max_payload_bytes", "must be > 0"));
    }
    for (i, extra) in config.validation.extra_patterns.iter().enumerate() {
        let field = format!("validation.extra_patterns[{}]", i);
        if extra.name.trim().is_empty() {
            errors.push(ValidationError::new(&field, "name must not be empty"));
        }
        if let Err(e) = build_pattern(&extra.pattern) {
            errors.push(ValidationError::new(&field, format!("invalid pattern: {}", e)));
        }
    }

    if config.filter.max_content_length == 0 {
        errors.push(ValidationError::new("filter.max_content_length", "must be > 0"));
    }
    if config.filter.blocked_user_agents.iter().any(|ua| ua.is_empty()) {
        errors.push(ValidationError::new(
            "filter.blocked_user_agents",
            "entries must not be empty",
        ));
    }

    if config.simulation.step_ms == 0 {
        errors.push(ValidationError::new("simulation.step_ms", "must be > 0"));
    }
    if config.simulation.vehicle.mass <= 0.0 {
        errors.push(ValidationError::new("simulation.vehicle.mass", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PatternConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SimConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = SimConfig::default();
        config.rate_limit.window_secs = 0;
        config.rate_limit.requests_per_window = 0;
        config.listener.bind_address = "not-an-address".into();
        config.validation.extra_patterns.push(PatternConfig {
            name: "broken".into(),
            pattern: "(unclosed".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(errors.len(), 4);
        assert!(fields.contains(&"rate_limit.window_secs"));
        assert!(fields.contains(&"rate_limit.requests_per_window"));
        assert!(fields.contains(&"listener.bind_address"));
        assert!(fields.contains(&"validation.extra_patterns[0]"));
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = SimConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
