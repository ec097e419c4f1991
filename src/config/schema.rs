//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::sim::VehicleParams;

/// Root configuration for the simulator service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SimConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Per-client rate limiting and blocking.
    pub rate_limit: RateLimitConfig,

    /// Body inspection settings.
    pub validation: ValidationConfig,

    /// Request metadata filtering.
    pub filter: FilterConfig,

    /// Physics loop settings.
    pub simulation: SimulationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Sliding-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests a client may make inside one window.
    pub requests_per_window: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// How long a client stays blocked after exceeding its quota.
    pub block_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 300,
            window_secs: 60,
            block_secs: 300,
        }
    }
}

/// A named denylist pattern appended after the built-in categories.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PatternConfig {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum serialized size of a decoded JSON body.
    pub max_payload_bytes: usize,

    /// Additional denylist patterns.
    pub extra_patterns: Vec<PatternConfig>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 1024,
            extra_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Maximum declared Content-Length in bytes.
    pub max_content_length: u64,

    /// Case-insensitive substrings that mark a scanner or scripted client.
    pub blocked_user_agents: Vec<String>,

    /// Request header names that are refused outright.
    pub forbidden_headers: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_content_length: 10 * 1024,
            blocked_user_agents: [
                "sqlmap", "nikto", "nmap", "nessus", "masscan", "burp", "zaproxy",
                "metasploit", "curl", "wget",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            forbidden_headers: ["x-forwarded-for", "x-real-ip", "x-originating-ip"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Integration step in milliseconds.
    pub step_ms: u64,

    /// Physical constants of the simulated vehicle.
    pub vehicle: VehicleParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_ms: 20,
            vehicle: VehicleParams::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: SimConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.validation.max_payload_bytes, 1024);
        assert_eq!(config.filter.max_content_length, 10240);
        assert_eq!(config.filter.blocked_user_agents.len(), 10);
        assert_eq!(config.simulation.step_ms, 20);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_override() {
        let config: SimConfig = toml::from_str(
            r#"
            [rate_limit]
            requests_per_window = 5

            [observability]
            log_format = "json"

            [[validation.extra_patterns]]
            name = "ldap"
            pattern = "\\(\\|"
            "#,
        )
        .unwrap();
        assert_eq!(config.rate_limit.requests_per_window, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.validation.extra_patterns[0].name, "ldap");
    }
}
