//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Outbound forwarding settings (enabled when `FORWARD_URL` is set)
#[derive(Debug, Clone)]
pub struct ForwardConfig {
    pub url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Delivery attempts per result, at least 1
    pub max_attempts: u32,

    /// Results waiting for delivery before new ones are dropped
    pub queue_capacity: usize,

    /// Delay unit between attempts (attempt n waits n × backoff)
    pub backoff: Duration,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,

    /// Server port
    pub port: u16,

    pub model_path: PathBuf,
    pub threshold_path: PathBuf,

    /// Last raw request body (pretty JSON)
    pub last_payload_path: PathBuf,

    /// Last prediction result
    pub last_prediction_path: PathBuf,

    /// JSON array of every prediction
    pub audit_log_path: PathBuf,

    pub forward: Option<ForwardConfig>,

    /// Allowed CORS origin (any when unset)
    pub cors_origin: Option<String>,

    /// Environment (development, production)
    pub environment: String,
}

fn var_or<T: std::str::FromStr + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}

fn path_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> PathBuf {
    PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let forward = lookup("FORWARD_URL")
            .filter(|url| !url.trim().is_empty())
            .map(|url| ForwardConfig {
                url,
                timeout: Duration::from_secs(var_or(&lookup, "FORWARD_TIMEOUT_SECS", 5)),
                max_attempts: var_or(&lookup, "FORWARD_MAX_ATTEMPTS", 3u32).max(1),
                queue_capacity: var_or(&lookup, "FORWARD_QUEUE_CAPACITY", 256usize).max(1),
                backoff: Duration::from_millis(var_or(&lookup, "FORWARD_BACKOFF_MS", 500)),
            });

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),

            port: var_or(&lookup, "PORT", 9000),

            model_path: path_or(&lookup, "MODEL_PATH", "model/fraud_pipeline.json"),

            threshold_path: path_or(&lookup, "THRESHOLD_PATH", "model/optimal_threshold.json"),

            last_payload_path: path_or(&lookup, "LAST_PAYLOAD_PATH", "last_payload.json"),

            last_prediction_path: path_or(&lookup, "LAST_PREDICTION_PATH", "last_prediction.json"),

            audit_log_path: path_or(&lookup, "AUDIT_LOG_PATH", "logs/audit-log.json"),

            forward,

            cors_origin: lookup("CORS_ORIGIN").filter(|o| !o.trim().is_empty()),

            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.model_path, PathBuf::from("model/fraud_pipeline.json"));
        assert_eq!(config.audit_log_path, PathBuf::from("logs/audit-log.json"));
        assert!(config.forward.is_none());
        assert!(config.cors_origin.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_forwarding_settings() {
        let config = Config::from_lookup(lookup(&[
            ("FORWARD_URL", "http://relay.local/results"),
            ("FORWARD_MAX_ATTEMPTS", "0"),
            ("FORWARD_BACKOFF_MS", "20"),
            ("PORT", "not-a-port"),
        ]));
        let forward = config.forward.unwrap();
        assert_eq!(forward.url, "http://relay.local/results");
        assert_eq!(forward.max_attempts, 1);
        assert_eq!(forward.queue_capacity, 256);
        assert_eq!(forward.timeout, Duration::from_secs(5));
        assert_eq!(forward.backoff, Duration::from_millis(20));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_blank_values_disable_optional_settings() {
        let config = Config::from_lookup(lookup(&[
            ("FORWARD_URL", "  "),
            ("CORS_ORIGIN", ""),
            ("ENVIRONMENT", "production"),
        ]));
        assert!(config.forward.is_none());
        assert!(config.cors_origin.is_none());
        assert!(config.is_production());
    }

    #[test]
    fn test_numeric_values_are_trimmed_and_bad_ones_fall_back() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", " 8080 "),
            ("FORWARD_URL", "http://relay.local"),
            ("FORWARD_TIMEOUT_SECS", "-3"),
            ("FORWARD_QUEUE_CAPACITY", "64"),
        ]));
        assert_eq!(config.port, 8080);
        let forward = config.forward.unwrap();
        assert_eq!(forward.timeout, Duration::from_secs(5));
        assert_eq!(forward.queue_capacity, 64);
    }
}
