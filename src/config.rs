//! Node configuration: the `NodeConfig` document a deployment hands the
//! daemon via `--config` (spec §6), environment-variable interpolation, and
//! development/production presets.
//!
//! Parsing the YAML grammar itself is out of scope (spec §1's "Configuration
//! file parsing... out of scope" non-goal) — the core only consumes an
//! already-parsed [`NodeConfig`]. [`NodeConfig::load_from_file`] reads the
//! file as a JSON document after interpolation (JSON is valid YAML 1.2), the
//! same way the base crate's `RouterConfig::load_from_file` round-trips
//! through `serde_json` rather than embedding a YAML parser.

use crate::did::Did;
use crate::domain_types::WorkerThreadCount;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised loading or validating a [`NodeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// `logging.{level,file,console,maxFileSize,maxHistory}` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub console: bool,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: String,
    #[serde(default = "default_max_history")]
    pub max_history: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            console: true,
            max_file_size: default_max_file_size(),
            max_history: default_max_history(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> String {
    "10MB".to_string()
}

fn default_max_history() -> u32 {
    7
}

/// `metrics.{enabled,port,endpoint}` (spec §6). Optional: a node with no
/// `metrics` entry in its document gets `Default::default()` (disabled).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_string()
}

/// `management.{port}` — ambient management HTTP surface (spec §9's
/// "management HTTP surface... distinct from the HSTP transport bindings"),
/// separate from `metrics`'s own port since the two surfaces serve
/// different operators (health/activity introspection vs. a scrape target).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementConfig {
    #[serde(default = "default_management_port")]
    pub port: u16,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            port: default_management_port(),
        }
    }
}

fn default_management_port() -> u16 {
    8080
}

/// `security.tls.{enabled,certFile,keyFile}` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub cert_file: Option<PathBuf>,
    #[serde(default)]
    pub key_file: Option<PathBuf>,
}

/// One entry of `security.authentication.users[]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// `security.authentication.{enabled,type,users[]}` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename = "type")]
    pub auth_type: Option<String>,
    #[serde(default)]
    pub users: Vec<AuthUser>,
}

/// `security.{tls,authentication}` (spec §6). Optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub authentication: AuthenticationConfig,
}

/// `concurrency.workerThreadCount` (spec §5's "shared thread pool" model):
/// the size of the tokio runtime the daemon builds to drive the engine,
/// transport bindings, and activity executions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConcurrencyConfig {
    #[serde(default)]
    pub worker_thread_count: WorkerThreadCount,
}

/// The top-level document a `--config` path resolves to (spec §6).
///
/// `transports` is a list of paths to the per-transport config files
/// described in spec §6's "Transport configuration" — each such file
/// deserializes independently as `Vec<`[`crate::transport::TransportConfig`]`>`
/// via [`NodeConfig::load_transport_configs`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub node_id: Did,
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub transports: Vec<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    #[serde(default)]
    pub management: ManagementConfig,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl NodeConfig {
    /// A development preset: verbose console logging, no TLS, no transport
    /// files (a caller wires bindings programmatically in-process).
    #[must_use]
    pub fn development(node_id: Did) -> Self {
        Self {
            node_id,
            name: "hstp-node-dev".to_string(),
            version: default_version(),
            description: Some("development node".to_string()),
            transports: Vec::new(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                ..LoggingConfig::default()
            },
            metrics: MetricsConfig::default(),
            security: SecurityConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            management: ManagementConfig::default(),
        }
    }

    /// A production preset: quieter logging, metrics enabled, TLS expected
    /// to be filled in by the operator.
    #[must_use]
    pub fn production(node_id: Did) -> Self {
        Self {
            node_id,
            name: "hstp-node".to_string(),
            version: default_version(),
            description: None,
            transports: Vec::new(),
            logging: LoggingConfig {
                level: "warn".to_string(),
                console: false,
                ..LoggingConfig::default()
            },
            metrics: MetricsConfig {
                enabled: true,
                ..MetricsConfig::default()
            },
            security: SecurityConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            management: ManagementConfig::default(),
        }
    }

    /// Validates cross-field invariants beyond what `serde` already
    /// enforces.
    ///
    /// # Errors
    /// Returns [`ConfigError::Validation`] if `name` is empty, or if TLS is
    /// enabled without both a cert and key file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.security.tls.enabled && (self.security.tls.cert_file.is_none() || self.security.tls.key_file.is_none())
        {
            return Err(ConfigError::Validation {
                field: "security.tls".to_string(),
                reason: "certFile and keyFile are both required when tls.enabled is true".to_string(),
            });
        }
        if self.metrics.enabled && self.metrics.endpoint.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "metrics.endpoint".to_string(),
                reason: "must not be empty when metrics.enabled is true".to_string(),
            });
        }
        if self.concurrency.worker_thread_count.as_usize() > num_cpus::get() * 2 {
            return Err(ConfigError::Validation {
                field: "concurrency.workerThreadCount".to_string(),
                reason: format!("should not exceed 2x CPU cores ({})", num_cpus::get() * 2),
            });
        }
        Ok(())
    }

    /// Reads `path`, interpolates `${VAR}`/`${VAR:-default}` references
    /// against the process environment, parses the result, and validates
    /// it.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it does not deserialize, or
    /// [`ConfigError::Validation`] if it fails [`NodeConfig::validate`].
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let interpolated = interpolate_env(&raw);
        let config: Self = serde_json::from_str(&interpolated)?;
        config.validate()?;
        Ok(config)
    }
}

/// Replaces every `${VAR}` or `${VAR:-default}` reference in `input` with
/// the named environment variable's value, or `default` if the variable is
/// unset (spec §6). Unset variables with no default are left as an empty
/// string.
#[must_use]
pub fn interpolate_env(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '$' && input[i..].starts_with("${") {
            if let Some(end) = input[i..].find('}') {
                let inner = &input[i + 2..i + end];
                let (name, default) = match inner.split_once(":-") {
                    Some((name, default)) => (name, Some(default)),
                    None => (inner, None),
                };
                let value = std::env::var(name).ok().or_else(|| default.map(str::to_string)).unwrap_or_default();
                output.push_str(&value);
                for _ in 0..end {
                    chars.next();
                }
                continue;
            }
        }
        output.push(c);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_node_id() -> Did {
        "did:example:node1".parse().unwrap()
    }

    #[test]
    fn development_preset_is_valid() {
        assert!(NodeConfig::development(dev_node_id()).validate().is_ok());
    }

    #[test]
    fn production_preset_is_valid() {
        assert!(NodeConfig::production(dev_node_id()).validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut config = NodeConfig::development(dev_node_id());
        config.name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn tls_enabled_without_files_is_rejected() {
        let mut config = NodeConfig::development(dev_node_id());
        config.security.tls.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn interpolates_var_with_and_without_default() {
        unsafe {
            std::env::set_var("HSTP_TEST_VAR", "value1");
        }
        assert_eq!(interpolate_env("prefix-${HSTP_TEST_VAR}-suffix"), "prefix-value1-suffix");
        assert_eq!(interpolate_env("${HSTP_TEST_UNSET:-fallback}"), "fallback");
        unsafe {
            std::env::remove_var("HSTP_TEST_VAR");
        }
    }

    #[test]
    fn round_trips_through_json() {
        let config = NodeConfig::development(dev_node_id());
        let json = serde_json::to_string(&config).unwrap();
        let parsed: NodeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.node_id, parsed.node_id);
        assert_eq!(config.name, parsed.name);
    }
}
