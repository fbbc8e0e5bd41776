//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the framework.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::app::DebugLevel;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Debug level and diagnostic detail.
    pub debug: DebugConfig,

    /// Page output and asset discovery.
    pub output: OutputConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
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

/// Debug configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Current debug level.
    pub level: DebugLevel,

    /// Highest level that still shows diagnostic detail on error pages.
    /// Must be below `prod`.
    pub detail_threshold: DebugLevel,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            level: DebugLevel::Prod,
            detail_threshold: DebugLevel::Beta,
        }
    }
}

/// Output and page asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Title used when a page sets none.
    pub site_name: String,

    /// Directory served as the public web root.
    pub public_dir: String,

    /// CSS directory inside the public root, with trailing slash.
    pub css_dir: String,

    /// JS directory inside the public root, with trailing slash.
    pub js_dir: String,

    /// Add `pages/<controller>.css` automatically when it exists.
    pub auto_add_page_css: bool,

    /// Add `pages/<controller>.js` automatically when it exists.
    pub auto_add_page_js: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            site_name: "Maverick".to_string(),
            public_dir: "public".to_string(),
            css_dir: "css/".to_string(),
            js_dir: "js/".to_string(),
            auto_add_page_css: true,
            auto_add_page_js: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.debug.level, DebugLevel::Prod);
        assert_eq!(config.debug.detail_threshold, DebugLevel::Beta);
        assert!(config.output.auto_add_page_css);
    }

    #[test]
    fn test_parse_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [debug]
            level = "dev"

            [output]
            site_name = "Example"
            auto_add_page_js = false
            "#,
        )
        .unwrap();
        assert_eq!(config.debug.level, DebugLevel::Dev);
        assert_eq!(config.output.site_name, "Example");
        assert!(!config.output.auto_add_page_js);
        assert_eq!(config.output.css_dir, "css/");
    }

    #[test]
    fn test_debug_level_by_name_or_code() {
        let config: AppConfig = toml::from_str(
            r#"
            [debug]
            level = 1005
            detail_threshold = "Test"
            "#,
        )
        .unwrap();
        assert_eq!(config.debug.level, DebugLevel::Dev);
        assert_eq!(config.debug.detail_threshold, DebugLevel::Test);

        assert!(toml::from_str::<AppConfig>("[debug]\nlevel = 999\n").is_err());
        assert!(toml::from_str::<AppConfig>("[debug]\nlevel = \"staging\"\n").is_err());
    }
}
