//! Configuration for the realtime console.
//!
//! Configuration is loaded from environment variables (after a `.env` pass in
//! `main`), optionally overridden by a YAML file. Priority: YAML > ENV vars >
//! defaults.
//!
//! # Example
//! ```rust,no_run
//! use voicerag::config::AppConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = AppConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallback
//! let config = AppConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("retrieval backend at {}", config.retrieval_url);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::core::session::TransportConfig;

const DEFAULT_TOKEN_URL: &str = "http://localhost:3000/token";
const DEFAULT_NEGOTIATION_URL: &str = "https://api.openai.com/v1/realtime";
const DEFAULT_MODEL: &str = "gpt-4o-realtime-preview-2024-12-17";
const DEFAULT_RETRIEVAL_URL: &str = "http://localhost:5000";
const DEFAULT_RETRIEVAL_TOOL: &str = "retrieve_documents";
const DEFAULT_CHANNEL_LABEL: &str = "oai-events";

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Endpoint minting the ephemeral session credential
    pub token_url: String,
    /// Remote model endpoint for session negotiation
    pub negotiation_url: String,
    /// Model variant requested during negotiation
    pub model: String,
    /// Base URL of the retrieval backend
    pub retrieval_url: String,
    /// Tool name whose invocations are served by retrieval
    pub retrieval_tool: String,
    /// Data channel label
    pub channel_label: String,
}

/// Optional-field mirror of [`AppConfig`] for YAML files.
///
/// All fields are optional so a file can override only part of the
/// configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct YamlConfig {
    token_url: Option<String>,
    negotiation_url: Option<String>,
    model: Option<String>,
    retrieval_url: Option<String>,
    retrieval_tool: Option<String>,
    channel_label: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self {
            token_url: env_or("VOICERAG_TOKEN_URL", DEFAULT_TOKEN_URL),
            negotiation_url: env_or("VOICERAG_NEGOTIATION_URL", DEFAULT_NEGOTIATION_URL),
            model: env_or("VOICERAG_MODEL", DEFAULT_MODEL),
            retrieval_url: env_or("VOICERAG_RETRIEVAL_URL", DEFAULT_RETRIEVAL_URL),
            retrieval_tool: env_or("VOICERAG_RETRIEVAL_TOOL", DEFAULT_RETRIEVAL_TOOL),
            channel_label: env_or("VOICERAG_CHANNEL_LABEL", DEFAULT_CHANNEL_LABEL),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to environment
    /// variables (and defaults) for fields the file omits.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file {}: {e}", path.display()))?;
        let yaml: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("failed to parse config file {}: {e}", path.display()))?;

        let base = Self::from_env()?;
        let config = Self {
            token_url: yaml.token_url.unwrap_or(base.token_url),
            negotiation_url: yaml.negotiation_url.unwrap_or(base.negotiation_url),
            model: yaml.model.unwrap_or(base.model),
            retrieval_url: yaml.retrieval_url.unwrap_or(base.retrieval_url),
            retrieval_tool: yaml.retrieval_tool.unwrap_or(base.retrieval_tool),
            channel_label: yaml.channel_label.unwrap_or(base.channel_label),
        };
        config.validate()?;
        Ok(config)
    }

    /// Transport slice of the configuration.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            token_url: self.token_url.clone(),
            negotiation_url: self.negotiation_url.clone(),
            model: self.model.clone(),
            channel_label: self.channel_label.clone(),
        }
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        for (field, value) in [
            ("token_url", &self.token_url),
            ("negotiation_url", &self.negotiation_url),
            ("model", &self.model),
            ("retrieval_url", &self.retrieval_url),
            ("retrieval_tool", &self.retrieval_tool),
            ("channel_label", &self.channel_label),
        ] {
            if value.trim().is_empty() {
                return Err(format!("configuration field {field} must not be empty").into());
            }
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "VOICERAG_TOKEN_URL",
            "VOICERAG_NEGOTIATION_URL",
            "VOICERAG_MODEL",
            "VOICERAG_RETRIEVAL_URL",
            "VOICERAG_RETRIEVAL_TOOL",
            "VOICERAG_CHANNEL_LABEL",
        ] {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.retrieval_tool, "retrieve_documents");
        assert_eq!(config.channel_label, "oai-events");
    }

    #[test]
    #[serial]
    fn test_env_override() {
        clear_env();
        unsafe { std::env::set_var("VOICERAG_RETRIEVAL_URL", "http://rag.internal:8080") };
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.retrieval_url, "http://rag.internal:8080");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_yaml_overrides_env() {
        clear_env();
        unsafe { std::env::set_var("VOICERAG_MODEL", "env-model") };
        let dir = std::env::temp_dir();
        let path = dir.join("voicerag-config-test.yaml");
        std::fs::write(&path, "model: yaml-model\nretrieval_tool: search_docs\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.model, "yaml-model");
        assert_eq!(config.retrieval_tool, "search_docs");
        // Fields absent from the file keep their env/default values.
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);

        std::fs::remove_file(&path).ok();
        clear_env();
    }

    #[test]
    #[serial]
    fn test_empty_field_rejected() {
        clear_env();
        unsafe { std::env::set_var("VOICERAG_MODEL", "  ") };
        assert!(AppConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_transport_slice() {
        let config = AppConfig {
            token_url: "http://t".into(),
            negotiation_url: "http://n".into(),
            model: "m".into(),
            retrieval_url: "http://r".into(),
            retrieval_tool: "retrieve_documents".into(),
            channel_label: "oai-events".into(),
        };
        let transport = config.transport();
        assert_eq!(transport.token_url, "http://t");
        assert_eq!(transport.channel_label, "oai-events");
    }
}
