//! Configuration loaders.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::schema::Configuration;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading a [`Configuration`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}: {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document was not valid configuration JSON.
    #[error("invalid configuration: {source}")]
    Parse {
        /// Underlying decoding error.
        #[from]
        source: serde_json::Error,
    },
}

impl Configuration {
    /// Parses a configuration from a JSON document such as
    /// `{"actions": {"customers": {"create": true}}, "context": {"account": "acct_123"}}`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed.
    pub fn from_json_str(input: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are malformed.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        debug!(path = %path.display(), "loaded toolkit configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Permission;
    use toolkit_primitives::Mode;

    #[test]
    fn parses_nested_document() {
        let config = Configuration::from_json_str(
            r#"{
                "actions": {
                    "customers": { "create": true, "read": true },
                    "invoices": { "update": false }
                },
                "context": { "account": "acct_123", "mode": "toolkit" }
            }"#,
        )
        .unwrap();

        let actions = config.effective_actions().unwrap();
        assert!(actions.allows("customers", Permission::Create));
        assert!(!actions.allows("invoices", Permission::Update));
        let context = config.context_or_default();
        assert_eq!(context.account.as_deref(), Some("acct_123"));
        assert_eq!(context.mode, Some(Mode::Toolkit));
    }

    #[test]
    fn empty_document_is_valid() {
        let config = Configuration::from_json_str("{}").unwrap();
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn rejects_non_boolean_permission() {
        let err = Configuration::from_json_str(r#"{"actions":{"customers":{"create":"yes"}}}"#)
            .expect_err("string permission should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Configuration::from_path("/nonexistent/toolkit.json").expect_err("missing file");
        assert!(err.to_string().contains("/nonexistent/toolkit.json"));
    }
}
