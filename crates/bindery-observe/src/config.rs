//! Observer defaults and their file-based loading.
//!
//! [`ObserverConfig`] always exists; the `config` feature adds serde support
//! and the TOML/JSON loaders.
//!
//! ```toml
//! optional = false
//! observable = true
//! stable_paths = false
//! fake_member_prefixes = ["_fake"]
//! coalesce_updates = true
//! ```

use crate::observer::ObserverFlags;

/// Defaults applied by [`ObserverProvider`](crate::provider::ObserverProvider)
/// and the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ObserverConfig {
    /// Missing members resolve to "unavailable" instead of an error.
    pub optional: bool,
    /// Subscribe to intermediate links and re-resolve on change.
    pub observable: bool,
    /// Member chains never change shape; re-resolution only re-reads values.
    pub stable_paths: bool,
    /// Segment prefixes that resolve to a permissive placeholder member.
    pub fake_member_prefixes: Vec<String>,
    /// Run one follow-up pass when a change lands during resolution.
    pub coalesce_updates: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            optional: false,
            observable: true,
            stable_paths: false,
            fake_member_prefixes: vec!["_fake".to_string()],
            coalesce_updates: true,
        }
    }
}

impl ObserverConfig {
    /// Observer flags implied by this configuration.
    #[must_use]
    pub fn default_flags(&self) -> ObserverFlags {
        let mut flags = ObserverFlags::empty();
        flags.set(ObserverFlags::OPTIONAL, self.optional);
        flags.set(ObserverFlags::OBSERVABLE, self.observable);
        flags.set(ObserverFlags::HAS_STABLE_PATH, self.stable_paths);
        flags
    }
}

#[cfg(feature = "config")]
mod load {
    use std::path::Path;

    use thiserror::Error;

    use super::ObserverConfig;

    #[derive(Debug, Error)]
    pub enum ConfigError {
        #[error("invalid observer config (toml): {0}")]
        Toml(#[from] toml::de::Error),
        #[error("invalid observer config (json): {0}")]
        Json(#[from] serde_json::Error),
        #[error("cannot read observer config: {0}")]
        Io(#[from] std::io::Error),
    }

    impl ObserverConfig {
        pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
            Ok(toml::from_str(text)?)
        }

        pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
            Ok(serde_json::from_str(text)?)
        }

        /// Load from a file; `.json` files are read as JSON, anything else
        /// as TOML.
        pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)?;
            let config = if path.extension().is_some_and(|ext| ext == "json") {
                Self::from_json_str(&text)?
            } else {
                Self::from_toml_str(&text)?
            };
            tracing::debug!(path = %path.display(), ?config, "loaded observer config");
            Ok(config)
        }
    }
}

#[cfg(feature = "config")]
pub use load::ConfigError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ObserverConfig::default();
        assert_eq!(config.fake_member_prefixes, ["_fake"]);
        assert_eq!(
            config.default_flags(),
            ObserverFlags::OBSERVABLE
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ObserverConfig::from_toml_str("optional = true").unwrap();
        assert!(config.optional);
        assert!(config.observable);
        assert!(config.coalesce_updates);
        assert!(config.default_flags().contains(ObserverFlags::OPTIONAL));
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_and_errors() {
        let config =
            ObserverConfig::from_json_str(r#"{"fake_member_prefixes": ["$", "_x"]}"#).unwrap();
        assert_eq!(config.fake_member_prefixes, ["$", "_x"]);
        assert!(matches!(
            ObserverConfig::from_toml_str("optional = 3"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            ObserverConfig::from_json_str("{"),
            Err(ConfigError::Json(_))
        ));
    }
}
