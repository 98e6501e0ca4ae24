use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::error::TrackingResult;

/// Root tracking configuration. Loaded from environment variables
/// with the prefix `ECOMMERCE_TRACKING__` and an optional TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingConfig {
    /// Per-site Google Analytics settings. `None` means no configuration
    /// could be resolved for the current site.
    #[serde(default)]
    pub google: Option<GoogleConfig>,
    #[serde(default)]
    pub enhanced: EnhancedEcommerceConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GoogleConfig {
    #[serde(default)]
    pub tracking_id: Option<String>,
    /// When set, the site uses the global site tag (gtag.js) and the
    /// Enhanced Ecommerce pipeline is bypassed.
    #[serde(default)]
    pub gtagcode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnhancedEcommerceConfig {
    #[serde(default = "default_template_prefix")]
    pub template_prefix: String,
    #[serde(default = "default_dependencies")]
    pub dependencies: Vec<String>,
}

// Default functions
fn default_template_prefix() -> String {
    "analytics/enhanced".to_string()
}
fn default_dependencies() -> Vec<String> {
    vec!["ec".to_string()]
}

impl Default for EnhancedEcommerceConfig {
    fn default() -> Self {
        Self {
            template_prefix: default_template_prefix(),
            dependencies: default_dependencies(),
        }
    }
}

impl TrackingConfig {
    /// Load configuration from an optional TOML file, overridden by
    /// environment variables.
    pub fn load_from(path: Option<&Path>) -> TrackingResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("ECOMMERCE_TRACKING")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("enhanced.dependencies"),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

// ─── Config resolution ──────────────────────────────────────────────────────

/// Resolves the analytics settings that apply to the current request.
pub trait ConfigResolver: Send + Sync {
    fn google_config(&self) -> Option<GoogleConfig>;
}

impl ConfigResolver for TrackingConfig {
    fn google_config(&self) -> Option<GoogleConfig> {
        self.google.clone()
    }
}

/// Resolver whose configuration can be swapped while trackers hold it.
#[derive(Clone, Default)]
pub struct SharedConfigResolver {
    inner: Arc<RwLock<TrackingConfig>>,
}

impl SharedConfigResolver {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn replace(&self, config: TrackingConfig) {
        *self.inner.write() = config;
    }

    pub fn snapshot(&self) -> TrackingConfig {
        self.inner.read().clone()
    }
}

impl ConfigResolver for SharedConfigResolver {
    fn google_config(&self) -> Option<GoogleConfig> {
        self.inner.read().google.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackingError;

    #[test]
    fn test_defaults() {
        let config = TrackingConfig::default();
        assert!(config.google.is_none());
        assert_eq!(config.enhanced.template_prefix, "analytics/enhanced");
        assert_eq!(config.enhanced.dependencies, vec!["ec".to_string()]);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: TrackingConfig = serde_json::from_str(
            r#"{"google": {"tracking_id": "UA-1234-1", "gtagcode": true}}"#,
        )
        .unwrap();
        let google = config.google.unwrap();
        assert_eq!(google.tracking_id.as_deref(), Some("UA-1234-1"));
        assert!(google.gtagcode);
        assert_eq!(config.enhanced.dependencies.len(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracking.toml");
        std::fs::write(
            &path,
            "[google]\ntracking_id = \"UA-42-1\"\n\n[enhanced]\ntemplate_prefix = \"custom/ec\"\n",
        )
        .unwrap();

        let config = TrackingConfig::load_from(Some(&path)).unwrap();
        assert_eq!(
            config.google.as_ref().and_then(|g| g.tracking_id.as_deref()),
            Some("UA-42-1")
        );
        assert!(!config.google.unwrap().gtagcode);
        assert_eq!(config.enhanced.template_prefix, "custom/ec");
        assert_eq!(config.enhanced.dependencies, vec!["ec".to_string()]);
    }

    #[test]
    fn test_load_from_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrackingConfig::load_from(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, TrackingError::Config(_)));
    }

    #[test]
    fn test_load_from_bad_value_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracking.toml");
        std::fs::write(&path, "[google]\ngtagcode = \"sometimes\"\n").unwrap();

        let err = TrackingConfig::load_from(Some(&path)).unwrap_err();
        assert!(matches!(err, TrackingError::Config(_)));
    }

    #[test]
    fn test_shared_resolver_replace() {
        let resolver = SharedConfigResolver::new(TrackingConfig::default());
        assert!(resolver.google_config().is_none());

        resolver.replace(TrackingConfig {
            google: Some(GoogleConfig {
                tracking_id: None,
                gtagcode: true,
            }),
            ..Default::default()
        });
        assert_eq!(resolver.google_config().map(|g| g.gtagcode), Some(true));
        assert!(resolver.snapshot().google.is_some());
    }
}
