//! Mode selection and the one-shot dependency declaration latch.

use tracking_core::config::ConfigResolver;

use crate::context::DependenciesContext;

/// True when the site is configured for the global site tag, in which case
/// every Enhanced Ecommerce operation is a no-op. Without a resolvable
/// configuration enhanced tracking stays on.
pub fn is_global_site_tag_mode(config: &dyn ConfigResolver) -> bool {
    config.google_config().is_some_and(|google| google.gtagcode)
}

/// Latch guarding the plugin declaration fragment: it is rendered at most
/// once per tracker session, before the first event fragment.
#[derive(Debug, Clone)]
pub struct DependencyGate {
    dependencies: Vec<String>,
    included: bool,
}

impl DependencyGate {
    pub fn new(dependencies: Vec<String>) -> Self {
        Self {
            dependencies,
            included: false,
        }
    }

    pub fn is_included(&self) -> bool {
        self.included
    }

    /// Context for the declaration fragment if it is still owed.
    pub fn pending<'a>(&'a self, currency: &'a str) -> Option<DependenciesContext<'a>> {
        if self.included || self.dependencies.is_empty() {
            return None;
        }
        Some(DependenciesContext {
            dependencies: &self.dependencies,
            currency,
        })
    }

    pub fn mark_included(&mut self) {
        self.included = true;
    }

    /// Re-arm the latch for hosts that reuse a tracker across requests.
    pub fn reset(&mut self) {
        self.included = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracking_core::config::{GoogleConfig, TrackingConfig};

    fn config_with(google: Option<GoogleConfig>) -> TrackingConfig {
        TrackingConfig {
            google,
            ..Default::default()
        }
    }

    #[test]
    fn test_global_site_tag_mode() {
        assert!(!is_global_site_tag_mode(&config_with(None)));
        assert!(!is_global_site_tag_mode(&config_with(Some(
            GoogleConfig::default()
        ))));
        assert!(is_global_site_tag_mode(&config_with(Some(GoogleConfig {
            tracking_id: Some("G-XYZ".into()),
            gtagcode: true,
        }))));
    }

    #[test]
    fn test_gate_latches_once() {
        let mut gate = DependencyGate::new(vec!["ec".into()]);
        let pending = gate.pending("EUR").unwrap();
        assert_eq!(pending.dependencies.to_vec(), vec!["ec".to_string()]);
        assert_eq!(pending.currency, "EUR");

        gate.mark_included();
        assert!(gate.is_included());
        assert!(gate.pending("USD").is_none());

        gate.reset();
        assert!(gate.pending("USD").is_some());
    }

    #[test]
    fn test_gate_without_dependencies() {
        let gate = DependencyGate::new(Vec::new());
        assert!(gate.pending("EUR").is_none());
        assert!(!gate.is_included());
    }
}
