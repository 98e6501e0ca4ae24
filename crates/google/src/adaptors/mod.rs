//! Ecommerce trackers that turn shop events into analytics code fragments.
//!
//! Each tracker implements [`EcommerceTracker`]; the shop calls it while
//! handling a request and the rendered fragments end up in the page's
//! analytics snippet.

pub mod enhanced;

use tracking_core::config::EnhancedEcommerceConfig;
use tracking_core::error::TrackingResult;
use tracking_core::types::{Cart, CheckoutStep, Order, Product};

/// Quantity used by cart actions when the caller has none.
pub const DEFAULT_QUANTITY: f64 = 1.0;

/// Tracker trait: one entry point per ecommerce event.
pub trait EcommerceTracker {
    /// Product detail page view.
    fn track_product(&mut self, product: &Product) -> TrackingResult<()>;

    /// Product shown in a list.
    fn track_product_impression(&mut self, product: &Product) -> TrackingResult<()>;

    fn track_cart_add(&mut self, cart: &Cart, product: &Product, quantity: f64)
        -> TrackingResult<()>;

    fn track_cart_remove(
        &mut self,
        cart: &Cart,
        product: &Product,
        quantity: f64,
    ) -> TrackingResult<()>;

    fn track_checkout_step(&mut self, cart: &Cart, step: &CheckoutStep) -> TrackingResult<()>;

    fn track_checkout_complete(&mut self, order: &Order) -> TrackingResult<()>;
}

/// Setup options of a tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerOptions {
    /// Template group the logical template names are resolved in.
    pub template_prefix: String,
    /// Plugins declared once before the first event.
    pub dependencies: Vec<String>,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self::from(&EnhancedEcommerceConfig::default())
    }
}

impl From<&EnhancedEcommerceConfig> for TrackerOptions {
    fn from(config: &EnhancedEcommerceConfig) -> Self {
        Self {
            template_prefix: config.template_prefix.clone(),
            dependencies: config.dependencies.clone(),
        }
    }
}
