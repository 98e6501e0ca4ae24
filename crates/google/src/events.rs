//! Serializable ecommerce events, so a recorded event script can be replayed
//! through any [`EcommerceTracker`].

use serde::{Deserialize, Serialize};
use tracing::info;

use tracking_core::error::TrackingResult;
use tracking_core::types::{Cart, CheckoutStep, Order, Product};

use crate::adaptors::{EcommerceTracker, DEFAULT_QUANTITY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackingEvent {
    ProductView {
        product: Product,
    },
    ProductImpression {
        product: Product,
    },
    CartAdd {
        cart: Cart,
        product: Product,
        #[serde(default = "default_quantity")]
        quantity: f64,
    },
    CartRemove {
        cart: Cart,
        product: Product,
        #[serde(default = "default_quantity")]
        quantity: f64,
    },
    CheckoutStep {
        cart: Cart,
        #[serde(default)]
        step: CheckoutStep,
    },
    CheckoutComplete {
        order: Order,
    },
}

fn default_quantity() -> f64 {
    DEFAULT_QUANTITY
}

impl TrackingEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TrackingEvent::ProductView { .. } => "product_view",
            TrackingEvent::ProductImpression { .. } => "product_impression",
            TrackingEvent::CartAdd { .. } => "cart_add",
            TrackingEvent::CartRemove { .. } => "cart_remove",
            TrackingEvent::CheckoutStep { .. } => "checkout_step",
            TrackingEvent::CheckoutComplete { .. } => "checkout_complete",
        }
    }

    /// Dispatch the event to the matching tracker operation.
    pub fn apply(&self, tracker: &mut dyn EcommerceTracker) -> TrackingResult<()> {
        match self {
            TrackingEvent::ProductView { product } => tracker.track_product(product),
            TrackingEvent::ProductImpression { product } => {
                tracker.track_product_impression(product)
            }
            TrackingEvent::CartAdd {
                cart,
                product,
                quantity,
            } => tracker.track_cart_add(cart, product, *quantity),
            TrackingEvent::CartRemove {
                cart,
                product,
                quantity,
            } => tracker.track_cart_remove(cart, product, *quantity),
            TrackingEvent::CheckoutStep { cart, step } => tracker.track_checkout_step(cart, step),
            TrackingEvent::CheckoutComplete { order } => tracker.track_checkout_complete(order),
        }
    }
}

/// Apply events in order, stopping at the first failure. Returns the number
/// of events applied.
pub fn replay(events: &[TrackingEvent], tracker: &mut dyn EcommerceTracker) -> TrackingResult<usize> {
    for event in events {
        event.apply(tracker)?;
    }
    info!(count = events.len(), "replayed ecommerce events");
    Ok(events.len())
}
