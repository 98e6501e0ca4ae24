//! Google Analytics Enhanced Ecommerce tracking. Turns product, cart and
//! checkout events into analytics.js `ec:` plugin calls queued ahead of the
//! page's main tracking call.
//!
//! # Modules
//!
//! - [`adaptors`]: Tracker trait and the Enhanced Ecommerce tracker
//! - [`gate`]: Global site tag mode check and the dependency latch
//! - [`normalize`]: Product/order records to Enhanced Ecommerce data objects
//! - [`context`]: Per-event template contexts
//! - [`events`]: Serializable events for replaying recorded sessions

pub mod adaptors;
pub mod context;
pub mod events;
pub mod gate;
pub mod normalize;

pub use adaptors::enhanced::EnhancedEcommerceTracker;
pub use adaptors::{EcommerceTracker, TrackerOptions, DEFAULT_QUANTITY};
pub use events::TrackingEvent;
pub use normalize::{transform_order, transform_product_action, OrderData, ProductActionData};
