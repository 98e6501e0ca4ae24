//! Google Analytics Enhanced Ecommerce tracker. Renders analytics.js `ec:`
//! plugin calls for product, cart and checkout events and queues them to run
//! before the page's main `send pageview` call.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace};
use uuid::Uuid;

use tracking_core::code_buffer::{CodeBlock, CodeSink};
use tracking_core::config::ConfigResolver;
use tracking_core::error::TrackingResult;
use tracking_core::templates::Renderer;
use tracking_core::types::{Cart, CheckoutStep, Order, Product};

use super::{EcommerceTracker, TrackerOptions};
use crate::context::{
    checkout_complete_context, checkout_context, product_action_context,
    product_impression_context, product_view_context, CartAction,
};
use crate::gate::{is_global_site_tag_mode, DependencyGate};

const TEMPLATE_DEPENDENCIES: &str = "dependencies";
const TEMPLATE_PRODUCT_VIEW: &str = "product_view";
const TEMPLATE_PRODUCT_IMPRESSION: &str = "product_impression";
const TEMPLATE_PRODUCT_ACTION: &str = "product_action";
const TEMPLATE_CHECKOUT: &str = "checkout";
const TEMPLATE_CHECKOUT_COMPLETE: &str = "checkout_complete";

/// Request-scoped Enhanced Ecommerce tracker. Owns the dependency latch, so
/// one instance serves one request/response cycle.
pub struct EnhancedEcommerceTracker {
    session_id: Uuid,
    options: TrackerOptions,
    dependencies: DependencyGate,
    renderer: Arc<dyn Renderer>,
    config: Arc<dyn ConfigResolver>,
    sink: Arc<dyn CodeSink>,
}

impl EnhancedEcommerceTracker {
    pub fn new(
        options: TrackerOptions,
        renderer: Arc<dyn Renderer>,
        config: Arc<dyn ConfigResolver>,
        sink: Arc<dyn CodeSink>,
    ) -> Self {
        let dependencies = DependencyGate::new(options.dependencies.clone());
        Self {
            session_id: Uuid::new_v4(),
            options,
            dependencies,
            renderer,
            config,
            sink,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    pub fn dependencies_included(&self) -> bool {
        self.dependencies.is_included()
    }

    /// Start a new session on this instance: fresh session id and the
    /// dependency declaration owed again.
    pub fn reset(&mut self) {
        self.session_id = Uuid::new_v4();
        self.dependencies.reset();
    }

    /// Mode is re-read on every call; the configuration may change between
    /// calls of one session.
    fn is_suppressed(&self, operation: &'static str) -> bool {
        let suppressed = is_global_site_tag_mode(self.config.as_ref());
        if suppressed {
            metrics::counter!("tracking.events_suppressed").increment(1);
            trace!(
                operation,
                session_id = %self.session_id,
                "global site tag mode active, enhanced ecommerce skipped"
            );
        }
        suppressed
    }

    fn template_path(&self, name: &str) -> String {
        format!("{}/{}.js", self.options.template_prefix, name)
    }

    fn render_template<T: Serialize>(&self, name: &str, context: &T) -> TrackingResult<String> {
        let context = serde_json::to_value(context)?;
        self.renderer.render(&self.template_path(name), &context)
    }

    fn emit(&self, template: &'static str, code: String) {
        debug!(
            template,
            session_id = %self.session_id,
            bytes = code.len(),
            "enhanced ecommerce fragment queued"
        );
        metrics::counter!("tracking.fragments_emitted", "template" => template).increment(1);
        self.sink.add_code_part(code, CodeBlock::BeforeTrack);
    }

    /// Emit the plugin declaration if this session has not done so yet.
    fn ensure_dependencies(&mut self, currency: &str) -> TrackingResult<()> {
        let Some(context) = self.dependencies.pending(currency) else {
            return Ok(());
        };

        let code = self.render_template(TEMPLATE_DEPENDENCIES, &context)?;
        self.emit(TEMPLATE_DEPENDENCIES, code);
        self.dependencies.mark_included();
        Ok(())
    }

    fn track_cart_action(
        &mut self,
        cart: &Cart,
        product: &Product,
        action: CartAction,
        quantity: f64,
    ) -> TrackingResult<()> {
        self.ensure_dependencies(&cart.currency)?;

        let context = product_action_context(product, action, quantity);
        let code = self.render_template(TEMPLATE_PRODUCT_ACTION, &context)?;
        self.emit(TEMPLATE_PRODUCT_ACTION, code);
        Ok(())
    }
}

impl EcommerceTracker for EnhancedEcommerceTracker {
    fn track_product(&mut self, product: &Product) -> TrackingResult<()> {
        if self.is_suppressed("track_product") {
            return Ok(());
        }
        self.ensure_dependencies(&product.currency)?;

        let code = self.render_template(TEMPLATE_PRODUCT_VIEW, &product_view_context(product))?;
        self.emit(TEMPLATE_PRODUCT_VIEW, code);
        Ok(())
    }

    fn track_product_impression(&mut self, product: &Product) -> TrackingResult<()> {
        if self.is_suppressed("track_product_impression") {
            return Ok(());
        }
        self.ensure_dependencies(&product.currency)?;

        let code = self.render_template(
            TEMPLATE_PRODUCT_IMPRESSION,
            &product_impression_context(product),
        )?;
        self.emit(TEMPLATE_PRODUCT_IMPRESSION, code);
        Ok(())
    }

    fn track_cart_add(
        &mut self,
        cart: &Cart,
        product: &Product,
        quantity: f64,
    ) -> TrackingResult<()> {
        if self.is_suppressed("track_cart_add") {
            return Ok(());
        }
        self.track_cart_action(cart, product, CartAction::Add, quantity)
    }

    fn track_cart_remove(
        &mut self,
        cart: &Cart,
        product: &Product,
        quantity: f64,
    ) -> TrackingResult<()> {
        if self.is_suppressed("track_cart_remove") {
            return Ok(());
        }
        self.track_cart_action(cart, product, CartAction::Remove, quantity)
    }

    fn track_checkout_step(&mut self, cart: &Cart, step: &CheckoutStep) -> TrackingResult<()> {
        if self.is_suppressed("track_checkout_step") {
            return Ok(());
        }
        self.ensure_dependencies(&cart.currency)?;

        // is_first_step is carried for templates that want it but does not
        // shape the context.
        trace!(
            step = step.step_identifier.as_deref().unwrap_or_default(),
            is_first_step = step.is_first_step,
            "checkout step"
        );
        let code = self.render_template(TEMPLATE_CHECKOUT, &checkout_context(cart, step))?;
        self.emit(TEMPLATE_CHECKOUT, code);
        Ok(())
    }

    fn track_checkout_complete(&mut self, order: &Order) -> TrackingResult<()> {
        if self.is_suppressed("track_checkout_complete") {
            return Ok(());
        }
        self.ensure_dependencies(&order.currency)?;

        let code = self.render_template(
            TEMPLATE_CHECKOUT_COMPLETE,
            &checkout_complete_context(order),
        )?;
        self.emit(TEMPLATE_CHECKOUT_COMPLETE, code);
        Ok(())
    }
}
