//! Render contexts handed to the tag templates, one per event type.

use serde::Serialize;

use tracking_core::types::{Cart, CheckoutStep, Order, Product};

use crate::normalize::{
    build_checkout_calls, coerce_quantity, transform_order, transform_product_action, OrderData,
    ProductActionData,
};

#[derive(Debug, Clone, Serialize)]
pub struct DependenciesContext<'a> {
    pub dependencies: &'a [String],
    pub currency: &'a str,
}

/// Context of the `product_view` and `product_impression` templates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductContext {
    pub product_data: ProductActionData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductActionContext {
    pub product_data: ProductActionData,
    pub action: CartAction,
}

/// `ec:setAction` data of a checkout step. Serializes to `{}` when neither
/// a step nor an option was given.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionData {
    /// Outer `None` omits the key, `Some(None)` writes `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
}

impl ActionData {
    pub fn is_empty(&self) -> bool {
        self.step.is_none() && self.option.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutContext<'a> {
    pub items: &'a [Product],
    pub calls: Vec<ProductActionData>,
    pub action_data: ActionData,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutCompleteContext<'a> {
    pub order: OrderData,
    pub items: &'a [Product],
    pub calls: Vec<ProductActionData>,
}

/// Detail view: the normalized product without its price.
pub fn product_view_context(product: &Product) -> ProductContext {
    let mut product_data = transform_product_action(product);
    product_data.price = None;
    ProductContext { product_data }
}

pub fn product_impression_context(product: &Product) -> ProductContext {
    ProductContext {
        product_data: transform_product_action(product),
    }
}

/// Cart add/remove. The requested quantity always replaces the item's own.
pub fn product_action_context(
    product: &Product,
    action: CartAction,
    quantity: f64,
) -> ProductActionContext {
    let mut product_data = transform_product_action(product);
    product_data.quantity = Some(coerce_quantity(quantity));
    ProductActionContext {
        product_data,
        action,
    }
}

pub fn build_action_data(step: &CheckoutStep) -> ActionData {
    if step.step_identifier.is_none() && step.checkout_option.is_none() {
        return ActionData::default();
    }
    ActionData {
        step: Some(step.step_identifier.clone()),
        option: step.checkout_option.clone(),
    }
}

/// Checkout step: the raw cart items, no calls, and the step action data.
pub fn checkout_context<'a>(cart: &'a Cart, step: &CheckoutStep) -> CheckoutContext<'a> {
    CheckoutContext {
        items: &cart.items,
        calls: Vec::new(),
        action_data: build_action_data(step),
    }
}

pub fn checkout_complete_context(order: &Order) -> CheckoutCompleteContext<'_> {
    CheckoutCompleteContext {
        order: transform_order(order),
        items: &order.items,
        calls: build_checkout_calls(&order.items),
    }
}
