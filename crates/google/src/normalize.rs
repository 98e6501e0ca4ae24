//! Normalization of shop records into Enhanced Ecommerce data objects.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::trace;

use tracking_core::types::{ItemId, Order, Product};

/// Enhanced Ecommerce product data. Sparse: absent fields are left out of
/// the serialized object so templates can branch on key presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductActionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Enhanced Ecommerce purchase action data. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderData {
    pub id: ItemId,
    pub affiliation: String,
    pub total: f64,
    pub tax: f64,
    pub shipping: f64,
    pub currency: String,
}

/// Project a product into its Enhanced Ecommerce shape, dropping empty
/// fields, rounding the price and defaulting the quantity to 1.
pub fn transform_product_action(item: &Product) -> ProductActionData {
    ProductActionData {
        id: Some(item.id.clone()).filter(|id| !id.is_empty()),
        name: non_empty(&item.name),
        category: non_empty(&item.category),
        brand: non_empty(&item.brand),
        variant: non_empty(&item.variant),
        price: Some(round_price(item.price)),
        quantity: Some(item.quantity.filter(|q| *q != 0).unwrap_or(1)),
        position: item.position,
        currency: Some(item.currency.clone()).filter(|c| !c.is_empty()),
    }
}

/// Project an order into purchase action data. Unlike products, nothing is
/// filtered out.
pub fn transform_order(order: &Order) -> OrderData {
    OrderData {
        id: order.id.clone(),
        affiliation: order.affiliation.clone().unwrap_or_default(),
        total: order.total,
        tax: order.total_tax,
        shipping: order.shipping,
        currency: order.currency.clone(),
    }
}

/// One product data object per line item, in input order.
pub fn build_checkout_calls(items: &[Product]) -> Vec<ProductActionData> {
    items.iter().map(transform_product_action).collect()
}

/// Round to 2 decimal places, half away from zero, on the shortest decimal
/// representation of the value (`10.005` becomes `10.01`).
pub fn round_price(price: f64) -> f64 {
    if !price.is_finite() {
        return price;
    }
    Decimal::from_str(&price.to_string())
        .ok()
        .and_then(|d| {
            d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                .to_f64()
        })
        .unwrap_or(price)
}

/// Cart quantities arrive as floats; the payload carries whole units.
/// Truncates toward zero and saturates, so negatives and NaN become 0.
pub fn coerce_quantity(quantity: f64) -> u32 {
    let units = quantity as u32;
    if quantity.fract() != 0.0 || f64::from(units) != quantity.trunc() {
        trace!(quantity, units, "cart quantity coerced to whole units");
    }
    units
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
