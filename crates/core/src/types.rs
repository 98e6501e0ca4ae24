use serde::{Deserialize, Serialize};
use std::fmt;

/// Product or order identifier as supplied by the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Text(String),
}

impl ItemId {
    pub fn is_empty(&self) -> bool {
        matches!(self, ItemId::Text(s) if s.is_empty())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(id) => write!(f, "{id}"),
            ItemId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        ItemId::Int(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::Text(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        ItemId::Text(id)
    }
}

/// A product as seen by the storefront. Also used for cart and order
/// line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ItemId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub position: Option<u32>,
    pub currency: String,
}

impl Product {
    /// Minimal product with only the required fields set.
    pub fn new(id: impl Into<ItemId>, price: f64, currency: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            category: None,
            brand: None,
            variant: None,
            price,
            quantity: None,
            position: None,
            currency: currency.into(),
        }
    }

    /// Build a product from a loosely-shaped JSON record. Missing required
    /// keys fail with a `missing field` error.
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub currency: String,
    #[serde(default)]
    pub items: Vec<Product>,
}

impl Cart {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<Product>) -> Self {
        self.items = items;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: ItemId,
    #[serde(default)]
    pub affiliation: Option<String>,
    pub total: f64,
    pub total_tax: f64,
    pub shipping: f64,
    pub currency: String,
    #[serde(default)]
    pub items: Vec<Product>,
}

impl Order {
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

/// A step of the checkout funnel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutStep {
    #[serde(default)]
    pub step_identifier: Option<String>,
    #[serde(default)]
    pub is_first_step: bool,
    #[serde(default)]
    pub checkout_option: Option<String>,
}

impl CheckoutStep {
    pub fn new(step_identifier: impl Into<String>) -> Self {
        Self {
            step_identifier: Some(step_identifier.into()),
            ..Default::default()
        }
    }

    pub fn first(mut self) -> Self {
        self.is_first_step = true;
        self
    }

    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.checkout_option = Some(option.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_serde() {
        let product: Product = serde_json::from_str(
            r#"{"id": 7, "name": "Mug", "price": 12.5, "currency": "EUR"}"#,
        )
        .unwrap();
        assert_eq!(product.id, ItemId::Int(7));
        assert_eq!(product.name.as_deref(), Some("Mug"));
        assert!(product.category.is_none());
        assert!(product.quantity.is_none());
    }

    #[test]
    fn test_missing_required_field() {
        let err = Product::from_value(serde_json::json!({"id": "sku-1", "price": 1.0}))
            .unwrap_err();
        assert!(err.to_string().contains("missing field `currency`"));

        let err = Order::from_value(serde_json::json!({
            "id": 1, "total": 10.0, "shipping": 0.0, "currency": "EUR"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("missing field `totalTax`"));
    }

    #[test]
    fn test_item_id_text_and_int() {
        let ids: Vec<ItemId> = serde_json::from_str(r#"[1, "sku-2", ""]"#).unwrap();
        assert_eq!(ids[0], ItemId::Int(1));
        assert_eq!(ids[1], ItemId::from("sku-2"));
        assert!(ids[2].is_empty());
        assert!(!ids[0].is_empty());
        assert_eq!(ids[1].to_string(), "sku-2");
    }

    #[test]
    fn test_checkout_step_builder() {
        let step = CheckoutStep::new("shipping").first().with_option("express");
        assert_eq!(step.step_identifier.as_deref(), Some("shipping"));
        assert!(step.is_first_step);
        assert_eq!(step.checkout_option.as_deref(), Some("express"));

        let empty = CheckoutStep::default();
        assert!(empty.step_identifier.is_none());
        assert!(!empty.is_first_step);
    }
}
