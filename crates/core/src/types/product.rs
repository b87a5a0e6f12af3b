//! Catalog data returned by the product lookup service.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::{Price, ProductId};

/// Product attributes as served by `GET products/{id}`.
///
/// Only the identifier is interpreted by the cart. Every other attribute is
/// kept verbatim in `attributes`, so whatever the service sent (including
/// `null` or non-numeric prices) survives persistence unchanged. The
/// accessors below read the well-known display attributes leniently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Product {
    /// Create a product with a title, unit price and image.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Price, image: impl Into<String>) -> Self {
        let mut attributes = Map::new();
        attributes.insert("title".to_string(), Value::String(title.into()));
        attributes.insert("price".to_string(), price_value(price));
        attributes.insert("image".to_string(), Value::String(image.into()));
        Self { id, attributes }
    }

    /// Display title, empty when absent or not a string.
    #[must_use]
    pub fn title(&self) -> &str {
        self.str_attribute("title")
    }

    /// Image URL, empty when absent or not a string.
    #[must_use]
    pub fn image(&self) -> &str {
        self.str_attribute("image")
    }

    /// Unit price, when the `price` attribute holds a decimal number or a
    /// numeric string.
    #[must_use]
    pub fn price(&self) -> Option<Price> {
        let decimal = match self.attributes.get("price")? {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s.trim()),
            _ => None,
        }?;
        Some(Price::new(decimal))
    }

    /// Raw attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    fn str_attribute(&self, name: &str) -> &str {
        self.attributes.get(name).and_then(Value::as_str).unwrap_or_default()
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok()
}

fn price_value(price: Price) -> Value {
    Number::from_str(&price.amount().to_string())
        .map_or_else(|_| Value::String(price.amount().to_string()), Value::Number)
}

/// Stock ceiling as served by `GET stock/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    /// Maximum purchasable quantity.
    pub amount: u32,
}

impl Stock {
    /// Create a stock ceiling.
    #[must_use]
    pub const fn new(amount: u32) -> Self {
        Self { amount }
    }

    /// Whether `quantity` units can be held in a cart.
    #[must_use]
    pub const fn allows(&self, quantity: u32) -> bool {
        quantity <= self.amount
    }
}
