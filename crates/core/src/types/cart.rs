//! Cart and line-item types.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s with at most one line per
//! product. Quantities are `NonZeroU32`, so a line with quantity zero cannot
//! exist: dropping a product from the cart is always an explicit removal.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Price, Product, ProductId};

/// Errors raised when a cart would violate its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartValidationError {
    /// The same product appears in two lines.
    #[error("Duplicate line item for product {0}")]
    DuplicateItem(ProductId),
}

/// A product in the cart together with its quantity.
///
/// Serializes as the product object with an `amount` field. The line's
/// quantity owns that key: a product attribute of the same name is dropped
/// when the line is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    product: Product,
    amount: NonZeroU32,
}

impl CartItem {
    /// A new line holding a single unit of `product`.
    #[must_use]
    pub fn new(product: Product) -> Self {
        Self::with_amount(product, NonZeroU32::MIN)
    }

    /// A new line holding `amount` units of `product`.
    #[must_use]
    pub fn with_amount(mut product: Product, amount: NonZeroU32) -> Self {
        product.attributes.remove("amount");
        Self { product, amount }
    }

    /// Product identifier of this line.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Product attributes of this line.
    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    /// Quantity of this line.
    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount.get()
    }

    /// Unit price times quantity.
    ///
    /// `None` when the product has no readable price or the multiplication
    /// overflows.
    #[must_use]
    pub fn line_price(&self) -> Option<Price> {
        self.product.price()?.checked_times(self.amount())
    }
}

/// Ordered line items, unique by product identifier.
///
/// Serializes as a JSON array of line items. Deserializing an array that
/// lists a product twice fails with [`CartValidationError::DuplicateItem`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from line items, rejecting duplicate products.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateItem` if two lines share a product identifier.
    pub fn from_items(items: Vec<CartItem>) -> Result<Self, CartValidationError> {
        let mut cart = Self::new();
        for item in items {
            cart.insert(item)?;
        }
        Ok(cart)
    }

    /// Line items in cart order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Quantity held for `id`, zero when absent.
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> u32 {
        self.get(id).map_or(0, CartItem::amount)
    }

    /// Set the quantity of an existing line in place.
    ///
    /// Returns `false` if no line exists for `id`.
    pub fn set_amount(&mut self, id: ProductId, amount: NonZeroU32) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                item.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Append a line at the end of the cart.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateItem` if a line for the same product already exists.
    pub fn insert(&mut self, item: CartItem) -> Result<(), CartValidationError> {
        if self.contains(item.id()) {
            return Err(CartValidationError::DuplicateItem(item.id()));
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove the line for `id`, keeping the order of the others.
    pub fn remove(&mut self, id: ProductId) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, item| total.saturating_add(item.amount()))
    }

    /// Sum of every line price.
    ///
    /// `None` when any line is unpriced or the sum overflows.
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        self.items
            .iter()
            .try_fold(Price::ZERO, |total, item| total.checked_add(item.line_price()?))
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartValidationError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i64, cents: i64) -> Product {
        Product::new(
            ProductId::new(id),
            format!("Product {id}"),
            Price::from_cents(cents),
            format!("https://img.example/{id}.jpg"),
        )
    }

    fn amount(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_line_item_json_shape() {
        let item = CartItem::new(product(1, 13990));
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["id"], 1);
        assert_eq!(value["title"], "Product 1");
        assert_eq!(value["amount"], 1);
        assert!(value.get("product").is_none());
    }

    #[test]
    fn test_cart_json_round_trip_keeps_order_and_extras() {
        let json = r#"[
            {"id":2,"title":"B","price":10,"image":"b.jpg","amount":3,"color":"red"},
            {"id":1,"title":"A","price":"5.5","image":"a.jpg","amount":1}
        ]"#;
        let cart: Cart = serde_json::from_str(json).unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].id(), ProductId::new(2));
        assert_eq!(cart.items()[0].product().attribute("color"), Some(&"red".into()));

        let reloaded: Cart = serde_json::from_str(&serde_json::to_string(&cart).unwrap()).unwrap();
        assert_eq!(reloaded, cart);
    }

    #[test]
    fn test_cart_rejects_duplicates_and_zero_amounts() {
        let duplicated = r#"[{"id":1,"amount":1},{"id":1,"amount":2}]"#;
        assert!(serde_json::from_str::<Cart>(duplicated).is_err());

        let zero = r#"[{"id":1,"amount":0}]"#;
        assert!(serde_json::from_str::<Cart>(zero).is_err());
    }

    #[test]
    fn test_insert_rejects_existing_product() {
        let mut cart = Cart::new();
        cart.insert(CartItem::new(product(1, 100))).unwrap();

        let err = cart.insert(CartItem::new(product(1, 100))).unwrap_err();
        assert_eq!(err, CartValidationError::DuplicateItem(ProductId::new(1)));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_set_amount_preserves_position() {
        let mut cart = Cart::from_items(vec![
            CartItem::new(product(1, 100)),
            CartItem::new(product(2, 100)),
        ])
        .unwrap();

        assert!(cart.set_amount(ProductId::new(1), amount(4)));
        assert_eq!(cart.items()[0].id(), ProductId::new(1));
        assert_eq!(cart.amount_of(ProductId::new(1)), 4);

        assert!(!cart.set_amount(ProductId::new(9), amount(1)));
        assert_eq!(cart.amount_of(ProductId::new(9)), 0);
    }

    #[test]
    fn test_remove_only_touches_target() {
        let mut cart = Cart::from_items(vec![
            CartItem::new(product(1, 100)),
            CartItem::new(product(2, 100)),
            CartItem::new(product(3, 100)),
        ])
        .unwrap();

        let removed = cart.remove(ProductId::new(2)).unwrap();
        assert_eq!(removed.id(), ProductId::new(2));

        let ids: Vec<_> = cart.iter().map(CartItem::id).collect();
        assert_eq!(ids, vec![ProductId::new(1), ProductId::new(3)]);
        assert!(cart.remove(ProductId::new(2)).is_none());
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::from_items(vec![
            CartItem::new(product(1, 1000)),
            CartItem::new(product(2, 250)),
        ])
        .unwrap();
        cart.set_amount(ProductId::new(2), amount(3));

        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.subtotal(), Some(Price::from_cents(1750)));
        assert_eq!(Cart::new().subtotal(), Some(Price::ZERO));
    }

    #[test]
    fn test_totals_overflow_is_none() {
        let mut huge = product(1, 0);
        huge.attributes
            .insert("price".to_string(), "79228162514264337593543950335".into());
        let mut cart = Cart::from_items(vec![CartItem::new(huge)]).unwrap();

        assert_eq!(cart.subtotal(), Some(Price::new(rust_decimal::Decimal::MAX)));

        cart.set_amount(ProductId::new(1), amount(2));
        assert_eq!(cart.items()[0].line_price(), None);
        assert_eq!(cart.subtotal(), None);
    }

    #[test]
    fn test_unpriced_line_has_no_subtotal() {
        let unpriced: Product = serde_json::from_str(r#"{"id":2,"price":null}"#).unwrap();
        let cart = Cart::from_items(vec![CartItem::new(product(1, 100)), CartItem::new(unpriced)])
            .unwrap();

        assert_eq!(cart.items()[0].line_price(), Some(Price::from_cents(100)));
        assert_eq!(cart.items()[1].line_price(), None);
        assert_eq!(cart.subtotal(), None);
    }

    #[test]
    fn test_line_amount_replaces_product_amount_attribute() {
        let product: Product =
            serde_json::from_str(r#"{"id":1,"title":"T","price":10,"amount":99}"#).unwrap();
        let cart = Cart::from_items(vec![CartItem::new(product)]).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        assert_eq!(json.matches("\"amount\"").count(), 1);

        let reloaded: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, cart);
        assert_eq!(reloaded.amount_of(ProductId::new(1)), 1);
        assert_eq!(reloaded.items()[0].product().attribute("amount"), None);
    }
}
