//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! storecart show
//!
//! # Add one unit of product 3
//! storecart add 3
//!
//! # Set product 3 to four units
//! storecart update 3 4
//!
//! # Remove product 3
//! storecart remove 3
//! ```

use std::fmt::Write as _;

use storecart::{
    Cart, CartConfig, CartError, CartManager, HttpLookup, JsonFileStore, LookupError, Price,
    ProductId, TracingNotifier, UpdateProductAmount,
};

type Manager = CartManager<HttpLookup, JsonFileStore, TracingNotifier>;

/// Build a cart manager from configuration.
///
/// # Errors
///
/// Returns `LookupError` if the HTTP client cannot be built.
pub fn open(config: &CartConfig) -> Result<Manager, LookupError> {
    let lookup = HttpLookup::new(&config.api)?;
    let store = JsonFileStore::new(&config.store_path);
    Ok(CartManager::load(
        lookup,
        store,
        TracingNotifier,
        config.storage_key.as_str(),
    ))
}

/// Print the cart.
pub fn show(cart: &Manager) {
    print_cart(&cart.cart());
}

/// Add one unit of a product and print the result.
///
/// # Errors
///
/// Returns the `CartError` the operation failed with.
pub async fn add(cart: &Manager, id: ProductId) -> Result<(), CartError> {
    let updated = cart.add_product(id).await?;
    print_cart(&updated);
    Ok(())
}

/// Remove a product and print the result.
///
/// # Errors
///
/// Returns the `CartError` the operation failed with.
pub fn remove(cart: &Manager, id: ProductId) -> Result<(), CartError> {
    let updated = cart.remove_product(id)?;
    print_cart(&updated);
    Ok(())
}

/// Set a product's quantity and print the result.
///
/// # Errors
///
/// Returns the `CartError` the operation failed with.
pub async fn update(cart: &Manager, id: ProductId, amount: i64) -> Result<(), CartError> {
    let updated = cart
        .update_product_amount(UpdateProductAmount {
            product_id: id,
            amount,
        })
        .await?;
    print_cart(&updated);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    print!("{}", render(cart));
}

/// Render the cart as a plain-text table.
fn render(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for item in cart {
        let _ = writeln!(
            out,
            "{:>6}  {:<32} {:>4} x {:>10} = {:>10}",
            item.id(),
            item.product().title(),
            item.amount(),
            display(item.product().price()),
            display(item.line_price()),
        );
    }
    let _ = writeln!(
        out,
        "{} item(s), subtotal {}",
        cart.item_count(),
        display(cart.subtotal())
    );
    out
}

fn display(price: Option<Price>) -> String {
    price.map_or_else(|| "n/a".to_string(), |price| price.display())
}
