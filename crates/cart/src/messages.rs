//! User-facing notification messages.

/// The requested quantity is above the stock ceiling.
pub const STOCK_EXCEEDED: &str = "Requested quantity is out of stock";

/// Adding a product failed (lookup or storage error).
pub const ADD_FAILED: &str = "Failed to add product";

/// Removing a product failed (not in the cart, or storage error).
pub const REMOVE_FAILED: &str = "Failed to remove product";

/// Changing a quantity failed (not in the cart, lookup or storage error).
pub const UPDATE_FAILED: &str = "Failed to update product amount";
