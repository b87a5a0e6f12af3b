//! Cart operation errors.
//!
//! Every cart operation returns `Result<Cart, CartError>`. The error says what
//! happened; [`CartError::user_message`] decides what the shopper is told.

use storecart_core::ProductId;
use thiserror::Error;

use crate::lookup::LookupError;
use crate::messages;
use crate::store::StoreError;

/// The cart operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Remove,
    Update,
}

impl Operation {
    /// Generic failure message for this operation.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => messages::ADD_FAILED,
            Self::Remove => messages::REMOVE_FAILED,
            Self::Update => messages::UPDATE_FAILED,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Update => "update",
        })
    }
}

/// Why a cart operation left the cart unchanged.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested quantity is above the stock ceiling.
    #[error("Stock exceeded for product {product_id}: requested {requested}, available {available}")]
    StockExceeded {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    /// The product has no line in the cart.
    #[error("Not found: product {0} is not in the cart")]
    NotFound(ProductId),

    /// The lookup service failed.
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// The durable store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CartError {
    /// Message shown to the shopper when `operation` fails with this error.
    ///
    /// Stock ceilings get their own message; every other failure uses the
    /// operation's generic message so internal details are never shown.
    #[must_use]
    pub const fn user_message(&self, operation: Operation) -> &'static str {
        match self {
            Self::StockExceeded { .. } => messages::STOCK_EXCEEDED,
            Self::NotFound(_) | Self::Lookup(_) | Self::Store(_) => operation.failure_message(),
        }
    }
}
