//! Product and stock lookups.
//!
//! The cart treats the catalog as a black-box request/response service:
//! - `GET stock/{id}` returns the current stock ceiling
//! - `GET products/{id}` returns the product attributes
//!
//! [`HttpLookup`] talks to that API over HTTP. Anything else (test doubles,
//! in-process catalogs) can implement [`ProductLookup`] directly.

mod http;

pub use http::HttpLookup;

use async_trait::async_trait;
use storecart_core::{Product, ProductId, Stock};
use thiserror::Error;

/// Errors that can occur when querying the lookup service.
#[derive(Debug, Error)]
pub enum LookupError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The service does not know the product.
    #[error("Not found: product {0}")]
    NotFound(ProductId),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of stock ceilings and product attributes.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// Current stock ceiling for `id`. Never cached.
    async fn stock(&self, id: ProductId) -> Result<Stock, LookupError>;

    /// Product attributes for `id`.
    async fn product(&self, id: ProductId) -> Result<Product, LookupError>;
}

#[async_trait]
impl<T: ProductLookup + ?Sized> ProductLookup for std::sync::Arc<T> {
    async fn stock(&self, id: ProductId) -> Result<Stock, LookupError> {
        (**self).stock(id).await
    }

    async fn product(&self, id: ProductId) -> Result<Product, LookupError> {
        (**self).product(id).await
    }
}
