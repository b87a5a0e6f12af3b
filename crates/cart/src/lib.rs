//! storecart - shopping cart state for a web storefront.
//!
//! The [`CartManager`] owns the cart, validates every mutation against the
//! remote stock service, and keeps a durable snapshot in a key-value store.
//!
//! # Architecture
//!
//! - [`lookup`] - Product and stock lookups ([`ProductLookup`], [`HttpLookup`])
//! - [`store`] - Durable key-value storage ([`CartStore`], [`MemoryStore`], [`JsonFileStore`])
//! - [`notify`] - User-facing failure notifications ([`Notifier`])
//! - [`manager`] - The cart manager and its operations
//! - [`config`] - Configuration loaded from environment variables
//!
//! # Example
//!
//! ```rust,ignore
//! use storecart::{CartManager, HttpLookup, JsonFileStore, TracingNotifier};
//!
//! let config = CartConfig::from_env()?;
//! let lookup = HttpLookup::new(&config.api)?;
//! let store = JsonFileStore::new(&config.store_path);
//! let cart = CartManager::load(lookup, store, TracingNotifier, &config.storage_key);
//!
//! cart.add_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod lookup;
pub mod manager;
pub mod messages;
pub mod notify;
pub mod store;

pub use config::{ApiConfig, CartConfig, ConfigError};
pub use error::{CartError, Operation};
pub use lookup::{HttpLookup, LookupError, ProductLookup};
pub use manager::{CartManager, UpdateProductAmount};
pub use notify::{ChannelNotifier, Notifier, TracingNotifier};
pub use store::{CartStore, JsonFileStore, MemoryStore, StoreError};

pub use storecart_core::{Cart, CartItem, Price, Product, ProductId, Stock};
