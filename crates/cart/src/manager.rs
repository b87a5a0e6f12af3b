//! The cart manager.
//!
//! [`CartManager`] owns the cart and is the only thing that changes it. Each
//! operation works on a copy of the current snapshot, writes the result to the
//! durable store, and only then publishes it in memory and to subscribers.
//! Any failure leaves the cart untouched and sends exactly one message to the
//! notifier.
//!
//! Operations are not serialized against each other. Two overlapping calls
//! both start from the same snapshot and the last one to commit wins.

use std::num::NonZeroU32;
use std::sync::Arc;

use storecart_core::{Cart, CartItem, ProductId};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::error::{CartError, Operation};
use crate::lookup::{LookupError, ProductLookup};
use crate::notify::Notifier;
use crate::store::{CartStore, StoreError};

/// Arguments of [`CartManager::update_product_amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    /// Desired quantity. Zero or negative values are ignored.
    pub amount: i64,
}

/// Owner of the shopping cart.
///
/// Cheap to clone; clones share the same cart.
pub struct CartManager<L, S, N> {
    inner: Arc<CartManagerInner<L, S, N>>,
}

struct CartManagerInner<L, S, N> {
    lookup: L,
    store: S,
    notifier: N,
    storage_key: String,
    cart: watch::Sender<Cart>,
}

impl<L, S, N> Clone for CartManager<L, S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L, S, N> CartManager<L, S, N>
where
    L: ProductLookup,
    S: CartStore,
    N: Notifier,
{
    /// Create a manager, restoring the cart stored under `storage_key`.
    ///
    /// A missing, unreadable, or invalid snapshot starts an empty cart.
    pub fn load(lookup: L, store: S, notifier: N, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let cart = rehydrate(&store, &storage_key);
        debug!(items = cart.len(), key = %storage_key, "Cart loaded");

        Self {
            inner: Arc::new(CartManagerInner {
                lookup,
                store,
                notifier,
                storage_key,
                cart: watch::Sender::new(cart),
            }),
        }
    }

    /// Current cart snapshot.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.cart.borrow().clone()
    }

    /// Receiver that observes every committed snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.cart.subscribe()
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart has its quantity incremented in place;
    /// otherwise its attributes are fetched and a new line with quantity 1 is
    /// appended.
    ///
    /// # Errors
    ///
    /// - `StockExceeded` if the new quantity is above the stock ceiling
    /// - `Lookup` if stock or product attributes cannot be fetched
    /// - `Store` if the snapshot cannot be persisted
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let result = self.try_add(product_id).await;
        self.finish(Operation::Add, result)
    }

    /// Remove a product's line. Does not consult the lookup service.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the product is not in the cart
    /// - `Store` if the snapshot cannot be persisted
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove_product(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let result = self.try_remove(product_id);
        self.finish(Operation::Remove, result)
    }

    /// Set a product's quantity.
    ///
    /// Amounts of zero or less are ignored: nothing is fetched, changed, or
    /// notified, and the current snapshot is returned.
    ///
    /// # Errors
    ///
    /// - `StockExceeded` if `amount` is above the stock ceiling
    /// - `NotFound` if the product is not in the cart
    /// - `Lookup` if the stock ceiling cannot be fetched
    /// - `Store` if the snapshot cannot be persisted
    #[instrument(skip(self), fields(product_id = %request.product_id, amount = request.amount))]
    pub async fn update_product_amount(
        &self,
        request: UpdateProductAmount,
    ) -> Result<Cart, CartError> {
        if request.amount <= 0 {
            debug!("Ignoring non-positive amount");
            return Ok(self.cart());
        }

        let result = self.try_update(request.product_id, request.amount).await;
        self.finish(Operation::Update, result)
    }

    async fn try_add(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let mut cart = self.cart();
        let current = cart.amount_of(product_id);

        let stock = self.inner.lookup.stock(product_id).await?;
        let requested = NonZeroU32::MIN.saturating_add(current);
        if !stock.allows(requested.get()) {
            return Err(CartError::StockExceeded {
                product_id,
                requested: u64::from(requested.get()),
                available: stock.amount,
            });
        }

        if !cart.set_amount(product_id, requested) {
            let product = self.inner.lookup.product(product_id).await?;
            if product.id != product_id {
                return Err(LookupError::Parse(format!(
                    "requested product {product_id}, received product {}",
                    product.id
                ))
                .into());
            }
            cart.insert(CartItem::new(product))
                .map_err(|e| LookupError::Parse(e.to_string()))?;
        }

        self.commit(cart)
    }

    fn try_remove(&self, product_id: ProductId) -> Result<Cart, CartError> {
        let mut cart = self.cart();
        cart.remove(product_id)
            .ok_or(CartError::NotFound(product_id))?;
        self.commit(cart)
    }

    async fn try_update(&self, product_id: ProductId, amount: i64) -> Result<Cart, CartError> {
        let mut cart = self.cart();

        let stock = self.inner.lookup.stock(product_id).await?;
        let requested = u32::try_from(amount)
            .ok()
            .and_then(NonZeroU32::new)
            .filter(|requested| stock.allows(requested.get()))
            .ok_or(CartError::StockExceeded {
                product_id,
                requested: amount.unsigned_abs(),
                available: stock.amount,
            })?;

        if !cart.set_amount(product_id, requested) {
            return Err(CartError::NotFound(product_id));
        }

        self.commit(cart)
    }

    /// Persist `cart`, then publish it.
    fn commit(&self, cart: Cart) -> Result<Cart, CartError> {
        let value = serde_json::to_string(&cart).map_err(StoreError::from)?;
        self.inner.store.set(&self.inner.storage_key, &value)?;

        self.inner.cart.send_replace(cart.clone());
        debug!(items = cart.len(), "Cart committed");
        Ok(cart)
    }

    fn finish(&self, operation: Operation, result: Result<Cart, CartError>) -> Result<Cart, CartError> {
        if let Err(err) = &result {
            warn!(%operation, error = %err, "Cart operation failed");
            self.inner.notifier.notify_error(err.user_message(operation));
        }
        result
    }
}

fn rehydrate(store: &impl CartStore, key: &str) -> Cart {
    match store.get(key) {
        Ok(Some(value)) => serde_json::from_str(&value).unwrap_or_else(|e| {
            warn!(error = %e, key, "Stored cart is invalid, starting empty");
            Cart::new()
        }),
        Ok(None) => Cart::new(),
        Err(e) => {
            warn!(error = %e, key, "Failed to read stored cart, starting empty");
            Cart::new()
        }
    }
}
