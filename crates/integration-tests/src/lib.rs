//! Integration tests for storecart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storecart-integration-tests
//! ```
//!
//! Tests run the real [`HttpLookup`] against [`StubCatalog`], an in-process
//! HTTP server serving `stock/{id}` and `products/{id}`, and persist to a
//! [`JsonFileStore`] in a temporary directory. Nothing outside the test
//! process is contacted.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use storecart::config::DEFAULT_STORAGE_KEY;
use storecart::{ApiConfig, CartManager, ChannelNotifier, HttpLookup, JsonFileStore};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;

/// Cart manager wired the way the tests use it.
pub type TestCart = CartManager<HttpLookup, JsonFileStore, ChannelNotifier>;

#[derive(Default)]
struct CatalogState {
    stock: Mutex<HashMap<i64, u32>>,
    products: Mutex<HashMap<i64, Value>>,
    offline: AtomicBool,
    requests: AtomicUsize,
}

/// In-process stand-in for the product/stock API.
pub struct StubCatalog {
    state: Arc<CatalogState>,
    base_url: Url,
}

impl StubCatalog {
    /// Start serving on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(CatalogState::default());
        let router = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub catalog");
        let addr = listener.local_addr().expect("Failed to read stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self {
            state,
            base_url: Url::parse(&format!("http://{addr}/")).expect("Invalid stub address"),
        }
    }

    /// Register a product with the given stock ceiling.
    ///
    /// # Panics
    ///
    /// Panics if a stub lock is poisoned.
    pub fn add_product(&self, id: i64, title: &str, price: f64, stock: u32) {
        self.add_product_json(
            json!({
                "id": id,
                "title": title,
                "price": price,
                "image": format!("https://img.example/{id}.jpg"),
            }),
            stock,
        );
    }

    /// Register a product from raw JSON (must contain an integer `id`).
    ///
    /// # Panics
    ///
    /// Panics if `product` has no integer `id` or a stub lock is poisoned.
    pub fn add_product_json(&self, product: Value, stock: u32) {
        let id = product["id"].as_i64().expect("product JSON needs an integer id");
        self.state.products.lock().expect("poisoned").insert(id, product);
        self.set_stock(id, stock);
    }

    /// Change the stock ceiling of a product.
    ///
    /// # Panics
    ///
    /// Panics if a stub lock is poisoned.
    pub fn set_stock(&self, id: i64, amount: u32) {
        self.state.stock.lock().expect("poisoned").insert(id, amount);
    }

    /// Make every request fail with 503 until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.state.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of requests served so far.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// API configuration pointing at this stub.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.base_url.clone())
    }
}

fn serve_entry<T: Clone>(
    state: &CatalogState,
    entries: &Mutex<HashMap<i64, T>>,
    id: i64,
) -> Result<T, StatusCode> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if state.offline.load(Ordering::SeqCst) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    entries
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .get(&id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)
}

async fn stock(
    State(state): State<Arc<CatalogState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    let amount = serve_entry(&state, &state.stock, id)?;
    Ok(Json(json!({ "id": id, "amount": amount })))
}

async fn product(
    State(state): State<Arc<CatalogState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, StatusCode> {
    serve_entry(&state, &state.products, id).map(Json)
}

/// A stub catalog plus a temporary directory for the cart file.
pub struct TestContext {
    pub catalog: StubCatalog,
    pub dir: TempDir,
}

impl TestContext {
    /// # Panics
    ///
    /// Panics if the stub or the temporary directory cannot be created.
    pub async fn new() -> Self {
        Self {
            catalog: StubCatalog::start().await,
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Path of the cart file.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("storecart.json")
    }

    /// Open a cart over the stub catalog and the cart file, as a fresh
    /// session would. Product caching is disabled so every call is visible.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn open_cart(&self) -> (TestCart, UnboundedReceiver<String>) {
        let mut api = self.catalog.api_config();
        api.product_cache_ttl = std::time::Duration::ZERO;

        let lookup = HttpLookup::new(&api).expect("Failed to build lookup client");
        let (notifier, notifications) = ChannelNotifier::channel();
        let cart = CartManager::load(
            lookup,
            JsonFileStore::new(self.store_path()),
            notifier,
            DEFAULT_STORAGE_KEY,
        );
        (cart, notifications)
    }
}

/// Drain every pending notification.
pub fn drain(notifications: &mut UnboundedReceiver<String>) -> Vec<String> {
    let mut messages = Vec::new();
    while let Ok(message) = notifications.try_recv() {
        messages.push(message);
    }
    messages
}
