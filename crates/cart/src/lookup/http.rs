//! HTTP client for the product/stock API.
//!
//! Product attributes are cached with `moka`; stock ceilings are always
//! fetched fresh so every mutation sees current availability.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use storecart_core::{Product, ProductId, Stock};
use tracing::{debug, instrument};
use url::Url;

use super::{LookupError, ProductLookup};
use crate::config::ApiConfig;

/// Client for the product/stock API.
#[derive(Clone)]
pub struct HttpLookup {
    inner: Arc<HttpLookupInner>,
}

struct HttpLookupInner {
    client: reqwest::Client,
    base_url: Url,
    products: Option<Cache<ProductId, Product>>,
}

impl HttpLookup {
    /// Create a new lookup client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, LookupError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| LookupError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let products = (!config.product_cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(config.product_cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(HttpLookupInner {
                client: builder.build()?,
                base_url: config.base_url.clone(),
                products,
            }),
        })
    }

    /// GET `path` relative to the base URL and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        id: ProductId,
    ) -> Result<T, LookupError> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| LookupError::Parse(format!("Invalid URL {path}: {e}")))?;

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(id));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Lookup API returned non-success status"
            );
            return Err(LookupError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse lookup API response"
            );
            LookupError::Parse(e.to_string())
        })
    }
}

#[async_trait]
impl ProductLookup for HttpLookup {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn stock(&self, id: ProductId) -> Result<Stock, LookupError> {
        self.get_json(&format!("stock/{id}"), id).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: ProductId) -> Result<Product, LookupError> {
        if let Some(cache) = &self.inner.products
            && let Some(product) = cache.get(&id).await
        {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: Product = self.get_json(&format!("products/{id}"), id).await?;

        if let Some(cache) = &self.inner.products {
            cache.insert(id, product.clone()).await;
        }

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use storecart_core::Price;

    use super::*;

    #[derive(Clone, Default)]
    struct Hits(Arc<AtomicUsize>);

    async fn stock(Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
        match id {
            1 => Ok(Json(json!({ "id": 1, "amount": 3 }))),
            2 => Err(StatusCode::INTERNAL_SERVER_ERROR),
            3 => Ok(Json(json!({ "id": 3, "amount": "plenty" }))),
            _ => Err(StatusCode::NOT_FOUND),
        }
    }

    async fn product(State(hits): State<Hits>, Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
        hits.0.fetch_add(1, Ordering::SeqCst);
        if id == 1 {
            Ok(Json(json!({
                "id": 1,
                "title": "Trail Runner",
                "price": 139.9,
                "image": "https://img.example/1.jpg"
            })))
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    async fn whoami(headers: AxumHeaders) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(json!({ "amount": u32::from(auth == "Bearer tok_123") }))
    }

    async fn serve(hits: Hits) -> Url {
        let router = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .route("/auth/stock/{id}", get(whoami))
            .with_state(hits);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn client(base_url: Url, ttl: Duration) -> HttpLookup {
        let mut config = ApiConfig::new(base_url);
        config.product_cache_ttl = ttl;
        HttpLookup::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetches_stock_and_product() {
        let base = serve(Hits::default()).await;
        let lookup = client(base, Duration::from_secs(60));

        let stock = lookup.stock(ProductId::new(1)).await.unwrap();
        assert_eq!(stock, Stock::new(3));

        let product = lookup.product(ProductId::new(1)).await.unwrap();
        assert_eq!(product.title(), "Trail Runner");
        assert_eq!(product.price(), Some(Price::from_cents(13990)));
    }

    #[tokio::test]
    async fn test_maps_error_statuses() {
        let base = serve(Hits::default()).await;
        let lookup = client(base, Duration::ZERO);

        let err = lookup.stock(ProductId::new(9)).await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(id) if id == ProductId::new(9)));

        let err = lookup.stock(ProductId::new(2)).await.unwrap_err();
        assert!(matches!(err, LookupError::Api { status: 500, .. }));

        let err = lookup.stock(ProductId::new(3)).await.unwrap_err();
        assert!(matches!(err, LookupError::Parse(_)));
    }

    #[tokio::test]
    async fn test_product_cache() {
        let hits = Hits::default();
        let base = serve(hits.clone()).await;

        let cached = client(base.clone(), Duration::from_secs(60));
        cached.product(ProductId::new(1)).await.unwrap();
        cached.product(ProductId::new(1)).await.unwrap();
        assert_eq!(hits.0.load(Ordering::SeqCst), 1);

        let uncached = client(base, Duration::ZERO);
        uncached.product(ProductId::new(1)).await.unwrap();
        uncached.product(ProductId::new(1)).await.unwrap();
        assert_eq!(hits.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let base = serve(Hits::default()).await;
        let mut config = ApiConfig::new(base.join("auth").unwrap());
        config.token = Some(SecretString::from("tok_123"));
        let lookup = HttpLookup::new(&config).unwrap();

        let stock = lookup.stock(ProductId::new(1)).await.unwrap();
        assert_eq!(stock.amount, 1);
    }
}
