//! Backend REST API client and the collaborator seams over it.
//!
//! The storefront core never talks to `reqwest` directly; it consumes the
//! [`CategorySource`], [`CartSource`], and [`OrderGateway`] traits so tests
//! can substitute counting or failing collaborators. [`BackendClient`] is
//! the production implementation of all three, with a `moka` cache in front
//! of the category pages (categories change rarely; carts and orders are
//! never cached).

pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tamarind_core::{CartLine, CategoryPage, OrderDetail, OrderId};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::BackendApiConfig;
use crate::stores::AuthStore;

use types::{CartEnvelope, CartItemWire, CategoryPageWire, CreateOrderRequest, OrderEnvelope};

/// How much of an error body is kept for the error message.
const ERROR_BODY_LIMIT: usize = 200;

/// Errors from talking to the backend REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, connect, timeout, aborted body).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status and a message payload.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The referenced order or category does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend answered 2xx but the payload did not parse.
    #[error("malformed response: {0}")]
    Decode(String),
}

// =============================================================================
// Collaborator seams
// =============================================================================

/// Supplies category pages from the catalog.
#[async_trait]
pub trait CategorySource: Send + Sync {
    /// Fetch one page of the category listing.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    async fn fetch_category_page(&self, page: u32, limit: u32) -> Result<CategoryPage, ApiError>;
}

/// Supplies the authenticated user's server-side cart.
#[async_trait]
pub trait CartSource: Send + Sync {
    /// Fetch the current cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    async fn fetch_cart_lines(&self) -> Result<Vec<CartLine>, ApiError>;
}

/// Creates orders and looks them up; payment itself is an opaque external
/// service that only hands back a payment reference.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit the given lines as a new order.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    async fn create_order(&self, lines: &[CartLine]) -> Result<CreatedOrder, ApiError>;

    /// Fetch authoritative order data by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when the order does not exist, or
    /// another error on transport failure or a non-2xx response.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderDetail, ApiError>;
}

/// What the backend returns for a just-created order.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOrder {
    /// Server-minted order ID.
    pub order_id: OrderId,
    /// Total the backend computed for the order.
    pub total: rust_decimal::Decimal,
}

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the storefront's backend REST API.
///
/// Cheaply cloneable via `Arc`. Category pages are cached with the TTL and
/// capacity from the configuration; the bearer token is read live from the
/// [`AuthStore`] on every request, so login and logout take effect without
/// rebuilding the client.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    base_url: String,
    auth: AuthStore,
    fallback_token: Option<SecretString>,
    page_cache: Cache<(u32, u32), CategoryPage>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &BackendApiConfig, auth: AuthStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let page_cache = Cache::builder()
            .max_capacity(config.category_cache_capacity)
            .time_to_live(config.category_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
                auth,
                fallback_token: config.access_token.clone(),
                page_cache,
            }),
        })
    }

    /// Drop all cached category pages.
    ///
    /// Call after anything that is known to have changed the catalog.
    pub async fn invalidate_categories(&self) {
        self.inner.page_cache.invalidate_all();
        self.inner.page_cache.run_pending_tasks().await;
    }

    /// Bearer token for the current request: the live session's token, or
    /// the configured fallback when no one is logged in.
    fn bearer(&self) -> Option<SecretString> {
        self.inner
            .auth
            .token()
            .or_else(|| self.inner.fallback_token.clone())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// Execute a GET against `path`, mapping status and decode failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut request = self.inner.http.get(self.endpoint(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let body = check_status(response).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Execute a POST with a JSON body against `path`.
    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.http.post(self.endpoint(path)).json(body);
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let body = check_status(response).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CategorySource for BackendClient {
    #[instrument(skip(self))]
    async fn fetch_category_page(&self, page: u32, limit: u32) -> Result<CategoryPage, ApiError> {
        let cache_key = (page, limit);

        if let Some(cached) = self.inner.page_cache.get(&cache_key).await {
            debug!("cache hit for category page");
            return Ok(cached);
        }

        let wire: CategoryPageWire = self
            .get_json(
                "api/category",
                &[("limit", limit.to_string()), ("page", page.to_string())],
            )
            .await?;
        let fetched = CategoryPage::from(wire);

        self.inner
            .page_cache
            .insert(cache_key, fetched.clone())
            .await;

        Ok(fetched)
    }
}

#[async_trait]
impl CartSource for BackendClient {
    #[instrument(skip(self))]
    async fn fetch_cart_lines(&self) -> Result<Vec<CartLine>, ApiError> {
        let envelope: CartEnvelope = self.get_json("api/cart", &[]).await?;
        Ok(envelope
            .items
            .into_iter()
            .filter_map(CartItemWire::into_line)
            .collect())
    }
}

#[async_trait]
impl OrderGateway for BackendClient {
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    async fn create_order(&self, lines: &[CartLine]) -> Result<CreatedOrder, ApiError> {
        let request = CreateOrderRequest::from_lines(lines);
        let envelope: OrderEnvelope = self.post_json("api/orders", &request).await?;

        Ok(CreatedOrder {
            order_id: OrderId::new(envelope.data.order_id),
            total: envelope.data.total_amount,
        })
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderDetail, ApiError> {
        let path = format!("api/orders/{order_id}");
        let envelope: OrderEnvelope = self.get_json(&path, &[]).await?;
        Ok(envelope.data.into())
    }
}

/// Map a non-2xx response to the right error; return the body otherwise.
async fn check_status(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(error_message(&body)));
    }
    if !status.is_success() {
        return Err(ApiError::Server {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    Ok(body)
}

/// Pull a human-readable message out of an error body.
///
/// The backend usually sends `{"message": "..."}`; anything else is kept
/// verbatim, truncated so a proxy's HTML error page cannot flood the logs.
fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct MessageBody {
        message: String,
    }

    if let Ok(parsed) = serde_json::from_str::<MessageBody>(body) {
        return parsed.message;
    }
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
