//! `reqwest` implementation of [`StoreApi`].

use std::sync::Arc;

use alghazaly_core::{BundleGroupId, CartLine, CustomerId, FavoriteEntry, Order, ProductId};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::responses::{
    CartAddResponse, CartResponse, CustomerOrdersResponse, FavoriteStatusResponse,
    FavoritesResponse, MessageResponse,
};
use super::{ApiError, CartAddRequest, StoreApi};
use crate::config::ApiConfig;

/// Maximum number of body characters copied into logs and error messages.
const MAX_LOGGED_BODY: usize = 500;

/// HTTP client for the Al-Ghazaly REST API.
///
/// Authenticates every request with the customer's bearer session token.
/// Cheap to clone.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the session token is not a valid header value or
    /// the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.session_token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid session token format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Absolute URL for an API path (without the `/api` prefix).
    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.inner.base_url)
    }

    /// Send a request and decode the body into `T`.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = detail_message(&body);
            tracing::error!(
                status = %status,
                body = %body.chars().take(MAX_LOGGED_BODY).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => ApiError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(MAX_LOGGED_BODY).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    async fn acknowledge(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let ack: MessageResponse = self.execute(request).await?;
        debug!(message = %ack.message, "Backend acknowledged mutation");
        Ok(())
    }
}

/// Extract FastAPI's `{"detail": "..."}` message, falling back to the raw body.
fn detail_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl StoreApi for RestClient {
    #[instrument(skip(self))]
    async fn cart_get(&self) -> Result<Vec<CartLine>, ApiError> {
        let response: CartResponse = self
            .execute(self.inner.client.get(self.url("cart")))
            .await?;
        Ok(response.items)
    }

    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    async fn cart_add(&self, request: &CartAddRequest) -> Result<CartLine, ApiError> {
        let response: CartAddResponse = self
            .execute(self.inner.client.post(self.url("cart/add")).json(request))
            .await?;
        Ok(response.item.into_cart_line(request.product.clone()))
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn cart_update(&self, product_id: &ProductId, quantity: i64) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "product_id": product_id,
            "quantity": quantity,
        });
        self.acknowledge(self.inner.client.put(self.url("cart/update")).json(&body))
            .await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn cart_remove(&self, product_id: &ProductId) -> Result<(), ApiError> {
        // The backend has no dedicated remove route; quantity 0 removes the line.
        self.cart_update(product_id, 0).await
    }

    #[instrument(skip(self))]
    async fn cart_clear(&self) -> Result<(), ApiError> {
        self.acknowledge(self.inner.client.delete(self.url("cart/clear")))
            .await
    }

    #[instrument(skip(self), fields(bundle_group_id = %bundle_group_id))]
    async fn cart_void_bundle(&self, bundle_group_id: &BundleGroupId) -> Result<(), ApiError> {
        let path = format!(
            "cart/void-bundle/{}",
            urlencoding::encode(bundle_group_id.as_str())
        );
        self.acknowledge(self.inner.client.delete(self.url(&path)))
            .await
    }

    #[instrument(skip(self))]
    async fn favorites_get_all(&self) -> Result<Vec<FavoriteEntry>, ApiError> {
        let response: FavoritesResponse = self
            .execute(self.inner.client.get(self.url("favorites")))
            .await?;
        Ok(response.favorites)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn favorites_toggle(&self, product_id: &ProductId) -> Result<bool, ApiError> {
        let body = serde_json::json!({ "product_id": product_id });
        let response: FavoriteStatusResponse = self
            .execute(
                self.inner
                    .client
                    .post(self.url("favorites/toggle"))
                    .json(&body),
            )
            .await?;
        Ok(response.is_favorite)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn favorites_check(&self, product_id: &ProductId) -> Result<bool, ApiError> {
        let path = format!(
            "favorites/check/{}",
            urlencoding::encode(product_id.as_str())
        );
        let response: FavoriteStatusResponse =
            self.execute(self.inner.client.get(self.url(&path))).await?;
        Ok(response.is_favorite)
    }

    #[instrument(skip(self))]
    async fn orders_get_all(&self) -> Result<Vec<Order>, ApiError> {
        // This endpoint returns a bare JSON array.
        self.execute(self.inner.client.get(self.url("orders")))
            .await
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn customer_cart(&self, customer_id: &CustomerId) -> Result<Vec<CartLine>, ApiError> {
        let path = format!(
            "admin/customer/{}/cart",
            urlencoding::encode(customer_id.as_str())
        );
        let response: CartResponse = self.execute(self.inner.client.get(self.url(&path))).await?;
        Ok(response.items)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn customer_favorites(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<FavoriteEntry>, ApiError> {
        let path = format!(
            "admin/customer/{}/favorites",
            urlencoding::encode(customer_id.as_str())
        );
        let response: FavoritesResponse =
            self.execute(self.inner.client.get(self.url(&path))).await?;
        Ok(response.favorites)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn customer_orders(&self, customer_id: &CustomerId) -> Result<Vec<Order>, ApiError> {
        let path = format!(
            "admin/customer/{}/orders",
            urlencoding::encode(customer_id.as_str())
        );
        let response: CustomerOrdersResponse =
            self.execute(self.inner.client.get(self.url(&path))).await?;
        Ok(response.orders)
    }
}
