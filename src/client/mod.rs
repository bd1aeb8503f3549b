//! Typed HTTP client for the storefront API, plus the client-side state that sits on
//! top of it: listing pages, search autocomplete and saved preferences.

pub mod autocomplete;
pub mod listing;
pub mod preferences;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use autocomplete::AutocompleteSession;
pub use listing::ListingController;
pub use preferences::{PreferenceStore, Preferences};

use crate::catalog::{FilterOptions, ListingQuery, Page};
use crate::domain::aggregates::{Cart, Category, Coupon, NewOrder, Offer, Order, Product, Review, ShippingInfo};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status} {code}: {message}")]
    Api { status: StatusCode, code: String, message: String },

    #[error("preference file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuote {
    pub valid: bool,
    pub code: String,
    pub discount: Decimal,
    pub total: Decimal,
    pub coupon: Coupon,
}

#[derive(Clone, Debug)]
pub struct StorefrontClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl StorefrontClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http: reqwest::Client::new(), base_url, token: None }
    }

    /// Base URL from `STOREFRONT_API_URL`, falling back to the local dev server.
    pub fn from_env() -> Self {
        let base_url = std::env::var("STOREFRONT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    /// Attaches a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => ClientError::Api { status, code: envelope.error.code, message: envelope.error.message },
            Err(_) => ClientError::Api { status, code: "http_error".to_string(), message: body },
        })
    }

    pub async fn list_products(&self, query: &ListingQuery) -> Result<Page<Product>, ClientError> {
        self.send(self.http.get(self.url("/products")).query(query)).await
    }

    pub async fn search_products(&self, term: &str, limit: usize) -> Result<Vec<Product>, ClientError> {
        let limit = limit.to_string();
        self.send(self.http.get(self.url("/products/search")).query(&[("q", term), ("limit", limit.as_str())]))
            .await
    }

    pub async fn filter_options(&self) -> Result<FilterOptions, ClientError> {
        self.send(self.http.get(self.url("/products/filter-options"))).await
    }

    pub async fn product(&self, id: Uuid) -> Result<Product, ClientError> {
        self.send(self.http.get(self.url(&format!("/products/{id}")))).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        self.send(self.http.get(self.url("/categories"))).await
    }

    pub async fn reviews(&self, product_id: Uuid) -> Result<Vec<Review>, ClientError> {
        let product_id = product_id.to_string();
        self.send(self.http.get(self.url("/reviews")).query(&[("productId", product_id.as_str())])).await
    }

    pub async fn active_offers(&self) -> Result<Vec<Offer>, ClientError> {
        self.send(self.http.get(self.url("/offers/active"))).await
    }

    pub async fn validate_coupon(&self, code: &str, order_amount: Decimal) -> Result<CouponQuote, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            code: &'a str,
            order_amount: Decimal,
        }
        self.send(self.http.post(self.url("/coupons/validate")).json(&Body { code, order_amount })).await
    }

    /// Signed-in checkout when a token is attached, guest checkout otherwise.
    pub async fn place_order(&self, order: &NewOrder) -> Result<Order, ClientError> {
        let path = if self.token.is_some() { "/orders" } else { "/orders/guest" };
        self.send(self.http.post(self.url(path)).json(order)).await
    }

    /// Places an order for the cart's lines and applied coupon. Prices are set by the server.
    pub async fn checkout(&self, cart: &Cart, shipping_info: ShippingInfo, user_id: Option<String>) -> Result<Order, ClientError> {
        let order = NewOrder {
            products: cart.to_order_items(),
            shipping_info,
            coupon_code: cart.coupon_code().map(str::to_string),
            user_id,
        };
        self.place_order(&order).await
    }
}

/// Where listing pages and suggestions come from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_page(&self, query: &ListingQuery) -> Result<Page<Product>, ClientError>;
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Product>, ClientError>;
    async fn categories(&self) -> Result<Vec<Category>, ClientError>;
}

#[async_trait]
impl CatalogSource for StorefrontClient {
    async fn fetch_page(&self, query: &ListingQuery) -> Result<Page<Product>, ClientError> {
        self.list_products(query).await
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Product>, ClientError> {
        self.search_products(term, limit).await
    }

    async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        StorefrontClient::categories(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = StorefrontClient::new("http://shop.test/api/");
        assert_eq!(client.url("/products"), "http://shop.test/api/products");
    }
}
