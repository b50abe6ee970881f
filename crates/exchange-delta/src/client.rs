//! Delta Exchange REST client with rate limiting and response caching.
//!
//! Provides typed access to the public market-data endpoints and the signed
//! private endpoints. Tickers and products are cached per client instance
//! with short TTLs and degrade to stale data when the upstream fails; candle
//! history is best-effort and degrades to empty. Everything else propagates
//! its classified error to the caller. The client never retries on its own;
//! retry policy belongs to the caller.
//!
//! # Example
//!
//! ```ignore
//! use cryptofolio_delta::{DeltaClient, DeltaClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> cryptofolio_delta::Result<()> {
//!     let client = DeltaClient::new(DeltaClientConfig::from_env())?;
//!
//!     let tickers = client.tickers().await;
//!     println!("{} tickers", tickers.len());
//!
//!     if client.is_configured() {
//!         let balances = client.wallet_balances().await?;
//!         println!("{} wallet assets", balances.len());
//!     }
//!     Ok(())
//! }
//! ```

use crate::auth::{DeltaAuth, API_VERSION_PREFIX};
use crate::cache::TtlCache;
use crate::error::{DeltaError, ErrorKind, Result};
use crate::types::{
    Candle, Fill, Order, OrderBook, OrderRequest, Position, Product, Ticker, WalletBalance,
};
use chrono::Utc;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, Method};
use secrecy::SecretString;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Delta Exchange production API base URL.
pub const DELTA_PROD_URL: &str = "https://api.delta.exchange";

/// Default time-to-live for the ticker cache.
const TICKER_CACHE_TTL: Duration = Duration::from_secs(30);

/// Default time-to-live for the product cache.
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Default trailing window for candle history, in seconds.
const DEFAULT_CANDLE_WINDOW_SECS: i64 = 7 * 24 * 3600;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Delta client.
pub struct DeltaClientConfig {
    /// Base URL for the API (without the version prefix).
    pub base_url: String,

    /// API key; `None` leaves the client unconfigured for private endpoints.
    pub api_key: Option<String>,

    /// API secret; `None` leaves the client unconfigured for private endpoints.
    pub api_secret: Option<SecretString>,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Ticker cache TTL.
    pub ticker_cache_ttl: Duration,

    /// Product cache TTL.
    pub product_cache_ttl: Duration,
}

impl std::fmt::Debug for DeltaClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("requests_per_minute", &self.requests_per_minute)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl Default for DeltaClientConfig {
    fn default() -> Self {
        Self {
            base_url: DELTA_PROD_URL.to_string(),
            api_key: None,
            api_secret: None,
            requests_per_minute: nonzero!(60u32),
            timeout_secs: 30,
            ticker_cache_ttl: TICKER_CACHE_TTL,
            product_cache_ttl: PRODUCT_CACHE_TTL,
        }
    }
}

impl DeltaClientConfig {
    /// Builds a configuration from `DELTA_API_KEY`, `DELTA_API_SECRET` and
    /// `DELTA_API_BASE_URL`. Missing or empty credentials leave the client
    /// unconfigured rather than failing.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("DELTA_API_BASE_URL") {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        let key = std::env::var("DELTA_API_KEY").ok().filter(|s| !s.is_empty());
        let secret = std::env::var("DELTA_API_SECRET")
            .ok()
            .filter(|s| !s.is_empty());
        if let (Some(key), Some(secret)) = (key, secret) {
            config.api_key = Some(key);
            config.api_secret = Some(SecretString::from(secret));
        }
        config
    }

    /// Sets the base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the API credentials.
    #[must_use]
    pub fn with_credentials(mut self, api_key: impl Into<String>, api_secret: SecretString) -> Self {
        self.api_key = Some(api_key.into());
        self.api_secret = Some(api_secret);
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: NonZeroU32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the ticker cache TTL.
    #[must_use]
    pub fn with_ticker_cache_ttl(mut self, ttl: Duration) -> Self {
        self.ticker_cache_ttl = ttl;
        self
    }

    /// Sets the product cache TTL.
    #[must_use]
    pub fn with_product_cache_ttl(mut self, ttl: Duration) -> Self {
        self.product_cache_ttl = ttl;
        self
    }
}

// =============================================================================
// DeltaClient
// =============================================================================

/// Delta Exchange REST client.
///
/// Caches are owned by the instance, so separate clients (e.g. in tests)
/// never share state.
pub struct DeltaClient {
    config: DeltaClientConfig,
    http: Client,
    rate_limiter: Arc<DirectRateLimiter>,
    auth: Option<DeltaAuth>,
    ticker_cache: TtlCache<Vec<Ticker>>,
    product_cache: TtlCache<Vec<Product>>,
}

impl std::fmt::Debug for DeltaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaClient")
            .field("base_url", &self.config.base_url)
            .field("configured", &self.auth.is_some())
            .finish_non_exhaustive()
    }
}

impl DeltaClient {
    /// Creates a new client.
    ///
    /// Credentials are optional; without them every public endpoint works and
    /// every private endpoint fails fast with `auth-not-configured`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the provided
    /// credentials are empty strings.
    pub fn new(mut config: DeltaClientConfig) -> Result<Self> {
        // The secret moves into the authenticator; the stored config keeps
        // only the key for diagnostics.
        let auth = match (config.api_key.clone(), config.api_secret.take()) {
            (Some(key), Some(secret)) => Some(DeltaAuth::new(key, secret)?),
            _ => None,
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeltaError::network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let ticker_cache = TtlCache::new(config.ticker_cache_ttl);
        let product_cache = TtlCache::new(config.product_cache_ttl);

        Ok(Self {
            config,
            http,
            rate_limiter,
            auth,
            ticker_cache,
            product_cache,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Returns true if API credentials are configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.auth.is_some()
    }

    // =========================================================================
    // Request Plumbing
    // =========================================================================

    fn url(&self, path: &str, query: &str) -> String {
        format!(
            "{}{}{}{}",
            self.config.base_url, API_VERSION_PREFIX, path, query
        )
    }

    fn auth(&self) -> Result<&DeltaAuth> {
        self.auth.as_ref().ok_or_else(DeltaError::not_configured)
    }

    /// Waits for the rate limiter and makes an unauthenticated GET request.
    async fn get_public<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &str,
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = self.url(path, query);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Waits for the rate limiter and makes a signed request.
    ///
    /// The credential check happens before anything else, so an unconfigured
    /// client performs no network call at all.
    async fn send_signed<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &str,
        body: Option<String>,
    ) -> Result<T> {
        let auth = self.auth()?;

        self.rate_limiter.until_ready().await;

        let body = body.unwrap_or_default();
        let headers = auth.sign(method.as_str(), path, query, &body)?;

        let url = self.url(path, query);
        tracing::debug!("{} {} body_len={}", method, url, body.len());

        let mut request = self
            .http
            .request(method, &url)
            .header("Accept", "application/json");
        for (name, value) in headers.as_tuples() {
            request = request.header(name, value);
        }
        if !body.is_empty() {
            request = request.header("Content-Type", "application/json").body(body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Converts an HTTP response into a typed result, unwrapping Delta's
    /// `{"success": true, "result": ...}` envelope when present.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&text).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            });
            return Err(DeltaError::from_status(status.as_u16(), message));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DeltaError::unexpected(format!("invalid JSON from Delta API: {e}")))?;

        let payload = match value {
            serde_json::Value::Object(mut map) if map.contains_key("result") => {
                map.remove("result").unwrap_or(serde_json::Value::Null)
            }
            other => other,
        };

        serde_json::from_value(payload)
            .map_err(|e| DeltaError::unexpected(format!("unexpected response shape: {e}")))
    }

    // =========================================================================
    // Public Market Data
    // =========================================================================

    /// Gets all available products, served from a per-instance cache.
    ///
    /// On upstream failure the last cached list is returned, or an empty list
    /// when nothing has been cached yet. A stale product list is preferable
    /// to a hard failure for this endpoint.
    pub async fn products(&self) -> Vec<Product> {
        if let Some(cached) = self.product_cache.get_fresh() {
            return cached;
        }

        match self.get_public::<Vec<Product>>("/products", "").await {
            Ok(products) => {
                self.product_cache.put(products.clone());
                products
            }
            Err(err) => {
                tracing::warn!("product fetch failed, serving cached data: {}", err);
                self.product_cache.get_stale().unwrap_or_default()
            }
        }
    }

    /// Gets tickers for all products, served from a per-instance cache with
    /// the same stale-serve-on-error policy as [`Self::products`].
    pub async fn tickers(&self) -> Vec<Ticker> {
        if let Some(cached) = self.ticker_cache.get_fresh() {
            return cached;
        }

        match self.get_public::<Vec<Ticker>>("/tickers", "").await {
            Ok(tickers) => {
                self.ticker_cache.put(tickers.clone());
                tickers
            }
            Err(err) => {
                tracing::warn!("ticker fetch failed, serving cached data: {}", err);
                self.ticker_cache.get_stale().unwrap_or_default()
            }
        }
    }

    /// Gets the ticker for one product symbol. Returns `Ok(None)` when the
    /// symbol does not exist; other failures propagate.
    ///
    /// # Errors
    /// Returns any non-404 API error.
    pub async fn ticker(&self, symbol: &str) -> Result<Option<Ticker>> {
        match self
            .get_public::<Ticker>(&format!("/tickers/{symbol}"), "")
            .await
        {
            Ok(ticker) => Ok(Some(ticker)),
            Err(err) if err.kind == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Gets the L2 order book for a product.
    ///
    /// # Errors
    /// Returns the classified API error on failure.
    pub async fn order_book(&self, product_id: u64) -> Result<OrderBook> {
        self.get_public(&format!("/l2orderbook/{product_id}"), "")
            .await
    }

    /// Gets historical OHLCV candles.
    ///
    /// Defaults to a trailing 7-day window when `start`/`end` are omitted.
    /// Best-effort: any failure yields an empty list, since a chart gap is
    /// preferable to a broken caller.
    ///
    /// # Arguments
    /// * `symbol` - product symbol (e.g. "BTCUSD")
    /// * `resolution` - candle interval ("1m", "5m", "15m", "1h", "4h", "1d")
    /// * `start` / `end` - window bounds in epoch seconds
    pub async fn candles(
        &self,
        symbol: &str,
        resolution: &str,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Vec<Candle> {
        let now = Utc::now().timestamp();
        let start = start.unwrap_or(now - DEFAULT_CANDLE_WINDOW_SECS);
        let end = end.unwrap_or(now);
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("symbol", symbol)
            .append_pair("resolution", resolution)
            .append_pair("start", &start.to_string())
            .append_pair("end", &end.to_string())
            .finish();
        let query = format!("?{query}");

        match self.get_public::<Vec<Candle>>("/history/candles", &query).await {
            Ok(candles) => candles,
            Err(err) => {
                tracing::warn!("candle fetch failed for {}, returning empty history: {}", symbol, err);
                Vec::new()
            }
        }
    }

    // =========================================================================
    // Authenticated Endpoints
    // =========================================================================

    /// Places an order.
    ///
    /// # Errors
    /// Fails with a validation error before signing when the request is
    /// malformed, with `auth-not-configured` when no credentials are set, or
    /// with the classified API error.
    pub async fn place_order(&self, order: &OrderRequest) -> Result<Order> {
        order.validate()?;
        let body = serde_json::to_string(order)
            .map_err(|e| DeltaError::unexpected(format!("failed to encode order: {e}")))?;
        self.send_signed(Method::POST, "/orders", "", Some(body)).await
    }

    /// Cancels an open order.
    ///
    /// # Errors
    /// Fails with `auth-not-configured` or the classified API error.
    pub async fn cancel_order(&self, order_id: u64, product_id: u64) -> Result<()> {
        let body = serde_json::json!({ "id": order_id, "product_id": product_id }).to_string();
        let _: serde_json::Value = self
            .send_signed(Method::DELETE, "/orders", "", Some(body))
            .await?;
        Ok(())
    }

    /// Gets open orders, optionally filtered by product.
    ///
    /// # Errors
    /// Fails with `auth-not-configured` or the classified API error.
    pub async fn open_orders(&self, product_id: Option<u64>) -> Result<Vec<Order>> {
        let query = product_id
            .map(|id| format!("?product_id={id}"))
            .unwrap_or_default();
        self.send_signed(Method::GET, "/orders", &query, None).await
    }

    /// Gets open positions.
    ///
    /// # Errors
    /// Fails with `auth-not-configured` or the classified API error.
    pub async fn positions(&self) -> Result<Vec<Position>> {
        self.send_signed(Method::GET, "/positions", "", None).await
    }

    /// Gets trade history (fills), optionally filtered by product.
    ///
    /// # Errors
    /// Fails with `auth-not-configured` or the classified API error.
    pub async fn fills(&self, product_id: Option<u64>) -> Result<Vec<Fill>> {
        let query = product_id
            .map(|id| format!("?product_id={id}"))
            .unwrap_or_default();
        self.send_signed(Method::GET, "/fills", &query, None).await
    }

    /// Gets wallet balances.
    ///
    /// # Errors
    /// Fails with `auth-not-configured` or the classified API error.
    pub async fn wallet_balances(&self) -> Result<Vec<WalletBalance>> {
        self.send_signed(Method::GET, "/wallet/balances", "", None).await
    }
}

/// Pulls a human-readable message out of an error response body.
///
/// Delta nests messages as `error.message` or `message`; an unparseable body
/// yields `None` so the caller can fall back to the status text.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    if let Some(message) = value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Some(message.to_string());
    }
    if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
        return Some(message.to_string());
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn public_client(base_url: &str) -> DeltaClient {
        DeltaClient::new(
            DeltaClientConfig::default()
                .with_base_url(base_url)
                .with_rate_limit(nonzero!(10_000u32)),
        )
        .unwrap()
    }

    fn signed_client(base_url: &str) -> DeltaClient {
        DeltaClient::new(
            DeltaClientConfig::default()
                .with_base_url(base_url)
                .with_credentials("test-key", SecretString::from("test-secret"))
                .with_rate_limit(nonzero!(10_000u32)),
        )
        .unwrap()
    }

    fn sample_ticker_json() -> serde_json::Value {
        serde_json::json!({
            "symbol": "BTCUSD",
            "product_id": 27,
            "mark_price": "64000.5",
            "spot_price": "63990.0",
            "volume": "120000"
        })
    }

    // ==================== Config Tests ====================

    #[test]
    fn test_config_defaults() {
        let config = DeltaClientConfig::default();
        assert_eq!(config.base_url, DELTA_PROD_URL);
        assert!(config.api_key.is_none());
        assert_eq!(config.requests_per_minute.get(), 60);
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let config = DeltaClientConfig::default()
            .with_credentials("key", SecretString::from("very-secret"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn test_unconfigured_client_reports_not_configured() {
        let client = public_client("http://localhost:1");
        assert!(!client.is_configured());
    }

    #[test]
    fn test_configured_client_reports_configured() {
        let client = signed_client("http://localhost:1");
        assert!(client.is_configured());
    }

    // ==================== Envelope Tests ====================

    #[tokio::test]
    async fn test_result_envelope_is_unwrapped() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "result": [{ "id": 27, "symbol": "BTCUSD" }]
            })))
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        let products = client.products().await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].symbol, "BTCUSD");
    }

    #[tokio::test]
    async fn test_bare_body_without_envelope_parses() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/tickers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([sample_ticker_json()])),
            )
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        let tickers = client.tickers().await;
        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].product_id, Some(27));
    }

    // ==================== Cache Tests ====================

    #[tokio::test]
    async fn test_tickers_served_from_cache_within_ttl() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/tickers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [sample_ticker_json()]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        let first = client.tickers().await;
        let second = client.tickers().await;
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        // expect(1) verifies the second call never hit the server
    }

    #[tokio::test]
    async fn test_tickers_stale_served_after_upstream_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/tickers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [sample_ticker_json()]
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/tickers"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = DeltaClient::new(
            DeltaClientConfig::default()
                .with_base_url(mock_server.uri())
                .with_rate_limit(nonzero!(10_000u32))
                // expire immediately so the second call refetches
                .with_ticker_cache_ttl(Duration::ZERO),
        )
        .unwrap();

        let first = client.tickers().await;
        assert_eq!(first.len(), 1);

        let second = client.tickers().await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].symbol, "BTCUSD");
    }

    #[tokio::test]
    async fn test_tickers_empty_when_failing_with_no_cache() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/tickers"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        assert!(client.tickers().await.is_empty());
    }

    #[tokio::test]
    async fn test_products_stale_served_after_upstream_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{ "id": 27, "symbol": "BTCUSD" }]
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/products"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = DeltaClient::new(
            DeltaClientConfig::default()
                .with_base_url(mock_server.uri())
                .with_rate_limit(nonzero!(10_000u32))
                .with_product_cache_ttl(Duration::ZERO),
        )
        .unwrap();

        assert_eq!(client.products().await.len(), 1);
        assert_eq!(client.products().await.len(), 1);
    }

    // ==================== Ticker Lookup Tests ====================

    #[tokio::test]
    async fn test_single_ticker_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/tickers/BTCUSD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": sample_ticker_json()
            })))
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        let ticker = client.ticker("BTCUSD").await.unwrap();
        assert_eq!(ticker.unwrap().symbol, "BTCUSD");
    }

    #[tokio::test]
    async fn test_single_ticker_404_is_none() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/tickers/NOPE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        assert!(client.ticker("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_ticker_server_error_propagates() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/tickers/BTCUSD"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        let err = client.ticker("BTCUSD").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.status, 500);
    }

    // ==================== Error Classification Tests ====================

    #[tokio::test]
    async fn test_429_classified_as_rate_limit_with_body_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/l2orderbook/27"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "rate limit exceeded" }
            })))
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        let err = client.order_book(27).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimit);
        assert_eq!(err.status, 429);
        assert_eq!(err.message, "rate limit exceeded");
    }

    #[tokio::test]
    async fn test_401_classified_as_auth_with_warmup_note() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/positions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "message": "invalid api key"
            })))
            .mount(&mock_server)
            .await;

        let client = signed_client(&mock_server.uri());
        let err = client.positions().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Auth);
        assert_eq!(err.status, 401);
        assert!(err.message.contains("invalid api key"));
        assert!(err.message.contains("take a few minutes"));
    }

    #[tokio::test]
    async fn test_connection_failure_classified_as_network() {
        // Nothing listens on this port.
        let client = public_client("http://127.0.0.1:9");
        let err = client.order_book(27).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(err.status, 0);
    }

    // ==================== Auth Gating Tests ====================

    #[tokio::test]
    async fn test_private_call_without_credentials_makes_no_request() {
        let mock_server = MockServer::start().await;
        let client = public_client(&mock_server.uri());

        let err = client.wallet_balances().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthNotConfigured);

        let err = client
            .place_order(&OrderRequest::market(27, Side::Buy, 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthNotConfigured);

        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_order_rejected_before_any_request() {
        let mock_server = MockServer::start().await;
        let client = signed_client(&mock_server.uri());

        let err = client
            .place_order(&OrderRequest::market(27, Side::Buy, -1.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests.is_empty());
    }

    // ==================== Signed Endpoint Tests ====================

    #[tokio::test]
    async fn test_place_order_sends_signed_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {
                    "id": 9001,
                    "product_id": 27,
                    "side": "buy",
                    "size": 1.0,
                    "state": "open"
                }
            })))
            .mount(&mock_server)
            .await;

        let client = signed_client(&mock_server.uri());
        let order = client
            .place_order(&OrderRequest::market(27, Side::Buy, 1.0))
            .await
            .unwrap();
        assert_eq!(order.id, 9001);

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let headers = &requests[0].headers;
        assert_eq!(headers.get("api-key").unwrap(), "test-key");
        assert!(headers.contains_key("signature"));
        assert!(headers.contains_key("timestamp"));
    }

    #[tokio::test]
    async fn test_cancel_order_sends_delete_with_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "id": 9001, "product_id": 27, "side": "buy", "size": 1.0 }
            })))
            .mount(&mock_server)
            .await;

        let client = signed_client(&mock_server.uri());
        client.cancel_order(9001, 27).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["id"], 9001);
        assert_eq!(body["product_id"], 27);
    }

    #[tokio::test]
    async fn test_open_orders_filters_by_product() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/orders"))
            .and(query_param("product_id", "27"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{ "id": 1, "product_id": 27, "side": "sell", "size": 2.0 }]
            })))
            .mount(&mock_server)
            .await;

        let client = signed_client(&mock_server.uri());
        let orders = client.open_orders(Some(27)).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].product_id, 27);
    }

    #[tokio::test]
    async fn test_fills_parse() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/fills"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{
                    "id": 555,
                    "product_id": 27,
                    "side": "buy",
                    "size": 0.5,
                    "price": "64000",
                    "role": "taker"
                }]
            })))
            .mount(&mock_server)
            .await;

        let client = signed_client(&mock_server.uri());
        let fills = client.fills(None).await.unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price.as_deref(), Some("64000"));
    }

    #[tokio::test]
    async fn test_wallet_balances_parse() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/wallet/balances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{ "asset_id": 1, "asset_symbol": "USDT", "balance": "1000.0" }]
            })))
            .mount(&mock_server)
            .await;

        let client = signed_client(&mock_server.uri());
        let balances = client.wallet_balances().await.unwrap();
        assert_eq!(balances[0].asset_symbol.as_deref(), Some("USDT"));
    }

    // ==================== Candle Tests ====================

    #[tokio::test]
    async fn test_candles_parse_with_explicit_window() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/history/candles"))
            .and(query_param("symbol", "BTCUSD"))
            .and(query_param("resolution", "1h"))
            .and(query_param("start", "1700000000"))
            .and(query_param("end", "1700003600"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [{
                    "time": 1_700_000_000,
                    "open": 64000.0,
                    "high": 64500.0,
                    "low": 63800.0,
                    "close": 64250.0,
                    "volume": 1200.0
                }]
            })))
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        let candles = client
            .candles("BTCUSD", "1h", Some(1_700_000_000), Some(1_700_003_600))
            .await;
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].close, 64250.0);
    }

    #[tokio::test]
    async fn test_candle_query_values_are_percent_encoded() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/history/candles"))
            .and(query_param("symbol", "MARK:BTC USD"))
            .and(query_param("resolution", "1h"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": []
            })))
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        client.candles("MARK:BTC USD", "1h", Some(1), Some(2)).await;

        // the request must reach the server as a valid URL, with the
        // reserved characters encoded rather than passed through raw
        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let raw_query = requests[0].url.query().unwrap();
        assert!(raw_query.contains("symbol=MARK%3ABTC+USD"));
    }

    #[tokio::test]
    async fn test_candles_failure_yields_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/history/candles"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = public_client(&mock_server.uri());
        assert!(client.candles("BTCUSD", "1h", None, None).await.is_empty());
    }

    // ==================== Message Extraction Tests ====================

    #[test]
    fn test_extract_nested_error_message() {
        let body = r#"{"error":{"message":"bad things"}}"#;
        assert_eq!(extract_error_message(body).unwrap(), "bad things");
    }

    #[test]
    fn test_extract_flat_message() {
        let body = r#"{"message":"flat"}"#;
        assert_eq!(extract_error_message(body).unwrap(), "flat");
    }

    #[test]
    fn test_extract_falls_back_to_whole_json_body() {
        let body = r#"{"code":"oops"}"#;
        assert!(extract_error_message(body).unwrap().contains("oops"));
    }

    #[test]
    fn test_extract_none_for_non_json() {
        assert!(extract_error_message("<html>gateway error</html>").is_none());
    }
}
