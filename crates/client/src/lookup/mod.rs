//! Remote address lookup client.
//!
//! ### Contract
//!
//! - **Endpoint**: `POST <endpoint>` (default `https://gcp.gtelem.com/process_address`).
//! - **Body**: `{"city": ..., "street": ..., "houseNum": ...}` as JSON.
//! - **Response**: JSON with optional `travel_times` and `ftth` sections.
//! - One request per call. No retries and no timeout beyond the transport default.
//! - Successful responses are written to the result cache before being returned.

use std::sync::Arc;

use reqwest::header;
use url::Url;
use yadz_core::{Address, AppConfig, Error, LookupResult, ResultCache, ScanLog, address_hash};

/// Default lookup endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://gcp.gtelem.com/process_address";

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "yadz/0.1";

/// Lookup client configuration.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Endpoint receiving the address POST.
    pub endpoint: String,
    /// User-agent string (default: yadz/0.x).
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self { endpoint: DEFAULT_ENDPOINT.to_string(), user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

impl From<&AppConfig> for LookupConfig {
    fn from(config: &AppConfig) -> Self {
        Self { endpoint: config.endpoint.clone(), user_agent: config.user_agent.clone() }
    }
}

/// Client for the address lookup service.
#[derive(Clone)]
pub struct LookupClient {
    http: reqwest::Client,
    endpoint: Url,
    cache: ResultCache,
    log: Arc<dyn ScanLog>,
}

impl LookupClient {
    /// Create a client that writes successful lookups into `cache`.
    pub fn new(config: LookupConfig, cache: ResultCache, log: Arc<dyn ScanLog>) -> Result<Self, Error> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.endpoint)))?;

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, endpoint, cache, log })
    }

    /// Look up `address`, logging any failure.
    ///
    /// `None` means there is nothing to render for now.
    pub async fn lookup(&self, address: &Address) -> Option<LookupResult> {
        match self.try_lookup(address).await {
            Ok(result) => Some(result),
            Err(e) => {
                self.log.error(&format!("Error sending address to server: {e}"));
                None
            }
        }
    }

    /// Look up `address`, returning the failure to the caller.
    ///
    /// A failed cache write is logged and does not fail the lookup.
    pub async fn try_lookup(&self, address: &Address) -> Result<LookupResult, Error> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .json(address)
            .send()
            .await
            .map_err(|e| Error::HttpError(format!("network error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {e}")))?;
        let result: LookupResult =
            serde_json::from_slice(&bytes).map_err(|e| Error::ResponseParse(e.to_string()))?;

        self.log.verbose(&format!("Server response: {result}"));

        let hash = address_hash(address);
        if let Err(e) = self.cache.set(&hash, &result).await {
            self.log.error(&format!("Failed to cache result for {address}: {e}"));
        }

        Ok(result)
    }
}

impl std::fmt::Debug for LookupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
