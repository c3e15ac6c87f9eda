//! Signed client for the Waxx REST API.
//!
//! Every request is signed immediately before it is sent. Retried attempts
//! are signed again, so no timestamp/nonce pair ever goes out twice.

use crate::config::{ApiConfig, Config};
use crate::signing::{Clock, NonceSource, RandomNonce, RequestParams, RequestSigner, SystemClock};
use crate::types::{ApiResponse, Brand};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

pub const ENDPOINT_DEVICE_INFO: &str = "getDeviceInfo";
pub const ENDPOINT_ALL_BRANDS: &str = "getAllBrand";

/// Exponent cap for retry backoff; later attempts wait as long as this one.
const MAX_BACKOFF_EXPONENT: u32 = 10;

/// `base_ms * 2^attempt`, with the exponent capped so large retry counts
/// cannot overflow.
fn backoff_delay(base_ms: u64, attempt: u32) -> StdDuration {
    let factor = 1u64 << attempt.min(MAX_BACKOFF_EXPONENT);
    StdDuration::from_millis(base_ms.saturating_mul(factor))
}

/// Waxx API client.
pub struct WaxxClient<C = SystemClock, N = RandomNonce> {
    base_url: String,
    max_retries: u32,
    signer: RequestSigner<C, N>,
    /// HTTP client for API requests.
    pub http_client: reqwest::Client,
}

impl WaxxClient {
    /// Build a client from loaded configuration.
    #[allow(clippy::result_large_err)]
    pub fn from_config(config: Config) -> Result<Self> {
        Self::new(config.api, RequestSigner::new(config.credential))
    }
}

impl<C: Clock, N: NonceSource> WaxxClient<C, N> {
    #[allow(clippy::result_large_err)]
    pub fn new(api: ApiConfig, signer: RequestSigner<C, N>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(api.timeout)
            .connect_timeout(StdDuration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            max_retries: api.max_retries.max(1),
            signer,
            http_client,
        })
    }

    pub fn signer(&self) -> &RequestSigner<C, N> {
        &self.signer
    }

    /// `<base>/<endpoint>`, followed by `?<canonical query>` when there are
    /// parameters. The query is exactly the string that gets signed.
    pub fn endpoint_url(&self, endpoint: &str, params: &RequestParams) -> String {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        if params.is_empty() {
            url
        } else {
            format!("{}?{}", url, params.to_query_string())
        }
    }

    /// Build a signed GET request.
    #[allow(clippy::result_large_err)]
    pub fn build_get(&self, endpoint: &str, params: &RequestParams) -> Result<reqwest::Request> {
        let headers = self.signer.sign(params)?;
        let request = self.http_client.get(self.endpoint_url(endpoint, params));
        Ok(headers.apply(request).build()?)
    }

    /// Build a signed POST request with a JSON body.
    ///
    /// POST bodies are not part of the signature; the message covers the
    /// timestamp and nonce with an empty query.
    #[allow(clippy::result_large_err)]
    pub fn build_post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<reqwest::Request> {
        let params = RequestParams::new();
        let body = serde_json::to_string(body)?;
        let headers = self.signer.sign(&params)?;
        let request = self.http_client.post(self.endpoint_url(endpoint, &params));
        Ok(headers.apply(request).body(body).build()?)
    }

    /// Execute a signed GET with retry and exponential backoff.
    ///
    /// Retries on 5xx server errors, 429 rate-limit responses and transport
    /// failures. All other 4xx errors fail immediately.
    async fn get_with_retry(
        &self,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<reqwest::Response> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            let request = self.build_get(endpoint, params)?;
            match self.http_client.execute(request).await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response)
                    if response.status().as_u16() == 429 || response.status().is_server_error() =>
                {
                    let status = response.status();
                    let is_rate_limited = status.as_u16() == 429;
                    warn!(
                        attempt = attempt + 1,
                        status = %status,
                        endpoint = endpoint,
                        rate_limited = is_rate_limited,
                        "Retryable API error, backing off"
                    );
                    last_error = Some(Error::Api {
                        message: format!(
                            "{}: {}",
                            if is_rate_limited {
                                "Rate limited"
                            } else {
                                "Server error"
                            },
                            status
                        ),
                        status: Some(status.as_u16()),
                    });

                    if attempt + 1 < self.max_retries {
                        let backoff = if is_rate_limited {
                            // 2s, 4s, 8s for rate limits
                            backoff_delay(2000, attempt)
                        } else {
                            // 500ms, 1s, 2s for server errors
                            backoff_delay(500, attempt)
                        };
                        tokio::time::sleep(backoff).await;
                    }
                    continue;
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let text = response.text().await.unwrap_or_default();
                    return Err(Error::Api {
                        message: format!("{} failed: {} - {}", endpoint, status, text),
                        status: Some(status),
                    });
                }
                Err(e) => {
                    warn!(
                        attempt = attempt + 1,
                        error = %e,
                        endpoint = endpoint,
                        "HTTP request failed, backing off"
                    );
                    last_error = Some(Error::Http(e));
                }
            }

            if attempt + 1 < self.max_retries {
                let backoff = backoff_delay(500, attempt);
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_error.unwrap_or(Error::Api {
            message: "Max retries exceeded".to_string(),
            status: None,
        }))
    }

    /// Signed GET returning the decoded response envelope.
    pub async fn get_signed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<ApiResponse<T>> {
        let response = self.get_with_retry(endpoint, params).await?;
        let text = response.text().await?;
        debug!(endpoint = endpoint, bytes = text.len(), "API response received");
        Ok(serde_json::from_str(&text)?)
    }

    /// Signed POST returning the decoded response envelope. Not retried.
    pub async fn post_signed<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let request = self.build_post(endpoint, body)?;
        let response = self.http_client.execute(request).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                message: format!("{} failed: {} - {}", endpoint, status, text),
                status: Some(status),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch device information for a scanned device ID.
    ///
    /// The payload shape belongs to the API and is returned as raw JSON.
    pub async fn get_device_info(&self, device_mac: &str) -> Result<serde_json::Value> {
        let params = RequestParams::new().with("deviceMac", device_mac);
        let data = self
            .get_signed(ENDPOINT_DEVICE_INFO, &params)
            .await?
            .into_data("Failed to fetch device info")?;

        info!(device_mac = %device_mac, "Device info loaded");
        Ok(data)
    }

    /// Fetch every brand.
    pub async fn get_all_brands(&self) -> Result<Vec<Brand>> {
        let brands: Vec<Brand> = self
            .get_signed(ENDPOINT_ALL_BRANDS, &RequestParams::new())
            .await?
            .into_data("Failed to fetch brands")?;

        info!(count = brands.len(), "Brands loaded");
        Ok(brands)
    }
}

impl<C, N> std::fmt::Debug for WaxxClient<C, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaxxClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
