use crate::config::NetworkConfig;
use crate::internal::models::ImagesResponse;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const FIGMA_API_BASE_URL: &str = "https://api.figma.com";

/// Build the image-export endpoint URL for a design file.
pub fn images_endpoint(base_url: &str, file_id: &str) -> String {
    format!("{}/v1/images/{}", base_url.trim_end_matches('/'), file_id)
}

/// HTTP client for the design service's image-export API.
///
/// Returns `anyhow::Result` with contextualized errors; callers that need a typed
/// error (the resolver) map these into their own taxonomy.
#[derive(Clone)]
pub struct DesignService {
    client: Client,
    base_url: String,
    token_header: String,
    enable_metrics: bool,
}

impl DesignService {
    pub fn new(config: &NetworkConfig, enable_metrics: bool) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build configured HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.api_base_url.clone(),
            token_header: config.token_header.clone(),
            enable_metrics,
        }
    }

    /// Service pointed at an arbitrary host, with default header and timeout.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let config = NetworkConfig {
            api_base_url: base_url.into(),
            ..NetworkConfig::default()
        };
        Self::new(&config, false)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a URL with the access token header and deserialize the JSON body into `T`.
    ///
    /// Statuses listed in `body_statuses` still have their body decoded; the caller
    /// reads the service's error from it. Any other non-2xx status is an error.
    async fn get_json<T>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        token: &str,
        body_statuses: &[StatusCode],
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let start = std::time::Instant::now();
        let resp = self
            .client
            .get(url)
            .query(query)
            .header(self.token_header.as_str(), token)
            .send()
            .await
            .with_context(|| format!("failed to send GET request to {}", url))?;

        let resp = match body_statuses.contains(&resp.status()) {
            true => resp,
            false => resp
                .error_for_status()
                .with_context(|| format!("design service rejected request to {}", url))?,
        };
        let status = resp.status();

        let body = resp
            .json::<T>()
            .await
            .with_context(|| format!("failed to parse JSON response ({}) from {}", status, url));

        if self.enable_metrics {
            tracing::debug!(elapsed = ?start.elapsed(), url, %status, "api.get_json");
        }
        body
    }

    /// Ask the service to export `node_id` of `file_id` and return the raw response.
    ///
    /// `node_id` is sent as given (dash form); the response is keyed by the colon form.
    /// Unknown or invalid node ids come back as 400/404 with `err` set and no images;
    /// those are returned as a response, not an error.
    pub async fn fetch_image_urls(
        &self,
        file_id: &str,
        node_id: &str,
        token: &str,
    ) -> Result<ImagesResponse> {
        let url = images_endpoint(&self.base_url, file_id);
        let response: ImagesResponse = self
            .get_json(
                &url,
                &[("ids", node_id)],
                token,
                &[StatusCode::BAD_REQUEST, StatusCode::NOT_FOUND],
            )
            .await
            .with_context(|| format!("fetch_image_urls failed for {}/{}", file_id, node_id))?;
        Ok(response)
    }

    /// Download the bytes behind an exported image URL.
    ///
    /// Export URLs are pre-signed, so no token is attached here.
    pub async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let start = std::time::Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to fetch image from {}", url))?
            .error_for_status()
            .with_context(|| format!("image host rejected request to {}", url))?;

        let bytes = response
            .bytes()
            .await
            .context("Failed to get response bytes")?;

        if self.enable_metrics {
            tracing::debug!(elapsed = ?start.elapsed(), len = bytes.len(), "api.fetch_image_bytes");
        }
        Ok(bytes.to_vec())
    }
}

impl Default for DesignService {
    fn default() -> Self {
        Self::new(&NetworkConfig::default(), false)
    }
}
