//! HTTP client for the CKAN action API.

use std::time::Duration;

use cairn_core::error::{CatalogError, CatalogResult};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{CkanError, classify_failure};

/// Connection settings for one CKAN endpoint.
#[derive(Debug, Clone)]
pub struct CkanConfig {
    /// Endpoint URL; a missing scheme defaults to `http://`.
    pub url: String,
    /// Bearer API key. `None` for anonymous (read-only) access.
    pub api_key: Option<String>,
    /// Disable to accept self-signed certificates on staging hosts.
    pub verify_ssl: bool,
    /// Outbound call deadline; expiry surfaces as `BackendUnavailable`.
    pub timeout: Duration,
}

impl Default for CkanConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".into(),
            api_key: None,
            verify_ssl: true,
            timeout: Duration::from_secs(30),
        }
    }
}

fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Calls `POST {base}/api/3/action/{action}` and unwraps CKAN's
/// `{success, result, error}` envelope.
#[derive(Debug, Clone)]
pub struct CkanClient {
    http: reqwest::Client,
    action_base: Url,
}

impl CkanClient {
    pub fn new(config: &CkanConfig) -> CatalogResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| {
                CatalogError::configuration("CKAN API key contains invalid header characters")
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers);
        if !config.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|e| CatalogError::configuration(format!("CKAN client: {e}")))?;

        let base = normalize_url(&config.url);
        let action_base = Url::parse(&format!("{}/api/3/action/", base.trim_end_matches('/')))
            .map_err(|e| CatalogError::configuration(format!("CKAN URL '{}': {e}", config.url)))?;

        Ok(Self { http, action_base })
    }

    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<T, CkanError> {
        let url = self
            .action_base
            .join(action)
            .map_err(|e| CkanError::Protocol(format!("action '{action}': {e}")))?;

        debug!(action, "calling CKAN");

        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(CkanError::from_transport)?;

        let status = response.status().as_u16();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CkanError::Protocol(format!("non-JSON reply to {action}: {e}")))?;

        if body
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
        {
            let result = body
                .get("result")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            serde_json::from_value(result)
                .map_err(|e| CkanError::Protocol(format!("unexpected {action} result: {e}")))
        } else {
            Err(classify_failure(status, &body))
        }
    }
}
