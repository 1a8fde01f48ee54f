use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::from_str;

use crate::config::ApiType;
use crate::error::{RagError, Result};

/// Blocking JSON client shared by the embedding, search and completion calls.
#[derive(Clone, Debug)]
pub struct ServiceClient {
    client: Client,
}

impl ServiceClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .client
            .post(url)
            .headers(headers)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .map_err(|e| RagError::transient(format!("POST {} failed: {}", redact(url), e)))?;
        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        if !status.is_success() {
            let message = format!("POST {} failed: {} {}", redact(url), status, text);
            return Err(if is_retryable(status) {
                RagError::transient(message)
            } else {
                RagError::service(message)
            });
        }
        from_str::<T>(&text).map_err(|e| {
            RagError::service(format!("POST {} decode failed: {} | {}", redact(url), e, text))
        })
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

// Query strings only carry the api-version, but keep logs free of anything after `?`.
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Auth header for the model endpoint.
pub fn model_auth(api_type: ApiType, key: &str) -> Result<HeaderMap> {
    match api_type {
        ApiType::Azure => single_header("api-key", key),
        ApiType::AzureAd | ApiType::OpenAi => {
            single_header("authorization", &format!("Bearer {}", key))
        }
    }
}

/// Auth header for the search service.
pub fn search_auth(key: &str) -> Result<HeaderMap> {
    single_header("api-key", key)
}

fn single_header(name: &'static str, value: &str) -> Result<HeaderMap> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|_| RagError::Config(format!("{} contains invalid header characters", name)))?;
    value.set_sensitive(true);
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(name), value);
    Ok(headers)
}
