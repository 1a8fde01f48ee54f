use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RagError, Result};
use crate::retry::RetryPolicy;

/// Name of the pre-populated search index holding the report passages.
pub const SEARCH_INDEX_NAME: &str = "esef_reports_rag_index";

const DEFAULT_SEARCH_API_VERSION: &str = "2023-07-01-Preview";

/// Flavour of the model endpoint, which decides URL shape and auth header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiType {
    /// Azure OpenAI with an `api-key` header.
    Azure,
    /// Azure OpenAI with an Entra ID bearer token.
    AzureAd,
    /// Plain OpenAI API with a bearer token.
    OpenAi,
}

impl FromStr for ApiType {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azure" => Ok(Self::Azure),
            "azure_ad" | "azuread" => Ok(Self::AzureAd),
            "open_ai" | "openai" => Ok(Self::OpenAi),
            other => Err(RagError::Config(format!(
                "OPENAI_API_TYPE must be azure, azure_ad or open_ai, got {:?}",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub api_type: ApiType,
    pub api_key: String,
    pub api_base: String,
    pub api_version: String,
    pub gpt_engine: String,
    pub embedding_engine: String,
    pub search_endpoint: String,
    pub search_key: String,
    pub search_index: String,
    pub search_api_version: String,
    pub top_k: usize,
    pub temperature: f32,
    pub vector_k: usize,
    pub http_timeout: Duration,
    pub embed_retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Pick up a local .env so secrets need not be exported by hand.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| RagError::Config(format!("{} is not set", key)))
        };

        let temperature = parse_or(&lookup, "RAG_TEMPERATURE", 0.2_f32)?;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(RagError::Config(format!(
                "RAG_TEMPERATURE must be within [0, 1], got {}",
                temperature
            )));
        }

        Ok(Self {
            api_type: required("OPENAI_API_TYPE")?.parse()?,
            api_key: required("OPENAI_API_KEY")?,
            api_base: required("OPENAI_API_BASE")?.trim_end_matches('/').to_string(),
            api_version: required("OPENAI_API_VERSION")?,
            gpt_engine: required("GPT_ENGINE_NAME")?,
            embedding_engine: required("EMBEDDING_ENGINE_NAME")?,
            search_endpoint: required("SEARCH_ENDPOINT")?.trim_end_matches('/').to_string(),
            search_key: required("SEARCH_KEY")?,
            search_index: SEARCH_INDEX_NAME.to_string(),
            search_api_version: lookup("SEARCH_API_VERSION")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SEARCH_API_VERSION.to_string()),
            top_k: parse_or(&lookup, "RAG_TOP_K", 5)?,
            temperature,
            vector_k: parse_or(&lookup, "RAG_VECTOR_K", 3)?,
            http_timeout: Duration::from_secs(parse_or(&lookup, "RAG_HTTP_TIMEOUT_SECS", 120)?),
            embed_retry: RetryPolicy::default(),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_type", &self.api_type)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("gpt_engine", &self.gpt_engine)
            .field("embedding_engine", &self.embedding_engine)
            .field("search_endpoint", &self.search_endpoint)
            .field("search_key", &"<redacted>")
            .field("search_index", &self.search_index)
            .field("search_api_version", &self.search_api_version)
            .field("top_k", &self.top_k)
            .field("temperature", &self.temperature)
            .field("vector_k", &self.vector_k)
            .field("http_timeout", &self.http_timeout)
            .field("embed_retry", &self.embed_retry)
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RagError::Config(format!("{} has an invalid value: {:?}", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("OPENAI_API_TYPE", "azure"),
            ("OPENAI_API_KEY", "key"),
            ("OPENAI_API_BASE", "https://example.openai.azure.com/"),
            ("OPENAI_API_VERSION", "2023-05-15"),
            ("GPT_ENGINE_NAME", "gpt"),
            ("EMBEDDING_ENGINE_NAME", "ada"),
            ("SEARCH_ENDPOINT", "https://example.search.windows.net"),
            ("SEARCH_KEY", "search-key"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply_when_optional_keys_are_absent() {
        let cfg = load(&base_vars()).expect("config should load");
        assert_eq!(cfg.api_type, ApiType::Azure);
        assert_eq!(cfg.api_base, "https://example.openai.azure.com");
        assert_eq!(cfg.search_index, "esef_reports_rag_index");
        assert_eq!(cfg.top_k, 5);
        assert_eq!(cfg.vector_k, 3);
        assert!((cfg.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(cfg.embed_retry.max_attempts, 6);
    }

    #[test]
    fn missing_required_key_is_named_in_error() {
        let mut vars = base_vars();
        vars.remove("SEARCH_KEY");
        let err = load(&vars).expect_err("missing key should fail");
        assert!(err.to_string().contains("SEARCH_KEY"));
    }

    #[test]
    fn debug_output_hides_keys() {
        let cfg = load(&base_vars()).unwrap();
        let shown = format!("{:?}", cfg);
        assert!(!shown.contains("search-key"));
        assert!(!shown.contains("\"key\""));
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains("esef_reports_rag_index"));
    }

    #[test]
    fn rejects_out_of_range_temperature_and_unknown_api_type() {
        let mut vars = base_vars();
        vars.insert("RAG_TEMPERATURE", "1.5");
        assert!(load(&vars).is_err());

        let mut vars = base_vars();
        vars.insert("OPENAI_API_TYPE", "bedrock");
        assert!(load(&vars).is_err());
    }
}
