use serde::{Deserialize, Serialize};

use crate::config::{ApiType, Config};
use crate::error::{RagError, Result};
use crate::http::{model_auth, ServiceClient};

/// Marks the end of a turn in the prompt buffer.
pub const IM_END: &str = "<|im_end|>";
/// Marks the start of a turn in the prompt buffer.
pub const IM_START: &str = "<|im_start|>";

const ANSWER_MAX_TOKENS: u32 = 1024;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

/// Text completion against the hosted generation model.
pub trait Completer: Send + Sync {
    fn complete(&self, req: &CompletionRequest) -> Result<String>;
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(flatten)]
    req: &'a CompletionRequest,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

pub struct CompletionClient {
    http: ServiceClient,
    url: String,
    api_type: ApiType,
    api_key: String,
    engine: String,
}

impl CompletionClient {
    pub fn new(cfg: &Config, http: ServiceClient) -> Self {
        let url = match cfg.api_type {
            ApiType::OpenAi => format!("{}/completions", cfg.api_base),
            ApiType::Azure | ApiType::AzureAd => format!(
                "{}/openai/deployments/{}/completions?api-version={}",
                cfg.api_base, cfg.gpt_engine, cfg.api_version
            ),
        };
        Self {
            http,
            url,
            api_type: cfg.api_type,
            api_key: cfg.api_key.clone(),
            engine: cfg.gpt_engine.clone(),
        }
    }
}

impl Completer for CompletionClient {
    fn complete(&self, req: &CompletionRequest) -> Result<String> {
        let body = CompletionBody {
            model: (self.api_type == ApiType::OpenAi).then_some(self.engine.as_str()),
            req,
        };
        let headers = model_auth(self.api_type, &self.api_key)?;
        let res = self
            .http
            .post_json::<CompletionResponse, _>(&self.url, headers, &body)?;
        res.choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| RagError::service("No choices in completion response"))
    }
}

/// Runs the assembled prompt. The text may be cut off at the token cap.
pub fn generate_answer(completer: &dyn Completer, prompt: &str, temperature: f32) -> Result<String> {
    completer.complete(&CompletionRequest {
        prompt: prompt.to_string(),
        temperature,
        max_tokens: ANSWER_MAX_TOKENS,
        stop: vec![IM_END.to_string(), IM_START.to_string()],
    })
}
