use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::GeneratorConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to reach LLM: {0}")]
    Transport(reqwest::Error),
    #[error("LLM request failed: {0}")]
    Status(StatusCode),
    #[error("failed to parse LLM response: {0}")]
    Decode(reqwest::Error),
}

impl LlmError {
    /// Connection problems, server errors and throttling may clear up on
    /// their own; rejected credentials or bad requests will not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Transport(_) => true,
            LlmError::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            LlmError::Decode(_) => false,
        }
    }
}

#[derive(Clone)]
pub struct QueryLLM {
    base_url: String,
    model: String,
    api_key: Option<String>,
    options: GenerationOptions,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize)]
struct GenerationOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerationOptions,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl QueryLLM {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build LLM HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            options: GenerationOptions {
                temperature: config.temperature,
                top_p: config.top_p,
                num_predict: config.max_tokens,
            },
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: &self.options,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(LlmError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status));
        }

        let ollama_response: OllamaResponse =
            response.json().await.map_err(LlmError::Decode)?;

        Ok(ollama_response.response)
    }
}
