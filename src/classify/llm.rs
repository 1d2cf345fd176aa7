use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::LlmSettings;

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Missing API key or unusable client settings.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx answer from the endpoint.
    #[error("API error: {0}")]
    Api(String),

    /// No tool call in the answer, or arguments that do not fit the tool schema.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A function the model is forced to call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSpec {
    pub fn to_openai_format(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters
            }
        })
    }
}

/// Sends one prompt with one forced tool and returns the parsed arguments of
/// the tool call.
pub trait ToolCaller {
    fn call_tool(&self, prompt: &str, tool: &ToolSpec) -> Result<Value, ClassifyError>;
}

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatToolCaller {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatToolCaller {
    pub fn new(settings: &LlmSettings) -> Result<Self, ClassifyError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ClassifyError::Config(
                    "no API key; set GENIOS_LLM__API_KEY or OPENAI_API_KEY".to_string(),
                )
            })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ClassifyError::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    fn request_body(&self, prompt: &str, tool: &ToolSpec) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "tools": [tool.to_openai_format()],
            "tool_choice": {"type": "function", "function": {"name": tool.name}},
            "temperature": self.temperature
        })
    }
}

impl ToolCaller for ChatToolCaller {
    fn call_tool(&self, prompt: &str, tool: &ToolSpec) -> Result<Value, ClassifyError> {
        debug!("{} -> {}", tool.name, self.model);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, tool))
            .send()
            .map_err(|e| ClassifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(ClassifyError::Api(format!("{}: {}", status, error_text)));
        }

        let body: Value = response
            .json()
            .map_err(|e| ClassifyError::Parse(e.to_string()))?;
        let arguments = tool_arguments(&body)?;
        debug!("{} <- {}", tool.name, arguments);
        Ok(arguments)
    }
}

/// Arguments of the first tool call in a chat completion, decoded from their
/// JSON string form.
pub fn tool_arguments(body: &Value) -> Result<Value, ClassifyError> {
    let raw = body["choices"][0]["message"]["tool_calls"][0]["function"]["arguments"]
        .as_str()
        .ok_or_else(|| ClassifyError::Parse("response contains no tool call".to_string()))?;
    serde_json::from_str(raw).map_err(|e| ClassifyError::Parse(format!("tool arguments: {}", e)))
}
