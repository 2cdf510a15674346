// HTTP client for the Gemini API
//
// Function-calling only: the agent sends conversation contents plus the
// tool catalog and gets back either free text or function calls.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::catalog::ToolDefinition;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// One conversation turn in Gemini's content format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "functionCall", skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(rename = "functionResponse", skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

/// A tool call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// A tool result fed back to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part {
                text: Some(text.into()),
                ..Default::default()
            }],
        }
    }

    pub fn function_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: "user".to_string(),
            parts: responses
                .into_iter()
                .map(|r| Part {
                    function_response: Some(r),
                    ..Default::default()
                })
                .collect(),
        }
    }
}

/// What the model decided this turn
#[derive(Debug, Clone)]
pub enum ModelTurn {
    /// Free text; the model considers the task finished (or is talking)
    Text(String),
    /// One or more tool calls, to be executed in order
    ToolCalls(Vec<FunctionCall>),
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_string())
    }

    /// Override the API endpoint (tests point this at a local mock)
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    /// One generateContent round trip: conversation plus catalog in,
    /// model decision out.
    pub async fn generate(
        &self,
        system_instruction: &str,
        contents: &[Content],
        tools: &[ToolDefinition],
    ) -> Result<ModelTurn> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = json!({
            "systemInstruction": {"parts": [{"text": system_instruction}]},
            "contents": contents,
            "tools": [{"functionDeclarations": tools}],
        });

        tracing::debug!(model = %self.model, turns = contents.len(), "Requesting model decision");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Gemini API request failed\n\nStatus: {}\nBody: {}",
                status,
                error_body
            );
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .context("Gemini API returned no candidates")?;

        Ok(Self::classify(candidate.content))
    }

    fn classify(content: Content) -> ModelTurn {
        let calls: Vec<FunctionCall> = content
            .parts
            .iter()
            .filter_map(|p| p.function_call.clone())
            .collect();

        if !calls.is_empty() {
            return ModelTurn::ToolCalls(calls);
        }

        let text = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");
        ModelTurn::Text(text)
    }
}
