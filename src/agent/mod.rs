// Agent loop
//
// Drives the model through AwaitingModel -> ExecutingTool cycles until
// it answers in plain text, an unrecoverable failure occurs, or the turn
// budget runs out. Tool calls are executed strictly in the order the
// model requested them, one HTTP request to the mediating service each.

pub mod catalog;
pub mod gemini;

pub use catalog::{tool_definitions, ToolDefinition};
pub use gemini::{Content, FunctionCall, FunctionResponse, GeminiClient, ModelTurn};

use anyhow::{Context as _, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const SYSTEM_INSTRUCTION: &str = "\
You are a 3D artist who controls a scene editor through a set of tools. \
Break the user's request into a series of tool calls. If you need to know \
what is in the scene, use get_scene_info first. Before using any asset \
tool, check get_assets_status; if the integration is disabled, build the \
scene from primitive objects instead. Tool calls have ordering \
dependencies: create an object before you modify it. If a tool call \
returns an error, read the message and correct your approach; do not \
repeat the same failed call unmodified. When the request is fulfilled, \
reply with a short confirmation in plain text.";

/// Mediator unreachable this many times in a row means there is nothing
/// the model can self-correct; give up.
const MAX_CONSECUTIVE_TRANSPORT_FAILURES: usize = 2;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Mediating service base URL (e.g., "http://127.0.0.1:5000")
    pub server_url: String,
    pub model: String,
    pub api_key: String,
    /// Maximum model-decision turns before Failed
    pub max_turns: usize,
}

/// Terminal state of one agent invocation
#[derive(Debug)]
pub enum AgentOutcome {
    Done { reply: String, turns: usize },
    Failed { reason: String },
}

pub struct AgentLoop {
    gemini: GeminiClient,
    http: Client,
    server_url: String,
    max_turns: usize,
    catalog: Vec<ToolDefinition>,
    conversation: Vec<Content>,
}

impl AgentLoop {
    pub fn new(config: AgentConfig) -> Result<Self> {
        let gemini = GeminiClient::new(config.api_key, config.model)?;
        let http = Client::builder()
            // Generous: a single tool call may sit behind a blocking
            // asset download on the host
            .timeout(Duration::from_secs(360))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            gemini,
            http,
            server_url: config.server_url,
            max_turns: config.max_turns,
            catalog: tool_definitions(),
            conversation: Vec::new(),
        })
    }

    /// Run one invocation to a terminal state.
    pub async fn run(&mut self, prompt: &str) -> Result<AgentOutcome> {
        info!(prompt, "Agent invocation started");
        self.conversation.push(Content::user_text(prompt));

        let mut transport_failures = 0usize;

        for turn in 1..=self.max_turns {
            let decision = self
                .gemini
                .generate(SYSTEM_INSTRUCTION, &self.conversation, &self.catalog)
                .await?;

            match decision {
                ModelTurn::Text(reply) => {
                    info!(turns = turn, "Agent finished");
                    return Ok(AgentOutcome::Done { reply, turns: turn });
                }
                ModelTurn::ToolCalls(calls) => {
                    // Record the model's request before the results
                    self.conversation.push(Content {
                        role: "model".to_string(),
                        parts: calls
                            .iter()
                            .map(|c| gemini::Part {
                                function_call: Some(c.clone()),
                                ..Default::default()
                            })
                            .collect(),
                    });

                    let mut responses = Vec::with_capacity(calls.len());
                    for call in &calls {
                        let (result, was_transport_error) = self.execute_tool(call).await;
                        if was_transport_error {
                            transport_failures += 1;
                            if transport_failures >= MAX_CONSECUTIVE_TRANSPORT_FAILURES {
                                return Ok(AgentOutcome::Failed {
                                    reason: "mediating service unreachable".to_string(),
                                });
                            }
                        } else {
                            transport_failures = 0;
                        }
                        responses.push(FunctionResponse {
                            name: call.name.clone(),
                            response: result,
                        });
                    }
                    self.conversation.push(Content::function_responses(responses));
                }
            }
        }

        warn!(max_turns = self.max_turns, "Turn budget exhausted");
        Ok(AgentOutcome::Failed {
            reason: format!("turn budget exhausted after {} turns", self.max_turns),
        })
    }

    /// Issue one tool call to the mediating service. Failures come back
    /// as error-marked results so the model can self-correct; the bool
    /// flags a transport-level failure reaching the mediator itself.
    async fn execute_tool(&self, call: &FunctionCall) -> (Value, bool) {
        debug!(tool = %call.name, args = %call.args, "Executing tool call");

        let url = format!("{}/v1/tools/run", self.server_url);
        let body = json!({"type": call.name, "params": call.args});

        let response = match self.http.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Mediating service request failed");
                return (
                    json!({"status": "error", "message": format!("tool request failed: {}", e)}),
                    true,
                );
            }
        };

        let status = response.status();
        let payload: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                return (
                    json!({"status": "error", "message": format!("malformed tool response: {}", e)}),
                    false,
                )
            }
        };

        if status.is_success() {
            (json!({"status": "success", "result": payload}), false)
        } else {
            // Structured error body from the mediator; the model gets the
            // message and one chance to adjust
            let message = payload["error"]["message"]
                .as_str()
                .unwrap_or("tool call failed")
                .to_string();
            warn!(tool = %call.name, %status, message, "Tool call returned an error");
            (json!({"status": "error", "message": message}), false)
        }
    }

    /// Conversation turns recorded so far (for inspection/tests)
    pub fn conversation(&self) -> &[Content] {
        &self.conversation
    }
}
