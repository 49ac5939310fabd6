//! Default [`AgentRunner`] over any OpenAI-compatible chat-completions API.
//!
//! One HTTP round trip per model turn, bounded by the caller's `max_turns`.
//! Tool calls emitted by the model are recorded as run items and answered
//! with an unavailability notice: actual tool execution happens inside the
//! external tool servers, whose protocol this runner does not speak.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use concierge_core::types::{RunItem, RunOutcome, UsageInfo};

use crate::provider::Integration;
use crate::runner::{AgentRunner, AgentSpec};

/// Env override for the API base (gateway/proxy support).
const API_BASE_OVERRIDE_VAR: &str = "CONCIERGE_RUNNER__API_BASE";

const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f64 = 0.7;

// ─────────────────────────────────────────────
// Wire types (OpenAI chat-completions format)
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
enum Message {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "user")]
    User { content: String },

    #[serde(rename = "assistant")]
    Assistant {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },

    #[serde(rename = "tool")]
    Tool {
        content: String,
        tool_call_id: String,
    },
}

impl Message {
    fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    fn assistant_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            content,
            tool_calls: Some(tool_calls),
        }
    }

    fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct ToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: FunctionCall,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct FunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

// ─────────────────────────────────────────────
// HttpRunner
// ─────────────────────────────────────────────

/// Runs agent turns against an OpenAI-compatible `/chat/completions`
/// endpoint with bearer authentication.
pub struct HttpRunner {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    display_name: String,
}

impl std::fmt::Debug for HttpRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRunner")
            .field("api_base", &self.api_base)
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl HttpRunner {
    /// Create a runner against an explicit API base.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");

        HttpRunner {
            client,
            api_base: api_base.into(),
            api_key: api_key.into(),
            display_name: display_name.into(),
        }
    }

    /// Create a runner for a validated provider integration.
    ///
    /// `CONCIERGE_RUNNER__API_BASE` overrides the provider's API base.
    pub fn from_integration(integration: &Integration) -> Self {
        let api_base = std::env::var(API_BASE_OVERRIDE_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| integration.api_base());

        Self::new(api_base, integration.api_key(), integration.display_name())
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    async fn complete(&self, model: &str, messages: &[Message]) -> Result<ChatResponse> {
        let body = ChatRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        };

        let url = self.completions_url();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("chat completion request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            error!(provider = %self.display_name, %status, body = %body, "completion API error");
            anyhow::bail!("completion API returned {status}: {body}");
        }

        response
            .json::<ChatResponse>()
            .await
            .context("failed to parse completion response")
    }
}

/// Strip the provider qualifier from a qualified model identifier.
fn request_model(model: &str) -> &str {
    model.split_once('/').map(|(_, rest)| rest).unwrap_or(model)
}

#[async_trait]
impl AgentRunner for HttpRunner {
    async fn run(&self, agent: &AgentSpec, input: &str, max_turns: u32) -> Result<RunOutcome> {
        let model = request_model(&agent.model);
        let mut messages = vec![Message::system(&agent.instructions), Message::user(input)];
        let mut usage = UsageInfo::default();
        let mut items: Vec<RunItem> = Vec::new();

        for turn in 0..max_turns.max(1) {
            debug!(provider = %self.display_name, model, turn, "chat completion request");

            let response = self.complete(model, &messages).await?;
            usage.requests += 1;
            if let Some(u) = response.usage {
                usage.input_tokens += u.prompt_tokens;
                usage.output_tokens += u.completion_tokens;
                usage.total_tokens += u.total_tokens;
            }

            let message = response
                .choices
                .into_iter()
                .next()
                .context("no choices in completion response")?
                .message;

            let tool_calls = message.tool_calls.unwrap_or_default();
            if tool_calls.is_empty() {
                return Ok(RunOutcome {
                    final_output: message.content.unwrap_or_default(),
                    usage,
                    items,
                });
            }

            // The model asked for tools. Record the calls, then answer each
            // with a notice so the conversation can converge; execution
            // belongs to the external tool servers.
            messages.push(Message::assistant_calls(
                message.content.clone(),
                tool_calls.clone(),
            ));
            for call in &tool_calls {
                items.push(RunItem::ToolCall {
                    tool: call.function.name.clone(),
                    arguments: call.function.arguments.clone(),
                    at: Utc::now(),
                });
                let notice = format!(
                    "Tool '{}' runs on an external tool server and is not available to the direct runner.",
                    call.function.name
                );
                messages.push(Message::tool_result(&call.id, &notice));
                items.push(RunItem::ToolOutput {
                    output: notice,
                    at: Utc::now(),
                });
            }
        }

        // Ceiling reached; surface the partial result.
        debug!(provider = %self.display_name, max_turns, "tool-call iteration ceiling reached");
        Ok(RunOutcome {
            final_output:
                "The run hit its tool-call iteration limit before producing a final answer.".into(),
            usage,
            items,
        })
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn agent() -> AgentSpec {
        AgentSpec {
            name: "Concierge".into(),
            model: "openai/gpt-4o-mini".into(),
            instructions: "Plan trips.".into(),
        }
    }

    fn final_response(text: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "choices": [{
                "message": { "content": text },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 6,
                "total_tokens": 18
            }
        })
    }

    fn tool_call_response() -> serde_json::Value {
        json!({
            "id": "chatcmpl-tools",
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "search_listings",
                            "arguments": "{\"city\": \"Kyoto\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 4,
                "total_tokens": 14
            }
        })
    }

    #[test]
    fn test_request_model_strips_qualifier() {
        assert_eq!(request_model("openai/gpt-4o-mini"), "gpt-4o-mini");
        assert_eq!(
            request_model("bedrock/amazon.nova-lite-v1:0"),
            "amazon.nova-lite-v1:0"
        );
        assert_eq!(request_model("bare-model"), "bare-model");
    }

    #[test]
    fn test_completions_url_trailing_slash() {
        let runner = HttpRunner::new("https://api.openai.com/v1/", "key", "OpenAI");
        assert_eq!(
            runner.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_run_simple_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_response("Here's a plan.")))
            .mount(&server)
            .await;

        let runner = HttpRunner::new(server.uri(), "test-key", "OpenAI");
        let outcome = runner.run(&agent(), "Plan Kyoto", 20).await.unwrap();

        assert_eq!(outcome.final_output, "Here's a plan.");
        assert_eq!(outcome.usage.input_tokens, 12);
        assert_eq!(outcome.usage.output_tokens, 6);
        assert_eq!(outcome.usage.total_tokens, 18);
        assert_eq!(outcome.usage.requests, 1);
        assert!(outcome.items.is_empty());
    }

    #[tokio::test]
    async fn test_run_records_tool_call_round() {
        let server = MockServer::start().await;

        // First round trip asks for a tool, the second finishes.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_response()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_response("Done.")))
            .mount(&server)
            .await;

        let runner = HttpRunner::new(server.uri(), "key", "OpenAI");
        let outcome = runner.run(&agent(), "Find a stay", 20).await.unwrap();

        assert_eq!(outcome.final_output, "Done.");
        assert_eq!(outcome.usage.requests, 2);
        assert_eq!(outcome.usage.total_tokens, 14 + 18);

        assert_eq!(outcome.items.len(), 2);
        match &outcome.items[0] {
            RunItem::ToolCall {
                tool,
                arguments,
                at,
            } => {
                assert_eq!(tool, "search_listings");
                assert_eq!(arguments, "{\"city\": \"Kyoto\"}");
                match &outcome.items[1] {
                    RunItem::ToolOutput { output, at: out_at } => {
                        assert!(output.contains("search_listings"));
                        assert!(at <= out_at);
                    }
                    other => panic!("unexpected item: {other:?}"),
                }
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_stops_at_iteration_ceiling() {
        let server = MockServer::start().await;
        // Every response asks for another tool call.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_response()))
            .mount(&server)
            .await;

        let runner = HttpRunner::new(server.uri(), "key", "OpenAI");
        let outcome = runner.run(&agent(), "loop forever", 3).await.unwrap();

        assert!(outcome.final_output.contains("iteration limit"));
        assert_eq!(outcome.usage.requests, 3);
        // One call + one output per round trip.
        assert_eq!(outcome.items.len(), 6);
    }

    #[tokio::test]
    async fn test_run_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "rate limited"}
            })))
            .mount(&server)
            .await;

        let runner = HttpRunner::new(server.uri(), "key", "OpenAI");
        let err = runner.run(&agent(), "hello", 20).await.unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("429"));
        assert!(text.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_run_surfaces_transport_error() {
        // Nothing listens here.
        let runner = HttpRunner::new("http://127.0.0.1:1", "key", "OpenAI");
        let err = runner.run(&agent(), "hello", 20).await.unwrap_err();
        assert!(format!("{err:#}").contains("chat completion request"));
    }

    #[tokio::test]
    async fn test_run_empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [],
                "usage": null
            })))
            .mount(&server)
            .await;

        let runner = HttpRunner::new(server.uri(), "key", "OpenAI");
        let err = runner.run(&agent(), "hello", 20).await.unwrap_err();
        assert!(format!("{err:#}").contains("no choices"));
    }
}
