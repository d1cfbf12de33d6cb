//! Text-to-SQL agent boundary
//!
//! The session hands an enriched prompt to an [`SqlAgent`]; the agent may
//! only touch the table through the [`QueryGateway`] it is given.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::AgentConfig;
use crate::gateway::QueryGateway;

/// Name of the single tool exposed to the model
pub const SQL_TOOL_NAME: &str = "sql_engine";

#[async_trait]
pub trait SqlAgent: Send + Sync {
    /// Answers `task`, running SQL through `gateway` as needed.
    async fn run(&self, task: &str, gateway: QueryGateway<'_>) -> Result<String>;
}

// ============================================================================
// Chat wire types
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool_result(call_id: &str, content: String) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: Some(call_id.to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
struct SqlToolArgs {
    query: String,
}

/// What the model asked for in one round trip
#[derive(Debug)]
pub enum AgentStep {
    /// Run these tool calls, then ask again
    Tools(ChatMessage),
    /// Final answer
    Answer(String),
}

/// Interprets a non-streaming chat-completions response body.
pub fn parse_step(body: &serde_json::Value) -> Result<AgentStep> {
    let message = body
        .pointer("/choices/0/message")
        .ok_or_else(|| anyhow!("Response has no choices: {}", body))?;
    let message: ChatMessage =
        serde_json::from_value(message.clone()).context("Malformed assistant message")?;

    match &message.tool_calls {
        Some(calls) if !calls.is_empty() => Ok(AgentStep::Tools(message)),
        _ => Ok(AgentStep::Answer(message.content.unwrap_or_default())),
    }
}

/// Runs one tool call against the gateway, returning the text for the model.
pub fn run_tool_call(call: &ToolCall, gateway: QueryGateway<'_>) -> String {
    if call.function.name != SQL_TOOL_NAME {
        return format!("Unknown tool '{}'. Use {}.", call.function.name, SQL_TOOL_NAME);
    }
    match serde_json::from_str::<SqlToolArgs>(&call.function.arguments) {
        Ok(args) => {
            tracing::info!("Agent query: {}", args.query);
            gateway.query(&args.query)
        }
        Err(e) => format!("Invalid arguments for {}: {}", SQL_TOOL_NAME, e),
    }
}

// ============================================================================
// OpenAI-compatible agent
// ============================================================================

/// Tool-calling loop against an OpenAI-compatible `/chat/completions` API
pub struct OpenAiAgent {
    client: reqwest::Client,
    config: AgentConfig,
    api_key: String,
    table_name: String,
}

impl OpenAiAgent {
    pub fn new(config: AgentConfig, api_key: String, table_name: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            config,
            api_key,
            table_name,
        })
    }

    fn system_prompt(&self) -> String {
        format!(
            "You answer questions about a SQLite table named {table}. \
             Call the {tool} tool with a single SQL statement whenever you need data; \
             it returns one result row per line. Prefer statements that return rows. \
             When you have the answer, reply in plain text without calling a tool.",
            table = self.table_name,
            tool = SQL_TOOL_NAME
        )
    }

    fn tools(&self) -> serde_json::Value {
        json!([{
            "type": "function",
            "function": {
                "name": SQL_TOOL_NAME,
                "description": format!(
                    "Allows you to perform SQL queries on the table. Returns a string representation of the result. The table is named {}.",
                    self.table_name
                ),
                "parameters": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The query to be performed on the table. This should always be correct SQL."
                        }
                    },
                    "required": ["query"]
                }
            }
        }])
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<serde_json::Value> {
        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        let body = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "stream": false,
            "tools": self.tools(),
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("API error ({}): {}", status, error_text));
        }

        response
            .json::<serde_json::Value>()
            .await
            .context("Failed to parse response JSON")
    }
}

#[async_trait]
impl SqlAgent for OpenAiAgent {
    async fn run(&self, task: &str, gateway: QueryGateway<'_>) -> Result<String> {
        let mut messages = vec![
            ChatMessage::text("system", self.system_prompt()),
            ChatMessage::text("user", task),
        ];

        for step in 1..=self.config.max_steps {
            tracing::debug!("Agent step {}/{}", step, self.config.max_steps);
            let body = self.complete(&messages).await?;

            match parse_step(&body)? {
                AgentStep::Answer(answer) => return Ok(answer),
                AgentStep::Tools(message) => {
                    let calls = message.tool_calls.clone().unwrap_or_default();
                    messages.push(message);
                    for call in &calls {
                        let output = run_tool_call(call, gateway);
                        messages.push(ChatMessage::tool_result(&call.id, output));
                    }
                }
            }
        }

        Err(anyhow!(
            "No final answer after {} steps",
            self.config.max_steps
        ))
    }
}
