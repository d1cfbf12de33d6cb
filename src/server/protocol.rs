/// Line protocol types and structures

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request read from one input line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// A response written as one output line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TextResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

/// Every operation answers with feedback text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextResult {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
}

impl Response {
    pub fn text(id: Option<Value>, text: String) -> Self {
        Self {
            id,
            result: Some(TextResult { text }),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorObject { code, message }),
        }
    }
}

// JSON-RPC 2.0 Error codes
pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

// ============================================================================
// Method parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitTypesParams {
    pub types: String,
}

#[derive(Debug, Deserialize)]
pub struct InsertModeParams {
    pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptParams {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteParams {
    pub liked: bool,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub sql: String,
}
