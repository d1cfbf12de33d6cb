//! Types for the user-facing session operations

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What happens to the existing table before the next ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InsertMode {
    /// Drop the existing table so the next upload defines it anew
    New,
    /// Keep the table and add rows to it
    Append,
}

impl FromStr for InsertMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Upload New" => Ok(InsertMode::New),
            "Upload to Existing" => Ok(InsertMode::Append),
            other if other.eq_ignore_ascii_case("new") => Ok(InsertMode::New),
            other if other.eq_ignore_ascii_case("append") => Ok(InsertMode::Append),
            other => Err(format!(
                "Unknown insert mode '{}'. Use 'new' or 'append'.",
                other
            )),
        }
    }
}

impl fmt::Display for InsertMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertMode::New => f.write_str("new"),
            InsertMode::Append => f.write_str("append"),
        }
    }
}

/// A like/dislike signal on an agent response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub liked: bool,
    /// The response text being voted on
    pub value: String,
}

impl Vote {
    pub fn message(&self) -> String {
        if self.liked {
            format!("You upvoted this response: {}", self.value)
        } else {
            format!("You downvoted this response: {}", self.value)
        }
    }
}
