//! Response feedback recording

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::session::types::Vote;

#[derive(Debug, Serialize)]
struct FeedbackRecord<'a> {
    timestamp: String,
    liked: bool,
    value: &'a str,
}

/// Logs votes and, when a file is configured, appends them as JSON lines
#[derive(Debug, Clone, Default)]
pub struct FeedbackLog {
    path: Option<PathBuf>,
}

impl FeedbackLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn record(&self, vote: &Vote) -> std::io::Result<()> {
        tracing::info!("{}", vote.message());

        let Some(path) = &self.path else {
            return Ok(());
        };

        let record = FeedbackRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            liked: vote.liked,
            value: &vote.value,
        };
        let line = serde_json::to_string(&record)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_without_file() {
        let log = FeedbackLog::default();
        let vote = Vote {
            liked: true,
            value: "ok".to_string(),
        };
        assert!(log.record(&vote).is_ok());
    }

    #[test]
    fn test_record_appends_json_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("feedback").join("votes.jsonl");
        let log = FeedbackLog::new(Some(path.clone()));

        log.record(&Vote {
            liked: true,
            value: "first".to_string(),
        })
        .unwrap();
        log.record(&Vote {
            liked: false,
            value: "second".to_string(),
        })
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["liked"], true);
        assert_eq!(lines[1]["value"], "second");
    }
}
