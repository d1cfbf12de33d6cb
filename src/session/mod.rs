//! User-facing session operations
//!
//! Every operation here returns feedback text. Failures inside the pipeline
//! are converted to their messages at this boundary and never escape.

pub mod agent;
pub mod feedback;
pub mod types;


use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::{Config, API_KEY_ENV};
use crate::dataset::{self, SnapshotStore};
use crate::error::{PipelineError, Result};
use crate::gateway::QueryGateway;
use crate::schema::negotiate;
use crate::store::{quote_ident, Store};
use crate::table::{self, TableProvisioner};

pub use agent::{OpenAiAgent, SqlAgent};
pub use feedback::FeedbackLog;
pub use types::{InsertMode, Vote};

/// Appended to the table status when a prompt arrives before the table exists
const MISSING_TABLE_ADVICE: &str = "Check the table has the expected name and it is consistent.";

/// Instruction appended to every prompt handed to the agent
const PROMPT_SUFFIX: &str = "Always wrap the result in relevant context and enforce the results object returning rows. Table description is as follows:";

/// One user's working state: the store, the table registry and the agent.
pub struct Session {
    config: Config,
    store: Store,
    provisioner: TableProvisioner,
    snapshots: SnapshotStore,
    feedback: FeedbackLog,
    agent: Option<Box<dyn SqlAgent>>,
}

impl Session {
    /// Opens the configured database and, when an API key is available,
    /// the HTTP agent.
    pub fn open(config: Config) -> anyhow::Result<Self> {
        let store = Store::open(&config.database_path).with_context(|| {
            format!(
                "Failed to open database {}",
                config.database_path.display()
            )
        })?;

        let agent: Option<Box<dyn SqlAgent>> = match &config.agent.api_key {
            Some(key) => {
                let agent = OpenAiAgent::new(
                    config.agent.clone(),
                    key.clone(),
                    config.table_name.clone(),
                )?;
                Some(Box::new(agent) as Box<dyn SqlAgent>)
            }
            None => {
                tracing::warn!("{} is not set; prompts are disabled", API_KEY_ENV);
                None
            }
        };

        let mut session = Self::with_store(config, store);
        session.agent = agent;
        Ok(session)
    }

    /// Builds a session over an already opened store, without an agent.
    pub fn with_store(config: Config, store: Store) -> Self {
        Self {
            snapshots: SnapshotStore::new(config.snapshot_path()),
            feedback: FeedbackLog::new(config.feedback_log.clone()),
            provisioner: TableProvisioner::new(),
            agent: None,
            store,
            config,
        }
    }

    pub fn with_agent(mut self, agent: Box<dyn SqlAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn provisioner(&self) -> &TableProvisioner {
        &self.provisioner
    }

    pub fn gateway(&self) -> QueryGateway<'_> {
        QueryGateway::new(&self.store)
    }

    // ========================================================================
    // Table setup
    // ========================================================================

    /// Copies an uploaded file into the working directory, parses it and
    /// stores the dataset snapshot.
    pub fn upload_file(&self, path: &Path) -> String {
        match self.upload(path) {
            Ok(feedback) => feedback,
            Err(e) => e.to_string(),
        }
    }

    /// Like [`Session::upload_file`], but hands the failure back so a caller
    /// can stop before submitting types. A failed upload leaves no snapshot
    /// behind, so the previous upload can no longer be submitted.
    pub fn upload(&self, path: &Path) -> Result<String> {
        self.snapshots.clear()?;

        match self.try_upload(path) {
            Ok((rows, columns, name)) => Ok(format!(
                "Loaded {} rows across {} columns from '{}'.",
                rows, columns, name
            )),
            Err(e) => {
                tracing::warn!("Upload of {} failed: {}", path.display(), e);
                Err(e)
            }
        }
    }

    fn try_upload(&self, path: &Path) -> Result<(usize, usize, String)> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| PipelineError::Format {
                message: format!("'{}' is not a file path", path.display()),
            })?;

        std::fs::create_dir_all(&self.config.temp_dir)?;
        let working_copy: PathBuf = self.config.temp_dir.join(&name);
        if !same_file(path, &working_copy) {
            std::fs::copy(path, &working_copy).map_err(|e| PipelineError::Format {
                message: format!("Failed to read file '{}': {}", path.display(), e),
            })?;
        }

        let dataset = dataset::load(&working_copy, &self.snapshots)?;
        Ok((dataset.row_count(), dataset.column_count(), name))
    }

    /// Assigns column types to the last upload, provisions the table and
    /// inserts the rows.
    pub fn submit_column_types(&mut self, type_spec: &str) -> String {
        match self.try_submit(type_spec) {
            Ok(count) => format!(
                "Row insertion successful: {} rows inserted into '{}'.",
                count,
                self.table_name()
            ),
            Err(e) => e.to_string(),
        }
    }

    fn try_submit(&mut self, type_spec: &str) -> Result<usize> {
        let snapshot = self.snapshots.load()?;
        let schema = negotiate(type_spec, &snapshot.dataset)?;
        let definition =
            self.provisioner
                .provision(&self.store, &self.config.table_name, &schema)?;
        table::ingest(&self.store, &definition, &snapshot.dataset.rows())
    }

    /// Applies an insert mode. `New` drops the current table (if any) and
    /// forgets its definition.
    pub fn change_insert_mode(&mut self, mode: InsertMode) -> String {
        let table_name = self.config.table_name.clone();
        match mode {
            InsertMode::Append => {
                format!("New rows will be appended to table '{}'.", table_name)
            }
            InsertMode::New => match self.store.has_table(&table_name) {
                Ok(false) => {
                    self.provisioner.forget(&table_name);
                    format!("Table '{}' does not exist; nothing to drop.", table_name)
                }
                Ok(true) => {
                    let sql = format!("DROP TABLE {};", quote_ident(&table_name));
                    let dropped = self.gateway().execute(&sql);
                    match dropped {
                        Ok(_) => {
                            self.provisioner.forget(&table_name);
                            tracing::info!("Dropped table {}", table_name);
                            format!(
                                "Dropped table '{}'. The next submission creates it anew.",
                                table_name
                            )
                        }
                        Err(e) => PipelineError::Operational {
                            message: e.to_string(),
                            table: table_name.clone(),
                        }
                        .to_string(),
                    }
                }
                Err(e) => PipelineError::operational(&table_name, e).to_string(),
            },
        }
    }

    // ========================================================================
    // Querying
    // ========================================================================

    pub fn describe_table(&self) -> String {
        table::describe(&self.store, self.table_name())
    }

    pub fn table_status(&self) -> String {
        table::exists(&self.store, self.table_name())
    }

    pub fn query(&self, sql: &str) -> String {
        self.gateway().query(sql)
    }

    /// Hands a free-text prompt to the agent, after confirming the table
    /// exists and attaching its description.
    pub async fn run_prompt(&self, prompt: &str) -> String {
        if !matches!(self.store.has_table(self.table_name()), Ok(true)) {
            return format!("{} {}", self.table_status(), MISSING_TABLE_ADVICE);
        }

        let Some(agent) = &self.agent else {
            return format!(
                "No inference service is configured. Set {} to enable prompts.",
                API_KEY_ENV
            );
        };

        let task = format!("{}. {}{}", prompt, PROMPT_SUFFIX, self.describe_table());
        match agent.run(&task, self.gateway()).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Agent failed: {:#}", e);
                format!("Agent error: {:#}", e)
            }
        }
    }

    /// Records a vote on a response. Has no effect on any table.
    pub fn vote(&self, vote: &Vote) -> String {
        let message = vote.message();
        match self.feedback.record(vote) {
            Ok(()) => message,
            Err(e) => {
                tracing::warn!("Failed to record feedback: {}", e);
                format!("{} (feedback could not be saved: {})", message, e)
            }
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
