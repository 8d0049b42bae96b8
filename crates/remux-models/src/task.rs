//! Task records: the mutable state container for one unit of work.
//!
//! A record transitions only forward along
//! Pending -> Processing -> {Completed | Failed}. The mutators enforce this:
//! once a terminal state is reached they become no-ops, and progress never
//! regresses within a run.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::file::InputFile;
use crate::operation::Operation;

/// Unique identifier for a submitted task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new random task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Registered, execution not yet started
    #[default]
    Pending,
    /// Execution path is running
    Processing,
    /// Finished with an output artifact
    Completed,
    /// Finished with an error
    Failed,
    /// Sentinel for status queries on unknown identities; never stored
    NotFound,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Processing => "processing",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::NotFound => "not_found",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The state container for one unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskRecord {
    /// Unique task ID, immutable for the record's lifetime
    pub id: TaskId,

    /// The operation this task runs
    pub operation: Operation,

    /// Current lifecycle state
    #[serde(default)]
    pub state: TaskState,

    /// Progress percentage (0-100), non-decreasing within a run
    #[serde(default)]
    pub progress: u8,

    /// Human-readable description of the current step
    pub message: String,

    /// Output artifact filename, set only on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,

    /// Failure description, set only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Files this task reads from the upload root
    pub input_files: Vec<InputFile>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Completion timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Create a new pending record with a fresh ID.
    pub fn new(operation: Operation, input_files: Vec<InputFile>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            operation,
            state: TaskState::Pending,
            progress: 0,
            message: "Queued".to_string(),
            output_file: None,
            error_message: None,
            input_files,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Check if the record is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Enter the Processing state. No-op once terminal.
    pub fn begin(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.state = TaskState::Processing;
        self.updated_at = Utc::now();
    }

    /// Advance progress and replace the step message.
    ///
    /// Progress is clamped to 100 and never moves backwards; a stale or
    /// out-of-order report keeps the furthest value already recorded.
    pub fn update(&mut self, progress: u8, message: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.progress = self.progress.max(progress.min(100));
        self.message = message.into();
        self.updated_at = Utc::now();
    }

    /// Transition to Completed with the produced artifact name.
    pub fn complete(&mut self, output_file: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        let now = Utc::now();
        self.state = TaskState::Completed;
        self.progress = 100;
        self.message = "Processing completed".to_string();
        self.output_file = Some(output_file.into());
        self.updated_at = now;
        self.completed_at = Some(now);
    }

    /// Transition to Failed with a descriptive error.
    ///
    /// Progress is left at the last reported value.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        let error = error.into();
        let now = Utc::now();
        self.state = TaskState::Failed;
        self.message = format!("Processing failed: {error}");
        self.error_message = Some(error);
        self.updated_at = now;
        self.completed_at = Some(now);
    }

    /// Total size of the declared inputs in bytes.
    pub fn total_input_bytes(&self) -> u64 {
        self.input_files.iter().map(|f| f.size_bytes).sum()
    }
}

/// Historical summary offered to the persistence collaborator when a task
/// completes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskSummary {
    pub task_id: TaskId,
    pub operation: Operation,
    pub input_file_count: usize,
    pub output_file: String,
    pub total_input_bytes: u64,
    pub completed_at: DateTime<Utc>,
}

impl TaskSummary {
    /// Build the summary for a completed record.
    ///
    /// Returns `None` unless the record is Completed with an output file.
    pub fn from_record(record: &TaskRecord) -> Option<Self> {
        if record.state != TaskState::Completed {
            return None;
        }
        Some(Self {
            task_id: record.id.clone(),
            operation: record.operation,
            input_file_count: record.input_files.len(),
            output_file: record.output_file.clone()?,
            total_input_bytes: record.total_input_bytes(),
            completed_at: record.completed_at.unwrap_or(record.updated_at),
        })
    }
}
