//! Read-only status projection of a task record.

use serde::Serialize;

use remux_models::{TaskRecord, TaskState};

/// Snapshot returned to callers polling a task.
///
/// Built from a single registry read, so the fields are always mutually
/// consistent: a Completed status always carries its output file, a Failed
/// status its error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatus {
    pub state: TaskState,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TaskStatus {
    /// Sentinel for identities the registry does not know. Not an error.
    pub fn not_found() -> Self {
        Self {
            state: TaskState::NotFound,
            progress: 0,
            message: "Task not found".to_string(),
            output_file: None,
            error_message: None,
        }
    }

    pub fn from_record(record: &TaskRecord) -> Self {
        Self {
            state: record.state,
            progress: record.progress,
            message: record.message.clone(),
            output_file: record.output_file.clone(),
            error_message: record.error_message.clone(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
