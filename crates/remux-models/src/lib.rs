//! Shared data models for the Remux processing engine.
//!
//! Everything the orchestrator, the media layer, and external collaborators
//! exchange lives here: task records and their lifecycle states, the closed
//! operation enumeration with input-shape validation, input file descriptors,
//! and the per-operation option bag.

pub mod file;
pub mod operation;
pub mod options;
pub mod task;

pub use file::{InputFile, MediaKind};
pub use operation::{InputSetError, Operation, OperationParseError};
pub use options::{MixMode, ProcessingOptions};
pub use task::{TaskId, TaskRecord, TaskState, TaskSummary};
