//! Asynchronous task orchestration engine for Remux.
//!
//! The [`Orchestrator`] is the single entry point: it accepts a submission,
//! registers a task record, runs the operation on a spawned execution path,
//! and keeps the record's lifecycle queryable through [`Orchestrator::status`]
//! while it runs. Persistence and operation execution are injected behind
//! traits so collaborators stay external.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod persist;
pub mod registry;
pub mod status;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use orchestrator::{FfmpegOperationRunner, OperationRunner, Orchestrator};
pub use persist::{NoopSink, PersistenceError, PersistenceSink};
pub use registry::TaskRegistry;
pub use status::TaskStatus;
