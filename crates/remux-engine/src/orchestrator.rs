//! Task orchestration: submission, spawned execution, progress reporting.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use remux_media::{MediaResult, ProgressReporter, Workspace};
use remux_models::{InputFile, Operation, ProcessingOptions, TaskId, TaskRecord, TaskSummary};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::persist::PersistenceSink;
use crate::registry::TaskRegistry;
use crate::status::TaskStatus;

/// Seam between orchestration and operation execution.
///
/// The production runner dispatches to the media crate; tests substitute
/// stubs so lifecycle behavior can be exercised without FFmpeg.
#[async_trait]
pub trait OperationRunner: Send + Sync {
    async fn run(
        &self,
        operation: Operation,
        files: &[InputFile],
        options: &ProcessingOptions,
        workspace: &Workspace,
        reporter: Arc<dyn ProgressReporter>,
    ) -> MediaResult<String>;
}

/// Runner backed by the real FFmpeg operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOperationRunner;

#[async_trait]
impl OperationRunner for FfmpegOperationRunner {
    async fn run(
        &self,
        operation: Operation,
        files: &[InputFile],
        options: &ProcessingOptions,
        workspace: &Workspace,
        reporter: Arc<dyn ProgressReporter>,
    ) -> MediaResult<String> {
        remux_media::run_operation(operation, files, options, workspace, reporter).await
    }
}

/// Reporter handed to a running operation: advances the record in the
/// registry (monotonically) and mirrors the update to the sink without
/// blocking the operation.
struct RegistryReporter {
    registry: TaskRegistry,
    sink: Arc<dyn PersistenceSink>,
    id: TaskId,
}

impl ProgressReporter for RegistryReporter {
    fn report(&self, progress: u8, message: &str) {
        let Some(snapshot) = self.registry.update(&self.id, |r| r.update(progress, message))
        else {
            return;
        };

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.record_transition(&snapshot).await {
                warn!(task_id = %snapshot.id, "Persistence unavailable: {e}");
            }
        });
    }
}

/// Accepts submissions and owns the task registry.
///
/// `submit` never blocks on an operation: each accepted task runs on its own
/// spawned tokio task. There is no queue and no concurrency cap.
#[derive(Clone)]
pub struct Orchestrator {
    registry: TaskRegistry,
    runner: Arc<dyn OperationRunner>,
    sink: Arc<dyn PersistenceSink>,
    workspace: Workspace,
}

impl Orchestrator {
    /// Create an orchestrator running real FFmpeg operations.
    pub fn new(config: EngineConfig, sink: Arc<dyn PersistenceSink>) -> Self {
        Self::with_runner(config, sink, Arc::new(FfmpegOperationRunner))
    }

    /// Create an orchestrator with a custom operation runner.
    pub fn with_runner(
        config: EngineConfig,
        sink: Arc<dyn PersistenceSink>,
        runner: Arc<dyn OperationRunner>,
    ) -> Self {
        Self {
            registry: TaskRegistry::new(),
            runner,
            sink,
            workspace: config.workspace(),
        }
    }

    /// Submit a task by operation name.
    ///
    /// An empty name or file set is rejected with `InvalidRequest`; a name
    /// outside the closed operation set with `UnknownOperation`. Both are
    /// synchronous: no task record is created.
    pub async fn submit_named(
        &self,
        operation: &str,
        files: Vec<InputFile>,
        options: ProcessingOptions,
    ) -> EngineResult<TaskId> {
        let name = operation.trim();
        if name.is_empty() {
            return Err(EngineError::invalid_request("missing operation name"));
        }
        let operation = name
            .parse::<Operation>()
            .map_err(|e| EngineError::UnknownOperation(e.0))?;
        self.submit(operation, files, options).await
    }

    /// Submit a task. Returns the new task's identity immediately; the
    /// operation runs on an independent execution path.
    pub async fn submit(
        &self,
        operation: Operation,
        files: Vec<InputFile>,
        options: ProcessingOptions,
    ) -> EngineResult<TaskId> {
        if files.is_empty() {
            return Err(EngineError::invalid_request("no input files supplied"));
        }

        let record = TaskRecord::new(operation, files);
        let id = record.id.clone();
        self.registry.insert(record.clone());
        self.mirror(&record).await;

        info!(task_id = %id, operation = %operation, "Task submitted");

        let orchestrator = self.clone();
        let task_id = id.clone();
        tokio::spawn(async move {
            orchestrator.run_task(task_id, options).await;
        });

        Ok(id)
    }

    /// Current status snapshot for a task, or the NotFound sentinel.
    pub fn status(&self, id: &TaskId) -> TaskStatus {
        match self.registry.snapshot(id) {
            Some(record) => TaskStatus::from_record(&record),
            None => TaskStatus::not_found(),
        }
    }

    /// Execution path for one task. All errors are captured into the record;
    /// nothing escapes the spawned task.
    async fn run_task(&self, id: TaskId, options: ProcessingOptions) {
        let Some(record) = self.registry.snapshot(&id) else {
            error!(task_id = %id, "Task vanished before execution started");
            return;
        };
        let operation = record.operation;
        let files = record.input_files;

        // Shape errors fail the task before it ever reaches Processing.
        if let Err(e) = operation.validate_inputs(&files) {
            warn!(task_id = %id, operation = %operation, "Rejecting input set: {e}");
            self.fail_task(&id, format!("invalid input set: {e}")).await;
            return;
        }

        self.transition(&id, |r| {
            r.begin();
            r.update(10, "Initializing");
        })
        .await;
        self.transition(&id, |r| r.update(25, "Processing files")).await;

        let reporter: Arc<dyn ProgressReporter> = Arc::new(RegistryReporter {
            registry: self.registry.clone(),
            sink: Arc::clone(&self.sink),
            id: id.clone(),
        });

        match self
            .runner
            .run(operation, &files, &options, &self.workspace, reporter)
            .await
        {
            Ok(output_file) => {
                info!(task_id = %id, operation = %operation, output_file, "Task completed");
                let snapshot = self.transition(&id, |r| r.complete(&output_file)).await;
                if let Some(summary) = snapshot.as_ref().and_then(TaskSummary::from_record) {
                    if let Err(e) = self.sink.record_summary(&summary).await {
                        warn!(task_id = %id, "Persistence unavailable: {e}");
                    }
                }
            }
            Err(e) => {
                error!(task_id = %id, operation = %operation, "Task failed: {e}");
                self.fail_task(&id, e.to_string()).await;
            }
        }
    }

    async fn fail_task(&self, id: &TaskId, error: String) {
        self.transition(id, |r| r.fail(error)).await;
    }

    /// Apply a transition and mirror the post-update snapshot to the sink.
    async fn transition<F>(&self, id: &TaskId, mutate: F) -> Option<TaskRecord>
    where
        F: FnOnce(&mut TaskRecord),
    {
        let snapshot = self.registry.update(id, mutate)?;
        self.mirror(&snapshot).await;
        Some(snapshot)
    }

    /// Best-effort persistence: failures are logged and never affect the
    /// in-memory transition.
    async fn mirror(&self, record: &TaskRecord) {
        if let Err(e) = self.sink.record_transition(record).await {
            warn!(task_id = %record.id, "Persistence unavailable: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use remux_media::MediaError;
    use remux_models::{MediaKind, TaskState};

    use crate::persist::{NoopSink, PersistenceError};

    fn test_config() -> EngineConfig {
        EngineConfig {
            upload_dir: std::env::temp_dir().join("remux-test-uploads"),
            output_dir: std::env::temp_dir().join("remux-test-outputs"),
        }
    }

    fn audio(name: &str) -> InputFile {
        InputFile::new(name, name, MediaKind::Audio, 512)
    }

    fn video(name: &str) -> InputFile {
        InputFile::new(name, name, MediaKind::Video, 2048)
    }

    async fn wait_terminal(orchestrator: &Orchestrator, id: &TaskId) -> TaskStatus {
        for _ in 0..500 {
            let status = orchestrator.status(id);
            if status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("task {id} never reached a terminal state");
    }

    /// Runner that reports a checkpoint, waits, and succeeds with an output
    /// name derived from its first input.
    struct EchoRunner {
        delay: Duration,
    }

    #[async_trait]
    impl OperationRunner for EchoRunner {
        async fn run(
            &self,
            _operation: Operation,
            files: &[InputFile],
            _options: &ProcessingOptions,
            _workspace: &Workspace,
            reporter: Arc<dyn ProgressReporter>,
        ) -> MediaResult<String> {
            let stem = files[0].stem().to_string();
            reporter.report(50, &format!("working on {stem}"));
            tokio::time::sleep(self.delay).await;
            Ok(format!("{stem}_done.mp4"))
        }
    }

    /// Runner that always fails.
    struct FailRunner;

    #[async_trait]
    impl OperationRunner for FailRunner {
        async fn run(
            &self,
            _operation: Operation,
            _files: &[InputFile],
            _options: &ProcessingOptions,
            _workspace: &Workspace,
            _reporter: Arc<dyn ProgressReporter>,
        ) -> MediaResult<String> {
            Err(MediaError::internal("simulated tool failure"))
        }
    }

    /// Runner that reports progress out of order.
    struct JitterRunner;

    #[async_trait]
    impl OperationRunner for JitterRunner {
        async fn run(
            &self,
            _operation: Operation,
            _files: &[InputFile],
            _options: &ProcessingOptions,
            _workspace: &Workspace,
            reporter: Arc<dyn ProgressReporter>,
        ) -> MediaResult<String> {
            reporter.report(80, "ahead");
            reporter.report(30, "stale");
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok("out.mp4".to_string())
        }
    }

    /// Runner that must never be reached.
    struct UnreachableRunner;

    #[async_trait]
    impl OperationRunner for UnreachableRunner {
        async fn run(
            &self,
            _operation: Operation,
            _files: &[InputFile],
            _options: &ProcessingOptions,
            _workspace: &Workspace,
            _reporter: Arc<dyn ProgressReporter>,
        ) -> MediaResult<String> {
            panic!("runner must not be invoked for an invalid input set");
        }
    }

    /// Sink that records every transition it is offered.
    #[derive(Default)]
    struct RecordingSink {
        transitions: Mutex<Vec<(TaskId, TaskState, u8)>>,
        summaries: Mutex<Vec<TaskSummary>>,
    }

    #[async_trait]
    impl PersistenceSink for RecordingSink {
        async fn record_transition(&self, record: &TaskRecord) -> Result<(), PersistenceError> {
            self.transitions.lock().unwrap().push((
                record.id.clone(),
                record.state,
                record.progress,
            ));
            Ok(())
        }

        async fn record_summary(&self, summary: &TaskSummary) -> Result<(), PersistenceError> {
            self.summaries.lock().unwrap().push(summary.clone());
            Ok(())
        }
    }

    /// Sink that always fails.
    struct BrokenSink;

    #[async_trait]
    impl PersistenceSink for BrokenSink {
        async fn record_transition(&self, _record: &TaskRecord) -> Result<(), PersistenceError> {
            Err(PersistenceError::new("store is down"))
        }

        async fn record_summary(&self, _summary: &TaskSummary) -> Result<(), PersistenceError> {
            Err(PersistenceError::new("store is down"))
        }
    }

    fn orchestrator_with(runner: Arc<dyn OperationRunner>) -> Orchestrator {
        Orchestrator::with_runner(test_config(), Arc::new(NoopSink), runner)
    }

    #[tokio::test]
    async fn test_submit_does_not_block_on_the_operation() {
        let orchestrator = orchestrator_with(Arc::new(EchoRunner {
            delay: Duration::from_millis(200),
        }));

        let started = std::time::Instant::now();
        let id = orchestrator
            .submit(
                Operation::ConvertFormat,
                vec![video("clip.mov")],
                ProcessingOptions::default(),
            )
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(150));

        // The task is still in flight right after submission
        assert!(!orchestrator.status(&id).is_terminal());

        let status = wait_terminal(&orchestrator, &id).await;
        assert_eq!(status.state, TaskState::Completed);
        assert_eq!(status.progress, 100);
        assert_eq!(status.output_file.as_deref(), Some("clip_done.mp4"));
        assert!(status.error_message.is_none());
    }

    #[tokio::test]
    async fn test_failure_is_captured_into_the_record() {
        let orchestrator = orchestrator_with(Arc::new(FailRunner));

        let id = orchestrator
            .submit(
                Operation::ConvertFormat,
                vec![video("clip.mov")],
                ProcessingOptions::default(),
            )
            .await
            .unwrap();

        let status = wait_terminal(&orchestrator, &id).await;
        assert_eq!(status.state, TaskState::Failed);
        assert!(status
            .error_message
            .as_deref()
            .unwrap()
            .contains("simulated tool failure"));
        assert!(status.output_file.is_none());
    }

    #[tokio::test]
    async fn test_terminal_state_never_reverts() {
        let orchestrator = orchestrator_with(Arc::new(EchoRunner {
            delay: Duration::from_millis(1),
        }));

        let id = orchestrator
            .submit(
                Operation::ConvertFormat,
                vec![video("clip.mov")],
                ProcessingOptions::default(),
            )
            .await
            .unwrap();

        let first = wait_terminal(&orchestrator, &id).await;
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(2)).await;
            assert_eq!(orchestrator.status(&id), first);
        }
    }

    #[tokio::test]
    async fn test_unknown_identity_reports_not_found() {
        let orchestrator = orchestrator_with(Arc::new(FailRunner));
        let status = orchestrator.status(&TaskId::new());
        assert_eq!(status.state, TaskState::NotFound);
    }

    #[tokio::test]
    async fn test_empty_file_set_is_rejected_synchronously() {
        let orchestrator = orchestrator_with(Arc::new(UnreachableRunner));
        let err = orchestrator
            .submit(Operation::ConvertFormat, vec![], ProcessingOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_submit_named_boundary() {
        let orchestrator = orchestrator_with(Arc::new(EchoRunner {
            delay: Duration::from_millis(1),
        }));

        let err = orchestrator
            .submit_named("", vec![video("v.mp4")], ProcessingOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));

        let err = orchestrator
            .submit_named(
                "reverse_audio",
                vec![video("v.mp4")],
                ProcessingOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownOperation(name) if name == "reverse_audio"));

        let id = orchestrator
            .submit_named(
                "convert_format",
                vec![video("v.mp4")],
                ProcessingOptions::default(),
            )
            .await
            .unwrap();
        let status = wait_terminal(&orchestrator, &id).await;
        assert_eq!(status.state, TaskState::Completed);
    }

    #[tokio::test]
    async fn test_invalid_input_set_never_reaches_processing() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = Orchestrator::with_runner(
            test_config(),
            Arc::clone(&sink) as Arc<dyn PersistenceSink>,
            Arc::new(UnreachableRunner),
        );

        // MergeAudioVideo with a lone audio file: wrong shape
        let id = orchestrator
            .submit(
                Operation::MergeAudioVideo,
                vec![audio("a.mp3")],
                ProcessingOptions::default(),
            )
            .await
            .unwrap();

        let status = wait_terminal(&orchestrator, &id).await;
        assert_eq!(status.state, TaskState::Failed);
        assert!(status
            .error_message
            .as_deref()
            .unwrap()
            .contains("invalid input set"));

        let states: Vec<TaskState> = sink
            .transitions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, state, _)| *state)
            .collect();
        assert!(!states.contains(&TaskState::Processing));
        assert_eq!(states.last(), Some(&TaskState::Failed));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_under_stale_reports() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = Orchestrator::with_runner(
            test_config(),
            Arc::clone(&sink) as Arc<dyn PersistenceSink>,
            Arc::new(JitterRunner),
        );

        let id = orchestrator
            .submit(
                Operation::ConvertFormat,
                vec![video("v.mp4")],
                ProcessingOptions::default(),
            )
            .await
            .unwrap();
        wait_terminal(&orchestrator, &id).await;

        let transitions = sink.transitions.lock().unwrap();
        let progress: Vec<u8> = transitions
            .iter()
            .filter(|(task_id, _, _)| *task_id == id)
            .map(|(_, _, p)| *p)
            .collect();
        assert!(
            progress.windows(2).all(|w| w[0] <= w[1]),
            "progress regressed: {progress:?}"
        );
        assert_eq!(progress.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_completed_task_offers_a_summary() {
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = Orchestrator::with_runner(
            test_config(),
            Arc::clone(&sink) as Arc<dyn PersistenceSink>,
            Arc::new(EchoRunner {
                delay: Duration::from_millis(1),
            }),
        );

        let id = orchestrator
            .submit(
                Operation::ConvertFormat,
                vec![video("clip.mov")],
                ProcessingOptions::default(),
            )
            .await
            .unwrap();
        wait_terminal(&orchestrator, &id).await;

        let summaries = sink.summaries.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].task_id, id);
        assert_eq!(summaries[0].input_file_count, 1);
        assert_eq!(summaries[0].total_input_bytes, 2048);
        assert_eq!(summaries[0].output_file, "clip_done.mp4");
    }

    #[tokio::test]
    async fn test_broken_sink_does_not_affect_task_outcome() {
        let orchestrator = Orchestrator::with_runner(
            test_config(),
            Arc::new(BrokenSink),
            Arc::new(EchoRunner {
                delay: Duration::from_millis(1),
            }),
        );

        let id = orchestrator
            .submit(
                Operation::ConvertFormat,
                vec![video("clip.mov")],
                ProcessingOptions::default(),
            )
            .await
            .unwrap();
        let status = wait_terminal(&orchestrator, &id).await;
        assert_eq!(status.state, TaskState::Completed);
    }

    #[tokio::test]
    async fn test_hundred_concurrent_tasks_stay_isolated() {
        let orchestrator = orchestrator_with(Arc::new(EchoRunner {
            delay: Duration::from_millis(10),
        }));

        let mut ids = Vec::new();
        for i in 0..100 {
            let id = orchestrator
                .submit(
                    Operation::ConvertFormat,
                    vec![video(&format!("task{i}.mov"))],
                    ProcessingOptions::default(),
                )
                .await
                .unwrap();
            ids.push((i, id));
        }

        for (i, id) in &ids {
            let status = wait_terminal(&orchestrator, id).await;
            assert_eq!(status.state, TaskState::Completed);
            assert_eq!(
                status.output_file.as_deref(),
                Some(format!("task{i}_done.mp4").as_str()),
                "task {i} saw another task's output"
            );
        }

        // Identities never collide
        let mut unique: Vec<&TaskId> = ids.iter().map(|(_, id)| id).collect();
        unique.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        unique.dedup();
        assert_eq!(unique.len(), 100);
    }
}
