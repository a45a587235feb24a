use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use stepper_logging::{stepper_debug, stepper_info, stepper_warn};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::notifier::{poll_until_complete, CompletionNotifier};
use crate::{
    ApiError, Backend, BackendSettings, EngineEvent, ImportStatusQuery, MarkCompleteRequest,
    ReqwestBackend, StartExportRequest, StartImportRequest, TaskId, WatchKind,
};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        if self.tx.send(event).is_err() {
            stepper_warn!("event receiver has gone away; engine event dropped");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Backend(#[from] ApiError),
}

enum EngineCommand {
    StartImport {
        github_namespace: String,
        github_repository: String,
    },
    StartExport(StartExportRequest),
    AwaitImport(ImportStatusQuery),
    AwaitExportTasks(Vec<TaskId>),
    NotifyCompletion(MarkCompleteRequest),
    Cancel(WatchKind),
}

/// Handle to the background thread that owns the tokio runtime.
///
/// Dropping the last handle stops the thread and the runtime with it.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(settings: BackendSettings, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let poll_interval = settings.poll_interval;
        let backend = ReqwestBackend::new(settings)?;
        Self::with_backend(Arc::new(backend), poll_interval, sink)
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        poll_interval: Duration,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut worker = Worker::new(runtime, backend, poll_interval, sink);
            while let Ok(command) = cmd_rx.recv() {
                worker.handle(command);
            }
            worker.shutdown();
        });

        Ok(Self { cmd_tx })
    }

    pub fn start_import(&self, github_namespace: impl Into<String>, github_repository: impl Into<String>) {
        self.send(EngineCommand::StartImport {
            github_namespace: github_namespace.into(),
            github_repository: github_repository.into(),
        });
    }

    pub fn start_export(&self, request: StartExportRequest) {
        self.send(EngineCommand::StartExport(request));
    }

    pub fn await_import(&self, query: ImportStatusQuery) {
        self.send(EngineCommand::AwaitImport(query));
    }

    pub fn await_export_tasks(&self, task_ids: Vec<TaskId>) {
        self.send(EngineCommand::AwaitExportTasks(task_ids));
    }

    pub fn notify_completion(&self, request: MarkCompleteRequest) {
        self.send(EngineCommand::NotifyCompletion(request));
    }

    pub fn cancel(&self, kind: WatchKind) {
        self.send(EngineCommand::Cancel(kind));
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            stepper_warn!("engine thread has stopped; command dropped");
        }
    }
}

struct Worker {
    runtime: Runtime,
    backend: Arc<dyn Backend>,
    poll_interval: Duration,
    sink: Arc<dyn EventSink>,
    watches: HashMap<WatchKind, CancellationToken>,
    notifier: CompletionNotifier,
}

impl Worker {
    fn new(
        runtime: Runtime,
        backend: Arc<dyn Backend>,
        poll_interval: Duration,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            runtime,
            notifier: CompletionNotifier::new(backend.clone()),
            backend,
            poll_interval,
            sink,
            watches: HashMap::new(),
        }
    }

    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::StartImport {
                github_namespace,
                github_repository,
            } => self.start_import(github_namespace, github_repository),
            EngineCommand::StartExport(request) => self.start_export(request),
            EngineCommand::AwaitImport(query) => self.await_import(query),
            EngineCommand::AwaitExportTasks(task_ids) => self.await_export_tasks(task_ids),
            EngineCommand::NotifyCompletion(request) => {
                stepper_info!(
                    "notifying completion for {}/{}",
                    request.github_source_namespace,
                    request.github_source_repository
                );
                let sink = self.sink.clone();
                let notification = self.notifier.begin(request);
                self.runtime.spawn(async move {
                    if let Some(event) = notification.await {
                        sink.emit(event);
                    }
                });
            }
            EngineCommand::Cancel(WatchKind::Completion) => {
                stepper_debug!("cancelling completion notification");
                self.notifier.cancel();
            }
            EngineCommand::Cancel(kind) => {
                if let Some(token) = self.watches.remove(&kind) {
                    stepper_debug!("cancelling {:?} watch", kind);
                    token.cancel();
                }
            }
        }
    }

    fn start_import(&self, github_namespace: String, github_repository: String) {
        let backend = self.backend.clone();
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            let request = StartImportRequest {
                github_source_repository: format!("{github_namespace}/{github_repository}"),
            };
            match backend.start_import(&request).await {
                Ok(response) => {
                    stepper_info!(
                        "import of {} started as task {}",
                        request.github_source_repository,
                        response.task_id
                    );
                    sink.emit(EngineEvent::ImportStarted {
                        github_namespace,
                        github_repository,
                        response,
                    });
                }
                Err(err) => {
                    stepper_warn!("start import failed ({}): {}", err.kind, err.message);
                    sink.emit(EngineEvent::ImportFailed {
                        message: err.message,
                    });
                }
            }
        });
    }

    fn start_export(&self, request: StartExportRequest) {
        let backend = self.backend.clone();
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            match backend.start_export(&request).await {
                Ok(tasks) => {
                    stepper_info!("export started with {} tasks", tasks.len());
                    sink.emit(EngineEvent::ExportStarted { tasks });
                }
                Err(err) => {
                    stepper_warn!("start export failed ({}): {}", err.kind, err.message);
                    sink.emit(EngineEvent::ExportFailed {
                        message: err.message,
                    });
                }
            }
        });
    }

    /// Replaces any running import watch.
    fn await_import(&mut self, query: ImportStatusQuery) {
        let token = CancellationToken::new();
        if let Some(previous) = self.watches.insert(WatchKind::Import, token.clone()) {
            previous.cancel();
        }

        let backend = self.backend.clone();
        let sink = self.sink.clone();
        let interval = self.poll_interval;
        self.runtime.spawn(async move {
            let result =
                poll_until_complete(&token, interval, || backend.import_status(&query)).await;
            match result {
                Ok(()) if !token.is_cancelled() => {
                    sink.emit(EngineEvent::ImportCompleted {
                        task_id: query.task_id.clone(),
                    });
                }
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {
                    stepper_debug!("import watch for {} aborted", query.task_id);
                }
                Err(err) => {
                    stepper_warn!("import {} failed ({}): {}", query.task_id, err.kind, err.message);
                    sink.emit(EngineEvent::ImportFailed {
                        message: err.message,
                    });
                }
            }
        });
    }

    /// Adds tasks to the running export watch, starting one if needed.
    fn await_export_tasks(&mut self, task_ids: Vec<TaskId>) {
        let token = match self.watches.get(&WatchKind::Export) {
            Some(token) if !token.is_cancelled() => token.clone(),
            _ => {
                let token = CancellationToken::new();
                self.watches.insert(WatchKind::Export, token.clone());
                token
            }
        };

        for task_id in task_ids {
            let backend = self.backend.clone();
            let sink = self.sink.clone();
            let token = token.clone();
            let interval = self.poll_interval;
            self.runtime.spawn(async move {
                let result = poll_until_complete(&token, interval, || {
                    backend.export_task_status(&task_id)
                })
                .await;
                match result {
                    Ok(()) if !token.is_cancelled() => {
                        sink.emit(EngineEvent::ExportTaskCompleted { task_id });
                    }
                    Ok(()) => {}
                    Err(err) if err.is_cancelled() => {
                        stepper_debug!("export watch for {} aborted", task_id);
                    }
                    Err(err) => {
                        stepper_warn!("export task {} failed ({}): {}", task_id, err.kind, err.message);
                        // Siblings are moot once one table failed.
                        token.cancel();
                        sink.emit(EngineEvent::ExportFailed {
                            message: err.message,
                        });
                    }
                }
            });
        }
    }

    fn shutdown(&mut self) {
        self.notifier.cancel();
        for (_, token) in self.watches.drain() {
            token.cancel();
        }
    }
}
