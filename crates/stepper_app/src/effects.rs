use std::sync::{mpsc, Arc};

use stepper_core::tables::ExportTableInput;
use stepper_core::{
    Action, CompletionRequest, Effect, ExportJob, GitHubRepository, Phase, Watch, WizardState,
};
use stepper_engine::{
    BackendSettings, EngineError, EngineEvent, EngineHandle, EventSink, ExportTableRequest,
    ImportStatusQuery, MarkCompleteRequest, StartExportRequest, WatchKind,
};
use stepper_logging::{stepper_info, stepper_warn};

use crate::AppMsg;

/// Executes reducer effects and user-initiated backend calls.
pub trait EffectExecutor {
    fn execute(&self, effect: Effect);
    fn start_import(&self, repository: &GitHubRepository);
    fn start_export(&self, tables: Vec<ExportTableInput>);
}

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: BackendSettings, msg_tx: mpsc::Sender<AppMsg>) -> Result<Self, EngineError> {
        let engine = EngineHandle::new(settings, Arc::new(AppEventSink { msg_tx }))?;
        Ok(Self { engine })
    }
}

impl EffectExecutor for EffectRunner {
    fn execute(&self, effect: Effect) {
        match effect {
            Effect::AwaitImport {
                task_id,
                destination_namespace,
                destination_repository,
            } => {
                stepper_info!("AwaitImport task_id={}", task_id);
                self.engine.await_import(ImportStatusQuery {
                    task_id,
                    splitgraph_namespace: destination_namespace,
                    splitgraph_repository: destination_repository,
                });
            }
            Effect::AwaitExportTasks { task_ids } => {
                stepper_info!("AwaitExportTasks count={}", task_ids.len());
                self.engine.await_export_tasks(task_ids);
            }
            Effect::NotifyCompletion(request) => {
                self.engine.notify_completion(map_completion(request));
            }
            Effect::Cancel(watch) => {
                self.engine.cancel(map_watch(watch));
            }
        }
    }

    fn start_import(&self, repository: &GitHubRepository) {
        stepper_info!("StartImport repository={}", repository);
        self.engine
            .start_import(repository.namespace.clone(), repository.repository.clone());
    }

    fn start_export(&self, tables: Vec<ExportTableInput>) {
        stepper_info!("StartExport tables={}", tables.len());
        self.engine.start_export(StartExportRequest {
            tables: tables
                .into_iter()
                .map(|input| ExportTableRequest {
                    namespace: input.namespace,
                    repository: input.repository,
                    table: input.table,
                })
                .collect(),
        });
    }
}

struct AppEventSink {
    msg_tx: mpsc::Sender<AppMsg>,
}

impl EventSink for AppEventSink {
    fn emit(&self, event: EngineEvent) {
        if self.msg_tx.send(AppMsg::Engine(event)).is_err() {
            stepper_warn!("app loop has stopped; engine event dropped");
        }
    }
}

/// Translates an engine event into the action it implies, given the state
/// it arrives in.
///
/// Cancels reach the engine over a channel, so results of superseded work can
/// still be queued behind them. Events that do not fit the current state are
/// dropped here and never reach the reducer.
pub fn action_for_event(event: EngineEvent, state: &WizardState) -> Option<Action> {
    let phase = state.phase();
    match event {
        EngineEvent::ImportStarted {
            github_namespace,
            github_repository,
            response,
        } => {
            if phase != Phase::Unstarted {
                stepper_warn!("dropping import start for task {} in phase {}", response.task_id, phase);
                return None;
            }
            Some(Action::StartImport {
                repository: GitHubRepository::new(github_namespace, github_repository),
                task_id: response.task_id,
                destination_namespace: response.splitgraph_namespace,
                destination_repository: response.splitgraph_repository,
            })
        }
        EngineEvent::ImportFailed { message } => {
            if !matches!(phase, Phase::Unstarted | Phase::AwaitingImport) {
                stepper_warn!("dropping import failure in phase {}: {}", phase, message);
                return None;
            }
            Some(Action::ImportError { error: message })
        }
        EngineEvent::ImportCompleted { task_id } => {
            if phase != Phase::AwaitingImport || state.import_job_id() != Some(task_id.as_str()) {
                stepper_warn!("dropping completion of stale import task {}", task_id);
                return None;
            }
            Some(Action::ImportComplete)
        }
        EngineEvent::ExportStarted { tasks } => {
            if phase != Phase::ImportComplete {
                stepper_warn!("dropping export start with {} tasks in phase {}", tasks.len(), phase);
                return None;
            }
            let default_schema = state.destination_repository().unwrap_or_default();
            Some(Action::StartExport {
                jobs: tasks
                    .into_iter()
                    .map(|task| ExportJob {
                        destination_schema: task
                            .destination_schema
                            .unwrap_or_else(|| default_schema.to_string()),
                        destination_table: task.table_name,
                        task_id: task.task_id,
                        source_query: task.source_query,
                    })
                    .collect(),
            })
        }
        EngineEvent::ExportTaskCompleted { task_id } => {
            if phase != Phase::AwaitingExport
                || !state.loading_export_jobs().contains_key(&task_id)
            {
                stepper_warn!("dropping completion of stale export task {}", task_id);
                return None;
            }
            Some(Action::ExportTableTaskComplete { task_id })
        }
        EngineEvent::ExportFailed { message } => {
            if !matches!(phase, Phase::ImportComplete | Phase::AwaitingExport) {
                stepper_warn!("dropping export failure in phase {}: {}", phase, message);
                return None;
            }
            Some(Action::ExportError { error: message })
        }
        EngineEvent::CompletionFailed { request, message } => {
            let current = state.completion_target().map(map_completion);
            if phase != Phase::ExportComplete || current.as_ref() != Some(&request) {
                stepper_warn!(
                    "dropping completion failure for superseded {}/{}: {}",
                    request.github_source_namespace,
                    request.github_source_repository,
                    message
                );
                return None;
            }
            Some(Action::ExportError { error: message })
        }
        EngineEvent::CompletionRecorded => None,
    }
}

fn map_completion(request: CompletionRequest) -> MarkCompleteRequest {
    MarkCompleteRequest {
        github_source_namespace: request.github_source_namespace,
        github_source_repository: request.github_source_repository,
        splitgraph_destination_namespace: request.splitgraph_destination_namespace,
        splitgraph_destination_repository: request.splitgraph_destination_repository,
    }
}

fn map_watch(watch: Watch) -> WatchKind {
    match watch {
        Watch::Import => WatchKind::Import,
        Watch::Export => WatchKind::Export,
        Watch::Completion => WatchKind::Completion,
    }
}
