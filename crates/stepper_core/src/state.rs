use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::effect::CompletionRequest;
use crate::query::ParsedUrlState;
use crate::view_model::StepperView;

pub type TaskId = String;

/// Wizard step, in intended progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Phase {
    /// Only exists before the first URL parse.
    Uninitialized,
    #[default]
    Unstarted,
    AwaitingImport,
    ImportComplete,
    AwaitingExport,
    ExportComplete,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Uninitialized,
        Phase::Unstarted,
        Phase::AwaitingImport,
        Phase::ImportComplete,
        Phase::AwaitingExport,
        Phase::ExportComplete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Unstarted => "unstarted",
            Phase::AwaitingImport => "awaiting_import",
            Phase::ImportComplete => "import_complete",
            Phase::AwaitingExport => "awaiting_export",
            Phase::ExportComplete => "export_complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stepper phase: {0}")]
pub struct UnknownPhase(pub String);

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| UnknownPhase(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GitHubRepository {
    pub namespace: String,
    pub repository: String,
}

impl GitHubRepository {
    pub fn new(namespace: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            repository: repository.into(),
        }
    }
}

impl fmt::Display for GitHubRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.repository)
    }
}

/// One table-level export task, keyed by `task_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub destination_schema: String,
    pub destination_table: String,
    pub task_id: TaskId,
    pub source_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    phase: Phase,
    source_repository: Option<GitHubRepository>,
    import_job_id: Option<TaskId>,
    import_error: Option<String>,
    export_error: Option<String>,
    destination_namespace: Option<String>,
    destination_repository: Option<String>,
    loading_export_jobs: BTreeMap<TaskId, ExportJob>,
    completed_export_jobs: BTreeMap<TaskId, ExportJob>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            phase: Phase::Unstarted,
            source_repository: None,
            import_job_id: None,
            import_error: None,
            export_error: None,
            destination_namespace: None,
            destination_repository: None,
            loading_export_jobs: BTreeMap::new(),
            completed_export_jobs: BTreeMap::new(),
        }
    }
}

impl WizardState {
    /// The `unstarted` initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder used until the first URL parse has happened.
    pub fn uninitialized() -> Self {
        Self {
            phase: Phase::Uninitialized,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn source_repository(&self) -> Option<&GitHubRepository> {
        self.source_repository.as_ref()
    }

    pub fn import_job_id(&self) -> Option<&str> {
        self.import_job_id.as_deref()
    }

    pub fn import_error(&self) -> Option<&str> {
        self.import_error.as_deref()
    }

    pub fn export_error(&self) -> Option<&str> {
        self.export_error.as_deref()
    }

    pub fn destination_namespace(&self) -> Option<&str> {
        self.destination_namespace.as_deref()
    }

    pub fn destination_repository(&self) -> Option<&str> {
        self.destination_repository.as_deref()
    }

    pub fn loading_export_jobs(&self) -> &BTreeMap<TaskId, ExportJob> {
        &self.loading_export_jobs
    }

    pub fn completed_export_jobs(&self) -> &BTreeMap<TaskId, ExportJob> {
        &self.completed_export_jobs
    }

    /// Identity pair sent to the completion endpoint, when all parts are known.
    pub fn completion_target(&self) -> Option<CompletionRequest> {
        let source = self.source_repository.as_ref()?;
        Some(CompletionRequest {
            github_source_namespace: source.namespace.clone(),
            github_source_repository: source.repository.clone(),
            splitgraph_destination_namespace: self.destination_namespace.clone()?,
            splitgraph_destination_repository: self.destination_repository.clone()?,
        })
    }

    pub fn view(&self) -> StepperView {
        StepperView::from_state(self)
    }

    pub(crate) fn start_import(
        &mut self,
        repository: GitHubRepository,
        task_id: TaskId,
        destination_namespace: String,
        destination_repository: String,
    ) {
        self.phase = Phase::AwaitingImport;
        self.source_repository = Some(repository);
        self.import_job_id = Some(task_id);
        self.destination_namespace = Some(destination_namespace);
        self.destination_repository = Some(destination_repository);
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn start_export(&mut self, jobs: Vec<ExportJob>) {
        self.loading_export_jobs = jobs
            .into_iter()
            .map(|job| (job.task_id.clone(), job))
            .collect();
        self.completed_export_jobs.clear();
        self.phase = Phase::AwaitingExport;
    }

    /// Moves the job with `task_id` from loading to completed.
    ///
    /// Returns `false` without touching state if no such job is loading.
    pub(crate) fn complete_export_task(&mut self, task_id: &str) -> bool {
        let Some(job) = self.loading_export_jobs.remove(task_id) else {
            return false;
        };
        self.completed_export_jobs.insert(job.task_id.clone(), job);
        self.phase = if self.loading_export_jobs.is_empty() {
            Phase::ExportComplete
        } else {
            Phase::AwaitingExport
        };
        true
    }

    pub(crate) fn fail_import(&mut self, error: String) {
        self.phase = Phase::Unstarted;
        self.source_repository = None;
        self.import_job_id = None;
        self.destination_namespace = None;
        self.destination_repository = None;
        self.import_error = Some(error);
    }

    pub(crate) fn fail_export(&mut self, error: String) {
        self.phase = Phase::ImportComplete;
        self.loading_export_jobs.clear();
        self.completed_export_jobs.clear();
        self.export_error = Some(error);
    }

    /// Overwrites every URL-carried field; export job maps are kept.
    pub(crate) fn apply_parsed(&mut self, parsed: ParsedUrlState) {
        self.phase = parsed.phase;
        self.source_repository = parsed.source_repository;
        self.import_job_id = parsed.import_job_id;
        self.import_error = parsed.import_error;
        self.export_error = parsed.export_error;
        self.destination_namespace = parsed.destination_namespace;
        self.destination_repository = parsed.destination_repository;
    }
}
