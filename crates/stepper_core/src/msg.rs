use crate::{ExportJob, GitHubRepository, ParsedUrlState, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Backend accepted an import request.
    StartImport {
        repository: GitHubRepository,
        task_id: TaskId,
        destination_namespace: String,
        destination_repository: String,
    },
    /// Import job reported done.
    ImportComplete,
    /// Backend accepted an export batch.
    StartExport { jobs: Vec<ExportJob> },
    /// One export task reported done.
    ExportTableTaskComplete { task_id: TaskId },
    /// Force the terminal success phase.
    ExportComplete,
    ImportError { error: String },
    ExportError { error: String },
    /// Back to the `unstarted` initial state.
    Reset,
    /// The address bar changed (initial load, back/forward, shared link).
    InitializeFromUrl(ParsedUrlState),
}
