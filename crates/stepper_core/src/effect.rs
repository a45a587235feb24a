use crate::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start polling the import job.
    AwaitImport {
        task_id: TaskId,
        destination_namespace: String,
        destination_repository: String,
    },
    /// Start polling each export task.
    AwaitExportTasks { task_ids: Vec<TaskId> },
    /// Tell the backend the workflow finished. Supersedes any earlier notify.
    NotifyCompletion(CompletionRequest),
    /// Abort in-flight work of the given kind and drop its result.
    Cancel(Watch),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Watch {
    Import,
    Export,
    Completion,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompletionRequest {
    pub github_source_namespace: String,
    pub github_source_repository: String,
    pub splitgraph_destination_namespace: String,
    pub splitgraph_destination_repository: String,
}
