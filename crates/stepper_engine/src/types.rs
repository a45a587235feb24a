use std::fmt;

use serde::{Deserialize, Serialize};

pub type TaskId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartImportRequest {
    /// `namespace/repository` on GitHub.
    pub github_source_repository: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartImportResponse {
    pub task_id: TaskId,
    pub splitgraph_namespace: String,
    pub splitgraph_repository: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTableRequest {
    pub namespace: String,
    pub repository: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartExportRequest {
    pub tables: Vec<ExportTableRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct StartExportResponse {
    #[serde(default)]
    pub tables: Vec<ExportTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTask {
    pub table_name: String,
    pub task_id: TaskId,
    #[serde(default)]
    pub destination_schema: Option<String>,
    #[serde(default)]
    pub source_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStatusQuery {
    pub task_id: TaskId,
    pub splitgraph_namespace: String,
    pub splitgraph_repository: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExportStatusRequest<'a> {
    pub task_id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobStatusResponse {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub job_status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkCompleteRequest {
    pub github_source_namespace: String,
    pub github_source_repository: String,
    pub splitgraph_destination_namespace: String,
    pub splitgraph_destination_repository: String,
}

/// Kinds of cancellable background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchKind {
    Import,
    Export,
    Completion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ImportStarted {
        github_namespace: String,
        github_repository: String,
        response: StartImportResponse,
    },
    ImportFailed {
        message: String,
    },
    ImportCompleted {
        task_id: TaskId,
    },
    ExportStarted {
        tasks: Vec<ExportTask>,
    },
    ExportTaskCompleted {
        task_id: TaskId,
    },
    ExportFailed {
        message: String,
    },
    CompletionRecorded,
    CompletionFailed {
        request: MarkCompleteRequest,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "request aborted")
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Network,
    Timeout,
    HttpStatus(u16),
    MalformedBody,
    /// The backend answered but reported an error.
    Reported,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::MalformedBody => write!(f, "malformed response body"),
            FailureKind::Reported => write!(f, "reported by backend"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}
