//! Stepper engine: backend API client and effect execution.
mod api;
mod engine;
mod notifier;
mod types;

pub use api::{check_mark_complete_body, Backend, BackendSettings, ReqwestBackend, DEFAULT_BASE_URL};
pub use engine::{ChannelEventSink, EngineError, EngineHandle, EventSink};
pub use notifier::{notify, with_cancel, CompletionNotifier};
pub use types::{
    ApiError, EngineEvent, ExportTableRequest, ExportTask, FailureKind, ImportStatusQuery,
    MarkCompleteRequest, StartExportRequest, StartImportRequest, StartImportResponse, TaskId,
    WatchKind,
};
