use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use stepper_logging::stepper_trace;
use url::Url;

use crate::types::{ExportStatusRequest, JobStatusResponse, StartExportResponse};
use crate::{
    ApiError, ExportTask, FailureKind, ImportStatusQuery, MarkCompleteRequest, StartExportRequest,
    StartImportRequest, StartImportResponse,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub start_import_path: String,
    pub await_import_path: String,
    pub start_export_path: String,
    pub await_export_task_path: String,
    pub mark_complete_path: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl BackendSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(3),
            start_import_path: "/api/start-import-from-github".to_string(),
            await_import_path: "/api/await-import-from-github".to_string(),
            start_export_path: "/api/start-export-to-seafowl".to_string(),
            await_export_task_path: "/api/await-export-to-seafowl-task".to_string(),
            mark_complete_path: "/api/mark-import-export-complete".to_string(),
        }
    }
}

/// The external backend API the wizard drives.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn start_import(
        &self,
        request: &StartImportRequest,
    ) -> Result<StartImportResponse, ApiError>;

    /// Returns whether the import job has finished.
    async fn import_status(&self, query: &ImportStatusQuery) -> Result<bool, ApiError>;

    /// Returns the accepted tasks; never empty on success.
    async fn start_export(&self, request: &StartExportRequest) -> Result<Vec<ExportTask>, ApiError>;

    /// Returns whether the export task has finished.
    async fn export_task_status(&self, task_id: &str) -> Result<bool, ApiError>;

    async fn mark_complete(&self, request: &MarkCompleteRequest) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Url::parse(&self.settings.base_url)
            .and_then(|base| base.join(path))
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_response(response).await
    }

    async fn get_json<R: DeserializeOwned>(&self, url: Url) -> Result<R, ApiError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        decode_response(response).await
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn start_import(
        &self,
        request: &StartImportRequest,
    ) -> Result<StartImportResponse, ApiError> {
        self.post_json(&self.settings.start_import_path, request).await
    }

    async fn import_status(&self, query: &ImportStatusQuery) -> Result<bool, ApiError> {
        let mut url = self.endpoint(&self.settings.await_import_path)?;
        url.query_pairs_mut()
            .append_pair("taskId", &query.task_id)
            .append_pair("splitgraphNamespace", &query.splitgraph_namespace)
            .append_pair("splitgraphRepository", &query.splitgraph_repository);
        let status: JobStatusResponse = self.get_json(url).await?;
        job_completed(status)
    }

    async fn start_export(&self, request: &StartExportRequest) -> Result<Vec<ExportTask>, ApiError> {
        let response: StartExportResponse = self
            .post_json(&self.settings.start_export_path, request)
            .await?;
        if response.tables.is_empty() {
            return Err(ApiError::new(
                FailureKind::MalformedBody,
                "Response missing tables",
            ));
        }
        Ok(response.tables)
    }

    async fn export_task_status(&self, task_id: &str) -> Result<bool, ApiError> {
        let status: JobStatusResponse = self
            .post_json(
                &self.settings.await_export_task_path,
                &ExportStatusRequest { task_id },
            )
            .await?;
        job_completed(status)
    }

    async fn mark_complete(&self, request: &MarkCompleteRequest) -> Result<(), ApiError> {
        let url = self.endpoint(&self.settings.mark_complete_path)?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if !response.status().is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(response.status().as_u16()),
                "Failed to mark import/export as complete",
            ));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|err| ApiError::new(FailureKind::MalformedBody, err.to_string()))?;
        check_mark_complete_body(&body)
    }
}

/// Success needs a truthy `status` and no `error` in the body.
pub fn check_mark_complete_body(body: &Value) -> Result<(), ApiError> {
    if !body.get("status").is_some_and(is_truthy) {
        return Err(ApiError::new(
            FailureKind::MalformedBody,
            "Got unexpected response shape when marking import/export complete",
        ));
    }
    match body.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(error) => {
            let detail = match error {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            Err(ApiError::new(
                FailureKind::Reported,
                format!("Failed to mark import/export complete: {detail}"),
            ))
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn job_completed(status: JobStatusResponse) -> Result<bool, ApiError> {
    if let Some(error) = status.error {
        return Err(ApiError::new(FailureKind::Reported, error));
    }
    if let Some(job_status) = status.job_status.as_deref() {
        stepper_trace!("backend job status: {}", job_status);
    }
    Ok(status.completed)
}

async fn decode_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ApiError::new(FailureKind::MalformedBody, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
