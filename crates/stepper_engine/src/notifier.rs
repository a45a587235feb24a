use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use stepper_logging::{stepper_debug, stepper_info, stepper_warn};
use tokio_util::sync::CancellationToken;

use crate::{ApiError, Backend, EngineEvent, MarkCompleteRequest};

/// Runs `future` unless `token` fires first, in which case the future is
/// dropped (aborting any in-flight request) and `Cancelled` is returned.
pub async fn with_cancel<T, F>(token: &CancellationToken, future: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::cancelled()),
        result = future => result,
    }
}

/// Calls `check` every `interval` until it reports completion.
pub(crate) async fn poll_until_complete<F, Fut>(
    token: &CancellationToken,
    interval: Duration,
    mut check: F,
) -> Result<(), ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, ApiError>>,
{
    loop {
        if with_cancel(token, check()).await? {
            return Ok(());
        }
        with_cancel(token, async {
            tokio::time::sleep(interval).await;
            Ok::<(), ApiError>(())
        })
        .await?;
    }
}

/// One-shot "mark import/export complete" call per completion.
///
/// Starting a new notification cancels the previous one, so at most one
/// request is in flight against the backend's check-then-insert.
pub struct CompletionNotifier {
    backend: Arc<dyn Backend>,
    current: Option<CancellationToken>,
}

impl CompletionNotifier {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    /// Supersedes any in-flight notification and returns the future for the
    /// new one. The future resolves to `None` when it was cancelled.
    pub fn begin(
        &mut self,
        request: MarkCompleteRequest,
    ) -> impl Future<Output = Option<EngineEvent>> + Send + 'static {
        self.cancel();
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        let backend = self.backend.clone();
        async move {
            let event = notify(backend.as_ref(), &request, &token).await;
            // Resolved either way; `in_flight` reads the token.
            token.cancel();
            event
        }
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    /// True while the latest notification has neither resolved nor been
    /// cancelled.
    pub fn in_flight(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}

/// Issues the completion call and maps its outcome. Cancellation yields no
/// event at all.
pub async fn notify(
    backend: &dyn Backend,
    request: &MarkCompleteRequest,
    token: &CancellationToken,
) -> Option<EngineEvent> {
    match with_cancel(token, backend.mark_complete(request)).await {
        Ok(()) => {
            stepper_info!(
                "Marked import/export of {}/{} as complete",
                request.github_source_namespace,
                request.github_source_repository
            );
            Some(EngineEvent::CompletionRecorded)
        }
        Err(err) if err.is_cancelled() => {
            stepper_debug!("completion notification aborted");
            None
        }
        Err(err) => {
            stepper_warn!("completion notification failed ({}): {}", err.kind, err.message);
            Some(EngineEvent::CompletionFailed {
                request: request.clone(),
                message: err.message,
            })
        }
    }
}
