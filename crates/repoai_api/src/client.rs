use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use repoai_session::{
    AiWriteRequest, AiWriteResponse, AnalysisController, AnalysisRequest, AnalysisSession,
    AnalysisState, ChatRequest, ChatResponse, CommandRequest, CommandResponse, DispatchStats,
    FileRequest, FileResponse, SessionId, SuggestionRequest, SuggestionResponse,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RepoApiConfig;
use crate::error::{error_from_response, RepoApiError};
use crate::headers::{build_headers, ACCEPT_EVENT_STREAM, ACCEPT_JSON};
use crate::payload::{DirectoryTree, HealthStatus, RepoInfo, RepoInfoRequest, TreeRequest};
use crate::url::{
    endpoint_url, normalize_base_url, ANALYZE_PATH, CHAT_PATH, FILE_AI_WRITE_PATH,
    FILE_DELETE_PATH, FILE_READ_PATH, FILE_WRITE_PATH, FS_TREE_PATH, HEALTH_PATH,
    REPO_INFO_PATH, TERMINAL_AI_PATH, TERMINAL_RUN_PATH,
};

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct RepoApiClient {
    http: Client,
    config: RepoApiConfig,
}

/// How one analysis stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOutcome {
    pub session_id: SessionId,
    /// Session state when the body closed; `Running` if the backend hung up
    /// without a terminal frame.
    pub state: AnalysisState,
    pub stats: DispatchStats,
}

impl RepoApiClient {
    pub fn new(mut config: RepoApiConfig) -> Result<Self, RepoApiError> {
        config.base_url = normalize_base_url(&config.base_url)?;
        let http = Client::builder().build().map_err(RepoApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RepoApiConfig {
        &self.config
    }

    pub fn endpoint(&self, path: &str) -> Result<String, RepoApiError> {
        endpoint_url(&self.config.base_url, path)
    }

    pub fn build_headers(&self, accept: &str) -> Result<HeaderMap, RepoApiError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config, accept) {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| RepoApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| RepoApiError::InvalidHeader(format!("invalid value for {key}")))?,
            );
        }
        Ok(out)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        accept: &str,
    ) -> Result<RequestBuilder, RepoApiError> {
        Ok(self
            .http
            .request(method, self.endpoint(path)?)
            .headers(self.build_headers(accept)?))
    }

    /// Plain request/response call. The configured timeout applies here only.
    async fn send_json<T>(
        &self,
        builder: RequestBuilder,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<T, RepoApiError>
    where
        T: DeserializeOwned,
    {
        let builder = match self.config.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        };
        let response = await_or_cancel(builder.send(), cancellation).await??;
        let status = response.status();
        let body = await_or_cancel(response.text(), cancellation).await??;
        if !status.is_success() {
            return Err(error_from_response(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn get_json<T>(
        &self,
        path: &str,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<T, RepoApiError>
    where
        T: DeserializeOwned,
    {
        let builder = self.request(Method::GET, path, ACCEPT_JSON)?;
        self.send_json(builder, cancellation).await
    }

    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<T, RepoApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path, ACCEPT_JSON)?.json(body);
        self.send_json(builder, cancellation).await
    }

    pub async fn health(&self) -> Result<HealthStatus, RepoApiError> {
        self.get_json(HEALTH_PATH, None).await
    }

    pub async fn repo_info(&self, repo: &str) -> Result<RepoInfo, RepoApiError> {
        repoai_session::host::validate_repo_slug(repo)
            .map_err(|error| RepoApiError::InvalidRepo(error.to_string()))?;
        let request = RepoInfoRequest {
            repo: repo.trim().to_string(),
        };
        self.post_json(REPO_INFO_PATH, &request, None).await
    }

    pub async fn fs_tree(&self, request: &TreeRequest) -> Result<DirectoryTree, RepoApiError> {
        self.post_json(FS_TREE_PATH, request, None).await
    }

    pub async fn run_command(
        &self,
        request: &CommandRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<CommandResponse, RepoApiError> {
        info!(command = %request.command, cwd = %request.working_directory, "running command");
        self.post_json(TERMINAL_RUN_PATH, request, cancellation)
            .await
    }

    pub async fn suggest_command(
        &self,
        request: &SuggestionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<SuggestionResponse, RepoApiError> {
        self.post_json(TERMINAL_AI_PATH, request, cancellation)
            .await
    }

    pub async fn read_file(&self, request: &FileRequest) -> Result<FileResponse, RepoApiError> {
        self.post_json(FILE_READ_PATH, request, None).await
    }

    pub async fn write_file(&self, request: &FileRequest) -> Result<FileResponse, RepoApiError> {
        self.post_json(FILE_WRITE_PATH, request, None).await
    }

    pub async fn delete_file(&self, request: &FileRequest) -> Result<FileResponse, RepoApiError> {
        self.post_json(FILE_DELETE_PATH, request, None).await
    }

    /// Draft (or, with `apply`, write) file content from an instruction.
    pub async fn ai_write_file(
        &self,
        request: &AiWriteRequest,
    ) -> Result<AiWriteResponse, RepoApiError> {
        debug!(path = %request.path, apply = request.apply, "requesting ai write");
        self.post_json(FILE_AI_WRITE_PATH, request, None).await
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, RepoApiError> {
        debug!(messages = request.messages.len(), "sending chat turn");
        self.post_json(CHAT_PATH, request, None).await
    }

    /// Start an analysis job and return the open event-stream response.
    ///
    /// The repo slug is validated before anything is sent; a non-2xx answer
    /// is returned as an error and no stream is opened.
    pub async fn open_analysis(
        &self,
        request: &AnalysisRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, RepoApiError> {
        request
            .validate()
            .map_err(|error| RepoApiError::InvalidRepo(error.to_string()))?;

        let builder = self
            .request(Method::POST, ANALYZE_PATH, ACCEPT_EVENT_STREAM)?
            .json(request);
        let response = await_or_cancel(builder.send(), cancellation).await??;
        let status = response.status();
        if !status.is_success() {
            let body = await_or_cancel(response.text(), cancellation)
                .await?
                .unwrap_or_default();
            return Err(error_from_response(status, &body));
        }
        info!(repo = %request.repo, branch = %request.branch, "analysis stream opened");
        Ok(response)
    }

    /// Deliver raw body chunks of an analysis stream, in arrival order.
    pub async fn stream_with_handler<F>(
        &self,
        request: &AnalysisRequest,
        cancellation: Option<&CancellationSignal>,
        on_chunk: F,
    ) -> Result<(), RepoApiError>
    where
        F: FnMut(&[u8]),
    {
        let response = self.open_analysis(request, cancellation).await?;
        pump_body(response, cancellation, on_chunk).await
    }

    /// Run one analysis job through `controller`.
    ///
    /// The controller starts a new session once the backend accepts the job,
    /// so a rejected request leaves the previous session untouched.
    /// `on_update` sees the session after every chunk that dispatched frames.
    pub async fn stream_analysis<F>(
        &self,
        request: &AnalysisRequest,
        controller: &mut AnalysisController,
        cancellation: Option<&CancellationSignal>,
        mut on_update: F,
    ) -> Result<StreamOutcome, RepoApiError>
    where
        F: FnMut(&AnalysisSession),
    {
        let response = self.open_analysis(request, cancellation).await?;
        let id = controller.start();

        let pumped = pump_body(response, cancellation, |chunk| {
            if controller.feed(id, chunk).dispatched > 0 {
                on_update(controller.session());
            }
        })
        .await;

        match pumped {
            Ok(()) => {
                let stats = controller.finish(id);
                let state = controller.session().state();
                if state == AnalysisState::Running {
                    warn!(session_id = id, "analysis stream closed without a terminal frame");
                }
                Ok(StreamOutcome {
                    session_id: id,
                    state,
                    stats,
                })
            }
            Err(RepoApiError::StreamInterrupted(message)) => {
                controller.fail_transport(id, message.clone());
                Err(RepoApiError::StreamInterrupted(message))
            }
            Err(error) => Err(error),
        }
    }
}

async fn pump_body<F>(
    response: Response,
    cancellation: Option<&CancellationSignal>,
    mut on_chunk: F,
) -> Result<(), RepoApiError>
where
    F: FnMut(&[u8]),
{
    let mut bytes = response.bytes_stream();

    loop {
        let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
            break;
        };
        let chunk = chunk.map_err(|error| RepoApiError::StreamInterrupted(error.to_string()))?;
        debug!(len = chunk.len(), "stream chunk");
        on_chunk(&chunk);
    }

    if is_cancelled(cancellation) {
        return Err(RepoApiError::Cancelled);
    }
    Ok(())
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, RepoApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(RepoApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(RepoApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::{await_or_cancel, is_cancelled};
    use crate::error::RepoApiError;

    #[test]
    fn unset_signal_is_not_cancelled() {
        let signal = Arc::new(AtomicBool::new(false));
        assert!(!is_cancelled(None));
        assert!(!is_cancelled(Some(&signal)));
        signal.store(true, Ordering::Release);
        assert!(is_cancelled(Some(&signal)));
    }

    #[tokio::test]
    async fn raised_signal_stops_a_pending_future() {
        let signal = Arc::new(AtomicBool::new(true));
        let result = await_or_cancel(std::future::pending::<()>(), Some(&signal)).await;
        assert!(matches!(result, Err(RepoApiError::Cancelled)));
    }
}
