use repoai_api::{
    DirectoryTree, HealthStatus, RepoApiClient, RepoApiConfig, RepoApiError, RepoInfo,
    StreamOutcome, TreeRequest,
};
use repoai_session::{
    AiWriteRequest, AiWriteResponse, AnalysisController, AnalysisRequest, AnalysisSession,
    ChatBackend, ChatRequest, ChatResponse, CommandHost, CommandRequest, CommandResponse,
    FileBackend, FileRequest, FileResponse, RequestId, SessionError, SuggestionRequest,
    SuggestionResponse,
};
use tokio::runtime::Runtime;
use tracing::warn;

use super::{Completion, CompletionQueue, ConsoleBackend};
use crate::config::ConsoleConfig;

/// Backend reached over HTTP, driven from one current-thread runtime.
///
/// Requests complete before `execute`/`suggest` return; the result is queued
/// and handed back through [`ConsoleBackend::take_completion`].
pub struct HttpBackend {
    client: RepoApiClient,
    runtime: Runtime,
    completions: CompletionQueue,
}

impl HttpBackend {
    pub fn new(config: &ConsoleConfig) -> Result<Self, String> {
        let mut api_config = RepoApiConfig::new(config.base_url.clone());
        if let Some(timeout) = config.timeout {
            api_config = api_config.with_timeout(timeout);
        }
        let client = RepoApiClient::new(api_config).map_err(|error| error.to_string())?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| format!("failed to initialize tokio runtime: {error}"))?;

        Ok(Self {
            client,
            runtime,
            completions: CompletionQueue::default(),
        })
    }

    pub fn client(&self) -> &RepoApiClient {
        &self.client
    }
}

impl CommandHost for HttpBackend {
    fn execute(&mut self, request: CommandRequest) -> Result<RequestId, String> {
        let request_id = self.completions.next_id();
        let result = self
            .runtime
            .block_on(self.client.run_command(&request, None));

        self.completions.push(match result {
            Ok(response) => Completion::Command {
                request_id,
                response,
            },
            // The backend answered; its message belongs in the transcript.
            Err(RepoApiError::Backend { message, .. }) => Completion::Command {
                request_id,
                response: CommandResponse::error(message),
            },
            Err(error) => {
                warn!(request_id, %error, "command request failed");
                Completion::Failed {
                    request_id,
                    error: error.into(),
                }
            }
        });
        Ok(request_id)
    }

    fn suggest(&mut self, request: SuggestionRequest) -> Result<RequestId, String> {
        let request_id = self.completions.next_id();
        let result = self
            .runtime
            .block_on(self.client.suggest_command(&request, None));

        self.completions.push(match result {
            Ok(response) => Completion::Suggestion {
                request_id,
                response,
            },
            Err(RepoApiError::Backend { message, .. }) => Completion::Suggestion {
                request_id,
                response: SuggestionResponse::error(message),
            },
            Err(error) => {
                warn!(request_id, %error, "suggestion request failed");
                Completion::Failed {
                    request_id,
                    error: error.into(),
                }
            }
        });
        Ok(request_id)
    }
}

impl FileBackend for HttpBackend {
    fn read(&mut self, request: FileRequest) -> Result<FileResponse, SessionError> {
        Ok(self.runtime.block_on(self.client.read_file(&request))?)
    }

    fn write(&mut self, request: FileRequest) -> Result<FileResponse, SessionError> {
        Ok(self.runtime.block_on(self.client.write_file(&request))?)
    }

    fn delete(&mut self, request: FileRequest) -> Result<FileResponse, SessionError> {
        Ok(self.runtime.block_on(self.client.delete_file(&request))?)
    }

    fn ai_write(&mut self, request: AiWriteRequest) -> Result<AiWriteResponse, SessionError> {
        Ok(self.runtime.block_on(self.client.ai_write_file(&request))?)
    }
}

impl ChatBackend for HttpBackend {
    fn chat(&mut self, request: ChatRequest) -> Result<ChatResponse, SessionError> {
        Ok(self.runtime.block_on(self.client.chat(&request))?)
    }
}

impl ConsoleBackend for HttpBackend {
    fn backend_id(&self) -> &'static str {
        super::DEFAULT_BACKEND_ID
    }

    fn take_completion(&mut self) -> Option<Completion> {
        self.completions.pop()
    }

    fn analyze(
        &mut self,
        request: &AnalysisRequest,
        controller: &mut AnalysisController,
        on_update: &mut dyn FnMut(&AnalysisSession),
    ) -> Result<StreamOutcome, SessionError> {
        let streamed = self.runtime.block_on(self.client.stream_analysis(
            request,
            controller,
            None,
            |session| on_update(session),
        ));
        Ok(streamed?)
    }

    fn health(&mut self) -> Result<HealthStatus, SessionError> {
        Ok(self.runtime.block_on(self.client.health())?)
    }

    fn repo_info(&mut self, repo: &str) -> Result<RepoInfo, SessionError> {
        Ok(self.runtime.block_on(self.client.repo_info(repo))?)
    }

    fn tree(&mut self, path: &str) -> Result<DirectoryTree, SessionError> {
        Ok(self
            .runtime
            .block_on(self.client.fs_tree(&TreeRequest::new(path)))?)
    }

    fn as_command_host(&mut self) -> &mut dyn CommandHost {
        self
    }

    fn as_file_backend(&mut self) -> &mut dyn FileBackend {
        self
    }

    fn as_chat_backend(&mut self) -> &mut dyn ChatBackend {
        self
    }
}
