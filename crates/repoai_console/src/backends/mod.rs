//! Backends the console can drive.
//!
//! Command execution and suggestions follow the dispatch-then-complete shape
//! of [`CommandHost`]: `execute`/`suggest` hand out a [`RequestId`] and the
//! outcome is collected later through [`ConsoleBackend::take_completion`].
//! File, chat and analysis calls return directly.

use std::collections::VecDeque;

use repoai_api::{DirectoryTree, HealthStatus, RepoInfo, StreamOutcome};
use repoai_session::{
    AnalysisController, AnalysisRequest, AnalysisSession, ChatBackend, CommandHost,
    CommandResponse, FileBackend, RequestId, SessionError, SuggestionResponse,
};

use crate::config::ConsoleConfig;

mod http;
mod mock;

pub use http::HttpBackend;
pub use mock::MockBackend;

pub const DEFAULT_BACKEND_ID: &str = "http";
pub const MOCK_BACKEND_ID: &str = "mock";
pub const BACKEND_ENV_VAR: &str = "REPOAI_BACKEND";

/// Result of a dispatched command or suggestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Command {
        request_id: RequestId,
        response: CommandResponse,
    },
    Suggestion {
        request_id: RequestId,
        response: SuggestionResponse,
    },
    Failed {
        request_id: RequestId,
        error: SessionError,
    },
}

pub trait ConsoleBackend: CommandHost + FileBackend + ChatBackend {
    fn backend_id(&self) -> &'static str;

    /// Next finished request, oldest first.
    fn take_completion(&mut self) -> Option<Completion>;

    fn analyze(
        &mut self,
        request: &AnalysisRequest,
        controller: &mut AnalysisController,
        on_update: &mut dyn FnMut(&AnalysisSession),
    ) -> Result<StreamOutcome, SessionError>;

    fn health(&mut self) -> Result<HealthStatus, SessionError>;

    fn repo_info(&mut self, repo: &str) -> Result<RepoInfo, SessionError>;

    fn tree(&mut self, path: &str) -> Result<DirectoryTree, SessionError>;

    fn as_command_host(&mut self) -> &mut dyn CommandHost;

    fn as_file_backend(&mut self) -> &mut dyn FileBackend;

    fn as_chat_backend(&mut self) -> &mut dyn ChatBackend;
}

/// FIFO of finished requests plus the id counter shared by both backends.
#[derive(Debug, Default)]
pub(crate) struct CompletionQueue {
    last_request_id: RequestId,
    pending: VecDeque<Completion>,
}

impl CompletionQueue {
    pub(crate) fn next_id(&mut self) -> RequestId {
        self.last_request_id += 1;
        self.last_request_id
    }

    pub(crate) fn push(&mut self, completion: Completion) {
        self.pending.push_back(completion);
    }

    pub(crate) fn pop(&mut self) -> Option<Completion> {
        self.pending.pop_front()
    }
}

pub fn backend_from_env(config: &ConsoleConfig) -> Result<Box<dyn ConsoleBackend>, String> {
    let backend_id = std::env::var(BACKEND_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    backend_for_id(backend_id.as_deref().unwrap_or(DEFAULT_BACKEND_ID), config)
}

pub fn backend_for_id(
    backend_id: &str,
    config: &ConsoleConfig,
) -> Result<Box<dyn ConsoleBackend>, String> {
    match backend_id {
        DEFAULT_BACKEND_ID => Ok(Box::new(HttpBackend::new(config)?)),
        MOCK_BACKEND_ID => Ok(Box::new(MockBackend::new(config.workspace.clone()))),
        unknown => Err(format!(
            "Unsupported backend '{unknown}'. Available backends: {DEFAULT_BACKEND_ID}, {MOCK_BACKEND_ID}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_for_id_supports_mock() {
        let backend = backend_for_id("mock", &ConsoleConfig::default())
            .expect("mock backend should resolve");
        assert_eq!(backend.backend_id(), "mock");
    }

    #[test]
    fn backend_for_id_builds_http_without_connecting() {
        let backend = backend_for_id("http", &ConsoleConfig::default())
            .expect("http backend should resolve");
        assert_eq!(backend.backend_id(), "http");
    }

    #[test]
    fn backend_for_id_rejects_unknown_backend() {
        let error = match backend_for_id("grpc", &ConsoleConfig::default()) {
            Ok(_) => panic!("unknown backends should fail"),
            Err(error) => error,
        };

        assert!(error.contains("Unsupported backend 'grpc'"));
    }

    #[test]
    fn completion_ids_are_sequential() {
        let mut queue = CompletionQueue::default();
        assert_eq!(queue.next_id(), 1);
        assert_eq!(queue.next_id(), 2);
        assert_eq!(queue.pop(), None);
    }
}
