//! Request/response contracts for the collaborators the session core drives.
//!
//! Field names follow the backend's JSON wire shapes so transports can send
//! these types as-is.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Identifier the host assigns to an outstanding command or suggestion request.
pub type RequestId = u64;

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_MAX_FILES: u32 = 20;

/// Start of a repository analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub repo: String,
    pub branch: String,
    pub max_files: u32,
    #[serde(rename = "summary")]
    pub want_summary: bool,
    /// File extensions to analyze; empty lets the backend use its defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
}

impl AnalysisRequest {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            branch: DEFAULT_BRANCH.to_string(),
            max_files: DEFAULT_MAX_FILES,
            want_summary: true,
            extensions: Vec::new(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_max_files(mut self, max_files: u32) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_summary(mut self, want_summary: bool) -> Self {
        self.want_summary = want_summary;
        self
    }

    /// Accepts `rs`, `.rs` or ` .RS `; each becomes `.rs`. Blank items are dropped.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .filter_map(|extension| normalize_extension(extension.as_ref()))
            .collect();
        self
    }

    /// `repo` must be `owner/name`; checked before any request goes out.
    pub fn validate(&self) -> Result<(), SessionError> {
        validate_repo_slug(&self.repo)?;
        if self.branch.trim().is_empty() {
            return Err(SessionError::validation("Branch must not be empty"));
        }
        if self.max_files == 0 {
            return Err(SessionError::validation("max_files must be at least 1"));
        }
        Ok(())
    }
}

fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_ascii_lowercase()))
}

pub fn validate_repo_slug(repo: &str) -> Result<(), SessionError> {
    let valid = repo
        .trim()
        .split_once('/')
        .is_some_and(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'));
    if valid {
        Ok(())
    } else {
        Err(SessionError::validation("Use owner/repo format"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(rename = "cwd")]
    pub working_directory: String,
}

/// Outcome of one command execution as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub returncode: Option<i32>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: Some(stdout.into()),
            returncode: Some(0),
            ..Self::default()
        }
    }

    pub fn failed(stderr: impl Into<String>, returncode: i32) -> Self {
        Self {
            stderr: Some(stderr.into()),
            returncode: Some(returncode),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Success needs no error and a zero exit code; without an exit code an
    /// empty stderr counts as success.
    pub fn succeeded(&self) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.returncode {
            Some(code) => code == 0,
            None => self
                .stderr
                .as_deref()
                .is_none_or(|stderr| stderr.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub prompt: String,
    #[serde(rename = "cwd")]
    pub working_directory: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SuggestionResponse {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            command: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRequest {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileRequest {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
        }
    }

    pub fn with_content(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// AI-assisted write: generate new content for `path` from `instruction`.
///
/// With `apply` unset the backend only returns a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiWriteRequest {
    pub path: String,
    pub instruction: String,
    #[serde(default)]
    pub apply: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiWriteResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub applied: Option<bool>,
    /// File content before the draft; absent for new files.
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Whole conversation so far; the backend is stateless between turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            error: None,
        }
    }
}

/// Execution and suggestion backend driven by a terminal session.
///
/// Both calls only dispatch; results come back through
/// `TerminalSession::on_command_finished` and
/// `TerminalSession::on_suggestion_received` carrying the returned id.
pub trait CommandHost {
    fn execute(&mut self, request: CommandRequest) -> Result<RequestId, String>;
    fn suggest(&mut self, request: SuggestionRequest) -> Result<RequestId, String>;
}

/// File read/write/delete collaborator. Paths are checked by the backend.
pub trait FileBackend {
    fn read(&mut self, request: FileRequest) -> Result<FileResponse, SessionError>;
    fn write(&mut self, request: FileRequest) -> Result<FileResponse, SessionError>;
    fn delete(&mut self, request: FileRequest) -> Result<FileResponse, SessionError>;
    fn ai_write(&mut self, request: AiWriteRequest) -> Result<AiWriteResponse, SessionError>;
}

/// Conversational assistant collaborator.
pub trait ChatBackend {
    fn chat(&mut self, request: ChatRequest) -> Result<ChatResponse, SessionError>;
}

/// Yes/no question put to the human before a consequential action.
pub trait ConfirmationProvider {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Fixed answer, for scripted runs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlwaysAnswer(pub bool);

impl ConfirmationProvider for AlwaysAnswer {
    fn confirm(&mut self, _prompt: &str) -> bool {
        self.0
    }
}
