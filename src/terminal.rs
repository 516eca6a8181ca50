use tracing::{debug, info};

use crate::approval::{CommandApprovalGate, CommandProposal};
use crate::classify::{directory_change_target, AllowListClassifier, CommandClassifier};
use crate::error::SessionError;
use crate::host::{
    CommandHost, CommandRequest, CommandResponse, ConfirmationProvider, RequestId,
    SuggestionRequest, SuggestionResponse,
};

pub const DEFAULT_WORKING_DIRECTORY: &str = "/workspaces";
const AI_REFUSAL_PREFIX: &str = "ERROR:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Classify each line as command or natural-language request.
    Auto,
    /// Treat every line as a shell command.
    Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    CommandEcho,
    AiPrompt,
    AiSuggestion,
    Stdout,
    Stderr,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub kind: EntryKind,
    pub text: String,
}

/// Request currently outstanding for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Executing {
        request_id: RequestId,
        command: String,
        /// Set for a plain `cd`; resolved with a follow-up `cd <target> && pwd`.
        directory_target: Option<String>,
    },
    ResolvingDirectory {
        request_id: RequestId,
    },
    Suggesting {
        request_id: RequestId,
    },
}

/// What a submitted line turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Executing(RequestId),
    Suggesting(RequestId),
}

/// Free-text terminal: routes lines to the shell or the AI, one request at a
/// time, and owns the working directory and the history log.
pub struct TerminalSession {
    working_directory: String,
    mode: InputMode,
    activity: Activity,
    history: Vec<HistoryEntry>,
    gate: CommandApprovalGate,
    classifier: Box<dyn CommandClassifier + Send>,
}

impl Default for TerminalSession {
    fn default() -> Self {
        Self::new(DEFAULT_WORKING_DIRECTORY)
    }
}

impl TerminalSession {
    pub fn new(working_directory: impl Into<String>) -> Self {
        Self::with_classifier(working_directory, AllowListClassifier::default())
    }

    pub fn with_classifier(
        working_directory: impl Into<String>,
        classifier: impl CommandClassifier + Send + 'static,
    ) -> Self {
        Self {
            working_directory: working_directory.into(),
            mode: InputMode::Auto,
            activity: Activity::Idle,
            history: Vec::new(),
            gate: CommandApprovalGate::new(),
            classifier: Box::new(classifier),
        }
    }

    pub fn working_directory(&self) -> &str {
        &self.working_directory
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> InputMode {
        self.mode = match self.mode {
            InputMode::Auto => InputMode::Shell,
            InputMode::Shell => InputMode::Auto,
        };
        self.mode
    }

    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    pub fn is_busy(&self) -> bool {
        self.activity != Activity::Idle
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn pending_proposal(&self) -> Option<&CommandProposal> {
        self.gate.pending()
    }

    /// Appends an info line without touching control state.
    pub fn push_info(&mut self, text: impl Into<String>) {
        self.push(EntryKind::Info, text.into());
    }

    pub fn submit(
        &mut self,
        input: &str,
        host: &mut dyn CommandHost,
    ) -> Result<Submission, SessionError> {
        let line = input.trim();
        if line.is_empty() {
            return Err(SessionError::validation("Command must not be empty"));
        }
        if self.is_busy() {
            return Err(SessionError::Busy);
        }

        let direct = self.mode == InputMode::Shell || self.classifier.is_direct_command(line);
        if direct {
            let cwd = self.working_directory.clone();
            return self
                .run_command(line.to_string(), cwd, host)
                .map(Submission::Executing);
        }

        self.request_suggestion(line.to_string(), host)
            .map(Submission::Suggesting)
    }

    /// Execute the pending proposal, if any.
    ///
    /// While another request is outstanding the proposal stays pending.
    pub fn approve(&mut self, host: &mut dyn CommandHost) -> Result<Option<RequestId>, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        let Some(proposal) = self.gate.approve() else {
            return Ok(None);
        };

        self.run_command(proposal.command, proposal.working_directory, host)
            .map(Some)
    }

    pub fn reject(&mut self) -> Option<CommandProposal> {
        let discarded = self.gate.cancel();
        if let Some(proposal) = &discarded {
            self.push(
                EntryKind::Info,
                format!("Discarded suggestion: {}", proposal.command),
            );
        }
        discarded
    }

    /// Ask `confirm` about the pending proposal and approve or reject it.
    pub fn resolve_pending(
        &mut self,
        confirm: &mut dyn ConfirmationProvider,
        host: &mut dyn CommandHost,
    ) -> Result<Option<RequestId>, SessionError> {
        let Some(proposal) = self.gate.pending() else {
            return Ok(None);
        };
        let prompt = format!(
            "Run `{}` in {}?",
            proposal.command, proposal.working_directory
        );

        if confirm.confirm(&prompt) {
            self.approve(host)
        } else {
            self.reject();
            Ok(None)
        }
    }

    /// Fold a finished execution into the history.
    ///
    /// Returns `false` when `request_id` is not the outstanding request.
    pub fn on_command_finished(
        &mut self,
        request_id: RequestId,
        response: CommandResponse,
        host: &mut dyn CommandHost,
    ) -> bool {
        match self.activity.clone() {
            Activity::Executing {
                request_id: active,
                command,
                directory_target,
            } if active == request_id => {
                self.activity = Activity::Idle;
                let succeeded = response.succeeded();
                self.record_output(response);
                if let Some(target) = directory_target.filter(|_| succeeded) {
                    debug!(%command, %target, "resolving working directory");
                    self.resolve_directory(&target, host);
                }
                true
            }
            Activity::ResolvingDirectory { request_id: active } if active == request_id => {
                self.activity = Activity::Idle;
                self.apply_resolved_directory(response);
                true
            }
            _ => {
                debug!(request_id, "ignoring stale command result");
                false
            }
        }
    }

    pub fn on_suggestion_received(&mut self, request_id: RequestId, response: SuggestionResponse) -> bool {
        if self.activity != (Activity::Suggesting { request_id }) {
            debug!(request_id, "ignoring stale suggestion");
            return false;
        }
        self.activity = Activity::Idle;

        if let Some(error) = response.error {
            self.push(EntryKind::Error, error);
            return true;
        }

        let command = response.command.unwrap_or_default().trim().to_string();
        if command.is_empty() {
            self.push(EntryKind::Error, "AI returned no command".to_string());
            return true;
        }
        if command.starts_with(AI_REFUSAL_PREFIX) {
            self.push(EntryKind::Error, command);
            return true;
        }

        let proposal = CommandProposal::new(command.clone(), self.working_directory.clone());
        self.gate.propose(proposal);
        self.push(EntryKind::AiSuggestion, command);
        true
    }

    /// The outstanding request failed before producing a response.
    pub fn on_request_failed(&mut self, request_id: RequestId, error: &SessionError) -> bool {
        let active = match &self.activity {
            Activity::Idle => None,
            Activity::Executing { request_id, .. }
            | Activity::ResolvingDirectory { request_id }
            | Activity::Suggesting { request_id } => Some(*request_id),
        };
        if active != Some(request_id) {
            return false;
        }

        self.activity = Activity::Idle;
        self.push(EntryKind::Error, error.to_string());
        true
    }

    fn run_command(
        &mut self,
        command: String,
        working_directory: String,
        host: &mut dyn CommandHost,
    ) -> Result<RequestId, SessionError> {
        self.push(EntryKind::CommandEcho, command.clone());
        let directory_target = directory_change_target(&command).map(ToString::to_string);
        let request = CommandRequest {
            command: command.clone(),
            working_directory,
        };

        match host.execute(request) {
            Ok(request_id) => {
                info!(request_id, %command, "command dispatched");
                self.activity = Activity::Executing {
                    request_id,
                    command,
                    directory_target,
                };
                Ok(request_id)
            }
            Err(error) => {
                self.push(EntryKind::Error, error.clone());
                Err(SessionError::Application(error))
            }
        }
    }

    fn request_suggestion(
        &mut self,
        prompt: String,
        host: &mut dyn CommandHost,
    ) -> Result<RequestId, SessionError> {
        self.push(EntryKind::AiPrompt, prompt.clone());
        let request = SuggestionRequest {
            prompt,
            working_directory: self.working_directory.clone(),
            dry_run: true,
        };

        match host.suggest(request) {
            Ok(request_id) => {
                self.activity = Activity::Suggesting { request_id };
                Ok(request_id)
            }
            Err(error) => {
                self.push(EntryKind::Error, error.clone());
                Err(SessionError::Application(error))
            }
        }
    }

    /// Re-enter `target` from the current directory and report where that
    /// lands. Only the bare `cd` is repeated, never the submitted line.
    fn resolve_directory(&mut self, target: &str, host: &mut dyn CommandHost) {
        let command = if target.is_empty() {
            "cd && pwd".to_string()
        } else {
            format!("cd {target} && pwd")
        };
        let request = CommandRequest {
            command,
            working_directory: self.working_directory.clone(),
        };

        match host.execute(request) {
            Ok(request_id) => {
                self.activity = Activity::ResolvingDirectory { request_id };
            }
            Err(error) => {
                self.push(
                    EntryKind::Error,
                    format!("Could not resolve working directory: {error}"),
                );
            }
        }
    }

    fn apply_resolved_directory(&mut self, response: CommandResponse) {
        let resolved = response
            .stdout
            .as_deref()
            .filter(|_| response.succeeded())
            .and_then(|stdout| stdout.lines().rev().map(str::trim).find(|line| !line.is_empty()))
            .map(ToString::to_string);

        match resolved {
            Some(directory) => {
                info!(%directory, "working directory changed");
                self.working_directory = directory;
                self.push(
                    EntryKind::Info,
                    format!("Working directory: {}", self.working_directory),
                );
            }
            None => {
                let reason = response
                    .error
                    .or(response.stderr)
                    .unwrap_or_else(|| "no directory reported".to_string());
                self.push(
                    EntryKind::Error,
                    format!("Could not resolve working directory: {}", reason.trim()),
                );
            }
        }
    }

    fn record_output(&mut self, response: CommandResponse) {
        if let Some(stdout) = response.stdout.filter(|text| !text.is_empty()) {
            self.push(EntryKind::Stdout, stdout);
        }
        if let Some(stderr) = response.stderr.filter(|text| !text.is_empty()) {
            self.push(EntryKind::Stderr, stderr);
        }
        if let Some(error) = response.error {
            self.push(EntryKind::Error, error);
        }
    }

    fn push(&mut self, kind: EntryKind, text: String) {
        self.history.push(HistoryEntry { kind, text });
    }
}
