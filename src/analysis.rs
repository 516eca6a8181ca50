use tracing::{info, warn};

use crate::dispatch::{dispatch, DispatchStats, EventDispatcher, Frame, FrameHandler};
use crate::error::SessionError;

/// Identifier for one analysis job started by an [`AnalysisController`].
pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl AnalysisState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub current_item: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: String,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Outcome of feeding one frame to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

/// Aggregate state of one analysis job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSession {
    state: AnalysisState,
    progress: Progress,
    results: Vec<FileResult>,
    summary: Option<String>,
    error_message: Option<String>,
    status: Option<String>,
    skipped: Vec<SkippedFile>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            state: AnalysisState::Idle,
            progress: Progress::default(),
            results: Vec::new(),
            summary: None,
            error_message: None,
            status: None,
            skipped: Vec::new(),
        }
    }

    /// Begin a fresh job, discarding everything the previous one accumulated.
    pub fn start(&mut self) {
        *self = Self {
            state: AnalysisState::Running,
            ..Self::new()
        };
    }

    /// Apply one frame. Frames outside `Running` leave the session untouched.
    pub fn apply(&mut self, frame: &Frame) -> Transition {
        if self.state != AnalysisState::Running {
            return Transition::Ignored;
        }

        if matches!(frame, Frame::Done { .. }) && self.summary.is_some() {
            return Transition::Ignored;
        }

        dispatch(frame, self);
        Transition::Applied
    }

    /// Consuming form of [`AnalysisSession::apply`].
    pub fn transition(mut self, frame: &Frame) -> Self {
        self.apply(frame);
        self
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn results(&self) -> &[FileResult] {
        &self.results
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Latest informational status line from the backend.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    fn is_running(&self) -> bool {
        self.state == AnalysisState::Running
    }
}

pub fn fallback_completion_notice(total_analyzed: u64) -> String {
    format!("Analysis complete: {total_analyzed} file(s) analyzed.")
}

impl FrameHandler for AnalysisSession {
    fn on_progress(&mut self, current: u64, total: u64, file: &str) {
        if !self.is_running() {
            return;
        }
        self.progress = Progress {
            current,
            total,
            current_item: file.to_string(),
        };
    }

    fn on_file_result(&mut self, file: &str, analysis: &str) {
        if !self.is_running() {
            return;
        }
        // Duplicate paths are kept; results are an arrival-order log.
        self.results.push(FileResult {
            path: file.to_string(),
            analysis: analysis.to_string(),
        });
    }

    fn on_summary(&mut self, summary: &str) {
        if !self.is_running() {
            return;
        }
        self.summary = Some(summary.to_string());
        self.state = AnalysisState::Completed;
        info!(results = self.results.len(), "analysis completed with summary");
    }

    fn on_done(&mut self, total_analyzed: u64) {
        if !self.is_running() || self.summary.is_some() {
            return;
        }
        self.summary = Some(fallback_completion_notice(total_analyzed));
        self.state = AnalysisState::Completed;
        info!(total_analyzed, "analysis completed");
    }

    fn on_error(&mut self, message: &str) {
        if !self.is_running() {
            return;
        }
        self.error_message = Some(message.to_string());
        self.state = AnalysisState::Failed;
        warn!(%message, "analysis failed");
    }

    fn on_status(&mut self, message: &str) {
        if !self.is_running() {
            return;
        }
        self.status = Some(message.to_string());
    }

    fn on_file_skip(&mut self, file: &str, reason: &str) {
        if !self.is_running() {
            return;
        }
        self.skipped.push(SkippedFile {
            path: file.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Owner of the single current analysis session for a client context.
///
/// Every `start` issues a new [`SessionId`]; input tagged with an older id is
/// ignored, which is how an abandoned stream is cut off.
#[derive(Debug, Default)]
pub struct AnalysisController {
    last_id: SessionId,
    current: Option<SessionId>,
    session: AnalysisSession,
    dispatcher: EventDispatcher,
    transport_error: Option<String>,
}

impl AnalysisController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) -> SessionId {
        self.last_id += 1;
        let id = self.last_id;
        if let Some(previous) = self.current.replace(id) {
            if self.session.state() == AnalysisState::Running {
                info!(previous, "abandoning running analysis session");
            }
        }
        self.session.start();
        self.dispatcher = EventDispatcher::new();
        self.transport_error = None;
        info!(session_id = id, "analysis session started");
        id
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.current
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        self.current == Some(id)
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    /// Feed a raw transport chunk belonging to session `id`.
    pub fn feed(&mut self, id: SessionId, chunk: &[u8]) -> DispatchStats {
        if !self.is_current(id) {
            return DispatchStats::default();
        }
        self.dispatcher.feed(chunk, &mut self.session)
    }

    /// Apply an already-decoded frame belonging to session `id`.
    pub fn apply_frame(&mut self, id: SessionId, frame: &Frame) -> Transition {
        if !self.is_current(id) {
            return Transition::Ignored;
        }
        self.session.apply(frame)
    }

    /// The stream for `id` ended normally.
    pub fn finish(&mut self, id: SessionId) -> DispatchStats {
        if !self.is_current(id) {
            return DispatchStats::default();
        }
        self.dispatcher.finish()
    }

    /// Record a connection failure for `id`.
    ///
    /// Returns the error only the first time, so it is surfaced exactly once.
    /// The session itself keeps its state; a retry means a new `start`.
    pub fn fail_transport(
        &mut self,
        id: SessionId,
        message: impl Into<String>,
    ) -> Option<SessionError> {
        if !self.is_current(id) || self.transport_error.is_some() {
            return None;
        }
        let message = message.into();
        warn!(session_id = id, %message, "analysis stream failed");
        self.transport_error = Some(message.clone());
        Some(SessionError::Transport(message))
    }

    pub fn transport_error(&self) -> Option<&str> {
        self.transport_error.as_deref()
    }
}
