use thiserror::Error;

/// Failures surfaced by the session core.
///
/// Malformed stream frames are deliberately absent here: they are reported as
/// [`crate::dispatch::DropReason`] values and never abort a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The connection or stream carrying a request failed.
    #[error("connection failed: {0}")]
    Transport(String),

    /// The backend answered with an explicit error.
    #[error("{0}")]
    Application(String),

    /// Input was rejected before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// A request is already outstanding for this terminal session.
    #[error("a command is already running; wait for it to finish")]
    Busy,
}

impl SessionError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::Application(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Terminal errors end the unit of work they occurred in.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Application(_))
    }
}
