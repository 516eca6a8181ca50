//! Client-side session core for the RepoAI console.
//!
//! Two paths live here:
//!
//! - analysis: [`StreamDecoder`] splits the chunked `data:` event stream into
//!   lines, [`EventDispatcher`] parses and routes them in order, and
//!   [`AnalysisSession`] accumulates progress, results and the terminal
//!   outcome of one job;
//! - terminal: [`TerminalSession`] classifies input as shell command or AI
//!   request, runs one request at a time, and keeps AI suggestions behind
//!   [`CommandApprovalGate`] until a human approves them.
//!
//! [`ChatSession`] keeps a free-form conversation with the assistant and
//! [`FileActions`] wraps file reads, writes, deletes and AI-drafted edits.
//!
//! Nothing in this crate performs I/O. Transports and prompts plug in through
//! the traits in [`host`].

pub mod analysis;
pub mod approval;
pub mod chat;
pub mod classify;
pub mod dispatch;
pub mod error;
pub mod files;
pub mod host;
pub mod stream;
pub mod terminal;

pub use analysis::{
    AnalysisController, AnalysisSession, AnalysisState, FileResult, Progress, SessionId,
    SkippedFile, Transition,
};
pub use approval::{CommandApprovalGate, CommandProposal, GateEvent, GateState};
pub use chat::ChatSession;
pub use classify::{AllowListClassifier, CommandClassifier, DEFAULT_COMMAND_VERBS};
pub use dispatch::{
    dispatch, parse_frame, DispatchStats, DropReason, EventDispatcher, Frame, FrameHandler,
    FrameParse,
};
pub use error::SessionError;
pub use files::{DeleteOutcome, FileActions, FileDraft, SaveOutcome};
pub use host::{
    AiWriteRequest, AiWriteResponse, AlwaysAnswer, AnalysisRequest, ChatBackend, ChatMessage,
    ChatRequest, ChatResponse, ChatRole, CommandHost, CommandRequest, CommandResponse,
    ConfirmationProvider, FileBackend, FileRequest, FileResponse, RequestId, SuggestionRequest,
    SuggestionResponse,
};
pub use stream::{StreamDecoder, DATA_MARKER};
pub use terminal::{
    Activity, EntryKind, HistoryEntry, InputMode, Submission, TerminalSession,
    DEFAULT_WORKING_DIRECTORY,
};
