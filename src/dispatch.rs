use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::stream::{StreamDecoder, DATA_MARKER};

/// Typed analysis event decoded from one `data:` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Progress {
        current: u64,
        total: u64,
        file: String,
    },
    FileResult {
        file: String,
        analysis: String,
    },
    Summary {
        summary: String,
    },
    Done {
        total_analyzed: u64,
    },
    Error {
        message: String,
    },
    /// Informational backend status line.
    Status {
        message: String,
    },
    FileSkip {
        file: String,
        reason: String,
    },
}

impl Frame {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::FileResult { .. } => "file_result",
            Self::Summary { .. } => "summary",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
            Self::Status { .. } => "status",
            Self::FileSkip { .. } => "file_skip",
        }
    }
}

const KNOWN_FRAME_TYPES: &[&str] = &[
    "progress",
    "file_result",
    "summary",
    "done",
    "error",
    "status",
    "file_skip",
];

/// Why a candidate line produced no frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    MissingMarker,
    InvalidJson,
    MissingType,
    UnknownType(String),
    InvalidPayload(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameParse {
    Frame(Frame),
    Dropped(DropReason),
}

/// Parse one candidate line (marker included) into a frame.
pub fn parse_frame(line: &str) -> FrameParse {
    let Some(payload) = line.strip_prefix(DATA_MARKER) else {
        return FrameParse::Dropped(DropReason::MissingMarker);
    };

    let Ok(value) = serde_json::from_str::<Value>(payload.trim()) else {
        return FrameParse::Dropped(DropReason::InvalidJson);
    };

    let Some(frame_type) = value.get("type").and_then(Value::as_str) else {
        return FrameParse::Dropped(DropReason::MissingType);
    };

    if !KNOWN_FRAME_TYPES.contains(&frame_type) {
        return FrameParse::Dropped(DropReason::UnknownType(frame_type.to_string()));
    }

    let frame_type = frame_type.to_string();
    match serde_json::from_value::<Frame>(value) {
        Ok(frame) => FrameParse::Frame(frame),
        Err(_) => FrameParse::Dropped(DropReason::InvalidPayload(frame_type)),
    }
}

/// Receiver of dispatched frames, one method per frame type.
///
/// Informational frames default to no-ops so handlers only opt into what they
/// track.
pub trait FrameHandler {
    fn on_progress(&mut self, current: u64, total: u64, file: &str);
    fn on_file_result(&mut self, file: &str, analysis: &str);
    fn on_summary(&mut self, summary: &str);
    fn on_done(&mut self, total_analyzed: u64);
    fn on_error(&mut self, message: &str);

    fn on_status(&mut self, _message: &str) {}

    fn on_file_skip(&mut self, _file: &str, _reason: &str) {}
}

/// Route a frame to exactly one handler method.
pub fn dispatch(frame: &Frame, handler: &mut dyn FrameHandler) {
    match frame {
        Frame::Progress {
            current,
            total,
            file,
        } => handler.on_progress(*current, *total, file),
        Frame::FileResult { file, analysis } => handler.on_file_result(file, analysis),
        Frame::Summary { summary } => handler.on_summary(summary),
        Frame::Done { total_analyzed } => handler.on_done(*total_analyzed),
        Frame::Error { message } => handler.on_error(message),
        Frame::Status { message } => handler.on_status(message),
        Frame::FileSkip { file, reason } => handler.on_file_skip(file, reason),
    }
}

/// Counters for one decode/dispatch pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: usize,
    pub dropped: usize,
}

/// Decoder and dispatcher glued into one synchronous loop.
///
/// Each frame's handler returns before the next line is parsed.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    decoder: StreamDecoder,
    stats: DispatchStats,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8], handler: &mut dyn FrameHandler) -> DispatchStats {
        let mut batch = DispatchStats::default();

        for line in self.decoder.feed(chunk) {
            match parse_frame(&line) {
                FrameParse::Frame(frame) => {
                    dispatch(&frame, handler);
                    batch.dispatched += 1;
                }
                FrameParse::Dropped(reason) => {
                    debug!(?reason, "dropping stream frame");
                    batch.dropped += 1;
                }
            }
        }

        self.stats.dispatched += batch.dispatched;
        self.stats.dropped += batch.dropped;
        batch
    }

    /// Close the stream; any unterminated fragment is discarded.
    pub fn finish(&mut self) -> DispatchStats {
        self.decoder.finish();
        self.stats
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}
