//! HTTP transport for the RepoAI backend.
//!
//! Plain calls (`/terminal/run`, `/terminal/ai`, `/file/*`, `/fs/tree`,
//! `/repo/info`, `/health`) are JSON request/response. `/analyze` answers with
//! a chunked `data:` event stream; [`RepoApiClient::stream_analysis`] feeds its
//! body straight into a [`repoai_session::AnalysisController`] chunk by chunk.
//!
//! Nothing here retries: a broken connection is reported once and the caller
//! decides what to do next.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::{CancellationSignal, RepoApiClient, StreamOutcome};
pub use config::RepoApiConfig;
pub use error::RepoApiError;
pub use payload::{DirectoryTree, HealthStatus, RepoInfo, TreeRequest};
pub use url::{normalize_base_url, DEFAULT_BASE_URL};
