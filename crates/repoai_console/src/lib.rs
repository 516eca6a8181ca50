//! Line-oriented RepoAI console.
//!
//! ## Backend bootstrap
//!
//! - `REPOAI_BACKEND=http` (default) talks to the backend at the configured
//!   base URL.
//! - `REPOAI_BACKEND=mock` runs against a deterministic in-memory backend.
//!
//! `REPOAI_CONFIG_PATH` may point at a UTF-8 JSON file:
//!
//! ```json
//! {
//!   "base_url": "http://localhost:8000",
//!   "timeout_sec": 30,
//!   "workspace": "/workspaces"
//! }
//! ```
//!
//! Every field is optional, `timeout_sec` must be > 0, and unknown fields are
//! rejected. `REPOAI_BASE_URL` and `REPOAI_WORKSPACE` override the file.
//!
//! Logs go to stderr, filtered by `REPOAI_LOG` (default `warn`).

pub mod backends;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod console;
pub mod logging;

pub use console::{Console, Flow};
