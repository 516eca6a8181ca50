use crate::error::RepoApiError;

/// Default backend address used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const ANALYZE_PATH: &str = "/analyze";
pub const HEALTH_PATH: &str = "/health";
pub const CHAT_PATH: &str = "/chat";
pub const TERMINAL_RUN_PATH: &str = "/terminal/run";
pub const TERMINAL_AI_PATH: &str = "/terminal/ai";
pub const FILE_READ_PATH: &str = "/file/read";
pub const FILE_WRITE_PATH: &str = "/file/write";
pub const FILE_DELETE_PATH: &str = "/file/delete";
pub const FILE_AI_WRITE_PATH: &str = "/file/ai-write";
pub const FS_TREE_PATH: &str = "/fs/tree";
pub const REPO_INFO_PATH: &str = "/repo/info";

/// Normalize a configured base URL.
///
/// Rules:
/// 1) blank input falls back to [`DEFAULT_BASE_URL`]
/// 2) trailing slashes are removed
/// 3) only `http` and `https` schemes are accepted
pub fn normalize_base_url(input: &str) -> Result<String, RepoApiError> {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    let has_host = ["http://", "https://"]
        .iter()
        .any(|scheme| trimmed.len() > scheme.len() && trimmed.starts_with(scheme));
    if !has_host {
        return Err(RepoApiError::InvalidBaseUrl(input.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Join a normalized base URL and an endpoint path.
pub fn endpoint_url(base_url: &str, path: &str) -> Result<String, RepoApiError> {
    let base = normalize_base_url(base_url)?;
    Ok(format!("{base}/{}", path.trim_start_matches('/')))
}
