use serde::{Deserialize, Serialize};

pub const DEFAULT_TREE_DEPTH: u32 = 2;

/// Answer of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoInfoRequest {
    pub repo: String,
}

/// Repository metadata as reported by `POST /repo/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stars: Option<u64>,
    #[serde(default)]
    pub forks: Option<u64>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRequest {
    pub path: String,
    pub depth: u32,
}

impl TreeRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            depth: DEFAULT_TREE_DEPTH,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }
}

/// Sorted listing returned by `POST /fs/tree`, one path per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DirectoryTree {
    #[serde(default)]
    pub tree: Vec<String>,
    #[serde(default)]
    pub path: String,
}
