use std::collections::BTreeMap;

use crate::config::RepoApiConfig;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_USER_AGENT: &str = "User-Agent";

pub const ACCEPT_JSON: &str = "application/json";
pub const ACCEPT_EVENT_STREAM: &str = "text/event-stream";

/// Build a deterministic header map for backend requests.
///
/// `accept` differs between plain JSON calls and the analysis stream; extra
/// headers from the config are applied last and win.
pub fn build_headers(config: &RepoApiConfig, accept: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_ACCEPT.to_owned(), accept.to_owned());
    headers.insert(HEADER_CONTENT_TYPE.to_owned(), ACCEPT_JSON.to_owned());

    let user_agent = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), user_agent);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    headers
}

/// `repoai/<version> (<os>; <arch>)`, from the compile target.
pub fn default_user_agent() -> String {
    format!(
        "repoai/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        display_arch(std::env::consts::ARCH)
    )
}

fn display_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "x86" => "ia32",
        "aarch64" => "arm64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{default_user_agent, display_arch};

    #[test]
    fn arch_names_are_shortened() {
        assert_eq!(display_arch("x86_64"), "x64");
        assert_eq!(display_arch("aarch64"), "arm64");
        assert_eq!(display_arch("riscv64"), "riscv64");
    }

    #[test]
    fn user_agent_carries_the_crate_version() {
        let ua = default_user_agent();
        assert!(ua.starts_with(concat!("repoai/", env!("CARGO_PKG_VERSION"), " (")), "{ua}");
        assert!(ua.contains(std::env::consts::OS), "{ua}");
    }
}
