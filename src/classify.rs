use std::sync::OnceLock;

use regex::Regex;

/// Verbs treated as shell commands when typed directly.
pub const DEFAULT_COMMAND_VERBS: &[&str] = &[
    "ls", "cd", "pwd", "cat", "echo", "git", "npm", "npx", "yarn", "pnpm", "pip", "pip3",
    "python", "python3", "node", "mkdir", "rmdir", "rm", "touch", "mv", "cp", "grep", "find",
    "head", "tail", "wc", "chmod", "curl", "wget", "cargo", "rustc", "make", "docker", "tree",
    "which", "env", "export", "go", "java", "du", "df", "ps", "kill", "tar", "unzip", "sed",
    "awk", "sort", "diff", "./",
];

/// Decides whether a line is a shell command or a natural-language request.
pub trait CommandClassifier {
    fn is_direct_command(&self, input: &str) -> bool;
}

/// Matches lines whose first word is one of a fixed set of verbs.
#[derive(Debug, Clone)]
pub struct AllowListClassifier {
    pattern: Option<Regex>,
}

impl AllowListClassifier {
    pub fn new<I, S>(verbs: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pattern = match verb_pattern(verbs) {
            Some(pattern) => Some(Regex::new(&pattern)?),
            None => None,
        };
        Ok(Self { pattern })
    }

    pub fn matches(&self, input: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(input.trim_start()))
    }
}

impl Default for AllowListClassifier {
    fn default() -> Self {
        static CACHED: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = CACHED
            .get_or_init(|| {
                verb_pattern(DEFAULT_COMMAND_VERBS).and_then(|pattern| Regex::new(&pattern).ok())
            })
            .clone();
        Self { pattern }
    }
}

impl CommandClassifier for AllowListClassifier {
    fn is_direct_command(&self, input: &str) -> bool {
        self.matches(input)
    }
}

fn verb_pattern<I, S>(verbs: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let alternatives: Vec<String> = verbs
        .into_iter()
        .map(|verb| verb.as_ref().trim().to_string())
        .filter(|verb| !verb.is_empty())
        .map(|verb| {
            // Path-like verbs ("./") are prefixes of the command word itself.
            if verb.ends_with('/') {
                regex::escape(&verb)
            } else {
                format!(r"{}(?:\s|$)", regex::escape(&verb))
            }
        })
        .collect();

    if alternatives.is_empty() {
        return None;
    }

    Some(format!("^(?:{})", alternatives.join("|")))
}

/// Shell characters that make a `cd` line more than a plain directory change.
const COMPOUND_MARKERS: &[char] = &[';', '&', '|', '<', '>', '(', ')', '`', '$', '\n'];

/// Returns the target argument when `command` is a plain directory change.
///
/// A bare `cd` yields an empty target. Compound lines (`cd a && make`,
/// `cd a; ls`) and multi-word targets yield `None`.
pub fn directory_change_target(command: &str) -> Option<&str> {
    let trimmed = command.trim();
    let rest = trimmed.strip_prefix("cd")?;
    if rest.is_empty() {
        return Some("");
    }
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let target = rest.trim();
    if target.contains(COMPOUND_MARKERS) || target.contains(char::is_whitespace) {
        return None;
    }
    Some(target)
}
