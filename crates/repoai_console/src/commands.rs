use repoai_session::host::{DEFAULT_BRANCH, DEFAULT_MAX_FILES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Clear,
    Mode,
    Approve,
    Reject,
    Cwd,
    Analyze {
        repo: String,
        branch: String,
        max_files: u32,
        extensions: Vec<String>,
    },
    Info {
        repo: String,
    },
    Tree {
        path: Option<String>,
    },
    Read {
        path: String,
    },
    Write {
        path: String,
        content: String,
    },
    Delete {
        path: String,
    },
    AiWrite {
        path: String,
        instruction: String,
    },
    Chat {
        message: String,
    },
    Health,
    Quit,
    /// Known command with missing or malformed arguments; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub const HELP_TEXT: &str = "\
/help                               show this help
/clear                              clear the transcript and the chat
/mode                               toggle auto/shell input mode
/approve, /reject                   run or discard the suggested command
/cwd                                show the working directory
/analyze owner/repo [branch] [max] [.rs,.md]
                                    analyze a GitHub repository
/info owner/repo                    show repository metadata
/tree [path]                        list a directory
/read <path>                        print a file
/write <path> <content>             write a file
/delete <path>                      delete a file (asks first)
/ai-write <path> <instruction>      draft a file with the AI (asks before saving)
/chat <message>                     talk to the assistant
/health                             check the backend
/quit                               exit
anything else runs as a command or goes to the AI, depending on the mode";

const ANALYZE_USAGE: &str = "usage: /analyze owner/repo [branch] [max_files] [ext,ext]";
const INFO_USAGE: &str = "usage: /info owner/repo";
const READ_USAGE: &str = "usage: /read <path>";
const WRITE_USAGE: &str = "usage: /write <path> <content>";
const DELETE_USAGE: &str = "usage: /delete <path>";
const AI_WRITE_USAGE: &str = "usage: /ai-write <path> <instruction>";
const CHAT_USAGE: &str = "usage: /chat <message>";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };
    let mut args = rest.split_whitespace();

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/clear" => SlashCommand::Clear,
        "/mode" => SlashCommand::Mode,
        "/approve" => SlashCommand::Approve,
        "/reject" => SlashCommand::Reject,
        "/cwd" => SlashCommand::Cwd,
        "/health" => SlashCommand::Health,
        "/quit" | "/exit" => SlashCommand::Quit,
        "/analyze" => parse_analyze(args),
        "/info" => match args.next() {
            Some(repo) => SlashCommand::Info {
                repo: repo.to_string(),
            },
            None => SlashCommand::Usage(INFO_USAGE),
        },
        "/tree" => SlashCommand::Tree {
            path: args.next().map(str::to_string),
        },
        "/read" => match args.next() {
            Some(path) => SlashCommand::Read {
                path: path.to_string(),
            },
            None => SlashCommand::Usage(READ_USAGE),
        },
        "/delete" => match args.next() {
            Some(path) => SlashCommand::Delete {
                path: path.to_string(),
            },
            None => SlashCommand::Usage(DELETE_USAGE),
        },
        // Content is everything after the path, spacing preserved.
        "/write" => match rest.split_once(char::is_whitespace) {
            Some((path, content)) => SlashCommand::Write {
                path: path.to_string(),
                content: content.trim_start().to_string(),
            },
            None => SlashCommand::Usage(WRITE_USAGE),
        },
        "/ai-write" => match rest.split_once(char::is_whitespace) {
            Some((path, instruction)) => SlashCommand::AiWrite {
                path: path.to_string(),
                instruction: instruction.trim().to_string(),
            },
            None => SlashCommand::Usage(AI_WRITE_USAGE),
        },
        "/chat" if rest.is_empty() => SlashCommand::Usage(CHAT_USAGE),
        "/chat" => SlashCommand::Chat {
            message: rest.to_string(),
        },
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}

fn parse_analyze<'a>(mut args: impl Iterator<Item = &'a str>) -> SlashCommand {
    let Some(repo) = args.next() else {
        return SlashCommand::Usage(ANALYZE_USAGE);
    };
    let branch = args.next().unwrap_or(DEFAULT_BRANCH).to_string();
    let max_files = match args.next() {
        Some(raw) => match raw.parse::<u32>() {
            Ok(value) if value > 0 => value,
            _ => return SlashCommand::Usage(ANALYZE_USAGE),
        },
        None => DEFAULT_MAX_FILES,
    };
    let extensions = args
        .next()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|extension| !extension.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if args.next().is_some() {
        return SlashCommand::Usage(ANALYZE_USAGE);
    }

    SlashCommand::Analyze {
        repo: repo.to_string(),
        branch,
        max_files,
        extensions,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_slash_command, SlashCommand};

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("ls -la"), None);
        assert_eq!(parse_slash_command("  show me the readme"), None);
    }

    #[test]
    fn analyze_fills_defaults() {
        assert_eq!(
            parse_slash_command("/analyze octo/cli"),
            Some(SlashCommand::Analyze {
                repo: "octo/cli".to_string(),
                branch: "main".to_string(),
                max_files: 20,
                extensions: Vec::new(),
            })
        );
        assert_eq!(
            parse_slash_command("/analyze octo/cli dev 5"),
            Some(SlashCommand::Analyze {
                repo: "octo/cli".to_string(),
                branch: "dev".to_string(),
                max_files: 5,
                extensions: Vec::new(),
            })
        );
        assert_eq!(
            parse_slash_command("/analyze octo/cli dev 5 .rs,toml,"),
            Some(SlashCommand::Analyze {
                repo: "octo/cli".to_string(),
                branch: "dev".to_string(),
                max_files: 5,
                extensions: vec![".rs".to_string(), "toml".to_string()],
            })
        );
    }

    #[test]
    fn analyze_rejects_bad_max_files() {
        assert!(matches!(
            parse_slash_command("/analyze octo/cli main zero"),
            Some(SlashCommand::Usage(_))
        ));
        assert!(matches!(
            parse_slash_command("/analyze"),
            Some(SlashCommand::Usage(_))
        ));
    }

    #[test]
    fn write_keeps_content_spacing() {
        assert_eq!(
            parse_slash_command("/write notes.md hello  world"),
            Some(SlashCommand::Write {
                path: "notes.md".to_string(),
                content: "hello  world".to_string(),
            })
        );
        assert!(matches!(
            parse_slash_command("/write notes.md"),
            Some(SlashCommand::Usage(_))
        ));
    }

    #[test]
    fn chat_and_ai_write_take_free_text() {
        assert_eq!(
            parse_slash_command("/chat  what does   this repo do? "),
            Some(SlashCommand::Chat {
                message: "what does   this repo do?".to_string(),
            })
        );
        assert_eq!(
            parse_slash_command("/ai-write src/app.py add a main guard"),
            Some(SlashCommand::AiWrite {
                path: "src/app.py".to_string(),
                instruction: "add a main guard".to_string(),
            })
        );
        assert!(matches!(parse_slash_command("/chat"), Some(SlashCommand::Usage(_))));
        assert!(matches!(
            parse_slash_command("/ai-write src/app.py"),
            Some(SlashCommand::Usage(_))
        ));
    }

    #[test]
    fn unknown_commands_are_reported_by_name() {
        assert_eq!(
            parse_slash_command("/deploy now"),
            Some(SlashCommand::Unknown("/deploy".to_string()))
        );
    }
}
