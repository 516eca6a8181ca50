use std::collections::BTreeMap;

use repoai_api::{DirectoryTree, HealthStatus, RepoInfo, StreamOutcome};
use repoai_session::host::validate_repo_slug;
use repoai_session::{
    AiWriteRequest, AiWriteResponse, AnalysisController, AnalysisRequest, AnalysisSession,
    ChatBackend, ChatMessage, ChatRequest, ChatResponse, ChatRole, CommandHost, CommandRequest,
    CommandResponse, FileBackend, FileRequest, FileResponse, RequestId, SessionError,
    SuggestionRequest, SuggestionResponse,
};

use super::{Completion, CompletionQueue, ConsoleBackend, MOCK_BACKEND_ID};

/// Deterministic in-memory backend for local runs and tests.
///
/// Understands a handful of shell verbs, answers suggestions and chat from
/// keywords, keeps files in a map, and replays a canned analysis stream in
/// small chunks so frames straddle chunk boundaries.
#[derive(Debug)]
pub struct MockBackend {
    workspace: String,
    files: BTreeMap<String, String>,
    completions: CompletionQueue,
}

impl MockBackend {
    const STREAM_CHUNK_BYTES: usize = 7;
    const ANALYZED_FILES: [&'static str; 3] = ["README.md", "src/main.rs", "src/lib.rs"];

    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            files: BTreeMap::new(),
            completions: CompletionQueue::default(),
        }
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    fn run(&self, command: &str, cwd: &str) -> CommandResponse {
        if let Some(target) = command
            .strip_suffix("&& pwd")
            .and_then(|head| head.trim().strip_prefix("cd"))
        {
            return CommandResponse::stdout(format!("{}\n", join_path(cwd, target.trim())));
        }

        let (verb, rest) = command
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((command, ""));

        match verb {
            "cd" => CommandResponse::stdout(""),
            "pwd" => CommandResponse::stdout(format!("{cwd}\n")),
            "echo" => CommandResponse::stdout(format!("{}\n", rest.trim_matches('"'))),
            "ls" => {
                let dir = join_path(cwd, rest);
                let listing: Vec<&str> = self
                    .files
                    .keys()
                    .filter_map(|path| path.strip_prefix(&dir))
                    .filter_map(|path| path.strip_prefix('/'))
                    .collect();
                CommandResponse::stdout(listing.iter().map(|name| format!("{name}\n")).collect::<String>())
            }
            "cat" => match self.files.get(&join_path(cwd, rest)) {
                Some(content) => CommandResponse::stdout(content.clone()),
                None => CommandResponse::failed(format!("cat: {rest}: No such file or directory"), 1),
            },
            "true" => CommandResponse::stdout(""),
            "false" => CommandResponse::failed("", 1),
            _ => CommandResponse::failed(format!("mock: command not found: {verb}"), 127),
        }
    }

    fn suggestion_for(prompt: &str) -> SuggestionResponse {
        let lowered = prompt.to_ascii_lowercase();
        if ["delete", "remove", "wipe"]
            .iter()
            .any(|word| lowered.contains(word))
        {
            return SuggestionResponse::command("ERROR: refusing to suggest a destructive command");
        }
        if lowered.contains("where") || lowered.contains("directory") {
            return SuggestionResponse::command("pwd");
        }
        if lowered.contains("list") || lowered.contains("files") {
            return SuggestionResponse::command("ls");
        }
        SuggestionResponse::command(format!("echo \"{prompt}\""))
    }

    fn chat_reply(messages: &[ChatMessage]) -> ChatResponse {
        let Some(last) = messages
            .iter()
            .rev()
            .find(|message| message.role == ChatRole::User)
        else {
            return ChatResponse {
                reply: None,
                error: Some("No messages provided".to_string()),
            };
        };

        let turn = messages
            .iter()
            .filter(|message| message.role == ChatRole::User)
            .count();
        if last.content.to_ascii_lowercase().contains("analy") {
            return ChatResponse::reply("Type /analyze owner/repo to scan a repository.");
        }
        ChatResponse::reply(format!("[{turn}] You said: {}", last.content))
    }

    fn analysis_stream(request: &AnalysisRequest) -> Vec<u8> {
        let files: Vec<&str> = Self::ANALYZED_FILES
            .iter()
            .copied()
            .filter(|file| {
                request.extensions.is_empty()
                    || request
                        .extensions
                        .iter()
                        .any(|extension| file.ends_with(extension.as_str()))
            })
            .take(request.max_files as usize)
            .collect();

        let mut frames = vec![
            serde_json::json!({"type": "status", "message": format!("{} files to analyze", files.len())}),
        ];
        if files.is_empty() {
            frames.push(serde_json::json!({"type": "error", "message": "No matching files found."}));
            return Self::encode_frames(frames);
        }
        for (index, file) in files.iter().enumerate() {
            frames.push(serde_json::json!({
                "type": "progress",
                "current": index + 1,
                "total": files.len(),
                "file": file,
            }));
            frames.push(serde_json::json!({
                "type": "file_result",
                "file": file,
                "analysis": format!("{file} in {} looks tidy.", request.repo),
            }));
        }
        if request.want_summary {
            frames.push(serde_json::json!({
                "type": "summary",
                "summary": format!("{} is a small project on {}.", request.repo, request.branch),
            }));
        }
        frames.push(serde_json::json!({"type": "done", "total_analyzed": files.len()}));
        Self::encode_frames(frames)
    }

    fn encode_frames(frames: Vec<serde_json::Value>) -> Vec<u8> {
        frames
            .into_iter()
            .map(|frame| format!("data: {frame}\n\n"))
            .collect::<String>()
            .into_bytes()
    }

    fn in_workspace(&self, path: &str) -> bool {
        path == self.workspace || path.starts_with(&format!("{}/", self.workspace))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(repoai_session::DEFAULT_WORKING_DIRECTORY)
    }
}

/// Lexical join of `target` onto `cwd`, folding `.` and `..`.
fn join_path(cwd: &str, target: &str) -> String {
    let base = if target.starts_with('/') { "" } else { cwd };
    let mut parts: Vec<&str> = Vec::new();
    for part in base.split('/').chain(target.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

impl CommandHost for MockBackend {
    fn execute(&mut self, request: CommandRequest) -> Result<RequestId, String> {
        let request_id = self.completions.next_id();
        let response = self.run(request.command.trim(), &request.working_directory);
        self.completions.push(Completion::Command {
            request_id,
            response,
        });
        Ok(request_id)
    }

    fn suggest(&mut self, request: SuggestionRequest) -> Result<RequestId, String> {
        let request_id = self.completions.next_id();
        self.completions.push(Completion::Suggestion {
            request_id,
            response: Self::suggestion_for(&request.prompt),
        });
        Ok(request_id)
    }
}

impl FileBackend for MockBackend {
    fn read(&mut self, request: FileRequest) -> Result<FileResponse, SessionError> {
        Ok(match self.files.get(&request.path) {
            Some(content) => FileResponse {
                content: Some(content.clone()),
                ..FileResponse::default()
            },
            None => FileResponse {
                error: Some(format!("Not found: {}", request.path)),
                ..FileResponse::default()
            },
        })
    }

    fn write(&mut self, request: FileRequest) -> Result<FileResponse, SessionError> {
        self.files
            .insert(request.path, request.content.unwrap_or_default());
        Ok(FileResponse {
            success: Some(true),
            ..FileResponse::default()
        })
    }

    fn delete(&mut self, request: FileRequest) -> Result<FileResponse, SessionError> {
        if !self.in_workspace(&request.path) {
            return Ok(FileResponse {
                error: Some(format!("Can only delete files inside {}", self.workspace)),
                ..FileResponse::default()
            });
        }
        Ok(match self.files.remove(&request.path) {
            Some(_) => FileResponse {
                success: Some(true),
                ..FileResponse::default()
            },
            None => FileResponse {
                error: Some("File not found".to_string()),
                ..FileResponse::default()
            },
        })
    }

    /// Drafts prepend the instruction as a comment line to the current content.
    fn ai_write(&mut self, request: AiWriteRequest) -> Result<AiWriteResponse, SessionError> {
        if request.path.trim().is_empty() || request.instruction.trim().is_empty() {
            return Ok(AiWriteResponse {
                error: Some("Both path and instruction required".to_string()),
                ..AiWriteResponse::default()
            });
        }

        let original = self.files.get(&request.path).cloned();
        let content = format!(
            "# {}\n{}",
            request.instruction.trim(),
            original.as_deref().unwrap_or_default()
        );
        if request.apply {
            self.files.insert(request.path.clone(), content.clone());
        }

        Ok(AiWriteResponse {
            success: Some(true),
            path: Some(request.path),
            content: Some(content),
            applied: Some(request.apply),
            original,
            error: None,
        })
    }
}

impl ChatBackend for MockBackend {
    fn chat(&mut self, request: ChatRequest) -> Result<ChatResponse, SessionError> {
        Ok(Self::chat_reply(&request.messages))
    }
}

impl ConsoleBackend for MockBackend {
    fn backend_id(&self) -> &'static str {
        MOCK_BACKEND_ID
    }

    fn take_completion(&mut self) -> Option<Completion> {
        self.completions.pop()
    }

    fn analyze(
        &mut self,
        request: &AnalysisRequest,
        controller: &mut AnalysisController,
        on_update: &mut dyn FnMut(&AnalysisSession),
    ) -> Result<StreamOutcome, SessionError> {
        request.validate()?;
        let id = controller.start();

        for chunk in Self::analysis_stream(request).chunks(Self::STREAM_CHUNK_BYTES) {
            if controller.feed(id, chunk).dispatched > 0 {
                on_update(controller.session());
            }
        }

        let stats = controller.finish(id);
        Ok(StreamOutcome {
            session_id: id,
            state: controller.session().state(),
            stats,
        })
    }

    fn health(&mut self) -> Result<HealthStatus, SessionError> {
        Ok(HealthStatus {
            status: "ok".to_string(),
            workspace: Some(self.workspace.clone()),
            model: Some(MOCK_BACKEND_ID.to_string()),
        })
    }

    fn repo_info(&mut self, repo: &str) -> Result<RepoInfo, SessionError> {
        validate_repo_slug(repo)?;
        Ok(RepoInfo {
            name: Some(repo.trim().to_string()),
            description: Some("Mock repository".to_string()),
            language: Some("Rust".to_string()),
            stars: Some(0),
            forks: Some(0),
            default_branch: Some(repoai_session::host::DEFAULT_BRANCH.to_string()),
        })
    }

    fn tree(&mut self, path: &str) -> Result<DirectoryTree, SessionError> {
        let root = join_path(&self.workspace, path);
        let mut tree = vec![root.clone()];
        tree.extend(
            self.files
                .keys()
                .filter(|file| file.starts_with(&format!("{root}/")))
                .cloned(),
        );
        Ok(DirectoryTree { tree, path: root })
    }

    fn as_command_host(&mut self) -> &mut dyn CommandHost {
        self
    }

    fn as_file_backend(&mut self) -> &mut dyn FileBackend {
        self
    }

    fn as_chat_backend(&mut self) -> &mut dyn ChatBackend {
        self
    }
}

#[cfg(test)]
mod tests {
    use repoai_session::{AnalysisRequest, ChatMessage};

    use super::{join_path, MockBackend};

    #[test]
    fn join_path_folds_relative_segments() {
        assert_eq!(join_path("/workspaces/app", "../lib"), "/workspaces/lib");
        assert_eq!(join_path("/workspaces/app", "/tmp/./x"), "/tmp/x");
        assert_eq!(join_path("/workspaces", ""), "/workspaces");
        assert_eq!(join_path("/", ".."), "/");
    }

    #[test]
    fn directory_resolution_reports_the_new_path() {
        let backend = MockBackend::default();
        let response = backend.run("cd ../tmp && pwd", "/workspaces/app");
        assert_eq!(response.stdout.as_deref(), Some("/workspaces/tmp\n"));
    }

    #[test]
    fn extension_filter_limits_the_canned_files() {
        let request = AnalysisRequest::new("octo/cli").with_extensions(["rs"]);
        let stream = String::from_utf8(MockBackend::analysis_stream(&request)).expect("utf-8");
        assert!(stream.contains("src/main.rs"));
        assert!(stream.contains("src/lib.rs"));
        assert!(!stream.contains("README.md"));

        let request = AnalysisRequest::new("octo/cli").with_extensions(["py"]);
        let stream = String::from_utf8(MockBackend::analysis_stream(&request)).expect("utf-8");
        assert!(stream.contains("No matching files found."));
        assert!(!stream.contains("\"done\""));
    }

    #[test]
    fn chat_replies_count_user_turns() {
        let reply = MockBackend::chat_reply(&[
            ChatMessage::user("hi"),
            ChatMessage::assistant("[1] You said: hi"),
            ChatMessage::user("again"),
        ]);
        assert_eq!(reply.reply.as_deref(), Some("[2] You said: again"));
        assert!(MockBackend::chat_reply(&[]).error.is_some());
    }

    #[test]
    fn unknown_verbs_fail_with_127() {
        let backend = MockBackend::default();
        let response = backend.run("frobnicate now", "/workspaces");
        assert_eq!(response.returncode, Some(127));
        assert!(!response.succeeded());
    }
}
