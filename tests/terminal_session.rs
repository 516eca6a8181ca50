use repoai_session::{
    Activity, AllowListClassifier, AlwaysAnswer, CommandHost, CommandRequest, CommandResponse,
    EntryKind, HistoryEntry, InputMode, RequestId, SessionError, Submission, SuggestionRequest,
    SuggestionResponse, TerminalSession,
};

#[derive(Default)]
struct HostSpy {
    next_request_id: RequestId,
    executed: Vec<CommandRequest>,
    suggested: Vec<SuggestionRequest>,
    fail_with: Option<String>,
}

impl HostSpy {
    fn allocate(&mut self) -> Result<RequestId, String> {
        if let Some(error) = self.fail_with.clone() {
            return Err(error);
        }
        self.next_request_id += 1;
        Ok(self.next_request_id)
    }

    fn commands(&self) -> Vec<&str> {
        self.executed
            .iter()
            .map(|request| request.command.as_str())
            .collect()
    }
}

impl CommandHost for HostSpy {
    fn execute(&mut self, request: CommandRequest) -> Result<RequestId, String> {
        let id = self.allocate()?;
        self.executed.push(request);
        Ok(id)
    }

    fn suggest(&mut self, request: SuggestionRequest) -> Result<RequestId, String> {
        let id = self.allocate()?;
        self.suggested.push(request);
        Ok(id)
    }
}

fn entry(kind: EntryKind, text: &str) -> HistoryEntry {
    HistoryEntry {
        kind,
        text: text.to_string(),
    }
}

fn executing_id(submission: Submission) -> RequestId {
    match submission {
        Submission::Executing(id) => id,
        Submission::Suggesting(id) => panic!("expected execution, got suggestion {id}"),
    }
}

fn suggesting_id(submission: Submission) -> RequestId {
    match submission {
        Submission::Suggesting(id) => id,
        Submission::Executing(id) => panic!("expected suggestion, got execution {id}"),
    }
}

#[test]
fn direct_command_runs_in_the_working_directory() {
    let mut session = TerminalSession::new("/workspaces/app");
    let mut host = HostSpy::default();

    let id = executing_id(session.submit("ls -la", &mut host).expect("submit"));
    assert!(session.is_busy());
    assert_eq!(
        host.executed,
        vec![CommandRequest {
            command: "ls -la".to_string(),
            working_directory: "/workspaces/app".to_string(),
        }]
    );

    assert!(session.on_command_finished(id, CommandResponse::stdout("README.md\n"), &mut host));
    assert!(!session.is_busy());
    assert_eq!(
        session.history(),
        &[
            entry(EntryKind::CommandEcho, "ls -la"),
            entry(EntryKind::Stdout, "README.md\n"),
        ]
    );
}

#[test]
fn second_submission_while_running_is_rejected_without_touching_history() {
    let mut session = TerminalSession::default();
    let mut host = HostSpy::default();

    let id = executing_id(session.submit("git status", &mut host).expect("submit"));
    let history_before = session.history().to_vec();

    assert_eq!(session.submit("ls", &mut host), Err(SessionError::Busy));
    assert_eq!(session.history(), history_before.as_slice());
    assert_eq!(host.commands(), vec!["git status"]);

    session.on_command_finished(id, CommandResponse::failed("fatal: not a repo", 128), &mut host);
    assert_eq!(
        session.history(),
        &[
            entry(EntryKind::CommandEcho, "git status"),
            entry(EntryKind::Stderr, "fatal: not a repo"),
        ]
    );
}

#[test]
fn empty_input_is_a_validation_error_with_no_request() {
    let mut session = TerminalSession::default();
    let mut host = HostSpy::default();

    let error = session.submit("   ", &mut host).expect_err("empty input must fail");
    assert!(matches!(error, SessionError::Validation(_)));
    assert!(host.executed.is_empty());
    assert!(host.suggested.is_empty());
    assert!(session.history().is_empty());
}

#[test]
fn natural_language_goes_through_suggestion_and_approval() {
    let mut session = TerminalSession::new("/workspaces/app");
    let mut host = HostSpy::default();

    let id = suggesting_id(
        session
            .submit("show files changed today", &mut host)
            .expect("submit"),
    );
    assert_eq!(
        host.suggested,
        vec![SuggestionRequest {
            prompt: "show files changed today".to_string(),
            working_directory: "/workspaces/app".to_string(),
            dry_run: true,
        }]
    );
    assert!(host.executed.is_empty());

    session.on_suggestion_received(id, SuggestionResponse::command("find . -mtime -1\n"));
    assert!(!session.is_busy());
    assert_eq!(
        session.pending_proposal().map(|proposal| proposal.command.as_str()),
        Some("find . -mtime -1")
    );
    assert!(host.executed.is_empty());

    let run_id = session
        .approve(&mut host)
        .expect("approve")
        .expect("proposal should run");
    assert_eq!(host.commands(), vec!["find . -mtime -1"]);
    assert_eq!(session.approve(&mut host), Err(SessionError::Busy));

    session.on_command_finished(run_id, CommandResponse::stdout("./a.py\n"), &mut host);
    assert_eq!(session.approve(&mut host), Ok(None));
    assert_eq!(host.commands(), vec!["find . -mtime -1"]);
    assert_eq!(
        session.history(),
        &[
            entry(EntryKind::AiPrompt, "show files changed today"),
            entry(EntryKind::AiSuggestion, "find . -mtime -1"),
            entry(EntryKind::CommandEcho, "find . -mtime -1"),
            entry(EntryKind::Stdout, "./a.py\n"),
        ]
    );
}

#[test]
fn newer_suggestion_replaces_the_pending_one() {
    let mut session = TerminalSession::default();
    let mut host = HostSpy::default();

    let first = suggesting_id(session.submit("delete the build dir", &mut host).expect("submit"));
    session.on_suggestion_received(first, SuggestionResponse::command("rm -rf build"));
    let second = suggesting_id(session.submit("list the build dir", &mut host).expect("submit"));
    session.on_suggestion_received(second, SuggestionResponse::command("ls build"));

    session.approve(&mut host).expect("approve");
    assert_eq!(host.commands(), vec!["ls build"]);
}

#[test]
fn resolve_pending_uses_the_confirmation_provider() {
    let mut session = TerminalSession::default();
    let mut host = HostSpy::default();

    let id = suggesting_id(session.submit("wipe caches", &mut host).expect("submit"));
    session.on_suggestion_received(id, SuggestionResponse::command("rm -rf .cache"));

    let outcome = session
        .resolve_pending(&mut AlwaysAnswer(false), &mut host)
        .expect("decline");
    assert_eq!(outcome, None);
    assert!(session.pending_proposal().is_none());
    assert!(host.executed.is_empty());
    assert_eq!(
        session.history().last(),
        Some(&entry(EntryKind::Info, "Discarded suggestion: rm -rf .cache"))
    );

    let id = suggesting_id(session.submit("wipe caches", &mut host).expect("submit"));
    session.on_suggestion_received(id, SuggestionResponse::command("rm -rf .cache"));
    let run = session
        .resolve_pending(&mut AlwaysAnswer(true), &mut host)
        .expect("accept");
    assert!(run.is_some());
    assert_eq!(host.commands(), vec!["rm -rf .cache"]);
}

#[test]
fn ai_errors_and_refusals_never_become_proposals() {
    let mut session = TerminalSession::default();
    let mut host = HostSpy::default();

    let id = suggesting_id(session.submit("format the disk", &mut host).expect("submit"));
    session.on_suggestion_received(id, SuggestionResponse::command("ERROR: dangerous request"));
    assert!(session.pending_proposal().is_none());

    let id = suggesting_id(session.submit("do a thing", &mut host).expect("submit"));
    session.on_suggestion_received(id, SuggestionResponse::error("GROQ_API_KEY not set"));
    assert!(session.pending_proposal().is_none());

    let errors: Vec<&str> = session
        .history()
        .iter()
        .filter(|entry| entry.kind == EntryKind::Error)
        .map(|entry| entry.text.as_str())
        .collect();
    assert_eq!(errors, vec!["ERROR: dangerous request", "GROQ_API_KEY not set"]);
}

#[test]
fn shell_mode_bypasses_classification() {
    let mut session = TerminalSession::default();
    let mut host = HostSpy::default();
    session.set_mode(InputMode::Shell);

    executing_id(session.submit("whoami please", &mut host).expect("submit"));
    assert_eq!(host.commands(), vec!["whoami please"]);
    assert!(host.suggested.is_empty());
}

#[test]
fn injected_classifier_decides_routing() {
    let classifier = AllowListClassifier::new(["deploy"]).expect("valid verbs");
    let mut session = TerminalSession::with_classifier("/srv", classifier);
    let mut host = HostSpy::default();

    executing_id(session.submit("deploy staging", &mut host).expect("submit"));
    let id = host.next_request_id;
    session.on_command_finished(id, CommandResponse::stdout("ok"), &mut host);
    suggesting_id(session.submit("ls", &mut host).expect("submit"));
}

#[test]
fn directory_change_is_resolved_by_a_second_request() {
    let mut session = TerminalSession::new("/workspaces/app");
    let mut host = HostSpy::default();

    let id = executing_id(session.submit("cd ../lib", &mut host).expect("submit"));
    session.on_command_finished(id, CommandResponse::stdout(""), &mut host);

    assert_eq!(session.working_directory(), "/workspaces/app");
    let resolve_id = match session.activity() {
        Activity::ResolvingDirectory { request_id } => *request_id,
        other => panic!("expected directory resolution, got {other:?}"),
    };
    assert_eq!(
        host.executed[1],
        CommandRequest {
            command: "cd ../lib && pwd".to_string(),
            working_directory: "/workspaces/app".to_string(),
        }
    );
    assert_eq!(session.submit("ls", &mut host), Err(SessionError::Busy));

    session.on_command_finished(resolve_id, CommandResponse::stdout("/workspaces/lib\n"), &mut host);
    assert_eq!(session.working_directory(), "/workspaces/lib");
    assert!(!session.is_busy());
    assert_eq!(
        session.history().last(),
        Some(&entry(EntryKind::Info, "Working directory: /workspaces/lib"))
    );
}

#[test]
fn compound_cd_lines_run_exactly_once() {
    for line in ["cd build && rm -rf out", "cd build; make clean"] {
        let mut session = TerminalSession::new("/workspaces/app");
        let mut host = HostSpy::default();

        let id = executing_id(session.submit(line, &mut host).expect("submit"));
        session.on_command_finished(id, CommandResponse::stdout(""), &mut host);

        assert_eq!(host.commands(), vec![line]);
        assert!(!session.is_busy());
        assert_eq!(session.working_directory(), "/workspaces/app");
    }
}

#[test]
fn approved_compound_cd_suggestion_runs_exactly_once() {
    let mut session = TerminalSession::new("/workspaces/app");
    let mut host = HostSpy::default();

    let id = suggesting_id(session.submit("clean the build folder", &mut host).expect("submit"));
    session.on_suggestion_received(id, SuggestionResponse::command("cd build && rm -rf out"));
    let run_id = session
        .approve(&mut host)
        .expect("approve")
        .expect("pending proposal");
    session.on_command_finished(run_id, CommandResponse::stdout(""), &mut host);

    assert_eq!(host.commands(), vec!["cd build && rm -rf out"]);
    assert_eq!(session.approve(&mut host), Ok(None));
    assert_eq!(host.executed.len(), 1);
}

#[test]
fn directory_resolution_repeats_only_the_target() {
    let mut session = TerminalSession::new("/workspaces/app");
    let mut host = HostSpy::default();

    let id = executing_id(session.submit("  cd   ../lib ", &mut host).expect("submit"));
    session.on_command_finished(id, CommandResponse::stdout(""), &mut host);
    let Activity::ResolvingDirectory { request_id } = session.activity().clone() else {
        panic!("expected directory resolution");
    };
    session.on_command_finished(request_id, CommandResponse::stdout("/workspaces/lib\n"), &mut host);

    let id = executing_id(session.submit("cd", &mut host).expect("submit"));
    session.on_command_finished(id, CommandResponse::stdout(""), &mut host);

    assert_eq!(
        host.commands(),
        vec!["cd   ../lib", "cd ../lib && pwd", "cd", "cd && pwd"]
    );
}

#[test]
fn failed_directory_change_keeps_the_old_directory() {
    let mut session = TerminalSession::new("/workspaces/app");
    let mut host = HostSpy::default();

    let id = executing_id(session.submit("cd missing", &mut host).expect("submit"));
    session.on_command_finished(
        id,
        CommandResponse::failed("cd: missing: No such file or directory", 1),
        &mut host,
    );

    assert_eq!(host.executed.len(), 1);
    assert!(!session.is_busy());
    assert_eq!(session.working_directory(), "/workspaces/app");
}

#[test]
fn stale_results_are_ignored() {
    let mut session = TerminalSession::default();
    let mut host = HostSpy::default();

    let id = executing_id(session.submit("pwd", &mut host).expect("submit"));
    assert!(!session.on_command_finished(id + 7, CommandResponse::stdout("/x"), &mut host));
    assert!(!session.on_suggestion_received(id, SuggestionResponse::command("ls")));
    assert!(session.is_busy());
    assert_eq!(session.history().len(), 1);
}

#[test]
fn host_dispatch_failure_is_an_application_error() {
    let mut session = TerminalSession::default();
    let mut host = HostSpy {
        fail_with: Some("backend unreachable".to_string()),
        ..HostSpy::default()
    };

    assert_eq!(
        session.submit("ls", &mut host),
        Err(SessionError::Application("backend unreachable".to_string()))
    );
    assert!(!session.is_busy());
    assert_eq!(
        session.history(),
        &[
            entry(EntryKind::CommandEcho, "ls"),
            entry(EntryKind::Error, "backend unreachable"),
        ]
    );
}

#[test]
fn request_failure_releases_the_session() {
    let mut session = TerminalSession::default();
    let mut host = HostSpy::default();

    let id = executing_id(session.submit("ls", &mut host).expect("submit"));
    assert!(session.on_request_failed(id, &SessionError::transport("timed out")));
    assert!(!session.is_busy());
    assert_eq!(
        session.history().last(),
        Some(&entry(EntryKind::Error, "connection failed: timed out"))
    );
}
