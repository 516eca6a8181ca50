use std::io::{self, Write};

use repoai_session::{
    AnalysisController, AnalysisRequest, AnalysisSession, AnalysisState, ChatSession,
    ConfirmationProvider, DeleteOutcome, EntryKind, FileActions, HistoryEntry, InputMode,
    SaveOutcome, SessionError, TerminalSession,
};
use tracing::debug;

use crate::backends::{Completion, ConsoleBackend};
use crate::commands::{parse_slash_command, SlashCommand, HELP_TEXT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Line-oriented driver: one terminal session, one analysis controller, one
/// chat, one backend, and a transcript writer.
pub struct Console<W: Write> {
    session: TerminalSession,
    analysis: AnalysisController,
    chat: ChatSession,
    backend: Box<dyn ConsoleBackend>,
    out: W,
    rendered: usize,
}

impl<W: Write> Console<W> {
    pub fn new(backend: Box<dyn ConsoleBackend>, workspace: impl Into<String>, out: W) -> Self {
        Self {
            session: TerminalSession::new(workspace),
            analysis: AnalysisController::new(),
            chat: ChatSession::new(),
            backend,
            out,
            rendered: 0,
        }
    }

    pub fn session(&self) -> &TerminalSession {
        &self.session
    }

    pub fn analysis(&self) -> &AnalysisSession {
        self.analysis.session()
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn prompt(&self) -> String {
        let mode = match self.session.mode() {
            InputMode::Auto => "auto",
            InputMode::Shell => "shell",
        };
        format!("{} ({mode})> ", self.session.working_directory())
    }

    pub fn banner(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "RepoAI console ({} backend). Type /help for commands.",
            self.backend.backend_id()
        )
    }

    pub fn handle_line(
        &mut self,
        line: &str,
        confirm: &mut dyn ConfirmationProvider,
    ) -> io::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        match parse_slash_command(line) {
            Some(command) => self.run_slash_command(command, confirm),
            None => {
                let submitted = self.session.submit(line, self.backend.as_command_host());
                self.settle()?;
                if let Err(error) = submitted {
                    self.report(&error)?;
                }
                Ok(Flow::Continue)
            }
        }
    }

    fn run_slash_command(
        &mut self,
        command: SlashCommand,
        confirm: &mut dyn ConfirmationProvider,
    ) -> io::Result<Flow> {
        match command {
            SlashCommand::Help => writeln!(self.out, "{HELP_TEXT}")?,
            SlashCommand::Clear => {
                self.session.clear_history();
                self.chat.clear();
                self.rendered = 0;
            }
            SlashCommand::Mode => {
                let mode = match self.session.toggle_mode() {
                    InputMode::Auto => "auto: commands run, everything else goes to the AI",
                    InputMode::Shell => "shell: every line runs as a command",
                };
                writeln!(self.out, "mode {mode}")?;
            }
            SlashCommand::Approve => {
                let approved = self.session.approve(self.backend.as_command_host());
                self.settle()?;
                match approved {
                    Ok(Some(_)) => {}
                    Ok(None) => writeln!(self.out, "Nothing to approve.")?,
                    Err(error) => self.report(&error)?,
                }
            }
            SlashCommand::Reject => {
                if self.session.reject().is_none() {
                    writeln!(self.out, "Nothing to reject.")?;
                }
                self.render_history()?;
            }
            SlashCommand::Cwd => writeln!(self.out, "{}", self.session.working_directory())?,
            SlashCommand::Analyze {
                repo,
                branch,
                max_files,
                extensions,
            } => {
                let request = AnalysisRequest::new(repo)
                    .with_branch(branch)
                    .with_max_files(max_files)
                    .with_extensions(extensions);
                self.run_analysis(&request)?;
            }
            SlashCommand::Info { repo } => match self.backend.repo_info(&repo) {
                Ok(info) => {
                    let name = info.name.unwrap_or(repo);
                    writeln!(self.out, "{name}")?;
                    if let Some(description) = info.description {
                        writeln!(self.out, "  {description}")?;
                    }
                    writeln!(
                        self.out,
                        "  language: {}  stars: {}  forks: {}  default branch: {}",
                        info.language.as_deref().unwrap_or("-"),
                        display_count(info.stars),
                        display_count(info.forks),
                        info.default_branch.as_deref().unwrap_or("-"),
                    )?;
                }
                Err(error) => self.report(&error)?,
            },
            SlashCommand::Tree { path } => {
                let path = path
                    .map(|path| self.resolve_path(&path))
                    .unwrap_or_else(|| self.session.working_directory().to_string());
                match self.backend.tree(&path) {
                    Ok(tree) => {
                        for line in tree.tree {
                            writeln!(self.out, "{line}")?;
                        }
                    }
                    Err(error) => self.report(&error)?,
                }
            }
            SlashCommand::Read { path } => {
                let path = self.resolve_path(&path);
                let read = FileActions::new(self.backend.as_file_backend()).read(&path);
                match read {
                    Ok(content) => {
                        write!(self.out, "{content}")?;
                        if !content.ends_with('\n') {
                            writeln!(self.out)?;
                        }
                    }
                    Err(error) => self.report(&error)?,
                }
            }
            SlashCommand::Write { path, content } => {
                let path = self.resolve_path(&path);
                let written = FileActions::new(self.backend.as_file_backend()).write(&path, &content);
                match written {
                    Ok(()) => writeln!(self.out, "Wrote {path}")?,
                    Err(error) => self.report(&error)?,
                }
            }
            SlashCommand::Delete { path } => {
                let path = self.resolve_path(&path);
                let deleted = FileActions::new(self.backend.as_file_backend()).delete(&path, confirm);
                match deleted {
                    Ok(DeleteOutcome::Deleted) => writeln!(self.out, "Deleted {path}")?,
                    Ok(DeleteOutcome::Declined) => writeln!(self.out, "Kept {path}")?,
                    Err(error) => self.report(&error)?,
                }
            }
            SlashCommand::AiWrite { path, instruction } => {
                let path = self.resolve_path(&path);
                self.run_ai_write(&path, &instruction, confirm)?;
            }
            SlashCommand::Chat { message } => {
                let replied = self.chat.send(&message, self.backend.as_chat_backend());
                match replied {
                    Ok(reply) => writeln!(self.out, "assistant> {}", reply.trim_end())?,
                    Err(error) => self.report(&error)?,
                }
            }
            SlashCommand::Health => match self.backend.health() {
                Ok(health) => writeln!(
                    self.out,
                    "backend {}: {} (workspace: {}, model: {})",
                    self.backend.backend_id(),
                    health.status,
                    health.workspace.as_deref().unwrap_or("-"),
                    health.model.as_deref().unwrap_or("-"),
                )?,
                Err(error) => self.report(&error)?,
            },
            SlashCommand::Quit => return Ok(Flow::Quit),
            SlashCommand::Usage(usage) => writeln!(self.out, "{usage}")?,
            SlashCommand::Unknown(name) => {
                writeln!(self.out, "Unknown command {name}. Type /help for commands.")?
            }
        }

        Ok(Flow::Continue)
    }

    /// Show the AI draft for `path`, then save it only if `confirm` agrees.
    fn run_ai_write(
        &mut self,
        path: &str,
        instruction: &str,
        confirm: &mut dyn ConfirmationProvider,
    ) -> io::Result<()> {
        let drafted = FileActions::new(self.backend.as_file_backend()).draft(path, instruction);
        let draft = match drafted {
            Ok(draft) => draft,
            Err(error) => return self.report(&error),
        };

        let heading = if draft.original.is_some() { "changed" } else { "new file" };
        writeln!(self.out, "== {} ({heading})", draft.path)?;
        write!(self.out, "{}", draft.content)?;
        if !draft.content.ends_with('\n') {
            writeln!(self.out)?;
        }
        self.out.flush()?;

        let saved = FileActions::new(self.backend.as_file_backend()).save_draft(&draft, confirm);
        match saved {
            Ok(SaveOutcome::Saved) => writeln!(self.out, "Wrote {}", draft.path),
            Ok(SaveOutcome::Declined) => writeln!(self.out, "Discarded draft for {}", draft.path),
            Err(error) => self.report(&error),
        }
    }

    fn run_analysis(&mut self, request: &AnalysisRequest) -> io::Result<()> {
        let mut view = AnalysisView::default();
        let out = &mut self.out;
        let mut write_error = None;

        let streamed = self.backend.analyze(request, &mut self.analysis, &mut |session| {
            if write_error.is_none() {
                write_error = view.render(session, &mut *out).err();
            }
        });
        if let Some(error) = write_error {
            return Err(error);
        }

        let session = self.analysis.session();
        view.render(session, &mut self.out)?;
        match streamed {
            Ok(outcome) => {
                debug!(?outcome, "analysis stream closed");
                match session.state() {
                    AnalysisState::Completed => {
                        writeln!(self.out, "{}", session.summary().unwrap_or_default())?
                    }
                    AnalysisState::Failed => writeln!(
                        self.out,
                        "error: {}",
                        session.error_message().unwrap_or("analysis failed")
                    )?,
                    AnalysisState::Running | AnalysisState::Idle => writeln!(
                        self.out,
                        "The backend closed the stream before the analysis finished."
                    )?,
                }
                Ok(())
            }
            Err(error) => self.report(&error),
        }
    }

    /// Feed every queued completion back into the session, then render.
    fn settle(&mut self) -> io::Result<()> {
        while let Some(completion) = self.backend.take_completion() {
            match completion {
                Completion::Command {
                    request_id,
                    response,
                } => {
                    self.session
                        .on_command_finished(request_id, response, self.backend.as_command_host());
                }
                Completion::Suggestion {
                    request_id,
                    response,
                } => {
                    self.session.on_suggestion_received(request_id, response);
                }
                Completion::Failed { request_id, error } => {
                    self.session.on_request_failed(request_id, &error);
                }
            }
        }
        self.render_history()
    }

    fn render_history(&mut self) -> io::Result<()> {
        let history = self.session.history();
        for entry in history.iter().skip(self.rendered) {
            render_entry(&mut self.out, entry)?;
        }
        self.rendered = history.len();
        self.out.flush()
    }

    /// Print errors the session did not already put into the history.
    fn report(&mut self, error: &SessionError) -> io::Result<()> {
        if matches!(error, SessionError::Application(_)) && self.rendered > 0 {
            let already_shown = self.session.history()[..self.rendered]
                .last()
                .is_some_and(|entry| entry.kind == EntryKind::Error && entry.text == error.to_string());
            if already_shown {
                return Ok(());
            }
        }
        writeln!(self.out, "error: {error}")
    }

    fn resolve_path(&self, path: &str) -> String {
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.session.working_directory().trim_end_matches('/'),
                path
            )
        }
    }
}

fn render_entry(out: &mut impl Write, entry: &HistoryEntry) -> io::Result<()> {
    let text = entry.text.trim_end_matches('\n');
    match entry.kind {
        EntryKind::CommandEcho => writeln!(out, "$ {text}"),
        EntryKind::AiPrompt => writeln!(out, "ai> {text}"),
        EntryKind::AiSuggestion => {
            writeln!(out, "suggested: {text}")?;
            writeln!(out, "  /approve to run it, /reject to discard it")
        }
        EntryKind::Stdout | EntryKind::Stderr | EntryKind::Info if text.is_empty() => Ok(()),
        EntryKind::Stdout | EntryKind::Stderr | EntryKind::Info => writeln!(out, "{text}"),
        EntryKind::Error => writeln!(out, "error: {text}"),
    }
}

fn display_count(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

/// Incremental renderer for one analysis run; prints only what is new.
#[derive(Debug, Default)]
struct AnalysisView {
    status: Option<String>,
    progress: u64,
    results: usize,
    skipped: usize,
}

impl AnalysisView {
    fn render(&mut self, session: &AnalysisSession, out: &mut impl Write) -> io::Result<()> {
        if let Some(status) = session.status() {
            if self.status.as_deref() != Some(status) {
                writeln!(out, "{status}")?;
                self.status = Some(status.to_string());
            }
        }

        let progress = session.progress();
        if progress.current != self.progress {
            writeln!(
                out,
                "[{}/{}] {}",
                progress.current, progress.total, progress.current_item
            )?;
            self.progress = progress.current;
        }

        for result in session.results().iter().skip(self.results) {
            writeln!(out, "== {}", result.path)?;
            writeln!(out, "{}", result.analysis.trim_end())?;
        }
        self.results = session.results().len();

        for skipped in session.skipped().iter().skip(self.skipped) {
            writeln!(out, "skipped {}: {}", skipped.path, skipped.reason)?;
        }
        self.skipped = session.skipped().len();

        out.flush()
    }
}
