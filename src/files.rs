use tracing::info;

use crate::error::SessionError;
use crate::host::{AiWriteRequest, ConfirmationProvider, FileBackend, FileRequest, FileResponse};

/// Outcome of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

/// Outcome of saving an AI draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Declined,
}

/// Content the assistant generated for a file, not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDraft {
    pub path: String,
    pub content: String,
    /// Previous content; `None` when the file does not exist yet.
    pub original: Option<String>,
}

/// Validated file operations over a [`FileBackend`].
pub struct FileActions<'a> {
    backend: &'a mut dyn FileBackend,
}

impl<'a> FileActions<'a> {
    pub fn new(backend: &'a mut dyn FileBackend) -> Self {
        Self { backend }
    }

    pub fn read(&mut self, path: &str) -> Result<String, SessionError> {
        let path = require_path(path)?;
        let response = self.backend.read(FileRequest::path(path))?;
        let response = into_result(response)?;
        Ok(response.content.unwrap_or_default())
    }

    pub fn write(&mut self, path: &str, content: &str) -> Result<(), SessionError> {
        let path = require_path(path)?;
        let response = self.backend.write(FileRequest::with_content(path, content))?;
        into_result(response)?;
        info!(%path, bytes = content.len(), "file written");
        Ok(())
    }

    /// Delete `path` once `confirm` agrees. A declined prompt sends nothing.
    pub fn delete(
        &mut self,
        path: &str,
        confirm: &mut dyn ConfirmationProvider,
    ) -> Result<DeleteOutcome, SessionError> {
        let path = require_path(path)?;
        if !confirm.confirm(&format!("Delete {path}?")) {
            return Ok(DeleteOutcome::Declined);
        }

        let response = self.backend.delete(FileRequest::path(path))?;
        into_result(response)?;
        info!(%path, "file deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Ask the backend for new content for `path`. Nothing is written.
    pub fn draft(&mut self, path: &str, instruction: &str) -> Result<FileDraft, SessionError> {
        let (path, instruction) = (path.trim(), instruction.trim());
        if path.is_empty() || instruction.is_empty() {
            return Err(SessionError::validation("Both path and instruction required"));
        }

        let response = self.backend.ai_write(AiWriteRequest {
            path: path.to_string(),
            instruction: instruction.to_string(),
            apply: false,
        })?;
        if let Some(error) = response.error {
            return Err(SessionError::Application(error));
        }
        let content = response
            .content
            .ok_or_else(|| SessionError::application("AI returned no content"))?;

        Ok(FileDraft {
            path: response.path.unwrap_or_else(|| path.to_string()),
            content,
            original: response.original,
        })
    }

    /// Write `draft` once `confirm` agrees. A declined prompt sends nothing.
    pub fn save_draft(
        &mut self,
        draft: &FileDraft,
        confirm: &mut dyn ConfirmationProvider,
    ) -> Result<SaveOutcome, SessionError> {
        let verb = if draft.original.is_some() { "Overwrite" } else { "Create" };
        if !confirm.confirm(&format!("{verb} {} with the generated content?", draft.path)) {
            return Ok(SaveOutcome::Declined);
        }
        self.write(&draft.path, &draft.content)?;
        Ok(SaveOutcome::Saved)
    }
}

fn require_path(path: &str) -> Result<&str, SessionError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(SessionError::validation("No path provided"));
    }
    Ok(path)
}

fn into_result(response: FileResponse) -> Result<FileResponse, SessionError> {
    match response.error {
        Some(error) => Err(SessionError::Application(error)),
        None => Ok(response),
    }
}
