use tracing::{debug, info};

use crate::error::SessionError;
use crate::host::{ChatBackend, ChatMessage, ChatRequest};

/// Running conversation with the assistant.
///
/// Every turn sends the full transcript. A turn that fails leaves the
/// transcript as it was before the turn, so the message can be resent.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn send(
        &mut self,
        text: &str,
        backend: &mut dyn ChatBackend,
    ) -> Result<String, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::validation("Message must not be empty"));
        }

        let mut messages = self.messages.clone();
        messages.push(ChatMessage::user(text));
        let response = backend.chat(ChatRequest {
            messages: messages.clone(),
        })?;

        if let Some(error) = response.error {
            debug!(%error, "chat turn refused");
            return Err(SessionError::Application(error));
        }
        let reply = response
            .reply
            .filter(|reply| !reply.trim().is_empty())
            .ok_or_else(|| SessionError::application("AI returned no reply"))?;

        messages.push(ChatMessage::assistant(reply.clone()));
        self.messages = messages;
        info!(turns = self.messages.len() / 2, "chat turn completed");
        Ok(reply)
    }
}
