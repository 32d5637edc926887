use async_trait::async_trait;
use log::{ error, info };
use std::error::Error;
use std::sync::Arc;

use crate::conversation::ConversationStore;
use crate::error::ConversationError;
use crate::llm::chat::ChatClient;
use crate::models::chat::Turn;

/// Front-end side of a session. Called with the turns to display (system
/// instruction excluded) and whether a reply is still being generated.
#[async_trait]
pub trait RenderSink: Send {
    async fn render(
        &mut self,
        turns: &[Turn],
        pending: bool
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// One user's dialogue. Owned by a single connection; callers must not run
/// two submissions on the same session concurrently.
pub struct ChatSession {
    id: String,
    store: ConversationStore,
    client: Arc<dyn ChatClient>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>, system_prompt: &str, client: Arc<dyn ChatClient>) -> Self {
        Self {
            id: id.into(),
            store: ConversationStore::new(system_prompt),
            client,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &[Turn] {
        self.store.history()
    }

    /// Asks the completion endpoint for a reply to the user's text, then
    /// appends the user turn and the reply together. A failed completion
    /// still produces an assistant turn carrying the error text. If the
    /// pending render fails, the store is left untouched.
    pub async fn on_user_submit<S: RenderSink + ?Sized>(
        &mut self,
        text: &str,
        sink: &mut S
    ) -> Result<(), SessionError> {
        let user_turn = Turn::user(text);
        ConversationStore::validate(&user_turn)?;

        let mut payload = self.store.history().to_vec();
        payload.push(user_turn);
        sink.render(&payload[1..], true).await.map_err(SessionError::Render)?;

        let reply = match self.client.complete(&payload).await {
            Ok(content) => content,
            Err(e) => {
                error!("Completion failed for session {}: {}", self.id, e);
                format!("Error: {}", e)
            }
        };
        if let Some(user_turn) = payload.pop() {
            self.store.append(user_turn)?;
        }
        self.store.append(Turn::assistant(reply))?;

        sink.render(self.store.visible_turns(), false).await.map_err(SessionError::Render)
    }

    pub async fn on_reset_requested<S: RenderSink + ?Sized>(
        &mut self,
        sink: &mut S
    ) -> Result<(), SessionError> {
        info!("Resetting conversation for session {}", self.id);
        self.store.reset();
        sink.render(self.store.visible_turns(), false).await.map_err(SessionError::Render)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Conversation(#[from] ConversationError),

    #[error("render failed: {0}")]
    Render(Box<dyn Error + Send + Sync>),
}
