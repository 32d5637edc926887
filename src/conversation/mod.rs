use crate::error::ConversationError;
use crate::models::chat::{ Role, Turn };
use log::debug;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Ordered turns of a single session's dialogue. The first turn is always
/// the system instruction; only `reset` replaces it.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    system_prompt: String,
    turns: Vec<Turn>,
}

impl ConversationStore {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let mut store = Self {
            system_prompt: system_prompt.into(),
            turns: Vec::new(),
        };
        store.initialize();
        store
    }

    pub fn initialize(&mut self) {
        self.turns = vec![Turn::system(self.system_prompt.clone())];
    }

    /// Checks whether `turn` could be appended, without appending it.
    pub fn validate(turn: &Turn) -> Result<(), ConversationError> {
        match turn.role() {
            Role::System => Err(ConversationError::SystemTurnNotAllowed),
            Role::User if turn.content().trim().is_empty() => Err(ConversationError::EmptyUserTurn),
            _ => Ok(()),
        }
    }

    pub fn append(&mut self, turn: Turn) -> Result<(), ConversationError> {
        Self::validate(&turn)?;
        debug!("Appending {} turn ({} chars)", turn.role(), turn.content().len());
        self.turns.push(turn);
        Ok(())
    }

    /// Full ordered sequence, system turn included. This is the wire payload.
    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    /// History without the system instruction, which front ends do not show.
    pub fn visible_turns(&self) -> &[Turn] {
        &self.turns[1..]
    }

    pub fn reset(&mut self) {
        self.initialize();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: the system turn is never removed.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}
