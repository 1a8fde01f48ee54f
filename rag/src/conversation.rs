use crate::build_prompt::{TURN_PREFIX, TURN_SUFFIX};
use crate::generate::IM_END;

/// Multi-turn state carried by the caller between pipeline calls.
///
/// `prompt_history` is the sentinel-delimited transcript fed to the model;
/// `history` is the same exchange as `role: text` lines for query condensing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationState {
    pub prompt_history: String,
    pub history: Vec<String>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            prompt_history: TURN_PREFIX.to_string(),
            history: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Appends one finished exchange. The buffer ends with an open user turn.
    pub fn record(&mut self, question: &str, answer: &str) {
        self.prompt_history.push_str(question);
        self.prompt_history.push_str(TURN_SUFFIX);
        self.prompt_history.push_str(answer);
        self.prompt_history.push('\n');
        self.prompt_history.push_str(IM_END);
        self.prompt_history.push_str(TURN_PREFIX);
        self.history.push(format!("user: {}", question));
        self.history.push(format!("assistant: {}", answer));
    }
}
