use tracing::warn;

use crate::conversation::ConversationState;
use crate::error::Result;
use crate::filter::{RetrievalFilter, KNOWN_DOCUMENTS};
use crate::pipeline::{RagPipeline, TurnOutcome, TurnRequest};
use crate::retrieve_chunks::Passage;

pub const WELCOME_MESSAGE: &str = "Hei, olen tekoäly-chatbot, jolle on syötetty tietoja suomalaisten yritysten vuosikertomuksista. Voit vapaasti kysyä minulta mitä vain haluat tietää, esim. \"Kuka oli FinnAirin tilintarkastaja?\" tai \"Millaista kestävää toimintaa Fortum harjoittaa?\".";
pub const NO_SOURCES_WARNING: &str = "No sources";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Warning,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Warning => "warning",
        }
    }
}

/// One rendered entry of the chat log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayedMessage {
    pub role: Role,
    pub content: String,
    pub sources: Vec<Passage>,
}

impl DisplayedMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

/// Per-turn knobs chosen by the UI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurnSettings {
    pub temperature: f32,
    pub k: usize,
}

/// Everything one chat window owns. Nothing outlives the session.
#[derive(Clone, Debug)]
pub struct Session {
    pub conversation: ConversationState,
    pub messages: Vec<DisplayedMessage>,
    pub selected_documents: Vec<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            conversation: ConversationState::new(),
            messages: vec![DisplayedMessage::new(Role::Assistant, WELCOME_MESSAGE)],
            selected_documents: KNOWN_DOCUMENTS.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn is_selected(&self, title: &str) -> bool {
        self.selected_documents.iter().any(|d| d == title)
    }

    pub fn set_document(&mut self, title: &str, checked: bool) {
        if checked {
            if !self.is_selected(title) {
                self.selected_documents.push(title.to_string());
            }
        } else {
            self.selected_documents.retain(|d| d != title);
        }
    }

    pub fn filter(&self) -> RetrievalFilter {
        RetrievalFilter::from_titles(&self.selected_documents)
    }

    /// Logs the user's question before the pipeline runs.
    pub fn begin_turn(&mut self, question: &str) {
        self.messages.push(DisplayedMessage::new(Role::User, question));
    }

    /// Applies a finished turn. Failures become a warning and keep the
    /// conversation as it was.
    pub fn finish_turn(&mut self, result: Result<TurnOutcome>) {
        match result {
            Ok(outcome) => {
                let no_sources = outcome.sources.is_empty();
                self.conversation = outcome.conversation;
                self.messages.push(DisplayedMessage {
                    role: Role::Assistant,
                    content: outcome.answer,
                    sources: outcome.sources,
                });
                if no_sources {
                    self.messages
                        .push(DisplayedMessage::new(Role::Warning, NO_SOURCES_WARNING));
                }
            }
            Err(err) => {
                warn!(error = %err, "turn failed");
                self.messages
                    .push(DisplayedMessage::new(Role::Warning, err.to_string()));
            }
        }
    }

    /// Runs a whole turn on the calling thread.
    pub fn ask(&mut self, pipeline: &RagPipeline, question: &str, settings: TurnSettings) {
        self.begin_turn(question);
        let filter = self.filter();
        let req = TurnRequest {
            question,
            temperature: settings.temperature,
            filter: &filter,
            k: settings.k,
        };
        let result = pipeline.run_turn(&req, &self.conversation);
        self.finish_turn(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_all_documents_and_welcome() {
        let session = Session::new();
        assert_eq!(session.selected_documents.len(), KNOWN_DOCUMENTS.len());
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::Assistant);
        assert!(session.conversation.is_empty());
    }

    #[test]
    fn toggling_documents_updates_filter() {
        let mut session = Session::new();
        for doc in KNOWN_DOCUMENTS {
            session.set_document(doc, false);
        }
        assert!(session.filter().matches_nothing());

        session.set_document("fortum", true);
        session.set_document("fortum", true);
        assert_eq!(session.selected_documents, vec!["fortum".to_string()]);
        assert_eq!(session.filter().as_str(), "title eq 'fortum'");
    }
}
