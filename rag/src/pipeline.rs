use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span};

use crate::build_prompt::assemble_prompt;
use crate::condense_query::condense_query;
use crate::config::Config;
use crate::conversation::ConversationState;
use crate::embed_query::{Embedder, EmbeddingClient};
use crate::error::Result;
use crate::filter::RetrievalFilter;
use crate::generate::{generate_answer, Completer, CompletionClient};
use crate::http::ServiceClient;
use crate::retrieve_chunks::{AzureSearchIndex, Passage, Retriever, SearchIndex};

/// Inputs for one question.
#[derive(Clone, Debug)]
pub struct TurnRequest<'a> {
    pub question: &'a str,
    pub temperature: f32,
    pub filter: &'a RetrievalFilter,
    pub k: usize,
}

/// Result of one question: the answer, its sources and the advanced state.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub answer: String,
    /// Query actually sent to the index (condensed after the first turn).
    pub query: String,
    pub sources: Vec<Passage>,
    pub conversation: ConversationState,
}

/// Condense, retrieve, assemble, generate. Holds no session state.
#[derive(Clone)]
pub struct RagPipeline {
    retriever: Retriever,
    completer: Arc<dyn Completer>,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn SearchIndex>,
        completer: Arc<dyn Completer>,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedder, index),
            completer,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let http = ServiceClient::new(cfg.http_timeout)?;
        Ok(Self::new(
            Arc::new(EmbeddingClient::new(cfg, http.clone())),
            Arc::new(AzureSearchIndex::new(cfg, http.clone())),
            Arc::new(CompletionClient::new(cfg, http)),
        ))
    }

    /// Answers one question. `conversation` is left as is; the advanced
    /// state comes back in the outcome so a failed turn changes nothing.
    pub fn run_turn(
        &self,
        req: &TurnRequest<'_>,
        conversation: &ConversationState,
    ) -> Result<TurnOutcome> {
        let span = info_span!("turn", turn = conversation.history.len() / 2 + 1);
        let _guard = span.enter();
        let started = Instant::now();

        let query = condense_query(
            self.completer.as_ref(),
            &conversation.history,
            req.question,
            req.temperature,
        )?;
        let sources = self.retriever.search(&query, req.filter, req.k)?;
        let prompt = assemble_prompt(&sources, &conversation.prompt_history, req.question);
        let answer = generate_answer(self.completer.as_ref(), &prompt, req.temperature)?;

        let mut next = conversation.clone();
        next.record(req.question, &answer);

        info!(
            sources = sources.len(),
            prompt_chars = prompt.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "answered question"
        );

        Ok(TurnOutcome {
            answer,
            query,
            sources,
            conversation: next,
        })
    }
}

/// Flat form of [`RagPipeline::run_turn`]: returns the answer, the updated
/// prompt history, the updated history and the sources.
pub fn run_rag_pipeline(
    pipeline: &RagPipeline,
    user_input: &str,
    temperature: f32,
    filter: &RetrievalFilter,
    k: usize,
    prompt_history: &str,
    history: &[String],
) -> Result<(String, String, Vec<String>, Vec<Passage>)> {
    let conversation = ConversationState {
        prompt_history: prompt_history.to_string(),
        history: history.to_vec(),
    };
    let req = TurnRequest {
        question: user_input,
        temperature,
        filter,
        k,
    };
    let out = pipeline.run_turn(&req, &conversation)?;
    Ok((
        out.answer,
        out.conversation.prompt_history,
        out.conversation.history,
        out.sources,
    ))
}
