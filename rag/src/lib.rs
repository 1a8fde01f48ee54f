mod build_prompt;
mod condense_query;
mod config;
mod conversation;
mod embed_query;
mod error;
mod filter;
mod generate;
mod http;
mod pipeline;
mod retrieve_chunks;
mod retry;
mod session;

pub use build_prompt::{assemble_prompt, format_sources, TURN_PREFIX, TURN_SUFFIX};
pub use condense_query::{condense_prompt, condense_query};
pub use config::{ApiType, Config, SEARCH_INDEX_NAME};
pub use conversation::ConversationState;
pub use embed_query::{Embedder, EmbeddingClient};
pub use error::{RagError, Result};
pub use filter::{RetrievalFilter, KNOWN_DOCUMENTS};
pub use generate::{generate_answer, Completer, CompletionClient, CompletionRequest, IM_END, IM_START};
pub use http::ServiceClient;
pub use pipeline::{run_rag_pipeline, RagPipeline, TurnOutcome, TurnRequest};
pub use retrieve_chunks::{AzureSearchIndex, Passage, Retriever, SearchIndex};
pub use retry::RetryPolicy;
pub use session::{DisplayedMessage, Role, Session, TurnSettings, NO_SOURCES_WARNING, WELCOME_MESSAGE};
