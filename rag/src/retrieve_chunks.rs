use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::embed_query::Embedder;
use crate::error::Result;
use crate::filter::RetrievalFilter;
use crate::http::{search_auth, ServiceClient};

/// A retrieved unit of report content, cited by its identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Passage {
    pub id: String,
    pub content: String,
}

/// Hybrid lexical + vector search over the document index.
pub trait SearchIndex: Send + Sync {
    fn search(
        &self,
        text: &str,
        vector: &[f32],
        filter: &RetrievalFilter,
        limit: usize,
    ) -> Result<Vec<Passage>>;
}

#[derive(Serialize)]
struct VectorQuery<'a> {
    value: &'a [f32],
    k: usize,
    fields: &'a str,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    search: &'a str,
    vectors: [VectorQuery<'a>; 1],
    filter: &'a str,
    select: &'a str,
    top: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: String,
    #[serde(default)]
    content: String,
}

pub struct AzureSearchIndex {
    http: ServiceClient,
    url: String,
    key: String,
    vector_k: usize,
}

impl AzureSearchIndex {
    pub fn new(cfg: &Config, http: ServiceClient) -> Self {
        let url = format!(
            "{}/indexes/{}/docs/search?api-version={}",
            cfg.search_endpoint, cfg.search_index, cfg.search_api_version
        );
        Self {
            http,
            url,
            key: cfg.search_key.clone(),
            vector_k: cfg.vector_k,
        }
    }
}

impl SearchIndex for AzureSearchIndex {
    fn search(
        &self,
        text: &str,
        vector: &[f32],
        filter: &RetrievalFilter,
        limit: usize,
    ) -> Result<Vec<Passage>> {
        let req = SearchRequest {
            search: text,
            vectors: [VectorQuery {
                value: vector,
                k: self.vector_k,
                fields: "contentVector",
            }],
            filter: filter.as_str(),
            select: "id,title,content",
            top: limit,
        };
        let res = self
            .http
            .post_json::<SearchResponse, _>(&self.url, search_auth(&self.key)?, &req)?;
        Ok(res
            .value
            .into_iter()
            .map(|hit| Passage {
                id: hit.id,
                content: hit.content,
            })
            .collect())
    }
}

/// Embeds the query and runs it against the index. One-shot per call.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn SearchIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn SearchIndex>) -> Self {
        Self { embedder, index }
    }

    /// Passages in descending relevance. Zero hits is a valid, empty result.
    pub fn search(
        &self,
        query: &str,
        filter: &RetrievalFilter,
        limit: usize,
    ) -> Result<Vec<Passage>> {
        let vector = self.embedder.embed(query)?;
        let passages = self.index.search(query, &vector, filter, limit)?;
        debug!(hits = passages.len(), limit, filter = %filter, "retrieved passages");
        Ok(passages)
    }
}
