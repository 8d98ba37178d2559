use crate::embeddings::Embedder;
use crate::error::ModelError;
use crate::index::{IndexHandle, ScoredChunk};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Chunks(Vec<ScoredChunk>),
    /// No document batch has been processed yet.
    NotProcessed,
}

impl Retrieval {
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Self::Chunks(chunks) => chunks.iter().map(|hit| hit.chunk.text.as_str()).collect(),
            Self::NotProcessed => Vec::new(),
        }
    }
}

pub struct Retriever<'a> {
    embedder: &'a dyn Embedder,
    index: &'a IndexHandle,
}

impl<'a> Retriever<'a> {
    pub fn new(embedder: &'a dyn Embedder, index: &'a IndexHandle) -> Self {
        Self { embedder, index }
    }

    /// Top `k` chunks of the current index for `question`. The question is only
    /// embedded when an index exists.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Retrieval, ModelError> {
        let Some(index) = self.index.current().await else {
            return Ok(Retrieval::NotProcessed);
        };

        let query = self.embedder.embed(question).await?;
        let hits = index.top_k(&query, k);
        debug!(
            generation = %index.generation(),
            k,
            returned = hits.len(),
            best = hits.first().map(|hit| hit.score),
            "retrieved chunks"
        );
        Ok(Retrieval::Chunks(hits))
    }
}
