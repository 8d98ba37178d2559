use crate::embeddings::cosine_similarity;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: TextChunk,
    pub score: f32,
}

/// The embedded chunks of one processed batch. Never mutated after construction.
#[derive(Debug)]
pub struct ChunkIndex {
    generation: Uuid,
    chunks: Vec<TextChunk>,
}

impl ChunkIndex {
    pub fn new(chunks: Vec<TextChunk>) -> Self {
        Self {
            generation: Uuid::new_v4(),
            chunks,
        }
    }

    pub fn generation(&self) -> Uuid {
        self.generation
    }

    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `k` chunks most similar to `query`, best first; equal scores keep chunk order.
    pub fn top_k(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| (position, cosine_similarity(query, &chunk.embedding)))
            .collect();

        scored.sort_by(|left, right| right.1.total_cmp(&left.1).then(left.0.cmp(&right.0)));

        scored
            .into_iter()
            .take(k)
            .map(|(position, score)| ScoredChunk {
                chunk: self.chunks[position].clone(),
                score,
            })
            .collect()
    }
}

/// Shared slot holding the current index. Readers get a snapshot; a replace swaps it whole.
#[derive(Debug, Default)]
pub struct IndexHandle {
    current: RwLock<Option<Arc<ChunkIndex>>>,
}

impl IndexHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Arc<ChunkIndex>> {
        self.current.read().await.clone()
    }

    /// Installs `index`, returning the one it displaced.
    pub async fn replace(&self, index: ChunkIndex) -> Option<Arc<ChunkIndex>> {
        let generation = index.generation();
        let chunk_count = index.len();
        let previous = self.current.write().await.replace(Arc::new(index));
        info!(%generation, chunk_count, "chunk index replaced");
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize, embedding: Vec<f32>) -> TextChunk {
        TextChunk {
            index,
            text: format!("fragmento {index}"),
            embedding,
            document_id: "doc".to_string(),
        }
    }

    #[test]
    fn top_k_orders_by_similarity() {
        let index = ChunkIndex::new(vec![
            chunk(0, vec![0.0, 1.0]),
            chunk(1, vec![1.0, 0.0]),
            chunk(2, vec![1.0, 1.0]),
        ]);

        let hits = index.top_k(&[1.0, 0.0], 2);
        let order: Vec<usize> = hits.iter().map(|hit| hit.chunk.index).collect();
        assert_eq!(order, vec![1, 2]);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn ties_keep_chunk_order() {
        let index = ChunkIndex::new(vec![
            chunk(0, vec![1.0, 0.0]),
            chunk(1, vec![0.0, 1.0]),
            chunk(2, vec![1.0, 0.0]),
        ]);

        let order: Vec<usize> = index
            .top_k(&[1.0, 0.0], 3)
            .iter()
            .map(|hit| hit.chunk.index)
            .collect();
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn k_larger_than_index_returns_everything() {
        let index = ChunkIndex::new(vec![chunk(0, vec![1.0])]);
        assert_eq!(index.top_k(&[1.0], 10).len(), 1);
        assert!(ChunkIndex::new(Vec::new()).top_k(&[1.0], 3).is_empty());
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_index() {
        let handle = IndexHandle::new();
        assert!(handle.current().await.is_none());

        let first = ChunkIndex::new(vec![chunk(0, vec![1.0])]);
        let first_generation = first.generation();
        assert!(handle.replace(first).await.is_none());

        let snapshot = handle.current().await;
        let second = ChunkIndex::new(vec![chunk(0, vec![1.0]), chunk(1, vec![0.5])]);
        let displaced = handle.replace(second).await;

        assert_eq!(displaced.map(|index| index.generation()), Some(first_generation));
        assert_eq!(snapshot.map(|index| index.len()), Some(1));
        assert_eq!(handle.current().await.map(|index| index.len()), Some(2));
    }
}
