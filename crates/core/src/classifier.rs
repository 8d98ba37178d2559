use crate::embeddings::{cosine_similarity, Embedder};
use crate::error::ModelError;
use crate::taxonomy::{Taxonomy, TaxonomyEntry};
use std::collections::BTreeSet;
use tracing::debug;

/// A taxonomy table with its description embeddings, computed once.
pub struct TaxonomyIndex {
    taxonomy: Taxonomy,
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEntry {
    pub entry: &'static TaxonomyEntry,
    pub score: f32,
}

impl TaxonomyIndex {
    /// Embeds every description of the table in a single backend call.
    pub async fn build(embedder: &dyn Embedder, taxonomy: Taxonomy) -> Result<Self, ModelError> {
        let embeddings = embedder.embed_batch(&taxonomy.descriptions()).await?;
        if embeddings.len() != taxonomy.entries.len() {
            return Err(ModelError::InvalidOutput(format!(
                "{} table: {} embeddings for {} descriptions",
                taxonomy.name,
                embeddings.len(),
                taxonomy.entries.len()
            )));
        }
        Ok(Self {
            taxonomy,
            embeddings,
        })
    }

    pub fn name(&self) -> &'static str {
        self.taxonomy.name
    }

    /// Scores every entry, ordered by descending score; equal scores keep table order.
    pub fn rank(&self, query: &[f32]) -> Vec<ScoredEntry> {
        let entries: &'static [TaxonomyEntry] = self.taxonomy.entries;
        let mut scored: Vec<ScoredEntry> = entries
            .iter()
            .zip(&self.embeddings)
            .map(|(entry, embedding)| ScoredEntry {
                entry,
                score: cosine_similarity(query, embedding),
            })
            .collect();

        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored
    }

    /// The single best entry, if its score is strictly above `threshold`.
    pub fn best_match(&self, query: &[f32], threshold: f32) -> Option<&'static TaxonomyEntry> {
        let best = self.rank(query).into_iter().next()?;
        debug!(table = self.name(), score = best.score, threshold, "best taxonomy match");
        (best.score > threshold).then_some(best.entry)
    }

    /// Union of the IDs of the top `n` entries that score strictly above `threshold`.
    pub fn top_matches(&self, query: &[f32], n: usize, threshold: f32) -> Option<BTreeSet<u32>> {
        let ids: BTreeSet<u32> = self
            .rank(query)
            .into_iter()
            .take(n)
            .filter(|scored| scored.score > threshold)
            .flat_map(|scored| scored.entry.ids.iter().copied())
            .collect();

        debug!(table = self.name(), matched = ids.len(), "top taxonomy matches");
        if ids.is_empty() {
            None
        } else {
            Some(ids)
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::embeddings::Embedder;
    use crate::error::ModelError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One dimension per vocabulary term, set when the lowercased text contains it.
    pub struct KeywordEmbedder {
        pub vocabulary: Vec<&'static str>,
        pub calls: AtomicUsize,
    }

    impl KeywordEmbedder {
        pub fn new(vocabulary: &[&'static str]) -> Self {
            Self {
                vocabulary: vocabulary.to_vec(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn vector(&self, text: &str) -> Vec<f32> {
            let lowered = text.to_lowercase();
            self.vocabulary
                .iter()
                .map(|term| if lowered.contains(term) { 1.0 } else { 0.0 })
                .collect()
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn dimensions(&self) -> usize {
            self.vocabulary.len()
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|text| self.vector(text)).collect())
        }
    }

    pub struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
            Err(ModelError::BackendResponse {
                backend: "fake".to_string(),
                details: "unreachable".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::KeywordEmbedder;
    use super::*;
    use crate::taxonomy::{BENEFICIARIES, INSTRUMENTS, PURPOSES};

    #[tokio::test]
    async fn build_embeds_each_table_once() -> Result<(), ModelError> {
        let embedder = KeywordEmbedder::new(&["vivienda"]);
        let index = TaxonomyIndex::build(&embedder, PURPOSES).await?;
        assert_eq!(embedder.calls(), 1);
        assert_eq!(index.rank(&[1.0]).len(), PURPOSES.entries.len());
        Ok(())
    }

    #[tokio::test]
    async fn best_match_breaks_ties_by_table_order() -> Result<(), ModelError> {
        let embedder = KeywordEmbedder::new(&["vivienda", "préstamo"]);
        let index = TaxonomyIndex::build(&embedder, PURPOSES).await?;

        let query = embedder.vector("ayudas para vivienda");
        let best = index.best_match(&query, 0.20).map(|entry| entry.ids);
        assert_eq!(best, Some(&[8][..]));
        Ok(())
    }

    #[tokio::test]
    async fn scores_at_or_below_threshold_are_rejected() -> Result<(), ModelError> {
        let embedder = KeywordEmbedder::new(&["vivienda", "autónomo"]);
        let index = TaxonomyIndex::build(&embedder, BENEFICIARIES).await?;

        let unrelated = embedder.vector("ayudas para vivienda");
        assert!(index.best_match(&unrelated, 0.20).is_none());

        let related = embedder.vector("soy autónomo");
        assert!(index.best_match(&related, 0.20).is_some());
        assert!(index.best_match(&related, 1.0).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn top_matches_unions_at_most_n_entries() -> Result<(), ModelError> {
        let embedder = KeywordEmbedder::new(&["préstamo", "autónomo", "garantía"]);
        let index = TaxonomyIndex::build(&embedder, INSTRUMENTS).await?;

        let query = embedder.vector("préstamo o garantía para un autónomo");
        let ids = index.top_matches(&query, 2, 0.20).unwrap_or_default();
        assert!(!ids.is_empty());
        assert!(ids.len() <= 2);

        let nothing = embedder.vector("sin relación");
        assert!(index.top_matches(&nothing, 2, 0.20).is_none());
        Ok(())
    }
}
