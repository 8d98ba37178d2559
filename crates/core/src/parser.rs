use crate::classifier::TaxonomyIndex;
use crate::config::ClassifierThresholds;
use crate::embeddings::Embedder;
use crate::error::ParserError;
use crate::filters::{DescriptionMatch, FilterSet};
use crate::lexical::LexicalExtractor;
use crate::taxonomy::{ACTIVITIES, BENEFICIARIES, INSTRUMENTS, PURPOSES};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns a free-text grant question into registry filters.
///
/// Construction embeds the four semantic tables once; `parse` then costs one
/// embedding call per query.
pub struct QueryParser {
    embedder: Arc<dyn Embedder>,
    thresholds: ClassifierThresholds,
    lexical: LexicalExtractor,
    beneficiaries: TaxonomyIndex,
    activities: TaxonomyIndex,
    instruments: TaxonomyIndex,
    purposes: TaxonomyIndex,
}

#[derive(Debug, Default)]
struct SemanticFields {
    beneficiary_types: Option<BTreeSet<u32>>,
    instruments: Option<BTreeSet<u32>>,
    purpose: Option<u32>,
    activity: Option<u32>,
}

impl QueryParser {
    pub async fn new(
        embedder: Arc<dyn Embedder>,
        thresholds: ClassifierThresholds,
    ) -> Result<Self, ParserError> {
        let lexical = LexicalExtractor::new()?;
        let beneficiaries = TaxonomyIndex::build(embedder.as_ref(), BENEFICIARIES).await?;
        let activities = TaxonomyIndex::build(embedder.as_ref(), ACTIVITIES).await?;
        let instruments = TaxonomyIndex::build(embedder.as_ref(), INSTRUMENTS).await?;
        let purposes = TaxonomyIndex::build(embedder.as_ref(), PURPOSES).await?;

        Ok(Self {
            embedder,
            thresholds,
            lexical,
            beneficiaries,
            activities,
            instruments,
            purposes,
        })
    }

    /// Never fails: a dimension that cannot be extracted is left unset.
    pub async fn parse(&self, query: &str) -> FilterSet {
        let normalized = query.trim().to_lowercase();
        let dates = self.lexical.dates(&normalized);
        let semantic = self.semantic_fields(&normalized).await;

        let filters = FilterSet {
            description: self.lexical.description(&normalized),
            description_search_mode: DescriptionMatch::AllWords,
            regions: self.lexical.regions(&normalized),
            administration_type: self.lexical.administration_type(&normalized),
            beneficiary_types: semantic.beneficiary_types,
            instruments: semantic.instruments,
            purpose: semantic.purpose,
            activity: semantic.activity,
            date_from: dates.from,
            date_to: dates.to,
            grant_call_number: self.lexical.grant_call_number(query),
            recovery_fund_flag: self.lexical.recovery_fund(&normalized),
            ..FilterSet::default()
        };

        debug!(query = %normalized, filters = ?filters, "parsed grant query");
        filters
    }

    async fn semantic_fields(&self, normalized: &str) -> SemanticFields {
        if normalized.is_empty() {
            return SemanticFields::default();
        }

        let query_vector = match self.embedder.embed(normalized).await {
            Ok(vector) => vector,
            Err(error) => {
                warn!(%error, "query embedding failed, semantic filters left unset");
                return SemanticFields::default();
            }
        };

        let thresholds = self.thresholds;
        let single_id = |index: &TaxonomyIndex, threshold: f32| {
            index
                .best_match(&query_vector, threshold)
                .and_then(|entry| entry.ids.first().copied())
        };

        SemanticFields {
            beneficiary_types: self
                .beneficiaries
                .best_match(&query_vector, thresholds.beneficiary)
                .map(|entry| entry.ids.iter().copied().collect()),
            instruments: self.instruments.top_matches(
                &query_vector,
                thresholds.instrument_top_n,
                thresholds.instrument,
            ),
            purpose: single_id(&self.purposes, thresholds.purpose),
            activity: single_id(&self.activities, thresholds.activity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::{FailingEmbedder, KeywordEmbedder};
    use crate::filters::SortDirection;
    use chrono::NaiveDate;

    const VOCABULARY: &[&str] = &["vivienda", "préstamo", "autónomo", "agricultura"];

    async fn parser_with(thresholds: ClassifierThresholds) -> (QueryParser, Arc<KeywordEmbedder>) {
        let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY));
        let parser = QueryParser::new(embedder.clone(), thresholds)
            .await
            .expect("fake embedder never fails");
        (parser, embedder)
    }

    #[tokio::test]
    async fn taxonomy_tables_are_embedded_once_per_table() {
        let (parser, embedder) = parser_with(ClassifierThresholds::default()).await;
        assert_eq!(embedder.calls(), 4);

        parser.parse("ayudas de vivienda").await;
        parser.parse("préstamo para autónomos").await;
        assert_eq!(embedder.calls(), 6);
    }

    #[tokio::test]
    async fn housing_query_in_madrid() {
        let (parser, _) = parser_with(ClassifierThresholds::default()).await;
        let filters = parser
            .parse("quiero ayudas para vivienda en la comunidad de madrid")
            .await;

        let regions = filters.regions.clone().unwrap_or_default();
        assert!(regions.contains(&26));
        let description = filters.description.clone().unwrap_or_default();
        for stop_word in ["quiero", "para", "en", "la"] {
            assert!(!description.split(' ').any(|token| token == stop_word));
        }
        assert!(description.contains("vivienda"));
        assert_eq!(filters.purpose, Some(8));
        assert_eq!(filters.beneficiary_types, None);
        assert_eq!(filters.instruments, None);
        assert_eq!(filters.activity, None);
        assert_eq!(filters.grant_call_number, None);
    }

    #[tokio::test]
    async fn six_digit_query_is_a_grant_number() {
        let (parser, _) = parser_with(ClassifierThresholds::default()).await;
        let filters = parser.parse("842695").await;
        assert_eq!(filters.grant_call_number.as_deref(), Some("842695"));
        assert_eq!(filters.description, None);
    }

    #[tokio::test]
    async fn grant_number_is_taken_from_original_text() {
        let (parser, _) = parser_with(ClassifierThresholds::default()).await;
        let filters = parser.parse("  Convocatoria BDNS 842695  ").await;
        assert_eq!(filters.grant_call_number.as_deref(), Some("842695"));
    }

    #[tokio::test]
    async fn loans_for_self_employed() {
        let (parser, _) = parser_with(ClassifierThresholds::default()).await;
        let filters = parser.parse("préstamo para autónomos").await;

        assert_eq!(filters.beneficiary_types, Some([3].into_iter().collect()));
        let instruments = filters.instruments.unwrap_or_default();
        assert!(instruments.contains(&2));
        assert!(instruments.len() <= 2);
    }

    #[tokio::test]
    async fn low_scores_leave_semantic_fields_unset() {
        let thresholds = ClassifierThresholds {
            beneficiary: 0.99,
            activity: 0.99,
            purpose: 0.99,
            instrument: 0.99,
            instrument_top_n: 2,
        };
        let (parser, _) = parser_with(thresholds).await;
        let filters = parser.parse("préstamo para autónomos del campo").await;

        assert_eq!(filters.beneficiary_types, None);
        assert_eq!(filters.instruments, None);
        assert_eq!(filters.purpose, None);
        assert_eq!(filters.activity, None);
        assert!(filters.description.is_some());
    }

    #[tokio::test]
    async fn defaults_fill_unset_fields() {
        let (parser, _) = parser_with(ClassifierThresholds::default()).await;
        let filters = parser.parse("").await;

        assert!(filters.is_unconstrained());
        assert_eq!(filters.sort_field, "fechaRecepcion");
        assert_eq!(filters.sort_direction, SortDirection::Desc);
        assert_eq!(filters.portal_code, "GE");
        assert_eq!(filters.page, 0);
        assert_eq!(filters.page_size, 25);
    }

    #[tokio::test]
    async fn parse_is_idempotent() {
        let (parser, _) = parser_with(ClassifierThresholds::default()).await;
        let query = "ayudas mrr para agricultura en galicia desde 01/02/2024";
        let first = parser.parse(query).await;
        let second = parser.parse(query).await;
        assert_eq!(first, second);
        assert_eq!(first.recovery_fund_flag, Some(true));
        assert_eq!(first.date_from, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert!(first.regions.unwrap_or_default().contains(&3));
    }

    #[tokio::test]
    async fn embedding_failure_degrades_to_lexical_filters() {
        let (lexical_only, _) = parser_with(ClassifierThresholds::default()).await;
        let broken = QueryParser {
            embedder: Arc::new(FailingEmbedder),
            ..lexical_only
        };

        let filters = broken.parse("préstamo para autónomos en sevilla").await;
        assert!(filters.regions.unwrap_or_default().contains(&71));
        assert_eq!(filters.beneficiary_types, None);
        assert_eq!(filters.instruments, None);
    }

    #[tokio::test]
    async fn construction_fails_when_tables_cannot_be_embedded() {
        let result = QueryParser::new(Arc::new(FailingEmbedder), ClassifierThresholds::default()).await;
        assert!(matches!(result, Err(ParserError::Model(_))));
    }
}
