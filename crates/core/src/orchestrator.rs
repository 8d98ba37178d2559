use crate::chunking::chunk_text;
use crate::config::AssistantConfig;
use crate::embeddings::Embedder;
use crate::error::{IngestError, ModelError, ParserError};
use crate::extractor::PdfExtractor;
use crate::filters::FilterSet;
use crate::generator::{generate_answer, Answer, Generator};
use crate::index::{ChunkIndex, IndexHandle, TextChunk};
use crate::ingest::{extract_documents, SkippedDocument};
use crate::models::LazyModel;
use crate::parser::QueryParser;
use crate::retriever::{Retrieval, Retriever};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingReport {
    pub generation: Uuid,
    pub documents: usize,
    pub chunks: usize,
    pub skipped: Vec<SkippedDocument>,
}

/// Owns the models, the query parser and the chunk index.
///
/// Models load on first use; the parser is built the first time a query is
/// parsed; the index is replaced whole by each `process_documents` call.
pub struct GrantAssistant {
    config: AssistantConfig,
    extractor: Arc<dyn PdfExtractor>,
    embedder: LazyModel<dyn Embedder>,
    generator: LazyModel<dyn Generator>,
    parser: OnceCell<QueryParser>,
    index: IndexHandle,
}

impl GrantAssistant {
    pub fn new(
        config: AssistantConfig,
        extractor: Arc<dyn PdfExtractor>,
        embedder: LazyModel<dyn Embedder>,
        generator: LazyModel<dyn Generator>,
    ) -> Self {
        Self {
            config,
            extractor,
            embedder,
            generator,
            parser: OnceCell::new(),
            index: IndexHandle::new(),
        }
    }

    pub fn index(&self) -> &IndexHandle {
        &self.index
    }

    async fn parser(&self) -> Result<&QueryParser, ParserError> {
        self.parser
            .get_or_try_init(|| async {
                match self.embedder.get().await {
                    Ok(embedder) => QueryParser::new(embedder, self.config.thresholds).await,
                    Err(error) => Err(error.into()),
                }
            })
            .await
    }

    pub async fn parse(&self, query: &str) -> Result<FilterSet, ParserError> {
        Ok(self.parser().await?.parse(query).await)
    }

    /// Extracts, chunks and embeds `paths`, then swaps in the new index.
    ///
    /// Unreadable documents are skipped. When nothing readable remains the
    /// current index is left untouched.
    pub async fn process_documents(
        &self,
        paths: &[PathBuf],
    ) -> Result<ProcessingReport, IngestError> {
        if paths.is_empty() {
            return Err(IngestError::InvalidArgument("no documents given".to_string()));
        }
        self.config.chunking.validate()?;

        let extractor = Arc::clone(&self.extractor);
        let batch = paths.to_vec();
        let extraction =
            tokio::task::spawn_blocking(move || extract_documents(extractor.as_ref(), &batch))
                .await?;
        if extraction.documents.is_empty() {
            warn!(skipped = extraction.skipped.len(), "no readable text, index kept");
            return Err(IngestError::NoReadableText(paths.len()));
        }

        let mut pending: Vec<(String, String)> = Vec::new();
        for document in &extraction.documents {
            for text in chunk_text(&document.text, &self.config.chunking)? {
                pending.push((text, document.document_id.clone()));
            }
        }

        let embedder = self.embedder.get().await?;
        let mut chunks = Vec::with_capacity(pending.len());
        for batch in pending.chunks(self.config.embedding_batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|(text, _)| text.clone()).collect();
            let embeddings = embedder.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(ModelError::InvalidOutput(format!(
                    "{} embeddings for {} chunks",
                    embeddings.len(),
                    batch.len()
                ))
                .into());
            }

            for ((text, document_id), embedding) in batch.iter().zip(embeddings) {
                chunks.push(TextChunk {
                    index: chunks.len(),
                    text: text.clone(),
                    embedding,
                    document_id: document_id.clone(),
                });
            }
        }

        let transcript = self
            .config
            .transcript_path
            .as_ref()
            .map(|path| (path, extraction.transcript()));

        let index = ChunkIndex::new(chunks);
        let report = ProcessingReport {
            generation: index.generation(),
            documents: extraction.documents.len(),
            chunks: index.len(),
            skipped: extraction.skipped,
        };
        self.index.replace(index).await;

        if let Some((path, text)) = transcript {
            if let Err(error) = tokio::fs::write(path, text).await {
                warn!(path = %path.display(), %error, "transcript not written");
            }
        }

        info!(
            generation = %report.generation,
            documents = report.documents,
            chunks = report.chunks,
            skipped = report.skipped.len(),
            "documents processed"
        );
        Ok(report)
    }

    /// Top chunks for `question`; the embedder is not loaded while no index exists.
    pub async fn retrieve(&self, question: &str) -> Result<Retrieval, ModelError> {
        if self.index.current().await.is_none() {
            return Ok(Retrieval::NotProcessed);
        }

        let embedder = self.embedder.get().await?;
        Retriever::new(embedder.as_ref(), &self.index)
            .retrieve(question, self.config.retrieval.top_k)
            .await
    }

    pub async fn answer(&self, question: &str) -> Result<Answer, ModelError> {
        let retrieval = self.retrieve(question).await?;
        if retrieval == Retrieval::NotProcessed {
            return Ok(Answer::NotProcessed);
        }

        let generator = self.generator.get().await?;
        generate_answer(
            generator.as_ref(),
            question,
            &retrieval,
            self.config.retrieval.max_context_chars,
            &self.config.generation,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::KeywordEmbedder;
    use crate::config::ChunkingConfig;
    use crate::generator::testing::EchoGenerator;
    use crate::generator::NOT_PROCESSED_MESSAGE;
    use crate::ingest::testing::InMemoryExtractor;
    use tempfile::tempdir;

    const VOCABULARY: &[&str] = &["plazo", "importe", "beneficiarios", "vivienda"];

    struct Fixture {
        assistant: GrantAssistant,
        embedder: Arc<KeywordEmbedder>,
        generator: Arc<EchoGenerator>,
    }

    fn fixture(config: AssistantConfig, extractor: InMemoryExtractor) -> Fixture {
        let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY));
        let generator = Arc::new(EchoGenerator::new("Veinte días hábiles."));
        let assistant = GrantAssistant::new(
            config,
            Arc::new(extractor),
            LazyModel::ready("embedder", embedder.clone() as Arc<dyn Embedder>),
            LazyModel::ready("generator", generator.clone() as Arc<dyn Generator>),
        );
        Fixture {
            assistant,
            embedder,
            generator,
        }
    }

    fn grant_documents() -> InMemoryExtractor {
        InMemoryExtractor::default()
            .with_document(
                "bases.pdf",
                &[
                    "Podrán ser beneficiarios las pymes.",
                    "El plazo de solicitud es de veinte días hábiles.",
                ],
            )
            .with_document("anexo.pdf", &["El importe máximo es de 10.000 euros."])
            .with_document("escaneado.pdf", &[""])
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn answer_before_processing_is_the_sentinel() -> Result<(), ModelError> {
        let failing = GrantAssistant::new(
            AssistantConfig::default(),
            Arc::new(InMemoryExtractor::default()),
            LazyModel::new("embedder", || -> Result<Arc<dyn Embedder>, ModelError> {
                Err(ModelError::Configuration("no embedder".to_string()))
            }),
            LazyModel::new("generator", || -> Result<Arc<dyn Generator>, ModelError> {
                Err(ModelError::Configuration("no generator".to_string()))
            }),
        );

        let answer = failing.answer("¿Cuál es el plazo?").await?;
        assert_eq!(answer, Answer::NotProcessed);
        assert_eq!(answer.text(), NOT_PROCESSED_MESSAGE);
        assert_eq!(failing.retrieve("¿plazo?").await?, Retrieval::NotProcessed);
        Ok(())
    }

    #[tokio::test]
    async fn processing_then_answering() -> Result<(), Box<dyn std::error::Error>> {
        let Fixture {
            assistant,
            generator,
            ..
        } = fixture(AssistantConfig::default(), grant_documents());

        let report = assistant
            .process_documents(&paths(&["bases.pdf", "anexo.pdf", "escaneado.pdf"]))
            .await?;
        assert_eq!(report.documents, 2);
        assert_eq!(report.chunks, 2);
        assert_eq!(report.skipped.len(), 1);

        let answer = assistant.answer("¿Cuál es el plazo de solicitud?").await?;
        assert_eq!(answer.text(), "Veinte días hábiles.");

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        let context_start = prompts[0].find("Contexto:").unwrap_or(usize::MAX);
        let plazo = prompts[0].find("El plazo de solicitud").unwrap_or(0);
        let importe = prompts[0].find("El importe máximo").unwrap_or(usize::MAX);
        assert!(context_start < plazo);
        assert!(plazo < importe);
        Ok(())
    }

    #[tokio::test]
    async fn chunk_indexes_run_across_documents() -> Result<(), Box<dyn std::error::Error>> {
        let config = AssistantConfig {
            chunking: ChunkingConfig::new(20, 5),
            embedding_batch_size: 2,
            ..AssistantConfig::default()
        };
        let Fixture { assistant, .. } = fixture(config, grant_documents());

        assistant
            .process_documents(&paths(&["bases.pdf", "anexo.pdf"]))
            .await?;
        let index = assistant.index().current().await.ok_or("index missing")?;

        let positions: Vec<usize> = index.chunks().iter().map(|chunk| chunk.index).collect();
        assert_eq!(positions, (0..index.len()).collect::<Vec<_>>());

        let bases = crate::ingest::document_id(std::path::Path::new("bases.pdf"));
        let anexo = crate::ingest::document_id(std::path::Path::new("anexo.pdf"));
        let first_anexo = index
            .chunks()
            .iter()
            .position(|chunk| chunk.document_id == anexo)
            .ok_or("no anexo chunk")?;
        assert!(index.chunks()[..first_anexo]
            .iter()
            .all(|chunk| chunk.document_id == bases));
        assert!(index.chunks()[first_anexo].text.starts_with("El importe"));
        Ok(())
    }

    #[tokio::test]
    async fn reprocessing_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
        let config = AssistantConfig {
            chunking: ChunkingConfig::new(30, 10),
            ..AssistantConfig::default()
        };
        let Fixture { assistant, .. } = fixture(config, grant_documents());
        let batch = paths(&["bases.pdf", "anexo.pdf"]);

        let first = assistant.process_documents(&batch).await?;
        let first_index = assistant.index().current().await.ok_or("index missing")?;
        let second = assistant.process_documents(&batch).await?;
        let second_index = assistant.index().current().await.ok_or("index missing")?;

        assert_ne!(first.generation, second.generation);
        assert_eq!(first_index.chunks(), second_index.chunks());
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_batch_keeps_previous_index() -> Result<(), Box<dyn std::error::Error>> {
        let Fixture { assistant, .. } = fixture(AssistantConfig::default(), grant_documents());

        let report = assistant.process_documents(&paths(&["anexo.pdf"])).await?;
        let result = assistant
            .process_documents(&paths(&["escaneado.pdf", "perdido.pdf"]))
            .await;

        assert!(matches!(result, Err(IngestError::NoReadableText(2))));
        let current = assistant.index().current().await.ok_or("index missing")?;
        assert_eq!(current.generation(), report.generation);
        Ok(())
    }

    #[tokio::test]
    async fn transcript_is_written_when_configured() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let transcript = dir.path().join("convocatoria.txt");
        let config = AssistantConfig {
            transcript_path: Some(transcript.clone()),
            ..AssistantConfig::default()
        };
        let Fixture { assistant, .. } = fixture(config, grant_documents());

        assistant
            .process_documents(&paths(&["bases.pdf", "anexo.pdf"]))
            .await?;
        let written = std::fs::read_to_string(&transcript)?;
        assert!(written.contains("veinte días hábiles"));
        assert!(written.contains("10.000 euros"));
        Ok(())
    }

    #[tokio::test]
    async fn transcript_failure_still_swaps_the_index() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let config = AssistantConfig {
            transcript_path: Some(dir.path().join("no-existe").join("convocatoria.txt")),
            ..AssistantConfig::default()
        };
        let Fixture { assistant, .. } = fixture(config, grant_documents());

        let report = assistant.process_documents(&paths(&["bases.pdf"])).await?;
        let current = assistant.index().current().await.ok_or("index missing")?;
        assert_eq!(current.generation(), report.generation);
        assert!(!current.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn parser_is_built_once() -> Result<(), ParserError> {
        let Fixture {
            assistant,
            embedder,
            ..
        } = fixture(AssistantConfig::default(), InMemoryExtractor::default());

        let first = assistant.parse("ayudas de vivienda en cantabria").await?;
        let second = assistant.parse("ayudas de vivienda en cantabria").await?;
        assert_eq!(first, second);
        assert_eq!(first.purpose, Some(8));
        assert!(first.regions.unwrap_or_default().contains(&10));
        assert_eq!(embedder.calls(), 4 + 2);
        Ok(())
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let Fixture { assistant, .. } = fixture(AssistantConfig::default(), grant_documents());
        let result = assistant.process_documents(&[]).await;
        assert!(matches!(result, Err(IngestError::InvalidArgument(_))));
    }
}
