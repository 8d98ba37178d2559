pub mod backends;
pub mod chunking;
pub mod classifier;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod filters;
pub mod generator;
pub mod index;
pub mod ingest;
pub mod lexical;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod registry;
pub mod retriever;
pub mod taxonomy;

pub use backends::{OpenAiEmbedder, OpenAiGenerator};
pub use chunking::chunk_text;
pub use classifier::{ScoredEntry, TaxonomyIndex};
pub use config::{
    AssistantConfig, ChunkingConfig, ClassifierThresholds, GenerationParams, OpenAiSettings,
    RegistrySettings, RetrievalConfig,
};
pub use embeddings::{cosine_similarity, CharacterNgramEmbedder, Embedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ConfigError, IngestError, ModelError, ParserError, RegistryError};
pub use extractor::{LopdfExtractor, PageText, PdfExtractor};
pub use filters::{AdministrationType, DescriptionMatch, FilterSet, SortDirection};
pub use generator::{build_prompt, clean_answer, Answer, Generator, NOT_PROCESSED_MESSAGE};
pub use index::{ChunkIndex, IndexHandle, ScoredChunk, TextChunk};
pub use ingest::{discover_pdf_files, document_id, extract_documents, ExtractionReport, SkippedDocument};
pub use models::LazyModel;
pub use orchestrator::{GrantAssistant, ProcessingReport};
pub use parser::QueryParser;
pub use registry::{
    call_documents, search_all, DocumentRef, GrantRegistry, GrantSummary, PaginationOptions,
    RegistryClient, RegistryPayload,
};
pub use retriever::{Retrieval, Retriever};
pub use taxonomy::{Taxonomy, TaxonomyEntry};
