use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use grant_search_core::{
    call_documents, discover_pdf_files, search_all, AssistantConfig, CharacterNgramEmbedder,
    Embedder, Generator, GrantAssistant, GrantSummary, LazyModel, LopdfExtractor, ModelError,
    OpenAiEmbedder, OpenAiGenerator, OpenAiSettings, PaginationOptions, RegistryClient,
    RegistrySettings,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "grant-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Embedding and generation backends.
    #[arg(long, value_enum, default_value_t = Backend::Openai, env = "GRANT_SEARCH_BACKEND")]
    backend: Backend,

    /// JSON file overriding the default thresholds, chunking and generation settings.
    #[arg(long, env = "GRANT_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Folder where registry documents are downloaded.
    #[arg(long, default_value = "documentos", env = "GRANT_SEARCH_DOWNLOAD_DIR")]
    download_dir: PathBuf,

    /// Write the extracted text of processed documents to this file.
    #[arg(long)]
    transcript: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Offline trigram embeddings, no answer generation.
    Local,
    /// OpenAI-compatible HTTP API.
    Openai,
}

#[derive(Subcommand)]
enum Command {
    /// Print the registry filters extracted from a free-text query.
    Parse {
        #[arg(long)]
        query: String,
    },
    /// Search the grants registry with the filters extracted from a query.
    Search {
        #[arg(long)]
        query: String,
    },
    /// Show one grant call and its documents.
    Call {
        /// BDNS number of the call.
        #[arg(long)]
        number: String,
    },
    /// Answer questions about grant documents.
    #[command(group(ArgGroup::new("source").required(true).args(["document", "folder", "call"])))]
    Ask {
        #[arg(long, required = true, num_args = 1..)]
        question: Vec<String>,
        /// PDF files to process.
        #[arg(long, num_args = 1..)]
        document: Vec<PathBuf>,
        /// Folder searched recursively for PDFs.
        #[arg(long)]
        folder: Option<PathBuf>,
        /// BDNS number whose documents are downloaded and processed.
        #[arg(long)]
        call: Option<String>,
        /// Number of chunks retrieved per question.
        #[arg(long)]
        top_k: Option<usize>,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<AssistantConfig> {
    let mut config = match &cli.config {
        Some(path) => AssistantConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => AssistantConfig::default(),
    };
    if cli.transcript.is_some() {
        config.transcript_path = cli.transcript.clone();
    }
    Ok(config)
}

fn build_assistant(backend: Backend, config: AssistantConfig) -> GrantAssistant {
    let (embedder, generator) = match backend {
        Backend::Local => (
            LazyModel::new("character-ngram", || -> Result<Arc<dyn Embedder>, ModelError> {
                Ok(Arc::new(CharacterNgramEmbedder::default()))
            }),
            LazyModel::new("generator", || -> Result<Arc<dyn Generator>, ModelError> {
                Err(ModelError::Configuration(
                    "the local backend cannot generate answers, use --backend openai".to_string(),
                ))
            }),
        ),
        Backend::Openai => (
            LazyModel::new("openai-embeddings", || -> Result<Arc<dyn Embedder>, ModelError> {
                Ok(Arc::new(OpenAiEmbedder::new(OpenAiSettings::from_env()?)?))
            }),
            LazyModel::new("openai-chat", || -> Result<Arc<dyn Generator>, ModelError> {
                Ok(Arc::new(OpenAiGenerator::new(OpenAiSettings::from_env()?)?))
            }),
        ),
    };

    GrantAssistant::new(config, Arc::new(LopdfExtractor), embedder, generator)
}

/// Downloads every document of a call; failed downloads are skipped.
async fn download_call_documents(
    registry: &RegistryClient,
    number: &str,
    download_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let detail = registry
        .fetch_call(number)
        .await?
        .with_context(|| format!("grant call {number} not found"))?;

    let folder = download_dir.join(number);
    let mut paths = Vec::new();
    for document in call_documents(&detail) {
        match registry.download_document(&document, &folder).await {
            Ok(path) => paths.push(path),
            Err(error) => warn!(id = %document.id, %error, "skipping document download"),
        }
    }
    Ok(paths)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "grant-search boot"
    );

    match cli.command {
        Command::Parse { query } => {
            let assistant = build_assistant(cli.backend, config);
            let filters = assistant.parse(&query).await?;
            println!("{}", serde_json::to_string_pretty(&filters)?);
        }
        Command::Search { query } => {
            let assistant = build_assistant(cli.backend, config);
            let filters = assistant.parse(&query).await?;
            info!(filters = %serde_json::to_string(&filters)?, "searching registry");

            let settings = RegistrySettings::default();
            let options = PaginationOptions::from(&settings);
            let registry = RegistryClient::new(settings)?;
            let records = search_all(&registry, &filters, &options).await;

            println!("{} convocatorias", records.len());
            for record in &records {
                println!("\n{}", GrantSummary::from_record(record));
            }
        }
        Command::Call { number } => {
            let registry = RegistryClient::new(RegistrySettings::default())?;
            let Some(detail) = registry.fetch_call(&number).await? else {
                println!("convocatoria {number} no encontrada");
                return Ok(());
            };

            println!("{}", GrantSummary::from_record(&detail));
            let documents = call_documents(&detail);
            if !documents.is_empty() {
                println!("\nDocumentos:");
                for document in documents {
                    println!("  [{}] {}", document.id, document.file_name);
                }
            }
        }
        Command::Ask {
            question,
            document,
            folder,
            call,
            top_k,
        } => {
            if let Some(top_k) = top_k {
                config.retrieval.top_k = top_k.max(1);
            }

            let paths = if let Some(number) = call {
                let registry = RegistryClient::new(RegistrySettings::default())?;
                download_call_documents(&registry, &number, &cli.download_dir).await?
            } else if let Some(folder) = folder {
                discover_pdf_files(&folder)
            } else {
                document
            };
            anyhow::ensure!(!paths.is_empty(), "no documents to process");

            let assistant = build_assistant(cli.backend, config);
            let report = assistant.process_documents(&paths).await?;
            for skipped in &report.skipped {
                warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped document");
            }
            println!(
                "{} documento(s), {} fragmentos procesados",
                report.documents, report.chunks
            );

            for question in question {
                let answer = assistant.answer(&question).await?;
                println!("\nPregunta: {question}\n{}", answer.text());
            }
        }
    }

    Ok(())
}
