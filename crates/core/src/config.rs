use crate::error::{ConfigError, ModelError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_FILE: &str = "openai_api_key.txt";

pub const DEFAULT_SEARCH_URL: &str =
    "https://www.pap.hacienda.gob.es/bdnstrans/api/convocatorias/busqueda";
pub const DEFAULT_DETAIL_URL: &str = "https://www.infosubvenciones.es/bdnstrans/api/convocatorias";

/// Minimum cosine similarity a taxonomy entry must exceed to be accepted.
///
/// The cutoffs are empirical; anything at or below them is treated as noise
/// and leaves the dimension unset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub beneficiary: f32,
    pub activity: f32,
    pub purpose: f32,
    pub instrument: f32,
    pub instrument_top_n: usize,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            beneficiary: 0.20,
            activity: 0.20,
            purpose: 0.20,
            instrument: 0.20,
            instrument_top_n: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1_000,
            overlap_chars: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn new(max_chars: usize, overlap_chars: usize) -> Self {
        Self {
            max_chars,
            overlap_chars,
        }
    }

    pub fn stride(&self) -> usize {
        self.max_chars - self.overlap_chars
    }

    pub fn validate(&self) -> Result<(), crate::IngestError> {
        if self.max_chars == 0 {
            return Err(crate::IngestError::InvalidChunkConfig(
                "max_chars must be positive".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(crate::IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than chunk size {}",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Upper bound on the characters of retrieved context placed in a prompt.
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_context_chars: 6_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 600,
            temperature: 0.3,
            top_p: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub thresholds: ClassifierThresholds,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationParams,
    pub embedding_batch_size: usize,
    pub transcript_path: Option<PathBuf>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            thresholds: ClassifierThresholds::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationParams::default(),
            embedding_batch_size: 64,
            transcript_path: None,
        }
    }
}

impl AssistantConfig {
    /// Reads a JSON file; keys it leaves out keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking
            .validate()
            .map_err(|error| ConfigError::Invalid(error.to_string()))?;
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be positive".to_string()));
        }
        if self.embedding_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "embedding_batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub timeout: Duration,
}

impl OpenAiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Resolves credentials from `OPENAI_API_KEY`, falling back to the key file
    /// named by `OPENAI_API_KEY_FILE` (default `openai_api_key.txt`).
    pub fn from_env() -> Result<Self, ModelError> {
        let api_key = match non_empty_env("OPENAI_API_KEY") {
            Some(key) => key,
            None => {
                let key_file = non_empty_env("OPENAI_API_KEY_FILE")
                    .unwrap_or_else(|| DEFAULT_API_KEY_FILE.to_string());
                read_key_file(Path::new(&key_file))?
            }
        };

        let mut settings = Self::new(api_key);
        if let Some(base_url) = non_empty_env("OPENAI_BASE_URL") {
            settings.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(model) = non_empty_env("OPENAI_EMBEDDING_MODEL") {
            settings.embedding_model = model;
        }
        if let Some(model) = non_empty_env("OPENAI_CHAT_MODEL") {
            settings.chat_model = model;
        }
        Ok(settings)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let value = value.trim().to_string();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn read_key_file(path: &Path) -> Result<String, ModelError> {
    let raw = std::fs::read_to_string(path).map_err(|error| {
        ModelError::Configuration(format!(
            "OPENAI_API_KEY is not set and key file {} is unreadable: {error}",
            path.display()
        ))
    })?;

    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ModelError::Configuration(format!("key file {} is empty", path.display()))
        })
}

#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub search_url: String,
    pub detail_url: String,
    pub portal_code: String,
    pub max_pages: u32,
    pub page_delay: Duration,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            detail_url: DEFAULT_DETAIL_URL.to_string(),
            portal_code: "GE".to_string(),
            max_pages: 3,
            page_delay: Duration::from_millis(500),
        }
    }
}
