use crate::config::{GenerationParams, OpenAiSettings};
use crate::embeddings::Embedder;
use crate::error::ModelError;
use crate::generator::Generator;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

const BACKEND: &str = "openai";

/// Output size of `text-embedding-3-small`.
pub const DEFAULT_OPENAI_EMBEDDING_DIMENSIONS: usize = 1_536;

fn build_client(settings: &OpenAiSettings) -> Result<Client, ModelError> {
    if settings.api_key.trim().is_empty() {
        return Err(ModelError::Configuration("openai api key is empty".to_string()));
    }
    Ok(Client::builder().timeout(settings.timeout).build()?)
}

async fn post_json(
    client: &Client,
    settings: &OpenAiSettings,
    path: &str,
    body: &Value,
) -> Result<Value, ModelError> {
    let response = client
        .post(format!("{}/{path}", settings.base_url.trim_end_matches('/')))
        .bearer_auth(&settings.api_key)
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let details = response.text().await.unwrap_or_default();
        return Err(ModelError::BackendResponse {
            backend: BACKEND.to_string(),
            details: format!("{status}: {details}"),
        });
    }

    Ok(response.json().await?)
}

pub struct OpenAiEmbedder {
    client: Client,
    settings: OpenAiSettings,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(settings: OpenAiSettings) -> Result<Self, ModelError> {
        Ok(Self {
            client: build_client(&settings)?,
            settings,
            dimensions: DEFAULT_OPENAI_EMBEDDING_DIMENSIONS,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.settings.embedding_model,
            "input": texts,
        });
        let parsed = post_json(&self.client, &self.settings, "embeddings", &body).await?;
        debug!(model = %self.settings.embedding_model, inputs = texts.len(), "embedded batch");
        parse_embeddings(&parsed, texts.len())
    }
}

/// Vectors of an `/embeddings` response in input order.
fn parse_embeddings(parsed: &Value, expected: usize) -> Result<Vec<Vec<f32>>, ModelError> {
    let data = parsed
        .pointer("/data")
        .and_then(Value::as_array)
        .ok_or_else(|| ModelError::InvalidOutput("embedding response has no data".to_string()))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let index = item
            .pointer("/index")
            .and_then(Value::as_u64)
            .map(|index| index as usize)
            .unwrap_or(position);
        let vector = item
            .pointer("/embedding")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ModelError::InvalidOutput(format!("embedding {index} is missing its vector"))
            })?
            .iter()
            .map(|value| value.as_f64().map(|value| value as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| {
                ModelError::InvalidOutput(format!("embedding {index} has non-numeric values"))
            })?;
        indexed.push((index, vector));
    }

    if indexed.len() != expected {
        return Err(ModelError::InvalidOutput(format!(
            "{} embeddings for {expected} inputs",
            indexed.len()
        )));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}

pub struct OpenAiGenerator {
    client: Client,
    settings: OpenAiSettings,
}

impl OpenAiGenerator {
    pub fn new(settings: OpenAiSettings) -> Result<Self, ModelError> {
        Ok(Self {
            client: build_client(&settings)?,
            settings,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ModelError> {
        let body = json!({
            "model": self.settings.chat_model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "top_p": params.top_p,
        });
        let parsed = post_json(&self.client, &self.settings, "chat/completions", &body).await?;
        debug!(model = %self.settings.chat_model, "completion received");
        parse_completion(&parsed)
    }
}

fn parse_completion(parsed: &Value) -> Result<String, ModelError> {
    parsed
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ModelError::InvalidOutput("completion has no message content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeddings_are_reordered_by_index() -> Result<(), ModelError> {
        let parsed = json!({
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] },
            ]
        });

        let vectors = parse_embeddings(&parsed, 2)?;
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        Ok(())
    }

    #[test]
    fn embedding_count_mismatch_is_invalid_output() {
        let parsed = json!({ "data": [{ "index": 0, "embedding": [1.0] }] });
        assert!(matches!(
            parse_embeddings(&parsed, 2),
            Err(ModelError::InvalidOutput(_))
        ));
        assert!(matches!(
            parse_embeddings(&json!({ "error": "quota" }), 1),
            Err(ModelError::InvalidOutput(_))
        ));
    }

    #[test]
    fn completion_content_is_extracted() -> Result<(), ModelError> {
        let parsed = json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Sí, es compatible.\n" } }]
        });
        assert_eq!(parse_completion(&parsed)?, "Sí, es compatible.");
        assert!(parse_completion(&json!({ "choices": [] })).is_err());
        Ok(())
    }

    #[test]
    fn empty_api_key_fails_fast() {
        let result = OpenAiGenerator::new(OpenAiSettings::new("  "));
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[tokio::test]
    async fn empty_batch_needs_no_request() -> Result<(), ModelError> {
        let embedder = OpenAiEmbedder::new(OpenAiSettings::new("sk-test"))?;
        assert!(embedder.embed_batch(&[]).await?.is_empty());
        assert_eq!(embedder.dimensions(), DEFAULT_OPENAI_EMBEDDING_DIMENSIONS);
        Ok(())
    }
}
