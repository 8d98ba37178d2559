//! Client side of the national grants registry (BDNS): paginated search,
//! call detail lookup and document download.

use crate::config::RegistrySettings;
use crate::error::RegistryError;
use crate::filters::FilterSet;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const BACKEND: &str = "bdns";

/// Shape of a registry response body.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryPayload {
    RecordList(Vec<Value>),
    SingleRecord(Value),
    Malformed(String),
}

impl RegistryPayload {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(records) => Self::RecordList(records),
            Value::Object(mut object) => {
                for key in ["convocatorias", "content"] {
                    if !object.get(key).is_some_and(Value::is_array) {
                        continue;
                    }
                    if let Some(Value::Array(records)) = object.remove(key) {
                        return Self::RecordList(records);
                    }
                }
                Self::SingleRecord(Value::Object(object))
            }
            other => Self::Malformed(format!("unexpected json {}", json_kind(&other))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
pub trait GrantRegistry: Send + Sync {
    async fn search_page(
        &self,
        filters: &FilterSet,
        page: u32,
    ) -> Result<RegistryPayload, RegistryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOptions {
    pub max_pages: u32,
    pub page_delay: Duration,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self::from(&RegistrySettings::default())
    }
}

impl From<&RegistrySettings> for PaginationOptions {
    fn from(settings: &RegistrySettings) -> Self {
        Self {
            max_pages: settings.max_pages,
            page_delay: settings.page_delay,
        }
    }
}

/// Collects records from up to `max_pages` pages starting at `filters.page`.
///
/// An empty page ends the search. A failing or malformed page is skipped.
pub async fn search_all(
    registry: &dyn GrantRegistry,
    filters: &FilterSet,
    options: &PaginationOptions,
) -> Vec<Value> {
    let mut records = Vec::new();
    let first = filters.page;
    let last = first.saturating_add(options.max_pages);

    for page in first..last {
        if page > first && !options.page_delay.is_zero() {
            tokio::time::sleep(options.page_delay).await;
        }

        match registry.search_page(filters, page).await {
            Ok(RegistryPayload::RecordList(page_records)) => {
                if page_records.is_empty() {
                    debug!(page, "empty page, end of results");
                    break;
                }
                debug!(page, count = page_records.len(), "registry page");
                records.extend(page_records);
            }
            Ok(RegistryPayload::SingleRecord(record)) => records.push(record),
            Ok(RegistryPayload::Malformed(reason)) => {
                warn!(page, %reason, "skipping malformed registry page");
            }
            Err(error) => warn!(page, %error, "skipping failed registry page"),
        }
    }

    info!(count = records.len(), "registry search finished");
    records
}

/// A document attached to a grant call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: String,
    pub file_name: String,
}

impl DocumentRef {
    /// A file name safe to join under a download folder.
    pub fn local_file_name(&self) -> String {
        Path::new(&self.file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("documento_{}.pdf", self.id))
    }
}

/// Documents listed in a call detail under `documentos[].{id, nombreFic}`.
pub fn call_documents(detail: &Value) -> Vec<DocumentRef> {
    detail
        .pointer("/documentos")
        .and_then(Value::as_array)
        .map(|documents| {
            documents
                .iter()
                .filter_map(|document| {
                    let id = scalar_text(document.get("id")?)?;
                    let file_name = document
                        .get("nombreFic")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("documento_{id}.pdf"));
                    Some(DocumentRef { id, file_name })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub struct RegistryClient {
    client: Client,
    settings: RegistrySettings,
}

impl RegistryClient {
    pub fn new(settings: RegistrySettings) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client, settings })
    }

    /// Detail of one call by BDNS number; `None` when the registry has no JSON for it.
    pub async fn fetch_call(&self, number: &str) -> Result<Option<Value>, RegistryError> {
        let mut url = Url::parse(&self.settings.detail_url)?;
        url.query_pairs_mut()
            .append_pair("vpd", &self.settings.portal_code)
            .append_pair("numConv", number);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() || !is_json(&response) {
            debug!(number, status = %response.status(), "no call detail");
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    pub async fn download_document(
        &self,
        document: &DocumentRef,
        folder: &Path,
    ) -> Result<PathBuf, RegistryError> {
        let mut url = Url::parse(&format!(
            "{}/documentos",
            self.settings.detail_url.trim_end_matches('/')
        ))?;
        url.query_pairs_mut().append_pair("idDocumento", &document.id);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::BackendResponse {
                backend: BACKEND.to_string(),
                details: format!("document {} returned {status}", document.id),
            });
        }

        let bytes = response.bytes().await?;
        tokio::fs::create_dir_all(folder).await?;
        let path = folder.join(document.local_file_name());
        tokio::fs::write(&path, &bytes).await?;
        info!(id = %document.id, path = %path.display(), bytes = bytes.len(), "document downloaded");
        Ok(path)
    }
}

#[async_trait]
impl GrantRegistry for RegistryClient {
    async fn search_page(
        &self,
        filters: &FilterSet,
        page: u32,
    ) -> Result<RegistryPayload, RegistryError> {
        let mut url = Url::parse(&self.settings.search_url)?;
        url.query_pairs_mut()
            .extend_pairs(filters.with_page(page).to_query_pairs());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::BackendResponse {
                backend: BACKEND.to_string(),
                details: format!("search page {page} returned {status}"),
            });
        }
        if !is_json(&response) {
            return Ok(RegistryPayload::Malformed(format!(
                "search page {page} is not json"
            )));
        }

        Ok(RegistryPayload::classify(response.json().await?))
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

/// The few fields of a call record worth showing before its documents are read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GrantSummary {
    pub number: Option<String>,
    pub title: Option<String>,
    pub budget: Option<String>,
    pub application_start: Option<String>,
    pub application_end: Option<String>,
    pub purpose: Option<String>,
    pub beneficiaries: Vec<String>,
    pub open: bool,
}

impl GrantSummary {
    pub fn from_record(record: &Value) -> Self {
        let text = |key: &str| record.get(key).and_then(scalar_text);

        Self {
            number: text("numeroConvocatoria").or_else(|| text("codigoBDNS")),
            title: text("descripcion"),
            budget: text("presupuestoTotal"),
            application_start: text("fechaInicioSolicitud"),
            application_end: text("fechaFinSolicitud"),
            purpose: text("descripcionFinalidad"),
            beneficiaries: record
                .get("tiposBeneficiarios")
                .and_then(Value::as_array)
                .map(|kinds| {
                    kinds
                        .iter()
                        .filter_map(|kind| kind.get("descripcion").and_then(scalar_text))
                        .collect()
                })
                .unwrap_or_default(),
            open: record.get("abierto").and_then(Value::as_bool).unwrap_or(false),
        }
    }
}

impl fmt::Display for GrantSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.number, &self.title) {
            (Some(number), Some(title)) => writeln!(f, "[{number}] {title}")?,
            (Some(number), None) => writeln!(f, "[{number}]")?,
            (None, Some(title)) => writeln!(f, "{title}")?,
            (None, None) => {}
        }
        writeln!(
            f,
            "Presupuesto total: {} €",
            self.budget.as_deref().unwrap_or("N/D")
        )?;
        writeln!(
            f,
            "Fechas: del {} al {}",
            self.application_start.as_deref().unwrap_or("¿?"),
            self.application_end.as_deref().unwrap_or("¿?")
        )?;
        writeln!(
            f,
            "Finalidad: {}",
            self.purpose.as_deref().unwrap_or("No especificada")
        )?;
        if !self.beneficiaries.is_empty() {
            writeln!(f, "Beneficiarios: {}", self.beneficiaries.join(", "))?;
        }
        write!(f, "Abierta: {}", if self.open { "Sí" } else { "No" })
    }
}
