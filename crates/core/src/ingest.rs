use crate::error::IngestError;
use crate::extractor::{join_pages, PdfExtractor};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Every `.pdf` file under `folder`, recursively, sorted by path.
pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub document_id: String,
    pub path: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub documents: Vec<ExtractedDocument>,
    pub skipped: Vec<SkippedDocument>,
}

impl ExtractionReport {
    /// All extracted text of the batch, documents separated by a blank line.
    pub fn transcript(&self) -> String {
        self.documents
            .iter()
            .map(|document| document.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Extracts each document on its own; a failing or empty document is skipped, never fatal.
pub fn extract_documents(extractor: &dyn PdfExtractor, paths: &[PathBuf]) -> ExtractionReport {
    let mut report = ExtractionReport::default();

    for path in paths {
        let outcome = extractor.extract_pages(path).and_then(|pages| {
            let text = join_pages(&pages);
            if text.trim().is_empty() {
                Err(IngestError::PdfParse(format!(
                    "no readable text in {}",
                    path.display()
                )))
            } else {
                Ok(text)
            }
        });

        match outcome {
            Ok(text) => report.documents.push(ExtractedDocument {
                document_id: document_id(path),
                path: path.clone(),
                text,
            }),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping document");
                report.skipped.push(SkippedDocument {
                    path: path.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    report
}
