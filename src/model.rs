use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfEntry {
    /// Directory name under the raw root, e.g. `2019_04`.
    pub report_id: String,
    pub path: String,
    pub year: Option<u32>,
    pub month: Option<u32>,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub pdf_count: usize,
    pub skipped_html_count: usize,
    pub pdfs: Vec<PdfEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub pdftotext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertPaths {
    pub cache_root: String,
    pub db_path: String,
    pub debug_dir: Option<String>,
    pub json_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertCounts {
    pub documents_requested: usize,
    pub documents_converted: usize,
    pub documents_failed: usize,
    pub records_written: usize,
    pub overrides_applied: usize,
    pub diagnostics: usize,
    pub rows_by_class: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub doc_id: String,
    pub source_path: String,
    pub status: String,
    pub page_count: usize,
    pub fragment_count: usize,
    pub record_count: usize,
    pub total_vacancies: Option<u32>,
    pub total_nominees_pending: Option<u32>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: ConvertPaths,
    pub counts: ConvertCounts,
    pub documents: Vec<DocumentOutcome>,
    pub warnings: Vec<String>,
}
