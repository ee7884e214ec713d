use std::path::{Path, PathBuf};

use globwalk::GlobWalkerBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod cluster;
pub mod config;
pub mod emit;
pub mod extract;
pub mod order;
pub mod poppler;
pub mod similarity;

pub use cluster::{cluster_entries, Assignment, Cluster, Clusterer, PageEntry, Thresholds};
pub use config::{load_config, resolve_config, ConfigError, OcrConfig, RunConfig};
pub use emit::{
    cluster_file_name, cluster_file_names, emit_summary, safe_file_stem, write_cluster_pdfs, write_page_texts, write_pages,
    EmitError, SummaryPaths,
};
pub use extract::{canonical_label_text, extract_record, normalize_field, Record, MARKER_PHRASE, UNCATEGORIZED};
pub use order::{order_clusters, page_sequence, OrderMode};
pub use poppler::{ocr_page, ocr_pages, page_count, PageText, PopplerError};
pub use similarity::{score_records, score_with, FuzzyRatio, Score, StringSimilarity};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepsResult {
    pub ok: bool,
    pub missing: Vec<String>,
}

/// Every tool the run shells out to. All are required:
/// - pdfinfo, pdftoppm, pdfseparate, pdfunite (Poppler)
/// - tesseract (OCR)
pub const REQUIRED_TOOLS: [&str; 5] = ["pdfinfo", "pdftoppm", "pdfseparate", "pdfunite", "tesseract"];

/// Check the external CLI dependencies. `ok` is true iff none are missing.
pub fn check_deps() -> DepsResult {
    let missing: Vec<String> = REQUIRED_TOOLS
        .iter()
        .filter(|tool| which::which(tool).is_err())
        .map(|tool| tool.to_string())
        .collect();
    DepsResult { ok: missing.is_empty(), missing }
}

/// Render Nala installation help for missing deps.
pub fn nala_help_for(missing: &[String]) -> String {
    let mut pkgs: Vec<&str> = Vec::new();
    if missing.iter().any(|m| m.starts_with("pdf")) {
        pkgs.push("poppler-utils");
    }
    if missing.iter().any(|m| m == "tesseract") {
        pkgs.push("tesseract-ocr");
        pkgs.push("tesseract-ocr-vie");
    }

    if pkgs.is_empty() {
        return String::new();
    }

    format!(
        "Dependency missing. Install via Nala:\n  sudo nala install {}",
        pkgs.join(" ")
    )
}

#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("NoFilesFound")]
    NoFilesFound { guidance: String },
}

/// Enumerate PDFs from a plain path or a glob pattern (e.g., "./input/**/*.pdf").
/// Returns a sorted list of paths.
pub fn enumerate_pdfs(pattern: &str) -> Result<Vec<PathBuf>, EnumerateError> {
    let direct = Path::new(pattern);
    if direct.is_file() {
        return Ok(vec![direct.to_path_buf()]);
    }
    let root = if direct.is_absolute() { "/" } else { "." };
    let pat = pattern.trim_start_matches("./");
    let mut paths: Vec<PathBuf> = GlobWalkerBuilder::from_patterns(root, &[pat])
        .case_insensitive(false)
        .follow_links(false)
        .build()
        .map_err(|_| EnumerateError::NoFilesFound { guidance: folder_guidance() })?
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .collect();

    paths.sort();
    paths.retain(|p| p.is_file());

    if paths.is_empty() {
        return Err(EnumerateError::NoFilesFound { guidance: folder_guidance() });
    }

    Ok(paths)
}

fn folder_guidance() -> String {
    let guide = r#"No PDF matched the input pattern (default ./input/**/*.pdf).
Pass a file or glob as the first argument, e.g.:
  labelpdf2groups ./input/labels.pdf ./output"#;
    guide.to_string()
}

/// Outcome of extracting and clustering one document's page texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    pub entries: Vec<PageEntry>,
    /// Pages with no product line, in page order.
    pub unclassified: Vec<usize>,
    /// Clusters in output order.
    pub clusters: Vec<Cluster>,
}

impl DocumentResult {
    pub fn page_sequence(&self) -> Vec<usize> {
        page_sequence(&self.clusters)
    }
}

/// Extract, cluster (in page order) and order one document's recognized pages.
pub fn classify_pages(pages: &[PageText], thresholds: Thresholds, mode: OrderMode) -> DocumentResult {
    let mut sorted: Vec<&PageText> = pages.iter().collect();
    sorted.sort_by_key(|p| p.index);

    let mut entries = Vec::new();
    let mut unclassified = Vec::new();
    for page in sorted {
        match extract_record(&page.text) {
            Some(record) => entries.push(PageEntry::new(record, page.index)),
            None => unclassified.push(page.index),
        }
    }
    let clusters = cluster_entries(entries.iter().cloned(), thresholds);
    DocumentResult { entries, unclassified, clusters: order_clusters(clusters, mode) }
}

/// Cluster summary with a sha256 fingerprint of its own content.
pub fn summary_json(doc_id: &str, page_count: usize, result: &DocumentResult, thresholds: Thresholds, mode: OrderMode) -> serde_json::Value {
    let clusters: Vec<serde_json::Value> = result
        .clusters
        .iter()
        .zip(cluster_file_names(&result.clusters))
        .map(|(c, file)| serde_json::json!({
            "name": c.key.name,
            "category": c.key.category,
            "pages": c.pages,
            "file": file,
        }))
        .collect();
    let mut summary = serde_json::json!({
        "doc_id": doc_id,
        "page_count": page_count,
        "order": mode.as_str(),
        "thresholds": thresholds,
        "clusters": clusters,
        "unclassified_pages": result.unclassified,
        "page_sequence": result.page_sequence(),
    });
    let bytes = serde_json::to_vec(&summary).unwrap_or_default();
    if let Some(obj) = summary.as_object_mut() {
        obj.insert("fingerprint".to_string(), serde_json::json!(sha256_hex(&bytes)));
    }
    summary
}

// Utility to compute sha256 hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    out.iter().map(|b| format!("{:02x}", b)).collect()
}
