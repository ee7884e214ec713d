use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::Cluster;
use crate::poppler::{classify_failure, PageText, PopplerError};

static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
    #[error(transparent)]
    Reader(#[from] PopplerError),
}

/// Write `pages` (0-based, in the given order, repeats allowed) of `source` into `dest`
/// using `pdfseparate` + `pdfunite`.
pub fn write_pages(source: &Path, pages: &[usize], dest: &Path) -> Result<(), EmitError> {
    if pages.is_empty() {
        return Err(EmitError::WriteFailed(format!("no pages for {}", dest.display())));
    }
    if !source.exists() {
        return Err(PopplerError::FileNotFound(source.display().to_string()).into());
    }
    let tmpdir = tempfile::tempdir().map_err(|e| EmitError::WriteFailed(e.to_string()))?;

    let mut singles: Vec<PathBuf> = Vec::with_capacity(pages.len());
    for &idx in pages {
        let single = tmpdir.path().join(format!("page-{}.pdf", idx + 1));
        if !single.exists() {
            let out = Command::new("pdfseparate")
                .arg("-f").arg((idx + 1).to_string())
                .arg("-l").arg((idx + 1).to_string())
                .arg(source)
                .arg(&single)
                .output()
                .map_err(|e| PopplerError::Other(format!("pdfseparate: {}", e)))?;
            if !out.status.success() {
                let what = format!("pdfseparate failed on page {}", idx + 1);
                return Err(classify_failure(source, &out.stderr, &what).into());
            }
        }
        singles.push(single);
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    }
    // pdfunite needs at least two inputs
    if singles.len() == 1 {
        std::fs::copy(&singles[0], dest).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
        return Ok(());
    }
    let out = Command::new("pdfunite")
        .args(&singles)
        .arg(dest)
        .output()
        .map_err(|e| EmitError::WriteFailed(format!("pdfunite: {}", e)))?;
    if !out.status.success() {
        let err = String::from_utf8_lossy(&out.stderr);
        return Err(EmitError::WriteFailed(format!("pdfunite: {}", err.trim())));
    }
    Ok(())
}

/// Strip everything but word characters, whitespace and '-', then use '_' for spaces.
pub fn safe_file_stem(s: &str) -> String {
    RE_UNSAFE.replace_all(s, "").trim().replace(' ', "_")
}

/// `<pages>_<name>_<category>.pdf`
pub fn cluster_file_name(cluster: &Cluster) -> String {
    format!(
        "{}_{}_{}.pdf",
        cluster.pages.len(),
        safe_file_stem(&cluster.key.name),
        safe_file_stem(&cluster.key.category)
    )
}

/// File names for `write_cluster_pdfs`, in cluster order. Names that collide once punctuation
/// is stripped get a `-N` suffix.
pub fn cluster_file_names(clusters: &[Cluster]) -> Vec<String> {
    let mut used: Vec<String> = Vec::new();
    clusters
        .iter()
        .map(|c| unique_name(cluster_file_name(c), &mut used))
        .collect()
}

/// One PDF per cluster, named by `cluster_file_names`. Returns the written paths in cluster order.
pub fn write_cluster_pdfs(source: &Path, clusters: &[Cluster], outdir: &Path) -> Result<Vec<PathBuf>, EmitError> {
    let mut written = Vec::with_capacity(clusters.len());
    for (cluster, name) in clusters.iter().zip(cluster_file_names(clusters)) {
        let dest = outdir.join(name);
        write_pages(source, &cluster.pages, &dest)?;
        written.push(dest);
    }
    Ok(written)
}

fn unique_name(name: String, used: &mut Vec<String>) -> String {
    if !used.contains(&name) {
        used.push(name.clone());
        return name;
    }
    let stem = name.trim_end_matches(".pdf").to_string();
    let mut i = 1;
    loop {
        let candidate = format!("{}-{}.pdf", stem, i);
        if !used.contains(&candidate) {
            used.push(candidate.clone());
            return candidate;
        }
        i += 1;
    }
}

/// Dump each page's recognized text to `dir/page-<n>.txt` (1-based).
pub fn write_page_texts(texts: &[PageText], dir: &Path) -> Result<Vec<PathBuf>, EmitError> {
    std::fs::create_dir_all(dir).map_err(|e| EmitError::WriteFailed(format!("{}: {}", dir.display(), e)))?;
    let mut written = Vec::with_capacity(texts.len());
    for t in texts {
        let path = dir.join(format!("page-{}.txt", t.index + 1));
        std::fs::write(&path, &t.text).map_err(|e| EmitError::WriteFailed(format!("{}: {}", path.display(), e)))?;
        written.push(path);
    }
    Ok(written)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryPaths {
    pub records_path: String,
    pub summary_path: String,
}

/// Atomically write the per-page records (JSON lines) and the cluster summary into outdir.
pub fn emit_summary(
    records: &[serde_json::Value],
    summary: &serde_json::Value,
    outdir: &Path,
) -> Result<SummaryPaths, EmitError> {
    std::fs::create_dir_all(outdir).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let records_path = outdir.join("records.jsonl");
    let summary_path = outdir.join("clusters.json");

    let mut lines = String::new();
    for r in records {
        let line = serde_json::to_string(r).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
        lines.push_str(&line);
        lines.push('\n');
    }
    let summary_bytes = serde_json::to_vec_pretty(summary).map_err(|e| EmitError::WriteFailed(e.to_string()))?;

    write_atomic(&records_path, lines.as_bytes())?;
    write_atomic(&summary_path, &summary_bytes)?;

    Ok(SummaryPaths {
        records_path: records_path.to_string_lossy().to_string(),
        summary_path: summary_path.to_string_lossy().to_string(),
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), EmitError> {
    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("out");
    let tmp = path.with_file_name(format!("{}.tmp.{}", file_name, std::process::id()));
    std::fs::write(&tmp, bytes).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| EmitError::WriteFailed(e.to_string()))
}
