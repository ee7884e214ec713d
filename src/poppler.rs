use std::path::Path;
use std::process::Command;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::OcrConfig;

#[derive(Debug, Error)]
pub enum PopplerError {
    #[error("FileNotFound: {0}")]
    FileNotFound(String),
    #[error("EncryptedPDF: {0}")]
    EncryptedPDF(String),
    #[error("PopplerError: {0}")]
    Other(String),
}

/// Number of pages according to `pdfinfo`.
pub fn page_count(path: &Path) -> Result<usize, PopplerError> {
    if !path.exists() {
        return Err(PopplerError::FileNotFound(path.display().to_string()));
    }
    let out = Command::new("pdfinfo")
        .arg(path)
        .output()
        .map_err(|e| PopplerError::Other(format!("pdfinfo: {}", e)))?;
    if !out.status.success() {
        return Err(classify_failure(path, &out.stderr, "pdfinfo failed"));
    }
    let s = String::from_utf8_lossy(&out.stdout);
    s.lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse::<usize>().ok())
        .ok_or_else(|| PopplerError::Other("pdfinfo reported no page count".into()))
}

pub(crate) fn classify_failure(path: &Path, stderr: &[u8], what: &str) -> PopplerError {
    let err = String::from_utf8_lossy(stderr).to_lowercase();
    if err.contains("encrypt") || err.contains("password") {
        PopplerError::EncryptedPDF(path.display().to_string())
    } else {
        PopplerError::Other(what.to_string())
    }
}

/// Recognized text of one page. `text` is empty when rendering or OCR failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub index: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Render and OCR pages `0..count`. Pages may be recognized on several threads, but the
/// result is always in page order.
pub fn ocr_pages(path: &Path, count: usize, cfg: &OcrConfig) -> Result<Vec<PageText>, PopplerError> {
    let tmpdir = tempfile::tempdir().map_err(|e| PopplerError::Other(e.to_string()))?;
    let work = |idx: usize| ocr_page(path, idx, cfg, tmpdir.path());

    if cfg.jobs <= 1 {
        return Ok((0..count).map(work).collect());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.jobs)
        .build()
        .map_err(|e| PopplerError::Other(e.to_string()))?;
    // indexed collect keeps page order regardless of completion order
    Ok(pool.install(|| (0..count).into_par_iter().map(work).collect()))
}

/// Render one page (0-based) to a grayscale PNG and run tesseract over it.
/// Failures are reported on the returned value, never as an error.
pub fn ocr_page(path: &Path, index: usize, cfg: &OcrConfig, workdir: &Path) -> PageText {
    let page_no = index + 1; // pdftoppm is 1-based
    let prefix = workdir.join(format!("p{}", page_no));
    let img = prefix.with_extension("png");

    let rendered = Command::new("pdftoppm")
        .arg("-gray")
        .arg("-r").arg(cfg.dpi.to_string())
        .arg("-f").arg(page_no.to_string())
        .arg("-l").arg(page_no.to_string())
        .arg("-png")
        .arg("-singlefile")
        .arg(path)
        .arg(&prefix)
        .output();
    match rendered {
        Ok(o) if o.status.success() => {}
        _ => return failed(index, "pdftoppm_failed"),
    }
    match std::fs::metadata(&img) {
        Ok(meta) if meta.len() > 0 => {}
        Ok(_) => return failed(index, "image_zero_size"),
        Err(_) => return failed(index, "image_missing"),
    }

    let out = Command::new("tesseract")
        .arg(&img)
        .arg("stdout")
        .arg("-l").arg(&cfg.lang)
        .arg("--psm").arg(cfg.psm.to_string())
        .arg("--oem").arg(cfg.oem.to_string())
        .output();
    let _ = std::fs::remove_file(&img);
    match out {
        Ok(o) if o.status.success() => PageText {
            index,
            text: String::from_utf8_lossy(&o.stdout).to_string(),
            error: None,
        },
        Ok(o) => failed(index, &format!("tesseract_exit_{}", o.status.code().unwrap_or(-1))),
        Err(e) => failed(index, &format!("tesseract_spawn_error: {}", e)),
    }
}

fn failed(index: usize, message: &str) -> PageText {
    PageText { index, text: String::new(), error: Some(message.to_string()) }
}
