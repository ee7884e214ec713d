use std::collections::HashSet;
use std::path::{Path, PathBuf};

use labelpdf_cluster::{
    check_deps, classify_pages, emit_summary, enumerate_pdfs, nala_help_for, ocr_pages, page_count, resolve_config,
    summary_json, write_cluster_pdfs, write_page_texts, write_pages, EmitError, EnumerateError, OrderMode, PopplerError,
    RunConfig, Thresholds,
};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // 1) Configuration: labels.yaml (or --config) + flags
    let cfg = match resolve_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", serde_json::json!({"tool":"load_config","error": e.to_string(),"error_code":3}));
            std::process::exit(3);
        }
    };
    // validated above
    let (thresholds, mode) = match (cfg.thresholds(), cfg.order_mode()) {
        (Ok(t), Ok(m)) => (t, m),
        _ => std::process::exit(3),
    };
    eprintln!(
        "{}",
        serde_json::json!({
            "tool":"load_config",
            "status":"ok",
            "input": cfg.input,
            "output_dir": cfg.output_dir,
            "thresholds": thresholds,
            "order": mode.as_str(),
        })
    );

    // 2) External tools
    let deps = check_deps();
    if !deps.ok {
        eprintln!("{}", serde_json::json!({"tool":"check_deps","missing": deps.missing,"error_code":2}));
        let help = nala_help_for(&deps.missing);
        if !help.is_empty() {
            eprintln!("{}", help);
        }
        std::process::exit(2);
    }
    eprintln!("{}", serde_json::json!({"tool":"check_deps","status":"ok"}));

    // 3) Inputs
    let files = match enumerate_pdfs(&cfg.input) {
        Ok(files) => files,
        Err(EnumerateError::NoFilesFound { guidance }) => {
            eprintln!("{}", serde_json::json!({"tool":"enumerate_pdfs","error":"NoFilesFound","error_code":1}));
            eprintln!("{}", guidance);
            std::process::exit(1);
        }
    };
    eprintln!("{}", serde_json::json!({"tool":"enumerate_pdfs","count": files.len()}));

    let mut used_doc_ids: HashSet<String> = HashSet::new();
    for file in files {
        let fname = file.file_stem().and_then(|s| s.to_str()).unwrap_or("doc");
        let doc_id = unique_slug(slugify(fname), &mut used_doc_ids);
        let doc_outdir = Path::new(&cfg.output_dir).join(&doc_id);
        if let Err(code) = process_document(&file, &doc_id, &doc_outdir, &cfg, thresholds, mode) {
            std::process::exit(code);
        }
    }
}

/// Run one document end to end. Returns the exit code on a fatal error.
fn process_document(
    file: &Path,
    doc_id: &str,
    outdir: &Path,
    cfg: &RunConfig,
    thresholds: Thresholds,
    mode: OrderMode,
) -> Result<(), i32> {
    let total = page_count(file).map_err(|e| reader_failure("page_count", file, e))?;
    let count = cfg.max_pages.map_or(total, |n| n.min(total));
    eprintln!("{}", serde_json::json!({"tool":"page_count","file": file,"pages": total,"processing": count}));

    let texts = ocr_pages(file, count, &cfg.ocr).map_err(|e| reader_failure("ocr_pages", file, e))?;
    let failed: Vec<usize> = texts.iter().filter(|t| t.error.is_some()).map(|t| t.index).collect();
    eprintln!(
        "{}",
        serde_json::json!({
            "tool":"ocr_pages",
            "file": file,
            "attempted": count,
            "failed": failed,
            "lang": cfg.ocr.lang,
            "dpi": cfg.ocr.dpi,
            "jobs": cfg.ocr.jobs,
        })
    );
    if cfg.artifacts {
        // non-fatal
        if let Err(e) = write_page_texts(&texts, &outdir.join("artifacts")) {
            eprintln!("{}", serde_json::json!({"tool":"artifacts","file": file,"error": e.to_string()}));
        }
    }

    let result = classify_pages(&texts, thresholds, mode);
    for page in &result.unclassified {
        let preview: String = texts
            .iter()
            .find(|t| t.index == *page)
            .map(|t| t.text.chars().take(160).collect())
            .unwrap_or_default();
        eprintln!(
            "{}",
            serde_json::json!({"tool":"extract_record","file": file,"page": page + 1,"status":"no_product_info","text": preview})
        );
    }
    eprintln!(
        "{}",
        serde_json::json!({
            "tool":"cluster",
            "file": file,
            "records": result.entries.len(),
            "clusters": result.clusters.len(),
            "unclassified": result.unclassified.len(),
        })
    );

    let combined = outdir.join(format!("combined_{}.pdf", mode.as_str().replace('-', "_")));
    let mut written: Vec<PathBuf> = Vec::new();
    let sequence = result.page_sequence();
    if !sequence.is_empty() {
        write_pages(file, &sequence, &combined).map_err(|e| emit_failure(file, e))?;
        written.push(combined);
    }
    if cfg.per_cluster {
        let per_cluster = write_cluster_pdfs(file, &result.clusters, &outdir.join("clusters")).map_err(|e| emit_failure(file, e))?;
        written.extend(per_cluster);
    }
    if cfg.keep_unclassified && !result.unclassified.is_empty() {
        let dest = outdir.join("unclassified.pdf");
        write_pages(file, &result.unclassified, &dest).map_err(|e| emit_failure(file, e))?;
        written.push(dest);
    }

    let records: Vec<serde_json::Value> = result
        .entries
        .iter()
        .map(|e| serde_json::json!({"page": e.page_index + 1, "name": e.record.name, "category": e.record.category}))
        .collect();
    let summary = summary_json(doc_id, total, &result, thresholds, mode);
    let paths = emit_summary(&records, &summary, outdir).map_err(|e| emit_failure(file, e))?;
    eprintln!(
        "{}",
        serde_json::json!({
            "tool":"emit",
            "file": file,
            "pdfs": written,
            "records_path": paths.records_path,
            "summary_path": paths.summary_path,
        })
    );
    Ok(())
}

fn reader_failure(tool: &str, file: &Path, err: PopplerError) -> i32 {
    let label = match err {
        PopplerError::FileNotFound(_) => "FileNotFound",
        PopplerError::EncryptedPDF(_) => "EncryptedPDF",
        PopplerError::Other(_) => "PopplerError",
    };
    eprintln!(
        "{}",
        serde_json::json!({"tool": tool,"file": file,"error": label,"detail": err.to_string(),"error_code":1})
    );
    1
}

fn emit_failure(file: &Path, err: EmitError) -> i32 {
    let code = match err {
        EmitError::Reader(_) => 1,
        EmitError::WriteFailed(_) => 6,
    };
    eprintln!("{}", serde_json::json!({"tool":"emit","file": file,"error": err.to_string(),"error_code": code}));
    code
}

fn slugify(base: &str) -> String {
    let lower = base.to_lowercase();
    let mut collapsed = String::with_capacity(lower.len());
    let mut prev_dash = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            collapsed.push(ch);
            prev_dash = false;
        } else if !prev_dash {
            collapsed.push('-');
            prev_dash = true;
        }
    }
    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        "doc".to_string()
    } else {
        trimmed.to_string()
    }
}

fn unique_slug(slug_in: String, used: &mut HashSet<String>) -> String {
    if used.insert(slug_in.clone()) {
        return slug_in;
    }
    let mut i = 1;
    loop {
        let candidate = format!("{}-{}", slug_in, i);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        i += 1;
    }
}
