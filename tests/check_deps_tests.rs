use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Mutex;

use labelpdf_cluster::{check_deps, nala_help_for};

// PATH is process-wide
static PATH_LOCK: Mutex<()> = Mutex::new(());

fn set_path(dir: &Path) {
    std::env::set_var("PATH", dir.display().to_string());
}

fn fake_tool(dir: &Path, name: &str) {
    let bin = dir.join(name);
    fs::write(&bin, "#!/bin/sh\nexit 0\n").unwrap();
    let mut perms = fs::metadata(&bin).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&bin, perms).unwrap();
}

#[test]
fn check_deps_ok_when_all_tools_present() {
    let _guard = PATH_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let td = tempfile::tempdir().unwrap();
    for tool in ["pdfinfo", "pdftoppm", "pdfseparate", "pdfunite", "tesseract"] {
        fake_tool(td.path(), tool);
    }
    set_path(td.path());
    let res = check_deps();
    assert!(res.ok, "all tools present should yield ok: {:?}", res.missing);
    assert!(res.missing.is_empty());
}

#[test]
fn check_deps_reports_missing_tesseract() {
    let _guard = PATH_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let td = tempfile::tempdir().unwrap();
    for tool in ["pdfinfo", "pdftoppm", "pdfseparate", "pdfunite"] {
        fake_tool(td.path(), tool);
    }
    set_path(td.path());
    let res = check_deps();
    assert!(!res.ok);
    assert_eq!(res.missing, vec!["tesseract".to_string()]);
    assert!(nala_help_for(&res.missing).contains("tesseract-ocr-vie"));
}

#[test]
fn check_deps_empty_path_misses_everything() {
    let _guard = PATH_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let td = tempfile::tempdir().unwrap();
    set_path(td.path());
    let res = check_deps();
    assert!(!res.ok);
    assert_eq!(res.missing.len(), 5);
    let help = nala_help_for(&res.missing);
    assert!(help.contains("poppler-utils"));
    assert!(nala_help_for(&[]).is_empty());
}
