use std::fs;
use std::path::Path;

use labelpdf_cluster::{
    classify_pages, cluster_file_name, cluster_file_names, emit_summary, safe_file_stem, summary_json, write_page_texts,
    write_pages, Cluster, DocumentResult, EmitError, OrderMode, PageText, PopplerError, Record, Thresholds,
};

fn page(index: usize, text: &str) -> PageText {
    PageText { index, text: text.to_string(), error: None }
}

#[test]
fn safe_stems_strip_punctuation() {
    assert_eq!(safe_file_stem("Ao so mi, tay dai!"), "Ao_so_mi_tay_dai");
    assert_eq!(safe_file_stem("  Áo sơ-mi / 2  "), "Áo_sơ-mi__2");
    let c = Cluster { key: Record::new("Ao so mi", "Size L"), pages: vec![3, 9] };
    assert_eq!(cluster_file_name(&c), "2_Ao_so_mi_Size_L.pdf");
}

#[test]
fn write_pages_rejects_empty_and_missing_input() {
    let td = tempfile::tempdir().unwrap();
    let dest = td.path().join("out.pdf");
    assert!(matches!(write_pages(Path::new("in.pdf"), &[], &dest), Err(EmitError::WriteFailed(_))));
    let err = write_pages(Path::new("./does/not/exist.pdf"), &[0], &dest).unwrap_err();
    assert!(matches!(err, EmitError::Reader(PopplerError::FileNotFound(_))));
}

#[test]
fn classify_pages_skips_pages_without_marker() {
    // out of order on purpose: clustering must still run in page order
    let pages = vec![
        page(2, "Nội dung hàng: Widget A, Blu"),
        page(0, "Nội dung hàng: 1. Widget A, Blue, SL: 1"),
        page(1, "Phiếu giao hàng\nNgười nhận: Lan"),
        page(3, "Nội dung hàng: Gadget B, Red, SL: 2"),
    ];
    let result = classify_pages(&pages, Thresholds::default(), OrderMode::ByFrequency);
    assert_eq!(result.unclassified, vec![1]);
    assert_eq!(result.entries.len(), 3);
    assert_eq!(result.clusters.len(), 2);
    assert_eq!(result.clusters[0].key, Record::new("Widget A", "Blue"));
    assert_eq!(result.page_sequence(), vec![0, 2, 3]);
}

#[test]
fn summary_is_written_atomically_with_fingerprint() {
    let pages = vec![
        page(0, "Nội dung hàng: Ao so mi, Size L, SL: 3"),
        page(1, "no label here"),
        page(2, "Nội dung hàng: Ao so mj, Size L, SL: 1"),
    ];
    let t = Thresholds::default();
    let result = classify_pages(&pages, t, OrderMode::ByCategoryName);
    let summary = summary_json("labels", 3, &result, t, OrderMode::ByCategoryName);
    let again = summary_json("labels", 3, &result, t, OrderMode::ByCategoryName);
    assert_eq!(summary["fingerprint"], again["fingerprint"]);
    assert_eq!(summary["fingerprint"].as_str().unwrap().len(), 64);

    let records: Vec<serde_json::Value> = result
        .entries
        .iter()
        .map(|e| serde_json::json!({"page": e.page_index + 1, "name": e.record.name}))
        .collect();
    let td = tempfile::tempdir().unwrap();
    let outdir = td.path().join("out/labels");
    let paths = emit_summary(&records, &summary, &outdir).expect("emit ok");

    let lines = fs::read_to_string(&paths.records_path).unwrap();
    assert_eq!(lines.lines().count(), 2);
    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&paths.summary_path).unwrap()).unwrap();
    assert_eq!(written["unclassified_pages"], serde_json::json!([1]));
    assert_eq!(written["page_sequence"], serde_json::json!([0, 2]));
    assert_eq!(written["clusters"][0]["file"], "2_Ao_so_mi_Size_L.pdf");
    assert_eq!(written["order"], "by-category-name");

    let leftovers: Vec<_> = fs::read_dir(&outdir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn colliding_file_names_match_the_summary() {
    let clusters = vec![
        Cluster { key: Record::new("Ao, so mi", "L"), pages: vec![0] },
        Cluster { key: Record::new("Ao so mi", "L"), pages: vec![1] },
        Cluster { key: Record::new("Quan", "M"), pages: vec![2] },
    ];
    let names = cluster_file_names(&clusters);
    assert_eq!(names, vec!["1_Ao_so_mi_L.pdf", "1_Ao_so_mi_L-1.pdf", "1_Quan_M.pdf"]);

    let result = DocumentResult { entries: Vec::new(), unclassified: Vec::new(), clusters };
    let t = Thresholds::default();
    let summary = summary_json("labels", 3, &result, t, OrderMode::ByCategoryName);
    for (i, name) in names.iter().enumerate() {
        assert_eq!(summary["clusters"][i]["file"], name.as_str());
    }
}

#[test]
fn page_texts_are_dumped_or_fail_loudly() {
    let td = tempfile::tempdir().unwrap();
    let texts = vec![page(0, "first"), page(4, "fifth")];
    let written = write_page_texts(&texts, &td.path().join("artifacts")).expect("dump ok");
    assert_eq!(written.len(), 2);
    assert_eq!(fs::read_to_string(td.path().join("artifacts/page-5.txt")).unwrap(), "fifth");

    let blocker = td.path().join("not-a-dir");
    fs::write(&blocker, "x").unwrap();
    let err = write_page_texts(&texts, &blocker.join("artifacts")).unwrap_err();
    assert!(matches!(err, EmitError::WriteFailed(_)));
}
