use labelpdf_cluster::{canonical_label_text, extract_record, Record, UNCATEGORIZED};

#[test]
fn splits_name_and_category_before_quantity() {
    let rec = extract_record("Nội dung hàng: Ao so mi, Size L, SL: 3").expect("marker present");
    assert_eq!(rec.name, "Ao so mi");
    assert_eq!(rec.category, "Size L");
}

#[test]
fn missing_marker_returns_none() {
    let text = "Người gửi: Shop ABC\nSĐT: 0901234567\nPhiếu giao hàng";
    assert!(extract_record(text).is_none());
    assert!(extract_record("").is_none());
}

#[test]
fn no_comma_puts_whole_span_in_category() {
    let rec = extract_record("Nội dung hàng: Ao thun co tron").unwrap();
    assert_eq!(rec.name, "");
    assert_eq!(rec.category, "Ao thun co tron");
}

#[test]
fn quantity_inside_trailing_part_is_not_category() {
    // "SL: ba" has no digits, so it is not cut off and lands in the last part
    let rec = extract_record("Nội dung hàng: Ao so mi, Size L, SL: ba").unwrap();
    assert_eq!(rec.name, "Ao so mi");
    assert_eq!(rec.category, "Size L");
}

#[test]
fn single_part_with_quantity_falls_back_to_uncategorized() {
    let rec = extract_record("Nội dung hàng: Quan jean SL: 2").unwrap();
    assert_eq!(rec.name, "");
    assert_eq!(rec.category, UNCATEGORIZED);
}

#[test]
fn line_breaks_and_list_number_are_normalized() {
    let text = "Mã vận đơn: 123\nNội dung hàng: 1. Ao so mi\ntay dai,   Size\nL, SL: 2\nGhi chú: giao giờ hành chính";
    let rec = extract_record(text).unwrap();
    assert_eq!(rec.name, "Ao so mi tay dai");
    assert_eq!(rec.category, "Size L");
}

#[test]
fn only_first_marker_is_used() {
    let text = "Nội dung hàng: Ao, Do, SL: 1\nNội dung hàng: Quan, Xanh, SL: 2";
    let rec = extract_record(text).unwrap();
    assert_eq!(rec, Record::new("Ao", "Do"));
}

#[test]
fn marker_is_case_insensitive() {
    let rec = extract_record("NỘI DUNG HÀNG: Ao, Do, sl: 4").unwrap();
    assert_eq!(rec, Record::new("Ao", "Do"));
    let rec = extract_record("noi dung hang: Ao, Do");
    assert!(rec.is_none(), "marker needs the accented vowel in 'nội'");
    let rec = extract_record("Nội dung hang: Ao, Do").unwrap();
    assert_eq!(rec.category, "Do");
}

#[test]
fn name_keeps_inner_commas() {
    let rec = extract_record("Nội dung hàng: Vay hoa, co tron, tay ngan, Size M, SL: 1").unwrap();
    assert_eq!(rec.name, "Vay hoa, co tron, tay ngan");
    assert_eq!(rec.category, "Size M");
}

#[test]
fn canonical_text_round_trips() {
    let fixtures = [
        Record::new("Ao so mi", "Size L"),
        Record::new("Vay hoa, co tron", "Size M"),
        Record::new("Widget A", "Blue"),
    ];
    for rec in fixtures {
        let again = extract_record(&canonical_label_text(&rec)).expect("template has marker");
        assert_eq!(again, rec);
    }
}

#[test]
fn marker_on_its_own_line() {
    let rec = extract_record("Nội dung hàng:\n1. Ao so mi, Size L, SL: 3").unwrap();
    assert_eq!(rec, Record::new("Ao so mi", "Size L"));
}

#[test]
fn header_before_first_list_item_is_skipped() {
    let rec = extract_record("Nội dung hàng (Tổng SL sản phẩm: 1)\n1. Ao so mi, Size L, SL: 1").unwrap();
    assert_eq!(rec, Record::new("Ao so mi", "Size L"));

    let two_items = "Nội dung hàng (Tổng SL sản phẩm: 2)\n1. Ao thun, Size M, SL: 1\n2. Quan jean, Size 30, SL: 1";
    assert_eq!(extract_record(two_items).unwrap(), Record::new("Ao thun", "Size M"));
}

#[test]
fn unnumbered_description_follows_marker() {
    let rec = extract_record("Nội dung hàng: Ao so mi, Size L, SL: 3").unwrap();
    assert_eq!(rec, Record::new("Ao so mi", "Size L"));
    // a decimal inside the description is not a list number
    let rec = extract_record("Nội dung hàng: Cap sac 2.4A, Den").unwrap();
    assert_eq!(rec, Record::new("Cap sac 2.4A", "Den"));
}

#[test]
fn list_item_after_quantity_is_not_used() {
    let rec = extract_record("Nội dung hàng: Ao, Do, SL: 1\nGhi chú\n1. Quan, Xanh").unwrap();
    assert_eq!(rec, Record::new("Ao", "Do"));
}
