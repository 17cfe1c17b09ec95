//! End-to-end extraction: PDF bytes on disk -> Extractor -> JSON.
//!
//! Test PDFs are created programmatically using lopdf.

mod common;

use common::{pdf_with_pages, ruled_table, two_by_two, write_pdf};
use pdftables::{
    CellValue, ExtractOptions, ExtractOutcome, Extractor, HeaderMode, LatticeEngine,
    PageSelection, RecordOptions, TableSettings,
};

fn extract_json(pages: &[String]) -> String {
    let dir = tempfile::tempdir().unwrap();
    let bytes = pdf_with_pages(&pages.iter().map(|p| p.as_bytes().to_vec()).collect::<Vec<_>>());
    let path = write_pdf(dir.path(), "doc.pdf", &bytes);
    serde_json::to_string(&Extractor::new().extract(&path)).unwrap()
}

#[test]
fn two_by_two_table_becomes_one_record() {
    assert_eq!(extract_json(&[two_by_two()]), r#"[[{"A":"1","B":"2"}]]"#);
}

#[test]
fn every_table_on_every_page_is_returned_in_order() {
    let lower = ruled_table(&[100.0, 250.0], &[500.0, 480.0, 460.0], &[&["Name"], &["x"]]);
    let page_one = format!("{}\n{lower}", two_by_two());
    let page_two = ruled_table(&[50.0, 150.0, 250.0, 350.0], &[600.0, 580.0, 560.0, 540.0], &[
        &["K", "V", "W"],
        &["a", "b", "c"],
        &["d", "", "f"],
    ]);

    let json = extract_json(&[page_one, page_two]);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let tables = value.as_array().unwrap();
    assert_eq!(tables.len(), 3);
    assert_eq!(tables[0], serde_json::json!([{"A": "1", "B": "2"}]));
    assert_eq!(tables[1], serde_json::json!([{"Name": "x"}]));
    assert_eq!(
        tables[2],
        serde_json::json!([
            {"K": "a", "V": "b", "W": "c"},
            {"K": "d", "V": null, "W": "f"},
        ])
    );
}

#[test]
fn row_keys_are_exactly_the_headers() {
    let content = ruled_table(&[100.0, 200.0, 300.0, 400.0], &[700.0, 680.0, 660.0], &[
        &["Qty", "", "Qty"],
        &["1", "2", "3"],
    ]);
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "dup.pdf", &pdf_with_pages(&[content.into_bytes()]));

    let tables = Extractor::new().try_extract(&path).unwrap();
    assert_eq!(tables.len(), 1);
    for row in &tables[0].rows {
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["Qty", "Unnamed: 1", "Qty.1"]);
    }
}

#[test]
fn page_without_rulings_yields_empty_array() {
    let text_only = "BT /F1 12 Tf 72 720 Td (Just a paragraph.) Tj ET".to_string();
    assert_eq!(extract_json(&[text_only]), "[]");
}

#[test]
fn document_without_pages_content_yields_empty_array() {
    assert_eq!(extract_json(&[String::new()]), "[]");
}

#[test]
fn repeated_runs_are_byte_identical() {
    let pages = [two_by_two(), ruled_table(&[10.0, 90.0], &[300.0, 280.0, 260.0], &[&["h"], &["v"]])];
    assert_eq!(extract_json(&pages), extract_json(&pages));
}

#[test]
fn missing_file_is_a_failure_message() {
    let outcome = Extractor::new().extract("/definitely/not/here.pdf");
    let message = outcome.failure().unwrap();
    assert!(message.contains("file not found"));
    let json = serde_json::to_string(&outcome).unwrap();
    assert!(json.starts_with('"') && json.len() > 2);
}

#[test]
fn corrupt_file_is_a_failure_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "broken.pdf", b"%PDF-1.5\nnot really a pdf");
    let outcome = Extractor::new().extract(&path);
    assert!(matches!(outcome, ExtractOutcome::Failed(ref m) if m.starts_with("failed to open PDF")));
}

#[test]
fn page_selection_limits_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = pdf_with_pages(&[
        two_by_two().into_bytes(),
        ruled_table(&[100.0, 200.0], &[700.0, 680.0, 660.0], &[&["P2"], &["z"]]).into_bytes(),
    ]);
    let path = write_pdf(dir.path(), "two.pdf", &bytes);

    let second_only = ExtractOptions {
        pages: "2".parse::<PageSelection>().unwrap(),
        ..ExtractOptions::default()
    };
    let tables = Extractor::new().with_options(second_only).try_extract(&path).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].page, 2);
    assert_eq!(tables[0].rows[0].get("P2"), Some(&CellValue::Text("z".to_string())));

    let out_of_range = ExtractOptions {
        pages: "3".parse::<PageSelection>().unwrap(),
        ..ExtractOptions::default()
    };
    let outcome = Extractor::new().with_options(out_of_range).extract(&path);
    assert!(outcome.failure().unwrap().contains("exceeds document page count"));
}

#[test]
fn no_header_and_type_inference() {
    let dir = tempfile::tempdir().unwrap();
    let content = ruled_table(&[100.0, 200.0, 300.0], &[700.0, 680.0, 660.0, 640.0], &[
        &["id", "price"],
        &["1", "2.5"],
        &["2", "10"],
    ]);
    let path = write_pdf(dir.path(), "typed.pdf", &pdf_with_pages(&[content.into_bytes()]));

    let typed = ExtractOptions {
        records: RecordOptions {
            header: HeaderMode::FirstRow,
            infer_types: true,
        },
        ..ExtractOptions::default()
    };
    let json = serde_json::to_string(&Extractor::new().with_options(typed).extract(&path)).unwrap();
    assert_eq!(json, r#"[[{"id":1,"price":2.5},{"id":2,"price":10.0}]]"#);

    let raw = ExtractOptions {
        records: RecordOptions {
            header: HeaderMode::None,
            infer_types: false,
        },
        ..ExtractOptions::default()
    };
    let tables = Extractor::new().with_options(raw).try_extract(&path).unwrap();
    assert_eq!(tables[0].rows.len(), 3);
    assert_eq!(tables[0].rows[0].get("0"), Some(&CellValue::Text("id".to_string())));
}

#[test]
fn tight_text_tolerance_still_reads_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "t.pdf", &pdf_with_pages(&[two_by_two().into_bytes()]));
    let engine = LatticeEngine::new(TableSettings::default().with_text_tolerance(1.0));
    let tables = Extractor::with_engine(engine).try_extract(&path).unwrap();
    assert_eq!(tables[0].rows[0].get("A"), Some(&CellValue::Text("1".to_string())));
}
