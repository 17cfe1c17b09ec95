//! In-memory PDF fixtures for integration tests.
//!
//! Pages are US Letter with Helvetica available as `/F1`. Table helpers draw
//! stroked ruling lines and place one text run per cell.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, Stream, dictionary};

/// Build a PDF with one page per content stream.
pub fn pdf_with_pages(contents: &[Vec<u8>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => contents.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

/// Content for a ruled grid whose lines sit at the given PDF coordinates
/// (y grows upwards), with `rows[r][c]` placed inside each cell.
pub fn ruled_table(xs: &[f64], ys: &[f64], rows: &[&[&str]]) -> String {
    let (left, right) = (xs[0], xs[xs.len() - 1]);
    let (top, bottom) = (ys[0], ys[ys.len() - 1]);
    let mut content = String::new();
    for y in ys {
        content.push_str(&format!("{left} {y} m {right} {y} l S\n"));
    }
    for x in xs {
        content.push_str(&format!("{x} {top} m {x} {bottom} l S\n"));
    }
    content.push_str("BT /F1 10 Tf\n");
    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            let x = xs[c] + 10.0;
            let y = ys[r + 1] + 5.0;
            content.push_str(&format!("1 0 0 1 {x} {y} Tm ({text}) Tj\n"));
        }
    }
    content.push_str("ET\n");
    content
}

/// The canonical 2x2 table `A B / 1 2`.
pub fn two_by_two() -> String {
    ruled_table(&[100.0, 200.0, 300.0], &[700.0, 680.0, 660.0], &[&["A", "B"], &["1", "2"]])
}

/// Write bytes into `dir` and return the path.
pub fn write_pdf(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("failed to write test PDF");
    path
}
