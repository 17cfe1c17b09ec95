//! Positioned characters and their assembly into cell text.

use crate::geometry::BBox;

/// A single rendered glyph with its position on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Char {
    /// Unicode text of the glyph (usually one scalar, ligatures may be more).
    pub text: String,
    /// Glyph bounding box in top-left page space.
    pub bbox: BBox,
    /// Effective font size in points.
    pub size: f64,
}

impl Char {
    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// Assemble characters into text.
///
/// Chars are grouped into lines when their tops are within `y_tolerance`,
/// ordered left-to-right inside a line, and a single space is inserted where
/// a space glyph was drawn or the horizontal gap exceeds `x_tolerance`.
/// Lines are joined with `\n`. Returns `None` when nothing visible remains.
pub fn chars_to_text(chars: &[&Char], x_tolerance: f64, y_tolerance: f64) -> Option<String> {
    let mut sorted: Vec<&Char> = chars.to_vec();
    sorted.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines: Vec<Vec<&Char>> = Vec::new();
    for ch in sorted {
        match lines.last_mut() {
            Some(line) if (ch.bbox.top - line[0].bbox.top).abs() <= y_tolerance => line.push(ch),
            _ => lines.push(vec![ch]),
        }
    }

    let rendered: Vec<String> = lines
        .iter_mut()
        .filter_map(|line| {
            line.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            render_line(line, x_tolerance)
        })
        .collect();

    if rendered.is_empty() {
        None
    } else {
        Some(rendered.join("\n"))
    }
}

fn render_line(line: &[&Char], x_tolerance: f64) -> Option<String> {
    let mut out = String::new();
    let mut pending_space = false;
    let mut last_x1: Option<f64> = None;

    for ch in line {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if let Some(x1) = last_x1 {
            if pending_space || ch.bbox.x0 - x1 > x_tolerance {
                out.push(' ');
            }
        }
        out.push_str(&ch.text);
        pending_space = false;
        last_x1 = Some(ch.bbox.x1);
    }

    if out.is_empty() { None } else { Some(out) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(text: &str, x0: f64, top: f64) -> Char {
        Char {
            text: text.to_string(),
            bbox: BBox::new(x0, top, x0 + 5.0, top + 10.0),
            size: 10.0,
        }
    }

    #[test]
    fn test_adjacent_chars_form_one_word() {
        let chars = [ch("a", 0.0, 0.0), ch("b", 5.0, 0.0), ch("c", 10.0, 0.0)];
        let refs: Vec<&Char> = chars.iter().collect();
        assert_eq!(chars_to_text(&refs, 3.0, 3.0).as_deref(), Some("abc"));
    }

    #[test]
    fn test_gap_or_space_glyph_inserts_single_space() {
        let chars = [
            ch("a", 0.0, 0.0),
            ch(" ", 5.0, 0.0),
            ch("b", 10.0, 0.0),
            ch("c", 30.0, 0.0),
        ];
        let refs: Vec<&Char> = chars.iter().collect();
        assert_eq!(chars_to_text(&refs, 3.0, 3.0).as_deref(), Some("a b c"));
    }

    #[test]
    fn test_lines_joined_top_to_bottom() {
        let chars = [ch("2", 0.0, 20.0), ch("1", 0.0, 0.0)];
        let refs: Vec<&Char> = chars.iter().collect();
        assert_eq!(chars_to_text(&refs, 3.0, 3.0).as_deref(), Some("1\n2"));
    }

    #[test]
    fn test_whitespace_only_is_none() {
        let chars = [ch(" ", 0.0, 0.0)];
        let refs: Vec<&Char> = chars.iter().collect();
        assert_eq!(chars_to_text(&refs, 3.0, 3.0), None);
        assert_eq!(chars_to_text(&[], 3.0, 3.0), None);
    }
}
