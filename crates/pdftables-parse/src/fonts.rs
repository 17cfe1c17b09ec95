//! Font metrics and character decoding for text-showing operators.
//!
//! Only what positioning glyphs inside table cells needs: advance widths,
//! ascent/descent, code length, and a Unicode mapping. Glyph outlines and
//! font programs are never read.

use std::collections::HashMap;

use encoding_rs::WINDOWS_1252;
use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use crate::lopdf_backend::object_to_f64;

const DEFAULT_ASCENT: f64 = 718.0;
const DEFAULT_DESCENT: f64 = -207.0;
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Helvetica advance widths for codes 32..=126 (1/1000 em).
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Fallback widths for fonts without a `/Widths` array.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StandardWidths {
    Monospace,
    Proportional,
}

impl StandardWidths {
    fn for_base_font(name: &str) -> Self {
        if name.contains("Courier") {
            StandardWidths::Monospace
        } else {
            StandardWidths::Proportional
        }
    }

    fn width(self, code: u32) -> f64 {
        match self {
            StandardWidths::Monospace => 600.0,
            StandardWidths::Proportional => match code {
                32..=126 => f64::from(HELVETICA_ASCII[(code - 32) as usize]),
                _ => 556.0,
            },
        }
    }
}

/// Metrics and decoding for one font resource.
#[derive(Debug, Clone)]
pub struct FontInfo {
    pub base_font: String,
    /// Type0 fonts read two bytes per code.
    pub two_byte: bool,
    first_char: u32,
    widths: Vec<f64>,
    cid_widths: HashMap<u32, f64>,
    default_width: f64,
    standard: StandardWidths,
    to_unicode: HashMap<u32, String>,
    /// Ascent in 1/1000 em.
    pub ascent: f64,
    /// Descent in 1/1000 em (negative below the baseline).
    pub descent: f64,
}

impl Default for FontInfo {
    /// Metrics used when a `Tf` names a font that cannot be resolved.
    fn default() -> Self {
        Self {
            base_font: "Helvetica".to_string(),
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: DEFAULT_CID_WIDTH,
            standard: StandardWidths::Proportional,
            to_unicode: HashMap::new(),
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
        }
    }
}

impl FontInfo {
    /// Read metrics from a font dictionary. Missing pieces fall back to
    /// standard-font values rather than failing.
    pub fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let base_font = dict
            .get(b"BaseFont")
            .and_then(Object::as_name)
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();
        let subtype = dict.get(b"Subtype").and_then(Object::as_name).unwrap_or(&[]);

        let mut info = FontInfo {
            standard: StandardWidths::for_base_font(&base_font),
            base_font,
            ..FontInfo::default()
        };

        if let Some(cmap) = stream_bytes(doc, dict.get(b"ToUnicode").ok()) {
            info.to_unicode = parse_to_unicode(&cmap);
        }

        if subtype == b"Type0" {
            info.two_byte = true;
            if let Some(cid_font) = descendant_font(doc, dict) {
                info.default_width = deref(doc, cid_font.get(b"DW").ok())
                    .and_then(as_number)
                    .unwrap_or(DEFAULT_CID_WIDTH);
                if let Some(w) = deref(doc, cid_font.get(b"W").ok()).and_then(|o| o.as_array().ok()) {
                    info.cid_widths = parse_cid_widths(doc, w);
                }
                info.read_descriptor(doc, cid_font);
            }
        } else {
            info.first_char = deref(doc, dict.get(b"FirstChar").ok())
                .and_then(as_number)
                .map_or(0, |n| n.max(0.0) as u32);
            if let Some(widths) = deref(doc, dict.get(b"Widths").ok()).and_then(|o| o.as_array().ok()) {
                info.widths = widths
                    .iter()
                    .map(|w| deref(doc, Some(w)).and_then(as_number).unwrap_or(0.0))
                    .collect();
            }
            info.read_descriptor(doc, dict);
        }

        debug!(
            font = %info.base_font,
            two_byte = info.two_byte,
            widths = info.widths.len() + info.cid_widths.len(),
            "resolved font"
        );
        info
    }

    fn read_descriptor(&mut self, doc: &Document, dict: &Dictionary) {
        let Some(descriptor) = deref(doc, dict.get(b"FontDescriptor").ok()).and_then(|o| o.as_dict().ok())
        else {
            return;
        };
        let ascent = deref(doc, descriptor.get(b"Ascent").ok()).and_then(as_number);
        let descent = deref(doc, descriptor.get(b"Descent").ok()).and_then(as_number);
        // Some producers write zeros; keep the defaults then.
        if let (Some(a), Some(d)) = (ascent, descent) {
            if a > d && a != 0.0 {
                self.ascent = a;
                self.descent = d;
            }
        }
    }

    /// Split a shown string into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => u32::from(*hi) << 8 | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|b| u32::from(*b)).collect()
        }
    }

    /// Advance width of a code in 1/1000 em.
    pub fn width(&self, code: u32) -> f64 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .unwrap_or_else(|| self.standard.width(code))
    }

    /// Unicode text for a code.
    pub fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.get(&code) {
            return text.clone();
        }
        if self.two_byte {
            return char::REPLACEMENT_CHARACTER.to_string();
        }
        match u8::try_from(code) {
            Ok(byte) => WINDOWS_1252
                .decode_without_bom_handling(&[byte])
                .0
                .into_owned(),
            Err(_) => char::REPLACEMENT_CHARACTER.to_string(),
        }
    }

    /// Word spacing applies to the single-byte code 32 only.
    pub fn is_word_space(&self, code: u32) -> bool {
        !self.two_byte && code == 32
    }
}

fn deref<'a>(doc: &'a Document, obj: Option<&'a Object>) -> Option<&'a Object> {
    obj.and_then(|o| doc.dereference(o).ok()).map(|(_, o)| o)
}

fn as_number(obj: &Object) -> Option<f64> {
    object_to_f64(obj)
}

fn stream_bytes(doc: &Document, obj: Option<&Object>) -> Option<Vec<u8>> {
    let stream = deref(doc, obj)?.as_stream().ok()?;
    Some(
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
    )
}

fn descendant_font<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<&'a Dictionary> {
    let fonts = deref(doc, dict.get(b"DescendantFonts").ok())?.as_array().ok()?;
    deref(doc, fonts.first())?.as_dict().ok()
}

/// Parse a CIDFont `/W` array: `c [w1 w2 ...]` and `c_first c_last w`.
fn parse_cid_widths(doc: &Document, w: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let items: Vec<&Object> = w.iter().filter_map(|o| deref(doc, Some(o))).collect();
    let mut i = 0;
    while i < items.len() {
        let Some(first) = as_number(items[i]) else {
            break;
        };
        let first = first as u32;
        match items.get(i + 1) {
            Some(Object::Array(list)) => {
                for (offset, width) in list.iter().enumerate() {
                    let Some(code) = u32::try_from(offset).ok().and_then(|o| first.checked_add(o)) else {
                        break;
                    };
                    if let Some(width) = deref(doc, Some(width)).and_then(as_number) {
                        widths.insert(code, width);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(width)) = (as_number(last), items.get(i + 2).and_then(|o| as_number(o)))
                else {
                    break;
                };
                if let Some(codes) = code_span(first, last as u32) {
                    for code in codes {
                        widths.insert(code, width);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

#[derive(Debug, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

fn tokenize_cmap(data: &[u8]) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'<' | b'>' if data.get(i + 1) == Some(&data[i]) => i += 2,
            b'<' => {
                let end = data[i..].iter().position(|&b| b == b'>').map_or(data.len(), |p| i + p);
                let digits: Vec<u8> = data[i + 1..end]
                    .iter()
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .collect();
                let bytes = digits
                    .chunks(2)
                    .map(|pair| {
                        let hi = hex_value(pair[0]);
                        let lo = pair.get(1).map_or(0, |&b| hex_value(b));
                        hi << 4 | lo
                    })
                    .collect();
                tokens.push(CMapToken::Hex(bytes));
                i = end + 1;
            }
            b'[' => {
                tokens.push(CMapToken::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(CMapToken::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                if i == start {
                    i += 1;
                } else {
                    tokens.push(CMapToken::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
                }
            }
        }
    }
    tokens
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| acc << 8 | u32::from(b))
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from(*hi) << 8 | u16::from(*lo),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap.
pub fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    let tokens = tokenize_cmap(data);
    let mut map = HashMap::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            CMapToken::Word(w) if w == "beginbfchar" => {
                i += 1;
                while let (Some(CMapToken::Hex(src)), Some(CMapToken::Hex(dst))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    map.insert(code_of(src), utf16_text(dst));
                    i += 2;
                }
            }
            CMapToken::Word(w) if w == "beginbfrange" => {
                i += 1;
                while let (Some(CMapToken::Hex(lo)), Some(CMapToken::Hex(hi))) =
                    (tokens.get(i), tokens.get(i + 1))
                {
                    let (lo, hi) = (code_of(lo), code_of(hi));
                    match tokens.get(i + 2) {
                        Some(CMapToken::Hex(dst)) => {
                            let mut units = dst.clone();
                            for code in code_span(lo, hi).into_iter().flatten() {
                                map.insert(code, utf16_text(&units));
                                increment_last(&mut units);
                            }
                            i += 3;
                        }
                        Some(CMapToken::ArrayStart) => {
                            i += 3;
                            let mut code = Some(lo);
                            while let Some(CMapToken::Hex(dst)) = tokens.get(i) {
                                if let Some(c) = code.filter(|&c| c <= hi) {
                                    map.insert(c, utf16_text(dst));
                                }
                                code = code.and_then(|c| c.checked_add(1));
                                i += 1;
                            }
                            if tokens.get(i) == Some(&CMapToken::ArrayEnd) {
                                i += 1;
                            }
                        }
                        _ => break,
                    }
                }
            }
            _ => i += 1,
        }
    }
    map
}

/// Widest code range a single `/W` or `bfrange` entry may cover.
const MAX_CODE_SPAN: u32 = 0xFFFF;

/// Codes `lo..=hi`, or `None` when the range is inverted or too wide.
fn code_span(lo: u32, hi: u32) -> Option<std::ops::RangeInclusive<u32>> {
    (hi >= lo && hi - lo <= MAX_CODE_SPAN).then_some(lo..=hi)
}

fn increment_last(bytes: &mut [u8]) {
    for b in bytes.iter_mut().rev() {
        let (next, overflow) = b.overflowing_add(1);
        *b = next;
        if !overflow {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn standard_helvetica_widths() {
        let font = FontInfo::default();
        assert_eq!(font.width(u32::from(b'A')), 667.0);
        assert_eq!(font.width(u32::from(b'1')), 556.0);
        assert_eq!(font.width(200), 556.0);
    }

    #[test]
    fn courier_is_monospace() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! { "Type" => "Font", "Subtype" => "Type1", "BaseFont" => "Courier" };
        let font = FontInfo::from_dict(&doc, &dict);
        assert_eq!(font.width(u32::from(b'i')), 600.0);
        assert_eq!(font.base_font, "Courier");
    }

    #[test]
    fn explicit_widths_override_standard() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Subtype" => "TrueType",
            "BaseFont" => "Custom",
            "FirstChar" => 65,
            "Widths" => vec![Object::Integer(700), Object::Integer(710)],
        };
        let font = FontInfo::from_dict(&doc, &dict);
        assert_eq!(font.width(65), 700.0);
        assert_eq!(font.width(66), 710.0);
        // outside the array: standard fallback
        assert_eq!(font.width(32), 278.0);
    }

    #[test]
    fn single_byte_decoding_uses_windows_1252() {
        let font = FontInfo::default();
        assert_eq!(font.decode(u32::from(b'A')), "A");
        assert_eq!(font.decode(0x80), "\u{20AC}");
        assert!(font.is_word_space(32));
    }

    #[test]
    fn type0_reads_two_byte_codes_and_cid_widths() {
        let doc = Document::with_version("1.5");
        let dict = dictionary! {
            "Subtype" => "Type0",
            "BaseFont" => "CJK",
            "DescendantFonts" => vec![Object::Dictionary(dictionary! {
                "Subtype" => "CIDFontType2",
                "DW" => 900,
                "W" => vec![
                    Object::Integer(1),
                    Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
                    Object::Integer(10),
                    Object::Integer(12),
                    Object::Integer(250),
                ],
            })],
        };
        let font = FontInfo::from_dict(&doc, &dict);
        assert!(font.two_byte);
        assert_eq!(font.codes(&[0x00, 0x01, 0x00, 0x0B]), vec![1, 11]);
        assert_eq!(font.width(2), 600.0);
        assert_eq!(font.width(11), 250.0);
        assert_eq!(font.width(99), 900.0);
        assert_eq!(font.decode(1), "\u{FFFD}");
        assert!(!font.is_word_space(32));
    }

    #[test]
    fn to_unicode_bfchar_and_bfrange() {
        let cmap = b"/CIDInit /ProcSet findresource begin
            2 beginbfchar
            <0003> <0020>
            <0024> <0041>
            endbfchar
            2 beginbfrange
            <0010> <0012> <0030>
            <0020> <0021> [<00E9> <00DF>]
            endbfrange
            endcmap";
        let map = parse_to_unicode(cmap);
        assert_eq!(map.get(&0x03).map(String::as_str), Some(" "));
        assert_eq!(map.get(&0x24).map(String::as_str), Some("A"));
        assert_eq!(map.get(&0x11).map(String::as_str), Some("1"));
        assert_eq!(map.get(&0x12).map(String::as_str), Some("2"));
        assert_eq!(map.get(&0x21).map(String::as_str), Some("\u{DF}"));
        assert_eq!(map.len(), 7);
    }

    #[test]
    fn cid_widths_stop_at_the_end_of_the_code_space() {
        let doc = Document::with_version("1.5");
        let w = vec![
            Object::Integer(4_294_967_295),
            Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
            Object::Integer(0),
            Object::Integer(4_294_967_295),
            Object::Integer(700),
            Object::Integer(20),
            Object::Integer(10),
            Object::Integer(300),
        ];
        let widths = parse_cid_widths(&doc, &w);
        assert_eq!(widths.len(), 1);
        assert_eq!(widths.get(&u32::MAX), Some(&500.0));
    }

    #[test]
    fn bfrange_ignores_overflowing_and_oversized_ranges() {
        let map = parse_to_unicode(b"1 beginbfrange <FFFFFFFF> <FFFFFFFF> [<0041> <0042>] endbfrange");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&u32::MAX).map(String::as_str), Some("A"));

        let map = parse_to_unicode(
            b"2 beginbfrange <00000000> <FFFFFFFF> <0041> <0005> <0006> <0061> endbfrange",
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&5).map(String::as_str), Some("a"));
    }
}
