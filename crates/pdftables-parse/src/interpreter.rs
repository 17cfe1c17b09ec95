//! Content stream interpreter.
//!
//! Walks decoded content operators, maintaining the graphics and text state,
//! and collects positioned [`Char`]s and painted [`Edge`]s in top-left page
//! space. Form XObjects invoked through `Do` are interpreted recursively.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdftables_core::{BBox, Char, Ctm, Edge, edge_from_segment};
use tracing::{debug, trace, warn};

use crate::error::BackendError;
use crate::fonts::FontInfo;
use crate::lopdf_backend::object_to_f64;
use crate::page_geometry::PageGeometry;

/// Maximum nesting of Form XObjects.
pub const MAX_FORM_DEPTH: usize = 16;

/// Resource dictionaries visible in one scope, nearest first.
#[derive(Debug, Clone, Default)]
pub struct Resources<'a> {
    dicts: Vec<&'a Dictionary>,
}

impl<'a> Resources<'a> {
    pub fn new(dicts: Vec<&'a Dictionary>) -> Self {
        Self { dicts }
    }

    /// Look up `/<category>/<name>`, returning the first hit.
    fn lookup(&self, doc: &'a Document, category: &[u8], name: &[u8]) -> Option<&'a Object> {
        self.dicts.iter().find_map(|dict| {
            let (_, entries) = doc.dereference(dict.get(category).ok()?).ok()?;
            entries.as_dict().ok()?.get(name).ok()
        })
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Rc<FontInfo>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    /// `Tz / 100`.
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Rc::new(FontInfo::default()),
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GraphicsState {
    ctm: Ctm,
    text: TextState,
}

/// Path under construction, already mapped to page space.
#[derive(Debug, Default)]
struct PathBuilder {
    segments: Vec<((f64, f64), (f64, f64))>,
    current: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
}

impl PathBuilder {
    fn move_to(&mut self, p: (f64, f64)) {
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_to(&mut self, p: (f64, f64)) {
        if let Some(from) = self.current {
            self.segments.push((from, p));
        } else {
            self.subpath_start = Some(p);
        }
        self.current = Some(p);
    }

    fn close(&mut self) {
        if let (Some(current), Some(start)) = (self.current, self.subpath_start) {
            if current != start {
                self.segments.push((current, start));
            }
            self.current = Some(start);
        }
    }

    fn take(&mut self) -> Vec<((f64, f64), (f64, f64))> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.segments)
    }
}

/// Collects chars and edges for one page.
pub struct Interpreter<'a> {
    doc: &'a Document,
    geometry: &'a PageGeometry,
    fonts: HashMap<ObjectId, Rc<FontInfo>>,
    chars: Vec<Char>,
    edges: Vec<Edge>,
}

impl<'a> Interpreter<'a> {
    pub fn new(doc: &'a Document, geometry: &'a PageGeometry) -> Self {
        Self {
            doc,
            geometry,
            fonts: HashMap::new(),
            chars: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Interpret a page-level content stream.
    pub fn run(&mut self, content: &[u8], resources: &Resources<'a>) -> Result<(), BackendError> {
        let mut gstate = GraphicsState::default();
        self.interpret(content, resources, &mut gstate, 0)
    }

    pub fn into_parts(self) -> (Vec<Char>, Vec<Edge>) {
        (self.chars, self.edges)
    }

    fn interpret(
        &mut self,
        content: &[u8],
        resources: &Resources<'a>,
        gstate: &mut GraphicsState,
        depth: usize,
    ) -> Result<(), BackendError> {
        if depth > MAX_FORM_DEPTH {
            return Err(BackendError::Interpreter(format!(
                "Form XObject recursion depth {depth} exceeds limit {MAX_FORM_DEPTH}"
            )));
        }

        let content = Content::decode(content)
            .map_err(|e| BackendError::Interpreter(format!("failed to decode content stream: {e}")))?;

        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut path = PathBuilder::default();
        let mut tm = Ctm::identity();
        let mut tlm = Ctm::identity();

        for op in &content.operations {
            let nums = numbers(op);
            match op.operator.as_str() {
                "q" => stack.push(gstate.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        *gstate = saved;
                    }
                }
                "cm" => {
                    if let [a, b, c, d, e, f] = nums[..] {
                        gstate.ctm = Ctm::new(a, b, c, d, e, f).concat(&gstate.ctm);
                    }
                }

                // path construction
                "m" => {
                    if let [x, y] = nums[..] {
                        path.move_to(self.to_page(&gstate.ctm, x, y));
                    }
                }
                "l" => {
                    if let [x, y] = nums[..] {
                        path.line_to(self.to_page(&gstate.ctm, x, y));
                    }
                }
                // curves only contribute their chord
                "c" => {
                    if let [_, _, _, _, x, y] = nums[..] {
                        path.line_to(self.to_page(&gstate.ctm, x, y));
                    }
                }
                "v" | "y" => {
                    if let [_, _, x, y] = nums[..] {
                        path.line_to(self.to_page(&gstate.ctm, x, y));
                    }
                }
                "h" => path.close(),
                "re" => {
                    if let [x, y, w, h] = nums[..] {
                        path.move_to(self.to_page(&gstate.ctm, x, y));
                        path.line_to(self.to_page(&gstate.ctm, x + w, y));
                        path.line_to(self.to_page(&gstate.ctm, x + w, y + h));
                        path.line_to(self.to_page(&gstate.ctm, x, y + h));
                        path.close();
                    }
                }

                // painting
                "S" => self.commit_path(&mut path),
                "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                    path.close();
                    self.commit_path(&mut path);
                }
                "n" => {
                    path.take();
                }

                // text objects and state
                "BT" => {
                    tm = Ctm::identity();
                    tlm = Ctm::identity();
                }
                "ET" => {}
                "Tf" => {
                    if let Some(size) = nums.first().copied() {
                        gstate.text.size = size;
                    }
                    if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                        gstate.text.font = self.load_font(resources, name);
                    }
                }
                "Tc" => set_first(&nums, &mut gstate.text.char_spacing),
                "Tw" => set_first(&nums, &mut gstate.text.word_spacing),
                "TL" => set_first(&nums, &mut gstate.text.leading),
                "Ts" => set_first(&nums, &mut gstate.text.rise),
                "Tz" => {
                    if let Some(scale) = nums.first() {
                        gstate.text.horizontal_scale = scale / 100.0;
                    }
                }
                "Td" => {
                    if let [tx, ty] = nums[..] {
                        tlm = Ctm::translation(tx, ty).concat(&tlm);
                        tm = tlm;
                    }
                }
                "TD" => {
                    if let [tx, ty] = nums[..] {
                        gstate.text.leading = -ty;
                        tlm = Ctm::translation(tx, ty).concat(&tlm);
                        tm = tlm;
                    }
                }
                "Tm" => {
                    if let [a, b, c, d, e, f] = nums[..] {
                        tlm = Ctm::new(a, b, c, d, e, f);
                        tm = tlm;
                    }
                }
                "T*" => next_line(&mut tm, &mut tlm, gstate.text.leading),

                // text showing
                "Tj" => {
                    if let Some(bytes) = op.operands.first().and_then(|o| o.as_str().ok()) {
                        self.show_text(bytes, gstate, &mut tm);
                    }
                }
                "'" => {
                    next_line(&mut tm, &mut tlm, gstate.text.leading);
                    if let Some(bytes) = op.operands.first().and_then(|o| o.as_str().ok()) {
                        self.show_text(bytes, gstate, &mut tm);
                    }
                }
                "\"" => {
                    if let [aw, ac, ..] = nums[..] {
                        gstate.text.word_spacing = aw;
                        gstate.text.char_spacing = ac;
                    }
                    next_line(&mut tm, &mut tlm, gstate.text.leading);
                    if let Some(bytes) = op.operands.get(2).and_then(|o| o.as_str().ok()) {
                        self.show_text(bytes, gstate, &mut tm);
                    }
                }
                "TJ" => {
                    if let Some(items) = op.operands.first().and_then(|o| o.as_array().ok()) {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show_text(bytes, gstate, &mut tm),
                                other => {
                                    if let Some(adjust) = object_to_f64(other) {
                                        let text = &gstate.text;
                                        let tx = -adjust / 1000.0 * text.size * text.horizontal_scale;
                                        tm = Ctm::translation(tx, 0.0).concat(&tm);
                                    }
                                }
                            }
                        }
                    }
                }

                "Do" => {
                    if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                        self.invoke_xobject(resources, name, gstate, depth)?;
                    }
                }

                other => trace!(operator = other, "ignored operator"),
            }
        }

        Ok(())
    }

    fn to_page(&self, ctm: &Ctm, x: f64, y: f64) -> (f64, f64) {
        let (nx, ny) = ctm.transform_point(x, y);
        self.geometry.normalize_point(nx, ny)
    }

    fn commit_path(&mut self, path: &mut PathBuilder) {
        for ((xa, ya), (xb, yb)) in path.take() {
            if xa == xb && ya == yb {
                continue;
            }
            self.edges.push(edge_from_segment(xa, ya, xb, yb));
        }
    }

    fn show_text(&mut self, bytes: &[u8], gstate: &GraphicsState, tm: &mut Ctm) {
        let text = &gstate.text;
        let font = Rc::clone(&text.font);
        let th = text.horizontal_scale;

        for code in font.codes(bytes) {
            let w0 = font.width(code) / 1000.0;
            let trm = Ctm::new(text.size * th, 0.0, 0.0, text.size, 0.0, text.rise)
                .concat(tm)
                .concat(&gstate.ctm);

            let decoded = font.decode(code);
            if !decoded.is_empty() {
                let (ascent, descent) = (font.ascent / 1000.0, font.descent / 1000.0);
                let corners = [(0.0, descent), (w0, descent), (0.0, ascent), (w0, ascent)]
                    .map(|(x, y)| {
                        let (nx, ny) = trm.transform_point(x, y);
                        self.geometry.normalize_point(nx, ny)
                    });
                let bbox = corners
                    .iter()
                    .skip(1)
                    .fold(BBox::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1), |acc, &(x, y)| {
                        acc.union(&BBox::new(x, y, x, y))
                    });
                self.chars.push(Char {
                    text: decoded,
                    bbox,
                    size: (trm.c * trm.c + trm.d * trm.d).sqrt(),
                });
            }

            let mut tx = w0 * text.size + text.char_spacing;
            if font.is_word_space(code) {
                tx += text.word_spacing;
            }
            *tm = Ctm::translation(tx * th, 0.0).concat(tm);
        }
    }

    fn load_font(&mut self, resources: &Resources<'a>, name: &[u8]) -> Rc<FontInfo> {
        let Some(entry) = resources.lookup(self.doc, b"Font", name) else {
            warn!(font = %String::from_utf8_lossy(name), "font resource not found, using default metrics");
            return Rc::new(FontInfo::default());
        };

        let id = entry.as_reference().ok();
        if let Some(cached) = id.and_then(|id| self.fonts.get(&id)) {
            return Rc::clone(cached);
        }

        let font = match self.doc.dereference(entry).map(|(_, o)| o.as_dict()) {
            Ok(Ok(dict)) => Rc::new(FontInfo::from_dict(self.doc, dict)),
            _ => {
                warn!(font = %String::from_utf8_lossy(name), "font resource is not a dictionary");
                Rc::new(FontInfo::default())
            }
        };
        if let Some(id) = id {
            self.fonts.insert(id, Rc::clone(&font));
        }
        font
    }

    fn invoke_xobject(
        &mut self,
        resources: &Resources<'a>,
        name: &[u8],
        gstate: &GraphicsState,
        depth: usize,
    ) -> Result<(), BackendError> {
        let label = String::from_utf8_lossy(name);
        let Some(entry) = resources.lookup(self.doc, b"XObject", name) else {
            warn!(xobject = %label, "XObject not found in resources");
            return Ok(());
        };
        let stream = self
            .doc
            .dereference(entry)
            .and_then(|(_, o)| o.as_stream())
            .map_err(|e| BackendError::Interpreter(format!("XObject /{label} is not a stream: {e}")))?;

        let subtype = stream.dict.get(b"Subtype").and_then(Object::as_name).unwrap_or(&[]);
        if subtype != b"Form" {
            trace!(xobject = %label, "skipping non-form XObject");
            return Ok(());
        }
        debug!(xobject = %label, depth = depth + 1, "entering form XObject");

        let mut form_state = gstate.clone();
        if let Some(matrix) = form_matrix(stream) {
            form_state.ctm = matrix.concat(&form_state.ctm);
        }

        let scope = match self
            .doc
            .dereference(stream.dict.get(b"Resources").unwrap_or(&Object::Null))
            .and_then(|(_, o)| o.as_dict())
        {
            Ok(dict) => Resources::new(vec![dict]),
            Err(_) => resources.clone(),
        };

        let content = stream_content(stream);
        self.interpret(&content, &scope, &mut form_state, depth + 1)
    }
}

fn numbers(op: &Operation) -> Vec<f64> {
    op.operands.iter().filter_map(object_to_f64).collect()
}

fn set_first(nums: &[f64], target: &mut f64) {
    if let Some(value) = nums.first() {
        *target = *value;
    }
}

fn next_line(tm: &mut Ctm, tlm: &mut Ctm, leading: f64) {
    *tlm = Ctm::translation(0.0, -leading).concat(tlm);
    *tm = *tlm;
}

fn form_matrix(stream: &Stream) -> Option<Ctm> {
    let values: Vec<f64> = stream
        .dict
        .get(b"Matrix")
        .and_then(Object::as_array)
        .ok()?
        .iter()
        .map(object_to_f64)
        .collect::<Option<_>>()?;
    match values[..] {
        [a, b, c, d, e, f] => Some(Ctm::new(a, b, c, d, e, f)),
        _ => None,
    }
}

/// Decoded stream bytes; streams without a filter are returned as stored.
pub(crate) fn stream_content(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}
