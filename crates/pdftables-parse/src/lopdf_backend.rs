//! lopdf-based document access.
//!
//! Opens a PDF with [lopdf](https://crates.io/crates/lopdf), resolves page
//! geometry (inherited MediaBox, CropBox and Rotate) and runs the content
//! interpreter to produce each page's chars and ruling edges.

use std::path::Path;

use lopdf::{Dictionary, Object, ObjectId};
use pdftables_core::{Char, Edge};
use tracing::debug;

use crate::error::BackendError;
use crate::interpreter::{Interpreter, Resources};
use crate::page_geometry::{DEFAULT_MEDIA_BOX, PageGeometry};

/// The positioned content of one page, in top-left page space.
#[derive(Debug, Clone, Default)]
pub struct PageObjects {
    pub width: f64,
    pub height: f64,
    pub chars: Vec<Char>,
    pub edges: Vec<Edge>,
}

/// A parsed PDF document backed by lopdf.
pub struct LopdfDocument {
    inner: lopdf::Document,
    /// Page ObjectIds in document order (0-based).
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl LopdfDocument {
    /// Open a document from a file path.
    pub fn open_file(path: &Path) -> Result<Self, BackendError> {
        if !path.exists() {
            return Err(BackendError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        Self::open(&bytes)
    }

    /// Open a document from bytes.
    pub fn open(bytes: &[u8]) -> Result<Self, BackendError> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Parse(
                "document is encrypted and cannot be read without a password".to_string(),
            ));
        }

        let page_ids: Vec<ObjectId> = inner.get_pages().values().copied().collect();
        debug!(pages = page_ids.len(), "opened PDF");
        Ok(Self { inner, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Interpret the page at a 0-based index.
    pub fn page(&self, index: usize) -> Result<PageObjects, BackendError> {
        let page_id = *self.page_ids.get(index).ok_or_else(|| {
            BackendError::Parse(format!(
                "page index {index} out of range (0..{})",
                self.page_ids.len()
            ))
        })?;
        let doc = &self.inner;

        let geometry = self.page_geometry(page_id)?;
        let resources = self.page_resources(page_id)?;
        let content = doc
            .get_page_content(page_id)
            .map_err(|e| BackendError::Parse(format!("failed to read page content: {e}")))?;

        let mut interpreter = Interpreter::new(doc, &geometry);
        interpreter.run(&content, &resources)?;
        let (chars, edges) = interpreter.into_parts();

        debug!(
            page = index + 1,
            chars = chars.len(),
            edges = edges.len(),
            "interpreted page"
        );
        Ok(PageObjects {
            width: geometry.width(),
            height: geometry.height(),
            chars,
            edges,
        })
    }

    fn page_geometry(&self, page_id: ObjectId) -> Result<PageGeometry, BackendError> {
        let media_box = match self.resolve_inherited(page_id, b"MediaBox")? {
            Some(obj) => box_from_object(&self.inner, obj).unwrap_or(DEFAULT_MEDIA_BOX),
            None => DEFAULT_MEDIA_BOX,
        };
        let crop_box = self
            .resolve_inherited(page_id, b"CropBox")?
            .and_then(|obj| box_from_object(&self.inner, obj));
        let rotation = self
            .resolve_inherited(page_id, b"Rotate")?
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);
        Ok(PageGeometry::new(media_box, crop_box, rotation))
    }

    /// Page resources, nearest first, falling back through the page tree.
    fn page_resources(&self, page_id: ObjectId) -> Result<Resources<'_>, BackendError> {
        let (own, inherited) = self
            .inner
            .get_page_resources(page_id)
            .map_err(|e| BackendError::Parse(format!("failed to read page resources: {e}")))?;
        let mut dicts: Vec<&Dictionary> = own.into_iter().collect();
        dicts.extend(
            inherited
                .into_iter()
                .filter_map(|id| self.inner.get_dictionary(id).ok()),
        );
        Ok(Resources::new(dicts))
    }

    /// Look up a page attribute, walking up `/Parent` links when absent.
    fn resolve_inherited(&self, page_id: ObjectId, key: &[u8]) -> Result<Option<&Object>, BackendError> {
        let mut current = page_id;
        // bounded walk guards against cyclic page trees
        for _ in 0..64 {
            let dict = self
                .inner
                .get_dictionary(current)
                .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))?;
            if let Ok(value) = dict.get(key) {
                return Ok(Some(value));
            }
            match dict.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => current = parent,
                Err(_) => return Ok(None),
            }
        }
        Ok(None)
    }
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

fn box_from_object(doc: &lopdf::Document, obj: &Object) -> Option<[f64; 4]> {
    let (_, obj) = doc.dereference(obj).ok()?;
    let values: Vec<f64> = obj
        .as_array()
        .ok()?
        .iter()
        .map(object_to_f64)
        .collect::<Option<_>>()?;
    values.try_into().ok()
}
