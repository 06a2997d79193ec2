//! Opened source documents
//!
//! - [`Document`]: one read-only grid or delimited body with identity
//! - [`SourceSet`]: the documents of one report run, in load order
//!
//! Documents are never mutated after loading; a content checksum is taken at
//! open time so provenance can name the exact bytes a value came from.

use crate::delimited::DelimitedDocument;
use crate::error::LocateMiss;
use crate::grid::Grid;
use crate::locator::{LabelQuery, Located, PatternQuery};
use crate::value::CellValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Document identity: source path, plus the sheet name for workbook sheets
///
/// Displayed as `path#sheet`; the sheet is kept apart so paths containing
/// `#` stay unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId {
    source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sheet: Option<String>,
}

impl DocumentId {
    /// Identity of a whole file
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sheet: None,
        }
    }

    /// Identity of one sheet of a source
    pub fn in_sheet(source: impl Into<String>, sheet: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sheet: Some(sheet.into()),
        }
    }

    /// Identity of a file path
    #[must_use]
    pub fn path(path: &Path) -> Self {
        Self::new(path.display().to_string())
    }

    /// Identity of one workbook sheet
    #[must_use]
    pub fn sheet(path: &Path, sheet: &str) -> Self {
        Self::in_sheet(path.display().to_string(), sheet)
    }

    /// Source path text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Sheet part, if any
    #[inline]
    #[must_use]
    pub fn sheet_name(&self) -> Option<&str> {
        self.sheet.as_deref()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "{}#{sheet}", self.source),
            None => f.write_str(&self.source),
        }
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Document shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Worksheet grid
    Grid,
    /// Delimited rows
    Delimited,
}

/// Parsed document content
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentBody {
    /// Worksheet grid
    Grid(Grid),
    /// Delimited rows
    Delimited(DelimitedDocument),
}

impl DocumentBody {
    /// Shape of this body
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Grid(_) => DocumentKind::Grid,
            Self::Delimited(_) => DocumentKind::Delimited,
        }
    }
}

/// Precedence of a document when several supply the same field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    /// Authoritative structured export
    #[default]
    Primary,
    /// Spreadsheet consulted only for fields still missing
    Secondary,
}

/// One opened document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: DocumentId,
    body: DocumentBody,
    role: SourceRole,
    checksum: Option<String>,
}

impl Document {
    /// Wrap a grid
    pub fn grid(id: impl Into<DocumentId>, grid: Grid) -> Self {
        Self::new(id.into(), DocumentBody::Grid(grid))
    }

    /// Wrap a delimited document
    pub fn delimited(id: impl Into<DocumentId>, doc: DelimitedDocument) -> Self {
        Self::new(id.into(), DocumentBody::Delimited(doc))
    }

    fn new(id: DocumentId, body: DocumentBody) -> Self {
        Self {
            id,
            body,
            role: SourceRole::Primary,
            checksum: None,
        }
    }

    /// With precedence role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: SourceRole) -> Self {
        self.role = role;
        self
    }

    /// Record the blake3 checksum of the bytes this document was read from
    #[must_use]
    pub fn with_checksum_of(mut self, bytes: &[u8]) -> Self {
        self.checksum = Some(blake3::hash(bytes).to_hex().to_string());
        self
    }

    /// Identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Body
    #[inline]
    #[must_use]
    pub fn body(&self) -> &DocumentBody {
        &self.body
    }

    /// Shape
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.body.kind()
    }

    /// Precedence role
    #[inline]
    #[must_use]
    pub fn role(&self) -> SourceRole {
        self.role
    }

    /// Hex checksum of the source bytes
    #[inline]
    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Grid body, if this is a grid
    #[must_use]
    pub fn as_grid(&self) -> Option<&Grid> {
        match &self.body {
            DocumentBody::Grid(g) => Some(g),
            DocumentBody::Delimited(_) => None,
        }
    }

    /// Delimited body, if this is delimited text
    #[must_use]
    pub fn as_delimited(&self) -> Option<&DelimitedDocument> {
        match &self.body {
            DocumentBody::Delimited(d) => Some(d),
            DocumentBody::Grid(_) => None,
        }
    }
}

/// A source that could not be opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unavailable {
    /// Path as given
    pub path: String,
    /// Loader error text
    pub reason: String,
}

/// Documents of one report run
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    documents: IndexMap<DocumentId, Document>,
    unavailable: Vec<Unavailable>,
}

impl SourceSet {
    /// Empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document; a document with the same id replaces the earlier one
    pub fn insert(&mut self, document: Document) {
        if let Some(previous) = self.documents.insert(document.id.clone(), document) {
            tracing::warn!(id = %previous.id, "document loaded twice; later copy kept");
        }
    }

    /// With document
    #[must_use]
    pub fn with_document(mut self, document: Document) -> Self {
        self.insert(document);
        self
    }

    /// Remember a source that failed to load
    pub fn mark_unavailable(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.unavailable.push(Unavailable {
            path: path.into(),
            reason: reason.into(),
        });
    }

    /// Sources that failed to load
    #[must_use]
    pub fn unavailable(&self) -> &[Unavailable] {
        &self.unavailable
    }

    /// Document by id
    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    /// All documents in load order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Documents with the given role, in load order
    pub fn with_role(&self, role: SourceRole) -> impl Iterator<Item = &Document> {
        self.documents.values().filter(move |d| d.role == role)
    }

    /// Number of documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Role of a document; `None` for unknown ids
    #[must_use]
    pub fn role_of(&self, id: &DocumentId) -> Option<SourceRole> {
        self.documents.get(id).map(Document::role)
    }

    /// Grid body of a document
    #[must_use]
    pub fn grid(&self, id: &DocumentId) -> Option<&Grid> {
        self.documents.get(id).and_then(Document::as_grid)
    }

    /// Delimited body of a document
    #[must_use]
    pub fn delimited(&self, id: &DocumentId) -> Option<&DelimitedDocument> {
        self.documents.get(id).and_then(Document::as_delimited)
    }

    /// Locate in a document with a structured miss
    ///
    /// # Errors
    /// - `LocateMiss::UnknownDocument` for an id not in the set
    /// - `LocateMiss::NotAGrid` for delimited documents
    /// - any miss from [`Grid::try_locate`]
    pub fn try_locate(&self, id: &DocumentId, query: &LabelQuery) -> Result<Located, LocateMiss> {
        let doc = self.documents.get(id).ok_or_else(|| LocateMiss::UnknownDocument {
            id: id.to_string(),
        })?;
        let grid = doc.as_grid().ok_or_else(|| LocateMiss::NotAGrid { id: id.to_string() })?;
        grid.try_locate(query)
    }

    /// Best-effort locate; unknown documents and misses log a warning
    #[must_use]
    pub fn locate(&self, id: &DocumentId, query: &LabelQuery) -> Option<CellValue> {
        match self.try_locate(id, query) {
            Ok(found) => Some(found.value),
            Err(miss) => {
                tracing::warn!(document = %id, "{miss}");
                None
            }
        }
    }

    /// Pattern search in a grid document; empty for unknown or non-grid ids
    #[must_use]
    pub fn locate_all(&self, id: &DocumentId, query: &PatternQuery) -> Vec<CellValue> {
        match self.grid(id) {
            Some(grid) => grid.locate_all(query),
            None => {
                tracing::warn!(document = %id, "pattern search on unknown or non-grid document");
                Vec::new()
            }
        }
    }
}
