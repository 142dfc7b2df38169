//! Documents, pages and annotations as the text store hands them out.
//!
//! Two body layouts coexist: the normalized [`DocumentBody::Paged`] layout
//! where every page carries its own translation and annotations, and the
//! older [`DocumentBody::Raw`] layout that only stores one text blob per
//! page. The layout is chosen per document.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Category code assigned at upload time.
///
/// Codes 1 and 2 are files whose text can be read directly; every other
/// code goes through OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum DocumentType {
    Pdf,
    Docx,
    Scan(u32),
}

impl DocumentType {
    pub fn code(self) -> u32 {
        match self {
            Self::Pdf => 1,
            Self::Docx => 2,
            Self::Scan(code) => code,
        }
    }

    /// Whether the text was read straight from the file instead of OCR.
    pub fn uses_direct_extraction(self) -> bool {
        matches!(self, Self::Pdf | Self::Docx)
    }
}

impl From<u32> for DocumentType {
    fn from(code: u32) -> Self {
        match code {
            1 => Self::Pdf,
            2 => Self::Docx,
            other => Self::Scan(other),
        }
    }
}

impl From<DocumentType> for u32 {
    fn from(doc_type: DocumentType) -> Self {
        doc_type.code()
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Docx => write!(f, "docx"),
            Self::Scan(code) => write!(f, "scan({code})"),
        }
    }
}

/// A user note attached to one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub target_text: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl Annotation {
    /// Overwrite the fields that are set in `patch`, keeping the rest.
    pub fn apply(&mut self, patch: Annotation) {
        if patch.target_text.is_some() {
            self.target_text = patch.target_text;
        }
        if patch.kind.is_some() {
            self.kind = patch.kind;
        }
        if patch.content.is_some() {
            self.content = patch.content;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub jp_translation: Option<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Page {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentBody {
    Paged {
        pages: Vec<Page>,
    },
    Raw {
        #[serde(deserialize_with = "raw_pages")]
        text: Vec<Option<String>>,
    },
}

/// Raw text is stored as one entry per page. OCR output may instead arrive
/// as a single string, which becomes a one-page body.
fn raw_pages<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawText {
        Pages(Vec<Option<String>>),
        Single(String),
    }

    Ok(match RawText::deserialize(deserializer)? {
        RawText::Pages(pages) => pages,
        RawText::Single(text) => vec![Some(text)],
    })
}

impl DocumentBody {
    pub fn page_count(&self) -> usize {
        match self {
            Self::Paged { pages } => pages.len(),
            Self::Raw { text } => text.len(),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw { .. })
    }
}

/// Extraction output that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    #[serde(flatten)]
    pub body: DocumentBody,
}

impl NewDocument {
    pub fn into_document(self, id: u64) -> Document {
        Document {
            id,
            title: self.title,
            doc_type: self.doc_type,
            body: self.body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    #[serde(flatten)]
    pub body: DocumentBody,
}

impl Document {
    pub fn paged(
        id: u64,
        title: impl Into<String>,
        doc_type: DocumentType,
        pages: Vec<Page>,
    ) -> Self {
        Self {
            id,
            title: Some(title.into()),
            doc_type,
            body: DocumentBody::Paged { pages },
        }
    }

    pub fn raw(
        id: u64,
        title: impl Into<String>,
        doc_type: DocumentType,
        text: Vec<String>,
    ) -> Self {
        Self {
            id,
            title: Some(title.into()),
            doc_type,
            body: DocumentBody::Raw {
                text: text.into_iter().map(Some).collect(),
            },
        }
    }

    /// Mutable access to a 1-indexed page of a paged document.
    pub fn page_mut(&mut self, page_number: usize) -> Result<&mut Page> {
        let id = self.id;
        match &mut self.body {
            DocumentBody::Paged { pages } => page_number
                .checked_sub(1)
                .and_then(|idx| pages.get_mut(idx))
                .ok_or_else(|| {
                    Error::not_found("page", format!("{id}:{page_number}"))
                }),
            DocumentBody::Raw { .. } => Err(Error::InvalidArgument(format!(
                "document {id} stores raw page text without annotations"
            ))),
        }
    }

    /// Replace the primary text of a 1-indexed page, in either layout.
    pub fn set_page_text(
        &mut self,
        page_number: usize,
        text: Option<String>,
    ) -> Result<()> {
        let id = self.id;
        let slot = match &mut self.body {
            DocumentBody::Paged { pages } => page_number
                .checked_sub(1)
                .and_then(|idx| pages.get_mut(idx))
                .map(|page| &mut page.text),
            DocumentBody::Raw { text: blobs } => {
                page_number.checked_sub(1).and_then(|idx| blobs.get_mut(idx))
            }
        };
        let slot = slot.ok_or_else(|| {
            Error::not_found("page", format!("{id}:{page_number}"))
        })?;
        *slot = text;
        Ok(())
    }
}
