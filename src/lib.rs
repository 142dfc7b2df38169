//! docseek - keyword search over extracted, annotated documents.
//!
//! Documents arrive as per-page text produced by an external extraction
//! step (direct PDF/DOCX reading or OCR). Pages may carry a translation and
//! user annotations. A search walks every document and reports, for each
//! one that matches, where the keyword occurs along with a snippet of
//! surrounding text.
//!
//! # Quick start
//!
//! ```
//! use docseek::{Document, DocumentType, MemoryStore, Page, SearchConfig};
//! use docseek::search::{self, SearchHit};
//!
//! let store = MemoryStore::new(vec![Document::paged(
//!     1,
//!     "Annual Report 2023",
//!     DocumentType::Pdf,
//!     vec![Page::with_text("The report closes with an outlook.")],
//! )]);
//!
//! let hits = search::search(&store, "report", &SearchConfig::default())
//!     .unwrap();
//! assert_eq!(hits.len(), 1);
//! if let SearchHit::Paged { total_matches, .. } = &hits[0] {
//!     assert_eq!(*total_matches, 2);
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod data_dir;
pub mod document_db;
pub mod error;
pub mod ingestion;
pub mod model;
pub mod search;
pub mod snippet;
pub mod spans;
pub mod store;

pub use aggregate::MatchReport;
pub use config::SearchConfig;
pub use data_dir::DataDir;
pub use document_db::DocumentDb;
pub use error::{Error, Result};
pub use model::{Annotation, Document, DocumentBody, DocumentType, Page};
pub use search::SearchHit;
pub use snippet::{Keyword, SnippetWindow};
pub use store::{DocumentSource, MemoryStore};
