use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    model::{Annotation, Document, DocumentBody, NewDocument},
    store::DocumentSource,
};

const DOCUMENTS: TableDefinition<u64, &[u8]> =
    TableDefinition::new("documents");
const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_DOCUMENT_ID: &str = "next_document_id";

/// Documents and settings persisted in a single redb file.
///
/// Each document is stored whole, pages and annotations included, so
/// removing a document removes everything it owns.
pub struct DocumentDb {
    db: Database,
}

impl DocumentDb {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(DOCUMENTS)?;
        txn.open_table(SETTINGS)?;
        txn.open_table(META)?;
        txn.commit()?;

        Ok(Self { db })
    }

    // -- Documents --

    /// Store a new document and return its id. Ids start at 1 and are
    /// never reused.
    pub fn insert_document(&self, document: NewDocument) -> Result<u64> {
        let txn = self.db.begin_write()?;
        let id = {
            let mut meta = txn.open_table(META)?;
            let id = meta.get(NEXT_DOCUMENT_ID)?.map_or(1, |v| v.value());
            meta.insert(NEXT_DOCUMENT_ID, id + 1)?;
            id
        };
        let bytes = serde_json::to_vec(&document.into_document(id))?;
        {
            let mut table = txn.open_table(DOCUMENTS)?;
            table.insert(id, bytes.as_slice())?;
        }
        txn.commit()?;
        debug!(document = id, "stored document");
        Ok(id)
    }

    pub fn get_document(&self, id: u64) -> Result<Option<Document>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        let Some(bytes) = table.get(id)?.map(|v| v.value().to_vec()) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub fn remove_document(&self, id: u64) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(DOCUMENTS)?;
            table.remove(id)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    pub fn list_document_ids(&self) -> Result<Vec<u64>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, _v) = entry?;
            result.push(k.value());
        }
        Ok(result)
    }

    pub fn set_title(&self, id: u64, title: &str) -> Result<()> {
        self.update_document(id, |doc| {
            doc.title = Some(title.to_string());
            Ok(())
        })
    }

    /// Replace every page of a document.
    pub fn replace_body(&self, id: u64, body: DocumentBody) -> Result<()> {
        self.update_document(id, |doc| {
            doc.body = body;
            Ok(())
        })
    }

    // -- Pages --

    pub fn set_page_text(
        &self,
        id: u64,
        page_number: usize,
        text: Option<String>,
    ) -> Result<()> {
        self.update_document(id, |doc| doc.set_page_text(page_number, text))
    }

    pub fn set_page_translation(
        &self,
        id: u64,
        page_number: usize,
        translation: Option<String>,
    ) -> Result<()> {
        self.update_document(id, |doc| {
            doc.page_mut(page_number)?.jp_translation = translation;
            Ok(())
        })
    }

    // -- Annotations --

    /// Append an annotation to a page and return its 1-based position.
    pub fn add_annotation(
        &self,
        id: u64,
        page_number: usize,
        annotation: Annotation,
    ) -> Result<usize> {
        self.update_document(id, |doc| {
            let page = doc.page_mut(page_number)?;
            page.annotations.push(annotation);
            Ok(page.annotations.len())
        })
    }

    /// Overwrite the fields set in `patch` and return the updated annotation.
    pub fn update_annotation(
        &self,
        id: u64,
        page_number: usize,
        position: usize,
        patch: Annotation,
    ) -> Result<Annotation> {
        self.update_document(id, |doc| {
            let annotation = annotation_mut(doc, page_number, position)?;
            annotation.apply(patch);
            Ok(annotation.clone())
        })
    }

    /// Remove an annotation. Later annotations on the page move up by one.
    pub fn remove_annotation(
        &self,
        id: u64,
        page_number: usize,
        position: usize,
    ) -> Result<Annotation> {
        self.update_document(id, |doc| {
            annotation_mut(doc, page_number, position)?;
            let page = doc.page_mut(page_number)?;
            Ok(page.annotations.remove(position - 1))
        })
    }

    /// Read-modify-write one document inside a single write transaction.
    /// Nothing is written if `f` fails.
    fn update_document<T>(
        &self,
        id: u64,
        f: impl FnOnce(&mut Document) -> Result<T>,
    ) -> Result<T> {
        let txn = self.db.begin_write()?;
        let result = {
            let mut table = txn.open_table(DOCUMENTS)?;
            let bytes = table
                .get(id)?
                .map(|v| v.value().to_vec())
                .ok_or_else(|| Error::not_found("document", id))?;
            let mut document: Document = serde_json::from_slice(&bytes)?;
            let result = f(&mut document)?;
            let bytes = serde_json::to_vec(&document)?;
            table.insert(id, bytes.as_slice())?;
            result
        };
        txn.commit()?;
        Ok(result)
    }

    // -- Settings --

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    /// Get a setting, returning the default if not set.
    pub fn get_setting_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .get_setting(key)?
            .unwrap_or_else(|| default.to_string()))
    }
}

fn annotation_mut(
    doc: &mut Document,
    page_number: usize,
    position: usize,
) -> Result<&mut Annotation> {
    let id = doc.id;
    doc.page_mut(page_number)?
        .annotations
        .get_mut(position.wrapping_sub(1))
        .ok_or_else(|| {
            Error::not_found(
                "annotation",
                format!("{id}:{page_number}#{position}"),
            )
        })
}

impl DocumentSource for DocumentDb {
    /// Every stored document, read from one snapshot. Rows that no longer
    /// decode are skipped.
    fn list_documents(&self) -> Result<Vec<Document>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(DOCUMENTS)?;
        let mut result = Vec::new();
        for entry in table.iter()? {
            let (k, v) = entry?;
            match serde_json::from_slice::<Document>(v.value()) {
                Ok(document) => result.push(document),
                Err(err) => {
                    warn!(document = k.value(), %err, "skipping unreadable document")
                }
            }
        }
        Ok(result)
    }
}

impl std::fmt::Debug for DocumentDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentDb").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentType, Page};

    fn test_db() -> (tempfile::TempDir, DocumentDb) {
        let tmp = tempfile::tempdir().unwrap();
        let db = DocumentDb::open(&tmp.path().join("documents.redb")).unwrap();
        (tmp, db)
    }

    fn paged(title: &str, pages: Vec<Page>) -> NewDocument {
        NewDocument {
            title: Some(title.to_string()),
            doc_type: DocumentType::Pdf,
            body: DocumentBody::Paged { pages },
        }
    }

    #[test]
    fn documents_crud() {
        let (_tmp, db) = test_db();

        assert!(db.list_documents().unwrap().is_empty());
        assert_eq!(db.get_document(1).unwrap(), None);

        let id = db
            .insert_document(paged("report.pdf", vec![Page::with_text("x")]))
            .unwrap();
        assert_eq!(id, 1);

        let doc = db.get_document(id).unwrap().unwrap();
        assert_eq!(doc.id, 1);
        assert_eq!(doc.title.as_deref(), Some("report.pdf"));

        db.set_title(id, "Annual Report").unwrap();
        assert_eq!(
            db.get_document(id).unwrap().unwrap().title.as_deref(),
            Some("Annual Report")
        );

        assert!(db.remove_document(id).unwrap());
        assert!(!db.remove_document(id).unwrap());
        assert_eq!(db.get_document(id).unwrap(), None);
    }

    #[test]
    fn ids_are_not_reused() {
        let (_tmp, db) = test_db();
        let first = db.insert_document(paged("a", vec![])).unwrap();
        db.remove_document(first).unwrap();
        let second = db.insert_document(paged("b", vec![])).unwrap();
        assert_eq!(second, first + 1);
        assert_eq!(db.list_document_ids().unwrap(), vec![second]);
    }

    #[test]
    fn list_preserves_id_order() {
        let (_tmp, db) = test_db();
        for title in ["one", "two", "three"] {
            db.insert_document(paged(title, vec![])).unwrap();
        }
        let titles: Vec<String> = db
            .list_documents()
            .unwrap()
            .into_iter()
            .filter_map(|doc| doc.title)
            .collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    #[test]
    fn replace_body_switches_layout() {
        let (_tmp, db) = test_db();
        let id = db.insert_document(paged("doc", vec![])).unwrap();
        db.replace_body(
            id,
            DocumentBody::Raw {
                text: vec![Some("page one".into())],
            },
        )
        .unwrap();
        assert!(db.get_document(id).unwrap().unwrap().body.is_raw());
    }

    #[test]
    fn page_edits() {
        let (_tmp, db) = test_db();
        let id = db
            .insert_document(paged("doc", vec![Page::with_text("old")]))
            .unwrap();

        db.set_page_text(id, 1, Some("new".into())).unwrap();
        db.set_page_translation(id, 1, Some("新しい".into())).unwrap();

        let doc = db.get_document(id).unwrap().unwrap();
        let DocumentBody::Paged { pages } = doc.body else {
            panic!("expected paged body");
        };
        assert_eq!(pages[0].text.as_deref(), Some("new"));
        assert_eq!(pages[0].jp_translation.as_deref(), Some("新しい"));

        assert!(matches!(
            db.set_page_text(id, 2, None),
            Err(Error::NotFound { kind: "page", .. })
        ));
    }

    #[test]
    fn annotations_crud() {
        let (_tmp, db) = test_db();
        let id = db
            .insert_document(paged("doc", vec![Page::with_text("body")]))
            .unwrap();

        let first = Annotation {
            target_text: Some("body".into()),
            kind: Some("term".into()),
            content: None,
        };
        let second = Annotation {
            target_text: Some("other".into()),
            ..Annotation::default()
        };
        assert_eq!(db.add_annotation(id, 1, first.clone()).unwrap(), 1);
        assert_eq!(db.add_annotation(id, 1, second).unwrap(), 2);

        let updated = db
            .update_annotation(
                id,
                1,
                1,
                Annotation {
                    content: Some("a note".into()),
                    ..Annotation::default()
                },
            )
            .unwrap();
        assert_eq!(updated.target_text.as_deref(), Some("body"));
        assert_eq!(updated.content.as_deref(), Some("a note"));

        let removed = db.remove_annotation(id, 1, 1).unwrap();
        assert_eq!(removed.kind, first.kind);

        let doc = db.get_document(id).unwrap().unwrap();
        let DocumentBody::Paged { pages } = doc.body else {
            panic!("expected paged body");
        };
        assert_eq!(pages[0].annotations.len(), 1);
        assert_eq!(pages[0].annotations[0].target_text.as_deref(), Some("other"));
    }

    #[test]
    fn annotation_errors_leave_document_untouched() {
        let (_tmp, db) = test_db();
        let id = db
            .insert_document(paged("doc", vec![Page::with_text("body")]))
            .unwrap();

        assert!(matches!(
            db.remove_annotation(id, 1, 1),
            Err(Error::NotFound { kind: "annotation", .. })
        ));
        assert!(matches!(
            db.remove_annotation(id, 1, 0),
            Err(Error::NotFound { kind: "annotation", .. })
        ));
        assert!(matches!(
            db.add_annotation(99, 1, Annotation::default()),
            Err(Error::NotFound { kind: "document", .. })
        ));
        assert!(matches!(
            db.add_annotation(id, 5, Annotation::default()),
            Err(Error::NotFound { kind: "page", .. })
        ));
    }

    #[test]
    fn raw_documents_reject_annotations() {
        let (_tmp, db) = test_db();
        let id = db
            .insert_document(NewDocument {
                title: Some("scan.png".into()),
                doc_type: DocumentType::Scan(3),
                body: DocumentBody::Raw {
                    text: vec![Some("text".into())],
                },
            })
            .unwrap();
        assert!(matches!(
            db.add_annotation(id, 1, Annotation::default()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn settings_crud() {
        let (_tmp, db) = test_db();

        assert_eq!(db.get_setting("raw_before").unwrap(), None);
        assert_eq!(db.get_setting_or("raw_before", "5").unwrap(), "5");

        db.set_setting("raw_before", "8").unwrap();
        assert_eq!(db.get_setting("raw_before").unwrap(), Some("8".into()));
        assert_eq!(db.get_setting_or("raw_before", "5").unwrap(), "8");
    }

    #[test]
    fn reopen_preserves_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("documents.redb");

        {
            let db = DocumentDb::open(&path).unwrap();
            db.insert_document(paged("kept", vec![])).unwrap();
            db.set_setting("structured_after", "10").unwrap();
        }

        {
            let db = DocumentDb::open(&path).unwrap();
            assert_eq!(db.list_document_ids().unwrap(), vec![1]);
            assert_eq!(
                db.get_setting("structured_after").unwrap(),
                Some("10".to_string())
            );
            assert_eq!(db.insert_document(paged("next", vec![])).unwrap(), 2);
        }
    }
}
