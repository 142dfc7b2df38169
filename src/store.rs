use crate::{error::Result, model::Document};

/// Read access to the documents a search runs over.
///
/// Implementations return one consistent snapshot per call; the search
/// engine never writes through this trait.
pub trait DocumentSource {
    fn list_documents(&self) -> Result<Vec<Document>>;
}

/// Documents already held in memory, in the order given.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Vec<Document>,
}

impl MemoryStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl From<Vec<Document>> for MemoryStore {
    fn from(documents: Vec<Document>) -> Self {
        Self::new(documents)
    }
}

impl DocumentSource for MemoryStore {
    fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

impl<T: DocumentSource + ?Sized> DocumentSource for &T {
    fn list_documents(&self) -> Result<Vec<Document>> {
        (**self).list_documents()
    }
}
