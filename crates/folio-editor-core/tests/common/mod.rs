#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use folio_common::{
    Document, DocumentId, DocumentPatch, DocumentStore, MediaResolver, MediaUpload, SmolStr,
    StoreError,
};
use folio_editor_core::{EditorConfig, EditorSession, ManualClock};

/// In-memory store that records every call.
#[derive(Default)]
pub struct MemoryStore {
    docs: RefCell<HashMap<DocumentId, Document>>,
    next_id: Cell<u32>,
    pub creates: Cell<usize>,
    pub updates: RefCell<Vec<DocumentPatch>>,
    /// Fail the next write with this reason.
    pub fail_next: RefCell<Option<&'static str>>,
}

impl MemoryStore {
    /// Store `document` under a fresh id and return the stored copy.
    pub fn seed(&self, mut document: Document) -> Document {
        let id = self.assign_id();
        document.id = Some(id.clone());
        self.docs.borrow_mut().insert(id, document.clone());
        document
    }

    pub fn get(&self, id: &DocumentId) -> Document {
        self.docs.borrow()[id].clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.borrow().len()
    }

    fn assign_id(&self) -> DocumentId {
        self.next_id.set(self.next_id.get() + 1);
        DocumentId::new(format!("doc-{}", self.next_id.get()))
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.fail_next.borrow_mut().take() {
            Some(reason) => Err(StoreError::failure(reason)),
            None => Ok(()),
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn load_document(&self, id: &DocumentId) -> Result<Document, StoreError> {
        self.docs
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })
    }

    async fn create_document(
        &self,
        document: &Document,
        _excerpt: &str,
    ) -> Result<Document, StoreError> {
        self.check_failure()?;
        self.creates.set(self.creates.get() + 1);
        Ok(self.seed(document.clone()))
    }

    async fn update_document(
        &self,
        id: &DocumentId,
        patch: &DocumentPatch,
    ) -> Result<Document, StoreError> {
        self.check_failure()?;
        let mut docs = self.docs.borrow_mut();
        let stored = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.clone() })?;
        patch.apply_to(stored);
        self.updates.borrow_mut().push(patch.clone());
        Ok(stored.clone())
    }
}

impl MediaResolver for MemoryStore {
    async fn resolve_media_upload(&self, upload: &MediaUpload) -> Result<SmolStr, StoreError> {
        self.check_failure()?;
        Ok(smol_str::format_smolstr!(
            "https://cdn.example/{}",
            upload.file_name
        ))
    }
}

pub fn session() -> (EditorSession<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let session = EditorSession::with_clock(EditorConfig::default(), clock.clone());
    (session, clock)
}
