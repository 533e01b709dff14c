//! Document store state and collection handles.
//!
//! [`DocumentStore`] owns every collection; [`Collection`] handles are cheap
//! clones sharing one lock per collection, so all structural mutation on a
//! collection serializes through a single write lock and id uniqueness can
//! never be violated by interleaved writers. Readers copy documents out; no
//! caller holds a reference into collection storage beyond an operation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use log::{debug, info};
use parking_lot::RwLock;
use serde_json::Value;

use crate::document::{Document, Fields};
use crate::engine_response::{EngineError, Result};

/// Outcome of an upsert: whether the document was created or merged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Handle to one named collection. Clones share the same storage.
#[derive(Clone)]
pub struct Collection {
    name: String,
    docs: Arc<RwLock<BTreeMap<String, Document>>>,
}

impl Collection {
    fn new(name: String) -> Self {
        Collection {
            name,
            docs: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a new document. Fails with [`EngineError::DuplicateKey`] if a
    /// document with the same id already exists.
    pub fn insert(&self, doc: Document) -> Result<()> {
        let mut docs = self.docs.write();
        if docs.contains_key(&doc.id) {
            return Err(EngineError::DuplicateKey(doc.id));
        }
        debug!("[{}] insert id={}", self.name, doc.id);
        docs.insert(doc.id.clone(), doc);
        Ok(())
    }

    /// Update-or-insert by id: merges `update` into the matching document,
    /// or inserts a new document built from the id plus the update fields.
    /// Always succeeds; applying the same upsert twice is idempotent.
    pub fn upsert(&self, id: &str, update: &Fields) -> UpsertOutcome {
        let mut docs = self.docs.write();
        match docs.get_mut(id) {
            Some(doc) => {
                doc.merge(update);
                UpsertOutcome::Updated
            }
            None => {
                debug!("[{}] upsert created id={}", self.name, id);
                docs.insert(id.to_string(), Document::new(id, update.clone()));
                UpsertOutcome::Inserted
            }
        }
    }

    /// Removes the document with the given id. Returns whether a document
    /// was actually removed; a miss is not an error.
    pub fn delete(&self, id: &str) -> bool {
        self.docs.write().remove(id).is_some()
    }

    /// Returns a copy of the document with the given id.
    pub fn find_by_id(&self, id: &str) -> Option<Document> {
        self.docs.read().get(id).cloned()
    }

    /// Copies out every document, scanned in id order. This is the
    /// point-in-time snapshot the aggregation executor reads from.
    pub fn snapshot(&self) -> Vec<Document> {
        self.docs.read().values().cloned().collect()
    }

    /// Unique values of `field` across the collection. Contains no
    /// duplicates; every returned value is the field value of at least one
    /// document. Order is not significant.
    pub fn distinct(&self, field: &str) -> Vec<Value> {
        let docs = self.docs.read();
        let mut seen: HashSet<String> = HashSet::new();
        let mut values = Vec::new();
        for doc in docs.values() {
            let Some(value) = doc.get(field) else {
                continue;
            };
            let key = value.to_string();
            if seen.insert(key) {
                values.push(value);
            }
        }
        values
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Atomic read-modify-write on one document, used by the stock ledger.
    /// The closure runs under the collection write lock, so concurrent calls
    /// on the same id serialize and never observe a stale value.
    pub(crate) fn with_doc_mut<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Document) -> Result<T>,
    ) -> Result<Option<T>> {
        let mut docs = self.docs.write();
        match docs.get_mut(id) {
            Some(doc) => f(doc).map(Some),
            None => Ok(None),
        }
    }
}

/// In-process store of named collections.
///
/// Collections are created on first use and live for the lifetime of the
/// store. Handles to different collections are fully independent; handles to
/// the same collection share one serialization domain.
pub struct DocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        DocumentStore {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Scoped store handle per the collaborator contract. The in-process
    /// store cannot fail to connect; the `Result` mirrors the external
    /// interface so callers are written against the fallible shape.
    pub fn connect() -> Result<Self> {
        info!("document store connected (in-process)");
        Ok(DocumentStore::new())
    }

    /// Returns the handle for `name`, creating the collection on first use.
    pub fn collection(&self, name: &str) -> Collection {
        if let Some(col) = self.collections.read().get(name) {
            return col.clone();
        }
        let mut collections = self.collections.write();
        collections
            .entry(name.to_string())
            .or_insert_with(|| {
                info!("created collection '{name}'");
                Collection::new(name.to_string())
            })
            .clone()
    }

    /// Drops every collection. Idempotent; the store can be reconnected by
    /// constructing a new one.
    pub fn close(self) {
        let count = self.collections.read().len();
        info!("document store closed ({count} collections dropped)");
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        DocumentStore::new()
    }
}
