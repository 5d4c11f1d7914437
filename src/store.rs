//! Versioned document store: a typed facade over a pluggable persistence
//! backend offering per-document compare-and-swap on a version counter.
//!
//! The store never retries a conflicted write — retry policy belongs to the
//! caller (the booking engine loops; administrative callers surface it).

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use serde::de::DeserializeOwned;
use ulid::Ulid;

use crate::calendar::now_ms;
use crate::model::{Meta, Ms, Version};
use crate::observability;

#[derive(Debug)]
pub enum StoreError {
    NotFound {
        collection: &'static str,
        id: Ulid,
    },
    Conflict {
        collection: &'static str,
        id: Ulid,
        expected: Version,
        actual: Version,
    },
    Codec(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound { collection, id } => {
                write!(f, "not found in {collection}: {id}")
            }
            StoreError::Conflict {
                collection,
                id,
                expected,
                actual,
            } => write!(
                f,
                "version conflict in {collection} on {id}: expected {expected}, stored {actual}"
            ),
            StoreError::Codec(e) => write!(f, "document codec error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// A persisted record as the backend sees it: an opaque JSON body plus the
/// header fields the backend owns.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: Ulid,
    pub version: Version,
    pub created_at: Ms,
    pub updated_at: Ms,
    pub body: serde_json::Value,
}

/// The external document store, reduced to the three calls this crate needs.
/// `put` must be atomic per document with respect to concurrent `put`s.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn fetch(&self, collection: &'static str, id: Ulid) -> Result<RawDocument, StoreError>;

    /// Conditional write. `expected = Some(v)`: fail with `Conflict` unless the
    /// stored version is exactly `v` (missing document → `NotFound`); on
    /// success the new version is `v + 1`. `expected = None`: last-writer-wins
    /// upsert (insert at version 1, replace at stored + 1).
    async fn put(
        &self,
        collection: &'static str,
        doc: RawDocument,
        expected: Option<Version>,
    ) -> Result<Version, StoreError>;

    async fn scan(&self, collection: &'static str) -> Result<Vec<RawDocument>, StoreError>;
}

/// Ties a Rust type to its collection and its embedded [`Meta`] header.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn meta(&self) -> &Meta;
    fn meta_mut(&mut self) -> &mut Meta;
}

impl Document for crate::model::Slot {
    const COLLECTION: &'static str = "slots";

    fn meta(&self) -> &Meta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

impl Document for crate::model::Site {
    const COLLECTION: &'static str = "sites";

    fn meta(&self) -> &Meta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

impl Document for crate::model::Alert {
    const COLLECTION: &'static str = "alerts";

    fn meta(&self) -> &Meta {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }
}

/// Typed store facade. Cheap to clone; all state lives in the backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
}

impl Store {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Persist `doc`. With `expected = Some(v)` the write is a compare-and-swap
    /// against the stored version; with `None` it is unconditional. On success
    /// the document's header is synced to the stored state and the new version
    /// returned.
    pub async fn save<D: Document>(
        &self,
        doc: &mut D,
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        let body = serde_json::to_value(&*doc).map_err(|e| StoreError::Codec(e.to_string()))?;
        let meta = doc.meta();
        let raw = RawDocument {
            id: meta.id,
            version: meta.version,
            created_at: meta.created_at,
            updated_at: meta.updated_at,
            body,
        };
        let version = match self.backend.put(D::COLLECTION, raw, expected).await {
            Ok(v) => v,
            Err(e) => {
                if e.is_conflict() {
                    metrics::counter!(observability::STORE_CONFLICTS_TOTAL).increment(1);
                }
                return Err(e);
            }
        };
        let meta = doc.meta_mut();
        if meta.version == 0 {
            meta.created_at = now_ms();
        }
        meta.version = version;
        meta.updated_at = now_ms();
        Ok(version)
    }

    pub async fn get<D: Document>(&self, id: Ulid) -> Result<D, StoreError> {
        let raw = self.backend.fetch(D::COLLECTION, id).await?;
        decode(raw)
    }

    /// Re-fetch the latest persisted state into `doc`, discarding any
    /// uncommitted local mutations. Used after a conflict before retrying.
    pub async fn reload<D: Document>(&self, doc: &mut D) -> Result<(), StoreError> {
        *doc = self.get(doc.meta().id).await?;
        Ok(())
    }

    pub async fn query<D, F>(&self, filter: F) -> Result<Vec<D>, StoreError>
    where
        D: Document,
        F: Fn(&D) -> bool,
    {
        let raws = self.backend.scan(D::COLLECTION).await?;
        let mut out = Vec::new();
        for raw in raws {
            let doc = decode::<D>(raw)?;
            if filter(&doc) {
                out.push(doc);
            }
        }
        Ok(out)
    }

    pub async fn list<D: Document>(&self) -> Result<Vec<D>, StoreError> {
        self.query(|_| true).await
    }
}

fn decode<D: Document>(raw: RawDocument) -> Result<D, StoreError> {
    let mut doc: D =
        serde_json::from_value(raw.body).map_err(|e| StoreError::Codec(e.to_string()))?;
    // The backend header is authoritative over whatever the body carried.
    let meta = doc.meta_mut();
    meta.id = raw.id;
    meta.version = raw.version;
    meta.created_at = raw.created_at;
    meta.updated_at = raw.updated_at;
    Ok(doc)
}

/// In-memory backend over sharded maps. The map's entry guard holds the shard
/// lock for the whole compare-and-swap, which makes `put` atomic per document.
pub struct MemoryBackend {
    collections: DashMap<&'static str, Arc<DashMap<Ulid, RawDocument>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
        }
    }

    fn collection(&self, name: &'static str) -> Arc<DashMap<Ulid, RawDocument>> {
        self.collections.entry(name).or_default().clone()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn fetch(&self, collection: &'static str, id: Ulid) -> Result<RawDocument, StoreError> {
        self.collection(collection)
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(StoreError::NotFound { collection, id })
    }

    async fn put(
        &self,
        collection: &'static str,
        mut doc: RawDocument,
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        let map = self.collection(collection);
        let now = now_ms();
        match map.entry(doc.id) {
            Entry::Occupied(mut entry) => {
                let stored = entry.get();
                if let Some(v) = expected
                    && stored.version != v
                {
                    return Err(StoreError::Conflict {
                        collection,
                        id: doc.id,
                        expected: v,
                        actual: stored.version,
                    });
                }
                doc.version = stored.version + 1;
                doc.created_at = stored.created_at;
                doc.updated_at = now;
                let version = doc.version;
                entry.insert(doc);
                Ok(version)
            }
            Entry::Vacant(entry) => {
                if expected.is_some() {
                    // No stored version to compare against.
                    return Err(StoreError::NotFound {
                        collection,
                        id: doc.id,
                    });
                }
                doc.version = 1;
                doc.created_at = now;
                doc.updated_at = now;
                entry.insert(doc);
                Ok(1)
            }
        }
    }

    async fn scan(&self, collection: &'static str) -> Result<Vec<RawDocument>, StoreError> {
        Ok(self
            .collection(collection)
            .iter()
            .map(|e| e.value().clone())
            .collect())
    }
}
