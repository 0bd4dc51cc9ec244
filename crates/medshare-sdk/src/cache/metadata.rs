//! Document metadata kept next to the pending cache
//!
//! Stored under `docMetadata_{participant}` as a JSON object keyed by
//! content identifier.

use crate::address::Address;
use crate::error::Result;
use crate::record::{ContentId, DocumentMetadata};
use crate::traits::KeyValueStore;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const METADATA_KEY_PREFIX: &str = "docMetadata_";

type MetadataMap = BTreeMap<ContentId, DocumentMetadata>;

fn decode(key: &str, raw: Option<String>) -> MetadataMap {
    let Some(raw) = raw else {
        return MetadataMap::new();
    };
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding unreadable metadata entry");
            MetadataMap::new()
        }
    }
}

fn encode(map: &MetadataMap) -> Result<Option<String>> {
    if map.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(map)?))
}

pub struct MetadataCache {
    store: Arc<dyn KeyValueStore>,
}

impl MetadataCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(participant: &Address) -> String {
        format!("{}{}", METADATA_KEY_PREFIX, participant)
    }

    fn load(&self, participant: &Address) -> Result<MetadataMap> {
        let key = Self::key(participant);
        Ok(decode(&key, self.store.get(&key)?))
    }

    /// Insert or replace the metadata for `metadata.content_id`
    pub async fn put(&self, participant: &Address, metadata: DocumentMetadata) -> Result<()> {
        let key = Self::key(participant);
        self.store.update(&key, &mut |raw| {
            let mut map = decode(&key, raw);
            map.insert(metadata.content_id.clone(), metadata.clone());
            encode(&map)
        })
    }

    pub async fn get(
        &self,
        participant: &Address,
        content_id: &ContentId,
    ) -> Result<Option<DocumentMetadata>> {
        Ok(self.load(participant)?.remove(content_id))
    }

    /// All metadata for `participant`, most recently shared first
    pub async fn list(&self, participant: &Address) -> Result<Vec<DocumentMetadata>> {
        let mut entries: Vec<_> = self.load(participant)?.into_values().collect();
        entries.sort_by(|a, b| b.shared_at.cmp(&a.shared_at));
        Ok(entries)
    }

    /// Returns whether an entry was removed
    pub async fn remove(&self, participant: &Address, content_id: &ContentId) -> Result<bool> {
        let key = Self::key(participant);
        let mut removed = false;
        self.store.update(&key, &mut |raw| {
            let mut map = decode(&key, raw);
            removed = map.remove(content_id).is_some();
            encode(&map)
        })?;
        Ok(removed)
    }
}
