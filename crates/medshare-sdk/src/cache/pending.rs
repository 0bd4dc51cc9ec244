//! Local pending-write cache
//!
//! Bridges the gap between a confirmed ledger write and the moment the event
//! index reflects it. Each participant has two JSON arrays of
//! [`TransferRecord`]s:
//!
//! - `receivedFiles_{participant}`: transfers addressed to the participant,
//!   idempotent and superseded on content identifier
//! - `sentFiles_{participant}`: transfers the participant made, keyed by
//!   `(contentId, receiver)` so one document shared twice stays two entries
//!
//! Every change is a single [`KeyValueStore::update`], so caches in other
//! sessions or processes over the same store cannot lose each other's
//! writes. A corrupt entry reads as empty so the views still render.

use crate::address::Address;
use crate::error::Result;
use crate::record::{RecordSource, TransferRecord};
use crate::traits::KeyValueStore;
use std::sync::Arc;

/// Key prefix for transfers addressed to a participant
pub const PENDING_KEY_PREFIX: &str = "receivedFiles_";

/// Key prefix for transfers a participant sent
pub const SENT_PENDING_KEY_PREFIX: &str = "sentFiles_";

/// Which of a participant's lists a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Received,
    Sent,
}

impl Side {
    const ALL: [Side; 2] = [Side::Received, Side::Sent];

    fn of(participant: &Address, record: &TransferRecord) -> Self {
        if record.receiver == *participant {
            Side::Received
        } else {
            Side::Sent
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Side::Received => PENDING_KEY_PREFIX,
            Side::Sent => SENT_PENDING_KEY_PREFIX,
        }
    }

    fn key(self, participant: &Address) -> String {
        format!("{}{}", self.prefix(), participant)
    }

    /// Whether `a` and `b` describe the same transfer on this side
    fn same_transfer(self, a: &TransferRecord, b: &TransferRecord) -> bool {
        match self {
            Side::Received => a.content_id == b.content_id,
            Side::Sent => a.key() == b.key(),
        }
    }
}

fn decode(key: &str, raw: Option<String>) -> Vec<TransferRecord> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<TransferRecord>>(&raw) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding unreadable pending cache entry");
            Vec::new()
        }
    }
}

fn encode(records: &[TransferRecord]) -> Result<Option<String>> {
    if records.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(records)?))
}

/// Pending transfers awaiting ledger confirmation
pub struct PendingCache {
    store: Arc<dyn KeyValueStore>,
}

impl PendingCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load(&self, key: &str) -> Result<Vec<TransferRecord>> {
        Ok(decode(key, self.store.get(key)?))
    }

    /// Record a transfer as pending for `participant`
    ///
    /// Filed under the received list when `participant` is the receiver and
    /// under the sent list otherwise. Returns `false` when the same transfer
    /// is already cached.
    pub async fn append(&self, participant: &Address, record: TransferRecord) -> Result<bool> {
        let side = Side::of(participant, &record);
        let key = side.key(participant);
        let record = TransferRecord {
            source: RecordSource::Pending,
            ..record
        };

        let mut added = false;
        let mut total = 0;
        self.store.update(&key, &mut |raw| {
            let mut records = decode(&key, raw);
            added = !records.iter().any(|r| side.same_transfer(r, &record));
            if added {
                records.push(record.clone());
            }
            total = records.len();
            encode(&records)
        })?;

        if added {
            tracing::debug!(participant = %participant, side = ?side, pending = total, "Pending entry cached");
        } else {
            tracing::debug!(participant = %participant, cid = %record.content_id, "Pending entry already cached");
        }
        Ok(added)
    }

    /// All pending entries for `participant`: received first, then sent,
    /// each oldest first
    pub async fn list(&self, participant: &Address) -> Result<Vec<TransferRecord>> {
        let mut records = Vec::new();
        for side in Side::ALL {
            records.extend(self.load(&side.key(participant))?);
        }
        Ok(records)
    }

    /// Drop entries that `authoritative` now confirms
    ///
    /// Received entries are superseded by any record with the same content
    /// identifier, sent entries only by the same `(contentId, receiver)`.
    /// Returns the number of entries removed.
    pub async fn reconcile_against(
        &self,
        participant: &Address,
        authoritative: &[TransferRecord],
    ) -> Result<usize> {
        let mut removed = 0;
        for side in Side::ALL {
            let key = side.key(participant);
            let mut remaining = 0;
            let mut dropped = 0;
            self.store.update(&key, &mut |raw| {
                let records = decode(&key, raw);
                let before = records.len();
                let kept: Vec<TransferRecord> = records
                    .into_iter()
                    .filter(|pending| !authoritative.iter().any(|a| side.same_transfer(a, pending)))
                    .collect();
                dropped = before - kept.len();
                remaining = kept.len();
                encode(&kept)
            })?;

            if dropped > 0 {
                tracing::info!(
                    participant = %participant,
                    side = ?side,
                    removed = dropped,
                    remaining,
                    "Pending entries confirmed by ledger"
                );
            }
            removed += dropped;
        }
        Ok(removed)
    }

    /// Forget every pending entry for `participant`
    pub async fn clear(&self, participant: &Address) -> Result<()> {
        for side in Side::ALL {
            self.store.remove(&side.key(participant))?;
        }
        Ok(())
    }

    /// Forget pending entries for all participants; returns how many lists were removed
    pub async fn clear_all(&self) -> Result<usize> {
        let mut cleared = 0;
        for side in Side::ALL {
            let keys = self.store.keys_with_prefix(side.prefix())?;
            for key in &keys {
                self.store.remove(key)?;
            }
            cleared += keys.len();
        }
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::record::ContentId;

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n)).unwrap()
    }

    fn pending(cid: &str, ts: u64) -> TransferRecord {
        TransferRecord::pending(ContentId::new(cid).unwrap(), addr(1), addr(2), ts)
    }

    fn authoritative(cid: &str, ts: u64) -> TransferRecord {
        TransferRecord {
            source: RecordSource::Authoritative,
            ..pending(cid, ts)
        }
    }

    fn cache() -> (Arc<MemoryStore>, PendingCache) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), PendingCache::new(store))
    }

    #[tokio::test]
    async fn test_missing_key_lists_empty() {
        let (_, cache) = cache();
        assert!(cache.list(&addr(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_is_idempotent_on_content_id() {
        let (_, cache) = cache();
        assert!(cache.append(&addr(2), pending("Qm1", 10)).await.unwrap());
        assert!(!cache.append(&addr(2), pending("Qm1", 20)).await.unwrap());

        let listed = cache.list(&addr(2)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].timestamp, 10);
    }

    #[tokio::test]
    async fn test_append_forces_pending_source() {
        let (_, cache) = cache();
        cache.append(&addr(2), authoritative("Qm1", 10)).await.unwrap();
        assert!(cache.list(&addr(2)).await.unwrap()[0].is_pending());
    }

    #[tokio::test]
    async fn test_reconcile_removes_confirmed_entries() {
        let (_, cache) = cache();
        cache.append(&addr(2), pending("Qm1", 10)).await.unwrap();
        cache.append(&addr(2), pending("Qm2", 11)).await.unwrap();

        let removed = cache
            .reconcile_against(&addr(2), &[authoritative("Qm1", 10)])
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let listed = cache.list(&addr(2)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content_id.as_str(), "Qm2");
    }

    #[tokio::test]
    async fn test_reconcile_to_empty_removes_key() {
        let (store, cache) = cache();
        cache.append(&addr(2), pending("Qm1", 10)).await.unwrap();
        cache
            .reconcile_against(&addr(2), &[authoritative("Qm1", 10)])
            .await
            .unwrap();
        assert!(store.get(&format!("{}{}", PENDING_KEY_PREFIX, addr(2))).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_empty() {
        let (store, cache) = cache();
        store
            .set(&format!("{}{}", PENDING_KEY_PREFIX, addr(2)), "{not json")
            .unwrap();

        assert!(cache.list(&addr(2)).await.unwrap().is_empty());
        assert!(cache.append(&addr(2), pending("Qm1", 10)).await.unwrap());
        assert_eq!(cache.list(&addr(2)).await.unwrap().len(), 1);
    }

    fn sent(cid: &str, to: u8, ts: u64) -> TransferRecord {
        TransferRecord::pending(ContentId::new(cid).unwrap(), addr(1), addr(to), ts)
    }

    #[tokio::test]
    async fn test_sender_keeps_one_entry_per_receiver() {
        let (store, cache) = cache();
        assert!(cache.append(&addr(1), sent("Qm1", 2, 10)).await.unwrap());
        assert!(cache.append(&addr(1), sent("Qm1", 3, 11)).await.unwrap());
        assert!(!cache.append(&addr(1), sent("Qm1", 3, 12)).await.unwrap());

        let listed = cache.list(&addr(1)).await.unwrap();
        let receivers: Vec<_> = listed.iter().map(|r| r.receiver.clone()).collect();
        assert_eq!(receivers, vec![addr(2), addr(3)]);
        assert!(store.get(&format!("{}{}", PENDING_KEY_PREFIX, addr(1))).unwrap().is_none());
        assert!(store.get(&format!("{}{}", SENT_PENDING_KEY_PREFIX, addr(1))).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sent_entries_are_superseded_per_receiver() {
        let (_, cache) = cache();
        cache.append(&addr(1), sent("Qm1", 2, 10)).await.unwrap();
        cache.append(&addr(1), sent("Qm1", 3, 11)).await.unwrap();

        let removed = cache
            .reconcile_against(&addr(1), &[TransferRecord {
                source: RecordSource::Authoritative,
                ..sent("Qm1", 2, 10)
            }])
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let listed = cache.list(&addr(1)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].receiver, addr(3));
    }

    #[tokio::test]
    async fn test_clear_removes_both_lists() {
        let (_, cache) = cache();
        cache.append(&addr(1), sent("Qm1", 2, 10)).await.unwrap();
        cache
            .append(&addr(1), TransferRecord::pending(ContentId::new("Qm2").unwrap(), addr(3), addr(1), 11))
            .await
            .unwrap();
        assert_eq!(cache.list(&addr(1)).await.unwrap().len(), 2);

        cache.clear(&addr(1)).await.unwrap();
        assert!(cache.list(&addr(1)).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_caches_sharing_a_store_do_not_lose_appends() {
        let store = Arc::new(MemoryStore::new());
        let first = Arc::new(PendingCache::new(store.clone()));
        let second = Arc::new(PendingCache::new(store));

        let mut tasks = Vec::new();
        for i in 0..40u64 {
            let cache = if i % 2 == 0 { first.clone() } else { second.clone() };
            tasks.push(tokio::spawn(async move {
                cache.append(&addr(2), pending(&format!("Qm{}", i), i)).await.unwrap();
                cache.reconcile_against(&addr(2), &[authoritative("QmNone", 0)]).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(first.list(&addr(2)).await.unwrap().len(), 40);
    }

    #[tokio::test]
    async fn test_clear_all_only_touches_pending_keys() {
        let (store, cache) = cache();
        store.set("docMetadata_0x1", "{}").unwrap();
        cache.append(&addr(1), pending("Qm1", 10)).await.unwrap();
        cache.append(&addr(2), pending("Qm2", 10)).await.unwrap();

        assert_eq!(cache.clear_all().await.unwrap(), 2);
        assert!(cache.list(&addr(1)).await.unwrap().is_empty());
        assert!(store.get("docMetadata_0x1").unwrap().is_some());
    }
}
