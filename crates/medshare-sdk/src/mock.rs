//! In-memory collaborators for tests
//!
//! Stand-ins for the event index, the contract and the pinning gateway with
//! scriptable failures and call counters.

use crate::address::Address;
use crate::error::{Result, ShareError};
use crate::record::ContentId;
use crate::traits::{ContentPinner, LedgerContract, LedgerIndex};
use crate::upload::EncodedDocument;
use async_trait::async_trait;
use medshare_client::{AddFileReceipt, ContractFileEntry, IndexedFileEvent};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn involves(participant: &Address, sender: &str, receiver: &str) -> bool {
    sender.eq_ignore_ascii_case(participant.as_str()) || receiver.eq_ignore_ascii_case(participant.as_str())
}

/// Mock event index
#[derive(Default)]
pub struct MockIndex {
    events: Mutex<Vec<IndexedFileEvent>>,
    failing: AtomicBool,
    calls: AtomicU32,
}

impl MockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<IndexedFileEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Self::default()
        }
    }

    /// Index that answers every query with a server error
    pub fn failing() -> Self {
        let index = Self::default();
        index.set_failing(true);
        index
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make an event visible to subsequent queries
    pub fn push(&self, event: IndexedFileEvent) {
        guard(&self.events).push(event);
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerIndex for MockIndex {
    async fn indexed_files(&self, participant: &Address) -> Result<Vec<IndexedFileEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ShareError::Service("event index returned 500".into()));
        }
        Ok(guard(&self.events)
            .iter()
            .filter(|e| involves(participant, &e.sender, &e.receiver))
            .cloned()
            .collect())
    }
}

/// A write accepted by [`MockContract`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub sender: Address,
    pub receiver: Address,
    pub content_id: ContentId,
}

/// Mock sharing contract
#[derive(Default)]
pub struct MockContract {
    entries: Mutex<Vec<ContractFileEntry>>,
    writes: Mutex<Vec<RecordedWrite>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    read_calls: AtomicU32,
}

impl MockContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<ContractFileEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    pub fn failing_reads() -> Self {
        let contract = Self::default();
        contract.fail_reads.store(true, Ordering::SeqCst);
        contract
    }

    /// Reject every `addFileToIPFS` call, as a reverted transaction would
    pub fn rejecting_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn read_calls(&self) -> u32 {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        guard(&self.writes).clone()
    }
}

#[async_trait]
impl LedgerContract for MockContract {
    async fn get_files(&self, participant: &Address) -> Result<Vec<ContractFileEntry>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ShareError::Network("contract read unreachable".into()));
        }
        Ok(guard(&self.entries)
            .iter()
            .filter(|e| involves(participant, &e.sender, &e.receiver))
            .cloned()
            .collect())
    }

    async fn add_file(
        &self,
        sender: &Address,
        receiver: &Address,
        content_id: &ContentId,
    ) -> Result<AddFileReceipt> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ShareError::LedgerWrite("execution reverted".into()));
        }
        let mut writes = guard(&self.writes);
        writes.push(RecordedWrite {
            sender: sender.clone(),
            receiver: receiver.clone(),
            content_id: content_id.clone(),
        });
        Ok(AddFileReceipt {
            tx_hash: format!("0x{:064x}", writes.len()),
            block_number: Some(writes.len() as u64),
        })
    }
}

/// Mock pinning gateway
pub struct MockPinner {
    content_id: Option<String>,
    pinned: Mutex<Vec<EncodedDocument>>,
}

impl MockPinner {
    /// Gateway that answers every upload with `content_id`
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: Some(content_id.into()),
            pinned: Mutex::new(Vec::new()),
        }
    }

    /// Gateway that accepts uploads but returns no identifier
    pub fn without_content_id() -> Self {
        Self {
            content_id: None,
            pinned: Mutex::new(Vec::new()),
        }
    }

    pub fn pinned(&self) -> Vec<EncodedDocument> {
        guard(&self.pinned).clone()
    }
}

#[async_trait]
impl ContentPinner for MockPinner {
    async fn pin(&self, document: &EncodedDocument) -> Result<ContentId> {
        guard(&self.pinned).push(document.clone());
        match &self.content_id {
            Some(cid) => ContentId::new(cid.clone()),
            None => Err(ShareError::Upload(
                "pinning gateway returned no content identifier".into(),
            )),
        }
    }
}
