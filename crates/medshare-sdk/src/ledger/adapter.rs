//! Ledger query adapter
//!
//! Fetches transfer records for a participant from the event index, falling
//! back to the contract's `getFiles` read when the index fails. Source
//! shapes are mapped onto [`TransferRecord`] here and never leave this
//! module.

use crate::address::Address;
use crate::error::{Result, ShareError};
use crate::record::{ContentId, RecordSource, TransferRecord};
use crate::timestamp;
use crate::traits::{LedgerContract, LedgerIndex};
use medshare_client::{ContractFileEntry, IndexedFileEvent};
use std::sync::Arc;

/// Primary/fallback reader over the ledger
#[derive(Clone)]
pub struct LedgerQueryAdapter {
    index: Arc<dyn LedgerIndex>,
    contract: Arc<dyn LedgerContract>,
}

impl LedgerQueryAdapter {
    pub fn new(index: Arc<dyn LedgerIndex>, contract: Arc<dyn LedgerContract>) -> Self {
        Self { index, contract }
    }

    /// Authoritative records in which `participant` is sender or receiver
    ///
    /// Fails only when both the index and the contract read fail, so an
    /// empty list always means "no records".
    pub async fn fetch_records(&self, participant: &Address) -> Result<Vec<TransferRecord>> {
        let primary = match self.index.indexed_files(participant).await {
            Ok(events) => {
                let records = map_entries(events, from_indexed_event);
                tracing::debug!(participant = %participant, count = records.len(), "Ledger records from event index");
                return Ok(records);
            }
            Err(e) => e,
        };

        tracing::warn!(
            participant = %participant,
            error = %primary,
            "Event index query failed, falling back to contract read"
        );

        match self.contract.get_files(participant).await {
            Ok(entries) => {
                let records = map_entries(entries, from_contract_entry);
                tracing::debug!(participant = %participant, count = records.len(), "Ledger records from contract read");
                Ok(records)
            }
            Err(fallback) => Err(ShareError::LedgerQuery {
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            }),
        }
    }
}

fn map_entries<T>(entries: Vec<T>, map: fn(T) -> Result<TransferRecord>) -> Vec<TransferRecord> {
    entries
        .into_iter()
        .filter_map(|entry| match map(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed ledger entry");
                None
            }
        })
        .collect()
}

/// Map an event-index entry onto the canonical record
pub fn from_indexed_event(event: IndexedFileEvent) -> Result<TransferRecord> {
    Ok(TransferRecord {
        content_id: ContentId::new(event.cid)?,
        sender: Address::new(&event.sender)?,
        receiver: Address::new(&event.receiver)?,
        timestamp: timestamp::normalize(&event.timestamp)?,
        block_number: event.block_number,
        source: RecordSource::Authoritative,
    })
}

/// Map a contract `getFiles` entry onto the canonical record
pub fn from_contract_entry(entry: ContractFileEntry) -> Result<TransferRecord> {
    Ok(TransferRecord {
        content_id: ContentId::new(entry.cid)?,
        sender: Address::new(&entry.sender)?,
        receiver: Address::new(&entry.receiver)?,
        timestamp: timestamp::normalize(&entry.timestamp)?,
        block_number: None,
        source: RecordSource::Authoritative,
    })
}
