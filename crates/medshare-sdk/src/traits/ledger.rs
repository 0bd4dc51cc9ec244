//! Ledger query and write seams

use crate::address::Address;
use crate::error::Result;
use crate::record::ContentId;
use async_trait::async_trait;
use medshare_client::{AddFileReceipt, ContractFileEntry, IndexedFileEvent};

/// Indexed-event query service (the preferred read path)
#[async_trait]
pub trait LedgerIndex: Send + Sync {
    /// Transfer events where `participant` is sender or receiver
    async fn indexed_files(&self, participant: &Address) -> Result<Vec<IndexedFileEvent>>;
}

/// The sharing contract's own methods
#[async_trait]
pub trait LedgerContract: Send + Sync {
    /// `getFiles(participant)`: all records visible to the participant
    async fn get_files(&self, participant: &Address) -> Result<Vec<ContractFileEntry>>;

    /// `addFileToIPFS(sender, receiver, cid)`; returns once confirmed
    async fn add_file(
        &self,
        sender: &Address,
        receiver: &Address,
        content_id: &ContentId,
    ) -> Result<AddFileReceipt>;
}
