//! Ledger clients: the event-index service and the contract relay

use crate::client::HttpService;
use crate::error::Result;
use crate::types::{AddFileReceipt, AddFileRequest, ContractFileEntry, IndexedFileEvent, ServiceConfig};

/// Client for the event-index service
///
/// Answers `GET /files/{address}` with every transfer event in which the
/// address is sender or receiver.
#[derive(Debug, Clone)]
pub struct EventIndexClient {
    service: HttpService,
}

impl EventIndexClient {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Ok(Self {
            service: HttpService::new(config)?,
        })
    }

    /// Transfer events visible to `address`
    pub async fn files_for(&self, address: &str) -> Result<Vec<IndexedFileEvent>> {
        let path = format!("files/{}", urlencoding::encode(address));
        let events: Vec<IndexedFileEvent> = self.service.get_json(&path).await?;
        tracing::debug!(address, count = events.len(), "Fetched indexed file events");
        Ok(events)
    }
}

/// Client for the relay that exposes the sharing contract's methods
#[derive(Debug, Clone)]
pub struct ContractRelayClient {
    service: HttpService,
}

impl ContractRelayClient {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Ok(Self {
            service: HttpService::new(config)?,
        })
    }

    /// Call `addFileToIPFS(sender, receiver, cid)` and wait for confirmation
    pub async fn add_file(&self, sender: &str, receiver: &str, cid: &str) -> Result<AddFileReceipt> {
        let body = AddFileRequest {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            cid: cid.to_string(),
        };
        let receipt: AddFileReceipt = self.service.post_json("contract/addFileToIPFS", &body).await?;
        tracing::debug!(tx = %receipt.tx_hash, cid, "Ledger write confirmed");
        Ok(receipt)
    }

    /// Call `getFiles(address)`
    pub async fn get_files(&self, address: &str) -> Result<Vec<ContractFileEntry>> {
        let path = format!("contract/getFiles/{}", urlencoding::encode(address));
        self.service.get_json(&path).await
    }
}
