//! HTTP-backed collaborators
//!
//! Wires the `medshare-client` clients into the SDK seams.

use crate::address::Address;
use crate::error::{Result, ShareError};
use crate::record::ContentId;
use crate::traits::{ContentPinner, LedgerContract, LedgerIndex};
use crate::upload::EncodedDocument;
use async_trait::async_trait;
use medshare_client::{
    AddFileReceipt, ContractFileEntry, ContractRelayClient, EventIndexClient, IndexedFileEvent,
    PinUpload, PinningClient,
};

#[async_trait]
impl LedgerIndex for EventIndexClient {
    async fn indexed_files(&self, participant: &Address) -> Result<Vec<IndexedFileEvent>> {
        Ok(self.files_for(participant.as_str()).await?)
    }
}

#[async_trait]
impl LedgerContract for ContractRelayClient {
    async fn get_files(&self, participant: &Address) -> Result<Vec<ContractFileEntry>> {
        Ok(ContractRelayClient::get_files(self, participant.as_str()).await?)
    }

    async fn add_file(
        &self,
        sender: &Address,
        receiver: &Address,
        content_id: &ContentId,
    ) -> Result<AddFileReceipt> {
        // Rejections, reverts and unreachable relays are reported alike
        ContractRelayClient::add_file(
            self,
            &sender.to_checksum(),
            &receiver.to_checksum(),
            content_id.as_str(),
        )
        .await
        .map_err(|e| ShareError::LedgerWrite(e.to_string()))
    }
}

#[async_trait]
impl ContentPinner for PinningClient {
    async fn pin(&self, document: &EncodedDocument) -> Result<ContentId> {
        let upload = PinUpload {
            file_name: document.file_name.clone(),
            mime_type: document.mime_type.clone(),
            bytes: document.bytes.clone(),
            pin_name: pin_name(),
        };

        let raw = PinningClient::pin(self, &upload)
            .await
            .map_err(|e| ShareError::Upload(e.to_string()))?;
        let content_id = ContentId::new(raw).map_err(|e| ShareError::Upload(e.to_string()))?;

        if !content_id.is_cid() {
            tracing::warn!(cid = %content_id, "Gateway identifier does not parse as a CID");
        }
        Ok(content_id)
    }
}

/// `Medical_Document_<unix ms>`
fn pin_name() -> String {
    format!("Medical_Document_{}", chrono::Utc::now().timestamp_millis())
}
