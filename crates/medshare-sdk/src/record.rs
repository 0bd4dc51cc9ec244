//! Canonical transfer records
//!
//! Every source (event index, contract read, local pending cache) is mapped
//! onto [`TransferRecord`] before it reaches reconciliation.

use crate::address::Address;
use crate::error::{Result, ShareError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-addressed identifier assigned by the pinning gateway
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ShareError::InvalidRecord("content identifier is empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier parses as an IPFS CID (v0 or v1)
    pub fn is_cid(&self) -> bool {
        cid::Cid::try_from(self.0.as_str()).is_ok()
    }
}

impl TryFrom<String> for ContentId {
    type Error = ShareError;

    fn try_from(value: String) -> Result<Self> {
        ContentId::new(value)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a record is known from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Confirmed by a ledger query
    Authoritative,
    /// Known locally, not yet visible in a ledger query
    Pending,
}

/// Which side of a transfer a view is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Sent => f.write_str("sent"),
            Direction::Received => f.write_str("received"),
        }
    }
}

/// One document-sharing event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub content_id: ContentId,
    pub sender: Address,
    pub receiver: Address,
    /// Seconds since epoch
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub source: RecordSource,
}

impl TransferRecord {
    /// A locally submitted transfer awaiting ledger-index catch-up
    pub fn pending(content_id: ContentId, sender: Address, receiver: Address, timestamp: u64) -> Self {
        Self {
            content_id,
            sender,
            receiver,
            timestamp,
            block_number: None,
            source: RecordSource::Pending,
        }
    }

    /// Natural key: the same content to the same receiver is one transfer
    pub fn key(&self) -> (&ContentId, &Address) {
        (&self.content_id, &self.receiver)
    }

    pub fn is_pending(&self) -> bool {
        self.source == RecordSource::Pending
    }

    /// Whether `participant` is on the `direction` side of this transfer
    pub fn involves(&self, participant: &Address, direction: Direction) -> bool {
        match direction {
            Direction::Sent => &self.sender == participant,
            Direction::Received => &self.receiver == participant,
        }
    }

    pub fn shared_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Link for viewing or downloading the content through a public gateway
    pub fn gateway_url(&self, gateway_base: &str) -> String {
        format!("{}/ipfs/{}", gateway_base.trim_end_matches('/'), self.content_id)
    }
}

/// Descriptive details stored alongside a shared document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub content_id: ContentId,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub document_type: Option<String>,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Seconds since epoch
    pub shared_at: u64,
    #[serde(default)]
    pub notes: Option<String>,
}

pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
