//! medshare SDK - ledger-backed document sharing
//!
//! Documents are pinned to a content gateway and the transfer
//! `{sender, receiver, contentId}` is written to a sharing contract. The
//! ledger index lags behind confirmed writes, so views are built by
//! reconciling two sources:
//!
//! - **Authoritative** records from the ledger: the event index first, the
//!   contract's own read method when the index fails
//! - **Pending** records from a local cache, written right after a confirmed
//!   ledger write and dropped once the ledger returns them
//!
//! # Architecture
//!
//! ```text
//! UploadOrchestrator ──pin──▶ ContentPinner
//!        │ addFileToIPFS ──▶ LedgerContract
//!        └─append─▶ PendingCache ◀─reconcile─ RecordReconciler ◀─ LedgerQueryAdapter
//!                                                  │
//!                                            ViewRefresher (sequenced, watch channel)
//! ```
//!
//! Collaborators sit behind the traits in [`traits`]; HTTP implementations
//! come from `medshare-client`, test doubles from [`mock`].
//!
//! # Example
//!
//! ```rust,ignore
//! use medshare_sdk::{ShareClient, ShareConfig, UploadRequest};
//!
//! let client = ShareClient::from_config(ShareConfig::default())?;
//! let receipt = client
//!     .orchestrator()
//!     .share(UploadRequest {
//!         sender: Some(client.participant()?.clone()),
//!         receiver: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".into(),
//!         file: Some("scan.pdf".into()),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("shared {} in {}", receipt.record.content_id, receipt.tx_hash);
//! ```

// Canonical data model
pub mod address;
pub mod record;
pub mod timestamp;

// Collaborator seams
pub mod traits;

// Local caches
pub mod cache;

// Ledger query adapter and HTTP-backed collaborators
pub mod ledger;

// Reconciliation, refresh and activity
pub mod sync;

// Share workflow
pub mod upload;

// Facade over the pieces above
pub mod client;

pub mod config;
pub mod error;
pub mod mock;

pub use address::Address;
pub use record::{ContentId, Direction, DocumentMetadata, RecordSource, TransferRecord};

pub use traits::{ContentPinner, KeyValueStore, LedgerContract, LedgerIndex};

pub use cache::{MemoryStore, MetadataCache, PendingCache};
#[cfg(feature = "native")]
pub use cache::SqliteStore;

pub use ledger::LedgerQueryAdapter;

pub use sync::{
    merge_view, spawn_refresh_task, ActivitySummary, DailyCount, ParticipantView,
    ParticipantViews, RecordReconciler, RefreshOutcome, ViewRefresher, ViewSnapshot,
};

pub use upload::{
    EncodedDocument, UploadDetails, UploadOrchestrator, UploadProgress, UploadReceipt,
    UploadRequest, UploadState, UploadStep,
};

pub use client::ShareClient;
pub use config::{CacheBackend, CacheConfig, GatewayConfig, RefreshConfig, ShareConfig};
pub use error::{Result, ShareError};

// Re-export from the client crate
pub use medshare_client::{PinMode, RawTimestamp, ServiceConfig, SymptomReport};
