//! Upload orchestrator
//!
//! Drives one document share through
//! `Idle → ReadingFile → UploadingContent → WritingLedger → WritingMetadata → Done`.
//! Any fatal step moves to `Failed`; nothing is retried. Local caches are
//! only written once the ledger write is confirmed, and failures from that
//! point on are reported as warnings.

use super::document::EncodedDocument;
use crate::address::Address;
use crate::cache::{MetadataCache, PendingCache};
use crate::error::{Result, ShareError};
use crate::record::{now_secs, DocumentMetadata, TransferRecord};
use crate::traits::{ContentPinner, LedgerContract};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Step at which a workflow failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStep {
    ReadingFile,
    UploadingContent,
    WritingLedger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum UploadState {
    #[default]
    Idle,
    ReadingFile,
    UploadingContent,
    WritingLedger,
    WritingMetadata,
    Done,
    Failed { step: UploadStep },
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Done | UploadState::Failed { .. })
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadState::Idle => f.write_str("idle"),
            UploadState::ReadingFile => f.write_str("reading file"),
            UploadState::UploadingContent => f.write_str("uploading content"),
            UploadState::WritingLedger => f.write_str("writing ledger"),
            UploadState::WritingMetadata => f.write_str("writing metadata"),
            UploadState::Done => f.write_str("done"),
            UploadState::Failed { step } => write!(f, "failed ({:?})", step),
        }
    }
}

/// Human-readable progress for UI feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub state: UploadState,
    pub message: String,
}

/// Optional descriptive details stored with the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadDetails {
    pub patient_name: Option<String>,
    pub document_type: Option<String>,
    pub notes: Option<String>,
}

/// Inputs to one share, validated before the workflow starts
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Connected identity; `None` when no wallet is connected
    pub sender: Option<Address>,
    /// Receiver as typed by the user
    pub receiver: String,
    pub file: Option<PathBuf>,
    pub details: UploadDetails,
}

#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// The pending record written to the local cache
    pub record: TransferRecord,
    pub tx_hash: String,
    /// Best-effort steps that failed after the ledger write
    pub warnings: Vec<String>,
}

/// Share workflow driver
///
/// `share` takes `&mut self`, so a single orchestrator runs one workflow at
/// a time.
pub struct UploadOrchestrator {
    pinner: Arc<dyn ContentPinner>,
    contract: Arc<dyn LedgerContract>,
    pending: Arc<PendingCache>,
    metadata: Arc<MetadataCache>,
    state: UploadState,
    progress: Option<mpsc::UnboundedSender<UploadProgress>>,
}

impl UploadOrchestrator {
    pub fn new(
        pinner: Arc<dyn ContentPinner>,
        contract: Arc<dyn LedgerContract>,
        pending: Arc<PendingCache>,
        metadata: Arc<MetadataCache>,
    ) -> Self {
        Self {
            pinner,
            contract,
            pending,
            metadata,
            state: UploadState::Idle,
            progress: None,
        }
    }

    /// Send a message for every transition to `tx`
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<UploadProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Run a share from `Idle` to `Done` or `Failed`
    pub async fn share(&mut self, request: UploadRequest) -> Result<UploadReceipt> {
        self.state = UploadState::Idle;

        // Preconditions: refused before the workflow starts
        let sender = request.sender.ok_or(ShareError::NoIdentity)?;
        let receiver = Address::parse_checked(&request.receiver)?;
        let file = request.file.ok_or(ShareError::NoFile)?;

        self.transition(UploadState::ReadingFile, "Reading file...");
        let read = EncodedDocument::read(&file).await;
        let document = read.map_err(|e| self.fail(UploadStep::ReadingFile, e))?;

        self.transition(UploadState::UploadingContent, "Uploading to IPFS...");
        let pinned = self.pinner.pin(&document).await;
        let content_id = pinned.map_err(|e| self.fail(UploadStep::UploadingContent, e))?;

        self.transition(
            UploadState::WritingLedger,
            "Recording the transfer on the ledger. Please confirm the transaction...",
        );
        let written = self.contract.add_file(&sender, &receiver, &content_id).await;
        let receipt = written.map_err(|e| self.fail(UploadStep::WritingLedger, e))?;

        self.transition(UploadState::WritingMetadata, "Saving document details...");
        let shared_at = now_secs();
        let record = TransferRecord {
            block_number: receipt.block_number,
            ..TransferRecord::pending(content_id.clone(), sender.clone(), receiver.clone(), shared_at)
        };
        let metadata = DocumentMetadata {
            content_id,
            patient_name: request.details.patient_name,
            document_type: request.details.document_type,
            file_name: document.file_name,
            mime_type: document.mime_type,
            size_bytes: document.bytes.len() as u64,
            shared_at,
            notes: request.details.notes,
        };

        let mut warnings = Vec::new();
        for participant in participants(&sender, &receiver) {
            if let Err(e) = self.metadata.put(participant, metadata.clone()).await {
                tracing::warn!(participant = %participant, error = %e, "Metadata write failed");
                warnings.push(format!("Document details were not saved: {}", e));
            }
        }
        // Receiver first: its received view must show the transfer before index catch-up
        for participant in participants(&receiver, &sender) {
            if let Err(e) = self.pending.append(participant, record.clone()).await {
                tracing::warn!(participant = %participant, error = %e, "Pending cache write failed");
                warnings.push(format!("Transfer will appear once the ledger index catches up: {}", e));
            }
        }

        self.transition(UploadState::Done, "File shared successfully!");
        tracing::info!(
            cid = %record.content_id,
            sender = %record.sender,
            receiver = %record.receiver,
            tx = %receipt.tx_hash,
            warnings = warnings.len(),
            "Document shared"
        );

        Ok(UploadReceipt {
            record,
            tx_hash: receipt.tx_hash,
            warnings,
        })
    }

    fn transition(&mut self, state: UploadState, message: &str) {
        self.state = state;
        tracing::info!(state = %state, "{}", message);
        if let Some(tx) = &self.progress {
            // A dropped receiver only means nobody is watching
            let _ = tx.send(UploadProgress {
                state,
                message: message.to_string(),
            });
        }
    }

    fn fail(&mut self, step: UploadStep, err: ShareError) -> ShareError {
        let err = classify(step, err);
        tracing::error!(step = ?step, error = %err, "Share failed");
        self.state = UploadState::Failed { step };
        if let Some(tx) = &self.progress {
            let _ = tx.send(UploadProgress {
                state: self.state,
                message: err.user_message(),
            });
        }
        err
    }
}

fn participants<'a>(first: &'a Address, second: &'a Address) -> Vec<&'a Address> {
    if first == second {
        vec![first]
    } else {
        vec![first, second]
    }
}

/// Report a step failure as that step's error kind
fn classify(step: UploadStep, err: ShareError) -> ShareError {
    match (step, err) {
        (UploadStep::ReadingFile, e @ ShareError::FileRead(_)) => e,
        (UploadStep::UploadingContent, e @ ShareError::Upload(_)) => e,
        (UploadStep::WritingLedger, e @ ShareError::LedgerWrite(_)) => e,
        (UploadStep::ReadingFile, e) => ShareError::FileRead(e.to_string()),
        (UploadStep::UploadingContent, e) => ShareError::Upload(e.to_string()),
        (UploadStep::WritingLedger, e) => ShareError::LedgerWrite(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::mock::{MockContract, MockPinner};
    use crate::traits::KeyValueStore;

    const SENDER: &str = "0x00000000000000000000000000000000000000aa";
    const RECEIVER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    struct Harness {
        pinner: Arc<MockPinner>,
        contract: Arc<MockContract>,
        pending: Arc<PendingCache>,
        metadata: Arc<MetadataCache>,
        _dir: tempfile::TempDir,
        file: PathBuf,
    }

    impl Harness {
        fn new(pinner: MockPinner, contract: MockContract) -> Self {
            Self::with_store(pinner, contract, Arc::new(MemoryStore::new()))
        }

        fn with_store(pinner: MockPinner, contract: MockContract, store: Arc<dyn KeyValueStore>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("xray.png");
            std::fs::write(&file, b"\x89PNG\r\n\x1a\nrest").unwrap();
            Self {
                pinner: Arc::new(pinner),
                contract: Arc::new(contract),
                pending: Arc::new(PendingCache::new(store.clone())),
                metadata: Arc::new(MetadataCache::new(store)),
                _dir: dir,
                file,
            }
        }

        fn orchestrator(&self) -> UploadOrchestrator {
            UploadOrchestrator::new(
                self.pinner.clone(),
                self.contract.clone(),
                self.pending.clone(),
                self.metadata.clone(),
            )
        }

        fn request(&self) -> UploadRequest {
            UploadRequest {
                sender: Some(Address::new(SENDER).unwrap()),
                receiver: RECEIVER.into(),
                file: Some(self.file.clone()),
                details: UploadDetails {
                    patient_name: Some("Asha Rao".into()),
                    ..Default::default()
                },
            }
        }
    }

    /// Store that reads as empty and refuses every write
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(ShareError::Storage("disk full".into()))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Err(ShareError::Storage("disk full".into()))
        }

        fn update(
            &self,
            _key: &str,
            _apply: &mut dyn FnMut(Option<String>) -> Result<Option<String>>,
        ) -> Result<()> {
            Err(ShareError::Storage("disk full".into()))
        }

        fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn receiver() -> Address {
        Address::parse_checked(RECEIVER).unwrap()
    }

    #[tokio::test]
    async fn test_happy_path_reports_every_step() {
        let h = Harness::new(MockPinner::new("Qm123"), MockContract::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut orchestrator = h.orchestrator().with_progress(tx);

        let receipt = orchestrator.share(h.request()).await.unwrap();
        assert_eq!(orchestrator.state(), UploadState::Done);
        assert!(receipt.warnings.is_empty());
        assert!(receipt.record.is_pending());

        drop(orchestrator);
        let mut states = Vec::new();
        while let Some(progress) = rx.recv().await {
            states.push(progress.state);
        }
        assert_eq!(
            states,
            vec![
                UploadState::ReadingFile,
                UploadState::UploadingContent,
                UploadState::WritingLedger,
                UploadState::WritingMetadata,
                UploadState::Done,
            ]
        );

        let pending = h.pending.list(&receiver()).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].content_id.as_str(), "Qm123");
        assert_eq!(h.pending.list(&Address::new(SENDER).unwrap()).await.unwrap().len(), 1);

        let meta = h
            .metadata
            .get(&receiver(), &pending[0].content_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(meta.mime_type, "image/png");
        assert_eq!(meta.patient_name.as_deref(), Some("Asha Rao"));
    }

    #[tokio::test]
    async fn test_preconditions_fail_fast_in_order() {
        let h = Harness::new(MockPinner::new("Qm123"), MockContract::new());
        let mut orchestrator = h.orchestrator();

        let no_identity = UploadRequest {
            sender: None,
            receiver: "nonsense".into(),
            file: None,
            ..h.request()
        };
        assert!(matches!(orchestrator.share(no_identity).await, Err(ShareError::NoIdentity)));

        let bad_receiver = UploadRequest {
            receiver: "0x123".into(),
            file: None,
            ..h.request()
        };
        assert!(matches!(
            orchestrator.share(bad_receiver).await,
            Err(ShareError::InvalidAddress(_))
        ));

        let bad_checksum = UploadRequest {
            receiver: RECEIVER.replace("aAeb", "AAeb"),
            ..h.request()
        };
        assert!(matches!(
            orchestrator.share(bad_checksum).await,
            Err(ShareError::InvalidAddress(_))
        ));

        let no_file = UploadRequest {
            file: None,
            ..h.request()
        };
        assert!(matches!(orchestrator.share(no_file).await, Err(ShareError::NoFile)));

        assert_eq!(orchestrator.state(), UploadState::Idle);
        assert!(h.pinner.pinned().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_file_fails_before_upload() {
        let h = Harness::new(MockPinner::new("Qm123"), MockContract::new());
        let mut orchestrator = h.orchestrator();
        let request = UploadRequest {
            file: Some(h.file.with_file_name("missing.png")),
            ..h.request()
        };

        assert!(matches!(orchestrator.share(request).await, Err(ShareError::FileRead(_))));
        assert_eq!(
            orchestrator.state(),
            UploadState::Failed {
                step: UploadStep::ReadingFile
            }
        );
        assert!(h.pinner.pinned().is_empty());
    }

    #[tokio::test]
    async fn test_missing_content_id_skips_ledger_and_cache() {
        let h = Harness::new(MockPinner::without_content_id(), MockContract::new());
        let mut orchestrator = h.orchestrator();

        let err = orchestrator.share(h.request()).await.unwrap_err();
        assert!(matches!(err, ShareError::Upload(_)));
        assert_eq!(
            orchestrator.state(),
            UploadState::Failed {
                step: UploadStep::UploadingContent
            }
        );
        assert!(h.contract.writes().is_empty());
        assert!(h.pending.list(&receiver()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_ledger_write_leaves_cache_untouched() {
        let h = Harness::new(MockPinner::new("Qm123"), MockContract::new().rejecting_writes());
        let mut orchestrator = h.orchestrator();

        let err = orchestrator.share(h.request()).await.unwrap_err();
        assert!(matches!(err, ShareError::LedgerWrite(_)));
        assert!(err.user_message().contains("wallet balance"));
        assert!(h.pending.list(&receiver()).await.unwrap().is_empty());
        assert!(h.metadata.list(&receiver()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_failures_after_ledger_write_become_warnings() {
        let h = Harness::with_store(
            MockPinner::new("Qm123"),
            MockContract::new(),
            Arc::new(ReadOnlyStore),
        );
        let mut orchestrator = h.orchestrator();

        let receipt = orchestrator.share(h.request()).await.unwrap();
        assert_eq!(orchestrator.state(), UploadState::Done);
        assert_eq!(h.contract.writes().len(), 1);
        assert_eq!(receipt.record.content_id.as_str(), "Qm123");

        // Metadata and pending writes for both participants
        assert_eq!(receipt.warnings.len(), 4);
        assert!(receipt.warnings.iter().any(|w| w.starts_with("Document details were not saved")));
        assert!(receipt
            .warnings
            .iter()
            .any(|w| w.starts_with("Transfer will appear once the ledger index catches up")));
    }

    #[tokio::test]
    async fn test_restart_after_failure() {
        let h = Harness::new(MockPinner::new("Qm123"), MockContract::new());
        let mut orchestrator = h.orchestrator();

        let missing = UploadRequest {
            file: Some(h.file.with_file_name("missing.png")),
            ..h.request()
        };
        assert!(orchestrator.share(missing).await.is_err());
        assert!(orchestrator.state().is_terminal());

        orchestrator.share(h.request()).await.unwrap();
        assert_eq!(orchestrator.state(), UploadState::Done);
        assert_eq!(h.contract.writes().len(), 1);
    }
}
