//! End-to-end sharing scenarios over in-memory collaborators

use medshare_client::{ContractFileEntry, IndexedFileEvent, RawTimestamp};
use medshare_sdk::mock::{MockContract, MockIndex, MockPinner};
use medshare_sdk::{
    merge_view, Address, CacheBackend, ContentId, Direction, KeyValueStore, MemoryStore,
    RecordSource, ShareClient, ShareConfig, ShareError, TransferRecord, UploadRequest,
    UploadState, UploadStep,
};
use std::path::PathBuf;
use std::sync::Arc;

const A: &str = "0x00000000000000000000000000000000000000aa";
const B: &str = "0x00000000000000000000000000000000000000bb";
const C: &str = "0x00000000000000000000000000000000000000cc";

fn addr(raw: &str) -> Address {
    Address::new(raw).unwrap()
}

struct Session {
    store: Arc<MemoryStore>,
    index: Arc<MockIndex>,
    contract: Arc<MockContract>,
    pinner: Arc<MockPinner>,
    dir: tempfile::TempDir,
}

impl Session {
    fn new(index: MockIndex, contract: MockContract, pinner: MockPinner) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            index: Arc::new(index),
            contract: Arc::new(contract),
            pinner: Arc::new(pinner),
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn client(&self, participant: &str) -> ShareClient {
        let mut config = ShareConfig::default();
        config.cache.backend = CacheBackend::Memory;
        ShareClient::with_parts(
            config,
            self.store.clone(),
            self.index.clone(),
            self.contract.clone(),
            self.pinner.clone(),
        )
        .unwrap()
        .with_participant(addr(participant))
    }

    fn file(&self) -> PathBuf {
        let path = self.dir.path().join("discharge-summary.pdf");
        std::fs::write(&path, b"%PDF-1.4 discharge summary").unwrap();
        path
    }

    fn share_request(&self, from: &str, to: &str) -> UploadRequest {
        UploadRequest {
            sender: Some(addr(from)),
            receiver: to.into(),
            file: Some(self.file()),
            ..Default::default()
        }
    }
}

fn indexed(cid: &str, sender: &str, receiver: &str, ts: u64) -> IndexedFileEvent {
    IndexedFileEvent {
        sender: sender.into(),
        receiver: receiver.into(),
        cid: cid.into(),
        block_number: Some(100),
        timestamp: RawTimestamp::Integer(ts),
    }
}

fn contract_entry(cid: &str, ts: u64) -> ContractFileEntry {
    ContractFileEntry {
        sender: A.into(),
        receiver: B.into(),
        cid: cid.into(),
        timestamp: RawTimestamp::Text(format!("{:064x}", ts)),
    }
}

#[tokio::test]
async fn pending_record_is_superseded_by_ledger_record() {
    let session = Session::new(MockIndex::new(), MockContract::new(), MockPinner::new("Qm123"));
    let alice = session.client(A);
    let bob = session.client(B);

    alice
        .orchestrator()
        .share(session.share_request(A, B))
        .await
        .unwrap();

    // Before index catch-up
    let view = bob.received_view().await.unwrap();
    assert_eq!(view.records.len(), 1);
    assert_eq!(view.records[0].content_id.as_str(), "Qm123");
    assert_eq!(view.records[0].source, RecordSource::Pending);

    // The sender sees it too
    let sent = alice.sent_view().await.unwrap();
    assert_eq!(sent.records.len(), 1);

    // Index catches up
    session.index.push(indexed("Qm123", A, B, 1_700_000_000));

    let view = bob.received_view().await.unwrap();
    assert_eq!(view.records.len(), 1);
    assert_eq!(view.records[0].content_id.as_str(), "Qm123");
    assert_eq!(view.records[0].source, RecordSource::Authoritative);
    assert!(bob.pending().list(&addr(B)).await.unwrap().is_empty());
}

#[tokio::test]
async fn one_document_shared_with_two_receivers_stays_in_sent_view() {
    let session = Session::new(MockIndex::new(), MockContract::new(), MockPinner::new("Qm123"));
    let alice = session.client(A);

    let first = alice.orchestrator().share(session.share_request(A, B)).await.unwrap();
    let second = alice.orchestrator().share(session.share_request(A, C)).await.unwrap();
    assert!(first.warnings.is_empty());
    assert!(second.warnings.is_empty());
    assert_eq!(session.contract.writes().len(), 2);

    let sent = alice.sent_view().await.unwrap();
    let mut receivers: Vec<_> = sent.records.iter().map(|r| r.receiver.clone()).collect();
    receivers.sort();
    assert_eq!(receivers, vec![addr(B), addr(C)]);

    // Index has only caught up with the first transfer
    session.index.push(indexed("Qm123", A, B, 1_700_000_000));

    let sent = alice.sent_view().await.unwrap();
    let mut rows: Vec<_> = sent
        .records
        .iter()
        .map(|r| (r.receiver.clone(), r.source))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        rows,
        vec![
            (addr(B), RecordSource::Authoritative),
            (addr(C), RecordSource::Pending),
        ]
    );

    // The second receiver still sees its copy as pending
    let carol = session.client(C);
    let received = carol.received_view().await.unwrap();
    assert_eq!(received.records.len(), 1);
    assert_eq!(received.records[0].source, RecordSource::Pending);
}

#[tokio::test]
async fn fallback_read_serves_the_view_without_error() {
    let session = Session::new(
        MockIndex::failing(),
        MockContract::with_entries(vec![contract_entry("Qm1", 100), contract_entry("Qm2", 200)]),
        MockPinner::new("unused"),
    );
    let bob = session.client(B);

    let view = bob.received_view().await.unwrap();
    assert!(view.warning.is_none());
    let order: Vec<_> = view.records.iter().map(|r| r.content_id.as_str()).collect();
    assert_eq!(order, vec!["Qm2", "Qm1"]);
    assert!(view.records.iter().all(|r| r.source == RecordSource::Authoritative));
}

#[tokio::test]
async fn ledger_outage_degrades_to_pending_only() {
    let session = Session::new(
        MockIndex::failing(),
        MockContract::failing_reads(),
        MockPinner::new("Qm9"),
    );
    let alice = session.client(A);
    let bob = session.client(B);

    alice
        .orchestrator()
        .share(session.share_request(A, B))
        .await
        .unwrap();

    let view = bob.received_view().await.unwrap();
    assert!(view.is_degraded());
    assert!(view.warning.as_deref().unwrap().contains("network connection"));
    assert_eq!(view.records.len(), 1);
    assert!(view.records[0].is_pending());
}

#[tokio::test]
async fn missing_content_id_writes_nothing() {
    let session = Session::new(MockIndex::new(), MockContract::new(), MockPinner::without_content_id());
    let alice = session.client(A);
    let mut orchestrator = alice.orchestrator();

    let err = orchestrator.share(session.share_request(A, B)).await.unwrap_err();
    assert!(matches!(err, ShareError::Upload(_)));
    assert_eq!(
        orchestrator.state(),
        UploadState::Failed {
            step: UploadStep::UploadingContent
        }
    );

    assert!(session.contract.writes().is_empty());
    assert!(session.store.keys_with_prefix("").unwrap().is_empty());
}

#[tokio::test]
async fn both_directions_share_one_fetch() {
    let session = Session::new(
        MockIndex::with_events(vec![
            indexed("QmOut", A, B, 10),
            indexed("QmIn", B, A, 20),
        ]),
        MockContract::new(),
        MockPinner::new("unused"),
    );
    let alice = session.client(A);

    let views = alice.views().await.unwrap();
    assert_eq!(views.sent.records[0].content_id.as_str(), "QmOut");
    assert_eq!(views.received.records[0].content_id.as_str(), "QmIn");
    assert_eq!(session.index.call_count(), 1);
}

#[test]
fn merged_view_is_sorted_for_any_input_order() {
    let record = |cid: &str, ts: u64, source: RecordSource| TransferRecord {
        source,
        ..TransferRecord::pending(ContentId::new(cid).unwrap(), addr(A), addr(B), ts)
    };
    let mut authoritative = vec![
        record("Qm1", 50, RecordSource::Authoritative),
        record("Qm2", 10, RecordSource::Authoritative),
        record("Qm3", 90, RecordSource::Authoritative),
        record("Qm4", 30, RecordSource::Authoritative),
    ];
    let pending = vec![
        record("Qm3", 95, RecordSource::Pending),
        record("Qm5", 70, RecordSource::Pending),
    ];

    for _ in 0..authoritative.len() {
        authoritative.rotate_left(1);
        let view = merge_view(&addr(B), Direction::Received, &authoritative, &pending);

        let stamps: Vec<u64> = view.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![90, 70, 50, 30, 10]);
        let qm3 = view.iter().find(|r| r.content_id.as_str() == "Qm3").unwrap();
        assert_eq!(qm3.source, RecordSource::Authoritative);
    }
}
