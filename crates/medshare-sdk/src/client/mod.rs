//! Share client
//!
//! Wires configuration into the ledger adapter, caches, reconciler and
//! upload orchestrator, and exposes the operations a front end needs.
//!
//! # Example
//!
//! ```rust,ignore
//! use medshare_sdk::{ShareClient, ShareConfig};
//! use std::path::Path;
//!
//! let client = ShareClient::from_config(ShareConfig::load(Path::new("medshare.toml"))?)?;
//! let received = client.received_view().await?;
//! for record in &received.records {
//!     println!("{} from {}", record.content_id, record.sender.short());
//! }
//! ```

use crate::address::Address;
use crate::cache::{MemoryStore, MetadataCache, PendingCache};
use crate::config::{CacheBackend, ShareConfig};
use crate::error::{Result, ShareError};
use crate::ledger::LedgerQueryAdapter;
use crate::record::{Direction, TransferRecord};
use crate::sync::{ActivitySummary, ParticipantView, ParticipantViews, RecordReconciler, ViewRefresher};
use crate::traits::{ContentPinner, KeyValueStore, LedgerContract, LedgerIndex};
use crate::upload::UploadOrchestrator;
use chrono::NaiveDate;
use medshare_client::{
    ContractRelayClient, EventIndexClient, GuidanceClient, PinningClient, RecordsClient,
    SymptomReport,
};
use std::sync::Arc;

pub struct ShareClient {
    config: ShareConfig,
    participant: Option<Address>,
    pending: Arc<PendingCache>,
    metadata: Arc<MetadataCache>,
    reconciler: RecordReconciler,
    pinner: Arc<dyn ContentPinner>,
    contract: Arc<dyn LedgerContract>,
    records: RecordsClient,
    guidance: GuidanceClient,
}

impl ShareClient {
    /// Build HTTP collaborators and the configured store
    pub fn from_config(config: ShareConfig) -> Result<Self> {
        config.validate()?;

        let index = Arc::new(EventIndexClient::new(config.index.clone())?);
        let contract = Arc::new(ContractRelayClient::new(config.contract.clone())?);
        let pinner = Arc::new(
            PinningClient::new(config.gateway.service.clone())?.with_mode(config.gateway.mode),
        );
        let store = open_store(&config)?;

        Self::with_parts(config, store, index, contract, pinner)
    }

    /// Assemble from explicit collaborators
    pub fn with_parts(
        config: ShareConfig,
        store: Arc<dyn KeyValueStore>,
        index: Arc<dyn LedgerIndex>,
        contract: Arc<dyn LedgerContract>,
        pinner: Arc<dyn ContentPinner>,
    ) -> Result<Self> {
        let participant = config.participant()?;
        let pending = Arc::new(PendingCache::new(store.clone()));
        let metadata = Arc::new(MetadataCache::new(store));
        let ledger = LedgerQueryAdapter::new(index, contract.clone());
        let reconciler = RecordReconciler::new(ledger, pending.clone());
        let records = RecordsClient::new(config.records.clone())?;
        let guidance = GuidanceClient::new(config.guidance.clone())?;

        Ok(Self {
            config,
            participant,
            pending,
            metadata,
            reconciler,
            pinner,
            contract,
            records,
            guidance,
        })
    }

    /// Act as `participant` instead of the configured identity
    pub fn with_participant(mut self, participant: Address) -> Self {
        self.participant = Some(participant);
        self
    }

    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// The connected identity
    pub fn participant(&self) -> Result<&Address> {
        self.participant.as_ref().ok_or(ShareError::NoIdentity)
    }

    pub fn pending(&self) -> &Arc<PendingCache> {
        &self.pending
    }

    pub fn metadata(&self) -> &Arc<MetadataCache> {
        &self.metadata
    }

    pub fn records(&self) -> &RecordsClient {
        &self.records
    }

    pub async fn view(&self, direction: Direction) -> Result<ParticipantView> {
        self.reconciler.build_view(self.participant()?, direction).await
    }

    pub async fn sent_view(&self) -> Result<ParticipantView> {
        self.view(Direction::Sent).await
    }

    pub async fn received_view(&self) -> Result<ParticipantView> {
        self.view(Direction::Received).await
    }

    /// Both views from one ledger fetch
    pub async fn views(&self) -> Result<ParticipantViews> {
        self.reconciler.build_views(self.participant()?).await
    }

    /// Totals and daily counts ending at `today`
    pub async fn activity(&self, today: NaiveDate) -> Result<ActivitySummary> {
        let views = self.views().await?;
        Ok(ActivitySummary::from_views(
            &views.sent,
            &views.received,
            today,
            self.config.refresh.activity_days,
        ))
    }

    /// Orchestrator for one share workflow at a time
    pub fn orchestrator(&self) -> UploadOrchestrator {
        UploadOrchestrator::new(
            self.pinner.clone(),
            self.contract.clone(),
            self.pending.clone(),
            self.metadata.clone(),
        )
    }

    /// Sequenced refresher for the connected identity
    pub fn refresher(&self) -> Result<ViewRefresher> {
        Ok(ViewRefresher::new(self.reconciler.clone(), self.participant()?.clone()))
    }

    /// View/download link through the configured public gateway
    pub fn gateway_url(&self, record: &TransferRecord) -> String {
        record.gateway_url(&self.config.ipfs_gateway)
    }

    /// Ask the guidance service about a symptom report
    pub async fn guidance(&self, report: &SymptomReport) -> Result<String> {
        Ok(self.guidance.advise(report).await?)
    }
}

fn open_store(config: &ShareConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config.cache.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "native")]
        CacheBackend::Sqlite => Ok(Arc::new(crate::cache::SqliteStore::open(&config.cache.path)?)),
        #[cfg(not(feature = "native"))]
        CacheBackend::Sqlite => Err(ShareError::Config(
            "cache.backend = \"sqlite\" requires the `native` feature".into(),
        )),
    }
}
