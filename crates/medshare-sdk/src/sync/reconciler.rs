//! Record reconciler
//!
//! Builds participant views by merging authoritative ledger records with the
//! local pending cache. A failed ledger query degrades the view to pending
//! records with a warning; it never fails the view.

use crate::address::Address;
use crate::cache::PendingCache;
use crate::error::Result;
use crate::ledger::LedgerQueryAdapter;
use crate::record::{Direction, TransferRecord};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Deduplicated, newest-first records for one participant and direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    pub participant: Address,
    pub direction: Direction,
    pub records: Vec<TransferRecord>,
    /// Set when the ledger could not be queried and only pending records are shown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ParticipantView {
    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_pending()).count()
    }
}

/// Sent and received views from a single ledger fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantViews {
    pub sent: ParticipantView,
    pub received: ParticipantView,
}

#[derive(Clone)]
pub struct RecordReconciler {
    ledger: LedgerQueryAdapter,
    pending: Arc<PendingCache>,
}

impl RecordReconciler {
    pub fn new(ledger: LedgerQueryAdapter, pending: Arc<PendingCache>) -> Self {
        Self { ledger, pending }
    }

    pub async fn build_view(&self, participant: &Address, direction: Direction) -> Result<ParticipantView> {
        let (authoritative, pending, warning) = self.gather(participant).await?;
        Ok(ParticipantView {
            participant: participant.clone(),
            direction,
            records: merge_view(participant, direction, &authoritative, &pending),
            warning,
        })
    }

    pub async fn build_views(&self, participant: &Address) -> Result<ParticipantViews> {
        let (authoritative, pending, warning) = self.gather(participant).await?;
        let view = |direction| ParticipantView {
            participant: participant.clone(),
            direction,
            records: merge_view(participant, direction, &authoritative, &pending),
            warning: warning.clone(),
        };
        Ok(ParticipantViews {
            sent: view(Direction::Sent),
            received: view(Direction::Received),
        })
    }

    /// Fetch authoritative records, prune superseded pending entries, then
    /// read what is still pending
    async fn gather(
        &self,
        participant: &Address,
    ) -> Result<(Vec<TransferRecord>, Vec<TransferRecord>, Option<String>)> {
        let (authoritative, warning) = match self.ledger.fetch_records(participant).await {
            Ok(records) => (records, None),
            Err(e) => {
                tracing::warn!(participant = %participant, error = %e, "Ledger unavailable, showing pending records only");
                (Vec::new(), Some(e.user_message()))
            }
        };

        if !authoritative.is_empty() {
            self.pending.reconcile_against(participant, &authoritative).await?;
        }
        let pending = self.pending.list(participant).await?;

        Ok((authoritative, pending, warning))
    }
}

/// Merge authoritative and pending records into one view
///
/// Records outside `direction` are dropped. On a repeated `(contentId,
/// receiver)` key the first record wins, and authoritative records are
/// walked first. The result is stably sorted newest first.
pub fn merge_view(
    participant: &Address,
    direction: Direction,
    authoritative: &[TransferRecord],
    pending: &[TransferRecord],
) -> Vec<TransferRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<TransferRecord> = authoritative
        .iter()
        .chain(pending)
        .filter(|r| r.involves(participant, direction))
        .filter(|r| seen.insert((r.content_id.clone(), r.receiver.clone())))
        .cloned()
        .collect();

    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}
