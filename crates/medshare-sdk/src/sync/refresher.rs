//! Sequenced view refresh
//!
//! Every refresh takes a sequence number when it starts. When it resolves,
//! its views are published only if no later-started refresh has already
//! been published, so a slow response can never overwrite a newer one.

use super::reconciler::{ParticipantViews, RecordReconciler};
use crate::address::Address;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default polling interval for [`spawn_refresh_task`]
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Published views and the refresh that produced them
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub seq: u64,
    pub views: ParticipantViews,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { seq: u64 },
    /// A later refresh was already published
    Discarded { seq: u64, latest: u64 },
}

pub struct ViewRefresher {
    reconciler: RecordReconciler,
    participant: Address,
    next_seq: AtomicU64,
    tx: watch::Sender<Option<ViewSnapshot>>,
}

impl ViewRefresher {
    pub fn new(reconciler: RecordReconciler, participant: Address) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            reconciler,
            participant,
            next_seq: AtomicU64::new(0),
            tx,
        }
    }

    pub fn participant(&self) -> &Address {
        &self.participant
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ViewSnapshot>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Option<ViewSnapshot> {
        self.tx.borrow().clone()
    }

    /// Reserve the sequence number for a refresh that is starting now
    pub fn begin(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish `views` unless a refresh started after `seq` already was
    pub fn apply(&self, seq: u64, views: ParticipantViews) -> RefreshOutcome {
        let mut latest = 0;
        let applied = self.tx.send_if_modified(|current| {
            latest = current.as_ref().map_or(0, |s| s.seq);
            if seq <= latest {
                return false;
            }
            *current = Some(ViewSnapshot {
                seq,
                views,
                refreshed_at: Utc::now(),
            });
            true
        });

        if applied {
            RefreshOutcome::Applied { seq }
        } else {
            tracing::debug!(seq, latest, "Discarding stale refresh result");
            RefreshOutcome::Discarded { seq, latest }
        }
    }

    /// Rebuild both views and publish them if still current
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let seq = self.begin();
        let views = self.reconciler.build_views(&self.participant).await?;
        Ok(self.apply(seq, views))
    }
}

/// Refresh on a fixed interval until `shutdown` turns true or its sender drops
///
/// The first refresh runs immediately.
pub fn spawn_refresh_task(
    refresher: Arc<ViewRefresher>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tracing::info!(
        participant = %refresher.participant(),
        interval_secs = interval.as_secs(),
        "View refresh task started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match refresher.refresh().await {
                        Ok(outcome) => tracing::debug!(?outcome, "View refresh completed"),
                        Err(e) => tracing::warn!(error = %e, "View refresh failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("View refresh task stopped");
    })
}
