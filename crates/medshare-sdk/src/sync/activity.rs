//! Sharing activity summary for dashboards

use super::reconciler::ParticipantView;
use crate::record::TransferRecord;
use chrono::{Days, NaiveDate};
use serde::Serialize;

pub const DEFAULT_ACTIVITY_DAYS: u32 = 7;

/// Transfers on one UTC day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    /// e.g. `Mar 4`
    pub label: String,
    pub sent: usize,
    pub received: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivitySummary {
    pub total_sent: usize,
    pub total_received: usize,
    /// Records in either view not yet confirmed by the ledger
    pub pending: usize,
    /// Oldest day first, ending with `today`
    pub days: Vec<DailyCount>,
}

impl ActivitySummary {
    pub fn from_views(
        sent: &ParticipantView,
        received: &ParticipantView,
        today: NaiveDate,
        days: u32,
    ) -> Self {
        let window: Vec<NaiveDate> = (0..days)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back.into())))
            .collect();

        let daily = window
            .into_iter()
            .map(|date| DailyCount {
                date,
                label: date.format("%b %-d").to_string(),
                sent: count_on(&sent.records, date),
                received: count_on(&received.records, date),
            })
            .collect();

        Self {
            total_sent: sent.records.len(),
            total_received: received.records.len(),
            pending: sent.pending_count() + received.pending_count(),
            days: daily,
        }
    }
}

fn count_on(records: &[TransferRecord], date: NaiveDate) -> usize {
    records
        .iter()
        .filter(|r| r.shared_at().map(|t| t.date_naive()) == Some(date))
        .count()
}
