//! View reconciliation and refresh

mod activity;
mod reconciler;
mod refresher;

pub use activity::{ActivitySummary, DailyCount, DEFAULT_ACTIVITY_DAYS};
pub use reconciler::{merge_view, ParticipantView, ParticipantViews, RecordReconciler};
pub use refresher::{
    spawn_refresh_task, RefreshOutcome, ViewRefresher, ViewSnapshot, DEFAULT_REFRESH_INTERVAL,
};
