mod actions;
mod classify;
mod dates;
mod driver;
mod reconcile;
mod sequencer;
mod session;
mod snapshot;
#[cfg(test)]
mod testing;

use std::fmt;
use thiserror::Error;

pub use actions::{ActionSet, SyncAction};
pub use driver::{Connector, DriverError};
pub use reconcile::RemoteGradeItem;
pub use sequencer::SyncSummary;
pub use session::SessionOutcome;
pub use snapshot::SnapshotConnector;

use sequencer::Sequencer;
use session::with_session;

use crate::config::SyncConfig;
use crate::model::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    NotStarted,
    NavigatedToSettings,
    OpenedDetailReport,
    HeadersEnumerated,
    Classified,
    Reconciled,
    Published,
    Done,
    Failed,
}

impl SyncStage {
    pub fn next(self) -> Option<SyncStage> {
        match self {
            SyncStage::NotStarted => Some(SyncStage::NavigatedToSettings),
            SyncStage::NavigatedToSettings => Some(SyncStage::OpenedDetailReport),
            SyncStage::OpenedDetailReport => Some(SyncStage::HeadersEnumerated),
            SyncStage::HeadersEnumerated => Some(SyncStage::Classified),
            SyncStage::Classified => Some(SyncStage::Reconciled),
            SyncStage::Reconciled => Some(SyncStage::Published),
            SyncStage::Published => Some(SyncStage::Done),
            SyncStage::Done | SyncStage::Failed => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncStage::NotStarted => "not_started",
            SyncStage::NavigatedToSettings => "navigated_to_settings",
            SyncStage::OpenedDetailReport => "opened_detail_report",
            SyncStage::HeadersEnumerated => "headers_enumerated",
            SyncStage::Classified => "classified",
            SyncStage::Reconciled => "reconciled",
            SyncStage::Published => "published",
            SyncStage::Done => "done",
            SyncStage::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("could not open automation session: {0}")]
    Connect(#[source] DriverError),
    #[error("sync failed at stage {stage}: {source}")]
    Remote {
        stage: SyncStage,
        #[source]
        source: DriverError,
    },
    #[error("could not release automation session: {0}")]
    Release(#[source] DriverError),
}

impl SyncError {
    /// Last stage the pipeline reached before the failure.
    pub fn stage(&self) -> Option<SyncStage> {
        match self {
            SyncError::Remote { stage, .. } => Some(*stage),
            SyncError::Connect(_) | SyncError::Release(_) => None,
        }
    }
}

/// One grade-item sync against the course at `course_url`. On success the
/// subject holds the reconciled state and the outcome carries the
/// positional grade items; on failure the subject is unchanged.
pub fn run_grade_item_sync<C: Connector>(
    connector: &C,
    config: &SyncConfig,
    actions: ActionSet,
    subject: &mut Subject,
    course_url: &str,
) -> Result<SessionOutcome<SyncSummary>, SyncError> {
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("grade_item_sync", %run_id, %course_url);
    let _entered = span.enter();

    let requested: Vec<&str> = actions.iter().map(SyncAction::as_str).collect();
    tracing::info!(actions = ?requested, "sync started");

    let outcome = with_session(connector, actions, subject, |session| {
        Sequencer::new(config).run(session, course_url)
    });
    match &outcome {
        Ok(o) => tracing::info!(
            columns = o.value.columns,
            matched = o.value.matched,
            "sync finished"
        ),
        Err(e) => tracing::error!(error = %e, "sync failed"),
    }
    outcome
}
