use super::classify::classify_all;
use super::driver::{Browser, DriverError};
use super::reconcile::{Reconciler, Resolution};
use super::session::SyncSession;
use super::{SyncError, SyncStage};
use crate::config::SyncConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub columns: usize,
    pub matched: usize,
}

/// Drives the grade-item pipeline. Each step needs the page state left by
/// the one before it, so there is no skipping and no going back.
pub struct Sequencer<'c> {
    config: &'c SyncConfig,
    stage: SyncStage,
}

impl<'c> Sequencer<'c> {
    pub fn new(config: &'c SyncConfig) -> Self {
        Self {
            config,
            stage: SyncStage::NotStarted,
        }
    }

    pub fn stage(&self) -> SyncStage {
        self.stage
    }

    fn advance(&mut self, next: SyncStage) {
        debug_assert_eq!(self.stage.next(), Some(next));
        tracing::debug!(from = %self.stage, to = %next, "sync stage");
        self.stage = next;
    }

    fn remote<T>(&mut self, result: Result<T, DriverError>) -> Result<T, SyncError> {
        result.map_err(|source| {
            let stage = self.stage;
            self.stage = SyncStage::Failed;
            tracing::warn!(%stage, error = %source, "sync aborted");
            SyncError::Remote { stage, source }
        })
    }

    fn follow_link<B: Browser>(&mut self, browser: &mut B, text: &str) -> Result<(), SyncError> {
        let link = self.remote(browser.find_by_link_text(text))?;
        self.remote(browser.click(&link))
    }

    pub fn run<B: Browser>(
        &mut self,
        session: &mut SyncSession<'_, B>,
        course_url: &str,
    ) -> Result<SyncSummary, SyncError> {
        let config = self.config;

        let nav = session.browser.navigate(course_url);
        self.remote(nav)?;
        self.follow_link(&mut *session.browser, &config.settings_link_text)?;
        self.advance(SyncStage::NavigatedToSettings);

        self.follow_link(&mut *session.browser, &config.report_link_text)?;
        self.advance(SyncStage::OpenedDetailReport);

        let found = session.browser.find_all_by_css(&config.header_selector);
        let elements = self.remote(found)?;
        self.advance(SyncStage::HeadersEnumerated);

        let headers = classify_all(&elements, config);
        self.advance(SyncStage::Classified);

        let items = Reconciler::new(&mut session.subject, &session.actions).reconcile_all(headers);
        self.advance(SyncStage::Reconciled);

        let summary = SyncSummary {
            columns: items.len(),
            matched: items
                .iter()
                .filter(|i| i.resolution != Resolution::Unmatched)
                .count(),
        };
        session.use_grade_items(items);
        let finished: Vec<_> = session.actions.iter().collect();
        for action in finished {
            session.subject.finish_action(action.as_str());
        }
        self.advance(SyncStage::Published);

        self.advance(SyncStage::Done);
        Ok(summary)
    }
}
