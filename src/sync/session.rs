use super::actions::ActionSet;
use super::driver::{Browser, Connector};
use super::reconcile::RemoteGradeItem;
use super::SyncError;
use crate::model::Subject;

/// Context for one sync run. The subject here is a working copy; it only
/// replaces the caller's subject when the whole run succeeds.
pub struct SyncSession<'b, B: Browser> {
    pub browser: &'b mut B,
    pub subject: Subject,
    pub actions: ActionSet,
    grade_items: Option<Vec<RemoteGradeItem>>,
}

impl<'b, B: Browser> SyncSession<'b, B> {
    pub fn use_grade_items(&mut self, items: Vec<RemoteGradeItem>) {
        self.grade_items = Some(items);
    }
}

pub struct SessionOutcome<T> {
    pub value: T,
    pub grade_items: Vec<RemoteGradeItem>,
}

struct BrowserGuard<B: Browser> {
    browser: B,
    released: bool,
}

impl<B: Browser> BrowserGuard<B> {
    fn release(&mut self) -> Result<(), SyncError> {
        self.released = true;
        self.browser.close().map_err(SyncError::Release)
    }
}

impl<B: Browser> Drop for BrowserGuard<B> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.browser.close() {
                tracing::warn!(error = %e, "failed to close automation session");
            }
        }
    }
}

/// Runs `body` against a fresh automation session. The session is closed
/// on every exit path before any error is returned.
pub fn with_session<C, T, F>(
    connector: &C,
    actions: ActionSet,
    subject: &mut Subject,
    body: F,
) -> Result<SessionOutcome<T>, SyncError>
where
    C: Connector,
    F: FnOnce(&mut SyncSession<'_, C::Browser>) -> Result<T, SyncError>,
{
    let browser = connector.connect().map_err(SyncError::Connect)?;
    let mut guard = BrowserGuard {
        browser,
        released: false,
    };

    let mut session = SyncSession {
        browser: &mut guard.browser,
        subject: subject.clone(),
        actions,
        grade_items: None,
    };
    let result = body(&mut session);
    let SyncSession {
        subject: working,
        grade_items,
        ..
    } = session;

    let released = guard.release();
    let value = result?;
    released?;

    *subject = working;
    Ok(SessionOutcome {
        value,
        grade_items: grade_items.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Test;
    use crate::sync::testing::{ScriptedBrowser, ScriptedConnector};
    use crate::sync::{DriverError, SyncStage};

    #[test]
    fn success_commits_working_copy_and_releases() {
        let connector = ScriptedConnector::new(ScriptedBrowser::default());
        let mut subject = Subject::new("I-1", "Algebra", "2024");

        let outcome = with_session(&connector, ActionSet::default(), &mut subject, |s| {
            s.subject.add_test(Test {
                id: 1,
                name: "T".into(),
                remote_id: Some(1),
            });
            s.use_grade_items(Vec::new());
            Ok(42)
        })
        .expect("run");

        assert_eq!(outcome.value, 42);
        assert_eq!(subject.tests.len(), 1);
        assert_eq!(connector.closed(), 1);
    }

    #[test]
    fn failure_discards_working_copy_and_still_releases() {
        let connector = ScriptedConnector::new(ScriptedBrowser::default());
        let mut subject = Subject::new("I-1", "Algebra", "2024");
        let before = subject.clone();

        let result: Result<SessionOutcome<()>, _> =
            with_session(&connector, ActionSet::default(), &mut subject, |s| {
                s.subject.clear_tests();
                s.subject.add_test(Test {
                    id: 1,
                    name: "T".into(),
                    remote_id: Some(1),
                });
                Err(SyncError::Remote {
                    stage: SyncStage::NotStarted,
                    source: DriverError::NoPage,
                })
            });

        assert!(result.is_err());
        assert_eq!(subject, before);
        assert_eq!(connector.closed(), 1);
    }

    #[test]
    fn connect_failure_never_runs_body() {
        let connector = ScriptedConnector::refusing();
        let mut subject = Subject::new("I-1", "Algebra", "2024");
        let mut ran = false;
        let result = with_session(&connector, ActionSet::default(), &mut subject, |_| {
            ran = true;
            Ok(())
        });
        assert!(matches!(result, Err(SyncError::Connect(_))));
        assert!(!ran);
    }
}
