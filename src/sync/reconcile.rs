use super::actions::{ActionSet, SyncAction};
use super::classify::RemoteHeader;
use super::dates;
use crate::model::{HomeWork, Subject, Test};
use serde_json::{json, Value};

/// A local entity, by business id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Test(i64),
    HomeWork(i64),
    FinalExam(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Matched(EntityRef),
    Unmatched,
}

/// One remote column after reconciliation. A run yields exactly one of
/// these per header, at the header's index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteGradeItem {
    pub column: usize,
    pub header: RemoteHeader,
    pub resolution: Resolution,
}

impl RemoteGradeItem {
    pub fn entity(&self) -> Option<EntityRef> {
        match self.resolution {
            Resolution::Matched(entity) => Some(entity),
            Resolution::Unmatched => None,
        }
    }

    pub fn to_json(&self) -> Value {
        let entity = self.entity().map(|e| match e {
            EntityRef::Test(id) => json!({ "kind": "test", "id": id }),
            EntityRef::HomeWork(id) => json!({ "kind": "homework", "id": id }),
            EntityRef::FinalExam(id) => json!({ "kind": "finalExam", "id": id }),
        });
        json!({
            "column": self.column,
            "kind": self.header.kind(),
            "remoteId": self.header.remote_id(),
            "name": self.header.name(),
            "entity": entity,
        })
    }
}

pub struct Reconciler<'a> {
    subject: &'a mut Subject,
    actions: &'a ActionSet,
}

impl<'a> Reconciler<'a> {
    pub fn new(subject: &'a mut Subject, actions: &'a ActionSet) -> Self {
        Self { subject, actions }
    }

    /// Empties every collection that is about to be reimported.
    pub fn prepare(&mut self) {
        if self.actions.requests(SyncAction::ImportTestList) {
            self.subject.clear_tests();
        }
        if self.actions.requests(SyncAction::ImportHomeWorkList) {
            self.subject.clear_home_works();
        }
    }

    pub fn reconcile(&mut self, column: usize, header: RemoteHeader) -> RemoteGradeItem {
        let entity = match &header {
            RemoteHeader::Test { remote_id, name } => self.test(*remote_id, name),
            RemoteHeader::HomeWorkCandidate { title, remote_id } => {
                self.home_work(*remote_id, title)
            }
            RemoteHeader::FinalExamCandidate { title, remote_id } => {
                self.final_exam(*remote_id, title)
            }
            RemoteHeader::Unrecognized => None,
        };
        if entity.is_none() && header != RemoteHeader::Unrecognized {
            tracing::warn!(
                column,
                kind = header.kind(),
                remote_id = header.remote_id(),
                name = header.name(),
                "grade item left unmatched"
            );
        }
        RemoteGradeItem {
            column,
            header,
            resolution: entity.map_or(Resolution::Unmatched, Resolution::Matched),
        }
    }

    pub fn reconcile_all(&mut self, headers: Vec<RemoteHeader>) -> Vec<RemoteGradeItem> {
        self.prepare();
        headers
            .into_iter()
            .enumerate()
            .map(|(column, header)| self.reconcile(column, header))
            .collect()
    }

    fn test(&mut self, remote_id: i64, name: &str) -> Option<EntityRef> {
        if let Some(existing) = self.subject.test_by_remote_id(remote_id) {
            return Some(EntityRef::Test(existing.id));
        }
        if !self.actions.requests(SyncAction::ImportTestList) {
            return None;
        }
        self.subject.add_test(Test {
            id: remote_id,
            name: name.to_string(),
            remote_id: Some(remote_id),
        });
        Some(EntityRef::Test(remote_id))
    }

    fn home_work(&mut self, remote_id: i64, title: &str) -> Option<EntityRef> {
        if let Some(existing) = self.subject.home_work_by_remote_id(remote_id) {
            return Some(EntityRef::HomeWork(existing.id));
        }
        if !self.actions.requests(SyncAction::ImportHomeWorkList) {
            return None;
        }
        self.subject.add_home_work_to_category(HomeWork {
            id: remote_id,
            name: title.to_string(),
            remote_id: Some(remote_id),
            required_points: None,
        });
        Some(EntityRef::HomeWork(remote_id))
    }

    fn final_exam(&mut self, remote_id: i64, title: &str) -> Option<EntityRef> {
        let exam_id = dates::resolve_final_exam(self.subject, title)?.id;
        if self.actions.requests(SyncAction::ImportFinalExamList) {
            self.subject.assign_final_exam_remote_id(exam_id, remote_id);
        }
        Some(EntityRef::FinalExam(exam_id))
    }
}
