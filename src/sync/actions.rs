use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyncAction {
    ImportFinalExamList,
    ImportHomeWorkList,
    ImportTestList,
    ExportFinalExamPoints,
    ExportHomeWorkPoints,
    ExportTestPoints,
}

impl SyncAction {
    pub const ALL: [SyncAction; 6] = [
        SyncAction::ImportFinalExamList,
        SyncAction::ImportHomeWorkList,
        SyncAction::ImportTestList,
        SyncAction::ExportFinalExamPoints,
        SyncAction::ExportHomeWorkPoints,
        SyncAction::ExportTestPoints,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SyncAction::ImportFinalExamList => "import.finalExamList",
            SyncAction::ImportHomeWorkList => "import.homeWorkList",
            SyncAction::ImportTestList => "import.testList",
            SyncAction::ExportFinalExamPoints => "export.finalExamPoints",
            SyncAction::ExportHomeWorkPoints => "export.homeWorkPoints",
            SyncAction::ExportTestPoints => "export.testPoints",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sync action: {}", self.0)
    }
}

impl FromStr for SyncAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// The operations the caller opted into for one run. Fixed once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet {
    actions: BTreeSet<SyncAction>,
}

impl ActionSet {
    pub fn new(actions: impl IntoIterator<Item = SyncAction>) -> Self {
        Self {
            actions: actions.into_iter().collect(),
        }
    }

    pub fn parse<'a>(tags: impl IntoIterator<Item = &'a str>) -> Result<Self, UnknownAction> {
        let actions = tags
            .into_iter()
            .map(SyncAction::from_str)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { actions })
    }

    pub fn requests(&self, action: SyncAction) -> bool {
        self.actions.contains(&action)
    }

    pub fn iter(&self) -> impl Iterator<Item = SyncAction> + '_ {
        self.actions.iter().copied()
    }
}
