use super::driver::{HrefParts, RemoteElement};
use crate::config::SyncConfig;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// What one gradebook column header turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteHeader {
    Test { remote_id: i64, name: String },
    FinalExamCandidate { title: String, remote_id: i64 },
    HomeWorkCandidate { title: String, remote_id: i64 },
    Unrecognized,
}

impl RemoteHeader {
    pub fn kind(&self) -> &'static str {
        match self {
            RemoteHeader::Test { .. } => "test",
            RemoteHeader::FinalExamCandidate { .. } => "finalExam",
            RemoteHeader::HomeWorkCandidate { .. } => "homework",
            RemoteHeader::Unrecognized => "unrecognized",
        }
    }

    pub fn remote_id(&self) -> Option<i64> {
        match self {
            RemoteHeader::Test { remote_id, .. }
            | RemoteHeader::FinalExamCandidate { remote_id, .. }
            | RemoteHeader::HomeWorkCandidate { remote_id, .. } => Some(*remote_id),
            RemoteHeader::Unrecognized => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            RemoteHeader::Test { name, .. } => Some(name),
            RemoteHeader::FinalExamCandidate { title, .. }
            | RemoteHeader::HomeWorkCandidate { title, .. } => Some(title),
            RemoteHeader::Unrecognized => None,
        }
    }
}

pub fn classify(element: &RemoteElement, config: &SyncConfig) -> RemoteHeader {
    if !element.is_link() {
        return RemoteHeader::Unrecognized;
    }
    let Some(href) = element.href.as_deref() else {
        return RemoteHeader::Unrecognized;
    };
    let href = match HrefParts::parse(href) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(%href, error = %e, "grade item link is not a url");
            return RemoteHeader::Unrecognized;
        }
    };
    let is_quiz = href.has_segment(&config.quiz_path_segment);
    let is_assign = href.has_segment(&config.assign_path_segment);
    if !is_quiz && !is_assign {
        return RemoteHeader::Unrecognized;
    }

    let Some(remote_id) = href
        .query_value("id")
        .and_then(|v| v.trim().parse::<i64>().ok())
    else {
        tracing::warn!(href = %href.location(), "grade item link without integer id");
        return RemoteHeader::Unrecognized;
    };
    let name = element.text.clone();

    if is_quiz {
        return RemoteHeader::Test { remote_id, name };
    }
    let keyword = strip_accents(&config.final_exam_keyword).to_lowercase();
    if strip_accents(&name).to_lowercase().contains(&keyword) {
        RemoteHeader::FinalExamCandidate {
            title: name,
            remote_id,
        }
    } else {
        RemoteHeader::HomeWorkCandidate {
            title: name,
            remote_id,
        }
    }
}

/// One result per header, in document order.
pub fn classify_all(elements: &[RemoteElement], config: &SyncConfig) -> Vec<RemoteHeader> {
    elements.iter().map(|e| classify(e, config)).collect()
}

/// Canonical decomposition with combining marks dropped. Letters whose
/// stroke is not a separate mark are folded by hand.
pub fn strip_accents(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'ł' => 'l',
            'Ł' => 'L',
            'đ' => 'd',
            'Đ' => 'D',
            'ø' => 'o',
            'Ø' => 'O',
            other => other,
        })
        .collect()
}
