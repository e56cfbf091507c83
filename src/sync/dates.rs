//! Resolving final-exam titles such as `Zaverecna skuska 15.01.24 9:30`
//! to an existing exam by its timestamp.
//!
//! The five numbers of a title are read day-month-year first and, when no
//! exam matches, year-month-day. The first ordering that hits an existing
//! exam wins; a title that matches neither stays unmatched.

use crate::model::{FinalExam, Subject};
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    DayMonthYear,
    YearMonthDay,
}

impl DateOrder {
    pub const TRIED: [DateOrder; 2] = [DateOrder::DayMonthYear, DateOrder::YearMonthDay];
}

pub fn normalize_year(year: i64) -> i64 {
    if year < 50 {
        year + 2000
    } else if year < 100 {
        year + 1900
    } else {
        year
    }
}

/// Exactly five integers, or `None`.
pub fn date_tokens(title: &str) -> Option<[i64; 5]> {
    let replaced: String = title
        .chars()
        .map(|c| if c.is_ascii_digit() { c } else { ' ' })
        .collect();
    let numbers = replaced
        .split_whitespace()
        .map(|t| t.parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()?;
    numbers.try_into().ok()
}

pub fn candidate(tokens: [i64; 5], order: DateOrder) -> Option<NaiveDateTime> {
    let [first, month, third, hour, minute] = tokens;
    let (day, year) = match order {
        DateOrder::DayMonthYear => (first, third),
        DateOrder::YearMonthDay => (third, first),
    };
    let year = i32::try_from(normalize_year(year)).ok()?;
    NaiveDate::from_ymd_opt(
        year,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )?
    .and_hms_opt(u32::try_from(hour).ok()?, u32::try_from(minute).ok()?, 0)
}

pub fn resolve_final_exam<'a>(subject: &'a Subject, title: &str) -> Option<&'a FinalExam> {
    let Some(tokens) = date_tokens(title) else {
        tracing::warn!(%title, "final exam title does not carry five date fields");
        return None;
    };
    for order in DateOrder::TRIED {
        let Some(date_time) = candidate(tokens, order) else {
            continue;
        };
        if let Some(exam) = subject.final_exam_by_date_time(date_time) {
            tracing::debug!(%title, ?order, %date_time, exam_id = exam.id, "final exam matched");
            return Some(exam);
        }
    }
    tracing::warn!(%title, "no final exam at either date reading");
    None
}
