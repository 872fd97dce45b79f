//! Due-date parsing and the two string shapes the client works with: the
//! editable form value (`YYYY-MM-DDTHH:MM`) and the payload value, which
//! always carries explicit seconds.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};

pub const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

// `%.f` also matches when there is no fractional part
const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parse a due date leniently.
///
/// Blank input and anything unrecognised yield `None`. Offsets are converted
/// to local time; a bare date means midnight.
pub fn parse_due(text: &str) -> Option<NaiveDateTime> {
    let value = text.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.with_timezone(&Local).naive_local());
    }

    let spaced = value.replacen('T', " ", 1);
    for format in LOCAL_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&spaced, format) {
            return Some(parsed);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// The form representation of a stored due date, or an empty string when
/// there is none or it can't be read.
pub fn format_for_input(raw: Option<&str>) -> String {
    raw.and_then(parse_due)
        .map(|due| due.format(INPUT_FORMAT).to_string())
        .unwrap_or_default()
}

/// Turn the form value into what the server receives: `None` for an empty
/// field, otherwise the value with `:00` seconds appended.
pub fn input_to_payload(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("{trimmed}:00"))
    }
}

/// Normalise whatever the user typed into the form representation.
pub fn normalize_input(typed: &str) -> Option<String> {
    parse_due(typed).map(|due| due.format(INPUT_FORMAT).to_string())
}

/// `now` shifted by whole days, in the form representation.
pub fn preset(now: NaiveDateTime, days: i64) -> String {
    (now + Duration::days(days)).format(INPUT_FORMAT).to_string()
}

/// Quick picks offered while typing a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuePreset {
    Tomorrow,
    InAWeek,
    InAMonth,
}

impl DuePreset {
    pub const PRESETS: [DuePreset; 3] = [DuePreset::Tomorrow, DuePreset::InAWeek, DuePreset::InAMonth];

    pub fn days(self) -> i64 {
        match self {
            DuePreset::Tomorrow => 1,
            DuePreset::InAWeek => 7,
            DuePreset::InAMonth => 30,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DuePreset::Tomorrow => "tomorrow",
            DuePreset::InAWeek => "in a week",
            DuePreset::InAMonth => "in a month",
        }
    }

    /// Cycles tomorrow, in a week, in a month, then back to tomorrow.
    pub fn after(current: Option<DuePreset>) -> DuePreset {
        match current {
            None | Some(DuePreset::InAMonth) => DuePreset::Tomorrow,
            Some(DuePreset::Tomorrow) => DuePreset::InAWeek,
            Some(DuePreset::InAWeek) => DuePreset::InAMonth,
        }
    }

    pub fn apply(self, now: NaiveDateTime) -> String {
        preset(now, self.days())
    }
}
