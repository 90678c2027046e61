//! # Phase Schedule
//!
//! Splits a project duration across construction phases and assigns
//! consecutive calendar dates.

use chrono::{Local, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Phases used when none are given
pub const DEFAULT_PHASES: [&str; 5] = [
    "Mobilization",
    "Trenching",
    "Pipe install",
    "Backfill",
    "Restoration",
];

/// Date format for schedule rows
const DATE_FORMAT: &str = "%m/%d/%Y";

/// Split a comma-separated phase list. Blank input yields [`DEFAULT_PHASES`].
///
/// ```rust
/// use civil_core::calculations::schedule::parse_phases;
///
/// assert_eq!(parse_phases(" Survey, , Paving "), vec!["Survey", "Paving"]);
/// assert_eq!(parse_phases("").len(), 5);
/// ```
pub fn parse_phases(text: &str) -> Vec<String> {
    let phases: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    if phases.is_empty() {
        DEFAULT_PHASES.iter().map(|p| p.to_string()).collect()
    } else {
        phases
    }
}

/// Input for [`build_schedule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub project_name: String,
    /// Total duration (calendar days), clamped to at least 1
    #[serde(deserialize_with = "crate::units::whole_i64")]
    pub duration_days: i64,
    /// ISO date (YYYY-MM-DD); today when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<String>>,
}

impl ScheduleInput {
    pub fn new(project_name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            project_name: project_name.into(),
            duration_days,
            start_date: None,
            phases: None,
        }
    }

    pub fn starting(mut self, start_date: &str) -> Self {
        self.start_date = Some(start_date.to_string());
        self
    }

    pub fn with_phases(mut self, phases: &[&str]) -> Self {
        self.phases = Some(phases.iter().map(|p| p.to_string()).collect());
        self
    }
}

/// One scheduled phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRow {
    pub phase: String,
    /// MM/DD/YYYY
    pub start: String,
    /// MM/DD/YYYY, inclusive
    pub end: String,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub project_name: String,
    pub duration: i64,
    pub phases: Vec<PhaseRow>,
}

fn parse_start(start_date: Option<&str>) -> CalcResult<NaiveDate> {
    match start_date {
        Some(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|e| {
            CalcError::invalid_input("start_date", text, format!("Expected YYYY-MM-DD: {}", e))
        }),
        None => Ok(Local::now().date_naive()),
    }
}

/// `date + days`, or `InvalidInput` if the result leaves chrono's date range.
fn add_days(date: NaiveDate, days: i64, duration: i64) -> CalcResult<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| {
            CalcError::invalid_input(
                "duration_days",
                duration.to_string(),
                "Schedule runs past the supported calendar range",
            )
        })
}

/// Build a phase schedule.
///
/// Each phase gets `max(1, duration / phases)` days; the last phase takes the
/// remainder and is never shorter than one day. Phases run back to back.
pub fn build_schedule(input: &ScheduleInput) -> CalcResult<ScheduleResult> {
    let phases: Vec<String> = match &input.phases {
        Some(list) if list.iter().any(|p| !p.trim().is_empty()) => list
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect(),
        _ => parse_phases(""),
    };

    let start = parse_start(input.start_date.as_deref())?;
    let duration = input.duration_days.max(1);
    let count = phases.len() as i64;
    let per_phase = (duration / count).max(1);

    let mut rows = Vec::with_capacity(phases.len());
    let mut day = start;
    for (i, phase) in phases.into_iter().enumerate() {
        let days = if i as i64 == count - 1 {
            (duration - (count - 1) * per_phase).max(1)
        } else {
            per_phase
        };
        let end = add_days(day, days - 1, duration)?;
        rows.push(PhaseRow {
            phase,
            start: day.format(DATE_FORMAT).to_string(),
            end: end.format(DATE_FORMAT).to_string(),
            days,
        });
        day = add_days(end, 1, duration)?;
    }

    Ok(ScheduleResult {
        project_name: input.project_name.clone(),
        duration,
        phases: rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let input = ScheduleInput::new("Main St Sewer", 10)
            .starting("2025-03-03")
            .with_phases(&["Dig", "Lay"]);
        let result = build_schedule(&input).unwrap();
        assert_eq!(result.phases.len(), 2);
        assert_eq!(result.phases[0].start, "03/03/2025");
        assert_eq!(result.phases[0].end, "03/07/2025");
        assert_eq!(result.phases[1].start, "03/08/2025");
        assert_eq!(result.phases[1].end, "03/12/2025");
    }

    #[test]
    fn test_last_phase_takes_remainder() {
        let result = build_schedule(&ScheduleInput::new("Job", 12).starting("2025-01-01")).unwrap();
        let days: Vec<i64> = result.phases.iter().map(|p| p.days).collect();
        assert_eq!(days, vec![2, 2, 2, 2, 4]);
        assert_eq!(result.phases[4].end, "01/12/2025");
    }

    #[test]
    fn test_short_duration_last_phase_at_least_one_day() {
        let result = build_schedule(&ScheduleInput::new("Job", 3).starting("2025-01-01")).unwrap();
        assert!(result.phases.iter().all(|p| p.days >= 1));
        assert_eq!(result.phases.len(), 5);
    }

    #[test]
    fn test_duration_clamped() {
        let result = build_schedule(&ScheduleInput::new("Job", -4).starting("2025-01-01")).unwrap();
        assert_eq!(result.duration, 1);
    }

    #[test]
    fn test_blank_phase_list_uses_defaults() {
        let input = ScheduleInput::new("Job", 10).starting("2025-01-01").with_phases(&["", " "]);
        let result = build_schedule(&input).unwrap();
        assert_eq!(result.phases[0].phase, "Mobilization");
    }

    #[test]
    fn test_bad_start_date() {
        let input = ScheduleInput::new("Job", 10).starting("03/03/2025");
        assert!(build_schedule(&input).is_err());
    }

    #[test]
    fn test_huge_duration_is_rejected() {
        let input = ScheduleInput::new("Job", 1_000_000_000).starting("2025-01-01");
        let err = build_schedule(&input).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let max = ScheduleInput::new("Job", i64::MAX).starting("2025-01-01");
        assert!(build_schedule(&max).is_err());
    }
}
