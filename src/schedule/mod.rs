//! Weekly meeting calendar generation.
//!
//! Meeting ids are the ISO date, and existing meetings are merged with
//! `MergePolicy::KeepSlots`, so re-running a generation never duplicates a
//! meeting or clears a booking.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

use crate::models::meeting::{Meeting, Slot, meeting_id_for, normalize_role};
use crate::store::{MeetingStore, MergePolicy, StoreError, UpsertOutcome};

pub const MAX_WEEKS: u32 = 52;

/// Standard agenda, grouped as the club runs it.
pub const ROLE_GROUPS: &[(&str, &[&str])] = &[
    ("Core Team", &["SAA", "President", "TMOD", "TTM"]),
    (
        "GE Team",
        &["General Evaluator", "Timer", "Ah-Counter", "Listener", "Grammarian"],
    ),
    (
        "Prepared Speeches",
        &["Speaker 1", "Speaker 2", "Speaker 3", "Speaker 4"],
    ),
    (
        "Evaluators",
        &["Evaluator 1", "Evaluator 2", "Evaluator 3", "Evaluator 4"],
    ),
];

pub fn standard_roles() -> Vec<String> {
    ROLE_GROUPS
        .iter()
        .flat_map(|(_, roles)| roles.iter().map(|r| r.to_string()))
        .collect()
}

pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// First `weekday` on or after `from`.
pub fn next_occurrence(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from + Duration::days(i64::from(ahead))
}

/// `count` dates starting at `first`, one week apart.
pub fn weekly_dates(first: NaiveDate, count: u32) -> Vec<NaiveDate> {
    (0..count)
        .map(|week| first + Duration::weeks(i64::from(week)))
        .collect()
}

/// What to generate: the weekday, the agenda, and how many weeks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadencePlan {
    pub weekday: Weekday,
    pub role_template: Vec<String>,
    pub week_count: u32,
}

impl CadencePlan {
    /// Check bounds and clean up role names.
    fn validated(&self) -> Result<CadencePlan, ScheduleError> {
        if self.week_count == 0 || self.week_count > MAX_WEEKS {
            return Err(ScheduleError::InvalidPlan(format!(
                "week count must be between 1 and {MAX_WEEKS}"
            )));
        }
        if self.role_template.is_empty() {
            return Err(ScheduleError::InvalidPlan("role template is empty".to_string()));
        }
        let role_template = self
            .role_template
            .iter()
            .map(|r| normalize_role(r))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ScheduleError::InvalidPlan)?;
        Ok(CadencePlan {
            weekday: self.weekday,
            role_template,
            week_count: self.week_count,
        })
    }
}

/// Result of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ScheduleReport {
    /// Every targeted meeting id, in date order.
    pub meeting_ids: Vec<String>,
    /// The subset that did not exist before this run.
    pub created: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    InvalidPlan(String),
    Store(StoreError),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidPlan(e) => write!(f, "Invalid cadence plan: {e}"),
            ScheduleError::Store(e) => write!(f, "Schedule store error: {e}"),
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<StoreError> for ScheduleError {
    fn from(e: StoreError) -> Self {
        ScheduleError::Store(e)
    }
}

pub struct ScheduleGenerator<S> {
    store: S,
    meeting_time: NaiveTime,
}

impl<S: MeetingStore> ScheduleGenerator<S> {
    pub fn new(store: S, meeting_time: NaiveTime) -> Self {
        ScheduleGenerator { store, meeting_time }
    }

    /// Generate `week_count` meetings from the next cadence day on or after `today`.
    pub async fn seed_cadence(
        &self,
        plan: &CadencePlan,
        today: NaiveDate,
    ) -> Result<ScheduleReport, ScheduleError> {
        let plan = plan.validated()?;
        let first = next_occurrence(today, plan.weekday);
        self.upsert_dates(&plan, weekly_dates(first, plan.week_count)).await
    }

    /// Generate `week_count` meetings after the latest existing one.
    ///
    /// Starts at the first cadence day strictly after the latest meeting, but
    /// never in the past; an empty store behaves like `seed_cadence`.
    pub async fn extend_cadence(
        &self,
        plan: &CadencePlan,
        today: NaiveDate,
    ) -> Result<ScheduleReport, ScheduleError> {
        let plan = plan.validated()?;
        let from_today = next_occurrence(today, plan.weekday);
        let first = match self.store.query_latest_meeting().await? {
            Some(latest) => {
                let after_latest = next_occurrence(latest.date() + Duration::days(1), plan.weekday);
                after_latest.max(from_today)
            }
            None => from_today,
        };
        self.upsert_dates(&plan, weekly_dates(first, plan.week_count)).await
    }

    /// Delete every meeting. Irreversible; confirmation is the caller's job.
    pub async fn wipe_all(&self) -> Result<usize, ScheduleError> {
        let removed = self.store.delete_all().await?;
        log::warn!("Meeting store wiped: {} meeting(s) removed", removed);
        Ok(removed)
    }

    async fn upsert_dates(
        &self,
        plan: &CadencePlan,
        dates: Vec<NaiveDate>,
    ) -> Result<ScheduleReport, ScheduleError> {
        let mut report = ScheduleReport::default();
        for date in dates {
            let meeting = Meeting {
                id: meeting_id_for(date),
                scheduled_at: date.and_time(self.meeting_time),
                published: true,
                slots: plan.role_template.iter().map(Slot::empty).collect(),
            };
            let id = meeting.id.clone();
            if self.store.upsert_meeting(meeting, MergePolicy::KeepSlots).await? == UpsertOutcome::Inserted {
                report.created.push(id.clone());
            }
            report.meeting_ids.push(id);
        }
        log::info!(
            "Schedule generated: {} targeted, {} created",
            report.meeting_ids.len(),
            report.created.len()
        );
        Ok(report)
    }
}
