use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::intervals::{Interval, Window};
use crate::db::entities::{TimeLogType, time_log};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
}

impl FromStr for Period {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            other => Err(format!("unknown period: {other}")),
        }
    }
}

impl Period {
    pub fn window(self, date: NaiveDate) -> Window {
        match self {
            Period::Day => Window::day(date),
            Period::Week => Window::iso_week(date),
        }
    }
}

fn interval_of(log: &time_log::Model) -> Interval {
    Interval::new(
        log.start_time.with_timezone(&Utc),
        log.end_time.map(|end| end.with_timezone(&Utc)),
    )
}

fn sum_hours(
    logs: &[time_log::Model],
    log_type: TimeLogType,
    window: &Window,
    now: DateTime<Utc>,
) -> f64 {
    logs.iter()
        .filter(|log| log.deleted_at.is_none() && log.log_type == log_type)
        .map(|log| interval_of(log).clipped_hours(window, now))
        .sum()
}

/// Hours of visible WORK logs inside `window`.
pub fn worked_hours(logs: &[time_log::Model], window: &Window, now: DateTime<Utc>) -> f64 {
    sum_hours(logs, TimeLogType::Work, window, now)
}

/// Hours of visible BREAK logs inside `window`.
pub fn break_hours(logs: &[time_log::Model], window: &Window, now: DateTime<Utc>) -> f64 {
    sum_hours(logs, TimeLogType::Break, window, now)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoursSummary {
    pub period: Period,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub worked_hours: f64,
    pub break_hours: f64,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub daily_limit: f64,
    pub weekly_limit: f64,
}

/// Summarizes the day or ISO week containing `date`.
///
/// Daily overtime is the excess over `daily_limit`. For a week the reported
/// overtime is the larger of the weekly excess and the sum of daily excesses.
pub fn summarize(
    logs: &[time_log::Model],
    period: Period,
    date: NaiveDate,
    daily_limit: f64,
    weekly_limit: f64,
    now: DateTime<Utc>,
) -> HoursSummary {
    let window = period.window(date);
    let worked = worked_hours(logs, &window, now);
    let breaks = break_hours(logs, &window, now);

    let overtime = match period {
        Period::Day => excess(worked, daily_limit),
        Period::Week => {
            let daily_excess: f64 = window
                .days()
                .into_iter()
                .map(|day| excess(worked_hours(logs, &Window::day(day), now), daily_limit))
                .sum();
            excess(worked, weekly_limit).max(daily_excess)
        }
    };

    HoursSummary {
        period,
        start: window.start,
        end: window.end,
        worked_hours: worked,
        break_hours: breaks,
        regular_hours: (worked - overtime).max(0.0),
        overtime_hours: overtime,
        daily_limit,
        weekly_limit,
    }
}

fn excess(hours: f64, limit: f64) -> f64 {
    (hours - limit).max(0.0)
}

pub fn expected_hours(units: i32, minutes_per_unit: Option<f64>) -> Option<f64> {
    let minutes_per_unit = minutes_per_unit.filter(|minutes| *minutes > 0.0)?;
    Some(f64::from(units.max(0)) * minutes_per_unit / 60.0)
}

/// Expected over actual hours; `None` when either side is unknown or no
/// time was worked.
pub fn ratio(expected: Option<f64>, hours: f64) -> Option<f64> {
    if hours <= 0.0 {
        return None;
    }
    expected.map(|expected| expected / hours)
}

pub fn efficiency(units: i32, minutes_per_unit: Option<f64>, hours: f64) -> Option<f64> {
    ratio(expected_hours(units, minutes_per_unit), hours)
}
