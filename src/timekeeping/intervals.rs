use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// A span of time; an open interval (`end == None`) extends to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end.unwrap_or(now)
    }

    /// Half-open overlap: touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Interval, now: DateTime<Utc>) -> bool {
        self.start < other.end_or(now) && other.start < self.end_or(now)
    }

    pub fn hours(&self, now: DateTime<Utc>) -> f64 {
        duration_hours(self.end_or(now) - self.start)
    }

    /// Hours of this interval falling inside `window`.
    pub fn clipped_hours(&self, window: &Window, now: DateTime<Utc>) -> f64 {
        let start = self.start.max(window.start);
        let end = self.end_or(now).min(window.end);
        if end <= start {
            return 0.0;
        }
        duration_hours(end - start)
    }
}

fn duration_hours(duration: Duration) -> f64 {
    duration.num_milliseconds().max(0) as f64 / 3_600_000.0
}

/// `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn day(date: NaiveDate) -> Self {
        let start = Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN));
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    /// Monday to Monday of the ISO week containing `date`.
    pub fn iso_week(date: NaiveDate) -> Self {
        let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        let start = Window::day(monday).start;
        Self {
            start,
            end: start + Duration::days(7),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = self.start.date_naive();
        while Window::day(day).start < self.end {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }
}
