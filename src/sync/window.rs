use crate::components::graph::models::{DateTimeTimeZone, Event};
use crate::error::{other_error, SyncResult};
use chrono::{DateTime, Duration, Months, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Months looked back from now
pub const MONTHS_BACK: u32 = 1;
/// Months looked ahead from now
pub const MONTHS_AHEAD: u32 = 6;

/// The rolling range `[now - 1 month, now + 6 months)` a run works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SyncWindow {
    /// Window around the current time, month arithmetic done in `tz`
    pub fn current(tz: Tz) -> SyncResult<Self> {
        Self::around(Utc::now().with_timezone(&tz))
    }

    /// Window around a given instant.
    ///
    /// Months are added to the wall-clock time in `now`'s zone. A shifted
    /// time that is ambiguous takes the earlier instant, one that falls in a
    /// DST gap moves forward until it exists.
    pub fn around<T: TimeZone>(now: DateTime<T>) -> SyncResult<Self> {
        let tz = now.timezone();
        let local = now.naive_local();

        let start = local
            .checked_sub_months(Months::new(MONTHS_BACK))
            .and_then(|shifted| resolve_local(&tz, shifted))
            .ok_or_else(|| other_error("Window start is out of range"))?;
        let end = local
            .checked_add_months(Months::new(MONTHS_AHEAD))
            .and_then(|shifted| resolve_local(&tz, shifted))
            .ok_or_else(|| other_error("Window end is out of range"))?;

        Ok(Self { start, end })
    }

    /// Graph query format, e.g. `2026-09-16T08:30:00.000Z`
    pub fn start_param(&self) -> String {
        format_graph_datetime(&self.start)
    }

    pub fn end_param(&self) -> String {
        format_graph_datetime(&self.end)
    }

    /// True when `[start, end]` lies inside the window
    pub fn contains_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start <= start && end <= self.end
    }

    /// True when the event's start and end both lie inside the window.
    ///
    /// Event times are expected in UTC, which is what the Graph client asks
    /// for on every calendar read.
    pub fn contains_event(&self, event: &Event) -> bool {
        match (
            event.start.as_ref().and_then(DateTimeTimeZone::as_utc),
            event.end.as_ref().and_then(DateTimeTimeZone::as_utc),
        ) {
            (Some(start), Some(end)) => self.contains_range(start, end),
            _ => false,
        }
    }
}

/// Map a wall-clock time in `tz` to UTC, skipping past DST gaps
fn resolve_local<T: TimeZone>(tz: &T, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    // No zone has a gap longer than a few hours
    (0..=3).find_map(|hours| {
        let candidate = local.checked_add_signed(Duration::hours(hours))?;
        tz.from_local_datetime(&candidate)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

pub fn format_graph_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse Graph's `dateTime` strings (`2026-10-16T00:00:00.0000000`)
pub fn parse_graph_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
