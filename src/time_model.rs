//! Time Model: the wall-clock arithmetic shared by the Synthesizer and
//! the Program Guide Builder. Nothing here touches the filesystem or
//! the network — it's pure clock math so it can be exercised without
//! waiting on a real clock.

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, TimeZone, Utc};
use std::time::Instant;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Seconds elapsed between `epoch` and `now`, clamped to `>= 0.0` so a
/// clock that appears to run backward (a suspended process resuming, a
/// corrected system clock) never yields a negative offset.
pub fn offset_secs(epoch: Instant, now: Instant) -> f64 {
    now.checked_duration_since(epoch)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

const PROGRAMMING_DAY_BOUNDARY: (u32, u32, u32) = (3, 0, 0);

/// The most recent 03:00 local time at or before `now`.
pub fn previous_3am(now: DateTime<Local>) -> DateTime<Local> {
    let boundary_time = NaiveTime::from_hms_opt(
        PROGRAMMING_DAY_BOUNDARY.0,
        PROGRAMMING_DAY_BOUNDARY.1,
        PROGRAMMING_DAY_BOUNDARY.2,
    )
    .unwrap();
    let today_boundary = Local
        .from_local_datetime(&now.date_naive().and_time(boundary_time))
        .single()
        .unwrap_or_else(|| now);
    if today_boundary <= now {
        today_boundary
    } else {
        today_boundary - ChronoDuration::days(1)
    }
}

/// The soonest 03:00 local time strictly after `now`.
pub fn next_3am(now: DateTime<Local>) -> DateTime<Local> {
    previous_3am(now) + ChronoDuration::days(1)
}
