//! Attendance window policy and session status classifier.
//!
//! Pure predicates over state the caller has already fetched. The current
//! campus-local time is always passed in explicitly (see `util::clock`), so
//! every rule here is deterministic and unit-testable.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use strum::Display;

/// Marking opens this many minutes before the scheduled start.
pub const EARLY_MARK_MINUTES: i64 = 5;
/// Marking closes this many minutes after the scheduled start.
pub const LATE_MARK_MINUTES: i64 = 15;
/// Editing is permitted up to this many days after the session date.
pub const EDIT_HORIZON_DAYS: i64 = 2;

/// Lock state of the attendance group for one (course, date).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    /// No group has been created yet.
    NoGroup,
    /// A group exists and its lock flag is set.
    Locked,
    /// A group exists and an admin has cleared its lock flag.
    Unlocked,
}

/// What the unlock-request workflow currently says about one (course, date).
///
/// Duplicate requests are allowed, so only "any approved" and "any pending"
/// are observable facts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnlockSignals {
    pub any_approved: bool,
    pub any_pending: bool,
}

/// Display-facing status of a scheduled class on a teacher's day view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Display)]
pub enum SessionStatus {
    Upcoming,
    Ongoing,
    Expired,
    NotAllowed,
    Pending,
    Unlocked,
}

/// Whole days elapsed from the session date to today. Negative for future
/// dates.
pub fn days_since_session(session_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - session_date).num_days()
}

/// True while `now` is inside `[start - 5min, start + 15min]`, inclusive on
/// both ends. Wraps across midnight the same way the schedule data does.
pub fn within_mark_window(start: NaiveTime, now: NaiveTime) -> bool {
    let window_start = start.overflowing_sub_signed(Duration::minutes(EARLY_MARK_MINUTES)).0;
    let window_end = start.overflowing_add_signed(Duration::minutes(LATE_MARK_MINUTES)).0;
    now >= window_start && now <= window_end
}

/// Whether a fresh mark is permitted right now.
///
/// Only today's session is markable. A course without a configured start time
/// is treated as markable all day (no-schedule fallback); callers opting out
/// of that fallback must filter such courses before asking.
pub fn can_mark(start_time: Option<NaiveTime>, session_date: NaiveDate, now: NaiveDateTime) -> bool {
    if session_date != now.date() {
        return false;
    }
    match start_time {
        Some(start) => within_mark_window(start, now.time()),
        None => true,
    }
}

/// Whether an edit of the (course, date) group is permitted right now.
///
/// The 2-day outer horizon binds everything, including approved unlocks.
/// Inside the live mark window, marking and editing overlap. Past that, the
/// two unlock signals are consulted independently: with no group yet, an
/// approved request pre-authorizes creating it; with a group present, only
/// its own cleared lock flag opens it.
pub fn can_edit(
    start_time: Option<NaiveTime>,
    session_date: NaiveDate,
    now: NaiveDateTime,
    lock: LockState,
    unlock: UnlockSignals,
) -> bool {
    let days = days_since_session(session_date, now.date());
    if days < 0 || days > EDIT_HORIZON_DAYS {
        return false;
    }
    if can_mark(start_time, session_date, now) {
        return true;
    }
    match lock {
        LockState::NoGroup => unlock.any_approved,
        LockState::Locked => false,
        LockState::Unlocked => true,
    }
}

/// Derives the display status for one scheduled class.
///
/// Priority order is load-bearing: an approved unlock overrides any time
/// state, and a pending request suppresses the Expired/NotAllowed branches so
/// the UI shows "wait" instead of "request again".
pub fn classify(
    start_time: Option<NaiveTime>,
    session_date: NaiveDate,
    now: NaiveDateTime,
    lock: LockState,
    unlock: UnlockSignals,
) -> SessionStatus {
    if lock == LockState::Unlocked || unlock.any_approved {
        return SessionStatus::Unlocked;
    }
    if unlock.any_pending {
        return SessionStatus::Pending;
    }

    let today = now.date();
    if session_date > today {
        return SessionStatus::Upcoming;
    }

    if session_date == today {
        match start_time {
            // No-schedule fallback: markable all day, so show it as live.
            None => return SessionStatus::Ongoing,
            Some(start) => {
                let early = start.overflowing_sub_signed(Duration::minutes(EARLY_MARK_MINUTES)).0;
                let late = start.overflowing_add_signed(Duration::minutes(LATE_MARK_MINUTES)).0;
                let now_t = now.time();
                if now_t < early {
                    return SessionStatus::Upcoming;
                }
                // The [start-5min, start) slice deliberately falls through to
                // the expired branch, matching the marking UI's behavior.
                if now_t >= start && now_t <= late {
                    return SessionStatus::Ongoing;
                }
            }
        }
    }

    if days_since_session(session_date, today) > EDIT_HORIZON_DAYS {
        SessionStatus::NotAllowed
    } else {
        SessionStatus::Expired
    }
}
