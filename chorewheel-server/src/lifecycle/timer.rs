//! Deadline arithmetic for acceptance and completion windows.
//!
//! Timers are plain columns on the chore row; this module is the only place
//! that turns them into deadlines. Enforcement happens in the reconciliation
//! sweep, presentation layers only read the exposed deadlines.

use chrono::{Duration, NaiveDateTime};

use crate::storage::models::Chore;

pub fn acceptance_deadline(assignment_start: NaiveDateTime, acceptance_timer: i32) -> NaiveDateTime {
    assignment_start + Duration::minutes(acceptance_timer as i64)
}

pub fn completion_deadline(completion_start: NaiveDateTime, duration: i32) -> NaiveDateTime {
    completion_start + Duration::minutes(duration as i64)
}

pub fn expired(deadline: NaiveDateTime, now: NaiveDateTime) -> bool {
    now >= deadline
}

/// Deadline for the open acceptance window, if one is running.
pub fn chore_acceptance_deadline(chore: &Chore) -> Option<NaiveDateTime> {
    chore
        .assignment_start_time
        .map(|start| acceptance_deadline(start, chore.acceptance_timer))
}

/// Deadline for the running completion timer, if the chore has one.
pub fn chore_completion_deadline(chore: &Chore) -> Option<NaiveDateTime> {
    if !chore.completion_timer_enabled {
        return None;
    }
    chore
        .completion_start_time
        .map(|start| completion_deadline(start, chore.completion_timer_duration))
}
