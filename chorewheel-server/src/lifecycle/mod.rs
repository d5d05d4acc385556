//! Chore lifecycle engine.
//!
//! Owns every mutation of chore status, assignee, reward, and timer fields.
//! Each operation runs inside a single `immediate_transaction`: the chore
//! row is re-read under the SQLite write lock before any mutation, so a
//! status that no longer matches the operation's precondition fails cleanly
//! instead of clobbering a concurrent transition. Busy/locked and
//! unique-constraint failures surface as [`LifecycleError::Conflict`], which
//! callers may retry immediately.

pub mod reward;
pub mod rotation;
pub mod timer;

use std::collections::HashSet;

use chorewheel_shared::domain::{AssignmentStatus, ChoreStatus, ParseEnumError, SubmissionStatus};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;

use crate::storage::models::{
    Assignment, Chore, CompletedTask, Family, NewAssignment, NewCompletedTask, NewSubmission,
    Submission,
};
use crate::storage::schema::{chore_assignments, chore_submissions, chores, completed_tasks,
    families, users};
use crate::storage::{Store, StorageError, configure_sqlite_conn};

/// Typed outcome of every lifecycle operation. Expected business conditions
/// are variants, never panics or opaque strings.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Entity absent, or the caller has no scope over it.
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// The chore or submission is not in the state the operation requires.
    /// Not retryable: the transition has already happened or never applied.
    #[error("precondition failed: {0}")]
    PreconditionFailed(&'static str),

    /// A concurrent mutation was detected at commit time. Safe to retry.
    #[error("conflict: chore was modified concurrently")]
    Conflict,

    /// Malformed input, e.g. a missing required photo.
    #[error("validation failed: {0}")]
    Validation(&'static str),

    /// The family has no active children to offer the chore to.
    #[error("no eligible assignee in family")]
    NoEligibleAssignee,

    /// The store itself failed; callers retry with backoff.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),
}

impl From<diesel::result::Error> for LifecycleError {
    fn from(e: diesel::result::Error) -> Self {
        match &e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                // A concurrent writer beat us to the single-pending slot.
                LifecycleError::Conflict
            }
            diesel::result::Error::DatabaseError(_, info)
                if info.message().contains("database is locked")
                    || info.message().contains("database table is locked") =>
            {
                LifecycleError::Conflict
            }
            _ => LifecycleError::StoreUnavailable(StorageError::Database(e)),
        }
    }
}

impl From<ParseEnumError> for LifecycleError {
    fn from(e: ParseEnumError) -> Self {
        LifecycleError::StoreUnavailable(StorageError::Decode(e))
    }
}

/// Completion attempt as supplied by the assignee. The photo reference comes
/// from the photo-storage collaborator and is recorded verbatim.
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub notes: Option<String>,
    pub photo_url: Option<String>,
}

/// What one reconciliation pass did.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepOutcome {
    pub acceptances_expired: usize,
    pub penalties_applied: usize,
}

impl SweepOutcome {
    pub fn is_empty(&self) -> bool {
        self.acceptances_expired == 0 && self.penalties_applied == 0
    }
}

#[derive(Clone)]
pub struct Engine {
    store: Store,
}

impl Engine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Offers an available chore to the next child in the family rotation.
    pub async fn assign(&self, family_id: i32, chore_id: i32) -> Result<Chore, LifecycleError> {
        self.run_tx(move |conn| assign_tx(conn, family_id, chore_id, Utc::now().naive_utc()))
            .await
    }

    /// The offered child takes the chore; the completion timer starts if the
    /// chore has one.
    pub async fn accept(
        &self,
        family_id: i32,
        chore_id: i32,
        actor: i32,
    ) -> Result<Chore, LifecycleError> {
        self.run_tx(move |conn| accept_tx(conn, family_id, chore_id, actor, Utc::now().naive_utc()))
            .await
    }

    /// The offered child passes; the chore is re-offered to the next child
    /// not yet asked this cycle, or auto-accepted back to the first offeree
    /// with the reward reduction applied once the cycle is exhausted.
    pub async fn decline(
        &self,
        family_id: i32,
        chore_id: i32,
        actor: i32,
    ) -> Result<Chore, LifecycleError> {
        self.run_tx(move |conn| {
            decline_tx(conn, family_id, chore_id, actor, Utc::now().naive_utc())
        })
        .await
    }

    /// The assignee hands in completed work for review.
    pub async fn submit(
        &self,
        family_id: i32,
        chore_id: i32,
        actor: i32,
        req: SubmitRequest,
    ) -> Result<Submission, LifecycleError> {
        self.run_tx(move |conn| {
            submit_tx(conn, family_id, chore_id, actor, &req, Utc::now().naive_utc())
        })
        .await
    }

    /// Pays out the reward. One atomic transaction covers the submission,
    /// the ledger entry, the balance credit, the assignment, and the chore
    /// reset; partial payment is never observable.
    pub async fn approve(
        &self,
        family_id: i32,
        chore_id: i32,
        submission_id: i32,
        approver: i32,
    ) -> Result<CompletedTask, LifecycleError> {
        self.run_tx(move |conn| {
            approve_tx(
                conn,
                family_id,
                chore_id,
                submission_id,
                approver,
                Utc::now().naive_utc(),
            )
        })
        .await
    }

    /// Sends the submission back; the assignee keeps the chore and may
    /// resubmit. No reward is touched.
    pub async fn reject(
        &self,
        family_id: i32,
        chore_id: i32,
        submission_id: i32,
        approver: i32,
        reason: String,
    ) -> Result<Submission, LifecycleError> {
        self.run_tx(move |conn| {
            reject_tx(
                conn,
                family_id,
                chore_id,
                submission_id,
                approver,
                &reason,
                Utc::now().naive_utc(),
            )
        })
        .await
    }

    /// One reconciliation pass over elapsed timers: declines expired
    /// acceptance windows on the assignee's behalf and applies the
    /// completion penalty where its window has run out. The candidate scan
    /// is a plain read; every consequence re-verifies the chore under its
    /// own transaction, so a chore that moved on since the scan is skipped.
    pub async fn sweep_timers(&self) -> Result<SweepOutcome, LifecycleError> {
        let now = Utc::now().naive_utc();

        let candidates = self
            .run_read(move |conn| scan_expired(conn, now))
            .await?;

        let mut outcome = SweepOutcome::default();
        for chore_id in candidates.expired_acceptance {
            if self
                .run_tx(move |conn| expire_acceptance_tx(conn, chore_id, now))
                .await?
            {
                outcome.acceptances_expired += 1;
            }
        }
        for chore_id in candidates.expired_completion {
            if self
                .run_tx(move |conn| apply_completion_penalty_tx(conn, chore_id, now))
                .await?
            {
                outcome.penalties_applied += 1;
            }
        }
        Ok(outcome)
    }

    async fn run_tx<T, F>(&self, f: F) -> Result<T, LifecycleError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, LifecycleError> + Send + 'static,
    {
        let pool = self.store.pool();
        tokio::task::spawn_blocking(move || -> Result<T, LifecycleError> {
            let mut conn = pool
                .get()
                .map_err(|e| LifecycleError::StoreUnavailable(StorageError::Pool(e)))?;
            configure_sqlite_conn(&mut conn)?;
            conn.immediate_transaction(f)
        })
        .await
        .map_err(|e| LifecycleError::StoreUnavailable(StorageError::Task(e)))?
    }

    async fn run_read<T, F>(&self, f: F) -> Result<T, LifecycleError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, LifecycleError> + Send + 'static,
    {
        let pool = self.store.pool();
        tokio::task::spawn_blocking(move || -> Result<T, LifecycleError> {
            let mut conn = pool
                .get()
                .map_err(|e| LifecycleError::StoreUnavailable(StorageError::Pool(e)))?;
            configure_sqlite_conn(&mut conn)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| LifecycleError::StoreUnavailable(StorageError::Task(e)))?
    }
}

fn assign_tx(
    conn: &mut SqliteConnection,
    family_id: i32,
    chore_id: i32,
    now: NaiveDateTime,
) -> Result<Chore, LifecycleError> {
    let chore = load_chore(conn, family_id, chore_id)?;
    if chore.status()? != ChoreStatus::Available {
        return Err(LifecycleError::PreconditionFailed(
            "chore is not available for assignment",
        ));
    }

    let children = active_children_ids(conn, family_id)?;
    if children.is_empty() {
        return Err(LifecycleError::NoEligibleAssignee);
    }

    let family: Family = families::table.find(family_id).first(conn)?;
    let idx = rotation::next_round_robin(family.last_assigned_child_index, children.len());
    let child_id = children[idx];

    diesel::update(chores::table.find(chore_id))
        .set((
            chores::current_assignee.eq(Some(child_id)),
            chores::first_assignee_id.eq(Some(child_id)),
            chores::assignment_start_time.eq(Some(now)),
            chores::completion_start_time.eq(None::<NaiveDateTime>),
            chores::status.eq(ChoreStatus::PendingAcceptance.as_str()),
            chores::current_reward.eq(chore.original_reward),
        ))
        .execute(conn)?;

    // The rotation cursor moves in the same transaction as the assignment it
    // accompanies; two concurrent assigns can never pick the same "next".
    diesel::update(families::table.find(family_id))
        .set(families::last_assigned_child_index.eq(idx as i32))
        .execute(conn)?;

    insert_assignment(conn, chore_id, child_id, AssignmentStatus::Pending, now, None)?;

    reload_chore(conn, chore_id)
}

fn accept_tx(
    conn: &mut SqliteConnection,
    family_id: i32,
    chore_id: i32,
    actor: i32,
    now: NaiveDateTime,
) -> Result<Chore, LifecycleError> {
    let chore = load_chore(conn, family_id, chore_id)?;
    offeree_guard(&chore, actor)?;

    diesel::update(chores::table.find(chore_id))
        .set((
            chores::status.eq(ChoreStatus::Assigned.as_str()),
            chores::assignment_start_time.eq(None::<NaiveDateTime>),
            chores::completion_start_time.eq(chore.completion_timer_enabled.then_some(now)),
        ))
        .execute(conn)?;

    respond_to_pending_assignment(conn, chore_id, actor, AssignmentStatus::Accepted, now)?;

    reload_chore(conn, chore_id)
}

fn decline_tx(
    conn: &mut SqliteConnection,
    family_id: i32,
    chore_id: i32,
    actor: i32,
    now: NaiveDateTime,
) -> Result<Chore, LifecycleError> {
    let chore = load_chore(conn, family_id, chore_id)?;
    offeree_guard(&chore, actor)?;

    respond_to_pending_assignment(conn, chore_id, actor, AssignmentStatus::Declined, now)?;

    reassign_tx(conn, &chore, now)
}

/// Re-offers a chore after a decline. A single bounded step, not recursion:
/// either one child remains unoffered this cycle, or the cycle is exhausted
/// and the chore auto-accepts back to the first offeree with the reward
/// reduction applied.
fn reassign_tx(
    conn: &mut SqliteConnection,
    chore: &Chore,
    now: NaiveDateTime,
) -> Result<Chore, LifecycleError> {
    // Offers from finished cycles don't count: every cycle ends by marking
    // its assignment `completed`, so the current cycle is exactly the rows
    // newer than the last completed one.
    let cycle_floor: Option<i32> = chore_assignments::table
        .filter(chore_assignments::chore_id.eq(chore.id))
        .filter(chore_assignments::status.eq(AssignmentStatus::Completed.as_str()))
        .select(diesel::dsl::max(chore_assignments::id))
        .first::<Option<i32>>(conn)?;

    let mut offered_query = chore_assignments::table
        .filter(chore_assignments::chore_id.eq(chore.id))
        .filter(chore_assignments::status.eq_any([
            AssignmentStatus::Pending.as_str(),
            AssignmentStatus::Accepted.as_str(),
            AssignmentStatus::Declined.as_str(),
        ]))
        .select(chore_assignments::user_id)
        .into_boxed();
    if let Some(floor) = cycle_floor {
        offered_query = offered_query.filter(chore_assignments::id.gt(floor));
    }
    let offered: HashSet<i32> = offered_query.load::<i32>(conn)?.into_iter().collect();

    let children = active_children_ids(conn, chore.family_id)?;

    match rotation::next_unoffered(&children, &offered) {
        Some(next_child) => {
            diesel::update(chores::table.find(chore.id))
                .set((
                    chores::current_assignee.eq(Some(next_child)),
                    chores::assignment_start_time.eq(Some(now)),
                    chores::status.eq(ChoreStatus::PendingAcceptance.as_str()),
                ))
                .execute(conn)?;
            insert_assignment(
                conn,
                chore.id,
                next_child,
                AssignmentStatus::Pending,
                now,
                None,
            )?;
        }
        None => {
            let first = chore.first_assignee_id.ok_or(LifecycleError::PreconditionFailed(
                "rotation cycle has no first assignee",
            ))?;
            let new_reward = if chore.reduction_enabled {
                reward::apply_reduction(
                    chore.current_reward,
                    chore.original_reward,
                    chore.reduction_amount,
                )
            } else {
                chore.current_reward
            };
            diesel::update(chores::table.find(chore.id))
                .set((
                    chores::current_assignee.eq(Some(first)),
                    chores::assignment_start_time.eq(None::<NaiveDateTime>),
                    chores::status.eq(ChoreStatus::AutoAccepted.as_str()),
                    chores::current_reward.eq(new_reward),
                    chores::completion_start_time
                        .eq(chore.completion_timer_enabled.then_some(now)),
                ))
                .execute(conn)?;
            insert_assignment(
                conn,
                chore.id,
                first,
                AssignmentStatus::Accepted,
                now,
                Some(now),
            )?;
        }
    }

    reload_chore(conn, chore.id)
}

fn submit_tx(
    conn: &mut SqliteConnection,
    family_id: i32,
    chore_id: i32,
    actor: i32,
    req: &SubmitRequest,
    now: NaiveDateTime,
) -> Result<Submission, LifecycleError> {
    let chore = load_chore(conn, family_id, chore_id)?;
    if chore.current_assignee != Some(actor) {
        return Err(LifecycleError::NotFound("no assigned chore for this user"));
    }
    if !chore.status()?.accepts_submission() {
        return Err(LifecycleError::PreconditionFailed(
            "chore is not in a submittable state",
        ));
    }
    if chore.requires_photo && req.photo_url.as_deref().is_none_or(str::is_empty) {
        return Err(LifecycleError::Validation("a photo is required for this chore"));
    }

    let assignment: Option<Assignment> = chore_assignments::table
        .filter(chore_assignments::chore_id.eq(chore_id))
        .filter(chore_assignments::user_id.eq(actor))
        .filter(chore_assignments::status.eq(AssignmentStatus::Accepted.as_str()))
        .order((
            chore_assignments::assigned_at.desc(),
            chore_assignments::id.desc(),
        ))
        .first::<Assignment>(conn)
        .optional()?;
    let Some(assignment) = assignment else {
        return Err(LifecycleError::PreconditionFailed(
            "no active assignment for this chore",
        ));
    };

    // One pending submission per chore; the partial unique index backs this
    // same rule at the store level.
    let pending: i64 = chore_submissions::table
        .filter(chore_submissions::chore_id.eq(chore_id))
        .filter(chore_submissions::status.eq(SubmissionStatus::Pending.as_str()))
        .count()
        .get_result(conn)?;
    if pending > 0 {
        return Err(LifecycleError::PreconditionFailed(
            "a submission is already awaiting review",
        ));
    }

    let submission: Submission = diesel::insert_into(chore_submissions::table)
        .values(&NewSubmission {
            chore_id,
            user_id: actor,
            assignment_id: assignment.id,
            photo_url: req.photo_url.as_deref(),
            notes: req.notes.as_deref(),
            status: SubmissionStatus::Pending.as_str(),
            submitted_at: now,
        })
        .get_result(conn)?;

    diesel::update(chores::table.find(chore_id))
        .set((
            chores::status.eq(ChoreStatus::PendingApproval.as_str()),
            chores::completion_start_time.eq(None::<NaiveDateTime>),
        ))
        .execute(conn)?;

    Ok(submission)
}

fn approve_tx(
    conn: &mut SqliteConnection,
    family_id: i32,
    chore_id: i32,
    submission_id: i32,
    approver: i32,
    now: NaiveDateTime,
) -> Result<CompletedTask, LifecycleError> {
    let chore = load_chore(conn, family_id, chore_id)?;
    let submission = load_submission(conn, chore_id, submission_id)?;
    if submission.status()? != SubmissionStatus::Pending {
        return Err(LifecycleError::PreconditionFailed(
            "submission is not pending review",
        ));
    }
    if chore.status()? != ChoreStatus::PendingApproval {
        return Err(LifecycleError::PreconditionFailed(
            "chore is not awaiting approval",
        ));
    }

    diesel::update(chore_submissions::table.find(submission_id))
        .set((
            chore_submissions::status.eq(SubmissionStatus::Approved.as_str()),
            chore_submissions::reviewed_by.eq(Some(approver)),
            chore_submissions::reviewed_at.eq(Some(now)),
        ))
        .execute(conn)?;

    // reward_earned freezes current_reward; the ledger row is never recomputed
    let ledger: CompletedTask = diesel::insert_into(completed_tasks::table)
        .values(&NewCompletedTask {
            chore_id,
            user_id: submission.user_id,
            assignment_id: submission.assignment_id,
            submission_id,
            reward_kind: &chore.reward_kind,
            reward_earned: chore.current_reward,
            approved_by: approver,
            completed_at: now,
        })
        .get_result(conn)?;

    diesel::update(chore_assignments::table.find(submission.assignment_id))
        .set((
            chore_assignments::status.eq(AssignmentStatus::Completed.as_str()),
            chore_assignments::completed_at.eq(Some(now)),
        ))
        .execute(conn)?;

    match chore.reward_kind()? {
        chorewheel_shared::domain::RewardKind::Money => {
            diesel::update(users::table.find(submission.user_id))
                .set(users::money_balance.eq(users::money_balance + chore.current_reward))
                .execute(conn)?;
        }
        chorewheel_shared::domain::RewardKind::ScreenTime => {
            diesel::update(users::table.find(submission.user_id))
                .set(
                    users::screen_time_balance
                        .eq(users::screen_time_balance + chore.current_reward),
                )
                .execute(conn)?;
        }
    }

    // Back to available; the next assign starts a fresh rotation cycle.
    diesel::update(chores::table.find(chore_id))
        .set((
            chores::status.eq(ChoreStatus::Available.as_str()),
            chores::current_assignee.eq(None::<i32>),
            chores::first_assignee_id.eq(None::<i32>),
            chores::assignment_start_time.eq(None::<NaiveDateTime>),
            chores::completion_start_time.eq(None::<NaiveDateTime>),
        ))
        .execute(conn)?;

    Ok(ledger)
}

fn reject_tx(
    conn: &mut SqliteConnection,
    family_id: i32,
    chore_id: i32,
    submission_id: i32,
    approver: i32,
    reason: &str,
    now: NaiveDateTime,
) -> Result<Submission, LifecycleError> {
    if reason.trim().is_empty() {
        return Err(LifecycleError::Validation("rejection reason is required"));
    }

    let chore = load_chore(conn, family_id, chore_id)?;
    let submission = load_submission(conn, chore_id, submission_id)?;
    if submission.status()? != SubmissionStatus::Pending {
        return Err(LifecycleError::PreconditionFailed(
            "submission is not pending review",
        ));
    }
    if chore.status()? != ChoreStatus::PendingApproval {
        return Err(LifecycleError::PreconditionFailed(
            "chore is not awaiting approval",
        ));
    }

    let rejected: Submission = diesel::update(chore_submissions::table.find(submission_id))
        .set((
            chore_submissions::status.eq(SubmissionStatus::Rejected.as_str()),
            chore_submissions::reviewed_by.eq(Some(approver)),
            chore_submissions::reviewed_at.eq(Some(now)),
            chore_submissions::rejection_reason.eq(Some(reason)),
        ))
        .get_result(conn)?;

    // Assignee keeps the chore and may resubmit.
    diesel::update(chores::table.find(chore_id))
        .set(chores::status.eq(ChoreStatus::Assigned.as_str()))
        .execute(conn)?;

    Ok(rejected)
}

struct ExpiredCandidates {
    expired_acceptance: Vec<i32>,
    expired_completion: Vec<i32>,
}

fn scan_expired(
    conn: &mut SqliteConnection,
    now: NaiveDateTime,
) -> Result<ExpiredCandidates, LifecycleError> {
    let pending: Vec<Chore> = chores::table
        .filter(chores::status.eq(ChoreStatus::PendingAcceptance.as_str()))
        .filter(chores::assignment_start_time.is_not_null())
        .load::<Chore>(conn)?;
    let expired_acceptance = pending
        .iter()
        .filter(|c| {
            timer::chore_acceptance_deadline(c).is_some_and(|d| timer::expired(d, now))
        })
        .map(|c| c.id)
        .collect();

    let running: Vec<Chore> = chores::table
        .filter(chores::status.eq_any([
            ChoreStatus::Assigned.as_str(),
            ChoreStatus::AutoAccepted.as_str(),
        ]))
        .filter(chores::completion_timer_enabled.eq(true))
        .filter(chores::completion_start_time.is_not_null())
        .load::<Chore>(conn)?;
    let expired_completion = running
        .iter()
        .filter(|c| {
            timer::chore_completion_deadline(c).is_some_and(|d| timer::expired(d, now))
        })
        .map(|c| c.id)
        .collect();

    Ok(ExpiredCandidates {
        expired_acceptance,
        expired_completion,
    })
}

/// Declines an expired acceptance window on the assignee's behalf. Returns
/// false when the chore moved on between the scan and this transaction.
fn expire_acceptance_tx(
    conn: &mut SqliteConnection,
    chore_id: i32,
    now: NaiveDateTime,
) -> Result<bool, LifecycleError> {
    let chore: Option<Chore> = chores::table.find(chore_id).first(conn).optional()?;
    let Some(chore) = chore else {
        return Ok(false);
    };
    if chore.status()? != ChoreStatus::PendingAcceptance {
        return Ok(false);
    }
    let Some(deadline) = timer::chore_acceptance_deadline(&chore) else {
        return Ok(false);
    };
    if !timer::expired(deadline, now) {
        return Ok(false);
    }
    let Some(assignee) = chore.current_assignee else {
        return Ok(false);
    };

    let updated = diesel::update(
        chore_assignments::table
            .filter(chore_assignments::chore_id.eq(chore_id))
            .filter(chore_assignments::user_id.eq(assignee))
            .filter(chore_assignments::status.eq(AssignmentStatus::Pending.as_str())),
    )
    .set((
        chore_assignments::status.eq(AssignmentStatus::Declined.as_str()),
        chore_assignments::responded_at.eq(Some(now)),
    ))
    .execute(conn)?;
    if updated == 0 {
        return Ok(false);
    }

    reassign_tx(conn, &chore, now)?;
    Ok(true)
}

/// Applies the completion penalty once; clearing `completion_start_time`
/// stops the window from firing again.
fn apply_completion_penalty_tx(
    conn: &mut SqliteConnection,
    chore_id: i32,
    now: NaiveDateTime,
) -> Result<bool, LifecycleError> {
    let chore: Option<Chore> = chores::table.find(chore_id).first(conn).optional()?;
    let Some(chore) = chore else {
        return Ok(false);
    };
    if !chore.status()?.accepts_submission() {
        return Ok(false);
    }
    let Some(deadline) = timer::chore_completion_deadline(&chore) else {
        return Ok(false);
    };
    if !timer::expired(deadline, now) {
        return Ok(false);
    }

    let new_reward = reward::apply_reduction(
        chore.current_reward,
        chore.original_reward,
        chore.completion_timer_penalty,
    );
    diesel::update(chores::table.find(chore_id))
        .set((
            chores::current_reward.eq(new_reward),
            chores::completion_start_time.eq(None::<NaiveDateTime>),
        ))
        .execute(conn)?;
    Ok(true)
}

fn load_chore(
    conn: &mut SqliteConnection,
    family_id: i32,
    chore_id: i32,
) -> Result<Chore, LifecycleError> {
    chores::table
        .filter(chores::id.eq(chore_id))
        .filter(chores::family_id.eq(family_id))
        .first::<Chore>(conn)
        .optional()?
        .ok_or(LifecycleError::NotFound("chore not found"))
}

fn reload_chore(conn: &mut SqliteConnection, chore_id: i32) -> Result<Chore, LifecycleError> {
    Ok(chores::table.find(chore_id).first::<Chore>(conn)?)
}

fn load_submission(
    conn: &mut SqliteConnection,
    chore_id: i32,
    submission_id: i32,
) -> Result<Submission, LifecycleError> {
    chore_submissions::table
        .filter(chore_submissions::id.eq(submission_id))
        .filter(chore_submissions::chore_id.eq(chore_id))
        .first::<Submission>(conn)
        .optional()?
        .ok_or(LifecycleError::NotFound("submission not found"))
}

/// Accept/decline require the caller to be the currently offered child and
/// the chore to still be awaiting a response.
fn offeree_guard(chore: &Chore, actor: i32) -> Result<(), LifecycleError> {
    if chore.current_assignee != Some(actor) {
        return Err(LifecycleError::NotFound(
            "no pending chore assignment for this user",
        ));
    }
    if chore.status()? != ChoreStatus::PendingAcceptance {
        return Err(LifecycleError::PreconditionFailed(
            "chore is not awaiting acceptance",
        ));
    }
    Ok(())
}

fn active_children_ids(
    conn: &mut SqliteConnection,
    family_id: i32,
) -> Result<Vec<i32>, LifecycleError> {
    Ok(users::table
        .filter(users::family_id.eq(family_id))
        .filter(users::role.eq(chorewheel_shared::auth::Role::Child.as_str()))
        .filter(users::is_active.eq(true))
        .order(users::id.asc())
        .select(users::id)
        .load::<i32>(conn)?)
}

fn insert_assignment(
    conn: &mut SqliteConnection,
    chore_id: i32,
    user_id: i32,
    status: AssignmentStatus,
    assigned_at: NaiveDateTime,
    responded_at: Option<NaiveDateTime>,
) -> Result<Assignment, LifecycleError> {
    Ok(diesel::insert_into(chore_assignments::table)
        .values(&NewAssignment {
            chore_id,
            user_id,
            status: status.as_str(),
            assigned_at,
            responded_at,
        })
        .get_result(conn)?)
}

fn respond_to_pending_assignment(
    conn: &mut SqliteConnection,
    chore_id: i32,
    actor: i32,
    status: AssignmentStatus,
    now: NaiveDateTime,
) -> Result<(), LifecycleError> {
    let updated = diesel::update(
        chore_assignments::table
            .filter(chore_assignments::chore_id.eq(chore_id))
            .filter(chore_assignments::user_id.eq(actor))
            .filter(chore_assignments::status.eq(AssignmentStatus::Pending.as_str())),
    )
    .set((
        chore_assignments::status.eq(status.as_str()),
        chore_assignments::responded_at.eq(Some(now)),
    ))
    .execute(conn)?;
    if updated == 0 {
        return Err(LifecycleError::PreconditionFailed(
            "no pending assignment row for this chore",
        ));
    }
    Ok(())
}
