use crate::storage::schema::{
    chore_assignments, chore_submissions, chores, completed_tasks, families, users,
};
use chorewheel_shared::domain::{
    AssignmentStatus, ChoreStatus, ParseEnumError, RewardKind, SubmissionStatus,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = families)]
pub struct Family {
    pub id: i32,
    pub name: String,
    pub last_assigned_child_index: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = families)]
pub struct NewFamily<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = users)]
#[diesel(belongs_to(Family, foreign_key = family_id))]
pub struct User {
    pub id: i32,
    pub family_id: i32,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub money_balance: i32,
    pub screen_time_balance: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub family_id: i32,
    pub username: &'a str,
    pub display_name: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = chores)]
#[diesel(belongs_to(Family, foreign_key = family_id))]
pub struct Chore {
    pub id: i32,
    pub family_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub reward_kind: String,
    pub original_reward: i32,
    pub current_reward: i32,
    pub requires_photo: bool,
    pub status: String,
    pub current_assignee: Option<i32>,
    pub first_assignee_id: Option<i32>,
    pub assignment_start_time: Option<NaiveDateTime>,
    pub completion_start_time: Option<NaiveDateTime>,
    pub acceptance_timer: i32,
    pub completion_timer_enabled: bool,
    pub completion_timer_duration: i32,
    pub completion_timer_penalty: i32,
    pub reduction_enabled: bool,
    pub reduction_amount: i32,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
}

impl Chore {
    /// Status as the closed enum; unknown text in the store is an error, not
    /// a silent fallthrough.
    pub fn status(&self) -> Result<ChoreStatus, ParseEnumError> {
        self.status.parse()
    }

    pub fn reward_kind(&self) -> Result<RewardKind, ParseEnumError> {
        self.reward_kind.parse()
    }
}

#[derive(Insertable)]
#[diesel(table_name = chores)]
pub struct NewChore<'a> {
    pub family_id: i32,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub reward_kind: &'a str,
    pub original_reward: i32,
    pub current_reward: i32,
    pub requires_photo: bool,
    pub status: &'a str,
    pub acceptance_timer: i32,
    pub completion_timer_enabled: bool,
    pub completion_timer_duration: i32,
    pub completion_timer_penalty: i32,
    pub reduction_enabled: bool,
    pub reduction_amount: i32,
    pub created_by: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = chore_assignments)]
#[diesel(belongs_to(Chore, foreign_key = chore_id))]
pub struct Assignment {
    pub id: i32,
    pub chore_id: i32,
    pub user_id: i32,
    pub status: String,
    pub assigned_at: NaiveDateTime,
    pub responded_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

impl Assignment {
    pub fn status(&self) -> Result<AssignmentStatus, ParseEnumError> {
        self.status.parse()
    }
}

#[derive(Insertable)]
#[diesel(table_name = chore_assignments)]
pub struct NewAssignment<'a> {
    pub chore_id: i32,
    pub user_id: i32,
    pub status: &'a str,
    pub assigned_at: NaiveDateTime,
    pub responded_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = chore_submissions)]
#[diesel(belongs_to(Chore, foreign_key = chore_id))]
pub struct Submission {
    pub id: i32,
    pub chore_id: i32,
    pub user_id: i32,
    pub assignment_id: i32,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub submitted_at: NaiveDateTime,
    pub reviewed_by: Option<i32>,
    pub reviewed_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
}

impl Submission {
    pub fn status(&self) -> Result<SubmissionStatus, ParseEnumError> {
        self.status.parse()
    }
}

#[derive(Insertable)]
#[diesel(table_name = chore_submissions)]
pub struct NewSubmission<'a> {
    pub chore_id: i32,
    pub user_id: i32,
    pub assignment_id: i32,
    pub photo_url: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub status: &'a str,
    pub submitted_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = completed_tasks)]
#[diesel(belongs_to(Chore, foreign_key = chore_id))]
pub struct CompletedTask {
    pub id: i32,
    pub chore_id: i32,
    pub user_id: i32,
    pub assignment_id: i32,
    pub submission_id: i32,
    pub reward_kind: String,
    pub reward_earned: i32,
    pub approved_by: i32,
    pub completed_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = completed_tasks)]
pub struct NewCompletedTask<'a> {
    pub chore_id: i32,
    pub user_id: i32,
    pub assignment_id: i32,
    pub submission_id: i32,
    pub reward_kind: &'a str,
    pub reward_earned: i32,
    pub approved_by: i32,
    pub completed_at: NaiveDateTime,
}
