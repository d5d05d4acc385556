use serde::{Deserialize, Serialize};

use crate::domain::{ChoreStatus, RewardKind, SubmissionStatus};

pub mod endpoints;

pub const API_V1_PREFIX: &str = "/api/v1";

/// Every private route lives under the family scope; the ACL layer rejects
/// requests whose path family does not match the token's family.
pub fn family_scope(family_id: i32) -> String {
    format!("{}/family/{}", API_V1_PREFIX, family_id)
}

// Auth
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthReq {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResp {
    pub token: String,
}

// Children
#[derive(Debug, Serialize, Deserialize)]
pub struct ChildDto {
    pub id: i32,
    pub display_name: String,
}

// Chores
#[derive(Debug, Serialize, Deserialize)]
pub struct ChoreDto {
    pub id: i32,
    pub family_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub reward_kind: RewardKind,
    pub original_reward: i32,
    pub current_reward: i32,
    pub requires_photo: bool,
    pub status: ChoreStatus,
    pub current_assignee: Option<i32>,
    pub first_assignee_id: Option<i32>,
    pub acceptance_timer: i32,
    pub completion_timer_enabled: bool,
    pub completion_timer_duration: i32,
    pub completion_timer_penalty: i32,
    pub reduction_enabled: bool,
    pub reduction_amount: i32,
    pub created_by: i32,
    pub created_at: String, // RFC3339 UTC
    /// When a pending acceptance should be treated as expired. Computed by
    /// the core; presentation layers must not derive it themselves.
    pub acceptance_deadline: Option<String>, // RFC3339 UTC
    /// When the completion penalty applies. Computed by the core.
    pub completion_deadline: Option<String>, // RFC3339 UTC
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChoreReq {
    pub title: String,
    pub description: Option<String>,
    pub reward_kind: RewardKind,
    pub reward_amount: i32,
    #[serde(default)]
    pub requires_photo: bool,
    pub acceptance_timer: Option<i32>,
    #[serde(default)]
    pub completion_timer_enabled: bool,
    pub completion_timer_duration: Option<i32>,
    pub completion_timer_penalty: Option<i32>,
    #[serde(default)]
    pub reduction_enabled: bool,
    pub reduction_amount: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChoreDetailDto {
    pub chore: ChoreDto,
    pub submissions: Vec<SubmissionDto>,
    pub completions: Vec<CompletedTaskDto>,
}

// Submissions
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitChoreReq {
    pub notes: Option<String>,
    /// Reference produced by the photo-storage collaborator; recorded
    /// verbatim, never interpreted.
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionDto {
    pub id: i32,
    pub chore_id: i32,
    pub user_id: i32,
    pub assignment_id: i32,
    pub photo_url: Option<String>,
    pub notes: Option<String>,
    pub status: SubmissionStatus,
    pub submitted_at: String, // RFC3339 UTC
    pub reviewed_by: Option<i32>,
    pub reviewed_at: Option<String>, // RFC3339 UTC
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RejectSubmissionReq {
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveRespDto {
    pub chore_id: i32,
    pub child_id: i32,
    pub reward_kind: RewardKind,
    pub reward_earned: i32,
}

// Earnings ledger
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletedTaskDto {
    pub id: i32,
    pub chore_id: i32,
    pub user_id: i32,
    pub assignment_id: i32,
    pub submission_id: i32,
    pub reward_kind: RewardKind,
    pub reward_earned: i32,
    pub approved_by: i32,
    pub completed_at: String, // RFC3339 UTC
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EarningsDto {
    pub child_id: i32,
    pub display_name: String,
    pub money_balance: i32,
    pub screen_time_balance: i32,
    pub completions: Vec<CompletedTaskDto>,
}
