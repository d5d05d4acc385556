use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raised when a status/kind string read from storage or a request does not
/// name a known variant. Unknown values are rejected at the boundary.
#[derive(Debug, thiserror::Error)]
#[error("unknown {what}: {value}")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
}

/// What a chore pays out in. Money is tracked in cents, screen time in
/// minutes; the unit is implied by the kind and never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Money,
    ScreenTime,
}

impl RewardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RewardKind::Money => "money",
            RewardKind::ScreenTime => "screen_time",
        }
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardKind {
    type Err = ParseEnumError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "money" => Ok(RewardKind::Money),
            "screen_time" => Ok(RewardKind::ScreenTime),
            other => Err(ParseEnumError {
                what: "reward kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Chore lifecycle status.
///
/// Transitions:
/// - Available -> PendingAcceptance (assign)
/// - PendingAcceptance -> Assigned (accept)
/// - PendingAcceptance -> PendingAcceptance (decline, next child offered)
/// - PendingAcceptance -> AutoAccepted (decline, rotation cycle exhausted)
/// - Assigned | AutoAccepted -> PendingApproval (submit)
/// - PendingApproval -> Available (approve, reward paid)
/// - PendingApproval -> Assigned (reject, resubmission allowed)
///
/// There is no terminal status: chores are reusable and each approval starts
/// a fresh rotation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoreStatus {
    Available,
    PendingAcceptance,
    Assigned,
    AutoAccepted,
    PendingApproval,
}

impl ChoreStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChoreStatus::Available => "available",
            ChoreStatus::PendingAcceptance => "pending_acceptance",
            ChoreStatus::Assigned => "assigned",
            ChoreStatus::AutoAccepted => "auto_accepted",
            ChoreStatus::PendingApproval => "pending_approval",
        }
    }

    /// Statuses from which the assignee may submit completed work.
    pub fn accepts_submission(self) -> bool {
        matches!(self, ChoreStatus::Assigned | ChoreStatus::AutoAccepted)
    }
}

impl fmt::Display for ChoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChoreStatus {
    type Err = ParseEnumError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ChoreStatus::Available),
            "pending_acceptance" => Ok(ChoreStatus::PendingAcceptance),
            "assigned" => Ok(ChoreStatus::Assigned),
            "auto_accepted" => Ok(ChoreStatus::AutoAccepted),
            "pending_approval" => Ok(ChoreStatus::PendingApproval),
            other => Err(ParseEnumError {
                what: "chore status",
                value: other.to_string(),
            }),
        }
    }
}

/// Status of a single offer of a chore to a child. At most one Pending row
/// exists per chore at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    Accepted,
    Declined,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Accepted => "accepted",
            AssignmentStatus::Declined => "declined",
            AssignmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = ParseEnumError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AssignmentStatus::Pending),
            "accepted" => Ok(AssignmentStatus::Accepted),
            "declined" => Ok(AssignmentStatus::Declined),
            "completed" => Ok(AssignmentStatus::Completed),
            other => Err(ParseEnumError {
                what: "assignment status",
                value: other.to_string(),
            }),
        }
    }
}

/// Status of a completion attempt. At most one Pending row exists per chore
/// at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = ParseEnumError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            other => Err(ParseEnumError {
                what: "submission status",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            ChoreStatus::Available,
            ChoreStatus::PendingAcceptance,
            ChoreStatus::Assigned,
            ChoreStatus::AutoAccepted,
            ChoreStatus::PendingApproval,
        ] {
            assert_eq!(s.as_str().parse::<ChoreStatus>().unwrap(), s);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("done".parse::<ChoreStatus>().is_err());
        assert!("".parse::<AssignmentStatus>().is_err());
        assert!("points".parse::<RewardKind>().is_err());
    }

    #[test]
    fn submittable_statuses() {
        assert!(ChoreStatus::Assigned.accepts_submission());
        assert!(ChoreStatus::AutoAccepted.accepts_submission());
        assert!(!ChoreStatus::PendingAcceptance.accepts_submission());
        assert!(!ChoreStatus::Available.accepts_submission());
        assert!(!ChoreStatus::PendingApproval.accepts_submission());
    }
}
