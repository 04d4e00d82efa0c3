use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Actor roles known to the system. Stored lowercase in the `users.role`
/// column and inside JWT claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Staff,
    Hod,
    Principal,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Hod => "hod",
            Role::Principal => "principal",
            Role::Admin => "admin",
        }
    }

    /// Roles that review incoming complaints and hand them to staff.
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Role::Hod | Role::Principal | Role::Admin)
    }

    /// Roles allowed to mutate complaints at all (students only submit).
    pub fn can_update_complaints(&self) -> bool {
        !matches!(self, Role::Student)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "student" => Ok(Role::Student),
            "staff" => Ok(Role::Staff),
            "hod" => Ok(Role::Hod),
            "principal" => Ok(Role::Principal),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complaint lifecycle states. `Reviewed` is a legacy value that older
/// records may carry; the guard admits no transition into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Submitted,
    Reviewed,
    InProgress,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "submitted",
            ComplaintStatus::Reviewed => "reviewed",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Rejected)
    }

    /// Open statuses count as pending in analytics rollups.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ComplaintStatus::Submitted | ComplaintStatus::Reviewed | ComplaintStatus::InProgress
        )
    }
}

impl FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "submitted" => Ok(ComplaintStatus::Submitted),
            "reviewed" => Ok(ComplaintStatus::Reviewed),
            "in_progress" => Ok(ComplaintStatus::InProgress),
            "resolved" => Ok(ComplaintStatus::Resolved),
            "rejected" => Ok(ComplaintStatus::Rejected),
            other => Err(format!("unknown complaint status '{other}'")),
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransitionPolicy {
    /// Whether the assignee may reject from `in_progress` (symmetric to
    /// resolve). Off by default; the reviewed deployment only exposes the
    /// resolve path to staff.
    pub allow_staff_reject: bool,
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self {
            allow_staff_reject: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid transition from '{from}' to '{to}'")]
    Invalid {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },
    #[error("role '{role}' may not move a complaint from '{from}' to '{to}'")]
    RoleNotAllowed {
        role: Role,
        from: ComplaintStatus,
        to: ComplaintStatus,
    },
    #[error("only the assigned staff member may move a complaint from '{from}' to '{to}'")]
    NotAssignee {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },
}

/// Validates a requested status change against the transition table.
///
/// The pair is checked first (unknown pairs are `Invalid`, including
/// anything out of a terminal state), then the actor: reviewer-tier roles
/// accept or reject submitted complaints, and only the assignee closes out
/// an in-progress one.
pub fn check_transition(
    policy: &TransitionPolicy,
    from: ComplaintStatus,
    to: ComplaintStatus,
    actor: Role,
    actor_is_assignee: bool,
) -> Result<(), TransitionError> {
    use ComplaintStatus::*;

    let staff_closes = match (from, to) {
        (Submitted, InProgress) | (Submitted, Rejected) => false,
        (InProgress, Resolved) => true,
        (InProgress, Rejected) if policy.allow_staff_reject => true,
        _ => return Err(TransitionError::Invalid { from, to }),
    };

    if staff_closes {
        if actor != Role::Staff {
            return Err(TransitionError::RoleNotAllowed { role: actor, from, to });
        }
        if !actor_is_assignee {
            return Err(TransitionError::NotAssignee { from, to });
        }
    } else if !actor.is_reviewer() {
        return Err(TransitionError::RoleNotAllowed { role: actor, from, to });
    }

    Ok(())
}
