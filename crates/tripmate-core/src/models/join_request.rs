//! Join request domain model.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TripmateError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl JoinRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinRequestStatus::Pending => "PENDING",
            JoinRequestStatus::Approved => "APPROVED",
            JoinRequestStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JoinRequestStatus::Pending)
    }

    /// Pending and approved requests occupy the requester's single slot
    /// on a plan; a rejected request frees it.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, JoinRequestStatus::Rejected)
    }
}

impl fmt::Display for JoinRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinRequestStatus {
    type Err = TripmateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(JoinRequestStatus::Pending),
            "APPROVED" => Ok(JoinRequestStatus::Approved),
            "REJECTED" => Ok(JoinRequestStatus::Rejected),
            other => Err(TripmateError::validation(format!(
                "unknown join request status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub plan_id: Uuid,
    pub message: String,
    pub status: JoinRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the plan owner approves or rejects.
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJoinRequest {
    pub plan_id: Uuid,
    pub message: String,
}

/// Listing order: newest first, ties broken by ascending id.
pub fn newest_first(a: &JoinRequest, b: &JoinRequest) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
