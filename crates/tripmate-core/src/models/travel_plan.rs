//! Travel plan domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TripmateError, TripmateResult};

/// Upper bound on images attached to a single plan.
pub const MAX_PLAN_IMAGES: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TravelType {
    Solo,
    Friends,
    Group,
    Family,
    Couple,
}

impl TravelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelType::Solo => "SOLO",
            TravelType::Friends => "FRIENDS",
            TravelType::Group => "GROUP",
            TravelType::Family => "FAMILY",
            TravelType::Couple => "COUPLE",
        }
    }
}

impl FromStr for TravelType {
    type Err = TripmateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SOLO" => Ok(TravelType::Solo),
            "FRIENDS" => Ok(TravelType::Friends),
            "GROUP" => Ok(TravelType::Group),
            "FAMILY" => Ok(TravelType::Family),
            "COUPLE" => Ok(TravelType::Couple),
            other => Err(TripmateError::validation(format!(
                "unknown travel type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanStatus {
    Active,
    Completed,
    Cancelled,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "ACTIVE",
            PlanStatus::Completed => "COMPLETED",
            PlanStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PlanStatus::Active)
    }

    /// Status only ever moves out of `Active`, and only once.
    pub fn can_transition_to(&self, next: PlanStatus) -> bool {
        matches!(
            (self, next),
            (PlanStatus::Active, PlanStatus::Completed)
                | (PlanStatus::Active, PlanStatus::Cancelled)
        )
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = TripmateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(PlanStatus::Active),
            "COMPLETED" => Ok(PlanStatus::Completed),
            "CANCELLED" => Ok(PlanStatus::Cancelled),
            other => Err(TripmateError::validation(format!(
                "unknown plan status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelPlan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
    pub travel_type: TravelType,
    pub description: String,
    pub interests: Vec<String>,
    /// Ordered image URLs, at most [`MAX_PLAN_IMAGES`].
    pub images: Vec<String>,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new plan. The owner is always the creating actor and is
/// passed separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTravelPlan {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
    pub travel_type: TravelType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl CreateTravelPlan {
    /// Check field constraints and normalize free-form input in place.
    pub fn validate(&mut self) -> TripmateResult<()> {
        self.destination = self.destination.trim().to_string();
        if self.destination.is_empty() {
            return Err(TripmateError::validation("destination must not be empty"));
        }
        validate_dates(self.start_date, self.end_date)?;
        validate_budget(self.budget)?;
        validate_images(&self.images)?;
        self.interests = normalize_interests(std::mem::take(&mut self.interests));
        Ok(())
    }
}

/// Owner edits. Status is not editable here; it only moves through the
/// dedicated transitions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTravelPlan {
    pub destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub travel_type: Option<TravelType>,
    pub description: Option<String>,
    pub interests: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

impl UpdateTravelPlan {
    /// Validate the patch against the plan it will be applied to.
    pub fn validate_against(&mut self, current: &TravelPlan) -> TripmateResult<()> {
        if let Some(destination) = self.destination.as_mut() {
            *destination = destination.trim().to_string();
            if destination.is_empty() {
                return Err(TripmateError::validation("destination must not be empty"));
            }
        }
        validate_dates(
            self.start_date.unwrap_or(current.start_date),
            self.end_date.unwrap_or(current.end_date),
        )?;
        if let Some(budget) = self.budget {
            validate_budget(budget)?;
        }
        if let Some(images) = &self.images {
            validate_images(images)?;
        }
        if let Some(interests) = self.interests.take() {
            self.interests = Some(normalize_interests(interests));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.destination.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.budget.is_none()
            && self.travel_type.is_none()
            && self.description.is_none()
            && self.interests.is_none()
            && self.images.is_none()
    }
}

/// Public search criteria. All fields are optional; `status` defaults to
/// `Active` when absent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlanFilter {
    /// Case-insensitive substring of the destination.
    pub destination: Option<String>,
    pub travel_type: Option<TravelType>,
    pub interest: Option<String>,
    /// Plans that end on or after this date.
    pub from: Option<NaiveDate>,
    /// Plans that start on or before this date.
    pub to: Option<NaiveDate>,
    pub max_budget: Option<f64>,
    pub status: Option<PlanStatus>,
}

fn validate_dates(start: NaiveDate, end: NaiveDate) -> TripmateResult<()> {
    if start > end {
        return Err(TripmateError::validation(format!(
            "start date {start} is after end date {end}"
        )));
    }
    Ok(())
}

fn validate_budget(budget: f64) -> TripmateResult<()> {
    if !budget.is_finite() || budget <= 0.0 {
        return Err(TripmateError::validation("budget must be a positive number"));
    }
    Ok(())
}

fn validate_images(images: &[String]) -> TripmateResult<()> {
    if images.len() > MAX_PLAN_IMAGES {
        return Err(TripmateError::validation(format!(
            "a plan may carry at most {MAX_PLAN_IMAGES} images"
        )));
    }
    if images.iter().any(|url| url.trim().is_empty()) {
        return Err(TripmateError::validation("image URLs must not be empty"));
    }
    Ok(())
}

/// Interests are tags: trimmed, lowercased, de-duplicated, first-seen
/// order kept.
fn normalize_interests(interests: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    interests
        .into_iter()
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty() && seen.insert(i.clone()))
        .collect()
}
