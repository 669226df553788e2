//! Typed fact-log entities: workstreams, weekly progress snapshots, change
//! requests. Constructors validate the raw inputs; out-of-range values are
//! rejected, never clamped. Derived metric fields are supplied by the caller
//! (see `metrics`) so snapshots carry exactly what was computed for them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} out of range: {value} (expected 0..=100)")]
    PercentOutOfRange { field: &'static str, value: f64 },
    #[error("{field} must be non-negative, got {value}")]
    NegativeAmount { field: &'static str, value: f64 },
    #[error("unknown change request status: {0}")]
    UnknownStatus(String),
    #[error("unknown complexity: {0}")]
    UnknownComplexity(String),
}

fn check_pct(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    // NaN fails the range check as well.
    if !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::PercentOutOfRange { field, value });
    }
    Ok(value)
}

fn check_non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value < 0.0 || value.is_nan() {
        return Err(ValidationError::NegativeAmount { field, value });
    }
    Ok(value)
}

/// Informational sizing tag on a workstream. No metric depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
    Critical,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "Low",
            Complexity::Medium => "Medium",
            Complexity::High => "High",
            Complexity::Critical => "Critical",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "Low" => Ok(Complexity::Low),
            "Medium" => Ok(Complexity::Medium),
            "High" => Ok(Complexity::High),
            "Critical" => Ok(Complexity::Critical),
            other => Err(ValidationError::UnknownComplexity(other.to_string())),
        }
    }
}

/// A tracked unit of project work. Created once at portfolio setup and
/// effectively immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workstream {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub budget: f64,
    pub complexity: Complexity,
}

impl Workstream {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
        budget: f64,
        complexity: Complexity,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            budget: check_non_negative("budget", budget)?,
            complexity,
        })
    }
}

/// One workstream's status as of one reporting week. Append-only; at most one
/// snapshot per `(workstream_id, week_ending)` pair (enforced by storage).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub week_ending: NaiveDate,
    pub workstream_id: String,
    pub planned_pct: f64,
    pub actual_pct: f64,
    pub budget_spent: f64,
    /// `actual_pct - planned_pct`; negative means behind schedule.
    pub schedule_variance: f64,
    /// Earned value over cumulative spend; < 1 signals cost overrun.
    pub cpi: f64,
}

impl ProgressSnapshot {
    pub fn new(
        week_ending: NaiveDate,
        workstream_id: impl Into<String>,
        planned_pct: f64,
        actual_pct: f64,
        budget_spent: f64,
        schedule_variance: f64,
        cpi: f64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            week_ending,
            workstream_id: workstream_id.into(),
            planned_pct: check_pct("planned_pct", planned_pct)?,
            actual_pct: check_pct("actual_pct", actual_pct)?,
            budget_spent: check_non_negative("budget_spent", budget_spent)?,
            schedule_variance,
            cpi,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrStatus {
    Pending,
    Approved,
    Rejected,
}

impl CrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrStatus::Pending => "Pending",
            CrStatus::Approved => "Approved",
            CrStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "Pending" => Ok(CrStatus::Pending),
            "Approved" => Ok(CrStatus::Approved),
            "Rejected" => Ok(CrStatus::Rejected),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// A discrete scope/risk event raised against a workstream. `cost_impact` is
/// only meaningful once the status is `Approved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: String,
    pub workstream_id: String,
    pub date_raised: NaiveDate,
    pub title: String,
    pub status: CrStatus,
    pub cost_impact: f64,
    pub time_impact_days: u32,
}

impl ChangeRequest {
    pub fn new(
        id: impl Into<String>,
        workstream_id: impl Into<String>,
        date_raised: NaiveDate,
        title: impl Into<String>,
        status: CrStatus,
        cost_impact: f64,
        time_impact_days: u32,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: id.into(),
            workstream_id: workstream_id.into(),
            date_raised,
            title: title.into(),
            status,
            cost_impact: check_non_negative("cost_impact", cost_impact)?,
            time_impact_days,
        })
    }
}
