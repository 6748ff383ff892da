use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotStarted,
    InProgress,
    AtRisk,
    Done,
    Obsolete,
}

impl Status {
    pub fn all() -> &'static [Status] {
        &[
            Status::NotStarted,
            Status::InProgress,
            Status::AtRisk,
            Status::Done,
            Status::Obsolete,
        ]
    }

    /// The fixed advancement table used by the transition action.
    /// Terminal states map to themselves.
    pub fn advanced(self) -> Status {
        match self {
            Status::NotStarted => Status::InProgress,
            Status::InProgress => Status::AtRisk,
            Status::AtRisk => Status::Done,
            Status::Done => Status::Done,
            Status::Obsolete => Status::Obsolete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotStarted => "not_started",
            Status::InProgress => "in_progress",
            Status::AtRisk => "at_risk",
            Status::Done => "done",
            Status::Obsolete => "obsolete",
        }
    }

    /// Human-readable form for tables and run summaries.
    pub fn label(self) -> &'static str {
        match self {
            Status::NotStarted => "Not Started",
            Status::InProgress => "In Progress",
            Status::AtRisk => "At Risk",
            Status::Done => "Done",
            Status::Obsolete => "Obsolete",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = crate::error::TillerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Status::NotStarted),
            "in_progress" => Ok(Status::InProgress),
            "at_risk" => Ok(Status::AtRisk),
            "done" => Ok(Status::Done),
            "obsolete" => Ok(Status::Obsolete),
            _ => Err(crate::error::TillerError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
    P3,
}

impl Priority {
    pub fn all() -> &'static [Priority] {
        &[Priority::P0, Priority::P1, Priority::P2, Priority::P3]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::error::TillerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P0" | "p0" => Ok(Priority::P0),
            "P1" | "p1" => Ok(Priority::P1),
            "P2" | "p2" => Ok(Priority::P2),
            "P3" | "p3" => Ok(Priority::P3),
            _ => Err(crate::error::TillerError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerKind
// ---------------------------------------------------------------------------

/// When a workflow is meant to fire. Stored and surfaced for an external
/// scheduler; the engine itself only evaluates on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    OnSchedule,
    OnFieldChange,
    OnStatusChange,
    OnEtaChange,
    OnEffortChange,
    OnConditionMet,
    OnCreate,
}

impl TriggerKind {
    pub fn all() -> &'static [TriggerKind] {
        &[
            TriggerKind::OnSchedule,
            TriggerKind::OnFieldChange,
            TriggerKind::OnStatusChange,
            TriggerKind::OnEtaChange,
            TriggerKind::OnEffortChange,
            TriggerKind::OnConditionMet,
            TriggerKind::OnCreate,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::OnSchedule => "on_schedule",
            TriggerKind::OnFieldChange => "on_field_change",
            TriggerKind::OnStatusChange => "on_status_change",
            TriggerKind::OnEtaChange => "on_eta_change",
            TriggerKind::OnEffortChange => "on_effort_change",
            TriggerKind::OnConditionMet => "on_condition_met",
            TriggerKind::OnCreate => "on_create",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TriggerKind {
    type Err = crate::error::TillerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriggerKind::all()
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| crate::error::TillerError::InvalidTrigger(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
