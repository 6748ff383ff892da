use crate::initiative::Initiative;
use crate::types::{Priority, Status};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ConditionNode
// ---------------------------------------------------------------------------

/// A recursive boolean expression over an initiative's fields.
///
/// Leaves test a single field; `And`/`Or` combine children. Evaluation is
/// total: every node resolves to a boolean and a tag this version does not
/// recognize resolves to `false`, never to an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionNode {
    DueDatePassed,
    DueDateWithinDays { days: i64 },
    LastUpdatedOlderThan { days: i64 },
    StatusEquals { value: Status },
    StatusNotEquals { value: Status },
    ActualEffortGreaterThan { value: f64 },
    ActualEffortPercentageOfEstimated { percentage: f64 },
    EffortVarianceExceeds { value: f64 },
    PriorityEquals { value: Priority },
    RiskActionLogEmpty,
    OwnerEquals { value: String },
    AssetClassEquals { value: String },
    And {
        #[serde(default)]
        children: Vec<ConditionNode>,
    },
    Or {
        #[serde(default)]
        children: Vec<ConditionNode>,
    },
    /// Fail-closed sink for tags written by a newer version of the builder.
    #[serde(other)]
    Unknown,
}

impl ConditionNode {
    /// Evaluate this tree against one record at a given instant.
    ///
    /// `now` is threaded through the whole tree so a single run sees one
    /// consistent clock.
    pub fn evaluate(&self, initiative: &Initiative, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        match self {
            ConditionNode::DueDatePassed => {
                initiative.eta.map(|eta| eta < today).unwrap_or(false)
            }
            ConditionNode::DueDateWithinDays { days } => initiative
                .eta
                .map(|eta| eta >= today && eta <= today + Duration::days(*days))
                .unwrap_or(false),
            ConditionNode::LastUpdatedOlderThan { days } => {
                initiative.updated_at < now - Duration::days(*days)
            }
            ConditionNode::StatusEquals { value } => initiative.status == *value,
            ConditionNode::StatusNotEquals { value } => initiative.status != *value,
            ConditionNode::ActualEffortGreaterThan { value } => {
                initiative.actual_effort > *value
            }
            ConditionNode::ActualEffortPercentageOfEstimated { percentage } => {
                if initiative.estimated_effort == 0.0 {
                    // No estimate means no meaningful percentage
                    return false;
                }
                initiative.actual_effort / initiative.estimated_effort * 100.0 >= *percentage
            }
            ConditionNode::EffortVarianceExceeds { value } => {
                (initiative.estimated_effort - initiative.actual_effort).abs() > *value
            }
            ConditionNode::PriorityEquals { value } => initiative.priority == *value,
            ConditionNode::RiskActionLogEmpty => initiative.risk_log_blank(),
            ConditionNode::OwnerEquals { value } => initiative.owner == *value,
            ConditionNode::AssetClassEquals { value } => initiative.asset_class == *value,
            // Vacuously true: an empty AND constrains nothing
            ConditionNode::And { children } => {
                children.iter().all(|c| c.evaluate(initiative, now))
            }
            // Vacuously false: an empty OR offers nothing to satisfy
            ConditionNode::Or { children } => {
                children.iter().any(|c| c.evaluate(initiative, now))
            }
            ConditionNode::Unknown => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
