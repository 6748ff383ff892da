use crate::comment;
use crate::error::{Result, TillerError};
use crate::initiative::Initiative;
use crate::types::{Priority, Status};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ChangeRecorder
// ---------------------------------------------------------------------------

/// Callback invoked once per observable field change, *before* the mutation
/// lands: `(record, field, old_value, new_value)`. A leaf that finds the new
/// value equal to the old one skips both the callback and the write, so
/// re-applying an action to an already-matching record is a no-op.
pub type ChangeRecorder<'a> = dyn FnMut(&Initiative, &str, &str, &str) + 'a;

// ---------------------------------------------------------------------------
// ActionNode
// ---------------------------------------------------------------------------

/// A recursive mutation program over one initiative.
///
/// Leaves mutate a single field (or delegate a notification);
/// `ExecuteMultiple` runs sub-actions in order against the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionNode {
    SetStatus { value: Status },
    /// Advance through the fixed status table; terminal states stay put.
    TransitionStatus,
    SetPriority { value: Priority },
    #[serde(alias = "set_at_risk")]
    RequireRiskActionLog,
    NotifyOwner,
    NotifySlackChannel { channel: String },
    CreateComment { message: String },
    UpdateEta { value: NaiveDate },
    UpdateEffort { value: f64 },
    ExecuteMultiple {
        #[serde(default)]
        actions: Vec<ActionNode>,
    },
}

impl ActionNode {
    pub fn kind(&self) -> &'static str {
        match self {
            ActionNode::SetStatus { .. } => "set_status",
            ActionNode::TransitionStatus => "transition_status",
            ActionNode::SetPriority { .. } => "set_priority",
            ActionNode::RequireRiskActionLog => "require_risk_action_log",
            ActionNode::NotifyOwner => "notify_owner",
            ActionNode::NotifySlackChannel { .. } => "notify_slack_channel",
            ActionNode::CreateComment { .. } => "create_comment",
            ActionNode::UpdateEta { .. } => "update_eta",
            ActionNode::UpdateEffort { .. } => "update_effort",
            ActionNode::ExecuteMultiple { .. } => "execute_multiple",
        }
    }

    /// Apply this tree to one record, reporting each field change through
    /// `recorder`. Notification leaves mutate nothing here; delivery belongs
    /// to an external collaborator and the runner records that they fired.
    ///
    /// In an `ExecuteMultiple`, the first failing sub-action aborts the
    /// remaining siblings. Changes already applied stay applied.
    pub fn apply(
        &self,
        initiative: &mut Initiative,
        now: DateTime<Utc>,
        recorder: &mut ChangeRecorder<'_>,
    ) -> Result<()> {
        match self {
            ActionNode::SetStatus { value } => {
                set_status(initiative, *value, now, recorder);
                Ok(())
            }
            ActionNode::TransitionStatus => {
                set_status(initiative, initiative.status.advanced(), now, recorder);
                Ok(())
            }
            ActionNode::SetPriority { value } => {
                if initiative.priority != *value {
                    recorder(
                        initiative,
                        "priority",
                        initiative.priority.as_str(),
                        value.as_str(),
                    );
                    initiative.priority = *value;
                    initiative.updated_at = now;
                }
                Ok(())
            }
            ActionNode::RequireRiskActionLog => {
                if initiative.risk_log_blank() && initiative.status != Status::AtRisk {
                    set_status(initiative, Status::AtRisk, now, recorder);
                }
                Ok(())
            }
            ActionNode::NotifyOwner => {
                if initiative.owner.trim().is_empty() {
                    return Err(TillerError::ActionFailed(format!(
                        "initiative '{}' has no owner to notify",
                        initiative.slug
                    )));
                }
                Ok(())
            }
            ActionNode::NotifySlackChannel { channel } => {
                if channel.trim().is_empty() {
                    return Err(TillerError::ActionFailed(
                        "notify_slack_channel requires a channel".to_string(),
                    ));
                }
                Ok(())
            }
            ActionNode::CreateComment { message } => {
                comment::add_system_comment(
                    &mut initiative.comments,
                    &mut initiative.next_comment_seq,
                    message,
                    now,
                );
                initiative.updated_at = now;
                Ok(())
            }
            ActionNode::UpdateEta { value } => {
                if initiative.eta != Some(*value) {
                    let old = initiative
                        .eta
                        .map(|d| d.to_string())
                        .unwrap_or_default();
                    recorder(initiative, "eta", &old, &value.to_string());
                    initiative.eta = Some(*value);
                    initiative.updated_at = now;
                }
                Ok(())
            }
            ActionNode::UpdateEffort { value } => {
                if *value < 0.0 {
                    return Err(TillerError::ActionFailed(format!(
                        "effort cannot be negative: {value}"
                    )));
                }
                if initiative.actual_effort != *value {
                    let old = initiative.actual_effort.to_string();
                    recorder(initiative, "actual_effort", &old, &value.to_string());
                    initiative.actual_effort = *value;
                    initiative.updated_at = now;
                }
                Ok(())
            }
            ActionNode::ExecuteMultiple { actions } => {
                for action in actions {
                    action.apply(initiative, now, recorder)?;
                }
                Ok(())
            }
        }
    }
}

fn set_status(
    initiative: &mut Initiative,
    to: Status,
    now: DateTime<Utc>,
    recorder: &mut ChangeRecorder<'_>,
) {
    if initiative.status == to {
        return;
    }
    recorder(initiative, "status", initiative.status.as_str(), to.as_str());
    initiative.status = to;
    initiative.updated_at = now;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Initiative {
        Initiative::new("mobile-refresh", "Mobile Refresh")
    }

    /// Collects (field, old, new) triples in call order.
    fn collecting(
        calls: &mut Vec<(String, String, String)>,
    ) -> impl FnMut(&Initiative, &str, &str, &str) + '_ {
        move |_rec, field, old, new| {
            calls.push((field.to_string(), old.to_string(), new.to_string()))
        }
    }

    #[test]
    fn set_status_records_then_mutates() {
        let mut rec = record();
        let mut calls = Vec::new();
        let mut recorder = collecting(&mut calls);
        ActionNode::SetStatus {
            value: Status::InProgress,
        }
        .apply(&mut rec, Utc::now(), &mut recorder)
        .unwrap();
        drop(recorder);

        assert_eq!(rec.status, Status::InProgress);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (
            "status".to_string(),
            "not_started".to_string(),
            "in_progress".to_string()
        ));
    }

    #[test]
    fn set_status_is_idempotent() {
        let mut rec = record();
        let mut calls = Vec::new();
        let mut recorder = collecting(&mut calls);
        let action = ActionNode::SetStatus { value: Status::Done };
        action.apply(&mut rec, Utc::now(), &mut recorder).unwrap();
        action.apply(&mut rec, Utc::now(), &mut recorder).unwrap();
        drop(recorder);

        assert_eq!(rec.status, Status::Done);
        assert_eq!(calls.len(), 1, "second application must not re-record");
    }

    #[test]
    fn transition_status_follows_table() {
        let mut rec = record();
        rec.status = Status::InProgress;
        let mut calls = Vec::new();
        {
            let mut recorder = collecting(&mut calls);
            ActionNode::TransitionStatus
                .apply(&mut rec, Utc::now(), &mut recorder)
                .unwrap();
        }
        assert_eq!(rec.status, Status::AtRisk);

        // Terminal state: no-op, not an error
        rec.status = Status::Obsolete;
        calls.clear();
        {
            let mut recorder = collecting(&mut calls);
            ActionNode::TransitionStatus
                .apply(&mut rec, Utc::now(), &mut recorder)
                .unwrap();
        }
        assert_eq!(rec.status, Status::Obsolete);
        assert!(calls.is_empty());
    }

    #[test]
    fn require_risk_action_log_flags_at_risk() {
        let mut rec = record();
        rec.status = Status::InProgress;
        rec.risk_action_log = Some("  ".to_string());
        let mut calls = Vec::new();
        let mut recorder = collecting(&mut calls);
        ActionNode::RequireRiskActionLog
            .apply(&mut rec, Utc::now(), &mut recorder)
            .unwrap();
        drop(recorder);
        assert_eq!(rec.status, Status::AtRisk);
        assert_eq!(calls.len(), 1);
    }

    #[test]
    fn require_risk_action_log_skips_filled_log() {
        let mut rec = record();
        rec.status = Status::InProgress;
        rec.risk_action_log = Some("mitigation plan filed".to_string());
        let mut calls = Vec::new();
        let mut recorder = collecting(&mut calls);
        ActionNode::RequireRiskActionLog
            .apply(&mut rec, Utc::now(), &mut recorder)
            .unwrap();
        drop(recorder);
        assert_eq!(rec.status, Status::InProgress);
        assert!(calls.is_empty());
    }

    #[test]
    fn execute_multiple_runs_in_order() {
        let mut rec = record();
        rec.priority = Priority::P2;
        let mut calls = Vec::new();
        let mut recorder = collecting(&mut calls);
        let action = ActionNode::ExecuteMultiple {
            actions: vec![
                ActionNode::SetPriority { value: Priority::P0 },
                ActionNode::CreateComment {
                    message: "escalated".to_string(),
                },
            ],
        };
        action.apply(&mut rec, Utc::now(), &mut recorder).unwrap();
        drop(recorder);

        assert_eq!(rec.priority, Priority::P0);
        assert_eq!(rec.comments.len(), 1);
        assert_eq!(rec.comments[0].body, "[Automated] escalated");
        // The priority change was recorded before the comment appended
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "priority");
    }

    #[test]
    fn execute_multiple_aborts_remaining_on_failure() {
        let mut rec = record();
        let mut calls = Vec::new();
        let mut recorder = collecting(&mut calls);
        let action = ActionNode::ExecuteMultiple {
            actions: vec![
                ActionNode::SetStatus {
                    value: Status::InProgress,
                },
                ActionNode::NotifySlackChannel {
                    channel: "".to_string(),
                },
                ActionNode::SetPriority { value: Priority::P0 },
            ],
        };
        let result = action.apply(&mut rec, Utc::now(), &mut recorder);
        drop(recorder);

        assert!(result.is_err());
        // First sibling applied, third never ran, nothing rolled back
        assert_eq!(rec.status, Status::InProgress);
        assert_eq!(rec.priority, Priority::P2);
    }

    #[test]
    fn notify_owner_requires_owner() {
        let mut rec = record();
        let mut recorder = |_: &Initiative, _: &str, _: &str, _: &str| {};
        assert!(ActionNode::NotifyOwner
            .apply(&mut rec, Utc::now(), &mut recorder)
            .is_err());

        rec.owner = "u1".to_string();
        ActionNode::NotifyOwner
            .apply(&mut rec, Utc::now(), &mut recorder)
            .unwrap();
    }

    #[test]
    fn update_eta_records_old_and_new() {
        let mut rec = record();
        let target = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
        let mut calls = Vec::new();
        let mut recorder = collecting(&mut calls);
        let action = ActionNode::UpdateEta { value: target };
        action.apply(&mut rec, Utc::now(), &mut recorder).unwrap();
        // Re-applying with the same date is a no-op
        action.apply(&mut rec, Utc::now(), &mut recorder).unwrap();
        drop(recorder);

        assert_eq!(rec.eta, Some(target));
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "", "no prior ETA");
        assert_eq!(calls[0].2, "2026-09-30");
    }

    #[test]
    fn update_effort_rejects_negative() {
        let mut rec = record();
        let mut recorder = |_: &Initiative, _: &str, _: &str, _: &str| {};
        assert!(ActionNode::UpdateEffort { value: -1.0 }
            .apply(&mut rec, Utc::now(), &mut recorder)
            .is_err());
        assert_eq!(rec.actual_effort, 0.0);
    }

    #[test]
    fn set_at_risk_alias_parses() {
        let node: ActionNode = serde_yaml::from_str("type: set_at_risk\n").unwrap();
        assert_eq!(node, ActionNode::RequireRiskActionLog);
    }

    #[test]
    fn action_tree_yaml_roundtrip() {
        let action = ActionNode::ExecuteMultiple {
            actions: vec![
                ActionNode::SetPriority { value: Priority::P0 },
                ActionNode::NotifySlackChannel {
                    channel: "#portfolio-alerts".to_string(),
                },
            ],
        };
        let yaml = serde_yaml::to_string(&action).unwrap();
        assert!(yaml.contains("type: execute_multiple"));
        assert!(yaml.contains("type: notify_slack_channel"));
        let parsed: ActionNode = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, action);
    }
}
