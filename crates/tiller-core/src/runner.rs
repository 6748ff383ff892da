use crate::action::ChangeRecorder;
use crate::error::Result;
use crate::initiative::Initiative;
use crate::scope;
use crate::workflow::Workflow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ExecutionLog
// ---------------------------------------------------------------------------

/// The per-run record of which initiatives were affected, what was done, and
/// what failed. Created once per `execute` call and immutable after return;
/// the caller appends it into the owning workflow's bounded log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: String,
    pub workflow_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub initiatives_affected: Vec<String>,
    #[serde(default)]
    pub actions_taken: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ExecutionLog {
    pub fn new(workflow_id: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.to_string(),
            timestamp,
            initiatives_affected: Vec::new(),
            actions_taken: Vec::new(),
            errors: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Run one workflow over one record snapshot: scope, filter by condition,
/// then apply the action to each surviving record in order.
///
/// Records are processed strictly sequentially and each is borrowed for the
/// whole of its own step, so no two iterations alias. One record's failure
/// is logged and never aborts the batch; a malformed scope aborts the whole
/// run with a single error entry and zero affected records. Serializing
/// concurrent runs against the same snapshot is the caller's concern.
pub fn execute(
    workflow: &Workflow,
    initiatives: &mut [Initiative],
    recorder: &mut ChangeRecorder<'_>,
) -> ExecutionLog {
    let now = Utc::now();
    let mut log = ExecutionLog::new(&workflow.id, now);

    // Scoping
    if let Some(scope) = &workflow.scope {
        if let Err(e) = scope.validate() {
            log.errors.push(e.to_string());
            tracing::warn!(workflow = %workflow.id, error = %e, "run aborted in scoping");
            return log;
        }
    }
    let scoped: Vec<usize> = initiatives
        .iter()
        .enumerate()
        .filter(|(_, rec)| workflow.scope.as_ref().map_or(true, |s| s.matches(rec)))
        .map(|(i, _)| i)
        .collect();
    tracing::debug!(workflow = %workflow.id, scoped = scoped.len(), "scoping done");

    // Filtering
    let matched: Vec<usize> = scoped
        .into_iter()
        .filter(|&i| {
            workflow
                .condition
                .as_ref()
                .map_or(true, |c| c.evaluate(&initiatives[i], now))
        })
        .collect();
    tracing::debug!(workflow = %workflow.id, matched = matched.len(), "filtering done");

    // Executing
    for i in matched {
        let rec = &mut initiatives[i];
        match workflow.action.apply(rec, now, recorder) {
            Ok(()) => {
                log.initiatives_affected.push(rec.slug.clone());
                log.actions_taken.push(format!(
                    "Applied {} to \"{}\"",
                    workflow.action.kind(),
                    rec.title
                ));
            }
            Err(e) => {
                log.errors.push(format!("Error processing {}: {}", rec.title, e));
            }
        }
    }

    tracing::info!(
        workflow = %workflow.id,
        affected = log.initiatives_affected.len(),
        errors = log.errors.len(),
        "run done"
    );
    log
}

/// Which initiatives a workflow would touch right now, without mutating
/// anything. A malformed scope propagates as an error here since there is no
/// log to record it in.
pub fn preview(workflow: &Workflow, initiatives: &[Initiative]) -> Result<Vec<String>> {
    let now = Utc::now();
    if let Some(scope) = &workflow.scope {
        scope.validate()?;
    }
    Ok(scope::filter_by_scope(initiatives, workflow.scope.as_ref())
        .into_iter()
        .filter(|rec| {
            workflow
                .condition
                .as_ref()
                .map_or(true, |c| c.evaluate(rec, now))
        })
        .map(|rec| rec.slug.clone())
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionNode;
    use crate::condition::ConditionNode;
    use crate::scope::ScopeFilter;
    use crate::types::{Priority, Status, TriggerKind};

    fn workflow(action: ActionNode) -> Workflow {
        Workflow::new("wf", "Test workflow", TriggerKind::OnSchedule, action, "u1")
    }

    fn initiative(slug: &str, status: Status) -> Initiative {
        let mut i = Initiative::new(slug, slug);
        i.status = status;
        i.owner = "u1".to_string();
        i
    }

    fn no_recorder() -> impl FnMut(&Initiative, &str, &str, &str) {
        |_: &Initiative, _: &str, _: &str, _: &str| {}
    }

    #[test]
    fn condition_filters_and_action_applies() {
        // A StatusEquals(in_progress) condition with a transition action must
        // advance only the matching record.
        let mut wf = workflow(ActionNode::TransitionStatus);
        wf.condition = Some(ConditionNode::StatusEquals {
            value: Status::InProgress,
        });
        let mut records = vec![
            initiative("one", Status::InProgress),
            initiative("two", Status::Done),
        ];

        let mut recorder = no_recorder();
        let log = execute(&wf, &mut records, &mut recorder);

        assert_eq!(log.initiatives_affected, vec!["one".to_string()]);
        assert_eq!(records[0].status, Status::AtRisk);
        assert_eq!(records[1].status, Status::Done, "non-matching record untouched");
        assert!(log.errors.is_empty());
        assert_eq!(log.actions_taken.len(), 1);
        assert!(log.actions_taken[0].contains("transition_status"));
    }

    #[test]
    fn one_failure_never_aborts_the_batch() {
        // notify_owner fails for the ownerless record only.
        let wf = workflow(ActionNode::NotifyOwner);
        let mut records = vec![
            initiative("a", Status::InProgress),
            initiative("b", Status::InProgress),
            initiative("c", Status::InProgress),
        ];
        records[1].owner = String::new();

        let mut recorder = no_recorder();
        let log = execute(&wf, &mut records, &mut recorder);

        assert_eq!(log.initiatives_affected.len(), 2);
        assert_eq!(log.errors.len(), 1);
        assert!(log.errors[0].starts_with("Error processing b:"));
    }

    #[test]
    fn malformed_scope_aborts_run() {
        let mut wf = workflow(ActionNode::TransitionStatus);
        wf.scope = Some(ScopeFilter {
            owners: Some(Vec::new()),
            ..Default::default()
        });
        let mut records = vec![initiative("a", Status::InProgress)];

        let mut recorder = no_recorder();
        let log = execute(&wf, &mut records, &mut recorder);

        assert!(log.initiatives_affected.is_empty());
        assert_eq!(log.errors.len(), 1);
        assert!(log.errors[0].contains("malformed scope filter"));
        assert_eq!(records[0].status, Status::InProgress, "nothing executed");
    }

    #[test]
    fn absent_condition_matches_all_scoped() {
        let mut wf = workflow(ActionNode::SetPriority { value: Priority::P1 });
        wf.scope = Some(ScopeFilter {
            owners: Some(vec!["u1".to_string()]),
            ..Default::default()
        });
        let mut records = vec![
            initiative("a", Status::NotStarted),
            initiative("b", Status::Done),
        ];
        records[1].owner = "u9".to_string();

        let mut recorder = no_recorder();
        let log = execute(&wf, &mut records, &mut recorder);

        assert_eq!(log.initiatives_affected, vec!["a".to_string()]);
        assert_eq!(records[0].priority, Priority::P1);
        assert_eq!(records[1].priority, Priority::P2);
    }

    #[test]
    fn recorder_sees_changes_in_batch_order() {
        let wf = workflow(ActionNode::SetStatus {
            value: Status::InProgress,
        });
        let mut records = vec![
            initiative("first", Status::NotStarted),
            initiative("second", Status::NotStarted),
        ];

        let mut seen: Vec<String> = Vec::new();
        let mut recorder =
            |rec: &Initiative, _: &str, _: &str, _: &str| seen.push(rec.slug.clone());
        let log = execute(&wf, &mut records, &mut recorder);

        assert_eq!(seen, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(log.initiatives_affected.len(), 2);
    }

    #[test]
    fn preview_reports_matches_without_mutating() {
        let mut wf = workflow(ActionNode::TransitionStatus);
        wf.condition = Some(ConditionNode::StatusEquals {
            value: Status::InProgress,
        });
        let records = vec![
            initiative("one", Status::InProgress),
            initiative("two", Status::Done),
        ];

        let matches = preview(&wf, &records).unwrap();
        assert_eq!(matches, vec!["one".to_string()]);
        assert_eq!(records[0].status, Status::InProgress);
    }

    #[test]
    fn preview_propagates_malformed_scope() {
        let mut wf = workflow(ActionNode::TransitionStatus);
        wf.scope = Some(ScopeFilter {
            asset_classes: Some(Vec::new()),
            ..Default::default()
        });
        assert!(preview(&wf, &[]).is_err());
    }
}
