use crate::action::ActionNode;
use crate::condition::ConditionNode;
use crate::error::{Result, TillerError};
use crate::paths;
use crate::runner::ExecutionLog;
use crate::types::{Status, TriggerKind};
use crate::workflow::Workflow;
use chrono::Utc;
use std::path::Path;

// ---------------------------------------------------------------------------
// System rules
// ---------------------------------------------------------------------------

/// Ids of the built-in rules, in catalog order. Kept in sync with
/// `system_rules()` by a test.
pub const SYSTEM_RULE_IDS: [&str; 3] = [
    "sys-overdue-at-risk",
    "sys-stale-owner-ping",
    "sys-effort-overrun",
];

pub fn is_system_rule(id: &str) -> bool {
    SYSTEM_RULE_IDS.contains(&id)
}

/// Generate the built-in rules. Called fresh on every catalog read; system
/// rules are never persisted, so there is no stored copy to edit or disable.
pub fn system_rules() -> Vec<Workflow> {
    vec![overdue_at_risk(), stale_owner_ping(), effort_overrun()]
}

fn daily_schedule() -> serde_yaml::Value {
    let mut m = serde_yaml::Mapping::new();
    m.insert(
        serde_yaml::Value::from("schedule"),
        serde_yaml::Value::from("daily"),
    );
    m.insert(
        serde_yaml::Value::from("time"),
        serde_yaml::Value::from("06:00"),
    );
    serde_yaml::Value::Mapping(m)
}

fn not_finished() -> Vec<ConditionNode> {
    vec![
        ConditionNode::StatusNotEquals { value: Status::Done },
        ConditionNode::StatusNotEquals {
            value: Status::Obsolete,
        },
    ]
}

fn overdue_at_risk() -> Workflow {
    let mut children = vec![ConditionNode::DueDatePassed];
    children.extend(not_finished());

    let mut workflow = Workflow::system_rule(
        SYSTEM_RULE_IDS[0],
        "Flag overdue initiatives",
        TriggerKind::OnSchedule,
        ActionNode::RequireRiskActionLog,
    );
    workflow.description =
        Some("Past-due initiatives without a risk action log are moved to At Risk.".to_string());
    workflow.trigger_config = Some(daily_schedule());
    workflow.condition = Some(ConditionNode::And { children });
    workflow
}

fn stale_owner_ping() -> Workflow {
    let mut children = vec![ConditionNode::LastUpdatedOlderThan { days: 14 }];
    children.extend(not_finished());

    let mut workflow = Workflow::system_rule(
        SYSTEM_RULE_IDS[1],
        "Ping owners of stale initiatives",
        TriggerKind::OnSchedule,
        ActionNode::NotifyOwner,
    );
    workflow.description =
        Some("Owners are notified when an initiative goes two weeks without an update.".to_string());
    workflow.trigger_config = Some(daily_schedule());
    workflow.condition = Some(ConditionNode::And { children });
    workflow
}

fn effort_overrun() -> Workflow {
    let mut children = vec![ConditionNode::ActualEffortPercentageOfEstimated {
        percentage: 100.0,
    }];
    children.extend(not_finished());

    let mut workflow = Workflow::system_rule(
        SYSTEM_RULE_IDS[2],
        "Escalate effort overruns",
        TriggerKind::OnEffortChange,
        ActionNode::ExecuteMultiple {
            actions: vec![
                ActionNode::RequireRiskActionLog,
                ActionNode::CreateComment {
                    message: "Actual effort has reached the estimate; review scope and update \
                              the risk action log."
                        .to_string(),
                },
            ],
        },
    );
    workflow.description =
        Some("Initiatives at or past their effort estimate are flagged and annotated.".to_string());
    workflow.condition = Some(ConditionNode::And { children });
    workflow
}

// ---------------------------------------------------------------------------
// Merged catalog
// ---------------------------------------------------------------------------

/// All rules visible to the caller: system rules first, then custom
/// workflows, each group in its original relative order.
pub fn merged_catalog(root: &Path) -> Result<Vec<Workflow>> {
    let mut catalog = system_rules();
    catalog.extend(Workflow::list(root)?);
    tracing::debug!(total = catalog.len(), "catalog merged");
    Ok(catalog)
}

/// Find a workflow by id, checking system rules before disk.
pub fn find(root: &Path, id: &str) -> Result<Workflow> {
    if let Some(rule) = system_rules().into_iter().find(|w| w.id == id) {
        return Ok(rule);
    }
    Workflow::load(root, id)
}

// ---------------------------------------------------------------------------
// Boundary operations
// ---------------------------------------------------------------------------

fn guard_custom(id: &str, op: &str) -> Result<()> {
    if is_system_rule(id) {
        return Err(TillerError::WorkflowReadOnly {
            id: id.to_string(),
            op: op.to_string(),
        });
    }
    Ok(())
}

pub fn create_workflow(root: &Path, workflow: &Workflow) -> Result<()> {
    paths::validate_slug(&workflow.id)?;
    if is_system_rule(&workflow.id) {
        return Err(TillerError::WorkflowExists(workflow.id.clone()));
    }
    if workflow.system {
        return Err(TillerError::WorkflowReadOnly {
            id: workflow.id.clone(),
            op: "created".to_string(),
        });
    }
    if paths::workflow_path(root, &workflow.id).exists() {
        return Err(TillerError::WorkflowExists(workflow.id.clone()));
    }
    workflow.save(root)
}

/// Flip a custom workflow's enabled flag. Returns the new state.
pub fn toggle_workflow(root: &Path, id: &str) -> Result<bool> {
    guard_custom(id, "toggled")?;
    let mut workflow = Workflow::load(root, id)?;
    workflow.enabled = !workflow.enabled;
    workflow.save(root)?;
    Ok(workflow.enabled)
}

pub fn update_workflow(root: &Path, workflow: &Workflow) -> Result<()> {
    guard_custom(&workflow.id, "edited")?;
    // Must already exist; creation goes through create_workflow
    Workflow::load(root, &workflow.id)?;
    workflow.save(root)
}

pub fn delete_workflow(root: &Path, id: &str) -> Result<()> {
    guard_custom(id, "deleted")?;
    let path = paths::workflow_path(root, id);
    if !path.exists() {
        return Err(TillerError::WorkflowNotFound(id.to_string()));
    }
    std::fs::remove_file(path)?;
    Ok(())
}

/// Copy a custom workflow under a new id with fresh run state.
pub fn duplicate_workflow(root: &Path, id: &str, new_id: &str) -> Result<Workflow> {
    guard_custom(id, "duplicated")?;
    paths::validate_slug(new_id)?;
    if is_system_rule(new_id) || paths::workflow_path(root, new_id).exists() {
        return Err(TillerError::WorkflowExists(new_id.to_string()));
    }

    let source = Workflow::load(root, id)?;
    let mut copy = source.clone();
    copy.id = new_id.to_string();
    copy.created_at = Utc::now();
    copy.last_run = None;
    copy.run_count = 0;
    copy.execution_log.clear();
    copy.save(root)?;
    Ok(copy)
}

/// Persist a completed run against its workflow. System rules have no
/// storage slot, so their runs are not recorded; returns whether the log was
/// persisted.
pub fn record_run(root: &Path, workflow_id: &str, log: ExecutionLog) -> Result<bool> {
    if is_system_rule(workflow_id) {
        tracing::debug!(workflow = workflow_id, "system rule run not persisted");
        return Ok(false);
    }
    let mut workflow = Workflow::load(root, workflow_id)?;
    workflow.record_run(log);
    workflow.save(root)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn custom(id: &str) -> Workflow {
        Workflow::new(
            id,
            format!("Custom {id}"),
            TriggerKind::OnStatusChange,
            ActionNode::NotifyOwner,
            "u1",
        )
    }

    #[test]
    fn system_rule_ids_match_generator() {
        let generated: Vec<String> = system_rules().into_iter().map(|w| w.id).collect();
        assert_eq!(generated, SYSTEM_RULE_IDS);
    }

    #[test]
    fn system_rules_are_enabled_and_read_only() {
        for rule in system_rules() {
            assert!(rule.system, "{}", rule.id);
            assert!(rule.enabled, "{}", rule.id);
            assert!(rule.read_only, "{}", rule.id);
            assert!(rule.condition.is_some(), "{}", rule.id);
        }
    }

    #[test]
    fn system_rules_generated_fresh_each_call() {
        let first = system_rules();
        let second = system_rules();
        assert_eq!(first.len(), second.len());
        // Distinct generation timestamps prove there is no shared stored copy
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.id, b.id);
            assert!(a.created_at <= b.created_at);
        }
    }

    #[test]
    fn merged_catalog_is_system_first() {
        let dir = TempDir::new().unwrap();
        create_workflow(dir.path(), &custom("my-sweep")).unwrap();
        create_workflow(dir.path(), &custom("my-other-sweep")).unwrap();

        let catalog = merged_catalog(dir.path()).unwrap();
        assert_eq!(catalog.len(), SYSTEM_RULE_IDS.len() + 2);
        for (i, id) in SYSTEM_RULE_IDS.iter().enumerate() {
            assert_eq!(catalog[i].id, *id);
        }
        assert!(catalog[SYSTEM_RULE_IDS.len()..].iter().all(|w| !w.system));
    }

    #[test]
    fn toggle_rejects_system_rule() {
        let dir = TempDir::new().unwrap();
        let err = toggle_workflow(dir.path(), SYSTEM_RULE_IDS[0]).unwrap_err();
        assert!(matches!(err, TillerError::WorkflowReadOnly { .. }));
        assert!(err.to_string().contains("cannot be toggled"));
    }

    #[test]
    fn delete_and_duplicate_reject_system_rule() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            delete_workflow(dir.path(), SYSTEM_RULE_IDS[1]),
            Err(TillerError::WorkflowReadOnly { .. })
        ));
        assert!(matches!(
            duplicate_workflow(dir.path(), SYSTEM_RULE_IDS[1], "copy"),
            Err(TillerError::WorkflowReadOnly { .. })
        ));
    }

    #[test]
    fn custom_id_may_not_shadow_system_rule() {
        let dir = TempDir::new().unwrap();
        let shadow = custom(SYSTEM_RULE_IDS[0]);
        assert!(matches!(
            create_workflow(dir.path(), &shadow),
            Err(TillerError::WorkflowExists(_))
        ));
    }

    #[test]
    fn toggle_flips_enabled() {
        let dir = TempDir::new().unwrap();
        create_workflow(dir.path(), &custom("my-sweep")).unwrap();

        assert!(!toggle_workflow(dir.path(), "my-sweep").unwrap());
        assert!(toggle_workflow(dir.path(), "my-sweep").unwrap());
    }

    #[test]
    fn duplicate_resets_run_state() {
        let dir = TempDir::new().unwrap();
        let mut original = custom("my-sweep");
        original.record_run(ExecutionLog::new("my-sweep", Utc::now()));
        original.save(dir.path()).unwrap();

        let copy = duplicate_workflow(dir.path(), "my-sweep", "my-sweep-copy").unwrap();
        assert_eq!(copy.run_count, 0);
        assert!(copy.execution_log.is_empty());
        assert!(copy.last_run.is_none());

        let loaded = Workflow::load(dir.path(), "my-sweep-copy").unwrap();
        assert_eq!(loaded.name, "Custom my-sweep");
    }

    #[test]
    fn record_run_skips_system_rules() {
        let dir = TempDir::new().unwrap();
        let persisted = record_run(
            dir.path(),
            SYSTEM_RULE_IDS[0],
            ExecutionLog::new(SYSTEM_RULE_IDS[0], Utc::now()),
        )
        .unwrap();
        assert!(!persisted);
    }

    #[test]
    fn record_run_persists_custom_log() {
        let dir = TempDir::new().unwrap();
        create_workflow(dir.path(), &custom("my-sweep")).unwrap();

        let mut log = ExecutionLog::new("my-sweep", Utc::now());
        log.initiatives_affected.push("apac".to_string());
        let persisted = record_run(dir.path(), "my-sweep", log).unwrap();
        assert!(persisted);

        let loaded = Workflow::load(dir.path(), "my-sweep").unwrap();
        assert_eq!(loaded.run_count, 1);
        assert_eq!(loaded.execution_log.len(), 1);
        assert_eq!(loaded.execution_log[0].initiatives_affected, vec!["apac"]);
    }

    #[test]
    fn find_checks_system_rules_first() {
        let dir = TempDir::new().unwrap();
        let rule = find(dir.path(), SYSTEM_RULE_IDS[2]).unwrap();
        assert!(rule.system);
        assert!(matches!(
            find(dir.path(), "missing"),
            Err(TillerError::WorkflowNotFound(_))
        ));
    }
}
