use crate::action::ActionNode;
use crate::condition::ConditionNode;
use crate::error::{Result, TillerError};
use crate::paths;
use crate::runner::ExecutionLog;
use crate::scope::ScopeFilter;
use crate::types::TriggerKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How many execution-log entries a workflow retains. Older entries are
/// evicted in FIFO order on each append.
pub const EXECUTION_LOG_CAP: usize = 10;

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// An automation rule: trigger + optional scope + optional condition tree +
/// action tree.
///
/// Custom workflows are persisted one file per id under
/// `.tiller/workflows/`. System rules are synthesized fresh on every catalog
/// read and never touch disk; see `catalog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub trigger: TriggerKind,
    /// Free-form; its shape depends on `trigger` and only an external
    /// scheduler interprets it. Round-trips opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_config: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionNode>,
    pub action: ActionNode,
    pub enabled: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub read_only: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub run_count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub execution_log: Vec<ExecutionLog>,
}

impl Workflow {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        trigger: TriggerKind,
        action: ActionNode,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            trigger,
            trigger_config: None,
            scope: None,
            condition: None,
            action,
            enabled: true,
            system: false,
            read_only: false,
            created_by: created_by.into(),
            created_at: Utc::now(),
            last_run: None,
            run_count: 0,
            execution_log: Vec::new(),
        }
    }

    /// A system rule is always enabled and read-only.
    pub fn system_rule(
        id: impl Into<String>,
        name: impl Into<String>,
        trigger: TriggerKind,
        action: ActionNode,
    ) -> Self {
        let mut workflow = Self::new(id, name, trigger, action, crate::comment::SYSTEM_AUTHOR);
        workflow.system = true;
        workflow.read_only = true;
        workflow
    }

    /// Fold a completed run into this workflow's stats and bounded log.
    pub fn record_run(&mut self, log: ExecutionLog) {
        self.last_run = Some(log.timestamp);
        self.run_count += 1;
        self.execution_log.push(log);
        if self.execution_log.len() > EXECUTION_LOG_CAP {
            let excess = self.execution_log.len() - EXECUTION_LOG_CAP;
            self.execution_log.drain(..excess);
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence (custom workflows only)
    // ---------------------------------------------------------------------------

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        let path = paths::workflow_path(root, id);
        if !path.exists() {
            return Err(TillerError::WorkflowNotFound(id.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let workflow: Workflow = serde_yaml::from_str(&data)?;
        Ok(workflow)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        if self.system {
            return Err(TillerError::WorkflowReadOnly {
                id: self.id.clone(),
                op: "saved".to_string(),
            });
        }
        let path = paths::workflow_path(root, &self.id);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let dir = root.join(paths::WORKFLOWS_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut workflows = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let data = std::fs::read_to_string(&path)?;
            let workflow: Workflow = serde_yaml::from_str(&data)?;
            workflows.push(workflow);
        }
        workflows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(workflows)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
