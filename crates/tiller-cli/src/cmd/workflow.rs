use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::Utc;
use clap::Subcommand;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tiller_core::action::ActionNode;
use tiller_core::audit::AuditTrail;
use tiller_core::catalog;
use tiller_core::condition::ConditionNode;
use tiller_core::initiative::Initiative;
use tiller_core::runner;
use tiller_core::scope::ScopeFilter;
use tiller_core::types::TriggerKind;
use tiller_core::workflow::Workflow;

#[derive(Subcommand)]
pub enum WorkflowSubcommand {
    /// Create a workflow from a YAML definition file
    Create {
        /// Path to the definition (id, name, trigger, action, optional
        /// scope/condition/trigger_config)
        file: PathBuf,
        #[arg(long, default_value = "cli")]
        created_by: String,
    },
    /// List the catalog (system rules first, then custom workflows)
    List,
    /// Show one workflow in full
    Show { id: String },
    /// Enable or disable a custom workflow
    Toggle { id: String },
    /// Delete a custom workflow
    Delete { id: String },
    /// Copy a custom workflow under a new id with fresh run state
    Duplicate { id: String, new_id: String },
    /// Run a workflow against all initiatives now
    Run {
        id: String,
        /// Report which initiatives would match without mutating anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Show a workflow's recent execution log
    Log { id: String },
}

/// The authorable subset of a workflow. Run state and the system/read-only
/// flags are never read from the definition file.
#[derive(Debug, Deserialize)]
struct WorkflowDefinition {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    trigger: TriggerKind,
    #[serde(default)]
    trigger_config: Option<serde_yaml::Value>,
    #[serde(default)]
    scope: Option<ScopeFilter>,
    #[serde(default)]
    condition: Option<ConditionNode>,
    action: ActionNode,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

pub fn run(root: &Path, subcmd: WorkflowSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        WorkflowSubcommand::Create { file, created_by } => create(root, &file, &created_by, json),
        WorkflowSubcommand::List => list(root, json),
        WorkflowSubcommand::Show { id } => {
            let workflow = catalog::find(root, &id)?;
            if json {
                print_json(&workflow)?;
            } else {
                print!("{}", serde_yaml::to_string(&workflow)?);
            }
            Ok(())
        }
        WorkflowSubcommand::Toggle { id } => {
            let enabled = catalog::toggle_workflow(root, &id)?;
            if json {
                print_json(&serde_json::json!({ "id": id, "enabled": enabled }))?;
            } else {
                println!(
                    "Workflow '{}' is now {}",
                    id,
                    if enabled { "enabled" } else { "disabled" }
                );
            }
            Ok(())
        }
        WorkflowSubcommand::Delete { id } => {
            catalog::delete_workflow(root, &id)?;
            if !json {
                println!("Deleted workflow '{}'", id);
            }
            Ok(())
        }
        WorkflowSubcommand::Duplicate { id, new_id } => {
            let copy = catalog::duplicate_workflow(root, &id, &new_id)?;
            if json {
                print_json(&copy)?;
            } else {
                println!("Duplicated '{}' as '{}'", id, copy.id);
            }
            Ok(())
        }
        WorkflowSubcommand::Run { id, dry_run } => execute(root, &id, dry_run, json),
        WorkflowSubcommand::Log { id } => log(root, &id, json),
    }
}

fn create(root: &Path, file: &Path, created_by: &str, json: bool) -> anyhow::Result<()> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let def: WorkflowDefinition =
        serde_yaml::from_str(&data).context("invalid workflow definition")?;

    let mut workflow = Workflow::new(def.id, def.name, def.trigger, def.action, created_by);
    workflow.description = def.description;
    workflow.trigger_config = def.trigger_config;
    workflow.scope = def.scope;
    workflow.condition = def.condition;
    workflow.enabled = def.enabled;

    catalog::create_workflow(root, &workflow)?;

    if json {
        print_json(&workflow)?;
    } else {
        println!("Created workflow '{}': {}", workflow.id, workflow.name);
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let workflows = catalog::merged_catalog(root)?;
    if json {
        return print_json(&workflows);
    }

    let rows: Vec<Vec<String>> = workflows
        .iter()
        .map(|w| {
            vec![
                w.id.clone(),
                w.name.clone(),
                w.trigger.to_string(),
                (if w.enabled { "yes" } else { "no" }).to_string(),
                (if w.system { "system" } else { "custom" }).to_string(),
                w.run_count.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "TRIGGER", "ENABLED", "KIND", "RUNS"], rows);
    Ok(())
}

fn execute(root: &Path, id: &str, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let workflow = catalog::find(root, id)?;
    let mut initiatives = Initiative::list(root)?;

    if dry_run {
        let matches = runner::preview(&workflow, &initiatives)?;
        if json {
            print_json(&serde_json::json!({ "id": id, "would_affect": matches }))?;
        } else if matches.is_empty() {
            println!("Workflow '{}' would affect no initiatives", workflow.name);
        } else {
            println!(
                "Workflow '{}' would affect {} initiative(s):",
                workflow.name,
                matches.len()
            );
            for slug in matches {
                println!("  {slug}");
            }
        }
        return Ok(());
    }

    if !workflow.enabled && !json {
        println!("note: workflow '{}' is disabled; running anyway", workflow.id);
    }

    let mut trail = AuditTrail::load(root)?;
    let changed_by = format!("workflow:{}", workflow.id);
    let mut recorder = |rec: &Initiative, field: &str, old: &str, new: &str| {
        trail.record(rec.slug.clone(), field, old, new, changed_by.clone(), Utc::now());
    };
    let log = runner::execute(&workflow, &mut initiatives, &mut recorder);

    Initiative::save_all(root, &initiatives).context("failed to write back initiatives")?;
    trail.save(root).context("failed to write audit trail")?;
    let persisted = catalog::record_run(root, &workflow.id, log.clone())?;

    if json {
        print_json(&log)?;
        return Ok(());
    }

    println!(
        "Workflow '{}' affected {} initiative(s)",
        workflow.name,
        log.initiatives_affected.len()
    );
    for action in &log.actions_taken {
        println!("  {action}");
    }
    if !log.errors.is_empty() {
        println!("Errors:");
        for error in &log.errors {
            println!("  {error}");
        }
    }
    if !persisted {
        println!("(system rule: run log not persisted)");
    }
    Ok(())
}

fn log(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let workflow = catalog::find(root, id)?;
    if json {
        return print_json(&workflow.execution_log);
    }

    if workflow.execution_log.is_empty() {
        println!("No recorded runs for '{}'", workflow.id);
        return Ok(());
    }
    let rows: Vec<Vec<String>> = workflow
        .execution_log
        .iter()
        .map(|entry| {
            vec![
                entry.timestamp.to_rfc3339(),
                entry.initiatives_affected.len().to_string(),
                entry.errors.len().to_string(),
            ]
        })
        .collect();
    print_table(&["TIMESTAMP", "AFFECTED", "ERRORS"], rows);
    Ok(())
}
