use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use std::path::Path;
use tiller_core::comment;
use tiller_core::initiative::Initiative;
use tiller_core::types::{Priority, Status};

#[derive(Subcommand)]
pub enum InitiativeSubcommand {
    /// Create an initiative
    Create {
        slug: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        asset_class: Option<String>,
        #[arg(long)]
        work_type: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        eta: Option<NaiveDate>,
        #[arg(long)]
        estimated_effort: Option<f64>,
    },
    /// List initiatives
    List,
    /// Show one initiative in full
    Show { slug: String },
    /// Update fields on an initiative
    Update {
        slug: String,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        eta: Option<NaiveDate>,
        #[arg(long)]
        actual_effort: Option<f64>,
        #[arg(long)]
        estimated_effort: Option<f64>,
        #[arg(long)]
        risk_log: Option<String>,
    },
    /// Add a comment to an initiative
    Comment {
        slug: String,
        #[arg(required = true)]
        body: Vec<String>,
        #[arg(long, default_value = "cli")]
        author: String,
    },
}

pub fn run(root: &Path, subcmd: InitiativeSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        InitiativeSubcommand::Create {
            slug,
            title,
            description,
            owner,
            asset_class,
            work_type,
            priority,
            eta,
            estimated_effort,
        } => {
            let mut initiative = Initiative::create(root, &slug, &title)
                .with_context(|| format!("failed to create initiative '{slug}'"))?;
            initiative.description = description;
            if let Some(owner) = owner {
                initiative.owner = owner;
            }
            if let Some(asset_class) = asset_class {
                initiative.asset_class = asset_class;
            }
            if let Some(work_type) = work_type {
                initiative.work_type = work_type;
            }
            if let Some(priority) = priority {
                initiative.priority = priority;
            }
            initiative.eta = eta;
            if let Some(estimate) = estimated_effort {
                initiative.estimated_effort = estimate;
            }
            initiative.save(root)?;

            if json {
                print_json(&initiative)?;
            } else {
                println!("Created initiative '{}': {}", initiative.slug, initiative.title);
            }
            Ok(())
        }
        InitiativeSubcommand::List => list(root, json),
        InitiativeSubcommand::Show { slug } => {
            let initiative = Initiative::load(root, &slug)?;
            if json {
                print_json(&initiative)?;
            } else {
                print!("{}", serde_yaml::to_string(&initiative)?);
            }
            Ok(())
        }
        InitiativeSubcommand::Update {
            slug,
            status,
            priority,
            owner,
            eta,
            actual_effort,
            estimated_effort,
            risk_log,
        } => {
            let mut initiative = Initiative::load(root, &slug)?;
            if let Some(status) = status {
                initiative.status = status;
            }
            if let Some(priority) = priority {
                initiative.priority = priority;
            }
            if let Some(owner) = owner {
                initiative.owner = owner;
            }
            if let Some(eta) = eta {
                initiative.eta = Some(eta);
            }
            if let Some(actual) = actual_effort {
                initiative.actual_effort = actual;
            }
            if let Some(estimate) = estimated_effort {
                initiative.estimated_effort = estimate;
            }
            if let Some(risk_log) = risk_log {
                initiative.risk_action_log = Some(risk_log);
            }
            initiative.touch();
            initiative.save(root)?;

            if json {
                print_json(&initiative)?;
            } else {
                println!("Updated initiative '{}'", slug);
            }
            Ok(())
        }
        InitiativeSubcommand::Comment { slug, body, author } => {
            let mut initiative = Initiative::load(root, &slug)?;
            let id = comment::add_comment(
                &mut initiative.comments,
                &mut initiative.next_comment_seq,
                author,
                body.join(" "),
                Utc::now(),
            );
            initiative.touch();
            initiative.save(root)?;

            if json {
                print_json(&serde_json::json!({ "slug": slug, "comment_id": id }))?;
            } else {
                println!("Added comment [{id}] to '{slug}'");
            }
            Ok(())
        }
    }
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let initiatives = Initiative::list(root)?;
    if json {
        return print_json(&initiatives);
    }

    let rows: Vec<Vec<String>> = initiatives
        .iter()
        .map(|i| {
            vec![
                i.slug.clone(),
                i.title.clone(),
                i.status.label().to_string(),
                i.priority.to_string(),
                i.owner.clone(),
                i.eta.map(|d| d.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["SLUG", "TITLE", "STATUS", "PRIORITY", "OWNER", "ETA"], rows);
    Ok(())
}
