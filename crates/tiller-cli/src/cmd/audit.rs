use crate::output::{print_json, print_table};
use std::path::Path;
use tiller_core::audit::AuditTrail;

pub fn run(root: &Path, initiative: Option<&str>, json: bool) -> anyhow::Result<()> {
    let trail = AuditTrail::load(root)?;
    let entries: Vec<_> = match initiative {
        Some(slug) => trail.for_initiative(slug),
        None => trail.entries.iter().collect(),
    };

    if json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("No recorded changes");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.changed_at.to_rfc3339(),
                e.initiative.clone(),
                e.field.clone(),
                e.old_value.clone(),
                e.new_value.clone(),
                e.changed_by.clone(),
            ]
        })
        .collect();
    print_table(
        &["TIMESTAMP", "INITIATIVE", "FIELD", "OLD", "NEW", "BY"],
        rows,
    );
    Ok(())
}
