use anyhow::Context;
use std::path::Path;
use tiller_core::{audit::AuditTrail, config::Config, io, paths};

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "portfolio".to_string());

    println!("Initializing tiller in: {}", root.display());

    let dirs = [paths::TILLER_DIR, paths::INITIATIVES_DIR, paths::WORKFLOWS_DIR];
    for dir in dirs {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        let cfg = Config::new(&project_name);
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: .tiller/config.yaml");
    } else {
        println!("  exists:  .tiller/config.yaml");
    }

    let audit_path = paths::audit_path(root);
    if !audit_path.exists() {
        let trail = AuditTrail::default();
        trail.save(root).context("failed to write audit.yaml")?;
        println!("  created: .tiller/audit.yaml");
    } else {
        println!("  exists:  .tiller/audit.yaml");
    }

    Ok(())
}
