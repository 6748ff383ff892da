use crate::output::print_json;
use clap::Subcommand;
use std::path::Path;
use tiller_core::catalog;
use tiller_core::config::{Config, WarnLevel};

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,
    /// Lint the configuration and the workflow catalog
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => {
            let cfg = Config::load(root)?;
            if json {
                print_json(&cfg)?;
            } else {
                print!("{}", serde_yaml::to_string(&cfg)?);
            }
            Ok(())
        }
        ConfigSubcommand::Validate => {
            let cfg = Config::load(root)?;
            let workflows = catalog::merged_catalog(root)?;
            let warnings = cfg.validate(&workflows);

            if json {
                print_json(&warnings)?;
            } else if warnings.is_empty() {
                println!("Configuration is valid");
            } else {
                for w in &warnings {
                    let level = match w.level {
                        WarnLevel::Warning => "warning",
                        WarnLevel::Error => "error",
                    };
                    println!("{level}: {}", w.message);
                }
            }

            if warnings.iter().any(|w| w.level == WarnLevel::Error) {
                anyhow::bail!("configuration has errors");
            }
            Ok(())
        }
    }
}
