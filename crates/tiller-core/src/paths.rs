use crate::error::{Result, TillerError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const TILLER_DIR: &str = ".tiller";
pub const INITIATIVES_DIR: &str = ".tiller/initiatives";
pub const WORKFLOWS_DIR: &str = ".tiller/workflows";

pub const CONFIG_FILE: &str = ".tiller/config.yaml";
pub const AUDIT_FILE: &str = ".tiller/audit.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn tiller_dir(root: &Path) -> PathBuf {
    root.join(TILLER_DIR)
}

pub fn initiative_path(root: &Path, slug: &str) -> PathBuf {
    root.join(INITIATIVES_DIR).join(format!("{slug}.yaml"))
}

pub fn workflow_path(root: &Path, id: &str) -> PathBuf {
    root.join(WORKFLOWS_DIR).join(format!("{id}.yaml"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn audit_path(root: &Path) -> PathBuf {
    root.join(AUDIT_FILE)
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(TillerError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
