use crate::comment::Comment;
use crate::error::{Result, TillerError};
use crate::paths;
use crate::types::{Priority, Status};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Initiative
// ---------------------------------------------------------------------------

/// A tracked work item: the record the workflow engine reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Initiative {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub asset_class: String,
    #[serde(default)]
    pub work_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_effort: f64,
    /// Missing effort is treated as zero everywhere the engine reads it.
    #[serde(default)]
    pub actual_effort: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_action_log: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub next_comment_seq: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Initiative {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            slug: slug.into(),
            title: title.into(),
            description: None,
            status: Status::NotStarted,
            priority: Priority::P2,
            owner: String::new(),
            asset_class: String::new(),
            work_type: String::new(),
            eta: None,
            estimated_effort: 0.0,
            actual_effort: 0.0,
            risk_action_log: None,
            comments: Vec::new(),
            next_comment_seq: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when the risk/action log is absent or blank after trimming.
    pub fn risk_log_blank(&self) -> bool {
        self.risk_action_log
            .as_deref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn create(root: &Path, slug: impl Into<String>, title: impl Into<String>) -> Result<Self> {
        let slug = slug.into();
        paths::validate_slug(&slug)?;

        let path = paths::initiative_path(root, &slug);
        if path.exists() {
            return Err(TillerError::InitiativeExists(slug));
        }

        let initiative = Self::new(slug, title);
        initiative.save(root)?;
        Ok(initiative)
    }

    pub fn load(root: &Path, slug: &str) -> Result<Self> {
        let path = paths::initiative_path(root, slug);
        if !path.exists() {
            return Err(TillerError::InitiativeNotFound(slug.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let initiative: Initiative = serde_yaml::from_str(&data)?;
        Ok(initiative)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::initiative_path(root, &self.slug);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let dir = root.join(paths::INITIATIVES_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut initiatives = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let data = std::fs::read_to_string(&path)?;
            let initiative: Initiative = serde_yaml::from_str(&data)?;
            initiatives.push(initiative);
        }
        initiatives.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(initiatives)
    }

    /// Persist every element of a mutated snapshot. Used after a workflow run
    /// to write back in-place mutations.
    pub fn save_all(root: &Path, initiatives: &[Initiative]) -> Result<()> {
        for initiative in initiatives {
            initiative.save(root)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let initiative = Initiative::create(dir.path(), "mobile-refresh", "Mobile Refresh").unwrap();
        assert_eq!(initiative.status, Status::NotStarted);
        assert_eq!(initiative.priority, Priority::P2);

        let loaded = Initiative::load(dir.path(), "mobile-refresh").unwrap();
        assert_eq!(loaded.title, "Mobile Refresh");
        assert!(loaded.eta.is_none());
    }

    #[test]
    fn create_duplicate_fails() {
        let dir = TempDir::new().unwrap();
        Initiative::create(dir.path(), "apac", "APAC").unwrap();
        assert!(matches!(
            Initiative::create(dir.path(), "apac", "APAC Again"),
            Err(TillerError::InitiativeExists(_))
        ));
    }

    #[test]
    fn load_missing_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Initiative::load(dir.path(), "nope"),
            Err(TillerError::InitiativeNotFound(_))
        ));
    }

    #[test]
    fn list_sorted_by_created_at() {
        let dir = TempDir::new().unwrap();
        let mut a = Initiative::new("a", "A");
        let mut b = Initiative::new("b", "B");
        a.created_at = Utc::now() - chrono::Duration::days(2);
        b.created_at = Utc::now() - chrono::Duration::days(5);
        a.save(dir.path()).unwrap();
        b.save(dir.path()).unwrap();

        let all = Initiative::list(dir.path()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].slug, "b");
        assert_eq!(all[1].slug, "a");
    }

    #[test]
    fn risk_log_blank_trims() {
        let mut initiative = Initiative::new("x", "X");
        assert!(initiative.risk_log_blank());
        initiative.risk_action_log = Some("   ".to_string());
        assert!(initiative.risk_log_blank());
        initiative.risk_action_log = Some("mitigation underway".to_string());
        assert!(!initiative.risk_log_blank());
    }

    #[test]
    fn missing_effort_defaults_to_zero() {
        let yaml = "slug: x\ntitle: X\nstatus: not_started\npriority: P2\n\
                    created_at: 2026-01-01T00:00:00Z\nupdated_at: 2026-01-01T00:00:00Z\n";
        let initiative: Initiative = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(initiative.estimated_effort, 0.0);
        assert_eq!(initiative.actual_effort, 0.0);
        assert!(initiative.owner.is_empty());
    }
}
