use crate::error::Result;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How many change records the trail retains. Oldest entries are dropped on
/// append once the cap is reached.
pub const AUDIT_TRAIL_CAP: usize = 500;

// ---------------------------------------------------------------------------
// ChangeRecord
// ---------------------------------------------------------------------------

/// One recorded field change: who changed what, from which value to which,
/// and when. The engine reports changes through a callback; this is the
/// callback's persistent form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub initiative: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// AuditTrail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditTrail {
    #[serde(default)]
    pub entries: Vec<ChangeRecord>,
}

impl AuditTrail {
    /// A missing trail file is an empty trail, not an error; the first save
    /// creates it.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::audit_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let trail: AuditTrail = serde_yaml::from_str(&data)?;
        Ok(trail)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::audit_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn record(
        &mut self,
        initiative: impl Into<String>,
        field: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
        changed_by: impl Into<String>,
        changed_at: DateTime<Utc>,
    ) {
        self.entries.push(ChangeRecord {
            initiative: initiative.into(),
            field: field.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            changed_by: changed_by.into(),
            changed_at,
        });
        if self.entries.len() > AUDIT_TRAIL_CAP {
            let excess = self.entries.len() - AUDIT_TRAIL_CAP;
            self.entries.drain(..excess);
        }
    }

    pub fn for_initiative(&self, slug: &str) -> Vec<&ChangeRecord> {
        self.entries.iter().filter(|e| e.initiative == slug).collect()
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
    fn missing_file_is_empty_trail() {
        let dir = TempDir::new().unwrap();
        let trail = AuditTrail::load(dir.path()).unwrap();
        assert!(trail.entries.is_empty());
    }

    #[test]
    fn record_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut trail = AuditTrail::load(dir.path()).unwrap();
        trail.record(
            "apac-rollout",
            "status",
            "in_progress",
            "at_risk",
            "workflow:sys-overdue-at-risk",
            Utc::now(),
        );
        trail.save(dir.path()).unwrap();

        let loaded = AuditTrail::load(dir.path()).unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].field, "status");
        assert_eq!(loaded.entries[0].changed_by, "workflow:sys-overdue-at-risk");
    }

    #[test]
    fn trims_to_cap_fifo() {
        let mut trail = AuditTrail::default();
        let now = Utc::now();
        for i in 0..(AUDIT_TRAIL_CAP + 25) {
            trail.record("x", "field", i.to_string(), (i + 1).to_string(), "u1", now);
        }
        assert_eq!(trail.entries.len(), AUDIT_TRAIL_CAP);
        assert_eq!(trail.entries[0].old_value, "25", "oldest entries dropped");
    }

    #[test]
    fn for_initiative_filters() {
        let mut trail = AuditTrail::default();
        let now = Utc::now();
        trail.record("a", "status", "x", "y", "u1", now);
        trail.record("b", "status", "x", "y", "u1", now);
        trail.record("a", "priority", "P2", "P0", "u1", now);

        let entries = trail.for_initiative("a");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.initiative == "a"));
    }
}
