use crate::error::{Result, TillerError};
use crate::initiative::Initiative;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ScopeFilter
// ---------------------------------------------------------------------------

/// Pre-filter narrowing which initiatives a workflow considers, independent
/// of its condition tree. Every *present* sub-filter must pass; each passes
/// when the record's value is a member of the given set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_classes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<String>>,
}

impl ScopeFilter {
    /// A present sub-filter with an empty value list can never match anything;
    /// it is an authoring error and is fatal to the whole run.
    pub fn validate(&self) -> Result<()> {
        for (name, values) in [
            ("asset_classes", &self.asset_classes),
            ("work_types", &self.work_types),
            ("owners", &self.owners),
        ] {
            if let Some(v) = values {
                if v.is_empty() {
                    return Err(TillerError::ScopeFilter(format!(
                        "{name} is present but empty"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn matches(&self, initiative: &Initiative) -> bool {
        if let Some(classes) = &self.asset_classes {
            if !classes.contains(&initiative.asset_class) {
                return false;
            }
        }
        if let Some(types) = &self.work_types {
            if !types.contains(&initiative.work_type) {
                return false;
            }
        }
        if let Some(owners) = &self.owners {
            if !owners.contains(&initiative.owner) {
                return false;
            }
        }
        true
    }
}

/// Narrow a snapshot to the records in scope. An absent scope is the
/// identity: same elements, same order. Pure and order-preserving.
pub fn filter_by_scope<'a>(
    initiatives: &'a [Initiative],
    scope: Option<&ScopeFilter>,
) -> Vec<&'a Initiative> {
    match scope {
        None => initiatives.iter().collect(),
        Some(s) => initiatives.iter().filter(|i| s.matches(i)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
