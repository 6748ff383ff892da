use crate::error::{Result, TillerError};
use crate::paths;
use crate::types::TriggerKind;
use crate::workflow::Workflow;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// AutomationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Master switch consulted by whatever schedules workflow runs; manual
    /// runs ignore it.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Fallback channel for notify actions that name none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_channel: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            default_channel: None,
        }
    }
}

// ---------------------------------------------------------------------------
// VocabularyConfig
// ---------------------------------------------------------------------------

/// Known values for the fields scope filters test membership against.
/// Empty lists disable the corresponding check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyConfig {
    #[serde(default)]
    pub asset_classes: Vec<String>,
    #[serde(default)]
    pub work_types: Vec<String>,
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            automation: AutomationConfig::default(),
            vocabulary: VocabularyConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(TillerError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Lint the configuration together with the workflows it governs.
    pub fn validate(&self, workflows: &[Workflow]) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.project.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "project name is empty".to_string(),
            });
        }

        if let Some(channel) = &self.automation.default_channel {
            if channel.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "automation.default_channel is blank".to_string(),
                });
            }
        }

        for workflow in workflows {
            // Scheduled workflows need a schedule for the dispatcher to read
            if workflow.trigger == TriggerKind::OnSchedule && workflow.trigger_config.is_none() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "workflow '{}' is on_schedule but has no trigger config",
                        workflow.id
                    ),
                });
            }

            if let Some(scope) = &workflow.scope {
                self.check_vocabulary(
                    &workflow.id,
                    "asset class",
                    scope.asset_classes.as_deref(),
                    &self.vocabulary.asset_classes,
                    &mut warnings,
                );
                self.check_vocabulary(
                    &workflow.id,
                    "work type",
                    scope.work_types.as_deref(),
                    &self.vocabulary.work_types,
                    &mut warnings,
                );
            }
        }

        warnings
    }

    fn check_vocabulary(
        &self,
        workflow_id: &str,
        label: &str,
        scoped: Option<&[String]>,
        known: &[String],
        warnings: &mut Vec<ConfigWarning>,
    ) {
        if known.is_empty() {
            return;
        }
        let Some(scoped) = scoped else {
            return;
        };
        for value in scoped {
            if !known.contains(value) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "workflow '{workflow_id}' scopes on unknown {label} '{value}'"
                    ),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
