use thiserror::Error;

#[derive(Debug, Error)]
pub enum TillerError {
    #[error("not initialized: run 'tiller init'")]
    NotInitialized,

    #[error("initiative not found: {0}")]
    InitiativeNotFound(String),

    #[error("initiative already exists: {0}")]
    InitiativeExists(String),

    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("workflow already exists: {0}")]
    WorkflowExists(String),

    #[error("system workflow '{id}' is read-only and cannot be {op}")]
    WorkflowReadOnly { id: String, op: String },

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid priority: {0}")]
    InvalidPriority(String),

    #[error("invalid trigger: {0}")]
    InvalidTrigger(String),

    #[error("malformed scope filter: {0}")]
    ScopeFilter(String),

    #[error("{0}")]
    ActionFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TillerError>;
