use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author id recorded on comments left by the automation engine.
pub const SYSTEM_AUTHOR: &str = "system";

/// Prefix stamped on engine-authored comment bodies so they are
/// distinguishable from human notes in any rendering.
pub const AUTOMATED_PREFIX: &str = "[Automated] ";

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Append a comment and return its auto-generated ID.
///
/// `seq` is a monotonic counter stored on the owning initiative. Incrementing
/// it before generating the ID keeps IDs unique even if comments are ever
/// removed, which a length-based scheme would not.
pub fn add_comment(
    comments: &mut Vec<Comment>,
    seq: &mut u32,
    author: impl Into<String>,
    body: impl Into<String>,
    at: DateTime<Utc>,
) -> String {
    *seq += 1;
    let id = format!("C{}", *seq);
    comments.push(Comment {
        id: id.clone(),
        author: author.into(),
        body: body.into(),
        created_at: at,
    });
    id
}

/// Append an engine-authored comment. The body is prefixed with
/// [`AUTOMATED_PREFIX`] and the author is [`SYSTEM_AUTHOR`]. Repeated runs
/// append repeatedly; automated comments are a log, not a deduplicated note.
pub fn add_system_comment(
    comments: &mut Vec<Comment>,
    seq: &mut u32,
    message: &str,
    at: DateTime<Utc>,
) -> String {
    add_comment(
        comments,
        seq,
        SYSTEM_AUTHOR,
        format!("{AUTOMATED_PREFIX}{message}"),
        at,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
