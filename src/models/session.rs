use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{MessageRole, SessionStatus};

/// One check-in attempt.
///
/// Invariant: exactly one of `completed_at`/`expired_at` may be non-null;
/// `completed_at` is set iff `status == Completed`. Transitions form a
/// strict monotonic lattice: `active -> {completed, expired}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            started_at: Utc::now(),
            completed_at: None,
            expired_at: None,
            status: SessionStatus::Active,
        }
    }
}

/// One conversation turn. Ordered within a session by `created_at`
/// (strictly increasing; ties broken by insertion order via `sequence`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub audio_blob_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sequence: i64,
}
