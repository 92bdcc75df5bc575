// riddlebot-common/src/models/usage.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Log record emitted when a user invokes a command that opted into usage
/// logging. Persisted through `CommandUsageRepository`; best-effort only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandUsage {
    pub usage_id: Uuid,
    pub command_name: String,
    /// Human-readable kind label ("Slash Command", "Prefix Command", ...).
    pub command_kind: String,
    pub user_id: String,
    pub channel: Option<String>,
    pub guild: Option<String>,
    pub used_at: DateTime<Utc>,
    pub usage_text: Option<String>,
}
