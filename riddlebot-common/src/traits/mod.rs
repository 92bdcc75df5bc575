// riddlebot-common/src/traits/mod.rs
use async_trait::async_trait;

use crate::error::Error;
use crate::models::context::InvocationContext;
use crate::models::definition::RegisterScope;
use crate::models::usage::CommandUsage;

/// Remote command-manifest endpoint. Publish replaces the whole list for a
/// scope; delete removes individual entries by remote id. Both are treated
/// as idempotent by the framework: failures are logged and surfaced, never
/// retried internally.
#[async_trait]
pub trait CommandManifestApi: Send + Sync {
    async fn publish(
        &self,
        scope: RegisterScope,
        manifests: &[serde_json::Value],
    ) -> Result<(), Error>;

    async fn delete(&self, scope: RegisterScope, command_ids: &[String]) -> Result<(), Error>;
}

/// Persistence seam for command usage records.
#[async_trait]
pub trait CommandUsageRepository: Send + Sync {
    async fn insert_usage(&self, usage: &CommandUsage) -> Result<(), Error>;
}

/// Outbound reply seam used for denial messages. The sink decides what
/// "reply to this event" means for the hosting platform (ephemeral
/// interaction response, channel message, ...).
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, context: &InvocationContext, text: &str) -> Result<(), Error>;
}
