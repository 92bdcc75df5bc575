// riddlebot-core/src/services/deploy.rs
use std::sync::Arc;

use tracing::{error, info};

use riddlebot_common::error::Error;
use riddlebot_common::models::definition::RegisterScope;
use riddlebot_common::traits::CommandManifestApi;

use crate::registry::CommandRegistry;

/// Pushes the registered command manifests to the remote endpoint. Failures
/// are logged and surfaced as `Error::Sync`; nothing is retried and the
/// in-process registrations are unaffected either way.
pub struct CommandDeployer {
    api: Arc<dyn CommandManifestApi>,
}

impl CommandDeployer {
    pub fn new(api: Arc<dyn CommandManifestApi>) -> Self {
        Self { api }
    }

    pub async fn deploy(
        &self,
        scope: RegisterScope,
        registry: &CommandRegistry,
    ) -> Result<(), Error> {
        let manifests = registry.scoped_manifests(scope).await;
        match self.api.publish(scope, &manifests).await {
            Ok(()) => {
                info!(
                    "Successfully uploaded {} {:?} command(s).",
                    manifests.len(),
                    scope
                );
                Ok(())
            }
            Err(e) => {
                error!("Error uploading {:?} commands: {e}", scope);
                Err(Error::Sync(e.to_string()))
            }
        }
    }

    pub async fn delete(&self, scope: RegisterScope, command_ids: &[String]) -> Result<(), Error> {
        match self.api.delete(scope, command_ids).await {
            Ok(()) => {
                info!(
                    "Successfully deleted {} {:?} command(s).",
                    command_ids.len(),
                    scope
                );
                Ok(())
            }
            Err(e) => {
                error!("Error deleting {:?} commands: {e}", scope);
                Err(Error::Sync(e.to_string()))
            }
        }
    }
}
