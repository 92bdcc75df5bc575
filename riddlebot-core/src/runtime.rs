// riddlebot-core/src/runtime.rs
use std::slice;
use std::sync::Arc;

use tracing::{debug, error};

use riddlebot_common::error::Error;
use riddlebot_common::models::context::InboundEvent;
use riddlebot_common::models::definition::RegisterScope;
use riddlebot_common::models::features::Feature;
use riddlebot_common::traits::{CommandManifestApi, CommandUsageRepository, ReplySink};

use crate::config::RuntimeConfig;
use crate::loader::{ModuleCache, ModuleSource};
use crate::registry::{CommandRegistry, ComponentRegistry, EventRegistry};
use crate::services::cooldown::CooldownLedger;
use crate::services::deploy::CommandDeployer;
use crate::services::dispatcher::Dispatcher;

/// Owns every piece of per-process state: the module cache, the typed
/// registries, the cooldown ledger, and the dispatcher's collaborators.
/// Explicitly constructed and passed around rather than global, so tests
/// can run isolated instances side by side.
pub struct Runtime {
    pub config: Arc<RuntimeConfig>,
    pub cache: Arc<ModuleCache>,
    pub commands: Arc<CommandRegistry>,
    pub components: Arc<ComponentRegistry>,
    pub events: Arc<EventRegistry>,
    pub ledger: Arc<CooldownLedger>,
    dispatcher: Dispatcher,
    deployer: Option<CommandDeployer>,
}

impl Runtime {
    pub fn new(
        config: RuntimeConfig,
        source: Arc<dyn ModuleSource>,
        reply_sink: Arc<dyn ReplySink>,
        usage_repo: Option<Arc<dyn CommandUsageRepository>>,
        manifest_api: Option<Arc<dyn CommandManifestApi>>,
    ) -> Self {
        debug!("Initializing runtime");
        let config = Arc::new(config);
        let cache = Arc::new(ModuleCache::new(source));
        let commands = Arc::new(CommandRegistry::new());
        let components = Arc::new(ComponentRegistry::new());
        let events = Arc::new(EventRegistry::new());
        let ledger = Arc::new(CooldownLedger::new());
        let dispatcher = Dispatcher::new(
            config.clone(),
            commands.clone(),
            components.clone(),
            events.clone(),
            ledger.clone(),
            reply_sink,
            usage_repo,
        );
        let deployer = manifest_api.map(CommandDeployer::new);
        Self {
            config,
            cache,
            commands,
            components,
            events,
            ledger,
            dispatcher,
            deployer,
        }
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.config.features.is_enabled(feature)
    }

    fn command_features_enabled(&self) -> bool {
        self.is_enabled(Feature::SlashCommands)
            || self.is_enabled(Feature::ContextMenus)
            || self.is_enabled(Feature::PrefixCommands)
    }

    fn component_features_enabled(&self) -> bool {
        self.is_enabled(Feature::Buttons)
            || self.is_enabled(Feature::SelectMenus)
            || self.is_enabled(Feature::Modals)
    }

    /// Registers every enabled definition family: events first, then
    /// commands (publishing the manifests when `upload_commands` is set),
    /// then components. A failed upload is logged and does not undo the
    /// in-process registrations.
    pub async fn initialize(&self) -> Result<(), Error> {
        let features = &self.config.features;
        if self.is_enabled(Feature::Events) {
            self.events
                .register_all(&self.cache, slice::from_ref(&self.config.events_folder), features)
                .await;
        }
        if self.command_features_enabled() {
            self.commands
                .register_all(
                    &self.cache,
                    slice::from_ref(&self.config.commands_folder),
                    features,
                )
                .await;
            if self.config.upload_commands {
                if let Err(e) = self.deploy_commands().await {
                    error!("Command upload failed during initialization: {e}");
                }
            }
        }
        if self.component_features_enabled() {
            self.components
                .register_all(
                    &self.cache,
                    slice::from_ref(&self.config.components_folder),
                    features,
                )
                .await;
        }
        Ok(())
    }

    /// Publishes the guild-scoped and global-scoped manifest lists.
    pub async fn deploy_commands(&self) -> Result<(), Error> {
        let Some(deployer) = &self.deployer else {
            return Err(Error::Sync(
                "no command manifest endpoint configured".to_string(),
            ));
        };
        deployer.deploy(RegisterScope::Guild, &self.commands).await?;
        deployer.deploy(RegisterScope::Global, &self.commands).await?;
        Ok(())
    }

    pub async fn delete_commands(
        &self,
        scope: RegisterScope,
        command_ids: &[String],
    ) -> Result<(), Error> {
        let Some(deployer) = &self.deployer else {
            return Err(Error::Sync(
                "no command manifest endpoint configured".to_string(),
            ));
        };
        deployer.delete(scope, command_ids).await
    }

    pub async fn reload_commands(&self) {
        if !self.command_features_enabled() {
            return;
        }
        self.commands
            .reload(
                &self.cache,
                slice::from_ref(&self.config.commands_folder),
                &self.config.features,
            )
            .await;
    }

    pub async fn reload_components(&self) {
        if !self.component_features_enabled() {
            return;
        }
        self.components
            .reload(
                &self.cache,
                slice::from_ref(&self.config.components_folder),
                &self.config.features,
            )
            .await;
    }

    pub async fn reload_events(&self) {
        if !self.is_enabled(Feature::Events) {
            return;
        }
        self.events
            .reload(
                &self.cache,
                slice::from_ref(&self.config.events_folder),
                &self.config.features,
            )
            .await;
    }

    /// Routes one inbound event through the dispatcher.
    pub async fn handle_event(&self, event: InboundEvent) {
        self.dispatcher.handle_event(event).await;
    }
}
