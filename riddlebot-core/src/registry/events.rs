// riddlebot-core/src/registry/events.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use riddlebot_common::models::definition::{Definition, DefinitionKind};
use riddlebot_common::models::features::FeatureGates;

use crate::loader::{ModuleCache, load_all};

/// Lookup table for lifecycle event definitions, keyed by event name. Tracks
/// which event names are currently subscribed so the hosting runtime can
/// fire only the events actually enabled, and unsubscribes "once"
/// definitions as they are handed out for dispatch.
pub struct EventRegistry {
    handlers: RwLock<HashMap<String, Arc<Definition>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register_all(
        &self,
        cache: &ModuleCache,
        roots: &[PathBuf],
        features: &FeatureGates,
    ) {
        for (path, def) in load_all(cache, roots) {
            self.register_definition(def, &path, features).await;
        }
    }

    async fn register_definition(&self, def: Definition, path: &Path, features: &FeatureGates) {
        if def.kind != DefinitionKind::Event {
            error!(
                "Invalid event in module {}: kind {:?} is not an event",
                path.display(),
                def.kind
            );
            return;
        }
        if !features.kind_enabled(def.kind) {
            debug!(
                "Skipping event '{}' from {}: Events feature is disabled",
                def.name,
                path.display()
            );
            return;
        }
        let name = def.name.clone();
        if self
            .handlers
            .write()
            .await
            .insert(name.clone(), Arc::new(def))
            .is_some()
        {
            warn!(
                "Duplicate event name '{}' ({}); keeping the later definition",
                name,
                path.display()
            );
        }
    }

    pub async fn get(&self, name: &str) -> Option<Arc<Definition>> {
        self.handlers.read().await.get(name).cloned()
    }

    /// Resolves the definition for one dispatch of `name`. A `once`
    /// definition is unsubscribed as it is handed out, so it fires a single
    /// time.
    pub async fn resolve_for_dispatch(&self, name: &str) -> Option<Arc<Definition>> {
        let mut handlers = self.handlers.write().await;
        match handlers.get(name) {
            Some(def) if def.once => handlers.remove(name),
            Some(def) => Some(def.clone()),
            None => None,
        }
    }

    /// Event names with a live subscription.
    pub async fn subscribed_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn clear(&self) {
        self.handlers.write().await.clear();
    }

    pub async fn reload(&self, cache: &ModuleCache, roots: &[PathBuf], features: &FeatureGates) {
        self.clear().await;
        for root in roots {
            cache.invalidate(root);
        }
        self.register_all(cache, roots, features).await;
    }

    pub async fn len(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use riddlebot_common::error::Error;
    use riddlebot_common::models::context::Invocation;
    use riddlebot_common::models::definition::DefinitionHandler;
    use riddlebot_common::models::features::{Feature, FeatureGates};

    use crate::loader::StaticModuleSource;

    struct NoopHandler;

    #[async_trait]
    impl DefinitionHandler for NoopHandler {
        async fn execute(&self, _invocation: Invocation) -> Result<(), Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn tracks_subscribed_names() {
        let source = StaticModuleSource::new();
        source.insert("events/ready", || {
            Definition::event("ready", Arc::new(NoopHandler)).fire_once()
        });
        source.insert("events/member_join", || {
            Definition::event("member_join", Arc::new(NoopHandler))
        });
        let cache = ModuleCache::new(Arc::new(source));

        let registry = EventRegistry::new();
        registry
            .register_all(&cache, &[PathBuf::from("events")], &FeatureGates::all())
            .await;

        assert_eq!(registry.subscribed_names().await, vec!["member_join", "ready"]);
    }

    #[tokio::test]
    async fn once_events_unsubscribe_after_dispatch() {
        let source = StaticModuleSource::new();
        source.insert("events/ready", || {
            Definition::event("ready", Arc::new(NoopHandler)).fire_once()
        });
        let cache = ModuleCache::new(Arc::new(source));

        let registry = EventRegistry::new();
        registry
            .register_all(&cache, &[PathBuf::from("events")], &FeatureGates::all())
            .await;

        assert!(registry.resolve_for_dispatch("ready").await.is_some());
        assert!(registry.resolve_for_dispatch("ready").await.is_none());
    }

    #[tokio::test]
    async fn disabled_events_feature_registers_nothing() {
        let source = StaticModuleSource::new();
        source.insert("events/ready", || {
            Definition::event("ready", Arc::new(NoopHandler))
        });
        let cache = ModuleCache::new(Arc::new(source));

        let registry = EventRegistry::new();
        registry
            .register_all(
                &cache,
                &[PathBuf::from("events")],
                &FeatureGates::only(vec![Feature::SlashCommands]),
            )
            .await;
        assert_eq!(registry.len().await, 0);
    }
}
