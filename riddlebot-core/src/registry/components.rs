// riddlebot-core/src/registry/components.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use riddlebot_common::models::definition::{Definition, DefinitionKind};
use riddlebot_common::models::features::FeatureGates;

use crate::loader::{ModuleCache, load_all};

/// Typed lookup tables for the component family, keyed by custom-id:
/// buttons, select menus, and modals.
pub struct ComponentRegistry {
    button: RwLock<HashMap<String, Arc<Definition>>>,
    select_menu: RwLock<HashMap<String, Arc<Definition>>>,
    modal: RwLock<HashMap<String, Arc<Definition>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            button: RwLock::new(HashMap::new()),
            select_menu: RwLock::new(HashMap::new()),
            modal: RwLock::new(HashMap::new()),
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
        let map = match def.kind {
            DefinitionKind::Button => &self.button,
            DefinitionKind::SelectMenu => &self.select_menu,
            DefinitionKind::Modal => &self.modal,
            other => {
                error!(
                    "Invalid component in module {}: kind {:?} is not a component",
                    path.display(),
                    other
                );
                return;
            }
        };
        if !features.kind_enabled(def.kind) {
            debug!(
                "Skipping '{}' from {}: {:?} feature is disabled",
                def.name,
                path.display(),
                def.kind
            );
            return;
        }
        let custom_id = def.name.clone();
        if map
            .write()
            .await
            .insert(custom_id.clone(), Arc::new(def))
            .is_some()
        {
            warn!(
                "Duplicate component custom-id '{}' ({}); keeping the later definition",
                custom_id,
                path.display()
            );
        }
    }

    pub async fn get_button(&self, custom_id: &str) -> Option<Arc<Definition>> {
        self.button.read().await.get(custom_id).cloned()
    }

    pub async fn get_select_menu(&self, custom_id: &str) -> Option<Arc<Definition>> {
        self.select_menu.read().await.get(custom_id).cloned()
    }

    pub async fn get_modal(&self, custom_id: &str) -> Option<Arc<Definition>> {
        self.modal.read().await.get(custom_id).cloned()
    }

    pub async fn clear(&self) {
        self.button.write().await.clear();
        self.select_menu.write().await.clear();
        self.modal.write().await.clear();
    }

    pub async fn reload(&self, cache: &ModuleCache, roots: &[PathBuf], features: &FeatureGates) {
        self.clear().await;
        for root in roots {
            cache.invalidate(root);
        }
        self.register_all(cache, roots, features).await;
    }

    pub async fn len(&self) -> usize {
        self.button.read().await.len()
            + self.select_menu.read().await.len()
            + self.modal.read().await.len()
    }
}

impl Default for ComponentRegistry {
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
    use riddlebot_common::models::features::Feature;

    use crate::loader::StaticModuleSource;

    struct NoopHandler;

    #[async_trait]
    impl DefinitionHandler for NoopHandler {
        async fn execute(&self, _invocation: Invocation) -> Result<(), Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn registers_components_by_custom_id() {
        let source = StaticModuleSource::new();
        source.insert("components/confirm", || {
            Definition::button("confirm", Arc::new(NoopHandler))
        });
        source.insert("components/pick", || {
            Definition::select_menu("pick", Arc::new(NoopHandler))
        });
        source.insert("components/ask", || {
            Definition::modal("ask", Arc::new(NoopHandler))
        });
        let cache = ModuleCache::new(Arc::new(source));

        let registry = ComponentRegistry::new();
        registry
            .register_all(&cache, &[PathBuf::from("components")], &FeatureGates::all())
            .await;

        assert!(registry.get_button("confirm").await.is_some());
        assert!(registry.get_select_menu("pick").await.is_some());
        assert!(registry.get_modal("ask").await.is_some());
        assert!(registry.get_button("pick").await.is_none());
    }

    #[tokio::test]
    async fn feature_gating_per_component_kind() {
        let source = StaticModuleSource::new();
        source.insert("components/confirm", || {
            Definition::button("confirm", Arc::new(NoopHandler))
        });
        source.insert("components/ask", || {
            Definition::modal("ask", Arc::new(NoopHandler))
        });
        let cache = ModuleCache::new(Arc::new(source));

        let registry = ComponentRegistry::new();
        registry
            .register_all(
                &cache,
                &[PathBuf::from("components")],
                &FeatureGates::only(vec![Feature::Buttons]),
            )
            .await;

        assert!(registry.get_button("confirm").await.is_some());
        assert!(registry.get_modal("ask").await.is_none());
    }
}
