// riddlebot-core/src/registry/commands.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use riddlebot_common::models::definition::{Definition, DefinitionKind, RegisterScope};
use riddlebot_common::models::features::FeatureGates;

use crate::loader::{ModuleCache, load_all};

/// Typed lookup tables for the command family: slash commands, context-menu
/// actions, and prefix commands (with an alias map resolving alternate
/// names to the canonical one).
pub struct CommandRegistry {
    slash: RwLock<HashMap<String, Arc<Definition>>>,
    context: RwLock<HashMap<String, Arc<Definition>>>,
    prefix: RwLock<HashMap<String, Arc<Definition>>>,
    prefix_aliases: RwLock<HashMap<String, String>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            slash: RwLock::new(HashMap::new()),
            context: RwLock::new(HashMap::new()),
            prefix: RwLock::new(HashMap::new()),
            prefix_aliases: RwLock::new(HashMap::new()),
        }
    }

    /// Discovers and loads every module under `roots` and registers the
    /// recognized, feature-enabled command definitions. Invalid modules are
    /// logged and skipped; the batch never aborts.
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
        match def.kind {
            DefinitionKind::Slash | DefinitionKind::Context | DefinitionKind::Prefix => {}
            other => {
                error!(
                    "Invalid command in module {}: kind {:?} is not a command",
                    path.display(),
                    other
                );
                return;
            }
        }
        if !features.kind_enabled(def.kind) {
            debug!(
                "Skipping '{}' from {}: {:?} feature is disabled",
                def.name,
                path.display(),
                def.kind
            );
            return;
        }

        let name = def.name.clone();
        let def = Arc::new(def);
        let previous = match def.kind {
            DefinitionKind::Slash => self.slash.write().await.insert(name.clone(), def.clone()),
            DefinitionKind::Context => self.context.write().await.insert(name.clone(), def.clone()),
            DefinitionKind::Prefix => {
                let prev = self.prefix.write().await.insert(name.clone(), def.clone());
                if !def.aliases.is_empty() {
                    let mut aliases = self.prefix_aliases.write().await;
                    for alias in &def.aliases {
                        aliases.insert(alias.clone(), name.clone());
                    }
                }
                prev
            }
            _ => unreachable!(),
        };
        if previous.is_some() {
            warn!(
                "Duplicate command identity '{}' ({}); keeping the later definition",
                name,
                path.display()
            );
        }
    }

    pub async fn get_slash(&self, name: &str) -> Option<Arc<Definition>> {
        self.slash.read().await.get(name).cloned()
    }

    pub async fn get_context(&self, name: &str) -> Option<Arc<Definition>> {
        self.context.read().await.get(name).cloned()
    }

    /// Resolves a prefix command by name or alias.
    pub async fn resolve_prefix(&self, name: &str) -> Option<Arc<Definition>> {
        let canonical = {
            let aliases = self.prefix_aliases.read().await;
            aliases.get(name).cloned()
        };
        let prefix = self.prefix.read().await;
        match canonical {
            Some(canonical) => prefix.get(&canonical).cloned(),
            None => prefix.get(name).cloned(),
        }
    }

    /// Manifest payloads of every Slash/Context definition registered for
    /// `scope`, for the remote publisher.
    pub async fn scoped_manifests(&self, scope: RegisterScope) -> Vec<serde_json::Value> {
        let mut manifests = Vec::new();
        for map in [&self.slash, &self.context] {
            let guard = map.read().await;
            manifests.extend(
                guard
                    .values()
                    .filter(|d| d.scope == scope)
                    .filter_map(|d| d.manifest.clone()),
            );
        }
        manifests
    }

    pub async fn clear(&self) {
        self.slash.write().await.clear();
        self.context.write().await.clear();
        self.prefix.write().await.clear();
        self.prefix_aliases.write().await.clear();
    }

    /// Wipes the registry once, invalidates the loader cache for every
    /// root, then re-runs registration. Per-root failures are logged inside
    /// `register_all` and do not leave the wipe half-applied.
    pub async fn reload(&self, cache: &ModuleCache, roots: &[PathBuf], features: &FeatureGates) {
        self.clear().await;
        for root in roots {
            cache.invalidate(root);
        }
        self.register_all(cache, roots, features).await;
    }

    pub async fn len(&self) -> usize {
        self.slash.read().await.len()
            + self.context.read().await.len()
            + self.prefix.read().await.len()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
