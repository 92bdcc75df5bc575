// riddlebot-common/src/models/definition.rs
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::context::Invocation;

/// Closed set of definition kinds the runtime recognizes. Registries switch
/// on this tag to decide which lookup map a definition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionKind {
    Slash,
    Context,
    Prefix,
    Button,
    SelectMenu,
    Modal,
    Event,
}

impl DefinitionKind {
    /// Human-readable label used in usage records and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            DefinitionKind::Slash => "Slash Command",
            DefinitionKind::Context => "Context Menu",
            DefinitionKind::Prefix => "Prefix Command",
            DefinitionKind::Button => "Button",
            DefinitionKind::SelectMenu => "Select Menu",
            DefinitionKind::Modal => "Modal",
            DefinitionKind::Event => "Event",
        }
    }
}

/// Which remote manifest list a Slash/Context definition belongs to.
/// Meaningless for the other kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterScope {
    Guild,
    Global,
}

/// Access predicates attached to a definition. Every present required-group
/// predicate must pass; if any optional-group predicate is present, at least
/// one of them must match. Absent predicates are vacuously true.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessRules {
    pub allowed_users: Option<Vec<String>>,
    pub blocked_users: Option<Vec<String>>,
    pub allowed_channels: Option<Vec<String>>,
    pub blocked_channels: Option<Vec<String>>,
    pub allowed_categories: Option<Vec<String>>,
    pub blocked_categories: Option<Vec<String>>,
    pub allowed_guilds: Option<Vec<String>>,
    pub blocked_guilds: Option<Vec<String>>,
    pub allowed_roles: Option<Vec<String>>,
    pub blocked_roles: Option<Vec<String>>,
    pub owner_only: bool,
    pub nsfw_only: bool,

    pub optional_allowed_users: Option<Vec<String>>,
    pub optional_allowed_channels: Option<Vec<String>>,
    pub optional_allowed_categories: Option<Vec<String>>,
    pub optional_allowed_guilds: Option<Vec<String>>,
    pub optional_allowed_roles: Option<Vec<String>>,
}

/// Per-scope cooldown thresholds in seconds. `None` means no throttling at
/// that scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownSpec {
    pub user_seconds: Option<u64>,
    pub guild_seconds: Option<u64>,
    pub global_seconds: Option<u64>,
}

impl CooldownSpec {
    pub fn is_empty(&self) -> bool {
        self.user_seconds.is_none() && self.guild_seconds.is_none() && self.global_seconds.is_none()
    }
}

/// The executable behavior of a definition. Opaque to the framework beyond
/// this trait; errors are caught at the dispatch boundary and never
/// propagate past it.
#[async_trait]
pub trait DefinitionHandler: Send + Sync {
    async fn execute(&self, invocation: Invocation) -> Result<(), Error>;

    /// Secondary sub-behavior for Slash definitions. Autocomplete requests
    /// bypass the access gate and the cooldown ledger so they stay
    /// responsive.
    async fn autocomplete(&self, _invocation: Invocation) -> Result<(), Error> {
        Err(Error::Handler("autocomplete not implemented".to_string()))
    }

    fn has_autocomplete(&self) -> bool {
        false
    }
}

/// Adapter so plain async closures can serve as handlers.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> DefinitionHandler for FnHandler<F>
where
    F: Fn(Invocation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    async fn execute(&self, invocation: Invocation) -> Result<(), Error> {
        (self.0)(invocation).await
    }
}

/// An immutable description of one invokable unit: a command, a UI
/// component, or a lifecycle event. Created once at load time; a reload
/// destroys and recreates the whole set.
#[derive(Clone)]
pub struct Definition {
    pub kind: DefinitionKind,
    /// Identity within the kind's registry: command name, custom-id, or
    /// event name.
    pub name: String,
    /// Alternate names resolving to this definition (prefix commands only).
    pub aliases: Vec<String>,
    pub scope: RegisterScope,
    pub disabled: bool,
    /// Lifecycle events only: fire a single time, then unsubscribe.
    pub once: bool,
    pub log_usage: bool,
    /// Opaque payload handed to the remote manifest publisher.
    pub manifest: Option<serde_json::Value>,
    pub access: AccessRules,
    pub cooldowns: CooldownSpec,
    pub handler: Arc<dyn DefinitionHandler>,
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl Definition {
    pub fn new(
        kind: DefinitionKind,
        name: impl Into<String>,
        handler: Arc<dyn DefinitionHandler>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            aliases: Vec::new(),
            scope: RegisterScope::Guild,
            disabled: false,
            once: false,
            log_usage: false,
            manifest: None,
            access: AccessRules::default(),
            cooldowns: CooldownSpec::default(),
            handler,
        }
    }

    pub fn slash(name: impl Into<String>, handler: Arc<dyn DefinitionHandler>) -> Self {
        Self::new(DefinitionKind::Slash, name, handler)
    }

    pub fn context_menu(name: impl Into<String>, handler: Arc<dyn DefinitionHandler>) -> Self {
        Self::new(DefinitionKind::Context, name, handler)
    }

    pub fn prefix(name: impl Into<String>, handler: Arc<dyn DefinitionHandler>) -> Self {
        Self::new(DefinitionKind::Prefix, name, handler)
    }

    pub fn button(custom_id: impl Into<String>, handler: Arc<dyn DefinitionHandler>) -> Self {
        Self::new(DefinitionKind::Button, custom_id, handler)
    }

    pub fn select_menu(custom_id: impl Into<String>, handler: Arc<dyn DefinitionHandler>) -> Self {
        Self::new(DefinitionKind::SelectMenu, custom_id, handler)
    }

    pub fn modal(custom_id: impl Into<String>, handler: Arc<dyn DefinitionHandler>) -> Self {
        Self::new(DefinitionKind::Modal, custom_id, handler)
    }

    pub fn event(name: impl Into<String>, handler: Arc<dyn DefinitionHandler>) -> Self {
        Self::new(DefinitionKind::Event, name, handler)
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_scope(mut self, scope: RegisterScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_access(mut self, access: AccessRules) -> Self {
        self.access = access;
        self
    }

    pub fn with_cooldowns(mut self, cooldowns: CooldownSpec) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    pub fn with_manifest(mut self, manifest: serde_json::Value) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn set_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn fire_once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn with_usage_logging(mut self) -> Self {
        self.log_usage = true;
        self
    }
}
