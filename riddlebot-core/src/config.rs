// riddlebot-core/src/config.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use riddlebot_common::error::Error;
use riddlebot_common::models::features::FeatureGates;

use crate::services::cooldown::CooldownScope;

/// Templated replies for cooldown denials, one per scope. `{time}` is
/// substituted with the remaining seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownReplies {
    pub user: String,
    pub guild: String,
    pub global: String,
}

impl Default for CooldownReplies {
    fn default() -> Self {
        Self {
            user: "You are on cooldown. Try again in {time}s.".to_string(),
            guild: "This command is on cooldown for this server. Try again in {time}s.".to_string(),
            global: "This command is on global cooldown. Try again in {time}s.".to_string(),
        }
    }
}

impl CooldownReplies {
    pub fn for_scope(&self, scope: CooldownScope) -> &str {
        match scope {
            CooldownScope::User => &self.user,
            CooldownScope::Guild => &self.guild,
            CooldownScope::Global => &self.global,
        }
    }
}

/// Denial replies: a specific template per required-predicate reason string
/// (falling back to `general` when no specific one is configured), plus the
/// cooldown templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenialReplies {
    pub general: String,
    pub specific: HashMap<String, String>,
    pub cooldowns: CooldownReplies,
}

impl Default for DenialReplies {
    fn default() -> Self {
        let mut specific = HashMap::new();
        specific.insert(
            "isDisabled".to_string(),
            "This command is currently disabled.".to_string(),
        );
        Self {
            general: "You are not permitted to use this command.".to_string(),
            specific,
            cooldowns: CooldownReplies::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPrefix {
    pub guild_id: String,
    pub prefix: String,
}

/// Runtime configuration surface. Loadable from a JSON file; every field has
/// a usable default so tests can build one inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Default prefix for message commands.
    pub prefix: String,
    /// Per-guild prefix overrides.
    pub custom_prefixes: Vec<CustomPrefix>,
    /// User id allowed through `owner_only` definitions.
    pub owner_id: Option<String>,

    pub commands_folder: PathBuf,
    pub components_folder: PathBuf,
    pub events_folder: PathBuf,

    pub features: FeatureGates,
    pub replies: DenialReplies,

    /// Publish the registered command manifests to the remote endpoint
    /// during initialization.
    pub upload_commands: bool,
    /// Master switch for usage records. A record is emitted only when this
    /// is on, a usage repository is wired, and the definition opted in.
    pub log_command_usage: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            custom_prefixes: Vec::new(),
            owner_id: None,
            commands_folder: PathBuf::from("commands"),
            components_folder: PathBuf::from("components"),
            events_folder: PathBuf::from("events"),
            features: FeatureGates::all(),
            replies: DenialReplies::default(),
            upload_commands: false,
            log_command_usage: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// The effective message-command prefix for a guild, honoring per-guild
    /// overrides.
    pub fn prefix_for(&self, guild_id: Option<&str>) -> &str {
        if let Some(gid) = guild_id {
            if let Some(custom) = self.custom_prefixes.iter().find(|p| p.guild_id == gid) {
                return &custom.prefix;
            }
        }
        &self.prefix
    }

    pub fn denial_reply(&self, reason: Option<&str>) -> &str {
        reason
            .and_then(|r| self.replies.specific.get(r))
            .map(String::as_str)
            .unwrap_or(&self.replies.general)
    }
}
