// riddlebot-common/src/models/features.rs
use serde::{Deserialize, Serialize};

use crate::models::definition::DefinitionKind;

/// Feature switches gating which definition kinds get registered,
/// dispatched, and reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feature {
    All,
    Events,
    SlashCommands,
    PrefixCommands,
    ContextMenus,
    Buttons,
    SelectMenus,
    Modals,
}

impl Feature {
    pub fn for_kind(kind: DefinitionKind) -> Feature {
        match kind {
            DefinitionKind::Slash => Feature::SlashCommands,
            DefinitionKind::Context => Feature::ContextMenus,
            DefinitionKind::Prefix => Feature::PrefixCommands,
            DefinitionKind::Button => Feature::Buttons,
            DefinitionKind::SelectMenu => Feature::SelectMenus,
            DefinitionKind::Modal => Feature::Modals,
            DefinitionKind::Event => Feature::Events,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureGates {
    #[serde(default)]
    pub enabled: Vec<Feature>,
    #[serde(default)]
    pub disabled: Vec<Feature>,
}

impl FeatureGates {
    pub fn all() -> Self {
        Self {
            enabled: vec![Feature::All],
            disabled: Vec::new(),
        }
    }

    pub fn only(features: Vec<Feature>) -> Self {
        Self {
            enabled: features,
            disabled: Vec::new(),
        }
    }

    /// A feature is on when the enabled list names it (or `All`) and the
    /// disabled list does not.
    pub fn is_enabled(&self, feature: Feature) -> bool {
        (self.enabled.contains(&feature) || self.enabled.contains(&Feature::All))
            && !self.disabled.contains(&feature)
    }

    pub fn kind_enabled(&self, kind: DefinitionKind) -> bool {
        self.is_enabled(Feature::for_kind(kind))
    }
}
