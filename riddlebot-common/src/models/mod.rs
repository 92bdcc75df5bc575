// File: riddlebot-common/src/models/mod.rs
pub mod context;
pub mod definition;
pub mod features;
pub mod usage;

pub use context::{InboundEvent, Invocation, InvocationArgs, InvocationContext};
pub use definition::{
    AccessRules, CooldownSpec, Definition, DefinitionHandler, DefinitionKind, RegisterScope,
};
pub use features::{Feature, FeatureGates};
pub use usage::CommandUsage;
