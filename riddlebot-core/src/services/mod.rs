// File: src/services/mod.rs

pub mod access;
pub mod cooldown;
pub mod deploy;
pub mod dispatcher;

pub use access::{AccessDecision, AccessValidator, DenyReason};
pub use cooldown::{CooldownLedger, CooldownScope, CooldownStatus};
pub use deploy::CommandDeployer;
pub use dispatcher::Dispatcher;
