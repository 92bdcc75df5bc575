// File: riddlebot-core/src/registry/mod.rs

pub mod commands;
pub mod components;
pub mod events;

pub use commands::CommandRegistry;
pub use components::ComponentRegistry;
pub use events::EventRegistry;
