// src/lib.rs

pub mod config;
pub mod loader;
pub mod registry;
pub mod runtime;
pub mod services;

pub use config::RuntimeConfig;
pub use riddlebot_common::error::Error;
pub use runtime::Runtime;
