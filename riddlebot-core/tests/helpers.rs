// tests/helpers.rs
//! Shared test doubles for the integration tests.
#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use riddlebot_common::error::Error;
use riddlebot_common::models::context::{Invocation, InvocationArgs, InvocationContext};
use riddlebot_common::models::definition::{DefinitionHandler, RegisterScope};
use riddlebot_common::models::usage::CommandUsage;
use riddlebot_common::traits::{CommandManifestApi, CommandUsageRepository, ReplySink};

/// Records every reply the dispatcher sends.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, context: &InvocationContext, text: &str) -> Result<(), Error> {
        self.sent
            .lock()
            .unwrap()
            .push((context.user_id.clone(), text.to_string()));
        Ok(())
    }
}

/// Records inserted usage rows; optionally fails every insert.
#[derive(Default)]
pub struct RecordingUsageRepo {
    pub usages: Mutex<Vec<CommandUsage>>,
    pub fail: bool,
}

#[async_trait]
impl CommandUsageRepository for RecordingUsageRepo {
    async fn insert_usage(&self, usage: &CommandUsage) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Platform("usage store unavailable".to_string()));
        }
        self.usages.lock().unwrap().push(usage.clone());
        Ok(())
    }
}

/// Records manifest publishes/deletes; optionally fails every call.
#[derive(Default)]
pub struct RecordingManifestApi {
    pub published: Mutex<Vec<(RegisterScope, usize)>>,
    pub deleted: Mutex<Vec<(RegisterScope, Vec<String>)>>,
    pub fail: bool,
}

#[async_trait]
impl CommandManifestApi for RecordingManifestApi {
    async fn publish(
        &self,
        scope: RegisterScope,
        manifests: &[serde_json::Value],
    ) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Sync("remote endpoint unavailable".to_string()));
        }
        self.published.lock().unwrap().push((scope, manifests.len()));
        Ok(())
    }

    async fn delete(&self, scope: RegisterScope, command_ids: &[String]) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Sync("remote endpoint unavailable".to_string()));
        }
        self.deleted
            .lock()
            .unwrap()
            .push((scope, command_ids.to_vec()));
        Ok(())
    }
}

/// Counts executions, remembers the last arguments, and can be told to fail,
/// panic, or advertise autocomplete support.
#[derive(Default)]
pub struct ProbeHandler {
    pub calls: AtomicUsize,
    pub autocomplete_calls: AtomicUsize,
    pub fail: bool,
    pub panics: bool,
    pub supports_autocomplete: bool,
    pub last_args: Mutex<Option<InvocationArgs>>,
}

impl ProbeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Default::default()
        }
    }

    pub fn with_autocomplete() -> Self {
        Self {
            supports_autocomplete: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn autocomplete_count(&self) -> usize {
        self.autocomplete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DefinitionHandler for ProbeHandler {
    async fn execute(&self, invocation: Invocation) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_args.lock().unwrap() = Some(invocation.args);
        if self.panics {
            panic!("handler blew up");
        }
        if self.fail {
            return Err(Error::Handler("handler exploded".to_string()));
        }
        Ok(())
    }

    async fn autocomplete(&self, _invocation: Invocation) -> Result<(), Error> {
        self.autocomplete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn has_autocomplete(&self) -> bool {
        self.supports_autocomplete
    }
}

/// A guild-channel invocation context for user `u1`.
pub fn guild_context() -> InvocationContext {
    InvocationContext {
        user_id: "u1".to_string(),
        channel_id: Some("c1".to_string()),
        category_id: Some("cat1".to_string()),
        guild_id: Some("g1".to_string()),
        role_ids: vec!["r1".to_string()],
        channel_nsfw: false,
    }
}
