// riddlebot-common/src/models/context.rs
use std::collections::HashMap;

/// Everything the access gate and cooldown ledger need to know about the
/// actor behind an inbound event. Resolved by the hosting runtime before the
/// dispatcher ever sees the event; the framework never queries a store for
/// any of these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    pub user_id: String,
    pub channel_id: Option<String>,
    /// Parent category of the channel, when the channel has one.
    pub category_id: Option<String>,
    /// The guild the event occurred in, if any. Absent for DMs.
    pub guild_id: Option<String>,
    pub role_ids: Vec<String>,
    pub channel_nsfw: bool,
}

impl InvocationContext {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}

/// Kind-specific payload handed to a definition's handler.
#[derive(Debug, Clone)]
pub enum InvocationArgs {
    Slash {
        options: serde_json::Value,
    },
    Autocomplete {
        focused: String,
        input: String,
    },
    Context {
        target_id: String,
    },
    Prefix {
        args: Vec<String>,
    },
    Button {
        /// The part of the custom-id after `:`, when present.
        unique_id: Option<String>,
    },
    SelectMenu {
        values: Vec<String>,
        unique_ids: Vec<Option<String>>,
    },
    Modal {
        fields: HashMap<String, String>,
    },
    Event {
        payload: serde_json::Value,
    },
}

/// What a handler receives: the resolved actor context plus the
/// kind-specific arguments.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub context: InvocationContext,
    pub args: InvocationArgs,
}

/// One inbound platform event, already decoded by the hosting runtime.
/// The dispatcher resolves each variant to a registered definition.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    SlashCommand {
        name: String,
        context: InvocationContext,
        options: serde_json::Value,
    },
    Autocomplete {
        name: String,
        context: InvocationContext,
        focused: String,
        input: String,
    },
    ContextAction {
        name: String,
        context: InvocationContext,
        target_id: String,
    },
    /// A raw chat message; the dispatcher applies prefix resolution.
    Message {
        content: String,
        author_is_bot: bool,
        context: InvocationContext,
    },
    Button {
        custom_id: String,
        context: InvocationContext,
    },
    SelectMenu {
        custom_id: String,
        values: Vec<String>,
        context: InvocationContext,
    },
    ModalSubmit {
        custom_id: String,
        fields: HashMap<String, String>,
        context: InvocationContext,
    },
    /// A platform lifecycle event (ready, member-join, ...), fanned out to
    /// every subscribed event definition.
    Lifecycle {
        name: String,
        payload: serde_json::Value,
    },
}
