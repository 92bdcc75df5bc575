// riddlebot-core/src/services/dispatcher.rs
//!
//! Resolves inbound events to registered definitions and runs them through
//! the access gate and the cooldown ledger before execution. Handler
//! failures are contained here: one bad handler never takes down event
//! processing for subsequent events.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use riddlebot_common::error::Error;
use riddlebot_common::models::context::{
    InboundEvent, Invocation, InvocationArgs, InvocationContext,
};
use riddlebot_common::models::definition::{Definition, DefinitionKind};
use riddlebot_common::models::usage::CommandUsage;
use riddlebot_common::traits::{CommandUsageRepository, ReplySink};

use crate::config::RuntimeConfig;
use crate::registry::{CommandRegistry, ComponentRegistry, EventRegistry};
use crate::services::access::AccessValidator;
use crate::services::cooldown::{CooldownLedger, CooldownStatus};

pub struct Dispatcher {
    config: Arc<RuntimeConfig>,
    commands: Arc<CommandRegistry>,
    components: Arc<ComponentRegistry>,
    events: Arc<EventRegistry>,
    ledger: Arc<CooldownLedger>,
    reply_sink: Arc<dyn ReplySink>,
    usage_repo: Option<Arc<dyn CommandUsageRepository>>,
}

impl Dispatcher {
    pub fn new(
        config: Arc<RuntimeConfig>,
        commands: Arc<CommandRegistry>,
        components: Arc<ComponentRegistry>,
        events: Arc<EventRegistry>,
        ledger: Arc<CooldownLedger>,
        reply_sink: Arc<dyn ReplySink>,
        usage_repo: Option<Arc<dyn CommandUsageRepository>>,
    ) -> Self {
        Self {
            config,
            commands,
            components,
            events,
            ledger,
            reply_sink,
            usage_repo,
        }
    }

    /// Entry point for one inbound event, processed to completion. Ordering
    /// within the event (gate, ledger, handler, usage record) is strict;
    /// nothing here returns an error to the hosting runtime.
    pub async fn handle_event(&self, event: InboundEvent) {
        match event {
            InboundEvent::SlashCommand {
                name,
                context,
                options,
            } => self.handle_slash(&name, context, options).await,
            InboundEvent::Autocomplete {
                name,
                context,
                focused,
                input,
            } => self.handle_autocomplete(&name, context, focused, input).await,
            InboundEvent::ContextAction {
                name,
                context,
                target_id,
            } => self.handle_context_action(&name, context, target_id).await,
            InboundEvent::Message {
                content,
                author_is_bot,
                context,
            } => self.handle_message(&content, author_is_bot, context).await,
            InboundEvent::Button { custom_id, context } => {
                self.handle_button(&custom_id, context).await
            }
            InboundEvent::SelectMenu {
                custom_id,
                values,
                context,
            } => self.handle_select_menu(&custom_id, values, context).await,
            InboundEvent::ModalSubmit {
                custom_id,
                fields,
                context,
            } => self.handle_modal(&custom_id, fields, context).await,
            InboundEvent::Lifecycle { name, payload } => {
                self.handle_lifecycle(&name, payload).await
            }
        }
    }

    async fn handle_slash(
        &self,
        name: &str,
        context: InvocationContext,
        options: serde_json::Value,
    ) {
        let Some(def) = self.commands.get_slash(name).await else {
            // Stale remote manifest entries land here; not an error state.
            warn!("No slash command matching '{name}' was found.");
            return;
        };
        if !self.check_command_permission(&def, &context).await {
            return;
        }
        let usage_text = (!options.is_null()).then(|| options.to_string());
        let invocation = Invocation {
            context: context.clone(),
            args: InvocationArgs::Slash { options },
        };
        let handler = def.handler.clone();
        self.contained(&def, async move { handler.execute(invocation).await })
            .await;
        self.send_usage_log(&def, &context, name, usage_text).await;
    }

    /// Autocomplete bypasses the gate and the ledger entirely so it stays
    /// responsive; it only runs the handler's secondary behavior.
    async fn handle_autocomplete(
        &self,
        name: &str,
        context: InvocationContext,
        focused: String,
        input: String,
    ) {
        let Some(def) = self.commands.get_slash(name).await else {
            warn!("No slash command matching '{name}' was found.");
            return;
        };
        if !def.handler.has_autocomplete() {
            warn!("No autocomplete in '{name}' was found.");
            return;
        }
        let invocation = Invocation {
            context,
            args: InvocationArgs::Autocomplete { focused, input },
        };
        let handler = def.handler.clone();
        self.contained(&def, async move { handler.autocomplete(invocation).await })
            .await;
    }

    async fn handle_context_action(
        &self,
        name: &str,
        context: InvocationContext,
        target_id: String,
    ) {
        let Some(def) = self.commands.get_context(name).await else {
            warn!("No context menu matching '{name}' was found.");
            return;
        };
        if !self.check_command_permission(&def, &context).await {
            return;
        }
        let invocation = Invocation {
            context: context.clone(),
            args: InvocationArgs::Context {
                target_id: target_id.clone(),
            },
        };
        let handler = def.handler.clone();
        self.contained(&def, async move { handler.execute(invocation).await })
            .await;
        self.send_usage_log(&def, &context, name, Some(target_id))
            .await;
    }

    async fn handle_message(
        &self,
        content: &str,
        author_is_bot: bool,
        context: InvocationContext,
    ) {
        if author_is_bot {
            return;
        }
        let prefix = self.config.prefix_for(context.guild_id.as_deref());
        // An empty prefix would match every message.
        if prefix.is_empty() {
            return;
        }
        let Some(rest) = content.strip_prefix(prefix) else {
            return;
        };
        let mut tokens = rest.split_whitespace();
        let Some(name) = tokens.next() else {
            return;
        };
        let args: Vec<String> = tokens.map(str::to_string).collect();

        let Some(def) = self.commands.resolve_prefix(name).await else {
            return;
        };
        if !self.check_command_permission(&def, &context).await {
            return;
        }
        let usage_text = (!args.is_empty()).then(|| args.join(" "));
        let invocation = Invocation {
            context: context.clone(),
            args: InvocationArgs::Prefix { args },
        };
        let handler = def.handler.clone();
        self.contained(&def, async move { handler.execute(invocation).await })
            .await;
        let canonical = def.name.clone();
        self.send_usage_log(&def, &context, &canonical, usage_text)
            .await;
    }

    async fn handle_button(&self, custom_id: &str, context: InvocationContext) {
        let (id, unique_id) = split_custom_id(custom_id);
        let Some(def) = self.components.get_button(id).await else {
            debug!("No button matching '{id}' was found.");
            return;
        };
        let invocation = Invocation {
            context: context.clone(),
            args: InvocationArgs::Button {
                unique_id: unique_id.map(str::to_string),
            },
        };
        self.run_component(&def, &context, invocation).await;
    }

    async fn handle_select_menu(
        &self,
        custom_id: &str,
        raw_values: Vec<String>,
        context: InvocationContext,
    ) {
        let Some(def) = self.components.get_select_menu(custom_id).await else {
            debug!("No select menu matching '{custom_id}' was found.");
            return;
        };
        let mut values = Vec::with_capacity(raw_values.len());
        let mut unique_ids = Vec::with_capacity(raw_values.len());
        for raw in &raw_values {
            let (value, unique) = split_custom_id(raw);
            values.push(value.to_string());
            unique_ids.push(unique.map(str::to_string));
        }
        let invocation = Invocation {
            context: context.clone(),
            args: InvocationArgs::SelectMenu { values, unique_ids },
        };
        self.run_component(&def, &context, invocation).await;
    }

    async fn handle_modal(
        &self,
        custom_id: &str,
        fields: std::collections::HashMap<String, String>,
        context: InvocationContext,
    ) {
        let Some(def) = self.components.get_modal(custom_id).await else {
            debug!("No modal matching '{custom_id}' was found.");
            return;
        };
        let invocation = Invocation {
            context: context.clone(),
            args: InvocationArgs::Modal { fields },
        };
        self.run_component(&def, &context, invocation).await;
    }

    async fn handle_lifecycle(&self, name: &str, payload: serde_json::Value) {
        let Some(def) = self.events.resolve_for_dispatch(name).await else {
            return;
        };
        let invocation = Invocation {
            context: InvocationContext::default(),
            args: InvocationArgs::Event { payload },
        };
        let handler = def.handler.clone();
        self.contained(&def, async move { handler.execute(invocation).await })
            .await;
    }

    /// Component flow: a disabled component is dropped silently, then the
    /// gate and the ledger run the same way they do for commands.
    async fn run_component(
        &self,
        def: &Arc<Definition>,
        context: &InvocationContext,
        invocation: Invocation,
    ) {
        if def.disabled {
            return;
        }
        if !self.check_command_permission(def, context).await {
            return;
        }
        let handler = def.handler.clone();
        self.contained(def, async move { handler.execute(invocation).await })
            .await;
    }

    /// Gate first, ledger second. On rejection, sends the matching
    /// templated denial and reports `false`; the caller stops there.
    async fn check_command_permission(
        &self,
        def: &Definition,
        context: &InvocationContext,
    ) -> bool {
        let decision =
            AccessValidator::evaluate(def, context, self.config.owner_id.as_deref());
        if !decision.allowed {
            let reply = self
                .config
                .denial_reply(decision.reason.map(|r| r.as_str()))
                .to_string();
            self.send_denial(context, &reply).await;
            return false;
        }
        match self.ledger.check(def, context) {
            CooldownStatus::Active {
                scope,
                seconds_remaining,
            } => {
                let reply = self
                    .config
                    .replies
                    .cooldowns
                    .for_scope(scope)
                    .replace("{time}", &seconds_remaining.to_string());
                self.send_denial(context, &reply).await;
                false
            }
            CooldownStatus::Ready => true,
        }
    }

    async fn send_denial(&self, context: &InvocationContext, text: &str) {
        if let Err(e) = self.reply_sink.send(context, text).await {
            error!("Error sending denial reply: {e}");
        }
    }

    /// The failure-containment boundary: errors and panics raised by a
    /// definition's own execution are logged with its identity and stop
    /// here. The future runs on its own task so an unwinding handler
    /// surfaces as a `JoinError` instead of tearing down event processing.
    async fn contained<F>(&self, def: &Definition, fut: F)
    where
        F: std::future::Future<Output = Result<(), Error>> + Send + 'static,
    {
        match tokio::spawn(fut).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Error executing {} '{}': {e}", def.kind.label(), def.name);
            }
            Err(join_err) if join_err.is_panic() => {
                error!("Panic executing {} '{}'", def.kind.label(), def.name);
            }
            Err(join_err) => {
                error!(
                    "Error executing {} '{}': {join_err}",
                    def.kind.label(),
                    def.name
                );
            }
        }
    }

    /// Best-effort usage record. Emitted only when the config switch is on,
    /// a usage repository is wired, and the definition opted in; a failed
    /// insert is logged, never re-raised.
    async fn send_usage_log(
        &self,
        def: &Definition,
        context: &InvocationContext,
        name: &str,
        usage_text: Option<String>,
    ) {
        if !def.log_usage || !self.config.log_command_usage {
            return;
        }
        let Some(repo) = &self.usage_repo else {
            return;
        };
        let usage = CommandUsage {
            usage_id: Uuid::new_v4(),
            command_name: name.to_string(),
            command_kind: def.kind.label().to_string(),
            user_id: context.user_id.clone(),
            channel: context.channel_id.clone(),
            guild: context.guild_id.clone(),
            used_at: Utc::now(),
            usage_text,
        };
        if let Err(e) = repo.insert_usage(&usage).await {
            error!("Error sending command usage log for command '{name}': {e}");
        }
    }
}

/// Splits a raw custom-id into its registered part and the optional
/// `:`-suffixed unique part.
fn split_custom_id(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once(':') {
        Some((id, unique)) if !unique.is_empty() => (id, Some(unique)),
        Some((id, _)) => (id, None),
        None => (raw, None),
    }
}
