// riddlebot-core/src/services/cooldown.rs
//!
//! The cooldown ledger. Keys are `{definition-name}-{qualifier}` where the
//! qualifier is a user id, a guild id, or the literal "global"; values are
//! absolute expiry epoch seconds. Entries are created lazily, overwritten on
//! each admitted invocation, and never evicted: a stale entry simply stops
//! matching once its expiry is in the past.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use riddlebot_common::models::context::InvocationContext;
use riddlebot_common::models::definition::Definition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownScope {
    User,
    Guild,
    Global,
}

impl CooldownScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CooldownScope::User => "user",
            CooldownScope::Guild => "guild",
            CooldownScope::Global => "global",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    Ready,
    Active {
        scope: CooldownScope,
        seconds_remaining: u64,
    },
}

#[derive(Debug, Default)]
struct LedgerEntries {
    user: HashMap<String, i64>,
    guild: HashMap<String, i64>,
    global: HashMap<String, i64>,
}

/// Tracks command cooldowns at user, guild, and global scope.
#[derive(Debug, Default)]
pub struct CooldownLedger {
    entries: Mutex<LedgerEntries>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, def: &Definition, ctx: &InvocationContext) -> CooldownStatus {
        self.check_at(def, ctx, Utc::now())
    }

    /// Checks the configured scopes in fixed priority order (user, then
    /// guild, then global) and reports the first active one. A configured
    /// scope that is not active gets its new expiry written as part of this
    /// same call: checking "not on cooldown" and starting the cooldown are
    /// one operation. The whole read+write runs under one lock with no
    /// suspension point, so two back-to-back events for the same key cannot
    /// both be admitted.
    pub fn check_at(
        &self,
        def: &Definition,
        ctx: &InvocationContext,
        now: DateTime<Utc>,
    ) -> CooldownStatus {
        let now = now.timestamp();
        let mut entries = self.entries.lock().unwrap();

        if let Some(threshold) = def.cooldowns.user_seconds {
            let key = format!("{}-{}", def.name, ctx.user_id);
            if let Some(left) = Self::apply(&mut entries.user, key, threshold, now) {
                return CooldownStatus::Active {
                    scope: CooldownScope::User,
                    seconds_remaining: left,
                };
            }
        }
        if let (Some(threshold), Some(guild_id)) =
            (def.cooldowns.guild_seconds, ctx.guild_id.as_deref())
        {
            let key = format!("{}-{}", def.name, guild_id);
            if let Some(left) = Self::apply(&mut entries.guild, key, threshold, now) {
                return CooldownStatus::Active {
                    scope: CooldownScope::Guild,
                    seconds_remaining: left,
                };
            }
        }
        if let Some(threshold) = def.cooldowns.global_seconds {
            let key = format!("{}-global", def.name);
            if let Some(left) = Self::apply(&mut entries.global, key, threshold, now) {
                return CooldownStatus::Active {
                    scope: CooldownScope::Global,
                    seconds_remaining: left,
                };
            }
        }
        CooldownStatus::Ready
    }

    /// Returns the remaining seconds when the key is on an active cooldown,
    /// otherwise arms a fresh expiry and returns `None`. An oversized
    /// threshold saturates to an effectively permanent cooldown.
    fn apply(map: &mut HashMap<String, i64>, key: String, threshold: u64, now: i64) -> Option<u64> {
        if let Some(&expiry) = map.get(&key) {
            if now < expiry {
                return Some((expiry - now) as u64);
            }
        }
        let threshold = i64::try_from(threshold).unwrap_or(i64::MAX);
        map.insert(key, now.saturating_add(threshold));
        None
    }
}
