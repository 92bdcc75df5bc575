// riddlebot-core/src/services/access.rs
//!
//! Pure access-control evaluation. No clock, no ledger, no I/O: a decision
//! is a function of the definition's predicates and the invocation context.

use riddlebot_common::models::context::InvocationContext;
use riddlebot_common::models::definition::Definition;

/// The required-group predicate that failed. The string form doubles as the
/// lookup key into the configured denial templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    IsDisabled,
    AllowedUsers,
    BlockedUsers,
    AllowedChannels,
    BlockedChannels,
    AllowedCategories,
    BlockedCategories,
    AllowedGuilds,
    BlockedGuilds,
    AllowedRoles,
    BlockedRoles,
    RestrictedToOwner,
    RestrictedToNsfw,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::IsDisabled => "isDisabled",
            DenyReason::AllowedUsers => "allowedUsers",
            DenyReason::BlockedUsers => "blockedUsers",
            DenyReason::AllowedChannels => "allowedChannels",
            DenyReason::BlockedChannels => "blockedChannels",
            DenyReason::AllowedCategories => "allowedCategories",
            DenyReason::BlockedCategories => "blockedCategories",
            DenyReason::AllowedGuilds => "allowedGuilds",
            DenyReason::BlockedGuilds => "blockedGuilds",
            DenyReason::AllowedRoles => "allowedRoles",
            DenyReason::BlockedRoles => "blockedRoles",
            DenyReason::RestrictedToOwner => "restrictedToOwner",
            DenyReason::RestrictedToNsfw => "restrictedToNSFW",
        }
    }
}

/// Outcome of gate evaluation. A denial with `reason: None` means the
/// optional group was non-empty and nothing in it matched; no single
/// predicate is to blame because the group is satisfied by union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: Option<DenyReason>,
}

impl AccessDecision {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn denied(reason: Option<DenyReason>) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

pub struct AccessValidator;

impl AccessValidator {
    /// Required-group predicates first (all must pass, first failure is the
    /// reason; `disabled` is checked first so a disabled definition always
    /// reports `isDisabled`), then the optional group (if any optional
    /// predicate is present, at least one must match). Absent predicates
    /// are vacuously true: a definition with no predicates is permitted
    /// everywhere.
    pub fn evaluate(
        def: &Definition,
        ctx: &InvocationContext,
        owner_id: Option<&str>,
    ) -> AccessDecision {
        if let Some(reason) = Self::check_required(def, ctx, owner_id) {
            return AccessDecision::denied(Some(reason));
        }
        if !Self::check_optional(def, ctx) {
            return AccessDecision::denied(None);
        }
        AccessDecision::allowed()
    }

    fn check_required(
        def: &Definition,
        ctx: &InvocationContext,
        owner_id: Option<&str>,
    ) -> Option<DenyReason> {
        let rules = &def.access;
        let channel = ctx.channel_id.as_deref();
        let category = ctx.category_id.as_deref();
        let guild = ctx.guild_id.as_deref();
        // Role predicates only apply inside a guild; a DM context has no
        // member to check.
        let roles = guild.map(|_| ctx.role_ids.as_slice());

        let checks: [(DenyReason, bool); 13] = [
            (DenyReason::IsDisabled, !def.disabled),
            (
                DenyReason::AllowedUsers,
                rules
                    .allowed_users
                    .as_ref()
                    .is_none_or(|list| list.iter().any(|id| *id == ctx.user_id)),
            ),
            (
                DenyReason::BlockedUsers,
                !rules
                    .blocked_users
                    .as_ref()
                    .is_some_and(|list| list.iter().any(|id| *id == ctx.user_id)),
            ),
            (
                DenyReason::AllowedChannels,
                channel.is_none_or(|c| {
                    rules
                        .allowed_channels
                        .as_ref()
                        .is_none_or(|list| list.iter().any(|id| id == c))
                }),
            ),
            (
                DenyReason::BlockedChannels,
                !channel.is_some_and(|c| {
                    rules
                        .blocked_channels
                        .as_ref()
                        .is_some_and(|list| list.iter().any(|id| id == c))
                }),
            ),
            (
                DenyReason::AllowedCategories,
                category.is_none_or(|c| {
                    rules
                        .allowed_categories
                        .as_ref()
                        .is_none_or(|list| list.iter().any(|id| id == c))
                }),
            ),
            (
                DenyReason::BlockedCategories,
                !category.is_some_and(|c| {
                    rules
                        .blocked_categories
                        .as_ref()
                        .is_some_and(|list| list.iter().any(|id| id == c))
                }),
            ),
            (
                DenyReason::AllowedGuilds,
                guild.is_none_or(|g| {
                    rules
                        .allowed_guilds
                        .as_ref()
                        .is_none_or(|list| list.iter().any(|id| id == g))
                }),
            ),
            (
                DenyReason::BlockedGuilds,
                !guild.is_some_and(|g| {
                    rules
                        .blocked_guilds
                        .as_ref()
                        .is_some_and(|list| list.iter().any(|id| id == g))
                }),
            ),
            (
                DenyReason::AllowedRoles,
                roles.is_none_or(|member_roles| {
                    rules
                        .allowed_roles
                        .as_ref()
                        .is_none_or(|list| list.iter().any(|id| member_roles.contains(id)))
                }),
            ),
            (
                DenyReason::BlockedRoles,
                !roles.is_some_and(|member_roles| {
                    rules
                        .blocked_roles
                        .as_ref()
                        .is_some_and(|list| list.iter().any(|id| member_roles.contains(id)))
                }),
            ),
            (
                DenyReason::RestrictedToOwner,
                !rules.owner_only || owner_id == Some(ctx.user_id.as_str()),
            ),
            (
                DenyReason::RestrictedToNsfw,
                !rules.nsfw_only || ctx.channel_nsfw,
            ),
        ];

        checks
            .into_iter()
            .find(|(_, passed)| !passed)
            .map(|(reason, _)| reason)
    }

    fn check_optional(def: &Definition, ctx: &InvocationContext) -> bool {
        let rules = &def.access;
        let mut present: Vec<bool> = Vec::new();

        if let Some(list) = &rules.optional_allowed_users {
            present.push(list.iter().any(|id| *id == ctx.user_id));
        }
        if let (Some(list), Some(channel)) =
            (&rules.optional_allowed_channels, ctx.channel_id.as_deref())
        {
            present.push(list.iter().any(|id| id == channel));
        }
        if let (Some(list), Some(category)) = (
            &rules.optional_allowed_categories,
            ctx.category_id.as_deref(),
        ) {
            present.push(list.iter().any(|id| id == category));
        }
        if let (Some(list), Some(guild)) =
            (&rules.optional_allowed_guilds, ctx.guild_id.as_deref())
        {
            present.push(list.iter().any(|id| id == guild));
        }
        if let (Some(list), Some(_)) = (&rules.optional_allowed_roles, ctx.guild_id.as_deref()) {
            present.push(list.iter().any(|id| ctx.role_ids.contains(id)));
        }

        present.is_empty() || present.into_iter().any(|matched| matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use riddlebot_common::error::Error;
    use riddlebot_common::models::context::Invocation;
    use riddlebot_common::models::definition::{AccessRules, DefinitionHandler};

    struct NoopHandler;

    #[async_trait]
    impl DefinitionHandler for NoopHandler {
        async fn execute(&self, _invocation: Invocation) -> Result<(), Error> {
            Ok(())
        }
    }

    fn def_with(access: AccessRules) -> Definition {
        Definition::slash("probe", Arc::new(NoopHandler)).with_access(access)
    }

    fn guild_ctx(user: &str) -> InvocationContext {
        InvocationContext {
            user_id: user.to_string(),
            channel_id: Some("c1".to_string()),
            category_id: Some("cat1".to_string()),
            guild_id: Some("g1".to_string()),
            role_ids: vec!["r1".to_string()],
            channel_nsfw: false,
        }
    }

    #[test]
    fn no_predicates_allows_everywhere() {
        let def = def_with(AccessRules::default());
        assert!(AccessValidator::evaluate(&def, &guild_ctx("u1"), None).allowed);
        assert!(
            AccessValidator::evaluate(&def, &InvocationContext::for_user("u2"), None).allowed
        );
    }

    #[test]
    fn allowed_users_denies_others_with_reason() {
        let def = def_with(AccessRules {
            allowed_users: Some(vec!["u1".to_string()]),
            ..Default::default()
        });
        assert!(AccessValidator::evaluate(&def, &guild_ctx("u1"), None).allowed);

        let decision = AccessValidator::evaluate(&def, &guild_ctx("u2"), None);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(DenyReason::AllowedUsers));
        assert_eq!(decision.reason.unwrap().as_str(), "allowedUsers");
    }

    #[test]
    fn blocked_users_wins_over_no_allow_list() {
        let def = def_with(AccessRules {
            blocked_users: Some(vec!["u2".to_string()]),
            ..Default::default()
        });
        assert!(AccessValidator::evaluate(&def, &guild_ctx("u1"), None).allowed);
        let decision = AccessValidator::evaluate(&def, &guild_ctx("u2"), None);
        assert_eq!(decision.reason, Some(DenyReason::BlockedUsers));
    }

    #[test]
    fn disabled_reports_is_disabled_regardless_of_other_predicates() {
        let def = def_with(AccessRules {
            allowed_users: Some(vec!["someone-else".to_string()]),
            ..Default::default()
        })
        .set_disabled(true);

        let decision = AccessValidator::evaluate(&def, &guild_ctx("u1"), None);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(DenyReason::IsDisabled));
        assert_eq!(decision.reason.unwrap().as_str(), "isDisabled");
    }

    #[test]
    fn channel_predicates_vacuous_without_channel() {
        let def = def_with(AccessRules {
            allowed_channels: Some(vec!["c9".to_string()]),
            ..Default::default()
        });
        // No channel in context: predicate cannot apply, so it passes.
        let ctx = InvocationContext::for_user("u1");
        assert!(AccessValidator::evaluate(&def, &ctx, None).allowed);

        let decision = AccessValidator::evaluate(&def, &guild_ctx("u1"), None);
        assert_eq!(decision.reason, Some(DenyReason::AllowedChannels));
    }

    #[test]
    fn role_predicates_skip_dm_contexts() {
        let def = def_with(AccessRules {
            allowed_roles: Some(vec!["r9".to_string()]),
            ..Default::default()
        });
        assert!(
            AccessValidator::evaluate(&def, &InvocationContext::for_user("u1"), None).allowed
        );
        let decision = AccessValidator::evaluate(&def, &guild_ctx("u1"), None);
        assert_eq!(decision.reason, Some(DenyReason::AllowedRoles));
    }

    #[test]
    fn owner_only_checks_configured_owner() {
        let def = def_with(AccessRules {
            owner_only: true,
            ..Default::default()
        });
        assert!(AccessValidator::evaluate(&def, &guild_ctx("boss"), Some("boss")).allowed);
        let decision = AccessValidator::evaluate(&def, &guild_ctx("u1"), Some("boss"));
        assert_eq!(decision.reason, Some(DenyReason::RestrictedToOwner));
        // No owner configured at all: owner-only can never pass.
        let decision = AccessValidator::evaluate(&def, &guild_ctx("u1"), None);
        assert_eq!(decision.reason, Some(DenyReason::RestrictedToOwner));
    }

    #[test]
    fn nsfw_only_requires_nsfw_channel() {
        let def = def_with(AccessRules {
            nsfw_only: true,
            ..Default::default()
        });
        let mut ctx = guild_ctx("u1");
        let decision = AccessValidator::evaluate(&def, &ctx, None);
        assert_eq!(decision.reason, Some(DenyReason::RestrictedToNsfw));
        ctx.channel_nsfw = true;
        assert!(AccessValidator::evaluate(&def, &ctx, None).allowed);
    }

    #[test]
    fn optional_group_passes_when_any_grant_matches() {
        let def = def_with(AccessRules {
            optional_allowed_roles: Some(vec!["r1".to_string()]),
            optional_allowed_channels: Some(vec!["c-special".to_string()]),
            ..Default::default()
        });

        // Matching role only.
        assert!(AccessValidator::evaluate(&def, &guild_ctx("u1"), None).allowed);

        // Matching channel only.
        let mut ctx = guild_ctx("u1");
        ctx.role_ids = vec![];
        ctx.channel_id = Some("c-special".to_string());
        assert!(AccessValidator::evaluate(&def, &ctx, None).allowed);

        // Matching neither: denied without a specific reason.
        let mut ctx = guild_ctx("u1");
        ctx.role_ids = vec![];
        let decision = AccessValidator::evaluate(&def, &ctx, None);
        assert!(!decision.allowed);
        assert_eq!(decision.reason, None);
    }

    #[test]
    fn empty_optional_group_passes_vacuously() {
        let def = def_with(AccessRules::default());
        assert!(AccessValidator::check_optional(&def, &guild_ctx("u1")));
    }
}
