//! Authorization gates: the global ban gate lives in `dispatch` (it is part
//! of handler registration), this module holds the in-chat permission gate,
//! actor resolution and the target vetting rules used by the ban commands.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    dispatch::{Ctx, Handler, Outcome},
    domain::{ChatKind, UserId},
    event::Event,
    i18n::LocaleContext,
    ports::{respond, Gateway},
    store::Store,
    Result,
};

/// Chat-level privileges a caller may hold, per the gateway's membership
/// data. Mirrors the subset of admin rights the bot cares about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Privileges {
    pub can_change_info: bool,
    pub can_delete_messages: bool,
    pub can_restrict_members: bool,
    pub can_invite_users: bool,
    pub can_pin_messages: bool,
    pub can_promote_members: bool,
}

impl Privileges {
    pub const NONE: Privileges = Privileges {
        can_change_info: false,
        can_delete_messages: false,
        can_restrict_members: false,
        can_invite_users: false,
        can_pin_messages: false,
        can_promote_members: false,
    };

    pub const ALL: Privileges = Privileges {
        can_change_info: true,
        can_delete_messages: true,
        can_restrict_members: true,
        can_invite_users: true,
        can_pin_messages: true,
        can_promote_members: true,
    };

    fn flags(&self) -> [(bool, &'static str); 6] {
        [
            (self.can_change_info, "change info"),
            (self.can_delete_messages, "delete messages"),
            (self.can_restrict_members, "restrict members"),
            (self.can_invite_users, "invite users"),
            (self.can_pin_messages, "pin messages"),
            (self.can_promote_members, "promote members"),
        ]
    }

    /// Names of the privileges required by `required` that `self` lacks.
    pub fn missing(&self, required: Privileges) -> Vec<&'static str> {
        required
            .flags()
            .iter()
            .zip(self.flags().iter())
            .filter(|((req, _), (held, _))| *req && !*held)
            .map(|((_, name), _)| *name)
            .collect()
    }

    pub fn covers(&self, required: Privileges) -> bool {
        self.missing(required).is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Administrator,
    Member,
    /// Left, banned, or never joined.
    Outside,
}

/// Snapshot of a user's standing in one chat, as reported by the gateway.
#[derive(Clone, Copy, Debug)]
pub struct Membership {
    pub role: MemberRole,
    pub privileges: Privileges,
}

impl Membership {
    pub fn outside() -> Self {
        Self {
            role: MemberRole::Outside,
            privileges: Privileges::NONE,
        }
    }
}

/// Outcome of the permission gate. Denials are values, never errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    DeniedSilently,
    DeniedWithMessage(String),
}

/// The in-chat permission gate.
///
/// Private chats are allowed only when `allow_in_private`; channels are
/// always allowed (channel-level permission is not modeled); in groups the
/// caller must hold every privilege in `required`. The chat owner holds all
/// privileges implicitly.
pub async fn authorize(
    gw: &dyn Gateway,
    strings: &LocaleContext<'_>,
    ev: &Event,
    required: Privileges,
    allow_in_private: bool,
    complain: bool,
) -> Result<Decision> {
    match ev.chat_kind() {
        ChatKind::Private => {
            if allow_in_private {
                return Ok(Decision::Allowed);
            }
            Ok(Decision::DeniedWithMessage(
                strings.text("cmd_private_not_allowed"),
            ))
        }
        ChatKind::Channel => Ok(Decision::Allowed),
        ChatKind::Group | ChatKind::Supergroup => {
            let Some(user) = ev.from_user() else {
                return Ok(Decision::DeniedSilently);
            };
            let member = gw.member(ev.chat_id(), user).await?;
            match member.role {
                MemberRole::Owner => Ok(Decision::Allowed),
                MemberRole::Administrator => {
                    let missing = member.privileges.missing(required);
                    if missing.is_empty() {
                        Ok(Decision::Allowed)
                    } else if complain {
                        Ok(Decision::DeniedWithMessage(strings.format(
                            "no_permission_text",
                            &[("permissions", &missing.join(", "))],
                        )))
                    } else {
                        Ok(Decision::DeniedSilently)
                    }
                }
                MemberRole::Member | MemberRole::Outside => {
                    if complain {
                        Ok(Decision::DeniedWithMessage(strings.text("you_not_admin")))
                    } else {
                        Ok(Decision::DeniedSilently)
                    }
                }
            }
        }
    }
}

// ============== Actor resolution ==============

/// Elevated identities for the global admin commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Actor {
    /// The single configured identity; outranks stored admins and is checked
    /// before the store is consulted.
    SuperAdmin,
    Admin,
}

pub async fn resolve_actor(
    store: &dyn Store,
    super_admin: UserId,
    user: UserId,
) -> Result<Option<Actor>> {
    if user == super_admin {
        return Ok(Some(Actor::SuperAdmin));
    }
    if store.is_user_admin(user).await? {
        return Ok(Some(Actor::Admin));
    }
    Ok(None)
}

// ============== Ban/unban target vetting ==============

/// Why a ban target is off-limits. Three distinct reasons so the user-facing
/// message can be accurate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BanVeto {
    SelfTarget,
    SuperAdmin,
    Admin,
}

/// The super-admin may ban anyone except itself; other admins may not ban
/// the super-admin, a stored admin, or themselves.
pub async fn vet_ban_target(
    store: &dyn Store,
    super_admin: UserId,
    caller: UserId,
    target: UserId,
) -> Result<Option<BanVeto>> {
    if caller == super_admin {
        if target == super_admin {
            return Ok(Some(BanVeto::SelfTarget));
        }
        return Ok(None);
    }
    if target == super_admin {
        return Ok(Some(BanVeto::SuperAdmin));
    }
    if store.is_user_admin(target).await? {
        return Ok(Some(BanVeto::Admin));
    }
    if target == caller {
        return Ok(Some(BanVeto::SelfTarget));
    }
    Ok(None)
}

/// Unban vetting checks targets in the same order as the ban rules:
/// super-admin, then stored admin, then self. Only the stored-admin case
/// produces a message; the others are dropped without a reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnbanVeto {
    Silent,
    Admin,
}

pub async fn vet_unban_target(
    store: &dyn Store,
    super_admin: UserId,
    caller: UserId,
    target: UserId,
) -> Result<Option<UnbanVeto>> {
    if caller == super_admin {
        return Ok(None);
    }
    if target == super_admin {
        return Ok(Some(UnbanVeto::Silent));
    }
    if store.is_user_admin(target).await? {
        return Ok(Some(UnbanVeto::Admin));
    }
    if target == caller {
        return Ok(Some(UnbanVeto::Silent));
    }
    Ok(None)
}

// ============== RequireAdmin wrapper ==============

/// Applies the permission gate in front of an inner handler.
///
/// On `DeniedWithMessage` the denial text is delivered through the event's
/// own reply path; in every denial case the inner handler is skipped and
/// dispatch continues with later groups.
pub struct RequireAdmin {
    inner: Arc<dyn Handler>,
    required: Privileges,
    allow_in_private: bool,
    complain: bool,
}

impl RequireAdmin {
    pub fn new(inner: Arc<dyn Handler>) -> Self {
        Self {
            inner,
            required: Privileges::NONE,
            allow_in_private: false,
            complain: true,
        }
    }

    pub fn require(mut self, required: Privileges) -> Self {
        self.required = required;
        self
    }

    pub fn allow_in_private(mut self) -> Self {
        self.allow_in_private = true;
        self
    }

    pub fn silent(mut self) -> Self {
        self.complain = false;
        self
    }
}

#[async_trait]
impl Handler for RequireAdmin {
    async fn handle(&self, cx: &Ctx, ev: &Event) -> Result<Outcome> {
        let strings = cx.locales.resolve(ev);
        let decision = authorize(
            cx.gateway.as_ref(),
            &strings,
            ev,
            self.required,
            self.allow_in_private,
            self.complain,
        )
        .await?;

        match decision {
            Decision::Allowed => self.inner.handle(cx, ev).await,
            Decision::DeniedSilently => Ok(Outcome::Continue),
            Decision::DeniedWithMessage(text) => {
                respond(cx.gateway.as_ref(), ev, &text).await?;
                Ok(Outcome::Continue)
            }
        }
    }
}
