//! Global admin commands: `/me`, `/add_admin`, `/del_admin`, `/ban_user`,
//! `/unban_user`.
//!
//! The super-admin-only commands are narrowed by their registration filter;
//! the ban commands authorize through `resolve_actor` and vet their target
//! before touching the store. Bad user input is always answered locally and
//! never propagates past the handler.

use async_trait::async_trait;

use crate::{
    auth::{resolve_actor, vet_ban_target, vet_unban_target, BanVeto, UnbanVeto},
    dispatch::{Ctx, Handler, Outcome},
    domain::UserId,
    event::Event,
    i18n::LocaleContext,
    ports::{respond, Gateway},
    Result,
};

/// First command argument parsed as a user id, or the localized complaint
/// to send back.
enum TargetArg {
    Id(UserId),
    Complain(String),
}

fn target_arg(ev: &Event, strings: &LocaleContext<'_>) -> TargetArg {
    let Some(raw) = ev.command().and_then(|c| c.args.first()) else {
        return TargetArg::Complain(strings.text("give_me_user_id"));
    };
    match raw.parse::<i64>() {
        Ok(id) => TargetArg::Id(UserId(id)),
        Err(_) => TargetArg::Complain(strings.text("invalid_user_id")),
    }
}

async fn display_name(gw: &dyn Gateway, user: UserId) -> String {
    gw.user_name(user).await.unwrap_or_else(|| "noname".to_string())
}

/// `/me`: report whether the caller holds global admin rights.
pub struct Me;

#[async_trait]
impl Handler for Me {
    async fn handle(&self, cx: &Ctx, ev: &Event) -> Result<Outcome> {
        let Some(caller) = ev.from_user() else {
            return Ok(Outcome::Continue);
        };
        let strings = cx.locales.resolve(ev);

        let actor = resolve_actor(cx.store.as_ref(), cx.super_admin, caller).await?;
        let key = if actor.is_some() { "you_admin" } else { "you_not_admin" };
        respond(cx.gateway.as_ref(), ev, &strings.text(key)).await?;

        Ok(Outcome::Continue)
    }
}

/// `/add_admin <id>` (super-admin only, via registration filter).
pub struct AddAdmin;

#[async_trait]
impl Handler for AddAdmin {
    async fn handle(&self, cx: &Ctx, ev: &Event) -> Result<Outcome> {
        let strings = cx.locales.resolve(ev);
        let target = match target_arg(ev, &strings) {
            TargetArg::Id(id) => id,
            TargetArg::Complain(text) => {
                respond(cx.gateway.as_ref(), ev, &text).await?;
                return Ok(Outcome::Continue);
            }
        };

        if cx.store.is_user_admin(target).await? {
            respond(cx.gateway.as_ref(), ev, &strings.text("already_added_admin")).await?;
            return Ok(Outcome::Continue);
        }

        let name = display_name(cx.gateway.as_ref(), target).await;
        cx.store.add_admin(target).await?;
        respond(
            cx.gateway.as_ref(),
            ev,
            &strings.format(
                "user_added_to_admin",
                &[("name", &name), ("id", &target.0.to_string())],
            ),
        )
        .await?;

        Ok(Outcome::Continue)
    }
}

/// `/del_admin <id>` (super-admin only, via registration filter).
pub struct DelAdmin;

#[async_trait]
impl Handler for DelAdmin {
    async fn handle(&self, cx: &Ctx, ev: &Event) -> Result<Outcome> {
        let strings = cx.locales.resolve(ev);
        let target = match target_arg(ev, &strings) {
            TargetArg::Id(id) => id,
            TargetArg::Complain(text) => {
                respond(cx.gateway.as_ref(), ev, &text).await?;
                return Ok(Outcome::Continue);
            }
        };

        if !cx.store.is_user_admin(target).await? {
            respond(
                cx.gateway.as_ref(),
                ev,
                &strings.format("admin_not_found", &[("id", &target.0.to_string())]),
            )
            .await?;
            return Ok(Outcome::Continue);
        }

        let name = display_name(cx.gateway.as_ref(), target).await;
        cx.store.remove_admin(target).await?;
        respond(
            cx.gateway.as_ref(),
            ev,
            &strings.format(
                "user_removed_from_admin",
                &[("name", &name), ("id", &target.0.to_string())],
            ),
        )
        .await?;

        Ok(Outcome::Continue)
    }
}

/// `/ban_user <id>`: global ban, admin-or-above with target vetting.
pub struct BanUser;

#[async_trait]
impl Handler for BanUser {
    async fn handle(&self, cx: &Ctx, ev: &Event) -> Result<Outcome> {
        let Some(caller) = ev.from_user() else {
            return Ok(Outcome::Continue);
        };
        let strings = cx.locales.resolve(ev);

        if resolve_actor(cx.store.as_ref(), cx.super_admin, caller)
            .await?
            .is_none()
        {
            respond(cx.gateway.as_ref(), ev, &strings.text("you_not_admin")).await?;
            return Ok(Outcome::Continue);
        }

        let target = match target_arg(ev, &strings) {
            TargetArg::Id(id) => id,
            TargetArg::Complain(text) => {
                respond(cx.gateway.as_ref(), ev, &text).await?;
                return Ok(Outcome::Continue);
            }
        };

        let veto = vet_ban_target(cx.store.as_ref(), cx.super_admin, caller, target).await?;
        if let Some(veto) = veto {
            let key = match veto {
                BanVeto::SelfTarget => "you_cannot_ban_self",
                BanVeto::SuperAdmin => "you_cannot_ban_superadmin",
                BanVeto::Admin => "you_cannot_ban_admin",
            };
            respond(cx.gateway.as_ref(), ev, &strings.text(key)).await?;
            return Ok(Outcome::Continue);
        }

        if cx.store.is_banned(target).await? {
            respond(cx.gateway.as_ref(), ev, &strings.text("already_banned")).await?;
            return Ok(Outcome::Continue);
        }

        let name = display_name(cx.gateway.as_ref(), target).await;
        cx.store.add_ban(target).await?;
        respond(
            cx.gateway.as_ref(),
            ev,
            &strings.format(
                "user_banned",
                &[("name", &name), ("id", &target.0.to_string())],
            ),
        )
        .await?;

        Ok(Outcome::Continue)
    }
}

/// `/unban_user <id>`: lift a global ban. Protected targets are dropped
/// silently except for stored admins, which get a complaint.
pub struct UnbanUser;

#[async_trait]
impl Handler for UnbanUser {
    async fn handle(&self, cx: &Ctx, ev: &Event) -> Result<Outcome> {
        let Some(caller) = ev.from_user() else {
            return Ok(Outcome::Continue);
        };
        let strings = cx.locales.resolve(ev);

        if resolve_actor(cx.store.as_ref(), cx.super_admin, caller)
            .await?
            .is_none()
        {
            respond(cx.gateway.as_ref(), ev, &strings.text("you_not_admin")).await?;
            return Ok(Outcome::Continue);
        }

        let target = match target_arg(ev, &strings) {
            TargetArg::Id(id) => id,
            TargetArg::Complain(text) => {
                respond(cx.gateway.as_ref(), ev, &text).await?;
                return Ok(Outcome::Continue);
            }
        };

        match vet_unban_target(cx.store.as_ref(), cx.super_admin, caller, target).await? {
            Some(UnbanVeto::Silent) => return Ok(Outcome::Continue),
            Some(UnbanVeto::Admin) => {
                respond(cx.gateway.as_ref(), ev, &strings.text("you_cannot_unban_admin")).await?;
                return Ok(Outcome::Continue);
            }
            None => {}
        }

        if !cx.store.is_banned(target).await? {
            respond(
                cx.gateway.as_ref(),
                ev,
                &strings.format("user_notfound", &[("id", &target.0.to_string())]),
            )
            .await?;
            return Ok(Outcome::Continue);
        }

        let name = display_name(cx.gateway.as_ref(), target).await;
        cx.store.remove_ban(target).await?;
        respond(
            cx.gateway.as_ref(),
            ev,
            &strings.format(
                "user_unbanned",
                &[("name", &name), ("id", &target.0.to_string())],
            ),
        )
        .await?;

        Ok(Outcome::Continue)
    }
}
