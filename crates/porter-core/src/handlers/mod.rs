//! Built-in handlers and the pipeline wiring.

use std::sync::Arc;

use crate::{
    commands::CommandCatalog,
    dispatch::{Filter, Registry},
    domain::UserId,
};

pub mod admin;
pub mod bootstrap;
pub mod ping;

/// Processing group for the chat-bootstrap handler. Runs before everything.
pub const BOOTSTRAP_GROUP: i32 = -1;

/// Build the process-lifetime registry with every built-in handler, and
/// record the user-visible commands in the catalog.
///
/// Gate policy: `me`, `ban_user` and `unban_user` are ban-gated; `ping`
/// stays open, and the super-admin-only registrations are already filtered
/// down to a single caller.
pub fn build_registry(super_admin: UserId, catalog: &mut CommandCatalog) -> Registry {
    let mut reg = Registry::new();

    reg.register(
        BOOTSTRAP_GROUP,
        Filter::any(),
        Arc::new(bootstrap::ChatBootstrap),
    );

    reg.register(0, Filter::command("ping"), Arc::new(ping::Ping));

    reg.register_gated(0, Filter::command("me"), Arc::new(admin::Me));
    reg.register_gated(0, Filter::command("ban_user"), Arc::new(admin::BanUser));
    reg.register_gated(0, Filter::command("unban_user"), Arc::new(admin::UnbanUser));

    reg.register(
        0,
        Filter::command("add_admin").and(Filter::user(super_admin)),
        Arc::new(admin::AddAdmin),
    );
    reg.register(
        0,
        Filter::command("del_admin").and(Filter::user(super_admin)),
        Arc::new(admin::DelAdmin),
    );

    catalog.register("ping", "info");
    catalog.register("me", "admin");
    catalog.register("ban_user", "admin");
    catalog.register("unban_user", "admin");
    catalog.register("add_admin", "admin");
    catalog.register("del_admin", "admin");

    reg
}
