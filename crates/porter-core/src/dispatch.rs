//! Handler registry and dispatcher.
//!
//! Handlers are registered into ordered processing groups. For each event,
//! groups run in ascending order; within a group the first matching filter
//! wins. A handler may stop the remaining groups by returning
//! [`Outcome::Stop`]; a handler failure is logged at the dispatcher boundary
//! and never aborts the other groups.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    domain::{ChatKind, UserId},
    event::Event,
    i18n::Locales,
    ports::{respond, Gateway},
    store::Store,
    Result,
};

/// What a handler asks the dispatcher to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Let later groups see this event.
    Continue,
    /// Skip all remaining groups for this event.
    Stop,
}

/// Shared dependencies injected into every handler invocation.
#[derive(Clone)]
pub struct Ctx {
    pub store: Arc<dyn Store>,
    pub gateway: Arc<dyn Gateway>,
    pub locales: Arc<Locales>,
    pub super_admin: UserId,
}

#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, cx: &Ctx, ev: &Event) -> Result<Outcome>;
}

/// Pure predicate over an inbound event.
#[derive(Clone)]
pub enum Filter {
    Any,
    Command(String),
    User(UserId),
    Private,
    Group,
    Callback,
    Not(Box<Filter>),
    All(Vec<Filter>),
    Custom(Arc<dyn Fn(&Event) -> bool + Send + Sync>),
}

impl Filter {
    pub fn any() -> Filter {
        Filter::Any
    }

    pub fn command(name: impl Into<String>) -> Filter {
        Filter::Command(name.into())
    }

    pub fn user(id: UserId) -> Filter {
        Filter::User(id)
    }

    pub fn custom(f: impl Fn(&Event) -> bool + Send + Sync + 'static) -> Filter {
        Filter::Custom(Arc::new(f))
    }

    pub fn and(self, other: Filter) -> Filter {
        match self {
            Filter::All(mut filters) => {
                filters.push(other);
                Filter::All(filters)
            }
            first => Filter::All(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    pub fn matches(&self, ev: &Event) -> bool {
        match self {
            Filter::Any => true,
            Filter::Command(name) => ev.command().is_some_and(|c| c.name == *name),
            Filter::User(id) => ev.from_user() == Some(*id),
            Filter::Private => ev.chat_kind() == ChatKind::Private,
            Filter::Group => matches!(ev.chat_kind(), ChatKind::Group | ChatKind::Supergroup),
            Filter::Callback => matches!(ev, Event::Callback(_)),
            Filter::Not(inner) => !inner.matches(ev),
            Filter::All(filters) => filters.iter().all(|f| f.matches(ev)),
            Filter::Custom(f) => f(ev),
        }
    }
}

struct Entry {
    filter: Filter,
    handler: Arc<dyn Handler>,
    check_ban: bool,
}

/// Process-lifetime handler table, keyed by processing group. Registration
/// order within a group is evaluation order; there is no removal.
#[derive(Default)]
pub struct Registry {
    groups: BTreeMap<i32, Vec<Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, group: i32, filter: Filter, handler: Arc<dyn Handler>) {
        self.insert(group, filter, handler, false);
    }

    /// Register with the ban gate applied: a globally banned sender gets the
    /// localized refusal instead of the handler body.
    pub fn register_gated(&mut self, group: i32, filter: Filter, handler: Arc<dyn Handler>) {
        self.insert(group, filter, handler, true);
    }

    fn insert(&mut self, group: i32, filter: Filter, handler: Arc<dyn Handler>, check_ban: bool) {
        self.groups.entry(group).or_default().push(Entry {
            filter,
            handler,
            check_ban,
        });
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Stateless per-call dispatcher over a fixed registry.
pub struct Dispatcher {
    registry: Registry,
    ctx: Ctx,
}

impl Dispatcher {
    pub fn new(registry: Registry, ctx: Ctx) -> Self {
        Self { registry, ctx }
    }

    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    pub async fn dispatch(&self, ev: &Event) {
        for (group, entries) in &self.registry.groups {
            for entry in entries {
                if !entry.filter.matches(ev) {
                    continue;
                }

                if entry.check_ban {
                    match self.refuse_if_banned(ev).await {
                        Ok(false) => {}
                        Ok(true) => break, // blocked; the match is consumed
                        Err(e) => {
                            tracing::error!(group, error = %e, "ban gate failed");
                            break;
                        }
                    }
                }

                match entry.handler.handle(&self.ctx, ev).await {
                    Ok(Outcome::Continue) => {}
                    Ok(Outcome::Stop) => return,
                    Err(e) => tracing::error!(group, error = %e, "handler failed"),
                }
                // First match wins within a group.
                break;
            }
        }
    }

    async fn refuse_if_banned(&self, ev: &Event) -> Result<bool> {
        let Some(user) = ev.from_user() else {
            return Ok(false);
        };
        if !self.ctx.store.is_banned(user).await? {
            return Ok(false);
        }
        let strings = self.ctx.locales.resolve(ev);
        respond(self.ctx.gateway.as_ref(), ev, &strings.text("banned_msg")).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::ChatId;
    use crate::store::MemoryStore;
    use crate::testutil::{msg_event, test_ctx, RecordingGateway};
    use crate::Error;

    struct Probe {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        outcome: Outcome,
        fail: bool,
    }

    impl Probe {
        fn new(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                label,
                log: log.clone(),
                outcome: Outcome::Continue,
                fail: false,
            })
        }

        fn stopping(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                label,
                log: log.clone(),
                outcome: Outcome::Stop,
                fail: false,
            })
        }

        fn failing(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                label,
                log: log.clone(),
                outcome: Outcome::Continue,
                fail: true,
            })
        }
    }

    #[async_trait]
    impl Handler for Probe {
        async fn handle(&self, _cx: &Ctx, _ev: &Event) -> Result<Outcome> {
            self.log.lock().unwrap().push(self.label.to_string());
            if self.fail {
                return Err(Error::Store("probe failure".into()));
            }
            Ok(self.outcome)
        }
    }

    /// Records whether the chat row was visible when the handler ran.
    struct ChatSeen {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Handler for ChatSeen {
        async fn handle(&self, cx: &Ctx, ev: &Event) -> Result<Outcome> {
            let seen = cx.store.chat_exists(ev.chat_id(), ev.chat_kind()).await?;
            self.log
                .lock()
                .unwrap()
                .push(format!("chat_seen={seen}"));
            Ok(Outcome::Continue)
        }
    }

    #[tokio::test]
    async fn groups_run_in_ascending_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reg = Registry::new();
        reg.register(1, Filter::any(), Probe::new("late", &log));
        reg.register(-1, Filter::any(), Probe::new("early", &log));
        reg.register(0, Filter::any(), Probe::new("middle", &log));

        let cx = test_ctx(Arc::new(RecordingGateway::new()), Arc::new(MemoryStore::new()), 1);
        Dispatcher::new(reg, cx)
            .dispatch(&msg_event(5, ChatKind::Private, Some(2), "hi"))
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn bootstrap_side_effect_is_visible_to_later_groups() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reg = Registry::new();
        reg.register(
            -1,
            Filter::any(),
            Arc::new(crate::handlers::bootstrap::ChatBootstrap),
        );
        reg.register(0, Filter::any(), Arc::new(ChatSeen { log: log.clone() }));

        let store = Arc::new(MemoryStore::new());
        let cx = test_ctx(Arc::new(RecordingGateway::new()), store.clone(), 1);
        Dispatcher::new(reg, cx)
            .dispatch(&msg_event(5, ChatKind::Group, Some(2), "hi"))
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["chat_seen=true"]);
        assert!(store.chat_exists(ChatId(5), ChatKind::Group).await.unwrap());
    }

    #[tokio::test]
    async fn first_match_wins_within_a_group() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reg = Registry::new();
        reg.register(0, Filter::any(), Probe::new("first", &log));
        reg.register(0, Filter::any(), Probe::new("second", &log));

        let cx = test_ctx(Arc::new(RecordingGateway::new()), Arc::new(MemoryStore::new()), 1);
        Dispatcher::new(reg, cx)
            .dispatch(&msg_event(5, ChatKind::Private, Some(2), "hi"))
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["first"]);
    }

    #[tokio::test]
    async fn stop_propagation_skips_remaining_groups() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reg = Registry::new();
        reg.register(0, Filter::any(), Probe::stopping("stopper", &log));
        reg.register(1, Filter::any(), Probe::new("never", &log));

        let cx = test_ctx(Arc::new(RecordingGateway::new()), Arc::new(MemoryStore::new()), 1);
        Dispatcher::new(reg, cx)
            .dispatch(&msg_event(5, ChatKind::Private, Some(2), "hi"))
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["stopper"]);
    }

    #[tokio::test]
    async fn handler_failure_does_not_abort_later_groups() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reg = Registry::new();
        reg.register(0, Filter::any(), Probe::failing("boom", &log));
        reg.register(1, Filter::any(), Probe::new("after", &log));

        let cx = test_ctx(Arc::new(RecordingGateway::new()), Arc::new(MemoryStore::new()), 1);
        Dispatcher::new(reg, cx)
            .dispatch(&msg_event(5, ChatKind::Private, Some(2), "hi"))
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["boom", "after"]);
    }

    #[tokio::test]
    async fn ban_gate_refuses_and_dispatch_continues() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reg = Registry::new();
        reg.register_gated(0, Filter::any(), Probe::new("gated", &log));
        reg.register(1, Filter::any(), Probe::new("ungated", &log));

        let gw = Arc::new(RecordingGateway::new());
        let store = Arc::new(MemoryStore::new());
        store.add_ban(UserId(2)).await.unwrap();

        let cx = test_ctx(gw.clone(), store, 1);
        Dispatcher::new(reg, cx)
            .dispatch(&msg_event(5, ChatKind::Private, Some(2), "hi"))
            .await;

        // Gated body skipped, refusal sent, later group still ran.
        assert_eq!(*log.lock().unwrap(), vec!["ungated"]);
        let replies = gw.reply_texts();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("banned"), "got: {}", replies[0]);
    }

    #[tokio::test]
    async fn ban_gate_is_opt_in() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut reg = Registry::new();
        reg.register(0, Filter::any(), Probe::new("exempt", &log));

        let store = Arc::new(MemoryStore::new());
        store.add_ban(UserId(2)).await.unwrap();

        let cx = test_ctx(Arc::new(RecordingGateway::new()), store, 1);
        Dispatcher::new(reg, cx)
            .dispatch(&msg_event(5, ChatKind::Private, Some(2), "hi"))
            .await;

        assert_eq!(*log.lock().unwrap(), vec!["exempt"]);
    }

    #[test]
    fn filters_compose() {
        let ev = msg_event(5, ChatKind::Group, Some(2), "/ping");
        assert!(Filter::command("ping").matches(&ev));
        assert!(!Filter::command("me").matches(&ev));
        assert!(Filter::command("ping").and(Filter::user(UserId(2))).matches(&ev));
        assert!(!Filter::command("ping").and(Filter::user(UserId(3))).matches(&ev));
        assert!(Filter::Private.not().matches(&ev));
        assert!(Filter::custom(|e| e.chat_id().0 == 5).matches(&ev));
        assert!(!Filter::Callback.matches(&ev));
    }
}
