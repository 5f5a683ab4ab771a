//! Long-polling router: builds the dispatch pipeline once at startup and
//! feeds converted updates into it.

use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};

use porter_core::{
    commands::CommandCatalog,
    config::Config,
    dispatch::{Ctx, Dispatcher as Pipeline},
    handlers,
    i18n::Locales,
    ports::Gateway,
    store::{MemoryStore, Store},
};

use crate::{convert, TelegramGateway};

pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub bot_username: Option<String>,
    pub chat_locks: Arc<ChatLocks>,
}

/// Keyed mutex serializing handling per chat. Events for different chats
/// run concurrently; within one chat, arrival order is preserved.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    let bot_username = match bot.get_me().await {
        Ok(me) => Some(me.username().to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "get_me failed; commands with @mentions won't be filtered");
            None
        }
    };
    if let Some(name) = &bot_username {
        tracing::info!(bot = %name, "porter started");
    }

    let gateway: Arc<dyn Gateway> = Arc::new(TelegramGateway::new(bot.clone()));
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let locales = Arc::new(Locales::embedded(&cfg.default_locale)?);

    let mut catalog = CommandCatalog::new();
    let registry = handlers::build_registry(cfg.super_admin, &mut catalog);
    tracing::info!(
        handlers = registry.len(),
        commands = catalog.len(),
        "pipeline ready"
    );

    let pipeline = Arc::new(Pipeline::new(
        registry,
        Ctx {
            store,
            gateway,
            locales,
            super_admin: cfg.super_admin,
        },
    ));

    let state = Arc::new(AppState {
        pipeline,
        bot_username,
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let ev = match convert::message_event(&msg, state.bot_username.as_deref()) {
        Ok(ev) => ev,
        Err(e) => {
            tracing::error!(error = %e, "dropping unprocessable message update");
            return Ok(());
        }
    };

    let _guard = state.chat_locks.lock_chat(ev.chat_id().0).await;
    state.pipeline.dispatch(&ev).await;
    Ok(())
}

async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let ev = match convert::callback_event(&q) {
        Ok(ev) => ev,
        Err(e) => {
            tracing::debug!(error = %e, "dropping unprocessable callback query");
            return Ok(());
        }
    };

    let _guard = state.chat_locks.lock_chat(ev.chat_id().0).await;
    state.pipeline.dispatch(&ev).await;
    Ok(())
}
