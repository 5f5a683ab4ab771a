//! In-process doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    auth::Membership,
    dispatch::Ctx,
    domain::{ChatId, ChatKind, MessageId, MessageRef, UserId},
    event::{Command, Event, MessageEvent},
    i18n::Locales,
    ports::Gateway,
    store::Store,
    Result,
};

/// Gateway double that records everything sent through it.
#[derive(Default)]
pub(crate) struct RecordingGateway {
    pub replies: Mutex<Vec<(ChatId, String)>>,
    pub edits: Mutex<Vec<(MessageRef, String)>>,
    pub alerts: Mutex<Vec<(String, String)>>,
    members: Mutex<HashMap<(i64, i64), Membership>>,
    names: Mutex<HashMap<i64, String>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_member(&self, chat: ChatId, user: UserId, membership: Membership) {
        self.members
            .lock()
            .unwrap()
            .insert((chat.0, user.0), membership);
    }

    pub fn set_name(&self, user: UserId, name: &str) {
        self.names.lock().unwrap().insert(user.0, name.to_string());
    }

    pub fn reply_texts(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn alert_texts(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let mut replies = self.replies.lock().unwrap();
        replies.push((chat_id, text.to_string()));
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(replies.len() as i32),
        })
    }

    async fn edit(&self, msg: MessageRef, text: &str) -> Result<()> {
        self.edits.lock().unwrap().push((msg, text.to_string()));
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        _show_alert: bool,
    ) -> Result<()> {
        self.alerts
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.unwrap_or_default().to_string()));
        Ok(())
    }

    async fn member(&self, chat_id: ChatId, user_id: UserId) -> Result<Membership> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&(chat_id.0, user_id.0))
            .copied()
            .unwrap_or_else(Membership::outside))
    }

    async fn user_name(&self, user_id: UserId) -> Option<String> {
        self.names.lock().unwrap().get(&user_id.0).cloned()
    }
}

pub(crate) fn msg_event(chat: i64, kind: ChatKind, from: Option<i64>, text: &str) -> Event {
    msg_event_with_locale(chat, kind, from, text, None)
}

pub(crate) fn msg_event_with_locale(
    chat: i64,
    kind: ChatKind,
    from: Option<i64>,
    text: &str,
    locale_hint: Option<&str>,
) -> Event {
    Event::Message(MessageEvent {
        chat_id: ChatId(chat),
        chat_kind: kind,
        from: from.map(UserId),
        text: Some(text.to_string()),
        command: Command::parse(text, None),
        message_id: MessageId(1),
        locale_hint: locale_hint.map(str::to_string),
    })
}

pub(crate) fn test_ctx(
    gateway: Arc<RecordingGateway>,
    store: Arc<dyn Store>,
    super_admin: i64,
) -> Ctx {
    Ctx {
        store,
        gateway,
        locales: Arc::new(Locales::embedded("en_US").unwrap()),
        super_admin: UserId(super_admin),
    }
}
