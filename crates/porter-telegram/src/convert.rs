//! teloxide update types → core `Event` conversion.

use teloxide::types::{CallbackQuery, Chat, Message};

use porter_core::{
    domain::{ChatId, ChatKind, MessageId, MessageRef, UserId},
    errors::Error,
    event::{CallbackEvent, Command, Event, MessageEvent},
    Result,
};

/// Map the Telegram chat kind onto the core partition set.
///
/// A kind outside the recognized set is unrecoverable input: the caller
/// drops the update and logs, it never reaches a handler.
pub fn chat_kind(chat: &Chat) -> Result<ChatKind> {
    if chat.is_private() {
        return Ok(ChatKind::Private);
    }
    if chat.is_group() {
        return Ok(ChatKind::Group);
    }
    if chat.is_supergroup() {
        return Ok(ChatKind::Supergroup);
    }
    if chat.is_channel() {
        return Ok(ChatKind::Channel);
    }
    Err(Error::UnknownChatKind(format!("{:?}", chat.kind)))
}

pub fn message_event(msg: &Message, bot_username: Option<&str>) -> Result<Event> {
    let chat_kind = chat_kind(&msg.chat)?;
    let from = msg.from();
    let text = msg.text();

    Ok(Event::Message(MessageEvent {
        chat_id: ChatId(msg.chat.id.0),
        chat_kind,
        from: from.map(|u| UserId(u.id.0 as i64)),
        text: text.map(str::to_string),
        command: text.and_then(|t| Command::parse(t, bot_username)),
        message_id: MessageId(msg.id.0),
        locale_hint: from.and_then(|u| u.language_code.clone()),
    }))
}

pub fn callback_event(q: &CallbackQuery) -> Result<Event> {
    // Callback queries for inline-mode results carry no message; the
    // pipeline needs a chat to act on, so those are dropped upstream.
    let msg = q
        .message
        .as_ref()
        .ok_or_else(|| Error::Gateway("callback query without message".to_string()))?;

    let chat_id = ChatId(msg.chat.id.0);

    Ok(Event::Callback(CallbackEvent {
        chat_id,
        chat_kind: chat_kind(&msg.chat)?,
        from: UserId(q.from.id.0 as i64),
        callback_id: q.id.clone(),
        data: q.data.clone().unwrap_or_default(),
        message: Some(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }),
        locale_hint: q.from.language_code.clone(),
    }))
}
