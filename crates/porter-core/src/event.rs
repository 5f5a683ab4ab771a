use crate::domain::{ChatId, ChatKind, MessageId, MessageRef, UserId};

/// Inbound update from the messaging gateway.
///
/// Each arm carries its own reply path: messages are answered with a chat
/// reply, callback queries with an alert (see `ports::respond`).
#[derive(Clone, Debug)]
pub enum Event {
    Message(MessageEvent),
    Callback(CallbackEvent),
}

#[derive(Clone, Debug)]
pub struct MessageEvent {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub from: Option<UserId>,
    pub text: Option<String>,
    pub command: Option<Command>,
    pub message_id: MessageId,
    pub locale_hint: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CallbackEvent {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub from: UserId,
    pub callback_id: String,
    pub data: String,
    pub message: Option<MessageRef>,
    pub locale_hint: Option<String>,
}

/// A parsed `/command`, with the leading slash and bot mention stripped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    /// Parse `/name@bot arg1 arg2 ...`.
    ///
    /// Returns `None` for non-commands and for commands addressed to a
    /// different bot (`/name@other`).
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;

        let (name, target) = match head.split_once('@') {
            Some((n, t)) => (n, Some(t)),
            None => (head, None),
        };
        if name.is_empty() {
            return None;
        }
        if let (Some(target), Some(me)) = (target, bot_username) {
            if !target.eq_ignore_ascii_case(me) {
                return None;
            }
        }

        Some(Self {
            name: name.to_ascii_lowercase(),
            args: parts.map(str::to_string).collect(),
        })
    }
}

impl Event {
    pub fn chat_id(&self) -> ChatId {
        match self {
            Event::Message(m) => m.chat_id,
            Event::Callback(c) => c.chat_id,
        }
    }

    pub fn chat_kind(&self) -> ChatKind {
        match self {
            Event::Message(m) => m.chat_kind,
            Event::Callback(c) => c.chat_kind,
        }
    }

    pub fn from_user(&self) -> Option<UserId> {
        match self {
            Event::Message(m) => m.from,
            Event::Callback(c) => Some(c.from),
        }
    }

    /// The parsed command, for message events only.
    pub fn command(&self) -> Option<&Command> {
        match self {
            Event::Message(m) => m.command.as_ref(),
            Event::Callback(_) => None,
        }
    }

    pub fn locale_hint(&self) -> Option<&str> {
        match self {
            Event::Message(m) => m.locale_hint.as_deref(),
            Event::Callback(c) => c.locale_hint.as_deref(),
        }
    }
}
