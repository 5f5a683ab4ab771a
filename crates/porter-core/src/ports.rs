use async_trait::async_trait;

use crate::{
    auth::Membership,
    domain::{ChatId, MessageRef, UserId},
    event::Event,
    Result,
};

/// Messaging gateway port.
///
/// Telegram is the first implementation; the shape is kept small enough that
/// other transports can fit behind it. Text is HTML where the transport
/// supports it.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;
    async fn edit(&self, msg: MessageRef, text: &str) -> Result<()>;

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()>;

    /// Membership data for the permission gate. The gateway owns this, not
    /// the persistence store.
    async fn member(&self, chat_id: ChatId, user_id: UserId) -> Result<Membership>;

    /// Best-effort display name lookup for confirmation messages.
    async fn user_name(&self, user_id: UserId) -> Option<String>;
}

/// Deliver `text` to the event's sender through the arm-appropriate channel:
/// a chat reply for messages, an alert for callback queries.
pub async fn respond(gw: &dyn Gateway, ev: &Event, text: &str) -> Result<()> {
    match ev {
        Event::Message(m) => {
            gw.reply(m.chat_id, text).await?;
            Ok(())
        }
        Event::Callback(c) => gw.answer_callback(&c.callback_id, Some(text), true).await,
    }
}
