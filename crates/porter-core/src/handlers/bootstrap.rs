use async_trait::async_trait;

use crate::{
    dispatch::{Ctx, Handler, Outcome},
    event::Event,
    Result,
};

/// Always-first handler that guarantees the chat identity record exists
/// before any later group runs. Registered at the lowest group with an
/// always-true filter.
pub struct ChatBootstrap;

#[async_trait]
impl Handler for ChatBootstrap {
    async fn handle(&self, cx: &Ctx, ev: &Event) -> Result<Outcome> {
        let chat_id = ev.chat_id();
        let kind = ev.chat_kind();

        if !cx.store.chat_exists(chat_id, kind).await? {
            cx.store.add_chat(chat_id, kind).await?;
            tracing::debug!(chat = chat_id.0, ?kind, "recorded new chat");
        }

        Ok(Outcome::Continue)
    }
}
