//! Telegram adapter (teloxide).
//!
//! This crate implements the `porter-core` Gateway port over the Telegram
//! Bot API and owns the long-polling loop.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};

use tokio::time::sleep;

pub mod convert;
pub mod router;

use porter_core::{
    auth::{MemberRole, Membership, Privileges},
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    ports::Gateway,
    Result,
};

#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Gateway(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn reply(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit(&self, msg: MessageRef, text: &str) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .edit_message_text(
                    Self::tg_chat(msg.chat_id),
                    Self::tg_msg_id(msg.message_id),
                    text.to_string(),
                )
                .parse_mode(ParseMode::Html)
        })
        .await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()> {
        self.with_retry(|| {
            let mut req = self
                .bot
                .answer_callback_query(callback_id.to_string())
                .show_alert(show_alert);
            if let Some(t) = text {
                req = req.text(t.to_string());
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn member(&self, chat_id: ChatId, user_id: UserId) -> Result<Membership> {
        let member = self
            .with_retry(|| {
                self.bot.get_chat_member(
                    Self::tg_chat(chat_id),
                    teloxide::types::UserId(user_id.0 as u64),
                )
            })
            .await?;

        let kind = &member.kind;
        let role = if kind.is_owner() {
            MemberRole::Owner
        } else if kind.is_administrator() {
            MemberRole::Administrator
        } else if kind.is_member() || kind.is_restricted() {
            MemberRole::Member
        } else {
            MemberRole::Outside
        };

        // The accessor methods report owners as holding every right.
        let privileges = Privileges {
            can_change_info: kind.can_change_info(),
            can_delete_messages: kind.can_delete_messages(),
            can_restrict_members: kind.can_restrict_members(),
            can_invite_users: kind.can_invite_users(),
            can_pin_messages: kind.can_pin_messages(),
            can_promote_members: kind.can_promote_members(),
        };

        Ok(Membership { role, privileges })
    }

    async fn user_name(&self, user_id: UserId) -> Option<String> {
        // Telegram has no direct user lookup for bots; the private chat with
        // the user carries the same profile fields.
        let chat = self
            .bot
            .get_chat(teloxide::types::ChatId(user_id.0))
            .await
            .ok()?;

        chat.username()
            .map(str::to_string)
            .or_else(|| chat.first_name().map(str::to_string))
    }
}
