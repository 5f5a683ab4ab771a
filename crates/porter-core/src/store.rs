//! Persistence port and its in-memory reference implementation.
//!
//! The pipeline only ever issues single-row reads and writes; every
//! operation must be individually atomic and duplicate writes must be
//! idempotent (`add_ban` twice leaves one ban, no error).

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ChatId, ChatKind, UserId},
    Result,
};

#[async_trait]
pub trait Store: Send + Sync {
    async fn chat_exists(&self, chat_id: ChatId, kind: ChatKind) -> Result<bool>;
    async fn add_chat(&self, chat_id: ChatId, kind: ChatKind) -> Result<()>;

    async fn is_user_admin(&self, user_id: UserId) -> Result<bool>;
    async fn add_admin(&self, user_id: UserId) -> Result<()>;
    async fn remove_admin(&self, user_id: UserId) -> Result<()>;

    async fn is_banned(&self, user_id: UserId) -> Result<bool>;
    async fn add_ban(&self, user_id: UserId) -> Result<()>;
    async fn remove_ban(&self, user_id: UserId) -> Result<()>;
}

/// In-process store.
///
/// Chats are partitioned by kind: private chats, groups and channels live in
/// disjoint sets, and groups and supergroups share one partition. A SQL
/// adapter would keep the same layout (one table per partition).
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Partitions>,
}

#[derive(Default)]
struct Partitions {
    users: HashSet<i64>,
    groups: HashSet<i64>,
    channels: HashSet<i64>,
    admins: HashSet<i64>,
    banned: HashSet<i64>,
}

impl Partitions {
    fn chats(&self, kind: ChatKind) -> &HashSet<i64> {
        match kind {
            ChatKind::Private => &self.users,
            ChatKind::Group | ChatKind::Supergroup => &self.groups,
            ChatKind::Channel => &self.channels,
        }
    }

    fn chats_mut(&mut self, kind: ChatKind) -> &mut HashSet<i64> {
        match kind {
            ChatKind::Private => &mut self.users,
            ChatKind::Group | ChatKind::Supergroup => &mut self.groups,
            ChatKind::Channel => &mut self.channels,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn chat_exists(&self, chat_id: ChatId, kind: ChatKind) -> Result<bool> {
        Ok(self.inner.lock().await.chats(kind).contains(&chat_id.0))
    }

    async fn add_chat(&self, chat_id: ChatId, kind: ChatKind) -> Result<()> {
        self.inner.lock().await.chats_mut(kind).insert(chat_id.0);
        Ok(())
    }

    async fn is_user_admin(&self, user_id: UserId) -> Result<bool> {
        Ok(self.inner.lock().await.admins.contains(&user_id.0))
    }

    async fn add_admin(&self, user_id: UserId) -> Result<()> {
        self.inner.lock().await.admins.insert(user_id.0);
        Ok(())
    }

    async fn remove_admin(&self, user_id: UserId) -> Result<()> {
        self.inner.lock().await.admins.remove(&user_id.0);
        Ok(())
    }

    async fn is_banned(&self, user_id: UserId) -> Result<bool> {
        Ok(self.inner.lock().await.banned.contains(&user_id.0))
    }

    async fn add_ban(&self, user_id: UserId) -> Result<()> {
        self.inner.lock().await.banned.insert(user_id.0);
        Ok(())
    }

    async fn remove_ban(&self, user_id: UserId) -> Result<()> {
        self.inner.lock().await.banned.remove(&user_id.0);
        Ok(())
    }
}
