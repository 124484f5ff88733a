use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMemberKind, FileId, InputFile, MessageId, ParseMode, UserId};

/// A chat member's standing, as far as moderation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    pub fn from_kind(kind: &ChatMemberKind) -> Self {
        if kind.is_owner() {
            MemberStatus::Owner
        } else if kind.is_administrator() {
            MemberStatus::Administrator
        } else if kind.is_restricted() {
            MemberStatus::Restricted
        } else if kind.is_left() {
            MemberStatus::Left
        } else if kind.is_banned() {
            MemberStatus::Banned
        } else {
            MemberStatus::Member
        }
    }

    /// Owners and administrators are exempt from spam enforcement.
    pub fn is_privileged(&self) -> bool {
        matches!(self, MemberStatus::Owner | MemberStatus::Administrator)
    }
}

/// Outbound chat operations.
///
/// Telegram is the only production implementation; the handlers talk to this
/// trait so enforcement and relay logic can be exercised against a recording
/// double in tests.
#[async_trait]
pub trait ChatOps: Send + Sync {
    async fn send_html(&self, chat: ChatId, text: &str) -> Result<()>;

    async fn send_photo(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()>;
    async fn send_document(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()>;
    async fn send_video(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()>;
    async fn send_voice(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<()>;
    async fn member_status(&self, chat: ChatId, user: UserId) -> Result<MemberStatus>;
    async fn ban_member(&self, chat: ChatId, user: UserId) -> Result<()>;
}

pub struct TelegramOps {
    bot: Bot,
}

impl TelegramOps {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatOps for TelegramOps {
    async fn send_html(&self, chat: ChatId, text: &str) -> Result<()> {
        self.bot
            .send_message(chat, text.to_string())
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_photo(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()> {
        self.bot
            .send_photo(chat, InputFile::file_id(file))
            .caption(caption.to_string())
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_document(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()> {
        self.bot
            .send_document(chat, InputFile::file_id(file))
            .caption(caption.to_string())
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_video(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()> {
        self.bot
            .send_video(chat, InputFile::file_id(file))
            .caption(caption.to_string())
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn send_voice(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()> {
        self.bot
            .send_voice(chat, InputFile::file_id(file))
            .caption(caption.to_string())
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<()> {
        self.bot.delete_message(chat, message).await?;
        Ok(())
    }

    async fn member_status(&self, chat: ChatId, user: UserId) -> Result<MemberStatus> {
        let member = self.bot.get_chat_member(chat, user).await?;
        Ok(MemberStatus::from_kind(&member.kind))
    }

    async fn ban_member(&self, chat: ChatId, user: UserId) -> Result<()> {
        self.bot.ban_chat_member(chat, user).await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// Records every outbound call; used by the handler tests.
    #[derive(Default)]
    pub struct RecordingOps {
        pub sent: Mutex<Vec<(ChatId, String)>>,
        pub photos: Mutex<Vec<(ChatId, FileId, String)>>,
        pub documents: Mutex<Vec<(ChatId, FileId, String)>>,
        pub videos: Mutex<Vec<(ChatId, FileId, String)>>,
        pub voices: Mutex<Vec<(ChatId, FileId, String)>>,
        pub deleted: Mutex<Vec<(ChatId, MessageId)>>,
        pub banned: Mutex<Vec<(ChatId, UserId)>>,
        /// `None` makes `member_status` fail, simulating a lookup error.
        pub status: Option<MemberStatus>,
        /// Makes `ban_member` fail, simulating a rejected ban call.
        pub fail_bans: bool,
    }

    impl RecordingOps {
        pub fn with_status(status: MemberStatus) -> Self {
            Self {
                status: Some(status),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ChatOps for RecordingOps {
        async fn send_html(&self, chat: ChatId, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push((chat, text.to_string()));
            Ok(())
        }

        async fn send_photo(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()> {
            self.photos
                .lock()
                .unwrap()
                .push((chat, file, caption.to_string()));
            Ok(())
        }

        async fn send_document(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()> {
            self.documents
                .lock()
                .unwrap()
                .push((chat, file, caption.to_string()));
            Ok(())
        }

        async fn send_video(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()> {
            self.videos
                .lock()
                .unwrap()
                .push((chat, file, caption.to_string()));
            Ok(())
        }

        async fn send_voice(&self, chat: ChatId, file: FileId, caption: &str) -> Result<()> {
            self.voices
                .lock()
                .unwrap()
                .push((chat, file, caption.to_string()));
            Ok(())
        }

        async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<()> {
            self.deleted.lock().unwrap().push((chat, message));
            Ok(())
        }

        async fn member_status(&self, _chat: ChatId, _user: UserId) -> Result<MemberStatus> {
            self.status.ok_or_else(|| anyhow!("status lookup failed"))
        }

        async fn ban_member(&self, chat: ChatId, user: UserId) -> Result<()> {
            if self.fail_bans {
                return Err(anyhow!("ban rejected"));
            }
            self.banned.lock().unwrap().push((chat, user));
            Ok(())
        }
    }
}
