use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMemberUpdated};
use tracing::{debug, info};

use crate::config::Config;
use crate::ops::{ChatOps, TelegramOps};
use crate::sanitize::Sanitizer;
use crate::spam::{SpamFilter, WarningTracker};
use crate::{greet, relay, spam};

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub ops: Arc<dyn ChatOps>,
    pub sanitizer: Sanitizer,
    pub spam_filter: SpamFilter,
    pub warnings: WarningTracker,
}

impl AppState {
    pub fn new(config: Config, ops: Arc<dyn ChatOps>) -> Result<Self> {
        let sanitizer = Sanitizer::new(&config.moderation.admin_contact)?;
        let spam_filter = SpamFilter::new(&config.moderation.spam_keywords)?;
        Ok(Self {
            config,
            ops,
            sanitizer,
            spam_filter,
            warnings: WarningTracker::default(),
        })
    }
}

/// Branch (a): any message originating in the analyst group is relayed.
pub fn is_analyst_message(msg: &Message, analyst_group: ChatId) -> bool {
    msg.chat.id == analyst_group
}

/// Branch (c): non-forwarded text/caption messages in the open group are
/// scanned for spam. Disjoint from branch (a) because the two group ids
/// must differ (enforced at config load), so analyst posts never reach
/// the guard regardless of branch order.
pub fn is_spam_candidate(msg: &Message, open_group: ChatId) -> bool {
    msg.chat.id == open_group
        && (msg.text().is_some() || msg.caption().is_some())
        && msg.forward_origin().is_none()
}

/// Start the Telegram bot
pub async fn run(config: Config) -> Result<()> {
    let bot = Bot::new(&config.telegram.bot_token);
    let ops: Arc<dyn ChatOps> = Arc::new(TelegramOps::new(bot.clone()));
    let state = Arc::new(AppState::new(config, ops)?);

    let analyst_group = ChatId(state.config.telegram.analyst_group_id);
    let open_group = ChatId(state.config.telegram.open_group_id);

    info!("Starting Telegram bot...");

    // Branch order matters: analyst-group messages are relayed and must
    // never fall through to the spam guard.
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter(move |msg: Message| is_analyst_message(&msg, analyst_group))
                .endpoint(relay::handle),
        )
        .branch(
            Update::filter_chat_member()
                .filter(move |upd: ChatMemberUpdated| upd.chat.id == open_group)
                .endpoint(greet::handle),
        )
        .branch(
            Update::filter_message()
                .filter(move |msg: Message| is_spam_candidate(&msg, open_group))
                .endpoint(spam::handle),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!("Ignoring update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("relaybot"))
        .build()
        .dispatch()
        .await;

    Ok(())
}
