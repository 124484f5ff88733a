use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ChatMemberUpdated;
use teloxide::utils::html;
use tracing::{error, info};

use crate::bot::AppState;
use crate::ops::MemberStatus;

/// True only for a genuine join: someone who was out of the group (left or
/// banned) becoming an active member. Promotions, restrictions and the bot's
/// own status changes do not count.
pub fn is_fresh_join(old: MemberStatus, new: MemberStatus) -> bool {
    matches!(old, MemberStatus::Left | MemberStatus::Banned)
        && matches!(new, MemberStatus::Member | MemberStatus::Administrator)
}

pub fn welcome_text(first_name: &str, admin_contact: &str) -> String {
    format!(
        "🎉 <b>Welcome to our group, {name}!</b> 🎉\n\n\
         We're glad to have you here!\n\n\
         📌 <b>Group Rules:</b>\n\
         • No spam or promotional content\n\
         • Be respectful to all members\n\
         • Share valuable insights and discussions\n\
         • No offensive language\n\n\
         ⚠️ <b>Note:</b> Spam messages will result in warnings. \
         After 3 warnings, you will be removed from the group.\n\n\
         Enjoy your stay! 🚀\n\n\
         For any questions, contact: {admin_contact}",
        name = html::escape(first_name),
    )
}

/// Endpoint for chat-member updates in the open group.
///
/// A failed welcome must never take down the event loop, so errors are
/// logged here instead of propagated.
pub async fn handle(update: ChatMemberUpdated, state: Arc<AppState>) -> Result<()> {
    let old = MemberStatus::from_kind(&update.old_chat_member.kind);
    let new = MemberStatus::from_kind(&update.new_chat_member.kind);

    if !is_fresh_join(old, new) {
        return Ok(());
    }

    let user = &update.new_chat_member.user;
    let text = welcome_text(&user.first_name, &state.config.moderation.admin_contact);

    match state.ops.send_html(update.chat.id, &text).await {
        Ok(()) => info!("Welcomed new member {} ({})", user.first_name, user.id),
        Err(e) => error!("Failed to send welcome message: {e:#}"),
    }

    Ok(())
}
