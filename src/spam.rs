use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, UserId};
use teloxide::utils::html;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::bot::AppState;
use crate::ops::ChatOps;

/// Violations before a ban.
const MAX_WARNINGS: u32 = 3;

/// Which heuristic flagged a message; used for logging only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamReason {
    Keyword(String),
    ExcessiveLinks(usize),
    ExcessiveCaps,
    RepeatedContent,
}

impl fmt::Display for SpamReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpamReason::Keyword(kw) => write!(f, "keyword {kw:?}"),
            SpamReason::ExcessiveLinks(n) => write!(f, "{n} links"),
            SpamReason::ExcessiveCaps => write!(f, "excessive capitals"),
            SpamReason::RepeatedContent => write!(f, "repeated content"),
        }
    }
}

pub struct SpamFilter {
    keywords: Vec<String>,
    link_re: Regex,
}

impl SpamFilter {
    pub fn new(keywords: &[String]) -> Result<Self> {
        Ok(Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            link_re: Regex::new(r"https?://\S+").context("Failed to compile link pattern")?,
        })
    }

    /// Applies the heuristics in order; the first hit wins.
    pub fn evaluate(&self, text: &str) -> Option<SpamReason> {
        let lower = text.to_lowercase();
        if let Some(kw) = self.keywords.iter().find(|kw| lower.contains(kw.as_str())) {
            return Some(SpamReason::Keyword(kw.clone()));
        }

        let links = self.link_re.find_iter(text).count();
        if links > 2 {
            return Some(SpamReason::ExcessiveLinks(links));
        }

        let total = text.chars().count();
        if total > 10 {
            let caps = text.chars().filter(|c| c.is_uppercase()).count();
            if caps as f64 / total as f64 > 0.6 {
                return Some(SpamReason::ExcessiveCaps);
            }
        }

        if total > 20 {
            let prefix: String = text.chars().take(10).collect();
            if text.matches(prefix.as_str()).count() > 3 {
                return Some(SpamReason::RepeatedContent);
            }
        }

        None
    }
}

/// Outcome of recording one violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Penalty {
    Warn { count: u32, remaining: u32 },
    Ban,
}

/// Per-user violation counts. Volatile: a restart forgets everything.
#[derive(Default)]
pub struct WarningTracker {
    counts: Mutex<HashMap<u64, u32>>,
}

impl WarningTracker {
    /// Increments the user's count and decides the penalty under a single
    /// lock, so two near-simultaneous violations cannot read the same
    /// pre-increment count. The entry survives until `clear`; a failed ban
    /// leaves it at the threshold so the next violation retries the ban.
    pub async fn record_violation(&self, user: UserId) -> Penalty {
        let mut counts = self.counts.lock().await;
        let count = counts.entry(user.0).or_insert(0);
        *count += 1;
        if *count >= MAX_WARNINGS {
            Penalty::Ban
        } else {
            Penalty::Warn {
                count: *count,
                remaining: MAX_WARNINGS - *count,
            }
        }
    }

    /// Forgets a user's count. Called once their ban has gone through.
    pub async fn clear(&self, user: UserId) {
        self.counts.lock().await.remove(&user.0);
    }

    /// Current count for a user; absent means zero.
    pub async fn count(&self, user: UserId) -> u32 {
        self.counts.lock().await.get(&user.0).copied().unwrap_or(0)
    }
}

/// The slice of a message the guard needs.
pub struct Author {
    pub id: UserId,
    pub first_name: String,
    pub is_bot: bool,
}

fn warning_text(first_name: &str, count: u32, remaining: u32) -> String {
    format!(
        "⚠️ <b>Warning for {name}</b> ⚠️\n\n\
         Your message has been removed for violating our spam policy.\n\n\
         <b>Warning {count}/{MAX_WARNINGS}</b>\n\
         You have <b>{remaining} warning(s)</b> remaining before removal.\n\n\
         Please follow the group rules!",
        name = html::escape(first_name),
    )
}

fn ban_text(first_name: &str) -> String {
    format!(
        "⛔ <b>{}</b> has been removed from the group for repeated spam violations.",
        html::escape(first_name),
    )
}

/// Runs the full guard over one public-group message: admission checks,
/// heuristics, then delete-warn-or-ban. Every outbound failure is logged and
/// swallowed; nothing in here may take down the event loop.
pub async fn scan_message(
    ops: &dyn ChatOps,
    filter: &SpamFilter,
    tracker: &WarningTracker,
    chat: ChatId,
    message_id: MessageId,
    author: &Author,
    text: &str,
) {
    if author.is_bot {
        return;
    }

    // Admin exemption. A failed lookup is logged and the message is scanned
    // anyway; see DESIGN.md for the policy.
    match ops.member_status(chat, author.id).await {
        Ok(status) if status.is_privileged() => return,
        Ok(_) => {}
        Err(e) => warn!(
            "Could not check member status for {}: {e:#}; scanning anyway",
            author.id
        ),
    }

    let Some(reason) = filter.evaluate(text) else {
        return;
    };

    info!(
        "Spam from {} ({}) in {chat}: {reason}",
        author.first_name, author.id
    );

    if let Err(e) = ops.delete_message(chat, message_id).await {
        error!("Failed to delete spam message {message_id:?}: {e:#}");
    }

    match tracker.record_violation(author.id).await {
        Penalty::Ban => {
            if let Err(e) = ops.ban_member(chat, author.id).await {
                error!("Failed to ban {}: {e:#}", author.id);
                return;
            }
            tracker.clear(author.id).await;
            if let Err(e) = ops.send_html(chat, &ban_text(&author.first_name)).await {
                error!("Failed to send ban notice: {e:#}");
            }
            info!("Banned {} ({}) for spam", author.first_name, author.id);
        }
        Penalty::Warn { count, remaining } => {
            let text = warning_text(&author.first_name, count, remaining);
            if let Err(e) = ops.send_html(chat, &text).await {
                error!("Failed to send warning: {e:#}");
            }
            info!(
                "Issued warning {count}/{MAX_WARNINGS} to {} ({})",
                author.first_name, author.id
            );
        }
    }
}

/// Endpoint for non-forwarded text/caption messages in the open group.
pub async fn handle(msg: Message, state: Arc<AppState>) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text().or_else(|| msg.caption()) else {
        return Ok(());
    };

    let author = Author {
        id: user.id,
        first_name: user.first_name.clone(),
        is_bot: user.is_bot,
    };

    scan_message(
        state.ops.as_ref(),
        &state.spam_filter,
        &state.warnings,
        msg.chat.id,
        msg.id,
        &author,
        text,
    )
    .await;

    Ok(())
}
