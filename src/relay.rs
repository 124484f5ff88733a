use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId};
use tracing::info;

use crate::bot::AppState;
use crate::ops::ChatOps;
use crate::sanitize::Sanitizer;

/// Caption given to voice posts that arrive without one.
const VOICE_PLACEHOLDER: &str = "🎤 Voice message from analyst";

/// An analyst post reduced to what the public group needs to see.
/// Media is carried by file id, never re-uploaded.
#[derive(Debug, Clone, PartialEq)]
pub enum Post {
    Text(String),
    Photo { file: FileId, caption: Option<String> },
    Document { file: FileId, caption: Option<String> },
    Video { file: FileId, caption: Option<String> },
    Voice { file: FileId, caption: Option<String> },
}

/// Classifies a message into a relayable post. Content kinds outside the
/// supported five (stickers, polls, locations, ...) yield `None` and the
/// message is dropped without a trace.
pub fn extract_post(msg: &Message) -> Option<Post> {
    let caption = msg.caption().map(|c| c.to_string());

    if let Some(text) = msg.text() {
        Some(Post::Text(text.to_string()))
    } else if let Some(sizes) = msg.photo() {
        let largest = sizes.last()?;
        Some(Post::Photo {
            file: largest.file.id.clone(),
            caption,
        })
    } else if let Some(doc) = msg.document() {
        Some(Post::Document {
            file: doc.file.id.clone(),
            caption,
        })
    } else if let Some(video) = msg.video() {
        Some(Post::Video {
            file: video.file.id.clone(),
            caption,
        })
    } else if let Some(voice) = msg.voice() {
        Some(Post::Voice {
            file: voice.file.id.clone(),
            caption,
        })
    } else {
        None
    }
}

/// Publishes one sanitized post to the public group.
///
/// Media that arrives without a caption still gets the contact footer as its
/// caption. Voice posts without a caption get a fixed placeholder instead.
pub async fn publish(
    ops: &dyn ChatOps,
    chat: ChatId,
    post: Post,
    sanitizer: &Sanitizer,
) -> Result<()> {
    match post {
        Post::Text(text) => ops.send_html(chat, &sanitizer.apply(&text)).await,
        Post::Photo { file, caption } => {
            ops.send_photo(chat, file, &media_caption(sanitizer, caption))
                .await
        }
        Post::Document { file, caption } => {
            ops.send_document(chat, file, &media_caption(sanitizer, caption))
                .await
        }
        Post::Video { file, caption } => {
            ops.send_video(chat, file, &media_caption(sanitizer, caption))
                .await
        }
        Post::Voice { file, caption } => {
            let caption = match caption {
                Some(c) => sanitizer.apply(&c),
                None => VOICE_PLACEHOLDER.to_string(),
            };
            ops.send_voice(chat, file, &caption).await
        }
    }
}

fn media_caption(sanitizer: &Sanitizer, caption: Option<String>) -> String {
    let sanitized = sanitizer.apply(caption.as_deref().unwrap_or(""));
    if sanitized.is_empty() {
        sanitizer.contact_footer()
    } else {
        sanitized
    }
}

/// Endpoint for messages originating in the analyst group.
///
/// Publish failures propagate to the dispatcher's error handler; the relay
/// path deliberately has no retry of its own.
pub async fn handle(msg: Message, state: Arc<AppState>) -> Result<()> {
    let Some(post) = extract_post(&msg) else {
        return Ok(());
    };

    let open_group = ChatId(state.config.telegram.open_group_id);
    publish(state.ops.as_ref(), open_group, post, &state.sanitizer).await?;

    info!("Relayed analyst post to open group {}", open_group);
    Ok(())
}
