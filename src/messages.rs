//! Message normalization for both serving modes.
//!
//! Proxy mode keeps the structured message list and only rewrites assistant
//! text with box tokens. Direct mode collapses the conversation into one
//! prompt string and at most one decoded image.

use grounding_multimodal::{decode_image, is_data_url};
use grounding_protocol::{ChatMessage, ContentPart, MessageContent, Role};
use image::RgbImage;
use tracing::{debug, warn};

use crate::parsers::BoxTokens;

/// Apply box-token annotation to assistant-authored text.
///
/// String content and `text` parts of assistant messages are rewritten; every
/// other part, every extra field, and all user/system content pass through.
pub fn prepare_messages(messages: Vec<ChatMessage>, tokens: &BoxTokens) -> Vec<ChatMessage> {
    messages
        .into_iter()
        .map(|mut message| {
            if message.role == Role::Assistant {
                annotate_content(&mut message.content, tokens);
            }
            message
        })
        .collect()
}

fn annotate_content(content: &mut MessageContent, tokens: &BoxTokens) {
    match content {
        MessageContent::Text(text) => annotate_in_place(text, tokens),
        MessageContent::Parts(parts) => {
            for part in parts {
                if let ContentPart::Text { text, .. } = part {
                    annotate_in_place(text, tokens);
                }
            }
        }
    }
}

fn annotate_in_place(text: &mut String, tokens: &BoxTokens) {
    let annotated = tokens.annotate(text).into_owned();
    *text = annotated;
}

/// The (prompt, image) pair a grounding model consumes.
#[derive(Debug, Clone, Default)]
pub struct NormalizedPrompt {
    pub prompt: String,
    pub image: Option<RgbImage>,
}

/// Collapse user messages into one prompt and the last decodable image.
///
/// User text (string content or `text` parts) is joined with newlines in
/// message order and trimmed. Every `image_url` part carrying a data URL is
/// decoded and replaces any earlier image; a part that fails to decode is
/// logged and skipped. System and assistant messages, and images referenced by
/// plain URLs, are ignored.
pub fn extract_prompt_and_image(messages: &[ChatMessage]) -> NormalizedPrompt {
    let mut texts: Vec<&str> = Vec::new();
    let mut image = None;

    for message in messages.iter().filter(|m| m.role == Role::User) {
        match &message.content {
            MessageContent::Text(text) => texts.push(text),
            MessageContent::Parts(parts) => {
                for part in parts {
                    match part {
                        ContentPart::Text { text, .. } => texts.push(text),
                        ContentPart::ImageUrl { url, .. } if is_data_url(url) => {
                            match decode_image(url) {
                                Ok(decoded) => image = Some(decoded),
                                Err(e) => warn!(error = %e, "Skipping undecodable image part"),
                            }
                        }
                        ContentPart::ImageUrl { .. } => {
                            debug!("Ignoring image part without a data URL");
                        }
                        ContentPart::Other(_) => {}
                    }
                }
            }
        }
    }

    NormalizedPrompt {
        prompt: texts.join("\n").trim().to_string(),
        image,
    }
}
