use serde::{Deserialize, Serialize};

use crate::domain::{ChatId, MessageId};

/// How the messenger should interpret markup in the message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    MarkdownV2,
    /// Legacy Telegram markdown.
    Markdown,
}

/// A formatted span of the message text, as an alternative to `ParseMode`.
///
/// Offsets and lengths are measured in UTF-16 code units (Telegram semantics).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(flatten)]
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Code,
    Pre {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    TextLink {
        url: String,
    },
}

impl MessageEntity {
    pub fn new(kind: EntityKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPreviewOptions {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prefer_small_media: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prefer_large_media: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub show_above_text: bool,
}

impl LinkPreviewOptions {
    pub fn disabled() -> Self {
        Self {
            is_disabled: true,
            ..Self::default()
        }
    }
}

/// Reply linkage for a newly sent message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyParameters {
    pub message_id: MessageId,
    /// `None` replies within the target chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_sending_without_reply: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

/// Suggested post options for channel direct messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedPostParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<SuggestedPostPrice>,
    /// Unix timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_date: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedPostPrice {
    pub currency: String,
    pub amount: i64,
}

/// Inline keyboard attached below a message. Each inner vec is one row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub label: String,
    #[serde(flatten)]
    pub action: ButtonAction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    CallbackData(String),
    Url(String),
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::CallbackData(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

/// A "create message" request. Carries every delivery option.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendRequest {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub entities: Vec<MessageEntity>,
    pub link_preview_options: Option<LinkPreviewOptions>,
    pub disable_notification: bool,
    pub protect_content: bool,
    pub allow_paid_broadcast: bool,
    pub message_effect_id: Option<String>,
    pub suggested_post_parameters: Option<SuggestedPostParameters>,
    pub reply_parameters: Option<ReplyParameters>,
    pub reply_markup: Option<InlineKeyboard>,
}

/// An "edit message text" request.
///
/// Strict subset of `SendRequest`: notification, protection, paid broadcast,
/// effect, suggested post and reply options cannot change on an existing message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditRequest {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub entities: Vec<MessageEntity>,
    pub link_preview_options: Option<LinkPreviewOptions>,
    pub reply_markup: Option<InlineKeyboard>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_serializes_with_bot_api_shape() {
        let e = MessageEntity::new(
            EntityKind::TextLink {
                url: "https://example.com".to_string(),
            },
            0,
            4,
        );
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["type"], "text_link");
        assert_eq!(v["url"], "https://example.com");
        assert_eq!(v["offset"], 0);
        assert_eq!(v["length"], 4);
    }

    #[test]
    fn one_per_row_puts_each_button_on_its_own_row() {
        let kb = InlineKeyboard::one_per_row(vec![
            InlineButton::callback("Refresh", "status:refresh"),
            InlineButton::url("Dashboard", "https://example.com"),
        ]);
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(
            kb.rows[1][0].action,
            ButtonAction::Url("https://example.com".to_string())
        );
    }

    #[test]
    fn link_preview_defaults_are_omitted() {
        let v = serde_json::to_value(LinkPreviewOptions::disabled()).unwrap();
        assert_eq!(v, serde_json::json!({ "is_disabled": true }));
    }
}
