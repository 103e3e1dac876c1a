use serde::{Deserialize, Serialize};

use crate::messaging::types::{
    EditRequest, InlineKeyboard, LinkPreviewOptions, MessageEntity, ParseMode, ReplyParameters,
    SendRequest, SuggestedPostParameters,
};

/// Content and delivery options of one status update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusParams {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MessageEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_preview_options: Option<LinkPreviewOptions>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_notification: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub protect_content: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_paid_broadcast: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_effect_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_post_parameters: Option<SuggestedPostParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboard>,
}

impl StatusParams {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Plain text status that does not ping channel subscribers.
    pub fn silent(text: impl Into<String>) -> Self {
        Self {
            disable_notification: true,
            ..Self::text(text)
        }
    }

    pub fn to_send_request(&self) -> SendRequest {
        self.clone().into()
    }

    pub fn to_edit_request(&self) -> EditRequest {
        EditRequest {
            text: self.text.clone(),
            parse_mode: self.parse_mode,
            entities: self.entities.clone(),
            link_preview_options: self.link_preview_options.clone(),
            reply_markup: self.reply_markup.clone(),
        }
    }
}

impl From<StatusParams> for SendRequest {
    fn from(s: StatusParams) -> Self {
        SendRequest {
            text: s.text,
            parse_mode: s.parse_mode,
            entities: s.entities,
            link_preview_options: s.link_preview_options,
            disable_notification: s.disable_notification,
            protect_content: s.protect_content,
            allow_paid_broadcast: s.allow_paid_broadcast,
            message_effect_id: s.message_effect_id,
            suggested_post_parameters: s.suggested_post_parameters,
            reply_parameters: s.reply_parameters,
            reply_markup: s.reply_markup,
        }
    }
}

impl From<StatusParams> for EditRequest {
    fn from(s: StatusParams) -> Self {
        EditRequest {
            text: s.text,
            parse_mode: s.parse_mode,
            entities: s.entities,
            link_preview_options: s.link_preview_options,
            reply_markup: s.reply_markup,
        }
    }
}
