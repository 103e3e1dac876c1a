//! Telegram adapter (teloxide).
//!
//! This crate implements the `tgstatus-core` MessagingPort over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageEntityKind},
    ApiError, RequestError,
};

use tokio::time::sleep;

use tgstatus_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{
            ButtonAction, EditRequest, EntityKind, InlineKeyboard, LinkPreviewOptions,
            MessageEntity, ParseMode, SendRequest,
        },
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self::new(Bot::new(token))
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        match e {
            RequestError::Api(ApiError::MessageNotModified) => Error::NotModified,
            RequestError::Api(api) if is_forbidden(&api) => Error::Forbidden(api.to_string()),
            RequestError::RetryAfter(d) => Error::RateLimited(d),
            RequestError::Network(e) => Error::Network(e.to_string()),
            // Non-JSON bodies come from proxies and 5xx pages, not from the Bot API.
            e @ (RequestError::InvalidJson { .. } | RequestError::Io(_)) => {
                Error::Network(e.to_string())
            }
            other => Error::External(format!("telegram error: {other}")),
        }
    }

    /// `Ok(false)` when the message was already gone.
    fn delete_outcome<T>(res: std::result::Result<T, RequestError>) -> Result<bool> {
        match res {
            Ok(_) => Ok(true),
            Err(RequestError::Api(ApiError::MessageToDeleteNotFound)) => Ok(false),
            Err(e) => Err(Self::map_err(e)),
        }
    }

    async fn with_retry<T, Fut>(&self, op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        self.with_retry_raw(op).await.map_err(Self::map_err)
    }

    /// Retries once on `RetryAfter`, leaving other errors for the caller to classify.
    async fn with_retry_raw<T, Fut>(
        &self,
        mut op: impl FnMut() -> Fut,
    ) -> std::result::Result<T, RequestError>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    sleep(d).await;
                }
                res => return res,
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_message(&self, chat_id: ChatId, req: SendRequest) -> Result<MessageRef> {
        let parse_mode = req.parse_mode.map(tg_parse_mode);
        let entities = tg_entities(&req.entities)?;
        let markup = req.reply_markup.as_ref().map(tg_keyboard).transpose()?;
        let disable_preview = preview_disabled(chat_id, req.link_preview_options.as_ref());
        let reply_to = req
            .reply_parameters
            .as_ref()
            .filter(|r| r.chat_id.map_or(true, |c| c == chat_id));
        if reply_to.is_none() {
            if let Some(r) = &req.reply_parameters {
                tracing::debug!(
                    chat_id = chat_id.0,
                    reply_chat_id = r.chat_id.map(|c| c.0),
                    "reply into another chat is skipped"
                );
            }
        }

        if req.allow_paid_broadcast
            || req.message_effect_id.is_some()
            || req.suggested_post_parameters.is_some()
        {
            tracing::debug!(
                chat_id = chat_id.0,
                "Bot API options not supported by this client are skipped"
            );
        }

        let msg = self
            .with_retry(|| {
                let mut r = self
                    .bot
                    .send_message(Self::tg_chat(chat_id), req.text.clone())
                    .disable_notification(req.disable_notification)
                    .protect_content(req.protect_content);
                if let Some(pm) = parse_mode {
                    r = r.parse_mode(pm);
                }
                if !entities.is_empty() {
                    r = r.entities(entities.clone());
                }
                if disable_preview {
                    r = r.disable_web_page_preview(true);
                }
                if let Some(reply) = reply_to {
                    r = r
                        .reply_to_message_id(Self::tg_msg_id(reply.message_id))
                        .allow_sending_without_reply(reply.allow_sending_without_reply);
                }
                if let Some(m) = &markup {
                    r = r.reply_markup(m.clone());
                }
                r
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_message_text(&self, msg: MessageRef, req: EditRequest) -> Result<()> {
        let parse_mode = req.parse_mode.map(tg_parse_mode);
        let entities = tg_entities(&req.entities)?;
        let markup = req.reply_markup.as_ref().map(tg_keyboard).transpose()?;
        let disable_preview = preview_disabled(msg.chat_id, req.link_preview_options.as_ref());

        self.with_retry(|| {
            let mut r = self.bot.edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                req.text.clone(),
            );
            if let Some(pm) = parse_mode {
                r = r.parse_mode(pm);
            }
            if !entities.is_empty() {
                r = r.entities(entities.clone());
            }
            if disable_preview {
                r = r.disable_web_page_preview(true);
            }
            if let Some(m) = &markup {
                r = r.reply_markup(m.clone());
            }
            r
        })
        .await?;
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<bool> {
        let res = self
            .with_retry_raw(|| {
                self.bot
                    .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
            })
            .await;
        Self::delete_outcome(res)
    }
}

/// Failures caused by the bot's standing in the chat. They clear up once an
/// admin restores access, so the current message must be kept.
fn is_forbidden(err: &ApiError) -> bool {
    match err {
        ApiError::BotBlocked
        | ApiError::BotKicked
        | ApiError::BotKickedFromSupergroup
        | ApiError::NotEnoughRightsToPostMessages
        | ApiError::ChatNotFound
        | ApiError::GroupDeactivated
        | ApiError::UserDeactivated
        | ApiError::CantInitiateConversation => true,
        ApiError::Unknown(msg) => msg.starts_with("Forbidden"),
        _ => false,
    }
}

/// Only `is_disabled` maps onto this client; the rest of the options are logged and skipped.
fn preview_disabled(chat_id: ChatId, opts: Option<&LinkPreviewOptions>) -> bool {
    let Some(o) = opts else {
        return false;
    };
    if o.url.is_some() || o.prefer_small_media || o.prefer_large_media || o.show_above_text {
        tracing::debug!(
            chat_id = chat_id.0,
            "link preview options not supported by this client are skipped"
        );
    }
    o.is_disabled
}

#[allow(deprecated)]
fn tg_parse_mode(mode: ParseMode) -> teloxide::types::ParseMode {
    match mode {
        ParseMode::Html => teloxide::types::ParseMode::Html,
        ParseMode::MarkdownV2 => teloxide::types::ParseMode::MarkdownV2,
        ParseMode::Markdown => teloxide::types::ParseMode::Markdown,
    }
}

fn tg_entities(entities: &[MessageEntity]) -> Result<Vec<teloxide::types::MessageEntity>> {
    entities
        .iter()
        .map(|e| {
            let kind = match &e.kind {
                EntityKind::Bold => MessageEntityKind::Bold,
                EntityKind::Italic => MessageEntityKind::Italic,
                EntityKind::Underline => MessageEntityKind::Underline,
                EntityKind::Strikethrough => MessageEntityKind::Strikethrough,
                EntityKind::Spoiler => MessageEntityKind::Spoiler,
                EntityKind::Code => MessageEntityKind::Code,
                EntityKind::Pre { language } => MessageEntityKind::Pre {
                    language: language.clone(),
                },
                EntityKind::TextLink { url } => MessageEntityKind::TextLink {
                    url: url
                        .parse()
                        .map_err(|err| Error::External(format!("invalid link {url:?}: {err}")))?,
                },
            };
            Ok(teloxide::types::MessageEntity {
                kind,
                offset: e.offset,
                length: e.length,
            })
        })
        .collect()
}

fn tg_keyboard(keyboard: &InlineKeyboard) -> Result<InlineKeyboardMarkup> {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| match &b.action {
                    ButtonAction::CallbackData(data) => {
                        Ok(InlineKeyboardButton::callback(b.label.clone(), data.clone()))
                    }
                    ButtonAction::Url(url) => {
                        let url = url.parse().map_err(|err| {
                            Error::External(format!("invalid button url {url:?}: {err}"))
                        })?;
                        Ok(InlineKeyboardButton::url(b.label.clone(), url))
                    }
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tgstatus_core::messaging::types::InlineButton;

    #[test]
    fn classifies_request_errors() {
        assert!(matches!(
            TelegramMessenger::map_err(RequestError::Api(ApiError::MessageNotModified)),
            Error::NotModified
        ));
        assert!(matches!(
            TelegramMessenger::map_err(RequestError::RetryAfter(Duration::from_secs(3))),
            Error::RateLimited(d) if d == Duration::from_secs(3)
        ));
        let rejected = TelegramMessenger::map_err(RequestError::Api(ApiError::MessageCantBeEdited));
        assert!(!rejected.is_transient());
        assert!(matches!(rejected, Error::External(_)));
        let gone = TelegramMessenger::map_err(RequestError::Api(ApiError::MessageToEditNotFound));
        assert!(!gone.is_transient());
    }

    #[test]
    fn lost_chat_access_keeps_the_message() {
        for api in [
            ApiError::NotEnoughRightsToPostMessages,
            ApiError::BotKicked,
            ApiError::BotKickedFromSupergroup,
            ApiError::BotBlocked,
            ApiError::ChatNotFound,
            ApiError::Unknown("Forbidden: bot is not a member of the channel chat".to_string()),
        ] {
            let err = TelegramMessenger::map_err(RequestError::Api(api));
            assert!(matches!(err, Error::Forbidden(_)), "{err:?}");
            assert!(err.is_transient());
        }
        assert!(!is_forbidden(&ApiError::Unknown(
            "Bad Request: message to edit not found".to_string()
        )));
    }

    #[test]
    fn unparseable_responses_are_network_errors() {
        let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = TelegramMessenger::map_err(RequestError::InvalidJson {
            source,
            raw: "<html>502 Bad Gateway</html>".into(),
        });
        assert!(matches!(err, Error::Network(_)));
        assert!(err.is_transient());

        let err = TelegramMessenger::map_err(RequestError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed",
        )));
        assert!(err.is_transient());
    }

    #[test]
    fn classifies_delete_results() {
        assert!(TelegramMessenger::delete_outcome(Ok(true)).unwrap());
        assert!(!TelegramMessenger::delete_outcome::<bool>(Err(RequestError::Api(
            ApiError::MessageToDeleteNotFound
        )))
        .unwrap());
        let err = TelegramMessenger::delete_outcome::<bool>(Err(RequestError::Api(
            ApiError::MessageCantBeDeleted,
        )))
        .unwrap_err();
        assert!(matches!(err, Error::External(_)));
        let err = TelegramMessenger::delete_outcome::<bool>(Err(RequestError::Api(
            ApiError::BotKicked,
        )))
        .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[test]
    fn link_preview_maps_only_the_disabled_flag() {
        let chat = ChatId(-1001);
        assert!(!preview_disabled(chat, None));
        assert!(preview_disabled(chat, Some(&LinkPreviewOptions::disabled())));
        let opts = LinkPreviewOptions {
            url: Some("https://example.com".to_string()),
            prefer_small_media: true,
            ..LinkPreviewOptions::default()
        };
        assert!(!preview_disabled(chat, Some(&opts)));
    }

    #[test]
    fn maps_entities_including_links() {
        let out = tg_entities(&[
            MessageEntity::new(EntityKind::Bold, 0, 6),
            MessageEntity::new(
                EntityKind::TextLink {
                    url: "https://example.com/status".to_string(),
                },
                7,
                4,
            ),
        ])
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, MessageEntityKind::Bold);
        assert_eq!(out[1].offset, 7);
        assert!(matches!(out[1].kind, MessageEntityKind::TextLink { .. }));

        assert!(tg_entities(&[MessageEntity::new(
            EntityKind::TextLink {
                url: "not a url".to_string()
            },
            0,
            1
        )])
        .is_err());
    }

    #[test]
    fn maps_keyboard_rows() {
        let kb = InlineKeyboard::new(vec![
            vec![
                InlineButton::callback("Refresh", "refresh"),
                InlineButton::url("Open", "https://example.com"),
            ],
            vec![InlineButton::callback("Mute", "mute")],
        ]);
        let markup = tg_keyboard(&kb).unwrap();
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "Mute");
    }
}
