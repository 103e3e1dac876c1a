use std::{path::Path, time::Duration};

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    status::params::StatusParams,
    Error,
};

/// Everything the status manager reports while it runs.
#[derive(Debug)]
pub enum StatusEvent<'a> {
    Loaded {
        path: &'a Path,
        message_id: MessageId,
    },
    LoadFailed {
        path: &'a Path,
        error: &'a Error,
    },
    ResendTimeoutIgnored {
        timeout: Duration,
    },
    UpdaterStarted {
        period: Duration,
    },
    Updating,
    SendingNew {
        chat_id: ChatId,
    },
    Editing {
        message: MessageRef,
    },
    EditFailed {
        message: MessageRef,
        error: &'a Error,
    },
    DeleteFailed {
        message: MessageRef,
        error: &'a Error,
    },
    NotDeleted {
        message: MessageRef,
    },
    Updated {
        message: MessageRef,
    },
    UpdateFailed {
        params: &'a StatusParams,
        error: &'a Error,
    },
    Stopping,
    Saving {
        path: &'a Path,
        message_id: MessageId,
    },
    SaveFailed {
        error: &'a Error,
    },
    Stopped,
}

/// Logging sink injected into the status manager.
pub trait StatusObserver: Send + Sync {
    fn on_event(&self, event: &StatusEvent<'_>);
}

/// Default observer: structured `tracing` records.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl StatusObserver for TracingObserver {
    fn on_event(&self, event: &StatusEvent<'_>) {
        match event {
            StatusEvent::Loaded { path, message_id } => tracing::info!(
                path = %path.display(),
                message_id = message_id.0,
                "Loaded status message id"
            ),
            StatusEvent::LoadFailed { path, error } => tracing::error!(
                path = %path.display(),
                error = %error,
                "Failed to load save file"
            ),
            StatusEvent::ResendTimeoutIgnored { timeout } => tracing::warn!(
                timeout = ?timeout,
                "Delete-and-resend timeout is not implemented; ignoring"
            ),
            StatusEvent::UpdaterStarted { period } => {
                tracing::debug!(period = ?period, "Updater started")
            }
            StatusEvent::Updating => tracing::debug!("Updating status..."),
            StatusEvent::SendingNew { chat_id } => tracing::warn!(
                chat_id = chat_id.0,
                "Message ID is not set; sending new message..."
            ),
            StatusEvent::Editing { message } => tracing::debug!(
                chat_id = message.chat_id.0,
                message_id = message.message_id.0,
                "Editing status message..."
            ),
            StatusEvent::EditFailed { message, error } => tracing::warn!(
                chat_id = message.chat_id.0,
                message_id = message.message_id.0,
                error = %error,
                "Failed to edit status message; deleting it and sending a new one..."
            ),
            StatusEvent::DeleteFailed { message, error } => tracing::error!(
                chat_id = message.chat_id.0,
                message_id = message.message_id.0,
                error = %error,
                "Failed to delete status message"
            ),
            StatusEvent::NotDeleted { message } => tracing::warn!(
                chat_id = message.chat_id.0,
                message_id = message.message_id.0,
                "The status message is not deleted"
            ),
            StatusEvent::Updated { message } => tracing::info!(
                chat_id = message.chat_id.0,
                message_id = message.message_id.0,
                "Status updated"
            ),
            StatusEvent::UpdateFailed { params, error } => {
                let params = serde_json::to_string(params).unwrap_or_else(|e| e.to_string());
                tracing::warn!(error = %error, params = %params, "Failed to update status")
            }
            StatusEvent::Stopping => tracing::debug!("Stopping updater..."),
            StatusEvent::Saving { path, message_id } => tracing::debug!(
                path = %path.display(),
                message_id = message_id.0,
                "Saving message ID..."
            ),
            StatusEvent::SaveFailed { error } => {
                tracing::error!(error = %error, "Failed to save message ID")
            }
            StatusEvent::Stopped => tracing::info!("Updater stopped"),
        }
    }
}
