use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{EditRequest, SendRequest},
    Result,
};

/// Messenger port used by the status manager.
///
/// Implementations own their wire protocol and auth; the manager only needs
/// create, edit-in-place and delete.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, req: SendRequest) -> Result<MessageRef>;

    /// Fails with `Error::NotModified` when the content is unchanged.
    async fn edit_message_text(&self, msg: MessageRef, req: EditRequest) -> Result<()>;

    /// Returns `Ok(false)` when the messenger reports the message was not deleted.
    async fn delete_message(&self, msg: MessageRef) -> Result<bool>;
}
