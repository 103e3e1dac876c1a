use std::{fmt, path::PathBuf, sync::Arc, time::Duration};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::port::MessagingPort,
    status::{
        observer::{StatusEvent, StatusObserver, TracingObserver},
        params::StatusParams,
        store::IdentityStore,
    },
    Error, Result,
};

/// Produces the content of the next status update.
///
/// Called on the updater task; a slow provider delays the next tick.
pub trait ContentProvider: Send + Sync {
    fn status(&self) -> StatusParams;
}

impl<F> ContentProvider for F
where
    F: Fn() -> StatusParams + Send + Sync,
{
    fn status(&self) -> StatusParams {
        self()
    }
}

#[derive(Clone)]
pub struct StatusConfig {
    pub chat_id: ChatId,
    /// Content for every regular tick.
    pub status: Arc<dyn ContentProvider>,
    /// Content shown once when the updater is cancelled.
    pub stop_status: Arc<dyn ContentProvider>,
    /// Where the message id survives restarts. `None` disables persistence.
    pub save_file: Option<PathBuf>,
    /// How long to keep one message before deleting and resending it, to keep the
    /// status near the end of the chat. Zero keeps it until it can no longer be
    /// edited (48 hours).
    ///
    /// Not implemented yet: a non-zero value is reported and otherwise ignored.
    pub delete_resend_timeout: Duration,
}

impl StatusConfig {
    pub fn new(
        chat_id: ChatId,
        status: impl ContentProvider + 'static,
        stop_status: impl ContentProvider + 'static,
    ) -> Self {
        Self {
            chat_id,
            status: Arc::new(status),
            stop_status: Arc::new(stop_status),
            save_file: None,
            delete_resend_timeout: Duration::ZERO,
        }
    }

    pub fn with_save_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_file = Some(path.into());
        self
    }
}

impl fmt::Debug for StatusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusConfig")
            .field("chat_id", &self.chat_id)
            .field("save_file", &self.save_file)
            .field("delete_resend_timeout", &self.delete_resend_timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdaterState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Regular,
    Stop,
}

/// Keeps one status message per chat up to date.
///
/// The message id is only touched through `&mut self`, so a single updater task
/// owns it for the lifetime of the loop.
pub struct StatusManager {
    messenger: Arc<dyn MessagingPort>,
    cfg: StatusConfig,
    observer: Arc<dyn StatusObserver>,
    store: IdentityStore,
    message_id: Option<MessageId>,
    state: UpdaterState,
}

impl StatusManager {
    pub fn new(messenger: Arc<dyn MessagingPort>, cfg: StatusConfig) -> Self {
        Self::with_observer(messenger, cfg, Arc::new(TracingObserver))
    }

    /// Builds the manager and warm-starts the message id from `cfg.save_file`.
    pub fn with_observer(
        messenger: Arc<dyn MessagingPort>,
        cfg: StatusConfig,
        observer: Arc<dyn StatusObserver>,
    ) -> Self {
        let store = IdentityStore::new(cfg.save_file.clone());
        let message_id = store.load(observer.as_ref());
        if !cfg.delete_resend_timeout.is_zero() {
            observer.on_event(&StatusEvent::ResendTimeoutIgnored {
                timeout: cfg.delete_resend_timeout,
            });
        }

        Self {
            messenger,
            cfg,
            observer,
            store,
            message_id,
            state: UpdaterState::Idle,
        }
    }

    pub fn message_id(&self) -> Option<MessageId> {
        self.message_id
    }

    pub fn state(&self) -> UpdaterState {
        self.state
    }

    /// Runs until `cancel` fires, then shows the stop status and saves the message id.
    ///
    /// Cancellation is only observed between ticks; an update in flight completes
    /// first. Returns the result of saving the message id.
    pub async fn run_updater(&mut self, cancel: CancellationToken, period: Duration) -> Result<()> {
        self.state = UpdaterState::Running;
        self.observer
            .on_event(&StatusEvent::UpdaterStarted { period });
        self.update(Phase::Regular).await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sleep(period) => self.update(Phase::Regular).await,
            }
        }

        self.state = UpdaterState::Stopping;
        self.observer.on_event(&StatusEvent::Stopping);
        self.update(Phase::Stop).await;

        let saved = self.save();
        self.state = UpdaterState::Stopped;
        match &saved {
            Ok(()) => self.observer.on_event(&StatusEvent::Stopped),
            Err(error) => self.observer.on_event(&StatusEvent::SaveFailed { error }),
        }
        saved
    }

    /// One reconciliation with fresh content from `provider`. Failures are reported, not returned.
    pub async fn update_status(&mut self, provider: &dyn ContentProvider) {
        self.observer.on_event(&StatusEvent::Updating);
        let params = provider.status();
        match self.set_status(&params).await {
            Ok(message) => self.observer.on_event(&StatusEvent::Updated { message }),
            Err(error) => self.observer.on_event(&StatusEvent::UpdateFailed {
                params: &params,
                error: &error,
            }),
        }
    }

    /// Edits the current message, or sends a new one when there is none.
    ///
    /// A rejected edit deletes the old message and sends a fresh one, once.
    /// Transient transport errors keep the current message for the next tick.
    pub async fn set_status(&mut self, params: &StatusParams) -> Result<MessageRef> {
        if let Some(message_id) = self.message_id {
            let message = MessageRef {
                chat_id: self.cfg.chat_id,
                message_id,
            };
            self.observer.on_event(&StatusEvent::Editing { message });
            match self
                .messenger
                .edit_message_text(message, params.to_edit_request())
                .await
            {
                Ok(()) | Err(Error::NotModified) => return Ok(message),
                Err(e) if e.is_transient() => return Err(e),
                Err(error) => {
                    self.observer
                        .on_event(&StatusEvent::EditFailed { message, error: &error });
                    self.discard(message).await;
                }
            }
        }

        self.send_new(params).await
    }

    /// Persists the current message id (no-op without a save file or a message).
    pub fn save(&self) -> Result<()> {
        if let (Some(path), Some(message_id)) = (self.store.path(), self.message_id) {
            self.observer
                .on_event(&StatusEvent::Saving { path, message_id });
        }
        self.store.save(self.message_id)
    }

    async fn update(&mut self, phase: Phase) {
        let provider = match phase {
            Phase::Regular => self.cfg.status.clone(),
            Phase::Stop => self.cfg.stop_status.clone(),
        };
        self.update_status(provider.as_ref()).await;
    }

    async fn send_new(&mut self, params: &StatusParams) -> Result<MessageRef> {
        self.observer.on_event(&StatusEvent::SendingNew {
            chat_id: self.cfg.chat_id,
        });
        let message = self
            .messenger
            .send_message(self.cfg.chat_id, params.to_send_request())
            .await?;
        self.message_id = Some(message.message_id);
        Ok(message)
    }

    /// Best-effort delete. The id is dropped whatever the outcome.
    async fn discard(&mut self, message: MessageRef) {
        match self.messenger.delete_message(message).await {
            Ok(true) => {}
            Ok(false) => self.observer.on_event(&StatusEvent::NotDeleted { message }),
            Err(error) => self.observer.on_event(&StatusEvent::DeleteFailed {
                message,
                error: &error,
            }),
        }
        self.message_id = None;
    }
}
