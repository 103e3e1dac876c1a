use std::{sync::Arc, time::Instant};

use tokio_util::sync::CancellationToken;

use tgstatus_core::{
    config::Config,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger, MINIMUM_UPDATE_PERIOD},
    },
    status::{StatusConfig, StatusManager},
};
use tgstatus_telegram::TelegramMessenger;

mod content;

#[tokio::main]
async fn main() -> Result<(), tgstatus_core::Error> {
    tgstatus_core::logging::init("tgstatus")?;

    let cfg = Config::load()?;
    if cfg.update_period < MINIMUM_UPDATE_PERIOD {
        tracing::warn!(
            period = ?cfg.update_period,
            minimum = ?MINIMUM_UPDATE_PERIOD,
            "Update period is below the channel rate limit; expect throttling errors"
        );
    }

    let telegram: Arc<dyn MessagingPort> =
        Arc::new(TelegramMessenger::from_token(cfg.telegram_bot_token.clone()));
    let messenger: Arc<dyn MessagingPort> = if cfg.throttle_enabled {
        Arc::new(ThrottledMessenger::new(telegram, ThrottleConfig::for_channels()))
    } else {
        telegram
    };

    let (status, stop_status) = content::providers(cfg.mode, Instant::now());
    let mut status_cfg = StatusConfig::new(cfg.chat_id, status, stop_status);
    status_cfg.save_file = cfg.save_file.clone();
    status_cfg.delete_resend_timeout = cfg.delete_resend_timeout;

    let mut manager = StatusManager::new(messenger, status_cfg);
    let cancel = CancellationToken::new();
    let period = cfg.update_period;
    let updater = tokio::spawn({
        let cancel = cancel.clone();
        async move { manager.run_updater(cancel, period).await }
    });

    tracing::info!(
        chat_id = cfg.chat_id.0,
        mode = ?cfg.mode,
        "Status updater running; press Ctrl-C to stop"
    );
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C; stopping");
    }

    // Wait for the stop status and the saved message id before exiting.
    cancel.cancel();
    updater
        .await
        .map_err(|e| tgstatus_core::Error::External(format!("updater task failed: {e}")))??;

    tracing::info!("Application stopped");
    Ok(())
}
