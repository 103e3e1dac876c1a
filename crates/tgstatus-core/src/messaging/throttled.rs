use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{EditRequest, SendRequest},
    },
    Result,
};

/// Telegram allows 20 requests per minute to a single channel or group.
pub const CHANNEL_REQUESTS_PER_WINDOW: u32 = 20;
pub const CHANNEL_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Shortest update period that stays clear of channel flood control.
///
/// One request every 3 seconds is the hard limit; one extra second avoids
/// occasional 429s.
pub const MINIMUM_UPDATE_PERIOD: Duration =
    Duration::from_secs(CHANNEL_RATE_WINDOW.as_secs() / CHANNEL_REQUESTS_PER_WINDOW as u64 + 1);

/// `window / budget` plus a one second margin.
pub fn minimum_update_period(budget: u32, window: Duration) -> Duration {
    window / budget.max(1) + Duration::from_secs(1)
}

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* Telegram API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per chat.
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
        }
    }
}

impl ThrottleConfig {
    /// Per-chat spacing for channels and groups (20 requests/minute).
    pub fn for_channels() -> Self {
        Self {
            per_chat_min_interval: CHANNEL_RATE_WINDOW / CHANNEL_REQUESTS_PER_WINDOW,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// MessagingPort decorator that rate-limits outbound calls.
///
/// A status update plus a delete-and-resend fallback can burst three calls into
/// one chat; spacing them keeps the chat under its flood limit.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<HashMap<i64, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for_chat(&self, chat_id: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_chat.lock().await;
        map.entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_chat_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle_chat(&self, chat_id: i64) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = {
            let lim = self.limiter_for_chat(chat_id).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(chat_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    async fn send_message(&self, chat_id: ChatId, req: SendRequest) -> Result<MessageRef> {
        self.throttle_chat(chat_id.0).await;
        self.inner.send_message(chat_id, req).await
    }

    async fn edit_message_text(&self, msg: MessageRef, req: EditRequest) -> Result<()> {
        self.throttle_chat(msg.chat_id.0).await;
        self.inner.edit_message_text(msg, req).await
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<bool> {
        self.throttle_chat(msg.chat_id.0).await;
        self.inner.delete_message(msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct StampingMessenger {
        stamps: StdMutex<Vec<Instant>>,
    }

    #[async_trait::async_trait]
    impl MessagingPort for StampingMessenger {
        async fn send_message(&self, chat_id: ChatId, _req: SendRequest) -> Result<MessageRef> {
            self.stamps.lock().unwrap().push(Instant::now());
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }

        async fn edit_message_text(&self, _msg: MessageRef, _req: EditRequest) -> Result<()> {
            self.stamps.lock().unwrap().push(Instant::now());
            Ok(())
        }

        async fn delete_message(&self, _msg: MessageRef) -> Result<bool> {
            self.stamps.lock().unwrap().push(Instant::now());
            Ok(true)
        }
    }

    #[test]
    fn minimum_update_period_matches_channel_limit() {
        assert_eq!(MINIMUM_UPDATE_PERIOD, Duration::from_secs(4));
        assert_eq!(
            minimum_update_period(CHANNEL_REQUESTS_PER_WINDOW, CHANNEL_RATE_WINDOW),
            MINIMUM_UPDATE_PERIOD
        );
        assert_eq!(
            ThrottleConfig::for_channels().per_chat_min_interval,
            Duration::from_secs(3)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_calls_to_the_same_chat() {
        let inner = Arc::new(StampingMessenger::default());
        let throttled = ThrottledMessenger::new(inner.clone(), ThrottleConfig::for_channels());
        let msg = MessageRef {
            chat_id: ChatId(-100),
            message_id: MessageId(5),
        };

        throttled
            .edit_message_text(msg, EditRequest::default())
            .await
            .unwrap();
        throttled.delete_message(msg).await.unwrap();
        throttled
            .send_message(msg.chat_id, SendRequest::default())
            .await
            .unwrap();

        let stamps = inner.stamps.lock().unwrap().clone();
        assert_eq!(stamps.len(), 3);
        assert!(stamps[1] - stamps[0] >= Duration::from_secs(3));
        assert!(stamps[2] - stamps[1] >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn different_chats_only_share_the_global_interval() {
        let inner = Arc::new(StampingMessenger::default());
        let throttled = ThrottledMessenger::new(inner.clone(), ThrottleConfig::for_channels());

        throttled
            .send_message(ChatId(1), SendRequest::default())
            .await
            .unwrap();
        throttled
            .send_message(ChatId(2), SendRequest::default())
            .await
            .unwrap();

        let stamps = inner.stamps.lock().unwrap().clone();
        assert!(stamps[1] - stamps[0] < Duration::from_secs(1));
    }
}
