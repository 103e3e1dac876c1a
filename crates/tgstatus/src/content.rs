//! Built-in status content: uptime and clock.

use std::time::{Duration, Instant};

use chrono::Local;

use tgstatus_core::{config::StatusMode, status::StatusParams};

/// Regular and stop content for `mode`, measured from `started`.
pub fn providers(
    mode: StatusMode,
    started: Instant,
) -> (
    impl Fn() -> StatusParams + Send + Sync + 'static,
    impl Fn() -> StatusParams + Send + Sync + 'static,
) {
    let status = move || match mode {
        StatusMode::Uptime => uptime_status(started.elapsed()),
        StatusMode::Clock => clock_status(&now()),
    };
    let stop = move || match mode {
        StatusMode::Uptime => uptime_stop_status(started.elapsed()),
        StatusMode::Clock => clock_stop_status(&now()),
    };
    (status, stop)
}

pub fn uptime_status(uptime: Duration) -> StatusParams {
    StatusParams::silent(format!("Server is up for {}", format_duration(uptime)))
}

pub fn uptime_stop_status(uptime: Duration) -> StatusParams {
    StatusParams::silent(format!("Server stopped after {}", format_duration(uptime)))
}

pub fn clock_status(now: &str) -> StatusParams {
    StatusParams::silent(format!("Current server time: {now}"))
}

pub fn clock_stop_status(now: &str) -> StatusParams {
    StatusParams::silent(format!("Server stopped at {now}"))
}

fn now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// `1d 2h 3m 4s`, dropping leading zero units. Sub-second precision is discarded.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total % 86_400 / 3_600,
        total % 3_600 / 60,
        total % 60,
    );

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations_without_leading_zero_units() {
        assert_eq!(format_duration(Duration::from_millis(900)), "0s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_duration(Duration::from_secs(3_723)), "1h 2m 3s");
        assert_eq!(format_duration(Duration::from_secs(86_400 + 5)), "1d 0h 0m 5s");
    }

    #[test]
    fn status_texts_are_silent() {
        let up = uptime_status(Duration::from_secs(65));
        assert_eq!(up.text, "Server is up for 1m 5s");
        assert!(up.disable_notification);

        let stop = clock_stop_status("2026-10-19 12:00:00 +00:00");
        assert_eq!(stop.text, "Server stopped at 2026-10-19 12:00:00 +00:00");
        assert!(stop.disable_notification);
    }

    #[test]
    fn uptime_providers_use_uptime_wording() {
        let (status, stop) = providers(StatusMode::Uptime, Instant::now());
        assert!(status().text.starts_with("Server is up for "));
        assert!(stop().text.starts_with("Server stopped after "));
    }
}
