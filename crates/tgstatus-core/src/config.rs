use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::{domain::ChatId, errors::Error, Result};

const DEFAULT_SAVE_FILE: &str = "status_state.json";
const DEFAULT_UPDATE_PERIOD_SECS: u64 = 10;

/// Which built-in status content the service publishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusMode {
    /// "Server is up for 1h 2m 3s".
    Uptime,
    /// Current server time.
    Clock,
}

/// Typed configuration for the status service.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub chat_id: ChatId,

    // Status message
    pub save_file: Option<PathBuf>,
    pub update_period: Duration,
    pub delete_resend_timeout: Duration,
    pub mode: StatusMode,

    // Rate limiting
    pub throttle_enabled: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source (the process env in `load`).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let chat_raw = get("CHANNEL_CHAT_ID").unwrap_or_default();
        let chat_id = chat_raw.trim().parse::<i64>().map(ChatId).map_err(|e| {
            Error::Config(format!("failed to parse CHANNEL_CHAT_ID {chat_raw:?}: {e}"))
        })?;

        // An explicitly empty STATUS_SAVE_FILE disables persistence.
        let save_file = match get("STATUS_SAVE_FILE") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v.trim())),
            None => Some(PathBuf::from(DEFAULT_SAVE_FILE)),
        };

        let update_period = Duration::from_secs(
            parse_u64(&get, "STATUS_UPDATE_PERIOD_SECS")?.unwrap_or(DEFAULT_UPDATE_PERIOD_SECS),
        );
        if update_period.is_zero() {
            return Err(Error::Config(
                "STATUS_UPDATE_PERIOD_SECS must be greater than zero".to_string(),
            ));
        }
        let delete_resend_timeout =
            Duration::from_secs(parse_u64(&get, "STATUS_DELETE_RESEND_TIMEOUT_SECS")?.unwrap_or(0));

        let mode = match get("STATUS_MODE")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("uptime") => StatusMode::Uptime,
            Some("clock") => StatusMode::Clock,
            Some(other) => {
                return Err(Error::Config(format!(
                    "unknown STATUS_MODE {other:?} (expected \"uptime\" or \"clock\")"
                )))
            }
        };

        let throttle_enabled = get("STATUS_THROTTLE_ENABLED")
            .map(|s| parse_bool(&s))
            .unwrap_or(true);

        Ok(Self {
            telegram_bot_token,
            chat_id,
            save_file,
            update_period,
            delete_resend_timeout,
            mode,
            throttle_enabled,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        return &s[1..s.len() - 1];
    }
    s
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u64>()
        .map(Some)
        .map_err(|e| Error::Config(format!("failed to parse {key} {raw:?}: {e}")))
}
