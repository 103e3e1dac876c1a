use std::path::{Path, PathBuf};

use crate::{
    domain::MessageId,
    status::observer::{StatusEvent, StatusObserver},
    Result,
};

/// Persists the id of the current status message across restarts.
///
/// The file holds a single JSON integer. `0` means "no message".
#[derive(Clone, Debug, Default)]
pub struct IdentityStore {
    path: Option<PathBuf>,
}

impl IdentityStore {
    /// `None` or an empty path disables persistence.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.filter(|p| !p.as_os_str().is_empty()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Strict read. Missing files, I/O failures and bad JSON are errors.
    pub fn read(&self) -> Result<Option<MessageId>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let txt = std::fs::read_to_string(path)?;
        let id: MessageId = serde_json::from_str(txt.trim())?;
        Ok(non_zero(id))
    }

    /// Best-effort warm start: any failure is reported and treated as "no message".
    pub fn load(&self, observer: &dyn StatusObserver) -> Option<MessageId> {
        let path = self.path.as_deref()?;
        match self.read() {
            Ok(Some(message_id)) => {
                observer.on_event(&StatusEvent::Loaded { path, message_id });
                Some(message_id)
            }
            Ok(None) => None,
            Err(error) => {
                observer.on_event(&StatusEvent::LoadFailed {
                    path,
                    error: &error,
                });
                None
            }
        }
    }

    /// Writes `message_id`. Nothing to do when persistence is disabled or there is no message.
    pub fn save(&self, message_id: Option<MessageId>) -> Result<()> {
        let (Some(path), Some(id)) = (&self.path, message_id.and_then(non_zero)) else {
            return Ok(());
        };
        let txt = serde_json::to_string(&id)?;
        std::fs::write(path, txt)?;
        Ok(())
    }
}

fn non_zero(id: MessageId) -> Option<MessageId> {
    (id.0 != 0).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl StatusObserver for Recorder {
        fn on_event(&self, event: &StatusEvent<'_>) {
            self.events.lock().unwrap().push(format!("{event:?}"));
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tgstatus-store-{name}-{}.json", std::process::id()))
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = temp_path("roundtrip");
        let store = IdentityStore::new(Some(path.clone()));
        store.save(Some(MessageId(42))).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "42");
        let rec = Recorder::default();
        assert_eq!(store.load(&rec), Some(MessageId(42)));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_loads_as_none_and_reports() {
        let store = IdentityStore::new(Some(temp_path("missing")));
        let rec = Recorder::default();
        assert_eq!(store.load(&rec), None);
        let events = rec.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].starts_with("LoadFailed"));
    }

    #[test]
    fn corrupt_or_empty_file_loads_as_none() {
        let path = temp_path("corrupt");
        let store = IdentityStore::new(Some(path.clone()));
        let rec = Recorder::default();

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(store.load(&rec), None);
        std::fs::write(&path, "").unwrap();
        assert_eq!(store.load(&rec), None);
        assert!(store.read().is_err());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn stored_zero_means_no_message() {
        let path = temp_path("zero");
        std::fs::write(&path, "0").unwrap();
        let store = IdentityStore::new(Some(path.clone()));
        assert_eq!(store.read().unwrap(), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn save_is_a_noop_without_path_or_id() {
        let path = temp_path("noop");
        let _ = std::fs::remove_file(&path);

        IdentityStore::new(Some(path.clone())).save(None).unwrap();
        assert!(!path.exists());

        let disabled = IdentityStore::new(Some(PathBuf::new()));
        assert!(disabled.path().is_none());
        disabled.save(Some(MessageId(7))).unwrap();
        assert_eq!(disabled.read().unwrap(), None);
    }

    #[test]
    fn save_surfaces_write_errors() {
        let dir = temp_path("is-a-dir");
        std::fs::create_dir_all(&dir).unwrap();
        let store = IdentityStore::new(Some(dir.clone()));
        assert!(store.save(Some(MessageId(1))).is_err());
        let _ = std::fs::remove_dir(&dir);
    }
}
