//! Persisted timer state — the intent is stored as JSON under the
//! configured state directory.

use std::path::{Path, PathBuf};

use sw_domain::TimerIntent;

pub struct IntentStore {
    path: PathBuf,
}

impl IntentStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("timer.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted intent. Missing, corrupt or malformed state
    /// resets to the safe default (indefinite) rather than handing an
    /// invalid intent to the resolver.
    pub fn load(&self) -> TimerIntent {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return TimerIntent::default(),
        };
        let intent: TimerIntent = match serde_json::from_str(&raw) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "corrupt timer state, resetting to indefinite"
                );
                return TimerIntent::default();
            }
        };
        match intent.validate() {
            Ok(()) => intent,
            Err(e) => {
                tracing::warn!(error = %e, "persisted timer intent invalid, resetting to indefinite");
                TimerIntent::default()
            }
        }
    }

    /// Persist the intent. Write failures are logged, not fatal.
    pub fn save(&self, intent: &TimerIntent) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(intent) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    tracing::warn!(error = %e, "failed to persist timer state");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode timer state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sw_domain::TimerMode;

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntentStore::new(dir.path());
        assert_eq!(store.load(), TimerIntent::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntentStore::new(dir.path());

        let mut intent = TimerIntent::for_minutes(90);
        intent.cached_deadline = Some(Utc.with_ymd_and_hms(2024, 6, 15, 11, 30, 0).unwrap());
        store.save(&intent);

        assert_eq!(store.load(), intent);
    }

    #[test]
    fn corrupt_json_resets_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntentStore::new(dir.path());
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load(), TimerIntent::default());
    }

    #[test]
    fn invalid_persisted_intent_resets_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = IntentStore::new(dir.path());
        // Out-of-range duration written by a broken or older build.
        let json = serde_json::json!({
            "mode": "duration",
            "duration_minutes": 100_000,
            "until": { "hour": 0, "minute": 0 },
        });
        std::fs::write(store.path(), json.to_string()).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.mode, TimerMode::Indefinite);
        assert_eq!(loaded, TimerIntent::default());
    }
}
