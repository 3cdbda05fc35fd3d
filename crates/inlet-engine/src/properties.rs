//! Process-wide properties and the scoped overlay applied while executing.
//!
//! The store is global: every isolated run in the process sees the same
//! values. An overlay holds the overlay lock for its whole lifetime, so only
//! one run at a time may change the store through it.

use std::collections::BTreeMap;

use parking_lot::{Mutex, MutexGuard, RwLock};

static STORE: RwLock<BTreeMap<String, String>> = parking_lot::const_rwlock(BTreeMap::new());
static OVERLAY_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Read and write access to the global property store.
pub struct SystemProperties;

impl SystemProperties {
    pub fn get(key: &str) -> Option<String> {
        STORE.read().get(key).cloned()
    }

    pub fn set(key: &str, value: &str) {
        STORE.write().insert(key.to_owned(), value.to_owned());
    }

    pub fn remove(key: &str) -> Option<String> {
        STORE.write().remove(key)
    }

    /// A copy of every property currently set.
    pub fn snapshot() -> BTreeMap<String, String> {
        STORE.read().clone()
    }

    fn restore(snapshot: BTreeMap<String, String>) {
        *STORE.write() = snapshot;
    }
}

/// Entries written to the global store until dropped.
///
/// Dropping restores the store to exactly what it held before `apply`,
/// including values changed by the executed program in the meantime.
pub struct PropertyOverlay {
    snapshot: Option<BTreeMap<String, String>>,
    _guard: MutexGuard<'static, ()>,
}

impl PropertyOverlay {
    /// Take the overlay lock and write `entries`. A missing value is written
    /// as the empty string.
    ///
    /// Blocks while another overlay is alive.
    pub fn apply(entries: &[(String, Option<String>)]) -> Self {
        let guard = OVERLAY_LOCK.lock();
        let snapshot = SystemProperties::snapshot();
        {
            let mut store = STORE.write();
            for (key, value) in entries {
                store.insert(key.clone(), value.clone().unwrap_or_default());
            }
        }
        Self {
            snapshot: Some(snapshot),
            _guard: guard,
        }
    }
}

impl Drop for PropertyOverlay {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            SystemProperties::restore(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn entry(key: &str, value: Option<&str>) -> (String, Option<String>) {
        (key.to_owned(), value.map(str::to_owned))
    }

    #[test]
    fn overlay_visible_then_restored() {
        {
            let _overlay = PropertyOverlay::apply(&[
                entry("props.test.restore.a", Some("during")),
                entry("props.test.restore.b", Some("x")),
            ]);
            assert_eq!(
                SystemProperties::get("props.test.restore.a").as_deref(),
                Some("during")
            );
            assert_eq!(SystemProperties::get("props.test.restore.b").as_deref(), Some("x"));
        }
        assert!(SystemProperties::get("props.test.restore.a").is_none());
        assert!(SystemProperties::get("props.test.restore.b").is_none());
    }

    #[test]
    fn missing_value_is_empty_string() {
        let _overlay = PropertyOverlay::apply(&[entry("props.test.empty", None)]);
        assert_eq!(SystemProperties::get("props.test.empty").as_deref(), Some(""));
    }

    #[test]
    fn changes_made_during_overlay_are_undone() {
        {
            let _overlay = PropertyOverlay::apply(&[]);
            SystemProperties::set("props.test.program.wrote", "1");
        }
        assert!(SystemProperties::get("props.test.program.wrote").is_none());
    }

    #[test]
    fn remove_returns_previous_value() {
        let _overlay = PropertyOverlay::apply(&[entry("props.test.removed", Some("kept"))]);
        assert_eq!(
            SystemProperties::remove("props.test.removed").as_deref(),
            Some("kept")
        );
        assert!(SystemProperties::remove("props.test.removed").is_none());
        assert!(SystemProperties::get("props.test.removed").is_none());
    }

    #[test]
    fn overlays_are_serialized() {
        let first = PropertyOverlay::apply(&[entry("props.test.serial", Some("first"))]);
        let observed = Arc::new(parking_lot::Mutex::new(None));

        let seen = Arc::clone(&observed);
        let second = thread::spawn(move || {
            let _overlay = PropertyOverlay::apply(&[entry("props.test.serial", Some("second"))]);
            *seen.lock() = SystemProperties::get("props.test.serial");
        });

        thread::sleep(Duration::from_millis(50));
        assert!(observed.lock().is_none());
        assert_eq!(SystemProperties::get("props.test.serial").as_deref(), Some("first"));
        drop(first);

        assert!(second.join().is_ok());
        assert_eq!(observed.lock().as_deref(), Some("second"));
        assert!(SystemProperties::get("props.test.serial").is_none());
    }
}
