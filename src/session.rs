use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{KvStore, KEY_DURATION, KEY_END, KEY_START};

/// Lifecycle phase of the session window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Stopped,
}

/// Rejected lifecycle command. The window is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("session already started")]
    AlreadyStarted,
    #[error("session already stopped")]
    AlreadyStopped,
    #[error("session has not been started")]
    NotStarted,
}

/// Elapsed time of the current session, both raw and display-ready.
/// Derived from the window; never mutated directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSnapshot {
    pub seconds: i64,
    pub string: String,
}

impl Default for DurationSnapshot {
    fn default() -> Self {
        Self::from_seconds(0)
    }
}

impl DurationSnapshot {
    pub fn from_seconds(seconds: i64) -> Self {
        let seconds = seconds.max(0);
        Self {
            seconds,
            string: format_hms(seconds),
        }
    }
}

/// Integer truncation, fields zero-padded to two digits, hours unbounded.
pub fn format_hms(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Owns the start/stop/reset lifecycle and the authoritative duration
/// snapshot. `end_time` is only ever set while a start time exists; both are
/// cleared together on reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTimer {
    start_time: Option<DateTime<Local>>,
    end_time: Option<DateTime<Local>>,
    duration: DurationSnapshot,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores the window from the gateway. Corrupt or partial entries fall
    /// back: an end time without a start time is dropped, and a missing
    /// duration for a stopped window is recomputed from the window itself.
    pub fn load(store: &dyn KvStore) -> Self {
        let start_time = store.get(KEY_START).and_then(|v| parse_timestamp(&v));
        let end_time = if start_time.is_some() {
            store.get(KEY_END).and_then(|v| parse_timestamp(&v))
        } else {
            None
        };

        let duration = store
            .get(KEY_DURATION)
            .and_then(|v| serde_json::from_str::<DurationSnapshot>(&v).ok())
            .unwrap_or_else(|| match (start_time, end_time) {
                (Some(start), Some(end)) => {
                    DurationSnapshot::from_seconds((end - start).num_seconds())
                }
                _ => DurationSnapshot::default(),
            });

        Self {
            start_time,
            end_time,
            duration,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.start_time, self.end_time) {
            (None, _) => Phase::Idle,
            (Some(_), None) => Phase::Running,
            (Some(_), Some(_)) => Phase::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.phase() == Phase::Stopped
    }

    pub fn start_time(&self) -> Option<DateTime<Local>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Local>> {
        self.end_time
    }

    pub fn duration(&self) -> &DurationSnapshot {
        &self.duration
    }

    /// Idle -> Running. Records and persists the start timestamp.
    pub fn start(
        &mut self,
        now: DateTime<Local>,
        store: &mut dyn KvStore,
    ) -> Result<(), TransitionError> {
        if self.start_time.is_some() {
            return Err(TransitionError::AlreadyStarted);
        }
        self.start_time = Some(now);
        store.set(KEY_START, &now.to_rfc3339());
        Ok(())
    }

    /// Running -> Stopped. Records the end timestamp and freezes the
    /// snapshot at `end - start`; later ticks leave it untouched.
    pub fn stop(
        &mut self,
        now: DateTime<Local>,
        store: &mut dyn KvStore,
    ) -> Result<(), TransitionError> {
        let start = match self.phase() {
            Phase::Idle => return Err(TransitionError::NotStarted),
            Phase::Stopped => return Err(TransitionError::AlreadyStopped),
            Phase::Running => self.start_time.unwrap(),
        };
        self.end_time = Some(now);
        self.duration = DurationSnapshot::from_seconds((now - start).num_seconds());
        store.set(KEY_END, &now.to_rfc3339());
        self.persist_duration(store);
        Ok(())
    }

    /// Clears the window and snapshot back to defaults. Valid from any
    /// phase; the caller clears the persisted keys as one operation.
    pub fn clear(&mut self) {
        self.start_time = None;
        self.end_time = None;
        self.duration = DurationSnapshot::default();
    }

    /// One-second tick: while running, recompute the snapshot against `now`
    /// and persist it. Ticks in any other phase are ignored, which keeps a
    /// stopped snapshot frozen no matter how long the tick source lives.
    pub fn on_tick(&mut self, now: DateTime<Local>, store: &mut dyn KvStore) {
        if let (Some(start), None) = (self.start_time, self.end_time) {
            self.duration = DurationSnapshot::from_seconds((now - start).num_seconds());
            self.persist_duration(store);
        }
    }

    fn persist_duration(&self, store: &mut dyn KvStore) {
        if let Ok(json) = serde_json::to_string(&self.duration) {
            store.set(KEY_DURATION, &json);
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Local>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;
    use assert_matches::assert_matches;
    use chrono::Duration;

    fn t0() -> DateTime<Local> {
        "2024-03-01T10:00:00+00:00"
            .parse::<DateTime<Local>>()
            .unwrap()
    }

    #[test]
    fn format_hms_pads_fields() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(65), "00:01:05");
        assert_eq!(format_hms(125), "00:02:05");
        assert_eq!(format_hms(3599), "00:59:59");
        assert_eq!(format_hms(3661), "01:01:01");
    }

    #[test]
    fn format_hms_hours_unbounded() {
        assert_eq!(format_hms(100 * 3600 + 62), "100:01:02");
    }

    #[test]
    fn format_hms_clamps_negative() {
        assert_eq!(format_hms(-5), "00:00:00");
    }

    #[test]
    fn new_timer_is_idle_with_default_snapshot() {
        let timer = SessionTimer::new();
        assert_eq!(timer.phase(), Phase::Idle);
        assert_eq!(timer.duration(), &DurationSnapshot::default());
        assert_eq!(timer.duration().string, "00:00:00");
    }

    #[test]
    fn start_moves_to_running_and_persists() {
        let mut store = MemoryKvStore::new();
        let mut timer = SessionTimer::new();

        timer.start(t0(), &mut store).unwrap();

        assert_eq!(timer.phase(), Phase::Running);
        assert_eq!(timer.start_time(), Some(t0()));
        assert_eq!(store.get(KEY_START), Some(t0().to_rfc3339()));
    }

    #[test]
    fn start_while_running_is_rejected() {
        let mut store = MemoryKvStore::new();
        let mut timer = SessionTimer::new();
        timer.start(t0(), &mut store).unwrap();

        let later = t0() + Duration::seconds(5);
        assert_matches!(
            timer.start(later, &mut store),
            Err(TransitionError::AlreadyStarted)
        );
        // Original start time untouched
        assert_eq!(timer.start_time(), Some(t0()));
    }

    #[test]
    fn stop_while_idle_is_rejected() {
        let mut store = MemoryKvStore::new();
        let mut timer = SessionTimer::new();

        assert_matches!(
            timer.stop(t0(), &mut store),
            Err(TransitionError::NotStarted)
        );
        assert_eq!(timer.phase(), Phase::Idle);
    }

    #[test]
    fn stop_freezes_snapshot() {
        let mut store = MemoryKvStore::new();
        let mut timer = SessionTimer::new();
        timer.start(t0(), &mut store).unwrap();

        timer.stop(t0() + Duration::seconds(125), &mut store).unwrap();

        assert_eq!(timer.phase(), Phase::Stopped);
        assert_eq!(timer.duration().seconds, 125);
        assert_eq!(timer.duration().string, "00:02:05");

        // Ticks after the stop must not advance the snapshot
        for i in 1..=10 {
            timer.on_tick(t0() + Duration::seconds(125 + i), &mut store);
        }
        assert_eq!(timer.duration().seconds, 125);
        assert_eq!(timer.duration().string, "00:02:05");
    }

    #[test]
    fn double_stop_is_rejected() {
        let mut store = MemoryKvStore::new();
        let mut timer = SessionTimer::new();
        timer.start(t0(), &mut store).unwrap();
        timer.stop(t0() + Duration::seconds(10), &mut store).unwrap();

        assert_matches!(
            timer.stop(t0() + Duration::seconds(20), &mut store),
            Err(TransitionError::AlreadyStopped)
        );
        assert_eq!(timer.duration().seconds, 10);
    }

    #[test]
    fn ticks_advance_running_snapshot_and_persist() {
        let mut store = MemoryKvStore::new();
        let mut timer = SessionTimer::new();
        timer.start(t0(), &mut store).unwrap();

        for i in 1..=65 {
            timer.on_tick(t0() + Duration::seconds(i), &mut store);
        }

        assert_eq!(timer.duration().seconds, 65);
        assert_eq!(timer.duration().string, "00:01:05");

        let persisted = store.get(KEY_DURATION).unwrap();
        let snapshot: DurationSnapshot = serde_json::from_str(&persisted).unwrap();
        assert_eq!(&snapshot, timer.duration());
    }

    #[test]
    fn ticks_while_idle_are_ignored() {
        let mut store = MemoryKvStore::new();
        let mut timer = SessionTimer::new();

        timer.on_tick(t0(), &mut store);

        assert_eq!(timer.duration(), &DurationSnapshot::default());
        assert_eq!(store.get(KEY_DURATION), None);
    }

    #[test]
    fn clear_returns_to_idle_defaults() {
        let mut store = MemoryKvStore::new();
        let mut timer = SessionTimer::new();
        timer.start(t0(), &mut store).unwrap();
        timer.on_tick(t0() + Duration::seconds(30), &mut store);
        timer.stop(t0() + Duration::seconds(31), &mut store).unwrap();

        timer.clear();

        assert_eq!(timer.phase(), Phase::Idle);
        assert_eq!(timer.start_time(), None);
        assert_eq!(timer.end_time(), None);
        assert_eq!(timer.duration(), &DurationSnapshot::default());
    }

    #[test]
    fn load_roundtrips_running_window() {
        let mut store = MemoryKvStore::new();
        let mut timer = SessionTimer::new();
        timer.start(t0(), &mut store).unwrap();
        timer.on_tick(t0() + Duration::seconds(7), &mut store);

        let restored = SessionTimer::load(&store);
        assert_eq!(restored.phase(), Phase::Running);
        assert_eq!(restored.start_time(), Some(t0()));
        assert_eq!(restored.duration().seconds, 7);
    }

    #[test]
    fn load_roundtrips_stopped_window() {
        let mut store = MemoryKvStore::new();
        let mut timer = SessionTimer::new();
        timer.start(t0(), &mut store).unwrap();
        timer.stop(t0() + Duration::seconds(90), &mut store).unwrap();

        let restored = SessionTimer::load(&store);
        assert_eq!(restored, timer);
        assert_eq!(restored.duration().string, "00:01:30");
    }

    #[test]
    fn load_drops_end_without_start() {
        let mut store = MemoryKvStore::new();
        store.set(KEY_END, &t0().to_rfc3339());

        let restored = SessionTimer::load(&store);
        assert_eq!(restored.phase(), Phase::Idle);
        assert_eq!(restored.end_time(), None);
    }

    #[test]
    fn load_recomputes_missing_duration_for_stopped_window() {
        let mut store = MemoryKvStore::new();
        store.set(KEY_START, &t0().to_rfc3339());
        store.set(KEY_END, &(t0() + Duration::seconds(42)).to_rfc3339());

        let restored = SessionTimer::load(&store);
        assert_eq!(restored.phase(), Phase::Stopped);
        assert_eq!(restored.duration().seconds, 42);
        assert_eq!(restored.duration().string, "00:00:42");
    }

    #[test]
    fn load_falls_back_on_corrupt_values() {
        let mut store = MemoryKvStore::new();
        store.set(KEY_START, "yesterday-ish");
        store.set(KEY_DURATION, "{broken");

        let restored = SessionTimer::load(&store);
        assert_eq!(restored.phase(), Phase::Idle);
        assert_eq!(restored.duration(), &DurationSnapshot::default());
    }

    #[test]
    fn snapshot_serializes_with_stable_field_names() {
        let snap = DurationSnapshot::from_seconds(65);
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(json, r#"{"seconds":65,"string":"00:01:05"}"#);
    }
}
