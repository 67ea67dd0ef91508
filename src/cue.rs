use serde::{Deserialize, Serialize};

/// Default length of the cue window, matching a short fixed-length clip.
pub const DEFAULT_CUE_DURATION_SECS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Seconds,
    Minutes,
}

/// Cadence at which a cue should recur. An interval value of zero disables
/// cueing entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueConfig {
    pub interval_value: u64,
    pub interval_unit: IntervalUnit,
    pub cue_duration_secs: i64,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            interval_value: 0,
            interval_unit: IntervalUnit::Seconds,
            cue_duration_secs: DEFAULT_CUE_DURATION_SECS,
        }
    }
}

impl CueConfig {
    pub fn new(interval_value: u64, interval_unit: IntervalUnit) -> Self {
        Self {
            interval_value,
            interval_unit,
            ..Self::default()
        }
    }

    pub fn interval_secs(&self) -> i64 {
        let scale = match self.interval_unit {
            IntervalUnit::Seconds => 1,
            IntervalUnit::Minutes => 60,
        };
        self.interval_value as i64 * scale
    }
}

/// Whether a cue should be sounding right now. The window opens at every
/// cadence multiple and stays open for `cue_duration_secs`, so a whole clip
/// plays rather than a single instant firing. Guards the modulo: a zero
/// interval always answers no.
pub fn should_cue(
    elapsed_seconds: i64,
    config: &CueConfig,
    is_running: bool,
    is_stopped: bool,
) -> bool {
    let interval = config.interval_secs();
    if !is_running || is_stopped || interval <= 0 {
        return false;
    }
    // Never cue at session start
    if elapsed_seconds <= config.cue_duration_secs {
        return false;
    }
    elapsed_seconds % interval <= config.cue_duration_secs
}

/// Edge emitted when the cue window opens or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueSignal {
    StartPlayback,
    StopPlayback,
}

/// External audio collaborator. Only ever invoked at window edges.
pub trait CuePlayer {
    fn play(&mut self);
    fn pause(&mut self);
    fn seek_to_start(&mut self);
}

/// Player that swallows every signal, for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn seek_to_start(&mut self) {}
}

/// Compares the current window state against the previous tick's and emits
/// an edge signal on change, so playback is never re-triggered inside one
/// active window.
#[derive(Debug, Clone, Copy, Default)]
pub struct CueScheduler {
    was_active: bool,
}

impl CueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(
        &mut self,
        elapsed_seconds: i64,
        config: &CueConfig,
        is_running: bool,
        is_stopped: bool,
    ) -> Option<CueSignal> {
        let active = should_cue(elapsed_seconds, config, is_running, is_stopped);
        let signal = match (self.was_active, active) {
            (false, true) => Some(CueSignal::StartPlayback),
            (true, false) => Some(CueSignal::StopPlayback),
            _ => None,
        };
        self.was_active = active;
        signal
    }

    /// Applies an edge to the player: start plays, stop pauses and rewinds
    /// so the next window starts the clip from the top.
    pub fn drive(
        &mut self,
        elapsed_seconds: i64,
        config: &CueConfig,
        is_running: bool,
        is_stopped: bool,
        player: &mut dyn CuePlayer,
    ) {
        match self.evaluate(elapsed_seconds, config, is_running, is_stopped) {
            Some(CueSignal::StartPlayback) => player.play(),
            Some(CueSignal::StopPlayback) => {
                player.pause();
                player.seek_to_start();
            }
            None => {}
        }
    }
}
