use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Period of the session clock: elapsed time recomputes once per second.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Everything the event loop reacts to: keyboard input, terminal resizes,
/// and the once-per-second session tick.
#[derive(Clone, Debug)]
pub enum TallyEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Feed of terminal input. Implementations deliver key and resize events;
/// ticks are minted by the `DurationClock` gate, never by the feed itself.
pub trait InputSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<TallyEvent, RecvTimeoutError>;
}

/// Input feed reading crossterm events on a background thread.
pub struct CrosstermInputSource {
    rx: Receiver<TallyEvent>,
}

impl CrosstermInputSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            while let Ok(ev) = event::read() {
                let forwarded = match ev {
                    CtEvent::Key(key) => Some(TallyEvent::Key(key)),
                    CtEvent::Resize(_, _) => Some(TallyEvent::Resize),
                    _ => None,
                };
                if let Some(ev) = forwarded {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for CrosstermInputSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TallyEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-backed feed for driving the loop from tests.
pub struct ChannelInputSource {
    rx: Receiver<TallyEvent>,
}

impl ChannelInputSource {
    pub fn new(rx: Receiver<TallyEvent>) -> Self {
        Self { rx }
    }
}

impl InputSource for ChannelInputSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TallyEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// The periodic tick source behind elapsed-time recomputation.
///
/// Wakes once per period when input is quiet, but only mints a `Tick` while
/// the session is running: the gate closes the instant the state leaves
/// `Running`, so a frozen snapshot can never be reached by a late tick. A
/// quiet period outside `Running` still returns control to the caller
/// (empty-handed) so the loop can redraw.
pub struct DurationClock<I: InputSource> {
    input: I,
    period: Duration,
}

impl<I: InputSource> DurationClock<I> {
    pub fn new(input: I) -> Self {
        Self::with_period(input, TICK_INTERVAL)
    }

    pub fn with_period(input: I, period: Duration) -> Self {
        Self { input, period }
    }

    /// Blocks for up to one period. Input passes straight through in any
    /// phase; a quiet period yields `Tick` only while `running`.
    pub fn next_event(&self, running: bool) -> Option<TallyEvent> {
        match self.input.recv_timeout(self.period) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                if running {
                    Some(TallyEvent::Tick)
                } else {
                    None
                }
            }
        }
    }
}
