use chrono::{DateTime, Local};

use crate::counter::CounterStore;
use crate::cue::{CueConfig, CuePlayer, CueScheduler};
use crate::dispatch::{classify, is_disabled, Command, PressEvent};
use crate::session::{DurationSnapshot, Phase, SessionTimer, TransitionError};
use crate::store::KvStore;

/// The headless app core: one tally, one session window, one cue scheduler,
/// one persistence gateway. All mutation flows through `press`/`dispatch`
/// and `on_tick`; the UI only reads.
#[derive(Debug)]
pub struct Tally<S: KvStore> {
    store: S,
    counter: CounterStore,
    timer: SessionTimer,
    scheduler: CueScheduler,
    pub cue_config: CueConfig,
}

impl<S: KvStore> Tally<S> {
    /// Fresh engine ignoring whatever the store currently holds.
    pub fn new(store: S, cue_config: CueConfig) -> Self {
        Self {
            store,
            counter: CounterStore::new(),
            timer: SessionTimer::new(),
            scheduler: CueScheduler::new(),
            cue_config,
        }
    }

    /// Engine restored from the persisted snapshot; absent or corrupt
    /// entries load as defaults.
    pub fn load(store: S, cue_config: CueConfig) -> Self {
        let counter = CounterStore::load(&store);
        let timer = SessionTimer::load(&store);
        Self {
            store,
            counter,
            timer,
            scheduler: CueScheduler::new(),
            cue_config,
        }
    }

    pub fn count(&self) -> i64 {
        self.counter.count()
    }

    pub fn phase(&self) -> Phase {
        self.timer.phase()
    }

    pub fn duration(&self) -> &DurationSnapshot {
        self.timer.duration()
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Disablement advisory for the button bound to `command`.
    pub fn button_disabled(&self, command: Command) -> bool {
        is_disabled(command, self.phase(), self.count())
    }

    /// Classifies and dispatches one activation event. Unrecognized events
    /// are ignored; illegal lifecycle commands are rejected and reported.
    pub fn press(
        &mut self,
        event: &PressEvent,
        now: DateTime<Local>,
        player: &mut dyn CuePlayer,
    ) -> Result<(), TransitionError> {
        match classify(event) {
            Some(command) => self.dispatch(command, now, player),
            None => Ok(()),
        }
    }

    pub fn dispatch(
        &mut self,
        command: Command,
        now: DateTime<Local>,
        player: &mut dyn CuePlayer,
    ) -> Result<(), TransitionError> {
        match command {
            Command::Adjust(delta) => {
                self.counter.apply(delta, &mut self.store);
                Ok(())
            }
            Command::Start => self.timer.start(now, &mut self.store),
            Command::Stop => {
                self.timer.stop(now, &mut self.store)?;
                // Leaving Running cancels any cue sounding right now
                self.sync_cue(player);
                Ok(())
            }
            Command::Reset => {
                self.counter.reset_to_zero();
                self.timer.clear();
                self.store.clear();
                self.sync_cue(player);
                Ok(())
            }
        }
    }

    /// One-second tick: advance the running snapshot, persist it, and move
    /// cue playback across any window edge. Outside `Running` both steps are
    /// no-ops apart from closing a still-open cue window.
    pub fn on_tick(&mut self, now: DateTime<Local>, player: &mut dyn CuePlayer) {
        self.timer.on_tick(now, &mut self.store);
        self.sync_cue(player);
    }

    fn sync_cue(&mut self, player: &mut dyn CuePlayer) {
        self.scheduler.drive(
            self.timer.duration().seconds,
            &self.cue_config,
            self.timer.is_running(),
            self.timer.is_stopped(),
            player,
        );
    }
}
