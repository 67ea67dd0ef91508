use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
};

use tally::config::{Config, ConfigStore, FileConfigStore};
use tally::cue::{CuePlayer, IntervalUnit, SilentPlayer};
use tally::dispatch::{default_buttons, Button, Command};
use tally::engine::Tally;
use tally::runtime::{CrosstermInputSource, DurationClock, TallyEvent};
use tally::session::Phase;
use tally::store::{FileKvStore, KvStore};
use tally::ui::CounterScreen;

/// terminal rep counter with session timing and audio cues
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal rep counter: bump the tally with signed deltas, time the session, watch your pace, and get a periodic audio cue. State survives restarts."
)]
pub struct Cli {
    /// play an audio cue every N units while the session runs (0 disables)
    #[clap(short = 'c', long)]
    cue_every: Option<u64>,

    /// unit for the cue cadence
    #[clap(short = 'u', long, value_enum)]
    cue_unit: Option<CueUnit>,

    /// silence the audio cue without changing the saved cadence
    #[clap(long)]
    mute: bool,

    /// file holding the persisted counter/session state
    #[clap(long)]
    state_file: Option<PathBuf>,

    /// discard persisted state and start from scratch
    #[clap(long)]
    fresh: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum CueUnit {
    Seconds,
    Minutes,
}

impl CueUnit {
    fn as_interval_unit(&self) -> IntervalUnit {
        match self {
            CueUnit::Seconds => IntervalUnit::Seconds,
            CueUnit::Minutes => IntervalUnit::Minutes,
        }
    }
}

impl Cli {
    /// Folds CLI overrides into the saved config.
    fn apply_to(&self, config: &mut Config) {
        if let Some(value) = self.cue_every {
            config.cue_every = value;
        }
        if let Some(unit) = self.cue_unit {
            config.cue_unit = unit.as_interval_unit();
        }
        if self.mute {
            config.sound_enabled = false;
        }
    }
}

pub struct App {
    pub tally: Tally<FileKvStore>,
    pub buttons: Vec<Button>,
}

impl App {
    pub fn new(cli: &Cli, config: &Config) -> Self {
        let mut store = match &cli.state_file {
            Some(path) => FileKvStore::with_path(path),
            None => FileKvStore::new(),
        };
        if cli.fresh {
            store.clear();
        }

        Self {
            tally: Tally::load(store, config.cue_config()),
            buttons: default_buttons(),
        }
    }
}

/// Rings the terminal bell at the cue window's opening edge. The bell is a
/// one-shot, so the closing edge has nothing to pause or rewind.
#[derive(Debug, Default)]
struct TerminalBell;

impl CuePlayer for TerminalBell {
    fn play(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }

    fn pause(&mut self) {}

    fn seek_to_start(&mut self) {}
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply_to(&mut config);
    let _ = config_store.save(&config);

    let mut app = App::new(&cli, &config);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, config.sound_enabled);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    sound_enabled: bool,
) -> Result<(), Box<dyn Error>> {
    let clock = DurationClock::new(CrosstermInputSource::new());
    let mut player: Box<dyn CuePlayer> = if sound_enabled {
        Box::new(TerminalBell)
    } else {
        Box::new(SilentPlayer)
    };

    loop {
        terminal.draw(|f| {
            let screen = CounterScreen {
                tally: &app.tally,
                buttons: &app.buttons,
            };
            f.render_widget(&screen, f.area());
        })?;

        let running = app.tally.phase() == Phase::Running;
        match clock.next_event(running) {
            // The clock only mints ticks while the session runs
            Some(TallyEvent::Tick) => {
                app.tally.on_tick(Local::now(), player.as_mut());
            }
            Some(TallyEvent::Resize) | None => {}
            Some(TallyEvent::Key(key)) => {
                if is_quit(&key) {
                    break;
                }
                if let Some(command) = command_for_key(&key) {
                    // The disabled advisory gates the command, so the state
                    // machine's rejection path stays unreachable from the UI
                    if !app.tally.button_disabled(command) {
                        let _ = app.tally.dispatch(command, Local::now(), player.as_mut());
                    }
                }
            }
        }
    }

    Ok(())
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Keyboard bindings for the fixed button set.
fn command_for_key(key: &KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::Adjust(1)),
        KeyCode::Down | KeyCode::Char('-') => Some(Command::Adjust(-1)),
        KeyCode::Right => Some(Command::Adjust(5)),
        KeyCode::Left => Some(Command::Adjust(-5)),
        KeyCode::PageUp => Some(Command::Adjust(10)),
        KeyCode::PageDown => Some(Command::Adjust(-10)),
        KeyCode::Char('s') => Some(Command::Start),
        KeyCode::Char('x') => Some(Command::Stop),
        KeyCode::Char('r') => Some(Command::Reset),
        _ => None,
    }
}
