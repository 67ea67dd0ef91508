use crate::session::Phase;

/// Lifecycle tags carried by activation events.
pub const FUNCTION_START: &str = "start";
pub const FUNCTION_STOP: &str = "stop";
pub const FUNCTION_RESET: &str = "reset";

/// What a classified activation event asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Adjust(i64),
    Start,
    Stop,
    Reset,
}

/// One UI activation: carries either a signed delta or a lifecycle tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PressEvent {
    pub value: Option<i64>,
    pub function: Option<String>,
}

impl PressEvent {
    pub fn delta(value: i64) -> Self {
        Self {
            value: Some(value),
            function: None,
        }
    }

    pub fn function(tag: &str) -> Self {
        Self {
            value: None,
            function: Some(tag.to_string()),
        }
    }
}

/// Classifies an activation event into a command. A delta takes precedence
/// over a tag; unrecognized events classify to nothing and are ignored.
pub fn classify(event: &PressEvent) -> Option<Command> {
    if let Some(value) = event.value {
        return Some(Command::Adjust(value));
    }
    match event.function.as_deref() {
        Some(FUNCTION_START) => Some(Command::Start),
        Some(FUNCTION_STOP) => Some(Command::Stop),
        Some(FUNCTION_RESET) => Some(Command::Reset),
        _ => None,
    }
}

/// Presentation advisory: whether a button for `command` should be disabled
/// in the given state. The UI honors this so illegal lifecycle commands
/// never reach the state machine (which would reject them anyway).
pub fn is_disabled(command: Command, phase: Phase, count: i64) -> bool {
    match command {
        Command::Adjust(_) => false,
        Command::Reset => phase == Phase::Idle && count == 0,
        Command::Start => phase != Phase::Idle,
        Command::Stop => phase != Phase::Running,
    }
}

/// A button as presented by the UI: label, bound key, and command.
#[derive(Debug, Clone, Copy)]
pub struct Button {
    pub label: &'static str,
    pub key: &'static str,
    pub command: Command,
}

/// The fixed button set: six signed deltas plus the session lifecycle.
pub fn default_buttons() -> Vec<Button> {
    vec![
        Button {
            label: "+10",
            key: "PgUp",
            command: Command::Adjust(10),
        },
        Button {
            label: "+5",
            key: "→",
            command: Command::Adjust(5),
        },
        Button {
            label: "+1",
            key: "↑",
            command: Command::Adjust(1),
        },
        Button {
            label: "-10",
            key: "PgDn",
            command: Command::Adjust(-10),
        },
        Button {
            label: "-5",
            key: "←",
            command: Command::Adjust(-5),
        },
        Button {
            label: "-1",
            key: "↓",
            command: Command::Adjust(-1),
        },
        Button {
            label: "start",
            key: "s",
            command: Command::Start,
        },
        Button {
            label: "stop",
            key: "x",
            command: Command::Stop,
        },
        Button {
            label: "reset",
            key: "r",
            command: Command::Reset,
        },
    ]
}
