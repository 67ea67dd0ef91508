use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::cue::IntervalUnit;
use crate::dispatch::Button;
use crate::engine::Tally;
use crate::session::Phase;
use crate::store::KvStore;
use crate::util::{reps_per_hour, reps_per_minute};

const HORIZONTAL_MARGIN: u16 = 5;

/// Read-only view over the engine plus the button bar.
pub struct CounterScreen<'a, S: KvStore> {
    pub tally: &'a Tally<S>,
    pub buttons: &'a [Button],
}

impl<S: KvStore> Widget for &CounterScreen<'_, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let tally = self.tally;

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints(
                [
                    Constraint::Min(3),    // count
                    Constraint::Length(1), // elapsed
                    Constraint::Length(2), // velocity
                    Constraint::Length(2), // buttons
                    Constraint::Length(2), // cadence + help
                ]
                .as_ref(),
            )
            .split(area);

        let count = tally.count();
        let count_style = if count < 1 {
            red_bold_style
        } else if count > 99 {
            Style::default().patch(bold_style).fg(Color::Green)
        } else {
            bold_style
        };
        let count_widget = Paragraph::new(Span::styled(count.to_string(), count_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        count_widget.render(centered_vertically(chunks[0]), buf);

        let duration = tally.duration();
        let elapsed = Paragraph::new(Line::from(vec![
            Span::raw("Elapsed time "),
            Span::styled(duration.string.clone(), red_bold_style),
        ]))
        .alignment(Alignment::Center);
        elapsed.render(chunks[1], buf);

        let per_minute = format_pace(reps_per_minute(count, duration.seconds));
        let per_hour = format_pace(reps_per_hour(count, duration.seconds));
        let velocity = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(per_minute, bold_style),
                Span::raw(" reps per minute"),
            ]),
            Line::from(vec![
                Span::styled(per_hour, bold_style),
                Span::raw(" reps per hour"),
            ]),
        ])
        .alignment(Alignment::Center);
        velocity.render(chunks[2], buf);

        let mut button_spans: Vec<Span> = Vec::new();
        for button in self.buttons {
            let disabled = tally.button_disabled(button.command);
            let style = if disabled { dim_style } else { bold_style };
            button_spans.push(Span::styled(
                format!("[{} {}]", button.label, button.key),
                style,
            ));
            button_spans.push(Span::raw(" "));
        }
        let bar = Paragraph::new(Line::from(button_spans))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        bar.render(chunks[3], buf);

        let cadence_line = match tally.cue_config.interval_value {
            0 => "cue: off".to_string(),
            value => {
                let unit = match tally.cue_config.interval_unit {
                    IntervalUnit::Seconds => {
                        if value == 1 {
                            "second"
                        } else {
                            "seconds"
                        }
                    }
                    IntervalUnit::Minutes => {
                        if value == 1 {
                            "minute"
                        } else {
                            "minutes"
                        }
                    }
                };
                format!("cue: every {} {}", value, unit)
            }
        };
        let phase_hint = match tally.phase() {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Stopped => "stopped",
        };
        let footer = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("{} | {}", cadence_line, phase_hint),
                dim_style,
            )),
            Line::from(Span::styled("(esc) or (q)uit", dim_style)),
        ])
        .alignment(Alignment::Center);
        footer.render(chunks[4], buf);
    }
}

fn format_pace(pace: Option<f64>) -> String {
    match pace {
        Some(value) => format!("{:.2}", value),
        None => "-".to_string(),
    }
}

/// Squeezes a tall chunk down to a single centered line for the count.
fn centered_vertically(area: Rect) -> Rect {
    if area.height <= 1 {
        return area;
    }
    let offset = area.height / 2;
    Rect {
        y: area.y + offset,
        height: 1,
        ..area
    }
}
