pub mod charting;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{controller::ModeController, mode::Mode, track::Status};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Shown in place of a mistyped space so the mistake stays visible
const MISSED_SPACE: &str = "·";

pub const TYPING_HELP: &str = "(←) restart / (→) new text / (tab) mode / (esc)ape";
pub const RESULTS_HELP: &str = "(r)estart / (n)ew text / (tab) mode / (esc)ape";

fn mode_bar(active: Mode) -> Line<'static> {
    let mut spans = vec![Span::styled(
        "typetest  ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for mode in Mode::ALL {
        let style = if mode == active {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!(" {mode} "), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn bests_line(ctl: &ModeController) -> String {
    let bests = ctl
        .personal_bests()
        .iter()
        .map(|(mode, best)| match best {
            Some(wpm) => format!("{mode}: {wpm} wpm"),
            None => format!("{mode}: -"),
        })
        .join("   ");
    format!("personal bests   {bests}")
}

/// Spans for the passage: typed characters by outcome, the current one
/// underlined, the rest dimmed
fn passage_spans(ctl: &ModeController) -> Vec<Span<'static>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);

    let snapshot = ctl.snapshot();

    snapshot
        .entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| match entry.status {
            Status::Correct => Span::styled(entry.expected.to_string(), green_bold_style),
            Status::Incorrect => Span::styled(
                match entry.expected {
                    ' ' => MISSED_SPACE.to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
            Status::Pending if idx == snapshot.cursor => {
                Span::styled(entry.expected.to_string(), underlined_dim_bold_style)
            }
            Status::Pending => Span::styled(entry.expected.to_string(), dim_bold_style),
        })
        .collect()
}

impl Widget for &ModeController {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let magenta_style = Style::default().fg(Color::Magenta);

        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let prompt_occupied_lines = if self.text().width() <= max_chars_per_line as usize {
            1
        } else {
            ((self.text().width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // modes
                Constraint::Length(1), // padding
                Constraint::Length(1), // live stats
                Constraint::Min(prompt_occupied_lines),
                Constraint::Length(1), // personal bests
                Constraint::Length(1), // help
            ])
            .split(area);

        Paragraph::new(mode_bar(self.mode())).render(chunks[0], buf);

        let live = self.live_stats();
        Paragraph::new(Span::styled(
            format!(
                "{} wpm   {}% acc   {}s   {} errors",
                live.wpm,
                live.accuracy,
                self.remaining(),
                live.errors
            ),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        match self.result() {
            None => {
                Paragraph::new(Line::from(passage_spans(self)))
                    .alignment(if prompt_occupied_lines == 1 {
                        // when the prompt is small enough to fit on one line
                        // centering the text gives a nice zen feeling
                        Alignment::Center
                    } else {
                        Alignment::Left
                    })
                    .wrap(Wrap { trim: true })
                    .render(chunks[3], buf);
            }
            Some(result) => {
                let result_chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(1), Constraint::Length(1)])
                    .split(chunks[3]);

                let (overall_duration, highest_wpm) = charting::compute_chart_params(
                    self.wpm_samples(),
                    result.elapsed_seconds as f64,
                );
                let tuples: Vec<(f64, f64)> = self
                    .wpm_samples()
                    .iter()
                    .map(|&sample| sample.into())
                    .collect();
                let datasets = vec![Dataset::default()
                    .marker(ratatui::symbols::Marker::Braille)
                    .style(magenta_style)
                    .graph_type(GraphType::Line)
                    .data(&tuples)];

                Chart::new(datasets)
                    .block(Block::default().borders(Borders::ALL).title("results"))
                    .x_axis(
                        Axis::default()
                            .title("seconds")
                            .bounds([0.0, overall_duration])
                            .labels(vec![
                                Span::styled("0", bold_style),
                                Span::styled(charting::format_label(overall_duration), bold_style),
                            ]),
                    )
                    .y_axis(
                        Axis::default()
                            .title("wpm")
                            .bounds([0.0, highest_wpm])
                            .labels(vec![
                                Span::styled("0", bold_style),
                                Span::styled(charting::format_label(highest_wpm), bold_style),
                            ]),
                    )
                    .render(result_chunks[0], buf);

                let mut summary = format!(
                    "{} wpm   {}% acc   {} chars   {} errors   {}s",
                    result.wpm,
                    result.accuracy,
                    result.total_chars,
                    result.errors,
                    result.elapsed_seconds
                );
                if self.is_new_best() {
                    summary.push_str("   new personal best!");
                }
                Paragraph::new(Span::styled(summary, bold_style.fg(Color::Cyan)))
                    .alignment(Alignment::Center)
                    .render(result_chunks[1], buf);
            }
        }

        Paragraph::new(Span::styled(
            bests_line(self),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

        let help = if self.is_complete() {
            RESULTS_HELP
        } else {
            TYPING_HELP
        };
        Paragraph::new(Span::styled(help, italic_style)).render(chunks[5], buf);
    }
}
