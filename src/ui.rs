pub mod review;
pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};
use std::time::Duration;
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppState, LoginField};
use crate::timer::format_clock;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Draws whichever screen matches the app state
pub fn ui(app: &mut App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Login => render_login(self, area, buf),
            AppState::Exam => render_exam(self, area, buf),
            AppState::Results => render_summary(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn render_login(app: &App, area: Rect, buf: &mut Buffer) {
    let form = centered(area, 50, 12);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" proctor ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(form);
    block.render(form, buf);

    let mut lines = vec![Line::from(Span::styled(
        "Enter your details to begin",
        Style::default().add_modifier(Modifier::ITALIC),
    ))];
    lines.push(Line::default());

    for field in LoginField::ALL {
        let focused = app.login.focus == field;
        let value = app.login.value(field);
        let label_style = if focused {
            bold().fg(Color::Cyan)
        } else {
            bold()
        };
        let mut spans = vec![
            Span::styled(format!("{:>6}: ", field.label()), label_style),
            Span::raw(value.to_string()),
        ];
        if focused {
            spans.push(Span::styled(
                "_",
                Style::default().add_modifier(Modifier::SLOW_BLINK),
            ));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::default());
    if let Some(error) = &app.login.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            bold().fg(Color::Red),
        )));
    } else {
        lines.push(Line::default());
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "(tab) next field  (enter) start  (esc) quit",
        Style::default().add_modifier(Modifier::DIM),
    )));

    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .render(inner, buf);
}

fn render_exam(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let Some(question) = session.current_question() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // participant + timer
            Constraint::Length(1), // padding
            Constraint::Length(1), // question strip
            Constraint::Length(1), // padding
            Constraint::Min(3),    // question + options
            Constraint::Length(1), // legend
        ])
        .split(area);

    let who = session
        .participant()
        .map(|p| [p.name(), p.id(), p.class()].iter().join(" · "))
        .unwrap_or_default();
    Paragraph::new(Span::styled(who, bold())).render(chunks[0], buf);

    let clock_style = if session.countdown().is_running_low() {
        bold().fg(Color::Red)
    } else {
        bold()
    };
    Paragraph::new(Span::styled(
        format!("⏱ {}", format_clock(session.time_remaining_secs())),
        clock_style,
    ))
    .alignment(Alignment::Right)
    .render(chunks[0], buf);

    let mut strip = Vec::with_capacity(session.question_count() * 2);
    for i in 0..session.question_count() {
        let style = if i == session.current_index() {
            bold().add_modifier(Modifier::REVERSED)
        } else if session.is_answered(i) {
            bold().fg(Color::Green)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        strip.push(Span::styled(format!(" {} ", i + 1), style));
        strip.push(Span::raw(" "));
    }
    Paragraph::new(Line::from(strip))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    let option_lines: Vec<String> = question
        .options()
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}) {}", i + 1, option))
        .collect();
    let widest = option_lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 2;
    let pad = " ".repeat((chunks[4].width.saturating_sub(widest) / 2) as usize);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{}. {}", question.index() + 1, question.text()),
            bold(),
        )),
        Line::default(),
    ];
    for (option, line) in question.options().iter().zip(option_lines) {
        let selected = session.current_answer() == Some(option.as_str());
        let (marker, style) = if selected {
            ("▸ ", bold().fg(Color::Green))
        } else {
            ("  ", Style::default())
        };
        lines.push(Line::from(Span::styled(format!("{pad}{marker}{line}"), style)));
    }
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .render(chunks[4], buf);

    let legend = if session.is_last() {
        "(←/→) move  (1-9) answer  (u) next unanswered  (s) submit"
    } else {
        "(←/→) move  (1-9) answer  (u) next unanswered"
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);

    if session.submit_prompt_open() {
        render_confirm(app, area, buf);
    }
}

fn render_confirm(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let dialog = centered(area, 44, 6);
    Clear.render(dialog, buf);

    let unanswered = session.question_count() - session.answered_count();
    let detail = if unanswered == 0 {
        "All questions answered.".to_string()
    } else {
        format!("{unanswered} question(s) still unanswered.")
    };

    Paragraph::new(vec![
        Line::from(Span::styled("Submit your answers now?", bold())),
        Line::from(detail),
        Line::from(Span::styled(
            "(y) submit  (n) keep working",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    )
    .render(dialog, buf);
}

/// Participant, score and, for stopped exams, the cause
fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(result) = app.session.result() else {
        return;
    };

    let mut lines = Vec::new();
    if let Some(p) = app.session.participant() {
        lines.push(Line::from(vec![
            Span::styled("Name: ", bold()),
            Span::raw(p.name().to_string()),
            Span::styled("   ID: ", bold()),
            Span::raw(p.id().to_string()),
            Span::styled("   Class: ", bold()),
            Span::raw(p.class().to_string()),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("Score: ", bold()),
        Span::styled(
            format!("{} / {}", result.score, result.total),
            bold().fg(Color::Cyan),
        ),
        Span::styled("   Time used: ", bold()),
        Span::raw(time_used(result.elapsed_secs)),
    ]));

    if result.is_automatic() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Exam stopped",
            bold().fg(Color::Red),
        )));
        lines.push(Line::from(Span::styled(
            result.reason.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn time_used(secs: u64) -> String {
    if secs == 0 {
        return "under a second".to_string();
    }
    HumanTime::from(Duration::from_secs(secs)).to_text_en(Accuracy::Precise, Tense::Present)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
