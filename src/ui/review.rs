use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::App;
use crate::scoring::ReviewItem;

/// Pure presenter for a single review row
pub fn present_row(item: &ReviewItem) -> Row<'static> {
    let (mark, style) = if item.is_correct {
        ("✓", Style::default().fg(Color::Green))
    } else {
        ("✗", Style::default().fg(Color::Red))
    };

    Row::new(vec![
        Cell::from(format!("{} {}", item.index + 1, mark)).style(style),
        Cell::from(item.text.clone()),
        Cell::from(item.answer_label().to_string()).style(style),
        Cell::from(item.correct.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
    ])
}

/// Render the Results screen: summary on top, answer review below
pub fn render_results(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(6), // Summary
            Constraint::Min(0),    // Review table
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    f.render_widget(&*app, chunks[0]);

    let breakdown = app
        .session
        .result()
        .and_then(|r| r.breakdown.clone())
        .unwrap_or_default();

    if breakdown.is_empty() {
        let notice = Paragraph::new("Answer review is not available for a stopped exam.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(notice, chunks[1]);
    } else {
        // Calculate scrolling bounds
        let table_height = chunks[1].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = breakdown.len().saturating_sub(table_height);

        // Clamp scroll offset
        if app.review_scroll > max_scroll {
            app.review_scroll = max_scroll;
        }

        let header = Row::new(vec![
            Cell::from("#"),
            Cell::from("Question"),
            Cell::from("Your answer"),
            Cell::from("Correct answer"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let visible_rows: Vec<Row> = breakdown
            .iter()
            .skip(app.review_scroll)
            .take(table_height)
            .map(present_row)
            .collect();

        let widths = [
            Constraint::Length(6),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ];

        let table = Table::new(visible_rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Review"))
            .column_spacing(1);

        f.render_widget(table, chunks[1]);
    }

    let instructions = Paragraph::new("(↑/↓) scroll  (PgUp/PgDn) page  (Home) top  (q/esc) quit")
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(instructions, chunks[2]);
}
