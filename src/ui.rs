pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use reflex::{
    game::GameResults,
    leaderboard::LeaderboardEntry,
    score::FeedbackKind,
    spawner::{TargetPhase, TARGET_HEIGHT, TARGET_WIDTH},
};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const MIN_INPUT_WIDTH: u16 = 24;

/// Absolute rect of the clickable play area (inside its border) for a terminal of `area`
pub fn play_area(area: Rect) -> Rect {
    let chunks = game_layout(area);
    Block::default().borders(Borders::ALL).inner(chunks[1])
}

fn game_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(1), // score / name / time
            Constraint::Min(0),    // play area
            Constraint::Length(1), // hints
        ])
        .split(area)
}

/// "1. Ann - 12", as printed on the results screen and by --show-leaderboard
pub fn rank_line(rank: usize, entry: &LeaderboardEntry) -> String {
    format!("{}. {} - {}", rank, entry.name, entry.score)
}

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

/// Write `text` at (x, y) relative to `inner`, clipped to it
fn put(buf: &mut Buffer, inner: Rect, x: u16, y: u16, text: &str, style: Style) {
    if x >= inner.width || y >= inner.height {
        return;
    }
    buf.set_stringn(
        inner.x + x,
        inner.y + y,
        text,
        (inner.width - x) as usize,
        style,
    );
}

pub fn render_login(app: &App, f: &mut Frame) {
    let area = f.area();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let input_width = (app.username_input.width() as u16 + 4)
        .max(MIN_INPUT_WIDTH)
        .min(area.width);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Length(2), // title
            Constraint::Length(2), // blurb
            Constraint::Length(3), // input
            Constraint::Length(2), // alert
            Constraint::Length(1), // hints
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled("R E F L E X", bold_style.fg(Color::Cyan)))
        .alignment(Alignment::Center)
        .render(rows[1], f.buffer_mut());

    Paragraph::new(Span::styled(
        "Click the target before it vanishes. You have 60 seconds.",
        dim_style,
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(rows[2], f.buffer_mut());

    let input_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(input_width),
            Constraint::Fill(1),
        ])
        .split(rows[3]);

    let input = Paragraph::new(Line::from(vec![
        Span::styled(app.username_input.clone(), bold_style),
        Span::styled("▏", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Your name"));
    f.render_widget(input, input_row[1]);

    if let Some(alert) = &app.alert {
        Paragraph::new(Span::styled(
            alert.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .render(rows[4], f.buffer_mut());
    }

    Paragraph::new(Span::styled(
        "(enter) start   (esc) quit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(rows[5], f.buffer_mut());
}

pub fn render_game(app: &App, f: &mut Frame) {
    let game = &app.game;
    let chunks = game_layout(f.area());
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let score_style = match game.tracker().flash {
        Some(FeedbackKind::Gain) => bold_style.fg(Color::Green),
        Some(FeedbackKind::Penalty) => bold_style.fg(Color::Red),
        None => bold_style,
    };

    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(chunks[0]);

    Paragraph::new(Span::styled(format!("Score: {}", game.score()), score_style))
        .render(header[0], f.buffer_mut());

    if let Some(session) = game.session() {
        Paragraph::new(Span::styled(
            session.username.clone(),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(header[1], f.buffer_mut());
    }

    let time_left = game.time_left_secs().unwrap_or_default();
    let time_style = if time_left <= 10 {
        bold_style.fg(Color::Yellow)
    } else {
        bold_style
    };
    Paragraph::new(Span::styled(format!("Time: {}s", time_left), time_style))
        .alignment(Alignment::Right)
        .render(header[2], f.buffer_mut());

    let block = Block::default().borders(Borders::ALL).title("click the target");
    let inner = block.inner(chunks[1]);
    f.render_widget(block, chunks[1]);

    let buf = f.buffer_mut();
    let target = game.target();
    let p = target.position;
    match target.phase {
        TargetPhase::Hidden => {}
        TargetPhase::PopIn => {
            let style = Style::default().fg(Color::Yellow);
            put(buf, inner, p.x + TARGET_WIDTH / 2 - 1, p.y, "▗▖", style);
        }
        TargetPhase::Shown => {
            let style = Style::default().fg(Color::Yellow);
            let row = "█".repeat(TARGET_WIDTH as usize);
            for dy in 0..TARGET_HEIGHT {
                put(buf, inner, p.x, p.y + dy, &row, style);
            }
        }
        TargetPhase::Hit => {
            let style = bold_style.fg(Color::Green);
            let row = "✦".repeat(TARGET_WIDTH as usize);
            put(buf, inner, p.x, p.y, &row, style);
        }
    }

    for marker in &game.tracker().feedback {
        let style = match marker.kind {
            FeedbackKind::Gain => bold_style.fg(Color::Green),
            FeedbackKind::Penalty => bold_style.fg(Color::Red),
        };
        put(
            buf,
            inner,
            marker.position.x,
            marker.position.y,
            marker.text(),
            style,
        );
    }

    Paragraph::new(Span::styled(
        "(esc) restart   (ctrl+c) quit",
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], f.buffer_mut());
}

fn summary_line(results: &GameResults) -> String {
    let mut parts = vec![
        format!("hits {}", results.hits),
        format!("misses {}", results.misses),
    ];
    if let Some(acc) = results.accuracy {
        parts.push(format!("accuracy {}%", acc));
    }
    if let Some(r) = results.reaction {
        parts.push(format!("reaction {:.0}ms ± {:.0}", r.mean_ms, r.std_dev_ms));
    }
    parts.join("  ·  ")
}

pub fn render_leaderboard(app: &App, f: &mut Frame) {
    let area = f.area();
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let Some(results) = app.game.results() else {
        return;
    };

    let list_height = results.standings.len().max(1) as u16
        + u16::from(results.write_error.is_some())
        + 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Length(2),           // title
            Constraint::Length(1),           // score
            Constraint::Length(2),           // stats
            Constraint::Length(list_height), // leaderboard
            Constraint::Length(1),           // padding
            Constraint::Length(1),           // hints
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        format!("Time's up, {}!", results.username),
        bold_style.fg(Color::Cyan),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], f.buffer_mut());

    let mut score_spans = vec![Span::styled(
        format!("Score: {}", results.score),
        bold_style,
    )];
    if results.personal_best {
        score_spans.push(Span::styled(
            "  new personal best!",
            bold_style.fg(Color::Green),
        ));
    }
    Paragraph::new(Line::from(score_spans))
        .alignment(Alignment::Center)
        .render(chunks[2], f.buffer_mut());

    Paragraph::new(Span::styled(summary_line(results), dim_style))
        .alignment(Alignment::Center)
        .render(chunks[3], f.buffer_mut());

    let mut lines: Vec<Line> = if results.read_error.is_some() {
        vec![Line::from(Span::styled("leaderboard unavailable", dim_style))]
    } else if results.standings.is_empty() {
        vec![Line::from(Span::styled("No scores yet.", dim_style))]
    } else {
        results
            .standings
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if entry.name == results.username {
                    bold_style.fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(rank_line(i + 1, entry), style))
            })
            .collect()
    };
    if results.write_error.is_some() {
        lines.push(Line::from(Span::styled("score not saved", dim_style)));
    }

    let list_width = lines
        .iter()
        .map(|l| l.width() as u16)
        .max()
        .unwrap_or_default()
        .saturating_add(4)
        .max(MIN_INPUT_WIDTH)
        .min(chunks[4].width);
    let centered = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(list_width),
            Constraint::Fill(1),
        ])
        .split(chunks[4]);

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Leaderboard")),
        centered[1],
    );

    Paragraph::new(Span::styled(
        "(r)estart   (q)uit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[6], f.buffer_mut());
}
