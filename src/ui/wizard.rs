//! Multi-step application form screen

use super::components::{render_action_button, BUTTON_HEIGHT};
use super::forms::draw_step_form;
use crate::app::{format_saved_at, App};
use crate::platform::{
    DELETE_DRAFT_SHORTCUT, DISMISS_SHORTCUT, JUMP_SHORTCUT, NEXT_SHORTCUT, PREVIOUS_SHORTCUT,
    SAVE_DRAFT_SHORTCUT,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const ACTION_PANEL_WIDTH: u16 = 28;

pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Form + actions
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_progress(frame, rows[0], app);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(40),
            Constraint::Length(ACTION_PANEL_WIDTH),
        ])
        .split(rows[1]);

    draw_step_form(frame, columns[0], app);
    draw_action_panel(frame, columns[1], app);
    draw_status_bar(frame, rows[2], app);
}

/// Step titles with the current one highlighted
fn draw_progress(frame: &mut Frame, area: Rect, app: &App) {
    let current = app.session.current_step();
    let total = app.session.total_steps();

    let mut spans = Vec::new();
    for (index, step) in app.session.schema().steps().iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
        }
        let style = if index == current {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else if index < current {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let marker = if index < current { "✓" } else { "" };
        spans.push(Span::styled(
            format!("{}{} {}", index + 1, marker, step.title),
            style,
        ));
    }

    let block = Block::default()
        .title(format!(" Scholarship application · step {} of {} ", current + 1, total))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_action_panel(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Actions ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(BUTTON_HEIGHT), // Next / Submit
            Constraint::Length(BUTTON_HEIGHT), // Previous
            Constraint::Length(BUTTON_HEIGHT), // Save draft
            Constraint::Length(BUTTON_HEIGHT), // Delete draft
            Constraint::Min(0),                // Key help
        ])
        .split(inner);

    let session = &app.session;
    let submitting = session.is_submitting();
    let primary = match (session.is_last_step(), submitting) {
        (_, true) => "Submitting...",
        (true, false) => "Submit",
        (false, false) => "Next",
    };

    render_action_button(
        frame,
        chunks[0],
        primary,
        NEXT_SHORTCUT,
        !submitting,
        Color::Green,
    );
    render_action_button(
        frame,
        chunks[1],
        "Previous",
        PREVIOUS_SHORTCUT,
        session.current_step() > 0,
        Color::Blue,
    );
    render_action_button(
        frame,
        chunks[2],
        "Save draft",
        SAVE_DRAFT_SHORTCUT,
        true,
        Color::Yellow,
    );
    render_action_button(
        frame,
        chunks[3],
        "Delete draft",
        DELETE_DRAFT_SHORTCUT,
        session.last_saved().is_some(),
        Color::Red,
    );

    let key = Style::default().fg(Color::Cyan);
    let help = vec![
        Line::from(vec![Span::styled("Tab", key), Span::raw(" next field")]),
        Line::from(vec![Span::styled("←/→", key), Span::raw(" change choice")]),
        Line::from(vec![Span::styled("Space", key), Span::raw(" toggle")]),
        Line::from(vec![Span::styled("Enter", key), Span::raw(" attach file")]),
        Line::from(vec![
            Span::styled(JUMP_SHORTCUT, key),
            Span::raw(" go to step"),
        ]),
        Line::from(vec![Span::styled("Esc", key), Span::raw(" quit")]),
    ];
    frame.render_widget(
        Paragraph::new(help).wrap(Wrap { trim: true }),
        chunks[4],
    );
}

/// Draft indicator, draft warning and the latest status message
fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let saved = match app.session.last_saved() {
        Some(saved_at) => format!(" Last saved: {} ", format_saved_at(saved_at)),
        None => " Not saved yet ".to_string(),
    };
    let mut spans = vec![Span::styled(
        saved,
        Style::default().fg(Color::Black).bg(Color::DarkGray),
    )];

    if let Some(warning) = &app.state.draft_warning {
        spans.push(Span::styled(
            format!(" ⚠ {warning} ({DISMISS_SHORTCUT} to dismiss)"),
            Style::default().fg(Color::Yellow),
        ));
    } else if let Some(message) = &app.state.status_message {
        spans.push(Span::styled(
            format!(" {message}"),
            Style::default().fg(Color::Gray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
