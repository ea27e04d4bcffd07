//! Field rendering utilities for forms

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// What a field box shows inside its border
pub enum FieldDisplay<'a> {
    Text { value: &'a str, multiline: bool },
    /// Current option label, cycled with Left/Right
    Choice { label: Option<&'a str>, has_options: bool },
    Checkbox { checked: bool },
    /// Staged file name plus the path being typed
    Attachment {
        staged: Option<&'a str>,
        input: &'a str,
    },
}

/// Everything needed to draw one field box
pub struct FieldView<'a> {
    pub label: &'a str,
    pub required: bool,
    pub display: FieldDisplay<'a>,
    pub error: Option<&'a str>,
    pub is_active: bool,
}

impl FieldView<'_> {
    /// Rows taken by the box plus its error line
    pub fn height(&self) -> u16 {
        let body = match self.display {
            FieldDisplay::Text {
                multiline: true, ..
            } => 5,
            FieldDisplay::Attachment { .. } => 4,
            _ => 3,
        };
        body + u16::from(self.error.is_some())
    }
}

fn cursor(is_active: bool) -> Span<'static> {
    Span::styled(
        if is_active { "▌" } else { "" },
        Style::default().fg(Color::Cyan),
    )
}

fn placeholder(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(Color::DarkGray))
}

/// Draw a field box with its inline error below it
pub fn draw_field(frame: &mut Frame, area: Rect, field: &FieldView) {
    let value_style = if field.is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let border_color = match (field.error.is_some(), field.is_active) {
        (true, _) => Color::Red,
        (false, true) => Color::Cyan,
        (false, false) => Color::DarkGray,
    };

    let lines: Vec<Line> = match &field.display {
        FieldDisplay::Text { value, multiline } => {
            if value.is_empty() && !field.is_active {
                vec![Line::from(placeholder("(empty)"))]
            } else if *multiline {
                let mut lines: Vec<Line> = value
                    .split('\n')
                    .map(|l| Line::from(Span::styled(l.to_string(), value_style)))
                    .collect();
                if let Some(last) = lines.last_mut() {
                    last.spans.push(cursor(field.is_active));
                }
                lines
            } else {
                vec![Line::from(vec![
                    Span::styled(value.to_string(), value_style),
                    cursor(field.is_active),
                ])]
            }
        }
        FieldDisplay::Choice { label, has_options } => {
            let current = match (label, has_options) {
                (Some(label), _) => Span::styled(label.to_string(), value_style),
                (None, true) => placeholder("(choose with ← →)"),
                (None, false) => placeholder("(no options available)"),
            };
            vec![Line::from(vec![
                Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
                current,
                Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
            ])]
        }
        FieldDisplay::Checkbox { checked } => {
            let mark = if *checked { "[x]" } else { "[ ]" };
            vec![Line::from(vec![
                Span::styled(mark, value_style.add_modifier(Modifier::BOLD)),
                Span::raw(" Space to toggle"),
            ])]
        }
        FieldDisplay::Attachment { staged, input } => {
            let staged_line = match staged {
                Some(name) => Line::from(vec![
                    Span::styled("✓ ", Style::default().fg(Color::Green)),
                    Span::raw(name.to_string()),
                    placeholder("  (Del to remove)"),
                ]),
                None => Line::from(placeholder("No file selected")),
            };
            let input_line = if field.is_active || !input.is_empty() {
                Line::from(vec![
                    Span::raw("Path: "),
                    Span::styled(input.to_string(), value_style),
                    cursor(field.is_active),
                ])
            } else {
                Line::from("")
            };
            vec![staged_line, input_line]
        }
    };

    let title = if field.required {
        format!(" {} * ", field.label)
    } else {
        format!(" {} ", field.label)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let box_height = area.height.saturating_sub(u16::from(field.error.is_some()));
    let box_area = Rect {
        height: box_height,
        ..area
    };
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block),
        box_area,
    );

    if let Some(error) = field.error {
        if area.height > box_height {
            let error_area = Rect {
                y: area.y + box_height,
                height: 1,
                ..area
            };
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!(" {error}"),
                    Style::default().fg(Color::Red),
                )),
                error_area,
            );
        }
    }
}
