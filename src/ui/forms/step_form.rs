//! Current step rendering

use super::field_renderer::{draw_field, FieldDisplay, FieldView};
use crate::app::{App, Focus};
use crate::state::forms::{FieldKind, FieldValue};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders},
    Frame,
};

/// Draw the focusable items of the current step, scrolled so the focused
/// one stays visible
pub fn draw_step_form(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let step_index = session.current_step();
    let title = session
        .schema()
        .step(step_index)
        .map(|s| s.title)
        .unwrap_or_default();

    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let targets = app.focus_targets();
    let labels: Vec<String> = targets
        .iter()
        .map(|target| match target {
            Focus::Field(id) => {
                let kind = session.schema().field(*id).map(|spec| spec.kind);
                match (kind, session.value(*id)) {
                    (Some(FieldKind::Choice(source)), Some(value)) if !value.is_empty() => {
                        app.state.choice_label(source, value.as_text())
                    }
                    _ => String::new(),
                }
            }
            Focus::Slot(_) => String::new(),
        })
        .collect();

    let views: Vec<FieldView> = targets
        .iter()
        .zip(&labels)
        .enumerate()
        .map(|(index, (target, label))| {
            let is_active = index == app.state.active_form_field;
            match *target {
                Focus::Field(id) => {
                    let spec = session.schema().field(id);
                    let kind = spec.map_or(FieldKind::Text, |s| s.kind);
                    let value = session.value(id);
                    let display = match kind {
                        FieldKind::Text | FieldKind::Multiline => FieldDisplay::Text {
                            value: value.map_or("", FieldValue::as_text),
                            multiline: kind == FieldKind::Multiline,
                        },
                        FieldKind::Choice(source) => FieldDisplay::Choice {
                            label: (!label.is_empty()).then_some(label.as_str()),
                            has_options: !app.state.choice_options(source).is_empty(),
                        },
                        FieldKind::Checkbox => FieldDisplay::Checkbox {
                            checked: value.is_some_and(FieldValue::as_flag),
                        },
                    };
                    FieldView {
                        label: id.label(),
                        required: spec.is_some_and(|s| s.is_required()),
                        display,
                        error: session.error(id),
                        is_active,
                    }
                }
                Focus::Slot(slot) => {
                    let required = session
                        .schema()
                        .slots()
                        .iter()
                        .any(|s| s.id == slot && s.required);
                    FieldView {
                        label: slot.label(),
                        required,
                        display: FieldDisplay::Attachment {
                            staged: session
                                .attachments()
                                .get(slot)
                                .map(|f| f.display_name.as_str()),
                            input: if is_active {
                                app.state.attachment_input.as_str()
                            } else {
                                ""
                            },
                        },
                        error: session.attachment_error(slot),
                        is_active,
                    }
                }
            }
        })
        .collect();

    let heights: Vec<u16> = views.iter().map(FieldView::height).collect();
    let first = first_visible(&heights, app.state.active_form_field, inner.height);

    let mut y = inner.y;
    let bottom = inner.y + inner.height;
    for (view, height) in views.iter().zip(&heights).skip(first) {
        if y + height > bottom {
            break;
        }
        let field_area = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height: *height,
        };
        draw_field(frame, field_area, view);
        y += height;
    }
}

/// Index of the first item to draw so that `active` fits in `available` rows
fn first_visible(heights: &[u16], active: usize, available: u16) -> usize {
    let active = active.min(heights.len().saturating_sub(1));
    let mut first = 0;
    while first < active {
        let used: u16 = heights[first..=active].iter().sum();
        if used <= available {
            break;
        }
        first += 1;
    }
    first
}
