//! UI module for rendering the TUI

mod components;
mod forms;
mod submitted;
mod wizard;

use crate::app::App;
use crate::state::View;
use components::render_error_dialog;
use ratatui::Frame;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    match app.state.current_view {
        View::Wizard => wizard::draw(frame, area, app),
        View::Submitted => submitted::draw(frame, area, app),
    }

    // Error dialog overlays everything
    if let Some(message) = app.state.current_error() {
        render_error_dialog(frame, message, app.state.error_queue.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApiClientTrait;
    use crate::state::draft::FileDraftStore;
    use crate::state::forms::{FormSchema, WizardSession};
    use crate::state::ApplicationRecord;
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    fn app(dir: &TempDir) -> App {
        let schema = FormSchema::application().unwrap();
        let store = FileDraftStore::new(dir.path(), schema.key());
        App::new(
            WizardSession::new(schema, Box::new(store)),
            Box::new(MockApiClientTrait::new()),
        )
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_wizard_shows_first_step() {
        let dir = TempDir::new().unwrap();
        let screen = render(&app(&dir));
        assert!(screen.contains("Personal information"));
        assert!(screen.contains("step 1 of 4"));
        assert!(screen.contains("Not saved yet"));
    }

    #[test]
    fn test_error_dialog_overlays_wizard() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.push_error("Could not load scholarship types");
        let screen = render(&app);
        assert!(screen.contains("Error"));
        assert!(screen.contains("Could not load"));
    }

    #[test]
    fn test_submitted_view_shows_reference() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.state.submitted = Some(ApplicationRecord {
            id: 42,
            status: "pending".into(),
            status_display: None,
        });
        app.state.current_view = View::Submitted;
        let screen = render(&app);
        assert!(screen.contains("#42"));
        assert!(screen.contains("pending"));
    }
}
