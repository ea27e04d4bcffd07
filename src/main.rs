//! Scholarship TUI - terminal client for scholarship applications
//!
//! A Ratatui-based multi-step form that validates each step, keeps a local
//! draft, and submits the finished application to the backend.

mod api;
mod app;
mod config;
mod platform;
mod state;
mod ui;

use anyhow::{Context, Result};
use api::{ApiClient, ApiClientTrait};
use app::App;
use clap::Parser;
use config::TuiConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use state::draft::FileDraftStore;
use state::forms::{FormSchema, WizardSession};
use std::io;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "scholarship-tui", version, about)]
struct Cli {
    /// Preselect a scholarship type by id
    #[arg(long = "type", value_name = "ID")]
    scholarship_type: Option<String>,

    /// Backend base address, overriding config and environment
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scholarship_tui=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = TuiConfig::load().context("Failed to load configuration")?;
    let api_url = cli.api_url.clone().unwrap_or_else(|| config.api_url());
    tracing::info!("Using backend at {api_url}");

    let schema = FormSchema::application()?;
    let draft_dir = config
        .drafts_dir()
        .context("No data directory available for drafts")?;
    let store = FileDraftStore::new(draft_dir, schema.key());
    tracing::debug!("Drafts stored at {}", store.path().display());
    let api: Box<dyn ApiClientTrait> =
        Box::new(ApiClient::new(&api_url, config.access_token.clone())?);

    let mut app = App::new(WizardSession::new(schema, Box::new(store)), api);
    app.mount(&config.identity(), cli.scholarship_type.as_deref())
        .await;
    app.start_autosave(config.autosave_interval());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw the UI
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Handle crossterm events
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Global quit: Ctrl+C
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    app.quit();
                    return Ok(());
                }

                app.handle_key(key)?;
            }
        }

        // Show the in-flight state before blocking on the backend
        if app.has_pending_submission() {
            terminal.draw(|frame| ui::draw(frame, app))?;
            app.send_pending_submission().await;
        }

        // Run any autosave that came due
        app.on_tick();

        // Check if app wants to quit
        if app.should_quit() {
            return Ok(());
        }
    }
}
