//! CIM Console - a terminal console for CIM identity administration.
//!
//! Signs in against the CIM API and lets an administrator browse and edit
//! users, groups and policies.

mod app;
mod ui;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cim_console_core::{ApiClient, Config, FileStorage, SessionStore, Storage};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file written inside the storage directory
const LOG_FILE: &str = "cim-console.log";

/// Storage directory used when the platform has no cache directory
const FALLBACK_STORAGE_DIR: &str = ".cim-console";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file so they never draw over the alternate screen.
/// Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let storage_dir = config
        .storage_dir()
        .unwrap_or_else(|_| PathBuf::from(FALLBACK_STORAGE_DIR));
    std::fs::create_dir_all(&storage_dir)
        .with_context(|| format!("Failed to create {}", storage_dir.display()))?;

    let _log_guard = init_tracing(&storage_dir);
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&storage_dir));

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--login") => return login_command(config, storage).await,
        Some("--logout") => return logout_command(storage),
        Some("--whoami") => return whoami_command(storage),
        Some(other) => {
            eprintln!("Unknown argument: {}", other);
            eprintln!("Usage: cim-console [--login | --logout | --whoami]");
            std::process::exit(2);
        }
        None => {}
    }

    info!(api = %Config::api_base_url(), "CIM Console starting");

    // Create app before touching the terminal so setup errors print normally
    let mut app = App::new(config, storage)?;
    app.navigate("/dashboard");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("CIM Console shutting down");
    Ok(())
}

/// Sign in without the TUI and persist the session
async fn login_command(mut config: Config, storage: Arc<dyn Storage>) -> Result<()> {
    let default_username = config.last_username.clone().unwrap_or_default();
    if default_username.is_empty() {
        eprint!("Username: ");
    } else {
        eprint!("Username [{}]: ", default_username);
    }
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let username = match line.trim() {
        "" => default_username,
        typed => typed.to_string(),
    };

    let password = rpassword::prompt_password("Password: ")?;

    let api = ApiClient::new(&Config::api_base_url(), Arc::clone(&storage))?;
    let mut session = SessionStore::new(storage);
    let user = session
        .login(&api, &username, &password)
        .await
        .map_err(|e| anyhow::anyhow!(app::login_error_message(&e)))?;

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}", user.display_name());
    Ok(())
}

fn logout_command(storage: Arc<dyn Storage>) -> Result<()> {
    let mut session = SessionStore::new(storage);
    session.initialize();
    session.logout();
    println!("Logged out");
    Ok(())
}

fn whoami_command(storage: Arc<dyn Storage>) -> Result<()> {
    let mut session = SessionStore::new(storage);
    session.initialize();
    match session.user() {
        Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
        None => println!("Not logged in"),
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Apply finished requests
        app.tick();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
