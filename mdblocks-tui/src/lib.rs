//! mdblocks TUI - Terminal user interface components
//!
//! This crate contains all ratatui/crossterm integration:
//! - App state management
//! - Event loop and input handling
//! - Block rendering with an LRU cache, status bar and help overlay
//! - Theme system

pub mod app;
pub mod event;
pub mod input;
pub mod render;
pub mod terminal;
pub mod theme;
pub mod ui;

use anyhow::{Context, Result};
use std::time::{Duration, Instant};

// Re-export main types
pub use app::App;
pub use event::AppEvent;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the TUI application
pub fn run(mut app: App) -> Result<()> {
    let mut terminal = terminal::init().context("Failed to initialize terminal")?;

    // Main event loop
    let result = run_loop(&mut terminal, &mut app);

    // Always restore terminal, even if run_loop fails
    terminal::restore().context("Failed to restore terminal")?;

    result
}

fn run_loop(terminal: &mut terminal::Tui, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|frame| ui::draw(frame, app))
            .context("Failed to draw frame")?;
        app.on_frame(Instant::now());

        if app.should_quit {
            break;
        }

        // A focus waiting for frames needs another draw before input
        if app.session.has_pending_focus() {
            continue;
        }

        if let Some(event) = event::next(POLL_INTERVAL)? {
            match event {
                AppEvent::Input(key) => {
                    if input::handle_input(app, key)? == input::Action::Quit {
                        break;
                    }
                }
                AppEvent::Paste(text) => app.paste(&text),
                AppEvent::FocusLost => {
                    app.session.blur();
                }
                AppEvent::Resize => {}
            }
        }

        app.tick(Instant::now());
    }

    Ok(())
}
