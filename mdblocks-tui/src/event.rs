//! Terminal events

use anyhow::{Context, Result};
use crossterm::event::{Event, KeyEvent, KeyEventKind};
use std::time::Duration;

/// Application events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Key press (releases are dropped)
    Input(KeyEvent),
    /// Bracketed paste
    Paste(String),
    /// The terminal window lost focus
    FocusLost,
    Resize,
}

/// Wait up to `timeout` for the next event we care about
pub fn next(timeout: Duration) -> Result<Option<AppEvent>> {
    if !crossterm::event::poll(timeout).context("Failed to poll events")? {
        return Ok(None);
    }
    let event = crossterm::event::read().context("Failed to read event")?;
    Ok(translate(event))
}

fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Input(key)),
        Event::Paste(text) => Some(AppEvent::Paste(text)),
        Event::FocusLost => Some(AppEvent::FocusLost),
        Event::Resize(_, _) => Some(AppEvent::Resize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    #[test]
    fn test_key_release_is_dropped() {
        let press = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(translate(Event::Key(press)), Some(AppEvent::Input(press)));

        let release = KeyEvent {
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
            ..press
        };
        assert_eq!(translate(Event::Key(release)), None);
    }

    #[test]
    fn test_paste_and_resize() {
        assert_eq!(
            translate(Event::Paste("x".to_string())),
            Some(AppEvent::Paste("x".to_string()))
        );
        assert_eq!(translate(Event::Resize(80, 24)), Some(AppEvent::Resize));
        assert_eq!(translate(Event::FocusLost), Some(AppEvent::FocusLost));
        assert_eq!(translate(Event::FocusGained), None);
    }
}
