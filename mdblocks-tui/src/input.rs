//! Input handling and keybindings

use crate::app::App;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::warn;
use mdblocks_core::format::Format;
use mdblocks_core::keyboard::{handle_key, Key, KeyInput, KeyOutcome, Modifiers};
use mdblocks_core::Motion;
use std::time::Instant;

/// Result of handling input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Handle a key event
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<Action> {
    handle_input_at(app, key, Instant::now())
}

pub fn handle_input_at(app: &mut App, key: KeyEvent, now: Instant) -> Result<Action> {
    // Help overlay swallows everything until closed
    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            app.toggle_help();
        }
        return Ok(Action::Continue);
    }

    if matches!(
        key,
        KeyEvent {
            code: KeyCode::Char('s'),
            modifiers: KeyModifiers::CONTROL,
            ..
        }
    ) {
        save(app, now);
        return Ok(Action::Continue);
    }

    if matches!(
        key,
        KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        }
    ) {
        app.request_quit(now);
        return Ok(quit_action(app));
    }

    if app.is_editing() {
        handle_edit_key(app, key);
        return Ok(Action::Continue);
    }

    handle_browse_key(app, key, now)
}

fn save(app: &mut App, now: Instant) {
    if let Err(e) = app.save(now) {
        warn!("save failed: {:#}", e);
        app.notify(format!("Save failed: {:#}", e), now);
    }
}

fn quit_action(app: &App) -> Action {
    if app.should_quit {
        Action::Quit
    } else {
        Action::Continue
    }
}

/// Keys while a block is being edited
fn handle_edit_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::ALT) {
        if let KeyCode::Char(c) = key.code {
            if let Some(format) = format_shortcut(c) {
                app.session.apply_format(format);
                return;
            }
        }
    }

    let Some(input) = to_key_input(&key) else {
        return;
    };

    let editing = app.session.editing_index();
    if handle_key(&mut app.session, &input) == KeyOutcome::Handled {
        // Escape leaves the browse cursor where editing ended
        if let (None, Some(index)) = (app.session.editing_index(), editing) {
            app.selected = index;
        }
        return;
    }

    apply_default(app, &input);
}

/// Plain text editing for keys the command handler leaves alone
fn apply_default(app: &mut App, input: &KeyInput) {
    let session = &mut app.session;
    let modifiers = input.modifiers;
    match input.key {
        Key::Char(c) if !modifiers.ctrl && !modifiers.meta && !modifiers.alt => {
            let mut buf = [0u8; 4];
            session.insert_text(c.encode_utf8(&mut buf));
        }
        Key::Enter => {
            session.insert_text("\n");
        }
        Key::Backspace => {
            session.delete_backward();
        }
        Key::Delete => {
            session.delete_forward();
        }
        Key::Left => {
            session.move_cursor(Motion::Left);
        }
        Key::Right => {
            session.move_cursor(Motion::Right);
        }
        Key::Up => {
            session.move_cursor(Motion::Up);
        }
        Key::Down => {
            session.move_cursor(Motion::Down);
        }
        Key::Home => {
            session.move_cursor(Motion::Home);
        }
        Key::End => {
            session.move_cursor(Motion::End);
        }
        _ => {}
    }
}

/// Alt shortcuts for the format toolbar
fn format_shortcut(c: char) -> Option<Format> {
    Some(match c {
        '1' => Format::Heading1,
        '2' => Format::Heading2,
        '3' => Format::Heading3,
        'b' => Format::Bold,
        'i' => Format::Italic,
        'c' => Format::Code,
        'k' => Format::CodeBlock,
        'l' => Format::Bullet,
        'n' => Format::Numbered,
        'x' => Format::Checklist,
        'q' => Format::Quote,
        't' => Format::Table,
        _ => return None,
    })
}

/// Keys while browsing blocks
fn handle_browse_key(app: &mut App, key: KeyEvent, now: Instant) -> Result<Action> {
    match key {
        KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            ..
        } => {
            app.request_quit(now);
            return Ok(quit_action(app));
        }

        // Navigation
        KeyEvent {
            code: KeyCode::Down | KeyCode::Char('j'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.select_next(),
        KeyEvent {
            code: KeyCode::Up | KeyCode::Char('k'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.select_prev(),
        KeyEvent {
            code: KeyCode::Char('g') | KeyCode::Home,
            modifiers: KeyModifiers::NONE,
            ..
        } => app.select_first(),
        KeyEvent {
            code: KeyCode::Char('G') | KeyCode::End,
            ..
        } => app.select_last(),

        // Editing
        KeyEvent {
            code: KeyCode::Enter | KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.edit_selected(None),
        KeyEvent {
            code: KeyCode::Char('i'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.edit_selected(Some(0)),
        KeyEvent {
            code: KeyCode::Char('o'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.open_below(),
        KeyEvent {
            code: KeyCode::Char('d'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.delete_selected(),
        KeyEvent {
            code: KeyCode::Char('J'),
            ..
        } => app.move_selected(true),
        KeyEvent {
            code: KeyCode::Char('K'),
            ..
        } => app.move_selected(false),
        KeyEvent {
            code: KeyCode::Char('x'),
            modifiers: KeyModifiers::NONE,
            ..
        } => {
            app.toggle_selected_checklist();
        }

        // History
        KeyEvent {
            code: KeyCode::Char('u'),
            modifiers: KeyModifiers::NONE,
            ..
        }
        | KeyEvent {
            code: KeyCode::Char('z'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } => {
            app.session.undo();
        }
        KeyEvent {
            code: KeyCode::Char('r') | KeyCode::Char('y'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } => {
            app.session.redo();
        }

        // Clipboard
        KeyEvent {
            code: KeyCode::Char('y'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.copy_document(now),
        KeyEvent {
            code: KeyCode::Char('Y'),
            ..
        } => app.copy_section(now),

        KeyEvent {
            code: KeyCode::Char('t'),
            modifiers: KeyModifiers::NONE,
            ..
        } => app.toggle_theme(),
        KeyEvent {
            code: KeyCode::Char('?'),
            ..
        } => app.toggle_help(),

        _ => {}
    }
    Ok(Action::Continue)
}

/// Translate a terminal key into the editor's key model
pub fn to_key_input(key: &KeyEvent) -> Option<KeyInput> {
    let mut modifiers = Modifiers {
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        meta: key.modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
        alt: key.modifiers.contains(KeyModifiers::ALT),
    };

    let key = match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => {
            modifiers.shift = true;
            Key::Tab
        }
        KeyCode::Esc => Key::Escape,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        _ => return None,
    };

    Some(KeyInput::with_modifiers(key, modifiers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_key_input_modifiers() {
        let input = to_key_input(&KeyEvent::new(KeyCode::Char('z'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(input.key, Key::Char('z'));
        assert!(input.modifiers.ctrl);
        assert!(!input.modifiers.shift);

        let back_tab = to_key_input(&KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)).unwrap();
        assert_eq!(back_tab.key, Key::Tab);
        assert!(back_tab.modifiers.shift);

        assert!(to_key_input(&KeyEvent::new(KeyCode::F(1), KeyModifiers::NONE)).is_none());
    }

    #[test]
    fn test_format_shortcuts() {
        assert_eq!(format_shortcut('1'), Some(Format::Heading1));
        assert_eq!(format_shortcut('t'), Some(Format::Table));
        assert_eq!(format_shortcut('z'), None);
    }
}
