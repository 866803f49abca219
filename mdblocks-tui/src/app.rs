//! Application state

use anyhow::Result;
use log::warn;
use mdblocks_core::classify::checklist_marker;
use mdblocks_core::clipboard::{self, Clipboard, MemoryClipboard};
use mdblocks_core::config::ThemeVariant;
use mdblocks_core::fetch::default_fetcher;
use mdblocks_core::{Config, Document, EditorSession};
use std::time::Instant;

use crate::render::RendererCache;
use crate::theme::Theme;

/// Transient message shown in the status bar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub expires_at: Instant,
}

/// Main application state
pub struct App {
    pub config: Config,
    pub doc: Document,
    pub session: EditorSession,
    pub theme: Theme,
    pub theme_variant: ThemeVariant,
    /// Block under the browse cursor
    pub selected: usize,
    /// First visible block
    pub scroll: usize,
    pub should_quit: bool,
    pub show_help: bool,
    pub notification: Option<Notification>,
    pub render_cache: RendererCache,
    clipboard: Box<dyn Clipboard>,
    quit_armed: bool,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, doc: Document) -> Self {
        let clipboard = system_clipboard();
        Self::with_clipboard(config, doc, clipboard)
    }

    pub fn with_clipboard(config: Config, doc: Document, clipboard: Box<dyn Clipboard>) -> Self {
        let fetcher = default_fetcher(&config.link_preview);
        let session = EditorSession::with_fetcher(&doc.text, &config, fetcher);
        let theme_variant = config.theme;

        Self {
            theme: Theme::for_variant(theme_variant),
            theme_variant,
            config,
            doc,
            session,
            selected: 0,
            scroll: 0,
            should_quit: false,
            show_help: false,
            notification: None,
            render_cache: RendererCache::new(),
            clipboard,
            quit_armed: false,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.session.editing_index().is_some()
    }

    /// Block the view follows: the edited block, else the browse cursor
    pub fn focus_index(&self) -> usize {
        self.session.editing_index().unwrap_or(self.selected)
    }

    /// Called once per drawn frame
    pub fn on_frame(&mut self, now: Instant) {
        self.session.tick_frame_at(now);
    }

    /// Timers and background results
    pub fn tick(&mut self, now: Instant) {
        self.session.tick_at(now);
        if let Some(index) = self.session.editing_index() {
            self.selected = index;
        }
        self.clamp_selection();
        if self
            .notification
            .as_ref()
            .is_some_and(|n| now >= n.expires_at)
        {
            self.notification = None;
        }
    }

    fn clamp_selection(&mut self) {
        let last = self.session.blocks().len().saturating_sub(1);
        self.selected = self.selected.min(last);
    }

    pub fn notify(&mut self, message: impl Into<String>, now: Instant) {
        self.notification = Some(Notification {
            message: message.into(),
            expires_at: now + self.config.clipboard.notification(),
        });
    }

    pub fn select_next(&mut self) {
        self.selected += 1;
        self.clamp_selection();
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.session.blocks().len().saturating_sub(1);
    }

    /// Edit the selected block, caret at `cursor` or at the end
    pub fn edit_selected(&mut self, cursor: Option<usize>) {
        self.session.start_editing_by_index(self.selected, cursor);
    }

    /// Open a new empty block below the selection
    pub fn open_below(&mut self) {
        self.session.insert_block(self.selected + 1, "");
        self.selected += 1;
    }

    pub fn delete_selected(&mut self) {
        self.session.remove_block(self.selected);
        self.clamp_selection();
    }

    /// Move the selected block one position up or down via drag and drop
    pub fn move_selected(&mut self, down: bool) {
        let from = self.selected;
        let count = self.session.blocks().len();
        let (target, new_index) = if down {
            if from + 1 >= count {
                return;
            }
            (from + 2, from + 1)
        } else {
            if from == 0 {
                return;
            }
            (from - 1, from - 1)
        };
        self.session.drag_start(from);
        self.session.drag_over(target);
        if self.session.drop_at(target) {
            self.selected = new_index;
        }
        self.session.drag_end();
    }

    /// Toggle the first open item of a checklist block, or reopen the last
    /// item when everything is done
    pub fn toggle_selected_checklist(&mut self) -> bool {
        let Some(block) = self.session.blocks().get(self.selected) else {
            return false;
        };
        let items: Vec<(usize, bool)> = block
            .content
            .split('\n')
            .enumerate()
            .filter_map(|(i, line)| checklist_marker(line.trim_start()).map(|(_, checked, _)| (i, checked)))
            .collect();
        let target = items
            .iter()
            .find(|(_, checked)| !checked)
            .or_else(|| items.last())
            .map(|(i, _)| *i);
        match target {
            Some(line) => self.session.toggle_checklist_item(self.selected, line),
            None => false,
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme_variant = match self.theme_variant {
            ThemeVariant::Dark => ThemeVariant::Light,
            ThemeVariant::Light => ThemeVariant::Dark,
        };
        self.theme = Theme::for_variant(self.theme_variant);
    }

    pub fn save(&mut self, now: Instant) -> Result<()> {
        self.doc.save(self.session.content())?;
        self.session.mark_saved();
        self.quit_armed = false;
        let name = self.doc.display_name();
        self.notify(format!("Saved {}", name), now);
        Ok(())
    }

    /// Copy the formatted document. Failures are logged and show nothing.
    pub fn copy_document(&mut self, now: Instant) {
        match clipboard::copy_document(&self.session, self.clipboard.as_mut()) {
            Ok(_) => self.notify("Copied", now),
            Err(e) => warn!("copy failed: {:#}", e),
        }
    }

    /// Copy the section under the selected heading
    pub fn copy_section(&mut self, now: Instant) {
        let Some(id) = self.session.blocks().get(self.selected).map(|b| b.id.clone()) else {
            return;
        };
        match clipboard::copy_section(&self.session, &id, self.clipboard.as_mut()) {
            Ok(Some(_)) => self.notify("Copied section", now),
            Ok(None) => self.notify("Not a heading", now),
            Err(e) => warn!("copy failed: {:#}", e),
        }
    }

    pub fn paste(&mut self, text: &str) {
        if self.is_editing() {
            self.session.paste(text);
        }
    }

    /// Quit, asking once more when there are unsaved changes
    pub fn request_quit(&mut self, now: Instant) {
        if self.session.is_modified() && !self.quit_armed {
            self.quit_armed = true;
            self.notify("Unsaved changes: q again to quit, Ctrl-S to save", now);
            return;
        }
        self.should_quit = true;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

#[cfg(feature = "clipboard")]
fn system_clipboard() -> Box<dyn Clipboard> {
    match clipboard::SystemClipboard::new() {
        Ok(clipboard) => Box::new(clipboard),
        Err(e) => {
            warn!("{:#}, copies stay in memory", e);
            Box::new(MemoryClipboard::default())
        }
    }
}

#[cfg(not(feature = "clipboard"))]
fn system_clipboard() -> Box<dyn Clipboard> {
    Box::new(MemoryClipboard::default())
}
