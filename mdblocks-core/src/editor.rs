//! Editing session: the document, its derived blocks and the focus state machine
//!
//! The document string is the only source of truth. Every change goes through
//! [`EditorSession::emit`], which re-segments, re-renders and notifies the
//! history. One block at a time can be edited through an input surface (a
//! cursor plus selection inside that block's content).

use std::time::Instant;

use log::{debug, info};

use crate::block::{floor_char_boundary, join_contents, section_block_ids, segment, Block};
use crate::config::{Config, EditorConfig};
use crate::fetch::{OfflineFetcher, PreviewFetcher, PreviewResult};
use crate::format::{self, Format};
use crate::history::History;
use crate::render::checklist::toggle_checklist_line;
use crate::render::{link_only_url, BlockRenderer, LinkPreview};

/// Whether a block is being edited
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Editing { index: usize },
}

/// Cursor and selection inside the edited block, as byte offsets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    pub start: usize,
    pub end: usize,
}

impl Surface {
    pub fn caret(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn cursor(&self) -> usize {
        self.start
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    fn clamped(self, content: &str) -> Self {
        let start = floor_char_boundary(content, self.start);
        let end = floor_char_boundary(content, self.end.max(start));
        Self { start, end }
    }
}

/// Cursor movements inside the edited block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Focus request. `index` refers to the block list being committed,
/// `selection` to offsets inside that block. With `frames == 0` the surface
/// is attached right away.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Focus {
    pub index: usize,
    pub selection: Option<(usize, usize)>,
    pub frames: u8,
}

#[derive(Clone, Copy, Debug)]
struct PendingFocus {
    selection: Option<(usize, usize)>,
    frames: u8,
}

pub struct EditorSession {
    content: String,
    blocks: Vec<Block>,
    state: EditState,
    surface: Option<Surface>,
    pending_focus: Option<PendingFocus>,
    ignore_blur: bool,
    blur_release_at: Option<Instant>,
    dragged_index: Option<usize>,
    drag_over_index: Option<usize>,
    renderer: BlockRenderer,
    history: History,
    fetcher: Box<dyn PreviewFetcher>,
    config: EditorConfig,
    modified: bool,
}

impl EditorSession {
    /// Session without network access; link previews never resolve
    pub fn new(content: &str, config: &Config) -> Self {
        Self::with_fetcher(content, config, Box::new(OfflineFetcher::default()))
    }

    pub fn with_fetcher(content: &str, config: &Config, fetcher: Box<dyn PreviewFetcher>) -> Self {
        let mut renderer = BlockRenderer::new(&config.render);
        let blocks = segment(content);
        renderer.render_all(&blocks);

        Self {
            content: content.to_string(),
            blocks,
            state: EditState::Idle,
            surface: None,
            pending_focus: None,
            ignore_blur: false,
            blur_release_at: None,
            dragged_index: None,
            drag_over_index: None,
            renderer,
            history: History::new(
                content,
                config.editor.history_limit,
                config.editor.history_debounce(),
            ),
            fetcher,
            config: config.editor.clone(),
            modified: false,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn editing_index(&self) -> Option<usize> {
        match self.state {
            EditState::Editing { index } => Some(index),
            EditState::Idle => None,
        }
    }

    pub fn editing_block(&self) -> Option<&Block> {
        self.editing_index().and_then(|i| self.blocks.get(i))
    }

    /// The attached input surface, if focus has been applied
    pub fn surface(&self) -> Option<Surface> {
        let block = self.editing_block()?;
        self.surface.map(|s| s.clamped(&block.content))
    }

    pub fn has_pending_focus(&self) -> bool {
        self.pending_focus.is_some()
    }

    pub fn ignores_blur(&self) -> bool {
        self.ignore_blur
    }

    pub fn drag_state(&self) -> (Option<usize>, Option<usize>) {
        (self.dragged_index, self.drag_over_index)
    }

    pub fn renderer(&self) -> &BlockRenderer {
        &self.renderer
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Rendered HTML of the block at `index`
    pub fn rendered(&self, index: usize) -> Option<&str> {
        self.blocks.get(index).map(|b| self.renderer.rendered(b))
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn block_contents(&self) -> Vec<String> {
        self.blocks.iter().map(|b| b.content.clone()).collect()
    }

    /// Replace the whole document, dropping history and cached state
    pub fn replace_document(&mut self, content: &str) {
        self.content = content.to_string();
        self.blocks = segment(content);
        self.renderer.clear();
        self.renderer.render_all(&self.blocks);
        self.history.reset(content);
        self.state = EditState::Idle;
        self.surface = None;
        self.pending_focus = None;
        self.ignore_blur = false;
        self.blur_release_at = None;
        self.modified = false;
    }

    /// Publish a new document text and re-derive everything from it
    pub fn emit(&mut self, text: String) {
        if text != self.content {
            self.modified = true;
        }
        self.content = text;
        self.blocks = segment(&self.content);
        self.renderer.render_all(&self.blocks);
        if let EditState::Editing { index } = self.state {
            if index >= self.blocks.len() {
                self.state = EditState::Editing {
                    index: self.blocks.len() - 1,
                };
            }
        }
        self.history.observe(&self.content);
    }

    /// Replace one block's content and re-emit the joined document
    pub fn update_block(&mut self, index: usize, content: String) {
        if index >= self.blocks.len() {
            return;
        }
        let mut contents = self.block_contents();
        contents[index] = content;

        let focus = match (self.editing_index(), self.surface()) {
            (Some(editing), Some(surface)) if editing == index => Some(Focus {
                index,
                selection: Some((surface.start, surface.end)),
                frames: 0,
            }),
            _ => None,
        };
        self.commit_blocks(contents, focus);
    }

    pub fn update_block_by_id(&mut self, block_id: &str, content: String) {
        if let Some(index) = self.blocks.iter().position(|b| b.id == block_id) {
            self.update_block(index, content);
        }
    }

    /// Emit a new block list and optionally move focus into it.
    ///
    /// The focus target is re-located after segmentation by line, so a block
    /// that merges with its neighbour keeps the cursor on the same text.
    pub(crate) fn commit_blocks(&mut self, contents: Vec<String>, focus: Option<Focus>) {
        let target_line = focus.map(|f| {
            contents[..f.index.min(contents.len())]
                .iter()
                .map(|c| c.split('\n').count())
                .sum::<usize>()
        });

        self.emit(join_contents(contents.iter().map(String::as_str)));

        let (Some(focus), Some(line)) = (focus, target_line) else {
            return;
        };
        let (index, offset) = self.locate_line(line);
        let selection = focus.selection.map(|(s, e)| (s + offset, e + offset));
        self.state = EditState::Editing { index };

        if focus.frames == 0 {
            let (start, end) = selection.unwrap_or_else(|| {
                let len = self.blocks[index].content.len();
                (len, len)
            });
            self.surface = Some(Surface { start, end }.clamped(&self.blocks[index].content));
            self.pending_focus = None;
        } else {
            self.surface = None;
            self.ignore_blur = true;
            self.blur_release_at = None;
            self.pending_focus = Some(PendingFocus {
                selection,
                frames: focus.frames,
            });
        }
    }

    /// Block index containing document line `line`, and the byte offset of
    /// that line inside the block
    fn locate_line(&self, line: usize) -> (usize, usize) {
        let mut first = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            let count = block.content.split('\n').count();
            if line < first + count {
                let offset = block
                    .content
                    .split('\n')
                    .take(line - first)
                    .map(|l| l.len() + 1)
                    .sum();
                return (index, offset);
            }
            first += count;
        }
        (self.blocks.len() - 1, 0)
    }

    /// Move focus to a block once its surface exists (next frame). Without a
    /// cursor the caret goes to the end of the content.
    pub fn start_editing_by_index(&mut self, index: usize, cursor: Option<usize>) {
        if index >= self.blocks.len() {
            return;
        }
        self.ignore_blur = true;
        self.blur_release_at = None;
        self.state = EditState::Editing { index };
        self.surface = None;
        self.pending_focus = Some(PendingFocus {
            selection: cursor.map(|c| (c, c)),
            frames: 1,
        });
        debug!("focus requested for block {}", index);
    }

    pub fn start_editing(&mut self, block_id: &str, cursor: Option<usize>) {
        if let Some(index) = self.blocks.iter().position(|b| b.id == block_id) {
            self.start_editing_by_index(index, cursor);
        }
    }

    pub(crate) fn split_focus_frames(&self) -> u8 {
        self.config.split_focus_frames.max(1)
    }

    /// Advance one drawn frame. Returns true when a pending focus was applied.
    pub fn tick_frame_at(&mut self, now: Instant) -> bool {
        let Some(mut pending) = self.pending_focus.take() else {
            return false;
        };
        pending.frames = pending.frames.saturating_sub(1);
        if pending.frames > 0 {
            self.pending_focus = Some(pending);
            return false;
        }

        let Some(block) = self.editing_block() else {
            return false;
        };
        let len = block.content.len();
        let (start, end) = pending.selection.unwrap_or((len, len));
        self.surface = Some(Surface { start, end }.clamped(&block.content));
        self.blur_release_at = Some(now + self.config.blur_grace());
        debug!("focus applied to block {:?}", self.editing_index());
        true
    }

    pub fn tick_frame(&mut self) -> bool {
        self.tick_frame_at(Instant::now())
    }

    /// Timers: blur suppression release, history debounce, preview results
    pub fn tick_at(&mut self, now: Instant) {
        if let Some(at) = self.blur_release_at {
            if now >= at {
                self.ignore_blur = false;
                self.blur_release_at = None;
            }
        }
        let cursor = self.surface().map(|s| s.cursor());
        self.history.poll_at(now, self.editing_index(), cursor);
        self.poll_previews();
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now())
    }

    /// Keep blur from ending the edit until the next focus transfer completes
    pub(crate) fn suppress_blur(&mut self) {
        self.ignore_blur = true;
        self.blur_release_at = None;
    }

    /// The input surface lost focus
    pub fn blur(&mut self) -> bool {
        if self.ignore_blur {
            return false;
        }
        self.state = EditState::Idle;
        self.surface = None;
        self.pending_focus = None;
        true
    }

    /// Leave editing (Escape). Suppressed during a focus transfer.
    pub fn stop_editing(&mut self) -> bool {
        self.blur()
    }

    pub(crate) fn set_selection(&mut self, start: usize, end: usize) {
        if let Some(block) = self.editing_block() {
            if self.surface.is_some() {
                self.surface = Some(Surface { start, end }.clamped(&block.content));
            }
        }
    }

    /// Replace the edited block and put the caret at `cursor`
    pub(crate) fn edit_current(&mut self, content: String, selection: (usize, usize)) {
        let Some(index) = self.editing_index() else {
            return;
        };
        let mut contents = self.block_contents();
        contents[index] = content;
        self.commit_blocks(
            contents,
            Some(Focus {
                index,
                selection: Some(selection),
                frames: 0,
            }),
        );
    }

    fn surface_and_content(&self) -> Option<(Surface, String)> {
        let surface = self.surface()?;
        Some((surface, self.editing_block()?.content.clone()))
    }

    /// Insert text at the caret, replacing any selection
    pub fn insert_text(&mut self, text: &str) -> bool {
        let Some((surface, content)) = self.surface_and_content() else {
            return false;
        };
        let new_content = format!(
            "{}{}{}",
            &content[..surface.start],
            text,
            &content[surface.end..]
        );
        let cursor = surface.start + text.len();
        self.edit_current(new_content, (cursor, cursor));
        true
    }

    /// Paste: a bare URL over a selection becomes a Markdown link
    pub fn paste(&mut self, text: &str) -> bool {
        let Some((surface, content)) = self.surface_and_content() else {
            return false;
        };
        let url = text.trim();
        if is_bare_url(url) && !surface.is_collapsed() {
            let link = format!("[{}]({})", &content[surface.start..surface.end], url);
            let cursor = surface.start + link.len();
            let new_content = format!("{}{}{}", &content[..surface.start], link, &content[surface.end..]);
            self.edit_current(new_content, (cursor, cursor));
            return true;
        }
        self.insert_text(text)
    }

    pub fn delete_backward(&mut self) -> bool {
        let Some((surface, content)) = self.surface_and_content() else {
            return false;
        };
        let start = if surface.is_collapsed() {
            match content[..surface.start].chars().next_back() {
                Some(c) => surface.start - c.len_utf8(),
                None => return false,
            }
        } else {
            surface.start
        };
        let new_content = format!("{}{}", &content[..start], &content[surface.end..]);
        self.edit_current(new_content, (start, start));
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        let Some((surface, content)) = self.surface_and_content() else {
            return false;
        };
        let end = if surface.is_collapsed() {
            match content[surface.end..].chars().next() {
                Some(c) => surface.end + c.len_utf8(),
                None => return false,
            }
        } else {
            surface.end
        };
        let new_content = format!("{}{}", &content[..surface.start], &content[end..]);
        self.edit_current(new_content, (surface.start, surface.start));
        true
    }

    /// Move the caret inside the edited block. Up on the first line goes to
    /// the start, Down on the last line to the end.
    pub fn move_cursor(&mut self, motion: Motion) -> bool {
        let Some((surface, content)) = self.surface_and_content() else {
            return false;
        };
        let pos = surface.cursor();
        let line_start = content[..pos].rfind('\n').map_or(0, |i| i + 1);
        let line_end = content[pos..].find('\n').map_or(content.len(), |i| pos + i);
        let column = content[line_start..pos].chars().count();

        let target = match motion {
            Motion::Left => content[..pos].chars().next_back().map_or(pos, |c| pos - c.len_utf8()),
            Motion::Right => content[pos..].chars().next().map_or(pos, |c| pos + c.len_utf8()),
            Motion::Home => line_start,
            Motion::End => line_end,
            Motion::Up => {
                if line_start == 0 {
                    0
                } else {
                    let prev_start = content[..line_start - 1].rfind('\n').map_or(0, |i| i + 1);
                    column_offset(&content, prev_start, line_start - 1, column)
                }
            }
            Motion::Down => {
                if line_end == content.len() {
                    content.len()
                } else {
                    let next_start = line_end + 1;
                    let next_end = content[next_start..]
                        .find('\n')
                        .map_or(content.len(), |i| next_start + i);
                    column_offset(&content, next_start, next_end, column)
                }
            }
        };
        self.surface = Some(Surface::caret(target));
        true
    }

    /// Apply a toolbar format to the edited block
    pub fn apply_format(&mut self, format: Format) -> bool {
        let Some((surface, content)) = self.surface_and_content() else {
            return false;
        };
        let formatted = format::apply_format(format, &content, surface.start..surface.end);
        self.edit_current(formatted.content, (formatted.cursor, formatted.cursor));
        true
    }

    /// Flip a checklist box
    pub fn toggle_checklist_item(&mut self, block_index: usize, line_index: usize) -> bool {
        let Some(block) = self.blocks.get(block_index) else {
            return false;
        };
        match toggle_checklist_line(&block.content, line_index) {
            Some(toggled) => {
                self.update_block(block_index, toggled);
                true
            }
            None => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        let cursor = self.surface().map(|s| s.cursor());
        match self.history.undo(self.editing_index(), cursor) {
            Some(entry) => {
                self.emit(entry.content);
                if let Some(index) = entry.editing_index {
                    self.start_editing_by_index(index, entry.cursor);
                }
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let cursor = self.surface().map(|s| s.cursor());
        match self.history.redo(self.editing_index(), cursor) {
            Some(entry) => {
                self.emit(entry.content);
                if let Some(index) = entry.editing_index {
                    self.start_editing_by_index(index, entry.cursor);
                }
                true
            }
            None => false,
        }
    }

    pub fn drag_start(&mut self, index: usize) {
        self.dragged_index = Some(index);
    }

    pub fn drag_over(&mut self, index: usize) {
        self.drag_over_index = Some(index);
    }

    pub fn drag_leave(&mut self) {
        self.drag_over_index = None;
    }

    pub fn drag_end(&mut self) {
        self.dragged_index = None;
        self.drag_over_index = None;
    }

    /// Drop the dragged block before the block at `target`
    pub fn drop_at(&mut self, target: usize) -> bool {
        let dragged = self.dragged_index.take();
        self.drag_over_index = None;

        let Some(dragged) = dragged else {
            return false;
        };
        if dragged == target || dragged >= self.blocks.len() {
            return false;
        }

        let mut contents = self.block_contents();
        let block = contents.remove(dragged);
        let insert_at = if target > dragged { target - 1 } else { target };
        contents.insert(insert_at.min(contents.len()), block);
        self.commit_blocks(contents, None);
        true
    }

    /// Insert a block at `index` and start editing it
    pub fn insert_block(&mut self, index: usize, content: &str) {
        let mut contents = self.block_contents();
        let index = index.min(contents.len());
        contents.insert(index, content.to_string());
        let frames = self.split_focus_frames();
        self.commit_blocks(
            contents,
            Some(Focus {
                index,
                selection: None,
                frames,
            }),
        );
    }

    /// Remove a block. The document always keeps at least one block.
    pub fn remove_block(&mut self, index: usize) -> bool {
        if index >= self.blocks.len() {
            return false;
        }
        let mut contents = self.block_contents();
        contents.remove(index);
        if contents.is_empty() {
            contents.push(String::new());
        }
        self.state = EditState::Idle;
        self.surface = None;
        self.pending_focus = None;
        self.commit_blocks(contents, None);
        true
    }

    /// Content of a heading's section, joined with newlines
    pub fn section_text(&self, block_id: &str) -> Option<String> {
        let ids = section_block_ids(&self.blocks, block_id);
        if ids.is_empty() {
            return None;
        }
        let text = join_contents(
            self.blocks
                .iter()
                .filter(|b| ids.contains(&b.id))
                .map(|b| b.content.as_str()),
        );
        Some(text)
    }

    /// Start the preview flow for `url`: show the skeleton, then fetch
    pub fn process_url_block(&mut self, url: &str) {
        self.renderer.mark_loading(url);
        let pattern = format!("[{0}]({0})", url);
        if let Some(block) = self.blocks.iter().find(|b| b.content.trim() == pattern).cloned() {
            self.renderer.render(&block);
        }
        self.fetcher.request(url);
    }

    /// Apply finished fetches. Returns true when anything arrived.
    pub fn poll_previews(&mut self) -> bool {
        let mut any = false;
        while let Some(result) = self.fetcher.try_recv() {
            self.apply_preview(result);
            any = true;
        }
        any
    }

    fn apply_preview(&mut self, result: PreviewResult) {
        let url = result.url;
        let pattern = format!("[{0}]({0})", url);
        self.renderer.clear_loading(&url);

        let Some(preview) = result.preview else {
            debug!("no preview for {}", url);
            self.rerender_where(|content| content.trim() == pattern);
            return;
        };

        info!("link preview ready for {}", url);
        let title = preview.title.clone();
        self.renderer.insert_preview(preview);

        if let Some(title) = title {
            if let Some(index) = self.blocks.iter().position(|b| b.content.trim() == pattern) {
                let label = title
                    .replace(['[', ']'], "")
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ");
                self.update_block(index, format!("[{}]({})", label, url));
            }
        }
        self.rerender_where(|content| link_only_url(content) == Some(url.as_str()));
    }

    fn rerender_where<F>(&mut self, matches: F)
    where
        F: Fn(&str) -> bool,
    {
        if let Some(block) = self.blocks.iter().find(|b| matches(&b.content)).cloned() {
            self.renderer.render(&block);
        }
    }

    /// Store a preview fetched outside the session and re-render
    pub fn insert_preview(&mut self, preview: LinkPreview) {
        self.renderer.insert_preview(preview);
        self.renderer.render_all(&self.blocks);
    }

    /// Every block wrapped with its id and type
    pub fn export_html(&self) -> String {
        self.renderer.export_html(&self.blocks)
    }
}

/// `http(s)://` followed by non-whitespace only
pub fn is_bare_url(text: &str) -> bool {
    let rest = text
        .strip_prefix("https://")
        .or_else(|| text.strip_prefix("http://"));
    matches!(rest, Some(r) if !r.is_empty() && !r.chars().any(char::is_whitespace))
}

/// Byte offset of `column` chars into the line `start..end`, clamped to its end
fn column_offset(content: &str, start: usize, end: usize, column: usize) -> usize {
    content[start..end]
        .char_indices()
        .nth(column)
        .map_or(end, |(i, _)| start + i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PreviewResult;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::time::Duration;

    fn session(text: &str) -> EditorSession {
        EditorSession::new(text, &Config::default())
    }

    /// Start editing and apply focus right away
    fn focus(session: &mut EditorSession, index: usize, cursor: usize) {
        session.start_editing_by_index(index, Some(cursor));
        assert!(session.tick_frame());
    }

    #[derive(Clone, Default)]
    struct FakeFetcher {
        requested: Rc<RefCell<Vec<String>>>,
        ready: Rc<RefCell<VecDeque<PreviewResult>>>,
    }

    impl PreviewFetcher for FakeFetcher {
        fn request(&mut self, url: &str) {
            self.requested.borrow_mut().push(url.to_string());
        }

        fn try_recv(&mut self) -> Option<PreviewResult> {
            self.ready.borrow_mut().pop_front()
        }
    }

    #[test]
    fn test_new_session_segments_and_renders() {
        let session = session("# Heading\n\nParagraph");
        assert_eq!(session.blocks().len(), 3);
        assert_eq!(session.state(), EditState::Idle);
        assert!(session.rendered(0).is_some_and(|h| h.contains("<h1")));
        assert!(!session.is_modified());
    }

    #[test]
    fn test_update_block_rejoins_document() {
        let mut session = session("a\nb\nc");
        session.update_block(1, "B".to_string());
        assert_eq!(session.content(), "a\nB\nc");
        assert!(session.is_modified());
        session.update_block(7, "ignored".to_string());
        assert_eq!(session.content(), "a\nB\nc");
    }

    #[test]
    fn test_focus_waits_for_frame() {
        let mut session = session("one\ntwo");
        session.start_editing_by_index(1, Some(2));
        assert_eq!(session.editing_index(), Some(1));
        assert_eq!(session.surface(), None);
        assert!(session.tick_frame());
        assert_eq!(session.surface(), Some(Surface::caret(2)));
    }

    #[test]
    fn test_focus_without_cursor_goes_to_end() {
        let mut session = session("hello");
        session.start_editing_by_index(0, None);
        session.tick_frame();
        assert_eq!(session.surface(), Some(Surface::caret(5)));
    }

    #[test]
    fn test_blur_suppressed_during_transfer() {
        let mut session = session("one\ntwo");
        let t0 = Instant::now();
        session.start_editing_by_index(0, Some(0));
        assert!(!session.blur());
        session.tick_frame_at(t0);
        session.tick_at(t0 + Duration::from_millis(10));
        assert!(!session.blur());
        assert_eq!(session.editing_index(), Some(0));

        session.tick_at(t0 + Duration::from_millis(60));
        assert!(session.blur());
        assert_eq!(session.state(), EditState::Idle);
        assert_eq!(session.surface(), None);
    }

    #[test]
    fn test_insert_and_delete() {
        let mut session = session("héllo");
        focus(&mut session, 0, 3);
        assert!(session.insert_text("X"));
        assert_eq!(session.content(), "héXllo");
        assert!(session.delete_backward());
        assert!(session.delete_backward());
        assert_eq!(session.content(), "hllo");
        assert_eq!(session.surface(), Some(Surface::caret(1)));
        assert!(session.delete_forward());
        assert_eq!(session.content(), "hlo");
    }

    #[test]
    fn test_typing_list_marker_reanchors_to_merged_block() {
        let mut session = session("- a\n\nx");
        focus(&mut session, 1, 0);
        session.insert_text("- b");
        // "- a\n- b\nx": the new item joins the list block above
        assert_eq!(session.blocks()[0].content, "- a\n- b");
        assert_eq!(session.editing_index(), Some(0));
        assert_eq!(session.surface(), Some(Surface::caret(7)));
    }

    #[test]
    fn test_move_cursor_lines() {
        let mut session = session("- abc\n- d\n- efgh");
        focus(&mut session, 0, 4);
        session.move_cursor(Motion::Down);
        assert_eq!(session.surface().map(|s| s.cursor()), Some(9));
        session.move_cursor(Motion::Down);
        assert_eq!(session.surface().map(|s| s.cursor()), Some(13));
        session.move_cursor(Motion::Down);
        assert_eq!(session.surface().map(|s| s.cursor()), Some(16));
        session.move_cursor(Motion::Home);
        assert_eq!(session.surface().map(|s| s.cursor()), Some(10));
        session.move_cursor(Motion::Up);
        session.move_cursor(Motion::Up);
        session.move_cursor(Motion::Up);
        assert_eq!(session.surface().map(|s| s.cursor()), Some(0));
    }

    #[test]
    fn test_paste_url_over_selection() {
        let mut session = session("see docs here");
        focus(&mut session, 0, 4);
        session.set_selection(4, 8);
        assert!(session.paste("  https://docs.rs  "));
        assert_eq!(session.content(), "see [docs](https://docs.rs) here");
        assert_eq!(session.surface(), Some(Surface::caret(27)));
    }

    #[test]
    fn test_paste_plain_text_inserts() {
        let mut session = session("ab");
        focus(&mut session, 0, 1);
        assert!(session.paste("https://x.dev"));
        assert_eq!(session.content(), "ahttps://x.devb");
    }

    #[test]
    fn test_apply_format_to_edited_block() {
        let mut session = session("Hello\nworld");
        focus(&mut session, 0, 0);
        assert!(session.apply_format(Format::Heading1));
        assert_eq!(session.content(), "# Hello\nworld");
        assert!(session.apply_format(Format::Heading1));
        assert_eq!(session.content(), "Hello\nworld");
    }

    #[test]
    fn test_toggle_checklist_item() {
        let mut session = session("intro\n- [ ] a\n- [x] b");
        assert!(session.toggle_checklist_item(1, 1));
        assert_eq!(session.content(), "intro\n- [ ] a\n- [ ] b");
        assert!(!session.toggle_checklist_item(0, 0));
    }

    #[test]
    fn test_drag_and_drop_moves_block() {
        let mut session = session("a\nb\nc");
        session.drag_start(0);
        session.drag_over(2);
        assert_eq!(session.drag_state(), (Some(0), Some(2)));
        assert!(session.drop_at(2));
        assert_eq!(session.content(), "b\na\nc");
        assert_eq!(session.drag_state(), (None, None));

        session.drag_start(2);
        assert!(session.drop_at(0));
        assert_eq!(session.content(), "c\nb\na");

        session.drag_start(1);
        assert!(!session.drop_at(1));
        assert!(!session.drop_at(0));
    }

    #[test]
    fn test_insert_and_remove_block() {
        let mut session = session("a\nb");
        session.insert_block(1, "");
        assert_eq!(session.content(), "a\n\nb");
        assert_eq!(session.editing_index(), Some(1));
        while session.has_pending_focus() {
            session.tick_frame();
        }
        assert_eq!(session.surface(), Some(Surface::caret(0)));

        assert!(session.remove_block(0));
        assert_eq!(session.content(), "\nb");
        assert_eq!(session.state(), EditState::Idle);

        session.remove_block(1);
        session.remove_block(0);
        assert_eq!(session.content(), "");
        assert_eq!(session.blocks().len(), 1);
        assert!(!session.remove_block(3));
    }

    #[test]
    fn test_undo_redo_restores_focus() {
        let mut session = session("a");
        let t0 = Instant::now();
        focus(&mut session, 0, 1);
        session.insert_text("b");
        session.tick_at(t0 + Duration::from_secs(1));
        assert_eq!(session.history().len(), 2);

        assert!(session.undo());
        assert_eq!(session.content(), "a");
        assert!(!session.history().has_pending());

        assert!(session.redo());
        assert_eq!(session.content(), "ab");
        assert_eq!(session.editing_index(), Some(0));
        session.tick_frame();
        assert_eq!(session.surface(), Some(Surface::caret(2)));
        assert!(!session.redo());
    }

    #[test]
    fn test_section_text() {
        let session = session("# A\none\n## B\ntwo\n# C");
        assert_eq!(session.section_text("block-0").as_deref(), Some("# A\none\n## B\ntwo"));
        assert_eq!(session.section_text("block-1"), None);
    }

    #[test]
    fn test_preview_flow_retitles_link() {
        let fetcher = FakeFetcher::default();
        let mut session = EditorSession::with_fetcher(
            "[https://example.com](https://example.com)\n",
            &Config::default(),
            Box::new(fetcher.clone()),
        );

        session.process_url_block("https://example.com");
        assert_eq!(*fetcher.requested.borrow(), vec!["https://example.com".to_string()]);
        assert!(session.rendered(0).is_some_and(|h| h.contains("link-preview-loading")));

        fetcher.ready.borrow_mut().push_back(PreviewResult {
            url: "https://example.com".to_string(),
            preview: Some(LinkPreview {
                title: Some("Example [Domain]".to_string()),
                description: Some("For examples".to_string()),
                ..LinkPreview::empty("https://example.com")
            }),
        });
        assert!(session.poll_previews());

        assert_eq!(session.blocks()[0].content, "[Example Domain](https://example.com)");
        let html = session.rendered(0).unwrap_or_default();
        assert!(!html.contains("link-preview-loading"));
        assert!(html.contains("For examples"));
    }

    #[test]
    fn test_multiline_title_keeps_link_on_one_line() {
        let fetcher = FakeFetcher::default();
        let mut session = EditorSession::with_fetcher(
            "[https://example.com](https://example.com)\nafter",
            &Config::default(),
            Box::new(fetcher.clone()),
        );
        session.process_url_block("https://example.com");
        fetcher.ready.borrow_mut().push_back(PreviewResult {
            url: "https://example.com".to_string(),
            preview: Some(LinkPreview {
                title: Some("Two\n  line\ttitle".to_string()),
                ..LinkPreview::empty("https://example.com")
            }),
        });
        session.poll_previews();

        assert_eq!(session.content(), "[Two line title](https://example.com)\nafter");
        assert_eq!(session.blocks().len(), 2);
    }

    #[test]
    fn test_failed_preview_clears_skeleton() {
        let fetcher = FakeFetcher::default();
        let mut session = EditorSession::with_fetcher(
            "[https://example.com](https://example.com)",
            &Config::default(),
            Box::new(fetcher.clone()),
        );
        session.process_url_block("https://example.com");
        fetcher.ready.borrow_mut().push_back(PreviewResult {
            url: "https://example.com".to_string(),
            preview: None,
        });
        session.poll_previews();
        assert_eq!(session.content(), "[https://example.com](https://example.com)");
        assert!(!session.rendered(0).unwrap_or_default().contains("link-preview"));
    }

    #[test]
    fn test_replace_document_resets_state() {
        let mut session = session("a");
        focus(&mut session, 0, 0);
        session.insert_text("x");
        session.replace_document("fresh\ndoc");
        assert_eq!(session.blocks().len(), 2);
        assert_eq!(session.state(), EditState::Idle);
        assert_eq!(session.history().len(), 1);
        assert!(!session.is_modified());
    }

    #[test]
    fn test_is_bare_url() {
        assert!(is_bare_url("https://example.com/a?b=c"));
        assert!(is_bare_url("http://x"));
        assert!(!is_bare_url("https://"));
        assert!(!is_bare_url("https://a b"));
        assert!(!is_bare_url("ftp://x"));
    }
}
