//! Keyboard command handler for the edited block
//!
//! Keys the handler does not claim are reported as [`KeyOutcome::Ignored`]
//! and the host applies its default text editing (see
//! [`EditorSession::insert_text`] and friends).

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::editor::{EditorSession, Focus, Surface};
use crate::table::{first_cell_range, generate_table_markdown, parse_table_command};

static CHECKLIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-*+])\s\[[ x]\]\s").expect("valid checklist regex"));
static CHECKLIST_EMPTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*+]\s\[[ x]\]\s*$").expect("valid checklist regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-*+])\s").expect("valid bullet regex"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s").expect("valid numbered regex"));
static QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(>+)\s?").expect("valid quote regex"));
static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://[^\s]+)$").expect("valid url regex"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-*+]|\d+\.)\s").expect("valid list regex"));
static FENCE_LANG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(\w+)").expect("valid fence regex"));

/// Languages indented with four spaces inside code fences
const WIDE_INDENT_LANGS: &[&str] = &[
    "python", "java", "c", "cpp", "csharp", "go", "php", "rust", "swift",
];

/// Deepest indentation Tab produces when the previous line is not a list item
const MAX_LIST_INDENT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A key press as seen by the input surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
    /// An IME composition is in progress
    pub is_composing: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
            is_composing: false,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self {
            key,
            modifiers,
            is_composing: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The handler consumed the key; the host must not apply its default
    Handled,
    Ignored,
}

/// Interpret a key press against the edited block
pub fn handle_key(session: &mut EditorSession, input: &KeyInput) -> KeyOutcome {
    let (Some(index), Some(surface)) = (session.editing_index(), session.surface()) else {
        return KeyOutcome::Ignored;
    };
    let Some(content) = session.editing_block().map(|b| b.content.clone()) else {
        return KeyOutcome::Ignored;
    };
    let mods = input.modifiers;

    if let Key::Char(c) = input.key {
        if mods.command() {
            let shift = mods.shift || c.is_ascii_uppercase();
            match c.to_ascii_lowercase() {
                'z' if !shift => {
                    session.undo();
                    return KeyOutcome::Handled;
                }
                'z' | 'y' => {
                    session.redo();
                    return KeyOutcome::Handled;
                }
                _ => {}
            }
        }
    }

    match input.key {
        Key::Escape => {
            session.stop_editing();
            KeyOutcome::Handled
        }
        Key::Char(' ') if !mods.command() => space(session, &content, surface),
        Key::Enter if !mods.shift && !input.is_composing => {
            enter(session, index, &content, surface);
            KeyOutcome::Handled
        }
        Key::Backspace if surface.start == 0 && surface.end == 0 && index > 0 => {
            merge_into_previous(session, index, &content);
            KeyOutcome::Handled
        }
        Key::Up if surface.start == 0 && index > 0 => {
            session.suppress_blur();
            session.start_editing_by_index(index - 1, None);
            KeyOutcome::Handled
        }
        Key::Down if surface.end == content.len() && index + 1 < session.blocks().len() => {
            session.suppress_blur();
            session.start_editing_by_index(index + 1, Some(0));
            KeyOutcome::Handled
        }
        Key::Tab => tab(session, &content, surface, mods.shift),
        _ => KeyOutcome::Ignored,
    }
}

/// Line of `content` holding `cursor`: (line index, start, end)
fn current_line(content: &str, cursor: usize) -> (usize, usize, usize) {
    let start = content[..cursor].rfind('\n').map_or(0, |i| i + 1);
    let end = content[cursor..].find('\n').map_or(content.len(), |i| cursor + i);
    let index = content[..start].matches('\n').count();
    (index, start, end)
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Bytes taken by at most `max` leading whitespace chars
fn dedent_len(line: &str, max: usize) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .take(max)
        .map(char::len_utf8)
        .sum()
}

fn space(session: &mut EditorSession, content: &str, surface: Surface) -> KeyOutcome {
    let cursor = surface.start;
    let Some(size) = parse_table_command(&content[..cursor]) else {
        return KeyOutcome::Ignored;
    };
    let table = generate_table_markdown(size.rows, size.cols);
    let cell = first_cell_range();
    session.edit_current(format!("{}{}", table, &content[cursor..]), (cell.start, cell.end));
    debug!("table command expanded to {}x{}", size.rows, size.cols);
    KeyOutcome::Handled
}

fn enter(session: &mut EditorSession, index: usize, content: &str, surface: Surface) {
    let cursor = surface.start;

    if content.trim().starts_with("```") {
        code_newline(session, content, cursor);
        return;
    }

    if let Some(size) = parse_table_command(content.trim()) {
        let table = generate_table_markdown(size.rows, size.cols);
        let cell = first_cell_range();
        session.edit_current(table, (cell.start, cell.end));
        return;
    }

    let (line_index, line_start, line_end) = current_line(content, cursor);
    let line = &content[line_start..line_end];
    let trimmed = line.trim_start();
    let indent = leading_whitespace(line);
    let after_in_line = &content[cursor..line_end];

    match line_action(trimmed, indent) {
        LineAction::Exit => exit_list(session, index, content, line_index),
        LineAction::Continue(marker) => {
            let new_content = format!(
                "{}\n{}{}{}",
                &content[..cursor],
                marker,
                after_in_line,
                &content[line_end..]
            );
            let new_cursor = cursor + 1 + marker.len();
            session.edit_current(new_content, (new_cursor, new_cursor));
        }
        LineAction::Split => {
            if let Some(caps) = BARE_URL.captures(line.trim()) {
                let url = caps[1].to_string();
                split_into_url_block(session, index, &url);
            } else {
                split_block(session, index, &content[..cursor], &content[cursor..]);
            }
        }
    }
}

/// What Enter does with the line under the cursor
enum LineAction {
    /// Start a new line in the same block with this marker
    Continue(String),
    /// Empty item: leave the list or quote
    Exit,
    Split,
}

fn line_action(trimmed: &str, indent: &str) -> LineAction {
    if let Some(caps) = CHECKLIST.captures(trimmed) {
        if CHECKLIST_EMPTY.is_match(trimmed) {
            return LineAction::Exit;
        }
        return LineAction::Continue(format!("{}{} [ ] ", indent, &caps[1]));
    }
    if let Some(caps) = BULLET.captures(trimmed) {
        if trimmed.trim() == &caps[1] {
            return LineAction::Exit;
        }
        return LineAction::Continue(format!("{}{} ", indent, &caps[1]));
    }
    if let Some(caps) = NUMBERED.captures(trimmed) {
        if trimmed.trim() == caps[0].trim() {
            return LineAction::Exit;
        }
        let next = caps[1].parse::<u64>().map_or(1, |n| n.saturating_add(1));
        return LineAction::Continue(format!("{}{}. ", indent, next));
    }
    if let Some(caps) = QUOTE.captures(trimmed) {
        if trimmed.trim() == caps[0].trim() || trimmed.trim() == &caps[1] {
            return LineAction::Exit;
        }
        return LineAction::Continue(format!("{}{} ", indent, &caps[1]));
    }
    LineAction::Split
}

/// Newline inside a fence, keeping the current line's indentation. An
/// unterminated fence also gets its closing line so it stays one block.
fn code_newline(session: &mut EditorSession, content: &str, cursor: usize) {
    let (_, line_start, _) = current_line(content, cursor);
    let indent = leading_whitespace(&content[line_start..cursor]);
    let mut new_content = format!("{}\n{}{}", &content[..cursor], indent, &content[cursor..]);
    let closed = content.split('\n').skip(1).any(|l| l.trim() == "```");
    if !closed {
        new_content.push_str("\n```");
    }
    let new_cursor = cursor + 1 + indent.len();
    session.edit_current(new_content, (new_cursor, new_cursor));
}

/// Drop the empty marker line; what remains stays in this block and focus
/// moves to a fresh empty block after it
fn exit_list(session: &mut EditorSession, index: usize, content: &str, line_index: usize) {
    let mut lines: Vec<&str> = content.split('\n').collect();
    lines.remove(line_index);
    let remaining = lines.join("\n").trim().to_string();

    let mut contents = session.block_contents();
    let target = if remaining.is_empty() {
        contents[index] = String::new();
        index
    } else {
        contents[index] = remaining;
        contents.insert(index + 1, String::new());
        index + 1
    };

    let frames = session.split_focus_frames();
    session.commit_blocks(
        contents,
        Some(Focus {
            index: target,
            selection: Some((0, 0)),
            frames,
        }),
    );
    debug!("list exit in block {}", index);
}

fn split_into_url_block(session: &mut EditorSession, index: usize, url: &str) {
    let mut contents = session.block_contents();
    contents[index] = format!("[{0}]({0})", url);
    contents.insert(index + 1, String::new());

    let frames = session.split_focus_frames();
    session.commit_blocks(
        contents,
        Some(Focus {
            index: index + 1,
            selection: Some((0, 0)),
            frames,
        }),
    );
    session.process_url_block(url);
}

fn split_block(session: &mut EditorSession, index: usize, before: &str, after: &str) {
    let mut contents = session.block_contents();
    contents[index] = before.to_string();
    contents.insert(index + 1, after.to_string());

    let frames = session.split_focus_frames();
    session.commit_blocks(
        contents,
        Some(Focus {
            index: index + 1,
            selection: Some((0, 0)),
            frames,
        }),
    );
}

fn merge_into_previous(session: &mut EditorSession, index: usize, content: &str) {
    let mut contents = session.block_contents();
    let junction = contents[index - 1].len();
    contents[index - 1].push_str(content);
    contents.remove(index);

    session.commit_blocks(
        contents,
        Some(Focus {
            index: index - 1,
            selection: Some((junction, junction)),
            frames: 1,
        }),
    );
}

fn tab(session: &mut EditorSession, content: &str, surface: Surface, shift: bool) -> KeyOutcome {
    let trimmed = content.trim();
    if trimmed.starts_with("```") {
        code_indent(session, content, trimmed, surface.start, shift);
        return KeyOutcome::Handled;
    }

    if BULLET.is_match(trimmed) || NUMBERED.is_match(trimmed) || CHECKLIST.is_match(trimmed) {
        list_indent(session, content, surface.start, shift);
        return KeyOutcome::Handled;
    }

    KeyOutcome::Ignored
}

fn code_indent(session: &mut EditorSession, content: &str, trimmed: &str, cursor: usize, shift: bool) {
    let lang = FENCE_LANG
        .captures(trimmed)
        .map(|caps| caps[1].to_lowercase())
        .unwrap_or_default();
    let size = if WIDE_INDENT_LANGS.contains(&lang.as_str()) { 4 } else { 2 };

    let (_, line_start, line_end) = current_line(content, cursor);
    let line = &content[line_start..line_end];

    if shift {
        let remove = dedent_len(line, size);
        if remove == 0 {
            return;
        }
        let new_content = format!("{}{}{}", &content[..line_start], &line[remove..], &content[line_end..]);
        let new_cursor = cursor.saturating_sub(remove).max(line_start);
        session.edit_current(new_content, (new_cursor, new_cursor));
    } else {
        let new_content = format!("{}{}{}", &content[..cursor], " ".repeat(size), &content[cursor..]);
        session.edit_current(new_content, (cursor + size, cursor + size));
    }
}

fn list_indent(session: &mut EditorSession, content: &str, cursor: usize, shift: bool) {
    let (line_index, line_start, line_end) = current_line(content, cursor);
    let line = &content[line_start..line_end];
    let current = leading_whitespace(line).len();

    if shift {
        let remove = dedent_len(line, 2);
        if remove == 0 {
            return;
        }
        let new_content = format!("{}{}{}", &content[..line_start], &line[remove..], &content[line_end..]);
        let new_cursor = cursor.saturating_sub(remove).max(line_start);
        session.edit_current(new_content, (new_cursor, new_cursor));
        return;
    }

    let max_indent = if line_index > 0 {
        let prev = content[..line_start - 1]
            .rsplit('\n')
            .next()
            .unwrap_or_default();
        if LIST_ITEM.is_match(prev.trim()) {
            leading_whitespace(prev).len() + 2
        } else {
            MAX_LIST_INDENT
        }
    } else {
        MAX_LIST_INDENT
    };

    if current < max_indent {
        let new_content = format!("{}  {}", &content[..line_start], &content[line_start..]);
        session.edit_current(new_content, (cursor + 2, cursor + 2));
    }
}
