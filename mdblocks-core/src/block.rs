//! Block segmentation of a flat Markdown document
//!
//! The document is split line by line into blocks. Headings, rules, empty lines
//! and plain text lines are one block each; lists, quotes, tables and closed code
//! fences absorb the lines that belong to them. Joining every block's content
//! with `\n` always reproduces the original text exactly.

use log::debug;

/// One independently editable and renderable unit of the document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub id: String,
    pub content: String,
}

impl Block {
    fn new(seq: usize, content: String) -> Self {
        Self {
            id: format!("block-{}", seq),
            content,
        }
    }
}

/// What a single line looks like, without looking at its neighbours
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    ListItem,
    Quote,
    Rule,
    Fence,
    Empty,
    TableRow,
    Text,
}

/// Classify one line. The checks run in the order the segmenter needs them.
pub fn line_kind(line: &str) -> LineKind {
    let trimmed = line.trim();

    if heading_level(trimmed).is_some() {
        LineKind::Heading
    } else if is_list_line(line) {
        LineKind::ListItem
    } else if is_quote_line(line) {
        LineKind::Quote
    } else if is_rule(trimmed) {
        LineKind::Rule
    } else if trimmed.starts_with("```") {
        LineKind::Fence
    } else if trimmed.is_empty() {
        LineKind::Empty
    } else if trimmed.starts_with('|') && trimmed.ends_with('|') {
        LineKind::TableRow
    } else {
        LineKind::Text
    }
}

/// Split a document into blocks.
///
/// Ids are `block-0`, `block-1`, ... in emission order and are reassigned on
/// every call. Empty input yields a single empty block.
pub fn segment(text: &str) -> Vec<Block> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut blocks: Vec<Block> = Vec::new();
    let mut seq = 0;

    let mut push = |blocks: &mut Vec<Block>, content: String| {
        blocks.push(Block::new(seq, content));
        seq += 1;
    };

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        match line_kind(line) {
            LineKind::ListItem => {
                let end = extend_while(&lines, i, is_list_line);
                push(&mut blocks, lines[i..=end].join("\n"));
                i = end + 1;
            }
            LineKind::Quote => {
                let end = extend_while(&lines, i, is_quote_line);
                push(&mut blocks, lines[i..=end].join("\n"));
                i = end + 1;
            }
            LineKind::Fence => match find_closing_fence(&lines, i) {
                Some(close) => {
                    push(&mut blocks, lines[i..=close].join("\n"));
                    i = close + 1;
                }
                None => {
                    // Unclosed fence: keep the opener on its own and rescan
                    // everything after it
                    push(&mut blocks, line.to_string());
                    i += 1;
                }
            },
            LineKind::TableRow => {
                let end = extend_while(&lines, i, |next| next.trim().starts_with('|'));
                push(&mut blocks, lines[i..=end].join("\n"));
                i = end + 1;
            }
            LineKind::Heading | LineKind::Rule | LineKind::Empty | LineKind::Text => {
                push(&mut blocks, line.to_string());
                i += 1;
            }
        }
    }

    if blocks.is_empty() {
        blocks.push(Block::new(0, String::new()));
    }

    debug!("segmented {} lines into {} blocks", lines.len(), blocks.len());
    blocks
}

/// Rebuild the document from its blocks
pub fn join_blocks(blocks: &[Block]) -> String {
    join_contents(blocks.iter().map(|b| b.content.as_str()))
}

/// Join block contents with newlines
pub fn join_contents<'a, I>(contents: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    contents.into_iter().collect::<Vec<_>>().join("\n")
}

/// Ids of a heading block and every block of its section.
///
/// The section ends before the next heading of the same or a higher level.
/// Returns an empty list when the id is unknown or not a heading.
pub fn section_block_ids(blocks: &[Block], block_id: &str) -> Vec<String> {
    let Some(start) = blocks.iter().position(|b| b.id == block_id) else {
        return Vec::new();
    };
    let Some(level) = heading_level(blocks[start].content.trim()) else {
        return Vec::new();
    };

    let mut ids = vec![blocks[start].id.clone()];
    for block in &blocks[start + 1..] {
        if let Some(next_level) = heading_level(block.content.trim()) {
            if next_level <= level {
                break;
            }
        }
        ids.push(block.id.clone());
    }
    ids
}

/// ATX heading level of a trimmed line: 1-6 `#` followed by whitespace
pub fn heading_level(trimmed: &str) -> Option<usize> {
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    trimmed[hashes..]
        .chars()
        .next()
        .filter(|c| c.is_whitespace())
        .map(|_| hashes)
}

/// Bullet, numbered or checklist item, indented or not
pub fn is_list_line(line: &str) -> bool {
    let rest = line.trim();
    let after_marker = if let Some(r) = rest.strip_prefix(['-', '*', '+']) {
        r
    } else {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return false;
        }
        match rest[digits..].strip_prefix('.') {
            Some(r) => r,
            None => return false,
        }
    };
    after_marker.is_empty() || after_marker.starts_with(char::is_whitespace)
}

/// Any line whose first non-blank character is `>`
pub fn is_quote_line(line: &str) -> bool {
    line.trim().starts_with('>')
}

/// Largest char boundary of `text` that is not past `index`
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn is_rule(trimmed: &str) -> bool {
    trimmed.len() >= 3 && trimmed.chars().all(|c| matches!(c, '-' | '*' | '_'))
}

/// Index of the last line that still belongs to a run starting at `start`.
/// Runs stop at the first blank line or the first line failing `belongs`.
fn extend_while<F>(lines: &[&str], start: usize, belongs: F) -> usize
where
    F: Fn(&str) -> bool,
{
    let mut end = start;
    while end + 1 < lines.len() {
        let next = lines[end + 1];
        if next.trim().is_empty() || !belongs(next) {
            break;
        }
        end += 1;
    }
    end
}

/// Find the bare closing fence for the opener at `open`.
///
/// A line that opens another fence with a language tag before any bare
/// closer means the opener was never closed.
fn find_closing_fence(lines: &[&str], open: usize) -> Option<usize> {
    for (idx, line) in lines.iter().enumerate().skip(open + 1) {
        let trimmed = line.trim();
        if trimmed == "```" {
            return Some(idx);
        }
        if trimmed.starts_with("```") {
            return None;
        }
    }
    None
}
