//! Formatting toggles applied to the block being edited

use std::ops::Range;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::block::floor_char_boundary;

static HEADING_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s").expect("valid heading prefix regex"));
static LIST_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.|-|\*|\+)\s").expect("valid list prefix regex"));
static NUMBERED_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s").expect("valid numbered prefix regex"));
static ANY_ITEM_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([-*+]\s\[[ x]\]\s|[-*+]\s|\d+\.\s)").expect("valid item prefix regex")
});

/// Text inserted by the table format, completed by pressing Enter or Space
pub const TABLE_COMMAND_TEMPLATE: &str = "/table 3 3";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Heading1,
    Heading2,
    Heading3,
    Bold,
    Italic,
    Code,
    CodeBlock,
    Bullet,
    Numbered,
    Checklist,
    Quote,
    Table,
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "h1" => Format::Heading1,
            "h2" => Format::Heading2,
            "h3" => Format::Heading3,
            "bold" => Format::Bold,
            "italic" => Format::Italic,
            "code" => Format::Code,
            "code-block" => Format::CodeBlock,
            "bullet" => Format::Bullet,
            "numbered" => Format::Numbered,
            "checklist" => Format::Checklist,
            "quote" => Format::Quote,
            "table" => Format::Table,
            other => anyhow::bail!("Unknown format: {}", other),
        })
    }
}

/// Result of a format toggle: the new block content and where the cursor goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Formatted {
    pub content: String,
    pub cursor: usize,
}

/// Apply `format` to `content` given the current selection.
///
/// Line-prefix formats toggle: applying one that is already present removes
/// it, applying a different one of the same family replaces it.
pub fn apply_format(format: Format, content: &str, selection: Range<usize>) -> Formatted {
    let start = floor_char_boundary(content, selection.start);
    let end = floor_char_boundary(content, selection.end.max(start));

    match format {
        Format::Heading1 => toggle_heading(content, start, "# "),
        Format::Heading2 => toggle_heading(content, start, "## "),
        Format::Heading3 => toggle_heading(content, start, "### "),
        Format::Bold => wrap_selection(content, start, end, "**"),
        Format::Italic => wrap_selection(content, start, end, "*"),
        Format::Code => wrap_selection(content, start, end, "`"),
        Format::CodeBlock => Formatted {
            content: format!("```\n{}\n```", content),
            cursor: 4,
        },
        Format::Bullet => {
            if let Some(rest) = content.strip_prefix("- ") {
                removed(rest, start, 2)
            } else {
                added("- ", &LIST_PREFIX.replace(content, ""), start)
            }
        }
        Format::Numbered => {
            if let Some(m) = NUMBERED_PREFIX.find(content) {
                removed(&content[m.end()..], start, m.end())
            } else {
                added("1. ", &LIST_PREFIX.replace(content, ""), start)
            }
        }
        Format::Checklist => {
            if let Some(rest) = content.strip_prefix("- [ ] ") {
                removed(rest, start, 6)
            } else {
                added("- [ ] ", &ANY_ITEM_PREFIX.replace(content, ""), start)
            }
        }
        Format::Quote => {
            if let Some(rest) = content.strip_prefix("> ") {
                removed(rest, start, 2)
            } else {
                added("> ", content, start)
            }
        }
        Format::Table => Formatted {
            content: TABLE_COMMAND_TEMPLATE.to_string(),
            cursor: TABLE_COMMAND_TEMPLATE.len(),
        },
    }
}

fn toggle_heading(content: &str, start: usize, prefix: &str) -> Formatted {
    if let Some(rest) = content.strip_prefix(prefix) {
        removed(rest, start, prefix.len())
    } else {
        added(prefix, &HEADING_PREFIX.replace(content, ""), start)
    }
}

fn wrap_selection(content: &str, start: usize, end: usize, marker: &str) -> Formatted {
    let selected = &content[start..end];
    let new_content = format!(
        "{}{}{}{}{}",
        &content[..start],
        marker,
        selected,
        marker,
        &content[end..]
    );
    let cursor = if selected.is_empty() {
        start + marker.len()
    } else {
        end + marker.len() * 2
    };
    Formatted {
        content: new_content,
        cursor,
    }
}

fn added(prefix: &str, rest: &str, start: usize) -> Formatted {
    Formatted {
        content: format!("{}{}", prefix, rest),
        cursor: start + prefix.len(),
    }
}

fn removed(rest: &str, start: usize, prefix_len: usize) -> Formatted {
    Formatted {
        content: rest.to_string(),
        cursor: start.saturating_sub(prefix_len),
    }
}
