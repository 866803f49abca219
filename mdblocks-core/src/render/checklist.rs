//! Checklist blocks: detection, rendering and toggling

use std::sync::LazyLock;

use regex::Regex;

use super::markdown::render_inline;
use super::ChecklistRenderer;

static ITEM_AT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*+]\s\[[ x]\]\s").expect("valid checklist regex"));
static INDENTED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+[-*+]\s\[[ x]\]\s").expect("valid checklist regex"));
static ITEM_ANYWHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-*+]\s\[[ x]\]\s").expect("valid checklist regex"));
static ITEM_PARTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)([-*+])\s\[([ x])\]\s(.*)$").expect("valid checklist regex")
});

/// True when every non-blank line is a checklist item and at least one exists
pub fn is_checklist(content: &str) -> bool {
    let lines: Vec<&str> = content.split('\n').collect();
    lines.iter().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty() || ITEM_AT_START.is_match(trimmed) || INDENTED_ITEM.is_match(line)
    }) && lines.iter().any(|line| ITEM_ANYWHERE.is_match(line))
}

/// Flip `[ ]` and `[x]` on one line. `None` when that line is not an item.
pub fn toggle_checklist_line(content: &str, line_index: usize) -> Option<String> {
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
    let line = lines.get_mut(line_index)?;
    let mark = ITEM_PARTS.captures(line)?.get(3)?.range();
    let flipped = if &line[mark.clone()] == "x" { " " } else { "x" };
    line.replace_range(mark, flipped);
    Some(lines.join("\n"))
}

/// Default checklist HTML: one checkbox row per item, indented 8px per space
#[derive(Debug, Default)]
pub struct DefaultChecklistRenderer {
    pub allow_raw_html: bool,
}

impl ChecklistRenderer for DefaultChecklistRenderer {
    fn render_checklist(&self, block_id: &str, content: &str) -> Option<String> {
        if !is_checklist(content) {
            return None;
        }

        let html: String = content
            .split('\n')
            .enumerate()
            .filter_map(|(line_index, line)| {
                let caps = ITEM_PARTS.captures(line)?;
                let indent = caps[1].len();
                let checked = &caps[3] == "x";
                let text = render_inline(&caps[4], self.allow_raw_html);
                Some(item_html(block_id, line_index, indent, checked, &text))
            })
            .collect();

        (!html.is_empty()).then_some(html)
    }
}

fn item_html(block_id: &str, line_index: usize, indent: usize, checked: bool, text: &str) -> String {
    let checked_attr = if checked { "checked" } else { "" };
    let style = if indent > 0 {
        format!(" style=\"margin-left: {}px\"", indent * 8)
    } else {
        String::new()
    };
    format!(
        "<div class=\"checklist-item {checked}\"{style} data-block-id=\"{id}\" data-line-index=\"{line}\">\
         <input type=\"checkbox\" {checked} class=\"checklist-checkbox\" data-line-index=\"{line}\" />\
         <span class=\"checklist-text\">{text}</span></div>",
        checked = checked_attr,
        style = style,
        id = html_escape::encode_double_quoted_attribute(block_id),
        line = line_index,
        text = text,
    )
}
