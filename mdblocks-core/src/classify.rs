//! Semantic type of a block, derived from its content

use std::fmt;

use crate::block::heading_level;

/// Semantic classification of a block. Never stored, always derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockType {
    Heading1,
    Heading2,
    Heading3,
    CodeBlock,
    Checklist,
    BulletList,
    NumberedList,
    Blockquote,
    Table,
    Empty,
    Paragraph,
}

impl BlockType {
    /// Stable tag used in exported HTML and logs
    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Heading1 => "heading-1",
            BlockType::Heading2 => "heading-2",
            BlockType::Heading3 => "heading-3",
            BlockType::CodeBlock => "code-block",
            BlockType::Checklist => "checklist",
            BlockType::BulletList => "bullet-list",
            BlockType::NumberedList => "numbered-list",
            BlockType::Blockquote => "blockquote",
            BlockType::Table => "table",
            BlockType::Empty => "empty",
            BlockType::Paragraph => "paragraph",
        }
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            BlockType::Checklist | BlockType::BulletList | BlockType::NumberedList
        )
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify block content.
///
/// Headings take the level of the full run of leading `#`, so `## H` is never
/// mistaken for a level-1 heading. Levels 4-6 are treated as paragraphs.
pub fn classify(content: &str) -> BlockType {
    let trimmed = content.trim();

    match heading_level(trimmed) {
        Some(1) => return BlockType::Heading1,
        Some(2) => return BlockType::Heading2,
        Some(3) => return BlockType::Heading3,
        _ => {}
    }

    if trimmed.starts_with("```") {
        BlockType::CodeBlock
    } else if is_checklist_line(trimmed) {
        BlockType::Checklist
    } else if trimmed.starts_with("- ") || trimmed.starts_with("* ") || trimmed.starts_with("+ ") {
        BlockType::BulletList
    } else if numbered_marker_len(trimmed).is_some() {
        BlockType::NumberedList
    } else if trimmed.starts_with("> ") {
        BlockType::Blockquote
    } else if trimmed.starts_with('|') {
        BlockType::Table
    } else if trimmed.is_empty() {
        BlockType::Empty
    } else {
        BlockType::Paragraph
    }
}

/// `- [ ] text` / `* [x] text` with the marker at the start of `line`
pub fn is_checklist_line(line: &str) -> bool {
    checklist_marker(line).is_some()
}

/// Parse a checklist marker at the start of `line`.
///
/// Returns the bullet char, whether the box is checked and the byte length of
/// the marker including the trailing space.
pub fn checklist_marker(line: &str) -> Option<(char, bool, usize)> {
    let bytes = line.as_bytes();
    if bytes.len() < 6 {
        return None;
    }
    let bullet = bytes[0] as char;
    if !matches!(bullet, '-' | '*' | '+') {
        return None;
    }
    if !(bytes[1] as char).is_ascii_whitespace() || bytes[2] != b'[' || bytes[4] != b']' {
        return None;
    }
    let checked = match bytes[3] {
        b'x' => true,
        b' ' => false,
        _ => return None,
    };
    if !(bytes[5] as char).is_ascii_whitespace() {
        return None;
    }
    Some((bullet, checked, 6))
}

/// Byte length of a `12. ` style marker at the start of `line`
pub fn numbered_marker_len(line: &str) -> Option<usize> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line.as_bytes()[digits..];
    if rest.len() >= 2 && rest[0] == b'.' && (rest[1] as char).is_ascii_whitespace() {
        Some(digits + 2)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_levels() {
        assert_eq!(classify("# H"), BlockType::Heading1);
        assert_eq!(classify("## H"), BlockType::Heading2);
        assert_eq!(classify("### H"), BlockType::Heading3);
    }

    #[test]
    fn test_longest_heading_prefix_wins() {
        assert_eq!(classify("### ## #"), BlockType::Heading3);
        assert_eq!(classify("#### deep"), BlockType::Paragraph);
        assert_eq!(classify("#hashtag"), BlockType::Paragraph);
    }

    #[test]
    fn test_checklist_before_bullet() {
        assert_eq!(classify("- [ ] x"), BlockType::Checklist);
        assert_eq!(classify("- [x] y"), BlockType::Checklist);
        assert_eq!(classify("* [ ] z"), BlockType::Checklist);
        assert_eq!(classify("- [X] upper"), BlockType::BulletList);
        assert_eq!(classify("- item"), BlockType::BulletList);
    }

    #[test]
    fn test_other_types() {
        assert_eq!(classify("```rust\nfn main() {}\n```"), BlockType::CodeBlock);
        assert_eq!(classify("1. one"), BlockType::NumberedList);
        assert_eq!(classify("10. ten"), BlockType::NumberedList);
        assert_eq!(classify("1.no space"), BlockType::Paragraph);
        assert_eq!(classify("> quoted"), BlockType::Blockquote);
        assert_eq!(classify(">no space"), BlockType::Paragraph);
        assert_eq!(classify("| a | b |"), BlockType::Table);
        assert_eq!(classify("   "), BlockType::Empty);
        assert_eq!(classify("just text"), BlockType::Paragraph);
    }

    #[test]
    fn test_classification_uses_trimmed_content() {
        assert_eq!(classify("   - item"), BlockType::BulletList);
        assert_eq!(classify("\n# H\n"), BlockType::Heading1);
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(BlockType::Heading2.as_str(), "heading-2");
        assert_eq!(BlockType::CodeBlock.to_string(), "code-block");
        assert!(BlockType::Checklist.is_list());
        assert!(!BlockType::Blockquote.is_list());
    }

    #[test]
    fn test_markers() {
        assert_eq!(checklist_marker("- [x] done"), Some(('-', true, 6)));
        assert_eq!(checklist_marker("+ [ ] todo"), Some(('+', false, 6)));
        assert_eq!(checklist_marker("- [ ]"), None);
        assert_eq!(numbered_marker_len("3. three"), Some(3));
        assert_eq!(numbered_marker_len("123. x"), Some(5));
        assert_eq!(numbered_marker_len("x. no"), None);
    }
}
