//! Copy formatting and the clipboard collaborator

use anyhow::Result;

use crate::block::{heading_level, is_list_line};
use crate::editor::EditorSession;

/// Anything that can take copied text
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

#[cfg(feature = "clipboard")]
pub use system::SystemClipboard;

#[cfg(feature = "clipboard")]
mod system {
    use anyhow::{Context, Result};

    use super::Clipboard;

    /// The desktop clipboard
    pub struct SystemClipboard {
        inner: arboard::Clipboard,
    }

    impl SystemClipboard {
        pub fn new() -> Result<Self> {
            let inner = arboard::Clipboard::new().context("Failed to access clipboard")?;
            Ok(Self { inner })
        }
    }

    impl Clipboard for SystemClipboard {
        fn set_text(&mut self, text: &str) -> Result<()> {
            self.inner
                .set_text(text.to_string())
                .context("Failed to write to clipboard")
        }
    }
}

/// In-memory clipboard, used when no system clipboard is available
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CopyLine {
    Heading,
    List,
    Code,
    /// The line right after a closing fence
    CodeEnd,
    Quote,
    Table,
    Text,
    Empty,
}

/// Reinsert blank lines around headings, lists, code fences, quotes and
/// tables. Existing blank lines are kept and never doubled; runs of the same
/// kind (consecutive list items, lines inside one fence) stay together.
pub fn format_for_copy(content: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut prev: Option<CopyLine> = None;
    let mut in_fence = false;

    for line in content.split('\n') {
        let trimmed = line.trim();
        let (kind, next_prev) = if in_fence {
            if trimmed.starts_with("```") {
                in_fence = false;
                (CopyLine::Code, CopyLine::CodeEnd)
            } else {
                (CopyLine::Code, CopyLine::Code)
            }
        } else {
            let kind = if trimmed.is_empty() {
                CopyLine::Empty
            } else if heading_level(trimmed).is_some() {
                CopyLine::Heading
            } else if trimmed.starts_with("```") {
                in_fence = true;
                CopyLine::Code
            } else if is_list_line(line) {
                CopyLine::List
            } else if trimmed.starts_with('>') {
                CopyLine::Quote
            } else if trimmed.starts_with('|') {
                CopyLine::Table
            } else {
                CopyLine::Text
            };
            (kind, kind)
        };

        if let Some(p) = prev {
            if p != CopyLine::Empty && kind != CopyLine::Empty && p != kind {
                out.push("");
            }
        }
        out.push(line);
        prev = Some(next_prev);
    }

    out.join("\n")
}

/// Copy the whole document, formatted. Returns the text written.
pub fn copy_document(session: &EditorSession, clipboard: &mut dyn Clipboard) -> Result<String> {
    let text = format_for_copy(session.content());
    clipboard.set_text(&text)?;
    log::debug!("copied document ({} bytes)", text.len());
    Ok(text)
}

/// Copy a heading's section as-is. `None` when the block is not a heading.
pub fn copy_section(
    session: &EditorSession,
    block_id: &str,
    clipboard: &mut dyn Clipboard,
) -> Result<Option<String>> {
    let Some(text) = session.section_text(block_id) else {
        return Ok(None);
    };
    clipboard.set_text(&text)?;
    log::debug!("copied section {}", block_id);
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_blank_lines_around_blocks() {
        let input = "# Title\nIntro\n- a\n- b\nAfter\n> quote\n| a |\n| - |\nEnd";
        assert_eq!(
            format_for_copy(input),
            "# Title\n\nIntro\n\n- a\n- b\n\nAfter\n\n> quote\n\n| a |\n| - |\n\nEnd"
        );
    }

    #[test]
    fn test_existing_blank_lines_not_doubled() {
        let input = "# Title\n\nText\n\n- item";
        assert_eq!(format_for_copy(input), input);
    }

    #[test]
    fn test_consecutive_headings_and_text_stay_together() {
        assert_eq!(format_for_copy("# A\n## B"), "# A\n## B");
        assert_eq!(format_for_copy("one\ntwo"), "one\ntwo");
    }

    #[test]
    fn test_code_fence_kept_intact() {
        let input = "Text\n```rust\n# not a heading\n- not a list\n```\nMore";
        assert_eq!(
            format_for_copy(input),
            "Text\n\n```rust\n# not a heading\n- not a list\n```\n\nMore"
        );
    }

    #[test]
    fn test_adjacent_fences_separated() {
        let input = "```\na\n```\n```\nb\n```";
        assert_eq!(format_for_copy(input), "```\na\n```\n\n```\nb\n```");
    }

    #[test]
    fn test_copy_document_and_section() -> Result<()> {
        let session = EditorSession::new("# A\ntext\n# B\nmore", &Config::default());
        let mut clipboard = MemoryClipboard::default();

        let copied = copy_document(&session, &mut clipboard)?;
        assert_eq!(copied, "# A\n\ntext\n\n# B\n\nmore");
        assert_eq!(clipboard.contents.as_deref(), Some(copied.as_str()));

        let section = copy_section(&session, "block-0", &mut clipboard)?;
        assert_eq!(section.as_deref(), Some("# A\ntext"));
        assert_eq!(clipboard.contents.as_deref(), Some("# A\ntext"));

        assert_eq!(copy_section(&session, "block-1", &mut clipboard)?, None);
        Ok(())
    }

    struct Failing;

    impl Clipboard for Failing {
        fn set_text(&mut self, _text: &str) -> Result<()> {
            anyhow::bail!("no clipboard")
        }
    }

    #[test]
    fn test_clipboard_errors_propagate() {
        let session = EditorSession::new("text", &Config::default());
        assert!(copy_document(&session, &mut Failing).is_err());
    }
}
