//! Terminal rendering of blocks, cached by content and theme

use lru::LruCache;
use mdblocks_core::classify::{checklist_marker, classify, BlockType};
use mdblocks_core::config::ThemeVariant;
use mdblocks_core::render::preview::hostname;
use mdblocks_core::render::{link_only_url, BlockRenderer};
use ratatui::text::{Line, Span};
use std::num::NonZeroUsize;

use crate::theme::Theme;

const CACHE_SIZE: usize = 256;

/// Key for render cache
#[derive(Hash, PartialEq, Eq, Clone, Debug)]
pub struct RenderKey {
    pub content: String,
    pub theme: ThemeVariant,
}

/// LRU cache of rendered block lines
pub struct RendererCache {
    cache: LruCache<RenderKey, Vec<Line<'static>>>,
}

impl RendererCache {
    pub fn new() -> Self {
        let size = NonZeroUsize::new(CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(size),
        }
    }

    /// Lines for a block that is not being edited
    pub fn lines(&mut self, content: &str, variant: ThemeVariant, theme: &Theme) -> Vec<Line<'static>> {
        let key = RenderKey {
            content: content.to_string(),
            theme: variant,
        };
        if let Some(lines) = self.cache.get(&key) {
            return lines.clone();
        }
        let lines = render_block(content, theme);
        self.cache.put(key, lines.clone());
        lines
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RendererCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Styled terminal lines for one block
pub fn render_block(content: &str, theme: &Theme) -> Vec<Line<'static>> {
    match classify(content) {
        BlockType::Empty => vec![Line::default()],
        BlockType::Checklist => checklist_lines(content, theme),
        BlockType::CodeBlock => content
            .split('\n')
            .map(|line| Line::from(Span::styled(line.to_string(), theme.code)))
            .collect(),
        _ => markdown_lines(content),
    }
}

fn checklist_lines(content: &str, theme: &Theme) -> Vec<Line<'static>> {
    content
        .split('\n')
        .map(|line| {
            let trimmed = line.trim_start();
            let indent = &line[..line.len() - trimmed.len()];
            match checklist_marker(trimmed) {
                Some((_, checked, marker_len)) => {
                    let (box_str, text_style) = if checked {
                        ("[x] ", theme.checklist_done)
                    } else {
                        ("[ ] ", theme.base)
                    };
                    Line::from(vec![
                        Span::raw(indent.to_string()),
                        Span::styled(box_str, theme.checkbox),
                        Span::styled(trimmed[marker_len..].to_string(), text_style),
                    ])
                }
                None => Line::from(Span::styled(line.to_string(), theme.base)),
            }
        })
        .collect()
}

/// General Markdown through tui-markdown, copied into owned lines
fn markdown_lines(content: &str) -> Vec<Line<'static>> {
    let text = tui_markdown::from_str(content);
    let lines: Vec<Line<'static>> = text
        .lines
        .iter()
        .map(|line| {
            let spans: Vec<Span<'static>> = line
                .spans
                .iter()
                .map(|span| Span::styled(span.content.to_string(), span.style))
                .collect();
            Line::from(spans).style(line.style)
        })
        .collect();

    if lines.is_empty() {
        vec![Line::from(content.to_string())]
    } else {
        lines
    }
}

/// Preview card or loading line under a link-only block
pub fn preview_lines(content: &str, renderer: &BlockRenderer, theme: &Theme) -> Vec<Line<'static>> {
    let Some(url) = link_only_url(content) else {
        return Vec::new();
    };

    if renderer.is_loading(url) {
        return vec![Line::from(Span::styled(
            format!("  ~ loading preview for {}", hostname(url)),
            theme.preview_loading,
        ))];
    }

    let Some(preview) = renderer.preview(url) else {
        return Vec::new();
    };
    let Some(description) = preview.description.as_deref() else {
        return Vec::new();
    };

    let site = preview
        .site_name
        .clone()
        .unwrap_or_else(|| hostname(url));
    let title = preview.title.as_deref().unwrap_or(url);
    vec![
        Line::from(Span::styled(format!("  > {} ({})", title, site), theme.preview)),
        Line::from(Span::styled(format!("    {}", description), theme.preview)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdblocks_core::config::RenderConfig;
    use mdblocks_core::render::LinkPreview;

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_checklist_lines() {
        let theme = Theme::dark();
        let lines = render_block("- [ ] todo\n  - [x] done", &theme);
        assert_eq!(text_of(&lines), vec!["[ ] todo", "  [x] done"]);
        assert_eq!(lines[1].spans[2].style, theme.checklist_done);
    }

    #[test]
    fn test_code_and_empty_lines() {
        let theme = Theme::dark();
        let lines = render_block("```rust\nlet x = 1;\n```", &theme);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].spans[0].style, theme.code);
        assert_eq!(render_block("", &theme).len(), 1);
    }

    #[test]
    fn test_markdown_text_survives() {
        let theme = Theme::dark();
        let lines = render_block("Some **bold** text", &theme);
        let joined = text_of(&lines).join("");
        assert!(joined.contains("bold"));
        assert!(joined.contains("Some"));
    }

    #[test]
    fn test_cache_reuses_entries() {
        let theme = Theme::dark();
        let mut cache = RendererCache::new();
        cache.lines("# Title", ThemeVariant::Dark, &theme);
        cache.lines("# Title", ThemeVariant::Dark, &theme);
        assert_eq!(cache.len(), 1);
        cache.lines("# Title", ThemeVariant::Light, &Theme::light());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_preview_lines() {
        let theme = Theme::dark();
        let mut renderer = BlockRenderer::new(&RenderConfig::default());
        let content = "[Docs](https://docs.rs)";
        assert!(preview_lines(content, &renderer, &theme).is_empty());

        renderer.mark_loading("https://docs.rs");
        let loading = text_of(&preview_lines(content, &renderer, &theme));
        assert_eq!(loading, vec!["  ~ loading preview for docs.rs"]);

        renderer.clear_loading("https://docs.rs");
        renderer.insert_preview(LinkPreview {
            title: Some("Docs.rs".to_string()),
            description: Some("Rust documentation".to_string()),
            ..LinkPreview::empty("https://docs.rs")
        });
        let card = text_of(&preview_lines(content, &renderer, &theme));
        assert_eq!(card, vec!["  > Docs.rs (docs.rs)", "    Rust documentation"]);
        assert!(preview_lines("plain text", &renderer, &theme).is_empty());
    }
}
