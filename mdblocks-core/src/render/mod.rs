//! Per-block HTML rendering with a render cache keyed by block id
//!
//! Dispatch, first match wins: empty placeholder, fenced code, checklist,
//! general Markdown. Link-only blocks then get a preview card or a loading
//! skeleton appended.

pub mod checklist;
pub mod code;
pub mod markdown;
pub mod preview;

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::block::Block;
use crate::classify::classify;
use crate::config::RenderConfig;

pub use preview::{link_only_url, LinkPreview};

/// Shown for empty blocks and for cache misses
pub const EMPTY_PLACEHOLDER: &str = "<p class=\"empty-line\"><br></p>";

/// Renders the body of a closed code fence
pub trait CodeBlockRenderer {
    fn render_code(&mut self, lang: &str, code: &str) -> String;
}

/// Renders a checklist block, or declines with `None`
pub trait ChecklistRenderer {
    fn render_checklist(&self, block_id: &str, content: &str) -> Option<String>;
}

/// Renders the card appended under link-only blocks
pub trait LinkPreviewRenderer {
    fn render_loading(&self, url: &str) -> String;
    fn render_card(&self, url: &str, preview: &LinkPreview) -> String;
}

/// The pluggable sub-renderers used by [`BlockRenderer`]
pub struct BlockRenderers {
    pub code: Box<dyn CodeBlockRenderer>,
    pub checklist: Box<dyn ChecklistRenderer>,
    pub link_preview: Box<dyn LinkPreviewRenderer>,
}

impl BlockRenderers {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            code: Box::new(code::SyntectRenderer::new(config.highlight_cache_size)),
            checklist: Box::new(checklist::DefaultChecklistRenderer {
                allow_raw_html: config.allow_raw_html,
            }),
            link_preview: Box::new(preview::CardRenderer),
        }
    }
}

impl Default for BlockRenderers {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

/// Block renderer plus the state it depends on: rendered HTML per block id,
/// fetched link previews and the URLs still loading
pub struct BlockRenderer {
    renderers: BlockRenderers,
    allow_raw_html: bool,
    cache: HashMap<String, String>,
    link_previews: HashMap<String, LinkPreview>,
    loading_urls: HashSet<String>,
}

impl BlockRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self::with_renderers(config, BlockRenderers::from_config(config))
    }

    pub fn with_renderers(config: &RenderConfig, renderers: BlockRenderers) -> Self {
        Self {
            renderers,
            allow_raw_html: config.allow_raw_html,
            cache: HashMap::new(),
            link_previews: HashMap::new(),
            loading_urls: HashSet::new(),
        }
    }

    /// Render one block into the cache
    pub fn render(&mut self, block: &Block) {
        let html = self.render_html(&block.id, &block.content);
        self.cache.insert(block.id.clone(), html);
    }

    /// Render every block, dropping cache entries for ids that no longer exist
    pub fn render_all(&mut self, blocks: &[Block]) {
        self.cache
            .retain(|id, _| blocks.iter().any(|block| &block.id == id));
        for block in blocks {
            self.render(block);
        }
        debug!("rendered {} blocks", blocks.len());
    }

    /// Cached HTML for a block, or the empty placeholder
    pub fn rendered(&self, block: &Block) -> &str {
        self.cache
            .get(&block.id)
            .map(String::as_str)
            .unwrap_or(EMPTY_PLACEHOLDER)
    }

    /// Render content without touching the cache
    pub fn render_html(&mut self, block_id: &str, content: &str) -> String {
        if content.trim().is_empty() {
            return EMPTY_PLACEHOLDER.to_string();
        }

        if let Some(code) = code::parse_code_block(content) {
            return self.renderers.code.render_code(&code.lang, &code.code);
        }

        if let Some(html) = self.renderers.checklist.render_checklist(block_id, content) {
            return html;
        }

        let mut html = markdown::render_markdown(content, self.allow_raw_html);

        if let Some(url) = link_only_url(content) {
            if self.loading_urls.contains(url) {
                html.push_str(&self.renderers.link_preview.render_loading(url));
            } else if let Some(preview) = self.link_previews.get(url) {
                if preview.description.is_some() {
                    html.push_str(&self.renderers.link_preview.render_card(url, preview));
                }
            }
        }

        html
    }

    pub fn mark_loading(&mut self, url: &str) {
        self.loading_urls.insert(url.to_string());
    }

    pub fn clear_loading(&mut self, url: &str) {
        self.loading_urls.remove(url);
    }

    pub fn is_loading(&self, url: &str) -> bool {
        self.loading_urls.contains(url)
    }

    pub fn insert_preview(&mut self, preview: LinkPreview) {
        self.link_previews.insert(preview.url.clone(), preview);
    }

    pub fn preview(&self, url: &str) -> Option<&LinkPreview> {
        self.link_previews.get(url)
    }

    /// Standalone fragment: every block wrapped with its id and type
    pub fn export_html(&self, blocks: &[Block]) -> String {
        blocks
            .iter()
            .map(|block| {
                format!(
                    "<div class=\"block\" data-block-id=\"{}\" data-block-type=\"{}\">{}</div>",
                    block.id,
                    classify(&block.content),
                    self.rendered(block)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Drop all cached state, used when the document is replaced
    pub fn clear(&mut self) {
        self.cache.clear();
        self.link_previews.clear();
        self.loading_urls.clear();
    }
}
