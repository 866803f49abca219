//! Link preview data and card markup

use std::sync::LazyLock;

use regex::Regex;

use super::LinkPreviewRenderer;

static LINK_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]+)\]\((https?://[^)]+)\)$").expect("valid link regex")
});

/// Page metadata shown under a link-only block. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPreview {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub site_name: Option<String>,
    pub favicon: Option<String>,
}

impl LinkPreview {
    pub fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }
}

/// URL of a block whose trimmed content is exactly one `[text](http...)` link
pub fn link_only_url(content: &str) -> Option<&str> {
    LINK_ONLY
        .captures(content.trim())
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
}

/// Host part of a URL, or the URL itself when it does not parse
pub fn hostname(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

fn escape(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Card and skeleton markup
#[derive(Debug, Default)]
pub struct CardRenderer;

impl LinkPreviewRenderer for CardRenderer {
    fn render_loading(&self, url: &str) -> String {
        format!(
            "<div class=\"link-preview-card link-preview-loading\">\
             <div class=\"link-preview-content\">\
             <div class=\"link-preview-title-skeleton\"></div>\
             <div class=\"link-preview-description-skeleton\"></div>\
             <div class=\"link-preview-site\">\
             <div class=\"link-preview-favicon-skeleton\"></div>\
             <span>{}</span></div></div></div>",
            escape(&hostname(url))
        )
    }

    fn render_card(&self, url: &str, preview: &LinkPreview) -> String {
        let title = preview
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .map_or_else(|| escape(url), escape);
        let site = preview
            .site_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .map_or_else(|| escape(&hostname(url)), escape);

        let mut html = format!(
            "<a href=\"{}\" class=\"link-preview-card\" target=\"_blank\" rel=\"noopener noreferrer\">",
            escape(url)
        );
        html.push_str("<div class=\"link-preview-content\">");
        html.push_str(&format!("<div class=\"link-preview-title\">{}</div>", title));

        if let Some(description) = preview.description.as_deref().filter(|d| !d.is_empty()) {
            html.push_str(&format!(
                "<div class=\"link-preview-description\">{}</div>",
                escape(description)
            ));
        }

        html.push_str("<div class=\"link-preview-site\">");
        if let Some(favicon) = preview.favicon.as_deref().filter(|f| !f.is_empty()) {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"\" class=\"link-preview-favicon\" />",
                escape(favicon)
            ));
        }
        html.push_str(&format!("<span>{}</span>", site));
        html.push_str("</div></div></a>");
        html
    }
}
