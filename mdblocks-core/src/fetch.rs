//! Link preview fetching
//!
//! Metadata is scraped from the page HTML with a handful of patterns (Open
//! Graph and plain meta tags, `<title>`, icon links). Fetches run on a
//! background worker thread; the editor polls for finished results.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::LinkPreviewConfig;
use crate::render::LinkPreview;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title[^>]*>([\s\S]*?)</title>").expect("valid title regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static ICON_REL_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link[^>]*rel=["'](?:shortcut )?icon["'][^>]*href=["']([^"']+)["']"#)
        .expect("valid icon regex")
});
static ICON_HREF_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link[^>]*href=["']([^"']+)["'][^>]*rel=["'](?:shortcut )?icon["']"#)
        .expect("valid icon regex")
});

static META_KEY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*(?:property|name)=["']([^"']+)["'][^>]*content=["']([^"']+)["']"#)
        .expect("valid meta regex")
});
static META_CONTENT_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*content=["']([^"']+)["'][^>]*(?:property|name)=["']([^"']+)["']"#)
        .expect("valid meta regex")
});

/// Outcome of one fetch. `preview` is `None` when anything went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResult {
    pub url: String,
    pub preview: Option<LinkPreview>,
}

/// Source of link previews. Requests are fire-and-forget; results are
/// collected by polling.
pub trait PreviewFetcher {
    fn request(&mut self, url: &str);
    fn try_recv(&mut self) -> Option<PreviewResult>;
}

/// Fetcher used when previews are disabled: every request fails immediately
#[derive(Debug, Default)]
pub struct OfflineFetcher {
    done: VecDeque<String>,
}

impl PreviewFetcher for OfflineFetcher {
    fn request(&mut self, url: &str) {
        self.done.push_back(url.to_string());
    }

    fn try_recv(&mut self) -> Option<PreviewResult> {
        self.done.pop_front().map(|url| PreviewResult { url, preview: None })
    }
}

/// Fetcher for a session: a background worker when previews are enabled and
/// the `fetch` feature is built, otherwise [`OfflineFetcher`]
pub fn default_fetcher(config: &LinkPreviewConfig) -> Box<dyn PreviewFetcher> {
    #[cfg(feature = "fetch")]
    if config.enabled {
        return Box::new(PreviewWorker::spawn(config.clone()));
    }
    #[cfg(not(feature = "fetch"))]
    let _ = config;
    log::debug!("link previews disabled");
    Box::new(OfflineFetcher::default())
}

/// Pull preview fields out of a page
pub fn extract_metadata(html: &str, page_url: &str) -> LinkPreview {
    let html_title = TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| WHITESPACE.replace_all(m.as_str(), " ").trim().to_string());

    let title = meta_content(html, "og:title").or(html_title);
    let description = meta_content(html, "og:description").or_else(|| meta_content(html, "description"));
    let image = meta_content(html, "og:image").and_then(|src| resolve_url(page_url, &src));
    let site_name = meta_content(html, "og:site_name");
    let favicon = ICON_REL_FIRST
        .captures(html)
        .or_else(|| ICON_HREF_FIRST.captures(html))
        .and_then(|caps| caps.get(1))
        .and_then(|m| resolve_url(page_url, m.as_str()));

    LinkPreview {
        url: page_url.to_string(),
        title: non_empty(title.map(decode)),
        description: non_empty(description.map(decode)),
        image: non_empty(image),
        site_name: non_empty(site_name.map(decode)),
        favicon: non_empty(favicon),
    }
}

/// `content` of a `<meta property=...>` or `<meta name=...>` tag, in either
/// attribute order
fn meta_content(html: &str, key: &str) -> Option<String> {
    let key_first = META_KEY_FIRST
        .captures_iter(html)
        .filter_map(|caps| Some((caps.get(1)?, caps.get(2)?)));
    let content_first = META_CONTENT_FIRST
        .captures_iter(html)
        .filter_map(|caps| Some((caps.get(2)?, caps.get(1)?)));
    key_first
        .chain(content_first)
        .find(|(name, _)| name.as_str().eq_ignore_ascii_case(key))
        .map(|(_, content)| content.as_str().trim().to_string())
}

/// Make an image or icon reference absolute against the page origin
pub fn resolve_url(page_url: &str, href: &str) -> Option<String> {
    if href.starts_with("http") {
        return Some(href.to_string());
    }
    let page = url::Url::parse(page_url).ok()?;
    let origin = page.origin().ascii_serialization();
    let resolved = if href.starts_with("//") {
        format!("{}:{}", page.scheme(), href)
    } else if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin, href)
    };
    Some(resolved)
}

fn decode(text: String) -> String {
    html_escape::decode_html_entities(&text).into_owned()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(feature = "fetch")]
pub use worker::{fetch_preview, PreviewWorker};

#[cfg(feature = "fetch")]
mod worker {
    use anyhow::{Context, Result};
    use crossbeam_channel::{Receiver, Sender};
    use log::{info, warn};
    use std::thread;

    use super::{extract_metadata, PreviewFetcher, PreviewResult};
    use crate::config::LinkPreviewConfig;
    use crate::render::LinkPreview;

    const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

    /// Fetch a page and extract its preview metadata (blocking)
    pub fn fetch_preview(url: &str, config: &LinkPreviewConfig) -> Result<LinkPreview> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to build HTTP client")?;

        let response = client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad response from {}", url))?;

        let body = response
            .text()
            .with_context(|| format!("Failed to read body of {}", url))?;

        Ok(extract_metadata(&body, url))
    }

    /// Preview fetcher handle backed by a worker thread
    pub struct PreviewWorker {
        request_tx: Sender<String>,
        result_rx: Receiver<PreviewResult>,
        _worker_thread: thread::JoinHandle<()>,
    }

    impl PreviewWorker {
        /// Spawn a new fetch worker thread
        pub fn spawn(config: LinkPreviewConfig) -> Self {
            let (request_tx, request_rx) = crossbeam_channel::unbounded();
            let (result_tx, result_rx) = crossbeam_channel::unbounded();

            let worker_thread = thread::spawn(move || {
                worker_loop(request_rx, result_tx, config);
            });

            Self {
                request_tx,
                result_rx,
                _worker_thread: worker_thread,
            }
        }
    }

    impl PreviewFetcher for PreviewWorker {
        fn request(&mut self, url: &str) {
            let _ = self.request_tx.send(url.to_string());
        }

        fn try_recv(&mut self) -> Option<PreviewResult> {
            self.result_rx.try_recv().ok()
        }
    }

    /// Worker thread main loop, exits once the handle is dropped
    fn worker_loop(
        request_rx: Receiver<String>,
        result_tx: Sender<PreviewResult>,
        config: LinkPreviewConfig,
    ) {
        while let Ok(url) = request_rx.recv() {
            let preview = match fetch_preview(&url, &config) {
                Ok(preview) => {
                    info!("fetched link preview for {}", url);
                    Some(preview)
                }
                Err(e) => {
                    warn!("link preview for {} failed: {:#}", url, e);
                    None
                }
            };
            if result_tx.send(PreviewResult { url, preview }).is_err() {
                break;
            }
        }
    }

}
