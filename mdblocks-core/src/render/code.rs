//! Fenced code blocks: parsing and syntax highlighting

use std::num::NonZeroUsize;
use std::sync::LazyLock;

use log::warn;
use lru::LruCache;
use regex::Regex;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use super::CodeBlockRenderer;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^```(\w*)\n?([\s\S]*?)```$").expect("valid code fence regex")
});

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hljs-" };

/// A parsed fenced code block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBlock {
    pub lang: String,
    pub code: String,
}

/// Extract language and body from a closed fence. The single trailing newline
/// before the closing fence is not part of the code.
pub fn parse_code_block(content: &str) -> Option<CodeBlock> {
    let caps = CODE_FENCE.captures(content)?;
    let lang = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let body = caps.get(2).map_or("", |m| m.as_str());
    let code = body.strip_suffix('\n').unwrap_or(body).to_string();
    Some(CodeBlock { lang, code })
}

/// Canonical name and file extension for a fence language tag.
///
/// Only the languages listed here are highlighted directly; anything else goes
/// through detection.
pub fn canonical_language(lang: &str) -> Option<(&'static str, &'static str)> {
    let lang = lang.to_lowercase();
    let entry = match lang.as_str() {
        "javascript" | "js" => ("javascript", "js"),
        "typescript" | "ts" => ("typescript", "ts"),
        "python" | "py" => ("python", "py"),
        "rust" => ("rust", "rs"),
        "go" => ("go", "go"),
        "java" => ("java", "java"),
        "c" => ("c", "c"),
        "cpp" => ("cpp", "cpp"),
        "csharp" | "cs" => ("csharp", "cs"),
        "php" => ("php", "php"),
        "ruby" | "rb" => ("ruby", "rb"),
        "swift" => ("swift", "swift"),
        "kotlin" => ("kotlin", "kt"),
        "html" | "xml" => ("xml", "xml"),
        "css" => ("css", "css"),
        "scss" => ("scss", "scss"),
        "json" => ("json", "json"),
        "yaml" | "yml" => ("yaml", "yaml"),
        "markdown" | "md" => ("markdown", "md"),
        "sql" => ("sql", "sql"),
        "bash" | "sh" | "shell" => ("bash", "sh"),
        "dockerfile" | "docker" => ("dockerfile", "Dockerfile"),
        _ => return None,
    };
    Some(entry)
}

fn find_syntax(lang: &str) -> Option<&'static SyntaxReference> {
    let (name, extension) = canonical_language(lang)?;
    SYNTAX_SET
        .find_syntax_by_extension(extension)
        .or_else(|| SYNTAX_SET.find_syntax_by_token(name))
}

/// Guess the syntax from the first line (shebangs, `<?php`, `<?xml`, ...)
fn detect_syntax(code: &str) -> Option<&'static SyntaxReference> {
    let first_line = code.lines().next()?;
    SYNTAX_SET.find_syntax_by_first_line(first_line)
}

/// Highlight `code` into class-annotated HTML spans.
///
/// Falls back to escaped text when the language is unknown and cannot be
/// detected, or when highlighting fails.
pub fn highlight(code: &str, lang: &str) -> String {
    let Some(syntax) = find_syntax(lang).or_else(|| detect_syntax(code)) else {
        return escape_code(code);
    };

    match highlight_with(syntax, code) {
        Ok(html) => html,
        Err(e) => {
            warn!("Highlighting {} code failed: {}", syntax.name, e);
            escape_code(code)
        }
    }
}

fn highlight_with(syntax: &SyntaxReference, code: &str) -> Result<String, syntect::Error> {
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

fn escape_code(code: &str) -> String {
    html_escape::encode_quoted_attribute(code).into_owned()
}

/// Wrap highlighted code in the block wrapper with an optional language label
pub fn code_block_html(lang: &str, highlighted: &str) -> String {
    let label = if lang.is_empty() {
        String::new()
    } else {
        format!(
            "<div class=\"code-lang-label\">{}</div>",
            html_escape::encode_text(lang)
        )
    };
    format!(
        "<div class=\"code-block-wrapper\">{}<pre class=\"hljs\"><code>{}</code></pre></div>",
        label, highlighted
    )
}

/// Syntax highlighting backed by syntect, memoized per (language, code)
pub struct SyntectRenderer {
    cache: LruCache<(String, String), String>,
}

impl SyntectRenderer {
    pub fn new(cache_size: usize) -> Self {
        let size = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(size),
        }
    }
}

impl Default for SyntectRenderer {
    fn default() -> Self {
        Self::new(128)
    }
}

impl CodeBlockRenderer for SyntectRenderer {
    fn render_code(&mut self, lang: &str, code: &str) -> String {
        let key = (lang.to_string(), code.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return code_block_html(lang, hit);
        }
        let highlighted = highlight(code, lang);
        let html = code_block_html(lang, &highlighted);
        self.cache.put(key, highlighted);
        html
    }
}
