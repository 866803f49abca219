//! General Markdown to HTML conversion for blocks without a dedicated renderer

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Raw HTML in the source is shown as text unless explicitly allowed
fn neutralize_html(event: Event<'_>, allow_raw_html: bool) -> Event<'_> {
    if allow_raw_html {
        return event;
    }
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    }
}

/// Render a whole block of Markdown
pub fn render_markdown(content: &str, allow_raw_html: bool) -> String {
    let parser = Parser::new_ext(content, parser_options())
        .map(|event| neutralize_html(event, allow_raw_html));
    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render inline Markdown only (emphasis, code spans, links).
///
/// Text that would parse as a block construct (a heading, a nested list, a
/// quote) is kept literally instead.
pub fn render_inline(text: &str, allow_raw_html: bool) -> String {
    let mut events: Vec<Event<'_>> = Vec::new();

    for event in Parser::new_ext(text, parser_options()) {
        match event {
            Event::Start(Tag::Paragraph) | Event::End(TagEnd::Paragraph) => {}
            Event::Start(_) | Event::End(_) if is_block_event(&event) => {
                return html_escape::encode_text(text).into_owned();
            }
            Event::SoftBreak | Event::HardBreak => events.push(Event::Text(CowStr::Borrowed(" "))),
            other => events.push(neutralize_html(other, allow_raw_html)),
        }
    }

    let mut out = String::with_capacity(text.len());
    html::push_html(&mut out, events.into_iter());
    out
}

fn is_block_event(event: &Event<'_>) -> bool {
    match event {
        Event::Start(tag) => !matches!(
            tag,
            Tag::Emphasis
                | Tag::Strong
                | Tag::Strikethrough
                | Tag::Link { .. }
                | Tag::Image { .. }
        ),
        Event::End(tag) => !matches!(
            tag,
            TagEnd::Emphasis
                | TagEnd::Strong
                | TagEnd::Strikethrough
                | TagEnd::Link
                | TagEnd::Image
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_levels() {
        assert!(render_markdown("# Heading", false).contains("<h1>Heading</h1>"));
        assert!(render_markdown("### Three", false).contains("<h3>Three</h3>"));
    }

    #[test]
    fn test_paragraph() {
        assert_eq!(render_markdown("Paragraph", false), "<p>Paragraph</p>\n");
    }

    #[test]
    fn test_lists_quotes_tables() {
        let list = render_markdown("- a\n  - b", false);
        assert!(list.contains("<ul>"));
        assert!(list.matches("<li>").count() == 2);

        let quote = render_markdown("> q\n>> nested", false);
        assert!(quote.matches("<blockquote>").count() == 2);

        let table = render_markdown("| a | b |\n| --- | --- |\n| 1 | 2 |", false);
        assert!(table.contains("<table>"));
        assert!(table.contains("<td>2</td>"));
    }

    #[test]
    fn test_raw_html_is_escaped_by_default() {
        let html = render_markdown("<script>alert(1)</script>", false);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));

        let allowed = render_markdown("<em>ok</em> text", true);
        assert!(allowed.contains("<em>ok</em>"));
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(
            render_inline("**bold** and *it* and `code`", false),
            "<strong>bold</strong> and <em>it</em> and <code>code</code>"
        );
        assert_eq!(
            render_inline("[site](https://example.com)", false),
            "<a href=\"https://example.com\">site</a>"
        );
    }

    #[test]
    fn test_inline_keeps_block_syntax_literal() {
        assert_eq!(render_inline("# not a heading", false), "# not a heading");
        assert_eq!(render_inline("a < b", false), "a &lt; b");
    }
}
