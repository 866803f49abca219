//! UI rendering

use crate::app::App;
use crate::render::preview_lines;
use mdblocks_core::classify::classify;
use mdblocks_core::config::ThemeVariant;
use mdblocks_core::Surface;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Marker column plus one space
const GUTTER_WIDTH: u16 = 2;

/// Draw the UI
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Blocks
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_blocks(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);

    if app.show_help {
        render_help(frame, app, frame.area());
    }
}

/// Lines of one block as shown in the document view
fn block_lines(app: &mut App, index: usize) -> Vec<Line<'static>> {
    let Some(content) = app.session.blocks().get(index).map(|b| b.content.clone()) else {
        return Vec::new();
    };

    if app.session.editing_index() == Some(index) {
        let surface = app.session.surface().unwrap_or(Surface::caret(content.len()));
        return edit_lines(&content, surface, app.theme.editing);
    }

    let mut lines = app
        .render_cache
        .lines(&content, app.theme_variant, &app.theme);
    lines.extend(preview_lines(&content, app.session.renderer(), &app.theme));
    lines
}

/// Raw source of the edited block with the selection reversed
fn edit_lines(content: &str, surface: Surface, style: Style) -> Vec<Line<'static>> {
    let selected = style.add_modifier(Modifier::REVERSED);
    let mut offset = 0;
    content
        .split('\n')
        .map(|line| {
            let start = offset;
            let end = start + line.len();
            offset = end + 1;

            let sel_start = surface.start.clamp(start, end) - start;
            let sel_end = surface.end.clamp(start, end) - start;
            if surface.is_collapsed() || sel_start == sel_end {
                return Line::from(Span::styled(line.to_string(), style));
            }
            Line::from(vec![
                Span::styled(line[..sel_start].to_string(), style),
                Span::styled(line[sel_start..sel_end].to_string(), selected),
                Span::styled(line[sel_end..].to_string(), style),
            ])
        })
        .collect()
}

/// Row and display column of a byte offset inside block content
pub fn cursor_position(content: &str, cursor: usize) -> (usize, usize) {
    let cursor = cursor.min(content.len());
    let before = content.get(..cursor).unwrap_or(content);
    let row = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (row, before[line_start..].width())
}

/// Keep the focused block on screen
fn adjust_scroll(app: &mut App, heights: &[usize], viewport: usize) {
    let Some(last) = heights.len().checked_sub(1) else {
        app.scroll = 0;
        return;
    };
    let focus = app.focus_index().min(last);
    if focus < app.scroll {
        app.scroll = focus;
    }
    while app.scroll < focus && heights[app.scroll..=focus].iter().sum::<usize>() > viewport {
        app.scroll += 1;
    }
    app.scroll = app.scroll.min(last);
}

fn render_blocks(frame: &mut Frame, app: &mut App, area: Rect) {
    let viewport = area.height as usize;
    let count = app.session.blocks().len();
    let rendered: Vec<Vec<Line<'static>>> = (0..count).map(|i| block_lines(app, i)).collect();
    let heights: Vec<usize> = rendered.iter().map(Vec::len).collect();
    adjust_scroll(app, &heights, viewport);

    let editing = app.session.editing_index();
    let (_, drop_target) = app.session.drag_state();
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut cursor = None;

    for (index, block) in rendered.into_iter().enumerate().skip(app.scroll) {
        if lines.len() >= viewport {
            break;
        }

        let (marker, marker_style) = if editing == Some(index) {
            ("▌", app.theme.gutter_editing)
        } else if index == app.selected && editing.is_none() {
            ("▌", app.theme.gutter_selected)
        } else if drop_target == Some(index) {
            ("─", app.theme.gutter_selected)
        } else {
            (" ", app.theme.gutter)
        };

        if editing == Some(index) {
            if let (Some(surface), Some(content)) = (
                app.session.surface(),
                app.session.editing_block().map(|b| b.content.as_str()),
            ) {
                let (row, col) = cursor_position(content, surface.cursor());
                cursor = Some((lines.len() + row, col));
            }
        }

        for (i, line) in block.into_iter().enumerate() {
            let mark = if i == 0 { marker } else { " " };
            let mut spans = vec![Span::styled(format!("{} ", mark), marker_style)];
            spans.extend(line.spans);
            lines.push(Line::from(spans).style(line.style));
        }
    }

    let paragraph = Paragraph::new(lines).style(app.theme.base);
    frame.render_widget(paragraph, area);

    if let Some((row, col)) = cursor {
        if row < viewport {
            let max_x = area.x + area.width.saturating_sub(1);
            let x = (area.x + GUTTER_WIDTH).saturating_add(col as u16).min(max_x);
            frame.set_cursor_position((x, area.y + row as u16));
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let name = app.doc.display_name();
    let modified = if app.session.is_modified() { " [+]" } else { "" };
    let mode = if app.is_editing() { "EDIT" } else { "BROWSE" };

    let blocks = app.session.blocks();
    let focus = app.focus_index();
    let block_type = blocks
        .get(focus)
        .map(|b| classify(&b.content).as_str())
        .unwrap_or("empty");

    let theme_str = match app.theme_variant {
        ThemeVariant::Dark => "DARK",
        ThemeVariant::Light => "LIGHT",
    };

    let status_text = format!(
        " mdblocks  {}{}  [{}]  block {}/{}  {}  [{}] ",
        name,
        modified,
        mode,
        focus + 1,
        blocks.len(),
        block_type,
        theme_str
    );

    let mut spans = vec![Span::styled(
        status_text,
        Style::default()
            .fg(app.theme.status_bar_fg)
            .bg(app.theme.status_bar_bg)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(notification) = &app.notification {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!(" {} ", notification.message),
            app.theme.notification,
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

const HELP: &[(&str, &str)] = &[
    ("j/k, arrows", "select block"),
    ("g/G", "first/last block"),
    ("Enter, a / i", "edit at end / start"),
    ("o", "new block below"),
    ("d", "delete block"),
    ("J/K", "move block down/up"),
    ("x", "toggle checklist item"),
    ("y / Y", "copy document / section"),
    ("u, Ctrl-R", "undo / redo"),
    ("Ctrl-S", "save"),
    ("t", "toggle theme"),
    ("q", "quit"),
    ("", ""),
    ("Esc", "stop editing"),
    ("Alt-1/2/3", "heading"),
    ("Alt-b/i/c", "bold / italic / code"),
    ("Alt-k", "code block"),
    ("Alt-l/n/x/q", "bullet / numbered / checklist / quote"),
    ("Alt-t", "table"),
];

fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let width = 56.min(area.width);
    let height = (HELP.len() as u16 + 2).min(area.height);
    let popup = centered_rect(width, height, area);

    let lines: Vec<Line> = HELP
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(format!(" {:<14}", keys), app.theme.gutter_selected),
                Span::styled(*what, app.theme.base),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border))
        .title(" Help (? to close) ");

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_position() {
        assert_eq!(cursor_position("hello", 3), (0, 3));
        assert_eq!(cursor_position("- a\n- bc", 8), (1, 4));
        assert_eq!(cursor_position("日本\nx", 6), (0, 4));
        assert_eq!(cursor_position("abc", 99), (0, 3));
    }

    #[test]
    fn test_edit_lines_selection() {
        let style = Style::default();
        let lines = edit_lines("one\ntwo", Surface { start: 1, end: 6 }, style);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[1].content, "ne");
        assert_eq!(lines[1].spans[1].content, "tw");
        assert!(lines[1].spans[1].style.add_modifier.contains(Modifier::REVERSED));

        let caret = edit_lines("one\ntwo", Surface::caret(2), style);
        assert_eq!(caret[0].spans.len(), 1);
    }
}
