//! Theme system for dark/light modes

use mdblocks_core::config::ThemeVariant;
use ratatui::style::{Color, Modifier, Style};

/// Theme definition
#[derive(Clone, Debug)]
pub struct Theme {
    pub base: Style,
    pub code: Style,
    pub checklist_done: Style,
    pub checkbox: Style,
    pub preview: Style,
    pub preview_loading: Style,
    pub editing: Style,
    pub gutter: Style,
    pub gutter_selected: Style,
    pub gutter_editing: Style,
    pub border: Color,
    pub status_bar_fg: Color,
    pub status_bar_bg: Color,
    pub notification: Style,
}

impl Theme {
    /// Create a theme for the given variant
    pub fn for_variant(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self::dark(),
            ThemeVariant::Light => Self::light(),
        }
    }

    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            base: Style::default().fg(Color::White),
            code: Style::default().fg(Color::Yellow),
            checklist_done: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
            checkbox: Style::default().fg(Color::LightRed),
            preview: Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            preview_loading: Style::default().fg(Color::DarkGray),
            editing: Style::default().fg(Color::White).bg(Color::Rgb(40, 40, 40)),
            gutter: Style::default().fg(Color::DarkGray),
            gutter_selected: Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            gutter_editing: Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
            border: Color::DarkGray,
            status_bar_fg: Color::Black,
            status_bar_bg: Color::LightBlue,
            notification: Style::default()
                .fg(Color::Black)
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            base: Style::default().fg(Color::Black),
            code: Style::default().fg(Color::Rgb(150, 75, 0)), // Orange-brown
            checklist_done: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::CROSSED_OUT),
            checkbox: Style::default().fg(Color::Red),
            preview: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            preview_loading: Style::default().fg(Color::Gray),
            editing: Style::default()
                .fg(Color::Black)
                .bg(Color::Rgb(230, 230, 250)), // Light lavender
            gutter: Style::default().fg(Color::Gray),
            gutter_selected: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            gutter_editing: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            border: Color::Gray,
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            notification: Style::default()
                .fg(Color::White)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        }
    }
}
