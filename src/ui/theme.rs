use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

use crate::config::ColourConfig;

/// Get border style based on whether the area is focused and the colour
/// config.
pub fn get_border_style(is_focused: bool, colours: &ColourConfig) -> Style {
    let color_str = if is_focused {
        &colours.active_border
    } else {
        &colours.inactive_border
    };

    let color = crate::config::parse_color(color_str).unwrap_or({
        if is_focused { Color::Cyan } else { Color::DarkGray }
    });

    Style::new().fg(color)
}

/// Get highlight style for the currently selected row.
pub fn get_highlight_style(colours: &ColourConfig) -> Style {
    let color = crate::config::parse_color(&colours.highlight_bg).unwrap_or(Color::DarkGray);

    Style::new().bg(color).add_modifier(Modifier::BOLD)
}

/// Get the accent style (filter label, load-more hint, avatar marker).
pub fn get_accent_style(colours: &ColourConfig) -> Style {
    let color = crate::config::parse_color(&colours.accent).unwrap_or(Color::Cyan);

    Style::new().fg(color)
}

/// Get border type based on the colour config.
pub fn get_border_type(colours: &ColourConfig) -> BorderType {
    crate::config::parse_border_type(&colours.border_type).unwrap_or(BorderType::Plain)
}

/// Style for card titles.
pub const CARD_TITLE_STYLE: Style = Style::new()
    .fg(Color::White)
    .add_modifier(Modifier::BOLD);

/// Style for author names on cards and in the modal header.
pub const AUTHOR_STYLE: Style = Style::new().fg(Color::Yellow);

/// Style for metadata lines (dates, avatar hosts, separators).
pub const META_STYLE: Style = Style::new().fg(Color::DarkGray);

/// Style for the stats block.
pub const STATS_STYLE: Style = Style::new().fg(Color::Gray);

/// Background style for the bottom status bar.
pub const STATUS_STYLE: Style = Style::new().fg(Color::White).bg(Color::DarkGray);
