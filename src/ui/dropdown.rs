use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

use crate::config::ColourConfig;
use crate::filter::AuthorFilter;
use crate::ui::theme;

/// Transient open/close state of the author filter dropdown.
///
/// The dropdown is independent of the data it filters: it only tracks
/// whether it is open, which row its cursor is on, and where it and its
/// toggle button were last drawn (for mouse hit-testing). Exactly one
/// dropdown exists, so "opening one closes all others" is structural.
#[derive(Debug, Default)]
pub struct DropdownState {
    pub open: bool,
    pub cursor: usize,
    /// Rectangle of the dropdown body on the last render.
    pub area: Option<Rect>,
    /// Rectangle of the toggle button row on the last render.
    pub button_area: Option<Rect>,
}

impl DropdownState {
    /// Close the dropdown. Triggered by its close keys, outside clicks,
    /// scrolling, and terminal resizes.
    pub fn close(&mut self) {
        self.open = false;
        self.area = None;
    }

    /// Move the cursor by `delta`, wrapping around `len` rows.
    pub fn move_cursor(&mut self, delta: i32, len: usize) {
        if len == 0 {
            return;
        }
        let len = len as i32;
        let current = self.cursor.min(len as usize - 1) as i32;
        self.cursor = (current + delta).rem_euclid(len) as usize;
    }

    pub fn clamp_cursor(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
        } else {
            self.cursor = self.cursor.min(len - 1);
        }
    }

    /// Whether the position is inside the dropdown body. Clicks inside must
    /// not close it.
    pub fn contains(&self, pos: Position) -> bool {
        self.open && self.area.is_some_and(|a| a.contains(pos))
    }

    pub fn button_contains(&self, pos: Position) -> bool {
        self.button_area.is_some_and(|a| a.contains(pos))
    }

    /// The author row under a position inside the dropdown body, if any.
    pub fn row_at(&self, pos: Position, len: usize) -> Option<usize> {
        let area = self.area.filter(|a| a.contains(pos))?;
        // First row sits below the top border.
        let row = pos.y.checked_sub(area.y + 1)? as usize;
        (row < len).then_some(row)
    }
}

/// Render the floating checkbox list just below the filter button.
pub fn render(
    frame: &mut Frame,
    state: &mut DropdownState,
    authors: &[String],
    filter: &AuthorFilter,
    colours: &ColourConfig,
) {
    let frame_area = frame.area();
    let anchor = state.button_area.unwrap_or(frame_area);

    let longest = authors.iter().map(|a| a.chars().count()).max().unwrap_or(0);
    let width = ((longest + 8) as u16).max(24).min(frame_area.width);
    let height = (authors.len() as u16 + 2).min(12);

    let y = (anchor.y + 1).min(frame_area.height.saturating_sub(height));
    let area = Rect {
        x: frame_area.x,
        y,
        width,
        height: height.min(frame_area.height),
    };
    state.area = Some(area);

    let items: Vec<ListItem> = authors
        .iter()
        .map(|author| {
            let mark = if filter.contains(author) { "[x]" } else { "[ ]" };
            let mark_style = if filter.contains(author) {
                theme::get_accent_style(colours)
            } else {
                theme::META_STYLE
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{mark} "), mark_style),
                Span::raw(author.clone()),
            ]))
        })
        .collect();

    let block = Block::default()
        .title(format!(" {} ", filter.label()))
        .borders(Borders::ALL)
        .border_style(theme::get_border_style(true, colours))
        .border_type(theme::get_border_type(colours));

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::get_highlight_style(colours));

    let mut list_state = ListState::default();
    list_state.select((!authors.is_empty()).then_some(state.cursor));

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut list_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_wraps_in_both_directions() {
        let mut state = DropdownState::default();
        state.move_cursor(1, 3);
        assert_eq!(state.cursor, 1);
        state.move_cursor(2, 3);
        assert_eq!(state.cursor, 0);
        state.move_cursor(-1, 3);
        assert_eq!(state.cursor, 2);
    }

    #[test]
    fn cursor_is_inert_without_rows() {
        let mut state = DropdownState::default();
        state.move_cursor(1, 0);
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn row_hit_testing_accounts_for_the_border() {
        let mut state = DropdownState {
            open: true,
            ..Default::default()
        };
        state.area = Some(Rect::new(0, 2, 24, 6));

        // Top border row maps to no author.
        assert_eq!(state.row_at(Position::new(3, 2), 4), None);
        assert_eq!(state.row_at(Position::new(3, 3), 4), Some(0));
        assert_eq!(state.row_at(Position::new(3, 6), 4), Some(3));
        // Outside the rectangle entirely.
        assert_eq!(state.row_at(Position::new(30, 3), 4), None);
    }

    #[test]
    fn close_forgets_the_rendered_area() {
        let mut state = DropdownState {
            open: true,
            ..Default::default()
        };
        state.area = Some(Rect::new(0, 1, 10, 5));
        assert!(state.contains(Position::new(2, 2)));

        state.close();
        assert!(!state.contains(Position::new(2, 2)));
    }
}
