pub mod cards_pane;
pub mod dropdown;
pub mod modal;
pub mod stats_pane;
pub mod status_bar;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::App;

/// Top-level render function.
///
/// Stacks, top to bottom: the filter button row, the cards list, the
/// load-more row (only while more pages remain), the stats block, and a
/// 1-row status bar. Overlays (dropdown, modal) are drawn last so they float
/// over the cards.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    if area.width == 0 || area.height == 0 {
        // Nothing to mount into.
        return;
    }

    let filtered_len = app.filtered_len();
    let show_more = app.pager.more_available(filtered_len);

    let mut constraints = vec![Constraint::Length(1), Constraint::Min(0)];
    if show_more {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(3));
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    // Filter button row. Its rectangle doubles as the mouse target that
    // toggles the dropdown.
    let colours = &app.config.display.colours;
    let button = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", app.filter.label()),
            theme::get_accent_style(colours),
        ),
        Span::styled("\u{25BC}", theme::META_STYLE),
    ]));
    frame.render_widget(button, chunks[0]);
    app.dropdown.button_area = Some(chunks[0]);

    cards_pane::render(frame, app, chunks[1]);

    if show_more {
        let remaining = filtered_len - app.pager.rendered();
        let hint = Paragraph::new(Span::styled(
            format!(
                " [{}] load more \u{00B7} {remaining} remaining",
                app.config.keybindings.cards.load_more.display()
            ),
            theme::get_accent_style(&app.config.display.colours),
        ));
        frame.render_widget(hint, chunks[2]);
    }

    stats_pane::render(frame, app.stats.as_ref(), chunks[chunks.len() - 2]);
    status_bar::render(frame, app, chunks[chunks.len() - 1]);

    if app.dropdown.open {
        dropdown::render(
            frame,
            &mut app.dropdown,
            &app.authors,
            &app.filter,
            &app.config.display.colours,
        );
    }

    if let Some(ref mut m) = app.modal {
        modal::render(frame, m, &app.config.display.colours);
    }
}
