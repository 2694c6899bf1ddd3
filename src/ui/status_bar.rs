use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::Paragraph;

use crate::action;
use crate::app::{App, Focus};
use crate::config::KeyBindings;
use crate::ui::theme;

/// Render the single-row status bar at the bottom of the terminal.
///
/// Shows either a transient status message (diagnostics from a failed load),
/// or contextual key-binding hints for the current focus. A "Loading..."
/// prefix is prepended while a fetch is outstanding.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let content = if let Some(ref msg) = app.status_message {
        format!(" {msg}")
    } else {
        let hints = build_hints(app);
        if app.is_loading {
            format!(" Loading... \u{2502}{hints}")
        } else {
            hints
        }
    };

    let bar = Paragraph::new(content).style(theme::STATUS_STYLE);
    frame.render_widget(bar, area);
}

fn build_hints(app: &App) -> String {
    let kb = &app.config.keybindings;
    match app.focus() {
        Focus::Cards => build_cards_hints(kb),
        Focus::Dropdown => build_dropdown_hints(kb),
        Focus::Modal => build_modal_hints(kb),
    }
}

fn build_cards_hints(kb: &KeyBindings) -> String {
    let parts = vec![
        format!("[{}] Navigate", action::format_bindings(&kb.cards.move_down)),
        format!("[{}] Open", kb.cards.open_link.display()),
        format!("[{}] Author", kb.cards.open_author.display()),
        format!("[{}] Filter", kb.cards.toggle_filter.display()),
        format!("[{}] More", kb.cards.load_more.display()),
        format!("[{}] Reload", kb.global.reload.display()),
        format!("[{}] Quit", action::format_bindings(&kb.global.quit)),
    ];
    parts.join(" \u{2502} ")
}

fn build_dropdown_hints(kb: &KeyBindings) -> String {
    let parts = vec![
        format!("[{}] Navigate", action::format_bindings(&kb.dropdown.move_down)),
        format!("[{}] Toggle", kb.dropdown.toggle_author.display()),
        format!("[{}] Clear", kb.dropdown.clear.display()),
        format!("[{}] Close", action::format_bindings(&kb.dropdown.close)),
    ];
    parts.join(" \u{2502} ")
}

fn build_modal_hints(kb: &KeyBindings) -> String {
    let parts = vec![
        "[1-4] Open article".to_string(),
        format!("[{}] Site", kb.modal.open_site.display()),
        format!("[{}] Close", action::format_bindings(&kb.modal.close)),
    ];
    parts.join(" \u{2502} ")
}
