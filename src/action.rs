use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::Focus;
use crate::config::{self, KeyBinding};

/// High-level actions the application can perform in response to user
/// input. The mapper turns raw key events into these based on which part of
/// the UI currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveUp,
    MoveDown,
    JumpToTop,
    JumpToBottom,
    /// Open the selected article's link in the browser.
    OpenLink,
    /// Open the author overlay for the selected card.
    OpenAuthorModal,
    /// Open or close the author filter dropdown.
    ToggleFilterDropdown,
    /// Render the next page of the filtered view.
    LoadMore,
    /// Discard all state and re-run initialization (cache + fetch).
    Reload,
    /// Toggle the author under the dropdown cursor.
    ToggleAuthor,
    /// Deselect every author.
    ClearFilter,
    /// Close the dropdown or dismiss the modal.
    CloseOverlay,
    /// Open the modal author's site in the browser.
    OpenAuthorSite,
    /// Open the n-th article listed in the modal (1-based).
    OpenModalArticle(usize),
}

/// Map a key press to an application [`Action`], considering the current
/// focus and the configured keybindings.
///
/// Returns `None` for unmapped keys.
pub fn handle_key(key: &KeyEvent, focus: Focus, keybindings: &config::KeyBindings) -> Option<Action> {
    let code = key.code;
    let mods = key.modifiers;

    // ----- Global bindings (independent of focus) -----

    if config::matches_any(&keybindings.global.quit, code, mods) {
        return Some(Action::Quit);
    }
    if keybindings.global.reload.matches(code, mods) && focus != Focus::Dropdown {
        return Some(Action::Reload);
    }

    // ----- Focus-specific bindings -----

    match focus {
        Focus::Cards => handle_cards_key(code, mods, keybindings),
        Focus::Dropdown => handle_dropdown_key(code, mods, keybindings),
        Focus::Modal => handle_modal_key(code, mods, keybindings),
    }
}

/// Key bindings while the cards list has focus.
fn handle_cards_key(
    code: KeyCode,
    mods: KeyModifiers,
    keybindings: &config::KeyBindings,
) -> Option<Action> {
    let kb = &keybindings.cards;

    if config::matches_any(&kb.move_down, code, mods) {
        return Some(Action::MoveDown);
    }
    if config::matches_any(&kb.move_up, code, mods) {
        return Some(Action::MoveUp);
    }
    if kb.open_link.matches(code, mods) {
        return Some(Action::OpenLink);
    }
    if kb.open_author.matches(code, mods) {
        return Some(Action::OpenAuthorModal);
    }
    if kb.toggle_filter.matches(code, mods) {
        return Some(Action::ToggleFilterDropdown);
    }
    if kb.load_more.matches(code, mods) {
        return Some(Action::LoadMore);
    }
    if keybindings.global.jump_top.matches(code, mods) {
        return Some(Action::JumpToTop);
    }
    if keybindings.global.jump_bottom.matches(code, mods) {
        return Some(Action::JumpToBottom);
    }

    None
}

/// Key bindings while the author filter dropdown is open.
fn handle_dropdown_key(
    code: KeyCode,
    mods: KeyModifiers,
    keybindings: &config::KeyBindings,
) -> Option<Action> {
    let kb = &keybindings.dropdown;

    if config::matches_any(&kb.move_down, code, mods) {
        return Some(Action::MoveDown);
    }
    if config::matches_any(&kb.move_up, code, mods) {
        return Some(Action::MoveUp);
    }
    if kb.toggle_author.matches(code, mods) {
        return Some(Action::ToggleAuthor);
    }
    if kb.clear.matches(code, mods) {
        return Some(Action::ClearFilter);
    }
    if config::matches_any(&kb.close, code, mods) {
        return Some(Action::CloseOverlay);
    }

    None
}

/// Key bindings while the author modal is up. The modal captures all input.
fn handle_modal_key(
    code: KeyCode,
    mods: KeyModifiers,
    keybindings: &config::KeyBindings,
) -> Option<Action> {
    let kb = &keybindings.modal;

    if config::matches_any(&kb.close, code, mods) {
        return Some(Action::CloseOverlay);
    }
    if kb.open_site.matches(code, mods) {
        return Some(Action::OpenAuthorSite);
    }

    // Digits 1-4 open the corresponding listed article.
    if mods == KeyModifiers::NONE {
        if let KeyCode::Char(c @ '1'..='4') = code {
            return Some(Action::OpenModalArticle(c as usize - '0' as usize));
        }
    }

    None
}

/// Build a display string for a list of keybindings, joined with "/".
pub fn format_bindings(bindings: &[KeyBinding]) -> String {
    bindings
        .iter()
        .map(|kb| kb.display())
        .collect::<Vec<_>>()
        .join("/")
}
