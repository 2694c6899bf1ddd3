use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use crossterm::event::{KeyCode, KeyModifiers};
use serde::{Deserialize, Serialize};

use crate::pager::DEFAULT_PAGE_SIZE;

/// Top-level application configuration.
///
/// Loaded from `$XDG_CONFIG_HOME/circlet/config.yaml` (or platform
/// equivalent). If the file does not exist, sensible defaults are used.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the aggregate feed. The loader fetches
    /// `{private_api_url}all.json`; loads fail with a diagnostic until this
    /// is configured.
    #[serde(default)]
    pub private_api_url: String,

    /// How many cards each "load more" adds.
    #[serde(default = "default_page_turning_number")]
    pub page_turning_number: usize,

    /// Substitute image URL used when an author has no usable avatar.
    #[serde(default = "default_error_img")]
    pub error_img: String,

    /// Display-related settings (colours, borders).
    #[serde(default)]
    pub display: DisplayConfig,

    /// Keyboard keybindings.
    #[serde(default)]
    pub keybindings: KeyBindings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Colour configuration for the UI.
    #[serde(default)]
    pub colours: ColourConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColourConfig {
    /// Colour for the focused area's border.
    #[serde(default = "default_active_border")]
    pub active_border: String,

    /// Colour for unfocused borders.
    #[serde(default = "default_inactive_border")]
    pub inactive_border: String,

    /// Border type (plain, double, thick, rounded).
    #[serde(default = "default_border_type")]
    pub border_type: String,

    /// Background colour for the highlighted row.
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,

    /// Accent colour (filter label, load-more hint, avatar marker).
    #[serde(default = "default_accent")]
    pub accent: String,
}

impl Default for ColourConfig {
    fn default() -> Self {
        Self {
            active_border: default_active_border(),
            inactive_border: default_inactive_border(),
            border_type: default_border_type(),
            highlight_bg: default_highlight_bg(),
            accent: default_accent(),
        }
    }
}

// ---------------------------------------------------------------------------
// Keybindings
// ---------------------------------------------------------------------------

/// Keybinding configuration for all actions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KeyBindings {
    /// Bindings that work regardless of focus.
    #[serde(default)]
    pub global: GlobalKeyBindings,

    /// Bindings for the cards list.
    #[serde(default)]
    pub cards: CardsKeyBindings,

    /// Bindings while the author filter dropdown is open.
    #[serde(default)]
    pub dropdown: DropdownKeyBindings,

    /// Bindings while the author modal is up.
    #[serde(default)]
    pub modal: ModalKeyBindings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalKeyBindings {
    /// Quit the application.
    #[serde(default = "default_quit")]
    pub quit: Vec<KeyBinding>,

    /// Reinitialize: discard all state and reload the feed.
    #[serde(default = "default_reload")]
    pub reload: KeyBinding,

    /// Jump to the first rendered card.
    #[serde(default = "default_jump_top")]
    pub jump_top: KeyBinding,

    /// Jump to the last rendered card.
    #[serde(default = "default_jump_bottom")]
    pub jump_bottom: KeyBinding,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CardsKeyBindings {
    #[serde(default = "default_move_down")]
    pub move_down: Vec<KeyBinding>,

    #[serde(default = "default_move_up")]
    pub move_up: Vec<KeyBinding>,

    /// Open the selected article in the browser.
    #[serde(default = "default_open_link")]
    pub open_link: KeyBinding,

    /// Open the author overlay for the selected card.
    #[serde(default = "default_open_author")]
    pub open_author: KeyBinding,

    /// Open or close the author filter dropdown.
    #[serde(default = "default_toggle_filter")]
    pub toggle_filter: KeyBinding,

    /// Render the next page of the filtered view.
    #[serde(default = "default_load_more")]
    pub load_more: KeyBinding,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DropdownKeyBindings {
    #[serde(default = "default_move_down")]
    pub move_down: Vec<KeyBinding>,

    #[serde(default = "default_move_up")]
    pub move_up: Vec<KeyBinding>,

    /// Toggle the author under the cursor.
    #[serde(default = "default_toggle_author")]
    pub toggle_author: KeyBinding,

    /// Clear the whole selection.
    #[serde(default = "default_clear_filter")]
    pub clear: KeyBinding,

    /// Close the dropdown.
    #[serde(default = "default_close_dropdown")]
    pub close: Vec<KeyBinding>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModalKeyBindings {
    /// Dismiss the overlay.
    #[serde(default = "default_close_modal")]
    pub close: Vec<KeyBinding>,

    /// Open the author's site in the browser.
    #[serde(default = "default_open_site")]
    pub open_site: KeyBinding,
}

impl Default for GlobalKeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            reload: default_reload(),
            jump_top: default_jump_top(),
            jump_bottom: default_jump_bottom(),
        }
    }
}

impl Default for CardsKeyBindings {
    fn default() -> Self {
        Self {
            move_down: default_move_down(),
            move_up: default_move_up(),
            open_link: default_open_link(),
            open_author: default_open_author(),
            toggle_filter: default_toggle_filter(),
            load_more: default_load_more(),
        }
    }
}

impl Default for DropdownKeyBindings {
    fn default() -> Self {
        Self {
            move_down: default_move_down(),
            move_up: default_move_up(),
            toggle_author: default_toggle_author(),
            clear: default_clear_filter(),
            close: default_close_dropdown(),
        }
    }
}

impl Default for ModalKeyBindings {
    fn default() -> Self {
        Self {
            close: default_close_modal(),
            open_site: default_open_site(),
        }
    }
}

/// A single key binding.
///
/// Deserialized from strings such as:
/// - `"a"` - a single character
/// - `"Ctrl-a"` - control+character
/// - `"Enter"`, `"Esc"`, `"Space"`, `"Tab"` - special keys
/// - `"Up"`, `"Down"`, `"Left"`, `"Right"` - arrow keys
/// - `"PageUp"`, `"PageDown"`, `"Home"`, `"End"` - navigation keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

mod keybinding_serde {
    use super::*;
    use serde::de::{Error, Visitor};
    use std::fmt;

    pub fn parse_keybinding(s: &str) -> Result<KeyBinding, String> {
        let s = s.trim();

        let (modifiers, key) = if let Some(rest) = s.strip_prefix("Ctrl-") {
            (KeyModifiers::CONTROL, rest)
        } else if let Some(rest) = s.strip_prefix("Alt-") {
            (KeyModifiers::ALT, rest)
        } else if let Some(rest) = s.strip_prefix("Shift-") {
            (KeyModifiers::SHIFT, rest)
        } else {
            (KeyModifiers::NONE, s)
        };

        let code = match key.to_lowercase().as_str() {
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            "space" => KeyCode::Char(' '),
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            s if s.len() == 1 => KeyCode::Char(key.chars().next().unwrap()),
            _ => return Err(format!("Unknown key: {}", key)),
        };

        // Uppercase letters imply SHIFT.
        let modifiers = if key.len() == 1
            && key.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
        {
            modifiers | KeyModifiers::SHIFT
        } else {
            modifiers
        };

        Ok(KeyBinding { code, modifiers })
    }

    impl<'de> Deserialize<'de> for KeyBinding {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            struct KeyBindingVisitor;

            impl<'de> Visitor<'de> for KeyBindingVisitor {
                type Value = KeyBinding;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("a key binding string like \"a\", \"Ctrl-a\", \"Enter\", etc.")
                }

                fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
                where
                    E: Error,
                {
                    parse_keybinding(s).map_err(Error::custom)
                }
            }

            deserializer.deserialize_str(KeyBindingVisitor)
        }
    }
}

impl serde::Serialize for KeyBinding {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_string())
    }
}

impl KeyBinding {
    pub fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.code == code && self.modifiers == modifiers
    }

    /// Display this keybinding as a string for status-bar hints.
    pub fn display(&self) -> String {
        let modifier_str = if self.modifiers.contains(KeyModifiers::CONTROL) {
            "Ctrl+"
        } else if self.modifiers.contains(KeyModifiers::ALT) {
            "Alt+"
        } else {
            ""
        };

        let key_str = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::PageUp => "PgUp".to_string(),
            KeyCode::PageDown => "PgDn".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            _ => "?".to_string(),
        };

        format!("{}{}", modifier_str, key_str)
    }

    /// Convert this keybinding back to its configuration string.
    pub fn as_string(&self) -> String {
        let modifier_str = if self.modifiers.contains(KeyModifiers::CONTROL) {
            "Ctrl-"
        } else if self.modifiers.contains(KeyModifiers::ALT) {
            "Alt-"
        } else {
            ""
        };

        let key_str = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            _ => "?".to_string(),
        };

        format!("{}{}", modifier_str, key_str)
    }
}

/// Check if a key matches any binding in a slice.
pub fn matches_any(bindings: &[KeyBinding], code: KeyCode, modifiers: KeyModifiers) -> bool {
    bindings.iter().any(|b| b.matches(code, modifiers))
}

// ---------------------------------------------------------------------------
// Colour parsing
// ---------------------------------------------------------------------------

/// Parse a border type string into a ratatui border type.
pub fn parse_border_type(border_str: &str) -> Result<ratatui::widgets::BorderType, String> {
    match border_str.to_lowercase().as_str() {
        "plain" => Ok(ratatui::widgets::BorderType::Plain),
        "double" => Ok(ratatui::widgets::BorderType::Double),
        "thick" => Ok(ratatui::widgets::BorderType::Thick),
        "rounded" => Ok(ratatui::widgets::BorderType::Rounded),
        _ => Err(format!(
            "Unknown border type: {}. Valid options: plain, double, thick, rounded",
            border_str
        )),
    }
}

/// Parse a colour name (or `#rrggbb`) into a ratatui colour.
pub fn parse_color(color_str: &str) -> Result<ratatui::style::Color, String> {
    use ratatui::style::Color;

    match color_str.to_lowercase().as_str() {
        "black" => Ok(Color::Black),
        "red" => Ok(Color::Red),
        "green" => Ok(Color::Green),
        "yellow" => Ok(Color::Yellow),
        "blue" => Ok(Color::Blue),
        "magenta" => Ok(Color::Magenta),
        "cyan" => Ok(Color::Cyan),
        "white" => Ok(Color::White),
        "darkgray" | "dark_grey" | "dark_gray" => Ok(Color::DarkGray),
        "gray" | "grey" => Ok(Color::Gray),
        "lightred" | "light_red" => Ok(Color::LightRed),
        "lightgreen" | "light_green" => Ok(Color::LightGreen),
        "lightyellow" | "light_yellow" => Ok(Color::LightYellow),
        "lightblue" | "light_blue" => Ok(Color::LightBlue),
        "lightmagenta" | "light_magenta" => Ok(Color::LightMagenta),
        "lightcyan" | "light_cyan" => Ok(Color::LightCyan),
        s if s.starts_with('#') => {
            let hex = &s[1..];
            if hex.len() == 6 {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                Ok(Color::Rgb(r, g, b))
            } else {
                Err(format!("Invalid hex colour format: {}", color_str))
            }
        }
        _ => Err(format!("Unknown colour: {}", color_str)),
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_page_turning_number() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_error_img() -> String {
    "https://fastly.jsdelivr.net/gh/willow-god/Friend-Circle-Lite/static/favicon.ico".to_string()
}

fn default_active_border() -> String {
    "cyan".to_string()
}

fn default_inactive_border() -> String {
    "darkgray".to_string()
}

fn default_border_type() -> String {
    "plain".to_string()
}

fn default_highlight_bg() -> String {
    "darkgray".to_string()
}

fn default_accent() -> String {
    "cyan".to_string()
}

fn parse_kb(s: &str) -> KeyBinding {
    keybinding_serde::parse_keybinding(s).unwrap()
}

fn default_quit() -> Vec<KeyBinding> {
    vec![parse_kb("q"), parse_kb("Ctrl-c")]
}

fn default_reload() -> KeyBinding {
    parse_kb("r")
}

fn default_jump_top() -> KeyBinding {
    parse_kb("g")
}

fn default_jump_bottom() -> KeyBinding {
    parse_kb("G")
}

fn default_move_down() -> Vec<KeyBinding> {
    vec![parse_kb("j"), parse_kb("Down")]
}

fn default_move_up() -> Vec<KeyBinding> {
    vec![parse_kb("k"), parse_kb("Up")]
}

fn default_open_link() -> KeyBinding {
    parse_kb("Enter")
}

fn default_open_author() -> KeyBinding {
    parse_kb("a")
}

fn default_toggle_filter() -> KeyBinding {
    parse_kb("f")
}

fn default_load_more() -> KeyBinding {
    parse_kb("Space")
}

fn default_toggle_author() -> KeyBinding {
    parse_kb("Space")
}

fn default_clear_filter() -> KeyBinding {
    parse_kb("c")
}

fn default_close_dropdown() -> Vec<KeyBinding> {
    vec![parse_kb("Esc"), parse_kb("f")]
}

fn default_close_modal() -> Vec<KeyBinding> {
    vec![parse_kb("Esc")]
}

fn default_open_site() -> KeyBinding {
    parse_kb("o")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            private_api_url: String::new(),
            page_turning_number: default_page_turning_number(),
            error_img: default_error_img(),
            display: DisplayConfig::default(),
            keybindings: KeyBindings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Returns the path to the config file:
/// `$XDG_CONFIG_HOME/circlet/config.yaml` (or platform equivalent).
fn config_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("circlet").join("config.yaml"))
}

/// Load application configuration from disk.
///
/// If the config file does not exist, returns `Config::default()`.
/// If the file exists but cannot be parsed, the parse error is propagated.
pub fn load() -> anyhow::Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = Config::default();
        assert_eq!(cfg.private_api_url, "");
        assert_eq!(cfg.page_turning_number, 24);
        assert!(cfg.error_img.starts_with("https://"));
        assert_eq!(cfg.display.colours.active_border, "cyan");
        assert!(!cfg.keybindings.global.quit.is_empty());
        assert_eq!(cfg.keybindings.cards.open_link.code, KeyCode::Enter);
    }

    #[test]
    fn deserialize_partial_yaml_uses_defaults() {
        let yaml = "private_api_url: \"https://feed.example.com/\"\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.private_api_url, "https://feed.example.com/");
        assert_eq!(cfg.page_turning_number, 24);
        assert!(cfg.error_img.starts_with("https://"));
    }

    #[test]
    fn deserialize_full_yaml() {
        let yaml = r#"
private_api_url: "https://feed.example.com/"
page_turning_number: 12
error_img: "https://cdn.example.com/fallback.png"
display:
  colours:
    active_border: "green"
    border_type: "rounded"
keybindings:
  global:
    quit: ["q"]
  cards:
    load_more: "n"
  dropdown:
    toggle_author: "Enter"
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.page_turning_number, 12);
        assert_eq!(cfg.error_img, "https://cdn.example.com/fallback.png");
        assert_eq!(cfg.display.colours.active_border, "green");
        assert_eq!(cfg.display.colours.border_type, "rounded");
        assert_eq!(cfg.keybindings.global.quit.len(), 1);
        assert_eq!(cfg.keybindings.cards.load_more.code, KeyCode::Char('n'));
        assert_eq!(cfg.keybindings.dropdown.toggle_author.code, KeyCode::Enter);
        // Untouched tables keep their defaults.
        assert_eq!(cfg.keybindings.modal.open_site.code, KeyCode::Char('o'));
    }

    #[test]
    fn parse_keybinding_single_char() {
        let kb = parse_kb("a");
        assert_eq!(kb.code, KeyCode::Char('a'));
        assert_eq!(kb.modifiers, KeyModifiers::NONE);
    }

    #[test]
    fn parse_keybinding_ctrl_char() {
        let kb = parse_kb("Ctrl-c");
        assert_eq!(kb.code, KeyCode::Char('c'));
        assert!(kb.modifiers.contains(KeyModifiers::CONTROL));
    }

    #[test]
    fn parse_keybinding_space() {
        let kb = parse_kb("Space");
        assert_eq!(kb.code, KeyCode::Char(' '));
        assert_eq!(kb.modifiers, KeyModifiers::NONE);
    }

    #[test]
    fn parse_keybinding_uppercase_adds_shift() {
        let kb = parse_kb("G");
        assert_eq!(kb.code, KeyCode::Char('G'));
        assert!(kb.modifiers.contains(KeyModifiers::SHIFT));
    }

    #[test]
    fn keybinding_matches() {
        let kb = parse_kb("Ctrl-c");
        assert!(kb.matches(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!kb.matches(KeyCode::Char('c'), KeyModifiers::NONE));
    }

    #[test]
    fn keybinding_display() {
        assert_eq!(parse_kb("a").display(), "a");
        assert_eq!(parse_kb("Ctrl-c").display(), "Ctrl+c");
        assert_eq!(parse_kb("Space").display(), "Space");
        assert_eq!(parse_kb("Up").display(), "↑");
    }

    #[test]
    fn keybinding_round_trips_through_string() {
        for s in ["a", "Ctrl-c", "Space", "Esc", "PageDown"] {
            let kb = parse_kb(s);
            assert_eq!(kb.as_string(), s);
        }
    }
}
