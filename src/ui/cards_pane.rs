use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::app::{App, Focus};
use crate::feed::{Article, resolve_avatar};
use crate::ui::theme;

/// Wrap text to fit within a maximum width, returning at most `max_lines`
/// lines.
fn wrap_text(text: &str, max_width: usize, max_lines: usize) -> Vec<String> {
    if text.is_empty() || max_width == 0 {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();

        if current_chars > 0 && current_chars + 1 + word_chars > max_width {
            lines.push(std::mem::take(&mut current));
            current_chars = 0;
            if lines.len() >= max_lines {
                break;
            }
        }

        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }

    if !current.is_empty() && lines.len() < max_lines {
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(text.chars().take(max_width).collect());
    }

    lines
}

/// Build the lines for one article card.
fn card_lines(article: &Article, app: &App, inner_width: usize) -> Vec<Line<'static>> {
    let colours = &app.config.display.colours;
    let mut lines = Vec::new();

    for title_line in wrap_text(&article.title, inner_width, 2) {
        lines.push(Line::from(Span::styled(title_line, theme::CARD_TITLE_STYLE)));
    }

    // Author row: a filled marker when the card carries its own avatar, a
    // hollow one when the fallback image is substituted.
    let has_avatar =
        resolve_avatar(article.avatar.as_deref(), &app.config.error_img) != app.config.error_img;
    let marker = if has_avatar { "\u{25C9} " } else { "\u{25CB} " };
    lines.push(Line::from(vec![
        Span::styled(marker, theme::get_accent_style(colours)),
        Span::styled(article.author.clone(), theme::AUTHOR_STYLE),
    ]));

    lines.push(Line::from(Span::styled(
        format!("\u{1F5D3} {}", article.date()),
        theme::META_STYLE,
    )));
    lines.push(Line::from(Span::styled(
        "\u{2500}".repeat(inner_width.min(80)),
        theme::META_STYLE,
    )));

    lines
}

/// Render the article cards: the first `rendered` entries of the filtered
/// view, one multi-line item per card.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let colours = app.config.display.colours.clone();
    let border_style = theme::get_border_style(app.focus() == Focus::Cards, &colours);

    let inner_width = area.width.saturating_sub(2) as usize;

    let (items, shown, total): (Vec<ListItem>, usize, usize) = {
        let view = app.filter.derive(&app.articles);
        let shown = app.pager.rendered().min(view.len());
        let items = view[..shown]
            .iter()
            .map(|article| ListItem::new(card_lines(article, app, inner_width)))
            .collect();
        (items, shown, view.len())
    };

    let block = Block::default()
        .title(format!(" Articles ({shown}/{total}) "))
        .borders(Borders::ALL)
        .border_style(border_style)
        .border_type(theme::get_border_type(&colours));

    if items.is_empty() {
        let message = if app.is_loading {
            "Loading feed..."
        } else {
            "No articles"
        };
        let placeholder = Paragraph::new(message)
            .block(block)
            .alignment(Alignment::Center)
            .style(theme::META_STYLE);
        frame.render_widget(placeholder, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::get_highlight_style(&colours));

    frame.render_stateful_widget(list, area, &mut app.cards_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_width_and_line_budget() {
        let lines = wrap_text("one two three four five", 9, 2);
        assert_eq!(lines, vec!["one two", "three"]);
    }

    #[test]
    fn wrap_truncates_a_single_overlong_word() {
        let lines = wrap_text("antidisestablishmentarianism", 10, 2);
        assert_eq!(lines, vec!["antidisest"]);
    }

    #[test]
    fn wrap_keeps_short_text_on_one_line() {
        assert_eq!(wrap_text("short", 20, 2), vec!["short"]);
        assert_eq!(wrap_text("", 20, 2), vec![""]);
    }
}
