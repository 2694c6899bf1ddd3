use std::time::{Duration, Instant};

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::config::ColourConfig;
use crate::feed::{Article, resolve_avatar};
use crate::ui::theme;

/// Entrance transition: the overlay counts as fully open after this delay.
/// Purely cosmetic (the border stays dimmed until it elapses).
pub const OPEN_TRANSITION: Duration = Duration::from_millis(10);

/// Exit transition: the overlay is removed once this has elapsed after a
/// close request.
pub const CLOSE_TRANSITION: Duration = Duration::from_millis(200);

/// At most this many of the author's articles are listed.
pub const MAX_ARTICLES: usize = 4;

/// Visible lifecycle phases of the overlay. "Closed" is the absence of the
/// [`Modal`] value itself: once the exit transition completes the overlay is
/// dropped entirely and a later open rebuilds it fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Opening,
    Open,
    Closing,
}

/// One article row in the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalEntry {
    pub title: String,
    pub link: String,
    pub date: String,
}

/// Everything the overlay displays for one author.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalContent {
    pub author: String,
    pub avatar: String,
    /// Origin of the author's site, derived from the clicked card's link.
    pub site: Option<String>,
    pub entries: Vec<ModalEntry>,
}

impl ModalContent {
    /// Build the overlay content for the author of `seed`.
    ///
    /// Entries come from the FULL article set (never the filtered view), in
    /// feed order, truncated to [`MAX_ARTICLES`]; avatar and site URL come
    /// from the clicked card itself.
    pub fn for_author(seed: &Article, articles: &[Article], error_img: &str) -> Self {
        let entries = articles
            .iter()
            .filter(|a| a.author == seed.author)
            .take(MAX_ARTICLES)
            .map(|a| ModalEntry {
                title: a.title.clone(),
                link: a.link.clone(),
                date: a.date(),
            })
            .collect();

        Self {
            author: seed.author.clone(),
            avatar: resolve_avatar(seed.avatar.as_deref(), error_img).to_string(),
            site: site_origin(&seed.link),
            entries,
        }
    }
}

/// The origin portion (`scheme://host[:port]`) of an article link.
fn site_origin(link: &str) -> Option<String> {
    let parsed = url::Url::parse(link).ok()?;
    let origin = parsed.origin();
    matches!(origin, url::Origin::Tuple(..)).then(|| origin.ascii_serialization())
}

/// The per-author detail overlay.
///
/// A state machine over {Opening, Open, Closing}; callers supply the clock
/// so the transitions are reproducible. Only one overlay ever exists:
/// re-opening while one is up repopulates it in place.
#[derive(Debug)]
pub struct Modal {
    phase: Phase,
    phase_since: Instant,
    pub content: ModalContent,
    /// The rectangle the overlay occupied on the last render, for
    /// background-click hit-testing.
    pub area: Option<Rect>,
}

impl Modal {
    /// Construct a fresh overlay in the `Opening` phase.
    pub fn open(content: ModalContent, now: Instant) -> Self {
        Self {
            phase: Phase::Opening,
            phase_since: now,
            content,
            area: None,
        }
    }

    /// Replace the displayed author without stacking a second overlay.
    ///
    /// An overlay caught mid-close snaps back to `Opening`.
    pub fn repopulate(&mut self, content: ModalContent, now: Instant) {
        self.content = content;
        if self.phase == Phase::Closing {
            self.phase = Phase::Opening;
            self.phase_since = now;
        }
    }

    /// Begin the exit transition. No-op if already closing.
    pub fn request_close(&mut self, now: Instant) {
        if self.phase != Phase::Closing {
            self.phase = Phase::Closing;
            self.phase_since = now;
        }
    }

    /// Advance the transition clock. Returns `true` once the exit transition
    /// has completed and the overlay should be dropped.
    pub fn advance(&mut self, now: Instant) -> bool {
        match self.phase {
            Phase::Opening => {
                if now.duration_since(self.phase_since) >= OPEN_TRANSITION {
                    self.phase = Phase::Open;
                }
                false
            }
            Phase::Open => false,
            Phase::Closing => now.duration_since(self.phase_since) >= CLOSE_TRANSITION,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Render the overlay centered on screen.
pub fn render(frame: &mut Frame, modal: &mut Modal, colours: &ColourConfig) {
    let area = frame.area();

    let width = area.width.min(60);
    let height = area.height.min(6 + 2 * modal.content.entries.len() as u16);

    let popup_area = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    modal.area = Some(popup_area);

    // The border stays dimmed while a transition is in flight.
    let border_style = theme::get_border_style(modal.phase == Phase::Open, colours);

    let mut lines = vec![
        Line::from(Span::styled(modal.content.author.clone(), theme::AUTHOR_STYLE)),
        Line::from(Span::styled(
            modal.content.site.clone().unwrap_or_default(),
            theme::META_STYLE,
        )),
        Line::from(Span::styled(modal.content.avatar.clone(), theme::META_STYLE)),
        Line::from(""),
    ];

    for (i, entry) in modal.content.entries.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", i + 1), theme::get_accent_style(colours)),
            Span::styled(entry.title.clone(), theme::CARD_TITLE_STYLE),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  \u{1F4C5}{}", entry.date),
            theme::META_STYLE,
        )));
    }

    let block = Block::default()
        .title(" Author ")
        .borders(Borders::ALL)
        .border_style(border_style)
        .border_type(theme::get_border_type(colours));

    frame.render_widget(Clear, popup_area);
    frame.render_widget(
        Paragraph::new(lines).block(block).alignment(Alignment::Left),
        popup_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, author: &str, link: &str) -> Article {
        Article {
            title: title.to_string(),
            link: link.to_string(),
            author: author.to_string(),
            avatar: None,
            created: "2024-05-01T00:00:00".to_string(),
        }
    }

    fn sample() -> Vec<Article> {
        (0..6)
            .map(|i| article(&format!("a{i}"), "Ann", &format!("https://ann.example.com/p/{i}")))
            .chain(std::iter::once(article("b0", "Bob", "https://bob.example.com/b0")))
            .collect()
    }

    #[test]
    fn content_lists_at_most_four_articles_in_feed_order() {
        let articles = sample();
        let content = ModalContent::for_author(&articles[0], &articles, "https://f.example/i.png");
        assert_eq!(content.author, "Ann");
        let titles: Vec<&str> = content.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["a0", "a1", "a2", "a3"]);
    }

    #[test]
    fn content_draws_from_the_full_set_and_links_the_site_origin() {
        let articles = sample();
        let bob = articles.last().unwrap();
        let content = ModalContent::for_author(bob, &articles, "https://f.example/i.png");
        assert_eq!(content.entries.len(), 1);
        assert_eq!(content.site.as_deref(), Some("https://bob.example.com"));
        // No usable avatar on the card: the fallback is substituted.
        assert_eq!(content.avatar, "https://f.example/i.png");
    }

    #[test]
    fn site_origin_ignores_unparseable_links() {
        assert_eq!(site_origin("not a url"), None);
        assert_eq!(site_origin("https://ex.example.com:8443/p/1"), Some("https://ex.example.com:8443".into()));
    }

    fn content() -> ModalContent {
        ModalContent {
            author: "Ann".into(),
            avatar: "https://f.example/i.png".into(),
            site: None,
            entries: Vec::new(),
        }
    }

    #[test]
    fn opens_after_the_entrance_transition() {
        let t0 = Instant::now();
        let mut modal = Modal::open(content(), t0);
        assert_eq!(modal.phase(), Phase::Opening);

        assert!(!modal.advance(t0 + Duration::from_millis(5)));
        assert_eq!(modal.phase(), Phase::Opening);

        assert!(!modal.advance(t0 + OPEN_TRANSITION));
        assert_eq!(modal.phase(), Phase::Open);
    }

    #[test]
    fn close_removes_after_the_exit_transition() {
        let t0 = Instant::now();
        let mut modal = Modal::open(content(), t0);
        modal.advance(t0 + OPEN_TRANSITION);

        modal.request_close(t0 + Duration::from_millis(100));
        assert_eq!(modal.phase(), Phase::Closing);

        assert!(!modal.advance(t0 + Duration::from_millis(150)));
        assert!(modal.advance(t0 + Duration::from_millis(100) + CLOSE_TRANSITION));
    }

    #[test]
    fn repopulate_replaces_instead_of_stacking() {
        let t0 = Instant::now();
        let mut modal = Modal::open(content(), t0);
        modal.advance(t0 + OPEN_TRANSITION);

        let mut other = content();
        other.author = "Bob".into();
        modal.repopulate(other, t0 + Duration::from_millis(50));
        assert_eq!(modal.content.author, "Bob");
        assert_eq!(modal.phase(), Phase::Open);
    }

    #[test]
    fn reopening_a_closing_overlay_snaps_back_to_opening() {
        let t0 = Instant::now();
        let mut modal = Modal::open(content(), t0);
        modal.advance(t0 + OPEN_TRANSITION);
        modal.request_close(t0 + Duration::from_millis(50));

        modal.repopulate(content(), t0 + Duration::from_millis(60));
        assert_eq!(modal.phase(), Phase::Opening);
        // The interrupted exit no longer completes.
        assert!(!modal.advance(t0 + Duration::from_millis(65)));
    }
}
