use std::time::Instant;

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::cache;
use crate::config::Config;
use crate::feed::{self, Article, FeedPayload, FeedStats, LoadResult};
use crate::filter::{self, AuthorFilter};
use crate::pager::Pager;
use crate::ui::dropdown::DropdownState;
use crate::ui::modal::{Modal, ModalContent};

use crate::action::Action;

/// Which part of the UI currently receives keyboard input.
///
/// Focus is derived from overlay state rather than stored: the modal wins
/// over the dropdown, which wins over the cards list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Cards,
    Dropdown,
    Modal,
}

/// Top-level application state.
///
/// One instance owns everything mutable: the article set, the author filter,
/// the pagination cursor, the overlays, and the load channel. A
/// reinitialization replaces this state wholesale, so handlers and stale
/// fetches cannot leak across instances.
pub struct App {
    /// When `true` the main loop will exit.
    pub should_quit: bool,
    /// User configuration.
    pub config: Config,
    /// The full article set, replaced on every successful load.
    pub articles: Vec<Article>,
    /// Aggregate feed statistics for the stats block.
    pub stats: Option<FeedStats>,
    /// Distinct authors in first-seen feed order (the dropdown rows).
    pub authors: Vec<String>,
    /// The active author selection.
    pub filter: AuthorFilter,
    /// Read cursor over the filtered view.
    pub pager: Pager,
    /// Author filter dropdown overlay state.
    pub dropdown: DropdownState,
    /// Per-author detail overlay; `None` means closed (no node exists).
    pub modal: Option<Modal>,
    /// Selection state for the cards list widget.
    pub cards_state: ListState,
    /// An optional diagnostic to display in the status bar.
    pub status_message: Option<String>,
    /// Whether a fetch is currently outstanding.
    pub is_loading: bool,

    // -- Private fields --
    /// Monotonic load generation; results from older generations are
    /// discarded on arrival.
    load_generation: u64,
    /// Sender half of the channel used by background load tasks.
    load_tx: UnboundedSender<LoadResult>,
    client: reqwest::Client,
    store: cache::Store,
}

impl App {
    /// Create a new `App` and return it along with the load-result receiver.
    ///
    /// The initial load is NOT started here; call [`App::start_load`] once
    /// the event loop is ready to receive its result.
    pub fn new_with_receiver(
        config: Config,
        store: cache::Store,
        client: reqwest::Client,
    ) -> (Self, UnboundedReceiver<LoadResult>) {
        let (load_tx, load_rx) = mpsc::unbounded_channel();

        let pager = Pager::new(config.page_turning_number);

        let app = Self {
            should_quit: false,
            config,
            articles: Vec::new(),
            stats: None,
            authors: Vec::new(),
            filter: AuthorFilter::default(),
            pager,
            dropdown: DropdownState::default(),
            modal: None,
            cards_state: ListState::default(),
            status_message: None,
            is_loading: false,
            load_generation: 0,
            load_tx,
            client,
            store,
        };

        (app, load_rx)
    }

    /// Kick off a background feed load (cache first, then network).
    pub fn start_load(&mut self) {
        self.load_generation += 1;
        self.is_loading = true;
        feed::start_load(
            &self.load_tx,
            self.client.clone(),
            self.store.clone(),
            self.config.private_api_url.clone(),
            self.load_generation,
        );
    }

    /// Current keyboard focus, derived from overlay state.
    pub fn focus(&self) -> Focus {
        if self.modal.is_some() {
            Focus::Modal
        } else if self.dropdown.open {
            Focus::Dropdown
        } else {
            Focus::Cards
        }
    }

    /// Length of the currently filtered view.
    pub fn filtered_len(&self) -> usize {
        self.filter.derive(&self.articles).len()
    }

    /// The article under the cards cursor, if any.
    pub fn selected_article(&self) -> Option<Article> {
        let idx = self.cards_state.selected()?;
        let view = self.filter.derive(&self.articles);
        let shown = self.pager.rendered().min(view.len());
        view[..shown].get(idx).cloned()
    }

    // ---------------------------------------------------------------------
    // Load handling
    // ---------------------------------------------------------------------

    /// Process a completed load attempt.
    ///
    /// Results from a superseded generation are dropped entirely: the task
    /// already refreshed the cache, and this instance has moved on.
    pub fn handle_load_result(&mut self, result: LoadResult) {
        if result.generation != self.load_generation {
            return;
        }

        self.is_loading = false;

        if let Some(err) = result.error {
            // Failure is terminal for this attempt: keep whatever is on
            // screen, no retry.
            self.status_message = Some(format!("Failed to load feed: {err}"));
            return;
        }

        if let Some(payload) = result.payload {
            self.apply_payload(payload);
        }
    }

    /// Replace the article set and stats wholesale and re-render the first
    /// page of the unfiltered view.
    fn apply_payload(&mut self, payload: FeedPayload) {
        self.articles = payload.article_data;
        self.stats = Some(payload.statistical_data);
        self.authors = filter::distinct_authors(&self.articles);
        self.filter.clear();
        self.dropdown.clamp_cursor(self.authors.len());
        self.reset_view();
    }

    /// Reset the cursor to the first page of the current filtered view and
    /// snap the selection back to the top.
    fn reset_view(&mut self) {
        let len = self.filtered_len();
        self.pager.first_page(len);
        self.cards_state
            .select((self.pager.rendered() > 0).then_some(0));
    }

    /// Discard all instance state and re-run initialization. Stands in for
    /// the host page's "content replaced" signal.
    fn reinitialize(&mut self) {
        self.articles.clear();
        self.stats = None;
        self.authors.clear();
        self.filter.clear();
        self.pager = Pager::new(self.config.page_turning_number);
        self.dropdown = DropdownState::default();
        self.modal = None;
        self.cards_state = ListState::default();
        self.status_message = None;
        self.start_load();
    }

    // ---------------------------------------------------------------------
    // Action dispatch
    // ---------------------------------------------------------------------

    /// Process a single user action, updating all relevant state.
    pub fn update(&mut self, action: Action) {
        // Clear any transient diagnostic on the next user action.
        self.status_message = None;

        match action {
            Action::Quit => {
                self.should_quit = true;
            }

            Action::Reload => {
                self.reinitialize();
            }

            Action::MoveDown => self.move_focused(1),
            Action::MoveUp => self.move_focused(-1),

            Action::JumpToTop => {
                if self.rendered_count() > 0 {
                    self.cards_state.select(Some(0));
                }
            }

            Action::JumpToBottom => {
                let shown = self.rendered_count();
                if shown > 0 {
                    self.cards_state.select(Some(shown - 1));
                }
            }

            Action::OpenLink => {
                if let Some(article) = self.selected_article() {
                    open_in_browser(article.link);
                }
            }

            Action::OpenAuthorModal => {
                if let Some(article) = self.selected_article() {
                    let content =
                        ModalContent::for_author(&article, &self.articles, &self.config.error_img);
                    let now = Instant::now();
                    match self.modal.take() {
                        Some(mut modal) => {
                            modal.repopulate(content, now);
                            self.modal = Some(modal);
                        }
                        None => self.modal = Some(Modal::open(content, now)),
                    }
                }
            }

            Action::ToggleFilterDropdown => {
                if self.dropdown.open {
                    self.dropdown.close();
                } else {
                    self.dropdown.clamp_cursor(self.authors.len());
                    self.dropdown.open = true;
                }
            }

            Action::LoadMore => {
                let len = self.filtered_len();
                // Exhaustion needs no handling here: the control hides once
                // nothing remains.
                let _ = self.pager.next_page(len);
            }

            Action::ToggleAuthor => {
                if let Some(author) = self.authors.get(self.dropdown.cursor).cloned() {
                    self.filter.toggle(&author);
                    self.reset_view();
                }
            }

            Action::ClearFilter => {
                if !self.filter.is_empty() {
                    self.filter.clear();
                    self.reset_view();
                }
            }

            Action::CloseOverlay => {
                if let Some(modal) = self.modal.as_mut() {
                    modal.request_close(Instant::now());
                } else {
                    self.dropdown.close();
                }
            }

            Action::OpenAuthorSite => {
                if let Some(site) = self.modal.as_ref().and_then(|m| m.content.site.clone()) {
                    open_in_browser(site);
                }
            }

            Action::OpenModalArticle(n) => {
                let link = self
                    .modal
                    .as_ref()
                    .and_then(|m| m.content.entries.get(n - 1))
                    .map(|e| e.link.clone());
                if let Some(link) = link {
                    open_in_browser(link);
                }
            }
        }
    }

    fn rendered_count(&self) -> usize {
        self.pager.rendered().min(self.filtered_len())
    }

    /// Move the cards selection or the dropdown cursor, depending on focus.
    fn move_focused(&mut self, delta: i32) {
        match self.focus() {
            Focus::Dropdown => self.dropdown.move_cursor(delta, self.authors.len()),
            Focus::Cards => self.move_card_selection(delta),
            Focus::Modal => {}
        }
    }

    /// Move the cards selection by `delta`, wrapping circularly.
    fn move_card_selection(&mut self, delta: i32) {
        let len = self.rendered_count();
        if len == 0 {
            return;
        }
        let current = self.cards_state.selected().unwrap_or(0) as i32;
        let new_idx = (current + delta).rem_euclid(len as i32) as usize;
        self.cards_state.select(Some(new_idx));
    }

    // ---------------------------------------------------------------------
    // Mouse, resize and tick handling
    // ---------------------------------------------------------------------

    /// Route a mouse event to the overlays.
    pub fn handle_mouse(&mut self, mouse: &MouseEvent) {
        match mouse.kind {
            // Scrolling closes the dropdown.
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                self.dropdown.close();
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.handle_click(Position::new(mouse.column, mouse.row));
            }
            _ => {}
        }
    }

    fn handle_click(&mut self, pos: Position) {
        // A click on the modal's background region dismisses it; clicks on
        // its content are inert.
        if let Some(modal) = self.modal.as_mut() {
            let on_content = modal.area.is_some_and(|a| a.contains(pos));
            if !on_content {
                modal.request_close(Instant::now());
            }
            return;
        }

        if self.dropdown.open {
            // Inside the body: toggle the row under the pointer, keep open.
            if self.dropdown.contains(pos) {
                if let Some(idx) = self.dropdown.row_at(pos, self.authors.len()) {
                    self.dropdown.cursor = idx;
                    self.update(Action::ToggleAuthor);
                }
                return;
            }
            // Anywhere else (including the button) closes it.
            self.dropdown.close();
            return;
        }

        if self.dropdown.button_contains(pos) {
            self.update(Action::ToggleFilterDropdown);
        }
    }

    /// The terminal was resized: the floating dropdown loses its anchor.
    pub fn on_resize(&mut self) {
        self.dropdown.close();
    }

    /// Periodic tick: drive the modal transition clock.
    pub fn tick(&mut self) {
        if let Some(modal) = self.modal.as_mut() {
            if modal.advance(Instant::now()) {
                // Exit transition finished: remove the overlay entirely.
                self.modal = None;
            }
        }
    }
}

/// Open a URL in the system browser without blocking the TUI.
fn open_in_browser(url: String) {
    tokio::spawn(async move {
        let _ = open::that(&url);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::modal::Phase;

    fn article(title: &str, author: &str) -> Article {
        Article {
            title: title.to_string(),
            link: format!("https://{}.example.com/{title}", author.to_lowercase()),
            author: author.to_string(),
            avatar: None,
            created: "2024-05-01T00:00:00".to_string(),
        }
    }

    fn stats(article_num: u64) -> FeedStats {
        FeedStats {
            friends_num: 10,
            active_num: 8,
            article_num,
            last_updated_time: "2024-05-02 10:00:00".to_string(),
        }
    }

    fn test_app() -> App {
        let path = std::env::temp_dir().join(format!(
            "circlet-app-test-{}-{}.db",
            std::process::id(),
            rand_suffix()
        ));
        let _ = std::fs::remove_file(&path);
        let store = cache::Store::open_at(path).unwrap();
        let (app, _rx) = App::new_with_receiver(Config::default(), store, reqwest::Client::new());
        app
    }

    fn rand_suffix() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64)
            .unwrap_or(0)
    }

    fn loaded_app(articles: Vec<Article>) -> App {
        let mut app = test_app();
        let n = articles.len() as u64;
        app.apply_payload(FeedPayload {
            article_data: articles,
            statistical_data: stats(n),
        });
        app
    }

    #[test]
    fn thirty_articles_render_24_then_load_more_shows_the_rest() {
        let articles: Vec<Article> = (0..30).map(|i| article(&format!("t{i}"), "Ann")).collect();
        let mut app = loaded_app(articles);

        assert_eq!(app.rendered_count(), 24);
        assert!(app.pager.more_available(app.filtered_len()));

        app.update(Action::LoadMore);
        assert_eq!(app.rendered_count(), 30);
        assert!(!app.pager.more_available(app.filtered_len()));

        // A further load-more is a no-op.
        app.update(Action::LoadMore);
        assert_eq!(app.rendered_count(), 30);
    }

    #[test]
    fn selecting_an_author_filters_and_clearing_restores() {
        let mut app = loaded_app(vec![
            article("a1", "Ann"),
            article("b1", "Bob"),
            article("a2", "Ann"),
            article("a3", "Ann"),
            article("b2", "Bob"),
        ]);

        assert_eq!(app.authors, vec!["Ann", "Bob"]);
        assert_eq!(app.rendered_count(), 5);

        app.update(Action::ToggleFilterDropdown);
        assert_eq!(app.focus(), Focus::Dropdown);
        app.update(Action::ToggleAuthor); // cursor on "Ann"
        assert_eq!(app.rendered_count(), 3);
        assert_eq!(app.filter.label(), "1 authors selected");
        assert_eq!(app.cards_state.selected(), Some(0));

        app.update(Action::ClearFilter);
        assert_eq!(app.rendered_count(), 5);
        assert_eq!(app.filter.label(), "filter by author (all)");
    }

    #[test]
    fn filter_change_resets_the_cursor() {
        let articles: Vec<Article> = (0..30)
            .map(|i| {
                let author = if i % 2 == 0 { "Ann" } else { "Bob" };
                article(&format!("t{i}"), author)
            })
            .collect();
        let mut app = loaded_app(articles);
        app.update(Action::LoadMore);
        assert_eq!(app.pager.rendered(), 30);

        app.update(Action::ToggleFilterDropdown);
        app.update(Action::ToggleAuthor); // select "Ann": 15 articles
        assert_eq!(app.pager.rendered(), 15);
        assert!(app.pager.rendered() <= app.filtered_len());
    }

    #[test]
    fn stale_generation_results_are_ignored() {
        let mut app = test_app();
        app.load_generation = 3;

        app.handle_load_result(LoadResult {
            generation: 2,
            from_cache: false,
            payload: Some(FeedPayload {
                article_data: vec![article("old", "Ann")],
                statistical_data: stats(1),
            }),
            error: None,
        });

        assert!(app.articles.is_empty());
        assert!(app.stats.is_none());
    }

    #[test]
    fn load_errors_leave_prior_state_untouched() {
        let mut app = loaded_app(vec![article("a1", "Ann")]);
        app.load_generation = 1;

        app.handle_load_result(LoadResult {
            generation: 1,
            from_cache: false,
            payload: None,
            error: Some("HTTP 500".to_string()),
        });

        assert_eq!(app.articles.len(), 1);
        assert!(app.status_message.as_deref().unwrap().contains("HTTP 500"));
    }

    #[test]
    fn successful_load_replaces_the_set_wholesale() {
        let mut app = loaded_app(vec![article("a1", "Ann")]);
        app.load_generation = 2;

        app.handle_load_result(LoadResult {
            generation: 2,
            from_cache: true,
            payload: Some(FeedPayload {
                article_data: vec![article("b1", "Bob"), article("b2", "Bob")],
                statistical_data: stats(2),
            }),
            error: None,
        });

        assert_eq!(app.articles.len(), 2);
        assert_eq!(app.authors, vec!["Bob"]);
        assert!(app.filter.is_empty());
        assert_eq!(app.rendered_count(), 2);
    }

    #[test]
    fn author_modal_reads_from_the_full_set() {
        let mut app = loaded_app(vec![
            article("a1", "Ann"),
            article("b1", "Bob"),
            article("a2", "Ann"),
        ]);

        // Filter down to Bob, then open the modal for the selected card.
        app.update(Action::ToggleFilterDropdown);
        app.dropdown.cursor = 1;
        app.update(Action::ToggleAuthor);
        app.update(Action::CloseOverlay);
        assert_eq!(app.rendered_count(), 1);

        app.update(Action::OpenAuthorModal);
        let modal = app.modal.as_ref().unwrap();
        assert_eq!(modal.content.author, "Bob");
        assert_eq!(modal.phase(), Phase::Opening);

        // Re-invoking repopulates the same overlay.
        app.update(Action::OpenAuthorModal);
        assert!(app.modal.is_some());
    }

    #[test]
    fn close_overlay_closes_the_dropdown_when_no_modal_is_up() {
        let mut app = loaded_app(vec![article("a1", "Ann")]);
        app.update(Action::ToggleFilterDropdown);
        app.update(Action::CloseOverlay);
        assert!(!app.dropdown.open);
        assert_eq!(app.focus(), Focus::Cards);
    }

    #[test]
    fn reinitialize_discards_instance_state() {
        let mut app = loaded_app(vec![article("a1", "Ann"), article("b1", "Bob")]);
        app.update(Action::ToggleFilterDropdown);
        app.update(Action::ToggleAuthor);
        app.status_message = Some("stale".to_string());

        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        let generation_before = app.load_generation;
        app.update(Action::Reload);

        assert!(app.articles.is_empty());
        assert!(app.stats.is_none());
        assert!(app.filter.is_empty());
        assert!(!app.dropdown.open);
        assert!(app.modal.is_none());
        assert!(app.status_message.is_none());
        assert!(app.is_loading);
        assert_eq!(app.load_generation, generation_before + 1);
    }

    #[test]
    fn card_selection_wraps_within_the_rendered_page() {
        let articles: Vec<Article> = (0..30).map(|i| article(&format!("t{i}"), "Ann")).collect();
        let mut app = loaded_app(articles);

        app.update(Action::MoveUp);
        assert_eq!(app.cards_state.selected(), Some(23));
        app.update(Action::MoveDown);
        assert_eq!(app.cards_state.selected(), Some(0));
        app.update(Action::JumpToBottom);
        assert_eq!(app.cards_state.selected(), Some(23));
    }
}
