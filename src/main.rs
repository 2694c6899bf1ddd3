use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use circlet::{action, app::App, cache, config, event, feed, ui};

const LONG_HELP: &str = r#"
CONFIGURATION
    Configuration file: $XDG_CONFIG_HOME/circlet/config.yaml
                       (typically ~/.config/circlet/config.yaml)

    Feed cache:        $XDG_CACHE_HOME/circlet/feed.db
                       (typically ~/.cache/circlet/feed.db)

    Example configuration:
        private_api_url: "https://feed.example.com/"
        page_turning_number: 24      # Cards added per "load more"
        error_img: "https://cdn.example.com/fallback.ico"
        display:
          colours:
            active_border: "cyan"
            inactive_border: "darkgray"
            border_type: "plain"     # plain, double, thick, rounded
            highlight_bg: "darkgray"
            accent: "cyan"
        keybindings:
          global:
            quit: ["q", "Ctrl-c"]
            reload: "r"
            jump_top: "g"
            jump_bottom: "G"
          cards:
            move_down: ["j", "Down"]
            move_up: ["k", "Up"]
            open_link: "Enter"
            open_author: "a"
            toggle_filter: "f"
            load_more: "Space"
          dropdown:
            toggle_author: "Space"
            clear: "c"
            close: ["Esc", "f"]
          modal:
            close: ["Esc"]
            open_site: "o"

KEYBINDINGS
    Cards:
        j, ↓           Move down
        k, ↑           Move up
        Enter          Open article in browser
        a              Author overlay for the selected card
        f              Author filter dropdown
        Space          Load more cards
        g / G          Jump to top / bottom
        r              Reload (discard state, re-read cache, refetch)
        q, Ctrl+c      Quit

    Filter dropdown:
        j, ↓ / k, ↑    Move
        Space          Toggle the author under the cursor
        c              Clear the selection
        Esc, f         Close

    Author overlay:
        1-4            Open the n-th listed article
        o              Open the author's site
        Esc            Close

    The dropdown also closes on outside clicks, scrolling, and resizes;
    the overlay closes on a click outside its box.

FEED
    The loader fetches {private_api_url}all.json, a JSON document with
    article_data (title, link, author, avatar, created) and
    statistical_data. Payloads are cached for 30 minutes; within that
    window a reload is served locally.

Project homepage: https://github.com/sujaltv/circlet
"#;

/// circlet - a terminal friend-circle feed browser
#[derive(Parser, Debug)]
#[command(name = "circlet")]
#[command(author = "Sujal T. V. <sujal@svijay.com>")]
#[command(version)]
#[command(about = "Browse a friend-circle aggregate feed from the terminal", long_about = None)]
#[command(after_help = LONG_HELP)]
struct Args {
    /// Override the configured aggregate feed base URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Override the number of cards added per "load more".
    #[arg(long)]
    page_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1. Load configuration from the XDG config dir, then apply CLI
    //    overrides.
    let mut config = config::load()?;
    if let Some(api_url) = args.api_url {
        config.private_api_url = api_url;
    }
    if let Some(page_size) = args.page_size {
        config.page_turning_number = page_size;
    }

    // 2. Open the feed cache (creates the database if needed).
    let store = cache::Store::open_default()?;

    // 3. Build the application state and start the initial load.
    let (mut app, mut load_rx) = App::new_with_receiver(config, store, feed::build_client());
    app.start_load();

    // 4. Set up the terminal for TUI rendering; mouse events drive the
    //    overlay hit-testing.
    let mut terminal = ratatui::init();
    crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;

    // 5. Create the async event source (250 ms tick rate).
    let mut events = event::Events::new(250);

    // 6. Main event loop.
    loop {
        // Draw the current state.
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        tokio::select! {
            // Terminal input events
            event = events.next() => {
                match event? {
                    event::Event::Key(key) => {
                        if let Some(act) = action::handle_key(&key, app.focus(), &app.config.keybindings) {
                            app.update(act);
                        }
                    }
                    event::Event::Mouse(mouse) => app.handle_mouse(&mouse),
                    event::Event::Resize => app.on_resize(),
                    event::Event::Tick => app.tick(),
                }
            }
            // Load results (from the cache/fetch task)
            Some(result) = load_rx.recv() => {
                app.handle_load_result(result);
            }
        }

        if app.should_quit {
            break;
        }
    }

    // 7. Restore the terminal to its original state.
    crossterm::execute!(std::io::stdout(), DisableMouseCapture)?;
    ratatui::restore();

    Ok(())
}
