use std::time::Duration;

use crossterm::event::{
    Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use futures::StreamExt;
use tokio::sync::mpsc;

/// Application-level events funneled from crossterm and a periodic tick
/// timer.
#[derive(Debug)]
pub enum Event {
    /// A keyboard key was pressed.
    Key(KeyEvent),
    /// A left click or a scroll step, used for overlay hit-testing.
    Mouse(MouseEvent),
    /// The terminal was resized.
    Resize,
    /// A periodic tick — drives the modal transition clock.
    Tick,
}

/// Bridges crossterm's async `EventStream` with the application event loop.
///
/// A background task multiplexes terminal events with a fixed-interval tick;
/// consumers call [`Events::next`] to receive the next event.
pub struct Events {
    rx: mpsc::UnboundedReceiver<Event>,
    // Held so the task is cancelled when `Events` is dropped.
    _task: tokio::task::JoinHandle<()>,
}

/// Keep only the mouse events the application reacts to: left clicks and
/// scroll steps. Everything else (drags, moves, releases) is noise.
fn map_mouse(mouse: MouseEvent) -> Option<Event> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left)
        | MouseEventKind::ScrollUp
        | MouseEventKind::ScrollDown => Some(Event::Mouse(mouse)),
        _ => None,
    }
}

impl Events {
    /// Create a new event source with the given tick rate (in milliseconds).
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut tick_interval = tokio::time::interval(Duration::from_millis(tick_rate_ms));

            loop {
                let mapped = tokio::select! {
                    _ = tick_interval.tick() => Some(Event::Tick),
                    maybe_event = reader.next() => match maybe_event {
                        Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            Some(Event::Key(key))
                        }
                        Some(Ok(CrosstermEvent::Mouse(mouse))) => map_mouse(mouse),
                        Some(Ok(CrosstermEvent::Resize(_, _))) => Some(Event::Resize),
                        // Key releases, focus changes, pastes — ignored.
                        Some(Ok(_)) => None,
                        // Stream error or end; shut down.
                        Some(Err(_)) | None => break,
                    },
                };

                if let Some(event) = mapped {
                    if tx.send(event).is_err() {
                        // Receiver dropped; shut down.
                        break;
                    }
                }
            }
        });

        Self { rx, _task: task }
    }

    /// Wait for and return the next event.
    ///
    /// Returns an error if the internal channel has been closed (i.e. the
    /// background task exited).
    pub async fn next(&mut self) -> anyhow::Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Event channel closed"))
    }
}
