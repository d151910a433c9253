use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::User;
use crate::ui::components::Notification;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for UI refresh and query polling
  Tick,
  /// Show a toast
  Notify(Notification),
  /// Login finished; swap the login view for the dashboard
  SignedIn(User),
  /// Session cleared; back to the login view
  SignedOut,
}

pub type EventSender = mpsc::UnboundedSender<Event>;

/// Event handler that produces events from terminal input and a tick timer.
/// Views and background tasks post their own events through `sender()`.
pub struct EventHandler {
  tx: EventSender,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    let terminal_tx = tx.clone();
    tokio::task::spawn_blocking(move || loop {
      let next = if event::poll(tick_rate).unwrap_or(false) {
        match event::read() {
          Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
          _ => None,
        }
      } else {
        Some(Event::Tick)
      };

      if let Some(next) = next {
        if terminal_tx.send(next).is_err() {
          break;
        }
      }
    });

    Self { tx, rx }
  }

  pub fn sender(&self) -> EventSender {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
