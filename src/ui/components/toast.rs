use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::time::{Duration, Instant};

use crate::ui::renderfns::truncate;

/// How long a notification stays on screen
pub const TOAST_TTL: Duration = Duration::from_secs(4);

const MAX_VISIBLE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
  Success,
  Error,
  Info,
}

impl ToastLevel {
  fn color(self) -> Color {
    match self {
      ToastLevel::Success => Color::Green,
      ToastLevel::Error => Color::Red,
      ToastLevel::Info => Color::Cyan,
    }
  }
}

/// A transient notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub level: ToastLevel,
  pub message: String,
}

impl Notification {
  pub fn success(message: impl Into<String>) -> Self {
    Self {
      level: ToastLevel::Success,
      message: message.into(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      level: ToastLevel::Error,
      message: message.into(),
    }
  }

  pub fn info(message: impl Into<String>) -> Self {
    Self {
      level: ToastLevel::Info,
      message: message.into(),
    }
  }
}

#[derive(Debug)]
struct Toast {
  notification: Notification,
  shown_at: Instant,
}

/// Stack of notifications drawn in the bottom-right corner
#[derive(Debug)]
pub struct Toasts {
  items: Vec<Toast>,
  ttl: Duration,
}

impl Default for Toasts {
  fn default() -> Self {
    Self {
      items: Vec::new(),
      ttl: TOAST_TTL,
    }
  }
}

impl Toasts {
  pub fn new() -> Self {
    Self::default()
  }

  #[cfg(test)]
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn push(&mut self, notification: Notification) {
    self.items.push(Toast {
      notification,
      shown_at: Instant::now(),
    });
  }

  /// Drop expired notifications. Returns true if any were removed.
  pub fn prune(&mut self) -> bool {
    let before = self.items.len();
    let ttl = self.ttl;
    self.items.retain(|t| t.shown_at.elapsed() < ttl);
    self.items.len() != before
  }

  pub fn visible(&self) -> impl Iterator<Item = &Notification> {
    let skip = self.items.len().saturating_sub(MAX_VISIBLE);
    self.items.iter().skip(skip).map(|t| &t.notification)
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let width = 44.min(area.width);
    let mut bottom = area.y + area.height;

    // Newest at the bottom, older ones stacked above
    for notification in self.visible().collect::<Vec<_>>().into_iter().rev() {
      let height = 3;
      if bottom < area.y + height {
        break;
      }
      bottom -= height;
      let toast_area = Rect::new(area.x + area.width - width, bottom, width, height);

      let color = notification.level.color();
      let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
      let text = truncate(&notification.message, width.saturating_sub(4) as usize);

      frame.render_widget(Clear, toast_area);
      frame.render_widget(
        Paragraph::new(text)
          .style(Style::default().fg(color))
          .wrap(Wrap { trim: true })
          .block(block),
        toast_area,
      );
    }
  }
}
