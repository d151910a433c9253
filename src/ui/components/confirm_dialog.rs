use super::KeyResult;
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmEvent {
  Confirmed,
  Cancelled,
}

/// Yes/no confirmation before an irreversible action
#[derive(Debug, Clone)]
pub struct ConfirmDialog {
  title: String,
  message: String,
  pending: bool,
}

impl ConfirmDialog {
  pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      message: message.into(),
      pending: false,
    }
  }

  /// While the action runs the dialog stays up and ignores input
  pub fn set_pending(&mut self, pending: bool) {
    self.pending = pending;
  }

  #[cfg(test)]
  pub fn is_pending(&self) -> bool {
    self.pending
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ConfirmEvent> {
    if self.pending {
      return KeyResult::Handled;
    }

    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
        KeyResult::Event(ConfirmEvent::Confirmed)
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('q') | KeyCode::Esc => {
        KeyResult::Event(ConfirmEvent::Cancelled)
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let overlay_area = centered_rect(50, 7, area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(format!(" {} ", self.title))
      .title_alignment(Alignment::Center);

    let prompt = if self.pending {
      Line::from(Span::styled("Deleting...", Style::default().fg(Color::Yellow)))
    } else {
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Red).bold()),
        Span::styled(" confirm   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
      ])
    };

    let text = vec![
      Line::raw(self.message.clone()),
      Line::styled("This cannot be undone.", Style::default().fg(Color::DarkGray)),
      Line::raw(""),
      prompt,
    ];

    frame.render_widget(
      Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block),
      overlay_area,
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_confirm_keys() {
    let mut dialog = ConfirmDialog::new("Delete book", "Delete \"Clean Code\"?");
    assert_eq!(
      dialog.handle_key(key(KeyCode::Char('y'))),
      KeyResult::Event(ConfirmEvent::Confirmed)
    );
    assert_eq!(
      dialog.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(ConfirmEvent::Confirmed)
    );
  }

  #[test]
  fn test_cancel_keys() {
    let mut dialog = ConfirmDialog::new("Delete book", "Delete?");
    assert_eq!(
      dialog.handle_key(key(KeyCode::Char('n'))),
      KeyResult::Event(ConfirmEvent::Cancelled)
    );
    assert_eq!(
      dialog.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(ConfirmEvent::Cancelled)
    );
  }

  #[test]
  fn test_other_keys_swallowed() {
    let mut dialog = ConfirmDialog::new("Delete book", "Delete?");
    assert_eq!(dialog.handle_key(key(KeyCode::Char('d'))), KeyResult::Handled);
  }

  #[test]
  fn test_pending_ignores_input() {
    let mut dialog = ConfirmDialog::new("Delete book", "Delete?");
    dialog.set_pending(true);
    assert_eq!(dialog.handle_key(key(KeyCode::Char('y'))), KeyResult::Handled);
    assert!(dialog.is_pending());
  }
}
