use super::KeyResult;
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailEvent {
  Closed,
  /// Ask the server for the latest copy of the record
  Reload,
}

/// Read-only view of one record
#[derive(Debug, Clone)]
pub struct DetailModal {
  title: String,
  rows: Vec<(&'static str, String)>,
  scroll: u16,
  loading: bool,
}

impl DetailModal {
  pub fn new(title: impl Into<String>, rows: Vec<(&'static str, String)>) -> Self {
    Self {
      title: title.into(),
      rows,
      scroll: 0,
      loading: false,
    }
  }

  #[cfg(test)]
  pub fn rows(&self) -> &[(&'static str, String)] {
    &self.rows
  }

  pub fn set_rows(&mut self, rows: Vec<(&'static str, String)>) {
    self.rows = rows;
    self.loading = false;
  }

  pub fn set_loading(&mut self, loading: bool) {
    self.loading = loading;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<DetailEvent> {
    match key.code {
      KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('v') | KeyCode::Enter => {
        KeyResult::Event(DetailEvent::Closed)
      }
      KeyCode::Char('r') => KeyResult::Event(DetailEvent::Reload),
      KeyCode::Char('j') | KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let label_width = self.rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0) + 2;

    let mut lines: Vec<Line> = Vec::new();
    for (label, value) in &self.rows {
      let mut value_lines = value.lines();
      lines.push(Line::from(vec![
        Span::styled(
          format!("{:<width$}", label, width = label_width),
          Style::default().fg(Color::DarkGray),
        ),
        Span::raw(value_lines.next().unwrap_or("").to_string()),
      ]));
      for more in value_lines {
        lines.push(Line::from(vec![
          Span::raw(" ".repeat(label_width)),
          Span::raw(more.to_string()),
        ]));
      }
    }

    let footer = if self.loading {
      Span::styled("Refreshing...", Style::default().fg(Color::Yellow))
    } else {
      Span::styled("<esc> close  <r> reload  <j/k> scroll", Style::default().fg(Color::DarkGray))
    };
    lines.push(Line::raw(""));
    lines.push(Line::from(footer));

    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2).max(5));
    let overlay_area = centered_rect(70, height, area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue))
      .title(format!(" {} ", self.title))
      .title_alignment(Alignment::Center);

    frame.render_widget(
      Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((self.scroll, 0)),
      overlay_area,
    );
  }
}
