use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::api::Pagination;

/// Page controls derived from the server's pagination block. The page
/// numbers shown are always the server's; nothing is computed locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationControl {
  pub current_page: u32,
  pub total_pages: u32,
  pub disabled: bool,
}

impl PaginationControl {
  pub fn new(pagination: Option<Pagination>, loading: bool) -> Self {
    match pagination {
      Some(p) => Self {
        current_page: p.current_page,
        total_pages: p.total_pages,
        disabled: loading,
      },
      None => Self {
        current_page: 1,
        total_pages: 1,
        disabled: true,
      },
    }
  }

  pub fn can_prev(&self) -> bool {
    !self.disabled && self.current_page > 1
  }

  pub fn can_next(&self) -> bool {
    !self.disabled && self.current_page < self.total_pages
  }

  pub fn label(&self) -> String {
    format!("Page {} of {}", self.current_page, self.total_pages.max(1))
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let enabled = Style::default().fg(Color::Cyan);
    let dimmed = Style::default().fg(Color::DarkGray);

    let line = Line::from(vec![
      Span::styled("<h> prev", if self.can_prev() { enabled } else { dimmed }),
      Span::raw("   "),
      Span::styled(
        self.label(),
        if self.disabled {
          dimmed
        } else {
          Style::default().fg(Color::White).bold()
        },
      ),
      Span::raw("   "),
      Span::styled("next <l>", if self.can_next() { enabled } else { dimmed }),
    ]);

    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
  }
}
