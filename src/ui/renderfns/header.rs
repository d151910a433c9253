use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::view::ShortcutInfo;

/// Header context: who is signed in and what is on screen
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderInfo<'a> {
  pub title: &'a str,
  pub user: Option<&'a str>,
  pub resource: Option<&'a str>,
}

/// Draw the header bar with title, context, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, info: HeaderInfo, shortcuts: &[ShortcutInfo]) {
  let paragraph =
    Paragraph::new(header_line(info, shortcuts)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn header_line<'a>(info: HeaderInfo<'a>, shortcuts: &[ShortcutInfo]) -> Line<'a> {
  let separator = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::styled(format!(" {} ", info.title), Style::default().fg(Color::Cyan).bold()),
    separator(),
    Span::styled(
      format!(" {} ", info.user.unwrap_or("signed out")),
      Style::default().fg(Color::White),
    ),
  ];

  if let Some(resource) = info.resource {
    spans.push(separator());
    spans.push(Span::styled(
      format!(" {} ", resource),
      Style::default().fg(Color::Yellow).bold(),
    ));
  }

  spans.push(Span::raw(" "));

  for shortcut in sorted(shortcuts) {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  Line::from(spans)
}

fn sorted(shortcuts: &[ShortcutInfo]) -> Vec<&ShortcutInfo> {
  let mut sorted: Vec<_> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);
  sorted
}
