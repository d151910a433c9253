use ratatui::prelude::Rect;

/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// First line only, for table cells
pub fn single_line(s: &str) -> &str {
  s.lines().next().unwrap_or("")
}

/// A rectangle `percent_x` wide and `height` tall, centered in `area`
pub fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
  let width = (area.width * percent_x / 100).max(20).min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}
