use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// Key hint shown in the header, ordered by `priority`
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8,
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// What a view asks the App to do after a key press
pub enum ViewAction {
  /// Stay put
  None,
  /// Leave this view; on the root view this quits
  Pop,
}

/// A screen on the view stack.
///
/// Views handle their own input modes (search, forms, confirmations) and
/// return actions for the App to execute: App → View → Components.
///
/// Views that load data asynchronously hold a `Query<T>` or `Mutation<T>`
/// and poll it in `tick()`.
pub trait View {
  /// Keys reach the view only after the App's global bindings
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Label for this view in the footer breadcrumb
  fn breadcrumb_label(&self) -> String;

  /// Display name of the collection on screen, for the header
  fn resource(&self) -> Option<&str> {
    None
  }

  /// True while the view is typing into an input, so global keys such as
  /// `:` must be passed through instead of opening the command palette
  fn captures_input(&self) -> bool {
    false
  }

  /// Poll in-flight queries and mutations; called every tick
  fn tick(&mut self) {}

  /// Hints for the header, in any order
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
