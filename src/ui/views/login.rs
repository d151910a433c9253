use crate::api::{AuthClient, User};
use crate::event::{Event, EventSender};
use crate::query::Mutation;
use crate::ui::components::{InputResult, Notification, TextInput};
use crate::ui::renderfns::centered_rect;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::warn;

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Email,
  Password,
}

/// Email/password form shown while nobody is signed in
pub struct LoginView {
  auth: AuthClient,
  events: EventSender,
  email: TextInput,
  password: TextInput,
  focus: Field,
  login: Mutation<User>,
}

impl LoginView {
  pub fn new(auth: AuthClient, events: EventSender, email: Option<&str>) -> Self {
    let email = TextInput::new().with_value(email.unwrap_or(""));
    let focus = if email.is_empty() {
      Field::Email
    } else {
      Field::Password
    };

    Self {
      auth,
      events,
      email,
      password: TextInput::masked(),
      focus,
      login: Mutation::default(),
    }
  }

  fn notify(&self, notification: Notification) {
    let _ = self.events.send(Event::Notify(notification));
  }

  fn focused(&mut self) -> &mut TextInput {
    match self.focus {
      Field::Email => &mut self.email,
      Field::Password => &mut self.password,
    }
  }

  fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      Field::Email => Field::Password,
      Field::Password => Field::Email,
    };
  }

  fn submit(&mut self) {
    let email = self.email.value().trim().to_string();
    let password = self.password.value().to_string();
    if email.is_empty() || password.is_empty() {
      self.notify(Notification::error("Email and password are required"));
      return;
    }

    let auth = self.auth.clone();
    self.login = Mutation::spawn(async move { auth.login(&email, &password).await });
  }

  fn render_form(&self, frame: &mut Frame, area: Rect) {
    let form_area = centered_rect(50, 10, area);
    frame.render_widget(Clear, form_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue))
      .title(" Sign in ")
      .title_alignment(Alignment::Center);

    let field = |label: &'static str, value: String, focused: bool| {
      let label_style = if focused {
        Style::default().fg(Color::Yellow).bold()
      } else {
        Style::default().fg(Color::DarkGray)
      };
      let mut spans = vec![
        Span::styled(format!("{:<10}", label), label_style),
        Span::raw(value),
      ];
      if focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      }
      Line::from(spans)
    };

    let status = if self.login.is_pending() {
      Line::styled("Signing in...", Style::default().fg(Color::Yellow))
    } else {
      Line::styled(
        "<tab> switch field  <enter> sign in",
        Style::default().fg(Color::DarkGray),
      )
    };

    let lines = vec![
      Line::raw(""),
      field("Email", self.email.display(), self.focus == Field::Email),
      Line::raw(""),
      field("Password", self.password.display(), self.focus == Field::Password),
      Line::raw(""),
      Line::raw(""),
      status,
    ];

    frame.render_widget(Paragraph::new(lines).block(block), form_area);
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.login.is_pending() {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.toggle_focus(),
      _ => match self.focused().handle_key(key) {
        InputResult::Submitted(_) => self.submit(),
        InputResult::Cancelled if self.focus == Field::Password => self.password.clear(),
        _ => {}
      },
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_form(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Login".to_string()
  }

  fn captures_input(&self) -> bool {
    true
  }

  fn tick(&mut self) {
    match self.login.poll() {
      Some(Ok(user)) => {
        self.password.clear();
        self.notify(Notification::success("Login successful!"));
        let _ = self.events.send(Event::SignedIn(user));
      }
      Some(Err(err)) => {
        warn!("Login failed: {}", err);
        self.notify(Notification::error(err.user_message(LOGIN_FAILED)));
      }
      None => {}
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("tab", "next field").with_priority(10),
      ShortcutInfo::new("enter", "sign in").with_priority(20),
      ShortcutInfo::new("ctrl-c", "quit").with_priority(90),
    ]
  }
}
