use crate::api::{http_client, AuthClient, ResourceClient};
use crate::cache::ResourceApi;
use crate::config::Config;
use crate::event::{Event, EventHandler, EventSender};
use crate::resources::{Books, Courses, Messages, Newspapers, Resource};
use crate::session::Session;
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult, Notification, Toasts};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{LoginView, ResourceListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One cached engine per collection, shared by every view that opens it
#[derive(Clone)]
struct Apis {
  books: ResourceApi<Books>,
  messages: ResourceApi<Messages>,
  newspapers: ResourceApi<Newspapers>,
  courses: ResourceApi<Courses>,
}

impl Apis {
  fn new(config: &Config, http: &reqwest::Client, session: &Session) -> Result<Self> {
    fn api<R: Resource>(http: &reqwest::Client, origin: &str, session: &Session) -> Result<ResourceApi<R>> {
      Ok(ResourceApi::new(ResourceClient::new(
        http.clone(),
        origin,
        session.clone(),
      )?))
    }

    let origins = &config.resources;
    Ok(Self {
      books: api(http, &origins.books.url, session)?,
      messages: api(http, &origins.messages.url, session)?,
      newspapers: api(http, &origins.newspapers.url, session)?,
      courses: api(http, &origins.courses.url, session)?,
    })
  }
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` palette, drawn over whatever view is on top
  command_input: CommandInput,

  toasts: Toasts,

  config: Config,

  auth: AuthClient,

  apis: Apis,

  /// Event sender for views and async tasks
  event_tx: EventSender,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, session: Session) -> Result<Self> {
    let http = http_client(&config.headers)?;
    let auth = AuthClient::new(http.clone(), &config.auth.url, session.clone())?;
    let apis = Apis::new(&config, &http, &session)?;
    // Replaced by the event handler's sender in run()
    let (tx, _rx) = mpsc::unbounded_channel();

    Ok(Self {
      view_stack: Vec::new(),
      command_input: CommandInput::new(),
      toasts: Toasts::new(),
      config,
      auth,
      apis,
      event_tx: tx,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(100));
    self.event_tx = events.sender();
    self.show_initial_view();

    // Main loop
    let result = async {
      while !self.should_quit {
        terminal.draw(|frame| ui::draw(frame, self))?;

        if let Some(event) = events.next().await {
          self.handle_event(event);
        }
      }
      Ok::<_, color_eyre::Report>(())
    }
    .await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  /// Dashboard when a stored session exists, otherwise the login form
  fn show_initial_view(&mut self) {
    if self.auth.session().is_signed_in() {
      let name = self.config.default_resource().to_string();
      self.open_resource(&name);
    } else {
      self.show_login();
    }
  }

  fn show_login(&mut self) {
    let view = LoginView::new(
      self.auth.clone(),
      self.event_tx.clone(),
      self.config.auth.email.as_deref(),
    );
    self.view_stack = vec![Box::new(view)];
  }

  fn list_view<R: Resource>(&self, api: &ResourceApi<R>) -> Box<dyn View> {
    Box::new(ResourceListView::new(
      api.clone(),
      self.event_tx.clone(),
      self.config.list.clone(),
    ))
  }

  /// Replace the stack with the named collection. Returns false for an
  /// unknown name.
  fn open_resource(&mut self, name: &str) -> bool {
    let view = match name {
      "books" => self.list_view(&self.apis.books),
      "messages" => self.list_view(&self.apis.messages),
      "newspapers" => self.list_view(&self.apis.newspapers),
      "courses" => self.list_view(&self.apis.courses),
      _ => return false,
    };
    info!(resource = name, "Opening collection");
    self.view_stack = vec![view];
    true
  }

  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  pub fn shortcuts(&self) -> Vec<ShortcutInfo> {
    self.current_view().map(|v| v.shortcuts()).unwrap_or_default()
  }

  pub fn title(&self) -> &str {
    self.config.title()
  }

  pub fn signed_in_user(&self) -> Option<String> {
    self.auth.session().user().map(|u| u.name)
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }

  pub fn toasts(&self) -> &Toasts {
    &self.toasts
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        if let Some(view) = self.view_stack.last_mut() {
          view.tick();
        }
        self.toasts.prune();
      }
      Event::Notify(notification) => self.toasts.push(notification),
      Event::SignedIn(user) => {
        info!(user = %user.name, "Session started");
        let name = self.config.default_resource().to_string();
        self.open_resource(&name);
      }
      Event::SignedOut => {
        self.toasts.push(Notification::info("Signed out"));
        self.show_login();
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let captured = self.current_view().is_some_and(|v| v.captures_input());
    if self.command_input.is_active() || !captured {
      match self.command_input.handle_key(key) {
        KeyResult::Handled | KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => return,
    };

    match action {
      ViewAction::None => {}
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    match cmd {
      "quit" => self.should_quit = true,
      "logout" => {
        if !self.auth.session().is_signed_in() {
          return;
        }
        let auth = self.auth.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
          auth.logout().await;
          let _ = tx.send(Event::SignedOut);
        });
      }
      name if !self.auth.session().is_signed_in() => {
        warn!(command = name, "Ignoring command while signed out");
        self
          .toasts
          .push(Notification::error("Sign in to open a collection"));
      }
      name => {
        if !self.open_resource(name) {
          self
            .toasts
            .push(Notification::error(format!("Unknown command: {}", name)));
        }
      }
    }
  }
}
