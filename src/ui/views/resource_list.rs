use crate::api::{ApiError, DeleteReceipt, ListQuery, ListResult};
use crate::cache::ResourceApi;
use crate::config::ListConfig;
use crate::event::{Event, EventSender};
use crate::query::{Mutation, Query};
use crate::resources::form::{build_payload, FormMode, FormValues};
use crate::resources::{capitalize, Record, Resource};
use crate::ui::components::{
  ConfirmDialog, ConfirmEvent, DetailEvent, DetailModal, FormEvent, FormModal, KeyResult,
  Notification, PaginationControl, SearchEvent, SearchInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{single_line, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use tracing::debug;

const SKELETON_ROWS: usize = 5;

enum Modal<R: Resource> {
  Form(FormModal),
  Delete {
    dialog: ConfirmDialog,
    id: String,
  },
  Detail {
    modal: DetailModal,
    id: String,
    reload: Option<Query<R::Item>>,
  },
}

enum Pending<R: Resource> {
  Create(Mutation<R::Item>),
  Update(Mutation<R::Item>),
  Delete(Mutation<DeleteReceipt>),
}

/// Outcome of a finished mutation, stripped of its payload
enum Settled {
  Created,
  Updated,
  Deleted,
  Failed { verb: &'static str, error: ApiError },
}

/// Paginated, searchable table for one collection, with the create,
/// edit, delete and view modals on top of it.
pub struct ResourceListView<R: Resource> {
  api: ResourceApi<R>,
  events: EventSender,
  config: ListConfig,
  page: u32,
  keyword: String,
  query: Query<ListResult<R::Item>>,
  /// Last page shown, kept on screen while a different page loads
  previous: Option<ListResult<R::Item>>,
  table_state: TableState,
  search: SearchInput,
  modal: Option<Modal<R>>,
  pending: Option<Pending<R>>,
}

impl<R: Resource> ResourceListView<R> {
  pub fn new(api: ResourceApi<R>, events: EventSender, config: ListConfig) -> Self {
    let page = 1;
    let keyword = String::new();
    let query = Self::start_query(&api, &config, page, &keyword);

    Self {
      api,
      events,
      config,
      page,
      keyword,
      query,
      previous: None,
      table_state: TableState::default(),
      search: SearchInput::new(),
      modal: None,
      pending: None,
    }
  }

  fn start_query(
    api: &ResourceApi<R>,
    config: &ListConfig,
    page: u32,
    keyword: &str,
  ) -> Query<ListResult<R::Item>> {
    let list_query = ListQuery::new(config.page_size, config.sort.as_str())
      .with_page(page)
      .with_keyword(keyword);
    let mut query = api.use_list(list_query);
    query.fetch();
    query
  }

  /// Point the table at the current page and keyword
  fn reload(&mut self) {
    if let Some(data) = self.query.data() {
      self.previous = Some(data.clone());
    }
    self.query = Self::start_query(&self.api, &self.config, self.page, &self.keyword);
  }

  fn data(&self) -> Option<&ListResult<R::Item>> {
    self.query.data().or(self.previous.as_ref())
  }

  fn items(&self) -> &[R::Item] {
    self.data().map(|d| d.items.as_slice()).unwrap_or(&[])
  }

  fn selected_item(&self) -> Option<&R::Item> {
    self.table_state.selected().and_then(|i| self.items().get(i))
  }

  fn pagination(&self) -> PaginationControl {
    PaginationControl::new(
      self.data().map(|d| d.pagination),
      self.query.is_loading(),
    )
  }

  fn notify(&self, notification: Notification) {
    let _ = self.events.send(Event::Notify(notification));
  }

  fn close_modal(&mut self) {
    self.modal = None;
    self.query.refetch();
  }

  fn open_create(&mut self) {
    let title = format!("New {}", R::NOUN);
    let form = FormModal::new(title, R::FIELDS, FormMode::Create, &FormValues::new());
    self.modal = Some(Modal::Form(form));
  }

  fn open_edit(&mut self) {
    let Some(item) = self.selected_item() else {
      return;
    };
    let title = format!("Edit {}", R::NOUN);
    let mode = FormMode::Update {
      id: item.id().to_string(),
    };
    let form = FormModal::new(title, R::FIELDS, mode, &R::form_values(item));
    self.modal = Some(Modal::Form(form));
  }

  fn open_delete(&mut self) {
    let Some(item) = self.selected_item() else {
      return;
    };
    let dialog = ConfirmDialog::new(
      format!("Delete {}", R::NOUN),
      format!("Delete \"{}\"?", truncate(&R::label(item), 40)),
    );
    let id = item.id().to_string();
    self.modal = Some(Modal::Delete { dialog, id });
  }

  fn open_detail(&mut self) {
    let Some(item) = self.selected_item() else {
      return;
    };
    let modal = DetailModal::new(capitalize(R::NOUN), R::details(item));
    let id = item.id().to_string();
    self.modal = Some(Modal::Detail {
      modal,
      id,
      reload: None,
    });
  }

  fn submit_form(&mut self, values: FormValues) {
    let Some(Modal::Form(form)) = &mut self.modal else {
      return;
    };
    let payload = build_payload(R::FIELDS, &values);
    let api = self.api.clone();

    let pending = match form.mode().clone() {
      FormMode::Create => Pending::Create(Mutation::spawn(async move { api.create(payload).await })),
      FormMode::Update { id } => {
        Pending::Update(Mutation::spawn(async move { api.update(&id, payload).await }))
      }
    };
    form.set_submitting(true);
    self.pending = Some(pending);
  }

  fn confirm_delete(&mut self) {
    let Some(Modal::Delete { dialog, id }) = &mut self.modal else {
      return;
    };
    let api = self.api.clone();
    let id = id.clone();
    dialog.set_pending(true);
    self.pending = Some(Pending::Delete(Mutation::spawn(async move {
      api.delete(&id).await
    })));
  }

  fn poll_pending(&mut self) {
    let settled = match &mut self.pending {
      Some(Pending::Create(m)) => m.poll().map(|r| match r {
        Ok(_) => Settled::Created,
        Err(error) => Settled::Failed {
          verb: "create",
          error,
        },
      }),
      Some(Pending::Update(m)) => m.poll().map(|r| match r {
        Ok(_) => Settled::Updated,
        Err(error) => Settled::Failed {
          verb: "update",
          error,
        },
      }),
      Some(Pending::Delete(m)) => m.poll().map(|r| match r {
        Ok(_) => Settled::Deleted,
        Err(error) => Settled::Failed {
          verb: "delete",
          error,
        },
      }),
      None => None,
    };

    let Some(settled) = settled else {
      return;
    };
    self.pending = None;

    let noun = capitalize(R::NOUN);
    match settled {
      Settled::Created => {
        if let Some(Modal::Form(form)) = &mut self.modal {
          form.reset();
        }
        self.notify(Notification::success(format!("{} created successfully", noun)));
        self.close_modal();
      }
      Settled::Updated => {
        self.notify(Notification::success(format!("{} updated successfully", noun)));
        self.close_modal();
      }
      Settled::Deleted => {
        self.notify(Notification::success(format!("{} deleted successfully", noun)));
        self.close_modal();
      }
      Settled::Failed { verb, error } => {
        match &mut self.modal {
          Some(Modal::Form(form)) => form.set_submitting(false),
          Some(Modal::Delete { dialog, .. }) => dialog.set_pending(false),
          _ => {}
        }
        let fallback = format!("Failed to {} {}", verb, R::NOUN);
        self.notify(Notification::error(error.user_message(&fallback)));
      }
    }
  }

  fn poll_detail(&mut self) {
    let Some(Modal::Detail {
      modal,
      reload: Some(query),
      ..
    }) = &mut self.modal
    else {
      return;
    };
    if !query.poll() || query.is_loading() {
      return;
    }

    if let Some(error) = query.error() {
      modal.set_loading(false);
      let message = error.user_message(&format!("Failed to load {}", R::NOUN));
      self.notify(Notification::error(message));
    } else if let Some(item) = query.data() {
      modal.set_rows(R::details(item));
    }
  }

  // Key handling helpers for or_else chain pattern
  fn handle_modal(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let modal = self.modal.as_mut()?;

    match modal {
      Modal::Form(form) => match form.handle_key(key) {
        KeyResult::Event(FormEvent::Submit(values)) => self.submit_form(values),
        KeyResult::Event(FormEvent::Invalid) => {
          self.notify(Notification::error("Please fix the validation errors"));
        }
        KeyResult::Event(FormEvent::Cancelled) => self.close_modal(),
        KeyResult::Handled | KeyResult::NotHandled => {}
      },
      Modal::Delete { dialog, .. } => match dialog.handle_key(key) {
        KeyResult::Event(ConfirmEvent::Confirmed) => self.confirm_delete(),
        KeyResult::Event(ConfirmEvent::Cancelled) => self.close_modal(),
        KeyResult::Handled | KeyResult::NotHandled => {}
      },
      Modal::Detail { modal, id, reload } => match modal.handle_key(key) {
        KeyResult::Event(DetailEvent::Closed) => self.modal = None,
        KeyResult::Event(DetailEvent::Reload) => {
          let query = reload.get_or_insert_with(|| self.api.use_item(id));
          query.refetch();
          modal.set_loading(true);
        }
        KeyResult::Handled | KeyResult::NotHandled => {}
      },
    }
    Some(ViewAction::None)
  }

  fn handle_search(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.search.handle_key(key) {
      KeyResult::Handled | KeyResult::Event(SearchEvent::Submitted) => Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Changed(keyword)) => {
        debug!(resource = R::TAG, %keyword, "search changed");
        self.keyword = keyword;
        if self.config.reset_page_on_search {
          self.page = 1;
        }
        self.reload();
        Some(ViewAction::None)
      }
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.table_state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.table_state.select_previous();
        Some(ViewAction::None)
      }
      KeyCode::Char('h') | KeyCode::Left => {
        let control = self.pagination();
        if control.can_prev() {
          self.page = control.current_page - 1;
          self.reload();
        }
        Some(ViewAction::None)
      }
      KeyCode::Char('l') | KeyCode::Right => {
        let control = self.pagination();
        if control.can_next() {
          self.page = control.current_page + 1;
          self.reload();
        }
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let caps = R::CAPABILITIES;
    match key.code {
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('c') if caps.create => self.open_create(),
      KeyCode::Char('e') if caps.update => self.open_edit(),
      KeyCode::Char('d') if caps.delete => self.open_delete(),
      KeyCode::Char('v') | KeyCode::Enter => self.open_detail(),
      KeyCode::Char('q') | KeyCode::Esc => return Some(ViewAction::Pop),
      _ => return None,
    }
    Some(ViewAction::None)
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.items().len();
    ensure_valid_selection(&mut self.table_state, len);

    let count = self.data().map(|d| d.results).unwrap_or(0);
    let keyword = if self.keyword.is_empty() {
      String::new()
    } else {
      format!(" /{}", self.keyword)
    };
    let title = match (self.query.is_loading(), self.query.error(), self.data()) {
      (true, _, None) => format!(" {}{} (loading...) ", R::TITLE, keyword),
      (true, _, Some(_)) => format!(" {}{} ({}) (refreshing...) ", R::TITLE, keyword, count),
      (false, Some(e), Some(_)) => format!(
        " {}{} ({}) (error: {}) ",
        R::TITLE,
        keyword,
        count,
        e.user_message("refresh failed")
      ),
      _ => format!(" {}{} ({}) ", R::TITLE, keyword, count),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let widths: Vec<Constraint> = R::COLUMNS
      .iter()
      .map(|c| Constraint::Percentage(c.width))
      .collect();
    let header = Row::new(R::COLUMNS.iter().map(|c| Cell::from(c.header)))
      .style(Style::default().fg(Color::Yellow).bold());

    let Some(data) = self.data() else {
      if let (false, Some(error)) = (self.query.is_loading(), self.query.error()) {
        let message = error.user_message(&format!("Failed to load {}", R::TITLE.to_lowercase()));
        let paragraph = Paragraph::new(vec![
          Line::styled(message, Style::default().fg(Color::Red)),
          Line::styled("Press 'r' to retry.", Style::default().fg(Color::DarkGray)),
        ])
        .block(block);
        frame.render_widget(paragraph, area);
        return;
      }

      let placeholder = Style::default().fg(Color::DarkGray);
      let rows = (0..SKELETON_ROWS).map(|_| {
        Row::new(R::COLUMNS.iter().map(|_| Cell::from("░░░░░░░░"))).style(placeholder)
      });
      frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
      return;
    };

    if data.items.is_empty() {
      let mut lines = vec![Line::styled(
        "No data available",
        Style::default().fg(Color::White).bold(),
      )];
      if R::CAPABILITIES.create {
        lines.push(Line::styled(
          "Start by adding your first item (press 'c')",
          Style::default().fg(Color::DarkGray),
        ));
      }
      frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(block),
        area,
      );
      return;
    }

    let rows: Vec<Row> = data
      .items
      .iter()
      .map(|item| Row::new(R::row(item).into_iter().map(|cell| Cell::from(single_line(&cell).to_string()))))
      .collect();

    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn render_modal(&self, frame: &mut Frame, area: Rect) {
    match &self.modal {
      Some(Modal::Form(form)) => form.render(frame, area),
      Some(Modal::Delete { dialog, .. }) => dialog.render(frame, area),
      Some(Modal::Detail { modal, .. }) => modal.render(frame, area),
      None => {}
    }
  }
}

impl<R: Resource> View for ResourceListView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_modal(key)
      .or_else(|| self.handle_search(key))
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(1)])
      .split(area);

    self.render_table(frame, chunks[0]);
    self.pagination().render(frame, chunks[1]);
    self.search.render_overlay(frame, chunks[0]);
    self.render_modal(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    R::TITLE.to_string()
  }

  fn resource(&self) -> Option<&str> {
    Some(R::TITLE)
  }

  fn captures_input(&self) -> bool {
    self.search.is_active() || self.modal.is_some()
  }

  fn tick(&mut self) {
    if self.query.poll() && self.query.is_success() {
      self.previous = None;
    }
    let len = self.items().len();
    ensure_valid_selection(&mut self.table_state, len);
    self.poll_pending();
    self.poll_detail();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    match &self.modal {
      Some(Modal::Form(_)) => {
        return vec![
          ShortcutInfo::new("tab", "next field"),
          ShortcutInfo::new("enter", "save"),
          ShortcutInfo::new("ctrl-s", "save"),
          ShortcutInfo::new("esc", "cancel"),
        ]
      }
      Some(Modal::Delete { .. }) => {
        return vec![
          ShortcutInfo::new("y", "confirm"),
          ShortcutInfo::new("n", "cancel"),
        ]
      }
      Some(Modal::Detail { .. }) => {
        return vec![
          ShortcutInfo::new("j/k", "scroll"),
          ShortcutInfo::new("r", "reload"),
          ShortcutInfo::new("esc", "close"),
        ]
      }
      None if self.search.is_active() => {
        return vec![
          ShortcutInfo::new("enter", "done"),
          ShortcutInfo::new("esc", "clear"),
        ]
      }
      None => {}
    }

    let caps = R::CAPABILITIES;
    let mut shortcuts = vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("v", "view").with_priority(60),
      ShortcutInfo::new("h/l", "page").with_priority(70),
      ShortcutInfo::new("r", "refresh").with_priority(80),
      ShortcutInfo::new("q", "back").with_priority(90),
    ];
    if caps.create {
      shortcuts.push(ShortcutInfo::new("c", "create").with_priority(30));
    }
    if caps.update {
      shortcuts.push(ShortcutInfo::new("e", "edit").with_priority(40));
    }
    if caps.delete {
      shortcuts.push(ShortcutInfo::new("d", "delete").with_priority(50));
    }
    shortcuts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::client::test_support::{book, books_page};
  use crate::api::ResourceClient;
  use crate::resources::{Books, Newspapers};
  use crate::session::Session;
  use crate::ui::components::ToastLevel;
  use crossterm::event::KeyModifiers;
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;
  use serde_json::json;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::sync::Arc;
  use std::time::Duration;
  use tokio::sync::mpsc;
  use wiremock::matchers::{body_json, method, path, query_param};
  use wiremock::{Mock, MockServer, Request, ResponseTemplate};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
  }

  fn type_text<R: Resource>(view: &mut ResourceListView<R>, text: &str) {
    for c in text.chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn list_view<R: Resource>(
    server: &MockServer,
    config: ListConfig,
  ) -> (ResourceListView<R>, mpsc::UnboundedReceiver<Event>) {
    let client = ResourceClient::new(reqwest::Client::new(), &server.uri(), Session::in_memory())
      .unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    (ResourceListView::new(ResourceApi::new(client), tx, config), rx)
  }

  /// Tick until nothing is in flight
  async fn settle<R: Resource>(view: &mut ResourceListView<R>) {
    for _ in 0..200 {
      view.tick();
      let detail_loading = matches!(
        &view.modal,
        Some(Modal::Detail { reload: Some(q), .. }) if q.is_loading()
      );
      if !view.query.is_loading() && view.pending.is_none() && !detail_loading {
        return;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("view never settled");
  }

  fn toasts(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
      if let Event::Notify(n) = event {
        out.push(n);
      }
    }
    out
  }

  fn ids<R: Resource>(view: &ResourceListView<R>) -> Vec<String> {
    view.items().iter().map(|i| i.id().to_string()).collect()
  }

  /// Draw the view on a test terminal and return every cell as one string
  fn screen<R: Resource>(view: &mut ResourceListView<R>) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
    terminal.draw(|frame| view.render(frame, frame.area())).unwrap();
    terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|cell| cell.symbol())
      .collect()
  }

  fn empty_newspapers() -> serde_json::Value {
    json!({
      "results": 0,
      "pagination": { "currentPage": 1, "limit": 10, "numberOfPages": 1 },
      "data": []
    })
  }

  #[tokio::test]
  async fn test_pages_follow_server_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .and(query_param("page", "1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(books_page(0, 10, 1, 2)))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .and(query_param("page", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(books_page(10, 10, 2, 2)))
      .expect(1)
      .mount(&server)
      .await;

    let (mut view, _rx) = list_view::<Books>(&server, ListConfig::default());
    settle(&mut view).await;
    assert_eq!(view.pagination().label(), "Page 1 of 2");

    view.handle_key(key(KeyCode::Char('l')));
    // Previous page stays visible while the next one loads
    assert_eq!(view.items().len(), 10);
    assert!(!view.pagination().can_next());

    settle(&mut view).await;
    assert_eq!(view.pagination().label(), "Page 2 of 2");
    assert_eq!(ids(&view)[0], "b10");

    // Already on the last page
    view.handle_key(key(KeyCode::Char('l')));
    assert!(!view.query.is_loading());
  }

  #[tokio::test]
  async fn test_page_keys_ignored_while_loading() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(books_page(0, 10, 1, 3))
          .set_delay(Duration::from_millis(100)),
      )
      .mount(&server)
      .await;

    let (mut view, _rx) = list_view::<Books>(&server, ListConfig::default());
    view.handle_key(key(KeyCode::Char('l')));
    assert_eq!(view.page, 1);
  }

  #[tokio::test]
  async fn test_search_keeps_page_unless_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .and(query_param("page", "1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(books_page(0, 10, 1, 3)))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .and(query_param("page", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(books_page(10, 10, 2, 3)))
      .mount(&server)
      .await;

    for (reset, expected_page) in [(false, 2), (true, 1)] {
      let config = ListConfig {
        reset_page_on_search: reset,
        ..ListConfig::default()
      };
      let (mut view, _rx) = list_view::<Books>(&server, config);
      settle(&mut view).await;
      view.handle_key(key(KeyCode::Char('l')));
      settle(&mut view).await;

      view.handle_key(key(KeyCode::Char('/')));
      type_text(&mut view, "x");
      assert_eq!(view.keyword, "x");
      assert_eq!(view.page, expected_page);
    }
  }

  #[tokio::test]
  async fn test_search_sends_keyword() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .and(query_param("keyword", "go"))
      .respond_with(ResponseTemplate::new(200).set_body_json(books_page(0, 0, 1, 1)))
      .expect(1)
      .with_priority(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .respond_with(ResponseTemplate::new(200).set_body_json(books_page(0, 3, 1, 1)))
      .mount(&server)
      .await;

    let (mut view, _rx) = list_view::<Books>(&server, ListConfig::default());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('/')));
    view.handle_key(key(KeyCode::Char('g')));
    settle(&mut view).await;
    view.handle_key(key(KeyCode::Char('o')));
    view.handle_key(key(KeyCode::Enter));
    settle(&mut view).await;

    assert!(view.items().is_empty());
    assert!(!view.captures_input());
  }

  #[tokio::test]
  async fn test_invalid_form_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .respond_with(ResponseTemplate::new(200).set_body_json(books_page(0, 1, 1, 1)))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(201))
      .expect(0)
      .mount(&server)
      .await;

    let (mut view, mut rx) = list_view::<Books>(&server, ListConfig::default());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('c')));
    type_text(&mut view, "Go");
    view.handle_key(ctrl('s'));

    assert!(view.pending.is_none());
    match &view.modal {
      Some(Modal::Form(form)) => {
        assert_eq!(form.errors().get("title"), Some("Too short book title"));
        assert_eq!(form.errors().get("image"), Some("Book image is required"));
        assert_eq!(form.values()["title"], "Go");
      }
      _ => panic!("form should stay open"),
    }
    assert_eq!(
      toasts(&mut rx),
      vec![Notification::error("Please fix the validation errors")]
    );
  }

  #[tokio::test]
  async fn test_failed_create_keeps_form_and_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/newspapers"))
      .respond_with(ResponseTemplate::new(200).set_body_json(empty_newspapers()))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/v1/newspapers"))
      .respond_with(
        ResponseTemplate::new(400).set_body_json(json!({ "message": "Title already exists" })),
      )
      .up_to_n_times(1)
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/api/v1/newspapers"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let (mut view, mut rx) = list_view::<Newspapers>(&server, ListConfig::default());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('c')));
    type_text(&mut view, "Daily News");
    view.handle_key(key(KeyCode::Tab));
    type_text(&mut view, "Morning edition");
    view.handle_key(ctrl('s'));
    assert!(view.pending.is_some());
    settle(&mut view).await;

    let assert_form_intact = |view: &ResourceListView<Newspapers>| match &view.modal {
      Some(Modal::Form(form)) => {
        assert!(!form.is_submitting());
        assert_eq!(form.values()["title"], "Daily News");
        assert_eq!(form.values()["description"], "Morning edition");
      }
      _ => panic!("form should stay open"),
    };
    assert_form_intact(&view);
    assert_eq!(
      toasts(&mut rx),
      vec![Notification::error("Title already exists")]
    );

    // No server message: generic fallback
    view.handle_key(ctrl('s'));
    settle(&mut view).await;
    assert_form_intact(&view);
    assert_eq!(
      toasts(&mut rx),
      vec![Notification::error("Failed to create newspaper")]
    );
  }

  #[tokio::test]
  async fn test_renders_skeleton_before_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(books_page(0, 1, 1, 1))
          .set_delay(Duration::from_millis(500)),
      )
      .mount(&server)
      .await;

    let (mut view, _rx) = list_view::<Books>(&server, ListConfig::default());
    let shown = screen(&mut view);
    assert!(shown.contains("Books (loading...)"));
    assert!(shown.contains("░░░░░░░░"));
    assert!(!shown.contains("No data available"));
  }

  #[tokio::test]
  async fn test_renders_error_without_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "message": "Server is down" })))
      .mount(&server)
      .await;

    let (mut view, _rx) = list_view::<Books>(&server, ListConfig::default());
    settle(&mut view).await;

    let shown = screen(&mut view);
    assert!(shown.contains("Server is down"));
    assert!(shown.contains("Press 'r' to retry."));
    assert!(!shown.contains("░"));
  }

  #[tokio::test]
  async fn test_renders_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .respond_with(ResponseTemplate::new(200).set_body_json(books_page(0, 0, 1, 1)))
      .mount(&server)
      .await;

    let (mut view, _rx) = list_view::<Books>(&server, ListConfig::default());
    settle(&mut view).await;

    let shown = screen(&mut view);
    assert!(shown.contains("No data available"));
    assert!(shown.contains("Start by adding your first item (press 'c')"));
    assert!(shown.contains("Page 1 of 1"));
  }

  #[tokio::test]
  async fn test_update_closes_form_and_refetches() {
    let server = MockServer::start().await;
    let updated = Arc::new(AtomicBool::new(false));
    let listing = {
      let updated = updated.clone();
      move |_: &Request| {
        let title = if updated.load(Ordering::SeqCst) {
          "Evening Post"
        } else {
          "Morning Post"
        };
        ResponseTemplate::new(200).set_body_json(json!({
          "results": 1,
          "pagination": { "currentPage": 1, "limit": 10, "numberOfPages": 1 },
          "data": [{
            "_id": "n1",
            "title": title,
            "description": "Daily local news",
            "createdAt": "2024-01-01T00:00:00Z"
          }]
        }))
      }
    };
    let patch = {
      let updated = updated.clone();
      move |_: &Request| {
        updated.store(true, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(json!({
          "data": {
            "_id": "n1",
            "title": "Evening Post",
            "description": "Daily local news",
            "createdAt": "2024-01-01T00:00:00Z"
          }
        }))
      }
    };

    Mock::given(method("GET"))
      .and(path("/api/v1/newspapers"))
      .respond_with(listing)
      .mount(&server)
      .await;
    Mock::given(method("PATCH"))
      .and(path("/api/v1/newspapers/n1"))
      .and(body_json(json!({ "title": "Evening Post", "description": "Daily local news" })))
      .respond_with(patch)
      .expect(1)
      .mount(&server)
      .await;

    let (mut view, mut rx) = list_view::<Newspapers>(&server, ListConfig::default());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('e')));
    for _ in 0.."Morning Post".len() {
      view.handle_key(key(KeyCode::Backspace));
    }
    type_text(&mut view, "Evening Post");
    view.handle_key(ctrl('s'));
    assert!(view.pending.is_some());

    settle(&mut view).await;
    assert!(view.modal.is_none());
    assert_eq!(
      toasts(&mut rx),
      vec![Notification::success("Newspaper updated successfully")]
    );
    assert_eq!(view.items()[0].title, "Evening Post");
  }

  #[tokio::test]
  async fn test_delete_removes_row() {
    let server = MockServer::start().await;
    let deleted = Arc::new(AtomicBool::new(false));
    let listing = {
      let deleted = deleted.clone();
      move |_: &Request| {
        let data = if deleted.load(Ordering::SeqCst) {
          vec![book("b2", "Refactoring")]
        } else {
          vec![book("b1", "Clean Code"), book("b2", "Refactoring")]
        };
        ResponseTemplate::new(200).set_body_json(json!({
          "results": data.len(),
          "pagination": { "currentPage": 1, "limit": 10, "numberOfPages": 1 },
          "data": data
        }))
      }
    };
    let delete = {
      let deleted = deleted.clone();
      move |_: &Request| {
        deleted.store(true, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(json!({ "status": "success", "message": "Deleted" }))
      }
    };

    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .respond_with(listing)
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/api/v1/books/b1"))
      .respond_with(delete)
      .expect(1)
      .mount(&server)
      .await;

    let (mut view, mut rx) = list_view::<Books>(&server, ListConfig::default());
    settle(&mut view).await;
    assert_eq!(ids(&view), vec!["b1", "b2"]);

    view.handle_key(key(KeyCode::Char('d')));
    assert!(view.captures_input());
    view.handle_key(key(KeyCode::Char('y')));
    settle(&mut view).await;

    assert!(view.modal.is_none());
    assert_eq!(ids(&view), vec!["b2"]);
    assert_eq!(
      toasts(&mut rx),
      vec![Notification::success("Book deleted successfully")]
    );
  }

  #[tokio::test]
  async fn test_failed_delete_keeps_dialog_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .respond_with(ResponseTemplate::new(200).set_body_json(books_page(0, 2, 1, 1)))
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .respond_with(ResponseTemplate::new(500))
      .mount(&server)
      .await;

    let (mut view, mut rx) = list_view::<Books>(&server, ListConfig::default());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('d')));
    view.handle_key(key(KeyCode::Char('y')));
    settle(&mut view).await;

    match &view.modal {
      Some(Modal::Delete { dialog, id }) => {
        assert_eq!(id, "b0");
        assert!(!dialog.is_pending());
      }
      _ => panic!("dialog should stay open"),
    }
    let shown = toasts(&mut rx);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].level, ToastLevel::Error);
    assert_eq!(shown[0].message, "Failed to delete book");
    assert_eq!(ids(&view).len(), 2);
  }

  #[tokio::test]
  async fn test_view_uses_row_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books"))
      .respond_with(ResponseTemplate::new(200).set_body_json(books_page(0, 2, 1, 1)))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/v1/books/b0"))
      .respond_with(ResponseTemplate::new(200).set_body_json(book("b0", "Fresh Title")))
      .expect(1)
      .mount(&server)
      .await;

    let (mut view, _rx) = list_view::<Books>(&server, ListConfig::default());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Enter));
    let title_row = |view: &ResourceListView<Books>| match &view.modal {
      Some(Modal::Detail { modal, .. }) => modal
        .rows()
        .iter()
        .find(|(label, _)| *label == "Title")
        .map(|(_, value)| value.clone()),
      _ => None,
    };
    assert_eq!(title_row(&view).as_deref(), Some("Book 0"));

    // Explicit reload asks the server
    view.handle_key(key(KeyCode::Char('r')));
    settle(&mut view).await;
    assert_eq!(title_row(&view).as_deref(), Some("Fresh Title"));

    view.handle_key(key(KeyCode::Esc));
    assert!(view.modal.is_none());
  }

  #[tokio::test]
  async fn test_read_only_resource_has_no_create() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": {
          "results": 0,
          "pagination": { "currentPage": 1, "limit": 10, "numberOfPages": 1 },
          "data": []
        }
      })))
      .mount(&server)
      .await;

    let (mut view, _rx) = list_view::<crate::resources::Messages>(&server, ListConfig::default());
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('c')));
    assert!(view.modal.is_none());
    assert!(view.shortcuts().iter().all(|s| s.key != "c"));
  }

  #[tokio::test]
  async fn test_quit_pops() {
    let server = MockServer::start().await;
    let (mut view, _rx) = list_view::<Books>(&server, ListConfig::default());
    assert!(matches!(view.handle_key(key(KeyCode::Char('q'))), ViewAction::Pop));
  }
}
