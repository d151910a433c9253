use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::resources::form::{validate, FieldKind, FieldSpec, FormMode, FormValues, ValidationErrors};
use crate::ui::renderfns::centered_rect;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by the create/update form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Every field passed validation; send these values
  Submit(FormValues),
  /// Validation failed; errors are shown next to the fields
  Invalid,
  Cancelled,
}

/// Modal form for creating or updating one record.
///
/// Validation runs against the whole field set on submit and every failing
/// field shows its message at once. Values are kept when validation or the
/// request fails.
#[derive(Debug, Clone)]
pub struct FormModal {
  title: String,
  fields: &'static [FieldSpec],
  mode: FormMode,
  inputs: Vec<TextInput>,
  focus: usize,
  errors: ValidationErrors,
  submitting: bool,
}

impl FormModal {
  pub fn new(
    title: impl Into<String>,
    fields: &'static [FieldSpec],
    mode: FormMode,
    initial: &FormValues,
  ) -> Self {
    let inputs = fields
      .iter()
      .map(|field| {
        TextInput::new().with_value(initial.get(field.name).map(String::as_str).unwrap_or(""))
      })
      .collect();

    Self {
      title: title.into(),
      fields,
      mode,
      inputs,
      focus: 0,
      errors: ValidationErrors::default(),
      submitting: false,
    }
  }

  pub fn mode(&self) -> &FormMode {
    &self.mode
  }

  pub fn errors(&self) -> &ValidationErrors {
    &self.errors
  }

  pub fn values(&self) -> FormValues {
    self
      .fields
      .iter()
      .zip(&self.inputs)
      .map(|(field, input)| (field.name, input.value().to_string()))
      .collect()
  }

  pub fn set_submitting(&mut self, submitting: bool) {
    self.submitting = submitting;
  }

  #[cfg(test)]
  pub fn is_submitting(&self) -> bool {
    self.submitting
  }

  /// Back to empty fields, for the next record after a successful create
  pub fn reset(&mut self) {
    self.inputs.iter_mut().for_each(TextInput::clear);
    self.errors = ValidationErrors::default();
    self.focus = 0;
    self.submitting = false;
  }

  fn focused_kind(&self) -> Option<FieldKind> {
    self.fields.get(self.focus).map(|f| f.kind)
  }

  fn move_focus(&mut self, forward: bool) {
    let count = self.fields.len();
    if count == 0 {
      return;
    }
    self.focus = if forward {
      (self.focus + 1) % count
    } else {
      (self.focus + count - 1) % count
    };
  }

  fn cycle_choice(&mut self, options: &[&str], forward: bool) {
    if options.is_empty() {
      return;
    }
    let Some(input) = self.inputs.get_mut(self.focus) else {
      return;
    };
    let next = match options.iter().position(|o| *o == input.value()) {
      Some(i) if forward => (i + 1) % options.len(),
      Some(i) => (i + options.len() - 1) % options.len(),
      None if forward => 0,
      None => options.len() - 1,
    };
    input.set_value(options[next]);
  }

  fn submit(&mut self) -> KeyResult<FormEvent> {
    let values = self.values();
    match validate(self.fields, &values, &self.mode) {
      Ok(()) => {
        self.errors = ValidationErrors::default();
        KeyResult::Event(FormEvent::Submit(values))
      }
      Err(errors) => {
        // Jump to the first failing field
        if let Some((name, _)) = errors.iter().next() {
          if let Some(i) = self.fields.iter().position(|f| f.name == *name) {
            self.focus = i;
          }
        }
        self.errors = errors;
        KeyResult::Event(FormEvent::Invalid)
      }
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    // One request at a time
    if self.submitting {
      return KeyResult::Handled;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Esc => return KeyResult::Event(FormEvent::Cancelled),
      KeyCode::Tab | KeyCode::Down => {
        self.move_focus(true);
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.move_focus(false);
        return KeyResult::Handled;
      }
      KeyCode::Char('s') if ctrl => return self.submit(),
      _ => {}
    }

    match self.focused_kind() {
      Some(FieldKind::Multiline) if key.code == KeyCode::Enter => {
        if let Some(input) = self.inputs.get_mut(self.focus) {
          input.insert('\n');
        }
        KeyResult::Handled
      }
      Some(FieldKind::Choice(options)) => match key.code {
        KeyCode::Enter => self.submit(),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
          self.cycle_choice(options, true);
          KeyResult::Handled
        }
        KeyCode::Left | KeyCode::Char('h') => {
          self.cycle_choice(options, false);
          KeyResult::Handled
        }
        _ => KeyResult::Handled,
      },
      _ => match self.inputs.get_mut(self.focus).map(|i| i.handle_key(key)) {
        Some(InputResult::Submitted(_)) => self.submit(),
        Some(InputResult::Cancelled) => KeyResult::Event(FormEvent::Cancelled),
        _ => KeyResult::Handled,
      },
    }
  }

  fn field_lines(&self, index: usize, field: &FieldSpec) -> Vec<Line<'static>> {
    let focused = index == self.focus;
    let input = &self.inputs[index];
    let label_style = if focused {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };

    let hint = match field.kind {
      FieldKind::Choice(_) => "  (</> to choose)",
      FieldKind::Multiline => "  (Enter for new line)",
      FieldKind::Image if self.mode.is_create() => "  (path to image file)",
      FieldKind::Image => "  (path to image file, empty keeps current)",
      FieldKind::Number | FieldKind::Text => "",
    };

    let mut lines = vec![Line::from(vec![
      Span::styled(field.label.to_string(), label_style),
      Span::styled(hint, Style::default().fg(Color::DarkGray)),
    ])];

    let cursor = if focused { "_" } else { "" };
    let value = input.value();
    let mut value_lines: Vec<&str> = value.split('\n').collect();
    if field.kind != FieldKind::Multiline {
      value_lines.truncate(1);
    }
    let last = value_lines.len() - 1;
    for (i, text) in value_lines.into_iter().enumerate() {
      let mut spans = vec![Span::raw("  "), Span::raw(text.to_string())];
      if i == last {
        spans.push(Span::styled(cursor, Style::default().fg(Color::Yellow)));
      }
      lines.push(Line::from(spans));
    }

    if let Some(message) = self.errors.get(field.name) {
      lines.push(Line::from(Span::styled(
        format!("  {}", message),
        Style::default().fg(Color::Red),
      )));
    }

    lines
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in self.fields.iter().enumerate() {
      lines.extend(self.field_lines(i, field));
      lines.push(Line::raw(""));
    }

    let status = if self.submitting {
      Span::styled("Saving...", Style::default().fg(Color::Yellow))
    } else {
      Span::styled(
        "<tab> next  <enter> save  <ctrl-s> save  <esc> cancel",
        Style::default().fg(Color::DarkGray),
      )
    };
    lines.push(Line::from(status));

    let height = lines.len() as u16 + 2;
    let overlay_area = centered_rect(60, height, area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title))
      .title_alignment(Alignment::Center);

    frame.render_widget(
      Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
      overlay_area,
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resources::courses::COURSE_TYPES;
  use crate::resources::{Books, Courses, Newspapers, Resource};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(form: &mut FormModal, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn create_form<R: Resource>() -> FormModal {
    FormModal::new("Create", R::FIELDS, FormMode::Create, &FormValues::new())
  }

  #[test]
  fn test_empty_submit_reports_every_field() {
    let mut form = create_form::<Books>();
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Event(FormEvent::Invalid));

    let errors = form.errors();
    assert_eq!(errors.len(), Books::FIELDS.len());
    assert_eq!(errors.get("title"), Some("Book title is required"));
    assert_eq!(errors.get("image"), Some("Book image is required"));
  }

  #[test]
  fn test_values_survive_failed_validation() {
    let mut form = create_form::<Courses>();
    type_str(&mut form, "AB");
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Event(FormEvent::Invalid));

    assert_eq!(form.errors().get("name"), Some("Too short Name"));
    assert_eq!(form.values().get("name").map(String::as_str), Some("AB"));
  }

  #[test]
  fn test_valid_newspaper_submits() {
    let mut form = create_form::<Newspapers>();
    type_str(&mut form, "Daily News");
    form.handle_key(key(KeyCode::Tab));
    type_str(&mut form, "All the news that fits");

    let result = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
    match result {
      KeyResult::Event(FormEvent::Submit(values)) => {
        assert_eq!(values.get("title").map(String::as_str), Some("Daily News"));
      }
      other => panic!("expected submit, got {:?}", other),
    }
  }

  #[test]
  fn test_choice_field_cycles() {
    let mut form = create_form::<Courses>();
    // name, title, type
    form.handle_key(key(KeyCode::Tab));
    form.handle_key(key(KeyCode::Tab));

    form.handle_key(key(KeyCode::Right));
    assert_eq!(form.values().get("type").map(String::as_str), Some(COURSE_TYPES[0]));

    form.handle_key(key(KeyCode::Left));
    assert_eq!(
      form.values().get("type").map(String::as_str),
      Some(COURSE_TYPES[COURSE_TYPES.len() - 1])
    );

    // Typing does not edit a choice
    form.handle_key(key(KeyCode::Char('x')));
    assert_eq!(
      form.values().get("type").map(String::as_str),
      Some(COURSE_TYPES[COURSE_TYPES.len() - 1])
    );
  }

  #[test]
  fn test_update_form_is_seeded_and_image_optional() {
    let initial = FormValues::from([
      ("name", "Rust".to_string()),
      ("title", "Intro to Rust".to_string()),
      ("type", COURSE_TYPES[2].to_string()),
    ]);
    let mut form = FormModal::new(
      "Edit",
      Courses::FIELDS,
      FormMode::Update {
        id: "c1".to_string(),
      },
      &initial,
    );

    let result = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
    match result {
      KeyResult::Event(FormEvent::Submit(values)) => {
        assert_eq!(values.get("name").map(String::as_str), Some("Rust"));
        assert_eq!(values.get("image").map(String::as_str), Some(""));
      }
      other => panic!("expected submit, got {:?}", other),
    }
  }

  #[test]
  fn test_enter_in_multiline_adds_line() {
    let mut form = create_form::<Books>();
    form.handle_key(key(KeyCode::Tab));
    type_str(&mut form, "one");
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    type_str(&mut form, "two");
    assert_eq!(
      form.values().get("description").map(String::as_str),
      Some("one\ntwo")
    );
  }

  #[test]
  fn test_escape_cancels() {
    let mut form = create_form::<Books>();
    assert_eq!(form.handle_key(key(KeyCode::Esc)), KeyResult::Event(FormEvent::Cancelled));
  }

  #[test]
  fn test_keys_ignored_while_submitting() {
    let mut form = create_form::<Books>();
    form.set_submitting(true);
    assert_eq!(form.handle_key(key(KeyCode::Esc)), KeyResult::Handled);
    type_str(&mut form, "abc");
    assert_eq!(form.values().get("title").map(String::as_str), Some(""));
  }

  #[test]
  fn test_reset_clears_values_and_errors() {
    let mut form = create_form::<Courses>();
    type_str(&mut form, "AB");
    form.handle_key(key(KeyCode::Enter));
    assert!(!form.errors().is_empty());

    form.reset();
    assert!(form.errors().is_empty());
    assert!(form.values().values().all(String::is_empty));
  }
}
