// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Focusable form elements and the controller that cycles focus between
//! them.
//!
//! Every element answers the same four calls: `activate`, `deactivate`,
//! `handle_input` and `render`. Callers only look at the concrete variant
//! when reading a typed value back out (`text`, `selected_id`, `is_checked`).

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::fmt;
use timelog_app::validate::{FieldError, Validator};

const SELECT_WINDOW: usize = 5;

pub struct TextField {
    label: String,
    value: String,
    placeholder: String,
    char_limit: usize,
    validator: Option<Validator>,
    help: Option<String>,
    read_only: bool,
    active: bool,
}

impl fmt::Debug for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextField")
            .field("label", &self.label)
            .field("value", &self.value)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl TextField {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: String::new(),
            placeholder: String::new(),
            char_limit: 64,
            validator: None,
            help: None,
            read_only: false,
            active: false,
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn char_limit(mut self, limit: usize) -> Self {
        self.char_limit = limit;
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Typed input is ignored; the value only changes through `set_value`.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        let value: String = value.into();
        self.value = if self.read_only {
            value
        } else {
            value.chars().take(self.char_limit).collect()
        };
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle_input(&mut self, key: KeyEvent) {
        if !self.active || self.read_only {
            return;
        }
        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.value.clear();
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                if self.value.chars().count() < self.char_limit {
                    self.value.push(ch);
                }
            }
            KeyCode::Backspace => {
                self.value.pop();
            }
            _ => {}
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        match &self.validator {
            Some(validator) => validator(&self.value),
            None => Ok(()),
        }
    }

    pub fn render(&self) -> Vec<Line<'static>> {
        let mut lines = vec![label_line(&self.label, self.active)];
        let body = if self.value.is_empty() {
            Span::styled(
                self.placeholder.clone(),
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::raw(self.value.clone())
        };
        let cursor = if self.active && !self.read_only {
            "█"
        } else {
            ""
        };
        lines.push(Line::from(vec![Span::raw("  "), body, Span::raw(cursor)]));
        if let Some(help) = &self.help {
            lines.push(help_line(help));
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkbox {
    label: String,
    checked: bool,
    help: Option<String>,
    active: bool,
}

impl Checkbox {
    pub fn new(label: impl Into<String>, checked: bool) -> Self {
        Self {
            label: label.into(),
            checked,
            help: None,
            active: false,
        }
    }

    /// Shown next to the box only while it is checked.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn toggle(&mut self) {
        self.checked = !self.checked;
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle_input(&mut self, key: KeyEvent) {
        if self.active && key.code == KeyCode::Char(' ') {
            self.toggle();
        }
    }

    pub fn current_help(&self) -> Option<&str> {
        if self.checked {
            self.help.as_deref()
        } else {
            None
        }
    }

    pub fn render(&self) -> Vec<Line<'static>> {
        let marker = if self.active { "▸ " } else { "  " };
        let mark = if self.checked { "[x]" } else { "[ ]" };
        let style = if self.active {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let mut spans = vec![
            Span::styled(format!("{marker}{mark} {}", self.label), style),
        ];
        if let Some(help) = self.current_help() {
            spans.push(Span::styled(
                format!("  ({help})"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        vec![Line::from(spans)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub id: i64,
    pub name: String,
    pub extra: String,
}

impl SelectOption {
    pub fn new(id: i64, name: impl Into<String>, extra: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: extra.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleSelect {
    label: String,
    options: Vec<SelectOption>,
    selected: Option<usize>,
    required: Option<String>,
    active: bool,
}

impl SingleSelect {
    /// Starts on the first option, or on nothing when `options` is empty.
    pub fn new(label: impl Into<String>, options: Vec<SelectOption>) -> Self {
        let selected = if options.is_empty() { None } else { Some(0) };
        Self {
            label: label.into(),
            options,
            selected,
            required: None,
            active: false,
        }
    }

    /// An unselected or out-of-range choice fails validation with `message`.
    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.required = Some(message.into());
        self
    }

    /// Selects the option carrying `id`; leaves nothing selected when no
    /// option matches.
    pub fn with_selected_id(mut self, id: i64) -> Self {
        self.selected = self.options.iter().position(|option| option.id == id);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&SelectOption> {
        self.selected.and_then(|index| self.options.get(index))
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.selected().map(|option| option.id)
    }

    pub fn select_index(&mut self, index: usize) {
        self.selected = Some(index);
    }

    pub fn select_next(&mut self) {
        self.step(1);
    }

    pub fn select_prev(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, delta: isize) {
        if self.options.is_empty() {
            return;
        }
        let len = self.options.len() as isize;
        let next = match self.selected {
            Some(index) => (index as isize + delta).rem_euclid(len),
            None => 0,
        };
        self.selected = Some(next as usize);
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle_input(&mut self, key: KeyEvent) {
        if !self.active {
            return;
        }
        match key.code {
            KeyCode::Down | KeyCode::Right | KeyCode::Char('j') | KeyCode::Char('l') => {
                self.select_next();
            }
            KeyCode::Up | KeyCode::Left | KeyCode::Char('k') | KeyCode::Char('h') => {
                self.select_prev();
            }
            _ => {}
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        match &self.required {
            Some(message) if self.selected().is_none() => {
                Err(FieldError::new(&self.label, message.clone()))
            }
            _ => Ok(()),
        }
    }

    pub fn render(&self) -> Vec<Line<'static>> {
        let mut lines = vec![label_line(&self.label, self.active)];
        if self.options.is_empty() {
            lines.push(help_line("no options available"));
            return lines;
        }
        let selected = self.selected.unwrap_or(0);
        let start = selected
            .saturating_sub(SELECT_WINDOW / 2)
            .min(self.options.len().saturating_sub(SELECT_WINDOW));
        for (index, option) in self
            .options
            .iter()
            .enumerate()
            .skip(start)
            .take(SELECT_WINDOW)
        {
            let is_selected = self.selected == Some(index);
            let style = if is_selected && self.active {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if is_selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let marker = if is_selected { "▸ " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(format!("  {marker}{}", option.name), style),
                Span::styled(
                    format!("  {}", option.extra),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
        lines
    }
}

#[derive(Debug)]
pub enum FormElement {
    Text(TextField),
    Checkbox(Checkbox),
    Select(SingleSelect),
}

impl FormElement {
    pub fn activate(&mut self) {
        match self {
            Self::Text(field) => field.activate(),
            Self::Checkbox(checkbox) => checkbox.activate(),
            Self::Select(select) => select.activate(),
        }
    }

    pub fn deactivate(&mut self) {
        match self {
            Self::Text(field) => field.deactivate(),
            Self::Checkbox(checkbox) => checkbox.deactivate(),
            Self::Select(select) => select.deactivate(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Self::Text(field) => field.is_active(),
            Self::Checkbox(checkbox) => checkbox.is_active(),
            Self::Select(select) => select.is_active(),
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent) {
        match self {
            Self::Text(field) => field.handle_input(key),
            Self::Checkbox(checkbox) => checkbox.handle_input(key),
            Self::Select(select) => select.handle_input(key),
        }
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        match self {
            Self::Text(field) => field.validate(),
            Self::Checkbox(_) => Ok(()),
            Self::Select(select) => select.validate(),
        }
    }

    pub fn render(&self) -> Vec<Line<'static>> {
        match self {
            Self::Text(field) => field.render(),
            Self::Checkbox(checkbox) => checkbox.render(),
            Self::Select(select) => select.render(),
        }
    }
}

impl From<TextField> for FormElement {
    fn from(field: TextField) -> Self {
        Self::Text(field)
    }
}

impl From<Checkbox> for FormElement {
    fn from(checkbox: Checkbox) -> Self {
        Self::Checkbox(checkbox)
    }
}

impl From<SingleSelect> for FormElement {
    fn from(select: SingleSelect) -> Self {
        Self::Select(select)
    }
}

/// Ordered elements with exactly one focused. Focus wraps in both
/// directions; validation stops at the first failing element.
#[derive(Debug)]
pub struct Form {
    elements: Vec<FormElement>,
    focus: usize,
    error: Option<String>,
}

impl Form {
    pub fn new(elements: Vec<FormElement>) -> Self {
        let mut form = Self {
            elements,
            focus: 0,
            error: None,
        };
        if let Some(first) = form.elements.first_mut() {
            first.activate();
        }
        form
    }

    /// Text-only form for the simple create/edit screens.
    pub fn fields(fields: Vec<TextField>) -> Self {
        Self::new(fields.into_iter().map(FormElement::Text).collect())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn elements(&self) -> &[FormElement] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> Option<&FormElement> {
        self.elements.get(index)
    }

    pub fn focus_next(&mut self) {
        self.move_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.move_focus(-1);
    }

    fn move_focus(&mut self, delta: isize) {
        if self.elements.is_empty() {
            return;
        }
        let len = self.elements.len() as isize;
        let next = (self.focus as isize + delta).rem_euclid(len) as usize;
        self.set_focus(next);
    }

    pub fn set_focus(&mut self, index: usize) {
        if index >= self.elements.len() {
            return;
        }
        if let Some(current) = self.elements.get_mut(self.focus) {
            current.deactivate();
        }
        self.focus = index;
        if let Some(next) = self.elements.get_mut(index) {
            next.activate();
        }
    }

    /// Tab and shift+tab move focus; everything else goes to the focused
    /// element unchanged.
    pub fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_prev(),
            _ => {
                if let Some(element) = self.elements.get_mut(self.focus) {
                    element.handle_input(key);
                }
            }
        }
    }

    /// Checks elements in order. The first failure becomes the form error
    /// and takes focus.
    pub fn validate(&mut self) -> bool {
        let failure = self
            .elements
            .iter()
            .enumerate()
            .find_map(|(index, element)| element.validate().err().map(|error| (index, error)));
        match failure {
            Some((index, error)) => {
                self.error = Some(error.message);
                self.set_focus(index);
                false
            }
            None => {
                self.error = None;
                true
            }
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Empty for non-text elements.
    pub fn text(&self, index: usize) -> &str {
        match self.elements.get(index) {
            Some(FormElement::Text(field)) => field.value(),
            _ => "",
        }
    }

    pub fn set_text(&mut self, index: usize, value: impl Into<String>) {
        if let Some(FormElement::Text(field)) = self.elements.get_mut(index) {
            field.set_value(value);
        }
    }

    pub fn selected_id(&self, index: usize) -> Option<i64> {
        match self.elements.get(index) {
            Some(FormElement::Select(select)) => select.selected_id(),
            _ => None,
        }
    }

    pub fn is_checked(&self, index: usize) -> bool {
        matches!(
            self.elements.get(index),
            Some(FormElement::Checkbox(checkbox)) if checkbox.is_checked()
        )
    }

    pub fn active_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|element| element.is_active())
            .count()
    }

    pub fn render(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for element in &self.elements {
            lines.extend(element.render());
            lines.push(Line::default());
        }
        if let Some(error) = &self.error {
            lines.push(error_line(error));
        }
        lines
    }
}

fn label_line(label: &str, active: bool) -> Line<'static> {
    let style = if active {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    Line::from(Span::styled(label.to_owned(), style))
}

fn help_line(help: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {help}"),
        Style::default().fg(Color::DarkGray),
    ))
}

pub(crate) fn error_line(message: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("✗ {message}"),
        Style::default().fg(Color::Red),
    ))
}

pub(crate) fn lines_to_string(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{Checkbox, Form, FormElement, SelectOption, SingleSelect, TextField, lines_to_string};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use timelog_app::validate;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn options(count: i64) -> Vec<SelectOption> {
        (1..=count)
            .map(|id| SelectOption::new(id, format!("option {id}"), ""))
            .collect()
    }

    fn mixed_form() -> Form {
        Form::new(vec![
            TextField::new("Name")
                .validator(validate::required("Name"))
                .into(),
            Checkbox::new("Is Work", true).into(),
            SingleSelect::new("Project", options(2))
                .required("select a project")
                .into(),
        ])
    }

    #[test]
    fn text_field_ignores_input_until_active() {
        let mut field = TextField::new("Hours").char_limit(3);
        field.handle_input(key(KeyCode::Char('8')));
        assert_eq!(field.value(), "");

        field.activate();
        field.activate();
        for ch in ['1', '2', '.', '5'] {
            field.handle_input(key(KeyCode::Char(ch)));
        }
        assert_eq!(field.value(), "12.");
        field.handle_input(key(KeyCode::Backspace));
        assert_eq!(field.value(), "12");
        field.handle_input(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(field.value(), "");
    }

    #[test]
    fn read_only_field_only_changes_through_setter() {
        let mut field = TextField::new("Signature Image").read_only();
        field.activate();
        field.handle_input(key(KeyCode::Char('x')));
        assert_eq!(field.value(), "");
        field.set_value("/tmp/signature.png");
        assert_eq!(field.value(), "/tmp/signature.png");
    }

    #[test]
    fn checkbox_toggles_on_space_only() {
        let mut checkbox = Checkbox::new("Is Work", true).help("included in mail report");
        checkbox.activate();
        checkbox.handle_input(key(KeyCode::Char('x')));
        checkbox.handle_input(key(KeyCode::Enter));
        assert!(checkbox.is_checked());
        assert_eq!(checkbox.current_help(), Some("included in mail report"));

        checkbox.handle_input(key(KeyCode::Char(' ')));
        assert!(!checkbox.is_checked());
        assert_eq!(checkbox.current_help(), None);
    }

    #[test]
    fn select_wraps_both_ways() {
        let mut select = SingleSelect::new("Type", options(3));
        select.select_index(2);
        select.select_next();
        assert_eq!(select.selected_index(), Some(0));
        select.select_prev();
        assert_eq!(select.selected_index(), Some(2));
    }

    #[test]
    fn empty_required_select_fails_validation() {
        let select = SingleSelect::new("Type", Vec::new()).required("select an activity type");
        assert_eq!(select.selected_index(), None);
        let error = select.validate().expect_err("nothing to select");
        assert_eq!(error.message, "select an activity type");
    }

    #[test]
    fn unknown_preselected_id_leaves_nothing_selected() {
        let select = SingleSelect::new("Project", options(2))
            .required("select a project")
            .with_selected_id(42);
        assert_eq!(select.selected_id(), None);
        assert!(select.validate().is_err());
    }

    #[test]
    fn tab_cycles_focus_modulo_count() {
        let mut form = mixed_form();
        assert_eq!(form.focus(), 0);
        for presses in 1..=7 {
            form.handle_input(key(KeyCode::Tab));
            assert_eq!(form.focus(), presses % 3);
            assert_eq!(form.active_count(), 1);
        }
    }

    #[test]
    fn shift_tab_cycles_backwards() {
        let mut form = mixed_form();
        for presses in 1..=5_usize {
            form.handle_input(key(KeyCode::BackTab));
            assert_eq!(form.focus(), (3 - presses % 3) % 3);
            assert_eq!(form.active_count(), 1);
        }
    }

    #[test]
    fn setters_never_move_the_active_element() {
        let mut form = mixed_form();
        form.set_focus(7);
        assert_eq!(form.focus(), 0);

        form.set_focus(2);
        form.set_text(0, "Portal");
        assert_eq!(form.active_count(), 1);
        assert!(form.element(2).is_some_and(FormElement::is_active));
        assert!(!form.element(0).is_some_and(FormElement::is_active));

        assert!(form.validate());
        assert_eq!(form.focus(), 2);
        assert_eq!(form.active_count(), 1);
    }

    #[test]
    fn input_goes_to_focused_element_only() {
        let mut form = mixed_form();
        form.handle_input(key(KeyCode::Char('a')));
        form.handle_input(key(KeyCode::Tab));
        form.handle_input(key(KeyCode::Char(' ')));
        form.handle_input(key(KeyCode::Tab));
        form.handle_input(key(KeyCode::Down));

        assert_eq!(form.text(0), "a");
        assert!(!form.is_checked(1));
        assert_eq!(form.selected_id(2), Some(2));
    }

    #[test]
    fn validate_reports_first_failure_and_focuses_it() {
        let mut form = Form::new(vec![
            TextField::new("From Company")
                .validator(validate::required("From Company"))
                .into(),
            TextField::new("Note").into(),
            TextField::new("Invoice Name")
                .validator(validate::required("Invoice Name"))
                .into(),
        ]);
        form.set_focus(2);

        assert!(!form.validate());
        assert_eq!(form.error(), Some("From Company is required"));
        assert_eq!(form.focus(), 0);
        assert_eq!(form.active_count(), 1);

        form.set_text(0, "Acme");
        assert!(!form.validate());
        assert_eq!(form.error(), Some("Invoice Name is required"));
        assert_eq!(form.focus(), 2);

        form.set_text(2, "INV-1");
        assert!(form.validate());
        assert_eq!(form.error(), None);
    }

    #[test]
    fn fields_only_form_cycles_like_mixed() {
        let mut form = Form::fields(vec![TextField::new("Name"), TextField::new("Odoo ID")]);
        assert!(matches!(form.element(0), Some(FormElement::Text(_))));
        form.handle_input(key(KeyCode::Tab));
        form.handle_input(key(KeyCode::Tab));
        assert_eq!(form.focus(), 0);
    }

    #[test]
    fn render_shows_placeholder_and_error() {
        let mut form = Form::fields(vec![
            TextField::new("Hours")
                .placeholder("8.0")
                .validator(validate::positive_float("Hours")),
        ]);
        form.validate();
        let text = lines_to_string(&form.render());
        assert!(text.contains("Hours"));
        assert!(text.contains("8.0"));
        assert!(text.contains("✗ Hours is required"));
    }
}
