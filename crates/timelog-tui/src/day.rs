// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Day-detail view plus the create/edit/delete modals layered over it.
//!
//! Each modal only returns a message; the calendar screen performs the
//! storage call and decides what to show next.

use crate::form::{Form, SelectOption, SingleSelect, TextField};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use time::Date;
use time::macros::format_description;
use timelog_app::stats::Catalog;
use timelog_app::validate::{self, FieldError};
use timelog_app::{
    ActivityType, ActivityTypeId, EntryId, HourEntry, NewHourEntry, Project, ProjectId,
    format_hours,
};

pub const TYPE_FIELD: usize = 0;
pub const PROJECT_FIELD: usize = 1;
pub const HOURS_FIELD: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum DayAction {
    Close,
    Create,
    Edit(HourEntry),
    Delete(HourEntry),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    date: Date,
    entries: Vec<HourEntry>,
    selected: usize,
}

impl DayView {
    pub fn new(date: Date, entries: Vec<HourEntry>) -> Self {
        Self {
            date,
            entries,
            selected: 0,
        }
    }

    pub fn date(&self) -> Date {
        self.date
    }

    pub fn entries(&self) -> &[HourEntry] {
        &self.entries
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&HourEntry> {
        self.entries.get(self.selected)
    }

    /// Replaces the list after a write; the selection is clamped to it.
    pub fn set_entries(&mut self, entries: Vec<HourEntry>) {
        self.entries = entries;
        self.selected = self.selected.min(self.entries.len().saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<DayAction> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(DayAction::Close),
            KeyCode::Char('n') => Some(DayAction::Create),
            KeyCode::Char('e') => self.selected_entry().cloned().map(DayAction::Edit),
            KeyCode::Enter => Some(match self.selected_entry() {
                Some(entry) => DayAction::Edit(entry.clone()),
                None => DayAction::Close,
            }),
            KeyCode::Char('d') => self.selected_entry().cloned().map(DayAction::Delete),
            KeyCode::Up | KeyCode::Char('k') => {
                self.step(-1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.step(1);
                None
            }
            _ => None,
        }
    }

    fn step(&mut self, delta: isize) {
        if self.entries.is_empty() {
            return;
        }
        let len = self.entries.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    pub fn title(&self) -> String {
        long_date(self.date)
    }

    pub fn render(&self, catalog: &Catalog) -> Vec<Line<'static>> {
        if self.entries.is_empty() {
            return vec![
                Line::from(Span::styled(
                    "No work hours logged for this day.",
                    Style::default().fg(Color::DarkGray),
                )),
                Line::default(),
                hint_line("n add · esc close"),
            ];
        }

        let mut lines = Vec::with_capacity(self.entries.len() + 6);
        let mut work = 0.0;
        let mut other = 0.0;
        for (index, entry) in self.entries.iter().enumerate() {
            if catalog.is_work(entry.activity_type_id) {
                work += entry.hours;
            } else {
                other += entry.hours;
            }
            let selected = index == self.selected;
            let style = if selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            let marker = if selected { "▸ " } else { "  " };
            lines.push(Line::from(Span::styled(
                format!("{marker}{}", entry_summary(entry, catalog)),
                style,
            )));
        }
        lines.push(Line::default());
        lines.push(Line::from(format!("Work: {}h", format_hours(work))));
        lines.push(Line::from(format!("Non-work: {}h", format_hours(other))));
        lines.push(Line::from(Span::styled(
            format!("Total: {}h", format_hours(work + other)),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
        lines.push(hint_line("j/k move · n add · e/enter edit · d delete · esc close"));
        lines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFormMode {
    Create { date: Date },
    Edit { id: EntryId, date: Date },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryAction {
    Cancel,
    Create(NewHourEntry),
    Update { id: EntryId, entry: NewHourEntry },
}

/// Create/edit form: activity type, project, hours, in that order.
#[derive(Debug)]
pub struct EntryForm {
    mode: EntryFormMode,
    form: Form,
}

impl EntryForm {
    pub fn create(date: Date, activity_types: &[ActivityType], projects: &[Project]) -> Self {
        Self {
            mode: EntryFormMode::Create { date },
            form: entry_form(
                activity_select(activity_types),
                project_select(projects),
                hours_field(),
            ),
        }
    }

    pub fn edit(entry: &HourEntry, activity_types: &[ActivityType], projects: &[Project]) -> Self {
        Self {
            mode: EntryFormMode::Edit {
                id: entry.id,
                date: entry.date,
            },
            form: entry_form(
                activity_select(activity_types).with_selected_id(entry.activity_type_id.get()),
                project_select(projects).with_selected_id(entry.project_id.get()),
                hours_field().with_value(format!("{:.1}", entry.hours)),
            ),
        }
    }

    pub fn mode(&self) -> EntryFormMode {
        self.mode
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            EntryFormMode::Create { .. } => "Add Work Hours",
            EntryFormMode::Edit { .. } => "Edit Work Hours",
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<EntryAction> {
        match key.code {
            KeyCode::Esc => Some(EntryAction::Cancel),
            KeyCode::Enter => self.submit(),
            _ => {
                self.form.handle_input(key);
                None
            }
        }
    }

    fn submit(&mut self) -> Option<EntryAction> {
        if !self.form.validate() {
            return None;
        }
        let activity = self.form.selected_id(TYPE_FIELD)?;
        let project = self.form.selected_id(PROJECT_FIELD)?;
        let hours = self.form.text(HOURS_FIELD).trim().parse::<f64>().ok()?;
        let date = match self.mode {
            EntryFormMode::Create { date } | EntryFormMode::Edit { date, .. } => date,
        };
        let entry = NewHourEntry {
            date,
            activity_type_id: ActivityTypeId::new(activity),
            project_id: ProjectId::new(project),
            hours,
        };
        Some(match self.mode {
            EntryFormMode::Create { .. } => EntryAction::Create(entry),
            EntryFormMode::Edit { id, .. } => EntryAction::Update { id, entry },
        })
    }

    pub fn render(&self) -> Vec<Line<'static>> {
        let mut lines = self.form.render();
        lines.push(hint_line("tab/shift+tab field · j/k choose · enter save · esc cancel"));
        lines
    }
}

fn entry_form(activity: SingleSelect, project: SingleSelect, hours: TextField) -> Form {
    Form::new(vec![activity.into(), project.into(), hours.into()])
}

fn activity_select(activity_types: &[ActivityType]) -> SingleSelect {
    let options = activity_types
        .iter()
        .map(|activity| {
            SelectOption::new(
                activity.id.get(),
                format!("{} {}", activity.short_name, activity.name),
                if activity.is_work { "work" } else { "non-work" },
            )
        })
        .collect();
    SingleSelect::new("Type", options).required("select an activity type")
}

fn project_select(projects: &[Project]) -> SingleSelect {
    let options = projects
        .iter()
        .map(|project| {
            SelectOption::new(
                project.id.get(),
                project.name.clone(),
                format!("Odoo: {}", project.odoo_id),
            )
        })
        .collect();
    SingleSelect::new("Project", options).required("select a project")
}

fn hours_field() -> TextField {
    let hours = validate::positive_float("Hours");
    TextField::new("Hours")
        .placeholder("8.0")
        .char_limit(5)
        .validator(Box::new(move |value: &str| {
            hours(value).map_err(|_| FieldError::new("Hours", "enter valid hours"))
        }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAction {
    Confirm(EntryId),
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteConfirm {
    entry: HourEntry,
    summary: String,
}

impl DeleteConfirm {
    pub fn new(entry: HourEntry, catalog: &Catalog) -> Self {
        let summary = entry_summary(&entry, catalog);
        Self { entry, summary }
    }

    pub fn entry(&self) -> &HourEntry {
        &self.entry
    }

    pub fn title(&self) -> &'static str {
        "⚠ Delete Work Hours"
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<DeleteAction> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                Some(DeleteAction::Confirm(self.entry.id))
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(DeleteAction::Cancel),
            _ => None,
        }
    }

    pub fn render(&self) -> Vec<Line<'static>> {
        vec![
            Line::from(format!("{}  {}", long_date(self.entry.date), self.summary)),
            Line::default(),
            Line::from(Span::styled(
                "This action cannot be undone!",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            hint_line("y/enter delete · n/esc cancel"),
        ]
    }
}

/// `SHORT Activity | Project | Nh`; unknown references show as `?`.
pub fn entry_summary(entry: &HourEntry, catalog: &Catalog) -> String {
    let (short, activity) = catalog
        .activity_type(entry.activity_type_id)
        .map(|activity| (activity.short_name.as_str(), activity.name.as_str()))
        .unwrap_or(("?", "?"));
    let project = catalog
        .project(entry.project_id)
        .map(|project| project.name.as_str())
        .unwrap_or("?");
    format!("{short} {activity} | {project} | {}h", format_hours(entry.hours))
}

/// `Monday, January 2, 2006`.
pub fn long_date(date: Date) -> String {
    date.format(format_description!(
        "[weekday], [month repr:long] [day padding:none], [year]"
    ))
    .unwrap_or_else(|_| date.to_string())
}

pub(crate) fn hint_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_owned(),
        Style::default().fg(Color::DarkGray),
    ))
}
