// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Projects and activity-types screens. Both are a table with a cursor and
//! an optional form or delete-confirm modal; [`CatalogRecord`] supplies the
//! per-table columns and form.

use crate::day::hint_line;
use crate::form::{Checkbox, Form, TextField};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::text::Line;
use timelog_app::validate;
use timelog_app::{ActivityType, ActivityTypeId, NewActivityType, NewProject, Project, ProjectId};

pub trait CatalogRecord: Clone {
    type Id: Copy + PartialEq + std::fmt::Debug;
    type Draft: Clone + PartialEq + std::fmt::Debug;

    /// Lower-case noun used in notifications, e.g. `project`.
    const NOUN: &'static str;
    const TITLE: &'static str;
    const HEADERS: &'static [&'static str];

    fn id(&self) -> Self::Id;
    fn cells(&self) -> Vec<String>;
    fn display_name(&self) -> &str;
    fn blank_form() -> Form;
    fn edit_form(&self) -> Form;
    /// Reads a validated form back into a draft.
    fn draft(form: &Form) -> Option<Self::Draft>;
}

#[derive(Debug)]
pub enum CatalogModal<T: CatalogRecord> {
    Form { editing: Option<T::Id>, form: Form },
    ConfirmDelete { record: T },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogAction<T: CatalogRecord> {
    Create(T::Draft),
    Update(T::Id, T::Draft),
    Delete(T),
}

#[derive(Debug)]
pub struct CatalogScreen<T: CatalogRecord> {
    rows: Vec<T>,
    cursor: usize,
    modal: Option<CatalogModal<T>>,
}

impl<T: CatalogRecord> Default for CatalogScreen<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            cursor: 0,
            modal: None,
        }
    }
}

impl<T: CatalogRecord> CatalogScreen<T> {
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&T> {
        self.rows.get(self.cursor)
    }

    pub fn set_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    }

    pub fn modal(&self) -> Option<&CatalogModal<T>> {
        self.modal.as_ref()
    }

    pub fn has_modal(&self) -> bool {
        self.modal.is_some()
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn form_mut(&mut self) -> Option<&mut Form> {
        match &mut self.modal {
            Some(CatalogModal::Form { form, .. }) => Some(form),
            _ => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<CatalogAction<T>> {
        match self.modal.take() {
            None => {
                self.handle_table_key(key);
                None
            }
            Some(CatalogModal::Form { editing, mut form }) => match key.code {
                KeyCode::Esc => None,
                KeyCode::Enter => {
                    let draft = if form.validate() { T::draft(&form) } else { None };
                    let action = draft.map(|draft| match editing {
                        Some(id) => CatalogAction::Update(id, draft),
                        None => CatalogAction::Create(draft),
                    });
                    if action.is_none() {
                        self.modal = Some(CatalogModal::Form { editing, form });
                    }
                    action
                }
                _ => {
                    form.handle_input(key);
                    self.modal = Some(CatalogModal::Form { editing, form });
                    None
                }
            },
            Some(CatalogModal::ConfirmDelete { record }) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    Some(CatalogAction::Delete(record))
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
                    None
                }
                _ => {
                    self.modal = Some(CatalogModal::ConfirmDelete { record });
                    None
                }
            },
        }
    }

    fn handle_table_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = (self.cursor + 1).min(self.rows.len().saturating_sub(1));
            }
            KeyCode::Char('n') => {
                self.modal = Some(CatalogModal::Form {
                    editing: None,
                    form: T::blank_form(),
                });
            }
            KeyCode::Enter => {
                if let Some(record) = self.selected() {
                    self.modal = Some(CatalogModal::Form {
                        editing: Some(record.id()),
                        form: record.edit_form(),
                    });
                }
            }
            KeyCode::Char('d') => {
                if let Some(record) = self.selected().cloned() {
                    self.modal = Some(CatalogModal::ConfirmDelete { record });
                }
            }
            _ => {}
        }
    }

    pub fn modal_title(&self) -> String {
        match &self.modal {
            Some(CatalogModal::Form { editing: None, .. }) => format!("New {}", T::NOUN),
            Some(CatalogModal::Form {
                editing: Some(_), ..
            }) => format!("Edit {}", T::NOUN),
            Some(CatalogModal::ConfirmDelete { .. }) => format!("⚠ Delete {}", T::NOUN),
            None => String::new(),
        }
    }

    pub fn render_modal(&self) -> Vec<Line<'static>> {
        match &self.modal {
            Some(CatalogModal::Form { form, .. }) => {
                let mut lines = form.render();
                lines.push(hint_line("tab/shift+tab field · enter save · esc cancel"));
                lines
            }
            Some(CatalogModal::ConfirmDelete { record }) => vec![
                Line::from(format!("Delete {} \"{}\"?", T::NOUN, record.display_name())),
                Line::default(),
                Line::from("This action cannot be undone!"),
                Line::default(),
                hint_line("y/enter delete · n/esc cancel"),
            ],
            None => Vec::new(),
        }
    }
}

pub type ProjectsScreen = CatalogScreen<Project>;
pub type ActivityTypesScreen = CatalogScreen<ActivityType>;

const PROJECT_NAME: usize = 0;
const PROJECT_ODOO_ID: usize = 1;

impl CatalogRecord for Project {
    type Id = ProjectId;
    type Draft = NewProject;

    const NOUN: &'static str = "project";
    const TITLE: &'static str = "Projects";
    const HEADERS: &'static [&'static str] = &["ID", "Project Name", "Odoo ID"];

    fn id(&self) -> ProjectId {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.odoo_id.to_string(),
        ]
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn blank_form() -> Form {
        project_form("", "")
    }

    fn edit_form(&self) -> Form {
        project_form(&self.name, &self.odoo_id.to_string())
    }

    fn draft(form: &Form) -> Option<NewProject> {
        Some(NewProject {
            name: form.text(PROJECT_NAME).trim().to_owned(),
            odoo_id: form.text(PROJECT_ODOO_ID).trim().parse().ok()?,
        })
    }
}

fn project_form(name: &str, odoo_id: &str) -> Form {
    Form::fields(vec![
        TextField::new("Name")
            .placeholder("Project name")
            .char_limit(50)
            .validator(validate::chain(vec![
                validate::required("Name"),
                validate::length_range("Name", 2, 50),
            ]))
            .with_value(name),
        TextField::new("Odoo ID")
            .placeholder("12345")
            .char_limit(10)
            .validator(validate::positive_int("Odoo ID"))
            .with_value(odoo_id),
    ])
}

const ACTIVITY_NAME: usize = 0;
const ACTIVITY_SHORT_NAME: usize = 1;
const ACTIVITY_IS_WORK: usize = 2;

impl CatalogRecord for ActivityType {
    type Id = ActivityTypeId;
    type Draft = NewActivityType;

    const NOUN: &'static str = "activity type";
    const TITLE: &'static str = "Activity Types";
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Short Name", "Is Work"];

    fn id(&self) -> ActivityTypeId {
        self.id
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.short_name.clone(),
            if self.is_work { "yes" } else { "no" }.to_owned(),
        ]
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn blank_form() -> Form {
        activity_form("", "", true)
    }

    fn edit_form(&self) -> Form {
        activity_form(&self.name, &self.short_name, self.is_work)
    }

    fn draft(form: &Form) -> Option<NewActivityType> {
        Some(NewActivityType {
            name: form.text(ACTIVITY_NAME).trim().to_owned(),
            short_name: form.text(ACTIVITY_SHORT_NAME).trim().to_owned(),
            is_work: form.is_checked(ACTIVITY_IS_WORK),
        })
    }
}

fn activity_form(name: &str, short_name: &str, is_work: bool) -> Form {
    Form::new(vec![
        TextField::new("Name")
            .placeholder("Development")
            .char_limit(50)
            .validator(validate::chain(vec![
                validate::required("Name"),
                validate::max_length("Name", 50),
            ]))
            .with_value(name)
            .into(),
        TextField::new("Short Name")
            .placeholder("🔧")
            .char_limit(20)
            .validator(validate::required("Short Name"))
            .help("Displayed in calendar view - Use emoji only")
            .with_value(short_name)
            .into(),
        Checkbox::new("Is Work", is_work)
            .help("included in mail report")
            .into(),
    ])
}
