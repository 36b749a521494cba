// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Report modal: pick a kind, fill the mail-report metadata and checklist,
//! then wait for the exporter.

use crate::day::hint_line;
use crate::form::{Checkbox, Form, FormElement, TextField, error_line};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use std::path::PathBuf;
use time::Month;
use timelog_app::stats::{Catalog, ChecklistItem, ReportSelection, WorkhourStats};
use timelog_app::validate;
use timelog_app::{HourEntry, ReportKind, format_hours};
use timelog_export::MailReportMeta;

pub const FROM_FIELD: usize = 0;
pub const TO_FIELD: usize = 1;
pub const INVOICE_FIELD: usize = 2;
pub const SIGNATURE_FIELD: usize = 3;
pub const CHECKLIST_START: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStage {
    KindList,
    MailForm,
    Generating,
    Failed { message: String },
}

/// What the exporter is asked to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRequest {
    OdooCsv {
        year: i32,
        month: Month,
    },
    MailReport {
        year: i32,
        month: Month,
        meta: MailReportMeta,
        selection: ReportSelection,
    },
}

impl ReportRequest {
    pub fn kind(&self) -> ReportKind {
        match self {
            Self::OdooCsv { .. } => ReportKind::OdooCsv,
            Self::MailReport { .. } => ReportKind::MailReport,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportAction {
    Close,
    Generate(ReportRequest),
    PickImage,
}

/// Values pre-filled into a fresh mail-report form.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDefaults {
    pub from_company: String,
    pub to_company: String,
    pub hours_per_day: f64,
}

impl Default for ReportDefaults {
    fn default() -> Self {
        Self {
            from_company: String::new(),
            to_company: String::new(),
            hours_per_day: 8.0,
        }
    }
}

#[derive(Debug)]
pub struct ReportModal {
    year: i32,
    month: Month,
    stage: ReportStage,
    resume: ReportStage,
    kind_cursor: usize,
    defaults: ReportDefaults,
    stats: WorkhourStats,
    checklist: Vec<ChecklistItem>,
    initial_selection: ReportSelection,
    signature: Option<PathBuf>,
    form: Form,
}

impl ReportModal {
    /// `entries` is the month being reported; the checklist starts from it.
    pub fn new(
        year: i32,
        month: Month,
        entries: &[HourEntry],
        catalog: &Catalog,
        defaults: ReportDefaults,
    ) -> Self {
        let stats = WorkhourStats::compute(entries, catalog);
        let checklist = stats.checklist();
        let initial_selection = ReportSelection::from_stats(&stats, catalog);
        let form = mail_form(&defaults, &checklist, &initial_selection);
        Self {
            year,
            month,
            stage: ReportStage::KindList,
            resume: ReportStage::KindList,
            kind_cursor: 0,
            defaults,
            stats,
            checklist,
            initial_selection,
            signature: None,
            form,
        }
    }

    pub fn stage(&self) -> &ReportStage {
        &self.stage
    }

    pub fn kind_cursor(&self) -> usize {
        self.kind_cursor
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    pub fn checklist(&self) -> &[ChecklistItem] {
        &self.checklist
    }

    pub fn signature(&self) -> Option<&PathBuf> {
        self.signature.as_ref()
    }

    pub fn is_generating(&self) -> bool {
        self.stage == ReportStage::Generating
    }

    pub fn title(&self) -> String {
        format!("Generate Report: {} {}", self.month, self.year)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ReportAction> {
        match self.stage {
            ReportStage::Generating => None,
            ReportStage::Failed { .. } => match key.code {
                KeyCode::Enter => {
                    self.stage = self.resume.clone();
                    None
                }
                KeyCode::Esc | KeyCode::Char('q') => Some(ReportAction::Close),
                _ => None,
            },
            ReportStage::KindList => self.handle_kind_key(key),
            ReportStage::MailForm => self.handle_form_key(key),
        }
    }

    fn handle_kind_key(&mut self, key: KeyEvent) -> Option<ReportAction> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.kind_cursor = self.kind_cursor.saturating_sub(1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.kind_cursor = (self.kind_cursor + 1).min(ReportKind::ALL.len() - 1);
                None
            }
            KeyCode::Enter => {
                let kind = ReportKind::ALL
                    .get(self.kind_cursor)
                    .copied()
                    .unwrap_or(ReportKind::OdooCsv);
                self.pick(kind)
            }
            KeyCode::Char('o') => self.pick(ReportKind::OdooCsv),
            KeyCode::Char('m') => self.pick(ReportKind::MailReport),
            KeyCode::Esc | KeyCode::Char('q') => Some(ReportAction::Close),
            _ => None,
        }
    }

    fn pick(&mut self, kind: ReportKind) -> Option<ReportAction> {
        match kind {
            ReportKind::OdooCsv => {
                self.kind_cursor = 0;
                self.start(ReportStage::KindList);
                Some(ReportAction::Generate(ReportRequest::OdooCsv {
                    year: self.year,
                    month: self.month,
                }))
            }
            ReportKind::MailReport => {
                self.kind_cursor = 1;
                self.stage = ReportStage::MailForm;
                None
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<ReportAction> {
        match key.code {
            KeyCode::Esc => {
                self.reset_form();
                self.stage = ReportStage::KindList;
                None
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Char('s') if self.form.focus() == SIGNATURE_FIELD => {
                Some(ReportAction::PickImage)
            }
            KeyCode::Down => {
                self.form.focus_next();
                None
            }
            KeyCode::Up => {
                self.form.focus_prev();
                None
            }
            _ => {
                self.form.handle_input(key);
                None
            }
        }
    }

    fn submit(&mut self) -> Option<ReportAction> {
        if !self.form.validate() {
            return None;
        }
        let meta = MailReportMeta {
            from_company: self.form.text(FROM_FIELD).trim().to_owned(),
            to_company: self.form.text(TO_FIELD).trim().to_owned(),
            invoice_name: self.form.text(INVOICE_FIELD).trim().to_owned(),
            signature_image: self.signature.clone(),
        };
        let selection = self.selection();
        self.start(ReportStage::MailForm);
        Some(ReportAction::Generate(ReportRequest::MailReport {
            year: self.year,
            month: self.month,
            meta,
            selection,
        }))
    }

    fn start(&mut self, resume: ReportStage) {
        self.resume = resume;
        self.stage = ReportStage::Generating;
    }

    /// Checklist state as a selection over observed pairs.
    pub fn selection(&self) -> ReportSelection {
        let mut selection = self.initial_selection.clone();
        for (offset, item) in self.checklist.iter().enumerate() {
            let checked = self.form.is_checked(CHECKLIST_START + offset);
            if checked != selection.is_checked(&item.project, &item.activity) {
                selection.toggle(&item.project, &item.activity);
            }
        }
        selection
    }

    /// An empty path means the picker was cancelled.
    pub fn set_signature(&mut self, path: PathBuf) -> bool {
        if path.as_os_str().is_empty() || self.stage != ReportStage::MailForm {
            return false;
        }
        self.form
            .set_text(SIGNATURE_FIELD, path.display().to_string());
        self.signature = Some(path);
        true
    }

    /// Only a running generation can fail; late results are dropped.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.is_generating() {
            return false;
        }
        self.stage = ReportStage::Failed {
            message: message.into(),
        };
        true
    }

    fn reset_form(&mut self) {
        self.signature = None;
        self.form = mail_form(&self.defaults, &self.checklist, &self.initial_selection);
    }

    pub fn render(&self) -> Vec<Line<'static>> {
        match &self.stage {
            ReportStage::KindList => self.render_kinds(),
            ReportStage::MailForm => {
                let mut lines = self.render_fields();
                lines.push(hint_line(
                    "tab/↑↓ move · space toggle · s choose image · enter generate · esc back",
                ));
                lines
            }
            ReportStage::Generating => vec![
                Line::from(Span::styled(
                    "Generating report…",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                hint_line("please wait"),
            ],
            ReportStage::Failed { message } => vec![
                error_line(&format!("Failed to generate report: {message}")),
                Line::default(),
                hint_line("enter retry · esc close"),
            ],
        }
    }

    fn render_kinds(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from("Choose a report type:"), Line::default()];
        for (index, kind) in ReportKind::ALL.iter().enumerate() {
            let selected = index == self.kind_cursor;
            let style = if selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let marker = if selected { "▸ " } else { "  " };
            lines.push(Line::from(Span::styled(
                format!("{marker}{}", kind.label()),
                style,
            )));
        }
        lines.push(Line::default());
        lines.push(hint_line("j/k move · enter pick · o csv · m mail · esc close"));
        lines
    }

    fn render_fields(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for element in self.form.elements().iter().take(CHECKLIST_START) {
            lines.extend(element.render());
        }
        if let Some(error) = self.form.error() {
            lines.push(Line::default());
            lines.push(error_line(error));
        }
        lines
    }

    /// Summary plus the per-project checklist.
    pub fn render_preview(&self) -> Vec<Line<'static>> {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(Span::styled("Summary", bold)),
            Line::from(format!("Total: {}h", format_hours(self.stats.total_hours))),
            Line::from(format!("Days worked: {}", self.stats.total_days)),
            Line::default(),
        ];
        if self.checklist.is_empty() {
            lines.push(hint_line("No work hours logged this month."));
            return lines;
        }

        let mut offset = 0;
        for project in self.stats.ranked_projects() {
            lines.push(Line::from(Span::styled(
                format!(
                    "{}  {}h ({}d)",
                    project.name,
                    format_hours(project.hours),
                    format_hours(self.days(project.hours))
                ),
                bold,
            )));
            for _ in &project.activities {
                if let Some(element) = self.form.element(CHECKLIST_START + offset) {
                    lines.extend(element.render());
                }
                offset += 1;
            }
        }
        lines
    }

    fn days(&self, hours: f64) -> f64 {
        if self.defaults.hours_per_day > 0.0 {
            (hours / self.defaults.hours_per_day * 10.0).round() / 10.0
        } else {
            0.0
        }
    }
}

fn mail_form(
    defaults: &ReportDefaults,
    checklist: &[ChecklistItem],
    selection: &ReportSelection,
) -> Form {
    let mut elements: Vec<FormElement> = vec![
        TextField::new("From Company")
            .placeholder("Your company")
            .char_limit(100)
            .validator(validate::required("From Company"))
            .with_value(defaults.from_company.clone())
            .into(),
        TextField::new("To Company")
            .placeholder("Client company")
            .char_limit(100)
            .validator(validate::required("To Company"))
            .with_value(defaults.to_company.clone())
            .into(),
        TextField::new("Invoice Name")
            .placeholder("INV-001")
            .char_limit(50)
            .validator(validate::required("Invoice Name"))
            .into(),
        TextField::new("Signature Image")
            .placeholder("press s to choose (optional)")
            .read_only()
            .into(),
    ];
    elements.extend(checklist.iter().map(|item| {
        FormElement::from(
            Checkbox::new(
                format!("{}  {}h", item.activity, format_hours(item.hours)),
                selection.is_checked(&item.project, &item.activity),
            )
            .help("included in report"),
        )
    }));
    Form::new(elements)
}
