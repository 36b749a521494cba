// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Calendar screen state: cursor, the loaded grid's entries, the clipboard,
//! and the modal stack layered on top.

use crate::day::{DayView, DeleteConfirm, EntryForm};
use crate::report::ReportModal;
use anyhow::Result;
use std::collections::BTreeMap;
use time::Date;
use timelog_app::calendar::{CalendarCursor, MonthGrid};
use timelog_app::clipboard::Clipboard;
use timelog_app::stats::Catalog;
use timelog_app::{ActivityType, HourEntry, Project, format_hours};

pub const WEEKDAY_HEADER: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug)]
pub enum CalendarModal {
    Day(DayView),
    Entry(EntryForm),
    Delete(DeleteConfirm),
    Report(ReportModal),
}

impl CalendarModal {
    /// Create, edit and delete modals; these close back onto a parked day view.
    pub fn is_crud(&self) -> bool {
        matches!(self, Self::Entry(_) | Self::Delete(_))
    }
}

/// One active modal plus, while a CRUD modal is open over it, the day view
/// it came from.
#[derive(Debug, Default)]
pub struct ModalStack {
    active: Option<CalendarModal>,
    saved_parent: Option<DayView>,
}

impl ModalStack {
    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&CalendarModal> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut CalendarModal> {
        self.active.as_mut()
    }

    pub fn saved_parent(&self) -> Option<&DayView> {
        self.saved_parent.as_ref()
    }

    pub fn open(&mut self, modal: CalendarModal) {
        self.active = Some(modal);
        self.saved_parent = None;
    }

    /// Installs a CRUD modal. An open day view is parked as the parent.
    pub fn push_crud(&mut self, modal: CalendarModal) {
        if let Some(CalendarModal::Day(view)) = self.active.take() {
            self.saved_parent = Some(view);
        }
        self.active = Some(modal);
    }

    /// Closes the active CRUD modal and reinstalls the parked day view,
    /// replacing its entries with `refreshed` when a write happened. Does
    /// nothing unless a CRUD modal is active, so a second close cannot
    /// restore twice.
    pub fn close_crud(&mut self, refreshed: Option<Vec<HourEntry>>) -> bool {
        if !self.active.as_ref().is_some_and(CalendarModal::is_crud) {
            return false;
        }
        self.active = self.saved_parent.take().map(|mut parent| {
            if let Some(entries) = refreshed {
                parent.set_entries(entries);
            }
            CalendarModal::Day(parent)
        });
        true
    }

    pub fn close(&mut self) {
        self.active = None;
        self.saved_parent = None;
    }

    pub fn report_mut(&mut self) -> Option<&mut ReportModal> {
        match &mut self.active {
            Some(CalendarModal::Report(report)) => Some(report),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CalendarScreen {
    pub cursor: CalendarCursor,
    pub clipboard: Clipboard,
    pub modals: ModalStack,
    today: Date,
    entries: BTreeMap<Date, Vec<HourEntry>>,
    projects: Vec<Project>,
    activity_types: Vec<ActivityType>,
    catalog: Catalog,
}

impl CalendarScreen {
    pub fn new(today: Date) -> Self {
        Self {
            cursor: CalendarCursor::at(today),
            clipboard: Clipboard::default(),
            modals: ModalStack::default(),
            today,
            entries: BTreeMap::new(),
            projects: Vec::new(),
            activity_types: Vec::new(),
            catalog: Catalog::default(),
        }
    }

    pub fn today(&self) -> Date {
        self.today
    }

    pub fn selected(&self) -> Date {
        self.cursor.selected
    }

    pub fn reset_to_today(&mut self) {
        self.cursor.jump_to(self.today);
    }

    pub fn grid(&self) -> Result<MonthGrid> {
        self.cursor.grid()
    }

    /// Replaces the cached entries for the visible grid.
    pub fn set_grid_entries(&mut self, entries: Vec<HourEntry>) {
        self.entries.clear();
        for entry in entries {
            self.entries.entry(entry.date).or_default().push(entry);
        }
    }

    pub fn entries_on(&self, date: Date) -> &[HourEntry] {
        self.entries.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_on(&self, date: Date) -> f64 {
        self.entries_on(date).iter().map(|entry| entry.hours).sum()
    }

    pub fn set_catalog(&mut self, projects: Vec<Project>, activity_types: Vec<ActivityType>) {
        self.catalog = Catalog::new(&projects, &activity_types);
        self.projects = projects;
        self.activity_types = activity_types;
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn activity_types(&self) -> &[ActivityType] {
        &self.activity_types
    }

    /// Day number followed by one `SHORT Nh` line per entry.
    pub fn cell_lines(&self, date: Date) -> Vec<String> {
        let mut lines = vec![format!("{:>2}", date.day())];
        for entry in self.entries_on(date) {
            let short = self
                .catalog
                .activity_type(entry.activity_type_id)
                .map(|activity| activity.short_name.as_str())
                .unwrap_or("?");
            lines.push(format!("{short} {}h", format_hours(entry.hours)));
        }
        lines
    }

    pub fn title(&self) -> String {
        format!("{} {}", self.cursor.view_month, self.cursor.view_year)
    }
}
