// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;
use time::{Date, Month};
use timelog_app::calendar::MonthRange;
use timelog_app::{
    ActivityType, ActivityTypeId, EntryId, HourEntry, NewActivityType, NewHourEntry, NewProject,
    Project, ProjectId,
};
use timelog_db::Store;
use timelog_export::{Exporter, MonthData};
use timelog_tui::{InternalEvent, ReportRequest};
use tracing::{debug, warn};

pub struct DbRuntime<'a> {
    store: &'a Store,
    exporter: Exporter,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store, exporter: Exporter) -> Self {
        Self { store, exporter }
    }

    /// Reads a month's entries and the current catalogs in one go, so the
    /// export itself never touches the connection.
    fn month_data(&self, year: i32, month: Month) -> Result<MonthData> {
        let range = MonthRange::new(year, month)?;
        Ok(MonthData {
            year,
            month,
            entries: self.store.list_entries_in_range(range.first, range.last)?,
            projects: self.store.list_projects()?,
            activity_types: self.store.list_activity_types()?,
        })
    }
}

fn run_export(exporter: &Exporter, request: &ReportRequest, data: &MonthData) -> Result<PathBuf> {
    match request {
        ReportRequest::OdooCsv { .. } => exporter.odoo_csv(data),
        ReportRequest::MailReport {
            meta, selection, ..
        } => exporter.mail_report(data, meta, selection),
    }
}

fn request_month(request: &ReportRequest) -> (i32, Month) {
    match request {
        ReportRequest::OdooCsv { year, month } | ReportRequest::MailReport { year, month, .. } => {
            (*year, *month)
        }
    }
}

impl timelog_tui::AppRuntime for DbRuntime<'_> {
    fn list_projects(&mut self) -> Result<Vec<Project>> {
        self.store.list_projects()
    }

    fn create_project(&mut self, project: &NewProject) -> Result<ProjectId> {
        self.store.create_project(project)
    }

    fn update_project(&mut self, id: ProjectId, project: &NewProject) -> Result<()> {
        self.store.update_project(id, project)
    }

    fn delete_project(&mut self, id: ProjectId) -> Result<()> {
        self.store.delete_project(id)
    }

    fn list_activity_types(&mut self) -> Result<Vec<ActivityType>> {
        self.store.list_activity_types()
    }

    fn create_activity_type(&mut self, activity: &NewActivityType) -> Result<ActivityTypeId> {
        self.store.create_activity_type(activity)
    }

    fn update_activity_type(
        &mut self,
        id: ActivityTypeId,
        activity: &NewActivityType,
    ) -> Result<()> {
        self.store.update_activity_type(id, activity)
    }

    fn delete_activity_type(&mut self, id: ActivityTypeId) -> Result<()> {
        self.store.delete_activity_type(id)
    }

    fn list_entries_for_date(&mut self, date: Date) -> Result<Vec<HourEntry>> {
        self.store.list_entries_for_date(date)
    }

    fn list_entries_in_range(&mut self, start: Date, end: Date) -> Result<Vec<HourEntry>> {
        self.store.list_entries_in_range(start, end)
    }

    fn create_entry(&mut self, entry: &NewHourEntry) -> Result<EntryId> {
        self.store.create_entry(entry)
    }

    fn update_entry(&mut self, id: EntryId, entry: &NewHourEntry) -> Result<()> {
        self.store.update_entry(id, entry)
    }

    fn delete_entry(&mut self, id: EntryId) -> Result<()> {
        self.store.delete_entry(id)
    }

    fn delete_entries_for_date(&mut self, date: Date) -> Result<usize> {
        self.store.delete_entries_for_date(date)
    }

    fn replace_entries_for_date(
        &mut self,
        date: Date,
        entries: &[NewHourEntry],
    ) -> Result<Vec<EntryId>> {
        self.store.replace_entries_for_date(date, entries)
    }

    fn generate_report(&mut self, request: &ReportRequest) -> Result<PathBuf> {
        let (year, month) = request_month(request);
        let data = self.month_data(year, month)?;
        run_export(&self.exporter, request, &data)
    }

    fn pick_signature_image(&mut self) -> PathBuf {
        self.exporter.pick_signature_image()
    }

    fn spawn_report(&mut self, request: ReportRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let (year, month) = request_month(&request);
        let data = self.month_data(year, month)?;
        let exporter = self.exporter.clone();
        debug!(kind = request.kind().label(), "spawning report worker");

        thread::Builder::new()
            .name("timelog-report".to_owned())
            .spawn(move || {
                let result = run_export(&exporter, &request, &data)
                    .map_err(|error| format!("{error:#}"));
                if tx.send(InternalEvent::ReportFinished { result }).is_err() {
                    warn!("report finished after the UI closed");
                }
            })
            .map_err(|error| anyhow!("start report worker: {error}"))?;
        Ok(())
    }

    fn spawn_image_picker(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let exporter = self.exporter.clone();
        thread::Builder::new()
            .name("timelog-image-picker".to_owned())
            .spawn(move || {
                let path = exporter.pick_signature_image();
                let _ = tx.send(InternalEvent::SignatureImageSelected(path));
            })
            .map_err(|error| anyhow!("start image picker: {error}"))?;
        Ok(())
    }
}
