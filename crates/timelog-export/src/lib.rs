// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod dialog;
pub mod pdf;

use anyhow::{Context, Result, bail};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::macros::format_description;
use time::{Date, Month};
use timelog_app::calendar::MonthRange;
use timelog_app::stats::{Catalog, ReportSelection, WorkhourStats};
use timelog_app::{ActivityType, HourEntry, Project};
use tracing::{info, warn};

pub use dialog::{FileDialog, SaveRequest, SystemDialog};

pub const ODOO_CSV_HEADER: [&str; 5] = [
    "date",
    "account_id/id",
    "journal_id/id",
    "name",
    "unit_amount",
];
pub const ODOO_JOURNAL: &str = "hr_timesheet.analytic_journal";

/// Everything the exporters need for one month, read up front so export can
/// run away from the storage connection.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthData {
    pub year: i32,
    pub month: Month,
    pub entries: Vec<HourEntry>,
    pub projects: Vec<Project>,
    pub activity_types: Vec<ActivityType>,
}

impl MonthData {
    pub fn range(&self) -> Result<MonthRange> {
        MonthRange::new(self.year, self.month)
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(&self.projects, &self.activity_types)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailReportMeta {
    pub from_company: String,
    pub to_company: String,
    pub invoice_name: String,
    pub signature_image: Option<PathBuf>,
}

impl MailReportMeta {
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("From Company", &self.from_company),
            ("To Company", &self.to_company),
            ("Invoice Name", &self.invoice_name),
        ] {
            if value.trim().is_empty() {
                bail!("{label} is required -- fill it in and retry");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    OdooCsv,
    MailPdf,
}

impl ExportFormat {
    pub fn file_name(self, year: i32, month: Month) -> String {
        match self {
            Self::OdooCsv => format!("odoo_timesheet_{month}_{year}.csv"),
            Self::MailPdf => format!(
                "raport_activitate_{}_{year}.pdf",
                month.to_string().to_lowercase()
            ),
        }
    }

    const fn dialog_title(self) -> &'static str {
        match self {
            Self::OdooCsv => "Save Odoo CSV Report",
            Self::MailPdf => "Save Mail Report",
        }
    }

    const fn pattern(self) -> &'static str {
        match self {
            Self::OdooCsv => "*.csv",
            Self::MailPdf => "*.pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OdooCsv => f.write_str("Odoo CSV"),
            Self::MailPdf => f.write_str("mail report"),
        }
    }
}

/// Writes report files into a scratch directory, then hands them to the
/// save dialog. Cheap to clone into a worker thread.
#[derive(Clone)]
pub struct Exporter {
    temp_dir: PathBuf,
    dialog: Arc<dyn FileDialog>,
}

impl fmt::Debug for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exporter")
            .field("temp_dir", &self.temp_dir)
            .finish_non_exhaustive()
    }
}

impl Exporter {
    pub fn new(dialog: Arc<dyn FileDialog>) -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            dialog,
        }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemDialog))
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Every entry of the month whose project and activity type still exist.
    pub fn odoo_csv(&self, data: &MonthData) -> Result<PathBuf> {
        let temp_path = self
            .temp_dir
            .join(ExportFormat::OdooCsv.file_name(data.year, data.month));
        let written = with_cleanup(&temp_path, || {
            let file = fs::File::create(&temp_path)
                .with_context(|| format!("create {}", temp_path.display()))?;
            write_odoo_csv(file, &data.entries, &data.catalog())
        })?;
        info!(path = %temp_path.display(), rows = written, "wrote odoo csv");
        self.deliver(&temp_path, ExportFormat::OdooCsv)
    }

    /// Only entries whose (project, activity) pair is checked in `selection`.
    pub fn mail_report(
        &self,
        data: &MonthData,
        meta: &MailReportMeta,
        selection: &ReportSelection,
    ) -> Result<PathBuf> {
        meta.validate()?;
        let catalog = data.catalog();
        let filtered = selection.filter_entries(&data.entries, &catalog);
        let stats = WorkhourStats::compute(&filtered, &catalog);

        let temp_path = self
            .temp_dir
            .join(ExportFormat::MailPdf.file_name(data.year, data.month));
        with_cleanup(&temp_path, || {
            let bytes = pdf::render_mail_report(meta, data.year, data.month, &stats)?;
            fs::write(&temp_path, bytes)
                .with_context(|| format!("write {}", temp_path.display()))
        })?;
        info!(
            path = %temp_path.display(),
            entries = filtered.len(),
            "wrote mail report"
        );
        self.deliver(&temp_path, ExportFormat::MailPdf)
    }

    /// Path of the chosen signature image, or an empty path when the picker
    /// was cancelled or unavailable.
    pub fn pick_signature_image(&self) -> PathBuf {
        self.dialog.choose_image().unwrap_or_default()
    }

    /// Without a chosen target the temp file is the result. Otherwise the
    /// file moves to the target.
    fn deliver(&self, temp_path: &Path, format: ExportFormat) -> Result<PathBuf> {
        let file_name = temp_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let request = SaveRequest {
            title: format.dialog_title(),
            default_path: dialog::default_save_path(&file_name),
            pattern: format.pattern(),
        };
        let Some(target) = self.dialog.choose_save_path(&request) else {
            return Ok(temp_path.to_path_buf());
        };
        if target == temp_path {
            return Ok(target);
        }

        with_cleanup(temp_path, || {
            fs::copy(temp_path, &target).with_context(|| {
                format!(
                    "save {format} to {} -- choose a writable location and retry",
                    target.display()
                )
            })
        })?;
        if let Err(error) = fs::remove_file(temp_path) {
            warn!(path = %temp_path.display(), %error, "failed to remove temp report");
        }
        info!(path = %target.display(), "saved {format}");
        Ok(target)
    }
}

/// Writes the Odoo timesheet import CSV and returns the number of data rows.
/// Entries with an unknown project or activity type are skipped.
pub fn write_odoo_csv<W: Write>(writer: W, entries: &[HourEntry], catalog: &Catalog) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(ODOO_CSV_HEADER)
        .context("write csv header")?;

    let mut rows = 0;
    for entry in entries {
        let (Some(project), Some(activity)) = (
            catalog.project(entry.project_id),
            catalog.activity_type(entry.activity_type_id),
        ) else {
            continue;
        };
        csv_writer
            .write_record([
                format_iso_date(entry.date)?,
                format!("__export__.account_analytic_account_{}", project.odoo_id),
                ODOO_JOURNAL.to_owned(),
                activity.name.clone(),
                format_amount(entry.hours),
            ])
            .with_context(|| format!("write csv row for workhour {}", entry.id))?;
        rows += 1;
    }
    csv_writer.flush().context("flush csv")?;
    Ok(rows)
}

/// Shortest decimal for an hour amount: `8`, `7.5`, `0.3`.
pub fn format_amount(hours: f64) -> String {
    let rounded = (hours * 1_000_000.0).round() / 1_000_000.0;
    format!("{rounded}")
}

fn format_iso_date(date: Date) -> Result<String> {
    date.format(&format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("format workhour date {date}"))
}

/// Runs `step`; on failure removes whatever partial file it left at `path`.
fn with_cleanup<T>(path: &Path, step: impl FnOnce() -> Result<T>) -> Result<T> {
    step().inspect_err(|_| {
        if path.exists()
            && let Err(error) = fs::remove_file(path)
        {
            warn!(path = %path.display(), %error, "failed to remove partial report");
        }
    })
}
