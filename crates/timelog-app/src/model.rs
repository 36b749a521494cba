// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::ids::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub odoo_id: i64,
}

/// A kind of logged time, e.g. development or leave. `is_work` decides
/// totals bucketing and the default report selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityType {
    pub id: ActivityTypeId,
    pub name: String,
    pub short_name: String,
    pub is_work: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourEntry {
    pub id: EntryId,
    pub date: Date,
    pub activity_type_id: ActivityTypeId,
    pub project_id: ProjectId,
    pub hours: f64,
}

impl HourEntry {
    pub fn to_new(&self, date: Date) -> NewHourEntry {
        NewHourEntry {
            date,
            activity_type_id: self.activity_type_id,
            project_id: self.project_id,
            hours: self.hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub odoo_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivityType {
    pub name: String,
    pub short_name: String,
    pub is_work: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHourEntry {
    pub date: Date,
    pub activity_type_id: ActivityTypeId,
    pub project_id: ProjectId,
    pub hours: f64,
}

impl NewProject {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("project name is required -- enter a name and retry");
        }
        if self.odoo_id <= 0 {
            bail!("project Odoo ID must be positive -- enter the analytic account id and retry");
        }
        Ok(())
    }
}

impl NewActivityType {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("activity type name is required -- enter a name and retry");
        }
        if self.short_name.trim().is_empty() {
            bail!("activity type short name is required -- enter a short name and retry");
        }
        Ok(())
    }
}

impl NewHourEntry {
    pub fn validate(&self) -> Result<()> {
        if !self.hours.is_finite() || self.hours <= 0.0 {
            bail!(
                "workhour hours must be a positive number, got {} -- enter hours and retry",
                self.hours
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Calendar,
    Projects,
    ActivityTypes,
}

impl Screen {
    pub const ALL: [Self; 3] = [Self::Calendar, Self::Projects, Self::ActivityTypes];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Projects => "projects",
            Self::ActivityTypes => "activities",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "calendar" => Some(Self::Calendar),
            "projects" => Some(Self::Projects),
            "activities" => Some(Self::ActivityTypes),
            _ => None,
        }
    }

    pub const fn hotkey(self) -> char {
        match self {
            Self::Calendar => '1',
            Self::Projects => '2',
            Self::ActivityTypes => '3',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    OdooCsv,
    MailReport,
}

impl ReportKind {
    pub const ALL: [Self; 2] = [Self::OdooCsv, Self::MailReport];

    pub const fn label(self) -> &'static str {
        match self {
            Self::OdooCsv => "Odoo CSV",
            Self::MailReport => "Mail Report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Error,
    Success,
    Info,
}

impl NotificationKind {
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Error => "✗",
            Self::Success => "✓",
            Self::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }
}

/// Hours as shown in the calendar: whole numbers drop the decimal.
pub fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{hours:.0}")
    } else {
        format!("{hours:.1}")
    }
}
