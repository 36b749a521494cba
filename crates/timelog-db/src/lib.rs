// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::Date;
use time::macros::format_description;
use timelog_app::{
    ActivityType, ActivityTypeId, EntryId, HourEntry, NewActivityType, NewHourEntry, NewProject,
    Project, ProjectId,
};
use tracing::{debug, info};

pub const APP_NAME: &str = "timelog";

const DEFAULT_PROJECTS: [(&str, i64); 1] = [("Internal", 1)];

const DEFAULT_ACTIVITY_TYPES: [(&str, &str, bool); 4] = [
    ("Development", "🔧", true),
    ("Meeting", "👥", true),
    ("Leave", "🏖️", false),
    ("National Holiday", "🎉", false),
];

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("projects", &["id", "name", "odoo_id"]),
    ("activity_types", &["id", "name", "short_name", "is_work"]),
    (
        "hour_entries",
        &["id", "entry_date", "activity_type_id", "project_id", "hours"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_hour_entries_entry_date",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_hour_entries_entry_date ON hour_entries (entry_date);",
    },
    RequiredIndex {
        name: "idx_hour_entries_project_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_hour_entries_project_id ON hour_entries (project_id);",
    },
    RequiredIndex {
        name: "idx_hour_entries_activity_type_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_hour_entries_activity_type_id ON hour_entries (activity_type_id);",
    },
];

const ENTRY_COLUMNS: &str = "id, entry_date, activity_type_id, project_id, hours";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryParent {
    Project(ProjectId),
    ActivityType(ActivityTypeId),
}

impl EntryParent {
    const fn table(self) -> &'static str {
        match self {
            Self::Project(_) => "projects",
            Self::ActivityType(_) => "activity_types",
        }
    }

    const fn fk_column(self) -> &'static str {
        match self {
            Self::Project(_) => "project_id",
            Self::ActivityType(_) => "activity_type_id",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Project(_) => "project",
            Self::ActivityType(_) => "activity type",
        }
    }

    const fn id(self) -> i64 {
        match self {
            Self::Project(id) => id.get(),
            Self::ActivityType(id) => id.get(),
        }
    }
}

/// Single SQLite connection owning the projects, activity types and hour
/// entries tables.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        debug!(path = %path.display(), "opened database");
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            info!("created database schema");
        }

        ensure_required_indexes(&self.conn)?;

        self.seed_defaults()?;
        Ok(())
    }

    /// Seeds each catalog only while it is empty, so user deletions stick.
    pub fn seed_defaults(&self) -> Result<()> {
        if count_rows(&self.conn, "projects")? == 0 {
            for (name, odoo_id) in DEFAULT_PROJECTS {
                self.conn
                    .execute(
                        "INSERT INTO projects (name, odoo_id) VALUES (?, ?)",
                        params![name, odoo_id],
                    )
                    .with_context(|| format!("insert default project {name}"))?;
            }
        }

        if count_rows(&self.conn, "activity_types")? == 0 {
            for (name, short_name, is_work) in DEFAULT_ACTIVITY_TYPES {
                self.conn
                    .execute(
                        "INSERT INTO activity_types (name, short_name, is_work) VALUES (?, ?, ?)",
                        params![name, short_name, is_work],
                    )
                    .with_context(|| format!("insert default activity type {name}"))?;
            }
        }
        Ok(())
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, odoo_id FROM projects ORDER BY id ASC")
            .context("prepare projects query")?;
        let rows = stmt
            .query_map([], project_from_row)
            .context("query projects")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect projects")
    }

    pub fn get_project(&self, project_id: ProjectId) -> Result<Option<Project>> {
        self.conn
            .query_row(
                "SELECT id, name, odoo_id FROM projects WHERE id = ?",
                params![project_id.get()],
                project_from_row,
            )
            .optional()
            .with_context(|| format!("load project {}", project_id.get()))
    }

    pub fn create_project(&self, project: &NewProject) -> Result<ProjectId> {
        project.validate()?;
        self.conn
            .execute(
                "INSERT INTO projects (name, odoo_id) VALUES (?, ?)",
                params![project.name.trim(), project.odoo_id],
            )
            .context("insert project")?;

        let id = ProjectId::new(self.conn.last_insert_rowid());
        info!(project_id = id.get(), name = %project.name, "created project");
        Ok(id)
    }

    pub fn update_project(&self, project_id: ProjectId, update: &NewProject) -> Result<()> {
        update.validate()?;
        let rows_affected = self
            .conn
            .execute(
                "UPDATE projects SET name = ?, odoo_id = ? WHERE id = ?",
                params![update.name.trim(), update.odoo_id, project_id.get()],
            )
            .context("update project")?;
        if rows_affected == 0 {
            bail!(
                "project {} not found -- choose an existing project and retry",
                project_id.get()
            );
        }
        info!(project_id = project_id.get(), "updated project");
        Ok(())
    }

    pub fn delete_project(&self, project_id: ProjectId) -> Result<()> {
        self.ensure_no_entries_reference(EntryParent::Project(project_id))?;
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM projects WHERE id = ?",
                params![project_id.get()],
            )
            .with_context(|| format!("delete project {}", project_id.get()))?;
        if rows_affected == 0 {
            bail!("project {} not found or already deleted", project_id.get());
        }
        info!(project_id = project_id.get(), "deleted project");
        Ok(())
    }

    pub fn list_activity_types(&self) -> Result<Vec<ActivityType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, short_name, is_work FROM activity_types ORDER BY id ASC")
            .context("prepare activity types query")?;
        let rows = stmt
            .query_map([], activity_type_from_row)
            .context("query activity types")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect activity types")
    }

    pub fn get_activity_type(&self, activity_id: ActivityTypeId) -> Result<Option<ActivityType>> {
        self.conn
            .query_row(
                "SELECT id, name, short_name, is_work FROM activity_types WHERE id = ?",
                params![activity_id.get()],
                activity_type_from_row,
            )
            .optional()
            .with_context(|| format!("load activity type {}", activity_id.get()))
    }

    pub fn create_activity_type(&self, activity: &NewActivityType) -> Result<ActivityTypeId> {
        activity.validate()?;
        self.conn
            .execute(
                "INSERT INTO activity_types (name, short_name, is_work) VALUES (?, ?, ?)",
                params![
                    activity.name.trim(),
                    activity.short_name.trim(),
                    activity.is_work
                ],
            )
            .context("insert activity type")?;

        let id = ActivityTypeId::new(self.conn.last_insert_rowid());
        info!(activity_type_id = id.get(), name = %activity.name, "created activity type");
        Ok(id)
    }

    pub fn update_activity_type(
        &self,
        activity_id: ActivityTypeId,
        update: &NewActivityType,
    ) -> Result<()> {
        update.validate()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE activity_types
                SET name = ?, short_name = ?, is_work = ?
                WHERE id = ?
                ",
                params![
                    update.name.trim(),
                    update.short_name.trim(),
                    update.is_work,
                    activity_id.get()
                ],
            )
            .context("update activity type")?;
        if rows_affected == 0 {
            bail!(
                "activity type {} not found -- choose an existing activity type and retry",
                activity_id.get()
            );
        }
        info!(activity_type_id = activity_id.get(), "updated activity type");
        Ok(())
    }

    pub fn delete_activity_type(&self, activity_id: ActivityTypeId) -> Result<()> {
        self.ensure_no_entries_reference(EntryParent::ActivityType(activity_id))?;
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM activity_types WHERE id = ?",
                params![activity_id.get()],
            )
            .with_context(|| format!("delete activity type {}", activity_id.get()))?;
        if rows_affected == 0 {
            bail!(
                "activity type {} not found or already deleted",
                activity_id.get()
            );
        }
        info!(activity_type_id = activity_id.get(), "deleted activity type");
        Ok(())
    }

    pub fn list_entries_for_date(&self, date: Date) -> Result<Vec<HourEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM hour_entries WHERE entry_date = ? ORDER BY id ASC"
            ))
            .context("prepare day entries query")?;
        let rows = stmt
            .query_map(params![format_date(date)], entry_from_row)
            .with_context(|| format!("query entries for {}", format_date(date)))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect day entries")
    }

    /// Inclusive on both ends, ordered by date then id.
    pub fn list_entries_in_range(&self, start: Date, end: Date) -> Result<Vec<HourEntry>> {
        if end < start {
            bail!(
                "entry range end {} is before start {}",
                format_date(end),
                format_date(start)
            );
        }
        let mut stmt = self
            .conn
            .prepare(&format!(
                "
                SELECT {ENTRY_COLUMNS}
                FROM hour_entries
                WHERE entry_date >= ? AND entry_date <= ?
                ORDER BY entry_date ASC, id ASC
                "
            ))
            .context("prepare range entries query")?;
        let rows = stmt
            .query_map(
                params![format_date(start), format_date(end)],
                entry_from_row,
            )
            .context("query range entries")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect range entries")
    }

    pub fn get_entry(&self, entry_id: EntryId) -> Result<Option<HourEntry>> {
        self.conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM hour_entries WHERE id = ?"),
                params![entry_id.get()],
                entry_from_row,
            )
            .optional()
            .with_context(|| format!("load workhour {}", entry_id.get()))
    }

    pub fn create_entry(&self, entry: &NewHourEntry) -> Result<EntryId> {
        let id = insert_entry(&self.conn, entry)?;
        info!(
            entry_id = id.get(),
            date = %format_date(entry.date),
            hours = entry.hours,
            "created workhour"
        );
        Ok(id)
    }

    pub fn update_entry(&self, entry_id: EntryId, update: &NewHourEntry) -> Result<()> {
        update.validate()?;
        require_parent(&self.conn, EntryParent::Project(update.project_id))?;
        require_parent(&self.conn, EntryParent::ActivityType(update.activity_type_id))?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE hour_entries
                SET entry_date = ?, activity_type_id = ?, project_id = ?, hours = ?
                WHERE id = ?
                ",
                params![
                    format_date(update.date),
                    update.activity_type_id.get(),
                    update.project_id.get(),
                    update.hours,
                    entry_id.get()
                ],
            )
            .context("update workhour")?;
        if rows_affected == 0 {
            bail!(
                "workhour {} not found -- reload the day and retry",
                entry_id.get()
            );
        }
        info!(entry_id = entry_id.get(), hours = update.hours, "updated workhour");
        Ok(())
    }

    pub fn delete_entry(&self, entry_id: EntryId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM hour_entries WHERE id = ?",
                params![entry_id.get()],
            )
            .with_context(|| format!("delete workhour {}", entry_id.get()))?;
        if rows_affected == 0 {
            bail!("workhour {} not found or already deleted", entry_id.get());
        }
        info!(entry_id = entry_id.get(), "deleted workhour");
        Ok(())
    }

    /// Returns how many entries were removed; an empty day is not an error.
    pub fn delete_entries_for_date(&self, date: Date) -> Result<usize> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM hour_entries WHERE entry_date = ?",
                params![format_date(date)],
            )
            .with_context(|| format!("delete workhours for {}", format_date(date)))?;
        info!(date = %format_date(date), removed, "cleared day");
        Ok(removed)
    }

    /// Swaps every entry on `date` for `entries` inside one transaction.
    /// Either the whole day is replaced or nothing changes.
    pub fn replace_entries_for_date(
        &self,
        date: Date,
        entries: &[NewHourEntry],
    ) -> Result<Vec<EntryId>> {
        if let Some(stray) = entries.iter().find(|entry| entry.date != date) {
            bail!(
                "cannot replace {} with an entry dated {}",
                format_date(date),
                format_date(stray.date)
            );
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin replace transaction")?;
        let removed = tx
            .execute(
                "DELETE FROM hour_entries WHERE entry_date = ?",
                params![format_date(date)],
            )
            .with_context(|| format!("clear workhours for {}", format_date(date)))?;

        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            ids.push(insert_entry(&tx, entry)?);
        }
        tx.commit().context("commit replace transaction")?;

        info!(
            date = %format_date(date),
            removed,
            created = ids.len(),
            "replaced day"
        );
        Ok(ids)
    }

    fn ensure_no_entries_reference(&self, parent: EntryParent) -> Result<()> {
        let sql = format!(
            "SELECT COUNT(*) FROM hour_entries WHERE {} = ?",
            parent.fk_column()
        );
        let count: i64 = self
            .conn
            .query_row(&sql, params![parent.id()], |row| row.get(0))
            .with_context(|| {
                format!(
                    "count workhours for {}={}",
                    parent.fk_column(),
                    parent.id()
                )
            })?;
        if count > 0 {
            bail!(
                "{} {} has {count} workhour(s) -- delete or reassign them first",
                parent.label(),
                parent.id()
            );
        }
        Ok(())
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("TIMELOG_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set TIMELOG_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("timelog.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn insert_entry(conn: &Connection, entry: &NewHourEntry) -> Result<EntryId> {
    entry.validate()?;
    require_parent(conn, EntryParent::Project(entry.project_id))?;
    require_parent(conn, EntryParent::ActivityType(entry.activity_type_id))?;
    conn.execute(
        "
        INSERT INTO hour_entries (entry_date, activity_type_id, project_id, hours)
        VALUES (?, ?, ?, ?)
        ",
        params![
            format_date(entry.date),
            entry.activity_type_id.get(),
            entry.project_id.get(),
            entry.hours
        ],
    )
    .context("insert workhour")?;
    Ok(EntryId::new(conn.last_insert_rowid()))
}

fn require_parent(conn: &Connection, parent: EntryParent) -> Result<()> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)",
        parent.table()
    );
    let exists: i64 = conn
        .query_row(&sql, params![parent.id()], |row| row.get(0))
        .with_context(|| format!("check {} {}", parent.label(), parent.id()))?;
    if exists != 1 {
        bail!(
            "{} {} not found -- choose an existing {} and retry",
            parent.label(),
            parent.id(),
            parent.label()
        );
    }
    Ok(())
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: ProjectId::new(row.get(0)?),
        name: row.get(1)?,
        odoo_id: row.get(2)?,
    })
}

fn activity_type_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityType> {
    Ok(ActivityType {
        id: ActivityTypeId::new(row.get(0)?),
        name: row.get(1)?,
        short_name: row.get(2)?,
        is_work: row.get(3)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<HourEntry> {
    let date_raw: String = row.get(1)?;
    Ok(HourEntry {
        id: EntryId::new(row.get(0)?),
        date: parse_date(&date_raw).map_err(to_sql_error)?,
        activity_type_id: ActivityTypeId::new(row.get(2)?),
        project_id: ProjectId::new(row.get(3)?),
        hours: row.get(4)?,
    })
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .with_context(|| format!("count rows in {table}"))
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use a timelog database or start from an empty file"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn parse_date(raw: &str) -> Result<Date> {
    Date::parse(raw, &format_description!("[year]-[month]-[day]"))
        .with_context(|| format!("unsupported date format {raw:?}"))
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

pub fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

#[cfg(test)]
mod tests {
    use super::{Store, format_date, parse_date};
    use anyhow::Result;
    use time::{Date, Month};

    #[test]
    fn dates_round_trip_through_text() -> Result<()> {
        let date = Date::from_calendar_date(2024, Month::February, 29)?;
        assert_eq!(format_date(date), "2024-02-29");
        assert_eq!(parse_date("2024-02-29")?, date);
        assert!(parse_date("29/02/2024").is_err());
        Ok(())
    }

    #[test]
    fn bootstrap_is_idempotent() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        store.bootstrap()?;

        assert_eq!(store.list_projects()?.len(), 1);
        assert_eq!(store.list_activity_types()?.len(), 4);
        Ok(())
    }
}
