// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use timelog_app::Screen;
use timelog_tui::{ReportDefaults, UiConfig};

const CONFIG_VERSION: i64 = 1;
const DEFAULT_NOTIFICATION_TIMEOUT: &str = "3s";
const DEFAULT_HOURS_PER_DAY: f64 = 8.0;
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub report: Report,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            report: Report::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub notification_timeout: Option<String>,
    pub start_screen: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            notification_timeout: Some(DEFAULT_NOTIFICATION_TIMEOUT.to_owned()),
            start_screen: Some(Screen::Calendar.label().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    pub from_company: Option<String>,
    pub to_company: Option<String>,
    pub hours_per_day: Option<f64>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            from_company: None,
            to_company: None,
            hours_per_day: Some(DEFAULT_HOURS_PER_DAY),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("TIMELOG_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set TIMELOG_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(timelog_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` at the top and keep values under [storage], [ui], [report], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            timelog_db::validate_db_path(db_path)?;
        }

        if let Some(timeout) = &self.ui.notification_timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "ui.notification_timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(screen) = &self.ui.start_screen
            && Screen::parse(screen).is_none()
        {
            bail!(
                "ui.start_screen in {} must be one of calendar, projects, activities; got {:?}",
                path.display(),
                screen
            );
        }

        if let Some(hours) = self.report.hours_per_day
            && !(hours.is_finite() && hours > 0.0)
        {
            bail!(
                "report.hours_per_day in {} must be a positive number, got {}",
                path.display(),
                hours
            );
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            bail!(
                "log.level in {} must be one of {}; got {:?}",
                path.display(),
                LOG_LEVELS.join(", "),
                level
            );
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => timelog_db::default_db_path(),
        }
    }

    pub fn start_screen(&self) -> Screen {
        self.ui
            .start_screen
            .as_deref()
            .and_then(Screen::parse)
            .unwrap_or(Screen::Calendar)
    }

    pub fn notification_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .notification_timeout
                .as_deref()
                .unwrap_or(DEFAULT_NOTIFICATION_TIMEOUT),
        )
    }

    pub fn report_defaults(&self) -> ReportDefaults {
        ReportDefaults {
            from_company: self.report.from_company.clone().unwrap_or_default(),
            to_company: self.report.to_company.clone().unwrap_or_default(),
            hours_per_day: self.report.hours_per_day.unwrap_or(DEFAULT_HOURS_PER_DAY),
        }
    }

    pub fn ui_config(&self) -> Result<UiConfig> {
        Ok(UiConfig {
            notification_timeout: self.notification_timeout()?,
            report: self.report_defaults(),
        })
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// `[log].path`, then `TIMELOG_LOG_PATH`, then the data directory.
    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = env::var_os("TIMELOG_LOG_PATH") {
            return Ok(PathBuf::from(path));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].path or TIMELOG_LOG_PATH")
        })?;
        Ok(data_root.join(timelog_db::APP_NAME).join("timelog.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# timelog config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/timelog/timelog.db)\n# db_path = \"/absolute/path/to/timelog.db\"\n\n[ui]\nnotification_timeout = \"{}\"\n# calendar, projects or activities\nstart_screen = \"calendar\"\n\n[report]\n# Pre-filled into the mail report form.\n# from_company = \"Your Company SRL\"\n# to_company = \"Client Company SA\"\nhours_per_day = {:.1}\n\n[log]\n# trace, debug, info, warn or error. RUST_LOG wins when set.\nlevel = \"{}\"\n# path = \"/absolute/path/to/timelog.log\"\n",
            path.display(),
            DEFAULT_NOTIFICATION_TIMEOUT,
            DEFAULT_HOURS_PER_DAY,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 3s)")
}
