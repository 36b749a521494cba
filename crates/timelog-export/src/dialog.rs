// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub title: &'static str,
    pub default_path: PathBuf,
    /// Glob shown by dialogs that take a filter, e.g. `*.csv`.
    pub pattern: &'static str,
}

/// OS-level file choosers. `None` means no dialog tool was available or the
/// user cancelled; callers fall back instead of failing.
pub trait FileDialog: Send + Sync {
    fn choose_save_path(&self, request: &SaveRequest) -> Option<PathBuf>;
    fn choose_image(&self) -> Option<PathBuf>;
}

/// zenity, then kdialog, then osascript, whichever is first on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDialog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DialogTool {
    Zenity,
    Kdialog,
    Osascript,
}

impl DialogTool {
    const ALL: [Self; 3] = [Self::Zenity, Self::Kdialog, Self::Osascript];

    const fn program(self) -> &'static str {
        match self {
            Self::Zenity => "zenity",
            Self::Kdialog => "kdialog",
            Self::Osascript => "osascript",
        }
    }

    fn detect() -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tool| command_exists(tool.program()))
    }
}

impl FileDialog for SystemDialog {
    fn choose_save_path(&self, request: &SaveRequest) -> Option<PathBuf> {
        let tool = DialogTool::detect()?;
        let default_path = request.default_path.to_string_lossy().to_string();
        let file_name = request
            .default_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut command = Command::new(tool.program());
        match tool {
            DialogTool::Zenity => {
                command.args([
                    "--file-selection".to_owned(),
                    "--save".to_owned(),
                    "--confirm-overwrite".to_owned(),
                    format!("--filename={default_path}"),
                    format!("--title={}", request.title),
                ]);
            }
            DialogTool::Kdialog => {
                command.args(["--getsavefilename", default_path.as_str(), request.pattern]);
            }
            DialogTool::Osascript => {
                let script = format!(
                    "set saveFile to choose file name with prompt \"{}\" default name \"{}\" default location (path to home folder)\nreturn POSIX path of saveFile",
                    request.title,
                    escape_applescript(&file_name)
                );
                command.args(["-e", script.as_str()]);
            }
        }
        run_dialog(tool, command)
    }

    fn choose_image(&self) -> Option<PathBuf> {
        let tool = DialogTool::detect()?;
        let home = home_dir().to_string_lossy().to_string();

        let mut command = Command::new(tool.program());
        match tool {
            DialogTool::Zenity => {
                command.args([
                    "--file-selection".to_owned(),
                    "--title=Select Signature Image".to_owned(),
                    "--file-filter=Images | *.png *.jpg *.jpeg".to_owned(),
                    format!("--filename={home}/"),
                ]);
            }
            DialogTool::Kdialog => {
                command.args(["--getopenfilename", home.as_str(), "*.png *.jpg *.jpeg"]);
            }
            DialogTool::Osascript => {
                command.args([
                    "-e",
                    "set imageFile to choose file with prompt \"Select Signature Image\" of type {\"public.image\"}\nreturn POSIX path of imageFile",
                ]);
            }
        }
        run_dialog(tool, command)
    }
}

fn run_dialog(tool: DialogTool, mut command: Command) -> Option<PathBuf> {
    debug!(tool = tool.program(), "opening file dialog");
    let output = match command.output() {
        Ok(output) => output,
        Err(error) => {
            warn!(tool = tool.program(), %error, "file dialog failed to start");
            return None;
        }
    };
    // Non-zero exit is how every tool reports cancel.
    if !output.status.success() {
        debug!(tool = tool.program(), "file dialog cancelled");
        return None;
    }
    let chosen = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if chosen.is_empty() {
        return None;
    }
    Some(PathBuf::from(chosen))
}

pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

pub fn default_save_path(file_name: &str) -> PathBuf {
    home_dir().join(file_name)
}

fn command_exists(program: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| is_executable(&dir.join(program)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn escape_applescript(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::{default_save_path, escape_applescript, is_executable};
    use anyhow::Result;

    #[test]
    fn applescript_quotes_are_escaped() {
        assert_eq!(escape_applescript(r#"a "b" \c"#), r#"a \"b\" \\c"#);
    }

    #[test]
    fn default_save_path_keeps_file_name() {
        let path = default_save_path("odoo_timesheet_March_2024.csv");
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("odoo_timesheet_March_2024.csv")
        );
    }

    #[test]
    fn plain_files_are_not_executable() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("zenity");
        std::fs::write(&file, "#!/bin/sh\n")?;
        #[cfg(unix)]
        assert!(!is_executable(&file));
        assert!(!is_executable(&dir.path().join("missing")));
        Ok(())
    }
}
