// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use runtime::DbRuntime;
use std::env;
use std::path::PathBuf;
use time::Date;
use timelog_app::calendar::{local_today, shift_months};
use timelog_app::{ActivityTypeId, AppState, ProjectId};
use timelog_db::Store;
use timelog_export::Exporter;
use timelog_testkit::WorkFaker;
use tracing::info;

const DEMO_SEED: u64 = 20_240_304;
const DEMO_PROJECTS: usize = 3;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `timelog --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    let ui_config = config.ui_config()?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let store = if options.demo {
        Store::open_memory()?
    } else {
        Store::open(&db_path).with_context(|| {
            format!(
                "open database {} -- if this path is wrong, set [storage].db_path or TIMELOG_DB_PATH",
                db_path.display()
            )
        })?
    };
    store.bootstrap()?;
    let today = local_today();
    if options.demo {
        seed_demo_data(&store, today)?;
    }
    if options.check_only {
        return Ok(());
    }

    logging::init(config.log_level(), &config.log_path()?)?;
    info!(db = %db_path.display(), demo = options.demo, "starting timelog");

    let mut state = AppState::with_screen(config.start_screen());
    let mut runtime = DbRuntime::new(&store, Exporter::system());
    timelog_tui::run_app(&mut state, &mut runtime, ui_config)
}

/// Fills the current and previous month with generated workhours. Returns
/// the number of entries written.
fn seed_demo_data(store: &Store, today: Date) -> Result<usize> {
    let mut faker = WorkFaker::new(DEMO_SEED);

    let mut project_ids: Vec<ProjectId> = Vec::new();
    for project in faker.projects(DEMO_PROJECTS) {
        project_ids.push(store.create_project(&project)?);
    }

    let existing = store.list_activity_types()?;
    let mut activity_ids: Vec<ActivityTypeId> = Vec::new();
    for activity in faker.activity_types() {
        let id = match existing.iter().find(|row| row.name == activity.name) {
            Some(row) => row.id,
            None => store.create_activity_type(&activity)?,
        };
        activity_ids.push(id);
    }

    let mut months = vec![(today.year(), today.month())];
    if let Some(previous) = shift_months(today, -1) {
        months.push((previous.year(), previous.month()));
    }

    let mut written = 0;
    for (year, month) in months {
        for fake in faker.month_entries(year, month, project_ids.len())? {
            if let Some(entry) = fake.resolve(&project_ids, &activity_ids) {
                store.create_entry(&entry)?;
                written += 1;
            }
        }
    }
    Ok(written)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("timelog - log work hours on a calendar and export monthly reports");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with generated workhours (in-memory)");
    println!("  --check                  Validate config + DB and exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args, seed_demo_data};
    use anyhow::Result;
    use std::path::PathBuf;
    use time::{Date, Month};
    use timelog_app::calendar::MonthRange;
    use timelog_db::Store;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/timelog-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_db_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-example-config", "--check", "--demo", "-h"],
            default_options_path(),
        )?;
        assert!(!options.print_config_path);
        assert!(!options.print_db_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.demo);
        assert!(options.show_help);
        Ok(())
    }

    #[test]
    fn demo_data_fills_two_months_with_resolvable_entries() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let today = Date::from_calendar_date(2024, Month::March, 4)?;

        let written = seed_demo_data(&store, today)?;

        let march = MonthRange::new(2024, Month::March)?;
        let february = MonthRange::new(2024, Month::February)?;
        let in_march = store.list_entries_in_range(march.first, march.last)?;
        let in_february = store.list_entries_in_range(february.first, february.last)?;
        assert!(!in_march.is_empty());
        assert!(!in_february.is_empty());
        assert_eq!(in_march.len() + in_february.len(), written);

        let names: Vec<String> = store
            .list_activity_types()?
            .into_iter()
            .map(|activity| activity.name)
            .collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
        Ok(())
    }
}
