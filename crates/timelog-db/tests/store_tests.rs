// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use time::{Date, Month};
use timelog_app::{
    ActivityTypeId, EntryId, NewActivityType, NewHourEntry, NewProject, ProjectId,
};
use timelog_db::{Store, validate_db_path};
use timelog_testkit::{WorkFaker, temp_db_path};

fn date(day: u8) -> Result<Date> {
    Ok(Date::from_calendar_date(2024, Month::March, day)?)
}

fn bootstrapped() -> Result<Store> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    Ok(store)
}

fn new_entry(
    day: u8,
    project_id: ProjectId,
    activity_type_id: ActivityTypeId,
    hours: f64,
) -> Result<NewHourEntry> {
    Ok(NewHourEntry {
        date: date(day)?,
        activity_type_id,
        project_id,
        hours,
    })
}

fn first_ids(store: &Store) -> Result<(ProjectId, ActivityTypeId)> {
    let project = store.list_projects()?[0].id;
    let activity = store.list_activity_types()?[0].id;
    Ok((project, activity))
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("").is_err());
    assert!(validate_db_path("/tmp/timelog.db").is_ok());
}

#[test]
fn bootstrap_creates_schema_and_seed_defaults() -> Result<()> {
    let store = bootstrapped()?;

    let projects = store.list_projects()?;
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Internal");
    assert_eq!(projects[0].odoo_id, 1);

    let activity_types = store.list_activity_types()?;
    let summary: Vec<(&str, bool)> = activity_types
        .iter()
        .map(|activity| (activity.name.as_str(), activity.is_work))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Development", true),
            ("Meeting", true),
            ("Leave", false),
            ("National Holiday", false),
        ]
    );
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = Store::open_memory()?;
    store.raw_connection().execute_batch(
        "
        CREATE TABLE projects (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
        CREATE TABLE activity_types (
          id INTEGER PRIMARY KEY, name TEXT, short_name TEXT, is_work INTEGER
        );
        CREATE TABLE hour_entries (
          id INTEGER PRIMARY KEY, entry_date TEXT, activity_type_id INTEGER,
          project_id INTEGER, hours REAL
        );
        ",
    )?;

    let error = store
        .bootstrap()
        .expect_err("bootstrap should reject a projects table without odoo_id");
    assert!(
        error
            .to_string()
            .contains("table `projects` is missing required columns: odoo_id")
    );
    Ok(())
}

#[test]
fn bootstrap_rejects_foreign_database() -> Result<()> {
    let store = Store::open_memory()?;
    store
        .raw_connection()
        .execute_batch("CREATE TABLE vendors (id INTEGER PRIMARY KEY);")?;

    let error = store.bootstrap().expect_err("unrelated schema should fail");
    assert!(error.to_string().contains("missing required table `projects`"));
    Ok(())
}

#[test]
fn seed_does_not_resurrect_deleted_defaults() -> Result<()> {
    let store = bootstrapped()?;
    let internal = store.list_projects()?[0].id;
    store.create_project(&NewProject {
        name: "Acme".to_owned(),
        odoo_id: 42,
    })?;
    store.delete_project(internal)?;

    store.bootstrap()?;
    let names: Vec<String> = store
        .list_projects()?
        .into_iter()
        .map(|project| project.name)
        .collect();
    assert_eq!(names, vec!["Acme".to_owned()]);
    Ok(())
}

#[test]
fn project_crud_round_trip() -> Result<()> {
    let store = bootstrapped()?;

    let id = store.create_project(&NewProject {
        name: "  Acme Portal ".to_owned(),
        odoo_id: 314,
    })?;
    let created = store.get_project(id)?.expect("created project exists");
    assert_eq!(created.name, "Acme Portal");
    assert_eq!(created.odoo_id, 314);

    store.update_project(
        id,
        &NewProject {
            name: "Acme Billing".to_owned(),
            odoo_id: 315,
        },
    )?;
    let updated = store.get_project(id)?.expect("updated project exists");
    assert_eq!(updated.name, "Acme Billing");
    assert_eq!(updated.odoo_id, 315);

    store.delete_project(id)?;
    assert!(store.get_project(id)?.is_none());
    Ok(())
}

#[test]
fn missing_rows_are_actionable() -> Result<()> {
    let store = bootstrapped()?;

    assert!(store.get_project(ProjectId::new(999))?.is_none());
    assert!(store.get_activity_type(ActivityTypeId::new(999))?.is_none());
    assert!(store.get_entry(EntryId::new(999))?.is_none());

    let error = store
        .update_project(
            ProjectId::new(999),
            &NewProject {
                name: "Ghost".to_owned(),
                odoo_id: 1,
            },
        )
        .expect_err("missing project update should fail");
    assert!(error.to_string().contains("project 999 not found"));

    let error = store
        .delete_entry(EntryId::new(999))
        .expect_err("missing entry delete should fail");
    assert!(error.to_string().contains("workhour 999 not found"));
    Ok(())
}

#[test]
fn invalid_inputs_are_rejected() -> Result<()> {
    let store = bootstrapped()?;
    let (project, activity) = first_ids(&store)?;

    assert!(
        store
            .create_project(&NewProject {
                name: " ".to_owned(),
                odoo_id: 5,
            })
            .is_err()
    );
    assert!(
        store
            .create_activity_type(&NewActivityType {
                name: "Travel".to_owned(),
                short_name: String::new(),
                is_work: true,
            })
            .is_err()
    );
    assert!(store.create_entry(&new_entry(4, project, activity, 0.0)?).is_err());
    assert!(
        store
            .create_entry(&new_entry(4, ProjectId::new(77), activity, 8.0)?)
            .is_err()
    );
    assert!(store.list_entries_for_date(date(4)?)?.is_empty());
    Ok(())
}

#[test]
fn delete_referenced_project_is_blocked() -> Result<()> {
    let store = bootstrapped()?;
    let (project, activity) = first_ids(&store)?;
    store.create_entry(&new_entry(4, project, activity, 8.0)?)?;

    let error = store
        .delete_project(project)
        .expect_err("referenced project should not delete");
    assert!(
        error
            .to_string()
            .contains("has 1 workhour(s) -- delete or reassign them first")
    );

    let error = store
        .delete_activity_type(activity)
        .expect_err("referenced activity type should not delete");
    assert!(error.to_string().contains("activity type"));
    Ok(())
}

#[test]
fn activity_type_crud_round_trip() -> Result<()> {
    let store = bootstrapped()?;

    let id = store.create_activity_type(&NewActivityType {
        name: "Travel".to_owned(),
        short_name: "✈️".to_owned(),
        is_work: false,
    })?;
    store.update_activity_type(
        id,
        &NewActivityType {
            name: "Business Travel".to_owned(),
            short_name: "✈️".to_owned(),
            is_work: true,
        },
    )?;

    let loaded = store.get_activity_type(id)?.expect("activity type exists");
    assert_eq!(loaded.name, "Business Travel");
    assert!(loaded.is_work);

    store.delete_activity_type(id)?;
    assert!(store.get_activity_type(id)?.is_none());
    Ok(())
}

#[test]
fn entries_list_by_date_and_range() -> Result<()> {
    let store = bootstrapped()?;
    let (project, activity) = first_ids(&store)?;

    let late = store.create_entry(&new_entry(6, project, activity, 4.0)?)?;
    let early = store.create_entry(&new_entry(4, project, activity, 8.0)?)?;
    let same_day = store.create_entry(&new_entry(4, project, activity, 1.5)?)?;
    store.create_entry(&new_entry(29, project, activity, 2.0)?)?;

    let day: Vec<EntryId> = store
        .list_entries_for_date(date(4)?)?
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(day, vec![early, same_day]);

    let range: Vec<EntryId> = store
        .list_entries_in_range(date(4)?, date(6)?)?
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(range, vec![early, same_day, late]);

    assert!(store.list_entries_in_range(date(6)?, date(4)?).is_err());
    Ok(())
}

#[test]
fn update_entry_moves_and_changes_hours() -> Result<()> {
    let store = bootstrapped()?;
    let (project, activity) = first_ids(&store)?;
    let id = store.create_entry(&new_entry(4, project, activity, 8.0)?)?;

    store.update_entry(id, &new_entry(5, project, activity, 7.5)?)?;

    let entry = store.get_entry(id)?.expect("entry exists");
    assert_eq!(entry.date, date(5)?);
    assert_eq!(entry.hours, 7.5);
    assert!(store.list_entries_for_date(date(4)?)?.is_empty());
    Ok(())
}

#[test]
fn delete_entries_for_date_counts_removed() -> Result<()> {
    let store = bootstrapped()?;
    let (project, activity) = first_ids(&store)?;
    store.create_entry(&new_entry(4, project, activity, 6.0)?)?;
    store.create_entry(&new_entry(4, project, activity, 2.0)?)?;
    store.create_entry(&new_entry(5, project, activity, 8.0)?)?;

    assert_eq!(store.delete_entries_for_date(date(4)?)?, 2);
    assert_eq!(store.delete_entries_for_date(date(4)?)?, 0);
    assert_eq!(store.list_entries_for_date(date(5)?)?.len(), 1);
    Ok(())
}

#[test]
fn replace_entries_swaps_whole_day() -> Result<()> {
    let store = bootstrapped()?;
    let (project, activity) = first_ids(&store)?;
    store.create_entry(&new_entry(8, project, activity, 3.0)?)?;

    let ids = store.replace_entries_for_date(
        date(8)?,
        &[
            new_entry(8, project, activity, 6.0)?,
            new_entry(8, project, activity, 2.0)?,
        ],
    )?;
    assert_eq!(ids.len(), 2);

    let hours: Vec<f64> = store
        .list_entries_for_date(date(8)?)?
        .into_iter()
        .map(|entry| entry.hours)
        .collect();
    assert_eq!(hours, vec![6.0, 2.0]);
    Ok(())
}

#[test]
fn replace_entries_rolls_back_on_failure() -> Result<()> {
    let store = bootstrapped()?;
    let (project, activity) = first_ids(&store)?;
    let original = store.create_entry(&new_entry(8, project, activity, 3.0)?)?;

    let result = store.replace_entries_for_date(
        date(8)?,
        &[
            new_entry(8, project, activity, 6.0)?,
            new_entry(8, ProjectId::new(404), activity, 2.0)?,
        ],
    );
    assert!(result.is_err());

    let remaining: Vec<EntryId> = store
        .list_entries_for_date(date(8)?)?
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(remaining, vec![original]);
    Ok(())
}

#[test]
fn replace_entries_rejects_other_dates() -> Result<()> {
    let store = bootstrapped()?;
    let (project, activity) = first_ids(&store)?;

    let error = store
        .replace_entries_for_date(date(8)?, &[new_entry(9, project, activity, 1.0)?])
        .expect_err("mismatched date should fail");
    assert!(error.to_string().contains("cannot replace 2024-03-08"));
    Ok(())
}

#[test]
fn file_database_persists_faker_month() -> Result<()> {
    let (_dir, path) = temp_db_path()?;
    let mut faker = WorkFaker::new(11);

    let expected = {
        let store = Store::open(&path)?;
        store.bootstrap()?;
        let project_ids = faker
            .projects(2)
            .iter()
            .map(|project| store.create_project(project))
            .collect::<Result<Vec<_>>>()?;
        let activity_ids = faker
            .activity_types()
            .iter()
            .map(|activity| store.create_activity_type(activity))
            .collect::<Result<Vec<_>>>()?;
        let planned = faker.month_entries(2024, Month::March, project_ids.len())?;
        for fake in &planned {
            let entry = fake
                .resolve(&project_ids, &activity_ids)
                .expect("faker indexes stay in range");
            store.create_entry(&entry)?;
        }
        planned.len()
    };

    let reopened = Store::open(&path)?;
    reopened.bootstrap()?;
    let loaded = reopened.list_entries_in_range(date(1)?, date(31)?)?;
    assert_eq!(loaded.len(), expected);
    assert_eq!(reopened.list_projects()?.len(), 3);
    Ok(())
}
