// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use time::{Date, Month, Weekday};
use timelog_app::calendar::MonthRange;
use timelog_app::{ActivityTypeId, NewActivityType, NewHourEntry, NewProject, ProjectId};

const PROJECT_CLIENTS: [&str; 12] = [
    "Acme",
    "Globex",
    "Initech",
    "Umbrella",
    "Hooli",
    "Vandelay",
    "Stark",
    "Wayne",
    "Tyrell",
    "Cyberdyne",
    "Soylent",
    "Wonka",
];

const PROJECT_KINDS: [&str; 8] = [
    "Portal",
    "Billing",
    "Migration",
    "Mobile App",
    "Data Platform",
    "Support",
    "Website",
    "Integration",
];

/// Fixed activity catalog: (name, short name, is work).
const ACTIVITY_TYPES: [(&str, &str, bool); 5] = [
    ("Development", "🔧", true),
    ("Meeting", "👥", true),
    ("Code Review", "🔍", true),
    ("Leave", "🏖️", false),
    ("National Holiday", "🎉", false),
];

const DEVELOPMENT: usize = 0;
const MEETING: usize = 1;
const CODE_REVIEW: usize = 2;
const LEAVE: usize = 3;
const HOLIDAY: usize = 4;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// One generated entry, referencing projects and activity types by their
/// position in the lists the faker handed out.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeEntry {
    pub date: Date,
    pub project: usize,
    pub activity: usize,
    pub hours: f64,
}

impl FakeEntry {
    pub fn resolve(
        &self,
        project_ids: &[ProjectId],
        activity_ids: &[ActivityTypeId],
    ) -> Option<NewHourEntry> {
        Some(NewHourEntry {
            date: self.date,
            project_id: *project_ids.get(self.project)?,
            activity_type_id: *activity_ids.get(self.activity)?,
            hours: self.hours,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WorkFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl WorkFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// `count` projects with distinct names and Odoo ids.
    pub fn projects(&mut self, count: usize) -> Vec<NewProject> {
        let start = self.rng.int_n(PROJECT_CLIENTS.len());
        (0..count)
            .map(|offset| {
                let client = PROJECT_CLIENTS[(start + offset) % PROJECT_CLIENTS.len()];
                let kind = self.pick(&PROJECT_KINDS);
                NewProject {
                    name: format!("{client} {kind}"),
                    odoo_id: 100 + (offset as i64) * 7 + self.rng.int_n(7) as i64,
                }
            })
            .collect()
    }

    pub fn activity_types(&self) -> Vec<NewActivityType> {
        ACTIVITY_TYPES
            .iter()
            .map(|(name, short_name, is_work)| NewActivityType {
                name: (*name).to_owned(),
                short_name: (*short_name).to_owned(),
                is_work: *is_work,
            })
            .collect()
    }

    /// A plausible month: weekdays only, eight hours each, with the
    /// occasional leave day and a holiday on the first Monday.
    pub fn month_entries(
        &mut self,
        year: i32,
        month: Month,
        project_count: usize,
    ) -> Result<Vec<FakeEntry>> {
        let range = MonthRange::new(year, month)?;
        let mut entries = Vec::new();
        let mut holiday_taken = false;
        let mut date = range.first;

        while date <= range.last {
            if !matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday) {
                entries.extend(self.day_entries(date, project_count, &mut holiday_taken));
            }
            date = date
                .next_day()
                .with_context(|| format!("step past {date}"))?;
        }
        Ok(entries)
    }

    fn day_entries(
        &mut self,
        date: Date,
        project_count: usize,
        holiday_taken: &mut bool,
    ) -> Vec<FakeEntry> {
        let project = self.rng.int_n(project_count.max(1));
        let entry = |activity: usize, hours: f64| FakeEntry {
            date,
            project,
            activity,
            hours,
        };

        if !*holiday_taken && date.weekday() == Weekday::Monday {
            *holiday_taken = true;
            return vec![entry(HOLIDAY, 8.0)];
        }

        match self.rng.int_n(12) {
            0 => vec![entry(LEAVE, 8.0)],
            1..=4 => vec![entry(DEVELOPMENT, 6.0), entry(MEETING, 2.0)],
            5 | 6 => vec![
                entry(DEVELOPMENT, 5.5),
                entry(CODE_REVIEW, 1.5),
                entry(MEETING, 1.0),
            ],
            _ => vec![entry(DEVELOPMENT, 8.0)],
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("timelog.db");
    Ok((dir, db_path))
}

pub fn activity_type_names() -> Vec<&'static str> {
    ACTIVITY_TYPES.iter().map(|(name, _, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::{FakeEntry, WorkFaker, activity_type_names};
    use anyhow::Result;
    use std::collections::{BTreeMap, BTreeSet};
    use time::{Date, Month, Weekday};
    use timelog_app::{ActivityTypeId, ProjectId};

    #[test]
    fn new_deterministic_seed() -> Result<()> {
        let mut left = WorkFaker::new(42);
        let mut right = WorkFaker::new(42);

        assert_eq!(left.projects(3), right.projects(3));
        assert_eq!(
            left.month_entries(2024, Month::March, 3)?,
            right.month_entries(2024, Month::March, 3)?
        );
        Ok(())
    }

    #[test]
    fn projects_have_distinct_names_and_ids() {
        let mut faker = WorkFaker::new(7);
        let projects = faker.projects(6);

        let names: BTreeSet<_> = projects.iter().map(|p| p.name.clone()).collect();
        let ids: BTreeSet<_> = projects.iter().map(|p| p.odoo_id).collect();
        assert_eq!(names.len(), 6);
        assert_eq!(ids.len(), 6);
        assert!(projects.iter().all(|p| p.odoo_id > 0));
    }

    #[test]
    fn month_entries_cover_weekdays_with_eight_hours() -> Result<()> {
        let mut faker = WorkFaker::new(3);
        let entries = faker.month_entries(2024, Month::March, 2)?;

        let mut per_day: BTreeMap<Date, f64> = BTreeMap::new();
        for entry in &entries {
            assert!(entry.project < 2);
            assert!(entry.activity < activity_type_names().len());
            *per_day.entry(entry.date).or_default() += entry.hours;
        }
        // March 2024 has 21 weekdays.
        assert_eq!(per_day.len(), 21);
        assert!(per_day.keys().all(|date| !matches!(
            date.weekday(),
            Weekday::Saturday | Weekday::Sunday
        )));
        assert!(per_day.values().all(|hours| *hours == 8.0));
        Ok(())
    }

    #[test]
    fn resolve_maps_indexes_to_ids() -> Result<()> {
        let entry = FakeEntry {
            date: Date::from_calendar_date(2024, Month::March, 4)?,
            project: 1,
            activity: 0,
            hours: 8.0,
        };
        let projects = [ProjectId::new(10), ProjectId::new(11)];
        let activities = [ActivityTypeId::new(20)];

        let resolved = entry.resolve(&projects, &activities);
        assert_eq!(resolved.map(|new| new.project_id), Some(ProjectId::new(11)));
        assert!(entry.resolve(&projects[..1], &activities).is_none());
        Ok(())
    }
}
