// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use time::Date;

use crate::{ActivityType, ActivityTypeId, HourEntry, Project, ProjectId};

/// Id-indexed view of the project and activity-type catalogs.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    projects: HashMap<ProjectId, Project>,
    activity_types: HashMap<ActivityTypeId, ActivityType>,
}

impl Catalog {
    pub fn new(projects: &[Project], activity_types: &[ActivityType]) -> Self {
        Self {
            projects: projects
                .iter()
                .map(|project| (project.id, project.clone()))
                .collect(),
            activity_types: activity_types
                .iter()
                .map(|activity| (activity.id, activity.clone()))
                .collect(),
        }
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn activity_type(&self, id: ActivityTypeId) -> Option<&ActivityType> {
        self.activity_types.get(&id)
    }

    pub fn is_work(&self, id: ActivityTypeId) -> bool {
        self.activity_type(id)
            .is_some_and(|activity| activity.is_work)
    }

    fn activity_is_work_by_name(&self, name: &str) -> bool {
        self.activity_types
            .values()
            .any(|activity| activity.name == name && activity.is_work)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRow {
    pub project_name: String,
    pub activity_name: String,
    pub hours: f64,
}

/// Aggregates over one month of entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkhourStats {
    pub total_hours: f64,
    pub total_days: usize,
    pub average_per_day: f64,
    pub project_hours: BTreeMap<String, f64>,
    pub activity_hours: BTreeMap<String, f64>,
    pub project_activity_hours: BTreeMap<String, BTreeMap<String, f64>>,
    pub daily_breakdown: BTreeMap<Date, Vec<BreakdownRow>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySummary {
    pub name: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub name: String,
    pub hours: f64,
    pub activities: Vec<ActivitySummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistItem {
    pub project: String,
    pub activity: String,
    pub hours: f64,
}

impl WorkhourStats {
    /// Entries whose project or activity type is unknown still count towards
    /// totals but are left out of the per-name maps.
    pub fn compute(entries: &[HourEntry], catalog: &Catalog) -> Self {
        let mut stats = Self::default();

        for entry in entries {
            stats.total_hours += entry.hours;

            let project_name = catalog
                .project(entry.project_id)
                .map(|project| project.name.clone())
                .unwrap_or_default();
            let activity_name = catalog
                .activity_type(entry.activity_type_id)
                .map(|activity| activity.name.clone())
                .unwrap_or_default();

            if !project_name.is_empty() {
                *stats.project_hours.entry(project_name.clone()).or_default() += entry.hours;
            }
            if !activity_name.is_empty() {
                *stats
                    .activity_hours
                    .entry(activity_name.clone())
                    .or_default() += entry.hours;
            }
            if !project_name.is_empty() && !activity_name.is_empty() {
                *stats
                    .project_activity_hours
                    .entry(project_name.clone())
                    .or_default()
                    .entry(activity_name.clone())
                    .or_default() += entry.hours;
            }

            stats
                .daily_breakdown
                .entry(entry.date)
                .or_default()
                .push(BreakdownRow {
                    project_name,
                    activity_name,
                    hours: entry.hours,
                });
        }

        stats.total_days = stats.daily_breakdown.len();
        if stats.total_days > 0 {
            stats.average_per_day = stats.total_hours / stats.total_days as f64;
        }
        stats
    }

    /// Projects by descending hours, each with its activities by descending
    /// hours. Ties fall back to name order so the ranking is stable.
    pub fn ranked_projects(&self) -> Vec<ProjectSummary> {
        let mut projects: Vec<ProjectSummary> = self
            .project_activity_hours
            .iter()
            .map(|(name, activities)| {
                let mut activities: Vec<ActivitySummary> = activities
                    .iter()
                    .map(|(name, hours)| ActivitySummary {
                        name: name.clone(),
                        hours: *hours,
                    })
                    .collect();
                activities.sort_by(|a, b| by_hours_desc(a.hours, b.hours, &a.name, &b.name));
                ProjectSummary {
                    name: name.clone(),
                    hours: self.project_hours.get(name).copied().unwrap_or_default(),
                    activities,
                }
            })
            .collect();
        projects.sort_by(|a, b| by_hours_desc(a.hours, b.hours, &a.name, &b.name));
        projects
    }

    /// Flattened (project, activity) pairs in preview order; the index into
    /// this list is the checklist cursor.
    pub fn checklist(&self) -> Vec<ChecklistItem> {
        self.ranked_projects()
            .into_iter()
            .flat_map(|project| {
                let project_name = project.name;
                project
                    .activities
                    .into_iter()
                    .map(move |activity| ChecklistItem {
                        project: project_name.clone(),
                        activity: activity.name,
                        hours: activity.hours,
                    })
            })
            .collect()
    }
}

fn by_hours_desc(a_hours: f64, b_hours: f64, a_name: &str, b_name: &str) -> Ordering {
    b_hours
        .partial_cmp(&a_hours)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_name.cmp(b_name))
}

/// Which (project, activity) pairs go into the mail report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSelection {
    checked: BTreeMap<String, BTreeMap<String, bool>>,
}

impl ReportSelection {
    /// Every observed pair starts checked iff its activity type is work.
    pub fn from_stats(stats: &WorkhourStats, catalog: &Catalog) -> Self {
        let checked = stats
            .project_activity_hours
            .iter()
            .map(|(project, activities)| {
                let row = activities
                    .keys()
                    .map(|activity| (activity.clone(), catalog.activity_is_work_by_name(activity)))
                    .collect();
                (project.clone(), row)
            })
            .collect();
        Self { checked }
    }

    pub fn is_checked(&self, project: &str, activity: &str) -> bool {
        self.checked
            .get(project)
            .and_then(|row| row.get(activity))
            .copied()
            .unwrap_or(false)
    }

    /// Flips a known pair and returns its new value. Unknown pairs stay
    /// unselected.
    pub fn toggle(&mut self, project: &str, activity: &str) -> Option<bool> {
        let value = self.checked.get_mut(project)?.get_mut(activity)?;
        *value = !*value;
        Some(*value)
    }

    pub fn checked_count(&self) -> usize {
        self.checked
            .values()
            .flat_map(|row| row.values())
            .filter(|checked| **checked)
            .count()
    }

    /// Entries whose project and activity type are known and whose pair is
    /// checked.
    pub fn filter_entries(&self, entries: &[HourEntry], catalog: &Catalog) -> Vec<HourEntry> {
        entries
            .iter()
            .filter(|entry| {
                match (
                    catalog.project(entry.project_id),
                    catalog.activity_type(entry.activity_type_id),
                ) {
                    (Some(project), Some(activity)) => {
                        self.is_checked(&project.name, &activity.name)
                    }
                    _ => false,
                }
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, ReportSelection, WorkhourStats};
    use crate::{ActivityType, ActivityTypeId, EntryId, HourEntry, Project, ProjectId};
    use anyhow::Result;
    use time::{Date, Month};

    fn catalog() -> Catalog {
        let projects = vec![
            Project {
                id: ProjectId::new(1),
                name: "Internal".to_owned(),
                odoo_id: 1,
            },
            Project {
                id: ProjectId::new(2),
                name: "Acme".to_owned(),
                odoo_id: 42,
            },
        ];
        let activity_types = vec![
            ActivityType {
                id: ActivityTypeId::new(1),
                name: "Dev".to_owned(),
                short_name: "D".to_owned(),
                is_work: true,
            },
            ActivityType {
                id: ActivityTypeId::new(2),
                name: "Leave".to_owned(),
                short_name: "L".to_owned(),
                is_work: false,
            },
            ActivityType {
                id: ActivityTypeId::new(3),
                name: "Meeting".to_owned(),
                short_name: "M".to_owned(),
                is_work: true,
            },
        ];
        Catalog::new(&projects, &activity_types)
    }

    fn entry(id: i64, day: u8, activity: i64, project: i64, hours: f64) -> Result<HourEntry> {
        Ok(HourEntry {
            id: EntryId::new(id),
            date: Date::from_calendar_date(2024, Month::March, day)?,
            activity_type_id: ActivityTypeId::new(activity),
            project_id: ProjectId::new(project),
            hours,
        })
    }

    fn sample_entries() -> Result<Vec<HourEntry>> {
        Ok(vec![
            entry(1, 4, 1, 2, 6.0)?,
            entry(2, 4, 3, 2, 2.0)?,
            entry(3, 5, 1, 1, 3.0)?,
            entry(4, 6, 2, 1, 8.0)?,
            entry(5, 7, 1, 2, 8.0)?,
        ])
    }

    #[test]
    fn compute_aggregates_totals_and_days() -> Result<()> {
        let stats = WorkhourStats::compute(&sample_entries()?, &catalog());

        assert_eq!(stats.total_hours, 27.0);
        assert_eq!(stats.total_days, 4);
        assert_eq!(stats.average_per_day, 6.75);
        assert_eq!(stats.project_hours.get("Acme"), Some(&16.0));
        assert_eq!(stats.project_hours.get("Internal"), Some(&11.0));
        assert_eq!(stats.activity_hours.get("Dev"), Some(&17.0));
        let march_4 = Date::from_calendar_date(2024, Month::March, 4)?;
        assert_eq!(stats.daily_breakdown.get(&march_4).map(Vec::len), Some(2));
        Ok(())
    }

    #[test]
    fn unknown_references_only_count_in_totals() -> Result<()> {
        let stats = WorkhourStats::compute(&[entry(1, 4, 99, 2, 5.0)?], &catalog());

        assert_eq!(stats.total_hours, 5.0);
        assert_eq!(stats.project_hours.get("Acme"), Some(&5.0));
        assert!(stats.activity_hours.is_empty());
        assert!(stats.project_activity_hours.is_empty());
        Ok(())
    }

    #[test]
    fn checklist_orders_by_descending_hours() -> Result<()> {
        let stats = WorkhourStats::compute(&sample_entries()?, &catalog());

        let order: Vec<(String, String)> = stats
            .checklist()
            .into_iter()
            .map(|item| (item.project, item.activity))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Acme".to_owned(), "Dev".to_owned()),
                ("Acme".to_owned(), "Meeting".to_owned()),
                ("Internal".to_owned(), "Leave".to_owned()),
                ("Internal".to_owned(), "Dev".to_owned()),
            ]
        );
        Ok(())
    }

    #[test]
    fn selection_defaults_to_work_activities() -> Result<()> {
        let catalog = catalog();
        let stats = WorkhourStats::compute(&sample_entries()?, &catalog);
        let selection = ReportSelection::from_stats(&stats, &catalog);

        assert!(selection.is_checked("Acme", "Dev"));
        assert!(selection.is_checked("Internal", "Dev"));
        assert!(selection.is_checked("Acme", "Meeting"));
        assert!(!selection.is_checked("Internal", "Leave"));
        assert_eq!(selection.checked_count(), 3);
        Ok(())
    }

    #[test]
    fn filter_keeps_only_checked_pairs() -> Result<()> {
        let catalog = catalog();
        let entries = sample_entries()?;
        let stats = WorkhourStats::compute(&entries, &catalog);
        let mut selection = ReportSelection::from_stats(&stats, &catalog);

        assert_eq!(selection.toggle("Acme", "Meeting"), Some(false));
        assert_eq!(selection.toggle("Nowhere", "Dev"), None);

        let kept = selection.filter_entries(&entries, &catalog);
        let ids: Vec<i64> = kept.iter().map(|entry| entry.id.get()).collect();
        assert_eq!(ids, vec![1, 3, 5]);

        let filtered = WorkhourStats::compute(&kept, &catalog);
        assert_eq!(filtered.total_hours, 17.0);
        Ok(())
    }
}
