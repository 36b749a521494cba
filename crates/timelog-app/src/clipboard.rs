// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;

use crate::{HourEntry, NewHourEntry};

/// Single-slot copy buffer holding every entry of one day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    entries: Vec<HourEntry>,
    source: Option<Date>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YankOutcome {
    NothingToCopy { date: Date },
    Copied { count: usize, date: Date },
}

impl Clipboard {
    /// Snapshots `entries` taken from `date`. A day with no entries leaves
    /// the clipboard untouched.
    pub fn yank(&mut self, date: Date, entries: &[HourEntry]) -> YankOutcome {
        if entries.is_empty() {
            return YankOutcome::NothingToCopy { date };
        }
        self.entries = entries.to_vec();
        self.source = Some(date);
        YankOutcome::Copied {
            count: entries.len(),
            date,
        }
    }

    /// Entries to recreate on `target`, or `None` when nothing was yanked.
    /// The clipboard keeps its contents so the same day can be pasted again.
    pub fn paste_onto(&self, target: Date) -> Option<Vec<NewHourEntry>> {
        if self.entries.is_empty() {
            return None;
        }
        Some(
            self.entries
                .iter()
                .map(|entry| entry.to_new(target))
                .collect(),
        )
    }

    /// Drops the snapshot when the day it was copied from is wiped.
    pub fn invalidate_source(&mut self, date: Date) -> bool {
        if self.source != Some(date) {
            return false;
        }
        self.clear();
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.source = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> Option<Date> {
        self.source
    }
}
