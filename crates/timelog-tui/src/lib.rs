// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod calendar;
pub mod catalog;
pub mod day;
pub mod form;
pub mod report;

use anyhow::{Context, Result};
use calendar::{CalendarModal, CalendarScreen, WEEKDAY_HEADER};
use catalog::{ActivityTypesScreen, CatalogAction, CatalogRecord, CatalogScreen, ProjectsScreen};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use day::{DayAction, DayView, DeleteAction, DeleteConfirm, EntryAction, EntryForm};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use report::{ReportAction, ReportModal, ReportStage};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::Date;
use timelog_app::calendar::{MonthRange, local_today};
use timelog_app::clipboard::{Clipboard, YankOutcome};
use timelog_app::{
    ActivityType, ActivityTypeId, AppCommand, AppEvent, AppState, EntryId, HourEntry,
    NewActivityType, NewHourEntry, NewProject, Notification, NotificationKind, Project,
    ProjectId, Screen, format_hours,
};
use tracing::{debug, error, info};

pub use report::{ReportDefaults, ReportRequest};

/// Storage and export as seen by the UI. Every call is synchronous except
/// the `spawn_*` pair, which deliver their result through the internal
/// channel.
pub trait AppRuntime {
    fn list_projects(&mut self) -> Result<Vec<Project>>;
    fn create_project(&mut self, project: &NewProject) -> Result<ProjectId>;
    fn update_project(&mut self, id: ProjectId, project: &NewProject) -> Result<()>;
    fn delete_project(&mut self, id: ProjectId) -> Result<()>;
    fn list_activity_types(&mut self) -> Result<Vec<ActivityType>>;
    fn create_activity_type(&mut self, activity: &NewActivityType) -> Result<ActivityTypeId>;
    fn update_activity_type(&mut self, id: ActivityTypeId, activity: &NewActivityType)
    -> Result<()>;
    fn delete_activity_type(&mut self, id: ActivityTypeId) -> Result<()>;
    fn list_entries_for_date(&mut self, date: Date) -> Result<Vec<HourEntry>>;
    fn list_entries_in_range(&mut self, start: Date, end: Date) -> Result<Vec<HourEntry>>;
    fn create_entry(&mut self, entry: &NewHourEntry) -> Result<EntryId>;
    fn update_entry(&mut self, id: EntryId, entry: &NewHourEntry) -> Result<()>;
    fn delete_entry(&mut self, id: EntryId) -> Result<()>;
    fn delete_entries_for_date(&mut self, date: Date) -> Result<usize>;
    /// Swaps every entry on `date` for `entries`, all or nothing.
    fn replace_entries_for_date(
        &mut self,
        date: Date,
        entries: &[NewHourEntry],
    ) -> Result<Vec<EntryId>>;
    fn generate_report(&mut self, request: &ReportRequest) -> Result<PathBuf>;
    /// Empty when the picker was cancelled or unavailable.
    fn pick_signature_image(&mut self) -> PathBuf;

    fn spawn_report(&mut self, request: ReportRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self
            .generate_report(&request)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::ReportFinished { result })
            .map_err(|_| anyhow::anyhow!("report event channel closed"))?;
        Ok(())
    }

    fn spawn_image_picker(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let path = self.pick_signature_image();
        tx.send(InternalEvent::SignatureImageSelected(path))
            .map_err(|_| anyhow::anyhow!("image picker channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearNotification { token: u64 },
    ReportFinished { result: Result<PathBuf, String> },
    SignatureImageSelected(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiConfig {
    pub notification_timeout: Duration,
    pub report: ReportDefaults,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notification_timeout: Duration::from_secs(3),
            report: ReportDefaults::default(),
        }
    }
}

#[derive(Debug)]
struct ViewData {
    config: UiConfig,
    calendar: CalendarScreen,
    projects: ProjectsScreen,
    activity_types: ActivityTypesScreen,
    help_visible: bool,
}

impl ViewData {
    fn new(config: UiConfig, today: Date) -> Self {
        Self {
            config,
            calendar: CalendarScreen::new(today),
            projects: ProjectsScreen::default(),
            activity_types: ActivityTypesScreen::default(),
            help_visible: false,
        }
    }

    fn modal_open(&self, screen: Screen) -> bool {
        match screen {
            Screen::Calendar => self.calendar.modals.is_open(),
            Screen::Projects => self.projects.has_modal(),
            Screen::ActivityTypes => self.activity_types.has_modal(),
        }
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R, config: UiConfig) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let result = execute!(io::stdout(), terminal::EnterAlternateScreen)
        .context("enter alternate screen")
        .and_then(|()| Terminal::new(CrosstermBackend::new(io::stdout())).context("create terminal"))
        .and_then(|mut terminal| {
            let mut view_data = ViewData::new(config, local_today());
            event_loop(&mut terminal, state, runtime, &mut view_data, next_key)
        });

    // Restore the terminal on every exit path, loop errors included.
    let restored = disable_raw_mode().context("disable raw mode").and_then(|()| {
        execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")
    });
    result.and(restored)
}

/// Draws, waits for a key and dispatches it until a quit key or an error.
fn event_loop<B, R, K>(
    terminal: &mut Terminal<B>,
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    mut next: K,
) -> Result<()>
where
    B: Backend,
    R: AppRuntime,
    K: FnMut(Duration) -> Result<Option<KeyEvent>>,
{
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_view_data(runtime, view_data) {
        notify(
            state,
            view_data,
            &internal_tx,
            Notification::error(format!("load failed: {error}")),
        );
    }

    loop {
        process_internal_events(state, view_data, &internal_tx, &internal_rx);
        terminal
            .draw(|frame| render(frame, state, view_data))
            .context("draw frame")?;

        if let Some(key) = next(Duration::from_millis(120))?
            && handle_key_event(state, runtime, view_data, &internal_tx, key)
        {
            return Ok(());
        }
    }
}

/// Waits up to `timeout` for a key press; other terminal events are dropped.
fn next_key(timeout: Duration) -> Result<Option<KeyEvent>> {
    if !event::poll(timeout).context("poll event")? {
        return Ok(None);
    }
    match event::read().context("read event")? {
        Event::Key(key) => Ok(Some(key)),
        _ => Ok(None),
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearNotification { token } => {
                state.dispatch(AppCommand::ClearNotification { token });
            }
            InternalEvent::ReportFinished { result } => {
                handle_report_finished(state, view_data, tx, result);
            }
            InternalEvent::SignatureImageSelected(path) => {
                if let Some(report) = view_data.calendar.modals.report_mut() {
                    report.set_signature(path);
                }
            }
        }
    }
}

fn handle_report_finished(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    result: Result<PathBuf, String>,
) {
    match result {
        Ok(path) => {
            if view_data
                .calendar
                .modals
                .report_mut()
                .is_some_and(|report| report.is_generating())
            {
                view_data.calendar.modals.close();
            }
            info!(path = %path.display(), "report saved");
            notify(
                state,
                view_data,
                tx,
                Notification::success(format!("Report saved to {}", path.display())),
            );
        }
        Err(message) => {
            if let Some(report) = view_data.calendar.modals.report_mut() {
                report.fail(message.clone());
            }
            notify(
                state,
                view_data,
                tx,
                Notification::error(format!("Failed to generate report: {message}")),
            );
        }
    }
}

fn schedule_notification_clear(internal_tx: &Sender<InternalEvent>, token: u64, after: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(after);
        let _ = sender.send(InternalEvent::ClearNotification { token });
    });
}

fn notify(
    state: &mut AppState,
    view_data: &ViewData,
    internal_tx: &Sender<InternalEvent>,
    notification: Notification,
) {
    if notification.kind == NotificationKind::Error {
        error!(message = %notification.message, "operation failed");
    }
    for event in state.dispatch(AppCommand::Notify(notification)) {
        if let AppEvent::NotificationShown { token, .. } = event {
            schedule_notification_clear(internal_tx, token, view_data.config.notification_timeout);
        }
    }
}

fn refresh_view_data<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) -> Result<()> {
    load_catalog(runtime, view_data)?;
    load_grid(runtime, view_data)
}

fn load_catalog<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) -> Result<()> {
    let projects = runtime.list_projects().context("load projects")?;
    let activity_types = runtime
        .list_activity_types()
        .context("load activity types")?;
    view_data
        .calendar
        .set_catalog(projects.clone(), activity_types.clone());
    view_data.projects.set_rows(projects);
    view_data.activity_types.set_rows(activity_types);
    Ok(())
}

/// Loads every entry shown in the 42-day grid, spillover days included.
fn load_grid<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) -> Result<()> {
    let grid = view_data.calendar.grid()?;
    let entries = runtime
        .list_entries_in_range(grid.first(), grid.last())
        .context("load workhours")?;
    view_data.calendar.set_grid_entries(entries);
    Ok(())
}

fn reload_grid<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    if let Err(error) = load_grid(runtime, view_data) {
        notify(state, view_data, tx, Notification::error(format!("{error:#}")));
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.modal_open(state.screen) {
        // Quit keys never reach an open layer, and never quit through it.
        if ctrl_c {
            return false;
        }
        match state.screen {
            Screen::Calendar => handle_calendar_modal_key(state, runtime, view_data, internal_tx, key),
            Screen::Projects => {
                if let Some(action) = view_data.projects.handle_key(key) {
                    apply_project_action(state, runtime, view_data, internal_tx, action);
                }
            }
            Screen::ActivityTypes => {
                if let Some(action) = view_data.activity_types.handle_key(key) {
                    apply_activity_action(state, runtime, view_data, internal_tx, action);
                }
            }
        }
        return false;
    }

    if ctrl_c {
        return true;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('?') => {
            view_data.help_visible = true;
            return false;
        }
        KeyCode::Tab => {
            switch_screen(state, runtime, view_data, internal_tx, AppCommand::NextScreen);
            return false;
        }
        KeyCode::BackTab => {
            switch_screen(state, runtime, view_data, internal_tx, AppCommand::PrevScreen);
            return false;
        }
        KeyCode::Char(ch) => {
            if let Some(screen) = Screen::ALL.into_iter().find(|screen| screen.hotkey() == ch) {
                switch_screen(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    AppCommand::SwitchScreen(screen),
                );
                return false;
            }
        }
        _ => {}
    }

    match state.screen {
        Screen::Calendar => handle_calendar_key(state, runtime, view_data, internal_tx, key),
        Screen::Projects => {
            view_data.projects.handle_key(key);
        }
        Screen::ActivityTypes => {
            view_data.activity_types.handle_key(key);
        }
    }
    false
}

fn switch_screen<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    for event in state.dispatch(command) {
        let AppEvent::ScreenChanged(screen) = event else {
            continue;
        };
        debug!(screen = screen.label(), "switched screen");
        if screen == Screen::Calendar {
            view_data.calendar.reset_to_today();
        }
        if let Err(error) = refresh_view_data(runtime, view_data) {
            notify(state, view_data, tx, Notification::error(format!("{error:#}")));
        }
    }
}

fn handle_calendar_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let cursor = &mut view_data.calendar.cursor;
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => {
            cursor.step_days(-1);
        }
        KeyCode::Right | KeyCode::Char('l') => {
            cursor.step_days(1);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            cursor.step_days(-7);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            cursor.step_days(7);
        }
        KeyCode::Char('<') => {
            if cursor.page_months(-1) {
                reload_grid(state, runtime, view_data, tx);
            }
        }
        KeyCode::Char('>') => {
            if cursor.page_months(1) {
                reload_grid(state, runtime, view_data, tx);
            }
        }
        KeyCode::Char('r') => {
            view_data.calendar.reset_to_today();
            reload_grid(state, runtime, view_data, tx);
        }
        KeyCode::Char('y') => yank_selected(state, runtime, view_data, tx),
        KeyCode::Char('p') => paste_selected(state, runtime, view_data, tx),
        KeyCode::Char('d') | KeyCode::Char('x') => delete_selected_day(state, runtime, view_data, tx),
        KeyCode::Char('g') => open_report(state, runtime, view_data, tx),
        KeyCode::Enter => open_day_view(state, runtime, view_data, tx),
        _ => {}
    }
}

fn yank_selected<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let date = view_data.calendar.selected();
    let entries = match runtime.list_entries_for_date(date) {
        Ok(entries) => entries,
        Err(error) => {
            notify(
                state,
                view_data,
                tx,
                Notification::error(format!("Failed to load workhours: {error}")),
            );
            return;
        }
    };
    let notification = match view_data.calendar.clipboard.yank(date, &entries) {
        YankOutcome::NothingToCopy { date } => Notification::info(format!("Nothing to copy on {date}")),
        YankOutcome::Copied { count, date } => {
            Notification::success(format!("Copied {count} workhour(s) from {date}"))
        }
    };
    notify(state, view_data, tx, notification);
}

fn paste_selected<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let date = view_data.calendar.selected();
    let Some(entries) = view_data.calendar.clipboard.paste_onto(date) else {
        return;
    };
    let notification = match runtime.replace_entries_for_date(date, &entries) {
        Ok(ids) => Notification::success(format!("Pasted {} workhour(s) to {date}", ids.len())),
        Err(error) => Notification::error(format!("Failed to paste workhours: {error}")),
    };
    notify(state, view_data, tx, notification);
    reload_grid(state, runtime, view_data, tx);
}

fn delete_selected_day<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let date = view_data.calendar.selected();
    let notification = match runtime.delete_entries_for_date(date) {
        Ok(0) => Notification::info(format!("Nothing to delete on {date}")),
        Ok(count) => {
            view_data.calendar.clipboard.invalidate_source(date);
            Notification::success(format!("Deleted {count} workhour(s) on {date}"))
        }
        Err(error) => Notification::error(format!("Failed to delete workhours: {error}")),
    };
    notify(state, view_data, tx, notification);
    reload_grid(state, runtime, view_data, tx);
}

fn open_day_view<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let date = view_data.calendar.selected();
    let loaded = load_catalog(runtime, view_data)
        .and_then(|()| runtime.list_entries_for_date(date));
    match loaded {
        Ok(entries) => view_data
            .calendar
            .modals
            .open(CalendarModal::Day(DayView::new(date, entries))),
        Err(error) => notify(
            state,
            view_data,
            tx,
            Notification::error(format!("Failed to load workhours: {error:#}")),
        ),
    }
}

fn open_report<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let cursor = view_data.calendar.cursor;
    let loaded = load_catalog(runtime, view_data).and_then(|()| {
        let range = MonthRange::new(cursor.view_year, cursor.view_month)?;
        runtime.list_entries_in_range(range.first, range.last)
    });
    match loaded {
        Ok(entries) => {
            let modal = ReportModal::new(
                cursor.view_year,
                cursor.view_month,
                &entries,
                view_data.calendar.catalog(),
                view_data.config.report.clone(),
            );
            view_data
                .calendar
                .modals
                .open(CalendarModal::Report(modal));
        }
        Err(error) => notify(
            state,
            view_data,
            tx,
            Notification::error(format!("Failed to load month: {error:#}")),
        ),
    }
}

enum ModalOutcome {
    Day(DayAction),
    Entry(EntryAction),
    Delete(DeleteAction),
    Report(ReportAction),
}

fn handle_calendar_modal_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let outcome = match view_data.calendar.modals.active_mut() {
        Some(CalendarModal::Day(view)) => view.handle_key(key).map(ModalOutcome::Day),
        Some(CalendarModal::Entry(form)) => form.handle_key(key).map(ModalOutcome::Entry),
        Some(CalendarModal::Delete(confirm)) => confirm.handle_key(key).map(ModalOutcome::Delete),
        Some(CalendarModal::Report(report)) => report.handle_key(key).map(ModalOutcome::Report),
        None => None,
    };
    match outcome {
        Some(ModalOutcome::Day(action)) => apply_day_action(state, runtime, view_data, tx, action),
        Some(ModalOutcome::Entry(action)) => {
            apply_entry_action(state, runtime, view_data, tx, action);
        }
        Some(ModalOutcome::Delete(action)) => {
            apply_delete_action(state, runtime, view_data, tx, action);
        }
        Some(ModalOutcome::Report(action)) => {
            apply_report_action(state, runtime, view_data, tx, action);
        }
        None => {}
    }
}

fn apply_day_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    action: DayAction,
) {
    let date = match view_data.calendar.modals.active() {
        Some(CalendarModal::Day(view)) => view.date(),
        _ => view_data.calendar.selected(),
    };
    if !matches!(action, DayAction::Close)
        && let Err(error) = load_catalog(runtime, view_data)
    {
        notify(state, view_data, tx, Notification::error(format!("{error:#}")));
        return;
    }

    let calendar = &mut view_data.calendar;
    match action {
        DayAction::Close => calendar.modals.close(),
        DayAction::Create => {
            let form = EntryForm::create(date, calendar.activity_types(), calendar.projects());
            calendar.modals.push_crud(CalendarModal::Entry(form));
        }
        DayAction::Edit(entry) => {
            let form = EntryForm::edit(&entry, calendar.activity_types(), calendar.projects());
            calendar.modals.push_crud(CalendarModal::Entry(form));
        }
        DayAction::Delete(entry) => {
            let confirm = DeleteConfirm::new(entry, calendar.catalog());
            calendar.modals.push_crud(CalendarModal::Delete(confirm));
        }
    }
}

fn apply_entry_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    action: EntryAction,
) {
    let result = match action {
        EntryAction::Cancel => {
            view_data.calendar.modals.close_crud(None);
            return;
        }
        EntryAction::Create(entry) => runtime
            .create_entry(&entry)
            .map(|_| ())
            .map_err(|error| format!("Failed to create workhour: {error}")),
        EntryAction::Update { id, entry } => runtime
            .update_entry(id, &entry)
            .map_err(|error| format!("Failed to update workhour: {error}")),
    };
    finish_crud(state, runtime, view_data, tx, result);
}

fn apply_delete_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    action: DeleteAction,
) {
    match action {
        DeleteAction::Cancel => {
            view_data.calendar.modals.close_crud(None);
        }
        DeleteAction::Confirm(id) => {
            let result = runtime
                .delete_entry(id)
                .map_err(|error| format!("Failed to delete workhour: {error}"));
            finish_crud(state, runtime, view_data, tx, result);
        }
    }
}

/// After a CRUD write, restores the parked day view with fresh entries. A
/// failed write restores it untouched.
fn finish_crud<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    result: Result<(), String>,
) {
    if let Err(message) = result {
        view_data.calendar.modals.close_crud(None);
        notify(state, view_data, tx, Notification::error(message));
        return;
    }

    let parent_date = view_data.calendar.modals.saved_parent().map(DayView::date);
    let refreshed = match parent_date.map(|date| runtime.list_entries_for_date(date)) {
        Some(Ok(entries)) => Some(entries),
        Some(Err(error)) => {
            notify(
                state,
                view_data,
                tx,
                Notification::error(format!("Failed to load workhours: {error}")),
            );
            None
        }
        None => None,
    };
    if let (Some(date), Some(entries)) = (parent_date, &refreshed)
        && entries.is_empty()
    {
        view_data.calendar.clipboard.invalidate_source(date);
    }
    view_data.calendar.modals.close_crud(refreshed);
    reload_grid(state, runtime, view_data, tx);
}

fn apply_report_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    action: ReportAction,
) {
    match action {
        ReportAction::Close => view_data.calendar.modals.close(),
        ReportAction::PickImage => {
            if let Err(error) = runtime.spawn_image_picker(tx.clone()) {
                notify(
                    state,
                    view_data,
                    tx,
                    Notification::error(format!("Failed to open image picker: {error}")),
                );
            }
        }
        ReportAction::Generate(request) => {
            info!(kind = request.kind().label(), "generating report");
            if let Err(error) = runtime.spawn_report(request, tx.clone()) {
                let message = format!("{error:#}");
                if let Some(report) = view_data.calendar.modals.report_mut() {
                    report.fail(message.clone());
                }
                notify(
                    state,
                    view_data,
                    tx,
                    Notification::error(format!("Failed to generate report: {message}")),
                );
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum CatalogVerb {
    Create,
    Update,
    Delete,
}

impl CatalogVerb {
    const fn present(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    const fn past(self) -> &'static str {
        match self {
            Self::Create => "Created",
            Self::Update => "Updated",
            Self::Delete => "Deleted",
        }
    }
}

fn apply_project_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    action: CatalogAction<Project>,
) {
    let (verb, name, result) = match action {
        CatalogAction::Create(draft) => (
            CatalogVerb::Create,
            draft.name.clone(),
            runtime.create_project(&draft).map(|_| ()),
        ),
        CatalogAction::Update(id, draft) => (
            CatalogVerb::Update,
            draft.name.clone(),
            runtime.update_project(id, &draft),
        ),
        CatalogAction::Delete(project) => (
            CatalogVerb::Delete,
            project.name.clone(),
            runtime.delete_project(project.id),
        ),
    };
    finish_catalog_write::<Project, R>(state, runtime, view_data, tx, verb, &name, result);
}

fn apply_activity_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    action: CatalogAction<ActivityType>,
) {
    let (verb, name, result) = match action {
        CatalogAction::Create(draft) => (
            CatalogVerb::Create,
            draft.name.clone(),
            runtime.create_activity_type(&draft).map(|_| ()),
        ),
        CatalogAction::Update(id, draft) => (
            CatalogVerb::Update,
            draft.name.clone(),
            runtime.update_activity_type(id, &draft),
        ),
        CatalogAction::Delete(activity) => (
            CatalogVerb::Delete,
            activity.name.clone(),
            runtime.delete_activity_type(activity.id),
        ),
    };
    finish_catalog_write::<ActivityType, R>(state, runtime, view_data, tx, verb, &name, result);
}

fn finish_catalog_write<T: CatalogRecord, R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    verb: CatalogVerb,
    name: &str,
    result: Result<()>,
) {
    let notification = match result {
        Ok(()) => Notification::success(format!("{} {} {name}", verb.past(), T::NOUN)),
        Err(error) => {
            Notification::error(format!("Failed to {} {}: {error}", verb.present(), T::NOUN))
        }
    };
    notify(state, view_data, tx, notification);
    if let Err(error) = refresh_view_data(runtime, view_data) {
        notify(state, view_data, tx, Notification::error(format!("{error:#}")));
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = Screen::ALL
        .iter()
        .position(|screen| *screen == state.screen)
        .unwrap_or(0);
    let titles = Screen::ALL
        .iter()
        .map(|screen| format!("{} {}", screen.hotkey(), screen.label()))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(titles)
        .block(Block::default().title("timelog").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match state.screen {
        Screen::Calendar => render_calendar(frame, layout[1], &view_data.calendar),
        Screen::Projects => render_catalog(frame, layout[1], &view_data.projects),
        Screen::ActivityTypes => render_catalog(frame, layout[1], &view_data.activity_types),
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(status_style(state))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    match state.screen {
        Screen::Calendar => render_calendar_modals(frame, &view_data.calendar),
        Screen::Projects => render_catalog_modal(frame, &view_data.projects),
        Screen::ActivityTypes => render_catalog_modal(frame, &view_data.activity_types),
    }

    if view_data.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text(&view_data.calendar.clipboard))
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_calendar(frame: &mut ratatui::Frame<'_>, area: Rect, calendar: &CalendarScreen) {
    let block = Block::default()
        .title(calendar.title())
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let grid = match calendar.grid() {
        Ok(grid) => grid,
        Err(error) => {
            frame.render_widget(Paragraph::new(format!("{error:#}")), inner);
            return;
        }
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    let header_cells = columns(rows[0]);
    for (name, cell) in WEEKDAY_HEADER.iter().zip(header_cells.iter()) {
        let header = Paragraph::new(*name).style(Style::default().add_modifier(Modifier::BOLD));
        frame.render_widget(header, *cell);
    }

    let week_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 6); 6])
        .split(rows[1]);
    for (week, row) in grid.weeks().zip(week_rows.iter()) {
        for (date, cell) in week.iter().zip(columns(*row).iter()) {
            let mut style = Style::default();
            if !grid.is_view_month(*date) {
                style = style.fg(Color::DarkGray);
            }
            if *date == calendar.today() {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            if *date == calendar.selected() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let lines = calendar
                .cell_lines(*date)
                .into_iter()
                .map(Line::from)
                .collect::<Vec<_>>();
            let widget = Paragraph::new(Text::from(lines))
                .style(style)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(widget, *cell);
        }
    }
}

fn columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 7); 7])
        .split(area)
}

fn render_calendar_modals(frame: &mut ratatui::Frame<'_>, calendar: &CalendarScreen) {
    if let Some(parent) = calendar.modals.saved_parent() {
        render_popup(
            frame,
            centered_rect(60, 60, frame.area()),
            &parent.title(),
            parent.render(calendar.catalog()),
            Color::White,
        );
    }
    match calendar.modals.active() {
        Some(CalendarModal::Day(view)) => render_popup(
            frame,
            centered_rect(60, 60, frame.area()),
            &view.title(),
            view.render(calendar.catalog()),
            Color::White,
        ),
        Some(CalendarModal::Entry(form)) => render_popup(
            frame,
            centered_rect(50, 70, frame.area()),
            form.title(),
            form.render(),
            Color::Cyan,
        ),
        Some(CalendarModal::Delete(confirm)) => render_popup(
            frame,
            centered_rect(50, 35, frame.area()),
            confirm.title(),
            confirm.render(),
            Color::Red,
        ),
        Some(CalendarModal::Report(report)) => render_report(frame, report),
        None => {}
    }
}

fn render_report(frame: &mut ratatui::Frame<'_>, report: &ReportModal) {
    let area = centered_rect(80, 80, frame.area());
    if *report.stage() != ReportStage::MailForm {
        render_popup(frame, area, &report.title(), report.render(), Color::Cyan);
        return;
    }
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(report.title())
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);
    frame.render_widget(
        Paragraph::new(Text::from(report.render())).wrap(Wrap { trim: false }),
        halves[0],
    );
    frame.render_widget(
        Paragraph::new(Text::from(report.render_preview()))
            .block(Block::default().title("Preview").borders(Borders::LEFT)),
        halves[1],
    );
}

fn render_popup(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    lines: Vec<Line<'static>>,
    border: Color,
) {
    frame.render_widget(Clear, area);
    let popup = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(title.to_owned())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
    frame.render_widget(popup, area);
}

fn render_catalog<T: CatalogRecord>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    screen: &CatalogScreen<T>,
) {
    let widths = vec![Constraint::Min(8); T::HEADERS.len()];
    let header = Row::new(T::HEADERS.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = screen.rows().iter().enumerate().map(|(index, record)| {
        let style = if index == screen.cursor() {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(record.cells().into_iter().map(Cell::from)).style(style)
    });
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(T::TITLE).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_catalog_modal<T: CatalogRecord>(frame: &mut ratatui::Frame<'_>, screen: &CatalogScreen<T>) {
    if !screen.has_modal() {
        return;
    }
    render_popup(
        frame,
        centered_rect(50, 50, frame.area()),
        &screen.modal_title(),
        screen.render_modal(),
        Color::Cyan,
    );
}

fn status_style(state: &AppState) -> Style {
    match state.notification.as_ref().map(|notification| notification.kind) {
        Some(NotificationKind::Error) => Style::default().fg(Color::Red),
        Some(NotificationKind::Success) => Style::default().fg(Color::Green),
        Some(NotificationKind::Info) => Style::default().fg(Color::Cyan),
        None => Style::default().fg(Color::DarkGray),
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if let Some(notification) = &state.notification {
        return format!("{} {}", notification.kind.glyph(), notification.message);
    }
    match state.screen {
        Screen::Calendar => {
            let date = view_data.calendar.selected();
            format!(
                "{date} · {}h | hjkl move | < > month | enter day | y/p copy | g report | ? help",
                format_hours(view_data.calendar.total_on(date))
            )
        }
        Screen::Projects | Screen::ActivityTypes => {
            "j/k move | n new | enter edit | d delete | 1-3 screens | ? help".to_owned()
        }
    }
}

fn help_overlay_text(clipboard: &Clipboard) -> String {
    let mut text = "global: 1/2/3 or tab screens | ? help | q/esc quit | ctrl+c always quits\n\
calendar: h/j/k/l or arrows move | < > month | r today | enter day detail\n\
calendar: y yank day | p paste day | d/x delete day | g report\n\
day: j/k select | n add | e/enter edit | d delete | esc close\n\
form: tab/shift+tab field | j/k choose | space toggle | enter save | esc cancel\n\
report: o csv | m mail | s signature image | enter generate | esc back\n\
projects/activities: j/k move | n new | enter edit | d delete"
        .to_owned();
    if let Some(source) = clipboard.source() {
        text.push_str(&format!(
            "\n\n📋 {} workhour(s) copied from {source}",
            clipboard.len()
        ));
    }
    text
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
