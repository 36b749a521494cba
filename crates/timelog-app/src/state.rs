// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Notification, Screen};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub screen: Screen,
    pub notification: Option<Notification>,
    pub notification_token: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::Calendar,
            notification: None,
            notification_token: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SwitchScreen(Screen),
    NextScreen,
    PrevScreen,
    Notify(Notification),
    ClearNotification { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ScreenChanged(Screen),
    NotificationShown { token: u64, notification: Notification },
    NotificationCleared,
}

impl AppState {
    pub fn with_screen(screen: Screen) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SwitchScreen(screen) => {
                self.screen = screen;
                vec![AppEvent::ScreenChanged(screen)]
            }
            AppCommand::NextScreen => self.rotate_screen(1),
            AppCommand::PrevScreen => self.rotate_screen(-1),
            AppCommand::Notify(notification) => {
                self.notification_token = self.notification_token.wrapping_add(1);
                self.notification = Some(notification.clone());
                vec![AppEvent::NotificationShown {
                    token: self.notification_token,
                    notification,
                }]
            }
            AppCommand::ClearNotification { token } => {
                // A newer notification owns the slot.
                if token != self.notification_token || self.notification.is_none() {
                    return Vec::new();
                }
                self.notification = None;
                vec![AppEvent::NotificationCleared]
            }
        }
    }

    fn rotate_screen(&mut self, delta: isize) -> Vec<AppEvent> {
        let screens = Screen::ALL;
        let current = screens
            .iter()
            .position(|screen| *screen == self.screen)
            .unwrap_or(0) as isize;
        let len = screens.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.screen = screens[next];
        vec![AppEvent::ScreenChanged(self.screen)]
    }
}
