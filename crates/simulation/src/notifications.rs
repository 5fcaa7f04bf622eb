//! Player-facing notifications.
//!
//! Systems emit [`NotificationEvent`]s; [`NotificationLog`] keeps the most
//! recent ones for the HUD message line.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NotificationPriority {
    Warning,
    Info,
}

#[derive(Event, Debug, Clone)]
pub struct NotificationEvent {
    pub text: String,
    pub priority: NotificationPriority,
    /// Player slot the message is addressed to; `None` for everyone.
    pub player: Option<usize>,
}

impl NotificationEvent {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: NotificationPriority::Warning,
            player: None,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: NotificationPriority::Info,
            player: None,
        }
    }
}

#[derive(Resource)]
pub struct NotificationLog {
    pub entries: Vec<NotificationEvent>,
    pub max_entries: usize,
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 64,
        }
    }
}

impl NotificationLog {
    pub fn push(&mut self, event: &NotificationEvent) {
        self.entries.push(event.clone());
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(0..excess);
        }
    }
}

fn collect_notifications(
    mut events: EventReader<NotificationEvent>,
    mut log: ResMut<NotificationLog>,
) {
    for event in events.read() {
        log.push(event);
    }
}

pub struct NotificationsPlugin;

impl Plugin for NotificationsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NotificationLog>()
            .add_event::<NotificationEvent>()
            .add_systems(Update, collect_notifications);
    }
}
