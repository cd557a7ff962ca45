use egui::Color32;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NotificationType {
    Error,
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub notification_type: NotificationType,
    pub message: String,
    #[serde(skip, default = "Instant::now")]
    pub created_at: Instant,
    #[serde(skip, default)]
    pub expires_at: Option<Instant>,
    pub dismissible: bool,
    pub source: String, // e.g. "templates", "wildcards"
}

impl Notification {
    pub fn new_error(id: String, title: String, message: String, source: String) -> Self {
        Self {
            id,
            title,
            notification_type: NotificationType::Error,
            message,
            created_at: Instant::now(),
            expires_at: None, // Errors don't auto-expire
            dismissible: true,
            source,
        }
    }

    pub fn new_warning(id: String, title: String, message: String, source: String) -> Self {
        Self {
            id,
            title,
            notification_type: NotificationType::Warning,
            message,
            created_at: Instant::now(),
            expires_at: Some(Instant::now() + Duration::from_secs(30)),
            dismissible: true,
            source,
        }
    }

    pub fn new_info(id: String, title: String, message: String, source: String) -> Self {
        Self {
            id,
            title,
            notification_type: NotificationType::Info,
            message,
            created_at: Instant::now(),
            expires_at: Some(Instant::now() + Duration::from_secs(10)),
            dismissible: true,
            source,
        }
    }

    pub fn new_success(id: String, title: String, message: String, source: String) -> Self {
        Self {
            id,
            title,
            notification_type: NotificationType::Success,
            message,
            created_at: Instant::now(),
            expires_at: Some(Instant::now() + Duration::from_secs(5)),
            dismissible: true,
            source,
        }
    }

    pub fn is_expired(&self) -> bool {
        if let Some(expires_at) = self.expires_at {
            Instant::now() > expires_at
        } else {
            false
        }
    }

    pub fn get_color(&self) -> Color32 {
        match self.notification_type {
            NotificationType::Error => Color32::from_rgb(220, 50, 50),
            NotificationType::Warning => Color32::from_rgb(255, 150, 0),
            NotificationType::Info => Color32::from_rgb(70, 130, 200),
            NotificationType::Success => Color32::from_rgb(40, 180, 40),
        }
    }

    pub fn get_icon(&self) -> &'static str {
        match self.notification_type {
            NotificationType::Error => "✗",
            NotificationType::Warning => "⚠",
            NotificationType::Info => "ℹ",
            NotificationType::Success => "✓",
        }
    }
}

#[derive(Default)]
pub struct NotificationManager {
    notifications: HashMap<String, Notification>,
    pub show_list_window: bool,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a notification. Reusing an id replaces the previous
    /// notification, so repeated failures of the same operation don't stack.
    pub fn add_notification(&mut self, notification: Notification) {
        self.notifications
            .insert(notification.id.clone(), notification);
    }

    pub fn dismiss_notification(&mut self, id: &str) {
        self.notifications.remove(id);
    }

    pub fn clear_expired(&mut self) {
        self.notifications
            .retain(|_, notification| !notification.is_expired());
    }

    /// Active notifications, most recent first.
    pub fn get_active_notifications(&self) -> Vec<&Notification> {
        let mut notifications: Vec<&Notification> = self.notifications.values().collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications
    }

    pub fn get_notification(&self, id: &str) -> Option<&Notification> {
        self.notifications.get(id)
    }

    pub fn has_errors(&self) -> bool {
        self.notifications
            .values()
            .any(|n| n.notification_type == NotificationType::Error)
    }

    pub fn get_error_count(&self) -> usize {
        self.notifications
            .values()
            .filter(|n| n.notification_type == NotificationType::Error)
            .count()
    }

    pub fn get_warning_count(&self) -> usize {
        self.notifications
            .values()
            .filter(|n| n.notification_type == NotificationType::Warning)
            .count()
    }

    /// Compact indicator for the bottom status bar: error and warning counts
    /// plus the most recent transient message.
    pub fn render_status_bar_indicator(&mut self, ui: &mut egui::Ui) {
        self.clear_expired();

        let error_count = self.get_error_count();
        let warning_count = self.get_warning_count();

        if error_count > 0 {
            let label = ui.colored_label(
                Color32::from_rgb(220, 50, 50),
                format!("✗ {}", error_count),
            );
            if label.on_hover_text("Click to show notifications").clicked() {
                self.show_list_window = !self.show_list_window;
            }
        }
        if warning_count > 0 {
            let label = ui.colored_label(
                Color32::from_rgb(255, 150, 0),
                format!("⚠ {}", warning_count),
            );
            if label.on_hover_text("Click to show notifications").clicked() {
                self.show_list_window = !self.show_list_window;
            }
        }

        // Latest transient message rides along inline.
        if let Some(latest) = self
            .get_active_notifications()
            .into_iter()
            .find(|n| {
                matches!(
                    n.notification_type,
                    NotificationType::Info | NotificationType::Success
                )
            })
        {
            ui.separator();
            ui.colored_label(
                latest.get_color(),
                format!("{} {}", latest.get_icon(), latest.message),
            );
        }
    }

    /// Window listing all active notifications with dismiss buttons.
    pub fn render_list_window(&mut self, ctx: &egui::Context) {
        if !self.show_list_window {
            return;
        }

        let mut open = self.show_list_window;
        let mut dismissed: Vec<String> = Vec::new();

        egui::Window::new("Notifications")
            .open(&mut open)
            .default_width(420.0)
            .resizable(true)
            .show(ctx, |ui| {
                let active = self.get_active_notifications();
                if active.is_empty() {
                    ui.label("No notifications");
                    return;
                }
                egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                    for notification in active {
                        ui.horizontal(|ui| {
                            ui.colored_label(notification.get_color(), notification.get_icon());
                            ui.vertical(|ui| {
                                ui.strong(&notification.title);
                                ui.label(&notification.message);
                                ui.small(&notification.source);
                            });
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Min),
                                |ui| {
                                    if notification.dismissible && ui.small_button("✕").clicked()
                                    {
                                        dismissed.push(notification.id.clone());
                                    }
                                },
                            );
                        });
                        ui.separator();
                    }
                });
            });

        for id in dismissed {
            self.dismiss_notification(&id);
        }
        self.show_list_window = open;
    }
}
