use eframe::egui::{self, Window};

/// Yes/no confirmation gate for destructive actions. The pending action is
/// stored as a one-shot closure and dropped unless the user confirms.
#[derive(Default)]
pub struct ConfirmDialog {
    pub show: bool,
    title: String,
    message: String,
    confirm_label: String,
    on_confirm: Option<Box<dyn FnOnce()>>,
}

impl ConfirmDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        confirm_label: impl Into<String>,
        on_confirm: impl FnOnce() + 'static,
    ) {
        self.title = title.into();
        self.message = message.into();
        self.confirm_label = confirm_label.into();
        self.on_confirm = Some(Box::new(on_confirm));
        self.show = true;
    }

    /// Run the pending action, same path the confirm button takes.
    pub fn confirm(&mut self) {
        if let Some(on_confirm) = self.on_confirm.take() {
            on_confirm();
        }
        self.show = false;
    }

    /// Drop the pending action without running it.
    pub fn decline(&mut self) {
        self.on_confirm = None;
        self.show = false;
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        if !self.show {
            return;
        }

        let mut confirmed = false;
        let mut declined = false;
        let mut show_window = self.show;

        Window::new(&self.title)
            .open(&mut show_window)
            .collapsible(false)
            .resizable(false)
            .default_pos(ctx.screen_rect().center())
            .show(ctx, |ui| {
                ui.label(&self.message);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        declined = true;
                    }
                    if ui.button(&self.confirm_label).clicked() {
                        confirmed = true;
                    }
                });
            });

        self.show = show_window;

        if confirmed {
            self.confirm();
        } else if declined || !self.show {
            // Closing the window counts as declining.
            self.decline();
        }
    }
}
