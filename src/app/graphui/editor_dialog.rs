use eframe::egui::{self, Color32, ScrollArea, TextEdit, Window};

/// Modal editor for one named text resource.
///
/// Opened either as a viewer (read-only, Close button) or as an editor whose
/// Save hands the final name and content to a stored callback. The callback
/// is cleared on every exit path, saved or not.
pub struct EditorDialog {
    pub show: bool,

    title: String,

    /// Resource name shown in the name row.
    pub name: String,

    /// Whether the name row is editable (new resources only).
    name_editable: bool,

    pub content: String,

    read_only: bool,

    /// Error shown above the editor, e.g. an empty name on save.
    error_message: Option<String>,

    on_save: Option<Box<dyn FnMut(String, String)>>,
}

impl Default for EditorDialog {
    fn default() -> Self {
        Self {
            show: false,
            title: String::new(),
            name: String::new(),
            name_editable: false,
            content: String::new(),
            read_only: false,
            error_message: None,
            on_save: None,
        }
    }
}

impl EditorDialog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open with editable content; `on_save` receives the trimmed name and
    /// the content when the user saves.
    pub fn open_editor(
        &mut self,
        title: String,
        name: String,
        content: String,
        name_editable: bool,
        on_save: impl FnMut(String, String) + 'static,
    ) {
        self.title = title;
        self.name = name;
        self.name_editable = name_editable;
        self.content = content;
        self.read_only = false;
        self.error_message = None;
        self.on_save = Some(Box::new(on_save));
        self.show = true;
    }

    /// Open as a read-only viewer.
    pub fn open_viewer(&mut self, title: String, name: String, content: String) {
        self.title = title;
        self.name = name;
        self.name_editable = false;
        self.content = content;
        self.read_only = true;
        self.error_message = None;
        self.on_save = None;
        self.show = true;
    }

    /// Programmatic save, same path the Save button takes. Returns false
    /// when validation keeps the dialog open.
    pub fn save(&mut self) -> bool {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            self.error_message = Some("Enter a name before saving.".to_string());
            return false;
        }
        if let Some(on_save) = &mut self.on_save {
            on_save(name, self.content.clone());
        }
        self.close();
        true
    }

    pub fn close(&mut self) {
        self.show = false;
        self.on_save = None;
        self.error_message = None;
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        if !self.show {
            return;
        }

        let screen_rect = ctx.screen_rect();
        let max_height = screen_rect.height() * 0.7;

        let mut close_window = false;
        let mut save_clicked = false;
        let mut show_window = self.show;

        Window::new(&self.title)
            .open(&mut show_window)
            .min_width(420.0)
            .min_height(300.0)
            .max_height(max_height)
            .resizable(true)
            .default_pos(screen_rect.center())
            .show(ctx, |ui| {
                if let Some(error) = &self.error_message {
                    ui.colored_label(Color32::from_rgb(220, 50, 50), error);
                    ui.separator();
                }

                ui.horizontal(|ui| {
                    ui.label("Name:");
                    if self.name_editable {
                        ui.text_edit_singleline(&mut self.name);
                    } else {
                        ui.strong(&self.name);
                    }
                });

                ui.separator();

                ScrollArea::vertical()
                    .max_height(max_height - 160.0)
                    .show(ui, |ui| {
                        ui.add(
                            TextEdit::multiline(&mut self.content)
                                .font(egui::TextStyle::Monospace)
                                .desired_width(f32::INFINITY)
                                .desired_rows(14)
                                .interactive(!self.read_only),
                        );
                    });

                ui.separator();

                ui.horizontal(|ui| {
                    if self.read_only {
                        if ui.button("Close").clicked() {
                            close_window = true;
                        }
                    } else {
                        if ui.button("Cancel").clicked() {
                            close_window = true;
                        }
                        if ui.button("Save").clicked() {
                            save_clicked = true;
                        }
                    }
                });
            });

        self.show = show_window;

        if save_clicked {
            // save() closes on success and leaves the dialog open with an
            // error message otherwise.
            self.save();
        } else if close_window || !self.show {
            self.close();
        }
    }
}
