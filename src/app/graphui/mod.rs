//! egui front end: the application shell, the node canvas, and the manager
//! panels attached to specific node types.

pub mod app;
pub mod canvas;
pub mod confirm_dialog;
pub mod editor_dialog;
pub mod preview;
pub mod template_manager;
pub mod wildcard_manager;

pub use app::{GraphDashApp, ThemeChoice};
pub use canvas::NodeCanvas;
pub use confirm_dialog::ConfirmDialog;
pub use editor_dialog::EditorDialog;
pub use preview::PreviewPanel;
pub use template_manager::TemplateManager;
pub use wildcard_manager::{splice_wildcard, text_edit_id, WildcardPanel};
