//! Wildcard file panel: browse server-side wildcard files, splice a
//! `__name__` token into the node's text at the caret, and view, edit,
//! create, or delete the files themselves.
//!
//! Fetches serve two callers, the read-only viewer and the editor, so each
//! request records which one asked; the answer is routed by that record.
//! Unlike templates, saving a wildcard performs no overwrite check. The
//! server quietly replaces the file.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

use eframe::egui;

use crate::app::execution::ExecutionMessage;
use crate::app::extensions::NodeExtension;
use crate::app::notifications::{Notification, NotificationManager};
use crate::app::resources::{canonical_wildcard_name, WildcardClient, WildcardEvent, CREATE_NEW};
use crate::app::server_api::ApiError;
use crate::app::workflow::{GraphNode, NodeId, WorkflowGraph, WILDCARD_NODE};

use super::confirm_dialog::ConfirmDialog;
use super::editor_dialog::EditorDialog;
use super::preview::PreviewPanel;

const SOURCE: &str = "wildcards";

/// Who asked for the file content currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchPurpose {
    View,
    Edit,
}

/// Stable id for the text widget of one wildcard node, shared between the
/// canvas render and the caret lookup here.
pub fn text_edit_id(node: NodeId) -> egui::Id {
    egui::Id::new(("wildcard_text", node))
}

/// Splice `__name__` into `text`, replacing the char range `start..end`.
/// Returns the new text and the caret position just after the token.
/// Indices are clamped to the text length, in chars.
pub fn splice_wildcard(text: &str, start: usize, end: usize, name: &str) -> (String, usize) {
    let chars: Vec<char> = text.chars().collect();
    let lo = start.min(end).min(chars.len());
    let hi = start.max(end).min(chars.len());
    let token = format!("__{}__", name);

    let mut out = String::with_capacity(text.len() + token.len());
    out.extend(&chars[..lo]);
    out.push_str(&token);
    out.extend(&chars[hi..]);
    (out, lo + token.chars().count())
}

pub struct WildcardPanel {
    client: WildcardClient,
    tx: Sender<WildcardEvent>,
    rx: Receiver<WildcardEvent>,
    preview: PreviewPanel,
    editor: EditorDialog,
    confirm: ConfirmDialog,
    /// Name to select once the post-save refresh lands.
    select_after_refresh: HashMap<NodeId, String>,
    /// Purpose of the in-flight fetch per node; a newer request wins.
    pending_fetch: HashMap<NodeId, FetchPurpose>,
}

impl WildcardPanel {
    pub fn new(client: WildcardClient) -> Self {
        let (tx, rx) = channel();
        Self {
            client,
            tx,
            rx,
            preview: PreviewPanel::new(),
            editor: EditorDialog::new(),
            confirm: ConfirmDialog::new(),
            select_after_refresh: HashMap::new(),
            pending_fetch: HashMap::new(),
        }
    }

    pub fn request_refresh(&self, node: NodeId) {
        self.client.list(node, &self.tx);
    }

    pub fn request_view(
        &mut self,
        graph: &WorkflowGraph,
        node: NodeId,
        notifications: &mut NotificationManager,
    ) {
        let Some(name) = self.selection(graph, node) else {
            notifications.add_notification(Notification::new_info(
                format!("wildcard-view-{}", node),
                "Wildcard View".to_string(),
                "Select a wildcard file to view its content.".to_string(),
                SOURCE.to_string(),
            ));
            return;
        };
        self.pending_fetch.insert(node, FetchPurpose::View);
        self.client.fetch(node, &name, &self.tx);
    }

    /// Edit the selected file, or open a blank editor when the placeholder
    /// is selected.
    pub fn request_edit(
        &mut self,
        graph: &WorkflowGraph,
        node: NodeId,
        _notifications: &mut NotificationManager,
    ) {
        match self.selection(graph, node) {
            Some(name) => {
                self.pending_fetch.insert(node, FetchPurpose::Edit);
                self.client.fetch(node, &name, &self.tx);
            }
            None => {
                let client = self.client.clone();
                let tx = self.tx.clone();
                // The server appends .txt on write, so a typed extension is
                // trimmed off before the request.
                self.editor.open_editor(
                    "New Wildcard".to_string(),
                    String::new(),
                    String::new(),
                    true,
                    move |name, content| {
                        client.save(node, &canonical_wildcard_name(&name), &content, &tx)
                    },
                );
            }
        }
    }

    pub fn request_delete(
        &mut self,
        graph: &WorkflowGraph,
        node: NodeId,
        notifications: &mut NotificationManager,
    ) {
        let Some(name) = self.selection(graph, node) else {
            notifications.add_notification(Notification::new_info(
                format!("wildcard-delete-{}", node),
                "Wildcard Delete".to_string(),
                "Select a wildcard file to delete.".to_string(),
                SOURCE.to_string(),
            ));
            return;
        };

        let client = self.client.clone();
        let tx = self.tx.clone();
        let message = format!("Delete \"{}.txt\"? This cannot be undone.", name);
        self.confirm.open("Delete Wildcard", message, "Delete", move || {
            client.delete(node, &name, &tx);
        });
    }

    /// Splice `__selection__` into the node's text at the caret recorded for
    /// its text widget, replacing any selection. Falls back to appending at
    /// the end when the widget has no caret state yet.
    pub fn insert_selected(
        &mut self,
        ctx: &egui::Context,
        graph: &mut WorkflowGraph,
        node: NodeId,
        notifications: &mut NotificationManager,
    ) {
        let Some(name) = self.selection(graph, node) else {
            notifications.add_notification(Notification::new_info(
                format!("wildcard-insert-{}", node),
                "Wildcard Insert".to_string(),
                "Select a wildcard file to insert.".to_string(),
                SOURCE.to_string(),
            ));
            return;
        };

        let Some(text) = graph
            .node(node)
            .and_then(|n| n.widget("text"))
            .and_then(|w| w.as_text())
            .map(str::to_string)
        else {
            return;
        };

        let id = text_edit_id(node);
        let char_len = text.chars().count();
        let mut state = egui::text_edit::TextEditState::load(ctx, id).unwrap_or_default();
        let (start, end) = state
            .cursor
            .char_range()
            .map(|range| (range.primary.index, range.secondary.index))
            .unwrap_or((char_len, char_len));

        let (new_text, caret) = splice_wildcard(&text, start, end, &name);

        if let Some(widget) = graph.node_mut(node).and_then(|n| n.widget_mut("text")) {
            widget.set_text(new_text);
        }
        state
            .cursor
            .set_char_range(Some(egui::text::CCursorRange::one(egui::text::CCursor::new(
                caret,
            ))));
        state.store(ctx, id);
        graph.mark_dirty();
    }

    /// Current dropdown selection, `None` when the placeholder is selected.
    fn selection(&self, graph: &WorkflowGraph, node: NodeId) -> Option<String> {
        let selected = graph.node(node)?.widget("wildcards_list")?.selected()?;
        if selected == CREATE_NEW {
            None
        } else {
            Some(selected.to_string())
        }
    }

    /// Drain completed operations and apply them to the graph.
    pub fn poll(&mut self, graph: &mut WorkflowGraph, notifications: &mut NotificationManager) {
        let events: Vec<WildcardEvent> = self.rx.try_iter().collect();
        for event in events {
            match event {
                WildcardEvent::Listed { node, result } => {
                    self.on_listed(graph, node, result, notifications)
                }
                WildcardEvent::Fetched { node, name, result } => {
                    self.on_fetched(node, name, result, notifications)
                }
                WildcardEvent::Saved { node, name, result } => {
                    self.on_saved(node, name, result, notifications)
                }
                WildcardEvent::Deleted { node, name, result } => {
                    self.on_deleted(node, name, result, notifications)
                }
            }
        }
    }

    fn on_listed(
        &mut self,
        graph: &mut WorkflowGraph,
        node: NodeId,
        result: Result<Vec<String>, ApiError>,
        notifications: &mut NotificationManager,
    ) {
        let names = match result {
            Ok(names) => names,
            Err(e) => {
                notifications.add_notification(Notification::new_error(
                    format!("wildcard-list-{}", node),
                    "Wildcard List Failed".to_string(),
                    e.to_string(),
                    SOURCE.to_string(),
                ));
                return;
            }
        };

        let mut options = vec![CREATE_NEW.to_string()];
        options.extend(names.into_iter().filter(|n| n != CREATE_NEW));

        let mut changed = false;
        if let Some(widget) = graph.node_mut(node).and_then(|n| n.widget_mut("wildcards_list")) {
            widget.set_options(options.clone(), CREATE_NEW);
            if let Some(select) = self.select_after_refresh.remove(&node) {
                // Listed wildcard names are server-normalized to forward
                // slashes already, so exact matching is enough here.
                if options.contains(&select) {
                    widget.select(select);
                }
            }
            changed = true;
        }
        if changed {
            graph.mark_dirty();
        }
    }

    fn on_fetched(
        &mut self,
        node: NodeId,
        name: String,
        result: Result<String, ApiError>,
        notifications: &mut NotificationManager,
    ) {
        let purpose = self
            .pending_fetch
            .remove(&node)
            .unwrap_or(FetchPurpose::View);

        let content = match result {
            Ok(content) => content,
            Err(e) => {
                notifications.add_notification(Notification::new_error(
                    format!("wildcard-load-{}", node),
                    "Wildcard Load Failed".to_string(),
                    format!("Could not load \"{}\": {}", name, e),
                    SOURCE.to_string(),
                ));
                return;
            }
        };

        match purpose {
            FetchPurpose::View => {
                let display = if content.is_empty() {
                    "[File is empty]".to_string()
                } else {
                    content
                };
                self.editor
                    .open_viewer(format!("Wildcard: {}.txt", name), name, display);
            }
            FetchPurpose::Edit => {
                let client = self.client.clone();
                let tx = self.tx.clone();
                self.editor.open_editor(
                    format!("Edit Wildcard: {}", name),
                    name,
                    content,
                    false,
                    move |name, content| client.save(node, &name, &content, &tx),
                );
            }
        }
    }

    fn on_saved(
        &mut self,
        node: NodeId,
        name: String,
        result: Result<(), ApiError>,
        notifications: &mut NotificationManager,
    ) {
        match result {
            Ok(()) => {
                notifications.add_notification(Notification::new_success(
                    format!("wildcard-save-{}", node),
                    "Wildcard Saved".to_string(),
                    format!("Saved \"{}\".", name),
                    SOURCE.to_string(),
                ));
                self.select_after_refresh.insert(node, name);
                self.client.list(node, &self.tx);
            }
            Err(e) => notifications.add_notification(Notification::new_error(
                format!("wildcard-save-{}", node),
                "Wildcard Save Failed".to_string(),
                format!("Could not save \"{}\": {}", name, e),
                SOURCE.to_string(),
            )),
        }
    }

    fn on_deleted(
        &mut self,
        node: NodeId,
        name: String,
        result: Result<(), ApiError>,
        notifications: &mut NotificationManager,
    ) {
        match result {
            Ok(()) => {
                notifications.add_notification(Notification::new_success(
                    format!("wildcard-delete-{}", node),
                    "Wildcard Deleted".to_string(),
                    format!("Deleted \"{}.txt\".", name),
                    SOURCE.to_string(),
                ));
                self.client.list(node, &self.tx);
            }
            Err(e) => notifications.add_notification(Notification::new_error(
                format!("wildcard-delete-{}", node),
                "Wildcard Delete Failed".to_string(),
                format!("Could not delete \"{}\": {}", name, e),
                SOURCE.to_string(),
            )),
        }
    }

    /// True while a confirmation dialog is waiting on the user.
    pub fn has_pending_confirm(&self) -> bool {
        self.confirm.show
    }

    pub fn confirm_pending(&mut self) {
        self.confirm.confirm();
    }

    pub fn decline_pending(&mut self) {
        self.confirm.decline();
    }

    #[cfg(test)]
    pub(crate) fn save_from_editor(&mut self, name: &str, content: &str) {
        self.editor.name = name.to_string();
        self.editor.content = content.to_string();
        self.editor.save();
    }

    #[cfg(test)]
    pub(crate) fn editor_open(&self) -> bool {
        self.editor.show
    }

    /// Button strip and preview block rendered inside the node body.
    pub fn render_controls(
        &mut self,
        ui: &mut egui::Ui,
        graph: &mut WorkflowGraph,
        node: NodeId,
        notifications: &mut NotificationManager,
    ) {
        ui.horizontal_wrapped(|ui| {
            if ui.button("Insert Selected").clicked() {
                let ctx = ui.ctx().clone();
                self.insert_selected(&ctx, graph, node, notifications);
            }
            if ui.button("Refresh").clicked() {
                self.request_refresh(node);
            }
        });
        ui.horizontal_wrapped(|ui| {
            if ui.button("View Content").clicked() {
                self.request_view(graph, node, notifications);
            }
            if ui.button("Edit/Create").clicked() {
                self.request_edit(graph, node, notifications);
            }
            if ui.button("Delete Selected").clicked() {
                self.request_delete(graph, node, notifications);
            }
        });
        self.preview.render(ui, node);
    }

    pub fn show_dialogs(&mut self, ctx: &egui::Context) {
        self.editor.show(ctx);
        self.confirm.show(ctx);
    }
}

impl NodeExtension for WildcardPanel {
    fn name(&self) -> &'static str {
        "wildcard-manager"
    }

    fn node_type(&self) -> Option<&'static str> {
        Some(WILDCARD_NODE)
    }

    fn on_node_created(&mut self, node: &mut GraphNode) {
        self.request_refresh(node.id);
    }

    fn on_executed(
        &mut self,
        graph: &mut WorkflowGraph,
        node: NodeId,
        message: &ExecutionMessage,
    ) {
        if let Some(lines) = message.preview_list() {
            self.preview.set_preview(node, lines);
            graph.mark_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::notifications::NotificationType;
    use crate::app::resources::WildcardRoutes;
    use crate::app::server_api::ServerApi;
    use crate::app::workflow::wildcard_node;
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn panel_for(url: &str) -> (WildcardPanel, WorkflowGraph, NotificationManager, NodeId) {
        let api = ServerApi::new(url).unwrap();
        let panel = WildcardPanel::new(WildcardClient::new(api, WildcardRoutes::santodan()));
        let mut graph = WorkflowGraph::new();
        let node = graph.add(|id| wildcard_node(id, (0.0, 0.0)));
        (panel, graph, NotificationManager::new(), node)
    }

    fn select(graph: &mut WorkflowGraph, node: NodeId, name: &str) {
        let widget = graph
            .node_mut(node)
            .unwrap()
            .widget_mut("wildcards_list")
            .unwrap();
        widget.set_options(vec![CREATE_NEW.to_string(), name.to_string()], CREATE_NEW);
        widget.select(name);
    }

    fn pump(
        panel: &mut WildcardPanel,
        graph: &mut WorkflowGraph,
        notifications: &mut NotificationManager,
        mut done: impl FnMut(&WorkflowGraph, &NotificationManager, &WildcardPanel) -> bool,
    ) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            panel.poll(graph, notifications);
            if done(graph, notifications, panel) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn splice_replaces_the_selected_range() {
        let (text, caret) = splice_wildcard("foo|bar", 3, 3, "color");
        assert_eq!(text, "foo__color__|bar");
        assert_eq!(caret, 3 + "__color__".chars().count());

        let (text, caret) = splice_wildcard("foo|bar", 0, 3, "color");
        assert_eq!(text, "__color__|bar");
        assert_eq!(caret, "__color__".chars().count());
    }

    #[test]
    fn splice_accepts_reversed_and_oversized_ranges() {
        let (text, _) = splice_wildcard("abc", 3, 1, "x");
        assert_eq!(text, "a__x__");

        let (text, caret) = splice_wildcard("abc", 99, 99, "x");
        assert_eq!(text, "abc__x__");
        assert_eq!(caret, 3 + "__x__".chars().count());
    }

    #[test]
    fn splice_counts_chars_not_bytes() {
        // Multi-byte chars before the caret must not shift the splice point.
        let (text, caret) = splice_wildcard("héllo", 2, 2, "w");
        assert_eq!(text, "hé__w__llo");
        assert_eq!(caret, 2 + "__w__".chars().count());
    }

    #[test]
    fn create_flow_saves_and_reselects_the_new_file() {
        let mut server = mockito::Server::new();
        let save = server
            .mock("POST", "/santodan/wildcard-save")
            .match_body(mockito::Matcher::Json(json!({
                "filename": "animals",
                "content": "cat\ndog",
            })))
            .with_status(200)
            .with_body(r#"{"status": "saved"}"#)
            .expect(1)
            .create();
        let _list = server
            .mock("GET", "/santodan/wildcards")
            .with_status(200)
            .with_body(r#"["animals", "colors"]"#)
            .create();

        let (mut panel, mut graph, mut notifications, node) = panel_for(&server.url());

        // The placeholder is selected on a fresh node, so Edit/Create opens
        // a blank editor.
        panel.request_edit(&graph, node, &mut notifications);
        assert!(panel.editor_open());
        panel.save_from_editor("animals", "cat\ndog");
        assert!(!panel.editor_open());

        assert!(pump(&mut panel, &mut graph, &mut notifications, |g, _, _| {
            g.node(node)
                .unwrap()
                .widget("wildcards_list")
                .unwrap()
                .selected()
                == Some("animals")
        }));
        save.assert();
        let note = notifications
            .get_notification(&format!("wildcard-save-{}", node))
            .unwrap();
        assert_eq!(note.notification_type, NotificationType::Success);
    }

    #[test]
    fn typed_txt_suffix_is_trimmed_before_save() {
        let mut server = mockito::Server::new();
        // The server appends .txt to whatever filename it receives, so the
        // typed extension has to be gone by the time the request goes out.
        let save = server
            .mock("POST", "/santodan/wildcard-save")
            .match_body(mockito::Matcher::Json(json!({
                "filename": "animals",
                "content": "cat",
            })))
            .with_status(200)
            .with_body(r#"{"status": "saved"}"#)
            .expect(1)
            .create();
        let _list = server
            .mock("GET", "/santodan/wildcards")
            .with_status(200)
            .with_body(r#"["animals"]"#)
            .create();

        let (mut panel, mut graph, mut notifications, node) = panel_for(&server.url());
        panel.request_edit(&graph, node, &mut notifications);
        panel.save_from_editor("animals.txt", "cat");

        assert!(pump(&mut panel, &mut graph, &mut notifications, |g, _, _| {
            g.node(node)
                .unwrap()
                .widget("wildcards_list")
                .unwrap()
                .selected()
                == Some("animals")
        }));
        save.assert();
    }

    #[test]
    fn view_flow_shows_the_empty_file_fallback() {
        let mut server = mockito::Server::new();
        let _content = server
            .mock("GET", "/santodan/wildcard-content")
            .match_query(mockito::Matcher::UrlEncoded(
                "filename".to_string(),
                "empty".to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"content": ""}"#)
            .create();

        let (mut panel, mut graph, mut notifications, node) = panel_for(&server.url());
        select(&mut graph, node, "empty");
        panel.request_view(&graph, node, &mut notifications);

        assert!(pump(&mut panel, &mut graph, &mut notifications, |_, _, p| {
            p.editor_open()
        }));
        assert_eq!(panel.editor.name, "empty");
        assert_eq!(panel.editor.content, "[File is empty]");
    }

    #[test]
    fn edit_flow_round_trips_the_content() {
        let mut server = mockito::Server::new();
        let _content = server
            .mock("GET", "/santodan/wildcard-content")
            .match_query(mockito::Matcher::UrlEncoded(
                "filename".to_string(),
                "colors".to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"content": "red\nblue"}"#)
            .create();
        let save = server
            .mock("POST", "/santodan/wildcard-save")
            .match_body(mockito::Matcher::Json(json!({
                "filename": "colors",
                "content": "red\nblue\ngreen",
            })))
            .with_status(200)
            .with_body(r#"{"status": "saved"}"#)
            .expect(1)
            .create();
        let _list = server
            .mock("GET", "/santodan/wildcards")
            .with_status(200)
            .with_body(r#"["colors"]"#)
            .create();

        let (mut panel, mut graph, mut notifications, node) = panel_for(&server.url());
        select(&mut graph, node, "colors");
        panel.request_edit(&graph, node, &mut notifications);

        assert!(pump(&mut panel, &mut graph, &mut notifications, |_, _, p| {
            p.editor_open()
        }));
        assert_eq!(panel.editor.content, "red\nblue");

        panel.save_from_editor("colors", "red\nblue\ngreen");
        assert!(pump(&mut panel, &mut graph, &mut notifications, |_, n, _| {
            n.get_notification(&format!("wildcard-save-{}", node))
                .map(|note| note.notification_type == NotificationType::Success)
                .unwrap_or(false)
        }));
        save.assert();
    }

    #[test]
    fn missing_file_load_reports_an_error() {
        let mut server = mockito::Server::new();
        let _content = server
            .mock("GET", "/santodan/wildcard-content")
            .match_query(mockito::Matcher::UrlEncoded(
                "filename".to_string(),
                "ghost".to_string(),
            ))
            .with_status(404)
            .with_body(r#"{"error": "File not found"}"#)
            .create();

        let (mut panel, mut graph, mut notifications, node) = panel_for(&server.url());
        select(&mut graph, node, "ghost");
        panel.request_view(&graph, node, &mut notifications);

        assert!(pump(&mut panel, &mut graph, &mut notifications, |_, n, _| {
            n.has_errors()
        }));
        assert!(!panel.editor_open());
        let note = notifications
            .get_notification(&format!("wildcard-load-{}", node))
            .unwrap();
        assert!(note.message.contains("ghost"));
        assert!(note.message.contains("File not found"));
    }

    #[test]
    fn execution_output_replaces_the_preview() {
        let api = ServerApi::new("http://127.0.0.1:9").unwrap();
        let mut panel = WildcardPanel::new(WildcardClient::new(api, WildcardRoutes::santodan()));
        let mut graph = WorkflowGraph::new();
        let node = graph.add(|id| wildcard_node(id, (0.0, 0.0)));

        let first = ExecutionMessage::from_value(json!({ "preview_list": ["a", "b"] })).unwrap();
        panel.on_executed(&mut graph, node, &first);
        assert_eq!(panel.preview.preview(node), ["a", "b"]);
        assert!(graph.take_dirty());

        let second = ExecutionMessage::from_value(json!({ "preview_list": ["c"] })).unwrap();
        panel.on_executed(&mut graph, node, &second);
        assert_eq!(panel.preview.preview(node), ["c"]);
        assert!(graph.take_dirty());

        // Updates without preview lines leave the last preview in place.
        let other = ExecutionMessage::from_value(json!({ "seed": [1] })).unwrap();
        panel.on_executed(&mut graph, node, &other);
        assert_eq!(panel.preview.preview(node), ["c"]);
        assert!(!graph.take_dirty());
    }
}
