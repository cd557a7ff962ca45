//! Save/load/delete panel for prompt template nodes.
//!
//! All server traffic runs on worker threads through `TemplateClient`; the
//! panel drains completions in `poll` each frame. Saving is a two-step flow:
//! the list is re-fetched first, and an existing name has to be confirmed
//! before the write goes out. An unconfirmed collision aborts with no side
//! effect.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

use eframe::egui;

use crate::app::notifications::{Notification, NotificationManager};
use crate::app::resources::{
    canonical_template_name, list_contains, names_collide, TemplateClient, TemplateContent,
    TemplateEvent, NO_TEMPLATE,
};
use crate::app::server_api::ApiError;
use crate::app::workflow::{GraphNode, NodeId, WidgetSlot, WorkflowGraph, PROMPT_LIST_NODE};

use super::confirm_dialog::ConfirmDialog;
use crate::app::extensions::NodeExtension;

const SOURCE: &str = "templates";

/// Widget slots of one prompt list node, resolved once per operation.
struct TemplateBindings {
    template_file: WidgetSlot,
    save_filename: WidgetSlot,
    prompts: [Option<WidgetSlot>; 5],
}

impl TemplateBindings {
    fn resolve(node: &GraphNode) -> Option<Self> {
        let mut prompts = [None; 5];
        for (i, name) in TemplateContent::SLOT_NAMES.iter().enumerate() {
            prompts[i] = node.bind(name);
        }
        Some(Self {
            template_file: node.bind("template_file")?,
            save_filename: node.bind("save_filename")?,
            prompts,
        })
    }
}

/// A save waiting on the fresh name list for its collision check.
struct PendingSave {
    name: String,
    content: TemplateContent,
}

pub struct TemplateManager {
    client: TemplateClient,
    tx: Sender<TemplateEvent>,
    rx: Receiver<TemplateEvent>,
    pending_saves: HashMap<NodeId, PendingSave>,
    /// Name to select once the post-save refresh lands.
    select_after_refresh: HashMap<NodeId, String>,
    confirm: ConfirmDialog,
}

impl TemplateManager {
    pub fn new(client: TemplateClient) -> Self {
        let (tx, rx) = channel();
        Self {
            client,
            tx,
            rx,
            pending_saves: HashMap::new(),
            select_after_refresh: HashMap::new(),
            confirm: ConfirmDialog::new(),
        }
    }

    pub fn request_refresh(&self, node: NodeId) {
        self.client.list(node, &self.tx);
    }

    /// Start the save flow. The actual write is deferred until a fresh name
    /// list has come back and any collision has been confirmed.
    pub fn request_save(
        &mut self,
        graph: &WorkflowGraph,
        node: NodeId,
        notifications: &mut NotificationManager,
    ) {
        let Some(graph_node) = graph.node(node) else {
            return;
        };
        let Some(bindings) = TemplateBindings::resolve(graph_node) else {
            tracing::warn!("prompt list node {} is missing template widgets", node);
            return;
        };

        let typed = graph_node
            .slot(bindings.save_filename)
            .as_text()
            .unwrap_or("")
            .trim()
            .to_string();
        let target = if !typed.is_empty() {
            typed
        } else {
            match graph_node.slot(bindings.template_file).selected() {
                Some(selected) if selected != NO_TEMPLATE => selected.to_string(),
                _ => {
                    notifications.add_notification(Notification::new_info(
                        format!("template-save-{}", node),
                        "Template Save".to_string(),
                        "Enter a save filename first.".to_string(),
                        SOURCE.to_string(),
                    ));
                    return;
                }
            }
        };

        let name = canonical_template_name(&target);
        let content = TemplateContent::from_slots(bindings.prompts.map(|slot| {
            slot.map(|s| graph_node.slot(s).as_text().unwrap_or("").to_string())
                .unwrap_or_default()
        }));

        self.pending_saves.insert(node, PendingSave { name, content });
        self.client.list(node, &self.tx);
    }

    pub fn request_load(
        &self,
        graph: &WorkflowGraph,
        node: NodeId,
        notifications: &mut NotificationManager,
    ) {
        match self.selection(graph, node) {
            Some(name) => self.client.fetch(node, &name, &self.tx),
            None => notifications.add_notification(Notification::new_info(
                format!("template-load-{}", node),
                "Template Load".to_string(),
                "Select a template to load.".to_string(),
                SOURCE.to_string(),
            )),
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
                format!("template-delete-{}", node),
                "Template Delete".to_string(),
                "Select a template to delete.".to_string(),
                SOURCE.to_string(),
            ));
            return;
        };

        let client = self.client.clone();
        let tx = self.tx.clone();
        let message = format!("Delete \"{}\"? This cannot be undone.", name);
        self.confirm.open("Delete Template", message, "Delete", move || {
            client.delete(node, &name, &tx);
        });
    }

    /// Current dropdown selection, `None` when nothing usable is selected.
    fn selection(&self, graph: &WorkflowGraph, node: NodeId) -> Option<String> {
        let selected = graph.node(node)?.widget("template_file")?.selected()?;
        if selected == NO_TEMPLATE {
            None
        } else {
            Some(selected.to_string())
        }
    }

    /// Drain completed operations and apply them to the graph.
    pub fn poll(&mut self, graph: &mut WorkflowGraph, notifications: &mut NotificationManager) {
        let events: Vec<TemplateEvent> = self.rx.try_iter().collect();
        for event in events {
            match event {
                TemplateEvent::Listed { node, result } => {
                    self.on_listed(graph, node, result, notifications)
                }
                TemplateEvent::Fetched { node, name, result } => {
                    self.on_fetched(graph, node, name, result, notifications)
                }
                TemplateEvent::Saved { node, name, result } => {
                    self.on_saved(node, name, result, notifications)
                }
                TemplateEvent::Deleted { node, name, result } => {
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
                if let Some(pending) = self.pending_saves.remove(&node) {
                    notifications.add_notification(Notification::new_error(
                        format!("template-save-{}", node),
                        "Template Save Failed".to_string(),
                        format!(
                            "Could not check existing templates before saving \"{}\": {}",
                            pending.name, e
                        ),
                        SOURCE.to_string(),
                    ));
                } else {
                    notifications.add_notification(Notification::new_error(
                        format!("template-list-{}", node),
                        "Template List Failed".to_string(),
                        e.to_string(),
                        SOURCE.to_string(),
                    ));
                }
                return;
            }
        };

        if let Some(pending) = self.pending_saves.remove(&node) {
            if list_contains(&names, &pending.name) {
                let client = self.client.clone();
                let tx = self.tx.clone();
                let PendingSave { name, content } = pending;
                let message = format!("\"{}\" already exists. Overwrite it?", name);
                self.confirm
                    .open("Overwrite Template", message, "Overwrite", move || {
                        client.save(node, &name, content, &tx);
                    });
            } else {
                self.client.save(node, &pending.name, pending.content, &self.tx);
            }
        }

        let mut options = names;
        if !options.iter().any(|n| n == NO_TEMPLATE) {
            options.insert(0, NO_TEMPLATE.to_string());
        }
        if let Some(graph_node) = graph.node_mut(node) {
            if let Some(widget) = graph_node.widget_mut("template_file") {
                widget.set_options(options.clone(), NO_TEMPLATE);
                if let Some(select) = self.select_after_refresh.remove(&node) {
                    let choice = options
                        .iter()
                        .find(|o| names_collide(o, &select))
                        .cloned()
                        .unwrap_or(select);
                    widget.select(choice);
                }
                graph.mark_dirty();
            }
        }
    }

    fn on_fetched(
        &mut self,
        graph: &mut WorkflowGraph,
        node: NodeId,
        name: String,
        result: Result<TemplateContent, ApiError>,
        notifications: &mut NotificationManager,
    ) {
        let content = match result {
            Ok(content) => content,
            Err(e) => {
                notifications.add_notification(Notification::new_error(
                    format!("template-load-{}", node),
                    "Template Load Failed".to_string(),
                    format!("Could not load \"{}\": {}", name, e),
                    SOURCE.to_string(),
                ));
                return;
            }
        };

        let Some(graph_node) = graph.node_mut(node) else {
            return;
        };
        let Some(bindings) = TemplateBindings::resolve(graph_node) else {
            return;
        };
        let slots = content.slots();
        for (i, slot) in bindings.prompts.iter().enumerate() {
            if let Some(slot) = slot {
                graph_node.slot_mut(*slot).set_text(slots[i]);
            }
        }
        graph_node.slot_mut(bindings.save_filename).set_text(name);
        graph.mark_dirty();
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
                    format!("template-save-{}", node),
                    "Template Saved".to_string(),
                    format!("Saved \"{}\".", name),
                    SOURCE.to_string(),
                ));
                self.select_after_refresh.insert(node, name);
                self.client.list(node, &self.tx);
            }
            Err(e) => notifications.add_notification(Notification::new_error(
                format!("template-save-{}", node),
                "Template Save Failed".to_string(),
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
                    format!("template-delete-{}", node),
                    "Template Deleted".to_string(),
                    format!("Deleted \"{}\".", name),
                    SOURCE.to_string(),
                ));
                self.client.list(node, &self.tx);
            }
            Err(e) => notifications.add_notification(Notification::new_error(
                format!("template-delete-{}", node),
                "Template Delete Failed".to_string(),
                format!("Could not delete \"{}\": {}", name, e),
                SOURCE.to_string(),
            )),
        }
    }

    /// True while a confirmation dialog is waiting on the user.
    pub fn has_pending_confirm(&self) -> bool {
        self.confirm.show
    }

    /// Answer the open confirmation dialog, same path the button takes.
    pub fn confirm_pending(&mut self) {
        self.confirm.confirm();
    }

    pub fn decline_pending(&mut self) {
        self.confirm.decline();
    }

    /// Button strip rendered inside the node body.
    pub fn render_controls(
        &mut self,
        ui: &mut egui::Ui,
        graph: &mut WorkflowGraph,
        node: NodeId,
        notifications: &mut NotificationManager,
    ) {
        ui.horizontal_wrapped(|ui| {
            if ui.button("Save Template").clicked() {
                self.request_save(graph, node, notifications);
            }
            if ui.button("Load Template").clicked() {
                self.request_load(graph, node, notifications);
            }
            if ui.button("Delete Template").clicked() {
                self.request_delete(graph, node, notifications);
            }
            if ui.button("Refresh").clicked() {
                self.request_refresh(node);
            }
        });
    }

    pub fn show_dialogs(&mut self, ctx: &egui::Context) {
        self.confirm.show(ctx);
    }
}

impl NodeExtension for TemplateManager {
    fn name(&self) -> &'static str {
        "prompt-templates"
    }

    fn node_type(&self) -> Option<&'static str> {
        Some(PROMPT_LIST_NODE)
    }

    fn on_node_created(&mut self, node: &mut GraphNode) {
        self.request_refresh(node.id);
    }
}
