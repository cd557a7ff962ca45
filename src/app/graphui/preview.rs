use std::collections::HashMap;

use eframe::egui::{self, ScrollArea};

use crate::app::workflow::NodeId;

/// Per-node read-only preview lines, replaced wholesale on every update so a
/// shorter result never leaves stale rows from the previous run behind.
#[derive(Default)]
pub struct PreviewPanel {
    lines_by_node: HashMap<NodeId, Vec<String>>,
}

impl PreviewPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_preview(&mut self, node: NodeId, lines: Vec<String>) {
        self.lines_by_node.insert(node, lines);
    }

    pub fn preview(&self, node: NodeId) -> &[String] {
        self.lines_by_node
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn clear(&mut self, node: NodeId) {
        self.lines_by_node.remove(&node);
    }

    pub fn render(&self, ui: &mut egui::Ui, node: NodeId) {
        let lines = self.preview(node);
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ScrollArea::vertical()
                .id_salt(("preview", node))
                .max_height(140.0)
                .show(ui, |ui| {
                    if lines.is_empty() {
                        ui.weak("No processed output yet.");
                    } else {
                        for line in lines {
                            ui.monospace(line);
                        }
                    }
                });
        });
    }
}
