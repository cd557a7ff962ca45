//! Pannable, zoomable canvas hosting the workflow's nodes.
//!
//! Each node is a framed child UI placed at its graph position inside an
//! `egui::Scene`. The header row is the drag handle; widget rows below it
//! edit the node's values in place, and the manager panels append their
//! button strips to the node types they handle.

use eframe::egui::{self, Align2, Pos2, Rect, Sense, Vec2};

use crate::app::notifications::NotificationManager;
use crate::app::workflow::{
    NodeId, Widget, WidgetValue, WorkflowGraph, PROMPT_LIST_NODE, WILDCARD_NODE,
};

use super::template_manager::TemplateManager;
use super::wildcard_manager::{text_edit_id, WildcardPanel};

const NODE_WIDTH: f32 = 260.0;
const HEADER_HEIGHT: f32 = 22.0;

pub struct NodeCanvas {
    scene_rect: Rect,
}

impl Default for NodeCanvas {
    fn default() -> Self {
        Self {
            scene_rect: Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        }
    }
}

impl NodeCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_view(&mut self) {
        self.scene_rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        graph: &mut WorkflowGraph,
        template_manager: &mut TemplateManager,
        wildcard_panel: &mut WildcardPanel,
        notifications: &mut NotificationManager,
    ) {
        ui.horizontal(|ui| {
            if ui.button("Reset View").clicked() {
                self.reset_view();
            }
            ui.weak("Drag headers to move nodes. Scroll to zoom, drag the background to pan.");
        });

        egui::containers::Scene::new()
            .zoom_range(0.1..=5.0)
            .max_inner_size(egui::Vec2::new(5000.0, 5000.0))
            .show(ui, &mut self.scene_rect, |scene_ui| {
                let ids: Vec<NodeId> = graph.nodes().iter().map(|n| n.id).collect();
                let mut removed = None;

                for id in ids {
                    let Some(node) = graph.node(id) else {
                        continue;
                    };
                    let position = Pos2::new(node.position.0, node.position.1);
                    let title = node.title.clone();
                    let type_name = node.type_name.clone();

                    // Width is fixed; height follows the content.
                    let max_rect =
                        Rect::from_min_size(position, Vec2::new(NODE_WIDTH + 20.0, 4000.0));
                    scene_ui.scope_builder(egui::UiBuilder::new().max_rect(max_rect), |ui| {
                        egui::Frame::window(ui.style()).show(ui, |ui| {
                            ui.set_width(NODE_WIDTH);

                            let (header_rect, header) = ui.allocate_exact_size(
                                Vec2::new(NODE_WIDTH, HEADER_HEIGHT),
                                Sense::click_and_drag(),
                            );
                            ui.painter().rect_filled(
                                header_rect,
                                3.0,
                                ui.visuals().widgets.active.weak_bg_fill,
                            );
                            ui.painter().text(
                                header_rect.left_center() + Vec2::new(6.0, 0.0),
                                Align2::LEFT_CENTER,
                                format!("{} {}", title, id),
                                egui::TextStyle::Button.resolve(ui.style()),
                                ui.visuals().strong_text_color(),
                            );

                            if header.dragged() {
                                let delta = header.drag_delta();
                                if let Some(node) = graph.node_mut(id) {
                                    node.position.0 += delta.x;
                                    node.position.1 += delta.y;
                                }
                            }
                            header.context_menu(|ui| {
                                if ui.button("Remove Node").clicked() {
                                    removed = Some(id);
                                    ui.close();
                                }
                            });

                            ui.add_space(4.0);
                            if let Some(node) = graph.node_mut(id) {
                                for widget in &mut node.widgets {
                                    if type_name == WILDCARD_NODE
                                        && widget.name == "processed_text_preview"
                                    {
                                        continue;
                                    }
                                    widget_row(ui, id, &type_name, widget);
                                }
                            }

                            match type_name.as_str() {
                                PROMPT_LIST_NODE => {
                                    ui.separator();
                                    template_manager.render_controls(ui, graph, id, notifications);
                                }
                                WILDCARD_NODE => {
                                    ui.separator();
                                    wildcard_panel.render_controls(ui, graph, id, notifications);
                                }
                                _ => {}
                            }
                        });
                    });
                }

                if let Some(id) = removed {
                    graph.remove(id);
                }
            });
    }
}

fn widget_row(ui: &mut egui::Ui, node: NodeId, type_name: &str, widget: &mut Widget) {
    if let WidgetValue::Choice(_) = widget.value {
        ui.weak(&widget.name);
        let mut selected = widget.selected().unwrap_or_default().to_string();
        let before = selected.clone();
        egui::ComboBox::from_id_salt((node, widget.name.clone()))
            .width(NODE_WIDTH - 8.0)
            .selected_text(selected.clone())
            .show_ui(ui, |ui| {
                for option in &widget.options {
                    ui.selectable_value(&mut selected, option.clone(), option);
                }
            });
        if selected != before {
            widget.select(selected);
        }
        return;
    }

    match &mut widget.value {
        WidgetValue::Text(text) => {
            ui.weak(&widget.name);
            if widget.multiline {
                let mut edit = egui::TextEdit::multiline(text)
                    .desired_rows(3)
                    .desired_width(f32::INFINITY)
                    .font(egui::TextStyle::Monospace);
                if type_name == WILDCARD_NODE && widget.name == "text" {
                    edit = edit.id(text_edit_id(node));
                }
                ui.add(edit);
            } else {
                ui.add(egui::TextEdit::singleline(text).desired_width(f32::INFINITY));
            }
        }
        WidgetValue::Bool(value) => {
            ui.checkbox(value, widget.name.as_str());
        }
        WidgetValue::Number(value) => {
            ui.horizontal(|ui| {
                ui.weak(widget.name.as_str());
                ui.add(egui::DragValue::new(value).speed(1.0));
            });
        }
        // Handled above; choices need the options list alongside the value.
        WidgetValue::Choice(_) => {}
    }
}
