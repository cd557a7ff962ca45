//! Application shell: menu bar, node canvas, status bar, and the per-frame
//! pipeline that drains execution events and manager completions.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::app::config::AppConfig;
use crate::app::execution::ExecutionEvent;
use crate::app::extensions::{CounterAutoReset, ExtensionRegistry, ShutdownTrigger};
use crate::app::notifications::{Notification, NotificationManager};
use crate::app::resources::{TemplateClient, TemplateRoutes, WildcardClient, WildcardRoutes};
use crate::app::server_api::ServerApi;
use crate::app::workflow::{
    list_selector_node, prompt_list_node, shutdown_node, wildcard_node, GraphNode, NodeId,
    WorkflowGraph,
};

use super::canvas::NodeCanvas;
use super::template_manager::TemplateManager;
use super::wildcard_manager::WildcardPanel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeChoice {
    Latte,
    Frappe,
    Macchiato,
    #[default]
    Mocha,
}

pub struct GraphDashApp {
    config: AppConfig,
    graph: WorkflowGraph,
    registry: ExtensionRegistry,
    template_manager: Arc<Mutex<TemplateManager>>,
    wildcard_panel: Arc<Mutex<WildcardPanel>>,
    notifications: NotificationManager,
    canvas: NodeCanvas,
    theme: ThemeChoice,
    execution_tx: Sender<ExecutionEvent>,
    execution_rx: Receiver<ExecutionEvent>,
}

impl GraphDashApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        mut graph: WorkflowGraph,
    ) -> anyhow::Result<Self> {
        let api = ServerApi::new(&config.server_url)?;

        let template_manager = Arc::new(Mutex::new(TemplateManager::new(TemplateClient::new(
            api.clone(),
            TemplateRoutes::easyuse(),
        ))));
        let wildcard_panel = Arc::new(Mutex::new(WildcardPanel::new(WildcardClient::new(
            api.clone(),
            WildcardRoutes::santodan(),
        ))));

        let mut registry = ExtensionRegistry::new();
        registry.register(CounterAutoReset);
        registry.register(ShutdownTrigger::new(api));
        registry.register_shared(&template_manager);
        registry.register_shared(&wildcard_panel);

        // A preloaded workflow gets the same creation hooks as a node added
        // through the menu, so its dropdowns refresh immediately.
        for node in graph.nodes_mut() {
            registry.node_created(node);
        }

        let theme = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, "theme"))
            .unwrap_or_default();

        let (execution_tx, execution_rx) = channel();

        let app = Self {
            config,
            graph,
            registry,
            template_manager,
            wildcard_panel,
            notifications: NotificationManager::new(),
            canvas: NodeCanvas::new(),
            theme,
            execution_tx,
            execution_rx,
        };
        app.apply_theme(&cc.egui_ctx);
        Ok(app)
    }

    /// Channel end for feeding execution updates from the server connection.
    pub fn execution_sender(&self) -> Sender<ExecutionEvent> {
        self.execution_tx.clone()
    }

    fn apply_theme(&self, ctx: &egui::Context) {
        match self.theme {
            ThemeChoice::Latte => catppuccin_egui::set_theme(ctx, catppuccin_egui::LATTE),
            ThemeChoice::Frappe => catppuccin_egui::set_theme(ctx, catppuccin_egui::FRAPPE),
            ThemeChoice::Macchiato => catppuccin_egui::set_theme(ctx, catppuccin_egui::MACCHIATO),
            ThemeChoice::Mocha => catppuccin_egui::set_theme(ctx, catppuccin_egui::MOCHA),
        }
    }

    fn drain_execution_events(&mut self) {
        let events: Vec<ExecutionEvent> = self.execution_rx.try_iter().collect();
        for event in events {
            self.registry.dispatch(&mut self.graph, &event);
        }
    }

    fn poll_managers(&mut self) {
        if let Ok(mut templates) = self.template_manager.lock() {
            templates.poll(&mut self.graph, &mut self.notifications);
        }
        if let Ok(mut wildcards) = self.wildcard_panel.lock() {
            wildcards.poll(&mut self.graph, &mut self.notifications);
        }
    }

    fn save_workflow(&mut self) {
        let path = match &self.graph.filename {
            Some(name) => PathBuf::from(name),
            None => {
                let dir = self.config.workflows_dir();
                if let Err(e) = std::fs::create_dir_all(&dir) {
                    self.notifications.add_notification(Notification::new_error(
                        "workflow-save".to_string(),
                        "Workflow Save Failed".to_string(),
                        format!("Could not create {}: {}", dir.display(), e),
                        "workflow".to_string(),
                    ));
                    return;
                }
                dir.join("workflow.json")
            }
        };

        match self.graph.save_to(&path) {
            Ok(()) => {
                self.graph.filename = Some(path.display().to_string());
                self.notifications.add_notification(Notification::new_success(
                    "workflow-save".to_string(),
                    "Workflow Saved".to_string(),
                    format!("Saved to {}.", path.display()),
                    "workflow".to_string(),
                ));
            }
            Err(e) => {
                self.notifications.add_notification(Notification::new_error(
                    "workflow-save".to_string(),
                    "Workflow Save Failed".to_string(),
                    e.to_string(),
                    "workflow".to_string(),
                ));
            }
        }
    }

    /// Stagger new nodes so they do not stack on one spot.
    fn spawn_position(&self) -> (f32, f32) {
        let n = self.graph.nodes().len() as f32;
        (60.0 + n * 30.0, 60.0 + n * 24.0)
    }

    fn add_node(&mut self, build: fn(NodeId, (f32, f32)) -> GraphNode) {
        let position = self.spawn_position();
        let id = self.graph.add(|id| build(id, position));
        if let Some(node) = self.graph.node_mut(id) {
            self.registry.node_created(node);
        }
    }

    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Save Workflow").clicked() {
                        self.save_workflow();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Graph", |ui| {
                    if ui.button("Add Prompt List (Templates)").clicked() {
                        self.add_node(prompt_list_node);
                        ui.close();
                    }
                    if ui.button("Add Wildcard Manager").clicked() {
                        self.add_node(wildcard_node);
                        ui.close();
                    }
                    if ui.button("Add List Selector").clicked() {
                        self.add_node(list_selector_node);
                        ui.close();
                    }
                    if ui.button("Add Save && Shutdown").clicked() {
                        self.add_node(shutdown_node);
                        ui.close();
                    }
                });

                ui.menu_button("Theme", |ui| {
                    if ui.button("Latte").clicked() {
                        self.theme = ThemeChoice::Latte;
                        self.apply_theme(ctx);
                    }
                    if ui.button("Frappe").clicked() {
                        self.theme = ThemeChoice::Frappe;
                        self.apply_theme(ctx);
                    }
                    if ui.button("Macchiato").clicked() {
                        self.theme = ThemeChoice::Macchiato;
                        self.apply_theme(ctx);
                    }
                    if ui.button("Mocha").clicked() {
                        self.theme = ThemeChoice::Mocha;
                        self.apply_theme(ctx);
                    }
                });
            });
        });
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Server: {}", self.config.server_url));
                ui.separator();
                match &self.graph.filename {
                    Some(name) => ui.label(name),
                    None => ui.weak("unsaved workflow"),
                };
                ui.separator();
                self.notifications.render_status_bar_indicator(ui);
            });
        });
    }
}

impl eframe::App for GraphDashApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, "theme", &self.theme);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_execution_events();
        self.poll_managers();
        self.notifications.clear_expired();

        self.render_menu_bar(ctx);
        self.render_status_bar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            if let (Ok(mut templates), Ok(mut wildcards)) =
                (self.template_manager.lock(), self.wildcard_panel.lock())
            {
                self.canvas.show(
                    ui,
                    &mut self.graph,
                    &mut templates,
                    &mut wildcards,
                    &mut self.notifications,
                );
            }
        });

        if let Ok(mut templates) = self.template_manager.lock() {
            templates.show_dialogs(ctx);
        }
        if let Ok(mut wildcards) = self.wildcard_panel.lock() {
            wildcards.show_dialogs(ctx);
        }
        self.notifications.render_list_window(ctx);

        if self.graph.take_dirty() {
            ctx.request_repaint();
        }
    }
}
