//! Node lifecycle extensions.
//!
//! Extensions attach behavior to node types without the host carrying any of
//! it: setup when a node is created, handling of per-node execution output,
//! and whole-run sweeps. The registry delivers per-node events only to
//! extensions registered for that node type; run completion goes to all of
//! them.

use std::sync::{Arc, Mutex};

use crate::app::execution::{ExecutionEvent, ExecutionMessage, ShutdownParams};
use crate::app::resources::SHUTDOWN_TRIGGER_PATH;
use crate::app::server_api::ServerApi;
use crate::app::workflow::{
    GraphNode, NodeId, WorkflowGraph, LIST_SELECTOR_NODE, SHUTDOWN_NODE,
};

pub trait NodeExtension {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Node type whose creation and execution events this extension
    /// receives. `None` subscribes to no per-node events.
    fn node_type(&self) -> Option<&'static str> {
        None
    }

    /// Called once when a node of the subscribed type is added to the graph.
    fn on_node_created(&mut self, _node: &mut GraphNode) {}

    /// Called when a node of the subscribed type reports execution output.
    fn on_executed(
        &mut self,
        _graph: &mut WorkflowGraph,
        _node: NodeId,
        _message: &ExecutionMessage,
    ) {
    }

    /// Called after every completed run, regardless of node type.
    fn on_run_completed(&mut self, _graph: &mut WorkflowGraph) {}
}

/// Dispatches graph lifecycle events to registered extensions.
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Box<dyn NodeExtension>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: impl NodeExtension + 'static) {
        tracing::debug!("registered extension: {}", extension.name());
        self.extensions.push(Box::new(extension));
    }

    /// Register an extension that the UI keeps a handle to as well.
    pub fn register_shared<T: NodeExtension + 'static>(&mut self, extension: &Arc<Mutex<T>>) {
        self.register(Shared::new(Arc::clone(extension)));
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Run creation hooks for a node that was just added.
    pub fn node_created(&mut self, node: &mut GraphNode) {
        for extension in &mut self.extensions {
            if extension.node_type() == Some(node.type_name.as_str()) {
                extension.on_node_created(node);
            }
        }
    }

    pub fn dispatch(&mut self, graph: &mut WorkflowGraph, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::NodeExecuted { node, message } => {
                let Some(type_name) = graph.node(*node).map(|n| n.type_name.clone()) else {
                    tracing::warn!("execution update for unknown node {}", node);
                    return;
                };
                for extension in &mut self.extensions {
                    if extension.node_type() == Some(type_name.as_str()) {
                        extension.on_executed(graph, *node, message);
                    }
                }
            }
            ExecutionEvent::RunCompleted => {
                for extension in &mut self.extensions {
                    extension.on_run_completed(graph);
                }
            }
        }
    }
}

/// Adapter sharing one extension between the registry and the UI.
pub struct Shared<T> {
    name: &'static str,
    node_type: Option<&'static str>,
    inner: Arc<Mutex<T>>,
}

impl<T: NodeExtension> Shared<T> {
    pub fn new(inner: Arc<Mutex<T>>) -> Self {
        let (name, node_type) = match inner.lock() {
            Ok(guard) => (guard.name(), guard.node_type()),
            Err(_) => ("poisoned", None),
        };
        Self {
            name,
            node_type,
            inner,
        }
    }
}

impl<T: NodeExtension> NodeExtension for Shared<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn node_type(&self) -> Option<&'static str> {
        self.node_type
    }

    fn on_node_created(&mut self, node: &mut GraphNode) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.on_node_created(node);
        } else {
            tracing::warn!("extension {} is poisoned, skipping", self.name);
        }
    }

    fn on_executed(&mut self, graph: &mut WorkflowGraph, node: NodeId, message: &ExecutionMessage) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.on_executed(graph, node, message);
        } else {
            tracing::warn!("extension {} is poisoned, skipping", self.name);
        }
    }

    fn on_run_completed(&mut self, graph: &mut WorkflowGraph) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.on_run_completed(graph);
        } else {
            tracing::warn!("extension {} is poisoned, skipping", self.name);
        }
    }
}

/// Clears `reset_counter` toggles on selector nodes after every run.
///
/// The sweep is idempotent: a toggle already off stays off, and each node is
/// updated independently.
pub struct CounterAutoReset;

impl NodeExtension for CounterAutoReset {
    fn name(&self) -> &'static str {
        "list-selector-auto-reset"
    }

    fn on_run_completed(&mut self, graph: &mut WorkflowGraph) {
        let mut cleared = 0usize;
        for node in graph.nodes_mut() {
            if node.type_name != LIST_SELECTOR_NODE {
                continue;
            }
            if let Some(widget) = node.widget_mut("reset_counter") {
                if widget.as_bool() == Some(true) {
                    widget.set_bool(false);
                    cleared += 1;
                }
            }
        }
        if cleared > 0 {
            graph.mark_dirty();
            tracing::debug!("auto-reset {} selector counter(s)", cleared);
        }
    }
}

/// Posts the serialized workflow to the save-and-shutdown endpoint when a
/// shutdown node reports itself enabled.
pub struct ShutdownTrigger {
    api: ServerApi,
}

impl ShutdownTrigger {
    pub fn new(api: ServerApi) -> Self {
        Self { api }
    }

    /// Request body for one trigger, built from the current graph state.
    pub fn trigger_body(
        graph: &WorkflowGraph,
        params: &ShutdownParams,
    ) -> serde_json::Result<serde_json::Value> {
        Ok(serde_json::json!({
            "workflow": graph.serialize()?,
            "filepath": graph.filename,
            "params": params.to_json(),
        }))
    }
}

impl NodeExtension for ShutdownTrigger {
    fn name(&self) -> &'static str {
        "save-and-shutdown"
    }

    fn node_type(&self) -> Option<&'static str> {
        Some(SHUTDOWN_NODE)
    }

    fn on_executed(&mut self, graph: &mut WorkflowGraph, node: NodeId, message: &ExecutionMessage) {
        let Some(params) = ShutdownParams::from_message(message) else {
            tracing::debug!("shutdown node {} output carried no parameters", node);
            return;
        };
        if !params.enabled {
            tracing::info!("shutdown node {} is disabled, no action taken", node);
            return;
        }

        let body = match Self::trigger_body(graph, &params) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("could not serialize workflow for shutdown trigger: {}", e);
                return;
            }
        };

        tracing::info!(
            "shutdown node {} enabled, sending trigger (delay {}s)",
            node,
            params.delay
        );
        let api = self.api.clone();
        std::thread::spawn(move || match api.post_json(SHUTDOWN_TRIGGER_PATH, &body) {
            Ok(_) => tracing::info!("save-and-shutdown trigger accepted"),
            Err(e) => tracing::error!("save-and-shutdown trigger failed: {}", e),
        });
    }
}
