//! Workflow graph model: nodes, widgets, and serialization.
//!
//! The graph is deliberately small. Execution happens on the server; this
//! model only has to carry enough structure for editing, for the managers
//! that attach to specific node types, and for shipping the whole workflow
//! back to the server as JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::app::resources::{CREATE_NEW, NO_TEMPLATE};

/// Node type handled by the template manager panel.
pub const PROMPT_LIST_NODE: &str = "PromptListWithTemplates";
/// Node type handled by the wildcard manager panel.
pub const WILDCARD_NODE: &str = "WildcardManager";
/// Node type swept by the post-run counter reset.
pub const LIST_SELECTOR_NODE: &str = "ListSelector";
/// Node type that reports save-and-shutdown parameters when it executes.
pub const SHUTDOWN_NODE: &str = "SaveWorkflowAndShutdown";

/// Stable identity of a node within one workflow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value carried by a node widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WidgetValue {
    Text(String),
    Bool(bool),
    Number(f64),
    /// Current selection of a choice widget.
    Choice(String),
}

/// One editable field on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub name: String,
    pub value: WidgetValue,
    /// Allowed values for choice widgets; empty for every other kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Render text widgets with a multi-line editor.
    #[serde(default)]
    pub multiline: bool,
}

impl Widget {
    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: WidgetValue::Text(value.to_string()),
            options: Vec::new(),
            multiline: false,
        }
    }

    pub fn multiline(name: &str, value: &str) -> Self {
        Self {
            multiline: true,
            ..Self::text(name, value)
        }
    }

    pub fn boolean(name: &str, value: bool) -> Self {
        Self {
            name: name.to_string(),
            value: WidgetValue::Bool(value),
            options: Vec::new(),
            multiline: false,
        }
    }

    pub fn number(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value: WidgetValue::Number(value),
            options: Vec::new(),
            multiline: false,
        }
    }

    pub fn choice(name: &str, options: &[&str], value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: WidgetValue::Choice(value.to_string()),
            options: options.iter().map(|s| s.to_string()).collect(),
            multiline: false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            WidgetValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            WidgetValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            WidgetValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Current selection, for choice widgets only.
    pub fn selected(&self) -> Option<&str> {
        match &self.value {
            WidgetValue::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        self.value = WidgetValue::Text(value.into());
    }

    pub fn set_bool(&mut self, value: bool) {
        self.value = WidgetValue::Bool(value);
    }

    pub fn select(&mut self, value: impl Into<String>) {
        self.value = WidgetValue::Choice(value.into());
    }

    /// Replace a choice widget's option set. The current selection survives
    /// when it is still listed; otherwise it falls back to `fallback`.
    pub fn set_options(&mut self, options: Vec<String>, fallback: &str) {
        let keep = match &self.value {
            WidgetValue::Choice(current) => options.iter().any(|o| o == current),
            _ => false,
        };
        if !keep {
            self.value = WidgetValue::Choice(fallback.to_string());
        }
        self.options = options;
    }
}

/// Index of a widget resolved once by name.
///
/// Slots are only meaningful for the node that produced them; resolve again
/// after structural changes to that node's widget list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetSlot(usize);

/// A node placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub type_name: String,
    pub title: String,
    /// Canvas position of the node's top-left corner.
    pub position: (f32, f32),
    pub widgets: Vec<Widget>,
}

impl GraphNode {
    pub fn new(id: NodeId, type_name: &str, title: &str, position: (f32, f32)) -> Self {
        Self {
            id,
            type_name: type_name.to_string(),
            title: title.to_string(),
            position,
            widgets: Vec::new(),
        }
    }

    pub fn widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.name == name)
    }

    pub fn widget_mut(&mut self, name: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.name == name)
    }

    /// Resolve a widget name to a slot handle.
    pub fn bind(&self, name: &str) -> Option<WidgetSlot> {
        self.widgets
            .iter()
            .position(|w| w.name == name)
            .map(WidgetSlot)
    }

    pub fn slot(&self, slot: WidgetSlot) -> &Widget {
        &self.widgets[slot.0]
    }

    pub fn slot_mut(&mut self, slot: WidgetSlot) -> &mut Widget {
        &mut self.widgets[slot.0]
    }
}

/// The whole editable workflow.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkflowGraph {
    nodes: Vec<GraphNode>,
    next_id: u64,
    /// On-disk path of the workflow, once saved or opened.
    pub filename: Option<String>,
    #[serde(skip)]
    dirty: bool,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node built from a freshly allocated id.
    pub fn add(&mut self, build: impl FnOnce(NodeId) -> GraphNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push(build(id));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
        self.nodes.iter_mut()
    }

    pub fn nodes_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a GraphNode> {
        self.nodes.iter().filter(move |n| n.type_name == type_name)
    }

    pub fn ids_of_type(&self, type_name: &str) -> Vec<NodeId> {
        self.nodes_of_type(type_name).map(|n| n.id).collect()
    }

    pub fn remove(&mut self, id: NodeId) -> Option<GraphNode> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        self.dirty = true;
        Some(self.nodes.remove(index))
    }

    /// Flag the canvas for redraw after a programmatic widget change.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Read and clear the redraw flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// JSON form shipped to the server with the save-and-shutdown trigger.
    pub fn serialize(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("failed to serialize workflow")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write workflow to {}", path.display()))?;
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read workflow from {}", path.display()))?;
        let mut graph: Self =
            serde_json::from_str(&json).context("failed to parse workflow file")?;
        graph.filename = Some(path.display().to_string());
        Ok(graph)
    }
}

/// Prompt list node with template save/load support.
pub fn prompt_list_node(id: NodeId, position: (f32, f32)) -> GraphNode {
    let mut node = GraphNode::new(id, PROMPT_LIST_NODE, "Prompt List (Templates)", position);
    node.widgets = vec![
        Widget::multiline("prompt_1", ""),
        Widget::multiline("prompt_2", ""),
        Widget::multiline("prompt_3", ""),
        Widget::multiline("prompt_4", ""),
        Widget::multiline("prompt_5", ""),
        Widget::choice("template_file", &[NO_TEMPLATE], NO_TEMPLATE),
        Widget::text("save_filename", ""),
    ];
    node
}

/// Wildcard manager node; the selection list is refreshed from the server.
pub fn wildcard_node(id: NodeId, position: (f32, f32)) -> GraphNode {
    let mut node = GraphNode::new(id, WILDCARD_NODE, "Wildcard Manager", position);
    node.widgets = vec![
        Widget::choice("wildcards_list", &[CREATE_NEW], CREATE_NEW),
        Widget::multiline(
            "text",
            "A {1$$cute|big|small} {3::cat|dog} is sitting on the __object__.",
        ),
        Widget::choice(
            "processing_mode",
            &["entire text as one", "line by line"],
            "entire text as one",
        ),
        Widget::multiline("processed_text_preview", ""),
        Widget::number("seed", 0.0),
    ];
    node
}

/// Selector node whose reset toggle is cleared after every run.
pub fn list_selector_node(id: NodeId, position: (f32, f32)) -> GraphNode {
    let mut node = GraphNode::new(id, LIST_SELECTOR_NODE, "List Selector", position);
    node.widgets = vec![
        Widget::multiline("values", ""),
        Widget::number("index", 0.0),
        Widget::boolean("reset_counter", false),
    ];
    node
}

/// Save-and-shutdown node; parameters are echoed back by the server when it
/// executes.
pub fn shutdown_node(id: NodeId, position: (f32, f32)) -> GraphNode {
    let mut node = GraphNode::new(id, SHUTDOWN_NODE, "Save Workflow & Shutdown", position);
    node.widgets = vec![
        Widget::boolean("enabled", false),
        Widget::number("delay_seconds", 60.0),
        Widget::boolean("save_workflow", true),
        Widget::choice(
            "save_mode",
            &["Overwrite Existing File", "Save as New Timestamped File"],
            "Overwrite Existing File",
        ),
        Widget::text("filename_prefix", "workflow_autosave.json"),
    ];
    node
}
