//! Named text resources stored by the server.
//!
//! Two families share one management pattern: prompt template files (five
//! text slots each) and wildcard files (one text blob). Routes differ per
//! namespace; list/fetch/save/delete behavior is the same shape. All
//! operations run on detached worker threads and report back over a channel,
//! tagged with the node they belong to, so the UI thread never blocks on the
//! network.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::mpsc::Sender;
use std::thread;

use crate::app::server_api::{ApiError, ServerApi};
use crate::app::workflow::NodeId;

/// Placeholder selection meaning "no template chosen".
pub const NO_TEMPLATE: &str = "None";
/// Placeholder selection that opens a blank editor instead of loading a file.
pub const CREATE_NEW: &str = "[Create New]";

/// Endpoint receiving the serialized workflow when a shutdown node fires.
pub const SHUTDOWN_TRIGGER_PATH: &str = "save_and_shutdown/trigger";

fn encode(filename: &str) -> String {
    utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string()
}

/// Route table for one template namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateRoutes {
    prefix: &'static str,
}

impl TemplateRoutes {
    pub fn easyuse() -> Self {
        Self { prefix: "easyuse" }
    }

    pub fn santodan() -> Self {
        Self { prefix: "santodan" }
    }

    pub fn namespace(&self) -> &'static str {
        self.prefix
    }

    pub fn list_path(&self) -> String {
        format!("{}/get_prompt_lists", self.prefix)
    }

    pub fn save_path(&self) -> String {
        format!("{}/save_prompt_list", self.prefix)
    }

    pub fn view_path(&self, filename: &str) -> String {
        format!(
            "{}/view_prompt_list?filename={}",
            self.prefix,
            encode(filename)
        )
    }

    pub fn delete_path(&self) -> String {
        format!("{}/delete_prompt_list", self.prefix)
    }
}

/// Route table for one wildcard namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WildcardRoutes {
    prefix: &'static str,
}

impl WildcardRoutes {
    pub fn santodan() -> Self {
        Self { prefix: "santodan" }
    }

    pub fn namespace(&self) -> &'static str {
        self.prefix
    }

    pub fn list_path(&self) -> String {
        format!("{}/wildcards", self.prefix)
    }

    pub fn content_path(&self, filename: &str) -> String {
        format!(
            "{}/wildcard-content?filename={}",
            self.prefix,
            encode(filename)
        )
    }

    pub fn save_path(&self) -> String {
        format!("{}/wildcard-save", self.prefix)
    }

    pub fn delete_path(&self) -> String {
        format!("{}/wildcard-delete", self.prefix)
    }
}

/// The five text slots stored in a template file. Slots missing from a
/// fetched file deserialize to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateContent {
    #[serde(default)]
    pub prompt_1: String,
    #[serde(default)]
    pub prompt_2: String,
    #[serde(default)]
    pub prompt_3: String,
    #[serde(default)]
    pub prompt_4: String,
    #[serde(default)]
    pub prompt_5: String,
}

impl TemplateContent {
    pub const SLOT_NAMES: [&'static str; 5] =
        ["prompt_1", "prompt_2", "prompt_3", "prompt_4", "prompt_5"];

    pub fn slots(&self) -> [&str; 5] {
        [
            &self.prompt_1,
            &self.prompt_2,
            &self.prompt_3,
            &self.prompt_4,
            &self.prompt_5,
        ]
    }

    pub fn from_slots(slots: [String; 5]) -> Self {
        let [prompt_1, prompt_2, prompt_3, prompt_4, prompt_5] = slots;
        Self {
            prompt_1,
            prompt_2,
            prompt_3,
            prompt_4,
            prompt_5,
        }
    }
}

/// Append the `.json` extension when absent, mirroring what the server does
/// before writing a template.
pub fn canonical_template_name(name: &str) -> String {
    if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{}.json", name)
    }
}

/// The server appends `.txt` to every saved wildcard file, so a typed
/// `.txt` suffix is dropped before the request to avoid a double extension.
pub fn canonical_wildcard_name(name: &str) -> String {
    name.strip_suffix(".txt").unwrap_or(name).to_string()
}

/// Nested names come back with whichever separator the server's platform
/// uses, so existence comparison treats `\` and `/` as the same.
pub fn names_collide(a: &str, b: &str) -> bool {
    a.replace('\\', "/") == b.replace('\\', "/")
}

pub fn list_contains(names: &[String], candidate: &str) -> bool {
    names.iter().any(|name| names_collide(name, candidate))
}

fn name_list(value: Value) -> Result<Vec<String>, ApiError> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()),
        other => Err(ApiError::Transport(format!(
            "expected a name array, got: {}",
            other
        ))),
    }
}

/// Completion of one template-store operation.
#[derive(Debug)]
pub enum TemplateEvent {
    Listed {
        node: NodeId,
        result: Result<Vec<String>, ApiError>,
    },
    Fetched {
        node: NodeId,
        name: String,
        result: Result<TemplateContent, ApiError>,
    },
    Saved {
        node: NodeId,
        name: String,
        result: Result<(), ApiError>,
    },
    Deleted {
        node: NodeId,
        name: String,
        result: Result<(), ApiError>,
    },
}

/// Asynchronous access to one template namespace.
#[derive(Debug, Clone)]
pub struct TemplateClient {
    api: ServerApi,
    routes: TemplateRoutes,
}

impl TemplateClient {
    pub fn new(api: ServerApi, routes: TemplateRoutes) -> Self {
        Self { api, routes }
    }

    pub fn routes(&self) -> &TemplateRoutes {
        &self.routes
    }

    pub fn list(&self, node: NodeId, tx: &Sender<TemplateEvent>) {
        let api = self.api.clone();
        let path = self.routes.list_path();
        let tx = tx.clone();
        thread::spawn(move || {
            let result = api.get_json(&path).and_then(name_list);
            let _ = tx.send(TemplateEvent::Listed { node, result });
        });
    }

    pub fn fetch(&self, node: NodeId, name: &str, tx: &Sender<TemplateEvent>) {
        let api = self.api.clone();
        let path = self.routes.view_path(name);
        let name = name.to_string();
        let tx = tx.clone();
        thread::spawn(move || {
            let result = api.get_json(&path).and_then(|value| {
                serde_json::from_value(value)
                    .map_err(|e| ApiError::Transport(format!("bad template body: {}", e)))
            });
            let _ = tx.send(TemplateEvent::Fetched { node, name, result });
        });
    }

    pub fn save(
        &self,
        node: NodeId,
        name: &str,
        content: TemplateContent,
        tx: &Sender<TemplateEvent>,
    ) {
        let api = self.api.clone();
        let path = self.routes.save_path();
        let name = name.to_string();
        let tx = tx.clone();
        thread::spawn(move || {
            let body = json!({ "filename": name, "prompts": content });
            let result = api.post_json(&path, &body).map(|_| ());
            let _ = tx.send(TemplateEvent::Saved { node, name, result });
        });
    }

    pub fn delete(&self, node: NodeId, name: &str, tx: &Sender<TemplateEvent>) {
        let api = self.api.clone();
        let path = self.routes.delete_path();
        let name = name.to_string();
        let tx = tx.clone();
        thread::spawn(move || {
            let body = json!({ "filename": name });
            let result = api.post_json(&path, &body).map(|_| ());
            let _ = tx.send(TemplateEvent::Deleted { node, name, result });
        });
    }
}

/// Completion of one wildcard-store operation.
#[derive(Debug)]
pub enum WildcardEvent {
    Listed {
        node: NodeId,
        result: Result<Vec<String>, ApiError>,
    },
    Fetched {
        node: NodeId,
        name: String,
        result: Result<String, ApiError>,
    },
    Saved {
        node: NodeId,
        name: String,
        result: Result<(), ApiError>,
    },
    Deleted {
        node: NodeId,
        name: String,
        result: Result<(), ApiError>,
    },
}

/// Asynchronous access to one wildcard namespace.
#[derive(Debug, Clone)]
pub struct WildcardClient {
    api: ServerApi,
    routes: WildcardRoutes,
}

impl WildcardClient {
    pub fn new(api: ServerApi, routes: WildcardRoutes) -> Self {
        Self { api, routes }
    }

    pub fn routes(&self) -> &WildcardRoutes {
        &self.routes
    }

    pub fn list(&self, node: NodeId, tx: &Sender<WildcardEvent>) {
        let api = self.api.clone();
        let path = self.routes.list_path();
        let tx = tx.clone();
        thread::spawn(move || {
            let result = api.get_json(&path).and_then(name_list);
            let _ = tx.send(WildcardEvent::Listed { node, result });
        });
    }

    pub fn fetch(&self, node: NodeId, name: &str, tx: &Sender<WildcardEvent>) {
        let api = self.api.clone();
        let path = self.routes.content_path(name);
        let name = name.to_string();
        let tx = tx.clone();
        thread::spawn(move || {
            let result = api.get_json(&path).and_then(|value| {
                value
                    .get("content")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ApiError::Transport("response carried no content field".to_string())
                    })
            });
            let _ = tx.send(WildcardEvent::Fetched { node, name, result });
        });
    }

    pub fn save(&self, node: NodeId, name: &str, content: &str, tx: &Sender<WildcardEvent>) {
        let api = self.api.clone();
        let path = self.routes.save_path();
        let name = name.to_string();
        let content = content.to_string();
        let tx = tx.clone();
        thread::spawn(move || {
            let body = json!({ "filename": name, "content": content });
            let result = api.post_json(&path, &body).map(|_| ());
            let _ = tx.send(WildcardEvent::Saved { node, name, result });
        });
    }

    pub fn delete(&self, node: NodeId, name: &str, tx: &Sender<WildcardEvent>) {
        let api = self.api.clone();
        let path = self.routes.delete_path();
        let name = name.to_string();
        let tx = tx.clone();
        thread::spawn(move || {
            let body = json!({ "filename": name });
            let result = api.delete_json(&path, &body);
            let _ = tx.send(WildcardEvent::Deleted { node, name, result });
        });
    }
}
