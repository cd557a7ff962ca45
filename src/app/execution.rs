//! Execution feedback pushed by the workflow host.
//!
//! The server wraps every scalar in a node's execution output in a
//! single-element array; the accessors here unwrap that before anything
//! else looks at the values. Absent keys mean "not applicable", never an
//! error.

use serde_json::Value;

use crate::app::workflow::NodeId;

/// Per-node payload attached to one execution update.
#[derive(Debug, Clone, Default)]
pub struct ExecutionMessage(serde_json::Map<String, Value>);

impl ExecutionMessage {
    pub fn new(fields: serde_json::Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn first(&self, key: &str) -> Option<&Value> {
        self.0.get(key)?.as_array()?.first()
    }

    /// First element of a singleton-array value, as a bool.
    pub fn first_bool(&self, key: &str) -> Option<bool> {
        self.first(key)?.as_bool()
    }

    /// First element of a singleton-array value, as an integer.
    pub fn first_i64(&self, key: &str) -> Option<i64> {
        self.first(key)?.as_i64()
    }

    /// First element of a singleton-array value, as a string.
    pub fn first_str(&self, key: &str) -> Option<&str> {
        self.first(key)?.as_str()
    }

    /// The preview lines for this node, when the update carries any.
    /// Non-string entries are skipped.
    pub fn preview_list(&self) -> Option<Vec<String>> {
        let lines = self.0.get("preview_list")?.as_array()?;
        Some(
            lines
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    }
}

/// Save-and-shutdown parameters, unwrapped from their singleton arrays.
///
/// Defaults for the optional keys mirror what the server assumes when a
/// trigger request omits them.
#[derive(Debug, Clone, PartialEq)]
pub struct ShutdownParams {
    pub enabled: bool,
    pub delay: i64,
    pub save_workflow: bool,
    pub save_mode: String,
    pub filename_prefix: String,
}

impl ShutdownParams {
    /// `None` when the message carries no `enabled` key, i.e. the update is
    /// not a shutdown-node report.
    pub fn from_message(message: &ExecutionMessage) -> Option<Self> {
        let enabled = message.first_bool("enabled")?;
        Some(Self {
            enabled,
            delay: message.first_i64("delay").unwrap_or(60),
            save_workflow: message.first_bool("save_workflow").unwrap_or(true),
            save_mode: message
                .first_str("save_mode")
                .unwrap_or("Save as New Timestamped File")
                .to_string(),
            filename_prefix: message
                .first_str("filename_prefix")
                .unwrap_or("workflow_autosave.json")
                .to_string(),
        })
    }

    /// The `params` object of the trigger request body.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "enabled": self.enabled,
            "delay": self.delay,
            "save_workflow": self.save_workflow,
            "save_mode": self.save_mode,
            "filename_prefix": self.filename_prefix,
        })
    }
}

/// Event pushed into the app by whatever is listening to the host.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// One node produced output during a run.
    NodeExecuted {
        node: NodeId,
        message: ExecutionMessage,
    },
    /// The host finished a run over the whole graph.
    RunCompleted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(value: Value) -> ExecutionMessage {
        ExecutionMessage::from_value(value).unwrap()
    }

    #[test]
    fn singleton_arrays_unwrap_to_scalars() {
        let msg = message(json!({
            "enabled": [true],
            "delay": [5],
            "save_workflow": [true],
            "save_mode": ["full"],
            "filename_prefix": ["wf"],
        }));
        let params = ShutdownParams::from_message(&msg).unwrap();
        assert_eq!(
            params,
            ShutdownParams {
                enabled: true,
                delay: 5,
                save_workflow: true,
                save_mode: "full".to_string(),
                filename_prefix: "wf".to_string(),
            }
        );
    }

    #[test]
    fn absent_enabled_key_means_not_applicable() {
        let msg = message(json!({ "preview_list": ["a", "b"] }));
        assert!(ShutdownParams::from_message(&msg).is_none());
    }

    #[test]
    fn non_array_enabled_is_ignored() {
        let msg = message(json!({ "enabled": true }));
        assert!(ShutdownParams::from_message(&msg).is_none());
    }

    #[test]
    fn preview_list_keeps_order_and_skips_non_strings() {
        let msg = message(json!({ "preview_list": ["first", 2, "third"] }));
        assert_eq!(
            msg.preview_list().unwrap(),
            vec!["first".to_string(), "third".to_string()]
        );
        assert!(message(json!({})).preview_list().is_none());
    }
}
