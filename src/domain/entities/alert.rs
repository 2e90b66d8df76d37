//! Alertmanager webhook payload

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlertAnnotations {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub labels: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub annotations: AlertAnnotations,
    #[serde(default)]
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: String,
    #[serde(default, rename = "generatorURL")]
    pub generator_url: String,
}

impl Alert {
    fn label(&self, key: &str) -> Option<String> {
        self.labels.get(key).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// One-line rendering: `[FIRING] alertname: summary - description`
    pub fn render(&self) -> String {
        let mut line = format!("[{}]", self.status.to_uppercase());
        if let Some(name) = self.label("alertname") {
            line.push(' ');
            line.push_str(&name);
            line.push(':');
        }
        if !self.annotations.summary.is_empty() {
            line.push(' ');
            line.push_str(&self.annotations.summary);
        }
        if !self.annotations.description.is_empty() {
            line.push_str(" - ");
            line.push_str(&self.annotations.description);
        }
        line
    }
}

/// Body posted by Alertmanager's webhook receiver
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertmanagerMessage {
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub group_labels: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub common_labels: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub common_annotations: AlertAnnotations,
    #[serde(default, rename = "externalURL")]
    pub external_url: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub group_key: serde_json::Value,
}

impl AlertmanagerMessage {
    /// Text body relayed to the recipient, one line per alert
    pub fn render(&self) -> String {
        if self.alerts.is_empty() {
            return format!("[{}] {}", self.status.to_uppercase(), self.receiver);
        }
        self.alerts
            .iter()
            .map(Alert::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
