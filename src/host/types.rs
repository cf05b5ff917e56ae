use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Boolean,
    Number,
    String,
}

/// Option registered with the host so it can be parsed and persisted there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SettingKind,
    pub description: String,
    pub default: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainMock {
    pub id: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub routes_variants: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainRoute {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub delay: Option<u64>,
    #[serde(default)]
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainRouteVariant {
    pub id: String,
    #[serde(default)]
    pub route_id: String,
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub delay: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertError {
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
}

/// Condition reported by the host, rendered above the menus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub message: String,
    #[serde(default)]
    pub error: Option<AlertError>,
}

impl Alert {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    pub fn error(
        message: impl Into<String>,
        error_message: impl Into<String>,
        stack: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            error: Some(AlertError {
                message: error_message.into(),
                stack,
            }),
        }
    }
}
