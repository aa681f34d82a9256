//! Typed records for Labstep entities
//!
//! These are produced at the session boundary. Fields the API may omit or
//! return as `null` are `Option`s; the facade decides how to render them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A workspace (Labstep "group")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
}

/// Protocols share the experiment shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
}

/// An inventory resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub available_resource_item_count: Option<i64>,
    #[serde(default)]
    pub available_resource_item_count_alert_threshold: Option<i64>,
    /// ISO-8601 timestamp as sent by the API
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Device category, kept opaque
    #[serde(default)]
    pub template: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCategory {
    pub id: i64,
    pub name: String,
}

/// Result of [`EditResources::add_new_resource`](crate::edit::EditResources::add_new_resource)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedResource {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub workspace_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_experiment_tolerates_missing_author() {
        let exp: Experiment = serde_json::from_value(json!({"id": 3, "name": "PCR run"})).unwrap();
        assert_eq!(exp.id, 3);
        assert!(exp.author.is_none());

        let exp: Experiment =
            serde_json::from_value(json!({"id": 4, "name": null, "author": {"name": "Ada"}})).unwrap();
        assert_eq!(exp.name, None);
        assert_eq!(exp.author.unwrap().id, None);
    }

    #[test]
    fn test_resource_ignores_unknown_fields() {
        let res: Resource = serde_json::from_value(json!({
            "id": 10,
            "name": "Pipette tips",
            "available_resource_item_count": 4,
            "updated_at": "2024-03-05T09:12:44+00:00",
            "entity_name": "resource"
        }))
        .unwrap();
        assert_eq!(res.available_resource_item_count, Some(4));
        assert_eq!(res.available_resource_item_count_alert_threshold, None);
    }
}
