//! Workspace queries
//!
//! [`QueryInfo`] binds an authenticated session to one workspace and exposes
//! read accessors that flatten each collection into a [`Table`].

use crate::error::{LabError, Result};
use crate::format::{format_last_updated, or_unknown, threshold_cell, UNKNOWN};
use crate::labstep::auth::Credentials;
use crate::models::{Author, Device, Workspace};
use crate::session::LabSession;
use crate::table::{Cell, Table};
use serde_json::Value;

/// Workspace bound when none is given
pub const DEFAULT_WORKSPACE: &str = "Laboratory for Applied Virology and Precision Medicine";

pub const EXPERIMENT_COLUMNS: &[&str] = &["ID", "Experiment Name", "Author Name", "Author ID"];
pub const PROTOCOL_COLUMNS: &[&str] = &["ID", "Protocol Name", "Author Name", "Author ID"];
pub const RESOURCE_COLUMNS: &[&str] = &[
    "ID",
    "Resource Name",
    "Available Count",
    "Alert Threshold",
    "Last Updated",
];
pub const DEVICE_COLUMNS: &[&str] = &["ID", "Device Name"];
pub const CATEGORY_NAME_COLUMN: &str = "Resource Category Name";
pub const CATEGORY_ID_COLUMN: &str = "Resource Category ID";
pub const RESOURCE_CATEGORY_COLUMNS: &[&str] = &[CATEGORY_NAME_COLUMN, CATEGORY_ID_COLUMN];

/// A device id as supplied by a caller: a number, text to be parsed, or nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKey {
    Id(i64),
    Text(String),
    Missing,
}

impl DeviceKey {
    /// Coerce to an integer id
    pub fn resolve(&self) -> Result<i64> {
        match self {
            DeviceKey::Id(id) => Ok(*id),
            DeviceKey::Text(text) => text.trim().parse().map_err(|_| {
                LabError::InvalidArgument(format!("device id '{}' is not an integer", text))
            }),
            DeviceKey::Missing => Err(LabError::InvalidArgument(
                "device id must be provided".to_string(),
            )),
        }
    }
}

impl From<i64> for DeviceKey {
    fn from(value: i64) -> Self {
        DeviceKey::Id(value)
    }
}

impl From<&str> for DeviceKey {
    fn from(value: &str) -> Self {
        DeviceKey::Text(value.to_string())
    }
}

impl From<String> for DeviceKey {
    fn from(value: String) -> Self {
        DeviceKey::Text(value)
    }
}

impl<T: Into<DeviceKey>> From<Option<T>> for DeviceKey {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DeviceKey::Missing)
    }
}

/// Read access to one workspace
pub struct QueryInfo<S> {
    session: S,
    credentials: Credentials,
    workspace: Workspace,
}

impl<S: LabSession> QueryInfo<S> {
    /// Bind `session` to the workspace called `workspace_name`
    /// ([`DEFAULT_WORKSPACE`] when `None`).
    ///
    /// The first workspace whose name matches exactly is used. Fails with
    /// [`LabError::Configuration`] when none matches.
    pub async fn new(
        session: S,
        credentials: Credentials,
        workspace_name: Option<&str>,
    ) -> Result<Self> {
        let workspace_name = workspace_name.unwrap_or(DEFAULT_WORKSPACE);

        let workspace_id = session
            .list_workspaces()
            .await?
            .into_iter()
            .find(|w| w.name == workspace_name)
            .map(|w| w.id)
            .ok_or_else(|| {
                LabError::Configuration(format!("workspace '{}' not found", workspace_name))
            })?;

        let workspace = session.get_workspace(workspace_id).await?;
        tracing::info!("Bound workspace '{}' ({})", workspace.name, workspace.id);

        Ok(Self {
            session,
            credentials,
            workspace,
        })
    }

    pub fn workspace_id(&self) -> i64 {
        self.workspace.id
    }

    pub fn workspace_name(&self) -> &str {
        &self.workspace.name
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Experiments: ID, Experiment Name, Author Name, Author ID
    pub async fn get_experiment(&self) -> Result<Table> {
        let experiments = self.session.list_experiments(self.workspace.id).await?;

        let mut table = Table::new(EXPERIMENT_COLUMNS);
        for exp in &experiments {
            table.push_row(authored_row(exp.id, exp.name.as_deref(), exp.author.as_ref()));
        }
        Ok(table)
    }

    /// Protocols: ID, Protocol Name, Author Name, Author ID
    pub async fn get_protocol(&self) -> Result<Table> {
        let protocols = self.session.list_protocols(self.workspace.id).await?;

        let mut table = Table::new(PROTOCOL_COLUMNS);
        for protocol in &protocols {
            table.push_row(authored_row(
                protocol.id,
                protocol.name.as_deref(),
                protocol.author.as_ref(),
            ));
        }
        Ok(table)
    }

    /// Resources: ID, Resource Name, Available Count, Alert Threshold, Last Updated
    pub async fn get_resources(&self) -> Result<Table> {
        let resources = self.session.list_resources(self.workspace.id).await?;

        let mut table = Table::new(RESOURCE_COLUMNS);
        for res in &resources {
            table.push_row(vec![
                Cell::Int(res.id),
                or_unknown(res.name.as_deref()),
                Cell::from(res.available_resource_item_count),
                threshold_cell(res.available_resource_item_count_alert_threshold),
                Cell::Text(format_last_updated(res.updated_at.as_deref())),
            ]);
        }
        Ok(table)
    }

    /// Devices: ID, Device Name
    pub async fn get_devices(&self) -> Result<Table> {
        let devices = self.session.list_devices(self.workspace.id).await?;

        let mut table = Table::new(DEVICE_COLUMNS);
        for device in &devices {
            table.push_row(vec![Cell::Int(device.id), or_unknown(device.name.as_deref())]);
        }
        Ok(table)
    }

    /// Raw bookings of one device
    pub async fn get_device_booking(&self, device_id: impl Into<DeviceKey>) -> Result<Vec<Value>> {
        let device = self.lookup_device(device_id.into()).await?;
        Ok(self.session.list_device_bookings(&device).await?)
    }

    /// Raw category of one device
    pub async fn get_device_category(&self, device_id: impl Into<DeviceKey>) -> Result<Value> {
        let device = self.lookup_device(device_id.into()).await?;
        Ok(self.session.get_device_category(&device).await?)
    }

    /// Resource categories: Resource Category Name, Resource Category ID
    ///
    /// Fails with [`LabError::NotFound`] when the workspace has none.
    pub async fn get_resource_category_id(&self) -> Result<Table> {
        let categories = self
            .session
            .list_resource_categories(self.workspace.id)
            .await?;
        if categories.is_empty() {
            return Err(LabError::NotFound(format!(
                "no resource categories in workspace '{}'",
                self.workspace.name
            )));
        }

        let mut table = Table::new(RESOURCE_CATEGORY_COLUMNS);
        for category in &categories {
            table.push_row(vec![Cell::Text(category.name.clone()), Cell::Int(category.id)]);
        }
        Ok(table)
    }

    async fn lookup_device(&self, key: DeviceKey) -> Result<Device> {
        let device_id = key.resolve()?;
        self.session
            .get_device(device_id)
            .await?
            .ok_or_else(|| LabError::NotFound(format!("device {} does not exist", device_id)))
    }
}

fn authored_row(id: i64, name: Option<&str>, author: Option<&Author>) -> Vec<Cell> {
    let author_name = author
        .and_then(|a| a.name.clone())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let author_id = author
        .and_then(|a| a.id)
        .map(|id| id.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());

    vec![
        Cell::Int(id),
        name.map(Cell::from).unwrap_or(Cell::Null),
        Cell::Text(author_name),
        Cell::Text(author_id),
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Experiment, Protocol, Resource, ResourceCategory};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// In-memory session for facade tests
    #[derive(Default)]
    pub(crate) struct FakeSession {
        pub workspaces: Vec<Workspace>,
        pub experiments: Vec<Experiment>,
        pub protocols: Vec<Protocol>,
        pub resources: Vec<Resource>,
        pub devices: Vec<Device>,
        pub categories: Vec<ResourceCategory>,
        pub bookings: Vec<Value>,
        pub created: Mutex<Vec<(i64, String, i64)>>,
        pub active_workspace: Mutex<Option<i64>>,
        pub workspace_calls: Mutex<Vec<i64>>,
    }

    impl FakeSession {
        pub(crate) fn with_workspaces(names: &[(i64, &str)]) -> Self {
            Self {
                workspaces: names
                    .iter()
                    .map(|(id, name)| Workspace {
                        id: *id,
                        name: name.to_string(),
                    })
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl LabSession for FakeSession {
        async fn list_workspaces(&self) -> anyhow::Result<Vec<Workspace>> {
            Ok(self.workspaces.clone())
        }

        async fn get_workspace(&self, workspace_id: i64) -> anyhow::Result<Workspace> {
            self.workspace_calls.lock().unwrap().push(workspace_id);
            self.workspaces
                .iter()
                .find(|w| w.id == workspace_id)
                .cloned()
                .ok_or_else(|| anyhow!("no workspace {}", workspace_id))
        }

        async fn get_device(&self, device_id: i64) -> anyhow::Result<Option<Device>> {
            Ok(self.devices.iter().find(|d| d.id == device_id).cloned())
        }

        async fn set_active_workspace(&self, workspace_id: i64) -> anyhow::Result<()> {
            *self.active_workspace.lock().unwrap() = Some(workspace_id);
            Ok(())
        }

        async fn create_resource(
            &self,
            workspace_id: i64,
            name: &str,
            category_id: i64,
        ) -> anyhow::Result<Resource> {
            let mut created = self.created.lock().unwrap();
            created.push((workspace_id, name.to_string(), category_id));
            Ok(Resource {
                id: 1000 + created.len() as i64,
                name: Some(name.to_string()),
                available_resource_item_count: Some(0),
                available_resource_item_count_alert_threshold: None,
                updated_at: None,
            })
        }

        async fn list_experiments(&self, _: i64) -> anyhow::Result<Vec<Experiment>> {
            Ok(self.experiments.clone())
        }

        async fn list_protocols(&self, _: i64) -> anyhow::Result<Vec<Protocol>> {
            Ok(self.protocols.clone())
        }

        async fn list_resources(&self, _: i64) -> anyhow::Result<Vec<Resource>> {
            Ok(self.resources.clone())
        }

        async fn list_devices(&self, _: i64) -> anyhow::Result<Vec<Device>> {
            Ok(self.devices.clone())
        }

        async fn list_resource_categories(&self, _: i64) -> anyhow::Result<Vec<ResourceCategory>> {
            Ok(self.categories.clone())
        }

        async fn list_device_bookings(&self, device: &Device) -> anyhow::Result<Vec<Value>> {
            Ok(self
                .bookings
                .iter()
                .filter(|b| b["device_id"] == device.id)
                .cloned()
                .collect())
        }

        async fn get_device_category(&self, device: &Device) -> anyhow::Result<Value> {
            Ok(device.template.clone().unwrap_or(Value::Null))
        }
    }

    pub(crate) fn creds() -> Credentials {
        Credentials::new("ada@lab.org", "key", "notebook")
    }

    fn device(id: i64, name: Option<&str>) -> Device {
        Device {
            id,
            name: name.map(String::from),
            template: Some(json!({"id": 5, "name": "Centrifuges"})),
        }
    }

    async fn query(session: FakeSession) -> QueryInfo<FakeSession> {
        QueryInfo::new(session, creds(), Some("Virology")).await.unwrap()
    }

    #[tokio::test]
    async fn test_binds_first_exact_match() {
        let session = FakeSession::with_workspaces(&[(1, "virology"), (2, "Virology"), (3, "Virology")]);
        let q = query(session).await;
        assert_eq!(q.workspace_id(), 2);
        assert_eq!(q.workspace_name(), "Virology");
        assert_eq!(*q.session().workspace_calls.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_missing_workspace_is_configuration_error() {
        let session = FakeSession::with_workspaces(&[(1, "Chemistry")]);
        let err = QueryInfo::new(session, creds(), Some("Virology"))
            .await
            .err()
            .unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Virology"));
    }

    #[tokio::test]
    async fn test_default_workspace_name() {
        let session = FakeSession::with_workspaces(&[(9, DEFAULT_WORKSPACE)]);
        let q = QueryInfo::new(session, creds(), None).await.unwrap();
        assert_eq!(q.workspace_id(), 9);
    }

    #[tokio::test]
    async fn test_get_experiment_defaults_author() {
        let mut session = FakeSession::with_workspaces(&[(1, "Virology")]);
        session.experiments = vec![
            Experiment {
                id: 20,
                name: Some("Plaque assay".into()),
                author: Some(Author {
                    id: Some(4),
                    name: Some("Ada".into()),
                }),
            },
            Experiment {
                id: 21,
                name: Some("qPCR".into()),
                author: None,
            },
            Experiment {
                id: 22,
                name: None,
                author: Some(Author {
                    id: None,
                    name: Some("Grace".into()),
                }),
            },
        ];
        let table = query(session).await.get_experiment().await.unwrap();

        assert_eq!(table.columns(), EXPERIMENT_COLUMNS);
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.rows()[0],
            vec![Cell::Int(20), Cell::from("Plaque assay"), Cell::from("Ada"), Cell::from("4")]
        );
        assert_eq!(table.get(1, "Author Name"), Some(&Cell::from("Unknown")));
        assert_eq!(table.get(1, "Author ID"), Some(&Cell::from("Unknown")));
        assert_eq!(table.get(2, "Experiment Name"), Some(&Cell::Null));
        assert_eq!(table.get(2, "Author ID"), Some(&Cell::from("Unknown")));
    }

    #[tokio::test]
    async fn test_get_protocol_columns() {
        let mut session = FakeSession::with_workspaces(&[(1, "Virology")]);
        session.protocols = vec![Protocol {
            id: 30,
            name: Some("Cell passage".into()),
            author: Some(Author {
                id: Some(8),
                name: None,
            }),
        }];
        let table = query(session).await.get_protocol().await.unwrap();
        assert_eq!(table.columns(), PROTOCOL_COLUMNS);
        assert_eq!(
            table.rows()[0],
            vec![Cell::Int(30), Cell::from("Cell passage"), Cell::from("Unknown"), Cell::from("8")]
        );
    }

    #[tokio::test]
    async fn test_get_resources_formats_rows() {
        let mut session = FakeSession::with_workspaces(&[(1, "Virology")]);
        session.resources = vec![
            Resource {
                id: 40,
                name: Some("Pipette tips".into()),
                available_resource_item_count: Some(12),
                available_resource_item_count_alert_threshold: Some(3),
                updated_at: Some("2024-03-05T09:12:44+00:00".into()),
            },
            Resource {
                id: 41,
                name: None,
                available_resource_item_count: None,
                available_resource_item_count_alert_threshold: None,
                updated_at: Some("not a date".into()),
            },
        ];
        let table = query(session).await.get_resources().await.unwrap();

        assert_eq!(table.columns(), RESOURCE_COLUMNS);
        assert_eq!(
            table.rows()[0],
            vec![
                Cell::Int(40),
                Cell::from("Pipette tips"),
                Cell::Int(12),
                Cell::from("3"),
                Cell::from("2024-03-05"),
            ]
        );
        assert_eq!(
            table.rows()[1],
            vec![
                Cell::Int(41),
                Cell::from("Unknown"),
                Cell::Null,
                Cell::from("Unspecified"),
                Cell::from("Invalid date"),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_devices_empty_keeps_columns() {
        let session = FakeSession::with_workspaces(&[(1, "Virology")]);
        let table = query(session).await.get_devices().await.unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), DEVICE_COLUMNS);
    }

    #[tokio::test]
    async fn test_get_devices_preserves_order() {
        let mut session = FakeSession::with_workspaces(&[(1, "Virology")]);
        session.devices = vec![device(9, Some("Incubator")), device(3, Some("")), device(5, None)];
        let table = query(session).await.get_devices().await.unwrap();
        let ids: Vec<_> = table.rows().iter().map(|r| r[0].as_int().unwrap()).collect();
        assert_eq!(ids, vec![9, 3, 5]);
        assert_eq!(table.get(1, "Device Name"), Some(&Cell::from("Unknown")));
        assert_eq!(table.get(2, "Device Name"), Some(&Cell::from("Unknown")));
    }

    #[tokio::test]
    async fn test_get_device_booking_coerces_text_id() {
        let mut session = FakeSession::with_workspaces(&[(1, "Virology")]);
        session.devices = vec![device(42, Some("Centrifuge"))];
        session.bookings = vec![
            json!({"id": 1, "device_id": 42}),
            json!({"id": 2, "device_id": 7}),
            json!({"id": 3, "device_id": 42}),
        ];
        let q = query(session).await;

        let by_int = q.get_device_booking(42i64).await.unwrap();
        let by_text = q.get_device_booking("42").await.unwrap();
        let padded = q.get_device_booking(" 42 ").await.unwrap();
        assert_eq!(by_int.len(), 2);
        assert_eq!(by_int, by_text);
        assert_eq!(by_int, padded);
    }

    #[tokio::test]
    async fn test_get_device_booking_errors() {
        let mut session = FakeSession::with_workspaces(&[(1, "Virology")]);
        session.devices = vec![device(42, Some("Centrifuge"))];
        let q = query(session).await;

        assert!(q.get_device_booking(None::<i64>).await.unwrap_err().is_invalid_argument());
        assert!(q.get_device_booking("forty-two").await.unwrap_err().is_invalid_argument());
        assert!(q.get_device_booking(43i64).await.unwrap_err().is_not_found());
        assert!(q.get_device_booking("43").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_get_device_category() {
        let mut session = FakeSession::with_workspaces(&[(1, "Virology")]);
        session.devices = vec![device(42, Some("Centrifuge"))];
        let q = query(session).await;

        let category = q.get_device_category(Some("42")).await.unwrap();
        assert_eq!(category["name"], "Centrifuges");
        assert!(q.get_device_category(None::<String>).await.unwrap_err().is_invalid_argument());
        assert!(q.get_device_category(1i64).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_get_resource_category_id() {
        let mut session = FakeSession::with_workspaces(&[(1, "Virology")]);
        session.categories = vec![
            ResourceCategory {
                id: 7,
                name: "General".into(),
            },
            ResourceCategory {
                id: 8,
                name: "Antibodies".into(),
            },
        ];
        let table = query(session).await.get_resource_category_id().await.unwrap();
        assert_eq!(table.columns(), RESOURCE_CATEGORY_COLUMNS);
        assert_eq!(table.rows()[1], vec![Cell::from("Antibodies"), Cell::Int(8)]);
    }

    #[tokio::test]
    async fn test_get_resource_category_id_empty_is_not_found() {
        let session = FakeSession::with_workspaces(&[(1, "Virology")]);
        let err = query(session).await.get_resource_category_id().await.unwrap_err();
        assert!(err.is_not_found());
    }
}
