//! Labstep session over HTTP
//!
//! Implements [`LabSession`] against the Labstep generic REST endpoints.

use super::auth::Credentials;
use super::http::{add_query_params, api_status, LabHttpClient};
use crate::models::{Device, Experiment, Protocol, Resource, ResourceCategory, Workspace};
use crate::session::LabSession;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

/// Page size requested from list endpoints
const PAGE_SIZE: usize = 100;

/// Generic entity names used in endpoint paths
mod entity {
    pub const USER: &str = "user";
    pub const WORKSPACE: &str = "group";
    pub const EXPERIMENT: &str = "experiment_workflow";
    pub const PROTOCOL: &str = "protocol_collection";
    pub const RESOURCE: &str = "resource";
    pub const RESOURCE_CATEGORY: &str = "resource_template";
    pub const DEVICE: &str = "device";
    pub const DEVICE_BOOKING: &str = "device_booking";
}

/// An authenticated Labstep user session
#[derive(Clone)]
pub struct LabstepSession {
    http: LabHttpClient,
    credentials: Credentials,
    base_url: String,
    user_id: i64,
}

impl LabstepSession {
    /// Authenticate against `base_url` and fetch the user record
    pub async fn authenticate(credentials: Credentials, base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).context("Invalid Labstep API URL")?;
        let base_url = parsed.as_str().trim_end_matches('/').to_string();
        let http = LabHttpClient::new()?;

        let url = format!(
            "{}/api/generic/{}/{}",
            base_url,
            entity::USER,
            urlencoding::encode(&credentials.email)
        );
        let user = http
            .get(&url, &credentials.api_key)
            .await
            .context("Failed to authenticate with Labstep")?;

        let user_id = user
            .get("id")
            .and_then(|v| v.as_i64())
            .context("User record has no id")?;

        tracing::info!("Authenticated as {} (user {})", credentials.email, user_id);

        Ok(Self {
            http,
            credentials,
            base_url,
            user_id,
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Build a generic entity URL
    fn entity_url(&self, entity: &str) -> String {
        format!("{}/api/generic/{}", self.base_url, entity)
    }

    fn entity_item_url(&self, entity: &str, id: i64) -> String {
        format!("{}/{}", self.entity_url(entity), id)
    }

    async fn get(&self, url: &str) -> Result<Value> {
        self.http.get(url, &self.credentials.api_key).await
    }

    /// Fetch every item of a list endpoint, following `next_cursor`
    async fn list_all<T: DeserializeOwned>(
        &self,
        entity: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let base = add_query_params(&self.entity_url(entity), filters);
        let mut all_items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = vec![("count", PAGE_SIZE.to_string())];
            if let Some(ref c) = cursor {
                params.push(("cursor", c.clone()));
            }
            let url = add_query_params(&base, &params);
            let response = self.get(&url).await?;

            let items = response
                .get("items")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            for item in items {
                let parsed = serde_json::from_value(item)
                    .with_context(|| format!("Failed to parse {} record", entity))?;
                all_items.push(parsed);
            }

            cursor = response
                .get("next_cursor")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
            if cursor.is_none() {
                break;
            }
        }

        tracing::debug!("Fetched {} {} records", all_items.len(), entity);
        Ok(all_items)
    }

    async fn list_in_workspace<T: DeserializeOwned>(
        &self,
        entity: &str,
        workspace_id: i64,
    ) -> Result<Vec<T>> {
        self.list_all(entity, &[("group_id", workspace_id.to_string())])
            .await
    }
}

#[async_trait]
impl LabSession for LabstepSession {
    async fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        self.list_all(entity::WORKSPACE, &[("user_id", self.user_id.to_string())])
            .await
            .context("Failed to list workspaces")
    }

    async fn get_workspace(&self, workspace_id: i64) -> Result<Workspace> {
        let url = self.entity_item_url(entity::WORKSPACE, workspace_id);
        let value = self
            .get(&url)
            .await
            .with_context(|| format!("Failed to fetch workspace {}", workspace_id))?;
        serde_json::from_value(value).context("Failed to parse workspace record")
    }

    async fn get_device(&self, device_id: i64) -> Result<Option<Device>> {
        let url = self.entity_item_url(entity::DEVICE, device_id);
        match self.get(&url).await {
            Ok(value) => {
                let device = serde_json::from_value(value).context("Failed to parse device record")?;
                Ok(Some(device))
            }
            Err(e) if api_status(&e) == Some(StatusCode::NOT_FOUND) => Ok(None),
            Err(e) => Err(e.context(format!("Failed to fetch device {}", device_id))),
        }
    }

    async fn set_active_workspace(&self, workspace_id: i64) -> Result<()> {
        let url = self.entity_item_url(entity::USER, self.user_id);
        let body = json!({ "group_id": workspace_id });
        self.http
            .put(&url, &self.credentials.api_key, Some(&body))
            .await
            .with_context(|| format!("Failed to set active workspace {}", workspace_id))?;
        Ok(())
    }

    async fn create_resource(
        &self,
        workspace_id: i64,
        name: &str,
        category_id: i64,
    ) -> Result<Resource> {
        let url = self.entity_url(entity::RESOURCE);
        let body = json!({
            "name": name,
            "template_id": category_id,
            "group_id": workspace_id,
        });
        let value = self
            .http
            .post(&url, &self.credentials.api_key, Some(&body))
            .await
            .with_context(|| format!("Failed to create resource '{}'", name))?;
        serde_json::from_value(value).context("Failed to parse created resource")
    }

    async fn list_experiments(&self, workspace_id: i64) -> Result<Vec<Experiment>> {
        self.list_in_workspace(entity::EXPERIMENT, workspace_id).await
    }

    async fn list_protocols(&self, workspace_id: i64) -> Result<Vec<Protocol>> {
        self.list_in_workspace(entity::PROTOCOL, workspace_id).await
    }

    async fn list_resources(&self, workspace_id: i64) -> Result<Vec<Resource>> {
        self.list_in_workspace(entity::RESOURCE, workspace_id).await
    }

    async fn list_devices(&self, workspace_id: i64) -> Result<Vec<Device>> {
        self.list_in_workspace(entity::DEVICE, workspace_id).await
    }

    async fn list_resource_categories(&self, workspace_id: i64) -> Result<Vec<ResourceCategory>> {
        self.list_in_workspace(entity::RESOURCE_CATEGORY, workspace_id)
            .await
    }

    async fn list_device_bookings(&self, device: &Device) -> Result<Vec<Value>> {
        self.list_all(entity::DEVICE_BOOKING, &[("device_id", device.id.to_string())])
            .await
    }

    async fn get_device_category(&self, device: &Device) -> Result<Value> {
        Ok(device.template.clone().unwrap_or(Value::Null))
    }
}
