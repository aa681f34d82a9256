//! Session collaborator
//!
//! [`LabSession`] is the seam between the facade and whatever talks to the
//! Labstep service. [`LabstepSession`](crate::labstep::session::LabstepSession)
//! is the HTTP implementation; tests plug in an in-memory one.

use crate::models::{Device, Experiment, Protocol, Resource, ResourceCategory, Workspace};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// An authenticated session against the workspace service
#[async_trait]
pub trait LabSession: Send + Sync {
    /// Workspaces the authenticated user belongs to, in service order
    async fn list_workspaces(&self) -> Result<Vec<Workspace>>;

    async fn get_workspace(&self, workspace_id: i64) -> Result<Workspace>;

    /// Look up a device by id; `Ok(None)` when it does not exist
    async fn get_device(&self, device_id: i64) -> Result<Option<Device>>;

    /// Make `workspace_id` the session-wide default workspace
    async fn set_active_workspace(&self, workspace_id: i64) -> Result<()>;

    async fn create_resource(
        &self,
        workspace_id: i64,
        name: &str,
        category_id: i64,
    ) -> Result<Resource>;

    async fn list_experiments(&self, workspace_id: i64) -> Result<Vec<Experiment>>;

    async fn list_protocols(&self, workspace_id: i64) -> Result<Vec<Protocol>>;

    async fn list_resources(&self, workspace_id: i64) -> Result<Vec<Resource>>;

    async fn list_devices(&self, workspace_id: i64) -> Result<Vec<Device>>;

    async fn list_resource_categories(&self, workspace_id: i64) -> Result<Vec<ResourceCategory>>;

    async fn list_device_bookings(&self, device: &Device) -> Result<Vec<Value>>;

    async fn get_device_category(&self, device: &Device) -> Result<Value>;
}
