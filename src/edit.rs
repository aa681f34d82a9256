//! Workspace edits
//!
//! [`EditResources`] adds resource creation on top of [`QueryInfo`]. Every read
//! accessor stays available through `Deref`.

use crate::error::{LabError, Result};
use crate::labstep::auth::Credentials;
use crate::models::CreatedResource;
use crate::query::{QueryInfo, CATEGORY_ID_COLUMN, CATEGORY_NAME_COLUMN};
use crate::session::LabSession;
use crate::table::Cell;
use std::ops::Deref;

/// Read/write access to one workspace
pub struct EditResources<S> {
    query: QueryInfo<S>,
}

impl<S: LabSession> EditResources<S> {
    /// Bind `session` to a workspace, exactly like [`QueryInfo::new`].
    ///
    /// The session's active workspace is left alone; writes carry the bound
    /// workspace id explicitly. Call [`activate_workspace`](Self::activate_workspace)
    /// if other tooling sharing the account relies on the session default.
    pub async fn new(
        session: S,
        credentials: Credentials,
        workspace_name: Option<&str>,
    ) -> Result<Self> {
        let query = QueryInfo::new(session, credentials, workspace_name).await?;
        Ok(Self { query })
    }

    /// Make the bound workspace the session's active workspace
    pub async fn activate_workspace(&self) -> Result<()> {
        self.query
            .session()
            .set_active_workspace(self.query.workspace_id())
            .await?;
        Ok(())
    }

    /// Create a resource called `resource_name` under the category called
    /// `resource_category_name`.
    ///
    /// `alert_threshold` is accepted but not sent to the service yet.
    pub async fn add_new_resource(
        &self,
        resource_name: Option<&str>,
        resource_category_name: Option<&str>,
        alert_threshold: Option<i64>,
    ) -> Result<CreatedResource> {
        let (Some(name), Some(category_name)) = (
            resource_name.filter(|s| !s.trim().is_empty()),
            resource_category_name.filter(|s| !s.trim().is_empty()),
        ) else {
            return Err(LabError::InvalidArgument(
                "resource name and category name must be provided".to_string(),
            ));
        };

        let categories = self.query.get_resource_category_id().await?;
        let category_id = categories
            .find_row(CATEGORY_NAME_COLUMN, &Cell::from(category_name))
            .and_then(|row| {
                let idx = categories.column_index(CATEGORY_ID_COLUMN)?;
                row[idx].as_int()
            })
            .ok_or_else(|| {
                LabError::NotFound(format!("resource category '{}' not found", category_name))
            })?;

        if let Some(threshold) = alert_threshold {
            tracing::warn!(
                "Alert threshold {} for '{}' was not applied; creation does not send it",
                threshold,
                name
            );
        }

        let workspace_id = self.query.workspace_id();
        let resource = self
            .query
            .session()
            .create_resource(workspace_id, name, category_id)
            .await?;

        tracing::info!("Resource '{}' created with ID: {}", name, resource.id);

        Ok(CreatedResource {
            id: resource.id,
            name: name.to_string(),
            category_id,
            workspace_id,
        })
    }
}

impl<S> Deref for EditResources<S> {
    type Target = QueryInfo<S>;

    fn deref(&self) -> &Self::Target {
        &self.query
    }
}
