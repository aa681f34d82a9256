//! labdesk: Labstep workspaces as tables
//!
//! [`QueryInfo`] binds an authenticated [`LabSession`] to one workspace and
//! flattens its experiments, protocols, resources, devices and resource
//! categories into [`Table`]s. [`EditResources`] adds resource creation.
//!
//! # Example
//!
//! ```ignore
//! use labdesk::{Credentials, EditResources, LabstepSession};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let creds = Credentials::new("ada@lab.org", "api-key", "notebook");
//!     let session = LabstepSession::authenticate(creds.clone(), "https://api.labstep.com").await?;
//!     let edit = EditResources::new(session, creds, Some("Virology")).await?;
//!     println!("{}", edit.get_resources().await?);
//!     edit.add_new_resource(Some("Widget"), Some("General"), None).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod edit;
pub mod error;
pub mod format;
pub mod labstep;
pub mod models;
pub mod query;
pub mod session;
pub mod table;

pub use edit::EditResources;
pub use error::{LabError, Result};
pub use labstep::auth::Credentials;
pub use labstep::session::LabstepSession;
pub use query::{DeviceKey, QueryInfo, DEFAULT_WORKSPACE};
pub use session::LabSession;
pub use table::{Cell, Table};
