//! Labstep API interaction module
//!
//! HTTP implementation of the [`LabSession`](crate::session::LabSession)
//! collaborator.
//!
//! # Module Structure
//!
//! - [`auth`] - Credentials and environment lookup
//! - [`http`] - HTTP utilities for REST API calls
//! - [`session`] - Authenticated session implementing `LabSession`
//!
//! # Example
//!
//! ```ignore
//! use labdesk::labstep::{auth::Credentials, session::LabstepSession};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let creds = Credentials::new("ada@lab.org", "api-key", "notebook");
//!     let session = LabstepSession::authenticate(creds, "https://api.labstep.com").await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod http;
pub mod session;
