//! Labstep Authentication
//!
//! Labstep authenticates every request with an API key sent in the `apikey`
//! header. Credentials come from the config file or the environment.

use std::fmt;

/// Default API root
pub const DEFAULT_API_URL: &str = "https://api.labstep.com";

/// Environment variables consulted when nothing is configured
pub const ENV_EMAIL: &str = "LABSTEP_EMAIL";
pub const ENV_API_KEY: &str = "LABSTEP_API_KEY";
pub const ENV_API_NAME: &str = "LABSTEP_API_NAME";
pub const ENV_API_URL: &str = "LABSTEP_API_URL";

/// User credentials for the Labstep API
///
/// `api_name` is kept for reference only; it is never sent.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub api_key: String,
    pub api_name: String,
}

impl Credentials {
    pub fn new(email: &str, api_key: &str, api_name: &str) -> Self {
        Self {
            email: email.to_string(),
            api_key: api_key.to_string(),
            api_name: api_name.to_string(),
        }
    }
}

// Security: never print the API key, even in debug logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_key", &"<redacted>")
            .field("api_name", &self.api_name)
            .finish()
    }
}

/// Loose sanity check on an email address: one `@`, non-empty local part,
/// a dot somewhere in the domain, no whitespace
pub fn validate_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read the user email from the environment
/// Security: Validates the format before returning
pub fn get_default_email() -> Option<String> {
    let email = non_empty_env(ENV_EMAIL)?;
    if validate_email(&email) {
        Some(email)
    } else {
        tracing::warn!("Invalid email format in {}", ENV_EMAIL);
        None
    }
}

pub fn get_default_api_key() -> Option<String> {
    non_empty_env(ENV_API_KEY)
}

pub fn get_default_api_name() -> Option<String> {
    non_empty_env(ENV_API_NAME)
}

pub fn get_default_api_url() -> Option<String> {
    non_empty_env(ENV_API_URL)
}
