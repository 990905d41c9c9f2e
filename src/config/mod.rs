//! Process-wide forwarding configuration.
//!
//! [`ForwarderConfig`] is built once at startup from CLI flags / environment
//! variables and shared read-only for the lifetime of the process. The
//! credential and base id are optional here: the process starts without them
//! and every tracked submission is answered with `Misconfigured` until they
//! are supplied.
//! [`validation::resolve_target`] turns a config into a sendable
//! [`TableTarget`].

pub mod validation;

use url::Url;

use crate::cli::ForwarderArgs;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com";
pub const DEFAULT_TABLE_NAME: &str = "Applications";
pub const DEFAULT_FORM_NAME: &str = "apply";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwarderConfig {
    pub api_key: Option<String>,
    pub base_id: Option<String>,
    pub table_name: String,
    pub api_url: String,
    pub form_name: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_id: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            form_name: DEFAULT_FORM_NAME.to_string(),
        }
    }
}

impl From<&ForwarderArgs> for ForwarderConfig {
    fn from(args: &ForwarderArgs) -> Self {
        Self {
            api_key: args.api_key.clone(),
            base_id: args.base_id.clone(),
            table_name: args.table.clone(),
            api_url: args.api_url.clone(),
            form_name: args.form_name.clone(),
        }
    }
}

/// Fully-resolved destination for record creation.
#[derive(Clone, PartialEq, Eq)]
pub struct TableTarget {
    pub endpoint: Url,
    pub api_key: String,
}

// Keeps the bearer credential out of logs.
impl std::fmt::Debug for TableTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableTarget")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"***")
            .finish()
    }
}
