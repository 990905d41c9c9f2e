//! Configuration validation with detailed error reporting.
//!
//! [`resolve_target`] checks a [`ForwarderConfig`] for missing credentials,
//! missing base/table identifiers and an unusable API URL, and builds the
//! record-creation endpoint. Every problem is reported, not just the first,
//! so `formrelay check` can list them all at once.

use url::Url;

use super::{ForwarderConfig, TableTarget};
use crate::error::ValidationError;

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Validate the API base URL. Returns the parsed URL or a human-readable error.
pub fn validate_api_url(url: &str) -> Result<Url, String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else if parsed.cannot_be_a_base() {
                Err(format!("'{url}' cannot be used as a base URL"))
            } else {
                Ok(parsed)
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

/// Build `{api_url}/v0/{base_id}/{table}` with each segment percent-encoded.
#[must_use]
pub fn record_endpoint(api_url: &Url, base_id: &str, table: &str) -> Url {
    let mut endpoint = api_url.clone();
    if let Ok(mut segments) = endpoint.path_segments_mut() {
        segments.pop_if_empty().push("v0").push(base_id).push(table);
    }
    endpoint
}

pub fn resolve_target(config: &ForwarderConfig) -> Result<TableTarget, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let api_key = present(config.api_key.as_deref());
    if api_key.is_none() {
        errors.push(ValidationError {
            setting: "api key".into(),
            env: "AIRTABLE_API_KEY",
            message: "no API credential configured".into(),
            suggestion: Some("create a personal access token with data.records:write".into()),
        });
    }

    let base_id = present(config.base_id.as_deref());
    if base_id.is_none() {
        errors.push(ValidationError {
            setting: "base id".into(),
            env: "AIRTABLE_BASE_ID",
            message: "no base identifier configured".into(),
            suggestion: Some("base ids start with 'app'".into()),
        });
    }

    let table = present(Some(config.table_name.as_str()));
    if table.is_none() {
        errors.push(ValidationError {
            setting: "table name".into(),
            env: "AIRTABLE_TABLE_NAME",
            message: "table name cannot be empty".into(),
            suggestion: Some(format!(
                "unset it to use the default '{}'",
                super::DEFAULT_TABLE_NAME
            )),
        });
    }

    let api_url = match validate_api_url(config.api_url.trim()) {
        Ok(url) => Some(url),
        Err(msg) => {
            errors.push(ValidationError {
                setting: "api url".into(),
                env: "AIRTABLE_API_URL",
                message: msg,
                suggestion: None,
            });
            None
        }
    };

    match (api_key, base_id, table, api_url) {
        (Some(api_key), Some(base_id), Some(table), Some(api_url)) => {
            Ok(TableTarget {
                endpoint: record_endpoint(&api_url, base_id, table),
                api_key: api_key.to_string(),
            })
        }
        _ => Err(errors),
    }
}

#[must_use]
pub fn format_validation_report(config: &ForwarderConfig, target: &TableTarget) -> String {
    let lines = [
        format!("  form:     {}", config.form_name),
        format!("  table:    {}", config.table_name.trim()),
        format!("  endpoint: {}", target.endpoint),
    ];
    format!("configuration is valid\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> ForwarderConfig {
        ForwarderConfig {
            api_key: Some("patTEST".into()),
            base_id: Some("appBASE".into()),
            ..ForwarderConfig::default()
        }
    }

    #[test]
    fn complete_config_resolves() {
        let target = resolve_target(&complete_config()).unwrap();
        assert_eq!(
            target.endpoint.as_str(),
            "https://api.airtable.com/v0/appBASE/Applications"
        );
        assert_eq!(target.api_key, "patTEST");
    }

    #[test]
    fn table_name_is_percent_encoded() {
        let config = ForwarderConfig {
            table_name: "Apply Form/2024".into(),
            ..complete_config()
        };
        let target = resolve_target(&config).unwrap();
        assert_eq!(target.endpoint.path(), "/v0/appBASE/Apply%20Form%2F2024");
    }

    #[test]
    fn api_url_with_trailing_slash() {
        let config = ForwarderConfig {
            api_url: "http://127.0.0.1:9000/".into(),
            ..complete_config()
        };
        let target = resolve_target(&config).unwrap();
        assert_eq!(
            target.endpoint.as_str(),
            "http://127.0.0.1:9000/v0/appBASE/Applications"
        );
    }

    #[test]
    fn missing_api_key_fails() {
        let config = ForwarderConfig {
            api_key: None,
            ..complete_config()
        };
        let errors = resolve_target(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].env, "AIRTABLE_API_KEY");
    }

    #[test]
    fn blank_base_id_counts_as_missing() {
        let config = ForwarderConfig {
            base_id: Some("   ".into()),
            ..complete_config()
        };
        let errors = resolve_target(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.env == "AIRTABLE_BASE_ID"));
    }

    #[test]
    fn all_problems_are_reported() {
        let config = ForwarderConfig {
            api_key: None,
            base_id: None,
            table_name: String::new(),
            api_url: "ftp://example.com".into(),
            ..ForwarderConfig::default()
        };
        let errors = resolve_target(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .any(|e| e.message.contains("unsupported scheme 'ftp'")));
    }

    #[test]
    fn garbage_api_url_fails() {
        let config = ForwarderConfig {
            api_url: "not a url".into(),
            ..complete_config()
        };
        let errors = resolve_target(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("not a valid URL")));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let target = resolve_target(&complete_config()).unwrap();
        let rendered = format!("{target:?}");
        assert!(!rendered.contains("patTEST"));
    }
}
