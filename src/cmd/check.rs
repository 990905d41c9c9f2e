//! `formrelay check` — verify the forwarding configuration.
//!
//! Resolves the record-creation endpoint from flags / environment and
//! reports every problem found, in human-readable text or JSON.

use crate::cli::{CheckArgs, ReportFormat};
use crate::config::validation;
use crate::config::ForwarderConfig;
use crate::error::FormrelayError;

pub fn execute(args: &CheckArgs) -> Result<(), FormrelayError> {
    let config = ForwarderConfig::from(&args.forwarder);

    let target = match validation::resolve_target(&config) {
        Ok(target) => target,
        Err(errors) => {
            match args.format {
                ReportFormat::Text => {
                    eprintln!("\u{2717} configuration has {} errors\n", errors.len());
                    for error in &errors {
                        eprintln!("{error}");
                    }
                }
                ReportFormat::Json => {
                    let json_errors: Vec<serde_json::Value> = errors
                        .iter()
                        .map(|e| {
                            serde_json::json!({
                                "setting": e.setting,
                                "env": e.env,
                                "message": e.message,
                                "suggestion": e.suggestion,
                            })
                        })
                        .collect();
                    println!(
                        "{}",
                        serde_json::json!({
                            "valid": false,
                            "errors": json_errors,
                        })
                    );
                }
            }
            return Err(FormrelayError::ConfigValidation { errors });
        }
    };

    match args.format {
        ReportFormat::Text => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&config, &target)
            );
        }
        ReportFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "form": config.form_name,
                    "endpoint": target.endpoint.as_str(),
                })
            );
        }
    }

    Ok(())
}
