use serde::Serialize;
use webhook_relay_core::{
    config::{AppConfig, LoadOptions},
    webhook::{build_headers, webhook_origin, DEFAULT_AUTH_HEADER},
};

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: format!(
                    "configuration loaded; guild {} watching channel {}",
                    config.discord.guild_id, config.discord.query_channel_id
                ),
            });
            checks.push(check_webhook_endpoint(&config));
            checks.push(check_webhook_headers(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["webhook_endpoint", "webhook_headers"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_webhook_endpoint(config: &AppConfig) -> DoctorCheck {
    match webhook_origin(&config.webhook.url) {
        Some(origin) => DoctorCheck {
            name: "webhook_endpoint",
            status: CheckStatus::Pass,
            details: format!("posting to {origin}/<redacted path>"),
        },
        None => DoctorCheck {
            name: "webhook_endpoint",
            status: CheckStatus::Fail,
            details: "webhook.url has no host".to_string(),
        },
    }
}

fn check_webhook_headers(config: &AppConfig) -> DoctorCheck {
    match build_headers(config.webhook.header_name.as_deref(), config.header_value()) {
        Ok(_) if config.header_value().is_none() => DoctorCheck {
            name: "webhook_headers",
            status: CheckStatus::Pass,
            details: "no auth header configured".to_string(),
        },
        Ok(_) => {
            let name = config
                .webhook
                .header_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_AUTH_HEADER);
            DoctorCheck {
                name: "webhook_headers",
                status: CheckStatus::Pass,
                details: format!("auth header `{name}` configured"),
            }
        }
        Err(error) => DoctorCheck {
            name: "webhook_headers",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
