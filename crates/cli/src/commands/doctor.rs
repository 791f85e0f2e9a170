use chrono::{Datelike, Utc};
use serde::Serialize;

use greenlight_core::config::{AppConfig, LlmProvider, LoadOptions};
use greenlight_core::ToolRegistry;

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

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm_readiness(&config));
            checks.push(check_search_readiness(&config));
            checks.push(check_tool_registry(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
        }
    }

    let failed = checks.iter().filter(|check| check.status == CheckStatus::Fail).count();
    let overall_status = if failed == 0 { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if failed == 0 {
        format!("{} checks passed", checks.len())
    } else {
        format!("{failed} of {} checks failed", checks.len())
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_llm_readiness(config: &AppConfig) -> DoctorCheck {
    let details = match config.llm.provider {
        LlmProvider::OpenAi | LlmProvider::Anthropic => format!(
            "provider {:?} with api key configured, model `{}`",
            config.llm.provider, config.llm.model
        ),
        LlmProvider::Ollama => format!(
            "provider Ollama at `{}`, model `{}`",
            config.llm.base_url.as_deref().unwrap_or("<unset>"),
            config.llm.model
        ),
    };

    // Validation already guaranteed the credentials for the provider, so
    // this check reports readiness rather than re-deriving it.
    DoctorCheck { name: "llm_readiness", status: CheckStatus::Pass, details }
}

fn check_search_readiness(config: &AppConfig) -> DoctorCheck {
    if !config.search.enabled {
        return DoctorCheck {
            name: "search_readiness",
            status: CheckStatus::Skipped,
            details: "search tool is disabled".to_string(),
        };
    }

    DoctorCheck {
        name: "search_readiness",
        status: CheckStatus::Pass,
        details: format!(
            "search enabled against `{}` (max_results {})",
            config.search.base_url, config.search.max_results
        ),
    }
}

fn check_tool_registry(config: &AppConfig) -> DoctorCheck {
    let registry = ToolRegistry::with_builtins(Utc::now().year());
    let specs = registry.specs();

    if specs.len() < 4 {
        return DoctorCheck {
            name: "tool_registry",
            status: CheckStatus::Fail,
            details: format!("expected at least 4 built-in tools, found {}", specs.len()),
        };
    }

    let names: Vec<&str> = specs.iter().map(|spec| spec.name.as_str()).collect();
    let search_note = if config.search.enabled { " (+ search at runtime)" } else { "" };

    DoctorCheck {
        name: "tool_registry",
        status: CheckStatus::Pass,
        details: format!("built-ins registered: {}{search_note}", names.join(", ")),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![format!(
        "doctor: {} ({})",
        match report.overall_status {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skipped",
        },
        report.summary
    )];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("  [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
