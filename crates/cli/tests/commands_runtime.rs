use std::env;
use std::sync::{Mutex, OnceLock};

use greenlight_cli::commands::{config, doctor};
use serde_json::Value;

#[test]
fn doctor_passes_with_default_config() {
    with_env(&[], || {
        let report = parse_payload(&doctor::run(true));

        assert_eq!(report["overall_status"], "pass");
        let checks = report["checks"].as_array().expect("checks array");
        assert!(checks.iter().any(|check| check["name"] == "config_validation"
            && check["status"] == "pass"));
        assert!(checks.iter().any(|check| check["name"] == "tool_registry"
            && check["status"] == "pass"));
    });
}

#[test]
fn doctor_fails_when_hosted_provider_has_no_api_key() {
    with_env(&[("GREENLIGHT_LLM_PROVIDER", "openai")], || {
        let report = parse_payload(&doctor::run(true));

        assert_eq!(report["overall_status"], "fail");
        let checks = report["checks"].as_array().expect("checks array");
        let config_check = checks
            .iter()
            .find(|check| check["name"] == "config_validation")
            .expect("config check present");
        assert_eq!(config_check["status"], "fail");
        assert!(config_check["details"]
            .as_str()
            .unwrap_or_default()
            .contains("llm.api_key"));
    });
}

#[test]
fn doctor_skips_search_check_when_disabled() {
    with_env(&[], || {
        let report = parse_payload(&doctor::run(true));

        let checks = report["checks"].as_array().expect("checks array");
        let search_check = checks
            .iter()
            .find(|check| check["name"] == "search_readiness")
            .expect("search check present");
        assert_eq!(search_check["status"], "skipped");
    });
}

#[test]
fn doctor_human_output_lists_every_check() {
    with_env(&[], || {
        let output = doctor::run(false);

        assert!(output.starts_with("doctor: pass"));
        assert!(output.contains("config_validation"));
        assert!(output.contains("llm_readiness"));
        assert!(output.contains("tool_registry"));
    });
}

#[test]
fn config_output_redacts_secrets_and_attributes_sources() {
    with_env(
        &[
            ("GREENLIGHT_LLM_PROVIDER", "anthropic"),
            ("GREENLIGHT_LLM_API_KEY", "sk-super-secret"),
        ],
        || {
            let output = config::run();

            assert!(output.contains("llm.api_key = <redacted>"));
            assert!(!output.contains("sk-super-secret"));
            assert!(output.contains("[env:GREENLIGHT_LLM_PROVIDER]"));
            assert!(output.contains("llm.model"));
            assert!(output.contains("decisions.approve_tokens = yes,y,approve,a"));
        },
    );
}

#[test]
fn config_reports_validation_failures_in_plain_text() {
    with_env(&[("GREENLIGHT_LLM_PROVIDER", "openai")], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed:"));
        assert!(output.contains("llm.api_key"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "GREENLIGHT_LLM_PROVIDER",
        "GREENLIGHT_LLM_API_KEY",
        "GREENLIGHT_LLM_BASE_URL",
        "GREENLIGHT_LLM_MODEL",
        "GREENLIGHT_LLM_TIMEOUT_SECS",
        "GREENLIGHT_SEARCH_ENABLED",
        "GREENLIGHT_SEARCH_API_KEY",
        "GREENLIGHT_SEARCH_BASE_URL",
        "GREENLIGHT_SEARCH_MAX_RESULTS",
        "GREENLIGHT_LOGGING_LEVEL",
        "GREENLIGHT_LOGGING_FORMAT",
        "GREENLIGHT_LOG_LEVEL",
        "GREENLIGHT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
