use std::env;
use std::fs;
use std::path::PathBuf;

use nlsql::config::{Settings, SettingsError};
use nlsql::orchestrator::{Orchestrator, Strategy};

fn write_config(name: &str, content: &str) -> PathBuf {
    let path = env::temp_dir().join(format!("nlsql-{}-{}.toml", name, std::process::id()));
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_file_with_env_expanded_key_wires_ai() {
    env::set_var("NLSQL_IT_OPENAI_KEY", "sk-from-env");
    let path = write_config(
        "ai",
        r#"
strategy = "hybrid"

[hybrid]
threshold = 0.6

[ai]
provider = "openai"
api_key = "${NLSQL_IT_OPENAI_KEY}"
model = "gpt-4o-mini"
timeout_seconds = 5
"#,
    );

    let settings = Settings::from_file(&path).unwrap();
    let orchestrator = Orchestrator::from_settings(&settings).unwrap();

    assert_eq!(orchestrator.strategy(), Strategy::Hybrid);
    assert_eq!(orchestrator.threshold(), 0.6);
    assert!(orchestrator.is_ai_available());
    assert_eq!(orchestrator.ai_model_name().as_deref(), Some("gpt-4o-mini"));

    fs::remove_file(&path).ok();
    env::remove_var("NLSQL_IT_OPENAI_KEY");
}

#[test]
fn test_missing_env_var_fails_wiring() {
    let settings = Settings::from_toml(
        "[ai]\nprovider = \"gemini\"\napi_key = \"${NLSQL_IT_DEFINITELY_UNSET}\"\n",
    )
    .unwrap();

    let err = Orchestrator::from_settings(&settings).err().unwrap();
    assert!(matches!(err, SettingsError::MissingEnvVar(ref name) if name == "NLSQL_IT_DEFINITELY_UNSET"));
}

#[test]
fn test_local_only_configuration() {
    let settings = Settings::from_toml("strategy = \"local\"\n[engine]\nmax_depth = 2\n").unwrap();
    let orchestrator = Orchestrator::from_settings(&settings).unwrap();

    assert_eq!(orchestrator.strategy(), Strategy::Local);
    assert!(!orchestrator.is_ai_available());
    assert_eq!(orchestrator.ai_model_name(), None);
}

#[test]
fn test_invalid_file_reports_parse_error() {
    let path = write_config("broken", "strategy = \n");
    let err = Settings::from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::ParseError(_)));
    fs::remove_file(&path).ok();
}

#[test]
fn test_disabled_feature_flag() {
    let settings = Settings::from_toml("enabled = false\n").unwrap();
    assert!(!settings.enabled);
}
