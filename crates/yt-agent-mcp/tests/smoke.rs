use std::fs;

use tempfile::tempdir;
use yt_agent_mcp::{load_settings_with_env, run_with_settings};

#[tokio::test]
async fn server_starts_headless_from_settings_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("settings.toml");
    fs::write(
        &path,
        "backend_url = \"http://127.0.0.1:18000\"\nsession_ttl_secs = 60\nheadless = true\n",
    )
    .expect("write settings");

    let settings = load_settings_with_env(Some(&path), config_env()).expect("settings load");
    assert_eq!(settings.backend_url, "http://127.0.0.1:18000");
    assert_eq!(settings.session_ttl_secs, 60);
    assert_eq!(settings.session_capacity, 1024);

    let result = run_with_settings(&settings).await;
    assert!(result.is_ok(), "expected headless server to succeed: {result:?}");
}

#[tokio::test]
async fn environment_beats_settings_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("settings.toml");
    fs::write(&path, "channel_page_size = 5\nheadless = true\n").expect("write settings");

    let mut env = config_env();
    env.insert("YT_AGENT_CHANNEL_PAGE_SIZE".to_string(), "7".to_string());
    let settings = load_settings_with_env(Some(&path), env).expect("settings load");
    assert_eq!(settings.channel_page_size, 7);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let result = load_settings_with_env(Some(&dir.path().join("absent.toml")), config_env());
    assert!(result.is_err());
}

fn config_env() -> config::Map<String, String> {
    config::Map::new()
}
