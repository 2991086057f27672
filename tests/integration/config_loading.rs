//! Layered configuration loading against real files and environment
//! variables.

use speedgrader::config::ConfigLoader;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tempfile::tempdir;

// Process environment is shared across the test binary; every test that reads
// or writes it must hold this lock.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const ENV_VARS: &[&str] = &[
    "CANVAS_URL",
    "CANVAS_API_KEY",
    "XDG_CONFIG_HOME",
    "SPEEDGRADER__GRADER__TIMEOUT_SECS",
];

/// Locks the environment, clears every variable the loader reads, and points
/// XDG_CONFIG_HOME at an empty directory so the host's real global config
/// never leaks in. Originals are restored on drop.
struct EnvGuard {
    _lock: MutexGuard<'static, ()>,
    saved: Vec<(&'static str, Option<String>)>,
    _xdg: tempfile::TempDir,
}

impl EnvGuard {
    fn new() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved = ENV_VARS
            .iter()
            .map(|name| {
                let value = std::env::var(name).ok();
                std::env::remove_var(name);
                (*name, value)
            })
            .collect();
        let xdg = tempdir().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", xdg.path());
        Self {
            _lock: lock,
            saved,
            _xdg: xdg,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

fn write_workspace_config(dir: &Path, body: &str) {
    std::fs::write(dir.join("speedgrader.toml"), body).unwrap();
}

#[test]
fn workspace_file_is_picked_up() {
    let _env = EnvGuard::new();
    let workspace = tempdir().unwrap();
    write_workspace_config(
        workspace.path(),
        r#"
[canvas]
base_url = "https://canvas.example.edu"
api_key = "workspace-token"

[grader]
timeout_secs = 12
"#,
    );

    let config = ConfigLoader::load(workspace.path()).unwrap();
    assert_eq!(
        config.canvas.base_url.as_deref(),
        Some("https://canvas.example.edu")
    );
    assert_eq!(config.canvas.api_key.as_deref(), Some("workspace-token"));
    assert_eq!(config.grader.timeout_secs, 12);
}

#[test]
fn missing_files_fall_back_to_defaults() {
    let _env = EnvGuard::new();
    let workspace = tempdir().unwrap();

    let config = ConfigLoader::load(workspace.path()).unwrap();
    assert!(config.canvas.base_url.is_none());
    assert!(config.canvas.api_key.is_none());
    assert_eq!(config.grader.timeout_secs, 30);
    assert_eq!(config.canvas.per_page, 100);
}

#[test]
fn canvas_env_credentials_override_file_values() {
    let _env = EnvGuard::new();
    let workspace = tempdir().unwrap();
    write_workspace_config(
        workspace.path(),
        r#"
[canvas]
base_url = "https://file.example.edu"
api_key = "file-token"
"#,
    );
    std::env::set_var("CANVAS_URL", "https://env.example.edu");
    std::env::set_var("CANVAS_API_KEY", "env-token");

    let config = ConfigLoader::load(workspace.path()).unwrap();
    assert_eq!(
        config.canvas.base_url.as_deref(),
        Some("https://env.example.edu")
    );
    assert_eq!(config.canvas.api_key.as_deref(), Some("env-token"));
}

#[test]
fn workspace_file_overrides_global_file() {
    let _env = EnvGuard::new();
    let xdg = tempdir().unwrap();
    let global_dir = xdg.path().join("speedgrader");
    std::fs::create_dir_all(&global_dir).unwrap();
    std::fs::write(
        global_dir.join("config.toml"),
        r#"
[canvas]
base_url = "https://global.example.edu"
api_key = "global-token"

[grader]
timeout_secs = 20
"#,
    )
    .unwrap();
    std::env::set_var("XDG_CONFIG_HOME", xdg.path());

    let workspace = tempdir().unwrap();
    write_workspace_config(
        workspace.path(),
        r#"
[canvas]
base_url = "https://workspace.example.edu"
"#,
    );

    let config = ConfigLoader::load(workspace.path()).unwrap();
    // workspace wins where it speaks, global fills the gaps
    assert_eq!(
        config.canvas.base_url.as_deref(),
        Some("https://workspace.example.edu")
    );
    assert_eq!(config.canvas.api_key.as_deref(), Some("global-token"));
    assert_eq!(config.grader.timeout_secs, 20);
}

#[test]
fn prefixed_env_overrides_grader_settings() {
    let _env = EnvGuard::new();
    let workspace = tempdir().unwrap();
    write_workspace_config(
        workspace.path(),
        r#"
[grader]
timeout_secs = 10
"#,
    );
    std::env::set_var("SPEEDGRADER__GRADER__TIMEOUT_SECS", "7");

    let config = ConfigLoader::load(workspace.path()).unwrap();
    assert_eq!(config.grader.timeout_secs, 7);
}

#[test]
fn zero_timeout_in_file_is_rejected() {
    let _env = EnvGuard::new();
    let workspace = tempdir().unwrap();
    write_workspace_config(
        workspace.path(),
        r#"
[grader]
timeout_secs = 0
"#,
    );

    assert!(ConfigLoader::load(workspace.path()).is_err());
}
