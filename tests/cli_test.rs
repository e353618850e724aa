//! Binary entry point tests

use std::process::{Command, Output};

fn gateway(args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_smartbear-mcp"));
    command.args(args).env_clear();
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().unwrap()
}

#[test]
fn test_no_credentials_exits_with_status_one() {
    let output = gateway(&[], &[]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No products were configured"), "{}", stderr);
    assert!(output.stdout.is_empty());
}

#[test]
fn test_partial_credentials_alone_still_exit_with_status_one() {
    let output = gateway(
        &["serve"],
        &[
            ("PACT_BROKER_BASE_URL", "https://broker.example.com"),
            ("PACT_BROKER_USERNAME", "user"),
        ],
    );
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PACT_BROKER_TOKEN"), "{}", stderr);
}

#[test]
fn test_check_lists_configured_products() {
    let output = gateway(
        &["check"],
        &[
            ("REFLECT_API_TOKEN", "reflect-token"),
            ("COLLAB_BASE_URL", "https://collab.example.com"),
        ],
    );
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let reflect = stdout.lines().find(|l| l.starts_with("Reflect")).unwrap();
    assert!(reflect.ends_with("enabled"));
    let zephyr = stdout.lines().find(|l| l.starts_with("Zephyr")).unwrap();
    assert!(zephyr.ends_with("not configured"));
    assert!(stdout.contains("COLLAB_USERNAME"));
    assert!(!stdout.contains("reflect-token"));
}

#[test]
fn test_invalid_config_file_exits_with_status_two() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gateway.toml");
    std::fs::write(&path, "[http]\naddr = \"not an address\"\n").unwrap();

    let output = gateway(&["--config", path.to_str().unwrap()], &[]);
    assert_eq!(output.status.code(), Some(2));
}
