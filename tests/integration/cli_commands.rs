//! Integration tests for the vitrine binary
//!
//! Each run gets isolated HOME/XDG directories so user-level config never leaks in.

use crate::integration::test_utils::{spawn_fake_endpoint, CannedResponse};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn vitrine(temp: &TempDir, workspace: &Path, args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_vitrine"));
    command
        .env("HOME", temp.path().join("home"))
        .env("XDG_CONFIG_HOME", temp.path().join("xdg"))
        .env_remove("VITRINE_API_KEY")
        .env_remove("VITRINE_ENV")
        .arg("--workspace")
        .arg(workspace)
        .arg("--quiet")
        .args(args);
    command
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn setup() -> (TempDir, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("ws");
    std::fs::create_dir_all(workspace.join("config")).unwrap();
    (temp, workspace)
}

#[test]
fn test_config_show_json_redacts_key() {
    let (temp, workspace) = setup();
    std::fs::write(
        workspace.join("config").join("config.toml"),
        "[service]\napi_key = \"super-secret\"\n",
    )
    .unwrap();

    let output = vitrine(&temp, &workspace, &["config", "show", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(!text.contains("super-secret"));
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["retry"]["max_retries"], 5);
    assert_eq!(value["sharing"], "independent");
}

#[test]
fn test_config_validate_fails_on_bad_values() {
    let (temp, workspace) = setup();
    std::fs::write(
        workspace.join("config").join("config.toml"),
        "[marquee]\nnormal_secs = 0\n",
    )
    .unwrap();

    let output = vitrine(&temp, &workspace, &["config", "validate"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Marquee"), "stderr was: {}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_generate_writes_decoded_image() {
    let (temp, workspace) = setup();
    let (endpoint, server) = spawn_fake_endpoint(vec![
        CannedResponse::status(500, "transient"),
        CannedResponse::ok_payload("iVBORw0KGgo="),
    ])
    .await;
    std::fs::write(
        workspace.join("config").join("config.toml"),
        format!(
            "[service]\nendpoint = \"{}\"\n\n[retry]\nbase_delay_ms = 10\n",
            endpoint
        ),
    )
    .unwrap();
    let out_file = temp.path().join("image.png");

    let mut command = vitrine(
        &temp,
        &workspace,
        &[
            "generate",
            "Aged oak luggage board",
            "--out",
            out_file.to_str().unwrap(),
            "--format",
            "json",
        ],
    );
    let output = tokio::task::spawn_blocking(move || command.output().unwrap())
        .await
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["state"], "ready");
    assert_eq!(report["attempts"], 2);
    assert_eq!(
        std::fs::read(&out_file).unwrap(),
        vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
    );
    assert_eq!(server.await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_strip_reports_every_slot() {
    let (temp, workspace) = setup();
    let (endpoint, server) = spawn_fake_endpoint(vec![
        CannedResponse::ok_payload("QQ=="),
        CannedResponse::ok_payload("QQ=="),
        CannedResponse::ok_payload("QQ=="),
        CannedResponse::ok_payload("QQ=="),
    ])
    .await;
    std::fs::write(
        workspace.join("config").join("config.toml"),
        format!("[service]\nendpoint = \"{}\"\n", endpoint),
    )
    .unwrap();

    let mut command = vitrine(
        &temp,
        &workspace,
        &[
            "strip", "--prompt", "tires", "--prompt", "sunset", "--reverse", "--format", "json",
        ],
    );
    let output = tokio::task::spawn_blocking(move || command.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["direction"], "reverse");
    assert_eq!(report["cycle_secs"], 60);
    assert_eq!(report["timed_out"], false);
    let slots = report["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 4);
    assert_eq!(slots[0]["prompt"], slots[2]["prompt"]);
    assert_eq!(slots[3]["pass"], 1);
    assert!(slots.iter().all(|s| s["state"] == "ready"));
    assert_eq!(server.await.unwrap().len(), 4);
}
