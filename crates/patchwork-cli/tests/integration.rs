//! Integration tests for the `patchwork` binary.

use patchwork_io::read_wav;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn patchwork_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_patchwork"))
}

/// Mono script whose only outlet carries a constant 0.5.
const DC_SCRIPT: &str = r#"
sampleRate = 1000
bufferLength = 100

[patch]
numOutlets = 1

[patch.modules.dc]
type = "square"
settings = { frequency = 0.0, amplitude = 0.5 }

[[patch.connections]]
from = "dc"
to = "outlet:0"
"#;

/// Stereo poly synth, silent until a note arrives.
const POLY_SCRIPT: &str = r#"{
    "sampleRate": 1000,
    "bufferLength": 100,
    "patch": {
        "numOutlets": 2,
        "modules": { "poly": { "type": "poly" } },
        "connections": [
            { "from": "poly", "outlet": 0, "to": "outlet:0" },
            { "from": "poly", "outlet": 1, "to": "outlet:1" }
        ]
    }
}"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn render_writes_raw_samples() {
    let dir = TempDir::new().unwrap();
    let script = write(dir.path(), "dc.toml", DC_SCRIPT);
    let output = dir.path().join("dc.wav");

    let status = patchwork_bin()
        .arg("render")
        .arg(&script)
        .arg(&output)
        .args(["--seconds", "0.5", "--no-normalize"])
        .status()
        .expect("failed to run patchwork render");
    assert!(status.success());

    let (samples, spec) = read_wav(&output).unwrap();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 1000);
    assert_eq!(spec.bits_per_sample, 32);
    assert_eq!(samples.len(), 500);
    assert!(samples.iter().all(|&s| s == 0.5));
}

#[test]
fn render_normalizes_by_default() {
    let dir = TempDir::new().unwrap();
    let script = write(dir.path(), "dc.toml", DC_SCRIPT);
    let output = dir.path().join("dc16.wav");

    let status = patchwork_bin()
        .arg("render")
        .arg(&script)
        .arg(&output)
        .args(["--seconds", "0.2", "--bit-depth", "16"])
        .status()
        .expect("failed to run patchwork render");
    assert!(status.success());

    let (samples, spec) = read_wav(&output).unwrap();
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(samples.len(), 200);
    assert!(samples.iter().all(|&s| (s - 1.0).abs() < 1e-3));
}

#[test]
fn render_plays_score_into_poly() {
    let dir = TempDir::new().unwrap();
    let script = write(dir.path(), "poly.json", POLY_SCRIPT);
    let score = write(
        dir.path(),
        "score.json",
        r#"[
            { "on": 0.2, "action": "send",
              "payload": { "poly": { "duration": 0.3, "settings": { "frequency": 50 } } } }
        ]"#,
    );
    let output = dir.path().join("poly.wav");

    let status = patchwork_bin()
        .arg("render")
        .arg(&script)
        .arg(&output)
        .arg("--score")
        .arg(&score)
        .args(["--seconds", "0.5", "--no-normalize"])
        .status()
        .expect("failed to run patchwork render");
    assert!(status.success());

    let (samples, spec) = read_wav(&output).unwrap();
    assert_eq!(spec.channels, 2);
    let (before, after) = samples.split_at(2 * 200);
    assert!(before.iter().all(|&s| s == 0.0));
    assert!(after.iter().any(|&s| s.abs() > 0.01));
}

#[test]
fn unknown_module_type_fails() {
    let dir = TempDir::new().unwrap();
    let script = write(
        dir.path(),
        "bad.json",
        r#"{ "patch": { "modules": { "x": { "type": "theremin" } } } }"#,
    );

    let output = patchwork_bin()
        .arg("render")
        .arg(&script)
        .arg(dir.path().join("bad.wav"))
        .output()
        .expect("failed to run patchwork render");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("theremin"), "stderr: {stderr}");
    assert!(!dir.path().join("bad.wav").exists());
}

#[test]
fn unsupported_bit_depth_is_rejected() {
    let output = patchwork_bin()
        .args(["render", "a.json", "b.wav", "--bit-depth", "8"])
        .output()
        .expect("failed to run patchwork render");
    assert!(!output.status.success());
}

#[test]
fn modules_lists_builtins() {
    let output = patchwork_bin()
        .arg("modules")
        .output()
        .expect("failed to run patchwork modules");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in [
        "osc",
        "square",
        "adsr",
        "delay",
        "allpass",
        "patch",
        "poly",
        "granulator",
        "sine",
    ] {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
}

#[test]
fn modules_json_is_parseable() {
    let output = patchwork_bin()
        .args(["modules", "--json"])
        .output()
        .expect("failed to run patchwork modules");
    assert!(output.status.success());

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let voices: Vec<&str> = listing["voices"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["name"].as_str())
        .collect();
    assert_eq!(voices, vec!["sine", "patch", "sinvoice", "patchvoice"]);
}
