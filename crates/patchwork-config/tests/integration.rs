//! File round trips and relative path resolution.

use std::path::Path;

use patchwork_config::{
    ConfigError, ConnectionDescriptor, ModuleDescriptor, PatchDescriptor, PatchSource, Script,
    load_score,
};
use serde_json::json;
use tempfile::TempDir;

fn sample_patch() -> PatchDescriptor {
    PatchDescriptor::new(1, 2)
        .with_module(
            "poly",
            ModuleDescriptor::new("poly").with_settings(json!({"factory": "sine"})),
        )
        .with_module("delay", ModuleDescriptor::new("delay"))
        .with_connection(ConnectionDescriptor::new("poly", 0, "outlet:0", 0))
        .with_connection(ConnectionDescriptor::new("poly", 1, "outlet:1", 0))
}

#[test]
fn script_survives_toml_and_json() {
    let dir = TempDir::new().unwrap();
    let script = Script::new(sample_patch()).with_sample_rate(48000.0).with_buffer_length(128);

    for name in ["main.toml", "main.json"] {
        let path = dir.path().join(name);
        script.save(&path).unwrap();
        let loaded = Script::load(&path).unwrap();
        assert_eq!(loaded.patch, script.patch, "{name}");
        assert_eq!(loaded.sample_rate, 48000.0);
        assert_eq!(loaded.buffer_length, 128);
        assert_eq!(loaded.directory(), Some(dir.path()));
    }
}

#[test]
fn relative_patch_path_resolves_from_including_directory() {
    let dir = TempDir::new().unwrap();
    let voices = dir.path().join("voices");
    std::fs::create_dir(&voices).unwrap();
    std::fs::write(
        voices.join("bell.json"),
        r#"{ "numOutlets": 1, "modules": { "osc": { "type": "osc" } } }"#,
    )
    .unwrap();

    let source = PatchSource::Path("voices/bell.json".into());
    let loaded = source.resolve(Some(dir.path())).unwrap();
    assert_eq!(loaded.descriptor.num_outlets, 1);
    assert_eq!(loaded.directory.as_deref(), Some(voices.as_path()));
}

#[test]
fn script_file_can_stand_in_for_patch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("whole.json");
    Script::new(sample_patch()).save(&path).unwrap();
    assert_eq!(PatchDescriptor::load(&path).unwrap(), sample_patch());
}

#[test]
fn malformed_nested_patch_is_not_silently_emptied() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{ "patch": { "numOutlets": "two" } }"#).unwrap();
    assert!(PatchDescriptor::load(&path).is_err());
}

#[test]
fn missing_script_reports_read_error() {
    let err = Script::load(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn score_file_loads_in_both_formats() {
    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("score.json");
    std::fs::write(
        &json_path,
        r#"[
            { "on": 1.0, "action": "send", "payload": { "poly": { "duration": 0.5 } } },
            { "on": 0.0, "action": "send", "payload": { "poly": { "noteOff": true } } },
            { "on": 3.0, "action": "reset" }
        ]"#,
    )
    .unwrap();
    let score = load_score(&json_path).unwrap();
    assert_eq!(score.len(), 3);
    assert_eq!(score.events()[0].on, 0.0);

    let toml_path = dir.path().join("score.toml");
    std::fs::write(
        &toml_path,
        "[[events]]\non = 0.0\naction = \"reset\"\n",
    )
    .unwrap();
    assert_eq!(load_score(&toml_path).unwrap().len(), 1);
}
