use std::sync::Mutex;

use tempfile::NamedTempFile;

use signwatch::config::SignwatchConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in ["SIGNWATCH_CONFIG", "SIGNWATCH_MODEL", "SIGNWATCH_DEVICE"] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "model_path": "models/signs.onnx",
        "camera": {
            "device": "/dev/video2",
            "width": 800,
            "height": 600
        },
        "window_title": "Signs (lab rig)"
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("SIGNWATCH_CONFIG", file.path());
    std::env::set_var("SIGNWATCH_DEVICE", "stub://bench");

    let cfg = SignwatchConfig::load().expect("load config");
    assert_eq!(cfg.model_path, "models/signs.onnx");
    // Env wins over the file for the device.
    assert_eq!(cfg.camera.device, "stub://bench");
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);
    assert_eq!(cfg.window_title, "Signs (lab rig)");

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SignwatchConfig::load().expect("load config");
    assert_eq!(cfg.model_path, "best.onnx");
    assert_eq!(cfg.camera.device, "/dev/video0");
    assert_eq!(cfg.camera.width, 640);
    assert_eq!(cfg.camera.height, 480);
}

#[test]
fn invalid_config_file_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"not json").expect("write config");
    std::env::set_var("SIGNWATCH_CONFIG", file.path());

    assert!(SignwatchConfig::load().is_err());

    clear_env();
}
