use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_MODEL_PATH: &str = "best.onnx";
const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_WINDOW_TITLE: &str = "Traffic Sign Recognition";

#[derive(Debug, Deserialize, Default)]
struct SignwatchConfigFile {
    model_path: Option<String>,
    camera: Option<CameraConfigFile>,
    window_title: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Runtime configuration. Defaults are the fixed constants of the standard
/// single-camera setup; an optional JSON file named by `SIGNWATCH_CONFIG`
/// plus a pair of env overrides can replace them.
#[derive(Debug, Clone)]
pub struct SignwatchConfig {
    pub model_path: String,
    pub camera: CameraSettings,
    pub window_title: String,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
}

impl SignwatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SIGNWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SignwatchConfigFile) -> Self {
        let model_path = file
            .model_path
            .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string());
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|camera| camera.device.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_CAMERA_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_CAMERA_HEIGHT),
        };
        let window_title = file
            .window_title
            .unwrap_or_else(|| DEFAULT_WINDOW_TITLE.to_string());
        Self {
            model_path,
            camera,
            window_title,
        }
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("SIGNWATCH_MODEL") {
            if !path.trim().is_empty() {
                self.model_path = path;
            }
        }
        if let Ok(device) = std::env::var("SIGNWATCH_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.model_path.trim().is_empty() {
            return Err(anyhow!("model_path must not be empty"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SignwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
