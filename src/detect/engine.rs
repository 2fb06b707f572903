//! Detection engine.
//!
//! Owns a boxed detector backend plus the model's class-name table. The model
//! is loaded exactly once at process start; a load failure is fatal and must
//! be surfaced before any capture device is opened.

use anyhow::Result;
use thiserror::Error;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Fatal startup error: the model artifact could not be turned into a
/// runnable detector.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact not found: {0}")]
    Missing(String),
    #[error("failed to load model {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("failed to read class names {path}: {reason}")]
    Names { path: String, reason: String },
}

/// Round a model confidence up to two decimal places.
///
/// `ceil(confidence * 100) / 100`, reproduced exactly for output-format
/// compatibility: 0.4567 -> 0.46, 0.45 -> 0.45, 1.0 -> 1.0. The result is a
/// multiple of 0.01 and never below the input.
pub fn round_confidence(confidence: f32) -> f32 {
    (confidence * 100.0).ceil() / 100.0
}

/// Pretrained sign detector plus its class-name table.
pub struct DetectionEngine {
    backend: Box<dyn DetectorBackend>,
    class_names: Vec<String>,
}

impl DetectionEngine {
    /// Build an engine around an already-constructed backend.
    ///
    /// `class_names` is the model's own label table, indexed by class id.
    pub fn new(mut backend: Box<dyn DetectorBackend>, class_names: Vec<String>) -> Result<Self> {
        backend.warm_up()?;
        Ok(Self {
            backend,
            class_names,
        })
    }

    /// Load the ONNX artifact at `model_path` and its sidecar names file.
    ///
    /// The sidecar is `<model stem>.names`, one class name per line; when it
    /// is absent the engine falls back to generic `class {id}` names.
    #[cfg(feature = "backend-tract")]
    pub fn load(
        model_path: &std::path::Path,
        input_width: u32,
        input_height: u32,
    ) -> Result<Self, ModelLoadError> {
        let backend =
            crate::detect::backends::TractBackend::load(model_path, input_width, input_height)?;
        let class_names = load_sidecar_names(model_path)?;
        Self::new(Box::new(backend), class_names).map_err(|e| ModelLoadError::Load {
            path: model_path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Run the model on one frame. The frame is read, never mutated.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        self.backend
            .detect(frame.as_bytes(), frame.width(), frame.height())
    }

    /// The model's own label for a class id, used as the default display name
    /// before correction. Ids outside the table get a generic name.
    pub fn class_name(&self, class_id: u32) -> String {
        self.class_names
            .get(class_id as usize)
            .cloned()
            .unwrap_or_else(|| format!("class {}", class_id))
    }
}

/// Read `<model stem>.names`, one class name per line. A missing sidecar is
/// not an error; an unreadable one is.
#[cfg(feature = "backend-tract")]
fn load_sidecar_names(model_path: &std::path::Path) -> Result<Vec<String>, ModelLoadError> {
    let names_path = model_path.with_extension("names");
    if !names_path.is_file() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(&names_path).map_err(|e| ModelLoadError::Names {
        path: names_path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(raw
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
