//! Signwatch
//!
//! Real-time traffic sign recognition: one local camera, one pretrained
//! detection model, one display window. Every loop iteration captures a
//! frame, runs the model, corrects known-wrong dataset labels, renders boxes
//! and labels over the frame, and shows it until the operator presses `q`.
//!
//! # Architecture
//!
//! - `frame`: owned per-iteration RGB frame
//! - `labels`: static display-label correction table
//! - `annotate`: in-place box/label renderer
//! - `detect`: detector backends and the detection engine
//! - `ingest`: camera frame sources
//! - `display`: presentation window and operator exit poll
//! - `pipeline`: the loop controller and its shutdown state machine
//! - `config`: runtime configuration (defaults are the standard
//!   single-camera constants)
//!
//! Heavy native dependencies are feature-gated: `backend-tract` for ONNX
//! inference, `ingest-v4l2` for real cameras, `display-minifb` for the
//! window. `stub://` device paths and the stub backends keep the whole
//! pipeline exercisable without any of them.

pub mod annotate;
pub mod config;
pub mod detect;
pub mod display;
pub mod frame;
pub mod ingest;
pub mod labels;
pub mod pipeline;

pub use config::SignwatchConfig;
pub use detect::{
    round_confidence, BoundingBox, Detection, DetectionEngine, DetectorBackend, ModelLoadError,
    StubBackend,
};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use display::{Presenter, StubPresenter};
#[cfg(feature = "display-minifb")]
pub use display::WindowPresenter;
pub use frame::Frame;
pub use ingest::{CameraConfig, CameraSource, CaptureError, FrameSource};
pub use labels::{CorrectionRule, CorrectionTable};
pub use pipeline::{
    LoopController, LoopReport, LoopState, ShutdownReason, CONFIDENCE_THRESHOLD,
};
