//! Frame ingestion.
//!
//! One camera, one source. `CameraSource` wraps the capture backend selected
//! by the configured device path:
//! - `stub://…` paths select a synthetic in-memory source (tests, demo runs)
//! - real device nodes (e.g. `/dev/video0`) require the `ingest-v4l2` feature
//!
//! Capture failures are fatal to the loop: a dead camera cannot self-recover,
//! so there is no retry here or anywhere downstream.

mod camera;
#[cfg(feature = "ingest-v4l2")]
mod v4l2;

use thiserror::Error;

use crate::frame::Frame;

pub use camera::{CameraConfig, CameraSource};

/// Fatal runtime error: the capture device produced no frame.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device not connected")]
    NotConnected,
    #[error("capture device disconnected after {frames} frames")]
    Disconnected { frames: u64 },
    #[error("capture device error: {0}")]
    Device(String),
}

/// Frame statistics for health logging.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub device: String,
}

/// A device that produces one owned frame per call.
///
/// `next_frame` blocks until a frame is available or the device fails.
/// `release` frees the underlying device; the loop controller calls it
/// exactly once during shutdown.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError>;

    fn release(&mut self);

    fn stats(&self) -> SourceStats;
}
