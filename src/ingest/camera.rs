//! Camera frame source.
//!
//! `CameraSource` produces `Frame`s from a local capture device. The
//! requested resolution is best-effort: the active resolution reported by the
//! device is what frames carry, and all downstream geometry uses it.

use anyhow::Result;

use super::{CaptureError, FrameSource, SourceStats};
use crate::frame::Frame;

/// Configuration for the camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0"), or `stub://…` for a synthetic
    /// source. A synthetic source honors an optional `?frames=N` budget after
    /// which reads fail, simulating device loss.
    pub device: String,
    /// Requested frame width (best-effort).
    pub width: u32,
    /// Requested frame height (best-effort).
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
        }
    }
}

/// Local camera source.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCameraSource),
    #[cfg(feature = "ingest-v4l2")]
    Device(super::v4l2::V4l2CameraSource),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if config.device.starts_with("stub://") {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCameraSource::new(config)),
            })
        } else {
            #[cfg(feature = "ingest-v4l2")]
            {
                Ok(Self {
                    backend: CameraBackend::Device(super::v4l2::V4l2CameraSource::new(config)?),
                })
            }
            #[cfg(not(feature = "ingest-v4l2"))]
            {
                Err(anyhow::anyhow!(
                    "camera device {} requires the ingest-v4l2 feature",
                    config.device
                ))
            }
        }
    }

    /// Open the capture device. Failure here is a fatal startup error.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.connect(),
        }
    }

    /// Active frame width after `connect` (may differ from the request).
    pub fn active_width(&self) -> u32 {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.config.width,
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.active_width(),
        }
    }

    /// Active frame height after `connect`.
    pub fn active_height(&self) -> u32 {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.config.height,
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.active_height(),
        }
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.next_frame(),
        }
    }

    fn release(&mut self) {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.release(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.release(),
        }
    }

    fn stats(&self) -> SourceStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.stats(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and demo runs
// ----------------------------------------------------------------------------

struct SyntheticCameraSource {
    config: CameraConfig,
    frame_count: u64,
    /// Simulated scene state; changes every few frames so a motion-style
    /// detector sees activity.
    scene_state: u8,
    /// Frames to produce before simulating device loss (`?frames=N`).
    frame_budget: Option<u64>,
    connected: bool,
    released: bool,
}

impl SyntheticCameraSource {
    fn new(config: CameraConfig) -> Self {
        let frame_budget = parse_frame_budget(&config.device);
        Self {
            config,
            frame_count: 0,
            scene_state: 0,
            frame_budget,
            connected: false,
            released: false,
        }
    }

    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!(
            "CameraSource: connected to {} (synthetic, {}x{})",
            self.config.device,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        if !self.connected || self.released {
            return Err(CaptureError::NotConnected);
        }
        if let Some(budget) = self.frame_budget {
            if self.frame_count >= budget {
                return Err(CaptureError::Disconnected {
                    frames: self.frame_count,
                });
            }
        }
        self.frame_count += 1;

        // Change scene occasionally to simulate motion.
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let pixels = self.generate_synthetic_pixels();
        Frame::from_raw(pixels, self.config.width, self.config.height)
            .map_err(|e| CaptureError::Device(e.to_string()))
    }

    /// Deterministic pixel pattern mixing position, frame count, and scene
    /// state.
    fn generate_synthetic_pixels(&self) -> Vec<u8> {
        let pixel_count = (self.config.width * self.config.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }

    fn release(&mut self) {
        self.released = true;
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            device: self.config.device.clone(),
        }
    }
}

/// Parse an optional `?frames=N` suffix from a stub device path.
fn parse_frame_budget(device: &str) -> Option<u64> {
    let (_, query) = device.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "frames" {
            value.parse().ok()
        } else {
            None
        }
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config(device: &str) -> CameraConfig {
        CameraConfig {
            device: device.to_string(),
            width: 64,
            height: 48,
        }
    }

    #[test]
    fn synthetic_source_produces_frames() -> Result<()> {
        let mut source = CameraSource::new(stub_config("stub://cam"))?;
        source.connect()?;

        let frame = source.next_frame()?;
        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
        assert_eq!(source.stats().frames_captured, 1);
        Ok(())
    }

    #[test]
    fn read_before_connect_is_a_capture_error() -> Result<()> {
        let mut source = CameraSource::new(stub_config("stub://cam"))?;
        assert!(matches!(
            source.next_frame(),
            Err(CaptureError::NotConnected)
        ));
        Ok(())
    }

    #[test]
    fn frame_budget_simulates_device_loss() -> Result<()> {
        let mut source = CameraSource::new(stub_config("stub://cam?frames=2"))?;
        source.connect()?;

        assert!(source.next_frame().is_ok());
        assert!(source.next_frame().is_ok());
        match source.next_frame() {
            Err(CaptureError::Disconnected { frames }) => assert_eq!(frames, 2),
            other => panic!("expected disconnect, got {:?}", other.map(|_| ())),
        }
        Ok(())
    }

    #[test]
    fn released_source_stops_producing() -> Result<()> {
        let mut source = CameraSource::new(stub_config("stub://cam"))?;
        source.connect()?;
        source.release();
        assert!(source.next_frame().is_err());
        Ok(())
    }
}
