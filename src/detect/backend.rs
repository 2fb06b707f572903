use anyhow::Result;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// Implementations receive the frame's raw RGB bytes and report sign
/// detections in frame pixel coordinates. The pixel slice is read-only and
/// ephemeral: backends must not mutate it or retain it beyond the `detect`
/// call.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on one frame.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, called once before the first frame.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
