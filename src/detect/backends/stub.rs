use std::collections::VecDeque;

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};

/// Stub backend for tests and model-less demo runs.
///
/// Two modes:
/// - `scripted`: replays a fixed per-frame sequence of detection lists, then
///   reports nothing. Tests drive the pipeline with this.
/// - `motion`: fingerprints each frame and reports one centered detection
///   whenever the content changed since the previous frame, so a synthetic
///   camera produces visible overlays without a model artifact.
pub struct StubBackend {
    mode: Mode,
}

enum Mode {
    Scripted { queue: VecDeque<Vec<Detection>> },
    Motion { last_hash: Option<[u8; 32]> },
}

impl StubBackend {
    pub fn scripted(per_frame: Vec<Vec<Detection>>) -> Self {
        Self {
            mode: Mode::Scripted {
                queue: per_frame.into(),
            },
        }
    }

    pub fn motion() -> Self {
        Self {
            mode: Mode::Motion { last_hash: None },
        }
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        match &mut self.mode {
            Mode::Scripted { queue } => Ok(queue.pop_front().unwrap_or_default()),
            Mode::Motion { last_hash } => {
                let current: [u8; 32] = Sha256::digest(pixels).into();
                let moved = last_hash.is_some_and(|prev| prev != current);
                *last_hash = Some(current);

                if !moved {
                    return Ok(vec![]);
                }
                let (w, h) = (width as i64, height as i64);
                Ok(vec![Detection {
                    class_id: 1,
                    confidence: 0.85,
                    bbox: BoundingBox::new(w / 4, h / 4, w * 3 / 4, h * 3 / 4),
                }])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_replays_then_runs_dry() {
        let det = Detection {
            class_id: 7,
            confidence: 0.9,
            bbox: BoundingBox::new(0, 0, 10, 10),
        };
        let mut backend = StubBackend::scripted(vec![vec![det.clone()], vec![]]);

        assert_eq!(backend.detect(b"frame", 10, 10).unwrap().len(), 1);
        assert!(backend.detect(b"frame", 10, 10).unwrap().is_empty());
        assert!(backend.detect(b"frame", 10, 10).unwrap().is_empty());
    }

    #[test]
    fn motion_reports_only_on_content_change() {
        let mut backend = StubBackend::motion();

        assert!(backend.detect(b"frame1", 10, 10).unwrap().is_empty());
        let hits = backend.detect(b"frame2", 10, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].class_id, 1);
        assert!(backend.detect(b"frame2", 10, 10).unwrap().is_empty());
    }
}
