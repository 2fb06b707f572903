//! Detection-to-annotation loop.
//!
//! The controller sequences one iteration as: capture, inference,
//! filter/relabel, render, present, exit-poll. Everything is synchronous and
//! single-threaded; inference latency directly throttles the frame rate.
//!
//! Failure semantics: a capture-level failure or a detection fault ends the
//! loop (no retry), but shutdown is always graceful: the camera is released
//! and the presentation surface closed exactly once each before the
//! controller reports back.

use anyhow::{anyhow, Result};

use crate::annotate::annotate;
use crate::detect::{round_confidence, DetectionEngine};
use crate::display::Presenter;
use crate::ingest::FrameSource;
use crate::labels::CorrectionTable;

/// Rounded confidences must be strictly greater than this to be rendered.
pub const CONFIDENCE_THRESHOLD: f32 = 0.45;

/// Loop controller lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Initializing,
    Running,
    Closing,
    Closed,
}

/// Why the loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The operator pressed the exit key (or closed the window).
    OperatorRequest,
    /// The capture device produced no frame.
    CaptureFailure,
    /// Inference or presentation faulted mid-run.
    RuntimeFault,
}

/// What one run accomplished.
#[derive(Clone, Copy, Debug)]
pub struct LoopReport {
    /// Frames fully processed and presented.
    pub frames: u64,
    /// Annotations actually rendered (post threshold).
    pub annotations: u64,
    pub shutdown: ShutdownReason,
}

/// Owns the camera, the engine, the correction table, and the presentation
/// surface for the lifetime of the run. Nothing else may touch those devices
/// while the loop is live.
pub struct LoopController<S: FrameSource, P: Presenter> {
    source: S,
    engine: DetectionEngine,
    corrections: CorrectionTable,
    presenter: P,
    threshold: f32,
    state: LoopState,
}

impl<S: FrameSource, P: Presenter> LoopController<S, P> {
    pub fn new(
        source: S,
        engine: DetectionEngine,
        corrections: CorrectionTable,
        presenter: P,
    ) -> Self {
        Self {
            source,
            engine,
            corrections,
            presenter,
            threshold: CONFIDENCE_THRESHOLD,
            state: LoopState::Initializing,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until the operator asks to stop or the pipeline fails, then shut
    /// down and report.
    pub fn run(&mut self) -> Result<LoopReport> {
        if self.state != LoopState::Initializing {
            return Err(anyhow!("loop controller has already run"));
        }
        self.state = LoopState::Running;

        let mut frames = 0u64;
        let mut annotations = 0u64;

        let shutdown = loop {
            let mut frame = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    log::error!("frame capture failed: {}", err);
                    break ShutdownReason::CaptureFailure;
                }
            };

            let detections = match self.engine.detect(&frame) {
                Ok(detections) => detections,
                Err(err) => {
                    log::error!("detection failed: {}", err);
                    break ShutdownReason::RuntimeFault;
                }
            };

            for detection in &detections {
                let rounded = round_confidence(detection.confidence);
                let default_name = self.engine.class_name(detection.class_id);
                let label = self
                    .corrections
                    .corrected_name(detection.class_id, &default_name);

                if rounded > self.threshold {
                    annotate(&mut frame, &detection.bbox, label);
                    annotations += 1;
                    log::debug!(
                        "sign: {} conf={:.2} at ({},{})-({},{})",
                        label,
                        rounded,
                        detection.bbox.x1,
                        detection.bbox.y1,
                        detection.bbox.x2,
                        detection.bbox.y2
                    );
                }
            }

            if let Err(err) = self.presenter.present(&frame) {
                log::error!("presentation failed: {}", err);
                break ShutdownReason::RuntimeFault;
            }
            frames += 1;

            match self.presenter.exit_requested() {
                Ok(true) => break ShutdownReason::OperatorRequest,
                Ok(false) => {}
                Err(err) => {
                    log::error!("exit poll failed: {}", err);
                    break ShutdownReason::RuntimeFault;
                }
            }
        };

        self.state = LoopState::Closing;
        self.source.release();
        if let Err(err) = self.presenter.close() {
            log::warn!("closing presentation surface failed: {}", err);
        }
        self.state = LoopState::Closed;

        let stats = self.source.stats();
        log::info!(
            "loop closed: {:?}, {} frames from {}, {} annotations",
            shutdown,
            stats.frames_captured,
            stats.device,
            annotations
        );

        Ok(LoopReport {
            frames,
            annotations,
            shutdown,
        })
    }

    /// Shared view of the presenter (frame counters, recorded output).
    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, Detection, StubBackend};
    use crate::display::StubPresenter;
    use crate::ingest::{CameraConfig, CameraSource};

    fn stub_camera(device: &str, width: u32, height: u32) -> CameraSource {
        let mut source = CameraSource::new(CameraConfig {
            device: device.to_string(),
            width,
            height,
        })
        .expect("stub camera");
        source.connect().expect("stub camera connect");
        source
    }

    fn engine_with(per_frame: Vec<Vec<Detection>>, names: &[&str]) -> DetectionEngine {
        DetectionEngine::new(
            Box::new(StubBackend::scripted(per_frame)),
            names.iter().map(|s| s.to_string()).collect(),
        )
        .expect("stub engine")
    }

    fn detection(class_id: u32, confidence: f32, bbox: (i64, i64, i64, i64)) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox: BoundingBox::new(bbox.0, bbox.1, bbox.2, bbox.3),
        }
    }

    #[test]
    fn operator_exit_closes_the_loop_once() -> Result<()> {
        let mut controller = LoopController::new(
            stub_camera("stub://cam", 64, 48),
            engine_with(vec![], &[]),
            CorrectionTable::builtin(),
            StubPresenter::quit_after(3),
        );

        let report = controller.run()?;
        assert_eq!(report.shutdown, ShutdownReason::OperatorRequest);
        assert_eq!(report.frames, 3);
        assert_eq!(controller.state(), LoopState::Closed);
        assert_eq!(controller.presenter().close_calls(), 1);
        // The released camera refuses further reads.
        assert!(controller.source.next_frame().is_err());
        // A closed controller refuses to run again, so release/close stay
        // exactly-once.
        assert!(controller.run().is_err());
        assert_eq!(controller.presenter().close_calls(), 1);
        Ok(())
    }

    #[test]
    fn capture_failure_shuts_down_gracefully() -> Result<()> {
        let mut controller = LoopController::new(
            stub_camera("stub://cam?frames=2", 64, 48),
            engine_with(vec![], &[]),
            CorrectionTable::builtin(),
            StubPresenter::new(),
        );

        let report = controller.run()?;
        assert_eq!(report.shutdown, ShutdownReason::CaptureFailure);
        assert_eq!(report.frames, 2);
        assert_eq!(controller.state(), LoopState::Closed);
        assert_eq!(controller.presenter().close_calls(), 1);
        Ok(())
    }

    #[test]
    fn threshold_filter_is_strictly_greater() -> Result<()> {
        // Rounded 0.45 must not render; rounded 0.46 must.
        let per_frame = vec![
            vec![detection(7, 0.45, (5, 35, 50, 60))],
            vec![detection(7, 0.4567, (5, 35, 50, 60))],
        ];
        let mut controller = LoopController::new(
            stub_camera("stub://cam", 64, 64),
            engine_with(per_frame, &["a", "b", "c", "d", "e", "f", "g", "Stop"]),
            CorrectionTable::builtin(),
            StubPresenter::quit_after(2),
        );

        let report = controller.run()?;
        assert_eq!(report.annotations, 1);
        Ok(())
    }

    #[test]
    fn corrected_label_and_box_reach_the_presented_frame() -> Result<()> {
        // One detection of mislabeled class 1 at high confidence.
        let per_frame = vec![vec![detection(1, 0.81, (10, 10, 100, 100))]];
        let mut controller = LoopController::new(
            stub_camera("stub://cam", 160, 120),
            engine_with(per_frame, &["Speed Limit 20", "Speed Limit 50"]),
            CorrectionTable::builtin(),
            StubPresenter::quit_after(1),
        );

        let report = controller.run()?;
        assert_eq!(report.annotations, 1);

        let presenter = controller.presenter();
        // Green outline corners at (10,10) and (100,100).
        assert_eq!(
            presenter.last_frame_pixel(10, 10),
            Some(crate::annotate::BOX_COLOR)
        );
        assert_eq!(
            presenter.last_frame_pixel(100, 100),
            Some(crate::annotate::BOX_COLOR)
        );
        Ok(())
    }

    #[test]
    fn below_threshold_frame_is_presented_untouched() -> Result<()> {
        let per_frame = vec![vec![detection(7, 0.40, (5, 5, 50, 50))]];

        // Reference: what the synthetic camera produces with no annotation.
        let mut bare = stub_camera("stub://cam", 64, 64);
        let untouched = bare.next_frame().expect("reference frame");

        let mut controller = LoopController::new(
            stub_camera("stub://cam", 64, 64),
            engine_with(per_frame, &[]),
            CorrectionTable::builtin(),
            StubPresenter::quit_after(1),
        );

        let report = controller.run()?;
        assert_eq!(report.annotations, 0);
        assert_eq!(
            controller.presenter().last_frame(),
            Some(untouched.as_bytes())
        );
        Ok(())
    }

    #[test]
    fn detection_fault_is_fatal_but_graceful() -> Result<()> {
        struct FaultyBackend;
        impl crate::detect::DetectorBackend for FaultyBackend {
            fn name(&self) -> &'static str {
                "faulty"
            }
            fn detect(
                &mut self,
                _pixels: &[u8],
                _width: u32,
                _height: u32,
            ) -> Result<Vec<Detection>> {
                Err(anyhow::anyhow!("inference backend fell over"))
            }
        }

        let engine = DetectionEngine::new(Box::new(FaultyBackend), vec![])?;
        let mut controller = LoopController::new(
            stub_camera("stub://cam", 64, 48),
            engine,
            CorrectionTable::builtin(),
            StubPresenter::new(),
        );

        let report = controller.run()?;
        assert_eq!(report.shutdown, ShutdownReason::RuntimeFault);
        assert_eq!(report.frames, 0);
        assert_eq!(controller.state(), LoopState::Closed);
        assert_eq!(controller.presenter().close_calls(), 1);
        Ok(())
    }
}
