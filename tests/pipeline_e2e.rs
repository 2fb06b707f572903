//! End-to-end loop tests over the stub camera, stub detector, and stub
//! presenter. No hardware, no model artifact, no window.

use anyhow::Result;

use signwatch::{
    annotate, BoundingBox, CameraConfig, CameraSource, CorrectionTable, Detection,
    DetectionEngine, FrameSource, LoopController, ShutdownReason, StubBackend, StubPresenter,
};

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

#[test]
fn mislabeled_sign_is_rendered_with_the_corrected_label() -> Result<()> {
    let detection = Detection {
        class_id: 1,
        confidence: 0.81,
        bbox: BoundingBox::new(10, 10, 100, 100),
    };
    let mut controller = LoopController::new(
        stub_camera("stub://cam", 160, 120),
        engine_with(vec![vec![detection]], &["Speed Limit 20", "Speed Limit 50"]),
        CorrectionTable::builtin(),
        StubPresenter::quit_after(1),
    );

    let report = controller.run()?;
    assert_eq!(report.shutdown, ShutdownReason::OperatorRequest);
    assert_eq!(report.frames, 1);
    assert_eq!(report.annotations, 1);

    // Reproduce the expected frame by hand: same synthetic camera, same box,
    // corrected label. The presented frame must match byte for byte.
    let mut expected = stub_camera("stub://cam", 160, 120)
        .next_frame()
        .expect("reference frame");
    let bbox = BoundingBox::new(10, 10, 100, 100);
    annotate::annotate(&mut expected, &bbox, "Speed Limit 30");

    let presented = controller_last_frame(&controller);
    assert_eq!(presented, expected.as_bytes());

    // The raw model name must NOT have been used.
    let mut wrong = stub_camera("stub://cam", 160, 120)
        .next_frame()
        .expect("reference frame");
    annotate::annotate(&mut wrong, &bbox, "Speed Limit 50");
    assert_ne!(presented, wrong.as_bytes());
    Ok(())
}

#[test]
fn below_threshold_detection_draws_nothing() -> Result<()> {
    let detection = Detection {
        class_id: 7,
        confidence: 0.40,
        bbox: BoundingBox::new(5, 5, 50, 50),
    };
    let mut controller = LoopController::new(
        stub_camera("stub://cam", 64, 64),
        engine_with(vec![vec![detection]], &[]),
        CorrectionTable::builtin(),
        StubPresenter::quit_after(1),
    );

    let report = controller.run()?;
    assert_eq!(report.annotations, 0);

    let untouched = stub_camera("stub://cam", 64, 64)
        .next_frame()
        .expect("reference frame");
    assert_eq!(controller_last_frame(&controller), untouched.as_bytes());
    Ok(())
}

#[test]
fn operator_exit_is_honored_within_one_poll() -> Result<()> {
    let mut controller = LoopController::new(
        stub_camera("stub://cam", 64, 48),
        engine_with(vec![], &[]),
        CorrectionTable::builtin(),
        StubPresenter::quit_after(5),
    );

    let report = controller.run()?;
    assert_eq!(report.shutdown, ShutdownReason::OperatorRequest);
    // Exactly the scripted number of frames: the exit request is observed on
    // the poll directly after the fifth present, never later.
    assert_eq!(report.frames, 5);
    Ok(())
}

#[test]
fn dead_camera_ends_the_run_but_still_cleans_up() -> Result<()> {
    let mut controller = LoopController::new(
        stub_camera("stub://cam?frames=3", 64, 48),
        engine_with(vec![], &[]),
        CorrectionTable::builtin(),
        StubPresenter::new(),
    );

    let report = controller.run()?;
    assert_eq!(report.shutdown, ShutdownReason::CaptureFailure);
    assert_eq!(report.frames, 3);
    Ok(())
}

/// The stub presenter's copy of the last presented frame.
fn controller_last_frame<S: FrameSource>(
    controller: &LoopController<S, StubPresenter>,
) -> &[u8] {
    controller
        .presenter()
        .last_frame()
        .expect("a frame was presented")
}
