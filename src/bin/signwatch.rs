//! signwatch - traffic sign recognition overlay
//!
//! Startup order matters: the model is loaded first and a load failure is
//! fatal before any capture device is opened. Then the camera is connected,
//! the window opened, and the loop runs until the operator presses `q` or the
//! camera dies.

use anyhow::{anyhow, Result};

use signwatch::{
    CameraConfig, CameraSource, CorrectionTable, DetectionEngine, LoopController, ShutdownReason,
    SignwatchConfig,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = SignwatchConfig::load()?;
    log::info!("signwatch {}", env!("CARGO_PKG_VERSION"));

    // Model first. A missing or unreadable artifact must abort before any
    // device is opened.
    let engine = build_engine(&cfg)?;
    log::info!(
        "model ready ({} backend) from {}",
        engine.backend_name(),
        cfg.model_path
    );

    let mut source = CameraSource::new(CameraConfig {
        device: cfg.camera.device.clone(),
        width: cfg.camera.width,
        height: cfg.camera.height,
    })?;
    source.connect()?;
    log::info!(
        "camera {} active at {}x{}",
        cfg.camera.device,
        source.active_width(),
        source.active_height()
    );

    let presenter = open_presenter(&cfg, source.active_width(), source.active_height())?;
    log::info!("system ready, press 'q' in the window to exit");

    let mut controller =
        LoopController::new(source, engine, CorrectionTable::builtin(), presenter);
    let report = controller.run()?;

    match report.shutdown {
        ShutdownReason::OperatorRequest => log::info!(
            "stopped by operator after {} frames ({} annotations)",
            report.frames,
            report.annotations
        ),
        reason => log::error!(
            "stopped after {} frames: {:?} ({} annotations)",
            report.frames,
            reason,
            report.annotations
        ),
    }
    Ok(())
}

/// Load the detection engine for the configured model path.
///
/// `stub://` model paths select the scripted motion stub (demo runs without a
/// model artifact); real paths require the `backend-tract` feature.
fn build_engine(cfg: &SignwatchConfig) -> Result<DetectionEngine> {
    if cfg.model_path.starts_with("stub://") {
        let names = vec![
            "Speed Limit 20".to_string(),
            "Speed Limit 50".to_string(),
        ];
        return DetectionEngine::new(Box::new(signwatch::StubBackend::motion()), names);
    }

    #[cfg(feature = "backend-tract")]
    {
        // Fixed model input size; the backend resamples camera frames to it
        // and maps boxes back to frame coordinates.
        const MODEL_INPUT_WIDTH: u32 = 640;
        const MODEL_INPUT_HEIGHT: u32 = 640;

        let engine = DetectionEngine::load(
            std::path::Path::new(&cfg.model_path),
            MODEL_INPUT_WIDTH,
            MODEL_INPUT_HEIGHT,
        )
        .map_err(|e| {
            log::error!("{}", e);
            anyhow!("cannot start without a model: {}", e)
        })?;
        Ok(engine)
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        Err(anyhow!(
            "model {} requires the backend-tract feature",
            cfg.model_path
        ))
    }
}

#[cfg(feature = "display-minifb")]
fn open_presenter(
    cfg: &SignwatchConfig,
    width: u32,
    height: u32,
) -> Result<signwatch::WindowPresenter> {
    signwatch::WindowPresenter::open(&cfg.window_title, width, height)
}

#[cfg(not(feature = "display-minifb"))]
fn open_presenter(
    _cfg: &SignwatchConfig,
    _width: u32,
    _height: u32,
) -> Result<signwatch::StubPresenter> {
    Err(anyhow!(
        "the operator window requires the display-minifb feature"
    ))
}
