//! V4L2 capture backend.
//!
//! Wraps a local V4L2 device node (e.g. /dev/video0). The requested format is
//! 24-bit RGB at the configured size; if the device refuses, whatever format
//! it reports after the attempt is treated as active and downstream geometry
//! follows it.

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use super::camera::CameraConfig;
use super::{CaptureError, SourceStats};
use crate::frame::Frame;

pub(super) struct V4l2CameraSource {
    config: CameraConfig,
    state: Option<V4l2State>,
    frame_count: u64,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2CameraSource {
    pub(super) fn new(config: CameraConfig) -> Result<Self> {
        Ok(Self {
            active_width: config.width,
            active_height: config.height,
            config,
            state: None,
            frame_count: 0,
        })
    }

    pub(super) fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "CameraSource: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        self.active_width = format.width;
        self.active_height = format.height;

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "CameraSource: connected to {} ({}x{})",
            self.config.device,
            self.active_width,
            self.active_height
        );
        Ok(())
    }

    pub(super) fn active_width(&self) -> u32 {
        self.active_width
    }

    pub(super) fn active_height(&self) -> u32 {
        self.active_height
    }

    pub(super) fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().ok_or(CaptureError::NotConnected)?;
        let (buf, _meta) = state
            .with_mut(|fields| fields.stream.next())
            .map_err(|err| CaptureError::Device(err.to_string()))?;

        self.frame_count += 1;

        Frame::from_raw(buf.to_vec(), self.active_width, self.active_height)
            .map_err(|e| CaptureError::Device(e.to_string()))
    }

    pub(super) fn release(&mut self) {
        // Dropping the state closes the stream and the device node.
        self.state = None;
    }

    pub(super) fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            device: self.config.device.clone(),
        }
    }
}
