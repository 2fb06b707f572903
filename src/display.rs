//! Presentation surface.
//!
//! One titled window shows each annotated frame; the `q` key (or closing the
//! window) requests shutdown. The exit check is a bounded poll on the order
//! of a millisecond, which is also the loop's only suspension point and what
//! paces the refresh.

use std::time::Duration;

use anyhow::Result;

use crate::frame::Frame;

/// Bounded wait for the operator exit poll.
pub const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Where annotated frames go, and where the operator's exit request comes
/// from. The loop controller owns its presenter exclusively and closes it
/// exactly once during shutdown.
pub trait Presenter {
    /// Show one frame.
    fn present(&mut self, frame: &Frame) -> Result<()>;

    /// Poll for an operator exit request, waiting at most
    /// [`EXIT_POLL_INTERVAL`].
    fn exit_requested(&mut self) -> Result<bool>;

    /// Close the presentation surface.
    fn close(&mut self) -> Result<()>;
}

// ----------------------------------------------------------------------------
// Window presenter (minifb)
// ----------------------------------------------------------------------------

/// Titled display window.
#[cfg(feature = "display-minifb")]
pub struct WindowPresenter {
    window: minifb::Window,
    buffer: Vec<u32>,
}

#[cfg(feature = "display-minifb")]
impl WindowPresenter {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self> {
        let window = minifb::Window::new(
            title,
            width as usize,
            height as usize,
            minifb::WindowOptions::default(),
        )?;
        Ok(Self {
            window,
            buffer: Vec::new(),
        })
    }
}

#[cfg(feature = "display-minifb")]
impl Presenter for WindowPresenter {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let pixels = frame.as_bytes();
        self.buffer.clear();
        self.buffer.reserve(pixels.len() / 3);
        for rgb in pixels.chunks_exact(3) {
            self.buffer
                .push(((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32);
        }
        self.window.update_with_buffer(
            &self.buffer,
            frame.width() as usize,
            frame.height() as usize,
        )?;
        Ok(())
    }

    fn exit_requested(&mut self) -> Result<bool> {
        // The present() call above already pumped the event queue; the sleep
        // bounds the poll and paces the refresh.
        std::thread::sleep(EXIT_POLL_INTERVAL);
        Ok(!self.window.is_open() || self.window.is_key_down(minifb::Key::Q))
    }

    fn close(&mut self) -> Result<()> {
        // The window is torn down when it drops; nothing to flush.
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Stub presenter for loop tests
// ----------------------------------------------------------------------------

/// Recording presenter. Scripts an exit request after a fixed number of
/// frames and keeps a copy of the last frame shown, so loop tests can assert
/// on presented output without a display.
pub struct StubPresenter {
    quit_after: Option<u64>,
    frames_presented: u64,
    close_calls: u64,
    last_frame: Option<Vec<u8>>,
    last_frame_size: (u32, u32),
}

impl StubPresenter {
    /// Never requests exit on its own.
    pub fn new() -> Self {
        Self {
            quit_after: None,
            frames_presented: 0,
            close_calls: 0,
            last_frame: None,
            last_frame_size: (0, 0),
        }
    }

    /// Requests exit once `frames` frames have been presented.
    pub fn quit_after(frames: u64) -> Self {
        Self {
            quit_after: Some(frames),
            ..Self::new()
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn close_calls(&self) -> u64 {
        self.close_calls
    }

    /// Raw RGB bytes of the most recently presented frame.
    pub fn last_frame(&self) -> Option<&[u8]> {
        self.last_frame.as_deref()
    }

    /// Read one pixel of the most recently presented frame.
    pub fn last_frame_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let bytes = self.last_frame.as_deref()?;
        let (width, height) = self.last_frame_size;
        if x >= width || y >= height {
            return None;
        }
        let idx = (y as usize * width as usize + x as usize) * 3;
        Some([bytes[idx], bytes[idx + 1], bytes[idx + 2]])
    }
}

impl Default for StubPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for StubPresenter {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.frames_presented += 1;
        self.last_frame = Some(frame.as_bytes().to_vec());
        self.last_frame_size = (frame.width(), frame.height());
        Ok(())
    }

    fn exit_requested(&mut self) -> Result<bool> {
        Ok(self
            .quit_after
            .is_some_and(|quit| self.frames_presented >= quit))
    }

    fn close(&mut self) -> Result<()> {
        self.close_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_presenter_requests_exit_on_schedule() -> Result<()> {
        let mut presenter = StubPresenter::quit_after(2);
        let frame = Frame::new(8, 8);

        presenter.present(&frame)?;
        assert!(!presenter.exit_requested()?);
        presenter.present(&frame)?;
        assert!(presenter.exit_requested()?);
        Ok(())
    }

    #[test]
    fn stub_presenter_records_last_frame() -> Result<()> {
        let mut presenter = StubPresenter::new();
        let mut frame = Frame::new(8, 8);
        frame.put_pixel(3, 4, [9, 8, 7]);

        presenter.present(&frame)?;
        assert_eq!(presenter.frames_presented(), 1);
        assert_eq!(presenter.last_frame_pixel(3, 4), Some([9, 8, 7]));
        assert_eq!(presenter.last_frame_pixel(0, 0), Some([0, 0, 0]));
        Ok(())
    }
}
