//! Owned frame container.
//!
//! One `Frame` is produced per loop iteration, mutated in place by the
//! annotation renderer, shown once, and then dropped. Nothing retains a frame
//! across iterations, which is what keeps the render step free of aliasing
//! concerns.
//!
//! Pixels are RGB8, row-major, `width * height * 3` bytes.

use anyhow::{anyhow, Result};

/// One captured image, owned by the current loop iteration.
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Create a black frame of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize) * 3;
        Self {
            data: vec![0u8; len],
            width,
            height,
        }
    }

    /// Wrap raw RGB bytes produced by a capture backend.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Read one pixel. Returns `None` outside the frame.
    pub fn pixel(&self, x: i64, y: i64) -> Option<[u8; 3]> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Write one pixel. Writes outside the frame are silently skipped, so
    /// callers may draw geometry that extends past the frame edges.
    pub fn put_pixel(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data[idx] = rgb[0];
        self.data[idx + 1] = rgb[1];
        self.data[idx + 2] = rgb[2];
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
