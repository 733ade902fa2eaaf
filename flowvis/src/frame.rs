//! # Video frames and stream metadata

use crate::error::{Error, Result};
use bytemuck::{Pod, Zeroable};

/// BGR colour structure.
///
/// Channel order matches what video backends hand out, so frames can be copied in and out
/// without swizzling.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Bgr {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Bgr {
    pub const fn new(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }
}

/// Rectangular raster of BGR pixels.
///
/// Frames are immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<Bgr>,
}

impl Frame {
    /// Create a frame from packed BGR bytes in row-major order.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the frame in pixels.
    /// * `height` - height of the frame in pixels.
    /// * `data` - `width * height * 3` bytes.
    pub fn from_bytes(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        if data.len() != width * height * 3 {
            return Err(Error::InvalidFrame(format!(
                "expected {} bytes for {width}x{height}, got {}",
                width * height * 3,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels: bytemuck::cast_slice::<u8, Bgr>(data).to_vec(),
        })
    }

    /// Create a frame from pixels in row-major order.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Bgr>) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(Error::InvalidFrame(format!(
                "expected {} pixels for {width}x{height}, got {}",
                width * height,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a frame filled with a single colour.
    pub fn filled(width: usize, height: usize, colour: Bgr) -> Self {
        Self {
            width,
            height,
            pixels: vec![colour; width * height],
        }
    }

    /// Get width and height of the frame.
    pub fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Bgr] {
        &self.pixels
    }

    /// Packed BGR bytes in row-major order.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Get pixel at coordinates.
    pub fn get(&self, x: usize, y: usize) -> Bgr {
        self.pixels[y * self.width + x]
    }
}

/// Properties of a video stream captured when it is opened.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    pub width: usize,
    pub height: usize,
    pub frame_rate: f64,
    /// Number of frames reported by the container.
    ///
    /// This is only a hint. Some containers misreport it, and `None` is stored when the
    /// container reports nothing useful.
    pub frame_count: Option<u64>,
}

impl Metadata {
    /// Get width and height of the stream.
    pub fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}
