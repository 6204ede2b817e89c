//! Frame differencing motion detector
//!
//! The camera image is shrunk to a small RGBA buffer (80x60 by default) and
//! compared pixel by pixel against the previous buffer. Pixels whose summed
//! RGB delta exceeds the threshold become motion points, scaled back up to
//! canvas coordinates.

use glam::Vec2;
use thiserror::Error;

use crate::CanvasSize;

/// Malformed frame buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame has zero size ({width}x{height})")]
    ZeroSize { width: u32, height: u32 },
    #[error("frame buffer is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BadLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A low-resolution RGBA8 snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct MotionFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MotionFrame {
    /// Wrap an RGBA byte buffer (`width * height * 4` bytes)
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        check_len(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Nearest-neighbour downsample of a full-size RGBA image.
    ///
    /// With `mirror` set the result is flipped horizontally, matching the
    /// mirrored camera view the player sees.
    pub fn downsample(
        src: &[u8],
        src_width: u32,
        src_height: u32,
        width: u32,
        height: u32,
        mirror: bool,
    ) -> Result<Self, FrameError> {
        check_len(src_width, src_height, src.len())?;
        check_len(width, height, width as usize * height as usize * 4)?;

        let src_px: &[[u8; 4]] = bytemuck::cast_slice(src);
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            let sy = (y as u64 * src_height as u64 / height as u64) as usize;
            for x in 0..width {
                let dx = if mirror { width - 1 - x } else { x };
                let sx = (dx as u64 * src_width as u64 / width as u64) as usize;
                data.extend_from_slice(&src_px[sy * src_width as usize + sx]);
            }
        }
        MotionFrame::from_rgba(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// View as `[r, g, b, a]` pixels
    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

fn check_len(width: u32, height: u32, actual: usize) -> Result<(), FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::ZeroSize { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if actual != expected {
        return Err(FrameError::BadLength {
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Summed absolute RGB difference (alpha ignored)
#[inline]
pub fn rgb_delta(a: [u8; 4], b: [u8; 4]) -> u32 {
    u32::from(a[0].abs_diff(b[0])) + u32::from(a[1].abs_diff(b[1])) + u32::from(a[2].abs_diff(b[2]))
}

/// Keeps the previous frame and reports motion against it
#[derive(Debug, Clone, Default)]
pub struct FrameDifferencer {
    previous: Option<MotionFrame>,
}

impl FrameDifferencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the stored frame so the next call only seeds the buffer
    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Compare `frame` with the previous one and return canvas-space motion
    /// points. The frame always becomes the new previous frame.
    pub fn detect(&mut self, frame: MotionFrame, threshold: u32, canvas: CanvasSize) -> Vec<Vec2> {
        let points = match &self.previous {
            Some(prev) if prev.width == frame.width && prev.height == frame.height => {
                diff_points(prev, &frame, threshold, canvas)
            }
            Some(_) => {
                log::debug!(
                    "Motion buffer size changed to {}x{}, reseeding",
                    frame.width,
                    frame.height
                );
                Vec::new()
            }
            None => Vec::new(),
        };
        self.previous = Some(frame);
        points
    }
}

fn diff_points(
    prev: &MotionFrame,
    cur: &MotionFrame,
    threshold: u32,
    canvas: CanvasSize,
) -> Vec<Vec2> {
    let w = cur.width as usize;
    let scale = Vec2::new(
        canvas.width / cur.width as f32,
        canvas.height / cur.height as f32,
    );

    prev.pixels()
        .iter()
        .zip(cur.pixels())
        .enumerate()
        .filter(|(_, (a, b))| rgb_delta(**a, **b) > threshold)
        .map(|(i, _)| Vec2::new((i % w) as f32, (i / w) as f32) * scale)
        .collect()
}
