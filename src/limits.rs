//! Resource limits.

use crate::error::JpegError;

/// Resource limits for decode operations.
///
/// Checked after the probe phase and before the pixel buffer is allocated.
/// All limits are optional.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    /// Maximum image width in pixels.
    pub max_width: Option<u64>,
    /// Maximum image height in pixels.
    pub max_height: Option<u64>,
    /// Maximum total pixels (width x height).
    pub max_pixels: Option<u64>,
    /// Maximum pixel buffer allocation in bytes.
    pub max_memory_bytes: Option<u64>,
    /// Maximum compressed input size in bytes.
    pub max_input_bytes: Option<u64>,
}

impl Limits {
    /// No restrictions.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = Some(pixels);
        self
    }

    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    pub fn with_max_input_bytes(mut self, bytes: u64) -> Self {
        self.max_input_bytes = Some(bytes);
        self
    }

    /// Check if dimensions are within limits.
    pub fn check_dimensions(&self, width: u64, height: u64) -> Result<(), JpegError> {
        if let Some(max_width) = self.max_width {
            if width > max_width {
                return Err(exceeded("width", width, max_width));
            }
        }

        if let Some(max_height) = self.max_height {
            if height > max_height {
                return Err(exceeded("height", height, max_height));
            }
        }

        if let Some(max_pixels) = self.max_pixels {
            let pixels = width.saturating_mul(height);
            if pixels > max_pixels {
                return Err(exceeded("pixel count", pixels, max_pixels));
            }
        }

        Ok(())
    }

    /// Check if a pixel buffer allocation is within limits.
    pub fn check_memory(&self, bytes: u64) -> Result<(), JpegError> {
        match self.max_memory_bytes {
            Some(max) if bytes > max => Err(exceeded("allocation", bytes, max)),
            _ => Ok(()),
        }
    }

    /// Check compressed input size.
    pub fn check_input(&self, bytes: u64) -> Result<(), JpegError> {
        match self.max_input_bytes {
            Some(max) if bytes > max => Err(exceeded("input size", bytes, max)),
            _ => Ok(()),
        }
    }
}

fn exceeded(what: &str, got: u64, max: u64) -> JpegError {
    JpegError::LimitExceeded(alloc::format!("{what} {got} exceeds limit {max}"))
}
