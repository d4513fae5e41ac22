/// Caps on what a single conversion may build.
///
/// Constitution checks each frame's columns and rows, the stack length and
/// the pixel cache of one frame. Extraction checks the size of the output
/// array. A field left at `None` is not checked.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Pixels in one frame (columns * rows).
    pub max_pixels: Option<u64>,
    /// Length of the leading stack dimension.
    pub max_frames: Option<u64>,
    /// Bytes of one frame's pixel cache, or of the whole extracted array.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Columns and rows of one frame.
    pub(crate) fn check(&self, columns: usize, rows: usize) -> Result<(), crate::RasterError> {
        let (width, height) = (columns as u64, rows as u64);
        if let Some(max_w) = self.max_width {
            if width > max_w {
                return Err(crate::RasterError::LimitExceeded(alloc::format!(
                    "frame width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if height > max_h {
                return Err(crate::RasterError::LimitExceeded(alloc::format!(
                    "frame height {height} exceeds limit {max_h}"
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = width.saturating_mul(height);
            if pixels > max_px {
                return Err(crate::RasterError::LimitExceeded(alloc::format!(
                    "frame of {pixels} pixels exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }

    /// Number of frames in a stack.
    pub(crate) fn check_frames(&self, frames: usize) -> Result<(), crate::RasterError> {
        if let Some(max_f) = self.max_frames {
            if frames as u64 > max_f {
                return Err(crate::RasterError::LimitExceeded(alloc::format!(
                    "frame count {frames} exceeds limit {max_f}"
                )));
            }
        }
        Ok(())
    }

    /// Size of a pixel cache or output array.
    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), crate::RasterError> {
        if let Some(max_mem) = self.max_memory_bytes {
            if bytes as u64 > max_mem {
                return Err(crate::RasterError::LimitExceeded(alloc::format!(
                    "{bytes} byte buffer exceeds memory limit {max_mem}"
                )));
            }
        }
        Ok(())
    }
}
