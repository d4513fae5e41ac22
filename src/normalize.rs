//! Affine rescale of float arrays into `[0, 1]`.
//!
//! Float and double inputs are interpreted as unit-range intensities. Before
//! conversion, an input whose values fall outside `[0, 1]` is mapped with
//! `(v - min) / (max - min)` onto a private copy; the caller's buffer is never
//! written. A constant input outside the unit range becomes all zeros.

use alloc::vec::Vec;

use crate::buffer::PixelBuffer;
use crate::error::RasterError;
use crate::pixel::{Sample, StorageType};

/// Normalize a contiguous float buffer.
///
/// Integer buffers and float buffers already within `[0, 1]` are returned as a
/// borrowed view. NaN elements are ignored when finding the range.
pub fn normalize<'b>(buffer: &'b PixelBuffer<'_>) -> Result<PixelBuffer<'b>, RasterError> {
    let storage = buffer.storage()?;
    let view = buffer.to_contiguous()?;
    if !storage.is_float() || view.is_empty() {
        return Ok(view);
    }

    let (min, max) = view
        .samples(storage)
        .map(unit_value)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if max <= 1.0 && min >= 0.0 {
        return Ok(view);
    }
    let diff = max - min;
    tracing::trace!(min, max, elements = view.len(), "normalizing float buffer");

    let mut out = Vec::new();
    out.try_reserve_exact(view.len() * storage.bytes())
        .map_err(|_| RasterError::AllocationFailure("normalized copy".into()))?;
    for s in view.samples(storage) {
        let n = match s {
            Sample::F32(_) if diff == 0.0 => Sample::F32(0.0),
            Sample::F64(_) if diff == 0.0 => Sample::F64(0.0),
            Sample::F32(v) => Sample::F32((v - min as f32) / diff as f32),
            Sample::F64(v) => Sample::F64((v - min) / diff),
            other => other,
        };
        n.write_ne(&mut out);
    }
    PixelBuffer::from_vec(out, buffer.element(), buffer.shape())
}

fn unit_value(s: Sample) -> f64 {
    match s {
        Sample::F32(v) => f64::from(v),
        Sample::F64(v) => v,
        _ => 0.0,
    }
}

/// Whether `storage` is subject to normalization.
pub(crate) fn applies_to(storage: StorageType) -> bool {
    storage.is_float()
}
