//! Raster-to-array conversion.
//!
//! The first frame decides the output form for the whole sequence:
//!
//! * indexed with at most 256 colors: integer requests yield `u8` colormap
//!   indexes, float requests yield luminance (`I`) at the requested type;
//! * otherwise: `CMYK`, `RGBA` or `RGB` channels (by colorspace and matte).
//!   Integer requests are delivered at the quantum width (raw transfer),
//!   float requests at the requested type scaled to `[0, 1]`.
//!
//! A single frame has no leading frame dimension.

use alloc::format;
use alloc::vec::Vec;
use enough::Stop;

use crate::buffer::PixelBuffer;
use crate::context::Context;
use crate::error::RasterError;
use crate::layout::LayoutCode;
use crate::limits::Limits;
use crate::pixel::{ElementType, StorageType};
use crate::raster::{
    Colorspace, RasterImage, RasterSequence, export_colormap, export_pixels,
};

/// Largest colormap still exported as `u8` indexes.
pub const MAX_INDEXED_COLORS: usize = 256;

/// Conversion of raster frames into one typed array.
///
/// ```
/// use zenraster::{ConstituteRequest, Context, ExtractRequest, PixelBuffer, StorageType, Unstoppable};
///
/// let data = [0u8, 255, 255, 0];
/// let buf = PixelBuffer::from_slice(&data, &[2, 2])?;
/// let mut ctx = Context::default();
/// let frames = ConstituteRequest::new(&buf).constitute(&mut ctx, Unstoppable)?;
/// let out = ExtractRequest::new(&frames, StorageType::Float64).extract(&mut ctx, Unstoppable)?;
/// assert_eq!(out.shape(), &[2, 2, 3]);
/// # Ok::<(), zenraster::RasterError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ExtractRequest<'a> {
    images: &'a RasterSequence,
    storage: StorageType,
    limits: Option<&'a Limits>,
}

/// Output form chosen from the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Selection {
    Indexes,
    Pixels { map: LayoutCode, storage: StorageType },
}

impl Selection {
    fn storage(&self) -> StorageType {
        match self {
            Selection::Indexes => StorageType::UInt8,
            Selection::Pixels { storage, .. } => *storage,
        }
    }

    fn channels(&self) -> usize {
        match self {
            Selection::Indexes => 1,
            Selection::Pixels { map, .. } => map.len(),
        }
    }

    fn single_channel(&self) -> bool {
        match self {
            Selection::Indexes => true,
            Selection::Pixels { map, .. } => *map == LayoutCode::I,
        }
    }
}

impl<'a> ExtractRequest<'a> {
    /// Request `storage` elements. Integer requests are honoured as `u8`
    /// indexes or as the quantum-width type; see the module docs.
    pub fn new(images: &'a RasterSequence, storage: StorageType) -> Self {
        Self {
            images,
            storage,
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn extract(self, ctx: &mut Context, stop: impl Stop) -> Result<PixelBuffer<'static>, RasterError> {
        let first = self
            .images
            .first()
            .ok_or_else(|| RasterError::InvalidShape("no frames to extract".into()))?;
        let frames = self.images.len();
        let (columns, rows) = (first.columns(), first.rows());
        let selection = select(first, self.storage, ctx);
        tracing::debug!(frames, columns, rows, requested = ?self.storage, ?selection, "extract");

        let frame_bytes = columns
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(selection.channels() * selection.storage().bytes()))
            .ok_or_else(|| RasterError::InvalidShape("frame size overflows usize".into()))?;
        let total = frame_bytes
            .checked_mul(frames)
            .ok_or_else(|| RasterError::InvalidShape("output size overflows usize".into()))?;
        if let Some(limits) = self.limits {
            limits.check_frames(frames)?;
            limits.check(columns, rows)?;
            limits.check_memory(total)?;
        }

        self.images.for_each_frame(|k, image| {
            if image.columns() != columns || image.rows() != rows {
                return Err(RasterError::InvalidShape(format!(
                    "frame {k} is {}x{}, first frame is {columns}x{rows}",
                    image.columns(),
                    image.rows()
                )));
            }
            if image.is_pseudo() != first.is_pseudo() {
                return Err(RasterError::InvalidShape(format!(
                    "frame {k} storage class differs from the first frame"
                )));
            }
            if selection == Selection::Indexes && image.colors() > MAX_INDEXED_COLORS {
                return Err(RasterError::InvalidShape(format!(
                    "frame {k} has {} colors, indexes need at most {MAX_INDEXED_COLORS}",
                    image.colors()
                )));
            }
            Ok(())
        })?;

        let mut out = Vec::new();
        out.try_reserve_exact(total)
            .map_err(|_| RasterError::AllocationFailure(format!("{total} byte output array")))?;
        for (k, image) in self.images.iter().enumerate() {
            stop.check()?;
            tracing::trace!(frame = k, frames, "extracting frame");
            match selection {
                Selection::Indexes => write_indexes(image, &mut out),
                Selection::Pixels { map, storage } => {
                    ctx.guard("pixel export", |depth, exc| {
                        export_pixels(image, &map, storage, depth, &mut out, exc)
                    })?;
                }
            }
        }

        let mut shape = Vec::with_capacity(4);
        if frames > 1 {
            shape.push(frames);
        }
        shape.extend([rows, columns]);
        if !selection.single_channel() {
            shape.push(selection.channels());
        }
        PixelBuffer::from_vec(out, ElementType::from(selection.storage()), &shape)
    }
}

fn select(first: &RasterImage, requested: StorageType, ctx: &Context) -> Selection {
    if first.is_pseudo() && first.colors() <= MAX_INDEXED_COLORS {
        if requested.is_float() {
            Selection::Pixels {
                map: LayoutCode::I,
                storage: requested,
            }
        } else {
            Selection::Indexes
        }
    } else {
        let storage = if requested.is_float() {
            requested
        } else {
            ctx.depth().preferred_storage()
        };
        Selection::Pixels {
            map: direct_map(first),
            storage,
        }
    }
}

/// Channel map for direct export of `image`.
fn direct_map(image: &RasterImage) -> LayoutCode {
    if image.colorspace() == Colorspace::Cmyk {
        LayoutCode::CMYK
    } else if image.matte() {
        LayoutCode::RGBA
    } else {
        LayoutCode::RGB
    }
}

fn write_indexes(image: &RasterImage, out: &mut Vec<u8>) {
    let indexes = image.indexes().unwrap_or_default();
    out.extend(indexes.iter().map(|&i| i as u8));
}

/// Export the colormap of an indexed image as a `colors × channels` array at
/// the quantum-width storage type. Four channels (`CMYK` or `RGBA`) when the
/// image is CMYK or has matte, else `RGB`.
///
/// Returns `None` for direct-class images.
pub fn colormap_buffer(
    image: &RasterImage,
    ctx: &mut Context,
) -> Result<Option<PixelBuffer<'static>>, RasterError> {
    let Some(colormap) = image.colormap() else {
        return Ok(None);
    };
    let map = direct_map(image);
    let storage = ctx.depth().preferred_storage();
    let mut out = Vec::new();
    ctx.guard("colormap export", |depth, exc| {
        export_colormap(colormap, &map, storage, depth, &mut out, exc)
    })?;
    PixelBuffer::from_vec(out, ElementType::from(storage), &[colormap.len(), map.len()]).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::QuantumDepth;
    use crate::raster::{Colormap, PixelPacket};
    use enough::Unstoppable;

    fn gray(columns: usize, rows: usize, v: u32) -> RasterImage {
        let mut exc = Default::default();
        let mut img = RasterImage::allocate(columns, rows, &mut exc).unwrap();
        for row in img.rows_mut() {
            for px in row {
                *px = PixelPacket { r: v, g: v, b: v, a: 0 };
            }
        }
        img
    }

    #[test]
    fn integer_request_uses_quantum_width() {
        let mut ctx = Context::new(QuantumDepth::Q16);
        let seq = RasterSequence::from(gray(2, 1, 1234));
        let out = ExtractRequest::new(&seq, StorageType::UInt8)
            .extract(&mut ctx, Unstoppable)
            .unwrap();
        assert_eq!(out.element(), ElementType::UInt16);
        assert_eq!(out.shape(), &[1, 2, 3]);
        assert_eq!(out.to_vec::<u16>().unwrap(), [1234; 6]);
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let mut ctx = Context::default();
        let seq = RasterSequence::new();
        assert!(matches!(
            ExtractRequest::new(&seq, StorageType::UInt8).extract(&mut ctx, Unstoppable),
            Err(RasterError::InvalidShape(_))
        ));
    }

    #[test]
    fn mismatched_frame_size_is_rejected() {
        let mut ctx = Context::default();
        let seq: RasterSequence = [gray(2, 2, 0), gray(2, 3, 0)].into_iter().collect();
        assert!(matches!(
            ExtractRequest::new(&seq, StorageType::Float32).extract(&mut ctx, Unstoppable),
            Err(RasterError::InvalidShape(_))
        ));
    }

    #[test]
    fn large_colormap_falls_back_to_direct() {
        let mut ctx = Context::new(QuantumDepth::Q16);
        let mut exc = Default::default();
        let mut img = gray(1, 1, 0);
        img.set_colormap(Colormap::allocate(300, &mut exc).unwrap(), &mut exc)
            .unwrap();
        let seq = RasterSequence::from(img);
        let out = ExtractRequest::new(&seq, StorageType::UInt8)
            .extract(&mut ctx, Unstoppable)
            .unwrap();
        assert_eq!(out.shape(), &[1, 1, 3]);
    }

    #[test]
    fn colormap_export_is_none_for_direct() {
        let mut ctx = Context::default();
        assert!(colormap_buffer(&gray(1, 1, 0), &mut ctx).unwrap().is_none());
    }
}
