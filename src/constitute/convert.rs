use alloc::vec::Vec;
use enough::Stop;

use crate::buffer::PixelBuffer;
use crate::context::Context;
use crate::error::RasterError;
use crate::layout::{Channel, ChannelSlot, Classification, LayoutCode};
use crate::palette::Palette;
use crate::pixel::{Samples, StorageType};
use crate::quantum::{scale_to_index, to_quantum};
use crate::raster::{Colorspace, ImageType, RasterImage, RasterSequence};

/// Rows converted between cancellation checks.
const ROWS_PER_CHECK: usize = 16;

/// Per-frame conversion state shared by every path.
pub(super) struct Job<'c, 's> {
    pub(super) ctx: &'c mut Context,
    pub(super) stop: &'s dyn Stop,
    pub(super) storage: StorageType,
    pub(super) columns: usize,
    pub(super) rows: usize,
}

impl Job<'_, '_> {
    fn check_len(&self, frame: &[u8], channels: usize) -> Result<(), RasterError> {
        let needed = self
            .columns
            .checked_mul(self.rows)
            .and_then(|n| n.checked_mul(channels * self.storage.bytes()))
            .ok_or_else(|| RasterError::InvalidShape("frame size overflows usize".into()))?;
        if frame.len() < needed {
            return Err(RasterError::BufferTooSmall {
                needed,
                actual: frame.len(),
            });
        }
        Ok(())
    }

    fn allocate(&mut self) -> Result<RasterImage, RasterError> {
        let (columns, rows) = (self.columns, self.rows);
        self.ctx.guard("image allocation", |_, exc| {
            RasterImage::allocate(columns, rows, exc)
        })
    }

    /// One direct-class image with channels assigned per `layout`.
    pub(super) fn direct(&mut self, frame: &[u8], layout: &LayoutCode) -> Result<RasterImage, RasterError> {
        self.check_len(frame, layout.len())?;
        let mut image = self.allocate()?;
        let depth = self.ctx.depth();

        let mut samples = Samples::new(frame, self.storage);
        for (y, row) in image.rows_mut().enumerate() {
            if y % ROWS_PER_CHECK == 0 {
                self.stop.check()?;
            }
            for px in row.iter_mut() {
                for (channel, sample) in layout.channels().zip(&mut samples) {
                    let q = to_quantum(sample, depth);
                    match channel {
                        Channel::Intensity => {
                            px.r = q;
                            px.g = q;
                            px.b = q;
                        }
                        Channel::Slot(ChannelSlot::Red) => px.r = q,
                        Channel::Slot(ChannelSlot::Green) => px.g = q,
                        Channel::Slot(ChannelSlot::Blue) => px.b = q,
                        Channel::Slot(ChannelSlot::Opacity) => px.a = q,
                    }
                }
            }
        }

        let class = layout.classify();
        image.set_colorspace(class.colorspace);
        image.set_matte(class.has_alpha);
        image.set_image_type(direct_type(layout, class), depth);
        Ok(image)
    }

    /// One bilevel image: nonzero elements become white.
    pub(super) fn bitmap(&mut self, frame: &[u8]) -> Result<RasterImage, RasterError> {
        self.check_len(frame, 1)?;
        let count = self.columns * self.rows;
        let mut bits = Vec::new();
        bits.try_reserve_exact(count)
            .map_err(|_| RasterError::AllocationFailure("bitmap frame".into()))?;
        bits.extend(
            Samples::new(frame, self.storage)
                .take(count)
                .map(|s| if s.is_zero_bits() { 0u8 } else { u8::MAX }),
        );

        let storage = core::mem::replace(&mut self.storage, StorageType::UInt8);
        let image = self.direct(&bits, &LayoutCode::I);
        self.storage = storage;
        let mut image = image?;
        image.set_image_type(ImageType::Bilevel, self.ctx.depth());
        Ok(image)
    }

    /// One indexed image whose elements are scaled onto `palette`.
    ///
    /// Out-of-range indexes are reported as warnings by the raster layer and
    /// replaced by index 0.
    pub(super) fn indexed(&mut self, frame: &[u8], palette: &Palette) -> Result<RasterImage, RasterError> {
        self.check_len(frame, 1)?;
        let mut image = self.allocate()?;
        self.ctx.guard("colormap attach", |_, exc| {
            image.set_colormap(palette.colormap.clone(), exc)
        })?;
        let colors = palette.colormap.len();

        let mut samples = Samples::new(frame, self.storage);
        for y in 0..self.rows {
            if y % ROWS_PER_CHECK == 0 {
                self.stop.check()?;
            }
            let base = y * self.columns;
            for (x, sample) in (&mut samples).take(self.columns).enumerate() {
                image.set_index(
                    base + x,
                    scale_to_index(sample, colors),
                    self.ctx.exception_mut(),
                );
            }
            self.ctx.check()?;
        }

        let class = palette.classify();
        image.set_colorspace(class.colorspace);
        image.set_matte(class.has_alpha);
        let image_type = if class.has_alpha {
            ImageType::PaletteMatte
        } else {
            ImageType::Palette
        };
        image.set_image_type(image_type, self.ctx.depth());
        Ok(image)
    }

    /// Convert each slice along the leading dimension of `source` with
    /// `each`, appending in order.
    pub(super) fn sequence(
        &mut self,
        source: &PixelBuffer<'_>,
        frames: usize,
        mut each: impl FnMut(&mut Self, &[u8]) -> Result<RasterImage, RasterError>,
    ) -> Result<RasterSequence, RasterError> {
        let mut out = RasterSequence::new();
        for k in 0..frames {
            self.stop.check()?;
            tracing::trace!(frame = k, frames, "constituting frame");
            let image = each(self, source.frame_bytes(k))?;
            out.push(image);
        }
        Ok(out)
    }
}

fn direct_type(layout: &LayoutCode, class: Classification) -> ImageType {
    let gray = layout.channels().any(|c| c == Channel::Intensity);
    match (gray, class.colorspace, class.has_alpha) {
        (true, _, false) => ImageType::Grayscale,
        (true, _, true) => ImageType::GrayscaleMatte,
        (false, Colorspace::Cmyk, false) => ImageType::ColorSeparation,
        (false, Colorspace::Cmyk, true) => ImageType::ColorSeparationMatte,
        (false, _, false) => ImageType::TrueColor,
        (false, _, true) => ImageType::TrueColorMatte,
    }
}
