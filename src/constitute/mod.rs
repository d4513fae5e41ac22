//! Array-to-raster conversion.
//!
//! The array rank and the request options pick one of these paths:
//!
//! | rank | condition | result |
//! |---|---|---|
//! | 2 | monochrome | one bilevel image |
//! | 2 | no palette | one intensity image |
//! | 2 | palette | one indexed image |
//! | 3 | gray colorspace requested | one intensity image per leading slice |
//! | 3 | palette | one indexed image per leading slice |
//! | 3 | trailing dim not 3 or 4 | one intensity image per leading slice |
//! | 3 | otherwise | one multi-channel image |
//! | 4 | trailing dim 3 or 4 | one multi-channel image per leading slice |
//!
//! Rows are checked top to bottom; the first match wins. With
//! `monochrome`, intensity stacks are binarized frame by frame and float
//! input is never rescaled, whichever path is taken.

mod convert;

use alloc::format;
use enough::Stop;

use crate::buffer::PixelBuffer;
use crate::context::Context;
use crate::error::RasterError;
use crate::layout::LayoutCode;
use crate::limits::Limits;
use crate::normalize::{applies_to, normalize};
use crate::palette::{self, Palette};
use crate::raster::{Colorspace, PixelPacket, RasterSequence};

/// Conversion of a typed array (and optional palette) into raster frames.
///
/// ```
/// use zenraster::{ConstituteRequest, Context, PixelBuffer, Unstoppable};
///
/// let data = [0u8, 64, 128, 255];
/// let buf = PixelBuffer::from_slice(&data, &[2, 2])?;
/// let mut ctx = Context::default();
/// let frames = ConstituteRequest::new(&buf).constitute(&mut ctx, Unstoppable)?;
/// assert_eq!(frames.len(), 1);
/// # Ok::<(), zenraster::RasterError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ConstituteRequest<'a> {
    buffer: &'a PixelBuffer<'a>,
    palette: Option<&'a PixelBuffer<'a>>,
    layout: Option<LayoutCode>,
    palette_layout: Option<LayoutCode>,
    colorspace: Option<Colorspace>,
    monochrome: bool,
    limits: Option<&'a Limits>,
}

/// Selected conversion path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Plan {
    Bitmap,
    Intensity,
    Indexed,
    Direct(LayoutCode),
    BitmapSequence,
    IntensitySequence,
    IndexedSequence,
    DirectSequence(LayoutCode),
}

impl Plan {
    fn is_sequence(&self) -> bool {
        matches!(
            self,
            Plan::BitmapSequence
                | Plan::IntensitySequence
                | Plan::IndexedSequence
                | Plan::DirectSequence(_)
        )
    }
}

impl<'a> ConstituteRequest<'a> {
    pub fn new(buffer: &'a PixelBuffer<'a>) -> Self {
        Self {
            buffer,
            palette: None,
            layout: None,
            palette_layout: None,
            colorspace: None,
            monochrome: false,
            limits: None,
        }
    }

    /// Interpret the array as colormap indexes into `palette` (an `M×3` or
    /// `M×4` array).
    pub fn palette(mut self, palette: &'a PixelBuffer<'a>) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Channel layout of the pixel data. Defaults to `I` for single-channel
    /// data and to `RGB`/`RGBA`/`CMYK` by trailing dimension otherwise.
    pub fn layout(mut self, layout: LayoutCode) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Channel layout of the palette. Defaults by palette width.
    pub fn palette_layout(mut self, layout: LayoutCode) -> Self {
        self.palette_layout = Some(layout);
        self
    }

    /// Requested colorspace. `Gray` forces rank-3 arrays to be read as a
    /// stack of intensity frames; `Cmyk` makes 4-channel data CMYK.
    pub fn colorspace(mut self, colorspace: Colorspace) -> Self {
        self.colorspace = Some(colorspace);
        self
    }

    /// Binarize single-channel data: any element with a nonzero bit pattern
    /// becomes white, zero becomes black.
    pub fn monochrome(mut self, monochrome: bool) -> Self {
        self.monochrome = monochrome;
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Run the conversion. On error nothing is returned; frames built so far
    /// are dropped.
    pub fn constitute(self, ctx: &mut Context, stop: impl Stop) -> Result<RasterSequence, RasterError> {
        let storage = self.buffer.storage()?;
        let rank = self.buffer.rank();
        if !(2..=4).contains(&rank) {
            return Err(RasterError::InvalidShape(format!(
                "array must have 2, 3, or 4 dimensions, got {rank}"
            )));
        }
        tracing::debug!(
            shape = ?self.buffer.shape(),
            ?storage,
            palette = self.palette.is_some(),
            monochrome = self.monochrome,
            "constitute"
        );

        let palette = match self.palette {
            Some(p) => Some(palette::build_from_buffer(
                p,
                self.palette_layout,
                self.colorspace,
                ctx,
            )?),
            None => None,
        };
        let plan = self.plan(palette.is_some())?;

        let contiguous = self.buffer.to_contiguous()?;
        // Float input is rescaled onto [0, 1] unless monochrome was requested.
        let normalized;
        let source = if applies_to(storage) && !self.monochrome {
            normalized = normalize(&contiguous)?;
            &normalized
        } else {
            &contiguous
        };

        let (frames, rows, columns) = if plan.is_sequence() {
            (source.dim(0), source.dim(1), source.dim(2))
        } else {
            (1, source.dim(0), source.dim(1))
        };
        self.check_limits(frames, columns, rows)?;

        let stop: &dyn Stop = &stop;
        let mut job = convert::Job {
            ctx,
            stop,
            storage,
            columns,
            rows,
        };
        let images = match plan {
            Plan::Bitmap => RasterSequence::from(job.bitmap(source.bytes())?),
            Plan::Intensity => {
                RasterSequence::from(job.direct(source.bytes(), &LayoutCode::I)?)
            }
            Plan::Indexed => {
                let palette = require(&palette)?;
                RasterSequence::from(job.indexed(source.bytes(), palette)?)
            }
            Plan::Direct(layout) => RasterSequence::from(job.direct(source.bytes(), &layout)?),
            Plan::BitmapSequence => job.sequence(source, frames, |job, f| job.bitmap(f))?,
            Plan::IntensitySequence => {
                job.sequence(source, frames, |job, f| job.direct(f, &LayoutCode::I))?
            }
            Plan::IndexedSequence => {
                let palette = require(&palette)?;
                job.sequence(source, frames, |job, f| job.indexed(f, palette))?
            }
            Plan::DirectSequence(layout) => {
                job.sequence(source, frames, |job, f| job.direct(f, &layout))?
            }
        };
        Ok(images)
    }

    fn plan(&self, has_palette: bool) -> Result<Plan, RasterError> {
        let buf = self.buffer;
        let plan = match buf.rank() {
            2 if self.monochrome => Plan::Bitmap,
            2 if has_palette => Plan::Indexed,
            2 => Plan::Intensity,
            3 if self.colorspace == Some(Colorspace::Gray) => self.gray_stack(),
            3 if has_palette => Plan::IndexedSequence,
            3 if !(3..=4).contains(&buf.dim(2)) => self.gray_stack(),
            3 => Plan::Direct(self.pixel_layout(buf.dim(2))?),
            _ => {
                if !(3..=4).contains(&buf.dim(3)) {
                    return Err(RasterError::InvalidShape(format!(
                        "last dimension of array must be 3 or 4, got {:?}",
                        buf.shape()
                    )));
                }
                Plan::DirectSequence(self.pixel_layout(buf.dim(3))?)
            }
        };
        // Single-channel paths accept only a one-character layout.
        if let Some(code) = self.layout {
            if !matches!(plan, Plan::Direct(_) | Plan::DirectSequence(_)) && code.len() != 1 {
                return Err(RasterError::InvalidShape(format!(
                    "layout {code} has {} channels, array has 1",
                    code.len()
                )));
            }
        }
        if has_palette && !matches!(plan, Plan::Indexed | Plan::IndexedSequence) {
            tracing::debug!(?plan, "palette ignored");
        }
        Ok(plan)
    }

    fn gray_stack(&self) -> Plan {
        if self.monochrome {
            Plan::BitmapSequence
        } else {
            Plan::IntensitySequence
        }
    }

    fn pixel_layout(&self, channels: usize) -> Result<LayoutCode, RasterError> {
        match self.layout {
            Some(code) if code.len() != channels => Err(RasterError::InvalidShape(format!(
                "layout {code} has {} channels, array has {channels}",
                code.len()
            ))),
            Some(code) => Ok(code),
            None => LayoutCode::infer(channels, self.colorspace),
        }
    }

    fn check_limits(&self, frames: usize, columns: usize, rows: usize) -> Result<(), RasterError> {
        let Some(limits) = self.limits else {
            return Ok(());
        };
        limits.check_frames(frames)?;
        limits.check(columns, rows)?;
        limits.check_memory(
            columns
                .saturating_mul(rows)
                .saturating_mul(core::mem::size_of::<PixelPacket>()),
        )
    }
}

fn require(palette: &Option<Palette>) -> Result<&Palette, RasterError> {
    palette
        .as_ref()
        .ok_or_else(|| RasterError::InvalidShape("indexed conversion without a palette".into()))
}

/// Constitute frames from `buffer` with default options, optionally with an
/// explicit pixel layout and a palette.
pub fn constitute(
    buffer: &PixelBuffer<'_>,
    layout: Option<LayoutCode>,
    palette: Option<&PixelBuffer<'_>>,
    ctx: &mut Context,
    stop: impl Stop,
) -> Result<RasterSequence, RasterError> {
    let mut req = ConstituteRequest::new(buffer);
    if let Some(layout) = layout {
        req = req.layout(layout);
    }
    if let Some(palette) = palette {
        req = req.palette(palette);
    }
    req.constitute(ctx, stop)
}
