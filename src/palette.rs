//! Colormap construction from a flat color table.

use alloc::format;
use alloc::vec::Vec;

use crate::buffer::PixelBuffer;
use crate::context::Context;
use crate::error::RasterError;
use crate::layout::{ChannelSlot, Classification, LayoutCode};
use crate::normalize::normalize;
use crate::pixel::{Samples, StorageType};
use crate::quantum::to_quantum;
use crate::raster::{Colorspace, Colormap};

/// A built colormap together with the layout it was read with.
#[derive(Clone, Debug)]
pub struct Palette {
    pub colormap: Colormap,
    pub layout: LayoutCode,
}

impl Palette {
    /// Colorspace and alpha presence of images using this palette.
    pub fn classify(&self) -> Classification {
        self.layout.classify()
    }
}

/// Build a colormap of `colors` entries from `table`.
///
/// Scalars are consumed entry-major, one per layout character, and each is
/// converted with [`to_quantum`] into the slot the character names. Opacity
/// starts opaque and is only overwritten by an `A`/`K` channel. Float tables
/// must already be normalized.
pub fn build(
    storage: StorageType,
    table: &[u8],
    layout: &LayoutCode,
    colors: usize,
    ctx: &mut Context,
) -> Result<Colormap, RasterError> {
    let max = ctx.depth().max_colormap_size();
    if colors > max {
        return Err(RasterError::TooManyColors { colors, max });
    }
    let needed = colors * layout.len() * storage.bytes();
    if table.len() < needed {
        return Err(RasterError::BufferTooSmall {
            needed,
            actual: table.len(),
        });
    }

    let mut colormap = ctx.guard("colormap allocation", |_, exc| {
        Colormap::allocate(colors, exc)
    })?;
    let slots = (0..layout.len())
        .map(|i| layout.assign(i))
        .collect::<Result<Vec<ChannelSlot>, _>>()?;

    let depth = ctx.depth();
    let mut samples = Samples::new(table, storage);
    for entry in colormap.entries_mut() {
        for (slot, sample) in slots.iter().zip(&mut samples) {
            let q = to_quantum(sample, depth);
            match slot {
                ChannelSlot::Red => entry.r = q,
                ChannelSlot::Green => entry.g = q,
                ChannelSlot::Blue => entry.b = q,
                ChannelSlot::Opacity => entry.a = q,
            }
        }
    }
    Ok(colormap)
}

/// Validate, normalize and build a palette from an `M×3` or `M×4` array.
///
/// Without an explicit `layout` the code is inferred from the trailing
/// dimension (see [`LayoutCode::infer`]).
pub fn build_from_buffer(
    table: &PixelBuffer<'_>,
    layout: Option<LayoutCode>,
    colorspace: Option<Colorspace>,
    ctx: &mut Context,
) -> Result<Palette, RasterError> {
    let storage = table.storage()?;
    if table.rank() != 2 || !(3..=4).contains(&table.dim(1)) {
        return Err(RasterError::InvalidShape(format!(
            "palette array must be Mx3 or Mx4, got {:?}",
            table.shape()
        )));
    }
    let colors = table.dim(0);
    if colors == 0 {
        return Err(RasterError::InvalidShape("palette has no colors".into()));
    }
    let layout = match layout {
        Some(code) if code.len() != table.dim(1) => {
            return Err(RasterError::InvalidShape(format!(
                "palette layout {code} has {} channels, palette has {}",
                code.len(),
                table.dim(1)
            )));
        }
        Some(code) => code,
        None => LayoutCode::infer(table.dim(1), colorspace)?,
    };

    let table = normalize(table)?;
    tracing::trace!(colors, layout = %layout, ?storage, "building colormap");
    let colormap = build(storage, table.bytes(), &layout, colors, ctx)?;
    Ok(Palette { colormap, layout })
}
