//! # zenraster
//!
//! Conversion between typed numeric arrays and raster image frames.
//!
//! ## Constituting frames
//!
//! A [`PixelBuffer`] of rank 2, 3 or 4 becomes a [`RasterSequence`]:
//!
//! - `rows × cols`: one grayscale image, a bilevel image with
//!   [`ConstituteRequest::monochrome`], or an indexed image with
//!   [`ConstituteRequest::palette`]
//! - `rows × cols × 3|4`: one RGB, RGBA or CMYK image
//! - `frames × rows × cols`: a stack of grayscale or indexed images
//! - `frames × rows × cols × 3|4`: a stack of multi-channel images
//!
//! Float arrays are taken as unit-range intensities; arrays with values
//! outside `[0, 1]` are rescaled onto a private copy first, unless
//! [`ConstituteRequest::monochrome`] is set.
//!
//! ## Extracting arrays
//!
//! [`ExtractRequest`] turns a sequence back into one array. Integer requests
//! are a raw transfer at the quantum width, float requests are scaled to
//! `[0, 1]`. Indexed sequences with at most 256 colors come back as `u8`
//! indexes; [`colormap_buffer`] exports their color table.
//!
//! ## Context
//!
//! All conversion state lives in a caller-owned [`Context`]: the quantum
//! depth and the raster layer's exception slot. There is no global state.
//!
//! ## Usage
//!
//! ```
//! use zenraster::{ConstituteRequest, Context, ExtractRequest, PixelBuffer, QuantumDepth,
//!                 StorageType, Unstoppable};
//!
//! let rgb = [255u8, 0, 0, 0, 255, 0, 0, 0, 255, 9, 9, 9];
//! let buf = PixelBuffer::from_slice(&rgb, &[2, 2, 3])?;
//!
//! let mut ctx = Context::new(QuantumDepth::Q8);
//! let frames = ConstituteRequest::new(&buf).constitute(&mut ctx, Unstoppable)?;
//! let back = ExtractRequest::new(&frames, StorageType::UInt8).extract(&mut ctx, Unstoppable)?;
//! assert_eq!(back.to_vec::<u8>()?, rgb);
//! # Ok::<(), zenraster::RasterError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod buffer;
mod context;
mod error;
mod extract;
mod layout;
mod limits;
mod normalize;
mod pixel;
mod quantum;

pub mod constitute;
pub mod palette;
pub mod raster;

// Re-exports
pub use buffer::{Element, PixelBuffer};
pub use constitute::{ConstituteRequest, constitute};
pub use context::{Context, ExceptionClass, ExceptionInfo, Severity};
pub use enough::{Stop, Unstoppable};
pub use error::RasterError;
pub use extract::{ExtractRequest, MAX_INDEXED_COLORS, colormap_buffer};
pub use layout::{Channel, ChannelSlot, Classification, LayoutCode};
pub use limits::Limits;
pub use normalize::normalize;
pub use palette::Palette;
pub use pixel::{ElementType, Sample, StorageType};
pub use quantum::{Quantum, QuantumDepth, from_quantum, scale_to_index, to_quantum};
pub use raster::{Colorspace, ImageType, PixelPacket, RasterImage, RasterSequence};

/// Extract `images` as an array of (at most) `storage` elements with default
/// options.
pub fn extract(
    images: &RasterSequence,
    storage: StorageType,
    ctx: &mut Context,
    stop: impl Stop,
) -> Result<PixelBuffer<'static>, RasterError> {
    ExtractRequest::new(images, storage).extract(ctx, stop)
}
