//! In-crate model of the raster image layer.
//!
//! Images own a pixel cache of [`PixelPacket`]s and, when indexed, a
//! [`Colormap`] plus one index per pixel. Routines that can fail record an
//! exception in the supplied [`ExceptionInfo`] and return `None`; callers go
//! through [`crate::Context::guard`].

mod colormap;
mod export;
mod sequence;

pub use colormap::Colormap;
pub use export::{export_colormap, export_pixels};
pub use sequence::RasterSequence;

use alloc::vec::Vec;
use imgref::ImgVec;

use crate::context::{ExceptionClass, ExceptionInfo, Severity};
use crate::quantum::{Quantum, QuantumDepth};

/// One pixel: red, green, blue and opacity (`a`). Opacity 0 is opaque.
pub type PixelPacket = rgb::Rgba<Quantum>;

/// Colormap slot of an indexed pixel.
pub type IndexPacket = u32;

pub const OPAQUE_OPACITY: Quantum = 0;

/// Pixel with every channel zero and full opacity.
pub const BLACK: PixelPacket = PixelPacket {
    r: 0,
    g: 0,
    b: 0,
    a: OPAQUE_OPACITY,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Colorspace {
    #[default]
    Rgb,
    Gray,
    Cmyk,
}

/// Declared image type.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImageType {
    #[default]
    Undefined,
    Bilevel,
    Grayscale,
    GrayscaleMatte,
    Palette,
    PaletteMatte,
    TrueColor,
    TrueColorMatte,
    ColorSeparation,
    ColorSeparationMatte,
}

/// How pixel values are stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum StorageClass {
    /// Each pixel holds explicit channel values.
    #[default]
    Direct,
    /// Each pixel holds an index into the owned colormap. The pixel cache
    /// mirrors the resolved colors.
    Pseudo {
        colormap: Colormap,
        indexes: Vec<IndexPacket>,
    },
}

/// A single raster frame.
#[derive(Clone, Debug)]
pub struct RasterImage {
    pixels: ImgVec<PixelPacket>,
    class: StorageClass,
    colorspace: Colorspace,
    matte: bool,
    image_type: ImageType,
}

impl RasterImage {
    /// Allocate a `columns` × `rows` direct-class image filled with opaque
    /// black.
    pub fn allocate(columns: usize, rows: usize, exception: &mut ExceptionInfo) -> Option<Self> {
        if columns == 0 || rows == 0 {
            exception.throw(
                Severity::Error,
                ExceptionClass::Option,
                "UnableToConstituteImage",
                Some("NonzeroWidthAndHeightRequired"),
            );
            return None;
        }
        let pixels = try_filled(columns.checked_mul(rows), BLACK, exception)?;
        Some(Self {
            pixels: ImgVec::new(pixels, columns, rows),
            class: StorageClass::Direct,
            colorspace: Colorspace::Rgb,
            matte: false,
            image_type: ImageType::Undefined,
        })
    }

    pub fn columns(&self) -> usize {
        self.pixels.width()
    }

    pub fn rows(&self) -> usize {
        self.pixels.height()
    }

    /// Pixel cache, row-major.
    pub fn pixels(&self) -> &[PixelPacket] {
        self.pixels.buf()
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<PixelPacket> {
        if x >= self.columns() {
            return None;
        }
        self.pixels().get(y * self.columns() + x).copied()
    }

    /// Writable pixel rows.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [PixelPacket]> + '_ {
        let w = self.columns();
        self.pixels.buf_mut().chunks_exact_mut(w)
    }

    pub fn storage_class(&self) -> &StorageClass {
        &self.class
    }

    pub fn is_pseudo(&self) -> bool {
        matches!(self.class, StorageClass::Pseudo { .. })
    }

    /// Colormap size; 0 for direct-class images.
    pub fn colors(&self) -> usize {
        self.colormap().map_or(0, Colormap::len)
    }

    pub fn colormap(&self) -> Option<&Colormap> {
        match &self.class {
            StorageClass::Pseudo { colormap, .. } => Some(colormap),
            StorageClass::Direct => None,
        }
    }

    /// Per-pixel colormap indexes, row-major.
    pub fn indexes(&self) -> Option<&[IndexPacket]> {
        match &self.class {
            StorageClass::Pseudo { indexes, .. } => Some(indexes),
            StorageClass::Direct => None,
        }
    }

    /// Make the image indexed with `colormap`. All indexes start at 0.
    pub fn set_colormap(&mut self, colormap: Colormap, exception: &mut ExceptionInfo) -> Option<()> {
        let indexes = try_filled(Some(self.pixels().len()), 0, exception)?;
        self.class = StorageClass::Pseudo { colormap, indexes };
        Some(())
    }

    /// Switch to direct class, dropping any colormap and indexes. Pixel
    /// values are kept.
    pub fn set_direct(&mut self) {
        self.class = StorageClass::Direct;
    }

    /// Set the colormap index of pixel `offset` (row-major) and mirror its
    /// color into the pixel cache.
    ///
    /// An index outside the colormap raises an `InvalidColormapIndex` warning
    /// and is replaced by 0. Does nothing on direct-class images.
    pub fn set_index(&mut self, offset: usize, index: usize, exception: &mut ExceptionInfo) {
        let StorageClass::Pseudo { colormap, indexes } = &mut self.class else {
            return;
        };
        let index = if index < colormap.len() {
            index
        } else {
            exception.throw(
                Severity::Warning,
                ExceptionClass::CorruptImage,
                "InvalidColormapIndex",
                None,
            );
            0
        };
        if let (Some(slot), Some(&color), Some(px)) = (
            indexes.get_mut(offset),
            colormap.get(index),
            self.pixels.buf_mut().get_mut(offset),
        ) {
            *slot = index as IndexPacket;
            *px = color;
        }
    }

    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    pub fn set_colorspace(&mut self, colorspace: Colorspace) {
        self.colorspace = colorspace;
    }

    /// Whether the opacity channel is meaningful.
    pub fn matte(&self) -> bool {
        self.matte
    }

    pub fn set_matte(&mut self, matte: bool) {
        self.matte = matte;
    }

    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    /// Declare the image type. Declaring [`ImageType::Bilevel`] on an image
    /// that is not already black/white thresholds it at half intensity.
    pub fn set_image_type(&mut self, image_type: ImageType, depth: QuantumDepth) {
        if image_type == ImageType::Bilevel && !self.is_monochrome(depth) {
            let max = depth.max();
            for px in self.pixels.buf_mut().iter_mut() {
                let v = if intensity(px) > max / 2 { max } else { 0 };
                *px = PixelPacket {
                    r: v,
                    g: v,
                    b: v,
                    a: px.a,
                };
            }
            self.set_direct();
        }
        self.image_type = image_type;
    }

    /// Whether every pixel is gray and either 0 or `max`.
    pub fn is_monochrome(&self, depth: QuantumDepth) -> bool {
        let max = depth.max();
        self.pixels()
            .iter()
            .all(|p| p.r == p.g && p.g == p.b && (p.r == 0 || p.r == max))
    }
}

/// Luminance of a pixel, `(9798 R + 19235 G + 3735 B) / 32768`.
pub fn intensity(p: &PixelPacket) -> Quantum {
    let sum = 9798 * u64::from(p.r) + 19235 * u64::from(p.g) + 3735 * u64::from(p.b);
    (sum / 32768) as Quantum
}

/// Allocate `count` copies of `value`, recording a resource-limit error on
/// overflow or allocation failure.
fn try_filled<T: Copy>(
    count: Option<usize>,
    value: T,
    exception: &mut ExceptionInfo,
) -> Option<Vec<T>> {
    let mut out = Vec::new();
    let Some(count) = count.filter(|&n| out.try_reserve_exact(n).is_ok()) else {
        exception.throw(
            Severity::Error,
            ExceptionClass::ResourceLimit,
            "MemoryAllocationFailed",
            Some("UnableToAllocateImage"),
        );
        return None;
    };
    out.resize(count, value);
    Some(out)
}
