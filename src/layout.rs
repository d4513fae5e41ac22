//! Channel layout codes.
//!
//! A layout code such as `"RGB"`, `"RGBA"`, `"CMYK"` or `"I"` says which
//! channel each successive scalar of a pixel (or color-table entry)
//! represents. CMYK letters alias the RGBA slots of a pixel packet:
//! `C`→red, `M`→green, `Y`→blue, `K`→opacity. Any CMYK letter switches the
//! image to the CMYK colorspace.

use alloc::format;
use core::fmt;
use core::str::FromStr;

use crate::error::RasterError;
use crate::raster::Colorspace;

/// Storage slot of a pixel packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelSlot {
    Red,
    Green,
    Blue,
    Opacity,
}

/// Meaning of one layout character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Slot(ChannelSlot),
    /// Single value written to red, green and blue (read back as luminance).
    Intensity,
}

/// Result of scanning a layout code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    /// `A` or `K` present.
    pub has_alpha: bool,
    /// [`Colorspace::Cmyk`] if any of `C`, `M`, `Y`, `K` is present, else RGB.
    pub colorspace: Colorspace,
}

/// Validated layout code: 1 to 4 characters from `RGBACMYKI` (stored
/// upper-case).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutCode {
    code: [u8; 4],
    len: u8,
}

impl LayoutCode {
    pub const I: Self = Self::from_ascii(*b"I\0\0\0", 1);
    pub const RGB: Self = Self::from_ascii(*b"RGB\0", 3);
    pub const RGBA: Self = Self::from_ascii(*b"RGBA", 4);
    pub const CMYK: Self = Self::from_ascii(*b"CMYK", 4);

    const fn from_ascii(code: [u8; 4], len: u8) -> Self {
        Self { code, len }
    }

    /// Parse a layout code, case-insensitively.
    pub fn parse(code: &str) -> Result<Self, RasterError> {
        let bytes = code.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 {
            return Err(RasterError::InvalidLayout(format!(
                "layout code {code:?} must have 1 to 4 characters"
            )));
        }
        let mut out = [0u8; 4];
        for (dst, &b) in out.iter_mut().zip(bytes) {
            let up = b.to_ascii_uppercase();
            if decode(up).is_none() {
                return Err(RasterError::InvalidLayout(format!(
                    "unrecognized channel {:?} in layout code {code:?}",
                    char::from(b)
                )));
            }
            *dst = up;
        }
        Ok(Self {
            code: out,
            len: bytes.len() as u8,
        })
    }

    /// Default layout for a buffer with `channels` values per pixel.
    ///
    /// 1 → `I`, 3 → `RGB`, 4 → `CMYK` when CMYK was requested and `RGBA`
    /// otherwise.
    pub fn infer(channels: usize, colorspace: Option<Colorspace>) -> Result<Self, RasterError> {
        match channels {
            1 => Ok(Self::I),
            3 => Ok(Self::RGB),
            4 if colorspace == Some(Colorspace::Cmyk) => Ok(Self::CMYK),
            4 => Ok(Self::RGBA),
            n => Err(RasterError::InvalidShape(format!(
                "no default layout for {n} channels (expected 1, 3 or 4)"
            ))),
        }
    }

    /// Number of scalars per pixel.
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    /// Always false; a layout code has at least one character.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        core::str::from_utf8(&self.code[..self.len()]).unwrap_or_default()
    }

    /// Channels in buffer order.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.code[..self.len()].iter().filter_map(|&b| decode(b))
    }

    /// Pixel-packet slot written by the `index`-th character.
    ///
    /// `I` has no single slot and is reported as [`RasterError::InvalidLayout`],
    /// as is an index past the end of the code.
    pub fn assign(&self, index: usize) -> Result<ChannelSlot, RasterError> {
        match self.code[..self.len()].get(index).and_then(|&b| decode(b)) {
            Some(Channel::Slot(slot)) => Ok(slot),
            Some(Channel::Intensity) => Err(RasterError::InvalidLayout(format!(
                "channel 'I' of {self} does not name a color slot"
            ))),
            None => Err(RasterError::InvalidLayout(format!(
                "no channel {index} in layout code {self}"
            ))),
        }
    }

    /// Alpha presence and colorspace implied by the code.
    pub fn classify(&self) -> Classification {
        let code = &self.code[..self.len()];
        Classification {
            has_alpha: code.iter().any(|b| matches!(b, b'A' | b'K')),
            colorspace: if code.iter().any(|b| matches!(b, b'C' | b'M' | b'Y' | b'K')) {
                Colorspace::Cmyk
            } else {
                Colorspace::Rgb
            },
        }
    }
}

fn decode(b: u8) -> Option<Channel> {
    Some(match b {
        b'R' | b'C' => Channel::Slot(ChannelSlot::Red),
        b'G' | b'M' => Channel::Slot(ChannelSlot::Green),
        b'B' | b'Y' => Channel::Slot(ChannelSlot::Blue),
        b'A' | b'K' => Channel::Slot(ChannelSlot::Opacity),
        b'I' => Channel::Intensity,
        _ => return None,
    })
}

impl FromStr for LayoutCode {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LayoutCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for LayoutCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayoutCode({:?})", self.as_str())
    }
}
