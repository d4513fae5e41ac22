use alloc::vec::Vec;

use crate::error::RasterError;

/// Numeric encoding of one element of an external pixel or color-table buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageType {
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer (native endian).
    UInt16,
    /// Unsigned 32-bit integer (native endian).
    UInt32,
    /// 32-bit float, nominally in `[0, 1]`.
    Float32,
    /// 64-bit float, nominally in `[0, 1]`.
    Float64,
}

impl StorageType {
    /// Bytes per element.
    pub fn bytes(&self) -> usize {
        match self {
            Self::UInt8 => 1,
            Self::UInt16 => 2,
            Self::UInt32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Whether values are floating point (scaled from `[0, 1]` rather than
    /// from the full integer range).
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

/// Element type tag of a host array.
///
/// Wider than [`StorageType`]: the host side can describe element types the
/// conversion layer refuses. [`ElementType::storage`] performs the check.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Single byte character data, treated as unsigned 8-bit.
    Char,
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    /// Signed 32-bit, reinterpreted as unsigned 32-bit.
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ElementType {
    /// Bytes per element.
    pub fn size(&self) -> usize {
        match self {
            Self::Char | Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }

    /// The storage type used to interpret elements of this type.
    ///
    /// Returns [`RasterError::UnsupportedType`] for signed 8/16-bit and 64-bit
    /// integers.
    pub fn storage(&self) -> Result<StorageType, RasterError> {
        match self {
            Self::Char | Self::UInt8 => Ok(StorageType::UInt8),
            Self::UInt16 => Ok(StorageType::UInt16),
            Self::UInt32 | Self::Int32 => Ok(StorageType::UInt32),
            Self::Float32 => Ok(StorageType::Float32),
            Self::Float64 => Ok(StorageType::Float64),
            Self::Int8 | Self::Int16 | Self::Int64 => Err(RasterError::UnsupportedType(*self)),
        }
    }
}

impl From<StorageType> for ElementType {
    fn from(storage: StorageType) -> Self {
        match storage {
            StorageType::UInt8 => Self::UInt8,
            StorageType::UInt16 => Self::UInt16,
            StorageType::UInt32 => Self::UInt32,
            StorageType::Float32 => Self::Float32,
            StorageType::Float64 => Self::Float64,
        }
    }
}

/// One scalar read from (or written to) an external buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    U8(u8),
    U16(u16),
    U32(u32),
    F32(f32),
    F64(f64),
}

impl Sample {
    pub fn storage(&self) -> StorageType {
        match self {
            Self::U8(_) => StorageType::UInt8,
            Self::U16(_) => StorageType::UInt16,
            Self::U32(_) => StorageType::UInt32,
            Self::F32(_) => StorageType::Float32,
            Self::F64(_) => StorageType::Float64,
        }
    }

    /// Whether every byte of the value's native representation is zero.
    pub fn is_zero_bits(&self) -> bool {
        match *self {
            Self::U8(v) => v == 0,
            Self::U16(v) => v == 0,
            Self::U32(v) => v == 0,
            Self::F32(v) => v.to_bits() == 0,
            Self::F64(v) => v.to_bits() == 0,
        }
    }

    /// Append the native-endian bytes of this sample.
    pub(crate) fn write_ne(&self, out: &mut Vec<u8>) {
        match *self {
            Self::U8(v) => out.push(v),
            Self::U16(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Self::U32(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Self::F32(v) => out.extend_from_slice(&v.to_ne_bytes()),
            Self::F64(v) => out.extend_from_slice(&v.to_ne_bytes()),
        }
    }
}

/// Iterator over the native-endian samples of a byte slice.
///
/// Trailing bytes that do not form a whole element are ignored.
pub(crate) struct Samples<'a> {
    chunks: core::slice::ChunksExact<'a, u8>,
    storage: StorageType,
}

impl<'a> Samples<'a> {
    pub(crate) fn new(bytes: &'a [u8], storage: StorageType) -> Self {
        Self {
            chunks: bytes.chunks_exact(storage.bytes()),
            storage,
        }
    }
}

impl Iterator for Samples<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let c = self.chunks.next()?;
        Some(match self.storage {
            StorageType::UInt8 => Sample::U8(c[0]),
            StorageType::UInt16 => Sample::U16(u16::from_ne_bytes([c[0], c[1]])),
            StorageType::UInt32 => Sample::U32(u32::from_ne_bytes([c[0], c[1], c[2], c[3]])),
            StorageType::Float32 => Sample::F32(f32::from_ne_bytes([c[0], c[1], c[2], c[3]])),
            StorageType::Float64 => Sample::F64(f64::from_ne_bytes([
                c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7],
            ])),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Samples<'_> {}
