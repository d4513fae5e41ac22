use alloc::borrow::Cow;
use alloc::format;
use alloc::vec::Vec;

use crate::error::RasterError;
use crate::pixel::{ElementType, Samples, StorageType};

/// Rust scalar types that can back a [`PixelBuffer`].
pub trait Element: bytemuck::Pod {
    const ELEMENT: ElementType;
}

macro_rules! element {
    ($($t:ty => $e:ident),* $(,)?) => {
        $(impl Element for $t {
            const ELEMENT: ElementType = ElementType::$e;
        })*
    };
}

element! {
    u8 => UInt8,
    i8 => Int8,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
}

/// A typed n-dimensional array of native-endian elements.
///
/// Borrowed when wrapping caller memory; owned when produced by this crate
/// (normalized copies, contiguous copies, extraction output). Strides are in
/// bytes.
#[derive(Clone, Debug)]
pub struct PixelBuffer<'a> {
    data: Cow<'a, [u8]>,
    element: ElementType,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

fn element_count(shape: &[usize]) -> Result<usize, RasterError> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| RasterError::InvalidShape(format!("shape {shape:?} overflows")))
}

fn contiguous_strides(shape: &[usize], size: usize) -> Vec<usize> {
    let mut strides = alloc::vec![0; shape.len()];
    let mut acc = size;
    for (s, &d) in strides.iter_mut().zip(shape).rev() {
        *s = acc;
        acc = acc.saturating_mul(d);
    }
    strides
}

impl<'a> PixelBuffer<'a> {
    /// Wrap C-ordered contiguous bytes.
    pub fn new(data: &'a [u8], element: ElementType, shape: &[usize]) -> Result<Self, RasterError> {
        Self::contiguous(Cow::Borrowed(data), element, shape)
    }

    /// Wrap typed contiguous data.
    pub fn from_slice<T: Element>(data: &'a [T], shape: &[usize]) -> Result<Self, RasterError> {
        Self::new(bytemuck::cast_slice(data), T::ELEMENT, shape)
    }

    /// Take ownership of C-ordered contiguous bytes.
    pub fn from_vec(
        data: Vec<u8>,
        element: ElementType,
        shape: &[usize],
    ) -> Result<PixelBuffer<'static>, RasterError> {
        PixelBuffer::contiguous(Cow::Owned(data), element, shape)
    }

    /// Wrap strided bytes. Every addressed element must lie inside `data`.
    pub fn with_strides(
        data: &'a [u8],
        element: ElementType,
        shape: &[usize],
        strides: &[usize],
    ) -> Result<Self, RasterError> {
        if strides.len() != shape.len() {
            return Err(RasterError::InvalidShape(format!(
                "{} strides for {} dimensions",
                strides.len(),
                shape.len()
            )));
        }
        let count = element_count(shape)?;
        if count > 0 {
            let last = shape
                .iter()
                .zip(strides)
                .try_fold(0usize, |acc, (&d, &s)| acc.checked_add((d - 1).checked_mul(s)?))
                .and_then(|off| off.checked_add(element.size()))
                .ok_or_else(|| RasterError::InvalidShape(format!("shape {shape:?} overflows")))?;
            if data.len() < last {
                return Err(RasterError::BufferTooSmall {
                    needed: last,
                    actual: data.len(),
                });
            }
        }
        Ok(Self {
            data: Cow::Borrowed(data),
            element,
            shape: shape.to_vec(),
            strides: strides.to_vec(),
        })
    }

    fn contiguous(
        data: Cow<'a, [u8]>,
        element: ElementType,
        shape: &[usize],
    ) -> Result<Self, RasterError> {
        let needed = element_count(shape)?
            .checked_mul(element.size())
            .ok_or_else(|| RasterError::InvalidShape(format!("shape {shape:?} overflows")))?;
        if data.len() < needed {
            return Err(RasterError::BufferTooSmall {
                needed,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            element,
            shape: shape.to_vec(),
            strides: contiguous_strides(shape, element.size()),
        })
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    /// Storage type of the elements, or [`RasterError::UnsupportedType`].
    pub fn storage(&self) -> Result<StorageType, RasterError> {
        self.element.storage()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Size of dimension `n`, or 0 past the last dimension.
    pub fn dim(&self, n: usize) -> usize {
        self.shape.get(n).copied().unwrap_or(0)
    }

    /// Byte strides, one per dimension.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Byte stride of dimension `n`, or 0 past the last dimension.
    pub fn stride(&self, n: usize) -> usize {
        self.strides.get(n).copied().unwrap_or(0)
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Underlying bytes (including any stride padding).
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Whether the data is borrowed from the caller.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.data, Cow::Borrowed(_))
    }

    pub fn is_contiguous(&self) -> bool {
        self.strides == contiguous_strides(&self.shape, self.element.size())
    }

    /// Contiguous view: borrows `self` when already contiguous, otherwise
    /// gathers the elements into a new C-ordered buffer.
    pub fn to_contiguous(&self) -> Result<PixelBuffer<'_>, RasterError> {
        if self.is_contiguous() {
            return Ok(PixelBuffer {
                data: Cow::Borrowed(self.data.as_ref()),
                element: self.element,
                shape: self.shape.clone(),
                strides: self.strides.clone(),
            });
        }
        let size = self.element.size();
        let count = self.len();
        let mut out = Vec::new();
        out.try_reserve_exact(count * size).map_err(|_| {
            RasterError::AllocationFailure(format!("contiguous copy of {count} elements"))
        })?;
        let mut index = alloc::vec![0usize; self.rank()];
        for _ in 0..count {
            let off: usize = index.iter().zip(&self.strides).map(|(i, s)| i * s).sum();
            out.extend_from_slice(&self.data[off..off + size]);
            // Advance the odometer, last dimension fastest.
            for (i, &d) in index.iter_mut().zip(&self.shape).rev() {
                *i += 1;
                if *i < d {
                    break;
                }
                *i = 0;
            }
        }
        PixelBuffer::from_vec(out, self.element, &self.shape)
    }

    /// Take ownership of the data (copies if borrowed).
    pub fn into_owned(self) -> PixelBuffer<'static> {
        PixelBuffer {
            data: Cow::Owned(self.data.into_owned()),
            element: self.element,
            shape: self.shape,
            strides: self.strides,
        }
    }

    /// Copy the elements out as a typed vector in C order.
    ///
    /// Returns [`RasterError::ElementMismatch`] if `T` is not the buffer's
    /// element type.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, RasterError> {
        if T::ELEMENT != self.element {
            return Err(RasterError::ElementMismatch {
                expected: T::ELEMENT,
                actual: self.element,
            });
        }
        let contiguous = self.to_contiguous()?;
        let used = self.len() * self.element.size();
        Ok(bytemuck::pod_collect_to_vec(&contiguous.data[..used]))
    }

    /// Bytes of the `k`-th slice along the leading dimension. Only meaningful
    /// on contiguous buffers.
    pub(crate) fn frame_bytes(&self, k: usize) -> &[u8] {
        let step = self.stride(0);
        let len = self.len() / self.dim(0).max(1) * self.element.size();
        &self.data[k * step..k * step + len]
    }

    /// All elements as samples of `storage`, in memory order. Only meaningful
    /// on contiguous buffers.
    pub(crate) fn samples(&self, storage: StorageType) -> Samples<'_> {
        let used = self.len() * self.element.size();
        Samples::new(&self.data[..used], storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_strides_are_c_order() {
        let data = [0u16; 24];
        let buf = PixelBuffer::from_slice(&data, &[2, 3, 4]).unwrap();
        assert_eq!(buf.strides(), &[24, 8, 2]);
        assert!(buf.is_contiguous());
        assert!(buf.is_borrowed());
        assert_eq!(buf.len(), 24);
    }

    #[test]
    fn too_short_is_rejected() {
        let data = [0u8; 5];
        assert!(matches!(
            PixelBuffer::new(&data, ElementType::UInt8, &[2, 3]),
            Err(RasterError::BufferTooSmall { needed: 6, actual: 5 })
        ));
    }

    #[test]
    fn strided_gather_reorders() {
        // 2x3 u8 stored transposed (column-major).
        let data = [1u8, 4, 2, 5, 3, 6];
        let buf = PixelBuffer::with_strides(&data, ElementType::UInt8, &[2, 3], &[1, 2]).unwrap();
        assert!(!buf.is_contiguous());
        let c = buf.to_contiguous().unwrap();
        assert!(c.is_contiguous());
        assert_eq!(c.bytes(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(buf.to_vec::<u8>().unwrap(), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn to_vec_checks_element() {
        let data = [1.0f32, 2.0];
        let buf = PixelBuffer::from_slice(&data, &[2]).unwrap();
        assert_eq!(buf.to_vec::<f32>().unwrap(), [1.0, 2.0]);
        assert!(matches!(
            buf.to_vec::<u32>(),
            Err(RasterError::ElementMismatch { .. })
        ));
    }

    #[test]
    fn into_owned_keeps_view() {
        let data = [1u8, 4, 2, 5, 3, 6];
        let owned = {
            let local = data;
            PixelBuffer::with_strides(&local, ElementType::UInt8, &[2, 3], &[1, 2])
                .unwrap()
                .into_owned()
        };
        assert!(!owned.is_borrowed());
        assert_eq!(owned.strides(), &[1, 2]);
        assert_eq!(owned.to_vec::<u8>().unwrap(), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn frames_slice_leading_dimension() {
        let data: Vec<u8> = (0..12).collect();
        let buf = PixelBuffer::new(&data, ElementType::UInt8, &[3, 2, 2]).unwrap();
        assert_eq!(buf.frame_bytes(1), &[4, 5, 6, 7]);
        assert_eq!(buf.frame_bytes(2), &[8, 9, 10, 11]);
    }
}
