use alloc::vec::Vec;

use super::RasterImage;

/// Ordered list of frames produced or consumed as a whole.
#[derive(Clone, Debug, Default)]
pub struct RasterSequence {
    frames: Vec<RasterImage>,
}

impl RasterSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame at the end.
    pub fn push(&mut self, image: RasterImage) {
        self.frames.push(image);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first(&self) -> Option<&RasterImage> {
        self.frames.first()
    }

    pub fn get(&self, index: usize) -> Option<&RasterImage> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, RasterImage> {
        self.frames.iter()
    }

    /// Visit frames in order, stopping at the first error.
    pub fn for_each_frame<E>(
        &self,
        mut f: impl FnMut(usize, &RasterImage) -> Result<(), E>,
    ) -> Result<(), E> {
        self.frames.iter().enumerate().try_for_each(|(k, im)| f(k, im))
    }
}

impl From<RasterImage> for RasterSequence {
    fn from(image: RasterImage) -> Self {
        Self {
            frames: alloc::vec![image],
        }
    }
}

impl FromIterator<RasterImage> for RasterSequence {
    fn from_iter<I: IntoIterator<Item = RasterImage>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RasterSequence {
    type Item = &'a RasterImage;
    type IntoIter = core::slice::Iter<'a, RasterImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl IntoIterator for RasterSequence {
    type Item = RasterImage;
    type IntoIter = alloc::vec::IntoIter<RasterImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}
