use alloc::vec::Vec;

use super::{BLACK, PixelPacket};
use crate::context::{ExceptionClass, ExceptionInfo, Severity};

/// Ordered color table of an indexed image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Colormap(Vec<PixelPacket>);

impl Colormap {
    /// Allocate `colors` entries of opaque black.
    pub fn allocate(colors: usize, exception: &mut ExceptionInfo) -> Option<Self> {
        let mut entries = Vec::new();
        if entries.try_reserve_exact(colors).is_err() {
            exception.throw(
                Severity::Error,
                ExceptionClass::ResourceLimit,
                "MemoryAllocationFailed",
                Some("UnableToAllocateColormap"),
            );
            return None;
        }
        entries.resize(colors, BLACK);
        Some(Self(entries))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PixelPacket> {
        self.0.get(index)
    }

    pub fn entries(&self) -> &[PixelPacket] {
        &self.0
    }

    pub fn entries_mut(&mut self) -> &mut [PixelPacket] {
        &mut self.0
    }
}

impl From<Vec<PixelPacket>> for Colormap {
    fn from(entries: Vec<PixelPacket>) -> Self {
        Self(entries)
    }
}
