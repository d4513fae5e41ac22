use alloc::vec::Vec;

use super::{Colormap, PixelPacket, RasterImage, intensity};
use crate::context::{ExceptionClass, ExceptionInfo, Severity};
use crate::layout::{Channel, ChannelSlot, LayoutCode};
use crate::pixel::StorageType;
use crate::quantum::{Quantum, QuantumDepth, from_quantum};

/// Export every pixel of `image` as the channels of `map`, scaled to
/// `storage`, appending native-endian elements to `out`.
///
/// Indexed images export their resolved colors. `I` exports luminance.
pub fn export_pixels(
    image: &RasterImage,
    map: &LayoutCode,
    storage: StorageType,
    depth: QuantumDepth,
    out: &mut Vec<u8>,
    exception: &mut ExceptionInfo,
) -> Option<()> {
    export_packets(image.pixels(), map, storage, depth, out, exception)
}

/// Export colormap entries the same way as [`export_pixels`].
pub fn export_colormap(
    colormap: &Colormap,
    map: &LayoutCode,
    storage: StorageType,
    depth: QuantumDepth,
    out: &mut Vec<u8>,
    exception: &mut ExceptionInfo,
) -> Option<()> {
    export_packets(colormap.entries(), map, storage, depth, out, exception)
}

fn export_packets(
    packets: &[PixelPacket],
    map: &LayoutCode,
    storage: StorageType,
    depth: QuantumDepth,
    out: &mut Vec<u8>,
    exception: &mut ExceptionInfo,
) -> Option<()> {
    let bytes = packets.len().checked_mul(map.len() * storage.bytes());
    if bytes.is_none_or(|n| out.try_reserve(n).is_err()) {
        exception.throw(
            Severity::Error,
            ExceptionClass::ResourceLimit,
            "MemoryAllocationFailed",
            Some("UnableToExportPixels"),
        );
        return None;
    }
    for p in packets {
        for channel in map.channels() {
            from_quantum(channel_value(p, channel), storage, depth).write_ne(out);
        }
    }
    Some(())
}

fn channel_value(p: &PixelPacket, channel: Channel) -> Quantum {
    match channel {
        Channel::Slot(ChannelSlot::Red) => p.r,
        Channel::Slot(ChannelSlot::Green) => p.g,
        Channel::Slot(ChannelSlot::Blue) => p.b,
        Channel::Slot(ChannelSlot::Opacity) => p.a,
        Channel::Intensity => intensity(p),
    }
}
