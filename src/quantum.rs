//! Scalar conversion between external storage types and the raster layer's
//! fixed-width quantum.
//!
//! Integer sources are rescaled linearly from their full range onto
//! `0..=max` with integer multiply/divide (truncating). The ratio between any
//! two of the 8/16/32-bit ranges is an exact integer (257, 65537, 16843009),
//! so widening is lossless and narrowing truncates. Float sources are assumed
//! to already be in `[0, 1]` (see [`crate::normalize`]) and are multiplied by
//! the quantum maximum.

use crate::pixel::{Sample, StorageType};

/// Per-channel intensity unit of a raster image. Always stored as `u32`;
/// the active range is given by [`QuantumDepth::max`].
pub type Quantum = u32;

/// Bit width of the quantum, fixed for the lifetime of a [`crate::Context`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QuantumDepth {
    Q8,
    #[default]
    Q16,
    Q32,
}

impl QuantumDepth {
    pub fn bits(&self) -> u32 {
        match self {
            Self::Q8 => 8,
            Self::Q16 => 16,
            Self::Q32 => 32,
        }
    }

    /// Largest representable quantum value, `2^bits - 1`.
    pub fn max(&self) -> Quantum {
        range_max(self.bits()) as Quantum
    }

    /// Colormap capacity of an indexed image at this depth.
    pub fn max_colormap_size(&self) -> usize {
        match self {
            Self::Q8 => 256,
            Self::Q16 | Self::Q32 => 65536,
        }
    }

    /// Element type whose width equals the quantum width. Raw transfers
    /// always produce this type.
    pub fn preferred_storage(&self) -> StorageType {
        match self {
            Self::Q8 => StorageType::UInt8,
            Self::Q16 => StorageType::UInt16,
            Self::Q32 => StorageType::UInt32,
        }
    }
}

fn range_max(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// Rescale `v` from the full `from_bits` range to the full `to_bits` range.
fn rescale(v: u64, from_bits: u32, to_bits: u32) -> u64 {
    let src = range_max(from_bits);
    let dst = range_max(to_bits);
    if src == dst {
        v
    } else if src < dst {
        v * (dst / src)
    } else {
        v / (src / dst)
    }
}

/// Convert one external sample to a quantum.
pub fn to_quantum(sample: Sample, depth: QuantumDepth) -> Quantum {
    match sample {
        Sample::U8(v) => rescale(u64::from(v), 8, depth.bits()) as Quantum,
        Sample::U16(v) => rescale(u64::from(v), 16, depth.bits()) as Quantum,
        Sample::U32(v) => rescale(u64::from(v), 32, depth.bits()) as Quantum,
        Sample::F32(v) => scale_unit(f64::from(v), depth),
        Sample::F64(v) => scale_unit(v, depth),
    }
}

/// Map a `[0, 1]` float onto `0..=max`. Out-of-range values saturate and NaN
/// maps to 0.
fn scale_unit(v: f64, depth: QuantumDepth) -> Quantum {
    (f64::from(depth.max()) * v.clamp(0.0, 1.0)) as Quantum
}

/// Convert a quantum back to an external sample of the given storage type.
pub fn from_quantum(q: Quantum, storage: StorageType, depth: QuantumDepth) -> Sample {
    let q = u64::from(q.min(depth.max()));
    match storage {
        StorageType::UInt8 => Sample::U8(rescale(q, depth.bits(), 8) as u8),
        StorageType::UInt16 => Sample::U16(rescale(q, depth.bits(), 16) as u16),
        StorageType::UInt32 => Sample::U32(rescale(q, depth.bits(), 32) as u32),
        StorageType::Float32 => Sample::F32((q as f64 / f64::from(depth.max())) as f32),
        StorageType::Float64 => Sample::F64(q as f64 / f64::from(depth.max())),
    }
}

/// Scale a raw index sample from its type's native range into `0..colors`.
///
/// 8- and 16-bit values divide by `2^bits`, which never reaches `colors`.
/// 32-bit values divide by `u32::MAX`, so the maximum value itself is pinned
/// to the last slot. Floats are multiplied by `colors - 1`.
pub fn scale_to_index(sample: Sample, colors: usize) -> usize {
    let n = colors as u64;
    match sample {
        Sample::U8(v) => (u64::from(v) * n / 256) as usize,
        Sample::U16(v) => (u64::from(v) * n / 65536) as usize,
        Sample::U32(u32::MAX) => colors.saturating_sub(1),
        Sample::U32(v) => (u64::from(v) * n / u64::from(u32::MAX)) as usize,
        Sample::F32(v) => (colors.saturating_sub(1) as f64 * f64::from(v)) as usize,
        Sample::F64(v) => (colors.saturating_sub(1) as f64 * v) as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPTHS: [QuantumDepth; 3] = [QuantumDepth::Q8, QuantumDepth::Q16, QuantumDepth::Q32];

    #[test]
    fn integer_widening_is_exact() {
        assert_eq!(to_quantum(Sample::U8(255), QuantumDepth::Q16), 65535);
        assert_eq!(to_quantum(Sample::U8(128), QuantumDepth::Q16), 128 * 257);
        assert_eq!(to_quantum(Sample::U8(1), QuantumDepth::Q32), 16843009);
        assert_eq!(to_quantum(Sample::U16(65535), QuantumDepth::Q32), u32::MAX);
    }

    #[test]
    fn integer_narrowing_truncates() {
        assert_eq!(to_quantum(Sample::U16(65535), QuantumDepth::Q8), 255);
        assert_eq!(to_quantum(Sample::U16(256), QuantumDepth::Q8), 0);
        assert_eq!(to_quantum(Sample::U16(257), QuantumDepth::Q8), 1);
        assert_eq!(to_quantum(Sample::U32(u32::MAX), QuantumDepth::Q16), 65535);
    }

    #[test]
    fn float_scales_by_max() {
        assert_eq!(to_quantum(Sample::F64(1.0), QuantumDepth::Q16), 65535);
        assert_eq!(to_quantum(Sample::F64(0.0), QuantumDepth::Q16), 0);
        assert_eq!(to_quantum(Sample::F32(0.5), QuantumDepth::Q8), 127);
        assert_eq!(to_quantum(Sample::F64(f64::NAN), QuantumDepth::Q8), 0);
        assert_eq!(to_quantum(Sample::F64(1.0), QuantumDepth::Q32), u32::MAX);
    }

    #[test]
    fn out_of_range_float_saturates_at_max() {
        assert_eq!(to_quantum(Sample::F64(2.0), QuantumDepth::Q8), 255);
        assert_eq!(to_quantum(Sample::F32(1.5), QuantumDepth::Q16), 65535);
        assert_eq!(to_quantum(Sample::F64(-0.5), QuantumDepth::Q16), 0);
        assert_eq!(to_quantum(Sample::F64(f64::INFINITY), QuantumDepth::Q32), u32::MAX);
        for depth in DEPTHS {
            assert!(to_quantum(Sample::F64(1e300), depth) <= depth.max());
        }
    }

    fn step(storage: StorageType, depth: QuantumDepth) -> u64 {
        // One output step of `storage` measured in quanta.
        match storage {
            StorageType::UInt8 => rescale(1, 8, depth.bits()).max(1),
            StorageType::UInt16 => rescale(1, 16, depth.bits()).max(1),
            _ => 1,
        }
    }

    #[test]
    fn quantum_round_trip_is_stable() {
        let integer_samples = [
            Sample::U8(0),
            Sample::U8(1),
            Sample::U8(77),
            Sample::U8(255),
            Sample::U16(0),
            Sample::U16(4097),
            Sample::U16(65535),
            Sample::U32(0),
            Sample::U32(123_456_789),
            Sample::U32(u32::MAX),
        ];
        let float_samples = [
            Sample::F32(0.0),
            Sample::F32(0.25),
            Sample::F32(1.0),
            Sample::F64(0.0),
            Sample::F64(0.333),
            Sample::F64(1.0),
        ];
        for depth in DEPTHS {
            for s in integer_samples.iter().chain(float_samples.iter()) {
                let q = to_quantum(*s, depth);
                let back = to_quantum(from_quantum(q, s.storage(), depth), depth);
                let diff = u64::from(q.abs_diff(back));
                assert!(
                    diff <= step(s.storage(), depth),
                    "{s:?} at {depth:?}: {q} -> {back}"
                );
            }
        }
    }

    #[test]
    fn max_u32_index_pins_to_last_slot() {
        for colors in [1usize, 2, 7, 256, 65536] {
            assert_eq!(scale_to_index(Sample::U32(u32::MAX), colors), colors - 1);
            assert!(scale_to_index(Sample::U32(u32::MAX - 1), colors) < colors);
        }
    }

    #[test]
    fn narrow_indexes_scale_below_colors() {
        assert_eq!(scale_to_index(Sample::U8(255), 256), 255);
        assert_eq!(scale_to_index(Sample::U8(255), 2), 1);
        assert_eq!(scale_to_index(Sample::U8(127), 2), 0);
        assert_eq!(scale_to_index(Sample::U16(32768), 4), 2);
        assert_eq!(scale_to_index(Sample::U16(65535), 3), 2);
        assert_eq!(scale_to_index(Sample::F64(1.0), 5), 4);
        assert_eq!(scale_to_index(Sample::F32(0.5), 5), 2);
    }

    #[test]
    fn depth_constants() {
        assert_eq!(QuantumDepth::Q8.max(), 255);
        assert_eq!(QuantumDepth::Q32.max(), u32::MAX);
        assert_eq!(QuantumDepth::Q8.max_colormap_size(), 256);
        assert_eq!(QuantumDepth::default().preferred_storage(), StorageType::UInt16);
    }
}
