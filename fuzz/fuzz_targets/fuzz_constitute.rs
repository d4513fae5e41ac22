#![no_main]
use libfuzzer_sys::fuzz_target;
use zenraster::*;

const ELEMENTS: [ElementType; 6] = [
    ElementType::UInt8,
    ElementType::UInt16,
    ElementType::UInt32,
    ElementType::Float32,
    ElementType::Float64,
    ElementType::Int16,
];

fuzz_target!(|data: &[u8]| {
    // Header: element, rank, flags, then one byte per dimension.
    let [elem, rank, flags, rest @ ..] = data else {
        return;
    };
    let element = ELEMENTS[usize::from(*elem) % ELEMENTS.len()];
    let rank = usize::from(*rank % 5);
    if rest.len() < rank {
        return;
    }
    let (dims, body) = rest.split_at(rank);
    let shape: Vec<usize> = dims.iter().map(|&d| usize::from(d % 9)).collect();
    let Ok(buf) = PixelBuffer::new(body, element, &shape) else {
        return;
    };

    let palette = [0u8, 0, 0, 128, 128, 128, 255, 255, 255];
    let pal = PixelBuffer::from_slice(&palette, &[3, 3]).unwrap();

    let mut req = ConstituteRequest::new(&buf).monochrome(flags & 1 != 0);
    if flags & 2 != 0 {
        req = req.palette(&pal);
    }
    if flags & 4 != 0 {
        req = req.colorspace(Colorspace::Gray);
    }
    if flags & 8 != 0 {
        req = req.colorspace(Colorspace::Cmyk);
    }

    let mut ctx = Context::default();
    let Ok(frames) = req.constitute(&mut ctx, enough::Unstoppable) else {
        return;
    };
    assert!(!ctx.exception().is_set(), "exception left pending");
    let _ = extract(&frames, StorageType::Float64, &mut ctx, enough::Unstoppable);
});
