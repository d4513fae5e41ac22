#![no_main]
use libfuzzer_sys::fuzz_target;
use zenraster::*;

fuzz_target!(|data: &[u8]| {
    // 8-bit RGB at Q8 must survive constitute + extract unchanged.
    let [w, rest @ ..] = data else {
        return;
    };
    let w = usize::from(*w % 16) + 1;
    let h = rest.len() / (w * 3);
    if h == 0 {
        return;
    }
    let pixels = &rest[..w * h * 3];
    let buf = PixelBuffer::from_slice(pixels, &[h, w, 3]).unwrap();

    let mut ctx = Context::new(QuantumDepth::Q8);
    let frames = constitute(&buf, None, None, &mut ctx, enough::Unstoppable)
        .expect("valid RGB buffer must constitute");
    let out = extract(&frames, StorageType::UInt8, &mut ctx, enough::Unstoppable)
        .expect("constituted frames must extract");

    assert_eq!(out.to_vec::<u8>().unwrap(), pixels, "roundtrip pixel mismatch");
});
