use enough::Unstoppable;
use zenraster::*;

fn constitute_u8(data: &[u8], shape: &[usize], ctx: &mut Context) -> RasterSequence {
    let buf = PixelBuffer::from_slice(data, shape).unwrap();
    ConstituteRequest::new(&buf).constitute(ctx, Unstoppable).unwrap()
}

#[test]
fn single_frame_has_no_leading_dimension() {
    let mut ctx = Context::new(QuantumDepth::Q8);
    let frames = constitute_u8(&[0; 2 * 3 * 3], &[2, 3, 3], &mut ctx);
    let out = extract(&frames, StorageType::UInt8, &mut ctx, Unstoppable).unwrap();
    assert_eq!(out.shape(), &[2, 3, 3]);
}

#[test]
fn multiple_frames_add_leading_dimension() {
    let mut ctx = Context::new(QuantumDepth::Q8);
    let frames = constitute_u8(&[0; 4 * 2 * 3 * 4], &[4, 2, 3, 4], &mut ctx);
    assert_eq!(frames.len(), 4);
    let out = extract(&frames, StorageType::UInt8, &mut ctx, Unstoppable).unwrap();
    // RGBA input keeps its opacity channel
    assert_eq!(out.shape(), &[4, 2, 3, 4]);
}

#[test]
fn float_and_integer_differ_only_by_scaling() {
    let data: Vec<u8> = (0..2 * 2 * 3).map(|i| (i * 21) as u8).collect();
    let mut ctx = Context::new(QuantumDepth::Q8);
    let frames = constitute_u8(&data, &[2, 2, 3], &mut ctx);

    let ints = extract(&frames, StorageType::UInt8, &mut ctx, Unstoppable).unwrap();
    let floats = extract(&frames, StorageType::Float64, &mut ctx, Unstoppable).unwrap();
    assert_eq!(ints.shape(), floats.shape());
    assert_eq!(floats.element(), ElementType::Float64);

    let ints = ints.to_vec::<u8>().unwrap();
    let floats = floats.to_vec::<f64>().unwrap();
    for (i, f) in ints.iter().zip(&floats) {
        assert_eq!(f64::from(*i) / 255.0, *f);
    }
}

#[test]
fn integer_request_is_widened_to_quantum() {
    let mut ctx = Context::new(QuantumDepth::Q16);
    let frames = constitute_u8(&[0, 128, 255, 1, 2, 3], &[1, 2, 3], &mut ctx);
    let out = extract(&frames, StorageType::UInt8, &mut ctx, Unstoppable).unwrap();
    assert_eq!(out.element(), ElementType::UInt16);
    assert_eq!(
        out.to_vec::<u16>().unwrap(),
        [0, 128 * 257, 65535, 257, 2 * 257, 3 * 257]
    );
}

#[test]
fn indexed_integer_request_returns_indexes() {
    let palette = [0u8, 0, 0, 100, 100, 100, 200, 200, 200];
    let pal = PixelBuffer::from_slice(&palette, &[3, 3]).unwrap();
    let indexes = [0.0f64, 0.5, 1.0, 0.5];
    let buf = PixelBuffer::from_slice(&indexes, &[2, 2]).unwrap();
    let mut ctx = Context::new(QuantumDepth::Q8);
    let frames = ConstituteRequest::new(&buf)
        .palette(&pal)
        .constitute(&mut ctx, Unstoppable)
        .unwrap();

    let out = extract(&frames, StorageType::UInt32, &mut ctx, Unstoppable).unwrap();
    assert_eq!(out.element(), ElementType::UInt8);
    assert_eq!(out.shape(), &[2, 2]);
    assert_eq!(out.to_vec::<u8>().unwrap(), [0, 1, 2, 1]);
}

#[test]
fn indexed_float_request_returns_intensity() {
    let palette = [0u8, 0, 0, 255, 255, 255];
    let pal = PixelBuffer::from_slice(&palette, &[2, 3]).unwrap();
    let indexes = [0u8, 255, 255, 0, 0, 0];
    let buf = PixelBuffer::from_slice(&indexes, &[3, 1, 2]).unwrap();
    let mut ctx = Context::new(QuantumDepth::Q16);
    let frames = ConstituteRequest::new(&buf)
        .palette(&pal)
        .constitute(&mut ctx, Unstoppable)
        .unwrap();

    let out = extract(&frames, StorageType::Float32, &mut ctx, Unstoppable).unwrap();
    assert_eq!(out.shape(), &[3, 1, 2]);
    assert_eq!(out.to_vec::<f32>().unwrap(), [0.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn every_frame_of_an_indexed_stack_is_read() {
    let palette = [0u8, 0, 0, 255, 255, 255];
    let pal = PixelBuffer::from_slice(&palette, &[2, 3]).unwrap();
    let indexes = [0u8, 0, 255, 255];
    let buf = PixelBuffer::from_slice(&indexes, &[2, 1, 2]).unwrap();
    let mut ctx = Context::default();
    let frames = ConstituteRequest::new(&buf)
        .palette(&pal)
        .constitute(&mut ctx, Unstoppable)
        .unwrap();
    let out = extract(&frames, StorageType::UInt8, &mut ctx, Unstoppable).unwrap();
    assert_eq!(out.to_vec::<u8>().unwrap(), [0, 0, 1, 1]);
}

#[test]
fn cmyk_frames_extract_four_channels() {
    let data = [1u8, 2, 3, 4];
    let buf = PixelBuffer::from_slice(&data, &[1, 1, 4]).unwrap();
    let mut ctx = Context::new(QuantumDepth::Q8);
    let frames = ConstituteRequest::new(&buf)
        .colorspace(Colorspace::Cmyk)
        .constitute(&mut ctx, Unstoppable)
        .unwrap();
    let out = extract(&frames, StorageType::UInt8, &mut ctx, Unstoppable).unwrap();
    assert_eq!(out.shape(), &[1, 1, 4]);
    assert_eq!(out.to_vec::<u8>().unwrap(), data);
}

#[test]
fn colormap_export_matches_palette() {
    let palette = [10u8, 20, 30, 255, 40, 50, 60, 0];
    let pal = PixelBuffer::from_slice(&palette, &[2, 4]).unwrap();
    let indexes = [0u8, 255];
    let buf = PixelBuffer::from_slice(&indexes, &[1, 2]).unwrap();
    let mut ctx = Context::new(QuantumDepth::Q8);
    let frames = ConstituteRequest::new(&buf)
        .palette(&pal)
        .constitute(&mut ctx, Unstoppable)
        .unwrap();
    let cmap = colormap_buffer(frames.first().unwrap(), &mut ctx)
        .unwrap()
        .unwrap();
    assert_eq!(cmap.shape(), &[2, 4]);
    assert_eq!(cmap.to_vec::<u8>().unwrap(), palette);
}

#[test]
fn mixed_storage_class_is_rejected() {
    let palette = [0u8, 0, 0, 255, 255, 255];
    let pal = PixelBuffer::from_slice(&palette, &[2, 3]).unwrap();
    let data = [0u8, 255];
    let buf = PixelBuffer::from_slice(&data, &[1, 2]).unwrap();
    let mut ctx = Context::default();
    let indexed = ConstituteRequest::new(&buf)
        .palette(&pal)
        .constitute(&mut ctx, Unstoppable)
        .unwrap();
    let direct = ConstituteRequest::new(&buf)
        .constitute(&mut ctx, Unstoppable)
        .unwrap();
    let mixed: RasterSequence = indexed.into_iter().chain(direct).collect();
    assert!(matches!(
        extract(&mixed, StorageType::UInt8, &mut ctx, Unstoppable),
        Err(RasterError::InvalidShape(_))
    ));
}

#[test]
fn memory_limit_applies_to_output() {
    let mut ctx = Context::new(QuantumDepth::Q8);
    let frames = constitute_u8(&[0; 8 * 8], &[8, 8], &mut ctx);
    let limits = Limits {
        max_memory_bytes: Some(100),
        ..Limits::default()
    };
    // 8 * 8 * 3 bytes of RGB output
    assert!(matches!(
        ExtractRequest::new(&frames, StorageType::UInt8)
            .with_limits(&limits)
            .extract(&mut ctx, Unstoppable),
        Err(RasterError::LimitExceeded(_))
    ));
}
