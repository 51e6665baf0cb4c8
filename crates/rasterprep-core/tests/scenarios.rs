//! End-to-end transform chains over synthetic samples.

use std::sync::Arc;

use rasterprep_core::{
    CropConfig, CropTransform, ElementType, ErrorKind, ImageDimensions, Layout, Sample,
    ScaleConfig, ScaleTransform, StreamDescriptor, Transform, TransformChain, TransformError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn stream(dims: ImageDimensions) -> StreamDescriptor {
    StreamDescriptor::dense("features", ElementType::Float32, dims)
}

/// Sample whose element values are their flat indices.
fn indexed_sample(id: u64, dims: ImageDimensions) -> Arc<Sample> {
    let data: Vec<f32> = (0..dims.element_count()).map(|v| v as f32).collect();
    Arc::new(Sample::new(id, dims, data).expect("sample shape"))
}

#[test]
fn center_crop_32_to_28() {
    init_tracing();
    let dims = ImageDimensions::new(32, 32, 3);
    let mut crop = CropTransform::new(&CropConfig {
        crop_type: "center".into(),
        crop_ratio: "0.875".into(),
        ..Default::default()
    })
    .unwrap();
    crop.negotiate(&stream(dims)).unwrap();

    let out = crop.apply(indexed_sample(0, dims)).unwrap();
    assert_eq!(out.dims(), ImageDimensions::new(28, 28, 3));
    // First pixel of the window is source pixel (2, 2)
    let first = (2 * 32 + 2) * 3;
    assert_eq!(&out.as_f32().unwrap()[..3], &[first as f32, first as f32 + 1.0, first as f32 + 2.0]);
}

#[test]
fn multiview_produces_ten_views() {
    init_tracing();
    let dims = ImageDimensions::new(40, 40, 1);
    let mut crop = CropTransform::new(&CropConfig {
        crop_type: "multiview10".into(),
        crop_ratio: "1.0".into(),
        ..Default::default()
    })
    .unwrap();
    crop.negotiate(&stream(dims)).unwrap();

    let source = indexed_sample(0, dims);
    let src = source.as_f32().unwrap();
    let mirrored: Vec<f32> = src
        .chunks_exact(40)
        .flat_map(|row| row.iter().rev().copied())
        .collect();

    for id in 0..10 {
        let out = crop.apply(indexed_sample(id, dims)).unwrap();
        assert_eq!(out.dims(), dims);
        if id < 5 {
            assert_eq!(out.as_f32().unwrap(), src, "view {} should be unflipped", id);
        } else {
            assert_eq!(out.as_f32().unwrap(), &mirrored[..], "view {} should be flipped", id);
        }
    }
}

#[test]
fn scale_to_24_with_nearest() {
    init_tracing();
    let dims = ImageDimensions::new(48, 48, 3);
    let mut scale = ScaleTransform::new(&ScaleConfig {
        interpolations: "nearest".into(),
        ..ScaleConfig::new(24, 24, 3)
    })
    .unwrap();
    scale.negotiate(&stream(dims)).unwrap();

    let out = scale.apply(indexed_sample(0, dims)).unwrap();
    assert_eq!(out.dims(), ImageDimensions::new(24, 24, 3));
    let data = out.as_f32().unwrap();
    assert_eq!(data.len(), 24 * 24 * 3);
    // Nearest with an exact 2x ratio picks every other source pixel
    assert_eq!(&data[..6], &[0.0, 1.0, 2.0, 6.0, 7.0, 8.0]);
}

#[test]
fn inverted_crop_ratio_is_rejected() {
    let err = CropTransform::new(&CropConfig {
        crop_ratio: "0.5:0.2".into(),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, TransformError::InvalidConfig(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn crop_then_scale_with_random_kernel() {
    init_tracing();
    let dims = ImageDimensions::new(32, 32, 3);
    let mut chain = TransformChain::new()
        .with(
            CropTransform::new(&CropConfig {
                crop_ratio: "0.875".into(),
                ..Default::default()
            })
            .unwrap(),
        )
        .with(
            ScaleTransform::new(&ScaleConfig {
                interpolations: "linear:cubic".into(),
                ..ScaleConfig::new(24, 24, 3)
            })
            .unwrap(),
        );
    let output = chain.negotiate(&stream(dims)).unwrap();
    assert_eq!(output.dims, ImageDimensions::new(24, 24, 3));

    for id in 0..8 {
        let out = chain.apply(indexed_sample(id, dims)).unwrap();
        assert_eq!(out.dims(), ImageDimensions::new(24, 24, 3));
        assert_eq!(out.as_f32().unwrap().len(), 24 * 24 * 3);
    }
}

#[test]
fn full_chain_ends_in_chw() {
    init_tracing();
    let dims = ImageDimensions::new(20, 20, 3);
    let mut chain = TransformChain::from_json(
        r#"[
            { "type": "Crop", "cropType": "random", "cropRatio": "0.5:1.0", "jitterType": "uniRatio", "seed": 5 },
            { "type": "Scale", "width": 8, "height": 8, "channels": 3, "interpolations": "nearest:linear:cubic:lanczos" },
            { "type": "Mean" },
            { "type": "Transpose" }
        ]"#,
    )
    .unwrap();
    let output = chain.negotiate(&stream(dims)).unwrap();
    assert_eq!(output.layout, Layout::Chw);
    assert_eq!(output.dims, ImageDimensions::new(8, 8, 3));

    let out = chain.apply(indexed_sample(1, dims)).unwrap();
    assert_eq!(out.layout(), Layout::Chw);
    assert_eq!(out.id(), 1);
    assert!(out.original().is_none());
}

#[test]
fn random_crop_with_flip_on_f64_samples() {
    init_tracing();
    let dims = ImageDimensions::new(12, 12, 2);
    let mut crop = CropTransform::new(&CropConfig {
        crop_type: "random".into(),
        crop_ratio: "0.5".into(),
        seed: 42,
        ..Default::default()
    })
    .unwrap();
    assert!(crop.hflip());
    crop.negotiate(&StreamDescriptor::dense("features", ElementType::Float64, dims))
        .unwrap();

    let data: Vec<f64> = (0..dims.element_count()).map(|v| v as f64).collect();
    let out = crop
        .apply(Arc::new(Sample::new(0, dims, data).unwrap()))
        .unwrap();
    assert_eq!(out.dims(), ImageDimensions::new(6, 6, 2));
    assert_eq!(out.element_type(), ElementType::Float64);
}

#[test]
fn concurrent_application_is_deterministic_per_seed() {
    init_tracing();
    let dims = ImageDimensions::new(16, 16, 3);
    let mut chain = TransformChain::from_json(
        r#"[
            { "type": "Crop", "cropType": "center", "cropRatio": "0.75" },
            { "type": "Scale", "width": 6, "height": 6, "channels": 3 },
            { "type": "Transpose" }
        ]"#,
    )
    .unwrap();
    chain.negotiate(&stream(dims)).unwrap();

    let expected = chain.apply(indexed_sample(0, dims)).unwrap();
    let expected = expected.as_f32().unwrap();

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for id in 0..50 {
                    let out = chain.apply(indexed_sample(id, dims)).unwrap();
                    assert_eq!(out.as_f32().unwrap(), expected);
                }
            });
        }
    });
}

#[test]
fn concurrent_random_crops_stay_in_bounds() {
    init_tracing();
    let dims = ImageDimensions::new(24, 18, 1);
    let mut crop = CropTransform::new(&CropConfig {
        crop_type: "random".into(),
        crop_ratio: "0.25:0.9".into(),
        jitter_type: "uniratio".into(),
        ..Default::default()
    })
    .unwrap();
    crop.negotiate(&stream(dims)).unwrap();

    std::thread::scope(|s| {
        for worker in 0..4u64 {
            let crop = &crop;
            s.spawn(move || {
                for i in 0..100 {
                    let out = crop.apply(indexed_sample(worker * 1000 + i, dims)).unwrap();
                    let side = out.dims().width;
                    assert_eq!(out.dims().height, side);
                    assert!((4..=16).contains(&side), "side {}", side);
                }
            });
        }
    });
}
