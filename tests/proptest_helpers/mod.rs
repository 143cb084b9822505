#![allow(dead_code)]

use augsync::transform::{FlipDirection, Transform};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const EPS: f64 = 1e-9;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Image sizes from tiny to a few thousand pixels.
pub fn arb_dims() -> impl Strategy<Value = (u32, u32)> {
    (1u32..4000, 1u32..4000)
}

/// A ring of 1 to 40 vertices inside a `width × height` image.
pub fn arb_ring(width: u32, height: u32) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((0.0..=width as f64, 0.0..=height as f64), 1..40)
        .prop_map(|pts| pts.into_iter().flat_map(|(x, y)| [x, y]).collect())
}

/// A dimension pair together with a ring inside it.
pub fn arb_dims_and_ring() -> impl Strategy<Value = ((u32, u32), Vec<f64>)> {
    arb_dims().prop_flat_map(|(w, h)| (Just((w, h)), arb_ring(w, h)))
}

/// Any transform that has a point mapping.
pub fn arb_supported_transform() -> impl Strategy<Value = Transform> {
    prop_oneof![
        (-720.0f64..720.0).prop_map(|angle| Transform::Rotate { angle }),
        prop::sample::select(vec![0.0f64, 90.0, 180.0, 270.0, -90.0])
            .prop_map(|angle| Transform::Rotate { angle }),
        Just(Transform::Flip {
            direction: FlipDirection::Horizontal
        }),
        (-2.0f64..2.0).prop_map(|factor| Transform::Shear { factor }),
        (0.0f64..3.0).prop_map(|factor| Transform::Brightness { factor }),
    ]
}

/// `[min_x, min_y, max_x - min_x, max_y - min_y]` of a flat ring.
pub fn envelope(ring: &[f64]) -> [f64; 4] {
    let xs = ring.iter().step_by(2).copied();
    let ys = ring.iter().skip(1).step_by(2).copied();
    let (min_x, max_x) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let (min_y, max_y) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    [min_x, min_y, max_x - min_x, max_y - min_y]
}
