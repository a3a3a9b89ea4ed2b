use std::f32::consts::TAU;

use rand::Rng;

use super::*;

const MIN_LEAF_SIZE: f32 = 6.0;
const MAX_LEAF_SIZE: f32 = 24.0;
const MIN_OPACITY: f32 = 0.6;
const MAX_OPACITY: f32 = 0.9;
// Crown layers share the radius range [0.3r, 0.3r + 0.14r * layers].
const INNER_LAYER: f32 = 0.3;
const LAYER_STEP: f32 = 0.14;
const SHADES: usize = 4;

/// Foliage around the trunk top, one bucket per severity sized by the
/// renormalized color ratio. Draws only from the canopy stream.
pub(super) fn compute_canopy(
    trunk: &TrunkGeometry,
    ratio: &ColorRatio,
    width: f32,
    margin: f32,
    config: &LayoutConfig,
) -> Vec<CanopyLeaf> {
    let organic = &config.organic;
    let shares = ratio.renormalized();
    if shares.sum() <= 0.0 || organic.canopy_leaves == 0 {
        return Vec::new();
    }

    let top = trunk.top();
    let radius = organic
        .canopy_radius
        .min((width / 2.0 - margin) * 0.9)
        .min((top.y - margin) / 1.25)
        .max(1.0);
    let center = Point::new(top.x, top.y - radius * 0.25);
    // Smaller crowns get proportionally smaller leaves.
    let size_scale = (radius / organic.canopy_radius.max(1.0)).clamp(0.25, 1.0);
    let layers = organic.canopy_layers.max(1);

    let mut rng = seeded_stream(config.seed, CANOPY_STREAM);
    let mut leaves = Vec::new();
    for severity in Severity::ALL {
        let count = (organic.canopy_leaves as f64 * shares.get(severity)).floor() as usize;
        let per_layer = count / layers;
        for layer in 0..layers {
            let layer_radius = radius * (INNER_LAYER + LAYER_STEP * layer as f32);
            for _ in 0..per_layer {
                let theta = rng.random_range(0.0..TAU);
                let distance = rng.random::<f32>().sqrt() * layer_radius * 0.9;
                leaves.push(CanopyLeaf {
                    center: Point::new(
                        center.x + distance * theta.cos(),
                        center.y + distance * theta.sin(),
                    ),
                    size: rng.random_range(MIN_LEAF_SIZE..=MAX_LEAF_SIZE) * size_scale,
                    rotation: rng.random_range(0.0..360.0),
                    opacity: rng.random_range(MIN_OPACITY..=MAX_OPACITY),
                    severity,
                    shade: rng.random_range(0..SHADES),
                });
            }
        }
    }
    leaves
}
