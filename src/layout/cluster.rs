use std::f32::consts::{PI, TAU};

use rand::Rng;

use super::Point;
use crate::config::OrganicConfig;

// Rotates each ring against the previous one so slots do not line up radially.
const GOLDEN_ANGLE: f32 = 2.399_963;
const MIN_RING_CAPACITY: usize = 6;

/// Leaf offsets around a branch tip plus the radius they occupy.
#[derive(Debug, Clone, Default)]
pub(super) struct Cluster {
    pub(super) offsets: Vec<Point>,
    pub(super) radius: f32,
}

impl Cluster {
    pub(super) fn scaled(mut self, scale: f32) -> Self {
        for offset in &mut self.offsets {
            offset.x *= scale;
            offset.y *= scale;
        }
        self.radius *= scale;
        self
    }
}

pub(super) fn ring_radius(ring: usize, config: &OrganicConfig) -> f32 {
    config.ring_base_radius + ring as f32 * config.ring_step
}

pub(super) fn ring_capacity(ring: usize, config: &OrganicConfig) -> usize {
    let circumference = TAU * ring_radius(ring, config);
    ((circumference / config.leaf_spacing.max(1.0)).floor() as usize).max(MIN_RING_CAPACITY)
}

/// Offsets for `count` leaves: one sits on the tip, two or three share a
/// small circle, larger clusters fill concentric rings with bounded jitter.
pub(super) fn cluster_offsets<R: Rng>(count: usize, config: &OrganicConfig, rng: &mut R) -> Cluster {
    match count {
        0 => Cluster::default(),
        1 => Cluster {
            offsets: vec![Point::default()],
            radius: 0.0,
        },
        2 | 3 => {
            let radius = config.small_cluster_radius;
            let step = TAU / count as f32;
            let offsets = (0..count)
                .map(|idx| {
                    let theta = -PI / 2.0 + idx as f32 * step;
                    Point::new(radius * theta.cos(), radius * theta.sin())
                })
                .collect();
            Cluster { offsets, radius }
        }
        _ => {
            let jitter = config.ring_jitter.clamp(0.0, 0.5);
            let mut offsets = Vec::with_capacity(count);
            let mut remaining = count;
            let mut ring = 0;
            let mut radius = 0.0;
            while remaining > 0 {
                radius = ring_radius(ring, config);
                let take = ring_capacity(ring, config).min(remaining);
                let slot = TAU / take as f32;
                let phase = ring as f32 * GOLDEN_ANGLE;
                for idx in 0..take {
                    let drift = rng.random_range(-1.0f32..=1.0) * jitter * slot;
                    let theta = phase + idx as f32 * slot + drift;
                    offsets.push(Point::new(radius * theta.cos(), radius * theta.sin()));
                }
                remaining -= take;
                ring += 1;
            }
            Cluster { offsets, radius }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{CLUSTER_STREAM, seeded_stream};

    fn offsets(count: usize) -> Cluster {
        let mut rng = seeded_stream(7, CLUSTER_STREAM);
        cluster_offsets(count, &OrganicConfig::default(), &mut rng)
    }

    #[test]
    fn single_leaf_sits_on_tip() {
        let cluster = offsets(1);
        assert_eq!(cluster.offsets, vec![Point::default()]);
        assert_eq!(cluster.radius, 0.0);
    }

    #[test]
    fn small_clusters_share_fixed_radius() {
        for count in [2, 3] {
            let cluster = offsets(count);
            assert_eq!(cluster.offsets.len(), count);
            for offset in &cluster.offsets {
                let r = offset.distance(Point::default());
                assert!((r - OrganicConfig::default().small_cluster_radius).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn dense_clusters_grow_rings() {
        let config = OrganicConfig::default();
        let cluster = offsets(50);
        assert_eq!(cluster.offsets.len(), 50);
        assert!(cluster.radius > ring_radius(0, &config));
        for offset in &cluster.offsets {
            assert!(offset.distance(Point::default()) <= cluster.radius + 1e-3);
        }
    }

    #[test]
    fn jitter_keeps_leaves_apart() {
        let cluster = offsets(12);
        for (i, a) in cluster.offsets.iter().enumerate() {
            for b in cluster.offsets.iter().skip(i + 1) {
                assert!(a.distance(*b) > 1.0, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn ring_capacity_grows_with_radius() {
        let config = OrganicConfig::default();
        assert!(ring_capacity(4, &config) > ring_capacity(1, &config));
        assert_eq!(ring_capacity(0, &config), MIN_RING_CAPACITY);
    }
}
