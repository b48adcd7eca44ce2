use std::f32::consts::PI;
use std::ops::RangeInclusive;

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skyfield_common::Transform;

/// Uniform scale applied to each instance.
pub const SCALE_RANGE: RangeInclusive<f32> = 0.5..=1.0;
/// Yaw about +Y, radians.
pub const YAW_RANGE: RangeInclusive<f32> = 0.0..=PI;

/// Rectangle on the ground plane centred at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    /// Extent along X.
    pub width: f32,
    /// Extent along Z.
    pub depth: f32,
}

impl FieldBounds {
    pub fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x.abs() <= self.width * 0.5 && p.z.abs() <= self.depth * 0.5
    }
}

/// Placement transforms for one instanced mesh, in instance-buffer order.
///
/// There are no mutating accessors: the set is fixed once generated.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceSet {
    transforms: Vec<Transform>,
    bounds: FieldBounds,
}

impl InstanceSet {
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn bounds(&self) -> FieldBounds {
        self.bounds
    }

    pub fn get(&self, index: usize) -> Option<&Transform> {
        self.transforms.get(index)
    }

    pub fn as_slice(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Transform> {
        self.transforms.iter()
    }

    /// Model matrices in slot order, ready for upload.
    pub fn matrices(&self) -> Vec<Mat4> {
        self.transforms.iter().map(Transform::matrix).collect()
    }
}

/// Scatter `count` instances over `bounds`, sampling each slot independently:
/// x and z uniform within the bounds, y on the ground, one uniform scale, and
/// a yaw in `[0, π]`.
pub fn scatter<R: Rng + ?Sized>(count: usize, bounds: FieldBounds, rng: &mut R) -> InstanceSet {
    let half_w = bounds.width * 0.5;
    let half_d = bounds.depth * 0.5;

    let transforms = (0..count)
        .map(|_| {
            let x = rng.gen_range(-half_w..=half_w);
            let z = rng.gen_range(-half_d..=half_d);
            let scale = rng.gen_range(SCALE_RANGE);
            let yaw = rng.gen_range(YAW_RANGE);
            Transform::from_yaw_scale(Vec3::new(x, 0.0, z), yaw, scale)
        })
        .collect();

    InstanceSet { transforms, bounds }
}

/// [`scatter`] with a seeded generator so a scene looks the same every launch.
pub fn scatter_seeded(count: usize, bounds: FieldBounds, seed: u64) -> InstanceSet {
    let mut rng = StdRng::seed_from_u64(seed);
    scatter(count, bounds, &mut rng)
}
