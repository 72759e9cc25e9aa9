use glam::Vec3;
use rand::Rng;

/// A fixed-size point cloud stored as one flat `[x, y, z, x, y, z, ...]` buffer.
///
/// The buffer is only reachable as a slice, so its length (and therefore the
/// point count) cannot change after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    positions: Vec<f32>,
    /// Bumped by [`ParticleField::mark_dirty`]; renderers re-upload when it moves.
    version: u64,
}

impl ParticleField {
    /// Scatter `count` points with every coordinate drawn uniformly from
    /// `[-spread, spread]`.
    pub fn random<R: Rng + ?Sized>(count: usize, spread: f32, rng: &mut R) -> Self {
        let spread = spread.abs();
        let positions = (0..count * 3)
            .map(|_| rng.gen_range(-spread..=spread))
            .collect();
        Self {
            positions,
            version: 0,
        }
    }

    pub fn from_points(points: &[[f32; 3]]) -> Self {
        Self {
            positions: points.iter().flatten().copied().collect(),
            version: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.positions.len() / 3
    }

    /// The flat coordinate buffer.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn point(&self, index: usize) -> Option<Vec3> {
        let c = self.positions.get(index * 3..index * 3 + 3)?;
        Some(Vec3::new(c[0], c[1], c[2]))
    }

    /// Nudge every point along all three axes by `sin(t * frequency + i) * amplitude`,
    /// where `t` is a wall-clock reading in milliseconds and `i` the point index.
    ///
    /// The offset is added to the current position, so points wander further
    /// from where they started the longer the field runs. The sum is taken in
    /// `f64` and rounded to `f32` once.
    pub fn drift(&mut self, wall_millis: f64, frequency: f64, amplitude: f64) {
        let phase = wall_millis * frequency;
        for (i, point) in self.positions.chunks_exact_mut(3).enumerate() {
            let offset = (phase + i as f64).sin() * amplitude;
            for c in point {
                *c = (*c as f64 + offset) as f32;
            }
        }
    }

    /// Flag the buffer for upload to the rendering backend.
    pub fn mark_dirty(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
