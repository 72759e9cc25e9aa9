use glam::{Mat4, Vec3};

/// Indexed triangle geometry in plain arrays, ready to hand to a GPU buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Build geometry, computing smooth normals when none are supplied and a
    /// sequential index list when the source is not indexed.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        indices: Option<Vec<u32>>,
    ) -> Self {
        let indices = indices.unwrap_or_else(|| (0..positions.len() as u32).collect());
        let normals = match normals {
            Some(n) if n.len() == positions.len() => n,
            _ => smooth_normals(&positions, &indices),
        };
        Self {
            positions,
            normals,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bake a transform into the vertex data.
    pub fn transformed(mut self, matrix: Mat4) -> Self {
        let normal_matrix = matrix.inverse().transpose();
        for p in &mut self.positions {
            *p = matrix.transform_point3(Vec3::from(*p)).to_array();
        }
        for n in &mut self.normals {
            *n = normal_matrix
                .transform_vector3(Vec3::from(*n))
                .normalize_or_zero()
                .to_array();
        }
        self
    }
}

/// Area-weighted vertex normals accumulated from face normals.
fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let (pa, pb, pc) = (
            Vec3::from(positions[a]),
            Vec3::from(positions[b]),
            Vec3::from(positions[c]),
        );
        let face = (pb - pa).cross(pc - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            let n = if n == Vec3::ZERO { Vec3::Y } else { n };
            n.to_array()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<[f32; 3]> {
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
    }

    #[test]
    fn generates_indices_and_normals() {
        let g = Geometry::new(triangle(), None, None);
        assert_eq!(g.indices, vec![0, 1, 2]);
        assert_eq!(g.triangle_count(), 1);
        for n in &g.normals {
            assert_eq!(*n, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn keeps_supplied_normals() {
        let normals = vec![[0.0, 1.0, 0.0]; 3];
        let g = Geometry::new(triangle(), Some(normals.clone()), Some(vec![0, 1, 2]));
        assert_eq!(g.normals, normals);
    }

    #[test]
    fn transform_bakes_translation_not_into_normals() {
        let g = Geometry::new(triangle(), None, None)
            .transformed(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));
        assert_eq!(g.positions[0], [0.0, 2.0, 0.0]);
        assert_eq!(g.normals[0], [0.0, 0.0, 1.0]);
    }
}
