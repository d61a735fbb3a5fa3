//! Adapts the black-box ear-cutting routine (here, the [`earcutr`] crate) to a face's 3D
//! vertex positions: projects the polygon to 2D using the face's own normal, normalizes
//! winding, and maps the ear-cutter's output back to the caller's local vertex indices.

use crate::math::{cross, dot, length, normalize, sub};
use crate::model::Vec3;

fn is_nearly_zero(x: f32) -> bool {
    x.abs() < 1e-6
}

/// Projects `positions` onto the plane orthogonal to `normal`, using `positions[0]` as the
/// origin of a local 2D basis.
fn project_to_2d(positions: &[Vec3], normal: Vec3) -> Vec<(f32, f32)> {
    let ref_point = positions[0];
    let normal = normalize(normal);

    let mut x_axis = if is_nearly_zero(dot(normal, (0.0, 0.0, 1.0))) {
        let candidate = cross((1.0, 0.0, 0.0), normal);
        if is_nearly_zero(length(candidate)) {
            cross((0.0, 1.0, 0.0), normal)
        } else {
            candidate
        }
    } else {
        cross((0.0, 0.0, 1.0), normal)
    };
    let y_axis = normalize(cross(normal, x_axis));
    x_axis = normalize(x_axis);

    positions
        .iter()
        .map(|&p| {
            let to_vertex = sub(p, ref_point);
            (dot(to_vertex, x_axis), dot(to_vertex, y_axis))
        })
        .collect()
}

/// Signed-area sum test: positive means counter-clockwise.
fn is_ccw(polygon: &[(f32, f32)]) -> bool {
    let mut sum = 0.0f64;
    let n = polygon.len();
    for i in 0..n {
        let j = (i + 1) % n;
        sum += (polygon[j].0 - polygon[i].0) as f64 * (polygon[j].1 + polygon[i].1) as f64;
    }
    sum > 0.0
}

/// Triangulates a simple polygon given as `positions` (one per corner, in source order) and
/// its already-computed normal. Returns indices into `positions` forming a flat list of
/// triangles (length `3 * (positions.len() - 2)`); for a triangle, returns the identity
/// permutation `[0, 1, 2]`.
pub fn triangulate(positions: &[Vec3], normal: Vec3) -> Vec<u32> {
    let n = positions.len();
    if n == 3 {
        return vec![0, 1, 2];
    }
    if n < 3 {
        return Vec::new();
    }

    let mut projected = project_to_2d(positions, normal);
    let mut order: Vec<u32> = (0..n as u32).collect();
    if !is_ccw(&projected) {
        projected.reverse();
        order.reverse();
    }

    let flat: Vec<f64> = projected
        .iter()
        .flat_map(|&(x, y)| [x as f64, y as f64])
        .collect();
    let local_indices = match earcutr::earcut(&flat, &[], 2) {
        Ok(indices) => indices,
        Err(err) => {
            log::warn!("triangulation failed: {err:?}");
            Vec::new()
        }
    };

    local_indices.into_iter().map(|i| order[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_is_identity() {
        let positions = [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)];
        assert_eq!(triangulate(&positions, (0.0, 0.0, 1.0)), vec![0, 1, 2]);
    }

    #[test]
    fn convex_quad_triangulates_into_two_triangles() {
        let positions = [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
        ];
        let indices = triangulate(&positions, (0.0, 0.0, 1.0));
        assert_eq!(indices.len(), 6);
        for i in &indices {
            assert!((*i as usize) < positions.len());
        }
    }

    #[test]
    fn concave_pentagon_yields_three_triangles() {
        // A plus-sign-missing-a-bite pentagon: concave at (0.5, 0.5).
        let positions = [
            (0.0, 0.0, 0.0),
            (2.0, 0.0, 0.0),
            (2.0, 2.0, 0.0),
            (0.5, 0.5, 0.0),
            (0.0, 2.0, 0.0),
        ];
        let indices = triangulate(&positions, (0.0, 0.0, 1.0));
        assert_eq!(indices.len(), 9);
    }
}
