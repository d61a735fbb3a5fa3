//! Small vec3 helpers shared by the geometry indexer and the triangulator adapter.

use crate::model::Vec3;

pub(crate) fn sub(a: Vec3, b: Vec3) -> Vec3 {
    (a.0 - b.0, a.1 - b.1, a.2 - b.2)
}

pub(crate) fn dot(a: Vec3, b: Vec3) -> f32 {
    a.0 * b.0 + a.1 * b.1 + a.2 * b.2
}

pub(crate) fn cross(a: Vec3, b: Vec3) -> Vec3 {
    (
        a.1 * b.2 - a.2 * b.1,
        a.2 * b.0 - a.0 * b.2,
        a.0 * b.1 - a.1 * b.0,
    )
}

pub(crate) fn length(a: Vec3) -> f32 {
    dot(a, a).sqrt()
}

pub(crate) fn normalize(a: Vec3) -> Vec3 {
    let len = length(a);
    if len < 1e-12 {
        a
    } else {
        (a.0 / len, a.1 / len, a.2 / len)
    }
}

/// The Newell-method polygon normal: a numerically stable normal for a (possibly non-planar
/// or concave) polygon, computed as a sum over consecutive vertex pairs.
pub(crate) fn newell_normal(positions: &[Vec3]) -> Vec3 {
    let n = positions.len();
    if n < 3 {
        return (0.0, 0.0, 0.0);
    }
    let mut normal = (0.0, 0.0, 0.0);
    for i in 0..n {
        let cur = positions[i];
        let next = positions[(i + 1) % n];
        normal.0 += (cur.1 - next.1) * (cur.2 + next.2);
        normal.1 += (cur.2 - next.2) * (cur.0 + next.0);
        normal.2 += (cur.0 - next.0) * (cur.1 + next.1);
    }
    normalize(normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newell_normal_of_xy_quad_points_along_z() {
        let quad = [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
        ];
        let n = newell_normal(&quad);
        assert!((n.2 - 1.0).abs() < 1e-5 || (n.2 + 1.0).abs() < 1e-5);
        assert!(n.0.abs() < 1e-5 && n.1.abs() < 1e-5);
    }
}
