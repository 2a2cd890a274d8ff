use cgmath::{InnerSpace, Vector3};

use super::{Matrix, Vector, EPSILON};

pub fn zero() -> Vector {
    Vector3::new(0.0, 0.0, 0.0)
}

/// Unit length copy of `v`. Vectors too short to normalize snap to their dominant axis.
pub fn normalize(v: Vector) -> Vector {
    let l = v.magnitude();
    if l.abs() < EPSILON {
        if v.x >= v.y && v.x >= v.z {
            Vector3::new(1.0, 0.0, 0.0)
        } else if v.y >= v.z {
            Vector3::new(0.0, 1.0, 0.0)
        } else {
            Vector3::new(0.0, 0.0, 1.0)
        }
    } else {
        v * (1.0 / l)
    }
}

/// Normal of the triangle `a`, `b`, `c`.
pub fn normal(a: Vector, b: Vector, c: Vector) -> Vector {
    let p = c - b;
    let q = a - b;
    normalize(p.cross(q))
}

/// Applies the affine part of `m` to the point `a`.
pub fn transform(m: &Matrix, a: Vector) -> Vector {
    Vector3::new(
        m[0][0] * a.x + m[1][0] * a.y + m[2][0] * a.z + m[3][0],
        m[0][1] * a.x + m[1][1] * a.y + m[2][1] * a.z + m[3][1],
        m[0][2] * a.x + m[1][2] * a.y + m[2][2] * a.z + m[3][2],
    )
}

pub fn min(a: Vector, b: Vector) -> Vector {
    Vector3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
}

pub fn max(a: Vector, b: Vector) -> Vector {
    Vector3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
}

pub fn from_array(a: [f32; 3]) -> Vector {
    Vector3::new(a[0], a[1], a[2])
}

#[cfg(test)]
mod test {
    use super::*;
    use cgmath::{Matrix4, SquareMatrix};

    #[test]
    fn degenerate_normalize_picks_axis() {
        assert_eq!(normalize(zero()), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(normalize(Vector3::new(0.0, 1e-7, 0.0)), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(normalize(Vector3::new(0.0, 0.0, 3.0)), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn counter_clockwise_normal() {
        let n = normal(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(n, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn transform_translates() {
        let mut m = Matrix4::identity();
        m[3][0] = 2.0;
        m[3][2] = -1.0;
        assert_eq!(transform(&m, Vector3::new(1.0, 1.0, 1.0)), Vector3::new(3.0, 1.0, 0.0));
    }
}
