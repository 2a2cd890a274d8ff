use cgmath::{InnerSpace, Quaternion, Vector3};

use super::{Quat, Vector, EPSILON};

pub fn identity() -> Quat {
    Quaternion::new(1.0, 0.0, 0.0, 0.0)
}

/// Rotation of `angle` radians about `axis`. A degenerate axis yields the identity.
///
/// Angles are negated, keys in a 3DS rotation track turn clockwise.
pub fn axis_angle(axis: Vector, angle: f32) -> Quat {
    let l = axis.magnitude() as f64;
    if l < EPSILON as f64 {
        return identity();
    }
    let omega = -0.5 * angle as f64;
    let s = (omega.sin() / l) as f32;
    Quaternion::from_sv(omega.cos() as f32, axis * s)
}

pub fn conjugate(q: Quat) -> Quat {
    Quaternion::from_sv(q.s, -q.v)
}

/// Inverse assuming `q` is close to unit length. Degenerate input yields the identity.
pub fn inverse(q: Quat) -> Quat {
    let l = q.magnitude() as f64;
    if l.abs() < EPSILON as f64 {
        return identity();
    }
    let m = (1.0 / l) as f32;
    Quaternion::from_sv(q.s * m, -q.v * m)
}

pub fn normalize(q: Quat) -> Quat {
    let l = q.magnitude();
    if l.abs() < EPSILON {
        return identity();
    }
    q * (1.0 / l)
}

pub fn dot(a: Quat, b: Quat) -> f32 {
    a.s * b.s + a.v.dot(b.v)
}

/// Logarithm of a unit quaternion; the scalar part comes out as zero.
pub fn ln(q: Quat) -> Quat {
    let s = q.v.magnitude() as f64;
    let t = if s.abs() >= EPSILON as f64 {
        (s.atan2(q.s as f64) / s) as f32
    } else {
        0.0
    };
    Quaternion::from_sv(0.0, q.v * t)
}

/// `ln(a⁻¹ b)`
pub fn ln_dif(a: Quat, b: Quat) -> Quat {
    ln(inverse(a) * b)
}

/// Exponential of a pure quaternion; the scalar part of `q` is ignored.
pub fn exp(q: Quat) -> Quat {
    let om = q.v.magnitude() as f64;
    let sinom = if om.abs() >= EPSILON as f64 {
        om.sin() / om
    } else {
        1.0
    };
    Quaternion::from_sv(om.cos() as f32, q.v * sinom as f32)
}

/// Spherical interpolation along the shorter arc.
pub fn slerp(a: Quat, b: Quat, t: f32) -> Quat {
    let mut l = dot(a, b) as f64;
    let mut flip = 1.0;
    if l < 0.0 {
        flip = -1.0;
        l = -l;
    }
    let om = l.min(1.0).acos();
    let sinom = om.sin();
    let (sp, mut sq) = if sinom.abs() > EPSILON as f64 {
        (
            ((1.0 - t as f64) * om).sin() / sinom,
            (t as f64 * om).sin() / sinom,
        )
    } else {
        (1.0 - t as f64, t as f64)
    };
    sq *= flip;
    a * sp as f32 + b * sq as f32
}

/// Spherical quadrangle interpolation from `a` to `b` with inner control points `p`, `q`.
pub fn squad(a: Quat, p: Quat, q: Quat, b: Quat, t: f32) -> Quat {
    let ab = slerp(a, b, t);
    let pq = slerp(p, q, t);
    slerp(ab, pq, 2.0 * t * (1.0 - t))
}

/// Squad control point for `q` between neighbours `p` and `n`.
pub fn tangent(p: Quat, q: Quat, n: Quat) -> Quat {
    let dn = ln_dif(q, n);
    let dp = ln_dif(q, p);
    let x = (dn + dp) * -0.25;
    q * exp(x)
}

pub fn to_array(q: Quat) -> [f32; 4] {
    [q.v.x, q.v.y, q.v.z, q.s]
}

pub fn from_array(a: [f32; 4]) -> Quat {
    Quaternion::from_sv(a[3], Vector3::new(a[0], a[1], a[2]))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::HALFPI;

    fn close(a: Quat, b: Quat) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn slerp_endpoints() {
        let a = axis_angle(Vector3::new(0.0, 0.0, 1.0), 0.3);
        let b = axis_angle(Vector3::new(1.0, 0.0, 0.0), 1.2);
        assert!(close(slerp(a, b, 0.0), a));
        assert!(close(slerp(a, b, 1.0), b));
    }

    #[test]
    fn slerp_takes_short_path() {
        let a = axis_angle(Vector3::new(0.0, 0.0, 1.0), 0.3);
        let b = a * -1.0;
        assert!(close(slerp(a, b, 0.5), a));
    }

    #[test]
    fn axis_angle_degenerate_axis() {
        assert_eq!(axis_angle(Vector3::new(0.0, 0.0, 0.0), 1.0), identity());
    }

    #[test]
    fn axis_angle_turns_clockwise() {
        let q = axis_angle(Vector3::new(0.0, 0.0, 1.0), HALFPI);
        assert!((q.v.z + (0.5f32).sqrt()).abs() < 1e-6);
        assert!((q.s - (0.5f32).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn exp_inverts_ln() {
        let q = axis_angle(Vector3::new(1.0, 2.0, 3.0), 0.7);
        assert!(close(exp(ln(q)), q));
        assert!(close(exp(ln_dif(q, q)), identity()));
    }
}
