//! Math kernel: matrices, vectors and quaternions as plain `cgmath` values.
//!
//! Everything here is a pure function. Matrices are column major, `m[col][row]`, with the
//! translation in `m[3]`; quaternions keep the vector part in `q.v` and the scalar in `q.s`.

pub mod matrix;
pub mod quat;
pub mod vector;

pub use cgmath::{Matrix4, Quaternion, Vector3};

pub type Vector = Vector3<f32>;
pub type Matrix = Matrix4<f32>;
pub type Quat = Quaternion<f32>;
pub type Rgb = [f32; 3];

pub const EPSILON: f32 = 1e-5;
pub const PI: f32 = std::f32::consts::PI;
pub const TWOPI: f32 = 2.0 * PI;
pub const HALFPI: f32 = PI / 2.0;

/// Reshapes the position of `fc` between `fp` and `fn_` by the key's ease values.
pub fn ease(fp: f32, fc: f32, fn_: f32, ease_from: f32, ease_to: f32) -> f32 {
    let mut step = ((fc - fp) / (fn_ - fp)) as f64;
    let mut s = step;
    let (mut from, mut to) = (ease_from as f64, ease_to as f64);
    let tofrom = to + from;
    if tofrom != 0.0 {
        if tofrom > 1.0 {
            to /= tofrom;
            from /= tofrom;
        }
        let a = 1.0 / (2.0 - (to + from));
        s = if step < from {
            a / from * step * step
        } else if 1.0 - to <= step {
            step = 1.0 - step;
            1.0 - a / to * step * step
        } else {
            (2.0 * step - from) * a
        };
    }
    s as f32
}

/// Hermite blend of `a` to `b` with outgoing tangent `p` and incoming tangent `q`.
pub fn cubic_interp(a: [f32; 4], p: [f32; 4], q: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let (t2, t3) = (t * t, t * t * t);
    let x = 2.0 * t3 - 3.0 * t2 + 1.0;
    let y = -2.0 * t3 + 3.0 * t2;
    let z = t3 - 2.0 * t2 + t;
    let w = t3 - t2;
    let mut v = [0.0; 4];
    for i in 0..4 {
        v[i] = x * a[i] + y * b[i] + z * p[i] + w * q[i];
    }
    v
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ease_without_ease_is_linear() {
        assert_eq!(ease(0.0, 0.25, 1.0, 0.0, 0.0), 0.25);
    }

    #[test]
    fn ease_keeps_endpoints() {
        assert!((ease(0.0, 0.0, 1.0, 0.5, 0.5)).abs() < EPSILON);
        assert!((ease(0.0, 1.0, 1.0, 0.5, 0.5) - 1.0).abs() < EPSILON);
        assert!((ease(0.0, 0.5, 1.0, 0.5, 0.5) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn cubic_hits_endpoints() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let z = [9.0; 4];
        assert_eq!(cubic_interp(a, z, z, b, 0.0), a);
        assert_eq!(cubic_interp(a, z, z, b, 1.0), b);
    }
}
