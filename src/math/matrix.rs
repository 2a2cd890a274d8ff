use cgmath::{InnerSpace, Matrix4, SquareMatrix};

use super::{quat, vector, Matrix, Quat, Vector, EPSILON};

pub fn identity() -> Matrix {
    Matrix4::identity()
}

/// `m · T(v)`
pub fn translate(m: Matrix, v: Vector) -> Matrix {
    let mut m = m;
    for i in 0..3 {
        m[3][i] += m[0][i] * v.x + m[1][i] * v.y + m[2][i] * v.z;
    }
    m
}

/// `m · S(v)`
pub fn scale(m: Matrix, v: Vector) -> Matrix {
    let mut m = m;
    m.x *= v.x;
    m.y *= v.y;
    m.z *= v.z;
    m
}

fn det2(a: f32, b: f32, c: f32, d: f32) -> f32 {
    a * d - b * c
}

#[allow(clippy::too_many_arguments)]
fn det3(a1: f32, a2: f32, a3: f32, b1: f32, b2: f32, b3: f32, c1: f32, c2: f32, c3: f32) -> f32 {
    a1 * det2(b2, b3, c2, c3) - b1 * det2(a2, a3, c2, c3) + c1 * det2(a2, a3, b2, b3)
}

/// Determinant by cofactor expansion.
pub fn det(m: &Matrix) -> f32 {
    let (a1, b1, c1, d1) = (m[0][0], m[1][0], m[2][0], m[3][0]);
    let (a2, b2, c2, d2) = (m[0][1], m[1][1], m[2][1], m[3][1]);
    let (a3, b3, c3, d3) = (m[0][2], m[1][2], m[2][2], m[3][2]);
    let (a4, b4, c4, d4) = (m[0][3], m[1][3], m[2][3], m[3][3]);
    a1 * det3(b2, b3, b4, c2, c3, c4, d2, d3, d4) - b1 * det3(a2, a3, a4, c2, c3, c4, d2, d3, d4)
        + c1 * det3(a2, a3, a4, b2, b3, b4, d2, d3, d4)
        - d1 * det3(a2, a3, a4, b2, b3, b4, c2, c3, c4)
}

/// Gauss-Jordan inversion with full pivoting. `None` when `m` is singular.
pub fn inverse(m: &Matrix) -> Option<Matrix> {
    let mut m: [[f32; 4]; 4] = (*m).into();
    let mut pvt_i = [0usize; 4];
    let mut pvt_j = [0usize; 4];
    let mut determinant = 1.0f32;

    for k in 0..4 {
        let mut pvt_val = m[k][k];
        pvt_i[k] = k;
        pvt_j[k] = k;
        for i in k..4 {
            for j in k..4 {
                if m[i][j].abs() > pvt_val.abs() {
                    pvt_i[k] = i;
                    pvt_j[k] = j;
                    pvt_val = m[i][j];
                }
            }
        }

        determinant *= pvt_val;
        if determinant.abs() < EPSILON {
            return None;
        }

        let i = pvt_i[k];
        if i != k {
            for j in 0..4 {
                let hold = -m[k][j];
                m[k][j] = m[i][j];
                m[i][j] = hold;
            }
        }
        let j = pvt_j[k];
        if j != k {
            for row in m.iter_mut() {
                let hold = -row[k];
                row[k] = row[j];
                row[j] = hold;
            }
        }

        for (i, row) in m.iter_mut().enumerate() {
            if i != k {
                row[k] /= -pvt_val;
            }
        }
        let pivot_row = m[k];
        for (i, row) in m.iter_mut().enumerate() {
            let hold = row[k];
            for j in 0..4 {
                if i != k && j != k {
                    row[j] += hold * pivot_row[j];
                }
            }
        }
        for j in 0..4 {
            if j != k {
                m[k][j] /= pvt_val;
            }
        }
        m[k][k] = 1.0 / pvt_val;
    }

    for k in (0..3).rev() {
        let i = pvt_j[k];
        if i != k {
            for j in 0..4 {
                let hold = m[k][j];
                m[k][j] = -m[i][j];
                m[i][j] = hold;
            }
        }
        let j = pvt_i[k];
        if j != k {
            for row in m.iter_mut() {
                let hold = row[k];
                row[k] = -row[j];
                row[j] = hold;
            }
        }
    }
    Some(m.into())
}

/// `m · R(q)`
pub fn rotate_quat(m: Matrix, q: Quat) -> Matrix {
    let (x, y, z, w) = (q.v.x, q.v.y, q.v.z, q.s);
    let l = q.magnitude2();
    let s = if l.abs() < EPSILON { 1.0 } else { 2.0 / l };

    let (xs, ys, zs) = (x * s, y * s, z * s);
    let (wx, wy, wz) = (w * xs, w * ys, w * zs);
    let (xx, xy, xz) = (x * xs, x * ys, x * zs);
    let (yy, yz, zz) = (y * ys, y * zs, z * zs);

    let mut r = identity();
    r[0][0] = 1.0 - (yy + zz);
    r[1][0] = xy - wz;
    r[2][0] = xz + wy;
    r[0][1] = xy + wz;
    r[1][1] = 1.0 - (xx + zz);
    r[2][1] = yz - wx;
    r[0][2] = xz - wy;
    r[1][2] = yz + wx;
    r[2][2] = 1.0 - (xx + yy);
    m * r
}

/// `m · R(axis, angle)`
pub fn rotate(m: Matrix, angle: f32, axis: Vector) -> Matrix {
    rotate_quat(m, quat::axis_angle(axis, angle))
}

/// World to camera transform for a camera at `pos` looking at `tgt`.
pub fn camera(pos: Vector, tgt: Vector, roll: f32) -> Matrix {
    let y = vector::normalize(tgt - pos);
    let z = if y.x != 0.0 || y.y != 0.0 {
        Vector::new(0.0, 0.0, 1.0)
    } else {
        Vector::new(-1.0, 0.0, 0.0)
    };
    let x = y.cross(z);
    let z = x.cross(y);
    let x = vector::normalize(x);
    let z = vector::normalize(z);

    let mut look = identity();
    look[0][0] = x.x;
    look[1][0] = x.y;
    look[2][0] = x.z;
    look[0][1] = y.x;
    look[1][1] = y.y;
    look[2][1] = y.z;
    look[0][2] = z.x;
    look[1][2] = z.y;
    look[2][2] = z.z;

    let m = rotate(identity(), roll, Vector::new(0.0, 1.0, 0.0));
    translate(m * look, -pos)
}

#[cfg(test)]
mod test {
    use super::*;
    use cgmath::Vector3;

    fn close(a: &Matrix, b: &Matrix) -> bool {
        (0..4).all(|i| (0..4).all(|j| (a[i][j] - b[i][j]).abs() < 1e-4))
    }

    fn sample() -> Matrix {
        let m = translate(identity(), Vector3::new(1.0, -2.0, 3.0));
        let m = rotate(m, 0.7, Vector3::new(1.0, 1.0, 0.0));
        scale(m, Vector3::new(2.0, 0.5, -1.0))
    }

    #[test]
    fn inverse_roundtrip() {
        let m = sample();
        let inv = inverse(&m).unwrap();
        assert!(close(&inverse(&inv).unwrap(), &m));
        assert!(close(&(m * inv), &identity()));
    }

    #[test]
    fn singular_has_no_inverse() {
        let m = scale(identity(), Vector3::new(1.0, 0.0, 1.0));
        assert!(inverse(&m).is_none());
    }

    #[test]
    fn det_of_mirror() {
        assert!((det(&sample()) + 1.0).abs() < 1e-4);
        assert_eq!(det(&identity()), 1.0);
    }

    #[test]
    fn translate_then_transform() {
        let m = translate(identity(), Vector3::new(1.0, 2.0, 3.0));
        let p = vector::transform(&m, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(p, Vector3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn camera_looks_down_y() {
        let m = camera(
            Vector3::new(0.0, -10.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
            0.0,
        );
        let p = vector::transform(&m, Vector3::new(0.0, 0.0, 0.0));
        assert!((p - Vector3::new(0.0, 10.0, 0.0)).magnitude() < 1e-4);
    }
}
