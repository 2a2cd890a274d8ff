//! Keyframe tracks and their Kochanek-Bartels (TCB) evaluation.
//!
//! Scalar and vector tracks interpolate with cubic Hermite segments whose tangents come from
//! each key's tension, continuity and bias. Rotation tracks store every key as an axis and an
//! angle *relative to the previous key*; evaluation accumulates them into absolute
//! orientations and blends with squad.

use crate::error::Result;
use crate::io::{Reader, Writer};
use crate::math::{self, quat, Quat, Vector, EPSILON, TWOPI};

use cgmath::{Quaternion, Vector3};

use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Bool,
    Float,
    Vector,
    Quat,
}

impl TrackType {
    /// Number of value components stored per key.
    pub fn arity(self) -> usize {
        match self {
            Self::Bool => 0,
            Self::Float => 1,
            Self::Vector => 3,
            Self::Quat => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Key {
    pub frame: i32,
    pub flags: u16,
    pub tens: f32,
    pub cont: f32,
    pub bias: f32,
    pub ease_to: f32,
    pub ease_from: f32,
    /// `[x]`, `[x, y, z]`, or `[axis_x, axis_y, axis_z, angle]` depending on the track type.
    pub value: [f32; 4],
}

impl Key {
    pub const USE_TENS: u16 = 0x01;
    pub const USE_CONT: u16 = 0x02;
    pub const USE_BIAS: u16 = 0x04;
    pub const USE_EASE_TO: u16 = 0x08;
    pub const USE_EASE_FROM: u16 = 0x10;

    pub fn new(frame: i32, value: [f32; 4]) -> Self {
        Self {
            frame,
            value,
            ..Default::default()
        }
    }

    /// Sets the TCB parameters and raises the matching flags for non-default values.
    pub fn with_tcb(mut self, tens: f32, cont: f32, bias: f32) -> Self {
        self.tens = tens;
        self.cont = cont;
        self.bias = bias;
        self.flags = self.computed_flags();
        self
    }

    fn computed_flags(&self) -> u16 {
        let mut flags = self.flags;
        for &(v, f) in &[
            (self.tens, Self::USE_TENS),
            (self.cont, Self::USE_CONT),
            (self.bias, Self::USE_BIAS),
            (self.ease_to, Self::USE_EASE_TO),
            (self.ease_from, Self::USE_EASE_FROM),
        ] {
            if v != 0.0 {
                flags |= f;
            }
        }
        flags
    }

    fn axis(&self) -> Vector {
        Vector3::new(self.value[0], self.value[1], self.value[2])
    }

    /// The incremental rotation of a rotation key.
    fn rotation(&self) -> Quat {
        quat::axis_angle(self.axis(), self.value[3])
    }

    fn read<'a>(r: &mut Reader<'a>, kind: TrackType) -> Result<Self> {
        let mut key = Key {
            frame: r.i32()?,
            flags: r.u16()?,
            ..Default::default()
        };
        if key.flags & Self::USE_TENS != 0 {
            key.tens = r.f32()?;
        }
        if key.flags & Self::USE_CONT != 0 {
            key.cont = r.f32()?;
        }
        if key.flags & Self::USE_BIAS != 0 {
            key.bias = r.f32()?;
        }
        if key.flags & Self::USE_EASE_TO != 0 {
            key.ease_to = r.f32()?;
        }
        if key.flags & Self::USE_EASE_FROM != 0 {
            key.ease_from = r.f32()?;
        }
        match kind {
            TrackType::Bool => {}
            TrackType::Float => key.value[0] = r.f32()?,
            TrackType::Vector => {
                let v = r.vector()?;
                key.value[..3].copy_from_slice(&[v.x, v.y, v.z]);
            }
            TrackType::Quat => {
                key.value[3] = r.f32()?;
                let v = r.vector()?;
                key.value[..3].copy_from_slice(&[v.x, v.y, v.z]);
            }
        }
        Ok(key)
    }

    fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>, kind: TrackType) -> Result<()> {
        w.i32(self.frame)?;
        w.u16(self.flags)?;
        if self.flags & Self::USE_TENS != 0 {
            w.f32(self.tens)?;
        }
        if self.flags & Self::USE_CONT != 0 {
            w.f32(self.cont)?;
        }
        if self.flags & Self::USE_BIAS != 0 {
            w.f32(self.bias)?;
        }
        if self.flags & Self::USE_EASE_TO != 0 {
            w.f32(self.ease_to)?;
        }
        if self.flags & Self::USE_EASE_FROM != 0 {
            w.f32(self.ease_from)?;
        }
        match kind {
            TrackType::Bool => Ok(()),
            TrackType::Float => w.f32(self.value[0]),
            TrackType::Vector => w.vector(self.axis()),
            TrackType::Quat => {
                w.f32(self.value[3])?;
                w.vector(self.axis())
            }
        }
    }
}

/// Result of sampling a non-empty track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackValue {
    Bool(bool),
    Float(f32),
    Vector(Vector),
    Quat(Quat),
}

/// Where a time falls relative to the keys.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Position {
    Before,
    After,
    /// Between keys `index - 1` and `index`, at parameter `u`.
    Within(usize, f32),
}

/// Copies of the keys around a segment. Rotation keys hold absolute orientations.
struct Segment {
    pp: Option<Key>,
    p0: Key,
    p1: Key,
    pn: Option<Key>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub kind: TrackType,
    pub flags: u16,
    pub keys: Vec<Key>,
}

/// `x - y * n` with `n` the quotient rounded half to even.
fn ieee_remainder(x: f64, y: f64) -> f64 {
    let q = x / y;
    let n = if (q - q.trunc()).abs() == 0.5 {
        2.0 * (q / 2.0).round()
    } else {
        q.round()
    };
    x - y * n
}

fn pos_key_setup(pp: Option<&Key>, pc: &Key, pn: Option<&Key>) -> ([f32; 4], [f32; 4]) {
    let (mut fp, mut f_n) = (1.0f32, 1.0f32);
    if let (Some(pp), Some(pn)) = (pp, pn) {
        let dt = 0.5 * (pn.frame - pp.frame) as f32;
        fp = (pc.frame - pp.frame) as f32 / dt;
        f_n = (pn.frame - pc.frame) as f32 / dt;
        let c = pc.cont.abs();
        fp = fp + c - c * fp;
        f_n = f_n + c - c * f_n;
    }
    let cm = 1.0 - pc.cont;
    let tm = 0.5 * (1.0 - pc.tens);
    let cp = 2.0 - cm;
    let bm = 1.0 - pc.bias;
    let bp = 2.0 - bm;
    let tmcm = tm * cm;
    let tmcp = tm * cp;
    let ksm = tmcm * bp * fp;
    let ksp = tmcp * bm * fp;
    let kdm = tmcp * bp * f_n;
    let kdp = tmcm * bm * f_n;

    let mut delm = [0.0; 4];
    let mut delp = [0.0; 4];
    for i in 0..4 {
        if let Some(pp) = pp {
            delm[i] = pc.value[i] - pp.value[i];
        }
        if let Some(pn) = pn {
            delp[i] = pn.value[i] - pc.value[i];
        }
    }
    if pp.is_none() {
        delm = delp;
    }
    if pn.is_none() {
        delp = delm;
    }

    let mut dd = [0.0; 4];
    let mut ds = [0.0; 4];
    for i in 0..4 {
        ds[i] = ksm * delm[i] + ksp * delp[i];
        dd[i] = kdm * delm[i] + kdp * delp[i];
    }
    (dd, ds)
}

fn rot_key_setup(prev: Option<&Key>, cur: &Key, next: Option<&Key>) -> (Quat, Quat) {
    let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
    let q_cur = quat::from_array(cur.value);

    let mut qm = zero;
    let mut qp = zero;
    if let Some(prev) = prev {
        qm = if cur.value[3] > TWOPI - EPSILON {
            quat::ln(quat::axis_angle(cur.axis(), 0.0))
        } else {
            let mut q = quat::from_array(prev.value);
            if quat::dot(q, q_cur) < 0.0 {
                q = -q;
            }
            quat::ln_dif(q, q_cur)
        };
    }
    if let Some(next) = next {
        qp = if next.value[3] > TWOPI - EPSILON {
            quat::ln(quat::axis_angle(next.axis(), 0.0))
        } else {
            let mut q = quat::from_array(next.value);
            if quat::dot(q, q_cur) < 0.0 {
                q = -q;
            }
            quat::ln_dif(q_cur, q)
        };
    }
    if prev.is_none() {
        qm = qp;
    }
    if next.is_none() {
        qp = qm;
    }

    let (mut fp, mut f_n) = (1.0f32, 1.0f32);
    let cm = 1.0 - cur.cont;
    if let (Some(prev), Some(next)) = (prev, next) {
        let dt = 0.5 * (next.frame - prev.frame) as f32;
        fp = (cur.frame - prev.frame) as f32 / dt;
        f_n = (next.frame - cur.frame) as f32 / dt;
        let c = cur.cont.abs();
        fp = fp + c - c * fp;
        f_n = f_n + c - c * f_n;
    }
    let tm = 0.5 * (1.0 - cur.tens);
    let cp = 2.0 - cm;
    let bm = 1.0 - cur.bias;
    let bp = 2.0 - bm;
    let tmcm = tm * cm;
    let tmcp = tm * cp;
    let ksm = 1.0 - tmcm * bp * fp;
    let ksp = -tmcp * bm * fp;
    let kdm = tmcp * bp * f_n;
    let kdp = tmcm * bm * f_n - 1.0;

    let qa = quat::exp((qm * kdm + qp * kdp) * 0.5);
    let qb = quat::exp((qm * ksm + qp * ksp) * 0.5);
    (q_cur * qa, q_cur * qb)
}

impl Track {
    pub const REPEAT: u16 = 0x0001;
    pub const SMOOTH: u16 = 0x0002;
    pub const LOCK_X: u16 = 0x0008;
    pub const LOCK_Y: u16 = 0x0010;
    pub const LOCK_Z: u16 = 0x0020;
    pub const UNLINK_X: u16 = 0x0100;
    pub const UNLINK_Y: u16 = 0x0200;
    pub const UNLINK_Z: u16 = 0x0400;

    pub fn new(kind: TrackType) -> Self {
        Self {
            kind,
            flags: 0,
            keys: vec![],
        }
    }

    /// A track with `nkeys` default keys.
    pub fn with_keys(kind: TrackType, nkeys: usize) -> Self {
        let mut track = Self::new(kind);
        track.resize(nkeys);
        track
    }

    /// Keeps the first `nkeys` keys, padding with default keys.
    pub fn resize(&mut self, nkeys: usize) {
        self.keys.resize(nkeys, Key::default());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn find(&self, t: f32) -> Position {
        let n = self.keys.len();
        if n <= 1 {
            return Position::Before;
        }
        let t0 = self.keys[0].frame;
        let t1 = self.keys[n - 1].frame;
        let nt = if self.flags & Self::REPEAT != 0 && t1 != t0 {
            ieee_remainder((t - t0 as f32) as f64, (t1 - t0) as f64) as f32 + t0 as f32
        } else {
            t
        };
        if nt <= t0 as f32 {
            return Position::Before;
        }
        if nt >= t1 as f32 {
            return Position::After;
        }
        let i = (1..n)
            .find(|&i| nt < self.keys[i].frame as f32)
            .unwrap_or(n - 1);
        let (f0, f1) = (self.keys[i - 1].frame, self.keys[i].frame);
        let u = (nt - f0 as f32) / (f1 - f0) as f32;
        Position::Within(i, u)
    }

    /// Orientation after applying rotation keys `0..=index`.
    fn quat_for_index(&self, index: usize) -> Quat {
        self.keys[..=index]
            .iter()
            .fold(quat::identity(), |q, k| k.rotation() * q)
    }

    fn segment(&self, index: usize) -> Segment {
        let n = self.keys.len();
        let span = self.keys[n - 1].frame - self.keys[0].frame;
        let smooth = self.flags & Self::SMOOTH != 0;

        let (ip, mut pp) = if index >= 2 {
            (index - 2, Some(self.keys[index - 2]))
        } else if smooth {
            let mut k = self.keys[n - 2];
            k.frame -= span;
            (n - 2, Some(k))
        } else {
            (0, None)
        };
        let mut p0 = self.keys[index - 1];
        let mut p1 = self.keys[index];
        let (inext, mut pn) = if index < n - 1 {
            (index + 1, Some(self.keys[index + 1]))
        } else if smooth {
            let mut k = self.keys[1];
            k.frame += span;
            (1, Some(k))
        } else {
            (0, None)
        };

        if self.kind == TrackType::Quat {
            if let Some(pp) = pp.as_mut() {
                pp.value = quat::to_array(self.quat_for_index(ip));
            }
            let q0 = self.quat_for_index(index - 1);
            let q1 = self.keys[index].rotation() * q0;
            p0.value = quat::to_array(q0);
            p1.value = quat::to_array(q1);
            if let Some(pn) = pn.as_mut() {
                pn.value = quat::to_array(self.keys[inext].rotation() * q1);
            }
        }
        Segment { pp, p0, p1, pn }
    }

    fn eval_linear(&self, t: f32) -> [f32; 4] {
        let n = self.keys.len();
        if n == 0 {
            return [0.0; 4];
        }
        match self.find(t) {
            Position::Before => self.keys[0].value,
            Position::After => self.keys[n - 1].value,
            Position::Within(index, u) => {
                let Segment { pp, p0, p1, pn } = self.segment(index);
                let (ddp, _dsp) = pos_key_setup(pp.as_ref(), &p0, Some(&p1));
                let (_ddn, dsn) = pos_key_setup(Some(&p0), &p1, pn.as_ref());
                let u = math::ease(0.0, u, 1.0, p0.ease_from, p1.ease_to);
                math::cubic_interp(p0.value, ddp, dsn, p1.value, u)
            }
        }
    }

    /// Toggle state: the value flips at every key, starting from `false` before the first.
    pub fn eval_bool(&self, t: f32) -> bool {
        let n = self.keys.len();
        if n == 0 {
            return false;
        }
        match self.find(t) {
            Position::Before => false,
            Position::After => n & 1 == 0,
            Position::Within(index, _) => index & 1 == 0,
        }
    }

    pub fn eval_float(&self, t: f32) -> f32 {
        self.eval_linear(t)[0]
    }

    pub fn eval_vector(&self, t: f32) -> Vector {
        let v = self.eval_linear(t);
        Vector3::new(v[0], v[1], v[2])
    }

    pub fn eval_quat(&self, t: f32) -> Quat {
        let n = self.keys.len();
        if n == 0 {
            return quat::identity();
        }
        match self.find(t) {
            Position::Before => self.keys[0].rotation(),
            Position::After => self.quat_for_index(n - 1),
            Position::Within(index, u) => {
                let Segment { pp, p0, p1, pn } = self.segment(index);
                let (ap, _bp) = rot_key_setup(pp.as_ref(), &p0, Some(&p1));
                let (_an, bn) = rot_key_setup(Some(&p0), &p1, pn.as_ref());
                let u = math::ease(0.0, u, 1.0, p0.ease_from, p1.ease_to);
                quat::squad(
                    quat::from_array(p0.value),
                    ap,
                    bn,
                    quat::from_array(p1.value),
                    u,
                )
            }
        }
    }

    /// Evaluates the track at `t`, or `None` when it has no keys.
    pub fn sample(&self, t: f32) -> Option<TrackValue> {
        if self.is_empty() {
            return None;
        }
        Some(match self.kind {
            TrackType::Bool => TrackValue::Bool(self.eval_bool(t)),
            TrackType::Float => TrackValue::Float(self.eval_float(t)),
            TrackType::Vector => TrackValue::Vector(self.eval_vector(t)),
            TrackType::Quat => TrackValue::Quat(self.eval_quat(t)),
        })
    }

    pub fn read(&mut self, r: &mut Reader) -> Result<()> {
        self.flags = r.u16()?;
        r.u32()?;
        r.u32()?;
        let nkeys = r.i32()?.max(0) as usize;
        let mut keys = Vec::with_capacity(nkeys.min(4096));
        for _ in 0..nkeys {
            keys.push(Key::read(r, self.kind)?);
        }
        self.keys = keys;
        Ok(())
    }

    pub fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        w.u16(self.flags)?;
        w.u32(0)?;
        w.u32(0)?;
        w.i32(self.keys.len() as i32)?;
        for key in &self.keys {
            key.write(w, self.kind)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::HALFPI;
    use cgmath::InnerSpace;
    use std::io::Cursor;

    fn vector_track(keys: &[(i32, [f32; 3])]) -> Track {
        let mut track = Track::new(TrackType::Vector);
        track.keys = keys
            .iter()
            .map(|&(f, v)| Key::new(f, [v[0], v[1], v[2], 0.0]))
            .collect();
        track
    }

    #[test]
    fn empty_tracks_yield_zero_values() {
        assert_eq!(Track::new(TrackType::Bool).eval_bool(3.0), false);
        assert_eq!(Track::new(TrackType::Float).eval_float(3.0), 0.0);
        assert_eq!(
            Track::new(TrackType::Vector).eval_vector(3.0),
            Vector3::new(0.0, 0.0, 0.0)
        );
        assert_eq!(Track::new(TrackType::Quat).eval_quat(3.0), quat::identity());
        assert_eq!(Track::new(TrackType::Float).sample(0.0), None);
    }

    #[test]
    fn single_key_is_constant() {
        let track = vector_track(&[(10, [1.0, 2.0, 3.0])]);
        for &t in &[-5.0, 10.0, 50.0] {
            assert_eq!(track.eval_vector(t), Vector3::new(1.0, 2.0, 3.0));
        }
    }

    #[test]
    fn clamps_outside_range() {
        let track = vector_track(&[(0, [0.0, 0.0, 0.0]), (10, [10.0, 0.0, 0.0])]);
        assert_eq!(track.eval_vector(-1.0).x, 0.0);
        assert_eq!(track.eval_vector(20.0).x, 10.0);
    }

    #[test]
    fn two_keys_interpolate_linearly() {
        let track = vector_track(&[(0, [0.0, 0.0, 0.0]), (10, [10.0, -10.0, 0.0])]);
        let v = track.eval_vector(2.5);
        assert!((v.x - 2.5).abs() < 1e-4);
        assert!((v.y + 2.5).abs() < 1e-4);
    }

    #[test]
    fn passes_through_inner_keys() {
        let track = vector_track(&[
            (0, [0.0, 0.0, 0.0]),
            (10, [5.0, 1.0, 0.0]),
            (20, [5.0, 8.0, 2.0]),
        ]);
        let v = track.eval_vector(10.0);
        assert!((v - Vector3::new(5.0, 1.0, 0.0)).magnitude() < 1e-4);
    }

    #[test]
    fn repeat_wraps_time() {
        let mut track = vector_track(&[(0, [0.0, 0.0, 0.0]), (10, [10.0, 0.0, 0.0])]);
        track.flags = Track::REPEAT;
        assert!((track.eval_vector(12.0).x - 2.0).abs() < 1e-4);
        assert!((track.eval_vector(-8.0).x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn bool_toggles_at_keys() {
        let mut track = Track::new(TrackType::Bool);
        track.keys = vec![Key::new(0, [0.0; 4]), Key::new(10, [0.0; 4]), Key::new(20, [0.0; 4])];
        assert!(!track.eval_bool(0.0));
        assert!(!track.eval_bool(5.0));
        assert!(track.eval_bool(15.0));
        assert!(!track.eval_bool(25.0));
    }

    #[test]
    fn rotation_keys_accumulate() {
        let mut track = Track::new(TrackType::Quat);
        track.keys = vec![
            Key::new(0, [0.0, 0.0, 1.0, 0.0]),
            Key::new(10, [0.0, 0.0, 1.0, HALFPI]),
            Key::new(20, [0.0, 0.0, 1.0, HALFPI]),
        ];
        let end = track.eval_quat(30.0);
        let expected = quat::axis_angle(Vector3::new(0.0, 0.0, 1.0), 2.0 * HALFPI);
        assert!((end - expected).magnitude() < 1e-4);
        let mid = track.eval_quat(10.0);
        let expected = quat::axis_angle(Vector3::new(0.0, 0.0, 1.0), HALFPI);
        assert!(quat::dot(mid, expected).abs() > 1.0 - 1e-4);
    }

    #[test]
    fn resize_keeps_keys() {
        let mut track = vector_track(&[(5, [1.0, 1.0, 1.0])]);
        track.resize(3);
        assert_eq!(track.keys[0].frame, 5);
        assert_eq!(track.keys[2], Key::default());
        track.resize(0);
        assert!(track.is_empty());
    }

    #[test]
    fn io_keeps_optional_tcb_fields() {
        let mut track = Track::new(TrackType::Quat);
        track.flags = Track::SMOOTH;
        track.keys = vec![Key::new(3, [0.0, 1.0, 0.0, 0.5]).with_tcb(0.25, 0.0, -0.5)];
        let mut w = Writer::new(Cursor::new(vec![]));
        track.write(&mut w).unwrap();
        let data = w.into_inner().into_inner();
        // header 14, frame 4, flags 2, two tcb floats 8, angle 4, axis 12
        assert_eq!(data.len(), 14 + 4 + 2 + 8 + 4 + 12);

        let mut back = Track::new(TrackType::Quat);
        back.read(&mut Reader::new(&data)).unwrap();
        assert_eq!(back, track);
        assert_eq!(back.keys[0].flags, Key::USE_TENS | Key::USE_BIAS);
    }
}
