use log::debug;

use crate::chunk::{self, tag, write_chunk, write_flag, Chunk};
use crate::error::{check_name, Result};
use crate::io::{Reader, Writer};
use crate::math::{vector, Rgb, Vector, EPSILON};

use std::io;

/// An omni light, or a spotlight when `spot_light` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub name: String,
    pub object_flags: u32,
    pub spot_light: bool,
    pub see_cone: bool,
    pub color: Rgb,
    pub position: Vector,
    pub target: Vector,
    pub roll: f32,
    pub off: bool,
    pub outer_range: f32,
    pub inner_range: f32,
    pub multiplier: f32,
    /// Objects this light does not illuminate.
    pub excludes: Vec<String>,
    /// Only stored as on or off. Any non-zero value is written as a bare `DL_ATTENUATE`
    /// flag and reads back as `1.0`.
    pub attenuation: f32,
    pub rectangular_spot: bool,
    pub shadowed: bool,
    pub shadow_bias: f32,
    pub shadow_filter: f32,
    pub shadow_size: i16,
    pub spot_aspect: f32,
    pub use_projector: bool,
    pub projector: String,
    pub spot_overshoot: bool,
    pub ray_shadows: bool,
    pub ray_bias: f32,
    pub hotspot: f32,
    pub falloff: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            name: String::new(),
            object_flags: 0,
            spot_light: false,
            see_cone: false,
            color: [0.0; 3],
            position: vector::zero(),
            target: vector::zero(),
            roll: 0.0,
            off: false,
            outer_range: 0.0,
            inner_range: 0.0,
            multiplier: 0.0,
            excludes: vec![],
            attenuation: 0.0,
            rectangular_spot: false,
            shadowed: false,
            shadow_bias: 0.0,
            shadow_filter: 0.0,
            shadow_size: 0,
            spot_aspect: 0.0,
            use_projector: false,
            projector: String::new(),
            spot_overshoot: false,
            ray_shadows: false,
            ray_bias: 0.0,
            hotspot: 0.0,
            falloff: 0.0,
        }
    }
}

impl Light {
    pub fn new(name: &str) -> Result<Self> {
        check_name(name)?;
        Ok(Self {
            name: name.to_string(),
            ..Self::default()
        })
    }

    fn read_spotlight(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::DL_SPOTLIGHT)?;
        self.spot_light = true;
        self.target = r.vector()?;
        self.hotspot = r.f32()?;
        self.falloff = r.f32()?;
        c.read_tell(r);
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::DL_SPOT_ROLL => self.roll = r.f32()?,
                tag::DL_SHADOWED => self.shadowed = true,
                tag::DL_LOCAL_SHADOW2 => {
                    self.shadow_bias = r.f32()?;
                    self.shadow_filter = r.f32()?;
                    self.shadow_size = r.i16()?;
                }
                tag::DL_SEE_CONE => self.see_cone = true,
                tag::DL_SPOT_RECTANGULAR => self.rectangular_spot = true,
                tag::DL_SPOT_ASPECT => self.spot_aspect = r.f32()?,
                tag::DL_SPOT_PROJECTOR => {
                    self.use_projector = true;
                    self.projector = r.string(64)?;
                }
                tag::DL_SPOT_OVERSHOOT => self.spot_overshoot = true,
                tag::DL_RAY_BIAS => self.ray_bias = r.f32()?,
                tag::DL_RAYSHAD => self.ray_shadows = true,
                t => chunk::unknown(r, t),
            }
        }
        c.read_end(r);
        Ok(())
    }

    /// Reads an `N_DIRECT_LIGHT` chunk. The reader must sit on its header.
    pub fn read(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::N_DIRECT_LIGHT)?;
        self.position = r.vector()?;
        c.read_tell(r);
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::COLOR_F => self.color = r.rgb()?,
                tag::DL_OFF => self.off = true,
                tag::DL_OUTER_RANGE => self.outer_range = r.f32()?,
                tag::DL_INNER_RANGE => self.inner_range = r.f32()?,
                tag::DL_MULTIPLIER => self.multiplier = r.f32()?,
                tag::DL_EXCLUDE => self.excludes.push(r.string(64)?),
                // usually a bare flag, some writers append the factor
                tag::DL_ATTENUATE if h.size >= 10 => self.attenuation = r.f32()?,
                tag::DL_ATTENUATE => self.attenuation = 1.0,
                tag::DL_SPOTLIGHT => {
                    c.read_reset(r);
                    self.read_spotlight(r)?;
                }
                t => chunk::unknown(r, t),
            }
        }
        debug!("light {} spot={}", self.name, self.spot_light);
        c.read_end(r);
        Ok(())
    }

    fn write_spotlight<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        write_chunk(w, tag::DL_SPOTLIGHT, |w| {
            w.vector(self.target)?;
            w.f32(self.hotspot)?;
            w.f32(self.falloff)?;
            write_chunk(w, tag::DL_SPOT_ROLL, |w| w.f32(self.roll))?;
            if self.shadowed {
                write_flag(w, tag::DL_SHADOWED)?;
            }
            if self.shadow_bias.abs() > EPSILON
                || self.shadow_filter.abs() > EPSILON
                || self.shadow_size != 0
            {
                write_chunk(w, tag::DL_LOCAL_SHADOW2, |w| {
                    w.f32(self.shadow_bias)?;
                    w.f32(self.shadow_filter)?;
                    w.i16(self.shadow_size)
                })?;
            }
            if self.see_cone {
                write_flag(w, tag::DL_SEE_CONE)?;
            }
            if self.rectangular_spot {
                write_flag(w, tag::DL_SPOT_RECTANGULAR)?;
            }
            if self.spot_aspect.abs() > EPSILON {
                write_chunk(w, tag::DL_SPOT_ASPECT, |w| w.f32(self.spot_aspect))?;
            }
            if self.use_projector {
                write_chunk(w, tag::DL_SPOT_PROJECTOR, |w| w.string(&self.projector))?;
            }
            if self.spot_overshoot {
                write_flag(w, tag::DL_SPOT_OVERSHOOT)?;
            }
            if self.ray_bias.abs() > EPSILON {
                write_chunk(w, tag::DL_RAY_BIAS, |w| w.f32(self.ray_bias))?;
            }
            if self.ray_shadows {
                write_flag(w, tag::DL_RAYSHAD)?;
            }
            Ok(())
        })
    }

    pub fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        write_chunk(w, tag::N_DIRECT_LIGHT, |w| {
            w.vector(self.position)?;
            write_chunk(w, tag::COLOR_F, |w| w.rgb(self.color))?;
            if self.off {
                write_flag(w, tag::DL_OFF)?;
            }
            write_chunk(w, tag::DL_OUTER_RANGE, |w| w.f32(self.outer_range))?;
            write_chunk(w, tag::DL_INNER_RANGE, |w| w.f32(self.inner_range))?;
            write_chunk(w, tag::DL_MULTIPLIER, |w| w.f32(self.multiplier))?;
            for name in &self.excludes {
                write_chunk(w, tag::DL_EXCLUDE, |w| w.string(name))?;
            }
            if self.attenuation != 0.0 {
                write_flag(w, tag::DL_ATTENUATE)?;
            }
            if self.spot_light {
                self.write_spotlight(w)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cgmath::Vector3;
    use std::io::Cursor;

    fn roundtrip(light: &Light) -> Light {
        let mut w = Writer::new(Cursor::new(vec![]));
        light.write(&mut w).unwrap();
        let data = w.into_inner().into_inner();
        let mut r = Reader::new(&data);
        let mut back = Light::new(&light.name).unwrap();
        back.read(&mut r).unwrap();
        assert!(r.warnings().is_empty(), "{:?}", r.warnings());
        back
    }

    #[test]
    fn omni() {
        let mut light = Light::new("Omni01").unwrap();
        light.color = [1.0, 0.5, 0.25];
        light.position = Vector3::new(10.0, 20.0, 30.0);
        light.multiplier = 1.0;
        light.off = true;
        light.excludes = vec!["Box01".into()];
        assert_eq!(roundtrip(&light), light);
    }

    #[test]
    fn spotlight_with_projector() {
        let mut light = Light::new("Spot01").unwrap();
        light.spot_light = true;
        light.target = Vector3::new(0.0, 0.0, -1.0);
        light.hotspot = 30.0;
        light.falloff = 45.0;
        light.roll = 0.1;
        light.shadow_size = 512;
        light.use_projector = true;
        light.projector = "gobo_with_a_long_name.tga".into();
        light.ray_shadows = true;
        light.attenuation = 1.0;
        assert_eq!(roundtrip(&light), light);
    }

    #[test]
    fn attenuation_is_a_switch() {
        let mut light = Light::new("omni").unwrap();
        light.attenuation = 0.5;
        assert_eq!(roundtrip(&light).attenuation, 1.0);
        light.attenuation = 0.0;
        assert_eq!(roundtrip(&light).attenuation, 0.0);
    }
}
