use log::debug;

use crate::chunk::{self, tag, write_chunk, write_flag, Chunk};
use crate::error::{check_name, Result};
use crate::io::{Reader, Writer};
use crate::math::{vector, Vector, EPSILON};

use std::io;

/// Lens length, in millimetres of a 35mm camera, for a horizontal field of view in degrees.
const LENS_FACTOR: f32 = 2400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub name: String,
    pub object_flags: u32,
    pub position: Vector,
    pub target: Vector,
    pub roll: f32,
    /// Degrees.
    pub fov: f32,
    pub see_cone: bool,
    pub near_range: f32,
    pub far_range: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            name: String::new(),
            object_flags: 0,
            position: vector::zero(),
            target: vector::zero(),
            roll: 0.0,
            fov: 45.0,
            see_cone: false,
            near_range: 0.0,
            far_range: 0.0,
        }
    }
}

impl Camera {
    pub fn new(name: &str) -> Result<Self> {
        check_name(name)?;
        Ok(Self {
            name: name.to_string(),
            ..Self::default()
        })
    }

    /// Reads an `N_CAMERA` chunk. The reader must sit on its header.
    pub fn read(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::N_CAMERA)?;
        self.position = r.vector()?;
        self.target = r.vector()?;
        self.roll = r.f32()?;
        let lens = r.f32()?;
        self.fov = if lens.abs() < EPSILON {
            45.0
        } else {
            LENS_FACTOR / lens
        };
        debug!("camera {} fov={}", self.name, self.fov);
        c.read_tell(r);
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::CAM_SEE_CONE => self.see_cone = true,
                tag::CAM_RANGES => {
                    self.near_range = r.f32()?;
                    self.far_range = r.f32()?;
                }
                t => chunk::unknown(r, t),
            }
        }
        c.read_end(r);
        Ok(())
    }

    pub fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        write_chunk(w, tag::N_CAMERA, |w| {
            w.vector(self.position)?;
            w.vector(self.target)?;
            w.f32(self.roll)?;
            if self.fov.abs() < EPSILON {
                w.f32(LENS_FACTOR / 45.0)?;
            } else {
                w.f32(LENS_FACTOR / self.fov)?;
            }
            if self.see_cone {
                write_flag(w, tag::CAM_SEE_CONE)?;
            }
            write_chunk(w, tag::CAM_RANGES, |w| {
                w.f32(self.near_range)?;
                w.f32(self.far_range)
            })
        })
    }
}
