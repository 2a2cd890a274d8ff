use crate::background::write_colorf;
use crate::chunk::{self, tag, write_chunk, write_flag, Chunk};
use crate::error::Result;
use crate::io::{Reader, Writer};
use crate::math::Rgb;

use std::io;

/// Fog, layer fog and distance cue settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Atmosphere {
    pub use_fog: bool,
    pub fog_color: Rgb,
    pub fog_background: bool,
    pub fog_near_plane: f32,
    pub fog_near_density: f32,
    pub fog_far_plane: f32,
    pub fog_far_density: f32,
    pub use_layer_fog: bool,
    pub layer_fog_flags: u32,
    pub layer_fog_color: Rgb,
    pub layer_fog_near_y: f32,
    pub layer_fog_far_y: f32,
    pub layer_fog_density: f32,
    pub use_dist_cue: bool,
    pub dist_cue_background: bool,
    pub dist_cue_near_plane: f32,
    pub dist_cue_near_dimming: f32,
    pub dist_cue_far_plane: f32,
    pub dist_cue_far_dimming: f32,
}

/// Reads colour children, preferring the linear variant when both are present.
fn read_colors(c: &mut Chunk, r: &mut Reader, color: &mut Rgb, background: &mut bool) -> Result<()> {
    let mut have_lin = false;
    while let Some(h) = c.read_next(r)? {
        match h.tag {
            tag::LIN_COLOR_F => {
                *color = r.rgb()?;
                have_lin = true;
            }
            tag::COLOR_F if !have_lin => *color = r.rgb()?,
            tag::COLOR_F => {}
            tag::FOG_BGND | tag::DCUE_BGND => *background = true,
            t => chunk::unknown(r, t),
        }
    }
    Ok(())
}

impl Atmosphere {
    fn read_fog(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::FOG)?;
        self.fog_near_plane = r.f32()?;
        self.fog_near_density = r.f32()?;
        self.fog_far_plane = r.f32()?;
        self.fog_far_density = r.f32()?;
        c.read_tell(r);
        read_colors(&mut c, r, &mut self.fog_color, &mut self.fog_background)?;
        c.read_end(r);
        Ok(())
    }

    fn read_layer_fog(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::LAYER_FOG)?;
        self.layer_fog_near_y = r.f32()?;
        self.layer_fog_far_y = r.f32()?;
        self.layer_fog_density = r.f32()?;
        self.layer_fog_flags = r.u32()?;
        c.read_tell(r);
        let mut ignored = false;
        read_colors(&mut c, r, &mut self.layer_fog_color, &mut ignored)?;
        c.read_end(r);
        Ok(())
    }

    fn read_distance_cue(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::DISTANCE_CUE)?;
        self.dist_cue_near_plane = r.f32()?;
        self.dist_cue_near_dimming = r.f32()?;
        self.dist_cue_far_plane = r.f32()?;
        self.dist_cue_far_dimming = r.f32()?;
        c.read_tell(r);
        let mut ignored = [0.0; 3];
        read_colors(&mut c, r, &mut ignored, &mut self.dist_cue_background)?;
        c.read_end(r);
        Ok(())
    }

    /// Reads one atmosphere chunk. The reader must sit on the chunk header; the caller skips
    /// to the chunk end.
    pub(crate) fn read(&mut self, r: &mut Reader) -> Result<()> {
        let c = Chunk::read(r)?;
        match c.tag {
            tag::FOG => {
                c.read_reset(r);
                self.read_fog(r)?;
            }
            tag::LAYER_FOG => {
                c.read_reset(r);
                self.read_layer_fog(r)?;
            }
            tag::DISTANCE_CUE => {
                c.read_reset(r);
                self.read_distance_cue(r)?;
            }
            tag::USE_FOG => self.use_fog = true,
            tag::USE_LAYER_FOG => self.use_layer_fog = true,
            tag::USE_DISTANCE_CUE => self.use_dist_cue = true,
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        if self.use_fog {
            write_chunk(w, tag::FOG, |w| {
                w.f32(self.fog_near_plane)?;
                w.f32(self.fog_near_density)?;
                w.f32(self.fog_far_plane)?;
                w.f32(self.fog_far_density)?;
                write_colorf(w, self.fog_color)?;
                if self.fog_background {
                    write_flag(w, tag::FOG_BGND)?;
                }
                Ok(())
            })?;
        }
        if self.use_layer_fog {
            write_chunk(w, tag::LAYER_FOG, |w| {
                w.f32(self.layer_fog_near_y)?;
                w.f32(self.layer_fog_far_y)?;
                w.f32(self.layer_fog_density)?;
                w.u32(self.layer_fog_flags)?;
                write_colorf(w, self.layer_fog_color)
            })?;
        }
        if self.use_dist_cue {
            write_chunk(w, tag::DISTANCE_CUE, |w| {
                w.f32(self.dist_cue_near_plane)?;
                w.f32(self.dist_cue_near_dimming)?;
                w.f32(self.dist_cue_far_plane)?;
                w.f32(self.dist_cue_far_dimming)?;
                if self.dist_cue_background {
                    write_flag(w, tag::DCUE_BGND)?;
                }
                Ok(())
            })?;
        }
        if self.use_fog {
            write_flag(w, tag::USE_FOG)?;
        }
        if self.use_layer_fog {
            write_flag(w, tag::USE_LAYER_FOG)?;
        }
        if self.use_dist_cue {
            write_flag(w, tag::USE_DISTANCE_CUE)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::{Cursor, SeekFrom};

    fn read_all(data: &[u8]) -> Atmosphere {
        let mut atmo = Atmosphere::default();
        let mut r = Reader::new(data);
        while r.tell() < r.len() {
            let start = r.tell();
            let c = Chunk::read(&mut r).unwrap();
            r.seek(SeekFrom::Start(start));
            atmo.read(&mut r).unwrap();
            r.seek(SeekFrom::Start(c.end));
        }
        atmo
    }

    #[test]
    fn layer_fog_keeps_density_and_color() {
        let atmo = Atmosphere {
            use_layer_fog: true,
            layer_fog_flags: 3,
            layer_fog_color: [0.25, 0.5, 0.75],
            layer_fog_near_y: -10.0,
            layer_fog_far_y: 40.0,
            layer_fog_density: 0.6,
            ..Atmosphere::default()
        };
        let mut w = Writer::new(Cursor::new(vec![]));
        atmo.write(&mut w).unwrap();
        assert_eq!(read_all(&w.into_inner().into_inner()), atmo);
    }

    #[test]
    fn fog_and_distance_cue() {
        let atmo = Atmosphere {
            use_fog: true,
            fog_color: [0.5, 0.5, 0.5],
            fog_background: true,
            fog_far_plane: 1000.0,
            fog_far_density: 1.0,
            use_dist_cue: true,
            dist_cue_background: true,
            dist_cue_far_plane: 500.0,
            dist_cue_far_dimming: 0.5,
            ..Atmosphere::default()
        };
        let mut w = Writer::new(Cursor::new(vec![]));
        atmo.write(&mut w).unwrap();
        let data = w.into_inner().into_inner();
        assert_eq!(read_all(&data), atmo);
        // the enable flag for distance cue trails the data chunks
        assert_eq!(&data[data.len() - 6..data.len() - 4], &[0x01, 0x23]);
    }
}
