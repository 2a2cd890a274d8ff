use crate::chunk::{self, tag, write_chunk, write_flag, Chunk};
use crate::error::Result;
use crate::io::{Reader, Writer};
use crate::math::{Rgb, EPSILON};

use std::io;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Background {
    pub use_bitmap: bool,
    pub bitmap_name: String,
    pub use_solid: bool,
    pub solid_color: Rgb,
    pub use_gradient: bool,
    pub gradient_percent: f32,
    pub gradient_top: Rgb,
    pub gradient_middle: Rgb,
    pub gradient_bottom: Rgb,
}

/// Whether any component of `rgb` is distinguishable from black.
pub(crate) fn colorf_defined(rgb: &Rgb) -> bool {
    rgb.iter().any(|v| v.abs() > EPSILON)
}

/// Writes `rgb` as a `COLOR_F` followed by a `LIN_COLOR_F`.
pub(crate) fn write_colorf<W: io::Write + io::Seek>(w: &mut Writer<W>, rgb: Rgb) -> Result<()> {
    write_chunk(w, tag::COLOR_F, |w| w.rgb(rgb))?;
    write_chunk(w, tag::LIN_COLOR_F, |w| w.rgb(rgb))
}

impl Background {
    fn read_solid(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::SOLID_BGND)?;
        let mut have_lin = false;
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::LIN_COLOR_F => {
                    self.solid_color = r.rgb()?;
                    have_lin = true;
                }
                tag::COLOR_F if !have_lin => self.solid_color = r.rgb()?,
                tag::COLOR_F => {}
                t => chunk::unknown(r, t),
            }
        }
        c.read_end(r);
        Ok(())
    }

    fn read_gradient(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::V_GRADIENT)?;
        self.gradient_percent = r.f32()?;
        c.read_tell(r);
        let mut color = vec![];
        let mut lin_color = vec![];
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::COLOR_F => color.push(r.rgb()?),
                tag::LIN_COLOR_F => lin_color.push(r.rgb()?),
                t => chunk::unknown(r, t),
            }
        }
        if !lin_color.is_empty() {
            color = lin_color;
        }
        color.resize(3, [0.0; 3]);
        self.gradient_top = color[0];
        self.gradient_middle = color[1];
        self.gradient_bottom = color[2];
        c.read_end(r);
        Ok(())
    }

    /// Reads one background chunk. The reader must sit on the chunk header; the caller skips
    /// to the chunk end.
    pub(crate) fn read(&mut self, r: &mut Reader) -> Result<()> {
        let c = Chunk::read(r)?;
        match c.tag {
            tag::BIT_MAP => self.bitmap_name = r.string(64)?,
            tag::SOLID_BGND => {
                c.read_reset(r);
                self.read_solid(r)?;
            }
            tag::V_GRADIENT => {
                c.read_reset(r);
                self.read_gradient(r)?;
            }
            tag::USE_BIT_MAP => self.use_bitmap = true,
            tag::USE_SOLID_BGND => self.use_solid = true,
            tag::USE_V_GRADIENT => self.use_gradient = true,
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        if !self.bitmap_name.is_empty() {
            write_chunk(w, tag::BIT_MAP, |w| w.string(&self.bitmap_name))?;
        }
        if colorf_defined(&self.solid_color) {
            write_chunk(w, tag::SOLID_BGND, |w| write_colorf(w, self.solid_color))?;
        }
        if colorf_defined(&self.gradient_top)
            || colorf_defined(&self.gradient_middle)
            || colorf_defined(&self.gradient_bottom)
        {
            write_chunk(w, tag::V_GRADIENT, |w| {
                w.f32(self.gradient_percent)?;
                write_colorf(w, self.gradient_top)?;
                write_colorf(w, self.gradient_middle)?;
                write_colorf(w, self.gradient_bottom)
            })?;
        }
        if self.use_bitmap {
            write_flag(w, tag::USE_BIT_MAP)?;
        }
        if self.use_solid {
            write_flag(w, tag::USE_SOLID_BGND)?;
        }
        if self.use_gradient {
            write_flag(w, tag::USE_V_GRADIENT)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn black_is_undefined() {
        assert!(!colorf_defined(&[0.0; 3]));
        assert!(colorf_defined(&[0.0, 0.1, 0.0]));
    }

    #[test]
    fn chunk_sizes() {
        let bg = Background {
            solid_color: [0.2, 0.4, 0.6],
            gradient_middle: [1.0, 1.0, 1.0],
            use_gradient: true,
            ..Background::default()
        };
        let mut w = Writer::new(Cursor::new(vec![]));
        bg.write(&mut w).unwrap();
        let data = w.into_inner().into_inner();
        assert_eq!(data.len(), 42 + 118 + 6);

        let mut back = Background::default();
        let mut r = Reader::new(&data);
        for start in &[0u64, 42, 160] {
            r.seek(std::io::SeekFrom::Start(*start));
            back.read(&mut r).unwrap();
        }
        assert_eq!(back, bg);
    }
}
