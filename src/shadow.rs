use crate::chunk::{tag, write_chunk, Chunk};
use crate::error::Result;
use crate::io::{Reader, Writer};
use crate::math::EPSILON;

use std::io;

/// Global shadow map settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Shadow {
    pub map_size: i16,
    pub low_bias: f32,
    pub hi_bias: f32,
    pub filter: f32,
    pub ray_bias: f32,
}

impl Shadow {
    /// Reads one shadow setting. The reader must sit on the chunk header; the caller skips to
    /// the chunk end.
    pub(crate) fn read(&mut self, r: &mut Reader) -> Result<()> {
        let c = Chunk::read(r)?;
        match c.tag {
            tag::SHADOW_MAP_SIZE => self.map_size = r.i16()?,
            tag::LO_SHADOW_BIAS => self.low_bias = r.f32()?,
            tag::HI_SHADOW_BIAS => self.hi_bias = r.f32()?,
            tag::SHADOW_FILTER => self.filter = r.f32()?,
            tag::RAY_BIAS => self.ray_bias = r.f32()?,
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        if self.low_bias.abs() > EPSILON {
            write_chunk(w, tag::LO_SHADOW_BIAS, |w| w.f32(self.low_bias))?;
        }
        if self.hi_bias.abs() > EPSILON {
            write_chunk(w, tag::HI_SHADOW_BIAS, |w| w.f32(self.hi_bias))?;
        }
        if self.map_size != 0 {
            write_chunk(w, tag::SHADOW_MAP_SIZE, |w| w.i16(self.map_size))?;
        }
        if self.filter.abs() > EPSILON {
            write_chunk(w, tag::SHADOW_FILTER, |w| w.f32(self.filter))?;
        }
        if self.ray_bias.abs() > EPSILON {
            write_chunk(w, tag::RAY_BIAS, |w| w.f32(self.ray_bias))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn only_set_values_are_written() {
        let shadow = Shadow {
            map_size: 512,
            filter: 3.0,
            ..Shadow::default()
        };
        let mut w = Writer::new(Cursor::new(vec![]));
        shadow.write(&mut w).unwrap();
        let data = w.into_inner().into_inner();
        assert_eq!(data.len(), 8 + 10);

        let mut back = Shadow::default();
        let mut r = Reader::new(&data);
        back.read(&mut r).unwrap();
        r.seek(std::io::SeekFrom::Start(8));
        back.read(&mut r).unwrap();
        assert_eq!(back, shadow);
    }
}
