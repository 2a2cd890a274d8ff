use cookie_factory::bytes::*;
use cookie_factory::combinator::{slice, string};
use cookie_factory::gen_simple;
use cookie_factory::sequence::tuple;

use crate::error::Result;
use crate::math::{Rgb, Vector};

use std::io::{self, SeekFrom};

/// Little-endian sink for chunk payloads.
///
/// Chunk sizes are patched in place once a chunk is finished, which is why the sink has to
/// be seekable.
pub struct Writer<W> {
    inner: W,
}

impl<W: io::Write + io::Seek> Writer<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.inner.seek(pos)?)
    }

    pub fn u8(&mut self, v: u8) -> Result<()> {
        gen_simple(le_u8(v), &mut self.inner)?;
        Ok(())
    }

    pub fn i8(&mut self, v: i8) -> Result<()> {
        gen_simple(le_i8(v), &mut self.inner)?;
        Ok(())
    }

    pub fn u16(&mut self, v: u16) -> Result<()> {
        gen_simple(le_u16(v), &mut self.inner)?;
        Ok(())
    }

    pub fn i16(&mut self, v: i16) -> Result<()> {
        gen_simple(le_i16(v), &mut self.inner)?;
        Ok(())
    }

    pub fn u32(&mut self, v: u32) -> Result<()> {
        gen_simple(le_u32(v), &mut self.inner)?;
        Ok(())
    }

    pub fn i32(&mut self, v: i32) -> Result<()> {
        gen_simple(le_i32(v), &mut self.inner)?;
        Ok(())
    }

    pub fn f32(&mut self, v: f32) -> Result<()> {
        gen_simple(le_f32(v), &mut self.inner)?;
        Ok(())
    }

    pub fn vector(&mut self, v: Vector) -> Result<()> {
        gen_simple(tuple((le_f32(v.x), le_f32(v.y), le_f32(v.z))), &mut self.inner)?;
        Ok(())
    }

    pub fn rgb(&mut self, c: Rgb) -> Result<()> {
        gen_simple(tuple((le_f32(c[0]), le_f32(c[1]), le_f32(c[2]))), &mut self.inner)?;
        Ok(())
    }

    /// Rounds each component to a byte.
    pub fn rgb24(&mut self, c: Rgb) -> Result<()> {
        let byte = |v: f32| (255.0 * v + 0.5).floor() as u8;
        gen_simple(
            tuple((le_u8(byte(c[0])), le_u8(byte(c[1])), le_u8(byte(c[2])))),
            &mut self.inner,
        )?;
        Ok(())
    }

    pub fn bytes(&mut self, data: &[u8]) -> Result<()> {
        gen_simple(slice(data), &mut self.inner)?;
        Ok(())
    }

    /// Writes `s` followed by a zero byte.
    pub fn string(&mut self, s: &str) -> Result<()> {
        gen_simple(tuple((string(s), le_u8(0))), &mut self.inner)?;
        Ok(())
    }

    /// Writes `s` zero padded (or cut) to exactly `width` bytes.
    pub fn fixed_string(&mut self, s: &str, width: usize) -> Result<()> {
        let mut buf = vec![0u8; width];
        let n = s.len().min(width);
        buf[..n].copy_from_slice(&s.as_bytes()[..n]);
        self.bytes(&buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn writes_little_endian() {
        let mut w = Writer::new(Cursor::new(vec![]));
        w.u16(0x1234).unwrap();
        w.f32(1.0).unwrap();
        w.string("ab").unwrap();
        w.rgb24([1.0, 0.5, 0.0]).unwrap();
        assert_eq!(
            w.into_inner().into_inner(),
            vec![0x34, 0x12, 0, 0, 0x80, 0x3f, b'a', b'b', 0, 255, 128, 0]
        );
    }

    #[test]
    fn fixed_string_pads() {
        let mut w = Writer::new(Cursor::new(vec![]));
        w.fixed_string("cam", 5).unwrap();
        assert_eq!(w.into_inner().into_inner(), b"cam\0\0".to_vec());
    }
}
