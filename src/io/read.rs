use nom::bytes::complete::{take, take_till};
use nom::combinator::map;
use nom::multi::count;
use nom::number::complete::*;
use nom::sequence::{terminated, tuple};
use nom::IResult;

use crate::error::{Error, Result, Warning};
use crate::math::{Rgb, Vector};

use std::io::SeekFrom;

pub(crate) fn vector(i: &[u8]) -> IResult<&[u8], Vector> {
    map(tuple((le_f32, le_f32, le_f32)), |(x, y, z)| Vector::new(x, y, z))(i)
}

pub(crate) fn rgb(i: &[u8]) -> IResult<&[u8], Rgb> {
    map(tuple((le_f32, le_f32, le_f32)), |(r, g, b)| [r, g, b])(i)
}

pub(crate) fn rgb24(i: &[u8]) -> IResult<&[u8], Rgb> {
    map(tuple((le_u8, le_u8, le_u8)), |(r, g, b)| {
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    })(i)
}

fn cstring(i: &[u8]) -> IResult<&[u8], &[u8]> {
    terminated(take_till(|c| c == 0), le_u8)(i)
}

/// Cursor over an in-memory 3DS image.
///
/// Every chunk reader works through one of these. Positions are absolute offsets into the
/// underlying buffer, so seeking past the end is allowed and only the next read fails.
/// Recoverable problems are collected as [`Warning`]s instead of aborting the parse.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: u64,
    pub(crate) depth: usize,
    warnings: Vec<Warning>,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
            warnings: vec![],
        }
    }

    pub fn tell(&self) -> u64 {
        self.pos
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn seek(&mut self, pos: SeekFrom) -> u64 {
        self.pos = match pos {
            SeekFrom::Start(n) => n,
            SeekFrom::Current(n) => (self.pos as i64 + n).max(0) as u64,
            SeekFrom::End(n) => (self.len() as i64 + n).max(0) as u64,
        };
        self.pos
    }

    /// Runs a nom parser at the current position and advances past what it consumed.
    pub fn parse<O, F>(&mut self, f: F) -> Result<O>
    where
        F: Fn(&'a [u8]) -> IResult<&'a [u8], O>,
    {
        let input = self.data.get(self.pos as usize..).unwrap_or(&[]);
        match f(input) {
            Ok((rest, value)) => {
                self.pos = (self.data.len() - rest.len()) as u64;
                Ok(value)
            }
            Err(_) => Err(Error::UnexpectedEof { offset: self.pos }),
        }
    }

    pub fn u8(&mut self) -> Result<u8> {
        self.parse(le_u8)
    }

    pub fn i8(&mut self) -> Result<i8> {
        self.parse(le_i8)
    }

    pub fn u16(&mut self) -> Result<u16> {
        self.parse(le_u16)
    }

    pub fn i16(&mut self) -> Result<i16> {
        self.parse(le_i16)
    }

    pub fn u32(&mut self) -> Result<u32> {
        self.parse(le_u32)
    }

    pub fn i32(&mut self) -> Result<i32> {
        self.parse(le_i32)
    }

    pub fn f32(&mut self) -> Result<f32> {
        self.parse(le_f32)
    }

    pub fn vector(&mut self) -> Result<Vector> {
        self.parse(vector)
    }

    pub fn rgb(&mut self) -> Result<Rgb> {
        self.parse(rgb)
    }

    /// Three bytes scaled to `0.0..=1.0`.
    pub fn rgb24(&mut self) -> Result<Rgb> {
        self.parse(rgb24)
    }

    pub fn f32s(&mut self, n: usize) -> Result<Vec<f32>> {
        self.parse(move |i| count(le_f32, n)(i))
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.parse(move |i| take(n)(i))
    }

    /// Zero terminated string; `max` counts the terminator.
    pub fn string(&mut self, max: usize) -> Result<String> {
        let offset = self.pos;
        let raw = self.parse(cstring)?;
        if raw.len() >= max {
            return Err(Error::StringTooLong { offset, max });
        }
        Ok(String::from_utf8_lossy(raw).into_owned())
    }

    /// Fixed width, zero padded name field as used by viewports.
    pub fn fixed_string(&mut self, width: usize) -> Result<String> {
        let raw = self.bytes(width)?;
        let end = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    pub fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scalars_are_little_endian() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0x00, 0x00, 0x80, 0x3f];
        let mut r = Reader::new(&data);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.u32().unwrap(), 0x1234_5678);
        assert_eq!(r.f32().unwrap(), 1.0);
        assert_eq!(r.tell(), 10);
        assert!(matches!(r.u8(), Err(Error::UnexpectedEof { offset: 10 })));
    }

    #[test]
    fn string_limit_includes_terminator() {
        let data = b"abc\0abcd\0";
        let mut r = Reader::new(&data[..]);
        assert_eq!(r.string(4).unwrap(), "abc");
        assert!(matches!(
            r.string(4),
            Err(Error::StringTooLong { offset: 4, max: 4 })
        ));
    }

    #[test]
    fn unterminated_string_is_eof() {
        let mut r = Reader::new(b"abc");
        assert!(matches!(r.string(64), Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn seek_past_end_fails_on_read() {
        let mut r = Reader::new(&[1, 2, 3]);
        r.seek(SeekFrom::Start(10));
        assert!(r.u8().is_err());
        r.seek(SeekFrom::End(-1));
        assert_eq!(r.u8().unwrap(), 3);
    }
}
