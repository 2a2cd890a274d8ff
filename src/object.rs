//! Flags shared by every named object, stored as empty chunks after the object body.

use crate::chunk::{tag, write_flag};
use crate::error::Result;
use crate::io::Writer;

use std::io;

pub const HIDDEN: u32 = 0x01;
pub const VIS_LOFTER: u32 = 0x02;
pub const DOESNT_CAST: u32 = 0x04;
pub const MATTE: u32 = 0x08;
pub const DONT_RCVSHADOW: u32 = 0x10;
pub const FAST: u32 = 0x20;
pub const FROZEN: u32 = 0x40;

const FLAG_TAGS: [(u32, u16); 7] = [
    (HIDDEN, tag::OBJ_HIDDEN),
    (VIS_LOFTER, tag::OBJ_VIS_LOFTER),
    (DOESNT_CAST, tag::OBJ_DOESNT_CAST),
    (MATTE, tag::OBJ_MATTE),
    (DONT_RCVSHADOW, tag::OBJ_DONT_RCVSHADOW),
    (FAST, tag::OBJ_FAST),
    (FROZEN, tag::OBJ_FROZEN),
];

/// Flag carried by a child of `NAMED_OBJECT`, if it is one.
pub fn flag_for_tag(t: u16) -> Option<u32> {
    FLAG_TAGS.iter().find(|&&(_, ft)| ft == t).map(|&(f, _)| f)
}

pub(crate) fn write_flags<W: io::Write + io::Seek>(w: &mut Writer<W>, flags: u32) -> Result<()> {
    for &(f, t) in &FLAG_TAGS {
        if flags & f != 0 {
            write_flag(w, t)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn every_flag_has_its_own_tag() {
        assert_eq!(flag_for_tag(tag::OBJ_DONT_RCVSHADOW), Some(DONT_RCVSHADOW));
        assert_eq!(flag_for_tag(tag::OBJ_DOESNT_CAST), Some(DOESNT_CAST));
        assert_eq!(flag_for_tag(tag::OBJ_PROCEDURAL), None);

        let mut w = Writer::new(Cursor::new(vec![]));
        write_flags(&mut w, DONT_RCVSHADOW | HIDDEN).unwrap();
        let data = w.into_inner().into_inner();
        assert_eq!(data, vec![0x10, 0x40, 6, 0, 0, 0, 0x17, 0x40, 6, 0, 0, 0]);
    }
}
