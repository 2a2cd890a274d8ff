use crate::chunk::{self, tag, write_chunk, Chunk, HEADER_SIZE};
use crate::error::Result;
use crate::io::{Reader, Writer};
use crate::math::{vector, Vector};

use std::io;

/// Width of the camera name field in viewport records.
const CAMERA_NAME_LEN: usize = 11;

/// One pane of a viewport layout.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub kind: u16,
    pub axis_lock: u16,
    pub position: [i16; 2],
    pub size: [i16; 2],
    pub zoom: f32,
    pub center: Vector,
    pub horiz_angle: f32,
    pub vert_angle: f32,
    pub camera: String,
}

impl View {
    pub const NOT_USED: u16 = 0;
    pub const TOP: u16 = 1;
    pub const BOTTOM: u16 = 2;
    pub const LEFT: u16 = 3;
    pub const RIGHT: u16 = 4;
    pub const FRONT: u16 = 5;
    pub const BACK: u16 = 6;
    pub const USER: u16 = 7;
    pub const SPOTLIGHT: u16 = 18;
    pub const CAMERA: u16 = 65535;

    fn read(r: &mut Reader) -> Result<Self> {
        r.i16()?;
        Ok(Self {
            axis_lock: r.u16()?,
            position: [r.i16()?, r.i16()?],
            size: [r.i16()?, r.i16()?],
            kind: r.u16()?,
            zoom: r.f32()?,
            center: r.vector()?,
            horiz_angle: r.f32()?,
            vert_angle: r.f32()?,
            camera: r.fixed_string(CAMERA_NAME_LEN)?,
        })
    }

    fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        Chunk::write(w, tag::VIEWPORT_DATA_3, HEADER_SIZE + 49)?;
        w.i16(0)?;
        w.u16(self.axis_lock)?;
        w.i16(self.position[0])?;
        w.i16(self.position[1])?;
        w.i16(self.size[0])?;
        w.i16(self.size[1])?;
        w.u16(self.kind)?;
        w.f32(self.zoom)?;
        w.vector(self.center)?;
        w.f32(self.horiz_angle)?;
        w.f32(self.vert_angle)?;
        w.fixed_string(&self.camera, CAMERA_NAME_LEN)
    }
}

impl Default for View {
    fn default() -> Self {
        Self {
            kind: Self::NOT_USED,
            axis_lock: 0,
            position: [0; 2],
            size: [0; 2],
            zoom: 0.0,
            center: vector::zero(),
            horiz_angle: 0.0,
            vert_angle: 0.0,
            camera: String::new(),
        }
    }
}

/// Viewport layout and the default view.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub layout_style: u16,
    pub layout_active: i16,
    pub layout_swap: i16,
    pub layout_swap_prior: i16,
    pub layout_swap_view: i16,
    pub layout_position: [u16; 2],
    pub layout_size: [u16; 2],
    pub layout_views: Vec<View>,
    /// One of the [`View`] kinds; `NOT_USED` omits the default view.
    pub default_kind: u16,
    pub default_position: Vector,
    pub default_width: f32,
    pub default_horiz_angle: f32,
    pub default_vert_angle: f32,
    pub default_roll_angle: f32,
    pub default_camera: String,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            layout_style: Self::LAYOUT_SINGLE,
            layout_active: 0,
            layout_swap: 0,
            layout_swap_prior: 0,
            layout_swap_view: 0,
            layout_position: [0; 2],
            layout_size: [0; 2],
            layout_views: vec![],
            default_kind: View::NOT_USED,
            default_position: vector::zero(),
            default_width: 0.0,
            default_horiz_angle: 0.0,
            default_vert_angle: 0.0,
            default_roll_angle: 0.0,
            default_camera: String::new(),
        }
    }
}

/// Axis aligned default views and the chunk each one is stored in.
const ORTHO_VIEWS: [(u16, u16); 6] = [
    (View::TOP, tag::VIEW_TOP),
    (View::BOTTOM, tag::VIEW_BOTTOM),
    (View::LEFT, tag::VIEW_LEFT),
    (View::RIGHT, tag::VIEW_RIGHT),
    (View::FRONT, tag::VIEW_FRONT),
    (View::BACK, tag::VIEW_BACK),
];

impl Viewport {
    pub const LAYOUT_SINGLE: u16 = 0;
    pub const LAYOUT_TWO_PANE_VERT_SPLIT: u16 = 1;
    pub const LAYOUT_TWO_PANE_HORIZ_SPLIT: u16 = 2;
    pub const LAYOUT_FOUR_PANE: u16 = 3;
    pub const LAYOUT_THREE_PANE_LEFT_SPLIT: u16 = 4;
    pub const LAYOUT_THREE_PANE_BOTTOM_SPLIT: u16 = 5;
    pub const LAYOUT_THREE_PANE_RIGHT_SPLIT: u16 = 6;
    pub const LAYOUT_THREE_PANE_TOP_SPLIT: u16 = 7;
    pub const LAYOUT_THREE_PANE_VERT_SPLIT: u16 = 8;
    pub const LAYOUT_THREE_PANE_HORIZ_SPLIT: u16 = 9;
    pub const LAYOUT_FOUR_PANE_LEFT_SPLIT: u16 = 10;
    pub const LAYOUT_FOUR_PANE_RIGHT_SPLIT: u16 = 11;

    fn read_layout(&mut self, c: &mut Chunk, r: &mut Reader) -> Result<()> {
        self.layout_style = r.u16()?;
        self.layout_active = r.i16()?;
        r.i16()?;
        self.layout_swap = r.i16()?;
        r.i16()?;
        self.layout_swap_prior = r.i16()?;
        self.layout_swap_view = r.i16()?;
        c.read_tell(r);
        self.layout_views.clear();
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::VIEWPORT_SIZE => {
                    self.layout_position = [r.u16()?, r.u16()?];
                    self.layout_size = [r.u16()?, r.u16()?];
                }
                tag::VIEWPORT_DATA_3 => self.layout_views.push(View::read(r)?),
                // R2 and R3 layouts carry nothing we keep
                tag::VIEWPORT_DATA => {}
                t => chunk::unknown(r, t),
            }
        }
        Ok(())
    }

    fn read_default_view(&mut self, c: &mut Chunk, r: &mut Reader) -> Result<()> {
        while let Some(h) = c.read_next(r)? {
            if let Some(&(kind, _)) = ORTHO_VIEWS.iter().find(|(_, t)| *t == h.tag) {
                self.default_kind = kind;
                self.default_position = r.vector()?;
                self.default_width = r.f32()?;
                continue;
            }
            match h.tag {
                tag::VIEW_USER => {
                    self.default_kind = View::USER;
                    self.default_position = r.vector()?;
                    self.default_width = r.f32()?;
                    self.default_horiz_angle = r.f32()?;
                    self.default_vert_angle = r.f32()?;
                    self.default_roll_angle = r.f32()?;
                }
                tag::VIEW_CAMERA => {
                    self.default_kind = View::CAMERA;
                    self.default_camera = r.fixed_string(CAMERA_NAME_LEN)?;
                }
                t => chunk::unknown(r, t),
            }
        }
        Ok(())
    }

    /// Reads a `VIEWPORT_LAYOUT` or `DEFAULT_VIEW` chunk into the matching half of the
    /// viewport. The reader must sit on the chunk header.
    pub(crate) fn read(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, 0)?;
        match c.tag {
            tag::VIEWPORT_LAYOUT => self.read_layout(&mut c, r)?,
            tag::DEFAULT_VIEW => self.read_default_view(&mut c, r)?,
            _ => {}
        }
        c.read_end(r);
        Ok(())
    }

    fn write_default_view<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        if let Some(&(_, view_tag)) = ORTHO_VIEWS.iter().find(|(k, _)| *k == self.default_kind) {
            Chunk::write(w, view_tag, HEADER_SIZE + 16)?;
            w.vector(self.default_position)?;
            return w.f32(self.default_width);
        }
        match self.default_kind {
            View::USER => {
                Chunk::write(w, tag::VIEW_USER, HEADER_SIZE + 28)?;
                w.vector(self.default_position)?;
                w.f32(self.default_width)?;
                w.f32(self.default_horiz_angle)?;
                w.f32(self.default_vert_angle)?;
                w.f32(self.default_roll_angle)
            }
            View::CAMERA => {
                Chunk::write(w, tag::VIEW_CAMERA, HEADER_SIZE + CAMERA_NAME_LEN as u32)?;
                w.fixed_string(&self.default_camera, CAMERA_NAME_LEN)
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        if !self.layout_views.is_empty() {
            write_chunk(w, tag::VIEWPORT_LAYOUT, |w| {
                w.u16(self.layout_style)?;
                w.i16(self.layout_active)?;
                w.i16(0)?;
                w.i16(self.layout_swap)?;
                w.i16(0)?;
                w.i16(self.layout_swap_prior)?;
                w.i16(self.layout_swap_view)?;

                Chunk::write(w, tag::VIEWPORT_SIZE, HEADER_SIZE + 8)?;
                w.u16(self.layout_position[0])?;
                w.u16(self.layout_position[1])?;
                w.u16(self.layout_size[0])?;
                w.u16(self.layout_size[1])?;

                for view in &self.layout_views {
                    view.write(w)?;
                }
                Ok(())
            })?;
        }
        if self.default_kind != View::NOT_USED {
            write_chunk(w, tag::DEFAULT_VIEW, |w| self.write_default_view(w))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cgmath::Vector3;
    use std::io::Cursor;

    fn roundtrip(vp: &Viewport) -> (Vec<u8>, Viewport) {
        let mut w = Writer::new(Cursor::new(vec![]));
        vp.write(&mut w).unwrap();
        let data = w.into_inner().into_inner();
        let mut back = Viewport::default();
        let mut r = Reader::new(&data);
        while r.tell() < r.len() {
            back.read(&mut r).unwrap();
        }
        assert!(r.warnings().is_empty());
        (data, back)
    }

    #[test]
    fn empty_viewport_writes_nothing() {
        let (data, back) = roundtrip(&Viewport::default());
        assert!(data.is_empty());
        assert_eq!(back, Viewport::default());
    }

    #[test]
    fn layout_views_are_55_bytes() {
        let vp = Viewport {
            layout_style: Viewport::LAYOUT_FOUR_PANE,
            layout_active: 2,
            layout_size: [640, 480],
            layout_views: vec![
                View {
                    kind: View::CAMERA,
                    zoom: 1.5,
                    center: Vector3::new(1.0, 2.0, 3.0),
                    camera: "Camera01".into(),
                    ..View::default()
                },
                View {
                    kind: View::TOP,
                    size: [320, 240],
                    ..View::default()
                },
            ],
            ..Viewport::default()
        };
        let (data, back) = roundtrip(&vp);
        assert_eq!(data.len(), 6 + 14 + 14 + 2 * 55);
        assert_eq!(back, vp);
    }

    #[test]
    fn default_view_kinds() {
        for kind in &[View::FRONT, View::USER, View::CAMERA] {
            let vp = Viewport {
                default_kind: *kind,
                default_position: Vector3::new(0.0, 5.0, 0.0),
                default_width: 200.0,
                default_horiz_angle: if *kind == View::USER { 30.0 } else { 0.0 },
                default_camera: if *kind == View::CAMERA { "Cam".into() } else { String::new() },
                ..Viewport::default()
            };
            let (_, back) = roundtrip(&vp);
            if *kind == View::CAMERA {
                assert_eq!(back.default_camera, "Cam");
                assert_eq!(back.default_kind, View::CAMERA);
            } else {
                assert_eq!(back, vp);
            }
        }
    }
}
