use log::debug;

use crate::chunk::{self, tag, write_chunk, write_flag, Chunk};
use crate::error::{check_name, Result};
use crate::io::{Reader, Writer};
use crate::math::Rgb;

use std::io;

#[derive(Debug, Clone, PartialEq)]
pub struct TextureMap {
    pub name: String,
    pub flags: u16,
    pub percent: f32,
    pub blur: f32,
    pub scale: [f32; 2],
    pub offset: [f32; 2],
    pub rotation: f32,
    pub tint_1: Rgb,
    pub tint_2: Rgb,
    pub tint_r: Rgb,
    pub tint_g: Rgb,
    pub tint_b: Rgb,
}

impl TextureMap {
    pub const DECALE: u16 = 0x0001;
    pub const MIRROR: u16 = 0x0002;
    pub const NEGATE: u16 = 0x0008;
    pub const NO_TILE: u16 = 0x0010;
    pub const SUMMED_AREA: u16 = 0x0020;
    pub const ALPHA_SOURCE: u16 = 0x0040;
    pub const TINT: u16 = 0x0080;
    pub const IGNORE_ALPHA: u16 = 0x0100;
    pub const RGB_TINT: u16 = 0x0200;

    pub fn is_used(&self) -> bool {
        !self.name.is_empty()
    }

    fn read(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, 0)?;
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::INT_PERCENTAGE => self.percent = r.i16()? as f32 / 100.0,
                tag::MAT_MAPNAME => {
                    self.name = r.string(64)?;
                    debug!("map name={}", self.name);
                }
                tag::MAT_MAP_TILING => self.flags = r.u16()?,
                tag::MAT_MAP_TEXBLUR => self.blur = r.f32()?,
                tag::MAT_MAP_USCALE => self.scale[0] = r.f32()?,
                tag::MAT_MAP_VSCALE => self.scale[1] = r.f32()?,
                tag::MAT_MAP_UOFFSET => self.offset[0] = r.f32()?,
                tag::MAT_MAP_VOFFSET => self.offset[1] = r.f32()?,
                tag::MAT_MAP_ANG => self.rotation = r.f32()?,
                tag::MAT_MAP_COL1 => self.tint_1 = r.rgb24()?,
                tag::MAT_MAP_COL2 => self.tint_2 = r.rgb24()?,
                tag::MAT_MAP_RCOL => self.tint_r = r.rgb24()?,
                tag::MAT_MAP_GCOL => self.tint_g = r.rgb24()?,
                tag::MAT_MAP_BCOL => self.tint_b = r.rgb24()?,
                t => chunk::unknown(r, t),
            }
        }
        c.read_end(r);
        Ok(())
    }

    fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>, map_tag: u16) -> Result<()> {
        if !self.is_used() {
            return Ok(());
        }
        write_chunk(w, map_tag, |w| {
            write_percentage(w, self.percent)?;
            write_chunk(w, tag::MAT_MAPNAME, |w| w.string(&self.name))?;
            write_chunk(w, tag::MAT_MAP_TILING, |w| w.u16(self.flags))?;
            write_chunk(w, tag::MAT_MAP_TEXBLUR, |w| w.f32(self.blur))?;
            write_chunk(w, tag::MAT_MAP_USCALE, |w| w.f32(self.scale[0]))?;
            write_chunk(w, tag::MAT_MAP_VSCALE, |w| w.f32(self.scale[1]))?;
            write_chunk(w, tag::MAT_MAP_UOFFSET, |w| w.f32(self.offset[0]))?;
            write_chunk(w, tag::MAT_MAP_VOFFSET, |w| w.f32(self.offset[1]))?;
            write_chunk(w, tag::MAT_MAP_ANG, |w| w.f32(self.rotation))?;
            write_chunk(w, tag::MAT_MAP_COL1, |w| w.rgb24(self.tint_1))?;
            write_chunk(w, tag::MAT_MAP_COL2, |w| w.rgb24(self.tint_2))?;
            write_chunk(w, tag::MAT_MAP_RCOL, |w| w.rgb24(self.tint_r))?;
            write_chunk(w, tag::MAT_MAP_GCOL, |w| w.rgb24(self.tint_g))?;
            write_chunk(w, tag::MAT_MAP_BCOL, |w| w.rgb24(self.tint_b))
        })
    }
}

impl Default for TextureMap {
    fn default() -> Self {
        Self {
            name: String::new(),
            flags: Self::NO_TILE,
            percent: 1.0,
            blur: 0.0,
            scale: [1.0, 1.0],
            offset: [0.0; 2],
            rotation: 0.0,
            tint_1: [0.0; 3],
            tint_2: [0.0; 3],
            tint_r: [0.0; 3],
            tint_g: [0.0; 3],
            tint_b: [0.0; 3],
        }
    }
}

/// Cubic environment map rendered on the fly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AutoReflMap {
    pub flags: u16,
    pub anti_alias: i8,
    pub size: i32,
    pub frame_step: i32,
}

impl AutoReflMap {
    pub const USE: u16 = 0x0001;
    pub const READ_FIRST_FRAME_ONLY: u16 = 0x0004;
    pub const FLAT_MIRROR: u16 = 0x0008;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Rgb,
    pub diffuse: Rgb,
    pub specular: Rgb,
    pub shininess: f32,
    pub shin_strength: f32,
    pub use_blur: bool,
    pub blur: f32,
    pub transparency: f32,
    pub falloff: f32,
    pub is_additive: bool,
    pub self_illum_flag: bool,
    pub self_illum: f32,
    pub use_falloff: bool,
    pub shading: i16,
    pub soften: bool,
    pub face_map: bool,
    pub two_sided: bool,
    pub map_decal: bool,
    pub use_wire: bool,
    pub use_wire_abs: bool,
    pub wire_size: f32,
    pub texture1_map: TextureMap,
    pub texture1_mask: TextureMap,
    pub texture2_map: TextureMap,
    pub texture2_mask: TextureMap,
    pub opacity_map: TextureMap,
    pub opacity_mask: TextureMap,
    pub bump_map: TextureMap,
    pub bump_mask: TextureMap,
    pub specular_map: TextureMap,
    pub specular_mask: TextureMap,
    pub shininess_map: TextureMap,
    pub shininess_mask: TextureMap,
    pub self_illum_map: TextureMap,
    pub self_illum_mask: TextureMap,
    pub reflection_map: TextureMap,
    pub reflection_mask: TextureMap,
    pub autorefl_map: AutoReflMap,
}

impl Material {
    pub const SHADING_WIRE_FRAME: i16 = 0;
    pub const SHADING_FLAT: i16 = 1;
    pub const SHADING_GOURAUD: i16 = 2;
    pub const SHADING_PHONG: i16 = 3;
    pub const SHADING_METAL: i16 = 4;

    /// A grey phong material. Fails if `name` does not fit the 64 byte name field.
    pub fn new(name: &str) -> Result<Self> {
        check_name(name)?;
        Ok(Self {
            name: name.to_string(),
            ..Self::default()
        })
    }

    /// Every texture slot with the chunk tag it is stored under, in file order.
    pub fn maps(&self) -> [(u16, &TextureMap); 16] {
        [
            (tag::MAT_TEXMAP, &self.texture1_map),
            (tag::MAT_TEXMASK, &self.texture1_mask),
            (tag::MAT_TEX2MAP, &self.texture2_map),
            (tag::MAT_TEX2MASK, &self.texture2_mask),
            (tag::MAT_OPACMAP, &self.opacity_map),
            (tag::MAT_OPACMASK, &self.opacity_mask),
            (tag::MAT_BUMPMAP, &self.bump_map),
            (tag::MAT_BUMPMASK, &self.bump_mask),
            (tag::MAT_SPECMAP, &self.specular_map),
            (tag::MAT_SPECMASK, &self.specular_mask),
            (tag::MAT_SHINMAP, &self.shininess_map),
            (tag::MAT_SHINMASK, &self.shininess_mask),
            (tag::MAT_SELFIMAP, &self.self_illum_map),
            (tag::MAT_SELFIMASK, &self.self_illum_mask),
            (tag::MAT_REFLMAP, &self.reflection_map),
            (tag::MAT_REFLMASK, &self.reflection_mask),
        ]
    }

    fn map_mut(&mut self, map_tag: u16) -> Option<&mut TextureMap> {
        Some(match map_tag {
            tag::MAT_TEXMAP => &mut self.texture1_map,
            tag::MAT_TEXMASK => &mut self.texture1_mask,
            tag::MAT_TEX2MAP => &mut self.texture2_map,
            tag::MAT_TEX2MASK => &mut self.texture2_mask,
            tag::MAT_OPACMAP => &mut self.opacity_map,
            tag::MAT_OPACMASK => &mut self.opacity_mask,
            tag::MAT_BUMPMAP => &mut self.bump_map,
            tag::MAT_BUMPMASK => &mut self.bump_mask,
            tag::MAT_SPECMAP => &mut self.specular_map,
            tag::MAT_SPECMASK => &mut self.specular_mask,
            tag::MAT_SHINMAP => &mut self.shininess_map,
            tag::MAT_SHINMASK => &mut self.shininess_mask,
            tag::MAT_SELFIMAP => &mut self.self_illum_map,
            tag::MAT_SELFIMASK => &mut self.self_illum_mask,
            tag::MAT_REFLMAP => &mut self.reflection_map,
            tag::MAT_REFLMASK => &mut self.reflection_mask,
            _ => return None,
        })
    }

    /// Reads a `MAT_ENTRY` chunk. The reader must sit on its header.
    pub fn read(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::MAT_ENTRY)?;
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::MAT_NAME => {
                    self.name = r.string(64)?;
                    debug!("material name={}", self.name);
                }
                tag::MAT_AMBIENT => {
                    c.read_reset(r);
                    read_color(r, &mut self.ambient)?;
                }
                tag::MAT_DIFFUSE => {
                    c.read_reset(r);
                    read_color(r, &mut self.diffuse)?;
                }
                tag::MAT_SPECULAR => {
                    c.read_reset(r);
                    read_color(r, &mut self.specular)?;
                }
                tag::MAT_SHININESS => {
                    c.read_reset(r);
                    read_percentage(r, &mut self.shininess)?;
                }
                tag::MAT_SHIN2PCT => {
                    c.read_reset(r);
                    read_percentage(r, &mut self.shin_strength)?;
                }
                tag::MAT_TRANSPARENCY => {
                    c.read_reset(r);
                    read_percentage(r, &mut self.transparency)?;
                }
                tag::MAT_XPFALL => {
                    c.read_reset(r);
                    read_percentage(r, &mut self.falloff)?;
                }
                tag::MAT_SELF_ILPCT => {
                    c.read_reset(r);
                    read_percentage(r, &mut self.self_illum)?;
                }
                tag::MAT_REFBLUR => {
                    c.read_reset(r);
                    read_percentage(r, &mut self.blur)?;
                }
                tag::MAT_USE_XPFALL => self.use_falloff = true,
                tag::MAT_USE_REFBLUR => self.use_blur = true,
                tag::MAT_SHADING => self.shading = r.i16()?,
                tag::MAT_SELF_ILLUM => self.self_illum_flag = true,
                tag::MAT_TWO_SIDE => self.two_sided = true,
                tag::MAT_DECAL => self.map_decal = true,
                tag::MAT_ADDITIVE => self.is_additive = true,
                tag::MAT_FACEMAP => self.face_map = true,
                tag::MAT_PHONGSOFT => self.soften = true,
                tag::MAT_WIRE => self.use_wire = true,
                tag::MAT_WIREABS => self.use_wire_abs = true,
                tag::MAT_WIRE_SIZE => self.wire_size = r.f32()?,
                tag::MAT_ACUBIC => {
                    r.i8()?;
                    self.autorefl_map.anti_alias = r.i8()?;
                    self.autorefl_map.flags = r.i16()? as u16;
                    self.autorefl_map.size = r.i32()?;
                    self.autorefl_map.frame_step = r.i32()?;
                }
                t => match self.map_mut(t) {
                    Some(map) => {
                        c.read_reset(r);
                        map.read(r)?;
                    }
                    None => chunk::unknown(r, t),
                },
            }
        }
        c.read_end(r);
        Ok(())
    }

    pub fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        write_chunk(w, tag::MAT_ENTRY, |w| {
            write_chunk(w, tag::MAT_NAME, |w| w.string(&self.name))?;
            write_chunk(w, tag::MAT_AMBIENT, |w| write_color(w, self.ambient))?;
            write_chunk(w, tag::MAT_DIFFUSE, |w| write_color(w, self.diffuse))?;
            write_chunk(w, tag::MAT_SPECULAR, |w| write_color(w, self.specular))?;
            write_chunk(w, tag::MAT_SHININESS, |w| write_percentage(w, self.shininess))?;
            write_chunk(w, tag::MAT_SHIN2PCT, |w| write_percentage(w, self.shin_strength))?;
            write_chunk(w, tag::MAT_TRANSPARENCY, |w| write_percentage(w, self.transparency))?;
            write_chunk(w, tag::MAT_XPFALL, |w| write_percentage(w, self.falloff))?;
            if self.use_falloff {
                write_flag(w, tag::MAT_USE_XPFALL)?;
            }
            write_chunk(w, tag::MAT_SHADING, |w| w.i16(self.shading))?;
            write_chunk(w, tag::MAT_REFBLUR, |w| write_percentage(w, self.blur))?;
            if self.use_blur {
                write_flag(w, tag::MAT_USE_REFBLUR)?;
            }
            if self.self_illum_flag {
                write_flag(w, tag::MAT_SELF_ILLUM)?;
            }
            if self.self_illum != 0.0 {
                write_chunk(w, tag::MAT_SELF_ILPCT, |w| write_percentage(w, self.self_illum))?;
            }
            for &(set, flag) in &[
                (self.two_sided, tag::MAT_TWO_SIDE),
                (self.map_decal, tag::MAT_DECAL),
                (self.is_additive, tag::MAT_ADDITIVE),
                (self.use_wire, tag::MAT_WIRE),
                (self.use_wire_abs, tag::MAT_WIREABS),
            ] {
                if set {
                    write_flag(w, flag)?;
                }
            }
            write_chunk(w, tag::MAT_WIRE_SIZE, |w| w.f32(self.wire_size))?;
            if self.face_map {
                write_flag(w, tag::MAT_FACEMAP)?;
            }
            if self.soften {
                write_flag(w, tag::MAT_PHONGSOFT)?;
            }
            for &(map_tag, map) in self.maps().iter() {
                map.write(w, map_tag)?;
            }
            write_chunk(w, tag::MAT_ACUBIC, |w| {
                w.i8(0)?;
                w.i8(self.autorefl_map.anti_alias)?;
                w.i16(self.autorefl_map.flags as i16)?;
                w.i32(self.autorefl_map.size)?;
                w.i32(self.autorefl_map.frame_step)
            })
        })
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: [0.588235; 3],
            diffuse: [0.588235; 3],
            specular: [0.898039; 3],
            shininess: 0.1,
            shin_strength: 0.0,
            use_blur: false,
            blur: 0.0,
            transparency: 0.0,
            falloff: 0.0,
            is_additive: false,
            self_illum_flag: false,
            self_illum: 0.0,
            use_falloff: false,
            shading: Self::SHADING_PHONG,
            soften: false,
            face_map: false,
            two_sided: false,
            map_decal: false,
            use_wire: false,
            use_wire_abs: false,
            wire_size: 1.0,
            texture1_map: TextureMap::default(),
            texture1_mask: TextureMap::default(),
            texture2_map: TextureMap::default(),
            texture2_mask: TextureMap::default(),
            opacity_map: TextureMap::default(),
            opacity_mask: TextureMap::default(),
            bump_map: TextureMap::default(),
            bump_mask: TextureMap::default(),
            specular_map: TextureMap::default(),
            specular_mask: TextureMap::default(),
            shininess_map: TextureMap::default(),
            shininess_mask: TextureMap::default(),
            self_illum_map: TextureMap::default(),
            self_illum_mask: TextureMap::default(),
            reflection_map: TextureMap::default(),
            reflection_mask: TextureMap::default(),
            autorefl_map: AutoReflMap::default(),
        }
    }
}

/// Reads a colour wrapper chunk. Linear sub-chunks win over gamma corrected ones.
pub(crate) fn read_color(r: &mut Reader, rgb: &mut Rgb) -> Result<()> {
    let mut c = Chunk::read_start(r, 0)?;
    let mut have_lin = false;
    while let Some(h) = c.read_next(r)? {
        match h.tag {
            tag::LIN_COLOR_24 => {
                *rgb = r.rgb24()?;
                have_lin = true;
            }
            tag::COLOR_24 if !have_lin => *rgb = r.rgb24()?,
            tag::LIN_COLOR_F => {
                *rgb = r.rgb()?;
                have_lin = true;
            }
            tag::COLOR_F if !have_lin => *rgb = r.rgb()?,
            tag::COLOR_24 | tag::COLOR_F => {}
            t => chunk::unknown(r, t),
        }
    }
    c.read_end(r);
    Ok(())
}

/// Reads a percentage wrapper chunk holding an `INT_PERCENTAGE`.
pub(crate) fn read_percentage(r: &mut Reader, p: &mut f32) -> Result<()> {
    let mut c = Chunk::read_start(r, 0)?;
    while let Some(h) = c.read_next(r)? {
        match h.tag {
            tag::INT_PERCENTAGE => *p = r.i16()? as f32 / 100.0,
            tag::FLOAT_PERCENTAGE => *p = r.f32()?,
            t => chunk::unknown(r, t),
        }
    }
    c.read_end(r);
    Ok(())
}

fn write_color<W: io::Write + io::Seek>(w: &mut Writer<W>, rgb: Rgb) -> Result<()> {
    write_chunk(w, tag::COLOR_24, |w| w.rgb24(rgb))?;
    write_chunk(w, tag::LIN_COLOR_24, |w| w.rgb24(rgb))
}

fn write_percentage<W: io::Write + io::Seek>(w: &mut Writer<W>, p: f32) -> Result<()> {
    write_chunk(w, tag::INT_PERCENTAGE, |w| {
        w.i16((100.0 * p + 0.5).floor() as i16)
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(mat: &Material) -> Material {
        let mut w = Writer::new(Cursor::new(vec![]));
        mat.write(&mut w).unwrap();
        let data = w.into_inner().into_inner();
        let mut r = Reader::new(&data);
        let mut back = Material::default();
        back.read(&mut r).unwrap();
        assert!(r.warnings().is_empty(), "{:?}", r.warnings());
        back
    }

    #[test]
    fn defaults() {
        let mat = Material::new("grey").unwrap();
        assert_eq!(mat.shading, Material::SHADING_PHONG);
        assert_eq!(mat.texture1_map.flags, TextureMap::NO_TILE);
        assert_eq!(mat.bump_mask.scale, [1.0, 1.0]);
        assert!(Material::new(&"x".repeat(64)).is_err());
    }

    #[test]
    fn keeps_fields_and_maps() {
        let mut mat = Material::new("c_tex").unwrap();
        // byte exact colours survive the 24 bit encoding
        mat.ambient = [0.0; 3];
        mat.diffuse = [1.0, 0.0, 0.0];
        mat.specular = [1.0; 3];
        mat.shininess = 0.25;
        mat.transparency = 0.5;
        mat.two_sided = true;
        mat.use_falloff = true;
        mat.self_illum = 0.3;
        mat.texture1_map.name = "cube.tga".into();
        mat.texture1_map.scale = [2.0, 3.0];
        mat.texture1_map.tint_1 = [1.0, 1.0, 0.0];
        mat.reflection_mask.name = "mask.tga".into();
        mat.autorefl_map.size = 128;

        let back = roundtrip(&mat);
        assert_eq!(back, mat);
    }

    #[test]
    fn percentages_round_to_hundredths() {
        let mut mat = Material::new("m").unwrap();
        mat.shininess = 0.333;
        assert_eq!(roundtrip(&mat).shininess, 0.33);
    }

    #[test]
    fn linear_color_wins() {
        let mut w = Writer::new(Cursor::new(vec![]));
        write_chunk(&mut w, tag::MAT_DIFFUSE, |w| {
            write_chunk(w, tag::LIN_COLOR_F, |w| w.rgb([0.5, 0.5, 0.5]))?;
            write_chunk(w, tag::COLOR_F, |w| w.rgb([1.0, 1.0, 1.0]))
        })
        .unwrap();
        let data = w.into_inner().into_inner();
        let mut rgb = [0.0; 3];
        read_color(&mut Reader::new(&data), &mut rgb).unwrap();
        assert_eq!(rgb, [0.5; 3]);
    }
}
