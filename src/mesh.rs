use cgmath::{InnerSpace, Vector3};
use log::debug;

use crate::chunk::{self, tag, write_chunk, Chunk, HEADER_SIZE};
use crate::error::{check_count, check_name, Result, Warning};
use crate::io::{Reader, Writer};
use crate::material::Material;
use crate::math::{matrix, vector, Matrix, Vector};

use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Face {
    pub index: [u16; 3],
    pub flags: u16,
    /// Index into the file's materials.
    pub material: Option<usize>,
    pub smoothing_group: u32,
}

impl Face {
    /// Edge from the third to the first corner is visible.
    pub const VIS_AC: u16 = 0x01;
    pub const VIS_BC: u16 = 0x02;
    pub const VIS_AB: u16 = 0x04;
    pub const WRAP_U: u16 = 0x08;
    pub const WRAP_V: u16 = 0x10;
    pub const SELECT_3: u16 = 1 << 13;
    pub const SELECT_2: u16 = 1 << 14;
    pub const SELECT_1: u16 = 1 << 15;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapType {
    None,
    Planar,
    Cylindrical,
    Spherical,
}

impl MapType {
    fn from_raw(raw: u16) -> Self {
        match raw {
            0 => MapType::Planar,
            1 => MapType::Cylindrical,
            2 => MapType::Spherical,
            _ => MapType::None,
        }
    }

    fn raw(self) -> u16 {
        match self {
            MapType::None => 0xffff,
            MapType::Planar => 0,
            MapType::Cylindrical => 1,
            MapType::Spherical => 2,
        }
    }
}

impl Default for MapType {
    fn default() -> Self {
        MapType::None
    }
}

/// Materials used by box mapping, one per side.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoxMap {
    pub front: String,
    pub back: String,
    pub left: String,
    pub right: String,
    pub top: String,
    pub bottom: String,
}

impl BoxMap {
    fn sides(&self) -> [&String; 6] {
        [
            &self.front,
            &self.back,
            &self.left,
            &self.right,
            &self.top,
            &self.bottom,
        ]
    }

    fn is_empty(&self) -> bool {
        self.sides().iter().all(|s| s.is_empty())
    }
}

/// A triangle mesh.
///
/// `texcos` and `vflags` are either empty or parallel to `vertices`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub object_flags: u32,
    /// Index into the editor palette.
    pub color: u8,
    pub matrix: Matrix,
    pub vertices: Vec<Vector>,
    pub texcos: Vec<[f32; 2]>,
    pub vflags: Vec<u16>,
    pub faces: Vec<Face>,
    pub box_map: BoxMap,
    pub map_type: MapType,
    pub map_pos: Vector,
    pub map_matrix: Matrix,
    pub map_scale: f32,
    pub map_tile: [f32; 2],
    pub map_planar_size: [f32; 2],
    pub map_cylinder_height: f32,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            name: String::new(),
            object_flags: 0,
            color: 0,
            matrix: matrix::identity(),
            vertices: vec![],
            texcos: vec![],
            vflags: vec![],
            faces: vec![],
            box_map: BoxMap::default(),
            map_type: MapType::None,
            map_pos: vector::zero(),
            map_matrix: matrix::identity(),
            map_scale: 0.0,
            map_tile: [0.0; 2],
            map_planar_size: [0.0; 2],
            map_cylinder_height: 0.0,
        }
    }
}

fn read_matrix(r: &mut Reader) -> Result<Matrix> {
    let mut m = matrix::identity();
    for i in 0..4 {
        for j in 0..3 {
            m[i][j] = r.f32()?;
        }
    }
    Ok(m)
}

fn write_matrix<W: io::Write + io::Seek>(w: &mut Writer<W>, m: &Matrix) -> Result<()> {
    for i in 0..4 {
        for j in 0..3 {
            w.f32(m[i][j])?;
        }
    }
    Ok(())
}

impl Mesh {
    pub fn new(name: &str) -> Result<Self> {
        check_name(name)?;
        Ok(Self {
            name: name.to_string(),
            ..Self::default()
        })
    }

    /// Resizes the vertex arrays. Texture coordinates and vertex flags are kept parallel to
    /// the vertices when requested and dropped otherwise.
    pub fn resize_vertices(&mut self, n: usize, use_texcos: bool, use_flags: bool) {
        self.vertices.resize(n, vector::zero());
        self.texcos.resize(if use_texcos { n } else { 0 }, [0.0; 2]);
        self.vflags.resize(if use_flags { n } else { 0 }, 0);
    }

    pub fn resize_faces(&mut self, n: usize) {
        self.faces.resize(n, Face::default());
    }

    /// Axis aligned bounds of the vertices. Inverted infinite bounds for an empty mesh.
    pub fn bounding_box(&self) -> (Vector, Vector) {
        let init = (
            Vector3::new(f32::MAX, f32::MAX, f32::MAX),
            Vector3::new(-f32::MAX, -f32::MAX, -f32::MAX),
        );
        self.vertices.iter().fold(init, |(lo, hi), &v| {
            (vector::min(lo, v), vector::max(hi, v))
        })
    }

    /// Vertex `i`, or the origin when a face points past the vertex list.
    fn vertex(&self, i: u16) -> Vector {
        self.vertices
            .get(i as usize)
            .copied()
            .unwrap_or_else(vector::zero)
    }

    pub fn calculate_face_normals(&self) -> Vec<Vector> {
        self.faces
            .iter()
            .map(|f| {
                let [a, b, c] = f.index;
                vector::normal(self.vertex(a), self.vertex(b), self.vertex(c))
            })
            .collect()
    }

    /// Per corner normals honouring smoothing groups; `normals[3 * face + corner]`.
    ///
    /// Each corner contributes its face normal weighted by the corner angle. Faces without
    /// a smoothing group keep their own corner normal, as do corners whose vertex index is
    /// out of range.
    pub fn calculate_vertex_normals(&self) -> Vec<Vector> {
        let corner = |i: usize, j: usize| self.vertex(self.faces[i].index[j]);
        let mut weighted = Vec::with_capacity(3 * self.faces.len());
        let mut by_vertex: Vec<Vec<usize>> = vec![vec![]; self.vertices.len()];

        for (i, f) in self.faces.iter().enumerate() {
            for j in 0..3 {
                if let Some(shared) = by_vertex.get_mut(f.index[j] as usize) {
                    shared.push(3 * i + j);
                }
                let p = corner(i, (j + 1) % 3) - corner(i, j);
                let q = corner(i, (j + 2) % 3) - corner(i, j);
                let n = p.cross(q);
                let len = n.magnitude();
                if len > 0.0 {
                    let weight = len.atan2(p.dot(q));
                    weighted.push(n * (weight / len));
                } else {
                    weighted.push(vector::zero());
                }
            }
        }

        let mut normals = Vec::with_capacity(weighted.len());
        for (i, f) in self.faces.iter().enumerate() {
            for j in 0..3 {
                let shared = by_vertex.get(f.index[j] as usize);
                let n = match shared {
                    Some(shared) if f.smoothing_group != 0 => {
                        let group_of = |k: usize| self.faces[k / 3].smoothing_group;
                        let group = shared
                            .iter()
                            .map(|&k| group_of(k))
                            .filter(|g| g & f.smoothing_group != 0)
                            .fold(f.smoothing_group, |acc, g| acc | g);
                        shared
                            .iter()
                            .filter(|&&k| group_of(k) & group != 0)
                            .fold(vector::zero(), |acc, &k| acc + weighted[k])
                    }
                    _ => weighted[3 * i + j],
                };
                normals.push(vector::normalize(n));
            }
        }
        normals
    }

    /// Transform that mirrors vertices along X in object space, when the mesh matrix flips
    /// handedness.
    fn mirror(&self) -> Option<Matrix> {
        if matrix::det(&self.matrix) >= 0.0 {
            return None;
        }
        let inv = matrix::inverse(&self.matrix)?;
        Some(matrix::scale(self.matrix, Vector3::new(-1.0, 1.0, 1.0)) * inv)
    }

    fn read_faces(&mut self, r: &mut Reader, materials: &[Material]) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::FACE_ARRAY)?;
        let n = r.u16()? as usize;
        self.faces.clear();
        self.resize_faces(n);
        for f in &mut self.faces {
            f.index = [r.u16()?, r.u16()?, r.u16()?];
            f.flags = r.u16()?;
        }
        c.read_tell(r);
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::MSH_MAT_GROUP => {
                    let name = r.string(64)?;
                    let material = materials.iter().position(|m| m.name == name);
                    let count = r.u16()?;
                    for _ in 0..count {
                        let index = r.u16()?;
                        match self.faces.get_mut(index as usize) {
                            Some(f) => f.material = material,
                            None => r.warn(Warning::FaceOutOfRange { index }),
                        }
                    }
                }
                tag::SMOOTH_GROUP => {
                    for f in &mut self.faces {
                        f.smoothing_group = r.u32()?;
                    }
                }
                tag::MSH_BOXMAP => {
                    self.box_map = BoxMap {
                        front: r.string(64)?,
                        back: r.string(64)?,
                        left: r.string(64)?,
                        right: r.string(64)?,
                        top: r.string(64)?,
                        bottom: r.string(64)?,
                    };
                }
                t => chunk::unknown(r, t),
            }
        }
        c.read_end(r);
        Ok(())
    }

    /// Reads an `N_TRI_OBJECT` chunk. Material groups are resolved against `materials` by
    /// name. The reader must sit on the chunk header.
    pub fn read(&mut self, r: &mut Reader, materials: &[Material]) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::N_TRI_OBJECT)?;
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::MESH_MATRIX => self.matrix = read_matrix(r)?,
                tag::MESH_COLOR => self.color = r.u8()?,
                tag::POINT_ARRAY => {
                    let n = r.u16()? as usize;
                    let (texcos, flags) = (!self.texcos.is_empty(), !self.vflags.is_empty());
                    self.resize_vertices(n, texcos, flags);
                    for v in &mut self.vertices {
                        *v = r.vector()?;
                    }
                }
                tag::POINT_FLAG_ARRAY => {
                    let n = r.u16()? as usize;
                    let texcos = !self.texcos.is_empty();
                    self.resize_vertices(self.vertices.len().max(n), texcos, true);
                    for i in 0..n {
                        self.vflags[i] = r.u16()?;
                    }
                }
                tag::FACE_ARRAY => {
                    c.read_reset(r);
                    self.read_faces(r, materials)?;
                }
                tag::MESH_TEXTURE_INFO => {
                    self.map_type = MapType::from_raw(r.u16()?);
                    self.map_tile = [r.f32()?, r.f32()?];
                    self.map_pos = r.vector()?;
                    self.map_scale = r.f32()?;
                    self.map_matrix = read_matrix(r)?;
                    self.map_planar_size = [r.f32()?, r.f32()?];
                    self.map_cylinder_height = r.f32()?;
                }
                tag::TEX_VERTS => {
                    let n = r.u16()? as usize;
                    let flags = !self.vflags.is_empty();
                    self.resize_vertices(self.vertices.len().max(n), true, flags);
                    for i in 0..n {
                        self.texcos[i] = [r.f32()?, r.f32()?];
                    }
                }
                t => chunk::unknown(r, t),
            }
        }
        if let Some(m) = self.mirror() {
            for v in &mut self.vertices {
                *v = vector::transform(&m, *v);
            }
        }
        debug!(
            "mesh {} vertices={} faces={}",
            self.name,
            self.vertices.len(),
            self.faces.len()
        );
        c.read_end(r);
        Ok(())
    }

    fn write_faces<W: io::Write + io::Seek>(
        &self,
        w: &mut Writer<W>,
        materials: &[Material],
    ) -> Result<()> {
        if self.faces.is_empty() {
            return Ok(());
        }
        let count = check_count(self.faces.len())?;
        write_chunk(w, tag::FACE_ARRAY, |w| {
            w.u16(count)?;
            for f in &self.faces {
                w.u16(f.index[0])?;
                w.u16(f.index[1])?;
                w.u16(f.index[2])?;
                w.u16(f.flags)?;
            }

            let mut done = vec![false; self.faces.len()];
            for (i, f) in self.faces.iter().enumerate() {
                let material = match f.material.and_then(|m| materials.get(m)) {
                    Some(material) if !done[i] => material,
                    _ => continue,
                };
                let members: Vec<u16> = (i..self.faces.len())
                    .filter(|&j| self.faces[j].material == f.material)
                    .map(|j| j as u16)
                    .collect();
                for &j in &members {
                    done[j as usize] = true;
                }
                let size = HEADER_SIZE as usize + material.name.len() + 1 + 2 + 2 * members.len();
                Chunk::write(w, tag::MSH_MAT_GROUP, size as u32)?;
                w.string(&material.name)?;
                w.u16(check_count(members.len())?)?;
                for j in members {
                    w.u16(j)?;
                }
            }

            Chunk::write(
                w,
                tag::SMOOTH_GROUP,
                HEADER_SIZE + 4 * self.faces.len() as u32,
            )?;
            for f in &self.faces {
                w.u32(f.smoothing_group)?;
            }

            if !self.box_map.is_empty() {
                write_chunk(w, tag::MSH_BOXMAP, |w| {
                    for side in self.box_map.sides().iter() {
                        w.string(side)?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        })
    }

    /// Writes an `N_TRI_OBJECT` chunk. Face materials are written by their name in
    /// `materials`; faces pointing past it are left without a group.
    pub fn write<W: io::Write + io::Seek>(
        &self,
        w: &mut Writer<W>,
        materials: &[Material],
    ) -> Result<()> {
        write_chunk(w, tag::N_TRI_OBJECT, |w| {
            let n = check_count(self.vertices.len())?;
            Chunk::write(w, tag::POINT_ARRAY, 8 + 12 * n as u32)?;
            w.u16(n)?;
            let mirror = self.mirror();
            for &v in &self.vertices {
                match &mirror {
                    Some(m) => w.vector(vector::transform(m, v))?,
                    None => w.vector(v)?,
                }
            }

            if !self.texcos.is_empty() {
                let n = check_count(self.texcos.len())?;
                Chunk::write(w, tag::TEX_VERTS, 8 + 8 * n as u32)?;
                w.u16(n)?;
                for t in &self.texcos {
                    w.f32(t[0])?;
                    w.f32(t[1])?;
                }
            }

            if self.map_type != MapType::None {
                Chunk::write(w, tag::MESH_TEXTURE_INFO, 92)?;
                w.u16(self.map_type.raw())?;
                w.f32(self.map_tile[0])?;
                w.f32(self.map_tile[1])?;
                w.vector(self.map_pos)?;
                w.f32(self.map_scale)?;
                write_matrix(w, &self.map_matrix)?;
                w.f32(self.map_planar_size[0])?;
                w.f32(self.map_planar_size[1])?;
                w.f32(self.map_cylinder_height)?;
            }

            if !self.vflags.is_empty() {
                let n = check_count(self.vflags.len())?;
                Chunk::write(w, tag::POINT_FLAG_ARRAY, 8 + 2 * n as u32)?;
                w.u16(n)?;
                for &f in &self.vflags {
                    w.u16(f)?;
                }
            }

            Chunk::write(w, tag::MESH_MATRIX, 54)?;
            write_matrix(w, &self.matrix)?;

            if self.color != 0 {
                Chunk::write(w, tag::MESH_COLOR, 7)?;
                w.u8(self.color)?;
            }

            self.write_faces(w, materials)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn quad() -> Mesh {
        let mut mesh = Mesh::new("quad").unwrap();
        mesh.vertices = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        mesh.faces = vec![
            Face {
                index: [0, 1, 2],
                flags: Face::VIS_AB | Face::VIS_BC,
                material: Some(1),
                smoothing_group: 1,
            },
            Face {
                index: [0, 2, 3],
                material: Some(0),
                smoothing_group: 1,
                ..Face::default()
            },
        ];
        mesh
    }

    fn materials() -> Vec<Material> {
        vec![Material::new("red").unwrap(), Material::new("blue").unwrap()]
    }

    fn roundtrip(mesh: &Mesh) -> (Mesh, Vec<Warning>) {
        let mut w = Writer::new(Cursor::new(vec![]));
        mesh.write(&mut w, &materials()).unwrap();
        let data = w.into_inner().into_inner();
        let mut back = Mesh::new(&mesh.name).unwrap();
        let mut r = Reader::new(&data);
        back.read(&mut r, &materials()).unwrap();
        (back, r.take_warnings())
    }

    #[test]
    fn faces_keep_materials() {
        let mut mesh = quad();
        mesh.texcos = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        mesh.box_map.top = "red".into();
        mesh.color = 3;
        let (back, warnings) = roundtrip(&mesh);
        assert!(warnings.is_empty());
        assert_eq!(back, mesh);
    }

    #[test]
    fn unknown_material_becomes_none() {
        let mut mesh = quad();
        mesh.faces[0].material = Some(7);
        let (back, _) = roundtrip(&mesh);
        assert_eq!(back.faces[0].material, None);
        assert_eq!(back.faces[1].material, Some(0));
    }

    #[test]
    fn mirrored_matrix_is_idempotent() {
        let mut mesh = quad();
        mesh.matrix = matrix::scale(
            matrix::translate(matrix::identity(), Vector3::new(5.0, 0.0, 0.0)),
            Vector3::new(-1.0, 1.0, 1.0),
        );
        let (back, _) = roundtrip(&mesh);
        for (a, b) in back.vertices.iter().zip(&mesh.vertices) {
            assert!((a - b).magnitude() < 1e-4);
        }
    }

    #[test]
    fn smoothed_normals_are_shared() {
        let mesh = quad();
        let normals = mesh.calculate_vertex_normals();
        assert_eq!(normals.len(), 6);
        for n in &normals {
            assert!((n - Vector3::new(0.0, 0.0, 1.0)).magnitude() < 1e-5);
        }
        assert_eq!(normals[0], normals[3]);
    }

    #[test]
    fn face_normals() {
        let normals = quad().calculate_face_normals();
        assert!((normals[1] - Vector3::new(0.0, 0.0, 1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn bounding_box() {
        let (lo, hi) = quad().bounding_box();
        assert_eq!(lo, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(hi, Vector3::new(1.0, 1.0, 0.0));
        let (lo, hi) = Mesh::default().bounding_box();
        assert!(lo.x > hi.x);
    }

    #[test]
    fn out_of_range_group_index_warns() {
        let mut w = Writer::new(Cursor::new(vec![]));
        write_chunk(&mut w, tag::N_TRI_OBJECT, |w| {
            write_chunk(w, tag::FACE_ARRAY, |w| {
                w.u16(1)?;
                for v in &[0u16, 1, 2, 0] {
                    w.u16(*v)?;
                }
                write_chunk(w, tag::MSH_MAT_GROUP, |w| {
                    w.string("red")?;
                    w.u16(2)?;
                    w.u16(0)?;
                    w.u16(9)
                })
            })
        })
        .unwrap();
        let data = w.into_inner().into_inner();
        let mut mesh = Mesh::default();
        let mut r = Reader::new(&data);
        mesh.read(&mut r, &materials()).unwrap();
        assert_eq!(mesh.faces[0].material, Some(0));
        assert_eq!(r.warnings(), &[Warning::FaceOutOfRange { index: 9 }]);
    }

    #[test]
    fn oversized_arrays_refuse_to_write() {
        let mut mesh = quad();
        mesh.resize_vertices(70_000, true, false);
        let mut w = Writer::new(Cursor::new(vec![]));
        match mesh.write(&mut w, &materials()) {
            Err(crate::Error::TooManyElements { count }) => assert_eq!(count, 70_000),
            other => panic!("expected TooManyElements, got {:?}", other),
        }

        let mut mesh = quad();
        mesh.resize_faces(65_536);
        let mut w = Writer::new(Cursor::new(vec![]));
        assert!(mesh.write(&mut w, &materials()).is_err());
    }

    #[test]
    fn normals_tolerate_dangling_indices() {
        let mut mesh = quad();
        mesh.vertices.truncate(3);
        mesh.faces[1].index = [0, 1, 9];
        let (back, _) = roundtrip(&mesh);
        assert_eq!(back.faces[1].index, [0, 1, 9]);

        let normals = back.calculate_vertex_normals();
        assert_eq!(normals.len(), 6);
        assert!(normals.iter().all(|n| (n.magnitude() - 1.0).abs() < 1e-5));
        assert_eq!(back.calculate_face_normals().len(), 2);
    }
}
