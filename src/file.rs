//! The complete scene: editor data (`MDATA`) plus keyframer data (`KFDATA`).

use log::debug;

use crate::atmosphere::Atmosphere;
use crate::background::{colorf_defined, write_colorf, Background};
use crate::camera::Camera;
use crate::chunk::{self, tag, write_chunk, Chunk, HEADER_SIZE};
use crate::error::{check_name, Error, Result};
use crate::io::{Reader, Writer};
use crate::light::Light;
use crate::material::Material;
use crate::math::{matrix, vector, Matrix, Rgb, Vector, EPSILON};
use crate::mesh::Mesh;
use crate::node::{Node, NodeData, NodeIndex, NodeTree, NodeType};
use crate::object;
use crate::shadow::Shadow;
use crate::viewport::Viewport;

use std::fs;
use std::io::{self, Cursor, Write};
use std::path::Path;

/// Longest keyframer file name, without terminator.
const KEYF_NAME_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub mesh_version: u32,
    pub keyf_revision: u16,
    pub name: String,
    pub master_scale: f32,
    pub construction_plane: Vector,
    pub ambient: Rgb,
    pub shadow: Shadow,
    pub background: Background,
    pub atmosphere: Atmosphere,
    pub viewport: Viewport,
    pub viewport_keyf: Viewport,
    pub frames: i32,
    pub segment_from: i32,
    pub segment_to: i32,
    pub current_frame: i32,
    pub materials: Vec<Material>,
    pub cameras: Vec<Camera>,
    pub lights: Vec<Light>,
    pub meshes: Vec<Mesh>,
    pub nodes: NodeTree,
}

impl Default for File {
    fn default() -> Self {
        Self {
            mesh_version: 3,
            keyf_revision: 5,
            name: "LIB3DS".to_string(),
            master_scale: 1.0,
            construction_plane: vector::zero(),
            ambient: [0.0; 3],
            shadow: Shadow::default(),
            background: Background::default(),
            atmosphere: Atmosphere::default(),
            viewport: Viewport::default(),
            viewport_keyf: Viewport::default(),
            frames: 100,
            segment_from: 0,
            segment_to: 100,
            current_frame: 0,
            materials: vec![],
            cameras: vec![],
            lights: vec![],
            meshes: vec![],
            nodes: NodeTree::new(),
        }
    }
}

/// Entity kinds that can follow the name of a `NAMED_OBJECT`.
enum Named {
    Mesh,
    Camera,
    Light,
}

macro_rules! entity_list {
    ($field:ident, $ty:ty, $insert:ident, $remove:ident, $by_name:ident) => {
        /// Inserts at `index`, or appends when it is `None` or past the end.
        pub fn $insert(&mut self, entity: $ty, index: Option<usize>) {
            let at = index.unwrap_or(self.$field.len()).min(self.$field.len());
            self.$field.insert(at, entity);
        }

        pub fn $remove(&mut self, index: usize) -> Option<$ty> {
            if index < self.$field.len() {
                Some(self.$field.remove(index))
            } else {
                None
            }
        }

        pub fn $by_name(&self, name: &str) -> Option<usize> {
            self.$field.iter().position(|e| e.name == name)
        }
    };
}

impl File {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Writes the file to `path`. A failure part way leaves a truncated file behind.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let f = fs::File::create(path)?;
        let mut w = Writer::new(io::BufWriter::new(f));
        self.write(&mut w)?;
        w.into_inner().flush()?;
        Ok(())
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        Self::read(&mut r)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new(Cursor::new(vec![]));
        self.write(&mut w)?;
        Ok(w.into_inner().into_inner())
    }

    /// Reads a whole file. Warnings stay on `r`.
    pub fn read(r: &mut Reader) -> Result<Self> {
        let mut file = Self::default();
        let mut c = Chunk::read_start(r, 0)?;
        match c.tag {
            tag::MDATA => {
                c.read_reset(r);
                file.read_mdata(r)?;
            }
            tag::M3DMAGIC | tag::MLIBMAGIC | tag::CMAGIC => {
                while let Some(h) = c.read_next(r)? {
                    match h.tag {
                        tag::M3D_VERSION => file.mesh_version = r.u32()?,
                        tag::MDATA => {
                            c.read_reset(r);
                            file.read_mdata(r)?;
                        }
                        tag::KFDATA => {
                            c.read_reset(r);
                            file.read_kfdata(r)?;
                        }
                        t => chunk::unknown(r, t),
                    }
                }
            }
            t => return Err(Error::UnknownRootChunk { tag: t }),
        }
        c.read_end(r);
        debug!(
            "read {} materials, {} cameras, {} lights, {} meshes, {} nodes",
            file.materials.len(),
            file.cameras.len(),
            file.lights.len(),
            file.meshes.len(),
            file.nodes.len()
        );
        Ok(file)
    }

    fn read_ambient(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::AMBIENT_LIGHT)?;
        let mut have_lin = false;
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::LIN_COLOR_F => {
                    self.ambient = r.rgb()?;
                    have_lin = true;
                }
                tag::COLOR_F if !have_lin => self.ambient = r.rgb()?,
                tag::COLOR_F => {}
                t => chunk::unknown(r, t),
            }
        }
        c.read_end(r);
        Ok(())
    }

    fn read_named_object(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::NAMED_OBJECT)?;
        let name = r.string(64)?;
        c.read_tell(r);
        debug!("named object {}", name);

        let mut flags = 0;
        let mut last = None;
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::N_TRI_OBJECT => {
                    let mut mesh = Mesh {
                        name: name.clone(),
                        ..Mesh::default()
                    };
                    c.read_reset(r);
                    mesh.read(r, &self.materials)?;
                    self.meshes.push(mesh);
                    last = Some(Named::Mesh);
                }
                tag::N_CAMERA => {
                    let mut camera = Camera {
                        name: name.clone(),
                        ..Camera::default()
                    };
                    c.read_reset(r);
                    camera.read(r)?;
                    self.cameras.push(camera);
                    last = Some(Named::Camera);
                }
                tag::N_DIRECT_LIGHT => {
                    let mut light = Light {
                        name: name.clone(),
                        ..Light::default()
                    };
                    c.read_reset(r);
                    light.read(r)?;
                    self.lights.push(light);
                    last = Some(Named::Light);
                }
                tag::OBJ_PROCEDURAL => {}
                t => match object::flag_for_tag(t) {
                    Some(f) => flags |= f,
                    None => chunk::unknown(r, t),
                },
            }
        }
        c.read_end(r);

        let target = match last {
            Some(Named::Mesh) => self.meshes.last_mut().map(|e| &mut e.object_flags),
            Some(Named::Camera) => self.cameras.last_mut().map(|e| &mut e.object_flags),
            Some(Named::Light) => self.lights.last_mut().map(|e| &mut e.object_flags),
            None => None,
        };
        if let Some(object_flags) = target {
            *object_flags = flags;
        }
        Ok(())
    }

    fn read_mdata(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::MDATA)?;
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::MESH_VERSION => self.mesh_version = r.u32()?,
                tag::MASTER_SCALE => self.master_scale = r.f32()?,
                tag::SHADOW_MAP_SIZE
                | tag::LO_SHADOW_BIAS
                | tag::HI_SHADOW_BIAS
                | tag::SHADOW_SAMPLES
                | tag::SHADOW_RANGE
                | tag::SHADOW_FILTER
                | tag::RAY_BIAS => {
                    c.read_reset(r);
                    self.shadow.read(r)?;
                }
                tag::VIEWPORT_LAYOUT | tag::DEFAULT_VIEW => {
                    c.read_reset(r);
                    self.viewport.read(r)?;
                }
                tag::O_CONSTS => self.construction_plane = r.vector()?,
                tag::AMBIENT_LIGHT => {
                    c.read_reset(r);
                    self.read_ambient(r)?;
                }
                tag::BIT_MAP
                | tag::SOLID_BGND
                | tag::V_GRADIENT
                | tag::USE_BIT_MAP
                | tag::USE_SOLID_BGND
                | tag::USE_V_GRADIENT => {
                    c.read_reset(r);
                    self.background.read(r)?;
                }
                tag::FOG
                | tag::LAYER_FOG
                | tag::DISTANCE_CUE
                | tag::USE_FOG
                | tag::USE_LAYER_FOG
                | tag::USE_DISTANCE_CUE => {
                    c.read_reset(r);
                    self.atmosphere.read(r)?;
                }
                tag::MAT_ENTRY => {
                    let mut material = Material::default();
                    c.read_reset(r);
                    material.read(r)?;
                    self.materials.push(material);
                }
                tag::NAMED_OBJECT => {
                    c.read_reset(r);
                    self.read_named_object(r)?;
                }
                t => chunk::unknown(r, t),
            }
        }
        c.read_end(r);
        Ok(())
    }

    fn read_kfdata(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, tag::KFDATA)?;
        let mut tree = NodeTree::new();
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::KFHDR => {
                    self.keyf_revision = r.u16()?;
                    self.name = r.string(KEYF_NAME_LEN + 1)?;
                    self.frames = r.i32()?;
                }
                tag::KFSEG => {
                    self.segment_from = r.i32()?;
                    self.segment_to = r.i32()?;
                }
                tag::KFCURTIME => self.current_frame = r.i32()?,
                tag::VIEWPORT_LAYOUT | tag::DEFAULT_VIEW => {
                    c.read_reset(r);
                    self.viewport_keyf.read(r)?;
                }
                t => match NodeType::from_tag(t) {
                    Some(kind) => {
                        let mut node = Node::new(kind);
                        c.read_reset(r);
                        node.read(r)?;
                        tree.push_unlinked(node);
                    }
                    None => chunk::unknown(r, t),
                },
            }
        }
        c.read_end(r);
        tree.link()?;
        self.nodes = tree;
        Ok(())
    }

    /// Writes a complete `M3DMAGIC` file.
    pub fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        write_chunk(w, tag::M3DMAGIC, |w| {
            Chunk::write(w, tag::M3D_VERSION, HEADER_SIZE + 4)?;
            w.u32(self.mesh_version)?;
            self.write_mdata(w)?;
            self.write_kfdata(w)
        })
    }

    fn write_named<W, F>(w: &mut Writer<W>, name: &str, flags: u32, body: F) -> Result<()>
    where
        W: io::Write + io::Seek,
        F: FnOnce(&mut Writer<W>) -> Result<()>,
    {
        check_name(name)?;
        write_chunk(w, tag::NAMED_OBJECT, |w| {
            w.string(name)?;
            body(w)?;
            object::write_flags(w, flags)
        })
    }

    fn write_mdata<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        write_chunk(w, tag::MDATA, |w| {
            Chunk::write(w, tag::MESH_VERSION, HEADER_SIZE + 4)?;
            w.u32(self.mesh_version)?;
            Chunk::write(w, tag::MASTER_SCALE, HEADER_SIZE + 4)?;
            w.f32(self.master_scale)?;

            if (0..3).any(|i| self.construction_plane[i].abs() > EPSILON) {
                Chunk::write(w, tag::O_CONSTS, HEADER_SIZE + 12)?;
                w.vector(self.construction_plane)?;
            }
            if colorf_defined(&self.ambient) {
                write_chunk(w, tag::AMBIENT_LIGHT, |w| write_colorf(w, self.ambient))?;
            }

            self.background.write(w)?;
            self.atmosphere.write(w)?;
            self.shadow.write(w)?;
            self.viewport.write(w)?;

            for material in &self.materials {
                material.write(w)?;
            }
            for camera in &self.cameras {
                Self::write_named(w, &camera.name, camera.object_flags, |w| camera.write(w))?;
            }
            for light in &self.lights {
                Self::write_named(w, &light.name, light.object_flags, |w| light.write(w))?;
            }
            for mesh in &self.meshes {
                Self::write_named(w, &mesh.name, mesh.object_flags, |w| {
                    mesh.write(w, &self.materials)
                })?;
            }
            Ok(())
        })
    }

    fn write_kfdata<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        if self.nodes.is_empty() {
            return Ok(());
        }
        let name: String = self.name.chars().take(KEYF_NAME_LEN).collect();
        write_chunk(w, tag::KFDATA, |w| {
            Chunk::write(w, tag::KFHDR, HEADER_SIZE + 2 + name.len() as u32 + 1 + 4)?;
            w.u16(self.keyf_revision)?;
            w.string(&name)?;
            w.i32(self.frames)?;

            Chunk::write(w, tag::KFSEG, HEADER_SIZE + 8)?;
            w.i32(self.segment_from)?;
            w.i32(self.segment_to)?;

            Chunk::write(w, tag::KFCURTIME, HEADER_SIZE + 4)?;
            w.i32(self.current_frame)?;

            self.viewport_keyf.write(w)?;
            self.nodes.write(w)
        })
    }

    /// Evaluates every node at frame `t`.
    pub fn eval(&mut self, t: f32) {
        self.nodes.eval(t);
    }

    /// Inserts at `index`, or appends when it is `None` or past the end. Face material
    /// indices of every mesh follow the shift.
    pub fn insert_material(&mut self, material: Material, index: Option<usize>) {
        let at = index.unwrap_or(self.materials.len()).min(self.materials.len());
        self.materials.insert(at, material);
        for face in self.meshes.iter_mut().flat_map(|m| m.faces.iter_mut()) {
            if let Some(i) = face.material.as_mut() {
                if *i >= at {
                    *i += 1;
                }
            }
        }
    }

    /// Removes a material. Faces that used it lose their material.
    pub fn remove_material(&mut self, index: usize) -> Option<Material> {
        if index >= self.materials.len() {
            return None;
        }
        for face in self.meshes.iter_mut().flat_map(|m| m.faces.iter_mut()) {
            face.material = match face.material {
                Some(i) if i == index => None,
                Some(i) if i > index => Some(i - 1),
                other => other,
            };
        }
        Some(self.materials.remove(index))
    }

    pub fn material_by_name(&self, name: &str) -> Option<usize> {
        self.materials.iter().position(|m| m.name == name)
    }

    entity_list!(cameras, Camera, insert_camera, remove_camera, camera_by_name);
    entity_list!(lights, Light, insert_light, remove_light, light_by_name);
    entity_list!(meshes, Mesh, insert_mesh, remove_mesh, mesh_by_name);

    /// Mesh instanced by a mesh-instance node, looked up by the node name.
    pub fn mesh_for_node(&self, node: &Node) -> Option<&Mesh> {
        match node.data {
            NodeData::MeshInstance(_) => self.mesh_by_name(&node.name).map(|i| &self.meshes[i]),
            _ => None,
        }
    }

    pub fn node_by_name(&self, name: &str, kind: NodeType) -> Option<NodeIndex> {
        self.nodes.by_name(name, kind)
    }

    pub fn node_by_id(&self, node_id: u16) -> Option<NodeIndex> {
        self.nodes.by_id(node_id)
    }

    pub fn append_node(&mut self, node: Node, parent: Option<NodeIndex>) -> NodeIndex {
        self.nodes.append(node, parent)
    }

    pub fn insert_node(&mut self, node: Node, before: Option<NodeIndex>) -> NodeIndex {
        self.nodes.insert(node, before)
    }

    pub fn remove_node(&mut self, index: NodeIndex) {
        self.nodes.remove(index)
    }

    pub fn minmax_node_id(&self) -> (u16, u16) {
        self.nodes.minmax_node_id()
    }

    /// Bounds of the raw object data, ignoring the keyframer. `None` when nothing counted.
    pub fn bounding_box_of_objects(
        &self,
        include_meshes: bool,
        include_cameras: bool,
        include_lights: bool,
    ) -> Option<(Vector, Vector)> {
        let mut points: Vec<Vector> = vec![];
        if include_meshes {
            points.extend(self.meshes.iter().flat_map(|m| m.vertices.iter().copied()));
        }
        if include_cameras {
            for camera in &self.cameras {
                points.push(camera.position);
                points.push(camera.target);
            }
        }
        if include_lights {
            for light in &self.lights {
                points.push(light.position);
                if light.spot_light {
                    points.push(light.target);
                }
            }
        }
        bounds(points)
    }

    /// Bounds of the evaluated scene as seen through `m`. Meshes are placed by their
    /// instance node, cameras and lights count by their node origin.
    pub fn bounding_box_of_nodes(
        &self,
        include_meshes: bool,
        include_cameras: bool,
        include_lights: bool,
        m: Option<&Matrix>,
    ) -> Option<(Vector, Vector)> {
        let base = m.copied().unwrap_or_else(matrix::identity);
        let mut points: Vec<Vector> = vec![];
        for i in self.nodes.preorder() {
            let node = match self.nodes.get(i) {
                Some(node) => node,
                None => continue,
            };
            match &node.data {
                NodeData::MeshInstance(n) if include_meshes => {
                    let mesh = self
                        .mesh_by_name(&n.instance_name)
                        .or_else(|| self.mesh_by_name(&node.name))
                        .map(|i| &self.meshes[i]);
                    if let Some(mesh) = mesh {
                        let inv = matrix::inverse(&mesh.matrix).unwrap_or_else(matrix::identity);
                        let mm = matrix::translate(base * node.matrix, -n.pivot) * inv;
                        points.extend(mesh.vertices.iter().map(|&v| vector::transform(&mm, v)));
                    }
                }
                NodeData::Camera(_) | NodeData::CameraTarget(_) if include_cameras => {
                    points.push(vector::transform(&(base * node.matrix), vector::zero()));
                }
                NodeData::Omnilight(_) | NodeData::Spotlight(_) | NodeData::SpotlightTarget(_)
                    if include_lights =>
                {
                    points.push(vector::transform(&(base * node.matrix), vector::zero()));
                }
                _ => {}
            }
        }
        bounds(points)
    }

    /// Adds one mesh-instance node per mesh at the front of the roots.
    pub fn create_nodes_for_meshes(&mut self) {
        for mesh in &self.meshes {
            let mut node = Node::new(NodeType::MeshInstance);
            node.name = mesh.name.clone();
            self.nodes.insert(node, None);
        }
    }
}

fn bounds<I: IntoIterator<Item = Vector>>(points: I) -> Option<(Vector, Vector)> {
    points.into_iter().fold(None, |acc, p| match acc {
        None => Some((p, p)),
        Some((lo, hi)) => Some((vector::min(lo, p), vector::max(hi, p))),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Warning;
    use cgmath::{InnerSpace, Vector3};

    #[test]
    fn defaults() {
        let file = File::new();
        assert_eq!(file.mesh_version, 3);
        assert_eq!(file.keyf_revision, 5);
        assert_eq!(file.name, "LIB3DS");
        assert_eq!((file.frames, file.segment_from, file.segment_to), (100, 0, 100));
        assert_eq!(file.master_scale, 1.0);
    }

    #[test]
    fn empty_file_layout() {
        let data = File::new().to_bytes().unwrap();
        // M3DMAGIC { M3D_VERSION, MDATA { MESH_VERSION, MASTER_SCALE } }
        assert_eq!(data.len(), 6 + 10 + 6 + 10 + 10);
        assert_eq!(&data[..2], &[0x4d, 0x4d]);
        let back = File::from_bytes(&data).unwrap();
        assert_eq!(back, File::new());
    }

    #[test]
    fn bare_mdata_root() {
        let mut w = Writer::new(Cursor::new(vec![]));
        File {
            master_scale: 2.5,
            ..File::default()
        }
        .write_mdata(&mut w)
        .unwrap();
        let data = w.into_inner().into_inner();
        assert_eq!(File::from_bytes(&data).unwrap().master_scale, 2.5);
    }

    #[test]
    fn unknown_root_is_fatal() {
        let data = [0x34, 0x12, 6, 0, 0, 0];
        assert!(matches!(
            File::from_bytes(&data),
            Err(Error::UnknownRootChunk { tag: 0x1234 })
        ));
    }

    #[test]
    fn ambient_and_object_flags() {
        let mut file = File::new();
        file.ambient = [0.2, 0.3, 0.4];
        let mut camera = Camera::new("cam").unwrap();
        camera.object_flags = object::HIDDEN | object::DONT_RCVSHADOW;
        file.insert_camera(camera, None);

        let data = file.to_bytes().unwrap();
        let mut r = Reader::new(&data);
        let back = File::read(&mut r).unwrap();
        assert!(r.warnings().is_empty());
        assert_eq!(back.ambient, [0.2, 0.3, 0.4]);
        assert_eq!(back.cameras[0].object_flags, object::HIDDEN | object::DONT_RCVSHADOW);
    }

    #[test]
    fn unknown_children_are_skipped() {
        let mut w = Writer::new(Cursor::new(vec![]));
        write_chunk(&mut w, tag::M3DMAGIC, |w| {
            write_chunk(w, 0x1234, |w| w.u32(7))?;
            write_chunk(w, tag::MDATA, |w| {
                Chunk::write(w, tag::MASTER_SCALE, HEADER_SIZE + 4)?;
                w.f32(4.0)
            })
        })
        .unwrap();
        let data = w.into_inner().into_inner();
        let mut r = Reader::new(&data);
        let file = File::read(&mut r).unwrap();
        assert_eq!(file.master_scale, 4.0);
        assert!(matches!(
            r.warnings(),
            [Warning::UnknownChunk { tag: 0x1234, offset: 6 }]
        ));
    }

    #[test]
    fn overrun_spares_later_sections() {
        let mut file = File::new();
        file.frames = 42;
        file.append_node(Node::new(NodeType::MeshInstance), None);
        let mut data = file.to_bytes().unwrap();
        let at = data
            .windows(6)
            .position(|c| c == [0x00, 0x01, 10, 0, 0, 0])
            .unwrap();
        // MASTER_SCALE now reaches past the end of MDATA
        data[at + 2] = 200;

        let mut r = Reader::new(&data);
        let back = File::read(&mut r).unwrap();
        assert_eq!(back.master_scale, 1.0);
        assert_eq!(back.frames, 42);
        assert_eq!(back.nodes.len(), 1);
        assert!(r.warnings().contains(&Warning::ChunkOverrun {
            tag: tag::MASTER_SCALE,
            offset: at as u64,
        }));
    }

    #[test]
    fn material_removal_updates_faces() {
        let mut file = File::new();
        file.insert_material(Material::new("a").unwrap(), None);
        file.insert_material(Material::new("b").unwrap(), None);
        let mut mesh = Mesh::new("m").unwrap();
        mesh.resize_faces(2);
        mesh.faces[0].material = Some(0);
        mesh.faces[1].material = Some(1);
        file.insert_mesh(mesh, None);

        file.insert_material(Material::new("z").unwrap(), Some(0));
        assert_eq!(file.meshes[0].faces[1].material, Some(2));
        file.remove_material(1);
        assert_eq!(file.meshes[0].faces[0].material, None);
        assert_eq!(file.meshes[0].faces[1].material, Some(1));
        assert_eq!(file.material_by_name("b"), Some(1));
    }

    #[test]
    fn nodes_without_ids_get_running_ids() {
        let mut file = File::new();
        let root = file.append_node(Node::new(NodeType::MeshInstance), None);
        file.append_node(Node::new(NodeType::MeshInstance), Some(root));
        let back = File::from_bytes(&file.to_bytes().unwrap()).unwrap();
        assert_eq!(back.nodes.len(), 2);
        assert_eq!(back.nodes.roots(), &[0]);
        assert_eq!(back.nodes.get(1).unwrap().node_id, 1);
        assert_eq!(back.nodes.get(1).unwrap().parent_id, 0);
        assert_eq!(back.nodes.get(0).unwrap().children(), &[1]);
    }

    #[test]
    fn running_ids_skip_explicit_ones() {
        let mut file = File::new();
        let mut a = Node::new(NodeType::MeshInstance);
        a.name = "a".into();
        a.node_id = 1;
        file.append_node(a, None);
        let mut b = Node::new(NodeType::MeshInstance);
        b.name = "b".into();
        let b = file.append_node(b, None);
        let mut c = Node::new(NodeType::MeshInstance);
        c.name = "c".into();
        file.append_node(c, Some(b));

        let back = File::from_bytes(&file.to_bytes().unwrap()).unwrap();
        let node = |name: &str| {
            let i = back.node_by_name(name, NodeType::MeshInstance).unwrap();
            back.nodes.get(i).unwrap()
        };
        assert_eq!(node("a").node_id, 1);
        assert_eq!(node("b").node_id, 0);
        assert_eq!(node("c").node_id, 2);
        let b = back.node_by_name("b", NodeType::MeshInstance).unwrap();
        let c = back.node_by_name("c", NodeType::MeshInstance).unwrap();
        assert_eq!(back.nodes.get(c).unwrap().parent(), Some(b));
        assert_eq!(back.nodes.roots().len(), 2);
    }

    #[test]
    fn node_bounds_follow_instances() {
        let mut file = File::new();
        let mut mesh = Mesh::new("box").unwrap();
        mesh.resize_vertices(2, false, false);
        mesh.vertices[1] = Vector3::new(1.0, 1.0, 1.0);
        file.insert_mesh(mesh, None);
        let node = Node::new_mesh_instance(
            file.meshes.first(),
            None,
            Some(Vector3::new(10.0, 0.0, 0.0)),
            None,
            None,
        );
        file.append_node(node, None);
        file.eval(0.0);

        let (lo, hi) = file.bounding_box_of_nodes(true, true, true, None).unwrap();
        assert!((lo - Vector3::new(10.0, 0.0, 0.0)).magnitude() < 1e-5);
        assert!((hi - Vector3::new(11.0, 1.0, 1.0)).magnitude() < 1e-5);
        let (lo, _) = file.bounding_box_of_objects(true, false, false).unwrap();
        assert_eq!(lo, vector::zero());
        assert!(file.bounding_box_of_objects(false, true, true).is_none());
    }

    #[test]
    fn nodes_for_meshes() {
        let mut file = File::new();
        file.insert_mesh(Mesh::new("a").unwrap(), None);
        file.insert_mesh(Mesh::new("b").unwrap(), None);
        file.create_nodes_for_meshes();
        let a = file.node_by_name("a", NodeType::MeshInstance).unwrap();
        let node = file.nodes.get(a).unwrap();
        assert_eq!(file.mesh_for_node(node).unwrap().name, "a");
        assert_eq!(file.nodes.roots().len(), 2);
    }
}
