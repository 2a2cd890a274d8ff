//! Keyframer nodes.
//!
//! Nodes live in a [`NodeTree`] arena and refer to each other by index. On disk every node
//! only stores its own id and the id of its parent, the tree is rebuilt by
//! [`NodeTree::link`] once all nodes of a `KFDATA` chunk are read.

use log::debug;

use crate::camera::Camera;
use crate::chunk::{self, tag, write_chunk, Chunk, HEADER_SIZE};
use crate::error::{Error, Result};
use crate::io::{Reader, Writer};
use crate::light::Light;
use crate::math::{matrix, quat, vector, Matrix, Quat, Rgb, Vector, EPSILON};
use crate::mesh::Mesh;
use crate::track::{Key, Track, TrackType};

use cgmath::Vector3;

use std::collections::{HashMap, HashSet};
use std::io;

pub type NodeIndex = usize;

/// Id of a node that has not been given one, and parent id of a root node.
pub const NO_ID: u16 = 65535;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    AmbientColor,
    MeshInstance,
    Camera,
    CameraTarget,
    Omnilight,
    Spotlight,
    SpotlightTarget,
}

impl NodeType {
    pub fn from_tag(t: u16) -> Option<Self> {
        Some(match t {
            tag::AMBIENT_NODE_TAG => NodeType::AmbientColor,
            tag::OBJECT_NODE_TAG => NodeType::MeshInstance,
            tag::CAMERA_NODE_TAG => NodeType::Camera,
            tag::TARGET_NODE_TAG => NodeType::CameraTarget,
            tag::LIGHT_NODE_TAG => NodeType::Omnilight,
            tag::SPOTLIGHT_NODE_TAG => NodeType::Spotlight,
            tag::L_TARGET_NODE_TAG => NodeType::SpotlightTarget,
            _ => return None,
        })
    }

    pub fn tag(self) -> u16 {
        match self {
            NodeType::AmbientColor => tag::AMBIENT_NODE_TAG,
            NodeType::MeshInstance => tag::OBJECT_NODE_TAG,
            NodeType::Camera => tag::CAMERA_NODE_TAG,
            NodeType::CameraTarget => tag::TARGET_NODE_TAG,
            NodeType::Omnilight => tag::LIGHT_NODE_TAG,
            NodeType::Spotlight => tag::SPOTLIGHT_NODE_TAG,
            NodeType::SpotlightTarget => tag::L_TARGET_NODE_TAG,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmbientColorNode {
    pub color: Rgb,
    pub color_track: Track,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstanceNode {
    pub pivot: Vector,
    pub instance_name: String,
    pub bbox_min: Vector,
    pub bbox_max: Vector,
    pub hide: bool,
    pub pos: Vector,
    pub rot: Quat,
    pub scl: Vector,
    pub morph_smooth: f32,
    pub pos_track: Track,
    pub rot_track: Track,
    pub scl_track: Track,
    pub hide_track: Track,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraNode {
    pub pos: Vector,
    pub fov: f32,
    pub roll: f32,
    pub pos_track: Track,
    pub fov_track: Track,
    pub roll_track: Track,
}

/// Target of a camera or a spotlight.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetNode {
    pub pos: Vector,
    pub pos_track: Track,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OmnilightNode {
    pub pos: Vector,
    pub color: Rgb,
    pub pos_track: Track,
    pub color_track: Track,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotlightNode {
    pub pos: Vector,
    pub color: Rgb,
    pub hotspot: f32,
    pub falloff: f32,
    pub roll: f32,
    pub pos_track: Track,
    pub color_track: Track,
    pub hotspot_track: Track,
    pub falloff_track: Track,
    pub roll_track: Track,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    AmbientColor(AmbientColorNode),
    MeshInstance(MeshInstanceNode),
    Camera(CameraNode),
    CameraTarget(TargetNode),
    Omnilight(OmnilightNode),
    Spotlight(SpotlightNode),
    SpotlightTarget(TargetNode),
}

fn target() -> TargetNode {
    TargetNode {
        pos: vector::zero(),
        pos_track: Track::new(TrackType::Vector),
    }
}

impl NodeData {
    fn new(kind: NodeType) -> Self {
        match kind {
            NodeType::AmbientColor => NodeData::AmbientColor(AmbientColorNode {
                color: [0.0; 3],
                color_track: Track::new(TrackType::Vector),
            }),
            NodeType::MeshInstance => NodeData::MeshInstance(MeshInstanceNode {
                pivot: vector::zero(),
                instance_name: String::new(),
                bbox_min: vector::zero(),
                bbox_max: vector::zero(),
                hide: false,
                pos: vector::zero(),
                rot: quat::identity(),
                scl: Vector3::new(1.0, 1.0, 1.0),
                morph_smooth: 0.0,
                pos_track: Track::new(TrackType::Vector),
                rot_track: Track::new(TrackType::Quat),
                scl_track: Track::new(TrackType::Vector),
                hide_track: Track::new(TrackType::Bool),
            }),
            NodeType::Camera => NodeData::Camera(CameraNode {
                pos: vector::zero(),
                fov: 0.0,
                roll: 0.0,
                pos_track: Track::new(TrackType::Vector),
                fov_track: Track::new(TrackType::Float),
                roll_track: Track::new(TrackType::Float),
            }),
            NodeType::CameraTarget => NodeData::CameraTarget(target()),
            NodeType::Omnilight => NodeData::Omnilight(OmnilightNode {
                pos: vector::zero(),
                color: [0.0; 3],
                pos_track: Track::new(TrackType::Vector),
                color_track: Track::new(TrackType::Vector),
            }),
            NodeType::Spotlight => NodeData::Spotlight(SpotlightNode {
                pos: vector::zero(),
                color: [0.0; 3],
                hotspot: 0.0,
                falloff: 0.0,
                roll: 0.0,
                pos_track: Track::new(TrackType::Vector),
                color_track: Track::new(TrackType::Vector),
                hotspot_track: Track::new(TrackType::Float),
                falloff_track: Track::new(TrackType::Float),
                roll_track: Track::new(TrackType::Float),
            }),
            NodeType::SpotlightTarget => NodeData::SpotlightTarget(target()),
        }
    }

    pub fn kind(&self) -> NodeType {
        match self {
            NodeData::AmbientColor(_) => NodeType::AmbientColor,
            NodeData::MeshInstance(_) => NodeType::MeshInstance,
            NodeData::Camera(_) => NodeType::Camera,
            NodeData::CameraTarget(_) => NodeType::CameraTarget,
            NodeData::Omnilight(_) => NodeType::Omnilight,
            NodeData::Spotlight(_) => NodeType::Spotlight,
            NodeData::SpotlightTarget(_) => NodeType::SpotlightTarget,
        }
    }

    /// Tracks of this node in file order, keyed by their chunk tag.
    pub fn tracks(&self) -> Vec<(u16, &Track)> {
        match self {
            NodeData::AmbientColor(n) => vec![(tag::COL_TRACK_TAG, &n.color_track)],
            NodeData::MeshInstance(n) => vec![
                (tag::POS_TRACK_TAG, &n.pos_track),
                (tag::ROT_TRACK_TAG, &n.rot_track),
                (tag::SCL_TRACK_TAG, &n.scl_track),
                (tag::HIDE_TRACK_TAG, &n.hide_track),
            ],
            NodeData::Camera(n) => vec![
                (tag::POS_TRACK_TAG, &n.pos_track),
                (tag::FOV_TRACK_TAG, &n.fov_track),
                (tag::ROLL_TRACK_TAG, &n.roll_track),
            ],
            NodeData::CameraTarget(n) | NodeData::SpotlightTarget(n) => {
                vec![(tag::POS_TRACK_TAG, &n.pos_track)]
            }
            NodeData::Omnilight(n) => vec![
                (tag::POS_TRACK_TAG, &n.pos_track),
                (tag::COL_TRACK_TAG, &n.color_track),
            ],
            NodeData::Spotlight(n) => vec![
                (tag::POS_TRACK_TAG, &n.pos_track),
                (tag::COL_TRACK_TAG, &n.color_track),
                (tag::HOT_TRACK_TAG, &n.hotspot_track),
                (tag::FALL_TRACK_TAG, &n.falloff_track),
                (tag::ROLL_TRACK_TAG, &n.roll_track),
            ],
        }
    }

    fn track_mut(&mut self, t: u16) -> Option<&mut Track> {
        match (self, t) {
            (NodeData::AmbientColor(n), tag::COL_TRACK_TAG) => Some(&mut n.color_track),
            (NodeData::MeshInstance(n), tag::POS_TRACK_TAG) => Some(&mut n.pos_track),
            (NodeData::MeshInstance(n), tag::ROT_TRACK_TAG) => Some(&mut n.rot_track),
            (NodeData::MeshInstance(n), tag::SCL_TRACK_TAG) => Some(&mut n.scl_track),
            (NodeData::MeshInstance(n), tag::HIDE_TRACK_TAG) => Some(&mut n.hide_track),
            (NodeData::Camera(n), tag::POS_TRACK_TAG) => Some(&mut n.pos_track),
            (NodeData::Camera(n), tag::FOV_TRACK_TAG) => Some(&mut n.fov_track),
            (NodeData::Camera(n), tag::ROLL_TRACK_TAG) => Some(&mut n.roll_track),
            (NodeData::CameraTarget(n), tag::POS_TRACK_TAG) => Some(&mut n.pos_track),
            (NodeData::SpotlightTarget(n), tag::POS_TRACK_TAG) => Some(&mut n.pos_track),
            (NodeData::Omnilight(n), tag::POS_TRACK_TAG) => Some(&mut n.pos_track),
            (NodeData::Omnilight(n), tag::COL_TRACK_TAG) => Some(&mut n.color_track),
            (NodeData::Spotlight(n), tag::POS_TRACK_TAG) => Some(&mut n.pos_track),
            (NodeData::Spotlight(n), tag::COL_TRACK_TAG) => Some(&mut n.color_track),
            (NodeData::Spotlight(n), tag::HOT_TRACK_TAG) => Some(&mut n.hotspot_track),
            (NodeData::Spotlight(n), tag::FALL_TRACK_TAG) => Some(&mut n.falloff_track),
            (NodeData::Spotlight(n), tag::ROLL_TRACK_TAG) => Some(&mut n.roll_track),
            _ => None,
        }
    }
}

/// Single key track holding `value`.
fn constant(kind: TrackType, value: [f32; 4]) -> Track {
    let mut track = Track::new(kind);
    track.keys.push(Key::new(0, value));
    track
}

fn vector_value(v: Vector) -> [f32; 4] {
    [v.x, v.y, v.z, 0.0]
}

fn rgb_value(c: Rgb) -> [f32; 4] {
    [c[0], c[1], c[2], 0.0]
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub node_id: u16,
    pub parent_id: u16,
    pub flags: u32,
    /// World transform as of the last [`NodeTree::eval`].
    pub matrix: Matrix,
    pub data: NodeData,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl Node {
    pub const HIDDEN: u32 = 0x000800;
    pub const SHOW_PATH: u32 = 0x010000;
    pub const SMOOTHING: u32 = 0x020000;
    pub const MOTION_BLUR: u32 = 0x100000;
    pub const MORPH_MATERIALS: u32 = 0x400000;

    /// An unlinked node without id and with empty tracks.
    pub fn new(kind: NodeType) -> Self {
        let name = match kind {
            NodeType::AmbientColor => "$AMBIENT$",
            NodeType::MeshInstance => "$$$DUMMY",
            _ => "",
        };
        Self {
            name: name.to_string(),
            node_id: NO_ID,
            parent_id: NO_ID,
            flags: 0,
            matrix: matrix::identity(),
            data: NodeData::new(kind),
            parent: None,
            children: vec![],
        }
    }

    pub fn new_ambient_color(color: Option<Rgb>) -> Self {
        let mut node = Self::new(NodeType::AmbientColor);
        if let NodeData::AmbientColor(n) = &mut node.data {
            n.color_track = constant(TrackType::Vector, rgb_value(color.unwrap_or([0.0; 3])));
        }
        node
    }

    /// Instance of `mesh`, or of the dummy object. `rot` is an axis followed by an angle.
    pub fn new_mesh_instance(
        mesh: Option<&Mesh>,
        instance_name: Option<&str>,
        pos: Option<Vector>,
        scl: Option<Vector>,
        rot: Option<[f32; 4]>,
    ) -> Self {
        let mut node = Self::new(NodeType::MeshInstance);
        if let Some(mesh) = mesh {
            node.name = mesh.name.clone();
        }
        if let NodeData::MeshInstance(n) = &mut node.data {
            n.instance_name = instance_name.unwrap_or_default().to_string();
            n.pos_track = constant(
                TrackType::Vector,
                vector_value(pos.unwrap_or_else(vector::zero)),
            );
            n.scl_track = constant(
                TrackType::Vector,
                vector_value(scl.unwrap_or_else(|| Vector3::new(1.0, 1.0, 1.0))),
            );
            n.rot_track = constant(TrackType::Quat, rot.unwrap_or([0.0; 4]));
        }
        node
    }

    pub fn new_camera(camera: &Camera) -> Self {
        let mut node = Self::new(NodeType::Camera);
        node.name = camera.name.clone();
        if let NodeData::Camera(n) = &mut node.data {
            n.pos_track = constant(TrackType::Vector, vector_value(camera.position));
            n.fov_track = constant(TrackType::Float, [camera.fov, 0.0, 0.0, 0.0]);
            n.roll_track = constant(TrackType::Float, [camera.roll, 0.0, 0.0, 0.0]);
        }
        node
    }

    pub fn new_camera_target(camera: &Camera) -> Self {
        let mut node = Self::new(NodeType::CameraTarget);
        node.name = camera.name.clone();
        if let NodeData::CameraTarget(n) = &mut node.data {
            n.pos_track = constant(TrackType::Vector, vector_value(camera.target));
        }
        node
    }

    pub fn new_omnilight(light: &Light) -> Self {
        let mut node = Self::new(NodeType::Omnilight);
        node.name = light.name.clone();
        if let NodeData::Omnilight(n) = &mut node.data {
            n.pos_track = constant(TrackType::Vector, vector_value(light.position));
            n.color_track = constant(TrackType::Vector, rgb_value(light.color));
        }
        node
    }

    pub fn new_spotlight(light: &Light) -> Self {
        let mut node = Self::new(NodeType::Spotlight);
        node.name = light.name.clone();
        if let NodeData::Spotlight(n) = &mut node.data {
            n.pos_track = constant(TrackType::Vector, vector_value(light.position));
            n.color_track = constant(TrackType::Vector, rgb_value(light.color));
            n.hotspot_track = constant(TrackType::Float, [light.hotspot, 0.0, 0.0, 0.0]);
            n.falloff_track = constant(TrackType::Float, [light.falloff, 0.0, 0.0, 0.0]);
            n.roll_track = constant(TrackType::Float, [light.roll, 0.0, 0.0, 0.0]);
        }
        node
    }

    pub fn new_spotlight_target(light: &Light) -> Self {
        let mut node = Self::new(NodeType::SpotlightTarget);
        node.name = light.name.clone();
        if let NodeData::SpotlightTarget(n) = &mut node.data {
            n.pos_track = constant(TrackType::Vector, vector_value(light.target));
        }
        node
    }

    pub fn kind(&self) -> NodeType {
        self.data.kind()
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Samples every track at `t` and rebuilds the world matrix on top of `parent`.
    pub fn eval(&mut self, t: f32, parent: Option<&Matrix>) {
        let base = parent.copied().unwrap_or_else(matrix::identity);
        self.matrix = match &mut self.data {
            NodeData::AmbientColor(n) => {
                n.color = n.color_track.eval_vector(t).into();
                base
            }
            NodeData::MeshInstance(n) => {
                n.pos = n.pos_track.eval_vector(t);
                n.rot = n.rot_track.eval_quat(t);
                n.scl = if n.scl_track.is_empty() {
                    Vector3::new(1.0, 1.0, 1.0)
                } else {
                    n.scl_track.eval_vector(t)
                };
                n.hide = n.hide_track.eval_bool(t);
                let m = matrix::translate(matrix::identity(), n.pos);
                let m = matrix::rotate_quat(m, n.rot);
                base * matrix::scale(m, n.scl)
            }
            NodeData::Camera(n) => {
                n.pos = n.pos_track.eval_vector(t);
                n.fov = n.fov_track.eval_float(t);
                n.roll = n.roll_track.eval_float(t);
                matrix::translate(base, n.pos)
            }
            NodeData::CameraTarget(n) | NodeData::SpotlightTarget(n) => {
                n.pos = n.pos_track.eval_vector(t);
                matrix::translate(base, n.pos)
            }
            NodeData::Omnilight(n) => {
                n.pos = n.pos_track.eval_vector(t);
                n.color = n.color_track.eval_vector(t).into();
                matrix::translate(base, n.pos)
            }
            NodeData::Spotlight(n) => {
                n.pos = n.pos_track.eval_vector(t);
                n.color = n.color_track.eval_vector(t).into();
                n.hotspot = n.hotspot_track.eval_float(t);
                n.falloff = n.falloff_track.eval_float(t);
                n.roll = n.roll_track.eval_float(t);
                matrix::translate(base, n.pos)
            }
        };
    }

    /// Reads a node chunk. The reader must sit on its header. Chunks that are not nodes are
    /// skipped without touching `self`.
    pub fn read(&mut self, r: &mut Reader) -> Result<()> {
        let mut c = Chunk::read_start(r, 0)?;
        if NodeType::from_tag(c.tag).is_none() {
            c.read_end(r);
            return Ok(());
        }
        while let Some(h) = c.read_next(r)? {
            match h.tag {
                tag::NODE_ID => {
                    self.node_id = r.u16()?;
                    debug!("node id={}", self.node_id);
                }
                tag::NODE_HDR => {
                    self.name = r.string(64)?;
                    self.flags = r.u32()?;
                    self.parent_id = r.u16()?;
                    debug!("node {} parent={}", self.name, self.parent_id as i16);
                }
                tag::PIVOT | tag::INSTANCE_NAME | tag::BOUNDBOX | tag::MORPH_SMOOTH => {
                    match &mut self.data {
                        NodeData::MeshInstance(n) => match h.tag {
                            tag::PIVOT => n.pivot = r.vector()?,
                            tag::INSTANCE_NAME => n.instance_name = r.string(64)?,
                            tag::BOUNDBOX => {
                                n.bbox_min = r.vector()?;
                                n.bbox_max = r.vector()?;
                            }
                            _ => n.morph_smooth = r.f32()?,
                        },
                        _ => chunk::unknown(r, h.tag),
                    }
                }
                t => match self.data.track_mut(t) {
                    Some(track) => track.read(r)?,
                    None => chunk::unknown(r, t),
                },
            }
        }
        c.read_end(r);
        Ok(())
    }

    /// Writes the node under the ids it is known by in the file being written.
    pub fn write<W: io::Write + io::Seek>(
        &self,
        w: &mut Writer<W>,
        node_id: u16,
        parent_id: u16,
    ) -> Result<()> {
        write_chunk(w, self.kind().tag(), |w| {
            Chunk::write(w, tag::NODE_ID, HEADER_SIZE + 2)?;
            w.u16(node_id)?;

            Chunk::write(w, tag::NODE_HDR, HEADER_SIZE + self.name.len() as u32 + 1 + 6)?;
            w.string(&self.name)?;
            w.u32(self.flags)?;
            w.u16(parent_id)?;

            if let NodeData::MeshInstance(n) = &self.data {
                Chunk::write(w, tag::PIVOT, HEADER_SIZE + 12)?;
                w.vector(n.pivot)?;
                if !n.instance_name.is_empty() {
                    write_chunk(w, tag::INSTANCE_NAME, |w| w.string(&n.instance_name))?;
                }
                let bbox_set =
                    (0..3).any(|i| n.bbox_min[i].abs() > EPSILON || n.bbox_max[i].abs() > EPSILON);
                if bbox_set {
                    Chunk::write(w, tag::BOUNDBOX, HEADER_SIZE + 24)?;
                    w.vector(n.bbox_min)?;
                    w.vector(n.bbox_max)?;
                }
            }

            for (track_tag, track) in self.data.tracks() {
                if !track.is_empty() {
                    write_chunk(w, track_tag, |w| track.write(w))?;
                }
            }

            if let NodeData::MeshInstance(n) = &self.data {
                if n.morph_smooth.abs() > EPSILON {
                    Chunk::write(w, tag::MORPH_SMOOTH, HEADER_SIZE + 4)?;
                    w.f32(n.morph_smooth)?;
                }
            }
            Ok(())
        })
    }
}

/// Arena holding every node of a file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeTree {
    nodes: Vec<Node>,
    roots: Vec<NodeIndex>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// All nodes in arena order, linked or not.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes.iter().enumerate()
    }

    /// Indices reachable from the roots, parents before their children.
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeIndex> = self.roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            order.push(i);
            stack.extend(self.nodes[i].children.iter().rev());
        }
        order
    }

    /// Adds `node` as the last child of `parent`, or as the last root.
    pub fn append(&mut self, mut node: Node, parent: Option<NodeIndex>) -> NodeIndex {
        let index = self.nodes.len();
        node.parent = parent.filter(|&p| p < index);
        node.children.clear();
        match node.parent {
            Some(p) => self.nodes[p].children.push(index),
            None => self.roots.push(index),
        }
        self.nodes.push(node);
        index
    }

    /// Adds `node` as a sibling right before `before`, or as the first root.
    pub fn insert(&mut self, mut node: Node, before: Option<NodeIndex>) -> NodeIndex {
        let index = self.nodes.len();
        let before = before.filter(|&b| b < index);
        node.parent = before.and_then(|b| self.nodes[b].parent);
        node.children.clear();
        let siblings = match node.parent {
            Some(p) => &mut self.nodes[p].children,
            None => &mut self.roots,
        };
        let at = before
            .and_then(|b| siblings.iter().position(|&s| s == b))
            .unwrap_or(if before.is_some() { siblings.len() } else { 0 });
        siblings.insert(at, index);
        self.nodes.push(node);
        index
    }

    /// Removes `index` together with all of its descendants. Indices of the remaining nodes
    /// are compacted.
    pub fn remove(&mut self, index: NodeIndex) {
        if index >= self.nodes.len() {
            return;
        }
        match self.nodes[index].parent {
            Some(p) => self.nodes[p].children.retain(|&c| c != index),
            None => self.roots.retain(|&c| c != index),
        }

        let mut doomed = vec![false; self.nodes.len()];
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            doomed[i] = true;
            stack.extend(self.nodes[i].children.iter().copied());
        }

        let mut remap = vec![None; self.nodes.len()];
        let mut next = 0;
        for (i, gone) in doomed.iter().enumerate() {
            if !gone {
                remap[i] = Some(next);
                next += 1;
            }
        }

        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = nodes
            .into_iter()
            .zip(doomed)
            .filter(|(_, gone)| !gone)
            .map(|(mut node, _)| {
                node.parent = node.parent.and_then(|p| remap[p]);
                node.children = node.children.iter().filter_map(|&c| remap[c]).collect();
                node
            })
            .collect();
        self.roots = self.roots.iter().filter_map(|&r| remap[r]).collect();
    }

    /// First node in pre-order with the given name and type.
    pub fn by_name(&self, name: &str, kind: NodeType) -> Option<NodeIndex> {
        self.preorder()
            .into_iter()
            .find(|&i| self.nodes[i].kind() == kind && self.nodes[i].name == name)
    }

    /// First node in pre-order with the given id.
    pub fn by_id(&self, node_id: u16) -> Option<NodeIndex> {
        self.preorder()
            .into_iter()
            .find(|&i| self.nodes[i].node_id == node_id)
    }

    /// Smallest and largest node id in the tree; `(65535, 0)` when empty.
    pub fn minmax_node_id(&self) -> (u16, u16) {
        self.preorder()
            .into_iter()
            .fold((NO_ID, 0), |(lo, hi), i| {
                let id = self.nodes[i].node_id;
                (lo.min(id), hi.max(id))
            })
    }

    /// Evaluates every node at `t`, parents first.
    pub fn eval(&mut self, t: f32) {
        for i in self.preorder() {
            let parent = self.nodes[i].parent.map(|p| self.nodes[p].matrix);
            self.nodes[i].eval(t, parent.as_ref());
        }
    }

    /// Adds a node that was read from disk; [`NodeTree::link`] attaches it later.
    pub(crate) fn push_unlinked(&mut self, mut node: Node) {
        node.parent = None;
        node.children.clear();
        self.nodes.push(node);
    }

    /// Assigns ids to nodes that came without one and rebuilds the hierarchy from the
    /// parent ids.
    ///
    /// Explicit ids are kept, the first node holding a duplicated id owns it. Missing ids
    /// are filled with the smallest ids still free. Nodes whose parent id does not resolve,
    /// or whose parent chain loops back to them, become roots.
    pub(crate) fn link(&mut self) -> Result<()> {
        let mut ids: HashMap<u16, NodeIndex> = HashMap::new();
        let mut missing = vec![];
        for (i, node) in self.nodes.iter().enumerate() {
            if node.node_id == NO_ID {
                missing.push(i);
            } else {
                ids.entry(node.node_id).or_insert(i);
            }
        }

        let mut next: u32 = 0;
        for i in missing {
            while next < NO_ID as u32 && ids.contains_key(&(next as u16)) {
                next += 1;
            }
            if next >= NO_ID as u32 {
                return Err(Error::NodeIdsExhausted);
            }
            self.nodes[i].node_id = next as u16;
            ids.insert(next as u16, i);
            next += 1;
        }

        let parent_of: Vec<Option<NodeIndex>> = self
            .nodes
            .iter()
            .map(|n| {
                if n.parent_id == NO_ID {
                    None
                } else {
                    ids.get(&n.parent_id).copied()
                }
            })
            .collect();

        self.roots.clear();
        for node in &mut self.nodes {
            node.parent = None;
            node.children.clear();
        }
        for i in 0..self.nodes.len() {
            let parent = parent_of[i].filter(|&p| {
                // walk up from the parent; reaching `i` again means a loop
                let mut cur = Some(p);
                let mut steps = 0;
                while let Some(c) = cur {
                    if c == i {
                        return false;
                    }
                    if steps > self.nodes.len() {
                        // loops further up, not through `i`
                        return true;
                    }
                    cur = parent_of[c];
                    steps += 1;
                }
                true
            });
            match parent {
                Some(p) => {
                    self.nodes[i].parent = Some(p);
                    self.nodes[p].children.push(i);
                }
                None => self.roots.push(i),
            }
        }
        debug!("linked {} nodes, {} roots", self.nodes.len(), self.roots.len());
        Ok(())
    }

    /// Writes every reachable node depth first. Nodes without an id are written under a
    /// running counter that skips the ids other nodes already hold, and their children
    /// refer to that id.
    pub(crate) fn write<W: io::Write + io::Seek>(&self, w: &mut Writer<W>) -> Result<()> {
        let taken: HashSet<u16> = self
            .nodes
            .iter()
            .map(|n| n.node_id)
            .filter(|&id| id != NO_ID)
            .collect();
        let mut default_id = 0u16;
        let mut stack: Vec<(NodeIndex, u16)> = self.roots.iter().rev().map(|&r| (r, NO_ID)).collect();
        while let Some((i, parent_id)) = stack.pop() {
            let node = &self.nodes[i];
            let node_id = if node.kind() == NodeType::AmbientColor || node.node_id != NO_ID {
                node.node_id
            } else {
                while taken.contains(&default_id) {
                    default_id += 1;
                }
                if default_id == NO_ID {
                    return Err(Error::NodeIdsExhausted);
                }
                default_id += 1;
                default_id - 1
            };
            node.write(w, node_id, parent_id)?;
            stack.extend(node.children.iter().rev().map(|&c| (c, node_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cgmath::InnerSpace;
    use std::io::Cursor;

    fn named(kind: NodeType, name: &str, id: u16, parent: u16) -> Node {
        let mut node = Node::new(kind);
        node.name = name.to_string();
        node.node_id = id;
        node.parent_id = parent;
        node
    }

    #[test]
    fn defaults_by_type() {
        assert_eq!(Node::new(NodeType::AmbientColor).name, "$AMBIENT$");
        assert_eq!(Node::new(NodeType::MeshInstance).name, "$$$DUMMY");
        let node = Node::new(NodeType::Camera);
        assert_eq!(node.node_id, NO_ID);
        assert_eq!(node.parent_id, NO_ID);
        assert_eq!(node.matrix, matrix::identity());
    }

    #[test]
    fn camera_node_copies_camera() {
        let mut cam = Camera::new("cam").unwrap();
        cam.position = Vector3::new(1.0, 2.0, 3.0);
        cam.roll = 0.25;
        let mut node = Node::new_camera(&cam);
        node.eval(10.0, None);
        match &node.data {
            NodeData::Camera(n) => {
                assert_eq!(n.pos, cam.position);
                assert_eq!(n.fov, 45.0);
                assert_eq!(n.roll, 0.25);
            }
            _ => unreachable!(),
        }
        assert_eq!(node.matrix[3][1], 2.0);
    }

    #[test]
    fn link_assigns_lowest_free_ids() {
        let mut tree = NodeTree::new();
        tree.push_unlinked(named(NodeType::MeshInstance, "a", 1, NO_ID));
        tree.push_unlinked(named(NodeType::MeshInstance, "b", NO_ID, 1));
        tree.push_unlinked(named(NodeType::MeshInstance, "c", NO_ID, 0));
        tree.push_unlinked(named(NodeType::MeshInstance, "d", 1, NO_ID));
        tree.link().unwrap();

        let ids: Vec<u16> = tree.iter().map(|(_, n)| n.node_id).collect();
        assert_eq!(ids, vec![1, 0, 2, 1]);
        assert_eq!(tree.roots(), &[0, 3]);
        assert_eq!(tree.get(0).unwrap().children(), &[1]);
        assert_eq!(tree.get(1).unwrap().children(), &[2]);
        assert_eq!(tree.by_id(2), Some(2));
        assert_eq!(tree.by_name("c", NodeType::MeshInstance), Some(2));
        assert_eq!(tree.by_name("c", NodeType::Camera), None);
        assert_eq!(tree.minmax_node_id(), (0, 2));
    }

    #[test]
    fn loops_become_roots() {
        let mut tree = NodeTree::new();
        tree.push_unlinked(named(NodeType::MeshInstance, "a", 0, 1));
        tree.push_unlinked(named(NodeType::MeshInstance, "b", 1, 0));
        tree.push_unlinked(named(NodeType::MeshInstance, "c", 2, 2));
        tree.link().unwrap();
        assert_eq!(tree.preorder().len(), 3);
    }

    #[test]
    fn children_compose_with_parent() {
        let mut tree = NodeTree::new();
        let parent = tree.append(
            Node::new_mesh_instance(None, None, Some(Vector3::new(1.0, 0.0, 0.0)), None, None),
            None,
        );
        let child = tree.append(
            Node::new_mesh_instance(None, None, Some(Vector3::new(0.0, 2.0, 0.0)), None, None),
            Some(parent),
        );
        tree.eval(0.0);
        let m = tree.get(child).unwrap().matrix;
        assert!((m[3][0] - 1.0).abs() < 1e-6);
        assert!((m[3][1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn remove_takes_subtree_and_compacts() {
        let mut tree = NodeTree::new();
        let a = tree.append(named(NodeType::MeshInstance, "a", 0, NO_ID), None);
        let b = tree.append(named(NodeType::MeshInstance, "b", 1, 0), Some(a));
        tree.append(named(NodeType::MeshInstance, "c", 2, 1), Some(b));
        let d = tree.append(named(NodeType::MeshInstance, "d", 3, NO_ID), None);
        let e = tree.insert(named(NodeType::Camera, "e", 4, NO_ID), Some(d));
        assert_eq!(tree.roots(), &[a, e, d]);

        tree.remove(b);
        assert_eq!(tree.len(), 3);
        assert!(tree.get(0).unwrap().children().is_empty());
        assert_eq!(tree.roots(), &[0, 2, 1]);
        assert_eq!(tree.get(2).unwrap().name, "e");
    }

    #[test]
    fn node_roundtrip() {
        let mut node = Node::new_mesh_instance(
            None,
            Some("box.1"),
            Some(Vector3::new(1.0, 2.0, 3.0)),
            None,
            Some([0.0, 0.0, 1.0, 0.5]),
        );
        node.name = "box".into();
        node.flags = Node::SHOW_PATH;
        if let NodeData::MeshInstance(n) = &mut node.data {
            n.pivot = Vector3::new(0.5, 0.5, 0.5);
            n.bbox_max = Vector3::new(1.0, 1.0, 1.0);
            n.morph_smooth = 30.0;
        }

        let mut w = Writer::new(Cursor::new(vec![]));
        node.write(&mut w, 7, 3).unwrap();
        let data = w.into_inner().into_inner();

        let mut back = Node::new(NodeType::MeshInstance);
        let mut r = Reader::new(&data);
        back.read(&mut r).unwrap();
        assert!(r.warnings().is_empty());
        assert_eq!(back.node_id, 7);
        assert_eq!(back.parent_id, 3);
        back.node_id = node.node_id;
        back.parent_id = node.parent_id;
        assert_eq!(back, node);

        back.eval(0.0, None);
        if let NodeData::MeshInstance(n) = &back.data {
            assert!((n.rot.magnitude() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn tracks_on_foreign_nodes_are_skipped() {
        let mut w = Writer::new(Cursor::new(vec![]));
        write_chunk(&mut w, tag::TARGET_NODE_TAG, |w| {
            write_chunk(w, tag::FOV_TRACK_TAG, |w| {
                Track::new(TrackType::Float).write(w)
            })
        })
        .unwrap();
        let data = w.into_inner().into_inner();
        let mut node = Node::new(NodeType::CameraTarget);
        let mut r = Reader::new(&data);
        node.read(&mut r).unwrap();
        assert_eq!(r.warnings().len(), 1);
        assert_eq!(r.tell(), data.len() as u64);
    }
}
