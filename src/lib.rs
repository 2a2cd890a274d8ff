//! Reader and writer for Autodesk 3D Studio `.3ds` files, with keyframe evaluation.
//!
//! ```no_run
//! let mut file = lib3ds::File::open("scene.3ds")?;
//! file.eval(0.0);
//! for mesh in &file.meshes {
//!     println!("{} has {} faces", mesh.name, mesh.faces.len());
//! }
//! # Ok::<(), lib3ds::Error>(())
//! ```

pub mod atmosphere;
pub mod background;
pub mod camera;
pub mod chunk;
pub mod error;
pub mod file;
pub mod io;
pub mod light;
pub mod material;
pub mod math;
pub mod mesh;
pub mod node;
pub mod object;
pub mod shadow;
pub mod track;
pub mod viewport;

pub use camera::Camera;
pub use error::{Error, Result, Warning};
pub use file::File;
pub use io::{Reader, Writer};
pub use light::Light;
pub use material::{Material, TextureMap};
pub use mesh::{Face, Mesh};
pub use node::{Node, NodeData, NodeIndex, NodeTree, NodeType};
pub use track::{Key, Track, TrackType, TrackValue};
