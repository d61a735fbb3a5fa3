//! # A Wavefront OBJ/MTL scene importer and exporter
//! Converts between the textual OBJ/MTL format and an in-memory indexed mesh model. The
//! low-level tokenizers, indexer and emitter live in [`wavefront_obj`]; this crate re-exports
//! the pieces most callers need under one name.
//!
//! # Examples
//! ```no_run
//! let mut importer = wavefront_scene::Importer::new("scene.obj");
//! assert_eq!(importer.load(), wavefront_scene::ReadState::Success);
//!
//! for object in importer.objects() {
//!     let name = &object.name;
//!     let mesh = object.mesh().unwrap();
//!     let vertex_count = mesh.model.vertices.len();
//!     let face_count = mesh.model.faces.len();
//!     println!("{name}: {vertex_count} vertices, {face_count} faces");
//! }
//! ```

pub use wavefront_obj::error::Error;
pub use wavefront_obj::export::Exporter;
pub use wavefront_obj::flags::{MaterialExportFlags, MeshExportFlags, ObjExportFlags};
pub use wavefront_obj::import::{Importer, MaterialState, ReadState};
pub use wavefront_obj::model::{
    Face, FaceVertex, Material, MaterialInfo, MaterialRange, Mesh, Model, Object, ObjectMeta,
    TextureAsset, TextureOption, Vec2, Vec3, Vertex, VertexGroup, AABB,
};
