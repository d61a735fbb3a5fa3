//! The in-memory indexed mesh model produced by [`crate::import::Importer`] and consumed by
//! [`crate::export::Exporter`].
//!
//! Every cross-reference between these types (face to vertex group, material range to face) is
//! stored as a plain index into the owning [`Model`]'s tables rather than as a pointer or
//! reference, so the whole graph stays `'static` and trivially cloneable.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2-component float tuple, used for texture coordinates.
pub type Vec2 = (f32, f32);
/// A 3-component float tuple, used for positions, normals and colors.
pub type Vec3 = (f32, f32, f32);

fn vec3_min(a: Vec3, b: Vec3) -> Vec3 {
    (a.0.min(b.0), a.1.min(b.1), a.2.min(b.2))
}

fn vec3_max(a: Vec3, b: Vec3) -> Vec3 {
    (a.0.max(b.0), a.1.max(b.1), a.2.max(b.2))
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    /// An AABB that contains nothing; the first call to [`AABB::grow`] replaces both corners.
    pub fn empty() -> Self {
        AABB {
            min: (f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: (f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn grow(&mut self, point: Vec3) {
        self.min = vec3_min(self.min, point);
        self.max = vec3_max(self.max, point);
    }
}

/// A fully resolved vertex: a position plus the texture coordinate and normal it was paired
/// with on import. Two vertices are equal iff all three fields are equal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    pub pos: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
}

impl Default for Vertex {
    fn default() -> Self {
        Vertex {
            pos: (0.0, 0.0, 0.0),
            uv: (0.0, 0.0),
            normal: (0.0, 0.0, 0.0),
        }
    }
}

/// The set of distinct full [`Vertex`] values that share one source position. Every vertex in
/// a model belongs to exactly one group, and every vertex referenced by a group shares that
/// group's position.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexGroup {
    pub vertices: Vec<u32>,
    pub faces: Vec<u32>,
}

/// One corner of a polygon: an index into the model's vertex-group table and an index into
/// the model's vertex table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FaceVertex {
    pub group_id: u32,
    pub vertex_id: u32,
}

/// A polygon, stored as its face-vertex corners in source order plus the slice of the model's
/// triangulated index buffer it produced.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Face {
    pub vertices: Vec<FaceVertex>,
    /// Newell-method polygon normal.
    pub normal: Vec3,
    /// Offset of this face's triangles in the owning model's `indices`.
    pub first_vertex: u32,
    /// Number of indices (always a multiple of 3) this face contributed.
    pub count: u32,
}

/// One indexed mesh: a deduplicated vertex table, the faces that reference it, the
/// concatenated triangle index buffer, and the position-based vertex-group table.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Model {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub indices: Vec<u32>,
    pub vertex_groups: Vec<VertexGroup>,
    pub aabb: AABB,
    pub group_count: u32,
}

impl Default for AABB {
    fn default() -> Self {
        AABB::empty()
    }
}

/// Owns a single [`Model`]. This is the metadata block attached to every imported [`Object`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    pub model: Model,
}

/// A contiguous, duplicate-free, sorted subset of an object's faces that share one material.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaterialRange {
    pub mat_id: u64,
    pub faces: Vec<u32>,
}

/// `{id, name, assignments}` created during import and consulted during export. `assignments`
/// records which objects reference this material, kept as one authoritative list shared by
/// every place that mutates it (see the material binder's notes on this).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaterialInfo {
    pub id: u64,
    pub name: String,
    pub assignments: Vec<u64>,
}

/// The sum type of metadata blocks an [`Object`] can carry. OBJ import only ever produces
/// `Mesh` and `MaterialRange` blocks; `MaterialInfo` lives in the importer's material table,
/// not on individual objects.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObjectMeta {
    Mesh(Mesh),
    MaterialRange(MaterialRange),
}

/// A named group of faces. Corresponds to one OBJ `g`/`o` group (the distinction between the
/// two tags is not preserved; both produce an `Object`).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Object {
    pub id: u64,
    pub name: String,
    pub meta: Vec<ObjectMeta>,
}

impl Object {
    pub fn mesh(&self) -> Option<&Mesh> {
        self.meta.iter().find_map(|m| match m {
            ObjectMeta::Mesh(mesh) => Some(mesh),
            _ => None,
        })
    }

    pub fn material_ranges(&self) -> impl Iterator<Item = &MaterialRange> {
        self.meta.iter().filter_map(|m| match m {
            ObjectMeta::MaterialRange(range) => Some(range),
            _ => None,
        })
    }
}

/// A texture file referenced by one or more materials. Pixel decoding is out of scope; only
/// the path used to read or copy the file on import/export is tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextureAsset {
    pub path: String,
}

/// A single texture slot attached to a [`Material`] (`map_Kd`, `bump`, `norm`, ...).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextureOption {
    pub path: String,
    pub blendu: bool,
    pub blendv: bool,
    pub boost: f32,
    pub mm: Vec2,
    pub offset: Vec3,
    pub scale: Vec3,
    pub turbulence: Vec3,
    pub resolution: Option<i32>,
    pub clamp: bool,
    pub bump_intensity: f32,
    pub imfchan: Option<char>,
    pub kind: Option<String>,
}

impl Default for TextureOption {
    fn default() -> Self {
        TextureOption {
            path: String::new(),
            blendu: true,
            blendv: true,
            boost: 0.0,
            mm: (0.0, 1.0),
            offset: (0.0, 0.0, 0.0),
            scale: (1.0, 1.0, 1.0),
            turbulence: (0.0, 0.0, 0.0),
            resolution: None,
            clamp: false,
            bump_intensity: 1.0,
            imfchan: None,
            kind: None,
        }
    }
}

/// The classical OBJ/MTL attributes plus the PBR extensions and texture slots.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    pub name: String,

    pub ka: Option<Vec3>,
    pub kd: Option<Vec3>,
    pub ks: Option<Vec3>,
    pub tf: Option<Vec3>,
    pub ns: Option<f32>,
    pub ni: Option<f32>,
    pub d: Option<f32>,
    pub tr: Option<f32>,
    pub illum: Option<i32>,

    // PBR extensions
    pub pr: Option<f32>,
    pub pm: Option<f32>,
    pub ps: Option<f32>,
    pub ke: Option<Vec3>,
    pub pc: Option<f32>,
    pub pcr: Option<f32>,
    pub aniso: Option<f32>,
    pub anisor: Option<f32>,

    pub map_ka: Option<TextureOption>,
    pub map_kd: Option<TextureOption>,
    pub map_ks: Option<TextureOption>,
    pub map_ns: Option<TextureOption>,
    pub map_d: Option<TextureOption>,
    pub map_tr: Option<TextureOption>,
    pub bump: Option<TextureOption>,
    pub disp: Option<TextureOption>,
    pub decal: Option<TextureOption>,
    pub refl: Option<TextureOption>,

    pub map_pr: Option<TextureOption>,
    pub map_pm: Option<TextureOption>,
    pub map_ps: Option<TextureOption>,
    pub map_ke: Option<TextureOption>,
    pub norm: Option<TextureOption>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_grows_to_contain_points() {
        let mut aabb = AABB::empty();
        aabb.grow((1.0, -2.0, 3.0));
        aabb.grow((-1.0, 5.0, 0.0));
        assert_eq!(aabb.min, (-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, (1.0, 5.0, 3.0));
    }

    #[test]
    fn object_mesh_and_ranges_are_pulled_from_meta() {
        let object = Object {
            id: 1,
            name: "cube".into(),
            meta: vec![
                ObjectMeta::Mesh(Mesh::default()),
                ObjectMeta::MaterialRange(MaterialRange {
                    mat_id: 7,
                    faces: vec![0, 1],
                }),
            ],
        };
        assert!(object.mesh().is_some());
        assert_eq!(object.material_ranges().count(), 1);
    }
}
