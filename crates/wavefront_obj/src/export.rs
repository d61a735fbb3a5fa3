//! Writes a semantically equivalent OBJ+MTL pair back from an indexed scene: deduplicated
//! position/uv/normal tables, per-object grouping, face-range material assignments, and the
//! companion MTL file.

use crate::error::Error;
use crate::flags::{MaterialExportFlags, MeshExportFlags, ObjExportFlags, ObjectPolicy};
use crate::model::{Material, MaterialInfo, Model, TextureAsset, TextureOption, Vec2, Vec3};
use crate::model::Object;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Exporter {
    pub path: PathBuf,
    pub mesh_flags: MeshExportFlags,
    pub material_flags: MaterialExportFlags,
    pub obj_flags: ObjExportFlags,
    pub objects: Vec<Object>,
    pub materials: Vec<(MaterialInfo, Material)>,
    pub textures: Vec<TextureAsset>,
}

impl Exporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Exporter {
            path: path.into(),
            mesh_flags: MeshExportFlags::NONE,
            material_flags: MaterialExportFlags::NONE,
            obj_flags: ObjExportFlags::default(),
            objects: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.materials.clear();
        self.textures.clear();
    }

    pub fn save(&self) -> Result<(), Error> {
        let export_uv = self.mesh_flags.contains(MeshExportFlags::EXPORT_UV);
        let export_normals = self.mesh_flags.contains(MeshExportFlags::EXPORT_NORMALS);
        let triangulated = self.mesh_flags.contains(MeshExportFlags::EXPORT_TRIANGULATED);
        let write_mtl = self.material_flags != MaterialExportFlags::NONE && !self.materials.is_empty();

        let mtl_path = self.path.with_extension("mtl");
        let mat_name_by_id: HashMap<u64, String> = self
            .materials
            .iter()
            .map(|(info, _)| (info.id, info.name.clone()))
            .collect();

        let body = self.build_obj(export_uv, export_normals, triangulated, write_mtl, &mtl_path, &mat_name_by_id);
        fs::write(&self.path, body).map_err(|source| Error::WriteError {
            path: self.path.clone(),
            source,
        })?;

        if write_mtl {
            let body = self.build_mtl()?;
            fs::write(&mtl_path, body).map_err(|source| Error::WriteError {
                path: mtl_path.clone(),
                source,
            })?;
        }

        Ok(())
    }

    fn build_obj(
        &self,
        export_uv: bool,
        export_normals: bool,
        triangulated: bool,
        write_mtl: bool,
        mtl_path: &Path,
        mat_name_by_id: &HashMap<u64, String>,
    ) -> String {
        let mut out = String::new();
        out.push_str("# exported by wavefront_obj\n");
        if write_mtl {
            if let Some(name) = mtl_path.file_name() {
                out.push_str(&format!("mtllib ./{}\n", name.to_string_lossy()));
            }
        }

        // Per-object vertex position/uv/normal transforms run in parallel; the merge into a
        // single deduplicated table happens sequentially below so the result is deterministic.
        struct ObjectVertexData {
            positions: Vec<Vec3>,
            uvs: Vec<Vec2>,
            normals: Vec<Vec3>,
        }
        let per_object: Vec<ObjectVertexData> = self
            .objects
            .par_iter()
            .map(|object| match object.mesh() {
                Some(mesh) => ObjectVertexData {
                    positions: mesh
                        .model
                        .vertices
                        .iter()
                        .map(|v| transform_position(v.pos, self.mesh_flags))
                        .collect(),
                    uvs: mesh.model.vertices.iter().map(|v| v.uv).collect(),
                    normals: mesh.model.vertices.iter().map(|v| v.normal).collect(),
                },
                None => ObjectVertexData {
                    positions: Vec::new(),
                    uvs: Vec::new(),
                    normals: Vec::new(),
                },
            })
            .collect();

        let mut tables = Tables::default();
        let mut vertex_refs: Vec<Vec<(u32, u32, u32)>> = Vec::with_capacity(per_object.len());
        for data in &per_object {
            let mut refs = Vec::with_capacity(data.positions.len());
            for i in 0..data.positions.len() {
                let pos = tables.insert_pos(data.positions[i]);
                let uv = tables.insert_uv(data.uvs[i]);
                let normal = tables.insert_normal(data.normals[i]);
                refs.push((pos, uv, normal));
            }
            vertex_refs.push(refs);
        }

        for p in &tables.positions {
            out.push_str(&format!("v {} {} {}\n", p.0, p.1, p.2));
        }
        if export_uv {
            for uv in &tables.uvs {
                out.push_str(&format!("vt {} {}\n", uv.0, uv.1));
            }
        }
        if export_normals {
            for n in &tables.normals {
                out.push_str(&format!("vn {} {} {}\n", n.0, n.1, n.2));
            }
        }

        for (oi, object) in self.objects.iter().enumerate() {
            match self.obj_flags.object_policy.0 {
                ObjectPolicy::Groups => out.push_str(&format!("g {}\n", object.name)),
                ObjectPolicy::Objects => out.push_str(&format!("o {}\n", object.name)),
                ObjectPolicy::Default => {}
            }
            let Some(mesh) = object.mesh() else { continue };
            let refs = &vertex_refs[oi];
            let ranges: Vec<_> = object.material_ranges().collect();

            if ranges.is_empty() {
                if write_mtl {
                    out.push_str("usemtl default\n");
                }
                for face_idx in 0..mesh.model.faces.len() {
                    emit_face(&mut out, &mesh.model, refs, face_idx, triangulated, export_uv, export_normals);
                }
            } else {
                for range in ranges {
                    if write_mtl {
                        let name = mat_name_by_id.get(&range.mat_id).cloned().unwrap_or_else(|| "default".to_string());
                        out.push_str(&format!("usemtl {name}\n"));
                    }
                    for &face_idx in &range.faces {
                        emit_face(&mut out, &mesh.model, refs, face_idx as usize, triangulated, export_uv, export_normals);
                    }
                }
            }
        }

        out
    }

    fn build_mtl(&self) -> Result<String, Error> {
        let mut out = String::new();
        let write_textures = !self.material_flags.contains(MaterialExportFlags::TEXTURE_NONE);
        for (_, material) in &self.materials {
            out.push_str(&format!("newmtl {}\n", material.name));
            write_color(&mut out, "Ka", material.ka);
            write_color(&mut out, "Kd", material.kd);
            write_color(&mut out, "Ks", material.ks);
            write_color(&mut out, "Tf", material.tf);
            write_color(&mut out, "Ke", material.ke);
            write_scalar(&mut out, "Ns", material.ns);
            write_scalar(&mut out, "Ni", material.ni);
            write_scalar(&mut out, "d", material.d);
            write_scalar(&mut out, "Tr", material.tr);
            if let Some(illum) = material.illum {
                out.push_str(&format!("illum {illum}\n"));
            }
            if self.obj_flags.materials_pbr {
                write_scalar(&mut out, "Pr", material.pr);
                write_scalar(&mut out, "Pm", material.pm);
                write_scalar(&mut out, "Ps", material.ps);
                write_scalar(&mut out, "Pc", material.pc);
                write_scalar(&mut out, "Pcr", material.pcr);
                write_scalar(&mut out, "aniso", material.aniso);
                write_scalar(&mut out, "anisor", material.anisor);
            }

            if write_textures {
                self.write_texture(&mut out, "map_Ka", &material.map_ka)?;
                self.write_texture(&mut out, "map_Kd", &material.map_kd)?;
                self.write_texture(&mut out, "map_Ks", &material.map_ks)?;
                self.write_texture(&mut out, "map_Ns", &material.map_ns)?;
                self.write_texture(&mut out, "map_d", &material.map_d)?;
                self.write_texture(&mut out, "map_Tr", &material.map_tr)?;
                self.write_texture(&mut out, "bump", &material.bump)?;
                self.write_texture(&mut out, "disp", &material.disp)?;
                self.write_texture(&mut out, "decal", &material.decal)?;
                self.write_texture(&mut out, "refl", &material.refl)?;
                if self.obj_flags.materials_pbr {
                    self.write_texture(&mut out, "map_Pr", &material.map_pr)?;
                    self.write_texture(&mut out, "map_Pm", &material.map_pm)?;
                    self.write_texture(&mut out, "map_Ps", &material.map_ps)?;
                    self.write_texture(&mut out, "map_Ke", &material.map_ke)?;
                    self.write_texture(&mut out, "norm", &material.norm)?;
                }
            }
        }
        Ok(out)
    }

    fn write_texture(&self, out: &mut String, key: &str, option: &Option<TextureOption>) -> Result<(), Error> {
        let Some(option) = option else { return Ok(()) };
        let path = self.resolve_texture_path(option)?;

        let mut line = String::from(key);
        if !option.blendu {
            line.push_str(" -blendu off");
        }
        if !option.blendv {
            line.push_str(" -blendv off");
        }
        if option.boost != 0.0 {
            line.push_str(&format!(" -boost {}", option.boost));
        }
        if option.mm != (0.0, 1.0) {
            line.push_str(&format!(" -mm {} {}", option.mm.0, option.mm.1));
        }
        if option.offset != (0.0, 0.0, 0.0) {
            line.push_str(&format!(" -o {} {} {}", option.offset.0, option.offset.1, option.offset.2));
        }
        if option.scale != (1.0, 1.0, 1.0) {
            line.push_str(&format!(" -s {} {} {}", option.scale.0, option.scale.1, option.scale.2));
        }
        if option.turbulence != (0.0, 0.0, 0.0) {
            line.push_str(&format!(
                " -t {} {} {}",
                option.turbulence.0, option.turbulence.1, option.turbulence.2
            ));
        }
        if let Some(resolution) = option.resolution {
            line.push_str(&format!(" -texres {resolution}"));
        }
        if option.clamp {
            line.push_str(" -clamp on");
        }
        if option.bump_intensity != 1.0 {
            line.push_str(&format!(" -bm {}", option.bump_intensity));
        }
        if let Some(channel) = option.imfchan {
            line.push_str(&format!(" -imfchan {channel}"));
        }
        if let Some(kind) = &option.kind {
            line.push_str(&format!(" -type {kind}"));
        }
        line.push(' ');
        line.push_str(&path);
        line.push('\n');
        out.push_str(&line);
        Ok(())
    }

    fn resolve_texture_path(&self, option: &TextureOption) -> Result<String, Error> {
        if self.material_flags.contains(MaterialExportFlags::TEXTURE_COPY_TO_LOCAL) {
            let tex_dir = self.path.parent().unwrap_or_else(|| Path::new(".")).join("tex");
            fs::create_dir_all(&tex_dir).map_err(|source| Error::WriteError {
                path: tex_dir.clone(),
                source,
            })?;
            let source_path = Path::new(&option.path);
            let file_name = source_path.file_name().unwrap_or_else(|| source_path.as_os_str());
            let dest = tex_dir.join(file_name);
            fs::copy(source_path, &dest).map_err(|source| Error::ReadError {
                path: source_path.to_path_buf(),
                source,
            })?;
            Ok(format!("tex/{}", file_name.to_string_lossy()))
        } else {
            Ok(option.path.clone())
        }
    }
}

#[derive(Default)]
struct Tables {
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    pos_index: HashMap<(u32, u32, u32), u32>,
    uv_index: HashMap<(u32, u32), u32>,
    normal_index: HashMap<(u32, u32, u32), u32>,
}

impl Tables {
    fn insert_pos(&mut self, p: Vec3) -> u32 {
        let key = (p.0.to_bits(), p.1.to_bits(), p.2.to_bits());
        if let Some(&idx) = self.pos_index.get(&key) {
            return idx;
        }
        self.positions.push(p);
        let idx = self.positions.len() as u32;
        self.pos_index.insert(key, idx);
        idx
    }

    fn insert_uv(&mut self, uv: Vec2) -> u32 {
        let key = (uv.0.to_bits(), uv.1.to_bits());
        if let Some(&idx) = self.uv_index.get(&key) {
            return idx;
        }
        self.uvs.push(uv);
        let idx = self.uvs.len() as u32;
        self.uv_index.insert(key, idx);
        idx
    }

    fn insert_normal(&mut self, n: Vec3) -> u32 {
        let key = (n.0.to_bits(), n.1.to_bits(), n.2.to_bits());
        if let Some(&idx) = self.normal_index.get(&key) {
            return idx;
        }
        self.normals.push(n);
        let idx = self.normals.len() as u32;
        self.normal_index.insert(key, idx);
        idx
    }
}

fn transform_position(pos: Vec3, flags: MeshExportFlags) -> Vec3 {
    let mut p = pos;
    if flags.contains(MeshExportFlags::TRANSFORM_REVERSE_X) {
        p.0 = -p.0;
    }
    if flags.contains(MeshExportFlags::TRANSFORM_REVERSE_Y) {
        p.1 = -p.1;
    }
    if flags.contains(MeshExportFlags::TRANSFORM_REVERSE_Z) {
        p.2 = -p.2;
    }
    if flags.contains(MeshExportFlags::TRANSFORM_SWAP_XY) {
        p = (p.1, p.0, p.2);
    }
    if flags.contains(MeshExportFlags::TRANSFORM_SWAP_XZ) {
        p = (p.2, p.1, p.0);
    }
    if flags.contains(MeshExportFlags::TRANSFORM_SWAP_YZ) {
        p = (p.0, p.2, p.1);
    }
    p
}

fn write_scalar(out: &mut String, key: &str, value: Option<f32>) {
    if let Some(v) = value {
        out.push_str(&format!("{key} {v}\n"));
    }
}

fn write_color(out: &mut String, key: &str, value: Option<Vec3>) {
    if let Some(v) = value {
        out.push_str(&format!("{key} {} {} {}\n", v.0, v.1, v.2));
    }
}

fn write_vertex_ref(out: &mut String, refs: (u32, u32, u32), export_uv: bool, export_normals: bool) {
    let (pos, uv, normal) = refs;
    out.push_str(&pos.to_string());
    if export_uv {
        out.push('/');
        out.push_str(&uv.to_string());
    }
    if export_normals {
        if !export_uv {
            out.push('/');
        }
        out.push('/');
        out.push_str(&normal.to_string());
    }
}

fn emit_face(
    out: &mut String,
    model: &Model,
    refs: &[(u32, u32, u32)],
    face_idx: usize,
    triangulated: bool,
    export_uv: bool,
    export_normals: bool,
) {
    let Some(face) = model.faces.get(face_idx) else { return };
    if triangulated {
        let start = face.first_vertex as usize;
        let end = start + face.count as usize;
        for tri in model.indices[start..end].chunks(3) {
            out.push_str("f");
            for &vid in tri {
                out.push(' ');
                write_vertex_ref(out, refs[vid as usize], export_uv, export_normals);
            }
            out.push('\n');
        }
    } else {
        out.push_str("f");
        for fv in &face.vertices {
            out.push(' ');
            write_vertex_ref(out, refs[fv.vertex_id as usize], export_uv, export_normals);
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Face, FaceVertex, Mesh, Vertex, VertexGroup, AABB};

    fn quad_object() -> Object {
        let vertices = vec![
            Vertex { pos: (0.0, 0.0, 0.0), uv: (0.0, 0.0), normal: (0.0, 0.0, 1.0) },
            Vertex { pos: (1.0, 0.0, 0.0), uv: (1.0, 0.0), normal: (0.0, 0.0, 1.0) },
            Vertex { pos: (1.0, 1.0, 0.0), uv: (1.0, 1.0), normal: (0.0, 0.0, 1.0) },
            Vertex { pos: (0.0, 1.0, 0.0), uv: (0.0, 1.0), normal: (0.0, 0.0, 1.0) },
        ];
        let face = Face {
            vertices: vec![
                FaceVertex { group_id: 0, vertex_id: 0 },
                FaceVertex { group_id: 1, vertex_id: 1 },
                FaceVertex { group_id: 2, vertex_id: 2 },
                FaceVertex { group_id: 3, vertex_id: 3 },
            ],
            normal: (0.0, 0.0, 1.0),
            first_vertex: 0,
            count: 6,
        };
        let model = Model {
            vertices,
            faces: vec![face],
            indices: vec![0, 1, 2, 0, 2, 3],
            vertex_groups: vec![VertexGroup::default(); 4],
            aabb: AABB { min: (0.0, 0.0, 0.0), max: (1.0, 1.0, 0.0) },
            group_count: 4,
        };
        Object {
            id: 1,
            name: "quad".to_string(),
            meta: vec![crate::model::ObjectMeta::Mesh(Mesh { model })],
        }
    }

    #[test]
    fn standard_export_writes_one_face_statement() {
        let exporter = Exporter {
            path: PathBuf::from("/tmp/does-not-matter.obj"),
            mesh_flags: MeshExportFlags::EXPORT_UV | MeshExportFlags::EXPORT_NORMALS,
            material_flags: MaterialExportFlags::NONE,
            obj_flags: ObjExportFlags::default(),
            objects: vec![quad_object()],
            materials: Vec::new(),
            textures: Vec::new(),
        };
        let body = exporter.build_obj(true, true, false, false, Path::new("x.mtl"), &HashMap::new());
        assert_eq!(body.lines().filter(|l| l.starts_with("f ")).count(), 1);
        assert!(body.contains("f 1/1/1 2/2/2 3/3/3 4/4/4"));
    }

    #[test]
    fn triangulated_export_writes_two_faces() {
        let exporter = Exporter {
            path: PathBuf::from("/tmp/does-not-matter.obj"),
            mesh_flags: MeshExportFlags::EXPORT_NORMALS | MeshExportFlags::EXPORT_TRIANGULATED,
            material_flags: MaterialExportFlags::NONE,
            obj_flags: ObjExportFlags::default(),
            objects: vec![quad_object()],
            materials: Vec::new(),
            textures: Vec::new(),
        };
        let body = exporter.build_obj(false, true, true, false, Path::new("x.mtl"), &HashMap::new());
        assert_eq!(body.lines().filter(|l| l.starts_with("f ")).count(), 2);
    }

    #[test]
    fn transform_applies_reverses_then_swaps() {
        let flags = MeshExportFlags::TRANSFORM_REVERSE_X | MeshExportFlags::TRANSFORM_SWAP_XY;
        let transformed = transform_position((1.0, 2.0, 3.0), flags);
        // reverseX: (-1, 2, 3); swapXY: (2, -1, 3)
        assert_eq!(transformed, (2.0, -1.0, 3.0));
    }

    fn pbr_material() -> Material {
        Material {
            name: "m".to_string(),
            kd: Some((1.0, 1.0, 1.0)),
            pr: Some(0.4),
            pm: Some(0.1),
            ..Material::default()
        }
    }

    #[test]
    fn materials_pbr_flag_gates_pbr_keys() {
        let mut exporter = Exporter {
            path: PathBuf::from("/tmp/does-not-matter.mtl"),
            mesh_flags: MeshExportFlags::NONE,
            material_flags: MaterialExportFlags::NONE,
            obj_flags: ObjExportFlags::default(),
            objects: Vec::new(),
            materials: vec![(MaterialInfo::default(), pbr_material())],
            textures: Vec::new(),
        };
        let without_pbr = exporter.build_mtl().unwrap();
        assert!(without_pbr.contains("Kd "));
        assert!(!without_pbr.contains("Pr "));
        assert!(!without_pbr.contains("Pm "));

        exporter.obj_flags.materials_pbr = true;
        let with_pbr = exporter.build_mtl().unwrap();
        assert!(with_pbr.contains("Pr "));
        assert!(with_pbr.contains("Pm "));
    }
}
