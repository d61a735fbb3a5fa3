//! Turns the ordered `v`/`vt`/`vn`/`g`/`f` event streams from the OBJ tokenizer into one
//! indexed [`Model`] per group, each wrapped in an [`Object`].

use crate::math::newell_normal;
use crate::model::{Face, FaceVertex, Mesh, Model, Object, ObjectMeta, Vec3, VertexGroup};
use crate::model::Vertex;
use crate::parser::obj::{FaceIndex, ObjEvent, ObjToken};
use crate::triangulate::triangulate;
use std::collections::HashMap;
use std::ops::Range;

/// Monotonically increasing id generator for newly created objects.
#[derive(Debug, Default)]
pub struct IdGen(u64);

impl IdGen {
    pub fn new() -> Self {
        IdGen(0)
    }

    pub fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

/// The object id, group name, and the slice of the original (sorted) face-event list that one
/// source group covers. Used by the material binder to translate `usemtl` line ranges into
/// object-local face ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupInfo {
    pub object_id: u64,
    pub name: String,
    pub face_range: Range<usize>,
}

#[derive(Debug, Default)]
pub struct IndexedScene {
    pub objects: Vec<Object>,
    pub groups: Vec<GroupInfo>,
}

fn resolve_index(raw: i32, table_len: usize) -> u32 {
    if raw < 0 {
        (table_len as i64 + raw as i64) as u32
    } else {
        (raw - 1) as u32
    }
}

fn resolve_face_vertex(
    fi: &FaceIndex,
    v_len: usize,
    vt_len: usize,
    vn_len: usize,
) -> (u32, Option<u32>, Option<u32>) {
    (
        resolve_index(fi.v, v_len),
        fi.vt.map(|raw| resolve_index(raw, vt_len)),
        fi.vn.map(|raw| resolve_index(raw, vn_len)),
    )
}

/// Builds the `[name, line_start, line_end)` ranges a group covers, inserting an implicit
/// `"default"` group when faces precede the first explicit `g`/`o`, or when there are no
/// explicit groups at all.
fn compute_group_ranges(
    groups: &[(usize, String)],
    first_face_line: Option<usize>,
) -> Vec<(String, usize, usize)> {
    let mut ranges = Vec::new();
    let first_group_line = groups.first().map(|(line, _)| *line);
    let needs_default = match (first_group_line, first_face_line) {
        (None, Some(_)) => true,
        (Some(group_line), Some(face_line)) => face_line < group_line,
        _ => false,
    };
    if needs_default {
        ranges.push(("default".to_string(), 0, first_group_line.unwrap_or(usize::MAX)));
    }
    for (i, (line, name)) in groups.iter().enumerate() {
        let end = groups.get(i + 1).map(|(l, _)| *l).unwrap_or(usize::MAX);
        ranges.push((name.clone(), *line, end));
    }
    ranges
}

/// Per-group dedup state. Position-to-group assignment, and either a triple-keyed or a
/// position-group-scoped dedup table, depending on whether the source defines any normals.
struct GroupIndexer<'a> {
    positions: &'a [Vec3],
    texcoords: &'a [crate::model::Vec2],
    normals: &'a [Vec3],
    has_normals: bool,
    model: Model,
    pos_to_group_id: Vec<i64>,
    dedup_triple: HashMap<(i32, i32, i32), u32>,
    dedup_group_uv: HashMap<(u32, i32), u32>,
}

impl<'a> GroupIndexer<'a> {
    fn new(
        positions: &'a [Vec3],
        texcoords: &'a [crate::model::Vec2],
        normals: &'a [Vec3],
        has_normals: bool,
    ) -> Self {
        GroupIndexer {
            positions,
            texcoords,
            normals,
            has_normals,
            model: Model::default(),
            pos_to_group_id: vec![-1; positions.len()],
            dedup_triple: HashMap::new(),
            dedup_group_uv: HashMap::new(),
        }
    }

    fn resolve_group(&mut self, vi: u32) -> u32 {
        match self.pos_to_group_id[vi as usize] {
            -1 => {
                let new_id = self.model.vertex_groups.len() as u32;
                self.model.vertex_groups.push(VertexGroup::default());
                self.pos_to_group_id[vi as usize] = new_id as i64;
                new_id
            }
            existing => existing as u32,
        }
    }

    fn add_vertex(&mut self, vi: u32, vti: Option<u32>, vni: Option<u32>) -> FaceVertex {
        let group_id = self.resolve_group(vi);
        let vti_key = vti.map(|x| x as i32).unwrap_or(-1);

        let existing = if self.has_normals {
            let vni_key = vni.map(|x| x as i32).unwrap_or(-1);
            self.dedup_triple.get(&(vi as i32, vti_key, vni_key)).copied()
        } else {
            self.dedup_group_uv.get(&(group_id, vti_key)).copied()
        };

        let vertex_id = match existing {
            Some(id) => id,
            None => {
                let pos = self.positions[vi as usize];
                let uv = vti.map(|i| self.texcoords[i as usize]).unwrap_or((0.0, 0.0));
                let normal = if self.has_normals {
                    vni.map(|i| self.normals[i as usize]).unwrap_or((0.0, 0.0, 0.0))
                } else {
                    (0.0, 0.0, 0.0)
                };
                let new_id = self.model.vertices.len() as u32;
                self.model.vertices.push(Vertex { pos, uv, normal });
                self.model.aabb.grow(pos);
                self.model.vertex_groups[group_id as usize].vertices.push(new_id);
                if self.has_normals {
                    let vni_key = vni.map(|x| x as i32).unwrap_or(-1);
                    self.dedup_triple.insert((vi as i32, vti_key, vni_key), new_id);
                } else {
                    self.dedup_group_uv.insert((group_id, vti_key), new_id);
                }
                new_id
            }
        };
        FaceVertex { group_id, vertex_id }
    }
}

/// Indexes the whole event stream into one `Mesh`-carrying [`Object`] per group.
pub fn index_geometry(tokens: &[ObjToken]) -> IndexedScene {
    let positions: Vec<Vec3> = tokens
        .iter()
        .filter_map(|t| match &t.event {
            ObjEvent::Position(p) => Some(*p),
            _ => None,
        })
        .collect();
    let texcoords: Vec<crate::model::Vec2> = tokens
        .iter()
        .filter_map(|t| match &t.event {
            ObjEvent::TexCoord(uv) => Some(*uv),
            _ => None,
        })
        .collect();
    let normals: Vec<Vec3> = tokens
        .iter()
        .filter_map(|t| match &t.event {
            ObjEvent::Normal(n) => Some(*n),
            _ => None,
        })
        .collect();
    let groups: Vec<(usize, String)> = tokens
        .iter()
        .filter_map(|t| match &t.event {
            ObjEvent::Group(name) => Some((t.line_index, name.clone())),
            _ => None,
        })
        .collect();
    let faces: Vec<(usize, &Vec<FaceIndex>)> = tokens
        .iter()
        .filter_map(|t| match &t.event {
            ObjEvent::Face(f) => Some((t.line_index, f)),
            _ => None,
        })
        .collect();

    let has_normals = !normals.is_empty();
    let group_ranges = compute_group_ranges(&groups, faces.first().map(|(line, _)| *line));

    let mut group_face_indices: Vec<Vec<usize>> = vec![Vec::new(); group_ranges.len()];
    for (face_idx, (line, _)) in faces.iter().enumerate() {
        if let Some(gi) = group_ranges
            .iter()
            .position(|(_, start, end)| *line >= *start && *line < *end)
        {
            group_face_indices[gi].push(face_idx);
        }
    }

    let mut id_gen = IdGen::new();
    let mut objects = Vec::with_capacity(group_ranges.len());
    let mut groups_info = Vec::with_capacity(group_ranges.len());
    let mut running_face_start = 0usize;

    for (gi, (name, _, _)) in group_ranges.iter().enumerate() {
        let face_idxs = &group_face_indices[gi];
        let mut indexer = GroupIndexer::new(&positions, &texcoords, &normals, has_normals);

        for &face_idx in face_idxs {
            let (_, face_indices) = &faces[face_idx];
            let resolved: Vec<(u32, Option<u32>, Option<u32>)> = face_indices
                .iter()
                .map(|fi| resolve_face_vertex(fi, positions.len(), texcoords.len(), normals.len()))
                .collect();

            let mut face_vertices = Vec::with_capacity(resolved.len());
            let mut corner_positions = Vec::with_capacity(resolved.len());
            for &(vi, vti, vni) in &resolved {
                corner_positions.push(positions[vi as usize]);
                face_vertices.push(indexer.add_vertex(vi, vti, vni));
            }
            let normal = newell_normal(&corner_positions);

            let face_local_idx = indexer.model.faces.len() as u32;
            for fv in &face_vertices {
                let vg = &mut indexer.model.vertex_groups[fv.group_id as usize];
                if !vg.faces.contains(&face_local_idx) {
                    vg.faces.push(face_local_idx);
                }
            }

            let tri_positions: Vec<Vec3> = face_vertices
                .iter()
                .map(|fv| indexer.model.vertices[fv.vertex_id as usize].pos)
                .collect();
            let local_tri_indices = triangulate(&tri_positions, normal);

            let first_vertex = indexer.model.indices.len() as u32;
            for &local_i in &local_tri_indices {
                indexer.model.indices.push(face_vertices[local_i as usize].vertex_id);
            }
            let count = local_tri_indices.len() as u32;

            indexer.model.faces.push(Face {
                vertices: face_vertices,
                normal,
                first_vertex,
                count,
            });
        }

        indexer.model.group_count = indexer.model.vertex_groups.len() as u32;

        let object_id = id_gen.next();
        objects.push(Object {
            id: object_id,
            name: name.clone(),
            meta: vec![ObjectMeta::Mesh(Mesh { model: indexer.model })],
        });

        let face_end = running_face_start + face_idxs.len();
        groups_info.push(GroupInfo {
            object_id,
            name: name.clone(),
            face_range: running_face_start..face_end,
        });
        running_face_start = face_end;
    }

    IndexedScene { objects, groups: groups_info }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::obj::tokenize;

    fn faces_and_verts(source: &str) -> IndexedScene {
        let (tokens, errors) = tokenize(source);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        index_geometry(&tokens)
    }

    #[test]
    fn negative_indices_resolve_against_final_table_size() {
        let scene = faces_and_verts("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n");
        let object = &scene.objects[0];
        let mesh = object.mesh().unwrap();
        let face = &mesh.model.faces[0];
        let vertex_ids: Vec<u32> = face.vertices.iter().map(|fv| fv.vertex_id).collect();
        assert_eq!(vertex_ids, vec![0, 1, 2]);
    }

    #[test]
    fn no_groups_produces_single_default_object() {
        let scene = faces_and_verts(
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
        );
        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.objects[0].name, "default");
        let model = &scene.objects[0].mesh().unwrap().model;
        assert_eq!(model.vertices.len(), 4);
        assert_eq!(model.faces.len(), 1);
        assert_eq!(model.indices.len(), 6);
    }

    #[test]
    fn mixed_groups_produce_separate_objects() {
        let mut src = String::new();
        for i in 0..8 {
            src.push_str(&format!("v {i} 0 0\n"));
        }
        src.push_str("g A\n");
        src.push_str("f 1 2 3\nf 1 3 4\nf 1 4 5\nf 1 5 6\n");
        src.push_str("g B\n");
        src.push_str("f 1 6 7\nf 1 7 8\nf 2 8 1\nf 3 1 2\n");
        let scene = faces_and_verts(&src);
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.objects[0].name, "A");
        assert_eq!(scene.objects[1].name, "B");
        assert_eq!(scene.objects[0].mesh().unwrap().model.faces.len(), 4);
        assert_eq!(scene.objects[1].mesh().unwrap().model.faces.len(), 4);
    }

    #[test]
    fn shared_positions_share_one_vertex_group() {
        let scene = faces_and_verts(
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n",
        );
        let model = &scene.objects[0].mesh().unwrap().model;
        let group_of = |face: usize, corner: usize| model.faces[face].vertices[corner].group_id;
        assert_eq!(group_of(0, 0), group_of(1, 0));
    }

    #[test]
    fn cube_without_materials_matches_expected_counts() {
        let mut src = String::new();
        let verts = [
            (100.0, -100.0, 100.0),
            (100.0, 100.0, 100.0),
            (-100.0, 100.0, 100.0),
            (-100.0, -100.0, 100.0),
            (100.0, -100.0, -100.0),
            (100.0, 100.0, -100.0),
            (-100.0, 100.0, -100.0),
            (-100.0, -100.0, -100.0),
        ];
        for v in verts {
            src.push_str(&format!("v {} {} {}\n", v.0, v.1, v.2));
        }
        let quads = [
            [1, 2, 3, 4],
            [5, 6, 2, 1],
            [8, 7, 3, 4],
            [5, 1, 4, 8],
            [2, 6, 7, 3],
            [5, 8, 7, 6],
        ];
        for q in quads {
            src.push_str(&format!("f {} {} {} {}\n", q[0], q[1], q[2], q[3]));
        }
        let scene = faces_and_verts(&src);
        assert_eq!(scene.objects.len(), 1);
        let model = &scene.objects[0].mesh().unwrap().model;
        assert_eq!(model.vertices.len(), 8);
        assert_eq!(model.faces.len(), 6);
        assert_eq!(model.indices.len(), 36);
        assert_eq!(model.aabb.min, (-100.0, -100.0, -100.0));
        assert_eq!(model.aabb.max, (100.0, 100.0, 100.0));
    }
}
