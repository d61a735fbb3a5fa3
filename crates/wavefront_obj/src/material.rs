//! Matches `usemtl` ranges to face ranges and produces `MaterialRange` assignments on objects.
//!
//! Runs after geometry indexing, against the same sorted `f` event stream the indexer itself
//! used (one entry per [`GroupInfo`] produced there), plus the `usemtl` events and the
//! name-to-id table built from the MTL pass.

use crate::index::GroupInfo;
use crate::model::{MaterialInfo, MaterialRange, Object, ObjectMeta};
use crate::parser::obj::{ObjEvent, ObjToken};
use std::collections::HashMap;

fn face_lines(tokens: &[ObjToken]) -> Vec<usize> {
    tokens
        .iter()
        .filter_map(|t| match &t.event {
            ObjEvent::Face(_) => Some(t.line_index),
            _ => None,
        })
        .collect()
}

fn usemtl_events(tokens: &[ObjToken]) -> Vec<(usize, String)> {
    tokens
        .iter()
        .filter_map(|t| match &t.event {
            ObjEvent::UseMtl(name) => Some((t.line_index, name.clone())),
            _ => None,
        })
        .collect()
}

/// Binds `usemtl` ranges onto `objects`, which must be in the same order as `groups` (one
/// object per group, as produced by [`crate::index::index_geometry`]).
pub fn bind_materials(
    tokens: &[ObjToken],
    groups: &[GroupInfo],
    objects: &mut [Object],
    materials_by_name: &HashMap<String, u64>,
    material_infos: &mut HashMap<u64, MaterialInfo>,
) {
    let all_face_lines = face_lines(tokens);
    let usemtls = usemtl_events(tokens);

    for (gi, group) in groups.iter().enumerate() {
        if group.face_range.is_empty() {
            continue;
        }
        let group_face_lines = &all_face_lines[group.face_range.clone()];
        let first_face_line = group_face_lines[0];
        let last_face_line = *group_face_lines.last().unwrap();

        let idx = usemtls.partition_point(|(line, _)| *line < first_face_line);
        let effective_start = idx.saturating_sub(1);

        let mut k = effective_start;
        while k < usemtls.len() {
            let (u_line, name) = &usemtls[k];
            if *u_line > last_face_line {
                break;
            }
            let effective_line = (*u_line).max(first_face_line);
            let f_start = group_face_lines.partition_point(|&line| line < effective_line);
            let next_line = usemtls.get(k + 1).map(|(l, _)| *l).unwrap_or(usize::MAX);
            let f_next = group_face_lines.partition_point(|&line| line < next_line);

            if f_start < f_next {
                match materials_by_name.get(name) {
                    Some(&mat_id) => {
                        let faces: Vec<u32> = (f_start as u32..f_next as u32).collect();
                        objects[gi].meta.push(ObjectMeta::MaterialRange(MaterialRange {
                            mat_id,
                            faces,
                        }));
                        if let Some(info) = material_infos.get_mut(&mat_id) {
                            if !info.assignments.contains(&group.object_id) {
                                info.assignments.push(group.object_id);
                            }
                        }
                    }
                    None => {
                        log::warn!("usemtl references unknown material {name:?}");
                    }
                }
            }
            k += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::index_geometry;
    use crate::model::MaterialInfo;
    use crate::parser::obj::tokenize;

    fn source() -> String {
        let mut src = String::new();
        for i in 0..6 {
            src.push_str(&format!("v {i} 0 0\n"));
        }
        src.push_str("g cube\n");
        src.push_str("usemtl red\n");
        src.push_str("f 1 2 3\nf 1 3 4\n");
        src.push_str("usemtl blue\n");
        src.push_str("f 1 4 5\nf 1 5 6\n");
        src
    }

    #[test]
    fn one_group_two_materials_produces_two_ranges() {
        let src = source();
        let (tokens, errors) = tokenize(&src);
        assert!(errors.is_empty());
        let mut scene = index_geometry(&tokens);

        let mut by_name = HashMap::new();
        by_name.insert("red".to_string(), 1u64);
        by_name.insert("blue".to_string(), 2u64);
        let mut infos = HashMap::new();
        infos.insert(
            1,
            MaterialInfo { id: 1, name: "red".into(), assignments: vec![] },
        );
        infos.insert(
            2,
            MaterialInfo { id: 2, name: "blue".into(), assignments: vec![] },
        );

        bind_materials(&tokens, &scene.groups, &mut scene.objects, &by_name, &mut infos);

        let ranges: Vec<_> = scene.objects[0].material_ranges().collect();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].mat_id, 1);
        assert_eq!(ranges[0].faces, vec![0, 1]);
        assert_eq!(ranges[1].mat_id, 2);
        assert_eq!(ranges[1].faces, vec![2, 3]);

        assert_eq!(infos[&1].assignments, vec![scene.objects[0].id]);
        assert_eq!(infos[&2].assignments, vec![scene.objects[0].id]);
    }

    #[test]
    fn unresolved_material_is_dropped_without_aborting() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl ghost\nf 1 2 3\n";
        let (tokens, _) = tokenize(src);
        let mut scene = index_geometry(&tokens);
        let by_name = HashMap::new();
        let mut infos = HashMap::new();
        bind_materials(&tokens, &scene.groups, &mut scene.objects, &by_name, &mut infos);
        assert_eq!(scene.objects[0].material_ranges().count(), 0);
    }
}
