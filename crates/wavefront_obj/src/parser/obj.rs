//! Classifies each OBJ source line and emits a typed [`ObjEvent`]. Lines are tokenized in
//! parallel; every event carries the 1-based line index it came from so the original ordering
//! can be recovered with a stable sort once all lines have been classified.

use super::lines::split_lines;
use super::scalar;
use crate::error::InvalidLine;
use crate::model::{Vec2, Vec3};
use rayon::prelude::*;

/// One `v`/`vt`/`vn` reference inside a face statement. Components are the raw signed indices
/// as written in the file; negative (relative) indices are resolved by the geometry indexer
/// after all `v`/`vt`/`vn` events have been sorted, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceIndex {
    pub v: i32,
    pub vt: Option<i32>,
    pub vn: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjEvent {
    Position(Vec3),
    TexCoord(Vec2),
    Normal(Vec3),
    Face(Vec<FaceIndex>),
    /// A `g` or `o` statement; the distinction between the two tags is not preserved.
    Group(String),
    MtlLib(String),
    UseMtl(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjToken {
    pub line_index: usize,
    pub event: ObjEvent,
}

fn parse_position(rest: &str) -> Option<Vec3> {
    scalar::vec3(rest).ok().map(|(_, v)| v)
}

fn parse_normal(rest: &str) -> Option<Vec3> {
    scalar::vec3(rest).ok().map(|(_, v)| v)
}

/// `vt` takes 1-2 floats; a missing `v` component defaults to 0.0.
fn parse_texcoord(rest: &str) -> Option<Vec2> {
    if let Ok((_, uv)) = scalar::vec2(rest) {
        Some(uv)
    } else {
        scalar::scalar(rest).ok().map(|(_, u)| (u, 0.0))
    }
}

fn parse_index_component(token: &str) -> Option<i32> {
    scalar::int(token.trim()).ok().map(|(_, v)| v)
}

fn parse_face_index(token: &str) -> Option<FaceIndex> {
    let mut parts = token.split('/');
    let v = parse_index_component(parts.next()?)?;
    let vt = match parts.next() {
        Some(s) if !s.trim().is_empty() => Some(parse_index_component(s)?),
        _ => None,
    };
    let vn = match parts.next() {
        Some(s) if !s.trim().is_empty() => Some(parse_index_component(s)?),
        _ => None,
    };
    Some(FaceIndex { v, vt, vn })
}

fn parse_face(rest: &str) -> Option<Vec<FaceIndex>> {
    let verts: Option<Vec<FaceIndex>> = rest.split_whitespace().map(parse_face_index).collect();
    match verts {
        Some(v) if v.len() >= 3 => Some(v),
        _ => None,
    }
}

/// Parses one line, returning `None` for blank/comment/unrecognized lines (which are silently
/// ignored), `Some(Ok(event))` for a recognized statement, or `Some(Err(()))` if the line's
/// prefix is recognized but the remainder does not match the expected grammar.
fn parse_line(line: &str) -> Option<Result<ObjEvent, ()>> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let mut split = trimmed.splitn(2, char::is_whitespace);
    let keyword = split.next().unwrap_or("");
    let rest = split.next().unwrap_or("").trim_start();
    match keyword {
        "v" => match parse_position(rest) {
            Some(p) => Some(Ok(ObjEvent::Position(p))),
            None => Some(Err(())),
        },
        "vt" => match parse_texcoord(rest) {
            Some(uv) => Some(Ok(ObjEvent::TexCoord(uv))),
            None => Some(Err(())),
        },
        "vn" => match parse_normal(rest) {
            Some(n) => Some(Ok(ObjEvent::Normal(n))),
            None => Some(Err(())),
        },
        "f" => match parse_face(rest) {
            Some(verts) => Some(Ok(ObjEvent::Face(verts))),
            None => Some(Err(())),
        },
        "g" | "o" => {
            let name = rest.trim();
            if name.is_empty() || name.eq_ignore_ascii_case("off") {
                None
            } else {
                Some(Ok(ObjEvent::Group(name.to_string())))
            }
        }
        "mtllib" => {
            let path = scalar::get_str_range(rest);
            if path.is_empty() {
                Some(Err(()))
            } else {
                Some(Ok(ObjEvent::MtlLib(path.to_string())))
            }
        }
        "usemtl" => {
            let name = rest.trim();
            if name.is_empty() {
                Some(Err(()))
            } else {
                Some(Ok(ObjEvent::UseMtl(name.to_string())))
            }
        }
        _ => None,
    }
}

/// Tokenizes every line of `source` in parallel, then stably sorts the resulting events by
/// line index. Malformed recognized-prefix lines are collected into the second return value
/// rather than aborting the parse.
pub fn tokenize(source: &str) -> (Vec<ObjToken>, Vec<InvalidLine>) {
    let lines = split_lines(source);
    let classified: Vec<_> = lines
        .par_iter()
        .filter_map(|line| parse_line(line.text).map(|result| (line.index, line.text, result)))
        .collect();

    let mut tokens = Vec::with_capacity(classified.len());
    let mut errors = Vec::new();
    for (line_index, text, result) in classified {
        match result {
            Ok(event) => tokens.push(ObjToken { line_index, event }),
            Err(()) => {
                log::warn!("skipping invalid OBJ line {line_index}: {text:?}");
                errors.push(InvalidLine {
                    line_text: text.to_string(),
                    line_index,
                });
            }
        }
    }
    tokens.sort_by_key(|t| t.line_index);
    errors.sort_by_key(|e| e.line_index);
    (tokens, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_vertex_and_face_lines() {
        let (tokens, errors) = tokenize("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].event, ObjEvent::Position((0.0, 0.0, 0.0)));
        assert_eq!(
            tokens[3].event,
            ObjEvent::Face(vec![
                FaceIndex { v: 1, vt: None, vn: None },
                FaceIndex { v: 2, vt: None, vn: None },
                FaceIndex { v: 3, vt: None, vn: None },
            ])
        );
    }

    #[test]
    fn parses_mixed_face_triple_forms() {
        let (tokens, _) = tokenize("f 1/2/3 4//5 6 7/8\n");
        match &tokens[0].event {
            ObjEvent::Face(verts) => {
                assert_eq!(verts[0], FaceIndex { v: 1, vt: Some(2), vn: Some(3) });
                assert_eq!(verts[1], FaceIndex { v: 4, vt: None, vn: Some(5) });
                assert_eq!(verts[2], FaceIndex { v: 6, vt: None, vn: None });
                assert_eq!(verts[3], FaceIndex { v: 7, vt: Some(8), vn: None });
            }
            other => panic!("expected a face event, got {other:?}"),
        }
    }

    #[test]
    fn drops_off_and_empty_group_names() {
        let (tokens, _) = tokenize("g off\no \ng main\n");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].event, ObjEvent::Group("main".into()));
    }

    #[test]
    fn records_malformed_lines_without_aborting() {
        let (tokens, errors) = tokenize("v 0 0 0\nv bad line\nv 1 1 1\n");
        assert_eq!(tokens.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line_index, 2);
    }

    #[test]
    fn ignores_unknown_and_comment_lines() {
        let (tokens, errors) = tokenize("# a comment\ns 1\nusemtl\n");
        assert_eq!(tokens.len(), 0);
        assert_eq!(errors.len(), 1);
    }
}
