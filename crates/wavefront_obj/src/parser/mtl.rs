//! Tokenizes the MTL material grammar. Unlike the OBJ tokenizer this pass is inherently
//! sequential: each line mutates a working [`Material`] and `newmtl` commits the previous one,
//! so there is no independent per-line output to dispatch across threads.

use super::lines::split_lines;
use super::scalar;
use crate::error::InvalidLine;
use crate::model::{Material, TextureOption, Vec3};

/// Splits the first whitespace-delimited token off `s`, trimming the rest. Returns `("", "")`
/// once `s` is exhausted.
fn take_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((tok, rest)) => (tok, rest.trim_start()),
        None => (s, ""),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn parse_on_off(token: Option<&str>) -> Result<bool, ()> {
    match token {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        _ => Err(()),
    }
}

/// Consumes zero or more `-flag` modifiers followed by a mandatory path token. Unrecognized
/// flags abort the whole texture assignment for this line.
fn parse_texture_option(rest: &str) -> Result<TextureOption, ()> {
    let mut opt = TextureOption::default();
    let mut cursor = rest.trim_start();
    let mut path: Option<String> = None;

    while !cursor.is_empty() {
        let (tok, after_tok) = take_token(cursor);
        if let Some(flag) = tok.strip_prefix('-') {
            cursor = after_tok;
            match flag {
                "blendu" => {
                    let (tok, after) = take_token(cursor);
                    opt.blendu = parse_on_off(non_empty(tok))?;
                    cursor = after;
                }
                "blendv" => {
                    let (tok, after) = take_token(cursor);
                    opt.blendv = parse_on_off(non_empty(tok))?;
                    cursor = after;
                }
                "clamp" => {
                    let (tok, after) = take_token(cursor);
                    opt.clamp = parse_on_off(non_empty(tok))?;
                    cursor = after;
                }
                "boost" => {
                    let (after, value) = scalar::scalar(cursor.trim_start()).map_err(|_| ())?;
                    opt.boost = value;
                    cursor = after;
                }
                "mm" => {
                    let (after, value) = scalar::vec2(cursor).map_err(|_| ())?;
                    opt.mm = value;
                    cursor = after;
                }
                "o" => {
                    let (after, value) = scalar::vec3_optional(cursor, opt.offset);
                    opt.offset = value;
                    cursor = after;
                }
                "s" => {
                    let (after, value) = scalar::vec3_optional(cursor, opt.scale);
                    opt.scale = value;
                    cursor = after;
                }
                "t" => {
                    let (after, value) = scalar::vec3_optional(cursor, opt.turbulence);
                    opt.turbulence = value;
                    cursor = after;
                }
                "texres" => {
                    let (after, value) = scalar::int(cursor.trim_start()).map_err(|_| ())?;
                    opt.resolution = Some(value);
                    cursor = after;
                }
                "type" => {
                    let (tok, after) = take_token(cursor);
                    opt.kind = Some(non_empty(tok).ok_or(())?.to_string());
                    cursor = after;
                }
                "bm" => {
                    let (after, value) = scalar::scalar(cursor.trim_start()).map_err(|_| ())?;
                    opt.bump_intensity = value;
                    cursor = after;
                }
                "imfchan" => {
                    let (tok, after) = take_token(cursor);
                    opt.imfchan = non_empty(tok).and_then(|s| s.chars().next());
                    if opt.imfchan.is_none() {
                        return Err(());
                    }
                    cursor = after;
                }
                other => {
                    log::warn!("unknown texture option -{other}");
                    return Err(());
                }
            }
            cursor = cursor.trim_start();
        } else {
            path = Some(cursor.split_whitespace().collect::<Vec<_>>().join(" "));
            cursor = "";
        }
    }
    opt.path = path.ok_or(())?;
    Ok(opt)
}

fn parse_color(rest: &str) -> Result<Vec3, ()> {
    let rest = rest.trim();
    let rest = rest.strip_prefix("xyz").map(str::trim_start).unwrap_or(rest);
    scalar::vec3(rest).map(|(_, v)| v).map_err(|_| ())
}

fn parse_f32(rest: &str) -> Result<f32, ()> {
    scalar::scalar(rest.trim_start()).map(|(_, v)| v).map_err(|_| ())
}

fn parse_i32(rest: &str) -> Result<i32, ()> {
    scalar::int(rest.trim_start()).map(|(_, v)| v).map_err(|_| ())
}

/// What happened when one MTL line was dispatched against the working material.
enum LineOutcome {
    /// A `newmtl <name>` line; the caller must commit whatever material was in progress and
    /// start a fresh one with this name.
    NewMaterial(String),
    /// A recognized key was applied to the working material.
    Applied,
    /// Blank, comment, or an unrecognized keyword; not an error.
    Ignored,
}

/// Dispatches one line against `current`. Field keys other than `newmtl` require a material
/// already in progress; encountering one with none open is a malformed line.
fn apply_line(line: &str, current: &mut Option<Material>) -> Result<LineOutcome, ()> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(LineOutcome::Ignored);
    }
    let mut split = trimmed.splitn(2, char::is_whitespace);
    let keyword = split.next().unwrap_or("");
    let rest = split.next().unwrap_or("").trim_start();

    if keyword == "newmtl" {
        let name = rest.trim();
        if name.is_empty() {
            return Err(());
        }
        return Ok(LineOutcome::NewMaterial(name.to_string()));
    }

    const KNOWN_KEYWORDS: &[&str] = &[
        "Ka", "Kd", "Ks", "Tf", "Ke", "Ns", "Ni", "d", "Tr", "illum", "Pr", "Pm", "Ps", "Pc",
        "Pcr", "aniso", "anisor", "map_Ka", "map_Kd", "map_Ks", "map_Ns", "map_d", "map_Tr",
        "bump", "map_bump", "disp", "decal", "refl", "map_Pr", "map_Pm", "map_Ps", "map_Ke",
        "norm",
    ];
    if !KNOWN_KEYWORDS.contains(&keyword) {
        return Ok(LineOutcome::Ignored);
    }

    let Some(material) = current.as_mut() else {
        return Err(());
    };

    match keyword {
        "Ka" => material.ka = Some(parse_color(rest)?),
        "Kd" => material.kd = Some(parse_color(rest)?),
        "Ks" => material.ks = Some(parse_color(rest)?),
        "Tf" => material.tf = Some(parse_color(rest)?),
        "Ke" => material.ke = Some(parse_color(rest)?),
        "Ns" => material.ns = Some(parse_f32(rest)?),
        "Ni" => material.ni = Some(parse_f32(rest)?),
        "d" => material.d = Some(parse_f32(rest)?),
        "Tr" => material.tr = Some(parse_f32(rest)?),
        "illum" => material.illum = Some(parse_i32(rest)?),
        "Pr" => material.pr = Some(parse_f32(rest)?),
        "Pm" => material.pm = Some(parse_f32(rest)?),
        "Ps" => material.ps = Some(parse_f32(rest)?),
        "Pc" => material.pc = Some(parse_f32(rest)?),
        "Pcr" => material.pcr = Some(parse_f32(rest)?),
        "aniso" => material.aniso = Some(parse_f32(rest)?),
        "anisor" => material.anisor = Some(parse_f32(rest)?),
        "map_Ka" => material.map_ka = Some(parse_texture_option(rest)?),
        "map_Kd" => material.map_kd = Some(parse_texture_option(rest)?),
        "map_Ks" => material.map_ks = Some(parse_texture_option(rest)?),
        "map_Ns" => material.map_ns = Some(parse_texture_option(rest)?),
        "map_d" => material.map_d = Some(parse_texture_option(rest)?),
        "map_Tr" => material.map_tr = Some(parse_texture_option(rest)?),
        "bump" | "map_bump" => material.bump = Some(parse_texture_option(rest)?),
        "disp" => material.disp = Some(parse_texture_option(rest)?),
        "decal" => material.decal = Some(parse_texture_option(rest)?),
        "refl" => material.refl = Some(parse_texture_option(rest)?),
        "map_Pr" => material.map_pr = Some(parse_texture_option(rest)?),
        "map_Pm" => material.map_pm = Some(parse_texture_option(rest)?),
        "map_Ps" => material.map_ps = Some(parse_texture_option(rest)?),
        "map_Ke" => material.map_ke = Some(parse_texture_option(rest)?),
        "norm" => material.norm = Some(parse_texture_option(rest)?),
        _ => unreachable!("filtered by KNOWN_KEYWORDS above"),
    }
    Ok(LineOutcome::Applied)
}

/// Tokenizes a whole MTL file into a sequence of committed [`Material`] values, in source
/// order. A malformed line is recorded and the rest of that material's definition continues.
pub fn tokenize(source: &str) -> (Vec<Material>, Vec<InvalidLine>) {
    let lines = split_lines(source);
    let mut materials = Vec::new();
    let mut current: Option<Material> = None;
    let mut errors = Vec::new();

    for line in lines {
        match apply_line(line.text, &mut current) {
            Ok(LineOutcome::NewMaterial(name)) => {
                if let Some(previous) = current.take() {
                    materials.push(previous);
                }
                current = Some(Material {
                    name,
                    ..Material::default()
                });
            }
            Ok(LineOutcome::Applied) | Ok(LineOutcome::Ignored) => {}
            Err(()) => {
                log::warn!("skipping invalid MTL line {}: {:?}", line.index, line.text);
                errors.push(InvalidLine {
                    line_text: line.text.to_string(),
                    line_index: line.index,
                });
            }
        }
    }
    if let Some(last) = current.take() {
        materials.push(last);
    }
    (materials, errors)
}
