//! Ties the tokenizers, geometry indexer, and material binder together behind the small
//! phase-based API the rest of the crate (and callers) drive: read the file, build the
//! indexed geometry, then resolve materials against it.

use crate::error::Error;
use crate::index::{index_geometry, GroupInfo, IdGen};
use crate::material::bind_materials;
use crate::model::{Material, MaterialInfo, Object, TextureAsset};
use crate::parser::obj::ObjEvent;
use crate::parser::{tokenize_mtl, tokenize_obj};
use crate::parser::obj::ObjToken;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of [`Importer::read_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Success,
    NotFound,
    ReadError,
    ParseError,
}

/// Outcome of [`Importer::load_materials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialState {
    Success,
    MtlMissing,
    MtlParseError,
}

/// Reads an OBJ file (and its companion MTL, if referenced) into an indexed [`Object`] list.
///
/// The three phases run in order and each tolerates the failure modes the one before it can
/// leave behind: `build_geometry` is a no-op if `read_source` never succeeded, and
/// `load_materials` is a no-op if no `mtllib` statement was found.
pub struct Importer {
    path: PathBuf,
    source: Option<String>,
    tokens: Vec<ObjToken>,
    objects: Vec<Object>,
    groups: Vec<GroupInfo>,
    materials: Vec<(MaterialInfo, Material)>,
    textures: Vec<TextureAsset>,
    error: Option<Error>,
}

impl Importer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Importer {
            path: path.into(),
            source: None,
            tokens: Vec::new(),
            objects: Vec::new(),
            groups: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            error: None,
        }
    }

    /// Reads the OBJ file and tokenizes it. A file that reads but yields no recognizable
    /// statement at all is reported as `ParseError` rather than silently producing an empty
    /// scene.
    pub fn read_source(&mut self) -> ReadState {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let (tokens, errors) = tokenize_obj(&text);
                for e in &errors {
                    log::warn!("{e}");
                }
                if tokens.is_empty() {
                    self.error = Some(Error::ReadError {
                        path: self.path.clone(),
                        source: io::Error::new(io::ErrorKind::InvalidData, "no valid OBJ statements found"),
                    });
                    return ReadState::ParseError;
                }
                self.source = Some(text);
                self.tokens = tokens;
                ReadState::Success
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => ReadState::NotFound,
            Err(source) => {
                self.error = Some(Error::ReadError { path: self.path.clone(), source });
                ReadState::ReadError
            }
        }
    }

    /// Builds the indexed geometry from the tokens cached by [`Importer::read_source`]. Sets
    /// [`Error::NotLoaded`] and does nothing else if called before a successful `read_source`.
    pub fn build_geometry(&mut self) {
        if self.source.is_none() {
            self.error = Some(Error::NotLoaded);
            return;
        }
        let scene = index_geometry(&self.tokens);
        self.objects = scene.objects;
        self.groups = scene.groups;
    }

    /// Resolves the `mtllib` referenced by the source file, if any, and binds `usemtl` ranges
    /// onto the already-built objects.
    pub fn load_materials(&mut self) -> MaterialState {
        let mtl_name = self.tokens.iter().find_map(|t| match &t.event {
            ObjEvent::MtlLib(name) => Some(name.clone()),
            _ => None,
        });
        let Some(mtl_name) = mtl_name else {
            return MaterialState::Success;
        };

        let mtl_path = self.path.parent().unwrap_or_else(|| Path::new(".")).join(&mtl_name);
        let text = match fs::read_to_string(&mtl_path) {
            Ok(text) => text,
            Err(_) => {
                log::warn!("mtllib referenced but not openable: {}", mtl_path.display());
                self.error = Some(Error::MtlMissing { path: mtl_path });
                return MaterialState::MtlMissing;
            }
        };

        let (materials, errors) = tokenize_mtl(&text);
        for e in &errors {
            log::warn!("{e}");
        }
        if materials.is_empty() {
            return MaterialState::MtlParseError;
        }

        let mut id_gen = IdGen::new();
        let mut infos: HashMap<u64, MaterialInfo> = HashMap::new();
        let mut defs: HashMap<u64, Material> = HashMap::new();
        let mut by_name: HashMap<String, u64> = HashMap::new();
        for material in materials {
            let id = id_gen.next();
            by_name.insert(material.name.clone(), id);
            infos.insert(
                id,
                MaterialInfo { id, name: material.name.clone(), assignments: Vec::new() },
            );
            self.collect_textures(&material);
            defs.insert(id, material);
        }

        bind_materials(&self.tokens, &self.groups, &mut self.objects, &by_name, &mut infos);

        let mut materials: Vec<(MaterialInfo, Material)> = infos
            .into_iter()
            .filter_map(|(id, info)| defs.remove(&id).map(|material| (info, material)))
            .collect();
        materials.sort_by_key(|(info, _)| info.id);
        self.materials = materials;

        MaterialState::Success
    }

    fn collect_textures(&mut self, material: &Material) {
        let slots = [
            &material.map_ka,
            &material.map_kd,
            &material.map_ks,
            &material.map_ns,
            &material.map_d,
            &material.map_tr,
            &material.bump,
            &material.disp,
            &material.decal,
            &material.refl,
            &material.map_pr,
            &material.map_pm,
            &material.map_ps,
            &material.map_ke,
            &material.norm,
        ];
        for slot in slots.into_iter().flatten() {
            if !self.textures.iter().any(|t| t.path == slot.path) {
                self.textures.push(TextureAsset { path: slot.path.clone() });
            }
        }
    }

    /// Convenience wrapper running all three phases in order. Returns the `read_source`
    /// outcome; callers who need the material-phase result should call `load_materials`
    /// directly.
    pub fn load(&mut self) -> ReadState {
        let state = self.read_source();
        if state != ReadState::Success {
            return state;
        }
        self.build_geometry();
        self.load_materials();
        state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn materials(&self) -> &[(MaterialInfo, Material)] {
        &self.materials
    }

    pub fn textures(&self) -> &[TextureAsset] {
        &self.textures
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Releases all owned state so the importer can be reused for a different file.
    pub fn clear(&mut self) {
        self.source = None;
        self.tokens.clear();
        self.objects.clear();
        self.groups.clear();
        self.materials.clear();
        self.textures.clear();
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("wavefront_obj_test_{name}_{}.obj", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_file_reports_not_found() {
        let mut importer = Importer::new("/nonexistent/path/does-not-exist.obj");
        assert_eq!(importer.read_source(), ReadState::NotFound);
    }

    #[test]
    fn load_builds_objects_without_materials() {
        let path = write_temp("cube", "v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n");
        let mut importer = Importer::new(&path);
        assert_eq!(importer.load(), ReadState::Success);
        assert_eq!(importer.objects().len(), 1);
        assert!(importer.materials().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_mtllib_is_reported_but_not_fatal_to_geometry() {
        let path = write_temp("nomtl", "mtllib missing.mtl\nv 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n");
        let mut importer = Importer::new(&path);
        importer.read_source();
        importer.build_geometry();
        assert_eq!(importer.load_materials(), MaterialState::MtlMissing);
        assert_eq!(importer.objects().len(), 1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn garbage_file_reports_parse_error() {
        let path = write_temp("garbage", "this is not an obj file at all\njust prose\n");
        let mut importer = Importer::new(&path);
        assert_eq!(importer.read_source(), ReadState::ParseError);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn build_geometry_before_read_source_reports_not_loaded() {
        let mut importer = Importer::new("/nonexistent/path/does-not-exist.obj");
        importer.build_geometry();
        assert!(importer.objects().is_empty());
        assert!(matches!(importer.error(), Some(Error::NotLoaded)));
    }
}
