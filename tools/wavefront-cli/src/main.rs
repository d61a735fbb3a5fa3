use std::error::Error as StdError;
use std::path::PathBuf;

use clap::{ArgGroup, CommandFactory, Parser};

use wavefront_obj::export::Exporter;
use wavefront_obj::flags::{MaterialExportFlags, MeshExportFlags, ObjExportFlags};
use wavefront_obj::import::{Importer, ReadState};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["inspect", "convert"]),
))]
struct Cli {
    /// Print a summary of the objects, materials and textures in SOURCE
    #[arg(short, long, action)]
    inspect: bool,

    /// Import SOURCE and re-export it to DESTINATION
    #[arg(short, long, action)]
    convert: bool,

    /// The .obj file to read
    source: PathBuf,

    /// The .obj file to write when using --convert
    destination: Option<PathBuf>,

    /// Emit texture coordinates on export
    #[arg(long, action)]
    export_uv: bool,

    /// Emit vertex normals on export
    #[arg(long, action)]
    export_normals: bool,

    /// Emit every face as a triangle fan instead of its source polygon
    #[arg(long, action)]
    triangulate: bool,
}

enum CliError {
    InvalidArgument(String),
    Import(ReadState),
    Export(wavefront_obj::error::Error),
}

fn main() -> Result<(), Box<dyn StdError>> {
    env_logger::init();
    let cli = Cli::parse();

    let result = if cli.inspect {
        inspect(&cli.source)
    } else if cli.convert {
        match &cli.destination {
            Some(destination) => convert(&cli.source, destination, &cli),
            None => Err(CliError::InvalidArgument(
                "DESTINATION is required when using --convert".into(),
            )),
        }
    } else {
        Ok(())
    };

    if let Err(err) = result {
        let message = match err {
            CliError::InvalidArgument(msg) => msg,
            CliError::Import(state) => format!("failed to import SOURCE: {state:?}"),
            CliError::Export(error) => format!("{error}"),
        };
        let mut cmd = Cli::command();
        cmd.error(clap::error::ErrorKind::InvalidValue, message).exit();
    }

    Ok(())
}

fn inspect(source: &PathBuf) -> Result<(), CliError> {
    let mut importer = Importer::new(source);
    let state = importer.load();
    if state != ReadState::Success {
        return Err(CliError::Import(state));
    }

    println!("{}", source.display());
    for object in importer.objects() {
        let model = &object.mesh().map(|m| &m.model);
        match model {
            Some(model) => println!(
                "  {} - {} vertices, {} faces, {} vertex groups",
                object.name,
                model.vertices.len(),
                model.faces.len(),
                model.group_count,
            ),
            None => println!("  {} - no mesh", object.name),
        }
        for range in object.material_ranges() {
            println!("    material {} - {} faces", range.mat_id, range.faces.len());
        }
    }
    println!("{} materials, {} textures", importer.materials().len(), importer.textures().len());

    Ok(())
}

fn convert(source: &PathBuf, destination: &PathBuf, cli: &Cli) -> Result<(), CliError> {
    let mut importer = Importer::new(source);
    let state = importer.load();
    if state != ReadState::Success {
        return Err(CliError::Import(state));
    }

    let mut mesh_flags = MeshExportFlags::NONE;
    if cli.export_uv {
        mesh_flags = mesh_flags | MeshExportFlags::EXPORT_UV;
    }
    if cli.export_normals {
        mesh_flags = mesh_flags | MeshExportFlags::EXPORT_NORMALS;
    }
    if cli.triangulate {
        mesh_flags = mesh_flags | MeshExportFlags::EXPORT_TRIANGULATED;
    }

    let material_flags = if importer.materials().is_empty() {
        MaterialExportFlags::NONE
    } else {
        MaterialExportFlags::TEXTURE_ORIGIN
    };

    let mut exporter = Exporter::new(destination);
    exporter.mesh_flags = mesh_flags;
    exporter.material_flags = material_flags;
    exporter.obj_flags = ObjExportFlags::default();
    exporter.objects = importer.objects().to_vec();
    exporter.materials = importer.materials().to_vec();
    exporter.textures = importer.textures().to_vec();

    exporter.save().map_err(CliError::Export)
}
