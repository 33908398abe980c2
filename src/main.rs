use std::env;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};

use dae_pipeline::{ColladaImporter, ImportError, ImportOptions, ImportStatus, Scene};

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            let status = err
                .downcast_ref::<ImportError>()
                .map(ImportError::status)
                .unwrap_or(ImportStatus::Fail);
            match status {
                ImportStatus::FormatError => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run() -> Result<()> {
    let cli = CliOptions::parse()?;
    let scene = Scene::new();
    let mut importer = ColladaImporter::new(cli.options);
    let report = importer
        .import_file(&cli.path, &scene)
        .with_context(|| format!("Failed to import {}", cli.path))?;

    println!(
        "Imported {} model(s) with {} instance(s) from scene {}",
        report.models_added,
        report.instances_added,
        report.scene_id.as_deref().unwrap_or("<unnamed>")
    );
    for model in scene.all_models() {
        println!(
            " - {} ({}) instances={} meshes={} vertices={} indices={}",
            model.name,
            model.instance_geometry,
            model.instance_count(),
            model.meshes.len(),
            model.vertex_count(),
            model.index_count()
        );
        for (i, instance) in model.instances().iter().enumerate() {
            println!(
                "   [{i}] pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
                instance.position.x,
                instance.position.y,
                instance.position.z,
                instance.rotation.x,
                instance.rotation.y,
                instance.rotation.z,
                instance.scale.x,
                instance.scale.y,
                instance.scale.z
            );
        }
    }
    for geometry in &report.unresolved {
        println!("Unresolved geometry: {geometry}");
    }
    if !report.xsi_extra.timing.is_empty() {
        println!(
            "XSI timing: {} start={} end={} frame_rate={}",
            report.xsi_extra.timing,
            report.xsi_extra.start,
            report.xsi_extra.end,
            report.xsi_extra.frame_rate
        );
    }
    Ok(())
}

struct CliOptions {
    path: String,
    options: ImportOptions,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: dae-import <scene.dae> [--optimize-points] [--invert-normals] [--legacy-nested-transforms] [--fix-xsi-sids]"
            ));
        };
        let mut options = ImportOptions::default();
        for arg in args {
            match arg.as_str() {
                "--optimize-points" => options.optimize_points = true,
                "--invert-normals" => options.invert_normals = true,
                "--legacy-nested-transforms" => options.legacy_nested_transforms = true,
                "--fix-xsi-sids" => options.fix_xsi_scene_sids = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --optimize-points, --invert-normals, --legacy-nested-transforms or --fix-xsi-sids"
                    ));
                }
            }
        }
        Ok(Self { path, options })
    }
}
