// src/main.rs
//
// Exploratory CLI: builds one of a few demo scenes, evaluates B or H, prints
// the result and writes it to `runs/` (or the directory given via `out=`).
//
// Examples:
//
//   cargo run --release -- cube
//       -> unit cube magnet, 9-pixel line sensor 1 mm above it.
//
//   cargo run --release -- collection field=h sum
//       -> magnet assembly plus a current loop on a 5x5 grid, H summed over
//          the two top-level entries.
//
//   cargo run --release -- spin nosqueeze config=run.json
//       -> diametral cylinder rotating in 36 steps next to a sensor.
//
// Typical outputs (per run directory):
//   runs/<run_id>/
//     ├── config.json
//     └── field.csv

use std::env;
use std::error::Error;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ndarray::ArrayD;
use tracing::{info, warn};

use magstat::config::RunConfig;
use magstat::{
    logging, Engine, FieldKind, Member, Observer, PixelGrid, Rotation, Scene, Sensor, Source,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preset {
    Cube,
    Collection,
    Spin,
}

impl Preset {
    fn from_arg(s: &str) -> Option<Self> {
        match s {
            "cube" => Some(Self::Cube),
            "collection" | "coll" => Some(Self::Collection),
            "spin" => Some(Self::Spin),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Collection => "collection",
            Self::Spin => "spin",
        }
    }

    /// Scene plus the top-level source entries and observers to evaluate.
    fn build(&self) -> Result<(Scene, Vec<Member>, Vec<Observer>), magstat::FieldError> {
        let mut scene = Scene::new();
        match self {
            Self::Cube => {
                let cube = scene.add_source(Source::cuboid([0.0, 0.0, 1000.0], [1.0, 1.0, 1.0]));
                let line = PixelGrid::regular([-2.0, 0.0, 0.0], [2.0, 0.0, 0.0], [9, 1, 1]);
                let sensor = scene.add_sensor(Sensor::new([0.0, 0.0, 1.0]).with_pixels(line));
                Ok((scene, vec![cube.into()], vec![sensor.into()]))
            }
            Self::Collection => {
                let cube = scene.add_source(
                    Source::cuboid([0.0, 0.0, 1000.0], [1.0, 1.0, 1.0]).at([-2.0, 0.0, 0.0]),
                );
                let cyl = scene.add_source(Source::cylinder([0.0, 0.0, 1000.0], 1.0, 1.0));
                let ball =
                    scene.add_source(Source::sphere([0.0, 0.0, 1000.0], 1.0).at([2.0, 0.0, 0.0]));
                let coil = scene.add_source(Source::current_loop(100.0, 6.0).at([0.0, 0.0, -1.0]));
                let magnets = scene.add_collection(&[cube.into(), cyl.into(), ball.into()])?;
                scene.rotate_from_angax(magnets.into(), 30.0, [1.0, 0.0, 0.0], None, -1, true)?;
                let grid = PixelGrid::regular([-3.0, -3.0, 2.0], [3.0, 3.0, 2.0], [5, 5, 1]);
                Ok((
                    scene,
                    vec![magnets.into(), coil.into()],
                    vec![Observer::Points(grid)],
                ))
            }
            Self::Spin => {
                let magnet = scene.add_source(Source::cylinder([1000.0, 0.0, 0.0], 1.0, 0.5));
                scene.rotate_from_angax(magnet.into(), 360.0, [0.0, 0.0, 1.0], None, 36, true)?;
                let sensor = scene.add_sensor(
                    Sensor::new([2.0, 0.0, 0.0])
                        .oriented(Rotation::from_axis_angle([0.0, 1.0, 0.0], 0.5 * std::f64::consts::PI)?),
                );
                Ok((scene, vec![magnet.into()], vec![sensor.into()]))
            }
        }
    }
}

fn print_usage() {
    eprintln!(
        r#"Usage:
  cargo run -- [cube|collection|spin] [field=b|h] [sum] [nosqueeze]
             [config=FILE] [out=DIR] [run=RUN_ID]

Notes:
  - config=FILE loads a JSON RunConfig; CLI flags override its output section.
  - The run directory receives config.json and field.csv (one row per vector,
    leading columns are the array indices).
  - Set RUST_LOG=debug for per-evaluation diagnostics.
"#
    );
}

fn sanitize_run_id(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn default_run_id(preset: Preset, kind: FieldKind) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| std::time::Duration::from_secs(0));
    format!(
        "{}{:03}_{}_{}",
        now.as_secs(),
        now.subsec_millis(),
        preset.as_str(),
        kind.as_str().to_ascii_lowercase()
    )
}

fn unique_run_dir(out_root: &str, run_id: &str) -> PathBuf {
    let base = PathBuf::from(out_root);
    let dir = base.join(run_id);
    if !dir.exists() {
        return dir;
    }
    (1..1000)
        .map(|k| base.join(format!("{}_{}", run_id, k)))
        .find(|cand| !cand.exists())
        .unwrap_or(dir)
}

/// One CSV row per field vector: array indices, then the three components.
fn write_csv(path: &Path, field: &ArrayD<f64>, kind: FieldKind) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    let shape = field.shape();
    let lead = &shape[..shape.len().saturating_sub(1)];

    let mut header: Vec<String> = (0..lead.len()).map(|i| format!("i{i}")).collect();
    for c in ["x", "y", "z"] {
        header.push(format!("{}{} [{}]", kind.as_str(), c, kind.unit()));
    }
    writeln!(w, "{}", header.join(","))?;

    let values: Vec<f64> = field.iter().copied().collect();
    for (row, v) in values.chunks(3).enumerate() {
        let mut idx = vec![0usize; lead.len()];
        let mut rem = row;
        for (slot, &d) in idx.iter_mut().zip(lead).rev() {
            *slot = rem % d;
            rem /= d;
        }
        let mut cols: Vec<String> = idx.iter().map(|i| i.to_string()).collect();
        cols.extend(v.iter().map(|x| format!("{x:.9e}")));
        writeln!(w, "{}", cols.join(","))?;
    }
    w.flush()
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();
    let argv: Vec<String> = env::args().collect();

    let mut preset = Preset::Cube;
    let mut config_path: Option<PathBuf> = None;
    let mut field_override: Option<FieldKind> = None;
    let mut sum_flag = false;
    let mut nosqueeze_flag = false;
    let mut out_root_override: Option<String> = None;
    let mut run_id_override: Option<String> = None;

    for arg in argv.iter().skip(1) {
        if arg == "-h" || arg == "--help" || arg == "help" {
            print_usage();
            return Ok(());
        }
        if let Some(p) = Preset::from_arg(arg) {
            preset = p;
            continue;
        }
        if arg == "sum" {
            sum_flag = true;
            continue;
        }
        if arg == "nosqueeze" {
            nosqueeze_flag = true;
            continue;
        }
        if let Some(v) = arg.strip_prefix("field=") {
            field_override = FieldKind::from_arg(v.trim());
            if field_override.is_none() {
                warn!("unknown field '{v}', expected b or h");
            }
            continue;
        }
        if let Some(v) = arg.strip_prefix("config=") {
            config_path = Some(PathBuf::from(v));
            continue;
        }
        if let Some(v) = arg.strip_prefix("out=") {
            out_root_override = Some(v.to_string());
            continue;
        }
        if let Some(v) = arg.strip_prefix("run=") {
            run_id_override = Some(v.to_string());
            continue;
        }
        warn!("ignoring unknown argument '{arg}'");
    }

    let mut cfg = match &config_path {
        Some(p) => RunConfig::load(p)?,
        None => RunConfig::default(),
    };
    if let Some(k) = field_override {
        cfg.output.field = k;
    }
    if sum_flag {
        cfg.output.options.sum_over_sources = true;
    }
    if nosqueeze_flag {
        cfg.output.options.squeeze = false;
    }
    if let Some(o) = out_root_override {
        cfg.output.out_root = o;
    }
    let kind = cfg.output.field;
    let run_id = sanitize_run_id(
        &run_id_override
            .or_else(|| cfg.output.run_id.clone())
            .unwrap_or_else(|| default_run_id(preset, kind)),
    );
    cfg.output.run_id = Some(run_id.clone());

    let (scene, sources, observers) = preset.build()?;
    let engine = Engine::from_config(&cfg)?;
    let field = engine.compute(&scene, kind, &sources, &observers, cfg.output.options)?;

    info!(preset = preset.as_str(), shape = ?field.shape(), "field computed");
    println!("{} [{}] shape {:?}", kind.as_str(), kind.unit(), field.shape());
    println!("{field:.6}");

    create_dir_all(&cfg.output.out_root)?;
    let run_dir = unique_run_dir(&cfg.output.out_root, &run_id);
    create_dir_all(&run_dir)?;
    cfg.write_to_dir(&run_dir)?;
    write_csv(&run_dir.join("field.csv"), &field, kind)?;
    info!("outputs written to {}", run_dir.display());
    Ok(())
}
