use anyhow::Context;
use clap::{Parser, ValueEnum};
use generator::profile::{write_synthetic_scans, GeneratorConfig};
use log::info;
use resicore::mapping::ColorMap;
use resicore::render::RenderSummary;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use workflow::config::{ArgSettings, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Color,
    Curve,
}

#[derive(Parser)]
#[command(author, version, about = "Overlay resistograph scans on a tomogram cross-section")]
struct Args {
    /// Directory holding the scan files (and an optional nodes.csv)
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Load the whole render setup from YAML; geometry and render flags are ignored
    #[arg(long)]
    config: Option<PathBuf>,
    /// Tomogram image placed under the scans
    #[arg(long)]
    background: Option<PathBuf>,
    /// Plane extent of the background as minx,miny,maxx,maxy
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    extent_bbox: Option<[f64; 4]>,
    #[arg(long, default_value = "overlay.png")]
    out: PathBuf,
    /// Stem radius in plane units
    #[arg(long, default_value_t = 150.0)]
    radius: f64,
    /// Depth allowed past the far side of the stem before a warning
    #[arg(long, default_value_t = 0.0)]
    tolerance: f64,
    #[arg(long, default_value_t = 800)]
    width: u32,
    #[arg(long, default_value_t = 600)]
    height: u32,
    #[arg(long, value_enum, default_value_t = ModeArg::Color)]
    mode: ModeArg,
    #[arg(long, default_value = "gray")]
    cmap: ColorMap,
    /// Fixed lower bound of the color range (requires --max)
    #[arg(long, allow_hyphen_values = true)]
    min: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    max: Option<f64>,
    #[arg(long, default_value_t = 8.0)]
    line_width: f32,
    #[arg(long, default_value_t = 20.0)]
    amplitude: f64,
    /// Drop samples deeper than this
    #[arg(long)]
    max_depth: Option<f64>,
    /// Savitzky-Golay window length; enables smoothing
    #[arg(long)]
    smooth_window: Option<usize>,
    #[arg(long, default_value_t = 3)]
    smooth_order: usize,
    /// Draw depth ticks along each drill path
    #[arg(long, default_value_t = false)]
    ticks: bool,
    /// Draw a two-segment scale in the lower-left corner
    #[arg(long, default_value_t = false)]
    scale_bar: bool,
    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,
    /// Generate this many synthetic scans into the data directory first
    #[arg(long)]
    synthetic: Option<usize>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn parse_bbox(value: &str) -> Result<[f64; 4], String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|err| format!("'{}': {}", part, err)))
        .collect::<Result<Vec<_>, _>>()?;
    <[f64; 4]>::try_from(parts.as_slice())
        .map_err(|_| format!("expected minx,miny,maxx,maxy, got {} value(s)", parts.len()))
}

#[derive(Serialize)]
struct RunReport {
    output: PathBuf,
    scans_drawn: usize,
    render: RenderSummary,
    issues: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = &args.config {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(ArgSettings {
            data_dir: args.data_dir.clone(),
            radius: args.radius,
            tolerance: args.tolerance,
            width: args.width,
            height: args.height,
            curve: matches!(args.mode, ModeArg::Curve),
            cmap: args.cmap,
            min: args.min,
            max: args.max,
            line_width: args.line_width,
            amplitude: args.amplitude,
            max_depth: args.max_depth,
            smoothing: args.smooth_window.map(|window| (window, args.smooth_order)),
            ticks: args.ticks,
            scale_bar: args.scale_bar,
            background: args.background.clone(),
            extent_bbox: args.extent_bbox,
        })?
    };

    if let Some(count) = args.synthetic {
        let generator = GeneratorConfig {
            count,
            radius: workflow_config.geometry.radius,
            seed: args.seed,
            ..GeneratorConfig::default()
        };
        let paths = write_synthetic_scans(&workflow_config.data_dir, &generator)?;
        info!(
            "generated {} synthetic scan(s) in {}",
            paths.len(),
            workflow_config.data_dir.display()
        );
    }

    let runner = Runner::new(workflow_config);
    let result = runner.execute()?;
    result
        .artifact
        .save_png(&args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;

    println!(
        "Overlay -> {} ({} scan(s), {} issue(s))",
        args.out.display(),
        result.artifact.draw_order.len(),
        result.issues.len()
    );
    for issue in &result.issues {
        eprintln!("warning: {}", issue);
    }

    if let Some(report_path) = &args.report {
        let report = RunReport {
            output: args.out.clone(),
            scans_drawn: result.artifact.draw_order.len(),
            render: result.artifact.summary(),
            issues: result.issues.iter().map(ToString::to_string).collect(),
        };
        let json = serde_json::to_string_pretty(&report).context("serializing run report")?;
        if let Some(parent) = report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(report_path, json)
            .with_context(|| format!("writing report {}", report_path.display()))?;
    }

    Ok(())
}
