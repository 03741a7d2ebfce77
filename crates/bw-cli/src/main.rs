mod report;

use anyhow::{Context, Result, bail};
use bw_render::{ContainerSize, Viewport};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Check a Blockwright project's links and culling", long_about = None)]
struct Cli {
    /// Project file (.json, or .msgpack snapshot)
    #[arg(value_name = "PROJECT_FILE")]
    project: PathBuf,

    /// Viewport as X,Y,ZOOM
    #[arg(long, value_parser = parse_viewport, default_value = "0,0,1")]
    viewport: Viewport,

    /// Container size as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_container, default_value = "1280x720")]
    container: ContainerSize,

    /// Culling margin in screen pixels (overrides the project config)
    #[arg(long)]
    margin: Option<f64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn parse_viewport(s: &str) -> Result<Viewport> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("bad number in viewport '{s}'"))?;
    let [x, y, zoom] = parts[..] else {
        bail!("viewport must be X,Y,ZOOM, got '{s}'");
    };
    if zoom <= 0.0 || !zoom.is_finite() {
        bail!("zoom must be positive, got {zoom}");
    }
    Ok(Viewport::new(x, y, zoom))
}

fn parse_container(s: &str) -> Result<ContainerSize> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .with_context(|| format!("container must be WIDTHxHEIGHT, got '{s}'"))?;
    let width: f64 = w.trim().parse().context("bad container width")?;
    let height: f64 = h.trim().parse().context("bad container height")?;
    Ok(ContainerSize::new(width, height))
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    let file = report::load_project(&cli.project)?;
    let config = report::cull_config(&file, cli.margin)?;
    let report = report::inspect(&file, cli.viewport, cli.container, config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        log::warn!("{} link issue(s) in {}", report.issues.len(), cli.project.display());
        Ok(ExitCode::FAILURE)
    }
}
