// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: oriented bounding boxes and point deduplication for point sets.
//!
//! Point files are JSON arrays of `[x, y, z]` triples.
//!
//! Usage:
//!   sewkit obb <points.json> [--optimal] [--tolerance T]
//!   sewkit interfere <a.json> <b.json> [--optimal]
//!   sewkit dedup <points.json> --tolerance T

use std::env;
use std::fs;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use nalgebra::Point3;
use sewkit_bnd::Obb;
use sewkit_spatial::merge_coincident_points;

/// Options shared by the sub-commands.
#[derive(Debug, Default)]
struct Options {
    inputs: Vec<String>,
    optimal: bool,
    tolerance: Option<f64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return ExitCode::SUCCESS;
    }

    match run(&args[1], &args[2..]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: &str, rest: &[String]) -> Result<()> {
    let options = parse_options(rest)?;
    match command {
        "obb" => cmd_obb(&options),
        "interfere" => cmd_interfere(&options),
        "dedup" => cmd_dedup(&options),
        other => {
            print_usage();
            bail!("unknown command: {other}")
        }
    }
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--optimal" => options.optimal = true,
            "--tolerance" => {
                i += 1;
                let value = args.get(i).context("--tolerance needs a value")?;
                let tolerance: f64 = value
                    .parse()
                    .with_context(|| format!("invalid tolerance: {value}"))?;
                options.tolerance = Some(tolerance);
            }
            flag if flag.starts_with("--") => bail!("unknown option: {flag}"),
            input => options.inputs.push(input.to_string()),
        }
        i += 1;
    }
    Ok(options)
}

fn read_points(path: &str) -> Result<Vec<Point3<f64>>> {
    let content = fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
    let raw: Vec<[f64; 3]> =
        serde_json::from_str(&content).with_context(|| format!("cannot parse points in {path}"))?;
    tracing::debug!(path, count = raw.len(), "Loaded points");
    Ok(raw.into_iter().map(Point3::from).collect())
}

fn expect_inputs(options: &Options, count: usize, command: &str) -> Result<()> {
    if options.inputs.len() != count {
        bail!(
            "{command} expects {count} input file(s), got {}",
            options.inputs.len()
        );
    }
    Ok(())
}

fn fit(points: &[Point3<f64>], options: &Options) -> Obb {
    match options.tolerance {
        Some(tolerance) => {
            let tolerances = vec![tolerance.abs(); points.len()];
            Obb::from_points(points, Some(&tolerances), options.optimal)
        }
        None => Obb::from_points(points, None, options.optimal),
    }
}

fn cmd_obb(options: &Options) -> Result<()> {
    expect_inputs(options, 1, "obb")?;
    let points = read_points(&options.inputs[0])?;
    let obb = fit(&points, options);
    if obb.is_void() {
        println!("{obb}");
    } else {
        println!("{}", obb.to_json()?);
    }
    Ok(())
}

fn cmd_interfere(options: &Options) -> Result<()> {
    expect_inputs(options, 2, "interfere")?;
    let a = fit(&read_points(&options.inputs[0])?, options);
    let b = fit(&read_points(&options.inputs[1])?, options);
    if a.is_out(&b) {
        println!("Boxes are out.");
    } else {
        println!("Boxes may interfere.");
    }
    Ok(())
}

fn cmd_dedup(options: &Options) -> Result<()> {
    expect_inputs(options, 1, "dedup")?;
    let tolerance = options.tolerance.context("dedup needs --tolerance")?;
    let points = read_points(&options.inputs[0])?;
    let (unique, _) = merge_coincident_points(&points, tolerance)?;

    let raw: Vec<[f64; 3]> = unique.iter().map(|p| [p.x, p.y, p.z]).collect();
    println!("{}", serde_json::to_string_pretty(&raw)?);
    eprintln!(
        "Merged {} of {} points ({} unique)",
        points.len() - unique.len(),
        points.len(),
        unique.len()
    );
    Ok(())
}

fn print_usage() {
    eprintln!("sewkit - oriented bounding boxes and point merging");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  sewkit obb <points.json> [--optimal] [--tolerance T]");
    eprintln!("  sewkit interfere <a.json> <b.json> [--optimal]");
    eprintln!("  sewkit dedup <points.json> --tolerance T");
    eprintln!();
    eprintln!("Point files are JSON arrays of [x, y, z].");
    eprintln!("Set RUST_LOG=debug for diagnostics.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_inputs() {
        let options = parse_options(&args(&["a.json", "--optimal", "--tolerance", "0.5"])).unwrap();
        assert_eq!(options.inputs, vec!["a.json".to_string()]);
        assert!(options.optimal);
        assert_eq!(options.tolerance, Some(0.5));
    }

    #[test]
    fn rejects_bad_options() {
        assert!(parse_options(&args(&["--tolerance"])).is_err());
        assert!(parse_options(&args(&["--tolerance", "abc"])).is_err());
        assert!(parse_options(&args(&["--verbose"])).is_err());
    }

    #[test]
    fn tolerance_pads_fitted_box() {
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let plain = fit(&points, &Options::default());
        let padded = fit(
            &points,
            &Options {
                tolerance: Some(0.1),
                ..Default::default()
            },
        );
        assert!(padded.volume() > plain.volume());
    }
}
