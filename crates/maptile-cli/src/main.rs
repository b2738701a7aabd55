//! Maptile command-line tool.
//!
//! Thin dispatch over `maptile-core`:
//! - `rotateImage`: rotate a map tile by tile
//! - `splitImage`: build a tile pyramid with an `info.json` manifest
//! - `mergeImage`: merge an alpha-masked update into a base map
//! - `overlayImage`: alpha-over an update onto a base map in color

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use maptile_core::{
    MergeConfig, PyramidBuilder, PyramidConfig, RotateConfig, RotationEngine, TileMerger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    #[value(name = "rotateImage", alias = "rotate-image")]
    RotateImage,
    #[value(name = "splitImage", alias = "split-image")]
    SplitImage,
    #[value(name = "mergeImage", alias = "merge-image")]
    MergeImage,
    #[value(name = "overlayImage", alias = "overlay-image")]
    OverlayImage,
}

#[derive(Parser, Debug)]
#[command(name = "maptile")]
#[command(about = "Rotate, tile and merge large raster maps")]
struct Args {
    /// Operation to run
    #[arg(long, value_enum)]
    action: Action,

    /// Map path. Without the .png suffix for rotateImage; the output file
    /// for mergeImage and overlayImage.
    #[arg(long, alias = "imagePath")]
    image_path: Option<PathBuf>,

    /// Tile edge in pixels (default: 100 for rotation, 512 for pyramids)
    #[arg(long, alias = "tileSize")]
    tile_size: Option<u32>,

    /// Rotation angle in degrees, positive is clockwise
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    angle: f64,

    /// Scale between successive pyramid levels, in (0, 1)
    #[arg(long, default_value_t = 0.5)]
    ratio: f64,

    /// Directory receiving the {map-name} tile folder
    #[arg(long, alias = "outputDir")]
    output_dir: Option<PathBuf>,

    /// Name of the map, used as the tile folder name
    #[arg(long, alias = "mapName", default_value = "RoboGo-1-1-1")]
    map_name: String,

    /// Checksum recorded in the manifest
    #[arg(long, alias = "mapMd5", default_value = "")]
    map_md5: String,

    /// Base map for merges
    #[arg(long, alias = "sourceData")]
    source_data: Option<PathBuf>,

    /// Updated map for merges
    #[arg(long, alias = "newData")]
    new_data: Option<PathBuf>,

    /// Prefix stripped from paths recorded in the manifest
    #[arg(long, alias = "parentDir", default_value = "")]
    parent_dir: String,

    /// Log level
    #[arg(long, default_value = "info", env = "MAPTILE_LOG")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    info!(action = ?args.action, "Starting maptile");
    match args.action {
        Action::RotateImage => rotate(args),
        Action::SplitImage => split(args),
        Action::MergeImage => {
            let (base, updated, output) = merge_paths(args)?;
            let stats = TileMerger::new(MergeConfig::default())
                .merge(base, updated, output)
                .with_context(|| format!("merging {}", updated.display()))?;
            info!(merged = stats.blocks_merged, "Done");
            Ok(())
        }
        Action::OverlayImage => {
            let (base, updated, output) = merge_paths(args)?;
            TileMerger::new(MergeConfig::default())
                .overlay(base, updated, output)
                .with_context(|| format!("overlaying {}", updated.display()))
        }
    }
}

fn required<'a>(value: &'a Option<PathBuf>, flag: &str) -> Result<&'a Path> {
    match value {
        Some(path) => Ok(path.as_path()),
        None => bail!("--{} is required for this action", flag),
    }
}

/// `maps/floor` -> `maps/floor.png`.
fn with_png_suffix(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".png");
    PathBuf::from(name)
}

fn rotate(args: &Args) -> Result<()> {
    let source = with_png_suffix(required(&args.image_path, "image-path")?);
    let defaults = RotateConfig::default();
    let config = RotateConfig {
        tile_size: args.tile_size.unwrap_or(defaults.tile_size),
        angle_degrees: args.angle,
        ..defaults
    };
    let output = RotationEngine::new(config)
        .rotate_file(&source)
        .with_context(|| format!("rotating {}", source.display()))?;
    info!(output = %output.display(), "Done");
    Ok(())
}

fn split(args: &Args) -> Result<()> {
    let source = required(&args.image_path, "image-path")?;
    let output_dir = required(&args.output_dir, "output-dir")?;
    if !(args.ratio > 0.0 && args.ratio < 1.0) {
        bail!("--ratio must be between 0 and 1 exclusive, got {}", args.ratio);
    }

    let defaults = PyramidConfig::default();
    let config = PyramidConfig {
        tile_size: args.tile_size.unwrap_or(defaults.tile_size),
        downscale_ratio: args.ratio,
        path_strip_prefix: args.parent_dir.clone(),
        ..defaults
    };
    let manifest = PyramidBuilder::new(config)
        .build_file(source, &args.map_name, &args.map_md5, output_dir)
        .with_context(|| format!("building pyramid for {}", source.display()))?;
    info!(tiles = manifest.tiles.len(), "Done");
    Ok(())
}

fn merge_paths(args: &Args) -> Result<(&Path, &Path, &Path)> {
    Ok((
        required(&args.source_data, "source-data")?,
        required(&args.new_data, "new-data")?,
        required(&args.image_path, "image-path")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("maptile").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_legacy_camel_case_flags() {
        let args = parse(&[
            "--action",
            "splitImage",
            "--imagePath",
            "/maps/floor.png",
            "--tileSize",
            "256",
            "--mapName",
            "lab",
            "--mapMd5",
            "abc",
            "--outputDir",
            "/out",
            "--parentDir",
            "/srv",
        ]);
        assert_eq!(args.action, Action::SplitImage);
        assert_eq!(args.image_path, Some(PathBuf::from("/maps/floor.png")));
        assert_eq!(args.tile_size, Some(256));
        assert_eq!(args.map_name, "lab");
        assert_eq!(args.map_md5, "abc");
        assert_eq!(args.output_dir, Some(PathBuf::from("/out")));
        assert_eq!(args.parent_dir, "/srv");
    }

    #[test]
    fn test_kebab_case_flags_and_defaults() {
        let args = parse(&[
            "--action",
            "merge-image",
            "--source-data",
            "a.png",
            "--new-data",
            "b.png",
            "--image-path",
            "c.png",
        ]);
        assert_eq!(args.action, Action::MergeImage);
        assert_eq!(args.map_name, "RoboGo-1-1-1");
        assert_eq!(args.ratio, 0.5);
        assert_eq!(args.tile_size, None);

        let (base, updated, output) = merge_paths(&args).unwrap();
        assert_eq!(base, Path::new("a.png"));
        assert_eq!(updated, Path::new("b.png"));
        assert_eq!(output, Path::new("c.png"));
    }

    #[test]
    fn test_negative_angle() {
        let args = parse(&["--action", "rotateImage", "--imagePath", "m", "--angle", "-30"]);
        assert_eq!(args.angle, -30.0);
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(Args::try_parse_from(["maptile", "--action", "spin"]).is_err());
    }

    #[test]
    fn test_png_suffix_appended() {
        assert_eq!(
            with_png_suffix(Path::new("maps/floor")),
            PathBuf::from("maps/floor.png")
        );
    }

    #[test]
    fn test_missing_paths_reported() {
        let args = parse(&["--action", "mergeImage"]);
        let err = merge_paths(&args).unwrap_err();
        assert!(err.to_string().contains("--source-data"));
    }

    #[test]
    fn test_ratio_out_of_range_rejected() {
        let args = parse(&[
            "--action",
            "splitImage",
            "--image-path",
            "x.png",
            "--output-dir",
            "out",
            "--ratio",
            "1.5",
        ]);
        assert!(split(&args).unwrap_err().to_string().contains("--ratio"));
    }
}
