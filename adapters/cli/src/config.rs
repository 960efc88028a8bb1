use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use geocoin_core::{GridConfig, LatLng};
use serde::Deserialize;

/// Largest neighborhood radius, in tiles, that a scan will cover.
const MAX_NEIGHBORHOOD_RADIUS: u32 = 256;

/// Optional overrides read from a TOML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    origin: Option<[f64; 2]>,
    tile_degrees: Option<f64>,
    neighborhood_radius: Option<u32>,
    cache_chance: Option<f64>,
    quantization: Option<f64>,
}

/// Resolves the grid configuration, layering the file at `path` (if any) over
/// the defaults.
pub(crate) fn load_grid_config(path: Option<&Path>) -> Result<GridConfig> {
    let Some(path) = path else {
        return Ok(GridConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    parse_grid_config(&contents)
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

fn parse_grid_config(contents: &str) -> Result<GridConfig> {
    let file: ConfigFile =
        toml::from_str(contents).context("failed to parse configuration toml contents")?;
    let defaults = GridConfig::default();

    let origin = file
        .origin
        .map_or(defaults.origin(), |[lat, lng]| LatLng::new(lat, lng));
    let tile_degrees = file.tile_degrees.unwrap_or(defaults.tile_degrees());
    let neighborhood_radius = file
        .neighborhood_radius
        .unwrap_or(defaults.neighborhood_radius());
    let cache_chance = file.cache_chance.unwrap_or(defaults.cache_chance());
    let quantization = file.quantization.unwrap_or(defaults.quantization());

    if !(-90.0..=90.0).contains(&origin.lat()) || !(-180.0..=180.0).contains(&origin.lng()) {
        bail!("origin {origin} lies outside valid coordinates");
    }
    if !(tile_degrees > 0.0) {
        bail!("tile_degrees must be positive, got {tile_degrees}");
    }
    if !(0.0..=1.0).contains(&cache_chance) {
        bail!("cache_chance must lie within [0, 1], got {cache_chance}");
    }
    if !(quantization > 0.0) {
        bail!("quantization must be positive, got {quantization}");
    }
    if tile_degrees * quantization < 1.0 {
        bail!(
            "tiles of {tile_degrees} degrees are smaller than one cell at quantization \
             {quantization}; caches would share cells"
        );
    }
    if neighborhood_radius > MAX_NEIGHBORHOOD_RADIUS {
        bail!(
            "neighborhood_radius must not exceed {MAX_NEIGHBORHOOD_RADIUS}, got {neighborhood_radius}"
        );
    }

    Ok(GridConfig::new(
        origin,
        tile_degrees,
        neighborhood_radius,
        cache_chance,
        quantization,
    ))
}
