//! Image-pyramid arithmetic.
//!
//! Zoom level 0 is the most zoomed-out level and the maximum level is the
//! native resolution. Every level below the maximum halves the pixel
//! dimensions and doubles the micrometres covered by one pixel.
//!
//! All functions here are pure given a [`SlideInfo`]. A document missing a
//! field or carrying a malformed one is not an error at this layer: the
//! problem is logged and the function answers with zero (or an empty
//! collection), so derived queries never fail once the document exists.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::metadata::{value_as_u64, SlideInfo, ZoomField};

/// Objective magnification of the reference resolution.
pub const REFERENCE_MAGNIFICATION: u32 = 40;

/// Micrometres per pixel at the reference magnification.
pub const REFERENCE_MICROMETRES_PER_PIXEL: f64 = 0.25;

/// Highest zoom level accepted from a slide document.
pub const MAX_PLAUSIBLE_ZOOM_LEVEL: u32 = 64;

/// Tile grid of one zoom level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TileCount {
    /// Tiles along X
    pub x: u64,
    /// Tiles along Y
    pub y: u64,
    /// `x * y`
    pub total: u64,
}

impl TileCount {
    /// Tile grid covering `width` x `height` pixels with square tiles.
    ///
    /// Returns an empty grid when `tile_edge` is zero.
    pub fn from_pixels(width: u64, height: u64, tile_edge: u32) -> Self {
        if tile_edge == 0 {
            return Self::default();
        }
        let edge = u64::from(tile_edge);
        let x = width.div_ceil(edge);
        let y = height.div_ceil(edge);
        Self { x, y, total: x * y }
    }
}

/// Scale factor of `zoom_level` relative to `max_zoom_level`.
pub fn zoom_factor(zoom_level: u32, max_zoom_level: u32) -> f64 {
    2f64.powi(zoom_level as i32 - max_zoom_level as i32)
}

impl SlideInfo {
    fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("<unnamed slide>")
    }

    /// Highest zoom level, i.e. the native resolution.
    ///
    /// Uses `MaxZoomLevel` when present, `NumberOfZoomLevels` otherwise.
    pub fn max_zoom_level(&self) -> u32 {
        let (field, value) = match self.zoom_field() {
            ZoomField::MaxZoomLevel(value) => ("MaxZoomLevel", value),
            ZoomField::NumberOfZoomLevels(value) => ("NumberOfZoomLevels", value),
            ZoomField::Missing => {
                warn!(slide = self.display_name(), "No zoom level information in slide metadata");
                return 0;
            }
        };

        match value_as_u64(value).and_then(|v| u32::try_from(v).ok()) {
            Some(level) if level <= MAX_PLAUSIBLE_ZOOM_LEVEL => level,
            Some(level) => {
                warn!(
                    slide = self.display_name(),
                    field = field,
                    level = level,
                    "Implausible zoom level in slide metadata"
                );
                0
            }
            None => {
                warn!(
                    slide = self.display_name(),
                    field = field,
                    value = %value,
                    "Unparseable zoom level in slide metadata"
                );
                0
            }
        }
    }

    /// Micrometres per pixel (X, Y) at a zoom level.
    ///
    /// `None` or the maximum level returns the native values; lower levels
    /// cover more micrometres per pixel.
    pub fn pixels_per_micrometer(&self, zoom_level: Option<u32>) -> (f64, f64) {
        let Some((x, y)) = self.micrometres_per_pixel() else {
            warn!(slide = self.display_name(), "Missing micrometres per pixel in slide metadata");
            return (0.0, 0.0);
        };

        let max_zoom_level = self.max_zoom_level();
        match zoom_level {
            Some(level) if level != max_zoom_level => {
                let factor = zoom_factor(level, max_zoom_level);
                (x / factor, y / factor)
            }
            _ => (x, y),
        }
    }

    /// Pixel dimensions (width, height) at a zoom level, truncated.
    pub fn pixel_dimensions(&self, zoom_level: Option<u32>) -> (u64, u64) {
        let (Some(width), Some(height)) = (self.width(), self.height()) else {
            warn!(slide = self.display_name(), "Missing pixel dimensions in slide metadata");
            return (0, 0);
        };

        let max_zoom_level = self.max_zoom_level();
        match zoom_level {
            Some(level) if level != max_zoom_level => {
                let factor = zoom_factor(level, max_zoom_level);
                ((width as f64 * factor) as u64, (height as f64 * factor) as u64)
            }
            _ => (width, height),
        }
    }

    /// Tile grid at a zoom level for tiles of `tile_edge` pixels.
    pub fn number_of_tiles(&self, zoom_level: Option<u32>, tile_edge: u32) -> TileCount {
        if tile_edge == 0 {
            warn!(slide = self.display_name(), "Tile edge of zero pixels requested");
            return TileCount::default();
        }
        let (width, height) = self.pixel_dimensions(zoom_level);
        TileCount::from_pixels(width, height, tile_edge)
    }

    /// Tile grid at a zoom level using the slide's own tile size.
    pub fn tile_grid(&self, zoom_level: Option<u32>) -> TileCount {
        match self.tile_size() {
            Some(edge) => self.number_of_tiles(zoom_level, edge),
            None => {
                warn!(slide = self.display_name(), "Missing tile size in slide metadata");
                TileCount::default()
            }
        }
    }

    /// Physical size of the sample (width, height) in micrometres.
    ///
    /// Independent of zoom level.
    pub fn physical_dimensions(&self) -> (f64, f64) {
        let (width, height) = self.pixel_dimensions(None);
        let (x, y) = self.pixels_per_micrometer(None);
        (width as f64 * x, height as f64 * y)
    }

    /// Objective magnification represented at a zoom level.
    ///
    /// With `exact == false` the ratio to the reference resolution is
    /// truncated before dividing, which buckets slides into nominal
    /// magnifications (40x, 20x, 10x, ...). With `exact == true` only the
    /// final result is truncated.
    pub fn magnification(&self, zoom_level: Option<u32>, exact: bool) -> u32 {
        let (ppm, _) = self.pixels_per_micrometer(zoom_level);
        if ppm <= 0.0 {
            return 0;
        }

        let ratio = ppm / REFERENCE_MICROMETRES_PER_PIXEL;
        if exact {
            return (f64::from(REFERENCE_MAGNIFICATION) / ratio) as u32;
        }

        let bucket = ratio as u64;
        if bucket == 0 {
            warn!(
                slide = self.display_name(),
                micrometres_per_pixel = ppm,
                "Resolution finer than the reference objective; no nominal magnification"
            );
            return 0;
        }
        (u64::from(REFERENCE_MAGNIFICATION) / bucket) as u32
    }

    /// Tile grids of every zoom level whose tile count exceeds `min_tiles`.
    ///
    /// Levels keep their absolute numbering.
    pub fn zoom_levels(&self, tile_edge: u32, min_tiles: u64) -> BTreeMap<u32, TileCount> {
        (0..=self.max_zoom_level())
            .map(|level| (level, self.number_of_tiles(Some(level), tile_edge)))
            .filter(|(_, count)| count.total > min_tiles)
            .collect()
    }

    /// Zoom levels (ascending) whose tile count exceeds `min_tiles`.
    pub fn zoom_levels_with_minimum_tiles(&self, tile_edge: u32, min_tiles: u64) -> Vec<u32> {
        self.zoom_levels(tile_edge, min_tiles)
            .into_keys()
            .collect()
    }

    /// Number of channels in the first layer (1 for brightfield).
    pub fn number_of_channels(&self) -> usize {
        let channels = self
            .layers()
            .and_then(|layers| layers.first())
            .and_then(|layer| layer.channels.as_ref());
        match channels {
            Some(channels) => channels.len(),
            None => {
                warn!(slide = self.display_name(), "Missing channel information in slide metadata");
                0
            }
        }
    }

    /// Number of (z-stacked) layers.
    pub fn number_of_layers(&self) -> usize {
        match self.layers() {
            Some(layers) => layers.len(),
            None => {
                warn!(slide = self.display_name(), "Missing layer information in slide metadata");
                0
            }
        }
    }

    /// Alias of [`number_of_layers`](Self::number_of_layers).
    pub fn number_of_z_stack_layers(&self) -> usize {
        self.number_of_layers()
    }

    pub fn is_fluorescent(&self) -> bool {
        self.number_of_channels() > 1
    }

    pub fn is_multi_layer(&self) -> bool {
        self.number_of_layers() > 1
    }

    /// Alias of [`is_multi_layer`](Self::is_multi_layer).
    pub fn is_z_stack(&self) -> bool {
        self.is_multi_layer()
    }

    /// Last modification time as `YYYY-MM-DD HH:MM:SS` (UTC).
    pub fn last_modified_date(&self) -> Option<String> {
        let raw = self.last_modified.as_deref()?;
        match parse_date_stamp(raw) {
            Some(date) => Some(date.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => {
                warn!(slide = self.display_name(), stamp = raw, "Unparseable LastModified stamp");
                None
            }
        }
    }
}

/// Parse a `/Date(<millis>[+zone])/` stamp.
fn parse_date_stamp(raw: &str) -> Option<DateTime<Utc>> {
    let start = raw.find('(')? + 1;
    let inner = &raw[start..];
    let end = inner
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(inner.len());
    let millis: i64 = inner[..end].parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

// =============================================================================
// Tests
// =============================================================================
