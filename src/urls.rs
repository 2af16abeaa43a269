//! URL construction for the slide server's endpoints.
//!
//! Every reference placed in a URL goes through [`normalize_slide_ref`] and
//! every query value is percent-encoded. Parameter order is preserved as
//! given, which the server's image endpoints rely on.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::ClientError;

/// Prefix of the JSON API.
pub const API_JSON: &str = "api/json/";

/// Prefix of the JSON query API.
pub const QUERY_JSON: &str = "query/json/";

/// Highest accepted image quality.
pub const MAX_QUALITY: u8 = 100;

/// Default DPI of rendered regions.
pub const DEFAULT_REGION_DPI: u32 = 300;

// =============================================================================
// Slide references
// =============================================================================

/// Strip exactly one leading `/` from a slide or directory reference.
pub fn normalize_slide_ref(slide_ref: &str) -> &str {
    slide_ref.strip_prefix('/').unwrap_or(slide_ref)
}

/// File name part of a slide reference.
pub fn slide_file_name(slide_ref: &str) -> &str {
    slide_ref
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(slide_ref)
}

/// Extension of a slide reference, without the dot.
pub fn slide_file_extension(slide_ref: &str) -> Option<&str> {
    let name = slide_file_name(slide_ref);
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() => Some(&name[pos + 1..]),
        _ => None,
    }
}

// =============================================================================
// Query building
// =============================================================================

/// Builder for `{base}{endpoint}?key=value&...` URLs.
#[derive(Debug, Clone)]
pub(crate) struct Query {
    url: String,
    has_params: bool,
}

impl Query {
    pub(crate) fn new(base_url: &str, endpoint: &str) -> Self {
        Self {
            url: format!("{}{}", base_url, endpoint),
            has_params: false,
        }
    }

    /// Append a parameter, percent-encoding its value.
    pub(crate) fn param(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.url.push(if self.has_params { '&' } else { '?' });
        self.has_params = true;
        self.url.push_str(key);
        self.url.push('=');
        self.url.push_str(&urlencoding::encode(&value.to_string()));
        self
    }

    /// Append a parameter only when a value is present.
    pub(crate) fn opt_param<V: fmt::Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    pub(crate) fn build(self) -> String {
        self.url
    }
}

// =============================================================================
// Image options
// =============================================================================

/// Encoding of images returned by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpg,
    Png,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            "png" => Ok(ImageFormat::Png),
            other => Err(ClientError::InvalidArgument(format!(
                "unknown image format '{}', expected jpg or png",
                other
            ))),
        }
    }
}

/// Reject a quality outside `0..=100`.
pub fn check_quality(quality: u8) -> Result<(), ClientError> {
    if quality > MAX_QUALITY {
        return Err(ClientError::InvalidArgument(format!(
            "quality must be between 0 and {}, got {}",
            MAX_QUALITY, quality
        )));
    }
    Ok(())
}

/// Options of a tile request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileOptions {
    pub format: ImageFormat,
    /// 0 (maximum compression) to 100 (no compression)
    pub quality: u8,
    pub z_stack: u32,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Jpg,
            quality: MAX_QUALITY,
            z_stack: 0,
        }
    }
}

/// Options of a region request.
///
/// `x`, `y`, `width` and `height` are in native pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOptions {
    pub x: u64,
    pub y: u64,
    pub width: u64,
    pub height: u64,
    pub z_stack: u32,
    pub format: ImageFormat,
    pub quality: u8,
    pub rotation: i32,
    pub contrast: i32,
    pub brightness: i32,
    pub post_gamma: i32,
    pub dpi: u32,
    pub flip_vertical: bool,
    pub flip_horizontal: bool,
    pub annotations_layer_type: Option<String>,
    pub draw_filename: i32,
    pub download_instead_of_display: bool,
    pub draw_scale_bar: bool,
    /// Per-channel gamma, sent comma-separated
    pub gamma: Vec<String>,
    /// Per-channel clipping, sent comma-separated
    pub channel_clipping: Vec<String>,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            z_stack: 0,
            format: ImageFormat::Jpg,
            quality: MAX_QUALITY,
            rotation: 0,
            contrast: 0,
            brightness: 0,
            post_gamma: 0,
            dpi: DEFAULT_REGION_DPI,
            flip_vertical: false,
            flip_horizontal: false,
            annotations_layer_type: None,
            draw_filename: 0,
            download_instead_of_display: false,
            draw_scale_bar: false,
            gamma: Vec::new(),
            channel_clipping: Vec::new(),
        }
    }
}

// =============================================================================
// Image URLs
// =============================================================================

/// Parameters shared by the tile and region endpoints, in server order.
fn image_query(base_url: &str, endpoint: &str, token: &str, slide_ref: &str, z_stack: u32) -> Query {
    Query::new(base_url, endpoint)
        .param("SessionID", token)
        .param("channels", 0)
        .param("layer", z_stack)
        .param("timeframe", 0)
        .param("layer", 0)
        .param("pathOrUid", normalize_slide_ref(slide_ref))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn tile_url(
    base_url: &str,
    token: &str,
    slide_ref: &str,
    x: u64,
    y: u64,
    zoom_level: u32,
    options: &TileOptions,
    use_cache: bool,
) -> Result<String, ClientError> {
    check_quality(options.quality)?;
    Ok(image_query(base_url, "tile", token, slide_ref, options.z_stack)
        .param("x", x)
        .param("y", y)
        .param("z", zoom_level)
        .param("format", options.format)
        .param("quality", options.quality)
        .param("cache", use_cache)
        .build())
}

pub(crate) fn region_url(
    base_url: &str,
    token: &str,
    slide_ref: &str,
    options: &RegionOptions,
    use_cache: bool,
) -> Result<String, ClientError> {
    check_quality(options.quality)?;
    Ok(image_query(base_url, "region", token, slide_ref, options.z_stack)
        .param("x", options.x)
        .param("y", options.y)
        .param("width", options.width)
        .param("height", options.height)
        .param("scale", 1)
        .param("format", options.format)
        .param("quality", options.quality)
        .param("rotation", options.rotation)
        .param("contrast", options.contrast)
        .param("brightness", options.brightness)
        .param("postGamma", options.post_gamma)
        .param("dpi", options.dpi)
        .param("flipVertical", options.flip_vertical)
        .param("flipHorizontal", options.flip_horizontal)
        .param(
            "annotationsLayerType",
            options.annotations_layer_type.as_deref().unwrap_or(""),
        )
        .param("drawFilename", options.draw_filename)
        .param("downloadInsteadOfDisplay", options.download_instead_of_display)
        .param("drawScaleBar", options.draw_scale_bar)
        .param("gamma", options.gamma.join(","))
        .param("channelClipping", options.channel_clipping.join(","))
        .param("cache", use_cache)
        .build())
}

pub(crate) fn thumbnail_url(
    base_url: &str,
    token: &str,
    slide_ref: &str,
    height: Option<u32>,
    width: Option<u32>,
) -> String {
    Query::new(base_url, "thumbnail")
        .param("SessionID", token)
        .param("pathOrUid", normalize_slide_ref(slide_ref))
        .opt_param("h", height.filter(|h| *h > 0))
        .opt_param("w", width.filter(|w| *w > 0))
        .build()
}

pub(crate) fn barcode_url(base_url: &str, token: &str, slide_ref: &str) -> String {
    Query::new(base_url, "barcode")
        .param("SessionID", token)
        .param("pathOrUid", normalize_slide_ref(slide_ref))
        .build()
}

// =============================================================================
// Tests
// =============================================================================
