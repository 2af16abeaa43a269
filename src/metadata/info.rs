//! Typed slide metadata document.
//!
//! The server describes a slide with a nested JSON object. It is decoded
//! once, at fetch time, into [`SlideInfo`]. Numeric fields are kept as raw
//! JSON values so that a malformed number only affects the accessor that
//! reads it, never the decoding of the whole document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Metadata document of one slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SlideInfo {
    /// Server-declared canonical path of the slide
    #[serde(default)]
    pub filename: Option<String>,

    /// Server-declared unique identifier (absent on the local instance)
    #[serde(default, rename = "UID")]
    pub uid: Option<String>,

    #[serde(default)]
    width: Option<Value>,

    #[serde(default)]
    height: Option<Value>,

    #[serde(default)]
    micrometres_per_pixel_x: Option<Value>,

    #[serde(default)]
    micrometres_per_pixel_y: Option<Value>,

    #[serde(default)]
    tile_size: Option<Value>,

    #[serde(default)]
    max_zoom_level: Option<Value>,

    #[serde(default)]
    number_of_zoom_levels: Option<Value>,

    /// Raw last-modified stamp, e.g. `/Date(1533139237000)/`
    #[serde(default)]
    pub last_modified: Option<String>,

    #[serde(default)]
    time_frames: Option<Vec<TimeFrame>>,

    #[serde(default)]
    associated_image_types: Option<Vec<String>>,

    /// Every other field the server sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One timeframe of a slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeFrame {
    #[serde(default)]
    pub layers: Option<Vec<Layer>>,
}

/// One (z-stack) layer of a timeframe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Layer {
    #[serde(default)]
    pub channels: Option<Vec<Value>>,
}

/// Which zoom field a document carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ZoomField<'a> {
    MaxZoomLevel(&'a Value),
    NumberOfZoomLevels(&'a Value),
    Missing,
}

impl SlideInfo {
    /// Decode a document from a JSON object.
    pub fn from_object(object: Map<String, Value>, context: &str) -> Result<Self, ClientError> {
        serde_json::from_value(Value::Object(object)).map_err(|e| ClientError::Decode {
            context: context.to_string(),
            message: e.to_string(),
        })
    }

    /// Native pixel width.
    pub fn width(&self) -> Option<u64> {
        self.width.as_ref().and_then(value_as_u64)
    }

    /// Native pixel height.
    pub fn height(&self) -> Option<u64> {
        self.height.as_ref().and_then(value_as_u64)
    }

    /// Native micrometres per pixel along X and Y.
    pub fn micrometres_per_pixel(&self) -> Option<(f64, f64)> {
        let x = self.micrometres_per_pixel_x.as_ref().and_then(value_as_f64)?;
        let y = self.micrometres_per_pixel_y.as_ref().and_then(value_as_f64)?;
        Some((x, y))
    }

    /// Edge length of a square tile in pixels.
    pub fn tile_size(&self) -> Option<u32> {
        self.tile_size
            .as_ref()
            .and_then(value_as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }

    /// Image types stored alongside the slide (thumbnail, barcode, ...).
    pub fn associated_image_types(&self) -> &[String] {
        self.associated_image_types.as_deref().unwrap_or(&[])
    }

    /// Layers of the first timeframe, if the document describes any.
    pub fn layers(&self) -> Option<&[Layer]> {
        self.time_frames.as_ref()?.first()?.layers.as_deref()
    }

    pub(crate) fn zoom_field(&self) -> ZoomField<'_> {
        match (&self.max_zoom_level, &self.number_of_zoom_levels) {
            (Some(value), _) if !value.is_null() => ZoomField::MaxZoomLevel(value),
            (_, Some(value)) if !value.is_null() => ZoomField::NumberOfZoomLevels(value),
            _ => ZoomField::Missing,
        }
    }
}

/// Read an unsigned integer from a JSON number or numeric string.
pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a float from a JSON number or numeric string.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
