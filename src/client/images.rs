//! Image URLs and raw image retrieval.
//!
//! Images are returned as encoded bytes (JPEG or PNG); decoding is left to
//! the caller.

use bytes::Bytes;
use tracing::debug;

use crate::error::ClientError;
use crate::transport::{Transport, TransportRequest};
use crate::urls::{self, normalize_slide_ref, Query, RegionOptions, TileOptions};

use super::Client;

impl<T: Transport> Client<T> {
    /// URL of one tile at `(x, y)` on `zoom_level`.
    pub async fn tile_url(
        &self,
        slide_ref: &str,
        x: u64,
        y: u64,
        zoom_level: u32,
        options: &TileOptions,
        token: Option<&str>,
    ) -> Result<String, ClientError> {
        let token = self.require_token(token).await?;
        let base = self.sessions.base_url(&token).await?;
        urls::tile_url(
            &base,
            &token,
            slide_ref,
            x,
            y,
            zoom_level,
            options,
            self.config.use_tile_cache,
        )
    }

    /// URL of a rendered region of the native image.
    pub async fn region_url(
        &self,
        slide_ref: &str,
        options: &RegionOptions,
        token: Option<&str>,
    ) -> Result<String, ClientError> {
        let token = self.require_token(token).await?;
        let base = self.sessions.base_url(&token).await?;
        urls::region_url(&base, &token, slide_ref, options, self.config.use_tile_cache)
    }

    /// URL of the slide thumbnail; zero or absent dimensions are left to the server.
    pub async fn thumbnail_url(
        &self,
        slide_ref: &str,
        height: Option<u32>,
        width: Option<u32>,
        token: Option<&str>,
    ) -> Result<String, ClientError> {
        let token = self.require_token(token).await?;
        let base = self.sessions.base_url(&token).await?;
        Ok(urls::thumbnail_url(&base, &token, slide_ref, height, width))
    }

    /// URL of the barcode (label) image.
    pub async fn barcode_url(&self, slide_ref: &str, token: Option<&str>) -> Result<String, ClientError> {
        let token = self.require_token(token).await?;
        let base = self.sessions.base_url(&token).await?;
        Ok(urls::barcode_url(&base, &token, slide_ref))
    }

    /// Alias of [`barcode_url`](Self::barcode_url).
    pub async fn label_url(&self, slide_ref: &str, token: Option<&str>) -> Result<String, ClientError> {
        self.barcode_url(slide_ref, token).await
    }

    /// Encoded bytes of one tile.
    pub async fn tile(
        &self,
        slide_ref: &str,
        x: u64,
        y: u64,
        zoom_level: u32,
        options: &TileOptions,
        token: Option<&str>,
    ) -> Result<Bytes, ClientError> {
        let token = self.require_token(token).await?;
        let url = self
            .tile_url(slide_ref, x, y, zoom_level, options, Some(&token))
            .await?;
        self.send_for(&token, TransportRequest::get_binary(url)).await
    }

    /// Encoded tiles of the inclusive rectangle `from..=to` on `zoom_level`.
    ///
    /// Tiles are returned row by row, then column by column.
    #[allow(clippy::too_many_arguments)]
    pub async fn tiles(
        &self,
        slide_ref: &str,
        from: (u64, u64),
        to: (u64, u64),
        zoom_level: u32,
        options: &TileOptions,
        token: Option<&str>,
    ) -> Result<Vec<((u64, u64), Bytes)>, ClientError> {
        let token = self.require_token(token).await?;
        let (from_x, from_y) = from;
        let (to_x, to_y) = to;
        if from_x > to_x || from_y > to_y {
            return Err(ClientError::InvalidArgument(format!(
                "empty tile rectangle ({}, {})..=({}, {})",
                from_x, from_y, to_x, to_y
            )));
        }
        debug!(
            session = %token,
            slide = normalize_slide_ref(slide_ref),
            zoom_level = zoom_level,
            count = (to_x - from_x + 1) * (to_y - from_y + 1),
            "Fetching tile rectangle"
        );

        let mut tiles = Vec::new();
        for y in from_y..=to_y {
            for x in from_x..=to_x {
                let bytes = self
                    .tile(slide_ref, x, y, zoom_level, options, Some(&token))
                    .await?;
                tiles.push(((x, y), bytes));
            }
        }
        Ok(tiles)
    }

    /// Encoded bytes of a rendered region.
    pub async fn region(
        &self,
        slide_ref: &str,
        options: &RegionOptions,
        token: Option<&str>,
    ) -> Result<Bytes, ClientError> {
        let token = self.require_token(token).await?;
        let url = self.region_url(slide_ref, options, Some(&token)).await?;
        self.send_for(&token, TransportRequest::get_binary(url)).await
    }

    /// Encoded bytes of the thumbnail.
    pub async fn thumbnail(
        &self,
        slide_ref: &str,
        height: Option<u32>,
        width: Option<u32>,
        token: Option<&str>,
    ) -> Result<Bytes, ClientError> {
        let token = self.require_token(token).await?;
        let url = self
            .thumbnail_url(slide_ref, height, width, Some(&token))
            .await?;
        self.send_for(&token, TransportRequest::get_binary(url)).await
    }

    /// Encoded bytes of the barcode (label) image.
    pub async fn barcode(&self, slide_ref: &str, token: Option<&str>) -> Result<Bytes, ClientError> {
        let token = self.require_token(token).await?;
        let url = self.barcode_url(slide_ref, Some(&token)).await?;
        self.send_for(&token, TransportRequest::get_binary(url)).await
    }

    /// Alias of [`barcode`](Self::barcode).
    pub async fn label(&self, slide_ref: &str, token: Option<&str>) -> Result<Bytes, ClientError> {
        self.barcode(slide_ref, token).await
    }

    /// Text decoded from the slide's barcode, if any.
    pub async fn barcode_text(
        &self,
        slide_ref: &str,
        token: Option<&str>,
    ) -> Result<Option<String>, ClientError> {
        let token = self.require_token(token).await?;
        let slide_ref = normalize_slide_ref(slide_ref);
        let url = Query::new(&self.api_url(&token).await?, "GetBarcodeText")
            .param("sessionID", &token)
            .param("pathOrUid", slide_ref)
            .build();
        let context = format!("GetBarcodeText on {}", slide_ref);

        let text = self
            .get_payload(&token, url, &context)
            .await?
            .into_scalar(&context)?;
        Ok(Some(text).filter(|t| !t.is_empty()))
    }
}
