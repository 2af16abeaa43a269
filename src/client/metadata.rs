//! Cached slide metadata retrieval.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::metadata::SlideInfo;
use crate::session::LOCAL_SESSION_ID;
use crate::transport::Transport;
use crate::urls::{normalize_slide_ref, Query};

use super::Client;

impl<T: Transport> Client<T> {
    /// Metadata document of a slide, fetched once per session.
    ///
    /// The document is cached under the requested reference, the
    /// server-declared filename and, for remote sessions, the server UID.
    /// Failures are never cached.
    pub async fn slide_info(
        &self,
        slide_ref: &str,
        token: Option<&str>,
    ) -> Result<Arc<SlideInfo>, ClientError> {
        let token = self.require_token(token).await?;
        let key = normalize_slide_ref(slide_ref);

        if let Some(info) = self.cache.get(&token, key).await {
            debug!(session = %token, slide = key, "Slide info cache hit");
            return Ok(info);
        }
        debug!(session = %token, slide = key, "Slide info cache miss");

        let url = Query::new(&self.api_url(&token).await?, "GetImageInfo")
            .param("SessionID", &token)
            .param("pathOrUid", key)
            .build();
        let context = format!("GetImageInfo on {}", key);

        let object = self
            .get_payload(&token, url, &context)
            .await?
            .into_object(&context)?;
        let info = SlideInfo::from_object(object, &context)?;

        Ok(self.store_slide_info(&token, Some(key), info).await)
    }

    /// Metadata documents of several slides.
    ///
    /// Only references missing from the cache are requested, in one POST.
    /// The result is keyed by the reference strings exactly as the caller passed them;
    /// references the server did not describe are absent.
    pub async fn slides_info<S: AsRef<str>>(
        &self,
        slide_refs: &[S],
        token: Option<&str>,
    ) -> Result<HashMap<String, Arc<SlideInfo>>, ClientError> {
        let token = self.require_token(token).await?;

        let mut missing: Vec<&str> = Vec::new();
        for slide_ref in slide_refs {
            let key = normalize_slide_ref(slide_ref.as_ref());
            if !missing.contains(&key) && !self.cache.contains(&token, key).await {
                missing.push(key);
            }
        }

        if !missing.is_empty() {
            debug!(session = %token, count = missing.len(), "Fetching slide infos");
            let url = format!("{}GetImagesInfo", self.api_url(&token).await?);
            let body = json!({ "sessionID": token, "pathOrUids": missing }).to_string();
            let context = format!("GetImagesInfo on {} slide(s)", missing.len());

            let items = self
                .post_payload(&token, url, body, &context)
                .await?
                .into_array(&context)?;

            // Answers come back in request order; only trust that when the counts match
            let positional = items.len() == missing.len();
            for (index, item) in items.into_iter().enumerate() {
                let Value::Object(object) = item else {
                    warn!(session = %token, "Skipping non-object entry in GetImagesInfo answer");
                    continue;
                };
                let info = SlideInfo::from_object(object, &context)?;
                let requested = if positional { Some(missing[index]) } else { None };
                self.store_slide_info(&token, requested, info).await;
            }
        }

        let mut result = HashMap::with_capacity(slide_refs.len());
        for slide_ref in slide_refs {
            let slide_ref = slide_ref.as_ref();
            if let Some(info) = self.cache.get(&token, normalize_slide_ref(slide_ref)).await {
                result.insert(slide_ref.to_string(), info);
            }
        }
        Ok(result)
    }

    async fn store_slide_info(
        &self,
        token: &str,
        requested: Option<&str>,
        info: SlideInfo,
    ) -> Arc<SlideInfo> {
        let mut keys: Vec<String> = Vec::with_capacity(3);
        if let Some(requested) = requested {
            keys.push(requested.to_string());
        }
        if let Some(filename) = info.filename.as_deref() {
            keys.push(normalize_slide_ref(filename).to_string());
        }
        if token != LOCAL_SESSION_ID {
            if let Some(uid) = info.uid.as_deref() {
                keys.push(uid.to_string());
            }
        }
        self.cache.insert(token, keys, info).await
    }
}
