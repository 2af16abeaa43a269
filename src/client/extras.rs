//! Slide identity, search and pass-through retrieval.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::metadata::value_as_u64;
use crate::session::LOCAL_SESSION_ID;
use crate::transport::Transport;
use crate::urls::{normalize_slide_ref, Query, QUERY_JSON};

use super::Client;

/// One physical file making up a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideFile {
    pub path: String,
    /// Size in bytes; 0 when the server does not report it
    pub size: u64,
    /// Raw last-modified stamp, when reported
    pub last_modified: Option<String>,
}

impl<T: Transport> Client<T> {
    /// Unique identifier the server assigned to a slide.
    ///
    /// Not available on the local instance.
    pub async fn uid(&self, slide_ref: &str, token: Option<&str>) -> Result<String, ClientError> {
        let token = self.require_token(token).await?;
        self.ensure_remote(&token, "UID generation")?;

        let slide_ref = normalize_slide_ref(slide_ref);
        let url = Query::new(&self.api_url(&token).await?, "GetUID")
            .param("sessionID", &token)
            .param("path", slide_ref)
            .build();
        let context = format!("GetUID on {}", slide_ref);

        self.get_payload(&token, url, &context)
            .await?
            .into_scalar(&context)
    }

    /// Content fingerprint of a slide.
    pub async fn fingerprint(&self, slide_ref: &str, token: Option<&str>) -> Result<String, ClientError> {
        let token = self.require_token(token).await?;
        let slide_ref = normalize_slide_ref(slide_ref);
        let url = Query::new(&self.api_url(&token).await?, "GetFingerprint")
            .param("sessionID", &token)
            .param("pathOrUid", slide_ref)
            .build();
        let context = format!("GetFingerprint on {}", slide_ref);

        self.get_payload(&token, url, &context)
            .await?
            .into_scalar(&context)
    }

    /// Slides below `start_dir` whose filename matches `pattern`.
    ///
    /// Not available on the local instance.
    pub async fn search_slides(
        &self,
        start_dir: &str,
        pattern: &str,
        token: Option<&str>,
    ) -> Result<Vec<String>, ClientError> {
        let token = self.require_token(token).await?;
        self.ensure_remote(&token, "searching")?;

        let start_dir = normalize_slide_ref(start_dir);
        let base = self.sessions.base_url(&token).await?;
        let url = Query::new(&base, &format!("{}Filename", QUERY_JSON))
            .param("sessionID", &token)
            .param("path", start_dir)
            .param("pattern", pattern)
            .build();
        let context = format!("Filename search for '{}' in {}", pattern, start_dir);

        self.get_payload(&token, url, &context)
            .await?
            .into_strings(&context)
    }

    /// Every physical file that makes up a slide.
    ///
    /// Mostly relevant for multi-file formats (MRXS, VSI). The local
    /// instance reports paths only.
    pub async fn files_for_slide(
        &self,
        slide_ref: &str,
        token: Option<&str>,
    ) -> Result<Vec<SlideFile>, ClientError> {
        let token = self.require_token(token).await?;
        let slide_ref = normalize_slide_ref(slide_ref);
        let local = token == LOCAL_SESSION_ID;
        let endpoint = if local {
            "EnumerateAllFilesForSlide"
        } else {
            "GetFilenames"
        };

        let url = Query::new(&self.api_url(&token).await?, endpoint)
            .param("sessionID", &token)
            .param("pathOrUid", slide_ref)
            .build();
        let context = format!("{} on {}", endpoint, slide_ref);

        let items = self
            .get_payload(&token, url, &context)
            .await?
            .into_array(&context)?;

        let mut files = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(path) => files.push(SlideFile {
                    path,
                    size: 0,
                    last_modified: None,
                }),
                Value::Object(object) => {
                    let Some(path) = object.get("Path").and_then(Value::as_str) else {
                        warn!(session = %token, slide = slide_ref, "File entry without a path");
                        continue;
                    };
                    files.push(SlideFile {
                        path: path.to_string(),
                        size: object.get("Size").and_then(value_as_u64).unwrap_or(0),
                        last_modified: object
                            .get("LastModified")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    });
                }
                other => {
                    return Err(ClientError::unexpected(
                        context,
                        format!("unexpected file entry {}", other),
                    ))
                }
            }
        }
        Ok(files)
    }

    /// Annotations stored for a slide, as returned by the server.
    pub async fn annotations(&self, slide_ref: &str, token: Option<&str>) -> Result<Vec<Value>, ClientError> {
        let token = self.require_token(token).await?;
        let slide_ref = normalize_slide_ref(slide_ref);
        let url = Query::new(&self.api_url(&token).await?, "GetAnnotations")
            .param("sessionID", &token)
            .param("pathOrUid", slide_ref)
            .build();
        let context = format!("GetAnnotations on {}", slide_ref);

        self.get_payload(&token, url, &context)
            .await?
            .into_array(&context)
    }

    /// Forms available in a directory (or anywhere when `dir` is `None`),
    /// mapped from form ID to form name.
    pub async fn available_forms(
        &self,
        dir: Option<&str>,
        token: Option<&str>,
    ) -> Result<BTreeMap<String, String>, ClientError> {
        let token = self.require_token(token).await?;
        let dir = dir.map(normalize_slide_ref).filter(|d| !d.is_empty());
        let url = Query::new(&self.api_url(&token).await?, "GetForms")
            .param("sessionID", &token)
            .opt_param("path", dir)
            .build();
        let context = format!("GetForms on {}", dir.unwrap_or("/"));

        let items = self
            .get_payload(&token, url, &context)
            .await?
            .into_array(&context)?;

        Ok(items
            .iter()
            .filter_map(|item| {
                let key = form_key(item.get("Key")?);
                let value = item.get("Value")?.as_str()?.to_string();
                Some((key, value))
            })
            .collect())
    }

    /// Form submissions recorded for a slide, as returned by the server.
    pub async fn submitted_form_data(
        &self,
        slide_ref: &str,
        token: Option<&str>,
    ) -> Result<Vec<Value>, ClientError> {
        let token = self.require_token(token).await?;
        let slide_ref = normalize_slide_ref(slide_ref);
        let url = Query::new(&self.api_url(&token).await?, "GetFormSubmissions")
            .param("sessionID", &token)
            .param("pathOrUids", slide_ref)
            .build();
        let context = format!("GetFormSubmissions on {}", slide_ref);

        self.get_payload(&token, url, &context)
            .await?
            .into_array(&context)
    }

    /// Forms submitted for a slide, mapped from form ID to form name.
    ///
    /// Submissions of forms the server no longer lists are left out.
    pub async fn submitted_forms(
        &self,
        slide_ref: &str,
        token: Option<&str>,
    ) -> Result<BTreeMap<String, String>, ClientError> {
        let token = self.require_token(token).await?;
        let submissions = self.submitted_form_data(slide_ref, Some(&token)).await?;
        let names = self.available_forms(None, Some(&token)).await?;

        let mut forms = BTreeMap::new();
        for submission in &submissions {
            let Some(form_id) = submission.get("FormID").map(form_key) else {
                continue;
            };
            match names.get(&form_id) {
                Some(name) => {
                    forms.entry(form_id).or_insert_with(|| name.clone());
                }
                None => {
                    debug!(session = %token, form = %form_id, "Submission of an unlisted form");
                }
            }
        }
        Ok(forms)
    }
}

/// Form IDs arrive as numbers or strings.
fn form_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
