//! Walking the server's directory tree.
//!
//! Recursive listings use an explicit work stack, so deep trees never grow
//! the call stack. Each node is expanded with one round-trip; a node's own
//! listing is emitted before the listings of its subdirectories, which are
//! visited in server order.

use tracing::{debug, warn};

use crate::error::ClientError;
use crate::transport::Transport;
use crate::urls::{normalize_slide_ref, Query};

use super::Client;

/// How far a listing descends below its start directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Depth {
    /// The start directory only
    #[default]
    None,
    /// Until the tree bottoms out
    Unlimited,
    /// This many additional levels; `Levels(0)` equals `None`
    Levels(u32),
}

impl Depth {
    /// Depth budget of a subdirectory, or `None` when it must not be expanded.
    pub fn descend(self) -> Option<Depth> {
        match self {
            Depth::None | Depth::Levels(0) => None,
            Depth::Unlimited => Some(Depth::Unlimited),
            Depth::Levels(n) => Some(Depth::Levels(n - 1)),
        }
    }
}

impl From<bool> for Depth {
    fn from(recursive: bool) -> Self {
        if recursive {
            Depth::Unlimited
        } else {
            Depth::None
        }
    }
}

impl From<u32> for Depth {
    fn from(levels: u32) -> Self {
        Depth::Levels(levels)
    }
}

/// Which listing a walk collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    Directories,
    Slides,
}

/// The tree root, which is expanded through the root directories.
fn is_root(path: &str) -> bool {
    path.is_empty() || path == "/"
}

impl<T: Transport> Client<T> {
    /// Root directories visible to a session.
    pub async fn root_directories(&self, token: Option<&str>) -> Result<Vec<String>, ClientError> {
        let token = self.require_token(token).await?;
        let url = Query::new(&self.api_url(&token).await?, "GetRootDirectories")
            .param("sessionID", &token)
            .build();
        self.get_payload(&token, url, "GetRootDirectories")
            .await?
            .into_strings("GetRootDirectories")
    }

    /// Subdirectories of `path`, descending as far as `depth` allows.
    pub async fn directories(
        &self,
        path: &str,
        depth: Depth,
        token: Option<&str>,
    ) -> Result<Vec<String>, ClientError> {
        let token = self.require_token(token).await?;
        self.walk(&token, path, depth, Listing::Directories).await
    }

    /// Slides in `path`, descending into subdirectories as far as `depth` allows.
    pub async fn slides(
        &self,
        path: &str,
        depth: Depth,
        token: Option<&str>,
    ) -> Result<Vec<String>, ClientError> {
        let token = self.require_token(token).await?;
        self.walk(&token, path, depth, Listing::Slides).await
    }

    /// First directory, depth first, that contains at least one slide.
    ///
    /// `None` or the root starts from the root directories, and failing to
    /// list them is returned. Any other directory whose listing fails is
    /// treated as empty.
    pub async fn first_non_empty_directory(
        &self,
        start: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<String>, ClientError> {
        let token = self.require_token(token).await?;
        let start = start.unwrap_or("/");

        let mut stack: Vec<String> = if is_root(start) {
            self.root_directories(Some(&token))
                .await?
                .into_iter()
                .rev()
                .collect()
        } else {
            vec![start.to_string()]
        };

        while let Some(dir) = stack.pop() {
            match self.list(&token, &dir, Listing::Slides).await {
                Ok(slides) if !slides.is_empty() => return Ok(Some(dir)),
                Ok(_) => {}
                Err(e) => {
                    warn!(session = %token, directory = %dir, error = %e, "Unable to list slides");
                }
            }

            match self.list(&token, &dir, Listing::Directories).await {
                Ok(subdirs) => stack.extend(subdirs.into_iter().rev()),
                Err(e) => {
                    warn!(session = %token, directory = %dir, error = %e, "Unable to list subdirectories");
                }
            }
        }

        Ok(None)
    }

    async fn walk(
        &self,
        token: &str,
        path: &str,
        depth: Depth,
        listing: Listing,
    ) -> Result<Vec<String>, ClientError> {
        let mut result = Vec::new();
        let mut stack = vec![(normalize_slide_ref(path).to_string(), depth)];

        while let Some((dir, depth)) = stack.pop() {
            let entries = self.list(token, &dir, listing).await?;

            let Some(child_depth) = depth.descend() else {
                result.extend(entries);
                continue;
            };

            let subdirs = match listing {
                Listing::Directories => entries.clone(),
                Listing::Slides => self.list(token, &dir, Listing::Directories).await?,
            };
            result.extend(entries);
            stack.extend(
                subdirs
                    .into_iter()
                    .rev()
                    .map(|sub| (normalize_slide_ref(&sub).to_string(), child_depth)),
            );
        }

        Ok(result)
    }

    /// One non-recursive listing of `path`.
    async fn list(&self, token: &str, path: &str, listing: Listing) -> Result<Vec<String>, ClientError> {
        let path = normalize_slide_ref(path);
        let endpoint = match listing {
            Listing::Directories => "GetDirectories",
            Listing::Slides => "GetFiles",
        };
        debug!(session = token, path = path, endpoint = endpoint, "Listing directory");

        let url = Query::new(&self.api_url(token).await?, endpoint)
            .param("sessionID", token)
            .param("path", path)
            .build();
        let context = format!("{} on {} (paths are case sensitive)", endpoint, path);

        self.get_payload(token, url, &context)
            .await?
            .into_strings(&context)
    }
}
