//! Configuration for the slide server client.
//!
//! Two layers:
//! - [`ClientConfig`], the library-side settings of a [`Client`](crate::Client)
//! - [`Cli`], the command-line interface of the `wsi-client` binary, parsed
//!   with clap and falling back to environment variables
//!
//! # Environment Variables
//!
//! - `WSI_CLIENT_URL` - Server URL (default: the local instance)
//! - `WSI_CLIENT_USERNAME` - Username for the authentication exchange
//! - `WSI_CLIENT_PASSWORD` - Password for the authentication exchange
//! - `WSI_CLIENT_NO_TILE_CACHE` - Ask the server not to use its tile cache

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::session::DEFAULT_LOCAL_URL;

// =============================================================================
// Default Values
// =============================================================================

/// Default value of the `caller` parameter of the authentication exchange.
pub const DEFAULT_CALLER: &str = "SDK.Rust";

/// Default minimum tile count for the zoom levels printed by `info`.
pub const DEFAULT_MIN_TILES: u64 = 0;

// =============================================================================
// Library Configuration
// =============================================================================

/// Settings of a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Identifies this SDK in the authentication exchange.
    pub caller: String,

    /// Reflected in the `cache` flag of tile and region URLs.
    pub use_tile_cache: bool,

    /// Base URL of the reserved local instance.
    pub local_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            caller: DEFAULT_CALLER.to_string(),
            use_tile_cache: true,
            local_url: DEFAULT_LOCAL_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.caller.trim().is_empty() {
            return Err("caller must not be empty".to_string());
        }

        validate_server_url(&self.local_url).map_err(|e| format!("local_url: {}", e))?;

        Ok(())
    }

    pub fn with_tile_cache(mut self, use_tile_cache: bool) -> Self {
        self.use_tile_cache = use_tile_cache;
        self
    }

    pub fn with_local_url(mut self, local_url: impl Into<String>) -> Self {
        self.local_url = local_url.into();
        self
    }
}

/// Check that a server URL is an absolute http(s) URL.
pub fn validate_server_url(url: &str) -> Result<(), String> {
    let parsed = Url::parse(url).map_err(|e| format!("invalid URL '{}': {}", url, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!(
            "unsupported scheme '{}' in '{}', expected http or https",
            other, url
        )),
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// WSI Client - Browse and inspect slides on a remote slide server.
#[derive(Parser, Debug, Clone)]
#[command(name = "wsi-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// How to reach the server.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Server URL. Defaults to the local instance.
    #[arg(long, global = true, env = "WSI_CLIENT_URL")]
    pub url: Option<String>,

    /// Username for the authentication exchange.
    #[arg(short, long, global = true, default_value = "", env = "WSI_CLIENT_USERNAME")]
    pub username: String,

    /// Password for the authentication exchange.
    #[arg(
        long,
        global = true,
        default_value = "",
        env = "WSI_CLIENT_PASSWORD",
        hide_env_values = true
    )]
    pub password: String,

    /// Ask the server not to use its tile cache.
    #[arg(long, global = true, default_value_t = false, env = "WSI_CLIENT_NO_TILE_CACHE")]
    pub no_tile_cache: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check that the server answers and that a session can be opened.
    Check,

    /// List directories or slides.
    Ls(LsArgs),

    /// Print the pyramid summary of a slide.
    Info(InfoArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LsArgs {
    /// Directory to list. Defaults to the root directories.
    pub path: Option<String>,

    /// List slides instead of directories.
    #[arg(long, default_value_t = false)]
    pub slides: bool,

    /// Levels to descend below the directory.
    #[arg(long, conflicts_with = "recursive")]
    pub depth: Option<u32>,

    /// Descend until the tree bottoms out.
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// Slide path or UID.
    pub slide: String,

    /// Only report zoom levels with more tiles than this.
    #[arg(long, default_value_t = DEFAULT_MIN_TILES)]
    pub min_tiles: u64,

    /// Print the raw metadata document as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl ConnectionArgs {
    /// Validate the arguments and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.url {
            validate_server_url(url)?;
        }
        if !self.password.is_empty() && self.username.is_empty() {
            return Err(
                "A password was given without a username. Set --username or WSI_CLIENT_USERNAME"
                    .to_string(),
            );
        }
        Ok(())
    }

    /// Library configuration matching these arguments.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default().with_tile_cache(!self.no_tile_cache)
    }
}

// =============================================================================
// Tests
// =============================================================================
