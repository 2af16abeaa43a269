//! # WSI Client
//!
//! A client SDK for browsing and addressing Whole Slide Images (WSI) served
//! by a remote slide server.
//!
//! The server exposes a REST surface for sessions, directory listings,
//! slide metadata and tiles. This library sits between that surface and the
//! application:
//!
//! - **Sessions**: several authenticated sessions side by side, plus the
//!   credential-free local instance, with per-session download accounting
//! - **Metadata cache**: slide documents fetched once per session and
//!   reachable by path, filename or UID
//! - **Pyramid arithmetic**: zoom levels, tile grids, pixel and physical
//!   dimensions, magnification
//! - **Hierarchy walking**: depth-bounded directory and slide listings
//! - **Image addressing**: tile, region, thumbnail and label URLs and bytes
//!
//! ## Architecture
//!
//! - [`transport`] - Transport seam and its HTTP implementation
//! - [`response`] - Classification of raw response bodies
//! - [`session`] - Session registry
//! - [`metadata`] - Typed slide document and its cache
//! - [`pyramid`] - Pyramid arithmetic on slide documents
//! - [`urls`] - Reference normalization and URL construction
//! - [`client`] - The [`Client`] facade tying everything together
//! - [`config`] - Library configuration and CLI types
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsi_client::{Client, Depth};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wsi_client::ClientError> {
//!     let client = Client::new();
//!     let token = client
//!         .connect(Some("https://core.example.com/core/"), "alice", "secret")
//!         .await?;
//!
//!     for slide in client.slides("Reference", Depth::Levels(1), Some(&token)).await? {
//!         let info = client.slide_info(&slide, Some(&token)).await?;
//!         println!("{}: {}x", slide, info.magnification(None, false));
//!     }
//!
//!     client.disconnect(Some(&token)).await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod metadata;
pub mod pyramid;
pub mod response;
pub mod session;
pub mod transport;
pub mod urls;

// Re-export commonly used types
pub use client::{Client, Depth, SlideFile};
pub use config::{ClientConfig, Cli, Command, ConnectionArgs, InfoArgs, LsArgs};
pub use error::{ClientError, TransportError};
pub use metadata::{Layer, MetadataCache, SlideInfo, TimeFrame};
pub use pyramid::{TileCount, REFERENCE_MAGNIFICATION, REFERENCE_MICROMETRES_PER_PIXEL};
pub use response::{classify, ResponseBody};
pub use session::{SessionInfo, SessionRegistry, DEFAULT_LOCAL_URL, LOCAL_SESSION_ID};
pub use transport::{HttpTransport, Method, Transport, TransportRequest};
pub use urls::{
    normalize_slide_ref, slide_file_extension, slide_file_name, ImageFormat, RegionOptions,
    TileOptions,
};
