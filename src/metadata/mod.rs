//! Slide metadata: the typed document and its per-session cache.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Client::slide_info(ref)          │
//! └────────────────────┬────────────────────┘
//!                      │ miss
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │  GetImageInfo → classify → SlideInfo    │
//! └────────────────────┬────────────────────┘
//!                      │ store under ref, Filename, UID
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            MetadataCache                │
//! │  (session → reference → Arc<SlideInfo>) │
//! └─────────────────────────────────────────┘
//! ```

mod cache;
mod info;

pub use cache::MetadataCache;
pub use info::{Layer, SlideInfo, TimeFrame};

pub(crate) use info::{value_as_u64, ZoomField};
