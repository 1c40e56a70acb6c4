//! The resource-loading collaborator: turns a URL into a decoded image or a
//! playable media handle, asynchronously.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{LoadError, MediaError};

#[cfg(not(target_arch = "wasm32"))]
pub mod native;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: String,
    pub kind: ResourceKind,
    /// Fetch in anonymous cross-origin mode so the pixels may be sampled.
    pub cross_origin: bool,
}

impl LoadRequest {
    pub fn new(url: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            url: url.into(),
            kind,
            cross_origin: true,
        }
    }
}

/// Decoded RGBA8 pixels, ready for texture upload.
#[derive(Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rgba_len", &self.rgba.len())
            .finish()
    }
}

/// A playable media element.
///
/// Handles are shared between the video reconciler, which drives playback,
/// and the render surface, which shows the current frame.
pub trait MediaHandle: Send + Sync {
    fn is_paused(&self) -> bool;
    fn play(&self) -> Result<(), MediaError>;
    fn pause(&self);
    fn set_looping(&self, looping: bool);
    fn set_muted(&self, muted: bool);
    /// Volume in `[0, 1]`.
    fn set_volume(&self, volume: f64);
    /// Playback position in seconds.
    fn current_time(&self) -> f64;
    fn seek(&self, seconds: f64);
    /// Frame to show for the current position, if one is available.
    fn poster(&self) -> Option<Arc<DecodedImage>>;
    /// Frees the underlying media. The handle is inert afterwards.
    fn release(&self);
}

#[derive(Clone)]
pub enum Resource {
    Image(Arc<DecodedImage>),
    Video(Arc<dyn MediaHandle>),
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image(image) => f.debug_tuple("Image").field(image).finish(),
            Self::Video(_) => f.write_str("Video(<media>)"),
        }
    }
}

impl Resource {
    /// Stops playback and frees whatever this resource holds.
    pub fn release(&self) {
        if let Self::Video(media) = self {
            media.pause();
            media.release();
        }
    }
}

pub type LoadFuture = BoxFuture<'static, Result<Resource, LoadError>>;

pub trait ResourceLoader {
    /// Starts loading `request`. The returned future resolves on a later turn.
    fn load(&self, request: LoadRequest) -> LoadFuture;
}
