//! Desktop resource loader.
//!
//! Each load runs on its own thread and reports back through a oneshot
//! channel, so the returned future never blocks the UI thread. Local paths
//! and `file://` urls are read from disk; `http(s)` urls are fetched with
//! reqwest.

use std::sync::Arc;
use std::time::Instant;

use futures::channel::oneshot;
use futures::FutureExt;
use log::{debug, info};
use parking_lot::Mutex;

use crate::error::{LoadError, MediaError};
use crate::resource::{
    DecodedImage, LoadFuture, LoadRequest, MediaHandle, Resource, ResourceKind, ResourceLoader,
};

#[derive(Default, Clone)]
pub struct NativeLoader {
    /// Woken when a load finishes so the completion is drained promptly.
    repaint: Option<egui::Context>,
}

impl std::fmt::Debug for NativeLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLoader")
            .field("repaint", &self.repaint.is_some())
            .finish()
    }
}

impl NativeLoader {
    pub fn new(repaint: Option<egui::Context>) -> Self {
        Self { repaint }
    }
}

impl ResourceLoader for NativeLoader {
    fn load(&self, request: LoadRequest) -> LoadFuture {
        let (tx, rx) = oneshot::channel();
        let url = request.url.clone();
        let repaint = self.repaint.clone();
        let spawned = std::thread::Builder::new()
            .name("resource-loader".to_owned())
            .spawn(move || {
                let result = load_blocking(&request);
                // The receiver is gone when the load was abandoned.
                let _ = tx.send(result);
                if let Some(ctx) = repaint {
                    ctx.request_repaint();
                }
            });

        async move {
            if let Err(err) = spawned {
                return Err(LoadError::Network {
                    url,
                    reason: format!("failed to start loader thread: {}", err),
                });
            }
            match rx.await {
                Ok(result) => result,
                Err(oneshot::Canceled) => Err(LoadError::Network {
                    url,
                    reason: "loader thread exited early".to_owned(),
                }),
            }
        }
        .boxed()
    }
}

fn load_blocking(request: &LoadRequest) -> Result<Resource, LoadError> {
    match request.kind {
        ResourceKind::Image => {
            let bytes = fetch_bytes(&request.url)?;
            debug!("Fetched {} bytes from {}", bytes.len(), request.url);
            decode_image(&request.url, &bytes).map(|image| Resource::Image(Arc::new(image)))
        }
        ResourceKind::Video => {
            // Only the size is checked; the body is never buffered.
            let length = media_length(&request.url)?;
            if length == Some(0) {
                return Err(LoadError::Decode {
                    url: request.url.clone(),
                    reason: "empty media file".to_owned(),
                });
            }
            info!("Opened video {}", request.url);
            Ok(Resource::Video(Arc::new(ClockMedia::default())))
        }
    }
}

enum Location<'a> {
    Http(&'a str),
    File(&'a str),
}

fn locate(url: &str) -> Result<Location<'_>, LoadError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(Location::Http(url));
    }
    if url.contains("://") && !url.starts_with("file://") {
        return Err(LoadError::Unsupported { url: url.to_owned() });
    }
    Ok(Location::File(url.strip_prefix("file://").unwrap_or(url)))
}

fn network_error(url: &str, reason: impl std::fmt::Display) -> LoadError {
    LoadError::Network {
        url: url.to_owned(),
        reason: reason.to_string(),
    }
}

fn http_get(url: &str) -> Result<reqwest::blocking::Response, LoadError> {
    let response = reqwest::blocking::get(url).map_err(|e| network_error(url, e))?;
    if !response.status().is_success() {
        return Err(network_error(url, format!("HTTP error: {}", response.status())));
    }
    Ok(response)
}

fn fetch_bytes(url: &str) -> Result<Vec<u8>, LoadError> {
    match locate(url)? {
        Location::Http(url) => {
            let bytes = http_get(url)?.bytes().map_err(|e| network_error(url, e))?;
            Ok(bytes.to_vec())
        }
        Location::File(path) => std::fs::read(path).map_err(|e| network_error(url, e)),
    }
}

/// Size of the media behind `url` in bytes, `None` when the server doesn't say.
fn media_length(url: &str) -> Result<Option<u64>, LoadError> {
    match locate(url)? {
        // Dropping the response leaves the body unread.
        Location::Http(url) => Ok(http_get(url)?.content_length()),
        Location::File(path) => std::fs::metadata(path)
            .map(|meta| Some(meta.len()))
            .map_err(|e| network_error(url, e)),
    }
}

/// Decodes any format the `image` crate understands into RGBA8.
pub fn decode_image(url: &str, bytes: &[u8]) -> Result<DecodedImage, LoadError> {
    let image = image::load_from_memory(bytes).map_err(|e| LoadError::Decode {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    let rgba = image.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

#[derive(Debug)]
struct ClockState {
    paused: bool,
    looping: bool,
    muted: bool,
    volume: f64,
    /// Position at the moment playback last started or was sought.
    position: f64,
    started: Option<Instant>,
    released: bool,
}

/// Media handle that keeps a playback clock without decoding frames.
///
/// The clock has no duration: the position grows for as long as it plays, so
/// the looping flag is only recorded for callers to inspect.
#[derive(Debug)]
pub struct ClockMedia {
    state: Mutex<ClockState>,
}

impl Default for ClockMedia {
    fn default() -> Self {
        Self {
            state: Mutex::new(ClockState {
                paused: true,
                looping: false,
                muted: false,
                volume: 1.0,
                position: 0.0,
                started: None,
                released: false,
            }),
        }
    }
}

impl ClockMedia {
    pub fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    pub fn is_looping(&self) -> bool {
        self.state.lock().looping
    }

    pub fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }
}

impl ClockState {
    fn now(&self) -> f64 {
        match self.started {
            Some(started) => self.position + started.elapsed().as_secs_f64(),
            None => self.position,
        }
    }
}

impl MediaHandle for ClockMedia {
    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn play(&self) -> Result<(), MediaError> {
        let mut state = self.state.lock();
        if state.released {
            return Err(MediaError::Released);
        }
        if state.paused {
            state.paused = false;
            state.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        if !state.paused {
            state.position = state.now();
            state.started = None;
            state.paused = true;
        }
    }

    fn set_looping(&self, looping: bool) {
        self.state.lock().looping = looping;
    }

    fn set_muted(&self, muted: bool) {
        self.state.lock().muted = muted;
    }

    fn set_volume(&self, volume: f64) {
        self.state.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn current_time(&self) -> f64 {
        self.state.lock().now()
    }

    fn seek(&self, seconds: f64) {
        let mut state = self.state.lock();
        state.position = seconds.max(0.0);
        if !state.paused {
            state.started = Some(Instant::now());
        }
    }

    fn poster(&self) -> Option<Arc<DecodedImage>> {
        None
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.position = state.now();
        state.started = None;
        state.paused = true;
        state.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image("mem://x", b"not an image").unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn test_decode_png() {
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(2, 3, image::Rgba([1, 2, 3, 255]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let decoded = decode_image("mem://x", &png).unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 3));
        assert_eq!(&decoded.rgba[..4], &[1, 2, 3, 255]);
    }

    #[test]
    fn test_missing_file_is_network_error() {
        let err = fetch_bytes("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, LoadError::Network { .. }));
        assert!(matches!(
            fetch_bytes("ftp://host/a.png"),
            Err(LoadError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_clock_has_no_duration() {
        let media = ClockMedia::default();
        media.set_looping(true);
        media.seek(1_000.0);
        assert!(media.is_looping());
        assert_eq!(media.current_time(), 1_000.0);
    }

    #[test]
    fn test_video_load_checks_size_only() {
        let dir = std::env::temp_dir();
        let empty = dir.join(format!("whiteboard-{}.mp4", uuid::Uuid::new_v4()));
        let clip = dir.join(format!("whiteboard-{}.mp4", uuid::Uuid::new_v4()));
        std::fs::write(&empty, b"").unwrap();
        std::fs::write(&clip, [0u8; 64]).unwrap();

        let load = |path: &std::path::Path| {
            load_blocking(&LoadRequest::new(path.display().to_string(), ResourceKind::Video))
        };
        let empty_result = load(&empty);
        let clip_result = load(&clip);
        let missing_result = load(&dir.join("whiteboard-missing.mp4"));
        std::fs::remove_file(&empty).ok();
        std::fs::remove_file(&clip).ok();

        assert!(matches!(empty_result, Err(LoadError::Decode { .. })));
        assert!(matches!(clip_result, Ok(Resource::Video(_))));
        assert!(matches!(missing_result, Err(LoadError::Network { .. })));
        assert!(matches!(
            media_length("ftp://host/a.mp4"),
            Err(LoadError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_clock_media_lifecycle() {
        let media = ClockMedia::default();
        assert!(media.is_paused());
        media.seek(4.0);
        assert_eq!(media.current_time(), 4.0);
        media.play().unwrap();
        assert!(!media.is_paused());
        media.set_volume(7.0);
        assert_eq!(media.volume(), 1.0);
        media.release();
        assert!(media.is_paused());
        assert_eq!(media.play(), Err(MediaError::Released));
    }

    #[test]
    fn test_loader_reads_local_file() {
        let path = std::env::temp_dir().join(format!("whiteboard-{}.png", uuid::Uuid::new_v4()));
        image::RgbaImage::from_pixel(1, 1, image::Rgba([9, 9, 9, 255]))
            .save(&path)
            .unwrap();
        let loader = NativeLoader::default();
        let result = futures::executor::block_on(
            loader.load(LoadRequest::new(path.display().to_string(), ResourceKind::Image)),
        );
        std::fs::remove_file(&path).ok();
        match result {
            Ok(Resource::Image(image)) => assert_eq!((image.width, image.height), (1, 1)),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
