//! The canvas object model.
//!
//! A [`CanvasObject`] is pure data: position, size and rotation shared by every
//! variant, plus the variant payload in [`ObjectKind`]. Objects never own
//! graphics resources.

use egui::Color32;

use crate::geometry::Point;
use crate::id_generator::ObjectId;

/// Discriminant of [`ObjectKind`], used by reconcilers to pick their objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKindTag {
    Rect,
    Image,
    Video,
}

impl ObjectKindTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color32,
    pub width: f64,
    pub alpha: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectStyle {
    pub fill: Color32,
    pub fill_alpha: f32,
    pub stroke: Option<StrokeStyle>,
}

impl Default for RectStyle {
    fn default() -> Self {
        Self {
            fill: Color32::from_rgb(0x3b, 0x82, 0xf6),
            fill_alpha: 1.0,
            stroke: None,
        }
    }
}

/// Declarative playback state of a video object.
///
/// These flags are intents; the video reconciler drives the media handle
/// towards them.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSource {
    pub src: String,
    pub muted: bool,
    pub looped: bool,
    pub playing: bool,
    pub volume: Option<f64>,
    pub current_time: Option<f64>,
}

impl VideoSource {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            muted: true,
            looped: true,
            playing: false,
            volume: None,
            current_time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Rect(RectStyle),
    Image { src: String },
    Video(VideoSource),
}

impl ObjectKind {
    pub fn tag(&self) -> ObjectKindTag {
        match self {
            Self::Rect(_) => ObjectKindTag::Rect,
            Self::Image { .. } => ObjectKindTag::Image,
            Self::Video(_) => ObjectKindTag::Video,
        }
    }

    /// External resource URL, for image and video objects.
    pub fn src(&self) -> Option<&str> {
        match self {
            Self::Rect(_) => None,
            Self::Image { src } => Some(src),
            Self::Video(video) => Some(&video.src),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasObject {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Radians, applied about the top-left corner.
    pub rotation: f64,
    pub kind: ObjectKind,
}

impl CanvasObject {
    pub fn tag(&self) -> ObjectKindTag {
        self.kind.tag()
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn video(&self) -> Option<&VideoSource> {
        match &self.kind {
            ObjectKind::Video(video) => Some(video),
            _ => None,
        }
    }

    /// Shallow merge of `patch` into this object.
    ///
    /// Variant-specific fields are ignored when they don't apply to this
    /// object's variant. Sizes never go below zero.
    pub fn apply_patch(&mut self, patch: &ObjectPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width.max(0.0);
        }
        if let Some(height) = patch.height {
            self.height = height.max(0.0);
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        match &mut self.kind {
            ObjectKind::Rect(style) => {
                if let Some(fill) = patch.fill {
                    style.fill = fill;
                }
                if let Some(alpha) = patch.fill_alpha {
                    style.fill_alpha = alpha;
                }
                if let Some(stroke) = patch.stroke {
                    style.stroke = stroke;
                }
            }
            ObjectKind::Image { src } => {
                if let Some(new_src) = &patch.src {
                    src.clone_from(new_src);
                }
            }
            ObjectKind::Video(video) => {
                if let Some(new_src) = &patch.src {
                    video.src.clone_from(new_src);
                }
                if let Some(muted) = patch.muted {
                    video.muted = muted;
                }
                if let Some(looped) = patch.looped {
                    video.looped = looped;
                }
                if let Some(playing) = patch.playing {
                    video.playing = playing;
                }
                if let Some(volume) = patch.volume {
                    video.volume = volume;
                }
                if let Some(current_time) = patch.current_time {
                    video.current_time = current_time;
                }
            }
        }
    }
}

/// Input of [`crate::store::CanvasStore::add_object`]. The store assigns an id
/// when none is supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObject {
    pub id: Option<ObjectId>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub kind: ObjectKind,
}

impl NewObject {
    pub fn new(kind: ObjectKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: None,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            kind,
        }
    }

    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ObjectKind::Rect(RectStyle::default()), x, y, width, height)
    }

    pub fn image(src: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ObjectKind::Image { src: src.into() }, x, y, width, height)
    }

    pub fn video(src: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ObjectKind::Video(VideoSource::new(src)), x, y, width, height)
    }

    pub fn with_id(mut self, id: impl Into<ObjectId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub(crate) fn build(&self, id: ObjectId) -> CanvasObject {
        CanvasObject {
            id,
            x: self.x,
            y: self.y,
            width: self.width.max(0.0),
            height: self.height.max(0.0),
            rotation: self.rotation,
            kind: self.kind.clone(),
        }
    }
}

/// Partial record merged into an object by `update_object`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub fill: Option<Color32>,
    pub fill_alpha: Option<f32>,
    pub stroke: Option<Option<StrokeStyle>>,
    pub src: Option<String>,
    pub muted: Option<bool>,
    pub looped: Option<bool>,
    pub playing: Option<bool>,
    pub volume: Option<Option<f64>>,
    pub current_time: Option<Option<f64>>,
}

impl ObjectPatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn bounds(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn rotation(rotation: f64) -> Self {
        Self {
            rotation: Some(rotation),
            ..Default::default()
        }
    }

    pub fn playing(playing: bool) -> Self {
        Self {
            playing: Some(playing),
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }
}
