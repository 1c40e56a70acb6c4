use log::warn;

use crate::config::EditorConfig;
use crate::object::{CanvasObject, ObjectKind, ObjectKindTag, VideoSource};
use crate::render::{NodeContent, NodeId, NodeShape, RenderSurface};
use crate::resource::{MediaHandle, Resource, ResourceKind};

/// Per-kind behavior plugged into [`super::LayerReconciler`].
pub trait LayerKind {
    const TAG: ObjectKindTag;

    /// Kind of resource to fetch for `src`, or `None` when the node is drawn
    /// from the object alone.
    fn resource_kind(&self) -> Option<ResourceKind> {
        None
    }

    /// Shape of a freshly created node.
    fn initial_shape(&self, object: &CanvasObject, config: &EditorConfig) -> NodeShape;

    /// Shape shown once the resource is available.
    fn resolved_shape(&self, resource: &Resource) -> NodeShape {
        match resource {
            Resource::Image(image) => NodeShape::Sprite {
                content: NodeContent::Image(image.clone()),
                tint: None,
            },
            Resource::Video(media) => NodeShape::Sprite {
                content: NodeContent::Video(media.clone()),
                tint: None,
            },
        }
    }

    /// Refreshes object-derived visuals of an existing node.
    fn sync_node(&self, _object: &CanvasObject, _surface: &mut dyn RenderSurface, _node: NodeId) {}

    /// Pushes the object's declarative state into its resolved resource.
    fn sync_resource(
        &self,
        _object: &CanvasObject,
        _resource: &Resource,
        _config: &EditorConfig,
        _seek_target: &mut Option<f64>,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ImageLayer;

impl LayerKind for ImageLayer {
    const TAG: ObjectKindTag = ObjectKindTag::Image;

    fn resource_kind(&self) -> Option<ResourceKind> {
        Some(ResourceKind::Image)
    }

    fn initial_shape(&self, _object: &CanvasObject, config: &EditorConfig) -> NodeShape {
        NodeShape::placeholder(config.placeholder_tint)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VideoLayer;

impl LayerKind for VideoLayer {
    const TAG: ObjectKindTag = ObjectKindTag::Video;

    fn resource_kind(&self) -> Option<ResourceKind> {
        Some(ResourceKind::Video)
    }

    fn initial_shape(&self, _object: &CanvasObject, config: &EditorConfig) -> NodeShape {
        NodeShape::placeholder(config.placeholder_tint)
    }

    fn sync_resource(
        &self,
        object: &CanvasObject,
        resource: &Resource,
        config: &EditorConfig,
        seek_target: &mut Option<f64>,
    ) {
        if let (Some(video), Resource::Video(media)) = (object.video(), resource) {
            sync_playback(media.as_ref(), video, config.video_time_epsilon, seek_target);
        }
    }
}

/// Drives `media` towards the flags in `video`.
///
/// A stored time is sought once per distinct value and only when playback has
/// drifted more than `epsilon` seconds from it, so natural playback is left
/// alone while the stored time stays put. Non-finite times are ignored.
pub fn sync_playback(
    media: &dyn MediaHandle,
    video: &VideoSource,
    epsilon: f64,
    seek_target: &mut Option<f64>,
) {
    media.set_looping(video.looped);
    media.set_muted(video.muted);
    if let Some(volume) = video.volume {
        media.set_volume(volume.clamp(0.0, 1.0));
    }

    // The stored value is remembered unclamped so it compares equal next pass.
    match video.current_time {
        Some(time) if !time.is_finite() => {}
        Some(time) if *seek_target != Some(time) => {
            *seek_target = Some(time);
            let time = time.max(0.0);
            if (media.current_time() - time).abs() > epsilon {
                media.seek(time);
            }
        }
        Some(_) => {}
        None => *seek_target = None,
    }

    if video.playing && media.is_paused() {
        if let Err(err) = media.play() {
            warn!("Video {} refused to play: {}", video.src, err);
        }
    } else if !video.playing && !media.is_paused() {
        media.pause();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VectorLayer;

impl LayerKind for VectorLayer {
    const TAG: ObjectKindTag = ObjectKindTag::Rect;

    fn initial_shape(&self, object: &CanvasObject, _config: &EditorConfig) -> NodeShape {
        match &object.kind {
            ObjectKind::Rect(style) => NodeShape::Rect(*style),
            _ => NodeShape::Rect(Default::default()),
        }
    }

    fn sync_node(&self, object: &CanvasObject, surface: &mut dyn RenderSurface, node: NodeId) {
        if let ObjectKind::Rect(style) = &object.kind {
            surface.set_shape(node, NodeShape::Rect(*style));
        }
    }
}
