use std::collections::HashMap;

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};

use crate::render::NodeId;
use crate::resource::DecodedImage;

/// GPU textures for sprite nodes, keyed by node and content version.
///
/// A node's version changes whenever its content is replaced, so stale
/// textures are never reused. Least recently used entries are evicted once the
/// cache grows past its limit.
pub struct TextureCache {
    textures: HashMap<(NodeId, u64), TextureHandle>,
    last_used: HashMap<(NodeId, u64), u64>,
    current_frame: u64,
    max_cache_size: usize,
}

impl std::fmt::Debug for TextureCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureCache")
            .field("textures", &self.textures.len())
            .field("current_frame", &self.current_frame)
            .field("max_cache_size", &self.max_cache_size)
            .finish()
    }
}

impl TextureCache {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            textures: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size,
        }
    }

    /// Should be called once at the start of each painted frame.
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    pub fn get_or_upload(
        &mut self,
        ctx: &Context,
        node: NodeId,
        version: u64,
        image: &DecodedImage,
    ) -> TextureId {
        let key = (node, version);
        if let Some(handle) = self.textures.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return handle.id();
        }

        self.prune_if_needed();

        let color_image = ColorImage::from_rgba_unmultiplied(
            [image.width as usize, image.height as usize],
            &image.rgba,
        );
        let name = format!("node_{}_v{}", node.raw(), version);
        let handle = ctx.load_texture(name, color_image, TextureOptions::LINEAR);
        let id = handle.id();
        self.textures.insert(key, handle);
        self.last_used.insert(key, self.current_frame);
        id
    }

    /// Drops every texture of `node`.
    pub fn invalidate_node(&mut self, node: NodeId) {
        self.textures.retain(|(id, _), _| *id != node);
        self.last_used.retain(|(id, _), _| *id != node);
    }

    fn prune_if_needed(&mut self) {
        if self.textures.len() < self.max_cache_size {
            return;
        }
        let mut entries: Vec<((NodeId, u64), u64)> =
            self.last_used.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = entries.len() + 1 - self.max_cache_size.max(1);
        for (key, _) in entries.iter().take(to_remove) {
            self.textures.remove(key);
            self.last_used.remove(key);
        }
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.last_used.clear();
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    #[cfg(test)]
    fn contains(&self, node: NodeId, version: u64) -> bool {
        self.textures.contains_key(&(node, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel() -> DecodedImage {
        DecodedImage {
            width: 1,
            height: 1,
            rgba: vec![255, 255, 255, 255],
        }
    }

    #[test]
    fn test_cache_hit() {
        let ctx = Context::default();
        let mut cache = TextureCache::new(10);
        let node = NodeId::from_raw(1);
        let first = cache.get_or_upload(&ctx, node, 0, &pixel());
        let second = cache.get_or_upload(&ctx, node, 0, &pixel());
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidation() {
        let ctx = Context::default();
        let mut cache = TextureCache::new(10);
        cache.get_or_upload(&ctx, NodeId::from_raw(1), 0, &pixel());
        cache.get_or_upload(&ctx, NodeId::from_raw(1), 1, &pixel());
        cache.get_or_upload(&ctx, NodeId::from_raw(2), 0, &pixel());
        cache.invalidate_node(NodeId::from_raw(1));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(NodeId::from_raw(2), 0));
    }

    #[test]
    fn test_lru_eviction() {
        let ctx = Context::default();
        let mut cache = TextureCache::new(2);
        cache.get_or_upload(&ctx, NodeId::from_raw(1), 0, &pixel());
        cache.begin_frame();
        cache.get_or_upload(&ctx, NodeId::from_raw(2), 0, &pixel());
        cache.begin_frame();
        cache.get_or_upload(&ctx, NodeId::from_raw(3), 0, &pixel());

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(NodeId::from_raw(1), 0));
        assert!(cache.contains(NodeId::from_raw(2), 0));
        assert!(cache.contains(NodeId::from_raw(3), 0));
    }
}
