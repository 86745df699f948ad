//! Viewport dimensions and the small amount of geometry the runtime needs to
//! re-derive node placement after a resize.

use glam::Vec2;

use crate::graph::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size(self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn center(self) -> Vec2 {
        self.size() * 0.5
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Scale factor that makes `content` cover the whole viewport while keeping
/// its aspect ratio. Degenerate content sizes scale by 1.
pub fn cover_scale(content: Vec2, viewport: Viewport) -> f32 {
    if content.x <= 0.0 || content.y <= 0.0 {
        return 1.0;
    }
    let view = viewport.size();
    (view.x / content.x).max(view.y / content.y)
}

/// Result of a layout closure: where a node goes and, optionally, how big it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec2,
    pub size: Option<Vec2>,
}

impl Placement {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            size: None,
        }
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = Some(size);
        self
    }

    /// Full-viewport placement anchored at the top-left corner.
    pub fn fill(viewport: Viewport) -> Self {
        Self::at(Vec2::ZERO).with_size(viewport.size())
    }

    pub fn apply_to(self, node: &mut Node) {
        node.position = self.position;
        if let Some(size) = self.size {
            node.size = size;
        }
    }
}
