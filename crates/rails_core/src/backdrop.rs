//! Full-screen background image that appears once the resource cache has it.

use glam::Vec2;

use crate::graph::{NodeId, NodeKind};
use crate::layout::{cover_scale, Placement};
use crate::repaint::RepaintToken;
use crate::scene::SceneContext;

pub struct Backdrop {
    url: String,
    node: NodeId,
    token: Option<RepaintToken>,
}

impl Backdrop {
    /// Queue `url` and create the image node under the scene root. The node
    /// stays hidden until the cache has the image, which may already be now.
    pub fn request(ctx: &mut SceneContext<'_>, url: &str) -> Self {
        ctx.resources.request(url);
        let node = ctx.spawn(NodeKind::Image {
            url: url.to_string(),
            loaded: false,
        });
        if let Some(image) = ctx.graph().get_mut(node) {
            image.visible = false;
            image.anchor = Vec2::splat(0.5);
        }
        let mut backdrop = Self {
            url: url.to_string(),
            node,
            token: None,
        };
        backdrop.poll(ctx);
        backdrop
    }

    /// Check the cache. On the first frame the image is ready, fit it to the
    /// viewport and keep it fitted across resizes. Returns whether it is shown.
    pub fn poll(&mut self, ctx: &mut SceneContext<'_>) -> bool {
        if self.token.is_some() {
            return true;
        }
        let Some(info) = ctx.resources.get(&self.url) else {
            return false;
        };

        let content = Vec2::new(info.width as f32, info.height as f32);
        if let Some(image) = ctx.graph().get_mut(self.node) {
            image.kind = NodeKind::Image {
                url: self.url.clone(),
                loaded: true,
            };
            image.visible = true;
        }
        let id = format!("backdrop:{}:{}", ctx.owner().generation(), self.url);
        let token = ctx.place(id, self.node, move |_, viewport| {
            Placement::at(viewport.center()).with_size(content * cover_scale(content, viewport))
        });
        log::debug!("Backdrop '{}' ready ({}x{})", self.url, info.width, info.height);
        self.token = Some(token);
        true
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_loaded(&self) -> bool {
        self.token.is_some()
    }
}
