use rails_core::{RenderSurface, SceneGraph, Viewport};

use crate::swapchain::Swapchain;

/// Presents the stage by clearing the swapchain to the colour of every
/// full-screen fill composited over the stage colour. Fade overlays are such
/// fills, so transitions are visible without a sprite pipeline.
pub struct StageSurface {
    swapchain: Swapchain,
    stage_color: [f32; 4],
}

impl StageSurface {
    pub fn new(swapchain: Swapchain, stage_color: [f32; 4]) -> Self {
        Self {
            swapchain,
            stage_color,
        }
    }
}

impl RenderSurface for StageSurface {
    fn render(&mut self, graph: &SceneGraph, viewport: Viewport) {
        let color = clear_color(graph.composite_backdrop(self.stage_color, viewport));
        if !self.swapchain.present_clear(color) {
            log::trace!("Stage frame dropped");
        }
    }

    fn resize(&mut self, viewport: Viewport) {
        self.swapchain.resize(viewport.width, viewport.height);
    }
}

fn clear_color(rgba: [f32; 4]) -> wgpu::Color {
    let [r, g, b, a] = rgba.map(|c| f64::from(c.clamp(0.0, 1.0)));
    wgpu::Color { r, g, b, a }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_color_clamps_channels() {
        let color = clear_color([1.5, -0.25, 0.5, 1.0]);
        assert_eq!(color.r, 1.0);
        assert_eq!(color.g, 0.0);
        assert_eq!(color.b, 0.5);
        assert_eq!(color.a, 1.0);
    }
}
