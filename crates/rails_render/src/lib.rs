pub mod stage_surface;
pub mod swapchain;

pub use stage_surface::StageSurface;
pub use swapchain::Swapchain;
