pub mod window;

pub use window::{create_window, viewport_of, PlatformConfig};
