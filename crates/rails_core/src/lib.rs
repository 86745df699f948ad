pub mod backdrop;
pub mod config;
pub mod director;
pub mod graph;
pub mod host;
pub mod input;
pub mod layout;
pub mod repaint;
pub mod scene;
pub mod state;
pub mod time;

pub use backdrop::Backdrop;
pub use config::{load_config_from_path, load_config_or_default, RuntimeConfig};
pub use director::{Director, FrameReport};
pub use graph::{Node, NodeId, NodeKind, SceneGraph};
pub use host::{Host, InputPoller, RenderSurface, ResourceCache, TextureInfo};
pub use input::{InputState, Key};
pub use layout::{cover_scale, Placement, Viewport};
pub use repaint::{DispatchStats, RepaintRegistry, RepaintToken};
pub use scene::{FadeSettings, Phase, Progress, Scene, SceneContext};
pub use state::{Generation, ProcessState, SceneOwner};
pub use time::TimeState;
