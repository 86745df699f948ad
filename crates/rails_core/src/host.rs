//! Collaborators the runtime drives but does not implement.
//!
//! The director ticks each of these once per frame. Concrete implementations
//! live in the binary (`rails_game`) and the render crate; the `Null*` types
//! here are headless stand-ins.

use crate::graph::SceneGraph;
use crate::input::{InputState, Key};
use crate::layout::Viewport;

/// Draws the shared graph. Rendering the same graph twice must produce the
/// same frame.
pub trait RenderSurface {
    fn render(&mut self, graph: &SceneGraph, viewport: Viewport);

    fn resize(&mut self, _viewport: Viewport) {}
}

pub trait InputPoller {
    /// Latch events received since the previous frame.
    fn update(&mut self);
    fn is_pressed(&self, key: Key) -> bool;
    fn is_repeated(&self, key: Key) -> bool;
}

/// Size of a loaded image. Layout only ever needs the dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandle(pub u64);

/// Non-blocking asset cache. `None` from any lookup means "not ready yet";
/// callers poll again next frame.
pub trait ResourceCache {
    /// Queue a URL for loading. Requesting an already known URL is a no-op.
    fn request(&mut self, url: &str);
    /// Advance pending loads by one frame's worth of work.
    fn load(&mut self);
    fn get(&self, url: &str) -> Option<TextureInfo>;
    fn get_audio(&self, url: &str) -> Option<AudioHandle>;
    fn current_play_time(&self, handle: AudioHandle) -> Option<f64>;
}

pub trait AudioSubsystem {
    fn update(&mut self);
}

pub trait AnimationSubsystem {
    fn update(&mut self);
}

pub struct Host {
    pub surface: Box<dyn RenderSurface>,
    pub input: InputState,
    pub resources: Box<dyn ResourceCache>,
    pub audio: Box<dyn AudioSubsystem>,
    pub animation: Box<dyn AnimationSubsystem>,
}

impl Host {
    pub fn new(surface: Box<dyn RenderSurface>, resources: Box<dyn ResourceCache>) -> Self {
        Self {
            surface,
            input: InputState::new(),
            resources,
            audio: Box::new(NullAudio),
            animation: Box::new(NullAnimation),
        }
    }

    /// No window, no assets, no sound.
    pub fn headless() -> Self {
        Self::new(Box::new(NullSurface), Box::new(NullResources))
    }
}

pub struct NullSurface;

impl RenderSurface for NullSurface {
    fn render(&mut self, _graph: &SceneGraph, _viewport: Viewport) {}
}

/// A cache that never produces anything.
pub struct NullResources;

impl ResourceCache for NullResources {
    fn request(&mut self, _url: &str) {}
    fn load(&mut self) {}
    fn get(&self, _url: &str) -> Option<TextureInfo> {
        None
    }
    fn get_audio(&self, _url: &str) -> Option<AudioHandle> {
        None
    }
    fn current_play_time(&self, _handle: AudioHandle) -> Option<f64> {
        None
    }
}

pub struct NullAudio;

impl AudioSubsystem for NullAudio {
    fn update(&mut self) {}
}

pub struct NullAnimation;

impl AnimationSubsystem for NullAnimation {
    fn update(&mut self) {}
}
