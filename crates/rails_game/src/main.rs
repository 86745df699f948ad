//! Parallel Rails -- window host for the scene runtime.
//!
//! winit drives the event loop via `ApplicationHandler`. Each `RedrawRequested`
//! measures the frame delta (see `TimeState`) and runs exactly one
//! `Director::tick`, which steps every live scene and presents the stage once.
//! Resizes go straight to `ProcessState::notify_resize`, so the active scene's
//! layout is up to date before the next tick.

mod music_select;
mod resources;
mod title;

use std::path::Path;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use rails_core::config::DEFAULT_CONFIG_PATH;
use rails_core::{
    load_config_or_default, Director, FadeSettings, Host, InputState, Key, ProcessState,
    RuntimeConfig, TimeState,
};
use rails_platform::{viewport_of, PlatformConfig};
use rails_render::{StageSurface, Swapchain};

use resources::FileResourceCache;
use title::TitleScene;

const ASSET_ROOT: &str = "assets";

struct EngineState {
    window: Arc<Window>,
    state: ProcessState,
    director: Director,
    host: Host,
    time: TimeState,
}

impl EngineState {
    fn new(window: Arc<Window>, swapchain: Swapchain, config: &RuntimeConfig) -> Self {
        let viewport = viewport_of(&window);
        let surface = StageSurface::new(swapchain, config.stage_color);
        let mut host = Host::new(
            Box::new(surface),
            Box::new(FileResourceCache::new(ASSET_ROOT)),
        );
        let mut state = ProcessState::new(viewport);
        let mut director = Director::new();
        let time = TimeState::new().with_max_frame_dt(config.max_frame_dt());

        let fade = FadeSettings::from(&config.fade);
        director.start(&mut state, &mut host, Box::new(TitleScene::new(fade)));

        Self {
            window,
            state,
            director,
            host,
            time,
        }
    }

    fn input(&mut self) -> &mut InputState {
        &mut self.host.input
    }
}

struct App {
    config: RuntimeConfig,
    state: Option<EngineState>,
}

impl App {
    fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let platform = PlatformConfig::from(&self.config.window);
        let window = rails_platform::create_window(event_loop, &platform);
        let swapchain = match Swapchain::for_window(window.clone()) {
            Ok(swapchain) => swapchain,
            Err(e) => {
                log::error!("{e}");
                event_loop.exit();
                return;
            }
        };
        self.state = Some(EngineState::new(window, swapchain, &self.config));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    let stats = state.state.notify_resize(w, h);
                    state.host.surface.resize(state.state.viewport());
                    log::info!(
                        "Resized to {}x{} ({} layouts re-run, {} stale entries collected)",
                        w,
                        h,
                        stats.invoked,
                        stats.collected
                    );
                }
            }

            WindowEvent::Focused(false) => {
                state.input().reset();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if key_code == KeyCode::Escape && event.state == ElementState::Pressed {
                        log::info!("Escape pressed, exiting.");
                        event_loop.exit();
                        return;
                    }
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input().key_down(key, event.repeat),
                            ElementState::Released => state.input().key_up(key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.state.viewport().is_empty() {
                    return;
                }

                state.time.begin_frame();
                let report =
                    state
                        .director
                        .tick(&mut state.state, &mut state.host, state.time.real_dt);

                for owner in &report.finished {
                    log::debug!("Frame {}: scene {} finished", report.frame, owner);
                }
                if state.time.frame_count % 600 == 0 {
                    log::debug!(
                        "{:.1} fps ({:.2} ms), {} live scene(s), {} repaint entries",
                        state.time.smoothed_fps,
                        state.time.smoothed_frame_time_ms,
                        state.director.live_count(),
                        state.state.repaint.len()
                    );
                }
                if state.director.is_idle() {
                    log::warn!("No live scenes left, exiting.");
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::ControlLeft | KeyCode::ControlRight => Some(Key::Ctrl),
        KeyCode::KeyE => Some(Key::E),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyS => Some(Key::S),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Parallel Rails starting...");
    let config = load_config_or_default(Path::new(DEFAULT_CONFIG_PATH));

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).expect("Event loop error");
}
