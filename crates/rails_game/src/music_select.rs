use glam::Vec2;

use rails_core::{Backdrop, FadeSettings, NodeKind, Placement, Progress, Scene, SceneContext};

use crate::title::TitleScene;

const BACKGROUND_URL: &str = "textures/music_select_bg.png";
const PANEL_COLOR: [f32; 4] = [0.14, 0.05, 0.10, 1.0];
/// Frames spent on the placeholder screen before returning to the title.
pub const RETURN_AFTER_FRAMES: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    Play,
    Edit,
}

impl std::fmt::Display for PlayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Play => f.write_str("play"),
            Self::Edit => f.write_str("edit"),
        }
    }
}

pub struct MusicSelectScene {
    mode: PlayMode,
    fade: FadeSettings,
    frames: u32,
    backdrop: Option<Backdrop>,
}

impl MusicSelectScene {
    pub fn new(mode: PlayMode, fade: FadeSettings) -> Self {
        Self {
            mode,
            fade,
            frames: 0,
            backdrop: None,
        }
    }
}

impl Scene for MusicSelectScene {
    fn name(&self) -> &str {
        "music_select"
    }

    fn fade(&self) -> FadeSettings {
        self.fade
    }

    fn on_initialize(&mut self, ctx: &mut SceneContext<'_>) -> Progress {
        let panel = ctx.spawn(NodeKind::Fill { color: PANEL_COLOR });
        ctx.place("music_select.panel", panel, |_, viewport| {
            Placement::fill(viewport)
        });
        self.backdrop = Some(Backdrop::request(ctx, BACKGROUND_URL));

        let heading = ctx.spawn(NodeKind::Label {
            text: format!("Music select ({})", self.mode),
        });
        if let Some(label) = ctx.graph().get_mut(heading) {
            label.anchor = Vec2::new(0.5, 0.0);
        }
        ctx.place("music_select.heading", heading, |_, viewport| {
            Placement::at(Vec2::new(viewport.center().x, 48.0))
        });
        Progress::Complete
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>) {
        if let Some(backdrop) = &mut self.backdrop {
            backdrop.poll(ctx);
        }

        self.frames += 1;
        if self.frames == RETURN_AFTER_FRAMES {
            log::info!("No beatmaps to choose from yet, back to title");
            ctx.switch_to(Box::new(TitleScene::new(self.fade)));
        }
    }
}
