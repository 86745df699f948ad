use glam::Vec2;

use rails_core::{
    Backdrop, FadeSettings, InputPoller as _, Key, NodeId, NodeKind, Placement, Progress, Scene,
    SceneContext,
};

use crate::music_select::{MusicSelectScene, PlayMode};

pub const TITLE_TEXT: &str = "Parallel Rails";
const BACKGROUND_URL: &str = "textures/title_bg.png";
const PANEL_COLOR: [f32; 4] = [0.05, 0.07, 0.16, 1.0];
const SHIMMER_FRAMES: u32 = 20;
const SHIMMER_PERIOD: u32 = 120;

pub struct TitleScene {
    fade: FadeSettings,
    backdrop: Option<Backdrop>,
    title_label: Option<NodeId>,
    shimmer: Shimmer,
}

impl TitleScene {
    pub fn new(fade: FadeSettings) -> Self {
        Self {
            fade,
            backdrop: None,
            title_label: None,
            shimmer: Shimmer::new(TITLE_TEXT),
        }
    }

    fn label(ctx: &mut SceneContext<'_>, id: &str, text: &str, offset_y: f32) -> NodeId {
        let node = ctx.spawn(NodeKind::Label {
            text: text.to_string(),
        });
        if let Some(label) = ctx.graph().get_mut(node) {
            label.anchor = Vec2::splat(0.5);
        }
        ctx.place(id, node, move |_, viewport| {
            Placement::at(viewport.center() + Vec2::new(0.0, offset_y))
        });
        node
    }
}

impl Scene for TitleScene {
    fn name(&self) -> &str {
        "title"
    }

    fn fade(&self) -> FadeSettings {
        self.fade
    }

    fn on_initialize(&mut self, ctx: &mut SceneContext<'_>) -> Progress {
        let panel = ctx.spawn(NodeKind::Fill { color: PANEL_COLOR });
        ctx.place("title.panel", panel, |_, viewport| Placement::fill(viewport));
        self.backdrop = Some(Backdrop::request(ctx, BACKGROUND_URL));

        self.title_label = Some(Self::label(ctx, "title.name", TITLE_TEXT, -32.0));
        Self::label(ctx, "title.credits", "A rhythm game scene runtime", 15.0);
        Self::label(
            ctx,
            "title.prompt",
            "[P] play beatmap\n\n[E] edit beatmap",
            80.0,
        );
        Progress::Complete
    }

    fn update(&mut self, ctx: &mut SceneContext<'_>) {
        if let Some(backdrop) = &mut self.backdrop {
            backdrop.poll(ctx);
        }

        if let (Some(text), Some(label)) = (self.shimmer.tick(), self.title_label) {
            if let Some(node) = ctx.graph().get_mut(label) {
                node.kind = NodeKind::Label { text };
            }
        }

        let mode = if ctx.input.is_pressed(Key::P) {
            Some(PlayMode::Play)
        } else if ctx.input.is_pressed(Key::E) {
            Some(PlayMode::Edit)
        } else {
            None
        };
        if let Some(mode) = mode {
            log::info!("Entering music select ({mode})");
            ctx.switch_to(Box::new(MusicSelectScene::new(mode, self.fade)));
        }
    }
}

/// Periodically swaps one letter of the title for a random one.
struct Shimmer {
    original: Vec<char>,
    timer: u32,
    position: Option<usize>,
    seed: u32,
}

impl Shimmer {
    fn new(text: &str) -> Self {
        Self {
            original: text.chars().collect(),
            timer: 0,
            position: None,
            seed: 0x9E37_79B9,
        }
    }

    /// Advance one frame. Returns the new text when it changed.
    fn tick(&mut self) -> Option<String> {
        self.timer += 1;
        if self.timer < SHIMMER_FRAMES {
            let position = match self.position {
                Some(position) => position,
                None => {
                    let position = self.pick_position()?;
                    self.position = Some(position);
                    position
                }
            };
            let letter = self.next_letter();
            let mut text = self.original.clone();
            text[position] = letter;
            return Some(text.into_iter().collect());
        }
        if self.timer == SHIMMER_FRAMES {
            self.position = None;
            return Some(self.original.iter().collect());
        }
        if self.timer >= SHIMMER_PERIOD {
            self.timer = 0;
        }
        None
    }

    fn pick_position(&mut self) -> Option<usize> {
        let candidates: Vec<usize> = self
            .original
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_whitespace())
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let index = self.next_random() as usize % candidates.len();
        Some(candidates[index])
    }

    fn next_letter(&mut self) -> char {
        let roll = self.next_random();
        let base = if roll & 1 == 0 { b'A' } else { b'a' };
        char::from(base + ((roll >> 1) % 26) as u8)
    }

    // xorshift32
    fn next_random(&mut self) -> u32 {
        let mut x = self.seed;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.seed = x;
        x
    }
}
